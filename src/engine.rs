use std::fmt;

use crate::device::DeviceProfile;

/// Status codes returned across the render-engine boundary.
///
/// Zero means the buffer was filled; any other value means the contents
/// must not be trusted. Values are stable so they can be logged and
/// compared against the native engine's codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ErrorCode {
    Ok = 0,
    /// `render_buffer` was called before `set_device_info`.
    NotInitialized = 1,
    UnsupportedPixelFormat = 2,
    /// The requested region does not fit the supplied buffer.
    OutOfBoundsDrawing = 3,
    /// `set_language` was given an id the engine does not ship.
    UnknownLanguage = 4,
}

impl ErrorCode {
    pub fn is_ok(self) -> bool {
        self == ErrorCode::Ok
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} ({})", self, *self as u32)
    }
}

/// Boundary to the engine that fills pixel buffers.
///
/// The buffer layout is fixed: row-major packed 0x00BBGGRR cells of length
/// `height * line_stride`, origin at (0, 0). Implementations write the
/// buffer in place and report failure through [`ErrorCode`]; they never
/// panic on bad geometry.
pub trait RenderEngine {
    /// Select the device the next frames are rendered for.
    fn set_device_info(&mut self, profile: &DeviceProfile, magnified: bool) -> ErrorCode;

    /// Select the language used for rendered text.
    fn set_language(&mut self, language_id: &str) -> ErrorCode;

    /// Language ids this engine can render.
    fn language_ids(&self) -> Vec<String>;

    /// Fill the `width x height` region at (x, y) of `buffer` in place.
    fn render_buffer(
        &mut self,
        x: u32,
        y: u32,
        width: u32,
        height: u32,
        line_stride: u32,
        buffer: &mut [u32],
    ) -> ErrorCode;
}

/// Blend one channel of `a` over `b` with the given alpha, returning the
/// channel already shifted back into place.
fn combine_channel(shift: u32, alpha: f64, a: u32, b: u32) -> u32 {
    let a = (a >> shift) & 0xff;
    let b = (b >> shift) & 0xff;
    let acc = alpha * a as f64 + (1.0 - alpha) * b as f64;
    if acc <= 0.0 {
        return 0;
    }
    let result = acc as u32;
    if result > 255 {
        return 255 << shift;
    }
    result << shift
}

/// Alpha-blend an ARGB color over a packed 24-bit destination pixel.
fn blend(color: u32, dst: u32) -> u32 {
    let alpha = ((color >> 24) & 0xff) as f64 / 255.0;
    combine_channel(0, alpha, color, dst)
        | combine_channel(8, alpha, color, dst)
        | combine_channel(16, alpha, color, dst)
}

/// Languages the pattern engine ships.
const LANGUAGES: &[&str] = &["en", "de", "es", "fr", "it", "ja", "ko", "pt", "ru", "zh"];

/// Per-language accent colors (ARGB), one per entry of [`LANGUAGES`].
const ACCENTS: &[u32] = &[
    0xcc_3366ff,
    0xcc_ff9900,
    0xcc_cc3333,
    0xcc_3399cc,
    0xcc_339966,
    0xcc_9933cc,
    0xcc_cc9933,
    0xcc_33cccc,
    0xcc_cc3399,
    0xcc_99cc33,
];

struct DeviceState {
    width_px: u32,
    magnified: bool,
}

/// Software stand-in for the native UI renderer.
///
/// Draws the same kind of output the real engine produces: a horizontal
/// intensity gradient across the device width with alpha-blended layout
/// elements on top. Deterministic for a given device/language/magnified
/// selection, so frames can be compared bit for bit in tests.
pub struct PatternEngine {
    device: Option<DeviceState>,
    language: usize,
}

impl PatternEngine {
    pub fn new() -> Self {
        Self {
            device: None,
            language: 0,
        }
    }

    fn fill_pattern(
        &self,
        device: &DeviceState,
        x: u32,
        y: u32,
        width: u32,
        height: u32,
        line_stride: u32,
        buffer: &mut [u32],
    ) {
        let accent = ACCENTS[self.language];
        // The message panel grows when the magnified layout is selected.
        let panel_bottom = if device.magnified {
            height * 7 / 10
        } else {
            height * 9 / 20
        };
        let panel_top = height / 5;
        let panel_left = width / 10;
        let panel_right = width - width / 10;
        let accent_bottom = height * 3 / 50;

        for yi in 0..height {
            let row = (y + yi) as usize * line_stride as usize + x as usize;
            for xi in 0..width {
                // Gradient runs across the configured device width, same
                // as the native renderer's background.
                let intensity = ((x + xi) as u64 * 256 / device.width_px.max(1) as u64).min(255);
                let intensity = intensity as u32;
                let mut px = intensity << 16 | intensity << 8 | intensity;
                if yi < accent_bottom {
                    px = blend(accent, px);
                }
                if yi >= panel_top && yi < panel_bottom && xi >= panel_left && xi < panel_right {
                    px = blend(0xe6_ffffff, px);
                }
                buffer[row + xi as usize] = px;
            }
        }
    }
}

impl Default for PatternEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderEngine for PatternEngine {
    fn set_device_info(&mut self, profile: &DeviceProfile, magnified: bool) -> ErrorCode {
        self.device = Some(DeviceState {
            width_px: profile.width_px,
            magnified,
        });
        ErrorCode::Ok
    }

    fn set_language(&mut self, language_id: &str) -> ErrorCode {
        match LANGUAGES.iter().position(|id| *id == language_id) {
            Some(index) => {
                self.language = index;
                ErrorCode::Ok
            }
            None => ErrorCode::UnknownLanguage,
        }
    }

    fn language_ids(&self) -> Vec<String> {
        LANGUAGES.iter().map(|id| id.to_string()).collect()
    }

    fn render_buffer(
        &mut self,
        x: u32,
        y: u32,
        width: u32,
        height: u32,
        line_stride: u32,
        buffer: &mut [u32],
    ) -> ErrorCode {
        let Some(device) = self.device.as_ref() else {
            return ErrorCode::NotInitialized;
        };
        if width == 0 || height == 0 {
            return ErrorCode::Ok;
        }
        // Checked arithmetic: the index one past the last written pixel
        // must fit the buffer, with no overflow along the way.
        let last_row = y as u64 + height as u64 - 1;
        let end = match last_row
            .checked_mul(line_stride as u64)
            .and_then(|v| v.checked_add(x as u64))
            .and_then(|v| v.checked_add(width as u64))
        {
            Some(end) => end,
            None => return ErrorCode::OutOfBoundsDrawing,
        };
        if x as u64 + width as u64 > line_stride as u64 || end > buffer.len() as u64 {
            return ErrorCode::OutOfBoundsDrawing;
        }

        self.fill_pattern(device, x, y, width, height, line_stride, buffer);
        ErrorCode::Ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::DeviceCatalog;
    use crate::pixel::PixelBuffer;

    fn coral() -> DeviceProfile {
        DeviceCatalog::builtin().get("coral").unwrap().clone()
    }

    #[test]
    fn render_before_device_info_is_rejected() {
        let mut engine = PatternEngine::new();
        let mut buffer = PixelBuffer::allocate(8, 8, 8);
        let code = engine.render_buffer(0, 0, 8, 8, 8, buffer.pixels_mut());
        assert_eq!(code, ErrorCode::NotInitialized);
    }

    #[test]
    fn render_outside_buffer_is_rejected() {
        let mut engine = PatternEngine::new();
        engine.set_device_info(&coral(), false);
        let mut buffer = PixelBuffer::allocate(8, 8, 8);
        assert_eq!(
            engine.render_buffer(0, 0, 8, 9, 8, buffer.pixels_mut()),
            ErrorCode::OutOfBoundsDrawing
        );
        assert_eq!(
            engine.render_buffer(4, 0, 8, 8, 8, buffer.pixels_mut()),
            ErrorCode::OutOfBoundsDrawing
        );
    }

    #[test]
    fn zero_extent_render_is_a_no_op() {
        let mut engine = PatternEngine::new();
        engine.set_device_info(&coral(), false);
        let mut buffer = PixelBuffer::allocate(8, 8, 8);
        assert_eq!(
            engine.render_buffer(0, 0, 0, 0, 8, buffer.pixels_mut()),
            ErrorCode::Ok
        );
        assert!(buffer.pixels().iter().all(|&px| px == 0));
    }

    #[test]
    fn unknown_language_is_reported_and_keeps_previous() {
        let mut engine = PatternEngine::new();
        assert_eq!(engine.set_language("de"), ErrorCode::Ok);
        assert_eq!(engine.set_language("tlh"), ErrorCode::UnknownLanguage);
        engine.set_device_info(&coral(), false);

        let mut first = PixelBuffer::allocate(32, 32, 32);
        engine.render_buffer(0, 0, 32, 32, 32, first.pixels_mut());
        let mut second = PatternEngine::new();
        second.set_language("de");
        second.set_device_info(&coral(), false);
        let mut expected = PixelBuffer::allocate(32, 32, 32);
        second.render_buffer(0, 0, 32, 32, 32, expected.pixels_mut());
        assert_eq!(first.pixels(), expected.pixels());
    }

    #[test]
    fn same_selection_renders_identical_frames() {
        let mut engine = PatternEngine::new();
        engine.set_device_info(&coral(), true);
        engine.set_language("fr");
        let mut a = PixelBuffer::allocate(64, 96, 64);
        let mut b = PixelBuffer::allocate(64, 96, 64);
        engine.render_buffer(0, 0, 64, 96, 64, a.pixels_mut());
        engine.render_buffer(0, 0, 64, 96, 64, b.pixels_mut());
        assert_eq!(a.pixels(), b.pixels());
    }

    #[test]
    fn language_changes_the_rendered_frame() {
        let mut engine = PatternEngine::new();
        engine.set_device_info(&coral(), false);
        engine.set_language("en");
        let mut en = PixelBuffer::allocate(64, 96, 64);
        engine.render_buffer(0, 0, 64, 96, 64, en.pixels_mut());
        engine.set_language("ja");
        let mut ja = PixelBuffer::allocate(64, 96, 64);
        engine.render_buffer(0, 0, 64, 96, 64, ja.pixels_mut());
        assert_ne!(en.pixels(), ja.pixels());
    }

    #[test]
    fn blend_is_bounded() {
        assert_eq!(blend(0xff_ffffff, 0x0000_0000), 0x00ff_ffff);
        assert_eq!(blend(0x00_ffffff, 0x0012_3456), 0x0012_3456);
    }
}
