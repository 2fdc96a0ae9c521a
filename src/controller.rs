use std::sync::Mutex;

use log::{debug, info, warn};

use crate::compositor::{compose, DisplayImage};
use crate::device::DeviceProfile;
use crate::engine::{ErrorCode, RenderEngine};
use crate::magnifier::{clamp_crop, MagnifierView};
use crate::pixel::PixelBuffer;

/// Where the pipeline currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderState {
    /// Nothing selected yet; there is no buffer to show.
    NoBuffer,
    /// An engine fill is in flight on the UI thread.
    Rendering,
    /// Buffer and display image are consistent and paintable.
    Ready,
    /// The engine refused the last render; the previous display image
    /// (if any) is still exposed.
    Failed(ErrorCode),
}

/// The user's current choices, read before every re-render.
#[derive(Debug, Clone)]
pub struct Selection {
    pub profile: DeviceProfile,
    pub language: String,
    pub magnified: bool,
}

/// The shared mutable pair: every read and write of a buffer/display
/// combination happens inside this mutex, so a paint can never observe a
/// half-written buffer or mismatched dimensions.
struct FramePair {
    buffer: Option<PixelBuffer>,
    display: Option<DisplayImage>,
}

/// Orchestrates the allocate → engine fill → compose cycle and owns the
/// buffer lifecycle.
///
/// All operations run on the single UI thread; the engine call blocks that
/// thread. Engine failures are absorbed here: they are logged, the state
/// switches to [`RenderState::Failed`], and the last good display image
/// keeps painting.
pub struct FrameController {
    engine: Box<dyn RenderEngine>,
    selection: Option<Selection>,
    viewport: (u32, u32),
    state: RenderState,
    pair: Mutex<FramePair>,
    magnifier: MagnifierView,
}

impl FrameController {
    pub fn new(engine: Box<dyn RenderEngine>) -> Self {
        Self {
            engine,
            selection: None,
            viewport: (0, 0),
            state: RenderState::NoBuffer,
            pair: Mutex::new(FramePair {
                buffer: None,
                display: None,
            }),
            magnifier: MagnifierView::new(),
        }
    }

    pub fn state(&self) -> RenderState {
        self.state
    }

    pub fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    pub fn magnifier(&self) -> &MagnifierView {
        &self.magnifier
    }

    /// Device, language or magnify-toggle change: re-render at the
    /// profile's pixel dimensions and recompose for the current viewport.
    pub fn on_selection_changed(&mut self, profile: DeviceProfile, language: &str, magnified: bool) {
        info!(
            "selection changed: device={} language={} magnified={}",
            profile.id, language, magnified
        );
        let (w, h) = (profile.width_px, profile.height_px);
        self.selection = Some(Selection {
            profile,
            language: language.to_string(),
            magnified,
        });
        self.render_frame(w, h);
    }

    /// Viewport resize: re-render at the new viewport resolution so the
    /// buffer tracks what is actually on screen.
    pub fn on_viewport_resized(&mut self, width: u32, height: u32) {
        debug!("viewport resized to {}x{}", width, height);
        self.viewport = (width, height);
        if self.selection.is_none() {
            return;
        }
        self.render_frame(width, height);
    }

    /// Pointer motion in display coordinates: refresh the magnifier crop
    /// from the live display image. Never touches the pixel buffer.
    pub fn on_pointer_move(&self, px: i32, py: i32) {
        let d = self.magnifier.crop_side();
        if d == 0 {
            return;
        }
        let pair = self.pair.lock().unwrap();
        let Some(display) = pair.display.as_ref() else {
            return;
        };
        if display.is_empty() {
            return;
        }
        let (x, y, d) = clamp_crop(px, py, d, display.width(), display.height());
        if d == 0 {
            return;
        }
        self.magnifier.draw(display, x, y, d);
    }

    /// Paint-path read of the current display image, inside the pair's
    /// lock. Returns `None` while no frame has been composed.
    pub fn with_display<R>(&self, f: impl FnOnce(&DisplayImage) -> R) -> Option<R> {
        self.pair.lock().unwrap().display.as_ref().map(f)
    }

    /// Geometry of the current buffer, for diagnostics and tests.
    pub fn buffer_dimensions(&self) -> Option<(u32, u32, u32)> {
        self.pair
            .lock()
            .unwrap()
            .buffer
            .as_ref()
            .map(|b| (b.width(), b.height(), b.line_stride()))
    }

    /// One full allocate → fill → compose cycle at the given buffer size.
    fn render_frame(&mut self, buf_w: u32, buf_h: u32) {
        let Some(selection) = self.selection.as_ref() else {
            return;
        };
        self.state = RenderState::Rendering;

        let mut pair = self.pair.lock().unwrap();
        let mut buffer = PixelBuffer::allocate(buf_w, buf_h, buf_w);

        let code = self.engine.set_device_info(&selection.profile, selection.magnified);
        if !code.is_ok() {
            warn!("engine rejected device {:?}: {}", selection.profile.id, code);
        }
        let code = self.engine.set_language(&selection.language);
        if !code.is_ok() {
            warn!("engine rejected language {:?}: {}", selection.language, code);
        }

        let code = self.engine.render_buffer(
            0,
            0,
            buffer.width(),
            buffer.height(),
            buffer.line_stride(),
            buffer.pixels_mut(),
        );
        if !code.is_ok() {
            // Keep the previous display image paintable; the new buffer
            // has the right geometry but untrusted contents.
            warn!("engine could not render: {}", code);
            pair.buffer = Some(buffer);
            self.state = RenderState::Failed(code);
            return;
        }

        let display = compose(&buffer, self.viewport.0, self.viewport.1);
        pair.buffer = Some(buffer);
        pair.display = Some(display);
        self.state = RenderState::Ready;
    }
}
