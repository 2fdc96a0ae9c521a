use crate::pixel::PixelBuffer;

/// A PixelBuffer rescaled to the current viewport for presentation.
///
/// The image is always exactly viewport-sized; the scaled source content
/// is drawn from the top-left and the remainder stays transparent, so the
/// alpha channel composites correctly over any background.
/// `content_size()` reports the unclipped extent of the scaled content.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayImage {
    pixels: Vec<u8>,
    width: u32,
    height: u32,
    content_width: u32,
    content_height: u32,
}

impl DisplayImage {
    fn new(width: u32, height: u32) -> Self {
        Self {
            pixels: vec![0; width as usize * height as usize * 4],
            width,
            height,
            content_width: 0,
            content_height: 0,
        }
    }

    /// Zero-sized image produced for degenerate viewports.
    pub fn empty() -> Self {
        Self::new(0, 0)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Unclipped extent of the scaled content, `(round(w * scale),
    /// round(h * scale))`. May exceed the image height when the viewport
    /// aspect is shorter than the source.
    pub fn content_size(&self) -> (u32, u32) {
        (self.content_width, self.content_height)
    }

    /// Premultiplied RGBA bytes, row-major, `width * height * 4` long.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }
}

/// Resampling filter used by [`scale_region`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Filter {
    Bilinear,
    Nearest,
}

/// Scale a PixelBuffer to the viewport.
///
/// The scale factor is uniform, `viewport_w / buffer.width`; the viewport
/// height does not influence it. Zero viewport or buffer dimensions yield
/// an empty image rather than an error. Callers hold the buffer's owning
/// lock across this call; the buffer may be mid-write otherwise.
pub fn compose(buffer: &PixelBuffer, viewport_w: u32, viewport_h: u32) -> DisplayImage {
    if viewport_w == 0 || viewport_h == 0 || buffer.is_empty() {
        return DisplayImage::empty();
    }

    let scale = viewport_w as f64 / buffer.width() as f64;
    let mut image = DisplayImage::new(viewport_w, viewport_h);
    image.content_width = (buffer.width() as f64 * scale).round() as u32;
    image.content_height = (buffer.height() as f64 * scale).round() as u32;

    let rgba = buffer.to_rgba();
    scale_region(
        &rgba,
        buffer.width(),
        buffer.height(),
        (0, 0, buffer.width(), buffer.height()),
        &mut image.pixels,
        viewport_w,
        viewport_h,
        scale,
        Filter::Bilinear,
    );
    image
}

/// Draw a scaled copy of `rect` (in source coordinates) into the top-left
/// of `dst`, clipping to the destination. Shared by the compositor
/// (bilinear) and the magnifier (nearest).
#[allow(clippy::too_many_arguments)]
pub fn scale_region(
    src: &[u8],
    src_w: u32,
    src_h: u32,
    rect: (u32, u32, u32, u32),
    dst: &mut [u8],
    dst_w: u32,
    dst_h: u32,
    scale: f64,
    filter: Filter,
) {
    let (rx, ry, rw, rh) = rect;
    if rw == 0 || rh == 0 || src_w == 0 || src_h == 0 || scale <= 0.0 {
        return;
    }
    let out_w = ((rw as f64 * scale).round() as u32).min(dst_w);
    let out_h = ((rh as f64 * scale).round() as u32).min(dst_h);

    for dy in 0..out_h {
        let sy = (dy as f64 + 0.5) / scale - 0.5 + ry as f64;
        for dx in 0..out_w {
            let sx = (dx as f64 + 0.5) / scale - 0.5 + rx as f64;
            let px = match filter {
                Filter::Bilinear => sample_bilinear(src, src_w, src_h, sx, sy),
                Filter::Nearest => sample_nearest(src, src_w, src_h, sx, sy),
            };
            let at = (dy as usize * dst_w as usize + dx as usize) * 4;
            dst[at..at + 4].copy_from_slice(&px);
        }
    }
}

fn sample_nearest(src: &[u8], src_w: u32, src_h: u32, sx: f64, sy: f64) -> [u8; 4] {
    let x = (sx.round().max(0.0) as u32).min(src_w - 1);
    let y = (sy.round().max(0.0) as u32).min(src_h - 1);
    let at = (y as usize * src_w as usize + x as usize) * 4;
    [src[at], src[at + 1], src[at + 2], src[at + 3]]
}

fn sample_bilinear(src: &[u8], src_w: u32, src_h: u32, sx: f64, sy: f64) -> [u8; 4] {
    let sx = sx.clamp(0.0, (src_w - 1) as f64);
    let sy = sy.clamp(0.0, (src_h - 1) as f64);
    let x0 = sx.floor() as u32;
    let y0 = sy.floor() as u32;
    let x1 = (x0 + 1).min(src_w - 1);
    let y1 = (y0 + 1).min(src_h - 1);
    let fx = sx - x0 as f64;
    let fy = sy - y0 as f64;

    let at = |x: u32, y: u32| (y as usize * src_w as usize + x as usize) * 4;
    let (p00, p10, p01, p11) = (at(x0, y0), at(x1, y0), at(x0, y1), at(x1, y1));

    let mut out = [0u8; 4];
    for c in 0..4 {
        let top = src[p00 + c] as f64 * (1.0 - fx) + src[p10 + c] as f64 * fx;
        let bottom = src[p01 + c] as f64 * (1.0 - fx) + src[p11 + c] as f64 * fx;
        out[c] = (top * (1.0 - fy) + bottom * fy).round() as u8;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid_buffer(w: u32, h: u32, value: u32) -> PixelBuffer {
        let mut buffer = PixelBuffer::allocate(w, h, w);
        buffer.pixels_mut().fill(value);
        buffer
    }

    #[test]
    fn image_dimensions_match_viewport() {
        let buffer = solid_buffer(256, 400, 0x0000_00ff);
        let image = compose(&buffer, 400, 500);
        assert_eq!(image.width(), 400);
        assert_eq!(image.height(), 500);
    }

    #[test]
    fn content_scales_uniformly_by_viewport_width() {
        let buffer = solid_buffer(256, 400, 0x0000_00ff);
        let image = compose(&buffer, 400, 500);
        // scale = 400/256 = 1.5625, so content height = round(400 * 1.5625)
        assert_eq!(image.content_size(), (400, 625));
    }

    #[test]
    fn zero_viewport_produces_empty_image() {
        let buffer = solid_buffer(10, 10, 0x0000_00ff);
        assert!(compose(&buffer, 0, 100).is_empty());
        assert!(compose(&buffer, 100, 0).is_empty());
    }

    #[test]
    fn empty_buffer_produces_empty_image() {
        let buffer = PixelBuffer::allocate(0, 0, 0);
        assert!(compose(&buffer, 100, 100).is_empty());
    }

    #[test]
    fn identity_scale_preserves_solid_color() {
        let buffer = solid_buffer(16, 16, 0x0000_00ff); // pure red
        let image = compose(&buffer, 16, 16);
        for px in image.pixels().chunks_exact(4) {
            assert_eq!(px, &[255, 0, 0, 255]);
        }
    }

    #[test]
    fn region_beyond_content_stays_transparent() {
        let buffer = solid_buffer(16, 16, 0x0000_00ff);
        // Viewport twice as tall as the scaled content.
        let image = compose(&buffer, 16, 32);
        let below = (20 * 16) * 4;
        assert_eq!(&image.pixels()[below..below + 4], &[0, 0, 0, 0]);
    }

    #[test]
    fn bilinear_interpolates_between_neighbors() {
        // Two columns, black and white: a 4x upscale must produce
        // intermediate grays between them.
        let src = [0, 0, 0, 255, 255, 255, 255, 255];
        let mut dst = vec![0u8; 8 * 1 * 4];
        scale_region(&src, 2, 1, (0, 0, 2, 1), &mut dst, 8, 1, 4.0, Filter::Bilinear);
        assert_eq!(dst[0], 0);
        assert_eq!(dst[7 * 4], 255);
        let mid = dst[3 * 4];
        assert!(mid > 0 && mid < 255);
    }

    #[test]
    fn nearest_keeps_exact_source_values() {
        let src = [10, 20, 30, 255, 200, 210, 220, 255];
        let mut dst = vec![0u8; 4 * 1 * 4];
        scale_region(&src, 2, 1, (0, 0, 2, 1), &mut dst, 4, 1, 2.0, Filter::Nearest);
        assert_eq!(&dst[0..4], &[10, 20, 30, 255]);
        assert_eq!(&dst[12..16], &[200, 210, 220, 255]);
    }

    #[test]
    fn scale_region_respects_source_rect() {
        // 2x2 source, magnify only the bottom-right pixel.
        let src = [
            1, 1, 1, 255, 2, 2, 2, 255, //
            3, 3, 3, 255, 4, 4, 4, 255,
        ];
        let mut dst = vec![0u8; 2 * 2 * 4];
        scale_region(&src, 2, 2, (1, 1, 1, 1), &mut dst, 2, 2, 2.0, Filter::Nearest);
        for px in dst.chunks_exact(4) {
            assert_eq!(px, &[4, 4, 4, 255]);
        }
    }
}
