use std::sync::Mutex;

use crate::compositor::{scale_region, DisplayImage, Filter};

/// Fixed enlargement factor of the magnifier inset.
pub const MAGNIFICATION: u32 = 5;

/// The last-drawn enlarged crop, sized to the magnifier viewport.
#[derive(Debug, Clone, PartialEq)]
pub struct MagnifiedImage {
    pixels: Vec<u8>,
    width: u32,
    height: u32,
}

impl MagnifiedImage {
    fn new(width: u32, height: u32) -> Self {
        Self {
            pixels: vec![0; width as usize * height as usize * 4],
            width,
            height,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Premultiplied RGBA bytes, `width * height * 4` long.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }
}

/// Pointer-following magnifier over the current DisplayImage.
///
/// `draw()` and the paint path share the image lock, so a repaint never
/// observes a half-drawn crop. Until `resize()` has been called (viewport
/// not laid out yet) every operation is a no-op.
pub struct MagnifierView {
    image: Mutex<Option<MagnifiedImage>>,
}

impl MagnifierView {
    pub fn new() -> Self {
        Self {
            image: Mutex::new(None),
        }
    }

    /// Recreate the magnified image for a new viewport size. Content is
    /// cleared until the next draw.
    pub fn resize(&self, width: u32, height: u32) {
        let mut image = self.image.lock().unwrap();
        *image = Some(MagnifiedImage::new(width, height));
    }

    /// Nominal crop side length, one fifth of the magnifier viewport
    /// width. Derived from the live image on every call; zero before the
    /// first resize.
    pub fn crop_side(&self) -> u32 {
        self.image
            .lock()
            .unwrap()
            .as_ref()
            .map(|image| image.width() / MAGNIFICATION)
            .unwrap_or(0)
    }

    /// Redraw the magnified image from the `d x d` crop of `source` at
    /// (x, y), enlarged by the fixed factor. No-op before layout.
    pub fn draw(&self, source: &DisplayImage, x: u32, y: u32, d: u32) {
        let mut guard = self.image.lock().unwrap();
        let Some(image) = guard.as_mut() else {
            return;
        };
        let (width, height) = (image.width, image.height);
        image.pixels.fill(0);
        scale_region(
            source.pixels(),
            source.width(),
            source.height(),
            (x, y, d, d),
            &mut image.pixels,
            width,
            height,
            MAGNIFICATION as f64,
            Filter::Nearest,
        );
    }

    /// Paint-path read of the magnified image, inside the shared lock.
    pub fn with_image<R>(&self, f: impl FnOnce(&MagnifiedImage) -> R) -> Option<R> {
        self.image.lock().unwrap().as_ref().map(f)
    }
}

impl Default for MagnifierView {
    fn default() -> Self {
        Self::new()
    }
}

/// Clamp the nominal `d x d` crop window centered on the pointer so it
/// never leaves the source bounds, shrinking `d` when the source is
/// smaller than the nominal crop. Returns `(x, y, d)`.
pub fn clamp_crop(px: i32, py: i32, d: u32, src_w: u32, src_h: u32) -> (u32, u32, u32) {
    let mut d = d as i32;
    let (src_w, src_h) = (src_w as i32, src_h as i32);

    let mut x = px - d / 2;
    if x + d > src_w {
        x = src_w - d;
    }
    if x < 0 {
        x = 0;
    }
    let mut y = py - d / 2;
    if y + d > src_h {
        y = src_h - d;
    }
    if y < 0 {
        y = 0;
    }
    if src_w < d {
        d = src_w;
    }
    if src_h < d {
        d = src_h;
    }
    (x as u32, y as u32, d.max(0) as u32)
}
