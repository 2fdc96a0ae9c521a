/// Red channel mask of the packed framebuffer format.
pub const RED_MASK: u32 = 0x0000_00ff;
/// Green channel mask of the packed framebuffer format.
pub const GREEN_MASK: u32 = 0x0000_ff00;
/// Blue channel mask of the packed framebuffer format.
pub const BLUE_MASK: u32 = 0x00ff_0000;
/// Significant bits per pixel (the top byte is unused by the engine).
pub const BITS_PER_PIXEL: u32 = 24;

/// One rendered frame: a row-major array of packed 0x00BBGGRR pixels plus
/// the geometry it was allocated for.
///
/// Buffers are allocated zero-filled and never resized in place; a new
/// target size means a new buffer. Invariant: `len == height * line_stride`
/// with `line_stride >= width`.
#[derive(Debug, Clone)]
pub struct PixelBuffer {
    pixels: Vec<u32>,
    width: u32,
    height: u32,
    line_stride: u32,
}

impl PixelBuffer {
    /// Allocate a zero-initialized buffer of `height * line_stride` cells.
    pub fn allocate(width: u32, height: u32, line_stride: u32) -> Self {
        debug_assert!(line_stride >= width, "line_stride must cover a full row");
        Self {
            pixels: vec![0; height as usize * line_stride as usize],
            width,
            height,
            line_stride,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn line_stride(&self) -> u32 {
        self.line_stride
    }

    /// True if the buffer covers no pixels (degenerate geometry).
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn pixels(&self) -> &[u32] {
        &self.pixels
    }

    /// Mutable pixel storage, handed to the render engine during a fill.
    pub fn pixels_mut(&mut self) -> &mut [u32] {
        &mut self.pixels
    }

    /// Packed pixel at (x, y). Callers stay within `width x height`.
    pub fn pixel(&self, x: u32, y: u32) -> u32 {
        self.pixels[y as usize * self.line_stride as usize + x as usize]
    }

    /// Convert the visible `width x height` region to tightly packed RGBA
    /// bytes (opaque alpha), dropping any stride padding.
    pub fn to_rgba(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.width as usize * self.height as usize * 4);
        for y in 0..self.height {
            let row = y as usize * self.line_stride as usize;
            for x in 0..self.width {
                let px = self.pixels[row + x as usize];
                out.push((px & RED_MASK) as u8);
                out.push(((px & GREEN_MASK) >> 8) as u8);
                out.push(((px & BLUE_MASK) >> 16) as u8);
                out.push(0xff);
            }
        }
        out
    }
}
