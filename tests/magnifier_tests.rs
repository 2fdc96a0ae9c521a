use fbviz::compositor::compose;
use fbviz::magnifier::{clamp_crop, MagnifierView, MAGNIFICATION};
use fbviz::pixel::PixelBuffer;

/// Display image with a distinct color per pixel, composed at 1:1 scale.
fn checkered_display(w: u32, h: u32) -> fbviz::compositor::DisplayImage {
    let mut buffer = PixelBuffer::allocate(w, h, w);
    for y in 0..h {
        for x in 0..w {
            let i = (y * w + x) as usize;
            buffer.pixels_mut()[i] = (x & 0xff) | ((y & 0xff) << 8) | 0x0040_0000;
        }
    }
    compose(&buffer, w, h)
}

// ============================================================================
// Crop geometry properties
// ============================================================================

#[test]
fn test_crop_rectangle_always_inside_source() {
    for (src_w, src_h) in [(256, 400), (400, 500), (40, 30), (10, 10)] {
        for d in [8, 20, 40] {
            for px in (-30..(src_w as i32 + 30)).step_by(17) {
                for py in (-30..(src_h as i32 + 30)).step_by(13) {
                    let (x, y, eff) = clamp_crop(px, py, d, src_w, src_h);
                    assert!(
                        x + eff <= src_w && y + eff <= src_h,
                        "crop ({x},{y},{eff}) escapes {src_w}x{src_h} for pointer ({px},{py})"
                    );
                }
            }
        }
    }
}

#[test]
fn test_crop_shrinks_to_smallest_source_dimension() {
    for (src_w, src_h, nominal, expected) in [
        (10u32, 400u32, 20u32, 10u32),
        (400, 8, 20, 8),
        (6, 4, 20, 4),
        (256, 400, 20, 20),
    ] {
        let (_, _, d) = clamp_crop(0, 0, nominal, src_w, src_h);
        assert_eq!(d, expected.min(nominal));
    }
}

#[test]
fn test_crop_side_and_corner_clamping() {
    // Magnifier viewport 100x100 over a 256x400 display image.
    let view = MagnifierView::new();
    view.resize(100, 100);
    assert_eq!(view.crop_side(), 20);

    assert_eq!(clamp_crop(0, 0, 20, 256, 400), (0, 0, 20));
    assert_eq!(clamp_crop(255, 399, 20, 256, 400), (236, 380, 20));
}

// ============================================================================
// Drawing
// ============================================================================

#[test]
fn test_draw_magnifies_each_source_pixel_into_a_block() {
    let display = checkered_display(64, 64);
    let view = MagnifierView::new();
    view.resize(100, 100);
    view.draw(&display, 16, 24, 20);

    view.with_image(|image| {
        let m = MAGNIFICATION;
        // Every 5x5 destination block comes from one source pixel.
        for (bx, by) in [(0u32, 0u32), (3, 7), (19, 19)] {
            let src_x = (16 + bx) as usize;
            let src_y = (24 + by) as usize;
            let expected = [src_x as u8, src_y as u8, 0x40, 0xff];
            let at = ((by * m + m / 2) as usize * image.width() as usize
                + (bx * m + m / 2) as usize)
                * 4;
            assert_eq!(&image.pixels()[at..at + 4], &expected, "block ({bx},{by})");
        }
    })
    .unwrap();
}

#[test]
fn test_shrunk_crop_leaves_rest_of_inset_clear() {
    // Source smaller than the nominal crop: content covers d * 5 pixels,
    // the remainder of the inset stays transparent.
    let display = checkered_display(10, 10);
    let view = MagnifierView::new();
    view.resize(100, 100);
    let (x, y, d) = clamp_crop(5, 5, view.crop_side(), 10, 10);
    assert_eq!(d, 10);
    view.draw(&display, x, y, d);

    view.with_image(|image| {
        // 10 * 5 = 50 content columns; column 60 is past the content.
        let at = (10 * image.width() as usize + 60) * 4;
        assert_eq!(&image.pixels()[at..at + 4], &[0, 0, 0, 0]);
        assert_ne!(&image.pixels()[0..4], &[0, 0, 0, 0]);
    })
    .unwrap();
}

#[test]
fn test_crop_side_follows_viewport_resizes() {
    let view = MagnifierView::new();
    view.resize(100, 100);
    assert_eq!(view.crop_side(), 20);
    view.resize(250, 250);
    assert_eq!(view.crop_side(), 50);
    view.resize(60, 60);
    assert_eq!(view.crop_side(), 12);
}
