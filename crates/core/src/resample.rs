//! Bilinear image resampling.
//!
//! The pipeline needs bit-for-bit reproducible preprocessing, so the resize
//! is implemented here rather than delegated to a library filter whose
//! kernel may change between releases. The sampling rule is fixed: each
//! destination pixel (x, y) maps to source coordinate
//! `(x * srcW / dstW, y * srcH / dstH)` and blends the four neighboring
//! source pixels by the fractional offsets. Neighbor indices are clamped to
//! the source bounds, and the target aspect ratio is never preserved - the
//! output always stretches to exactly `target_w x target_h`.

use visage_common::Frame;

/// Resize a frame to the exact target dimensions with bilinear sampling.
///
/// Pure function: no side effects, and a frame already at the target size
/// passes through unchanged (the fractional weights collapse to zero).
/// The output is always `PixelFormat::Rgb8`; alpha channels are dropped.
/// Target dimensions must be nonzero.
#[must_use]
pub fn resize(frame: &Frame, target_w: u32, target_h: u32) -> Frame {
    let src_w = frame.width();
    let src_h = frame.height();

    let scale_x = src_w as f32 / target_w as f32;
    let scale_y = src_h as f32 / target_h as f32;

    let mut data = Vec::with_capacity(target_w as usize * target_h as usize * 3);

    for y in 0..target_h {
        let sy = y as f32 * scale_y;
        let y0 = (sy.floor() as u32).min(src_h - 1);
        let y1 = (y0 + 1).min(src_h - 1);
        let fy = sy - sy.floor();

        for x in 0..target_w {
            let sx = x as f32 * scale_x;
            let x0 = (sx.floor() as u32).min(src_w - 1);
            let x1 = (x0 + 1).min(src_w - 1);
            let fx = sx - sx.floor();

            let p00 = frame.pixel(x0, y0);
            let p10 = frame.pixel(x1, y0);
            let p01 = frame.pixel(x0, y1);
            let p11 = frame.pixel(x1, y1);

            for c in 0..3 {
                let top = f32::from(p00[c]) * (1.0 - fx) + f32::from(p10[c]) * fx;
                let bottom = f32::from(p01[c]) * (1.0 - fx) + f32::from(p11[c]) * fx;
                let value = top * (1.0 - fy) + bottom * fy;
                data.push(value.round().clamp(0.0, 255.0) as u8);
            }
        }
    }

    Frame::rgb(target_w, target_h, data).expect("resampled buffer sized to target dimensions")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient_frame(width: u32, height: u32) -> Frame {
        let mut data = Vec::with_capacity(width as usize * height as usize * 3);
        for y in 0..height {
            for x in 0..width {
                data.push((x * 10) as u8);
                data.push((y * 10) as u8);
                data.push(((x + y) * 5) as u8);
            }
        }
        Frame::rgb(width, height, data).unwrap()
    }

    #[test]
    fn test_identity_on_target_sized_frame() {
        let frame = gradient_frame(8, 6);
        let resized = resize(&frame, 8, 6);
        assert_eq!(resized, frame);
    }

    #[test]
    fn test_downscale_by_two_samples_even_pixels() {
        // scale = 2, so destination (x, y) maps exactly onto source (2x, 2y)
        // with zero fractional weight
        let frame = gradient_frame(8, 8);
        let resized = resize(&frame, 4, 4);
        assert_eq!(resized.width(), 4);
        assert_eq!(resized.height(), 4);
        for y in 0..4 {
            for x in 0..4 {
                assert_eq!(resized.pixel(x, y), frame.pixel(x * 2, y * 2));
            }
        }
    }

    #[test]
    fn test_upscale_interpolates_between_neighbors() {
        // 1x2 black/white strip doubled in width: destination x=1 maps to
        // source 0.5, an even blend of 0 and 255
        let frame = Frame::rgb(2, 1, vec![0, 0, 0, 255, 255, 255]).unwrap();
        let resized = resize(&frame, 4, 1);
        assert_eq!(resized.pixel(0, 0), [0, 0, 0]);
        assert_eq!(resized.pixel(1, 0), [128, 128, 128]);
        assert_eq!(resized.pixel(2, 0), [255, 255, 255]);
    }

    #[test]
    fn test_upscale_clamps_at_right_edge() {
        // destination x=3 maps to source 1.5; the right neighbor clamps to
        // the last column instead of reading out of bounds
        let frame = Frame::rgb(2, 1, vec![0, 0, 0, 255, 255, 255]).unwrap();
        let resized = resize(&frame, 4, 1);
        assert_eq!(resized.pixel(3, 0), [255, 255, 255]);
    }

    #[test]
    fn test_stretches_without_preserving_aspect() {
        let frame = gradient_frame(8, 4);
        let resized = resize(&frame, 3, 9);
        assert_eq!((resized.width(), resized.height()), (3, 9));
    }
}
