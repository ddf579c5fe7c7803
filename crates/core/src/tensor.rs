//! NHWC tensor construction and network output buffers.
//!
//! Two normalization policies coexist because the two downstream models
//! expect different layouts:
//!
//! - [`grayscale_plane`]: luma in `[-1, 1]`, shape `(1, H, W, 1)` - the
//!   emotion classifier input
//! - [`rgb_plane`]: per-channel `(v - 127) / 128`, shape `(1, H, W, 3)` -
//!   the face detector input
//!
//! Both write row-major in exactly the declared NHWC order. Keeping the
//! declared shape and the write order in lockstep is the single most
//! failure-prone invariant in this subsystem; the tests below pin specific
//! indices of a gradient frame to catch any transposition.

use ndarray::Array4;
use thiserror::Error;
use visage_common::Frame;

/// Errors raised while handling tensors
#[derive(Debug, Error)]
pub enum TensorError {
    #[error("Tensor data length {len} does not match shape {shape:?}")]
    LengthMismatch { shape: Vec<usize>, len: usize },

    #[error("Unexpected tensor shape: expected {expected}, got {actual:?}")]
    ShapeMismatch { expected: String, actual: Vec<usize> },
}

/// A network output tensor: a flat f32 buffer plus its declared shape.
///
/// Length is validated against the shape product at construction, so
/// decoders can index `data` by flattened offsets without re-checking.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputTensor {
    shape: Vec<usize>,
    data: Vec<f32>,
}

impl OutputTensor {
    /// Create an output tensor, validating `data.len() == product(shape)`
    pub fn new(shape: Vec<usize>, data: Vec<f32>) -> Result<Self, TensorError> {
        let expected: usize = shape.iter().product();
        if data.len() != expected {
            return Err(TensorError::LengthMismatch {
                shape,
                len: data.len(),
            });
        }
        Ok(Self { shape, data })
    }

    /// Declared tensor shape
    #[must_use]
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Flat data buffer, row-major in the declared shape
    #[must_use]
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Interpret the shape as 4 dimensions, or report what it actually is
    pub fn dims4(&self) -> Result<[usize; 4], TensorError> {
        match self.shape.as_slice() {
            &[a, b, c, d] => Ok([a, b, c, d]),
            _ => Err(TensorError::ShapeMismatch {
                expected: "4 dimensions".to_string(),
                actual: self.shape.clone(),
            }),
        }
    }
}

/// Build a grayscale-normalized single-channel tensor, shape `(1, H, W, 1)`.
///
/// Each pixel becomes `(luma - 0.5) * 2` where luma is the Rec. 601 weighted
/// sum `0.299 R + 0.587 G + 0.114 B` over channel values scaled to `[0, 1]`.
/// An all-white frame maps to 1.0 everywhere, an all-black frame to -1.0.
#[must_use]
pub fn grayscale_plane(frame: &Frame) -> Array4<f32> {
    let (width, height) = (frame.width() as usize, frame.height() as usize);
    let mut tensor = Array4::<f32>::zeros((1, height, width, 1));

    for y in 0..height {
        for x in 0..width {
            let [r, g, b] = frame.pixel(x as u32, y as u32);
            let luma = f32::from(r) / 255.0 * 0.299
                + f32::from(g) / 255.0 * 0.587
                + f32::from(b) / 255.0 * 0.114;
            tensor[[0, y, x, 0]] = (luma - 0.5) * 2.0;
        }
    }

    tensor
}

/// Build a per-channel normalized RGB tensor, shape `(1, H, W, 3)`.
///
/// Each 8-bit channel value maps to `(v - 127) / 128`, so 127 lands on 0.0
/// and 255 on exactly 1.0 (the UltraFace-style detector normalization).
#[must_use]
pub fn rgb_plane(frame: &Frame) -> Array4<f32> {
    let (width, height) = (frame.width() as usize, frame.height() as usize);
    let mut tensor = Array4::<f32>::zeros((1, height, width, 3));

    for y in 0..height {
        for x in 0..width {
            let [r, g, b] = frame.pixel(x as u32, y as u32);
            tensor[[0, y, x, 0]] = (f32::from(r) - 127.0) / 128.0;
            tensor[[0, y, x, 1]] = (f32::from(g) - 127.0) / 128.0;
            tensor[[0, y, x, 2]] = (f32::from(b) - 127.0) / 128.0;
        }
    }

    tensor
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-6;

    #[test]
    fn test_output_tensor_validates_length() {
        assert!(OutputTensor::new(vec![1, 1, 2, 2], vec![0.0; 4]).is_ok());
        let err = OutputTensor::new(vec![1, 1, 2, 2], vec![0.0; 5]);
        assert!(matches!(err, Err(TensorError::LengthMismatch { .. })));
    }

    #[test]
    fn test_output_tensor_dims4() {
        let t = OutputTensor::new(vec![1, 1, 3, 2], vec![0.0; 6]).unwrap();
        assert_eq!(t.dims4().unwrap(), [1, 1, 3, 2]);

        let t = OutputTensor::new(vec![8], vec![0.0; 8]).unwrap();
        assert!(t.dims4().is_err());
    }

    #[test]
    fn test_grayscale_white_frame_is_one() {
        let frame = Frame::solid(4, 3, [255, 255, 255]).unwrap();
        let tensor = grayscale_plane(&frame);
        assert_eq!(tensor.shape(), &[1, 3, 4, 1]);
        for &v in tensor.iter() {
            assert!((v - 1.0).abs() < EPSILON);
        }
    }

    #[test]
    fn test_grayscale_black_frame_is_minus_one() {
        let frame = Frame::solid(4, 3, [0, 0, 0]).unwrap();
        let tensor = grayscale_plane(&frame);
        for &v in tensor.iter() {
            assert!((v + 1.0).abs() < EPSILON);
        }
    }

    #[test]
    fn test_rgb_midpoint_and_max_values() {
        let frame = Frame::rgb(2, 1, vec![127, 127, 127, 255, 255, 255]).unwrap();
        let tensor = rgb_plane(&frame);
        assert_eq!(tensor.shape(), &[1, 1, 2, 3]);
        for c in 0..3 {
            assert!(tensor[[0, 0, 0, c]].abs() < EPSILON);
            assert!((tensor[[0, 0, 1, c]] - 1.0).abs() < EPSILON);
        }
    }

    #[test]
    fn test_rgb_write_order_matches_declared_shape() {
        // Non-square frame with a distinct value per pixel and channel; a
        // transposed write would land these at different NHWC indices
        let frame = Frame::rgb(
            3,
            2,
            vec![
                0, 1, 2, 10, 11, 12, 20, 21, 22, //
                100, 101, 102, 110, 111, 112, 120, 121, 122,
            ],
        )
        .unwrap();
        let tensor = rgb_plane(&frame);
        assert_eq!(tensor.shape(), &[1, 2, 3, 3]);

        let expect = |v: u8| (f32::from(v) - 127.0) / 128.0;
        assert!((tensor[[0, 0, 0, 0]] - expect(0)).abs() < EPSILON);
        assert!((tensor[[0, 0, 2, 1]] - expect(21)).abs() < EPSILON);
        assert!((tensor[[0, 1, 0, 2]] - expect(102)).abs() < EPSILON);
        assert!((tensor[[0, 1, 2, 0]] - expect(120)).abs() < EPSILON);

        // Flat layout agrees: the standard ndarray iteration order is the
        // row-major order the adapters hand to the network
        let flat: Vec<f32> = tensor.iter().copied().collect();
        assert!((flat[0] - expect(0)).abs() < EPSILON);
        assert!((flat[5] - expect(12)).abs() < EPSILON);
        assert!((flat[9] - expect(100)).abs() < EPSILON);
    }

    #[test]
    fn test_grayscale_write_order_matches_declared_shape() {
        let mut data = vec![0u8; 2 * 3 * 3];
        // Only the pixel at (x=1, y=2) is white
        let offset = (2 * 2 + 1) * 3;
        data[offset] = 255;
        data[offset + 1] = 255;
        data[offset + 2] = 255;
        let frame = Frame::rgb(2, 3, data).unwrap();

        let tensor = grayscale_plane(&frame);
        assert_eq!(tensor.shape(), &[1, 3, 2, 1]);
        assert!((tensor[[0, 2, 1, 0]] - 1.0).abs() < EPSILON);
        assert!((tensor[[0, 2, 0, 0]] + 1.0).abs() < EPSILON);
        assert!((tensor[[0, 1, 1, 0]] + 1.0).abs() < EPSILON);
    }
}
