//! The opaque inference contract.
//!
//! The pipeline never depends on a specific inference runtime's types: it
//! hands an NHWC `Array4<f32>` to an [`InferenceAdapter`] and gets back a
//! set of named [`OutputTensor`]s. The ONNX Runtime implementation lives in
//! [`crate::onnx`]; [`FixedOutputAdapter`] provides canned outputs for tests
//! and examples.

use ndarray::Array4;
use thiserror::Error;

use crate::tensor::{OutputTensor, TensorError};

/// Errors raised while loading models or executing inference
#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("Failed to load model from {path}: {error}")]
    ModelLoad { path: String, error: String },

    #[error("Model file not found: {0}")]
    ModelNotFound(String),

    #[error("Input shape mismatch: model expects {expected:?}, got {actual:?}")]
    InputShapeMismatch {
        expected: [usize; 4],
        actual: Vec<usize>,
    },

    #[error("Inference execution failed: {0}")]
    Execution(String),

    #[error("Model output {0:?} not found")]
    MissingOutput(String),

    #[error("Tensor error: {0}")]
    Tensor(#[from] TensorError),
}

/// Output tensors of one inference call, keyed by name and position
#[derive(Debug, Clone, Default)]
pub struct InferenceOutputs {
    outputs: Vec<(String, OutputTensor)>,
}

impl InferenceOutputs {
    #[must_use]
    pub fn new(outputs: Vec<(String, OutputTensor)>) -> Self {
        Self { outputs }
    }

    /// Look up an output tensor by name
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&OutputTensor> {
        self.outputs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, t)| t)
    }

    /// Look up by name, falling back to position for models whose exported
    /// output names differ from the conventional ones
    pub fn named_or(&self, name: &str, index: usize) -> Result<&OutputTensor, InferenceError> {
        self.get(name)
            .or_else(|| self.outputs.get(index).map(|(_, t)| t))
            .ok_or_else(|| InferenceError::MissingOutput(name.to_string()))
    }

    /// First output, for single-output models
    pub fn first(&self) -> Result<&OutputTensor, InferenceError> {
        self.outputs
            .first()
            .map(|(_, t)| t)
            .ok_or_else(|| InferenceError::MissingOutput("<first>".to_string()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.outputs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.outputs.is_empty()
    }
}

/// Opaque interface to a neural network.
///
/// One input tensor in, one or more named output tensors out. Shapes are
/// fixed per loaded model; every input is validated against
/// [`InferenceAdapter::input_shape`] before execution, so a mismatch
/// surfaces as a configuration fault rather than undefined model behavior.
pub trait InferenceAdapter {
    /// The NHWC input shape the model was configured for
    fn input_shape(&self) -> [usize; 4];

    /// Execute one inference call
    fn run(&mut self, input: &Array4<f32>) -> Result<InferenceOutputs, InferenceError>;
}

/// Validate an input tensor against the adapter's configured shape
pub fn check_input_shape(
    expected: [usize; 4],
    input: &Array4<f32>,
) -> Result<(), InferenceError> {
    if input.shape() != expected.as_slice() {
        return Err(InferenceError::InputShapeMismatch {
            expected,
            actual: input.shape().to_vec(),
        });
    }
    Ok(())
}

/// Adapter that returns pre-recorded outputs regardless of input content.
///
/// Input shape is still validated, so preprocessing bugs surface the same
/// way they would against a real model. Used by unit tests and the
/// synthetic pipeline example; no inference runtime is involved.
#[derive(Debug, Clone)]
pub struct FixedOutputAdapter {
    input_shape: [usize; 4],
    outputs: Vec<(String, OutputTensor)>,
}

impl FixedOutputAdapter {
    #[must_use]
    pub fn new(input_shape: [usize; 4], outputs: Vec<(String, OutputTensor)>) -> Self {
        Self {
            input_shape,
            outputs,
        }
    }
}

impl InferenceAdapter for FixedOutputAdapter {
    fn input_shape(&self) -> [usize; 4] {
        self.input_shape
    }

    fn run(&mut self, input: &Array4<f32>) -> Result<InferenceOutputs, InferenceError> {
        check_input_shape(self.input_shape, input)?;
        Ok(InferenceOutputs::new(self.outputs.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scores_tensor() -> OutputTensor {
        OutputTensor::new(vec![1, 8], vec![0.0; 8]).unwrap()
    }

    #[test]
    fn test_outputs_lookup_by_name_and_position() {
        let outputs = InferenceOutputs::new(vec![
            ("confidences".to_string(), scores_tensor()),
            ("boxes".to_string(), scores_tensor()),
        ]);

        assert!(outputs.get("boxes").is_some());
        assert!(outputs.get("scores").is_none());
        // Positional fallback covers renamed exports
        assert!(outputs.named_or("scores", 0).is_ok());
        assert!(outputs.named_or("missing", 5).is_err());
    }

    #[test]
    fn test_first_on_empty_outputs() {
        let outputs = InferenceOutputs::default();
        assert!(matches!(
            outputs.first(),
            Err(InferenceError::MissingOutput(_))
        ));
    }

    #[test]
    fn test_fixed_adapter_validates_input_shape() {
        let mut adapter = FixedOutputAdapter::new(
            [1, 4, 4, 1],
            vec![("scores".to_string(), scores_tensor())],
        );

        let good = Array4::<f32>::zeros((1, 4, 4, 1));
        assert!(adapter.run(&good).is_ok());

        let bad = Array4::<f32>::zeros((1, 4, 4, 3));
        assert!(matches!(
            adapter.run(&bad),
            Err(InferenceError::InputShapeMismatch { .. })
        ));
    }
}
