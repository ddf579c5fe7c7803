//! ONNX Runtime implementation of the inference adapter.
//!
//! Sessions are built with maximum graph optimization, intra-op threads set
//! to the physical CPU count, and CUDA tried before the CPU fallback. The
//! expected NHWC input shape is part of the adapter configuration; every
//! input is validated against it before hitting the runtime.

use std::path::Path;

use ndarray::Array4;
use ort::execution_providers::{CPUExecutionProvider, CUDAExecutionProvider};
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::TensorRef;
use tracing::{debug, info};

use crate::adapter::{check_input_shape, InferenceAdapter, InferenceError, InferenceOutputs};
use crate::tensor::OutputTensor;

/// [`InferenceAdapter`] backed by an ONNX Runtime session
pub struct OnnxAdapter {
    session: Session,
    input_name: String,
    input_shape: [usize; 4],
}

impl OnnxAdapter {
    /// Load an ONNX model and configure it for a fixed NHWC input shape.
    ///
    /// Load failures are configuration faults: the returned error carries
    /// the model path and the runtime's diagnostic, and the caller is
    /// expected to halt rather than retry.
    pub fn new<P: AsRef<Path>>(
        model_path: P,
        input_shape: [usize; 4],
    ) -> Result<Self, InferenceError> {
        let model_path = model_path.as_ref();

        if !model_path.exists() {
            return Err(InferenceError::ModelNotFound(
                model_path.display().to_string(),
            ));
        }

        info!("Loading ONNX model from {}", model_path.display());

        let map_load = |e: ort::Error| InferenceError::ModelLoad {
            path: model_path.display().to_string(),
            error: e.to_string(),
        };

        let session = Session::builder()
            .map_err(map_load)?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(map_load)?
            .with_intra_threads(num_cpus::get_physical())
            .map_err(map_load)?
            .with_memory_pattern(true)
            .map_err(map_load)?
            .with_execution_providers([
                CUDAExecutionProvider::default().build(),
                CPUExecutionProvider::default().build(),
            ])
            .map_err(map_load)?
            .commit_from_file(model_path)
            .map_err(map_load)?;

        let input_name = session
            .inputs
            .first()
            .ok_or_else(|| InferenceError::ModelLoad {
                path: model_path.display().to_string(),
                error: "model declares no inputs".to_string(),
            })?
            .name
            .clone();

        info!(
            "Model loaded (input {:?}, shape {:?}, outputs: {})",
            input_name,
            input_shape,
            session.outputs.len()
        );

        Ok(Self {
            session,
            input_name,
            input_shape,
        })
    }
}

impl InferenceAdapter for OnnxAdapter {
    fn input_shape(&self) -> [usize; 4] {
        self.input_shape
    }

    fn run(&mut self, input: &Array4<f32>) -> Result<InferenceOutputs, InferenceError> {
        check_input_shape(self.input_shape, input)?;

        let input_tensor = TensorRef::from_array_view(input.view())
            .map_err(|e| InferenceError::Execution(e.to_string()))?;

        let session_outputs = self
            .session
            .run(ort::inputs![&*self.input_name => input_tensor])
            .map_err(|e| InferenceError::Execution(e.to_string()))?;

        let mut outputs = Vec::new();
        for (name, value) in session_outputs.iter() {
            let (shape, data) = value
                .try_extract_tensor::<f32>()
                .map_err(|e| InferenceError::Execution(e.to_string()))?;
            let shape: Vec<usize> = shape.iter().map(|&d| d as usize).collect();
            outputs.push((name.to_string(), OutputTensor::new(shape, data.to_vec())?));
        }

        debug!("Inference produced {} output tensor(s)", outputs.len());

        Ok(InferenceOutputs::new(outputs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_model_file() {
        let result = OnnxAdapter::new("nonexistent_model.onnx", [1, 64, 64, 1]);
        assert!(matches!(result, Err(InferenceError::ModelNotFound(_))));
    }
}
