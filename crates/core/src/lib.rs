//! Core preprocessing and inference plumbing for the visage pipeline.
//!
//! This crate owns everything between a raw [`visage_common::Frame`] and the
//! decoded model outputs the task crates consume:
//!
//! - [`resample`] - deterministic bilinear resize to the model input size
//! - [`tensor`] - NHWC tensor construction with the two normalization
//!   policies the downstream models require
//! - [`adapter`] - the opaque [`InferenceAdapter`] contract plus a canned
//!   adapter for tests and examples
//! - [`onnx`] - the ONNX Runtime implementation of the adapter
//!
//! The numeric stages are pure functions: the same frame always produces the
//! same tensor, bit for bit, regardless of host platform.

pub mod adapter;
pub mod onnx;
pub mod resample;
pub mod tensor;

pub use adapter::{FixedOutputAdapter, InferenceAdapter, InferenceError, InferenceOutputs};
pub use onnx::OnnxAdapter;
pub use resample::resize;
pub use tensor::{grayscale_plane, rgb_plane, OutputTensor, TensorError};
