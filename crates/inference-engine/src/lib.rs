//! ONNX Inference Engine
//!
//! Loads a pre-trained regression graph once and evaluates it on single
//! feature rows using tract-onnx.

mod engine;
mod provider;

pub use engine::OnnxRegressor;
pub use provider::ModelProvider;

use thiserror::Error;

/// Errors during model loading or inference
#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("Model load failed: {0}")]
    ModelLoadError(String),
    #[error("Inference failed: {0}")]
    InferenceFailed(String),
    #[error("Invalid output shape: expected a single value, got {actual:?}")]
    InvalidOutputShape { actual: Vec<usize> },
    #[error("Model produced a non-finite value: {0}")]
    NonFiniteOutput(f64),
}
