//! ONNX Regressor Implementation

use request_validator::FEATURE_COUNT;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use tract_onnx::prelude::*;

use crate::{InferenceError, ModelProvider};

type Plan = TypedRunnableModel<TypedModel>;

/// Regression model compiled from an ONNX graph taking a `[1, 8]` f32 row
pub struct OnnxRegressor {
    /// Source artifact path
    model_path: PathBuf,
    /// Display name (file name of the artifact)
    name: String,
    /// Optimized, runnable plan
    plan: Plan,
}

impl OnnxRegressor {
    /// Load and optimize the model at `path`
    pub fn load(path: impl AsRef<Path>) -> Result<Self, InferenceError> {
        let model_path = path.as_ref().to_path_buf();
        info!("Loading regression model from {}", model_path.display());

        let plan = compile(&model_path).map_err(|e| {
            InferenceError::ModelLoadError(format!("{}: {:#}", model_path.display(), e))
        })?;

        let name = model_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| model_path.display().to_string());

        info!("Model loaded successfully.");
        Ok(Self {
            model_path,
            name,
            plan,
        })
    }

    /// Get model path
    pub fn model_path(&self) -> &Path {
        &self.model_path
    }
}

impl ModelProvider for OnnxRegressor {
    fn predict(&self, row: &[f64; FEATURE_COUNT]) -> Result<f64, InferenceError> {
        let start = std::time::Instant::now();

        let data: Vec<f32> = row.iter().map(|v| *v as f32).collect();
        let input = Tensor::from_shape(&[1, FEATURE_COUNT], &data)
            .map_err(|e| InferenceError::InferenceFailed(format!("{:#}", e)))?;

        let outputs = self
            .plan
            .run(tvec!(input.into()))
            .map_err(|e| InferenceError::InferenceFailed(format!("{:#}", e)))?;

        let output = outputs
            .first()
            .ok_or(InferenceError::InvalidOutputShape { actual: Vec::new() })?;
        let value = scalar_output(output)?;

        debug!("Inference completed in {}us", start.elapsed().as_micros());
        Ok(value)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

fn compile(path: &Path) -> TractResult<Plan> {
    tract_onnx::onnx()
        .model_for_path(path)?
        .with_input_fact(0, f32::fact([1, FEATURE_COUNT]).into())?
        .into_optimized()?
        .into_runnable()
}

/// Read the single value out of a model output tensor
fn scalar_output(tensor: &Tensor) -> Result<f64, InferenceError> {
    if tensor.len() != 1 {
        return Err(InferenceError::InvalidOutputShape {
            actual: tensor.shape().to_vec(),
        });
    }

    let cast = tensor
        .cast_to::<f64>()
        .map_err(|e| InferenceError::InferenceFailed(format!("{:#}", e)))?;
    let value = cast
        .as_slice::<f64>()
        .map_err(|e| InferenceError::InferenceFailed(format!("{:#}", e)))?[0];

    if !value.is_finite() {
        return Err(InferenceError::NonFiniteOutput(value));
    }
    Ok(value)
}
