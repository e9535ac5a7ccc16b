//! Model Provider Seam

use request_validator::FEATURE_COUNT;

use crate::InferenceError;

/// A loaded regression model that maps one feature row to one scalar.
///
/// Implementations are read-only after construction and shared across
/// request handlers without locking.
pub trait ModelProvider: Send + Sync {
    /// Evaluate the model on a single row in fixed feature order
    fn predict(&self, row: &[f64; FEATURE_COUNT]) -> Result<f64, InferenceError>;

    /// Short human-readable name of the loaded artifact
    fn name(&self) -> &str;
}
