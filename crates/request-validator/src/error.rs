//! Validation Error Types

use thiserror::Error;

/// Errors raised while validating a prediction request
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// Body is not a JSON object
    #[error("The input data must be a valid dictionary.")]
    InvalidInputShape,

    /// Keys outside the allow-list
    #[error(
        "Invalid fields provided: {}. Allowed fields are: {}.",
        braced(.fields),
        braced(.allowed)
    )]
    UnknownField {
        fields: Vec<String>,
        allowed: Vec<&'static str>,
    },

    /// No truthy value in the request
    #[error("At least one feature must be provided.")]
    NoFeaturesProvided,

    /// Present value that cannot be read as a number
    #[error("{field} must be a number, got {value}")]
    InvalidFieldValue { field: &'static str, value: String },
}

impl ValidationError {
    /// Whether the request was well-formed JSON of the right shape but carried
    /// an unusable value (as opposed to a shape or key problem)
    pub fn is_unprocessable(&self) -> bool {
        matches!(self, ValidationError::InvalidFieldValue { .. })
    }
}

fn braced<S: AsRef<str>>(items: &[S]) -> String {
    let joined = items
        .iter()
        .map(|s| s.as_ref())
        .collect::<Vec<_>>()
        .join(", ");
    format!("{{{}}}", joined)
}
