//! Request Validation and Defaulting
//!
//! Turns a raw JSON feature map into a fully populated [`FeatureSet`],
//! filling omitted fields with California housing dataset medians.

mod error;
mod features;
mod validator;

pub use error::ValidationError;
pub use features::{FeatureSet, DEFAULTS, FEATURE_COUNT, FEATURE_NAMES};
pub use validator::{is_truthy, Validator};
