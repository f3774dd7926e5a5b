use thiserror::Error;

/// Result type for per-image fusion.
pub type FusionResult<T> = std::result::Result<T, FusionError>;

/// Input-validation failures that abort fusion of one image.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FusionError {
    /// Class-vector widths disagree between modalities or detections.
    #[error("Shape mismatch in {field}: expected width {expected}, found {found}")]
    ShapeMismatch {
        field: &'static str,
        expected: usize,
        found: usize,
    },

    /// The strategy needs a vector the detection does not carry.
    #[error("Detection {index} is missing {field} required by strategy {method}")]
    MissingField {
        field: &'static str,
        index: usize,
        method: &'static str,
    },

    /// Non-finite or out-of-range score, probability or logit.
    #[error("Invalid {what} at detection {index}: {value}")]
    InvalidScore {
        what: &'static str,
        index: usize,
        value: f64,
    },

    /// Class id does not index the class vectors.
    #[error("Class id {class_id} of detection {index} is outside {num_classes} classes")]
    ClassOutOfRange {
        class_id: usize,
        index: usize,
        num_classes: usize,
    },

    /// The run configuration failed [`FusionConfig::validate`](crate::common::FusionConfig::validate).
    #[error("Invalid fusion config: {0}")]
    InvalidConfig(String),
}
