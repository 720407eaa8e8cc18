//! Error types for metric evaluation.
//!
//! Only two conditions are fatal: a broken configuration at initialization
//! time, and an evaluation pass that produced too few usable samples.
//! Per-sample conditions (a point mapping outside the moving image or
//! outside a transform's support region) are signaled through return values
//! and handled by the caller, never through these errors.

use thiserror::Error;

/// Main error type for metric evaluation.
#[derive(Error, Debug)]
pub enum MetricError {
    /// A mandatory collaborator is missing or incompatible.
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// Too few samples produced usable values during an evaluation pass.
    #[error(
        "Too few valid samples: found {found} of {wanted} attempted \
         (required ratio {required_ratio})"
    )]
    InsufficientSamples {
        /// Number of samples attempted.
        wanted: usize,
        /// Number of samples that produced usable values.
        found: usize,
        /// Configured minimum ratio of found to wanted.
        required_ratio: f64,
    },
}

/// Result type for metric evaluation.
pub type Result<T> = std::result::Result<T, MetricError>;

impl MetricError {
    /// Create a configuration error.
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }
}
