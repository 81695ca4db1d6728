//! Error types raised while configuring the top-picks scorer.
#![forbid(unsafe_code)]

use thiserror::Error;

/// Errors raised when validating [`ScoreWeights`](crate::ScoreWeights).
#[derive(Debug, Error, PartialEq)]
pub enum ScoreWeightsError {
    /// A weight was negative or not finite.
    #[error("score weight {name} must be finite and non-negative (got {value})")]
    InvalidWeight {
        /// Name of the offending weight.
        name: &'static str,
        /// Supplied value.
        value: f64,
    },
    /// The recency window was zero or negative.
    #[error("recency window must be positive")]
    EmptyRecencyWindow,
    /// The algorithm tag was blank.
    #[error("algorithm version tag must not be blank")]
    BlankAlgorithmVersion,
}
