//! Error types for placecover operations.

use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, PlaceCoverError>;

/// Errors produced by planning, pagination, and classification.
#[derive(Error, Debug)]
pub enum PlaceCoverError {
    /// Bad geometry, radius, or descriptor input.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Malformed continuation token (missing delimiter, non-numeric index).
    #[error("invalid continuation token: {0}")]
    InvalidToken(String),

    /// A token referenced a plan that is not persisted.
    #[error("plan not found: {0}")]
    PlanNotFound(String),

    /// A places or routing call failed and could not be recovered locally.
    #[error("upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    /// An expected property was missing on a feature, e.g. no coordinates.
    #[error("data inconsistency: {0}")]
    DataInconsistency(String),
}
