//! Error types for the animation engine.
//!
//! None of these escape a frame callback. They are logged where they occur and
//! carried in [`StepOutcome::Degraded`](crate::types::StepOutcome) so callers
//! can tell a clean run from a degraded one.

use thiserror::Error;

/// Result type for engine parsing operations.
pub type Result<T> = std::result::Result<T, AnimeError>;

/// Conditions the engine absorbs instead of aborting a step.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnimeError {
    /// Property key outside the animatable set.
    #[error("unsupported property: {0}")]
    UnsupportedProperty(String),

    /// Property value that does not start with a number.
    #[error("invalid value for {key}: {value:?}")]
    InvalidValue { key: String, value: String },

    /// Unit suffix outside the supported list.
    #[error("unsupported unit: {0:?}")]
    UnsupportedUnit(String),

    /// Easing string that could not be turned into a curve.
    #[error("malformed easing {spec:?}: {reason}")]
    MalformedEasing { spec: String, reason: String },

    /// The step has nothing to animate.
    #[error("no targets to animate")]
    NoTargets,
}
