use thiserror::Error;

/// Rejections at the parameter-input boundary.
///
/// Values that can be corrected (radius floors, torus ordering, transparency range)
/// are clamped silently instead; only inputs with no sensible correction end up here.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParameterError {
    #[error("unknown {kind} '{value}'")]
    UnknownTag { kind: &'static str, value: String },
    #[error("{name} must be finite, got {value}")]
    NonFinite { name: &'static str, value: f64 },
    #[error("{name} must be positive, got {value}")]
    NonPositive { name: &'static str, value: f64 },
}

pub type ParameterResult<T> = Result<T, ParameterError>;
