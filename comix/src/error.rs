use thiserror::Error;

/// Precondition violations raised by group statistics and scorers.
///
/// None of these are retryable: each one signals a caller error, and the
/// failing operation leaves the statistics untouched.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum Error {
    /// A categorical value outside `[0, dim)`.
    #[error("category {value} out of range for dimension {dim}")]
    OutOfRange { value: usize, dim: usize },

    /// An operation that would imply a negative count.
    #[error("invalid operation: {0}")]
    InvalidOperation(&'static str),

    /// A caller-provided buffer whose length disagrees with the model.
    #[error("size mismatch: expected {expected}, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },

    /// A hyperparameter outside its support.
    #[error("invalid hyperparameter: {0}")]
    InvalidHyper(&'static str),
}

pub type Result<T> = std::result::Result<T, Error>;
