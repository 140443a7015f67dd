//! Engine-wide error taxonomy.

use thiserror::Error;

/// Transport-agnostic error kinds raised by the billing engine.
///
/// C1–C5 and the store layer propagate these with `?`; C6/C7/C8 catch them at
/// their boundary and fold them into a structured outcome instead of letting
/// them escape as unhandled failures.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// Referenced entity does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Input violates a declared range or format.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Precondition on entity state failed.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// Optimistic-concurrency mismatch, or a capacity/allocation rule was exceeded.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Any other failure (storage unreachable, internal invariant violation).
    #[error("internal error: {0}")]
    Internal(String),
}

/// Result type used throughout the engine.
pub type EngineResult<T> = Result<T, EngineError>;
