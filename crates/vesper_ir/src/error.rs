//! Error types for IR construction and traversal.

/// The result type for fallible IR operations.
pub type IrResult<T> = Result<T, IrError>;

/// Errors raised by IR construction, mutation, and diffing.
#[derive(Debug, thiserror::Error)]
pub enum IrError {
    /// A structural invariant of the IR was violated: an operand reference
    /// that does not resolve, a duplicate assigned name, a removal while
    /// uses remain, or a leftover invoke after inlining.
    #[error("IR invariant violated: {0}")]
    InvariantViolation(String),

    /// The requested operation is recognized but not supported.
    #[error("{0}")]
    Unimplemented(String),

    /// Textual input (e.g. a typed value literal) could not be parsed.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}
