//! Error types for sample serialization and generation.

use vesper_ir::IrError;

/// Errors raised while decoding or generating samples.
#[derive(Debug, thiserror::Error)]
pub enum SampleError {
    /// The sample text is malformed: a missing or empty config section, an
    /// unknown record field, or an unparseable field value.
    #[error("invalid crasher sample: {0}")]
    InvalidInput(String),

    /// An IR-level error surfaced while parsing values or generating
    /// arguments.
    #[error(transparent)]
    Ir(#[from] IrError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_invalid_input() {
        let err = SampleError::InvalidInput("missing or empty config".to_string());
        assert_eq!(
            format!("{err}"),
            "invalid crasher sample: missing or empty config"
        );
    }
}
