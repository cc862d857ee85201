//! Source locations attached to IR nodes.

use serde::{Deserialize, Serialize};

/// A source location carried by an IR node.
///
/// Locations survive elaboration and every transformation so diagnostics can
/// point back at the original text. Transformations that synthesize nodes
/// leave the location unset; the inliner backfills unset locations with the
/// call site's location.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct SourceSpan {
    /// Index of the source file in the session's file table.
    pub fileno: u32,
    /// One-based line number.
    pub lineno: u32,
    /// One-based column number.
    pub colno: u32,
}

impl SourceSpan {
    /// Creates a new source span.
    pub fn new(fileno: u32, lineno: u32, colno: u32) -> Self {
        Self {
            fileno,
            lineno,
            colno,
        }
    }
}

impl std::fmt::Display for SourceSpan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}:{}", self.fileno, self.lineno, self.colno)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_format() {
        let span = SourceSpan::new(1, 12, 7);
        assert_eq!(format!("{span}"), "1:12:7");
    }

    #[test]
    fn serde_roundtrip() {
        let span = SourceSpan::new(0, 3, 14);
        let json = serde_json::to_string(&span).unwrap();
        let back: SourceSpan = serde_json::from_str(&json).unwrap();
        assert_eq!(span, back);
    }
}
