//! Error handling for the frontend (spec.md §7).
//!
//! Grounded in `ouros::parse::ParseError`: one variant per error *kind*, each
//! carrying a `Cow<'static, str>` message and a source position, with a
//! hand-written `Display` rather than a derive macro.

use std::borrow::Cow;
use std::fmt;

/// A 1-indexed line, 0-indexed column pair, matching CPython's `ast` module.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CodeLoc {
    pub line: u32,
    pub col: u32,
}

impl fmt::Display for CodeLoc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}

/// The three fatal error kinds of spec.md §7.
#[derive(Debug, Clone)]
pub enum FrontendError {
    /// A syntactic form the frontend recognizes but deliberately does not lower.
    Unsupported { msg: Cow<'static, str>, position: CodeLoc },
    /// A free variable at module level with no builtin mapping.
    UnresolvedNames { offenders: Vec<(String, CodeLoc)> },
    /// A shape the analyzer assumes cannot occur.
    Malformed { msg: Cow<'static, str>, position: CodeLoc },
}

impl FrontendError {
    pub(crate) fn unsupported(msg: impl Into<Cow<'static, str>>, position: CodeLoc) -> Self {
        Self::Unsupported { msg: msg.into(), position }
    }

    pub(crate) fn malformed(msg: impl Into<Cow<'static, str>>, position: CodeLoc) -> Self {
        Self::Malformed { msg: msg.into(), position }
    }
}

impl fmt::Display for FrontendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unsupported { msg, position } => write!(f, "{position}: unsupported construct: {msg}"),
            Self::Malformed { msg, position } => write!(f, "{position}: malformed input: {msg}"),
            Self::UnresolvedNames { offenders } => {
                writeln!(f, "Unknown variables:")?;
                for (name, position) in offenders {
                    writeln!(f, "  {position}: {name}")?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for FrontendError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unresolved_names_lists_every_offender() {
        let err = FrontendError::UnresolvedNames {
            offenders: vec![
                ("foo".to_owned(), CodeLoc { line: 3, col: 4 }),
                ("bar".to_owned(), CodeLoc { line: 5, col: 0 }),
            ],
        };
        let rendered = err.to_string();
        assert!(rendered.contains("3:4: foo"));
        assert!(rendered.contains("5:0: bar"));
    }
}
