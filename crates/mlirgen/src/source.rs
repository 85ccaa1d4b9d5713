//! The only module aware of the concrete host-parser crate.
//!
//! Everything below this module (`scope`, `lower::expr`, `lower::stmt`) is written
//! against the thin `ast` re-export here, so swapping the parser crate is a
//! single-file change, mirroring how `ouros::parse` is the seam between source
//! text and the rest of that crate.

pub use rustpython_ast as ast;
use rustpython_parser::source_code::{RandomLocator, SourceLocation};
use rustpython_parser::{Mode, ParseError as HostParseError, parse};

use crate::diagnostics::CodeLoc;

/// A parsed module together with a locator that turns any node's byte range
/// into a 1-indexed line / 0-indexed column pair, matching CPython's `ast`
/// module convention that spec.md's error kinds echo.
///
/// Uses the random-access locator rather than the linear one: the scope
/// analyzer visits a list comprehension's generators before its element
/// expression, which is evaluated earlier in the source, so offsets queried
/// here are not monotonically increasing.
pub struct ParsedModule<'a> {
    pub body: Vec<ast::Stmt>,
    locator: RandomLocator<'a>,
}

impl<'a> ParsedModule<'a> {
    /// Parses `source` as a Python module.
    ///
    /// # Errors
    /// Returns the host parser's error, unmodified, on a syntax error.
    pub fn parse(source: &'a str, path: &str) -> Result<Self, HostParseError> {
        let module = parse(source, Mode::Module, path)?;
        let ast::Mod::Module(module) = module else {
            unreachable!("Mode::Module always yields Mod::Module")
        };
        Ok(Self {
            body: module.body,
            locator: RandomLocator::new(source),
        })
    }

    /// Locates the given byte offset as a 1-indexed line / 0-indexed column.
    pub fn locate(&mut self, offset: rustpython_parser::text_size::TextSize) -> CodeLoc {
        let SourceLocation { row, column } = self.locator.locate(offset);
        CodeLoc {
            line: row.get(),
            col: column.to_zero_indexed(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_simple_module() {
        let parsed = ParsedModule::parse("x = 1\n", "<test>").unwrap();
        assert_eq!(parsed.body.len(), 1);
    }

    #[test]
    fn reports_line_and_column() {
        let mut parsed = ParsedModule::parse("x = 1\nfoo\n", "<test>").unwrap();
        let ast::Stmt::Expr(e) = &parsed.body[1] else {
            panic!("expected expr statement")
        };
        let ast::Expr::Name(n) = e.value.as_ref() else {
            panic!("expected name")
        };
        let loc = parsed.locate(n.range.start());
        assert_eq!(loc.line, 2);
        assert_eq!(loc.col, 0);
    }
}
