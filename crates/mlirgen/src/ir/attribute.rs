//! Non-SSA operation payloads: constants, names, symbol references.

use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum Attribute {
    Str(String),
    StrArray(Vec<String>),
    I64(i64),
    F64(f64),
    Bool(bool),
    /// A reference to a module-level function symbol, e.g. `@f`.
    FlatSymbolRef(String),
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(s) => write!(f, "{s:?}"),
            Self::StrArray(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item:?}")?;
                }
                write!(f, "]")
            }
            Self::I64(n) => write!(f, "{n}"),
            Self::F64(n) => write!(f, "{n}"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::FlatSymbolRef(sym) => write!(f, "@{sym}"),
        }
    }
}
