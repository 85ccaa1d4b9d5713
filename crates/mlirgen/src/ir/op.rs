//! The generic operation representation every dialect constructor builds.
//!
//! Mirrors MLIR's generic op shape: a dialect-qualified mnemonic, SSA
//! operands, non-SSA attributes, zero or more typed results, and — for block
//! terminators — a list of successor blocks each carrying its own block-argument
//! values (spec.md §6.2's "opaque IR-builder API").

use super::attribute::Attribute;
use super::types::Type;
use super::value::{BlockId, ValueId};

#[derive(Debug, Clone)]
pub struct Operation {
    pub mnemonic: &'static str,
    pub operands: Vec<ValueId>,
    pub attributes: Vec<(&'static str, Attribute)>,
    pub results: Vec<(ValueId, Type)>,
    /// Non-empty only for terminators; each successor is a target block plus
    /// the values forwarded as that block's arguments.
    pub successors: Vec<(BlockId, Vec<ValueId>)>,
}

impl Operation {
    #[must_use]
    pub fn is_terminator(&self) -> bool {
        !self.successors.is_empty() || self.mnemonic == "scripting.return"
    }
}

#[derive(Debug, Clone)]
pub struct Block {
    pub id: BlockId,
    pub args: Vec<(ValueId, Type)>,
    pub ops: Vec<Operation>,
}

#[derive(Debug, Clone)]
pub struct Function {
    pub name: String,
    /// Parameters in calling-convention order: positional source parameters
    /// first, then one `!scripting.cell` per free variable captured from an
    /// enclosing scope (spec.md §3's parent/child IR-function ABI).
    pub params: Vec<(ValueId, Type)>,
    pub blocks: Vec<Block>,
}

#[derive(Debug, Clone, Default)]
pub struct Module {
    pub functions: Vec<Function>,
}
