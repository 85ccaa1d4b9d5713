//! Typed constructors for the `cf` control-flow dialect (spec.md §6.2).

use crate::ir::builder::FunctionBuilder;
use crate::ir::value::{BlockId, ValueId};

pub fn br(b: &mut FunctionBuilder, target: BlockId) {
    b.br(target, Vec::new());
}

pub fn cond_br(b: &mut FunctionBuilder, cond: ValueId, then_blk: BlockId, else_blk: BlockId) {
    b.cond_br(cond, then_blk, else_blk);
}
