//! Typed constructors for the `scripting` dialect (spec.md §6.2): runtime
//! values, operators, calls, scopes, and exceptions.

use crate::ir::attribute::Attribute;
use crate::ir::builder::FunctionBuilder;
use crate::ir::types::Type;
use crate::ir::value::{BlockId, ValueId};

pub fn constant_int(b: &mut FunctionBuilder, value: i64) -> ValueId {
    b.emit("scripting.constant", Vec::new(), vec![("value", Attribute::I64(value))], &[Type::Value])[0]
}

pub fn constant_float(b: &mut FunctionBuilder, value: f64) -> ValueId {
    b.emit("scripting.constant", Vec::new(), vec![("value", Attribute::F64(value))], &[Type::Value])[0]
}

pub fn constant_str(b: &mut FunctionBuilder, value: &str) -> ValueId {
    b.emit("scripting.constant", Vec::new(), vec![("value", Attribute::Str(value.to_owned()))], &[Type::Value])[0]
}

pub fn constant_bool(b: &mut FunctionBuilder, value: bool) -> ValueId {
    b.emit("scripting.constant", Vec::new(), vec![("value", Attribute::Bool(value))], &[Type::Value])[0]
}

pub fn constant_none(b: &mut FunctionBuilder) -> ValueId {
    b.emit("scripting.constant_none", Vec::new(), Vec::new(), &[Type::Value])[0]
}

/// `!i1` truthiness test, used to drive `cf.cond_br` (spec.md §4.7).
pub fn truthy(b: &mut FunctionBuilder, value: ValueId) -> ValueId {
    b.emit("scripting.truthy", vec![value], Vec::new(), &[Type::I1])[0]
}

pub fn load_builtin(b: &mut FunctionBuilder, ir_name: &str) -> ValueId {
    b.emit("scripting.load_builtin", Vec::new(), vec![("name", Attribute::Str(ir_name.to_owned()))], &[Type::Value])[0]
}

pub fn build_list(b: &mut FunctionBuilder, elements: Vec<ValueId>) -> ValueId {
    b.emit("scripting.build_list", elements, Vec::new(), &[Type::Value])[0]
}

pub fn build_tuple(b: &mut FunctionBuilder, elements: Vec<ValueId>) -> ValueId {
    b.emit("scripting.build_tuple", elements, Vec::new(), &[Type::Value])[0]
}

pub fn concat_str(b: &mut FunctionBuilder, parts: Vec<ValueId>) -> ValueId {
    b.emit("scripting.concat_str", parts, Vec::new(), &[Type::Value])[0]
}

/// Cell allocator (spec.md §4.4): one cell per closed-over local, allocated
/// at function entry.
pub fn cell_alloc(b: &mut FunctionBuilder) -> ValueId {
    b.emit("scripting.cell_alloc", Vec::new(), Vec::new(), &[Type::Cell])[0]
}

pub fn cell_load(b: &mut FunctionBuilder, cell: ValueId) -> ValueId {
    b.emit("scripting.cell_load", vec![cell], Vec::new(), &[Type::Value])[0]
}

pub fn cell_store(b: &mut FunctionBuilder, cell: ValueId, value: ValueId) {
    b.emit("scripting.cell_store", vec![cell, value], Vec::new(), &[]);
}

/// Builds a closure value over `callee`, passing each of `cells` as an extra
/// argument in the parent/child calling convention (spec.md §3).
pub fn make_closure(b: &mut FunctionBuilder, callee: &str, cells: Vec<ValueId>) -> ValueId {
    b.emit(
        "scripting.make_closure",
        cells,
        vec![("callee", Attribute::FlatSymbolRef(callee.to_owned()))],
        &[Type::Value],
    )[0]
}

/// Fallible binary operator application (spec.md §4.5.1): returns the
/// continuation block (already the new insertion point) and the result.
pub fn invoke_binop(b: &mut FunctionBuilder, op: &str, lhs: ValueId, rhs: ValueId) -> ValueId {
    let (_, result) = b.invoke("scripting.invoke_binop", vec![lhs, rhs], vec![("op", Attribute::Str(op.to_owned()))]);
    result
}

pub fn invoke_unaryop(b: &mut FunctionBuilder, op: &str, operand: ValueId) -> ValueId {
    let (_, result) = b.invoke("scripting.invoke_unaryop", vec![operand], vec![("op", Attribute::Str(op.to_owned()))]);
    result
}

pub fn invoke_compare(b: &mut FunctionBuilder, op: &str, lhs: ValueId, rhs: ValueId) -> ValueId {
    let (_, result) = b.invoke("scripting.invoke_compare", vec![lhs, rhs], vec![("op", Attribute::Str(op.to_owned()))]);
    result
}

/// `keywords` names the trailing entries of `args` that were passed by
/// keyword, in call-site order (spec.md §4.5 Call): positional args come
/// first, then each keyword arg's value is appended to `args` and its name
/// appended to `keywords` in lockstep.
pub fn invoke_call(b: &mut FunctionBuilder, callee: ValueId, args: Vec<ValueId>, keywords: Vec<String>) -> ValueId {
    let mut operands = vec![callee];
    operands.extend(args);
    let attributes = if keywords.is_empty() { Vec::new() } else { vec![("keywords", Attribute::StrArray(keywords))] };
    let (_, result) = b.invoke("scripting.invoke_call", operands, attributes);
    result
}

pub fn invoke_get_attr(b: &mut FunctionBuilder, value: ValueId, attr: &str) -> ValueId {
    let (_, result) = b.invoke("scripting.invoke_get_attr", vec![value], vec![("name", Attribute::Str(attr.to_owned()))]);
    result
}

pub fn invoke_get_item(b: &mut FunctionBuilder, value: ValueId, index: ValueId) -> ValueId {
    let (_, result) = b.invoke("scripting.invoke_get_item", vec![value, index], Vec::new());
    result
}

pub fn invoke_set_item(b: &mut FunctionBuilder, value: ValueId, index: ValueId, new_value: ValueId) -> ValueId {
    let (_, result) = b.invoke("scripting.invoke_set_item", vec![value, index, new_value], Vec::new());
    result
}

pub fn invoke_import(b: &mut FunctionBuilder, module_name: &str) -> ValueId {
    let (_, result) = b.invoke("scripting.invoke_import", Vec::new(), vec![("name", Attribute::Str(module_name.to_owned()))]);
    result
}

/// `iter(x)` as a fallible operation: `x` may not be iterable.
pub fn invoke_iter(b: &mut FunctionBuilder, value: ValueId) -> ValueId {
    let (_, result) = b.invoke("scripting.invoke_iter", vec![value], Vec::new());
    result
}

/// One iteration step (spec.md §4.8): returns `(continue_block, item, done_block)`.
/// The caller switches insertion to `continue_block` to lower the loop body,
/// and later switches to `done_block` to lower what follows the loop.
pub fn invoke_next(b: &mut FunctionBuilder, iterator: ValueId) -> (BlockId, ValueId, BlockId) {
    b.invoke_next(iterator)
}
