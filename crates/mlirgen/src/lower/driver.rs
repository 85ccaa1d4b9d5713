//! Module Driver (spec.md §2 item 7): ties the scope map, cell allocator,
//! and statement/expression lowerers together into complete IR functions.

use crate::diagnostics::FrontendError;
use crate::ir::builder::FunctionBuilder;
use crate::ir::dialects::scripting;
use crate::ir::types::Type;
use crate::ir::value::ValueId;
use crate::ir::Module;
use crate::scope::{ScopeMap, VariableScope};
use crate::source::ast;

use super::cell::build_cells;
use super::expr::captured_cells_for;
use super::stmt::lower_stmts;
use super::{FuncCtx, LowerCtx};

/// A nested scope's body: a statement block (`FunctionDef`) or a single
/// implicit-return expression (`Lambda`).
#[derive(Clone, Copy)]
pub enum NestedBody<'a> {
    Stmts(&'a [ast::Stmt]),
    Expr(&'a ast::Expr),
}

/// Lowers a module into IR: the module body becomes the `@module` function,
/// and every nested `def`/`lambda` lowers to its own function alongside it
/// (spec.md §3's parent/child IR-function ABI).
///
/// # Errors
/// Propagates any `FrontendError` raised while lowering statements or
/// expressions.
pub fn lower_module(
    body: &[ast::Stmt],
    scope_map: &ScopeMap,
    builtins: &crate::builtins::BuiltinRegistry,
    parsed: &mut crate::source::ParsedModule<'_>,
) -> Result<Module, FrontendError> {
    let mut names = crate::names::NameAllocator::new();
    let mut lctx = LowerCtx {
        scope_map,
        builtins,
        names: &mut names,
        locate: &mut |r| parsed.locate(r.start()),
        functions: Vec::new(),
    };

    let module_scope = VariableScope {
        locals: module_locals(body),
        free: Vec::new(),
    };
    let mut b = FunctionBuilder::new("module", &[]);
    let cells = build_cells(&mut b, &module_scope, &[], &[], &[]);
    let mut fc = FuncCtx { b, cells, on_done: Vec::new() };
    lower_stmts(&mut lctx, &mut fc, body)?;
    finish_with_implicit_none_return(&mut fc);
    let entry = fc.b.finish();

    let mut functions = vec![entry];
    functions.extend(lctx.functions);
    Ok(Module { functions })
}

fn module_locals(body: &[ast::Stmt]) -> indexmap::IndexSet<String> {
    // The module scope's locals are already known from the scope analyzer's
    // top-level `VariableScope`; recomputing here from `body` would
    // duplicate that walk, so instead this reuses the same simple rule the
    // analyzer applies at the top level: everything bound by a top-level
    // statement headlines the module's cell set. Nested scopes allocate
    // their own cells independently in `lower_nested_function`.
    let mut locals = indexmap::IndexSet::new();
    collect_top_level_locals(body, &mut locals);
    locals
}

fn collect_top_level_locals(body: &[ast::Stmt], locals: &mut indexmap::IndexSet<String>) {
    for stmt in body {
        match stmt {
            ast::Stmt::Assign(a) => collect_target_locals(&a.targets[0], locals),
            ast::Stmt::AugAssign(a) => collect_target_locals(&a.target, locals),
            ast::Stmt::For(f) => {
                collect_target_locals(&f.target, locals);
                collect_top_level_locals(&f.body, locals);
                collect_top_level_locals(&f.orelse, locals);
            }
            ast::Stmt::If(s) => {
                collect_top_level_locals(&s.body, locals);
                collect_top_level_locals(&s.orelse, locals);
            }
            ast::Stmt::While(s) => {
                collect_top_level_locals(&s.body, locals);
                collect_top_level_locals(&s.orelse, locals);
            }
            ast::Stmt::With(w) => {
                for item in &w.items {
                    if let Some(target) = &item.optional_vars {
                        collect_target_locals(target, locals);
                    }
                }
                collect_top_level_locals(&w.body, locals);
            }
            ast::Stmt::FunctionDef(f) => {
                locals.insert(f.name.to_string());
            }
            ast::Stmt::Import(imp) => {
                for alias in &imp.names {
                    let name = alias.asname.as_ref().unwrap_or(&alias.name);
                    locals.insert(name.to_string());
                }
            }
            _ => {}
        }
    }
}

fn collect_target_locals(target: &ast::Expr, locals: &mut indexmap::IndexSet<String>) {
    match target {
        ast::Expr::Name(n) => {
            locals.insert(n.id.to_string());
        }
        ast::Expr::Tuple(t) => {
            for elt in &t.elts {
                collect_target_locals(elt, locals);
            }
        }
        ast::Expr::Subscript(_) | ast::Expr::Attribute(_) => {}
        _ => {}
    }
}

/// Builds and appends a new IR function for a `def`/`lambda` body, returning
/// the cell values the *caller* (in its own, already-current block) must
/// pass to `scripting.make_closure`.
pub fn lower_nested_function(
    lctx: &mut LowerCtx<'_>,
    outer_fc: &FuncCtx,
    ir_name: String,
    scope: &VariableScope,
    param_names: &[String],
    body: NestedBody<'_>,
) -> Result<Vec<ValueId>, FrontendError> {
    let captured_names: Vec<String> = scope.free.iter().map(|f| f.name.clone()).collect();
    let mut param_types = vec![Type::Value; param_names.len()];
    param_types.extend(std::iter::repeat_n(Type::Cell, captured_names.len()));

    let mut b = FunctionBuilder::new(ir_name, &param_types);
    let all_params: Vec<ValueId> = b.params().iter().map(|(v, _)| *v).collect();
    let (positional, trailing) = all_params.split_at(param_names.len());
    let captured_pairs: Vec<(String, ValueId)> =
        captured_names.iter().cloned().zip(trailing.iter().copied()).collect();
    let cells = build_cells(&mut b, scope, param_names, positional, &captured_pairs);
    let mut fc = FuncCtx { b, cells, on_done: Vec::new() };

    match body {
        NestedBody::Stmts(stmts) => {
            lower_stmts(lctx, &mut fc, stmts)?;
            finish_with_implicit_none_return(&mut fc);
        }
        NestedBody::Expr(expr) => {
            let value = super::expr::lower_expr(lctx, &mut fc, expr)?;
            emit_return(&mut fc, value);
        }
    }

    lctx.functions.push(fc.b.finish());
    Ok(captured_cells_for(outer_fc, &captured_names))
}

/// Appends an implicit `return None` if the current block has no terminator
/// yet (a body that falls off the end, matching Python's implicit `None`
/// return).
pub(super) fn finish_with_implicit_none_return(fc: &mut FuncCtx) {
    if fc.b.current_block_terminated() {
        return;
    }
    let none = scripting::constant_none(&mut fc.b);
    emit_return(fc, none);
}

/// Terminates the current block with a normal (non-exceptional) return.
/// No-op if the block is already terminated (e.g. both arms of an `if`
/// already returned and lowering is back at a statement sequence's tail).
///
/// Runs every active `with`-statement cleanup first, innermost first
/// (spec.md §4.7 Return): a `return` skips each enclosing `with`'s own
/// normal fall-through cleanup, so it must run them all itself.
pub(super) fn emit_return(fc: &mut FuncCtx, value: ValueId) {
    if fc.b.current_block_terminated() {
        return;
    }
    let exits: Vec<ValueId> = fc.on_done.iter().rev().flat_map(|frame| frame.iter().rev().copied()).collect();
    for exit in exits {
        scripting::invoke_call(&mut fc.b, exit, Vec::new(), Vec::new());
    }
    let not_raised = fc.b.emit(
        "scripting.constant",
        Vec::new(),
        vec![("value", crate::ir::attribute::Attribute::Bool(false))],
        &[Type::I1],
    )[0];
    fc.b.scripting_return(value, not_raised);
}
