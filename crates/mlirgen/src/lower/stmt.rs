//! Statement Lowerer / CFG Builder (spec.md §4.7, §4.8, §4.9, §4.10).

use crate::diagnostics::FrontendError;
use crate::ir::dialects::scripting;
use crate::ir::types::Type;
use crate::ir::value::ValueId;
use crate::source::ast;

use super::driver::emit_return;
use super::expr::lower_expr;
use super::{FuncCtx, LowerCtx};

/// Lowers a statement sequence, threading the current insertion block
/// through each statement in order (spec.md §4.7).
pub fn lower_stmts(lctx: &mut LowerCtx<'_>, fc: &mut FuncCtx, stmts: &[ast::Stmt]) -> Result<(), FrontendError> {
    for stmt in stmts {
        if fc.b.current_block_terminated() {
            // Unreachable code after a `return` on every preceding path;
            // give it a dead block of its own rather than erroring.
            let dead = fc.b.new_block();
            fc.b.set_insertion_block(dead);
        }
        lower_stmt(lctx, fc, stmt)?;
    }
    Ok(())
}

fn lower_stmt(lctx: &mut LowerCtx<'_>, fc: &mut FuncCtx, stmt: &ast::Stmt) -> Result<(), FrontendError> {
    match stmt {
        ast::Stmt::Expr(e) => {
            lower_expr(lctx, fc, &e.value)?;
            Ok(())
        }
        ast::Stmt::Assign(a) => {
            let value = lower_expr(lctx, fc, &a.value)?;
            store_target(lctx, fc, &a.targets[0], value, false)
        }
        ast::Stmt::AugAssign(_) => {
            // Deliberately a no-op (spec.md §9's open question on augmented
            // assignment): the analyzer accounts for the target and the
            // value but lowering does not yet emit a read-modify-write.
            Ok(())
        }
        ast::Stmt::Return(r) => {
            let value = match &r.value {
                Some(e) => lower_expr(lctx, fc, e)?,
                None => scripting::constant_none(&mut fc.b),
            };
            emit_return(fc, value);
            Ok(())
        }
        ast::Stmt::If(s) => lower_if(lctx, fc, s),
        ast::Stmt::While(s) => lower_while(lctx, fc, s),
        ast::Stmt::For(s) => lower_for(lctx, fc, s),
        ast::Stmt::FunctionDef(s) => lower_function_def(lctx, fc, s),
        ast::Stmt::Import(s) => lower_import(lctx, fc, s),
        ast::Stmt::With(w) => lower_with(lctx, fc, w),
        other => Err(FrontendError::unsupported(
            "unsupported statement",
            (lctx.locate)(stmt_range(other)),
        )),
    }
}

fn lower_if(lctx: &mut LowerCtx<'_>, fc: &mut FuncCtx, s: &ast::StmtIf) -> Result<(), FrontendError> {
    let test = lower_expr(lctx, fc, &s.test)?;
    let cond = scripting::truthy(&mut fc.b, test);
    let then_blk = fc.b.new_block();
    let else_blk = fc.b.new_block();
    fc.b.cond_br(cond, then_blk, else_blk);
    let merge = fc.b.new_block();

    fc.b.set_insertion_block(then_blk);
    lower_stmts(lctx, fc, &s.body)?;
    if !fc.b.current_block_terminated() {
        fc.b.br(merge, Vec::new());
    }

    fc.b.set_insertion_block(else_blk);
    lower_stmts(lctx, fc, &s.orelse)?;
    if !fc.b.current_block_terminated() {
        fc.b.br(merge, Vec::new());
    }

    fc.b.set_insertion_block(merge);
    Ok(())
}

fn lower_while(lctx: &mut LowerCtx<'_>, fc: &mut FuncCtx, s: &ast::StmtWhile) -> Result<(), FrontendError> {
    let header = fc.b.new_block();
    fc.b.br(header, Vec::new());
    fc.b.set_insertion_block(header);
    let test = lower_expr(lctx, fc, &s.test)?;
    let cond = scripting::truthy(&mut fc.b, test);
    let body_blk = fc.b.new_block();
    let after_blk = fc.b.new_block();
    fc.b.cond_br(cond, body_blk, after_blk);

    fc.b.set_insertion_block(body_blk);
    lower_stmts(lctx, fc, &s.body)?;
    if !fc.b.current_block_terminated() {
        fc.b.br(header, Vec::new());
    }

    fc.b.set_insertion_block(after_blk);
    lower_stmts(lctx, fc, &s.orelse)
}

fn lower_for(lctx: &mut LowerCtx<'_>, fc: &mut FuncCtx, s: &ast::StmtFor) -> Result<(), FrontendError> {
    let iterable = lower_expr(lctx, fc, &s.iter)?;
    let iterator = scripting::invoke_iter(&mut fc.b, iterable);

    let header = fc.b.new_block();
    fc.b.br(header, Vec::new());
    fc.b.set_insertion_block(header);
    let (continue_blk, item, done_blk) = scripting::invoke_next(&mut fc.b, iterator);

    fc.b.set_insertion_block(continue_blk);
    store_target(lctx, fc, &s.target, item, false)?;
    lower_stmts(lctx, fc, &s.body)?;
    if !fc.b.current_block_terminated() {
        fc.b.br(header, Vec::new());
    }

    fc.b.set_insertion_block(done_blk);
    lower_stmts(lctx, fc, &s.orelse)
}

/// Enters each item's context manager left-to-right, binding its optional
/// target, then lowers the body under a cleanup frame that calls every
/// `__exit__` in reverse order. A `return` inside the body unwinds this
/// frame (and every enclosing one) via `emit_return`; normal fall-through
/// out of the body runs and pops just this frame (spec.md §4.7 With). The
/// exception path through the landing pad still bypasses `__exit__`
/// (spec.md §9's open question).
fn lower_with(lctx: &mut LowerCtx<'_>, fc: &mut FuncCtx, w: &ast::StmtWith) -> Result<(), FrontendError> {
    let mut exit_methods = Vec::with_capacity(w.items.len());
    for item in &w.items {
        let ctx = lower_expr(lctx, fc, &item.context_expr)?;
        let enter = scripting::invoke_get_attr(&mut fc.b, ctx, "__enter__");
        let exit = scripting::invoke_get_attr(&mut fc.b, ctx, "__exit__");
        let entered = scripting::invoke_call(&mut fc.b, enter, Vec::new(), Vec::new());
        if let Some(target) = &item.optional_vars {
            store_target(lctx, fc, target, entered, false)?;
        }
        exit_methods.push(exit);
    }

    fc.on_done.push(exit_methods);
    lower_stmts(lctx, fc, &w.body)?;
    let frame = fc.on_done.pop().expect("with pushed its own cleanup frame");
    if !fc.b.current_block_terminated() {
        for exit in frame.into_iter().rev() {
            scripting::invoke_call(&mut fc.b, exit, Vec::new(), Vec::new());
        }
    }
    Ok(())
}

fn lower_function_def(lctx: &mut LowerCtx<'_>, fc: &mut FuncCtx, s: &ast::StmtFunctionDef) -> Result<(), FrontendError> {
    let param_names: Vec<String> =
        s.args.posonlyargs.iter().chain(&s.args.args).map(|a| a.def.arg.to_string()).collect();
    let scope = lctx
        .scope_map
        .get(&s.range)
        .ok_or_else(|| FrontendError::malformed("function missing from scope map", (lctx.locate)(s.range)))?;
    let ir_name = lctx.names.fresh(Some(&s.name));
    let captured = super::driver::lower_nested_function(
        lctx,
        fc,
        ir_name.clone(),
        scope,
        &param_names,
        super::driver::NestedBody::Stmts(&s.body),
    )?;
    let closure = scripting::make_closure(&mut fc.b, &ir_name, captured);
    store_target(lctx, fc, &name_as_expr(&s.name, s.range), closure, false)
}

fn lower_import(lctx: &mut LowerCtx<'_>, fc: &mut FuncCtx, s: &ast::StmtImport) -> Result<(), FrontendError> {
    for alias in &s.names {
        let value = scripting::invoke_import(&mut fc.b, alias.name.as_str());
        let local = alias.asname.as_ref().unwrap_or(&alias.name).to_string();
        let cell = fc
            .cells
            .get(&local)
            .ok_or_else(|| FrontendError::malformed(format!("import target '{local}' has no cell"), (lctx.locate)(s.range)))?;
        scripting::cell_store(&mut fc.b, cell, value);
    }
    Ok(())
}

/// Stores `value` into `target`, which may be a name, a subscript, or a
/// (possibly nested) tuple for unpacking assignment (spec.md §4.9).
///
/// `allow_new_cell` is true only for list-comprehension generator targets,
/// whose names live in a nested scope not already cell-allocated by the
/// enclosing function (spec.md §4.6).
pub(super) fn store_target(
    lctx: &mut LowerCtx<'_>,
    fc: &mut FuncCtx,
    target: &ast::Expr,
    value: ValueId,
    allow_new_cell: bool,
) -> Result<(), FrontendError> {
    match target {
        ast::Expr::Name(n) => {
            let cell = match fc.cells.get(&n.id) {
                Some(cell) => cell,
                None if allow_new_cell => {
                    let cell = scripting::cell_alloc(&mut fc.b);
                    fc.cells.insert(n.id.to_string(), cell);
                    cell
                }
                None => {
                    return Err(FrontendError::malformed(
                        format!("'{}' resolved by the analyzer but has no cell", n.id),
                        (lctx.locate)(n.range),
                    ));
                }
            };
            scripting::cell_store(&mut fc.b, cell, value);
            Ok(())
        }
        ast::Expr::Subscript(sub) => {
            let base = lower_expr(lctx, fc, &sub.value)?;
            let index = lower_expr(lctx, fc, &sub.slice)?;
            let _ = scripting::invoke_set_item(&mut fc.b, base, index, value);
            Ok(())
        }
        ast::Expr::Tuple(t) => {
            for (i, elt) in t.elts.iter().enumerate() {
                let idx = scripting::constant_int(&mut fc.b, i64::try_from(i).expect("tuple target fits in an i64 index"));
                let item = scripting::invoke_get_item(&mut fc.b, value, idx);
                store_target(lctx, fc, elt, item, allow_new_cell)?;
            }
            Ok(())
        }
        other => Err(FrontendError::malformed(
            "unexpected assignment target",
            (lctx.locate)(expr_range(other)),
        )),
    }
}

/// Lowers a list comprehension via nested generator loops (spec.md §4.6):
/// an accumulator list lives in a cell threaded through every generator
/// level, appended to at the innermost level.
pub fn lower_list_comp(lctx: &mut LowerCtx<'_>, fc: &mut FuncCtx, lc: &ast::ExprListComp) -> Result<ValueId, FrontendError> {
    let saved_cells = fc.cells.clone();
    let empty = scripting::build_list(&mut fc.b, Vec::new());
    let result_cell = scripting::cell_alloc(&mut fc.b);
    scripting::cell_store(&mut fc.b, result_cell, empty);
    lower_comp_generators(lctx, fc, &lc.generators, 0, &lc.elt, result_cell)?;
    let result = scripting::cell_load(&mut fc.b, result_cell);
    fc.cells = saved_cells;
    Ok(result)
}

fn lower_comp_generators(
    lctx: &mut LowerCtx<'_>,
    fc: &mut FuncCtx,
    generators: &[ast::Comprehension],
    index: usize,
    elt: &ast::Expr,
    result_cell: ValueId,
) -> Result<(), FrontendError> {
    let Some(generator) = generators.get(index) else {
        let item = lower_expr(lctx, fc, elt)?;
        let cur = scripting::cell_load(&mut fc.b, result_cell);
        let appended = fc.b.emit("scripting.list_append", vec![cur, item], Vec::new(), &[Type::Value])[0];
        scripting::cell_store(&mut fc.b, result_cell, appended);
        return Ok(());
    };

    let iterable = lower_expr(lctx, fc, &generator.iter)?;
    let iterator = scripting::invoke_iter(&mut fc.b, iterable);

    let header = fc.b.new_block();
    fc.b.br(header, Vec::new());
    fc.b.set_insertion_block(header);
    let (continue_blk, item, done_blk) = scripting::invoke_next(&mut fc.b, iterator);

    fc.b.set_insertion_block(continue_blk);
    store_target(lctx, fc, &generator.target, item, true)?;
    lower_comp_generators(lctx, fc, generators, index + 1, elt, result_cell)?;
    if !fc.b.current_block_terminated() {
        fc.b.br(header, Vec::new());
    }

    fc.b.set_insertion_block(done_blk);
    Ok(())
}

fn name_as_expr(name: &str, range: rustpython_ast::text_size::TextRange) -> ast::Expr {
    ast::Expr::Name(ast::ExprName { range, id: name.into(), ctx: ast::ExprContext::Store })
}

fn stmt_range(stmt: &ast::Stmt) -> rustpython_ast::text_size::TextRange {
    use ast::Ranged;
    stmt.range()
}

fn expr_range(expr: &ast::Expr) -> rustpython_ast::text_size::TextRange {
    use ast::Ranged;
    expr.range()
}
