//! Expression Lowerer (spec.md §4.5, §4.5.1, §4.6).

use num_traits::ToPrimitive;

use crate::diagnostics::FrontendError;
use crate::ir::dialects::scripting;
use crate::ir::value::ValueId;
use crate::source::ast;

use super::{FuncCtx, LowerCtx};

/// Lowers `expr` for its value (spec.md §4.5). Fallible sub-lowerings route
/// through `FunctionBuilder::invoke`, so after this call the function's
/// current insertion block may have changed from the one in effect when it
/// was called.
pub fn lower_expr(lctx: &mut LowerCtx<'_>, fc: &mut FuncCtx, expr: &ast::Expr) -> Result<ValueId, FrontendError> {
    match expr {
        ast::Expr::Constant(c) => lower_constant(fc, &c.value),
        ast::Expr::Name(n) => lower_name_load(lctx, fc, n),
        ast::Expr::Tuple(t) => {
            let elems = lower_each(lctx, fc, &t.elts)?;
            Ok(scripting::build_tuple(&mut fc.b, elems))
        }
        ast::Expr::List(l) => {
            let elems = lower_each(lctx, fc, &l.elts)?;
            Ok(scripting::build_list(&mut fc.b, elems))
        }
        ast::Expr::UnaryOp(u) => {
            let operand = lower_expr(lctx, fc, &u.operand)?;
            Ok(scripting::invoke_unaryop(&mut fc.b, unary_op_symbol(u.op), operand))
        }
        ast::Expr::BinOp(bo) => {
            let lhs = lower_expr(lctx, fc, &bo.left)?;
            let rhs = lower_expr(lctx, fc, &bo.right)?;
            Ok(scripting::invoke_binop(&mut fc.b, bin_op_symbol(bo.op), lhs, rhs))
        }
        ast::Expr::Compare(c) => lower_compare(lctx, fc, c),
        ast::Expr::Call(call) => lower_call(lctx, fc, call),
        ast::Expr::Attribute(a) => {
            let value = lower_expr(lctx, fc, &a.value)?;
            Ok(scripting::invoke_get_attr(&mut fc.b, value, a.attr.as_str()))
        }
        ast::Expr::Subscript(s) => {
            let value = lower_expr(lctx, fc, &s.value)?;
            let index = lower_expr(lctx, fc, &s.slice)?;
            Ok(scripting::invoke_get_item(&mut fc.b, value, index))
        }
        ast::Expr::Slice(s) => lower_slice(lctx, fc, s),
        ast::Expr::JoinedStr(j) => {
            let parts = lower_each(lctx, fc, &j.values)?;
            Ok(scripting::concat_str(&mut fc.b, parts))
        }
        ast::Expr::FormattedValue(fv) => {
            let value = lower_expr(lctx, fc, &fv.value)?;
            let format_spec = match &fv.format_spec {
                Some(spec) => lower_expr(lctx, fc, spec)?,
                None => scripting::constant_none(&mut fc.b),
            };
            let formatter = scripting::invoke_get_attr(&mut fc.b, value, "__format__");
            Ok(scripting::invoke_call(&mut fc.b, formatter, vec![format_spec], Vec::new()))
        }
        ast::Expr::Lambda(l) => lower_lambda(lctx, fc, l),
        ast::Expr::ListComp(lc) => super::stmt::lower_list_comp(lctx, fc, lc),
        other => Err(FrontendError::unsupported(
            "unsupported expression",
            (lctx.locate)(expr_range(other)),
        )),
    }
}

fn lower_each(lctx: &mut LowerCtx<'_>, fc: &mut FuncCtx, exprs: &[ast::Expr]) -> Result<Vec<ValueId>, FrontendError> {
    exprs.iter().map(|e| lower_expr(lctx, fc, e)).collect()
}

fn lower_constant(fc: &mut FuncCtx, c: &ast::Constant) -> Result<ValueId, FrontendError> {
    Ok(match c {
        ast::Constant::None => scripting::constant_none(&mut fc.b),
        ast::Constant::Bool(b) => scripting::constant_bool(&mut fc.b, *b),
        ast::Constant::Str(s) => scripting::constant_str(&mut fc.b, s),
        ast::Constant::Float(f) => scripting::constant_float(&mut fc.b, *f),
        ast::Constant::Int(i) => match i.to_i64() {
            Some(n) => scripting::constant_int(&mut fc.b, n),
            // Large-integer literal (spec.md §9): carried as its decimal
            // text form rather than truncated.
            None => fc.b.emit(
                "scripting.constant_big_int",
                Vec::new(),
                vec![("value", crate::ir::attribute::Attribute::Str(i.to_string()))],
                &[crate::ir::types::Type::Value],
            )[0],
        },
        ast::Constant::Bytes(_) | ast::Constant::Tuple(_) | ast::Constant::Complex { .. } | ast::Constant::Ellipsis => {
            return Err(FrontendError::unsupported("unsupported constant literal", crate::diagnostics::CodeLoc::default()));
        }
    })
}

fn lower_name_load(lctx: &mut LowerCtx<'_>, fc: &mut FuncCtx, n: &ast::ExprName) -> Result<ValueId, FrontendError> {
    if let Some(cell) = fc.cells.get(&n.id) {
        return Ok(scripting::cell_load(&mut fc.b, cell));
    }
    if let Some(ir_name) = lctx.builtins.resolve(&n.id) {
        return Ok(scripting::load_builtin(&mut fc.b, ir_name));
    }
    Err(FrontendError::malformed(
        format!("'{}' resolved by the analyzer but has no cell or builtin", n.id),
        (lctx.locate)(n.range),
    ))
}

/// Chained comparisons `a op1 b op2 c` lower left-to-right, each comparison
/// reusing the previous right operand as its left operand (spec.md §4.5
/// Compare); the result is the last comparison's value, matching
/// `genmlir.py`'s `visit_Compare` (no implicit `and`-combination).
fn lower_compare(lctx: &mut LowerCtx<'_>, fc: &mut FuncCtx, c: &ast::ExprCompare) -> Result<ValueId, FrontendError> {
    let mut lhs = lower_expr(lctx, fc, &c.left)?;
    let mut result = lhs;
    for (op, comparator) in c.ops.iter().zip(c.comparators.iter()) {
        let rhs = lower_expr(lctx, fc, comparator)?;
        result = scripting::invoke_compare(&mut fc.b, cmp_op_symbol(*op), lhs, rhs);
        lhs = rhs;
    }
    Ok(result)
}

fn lower_call(lctx: &mut LowerCtx<'_>, fc: &mut FuncCtx, call: &ast::ExprCall) -> Result<ValueId, FrontendError> {
    let callee = lower_expr(lctx, fc, &call.func)?;
    let mut args = lower_each(lctx, fc, &call.args)?;
    let mut keywords = Vec::with_capacity(call.keywords.len());
    for kw in &call.keywords {
        let Some(name) = &kw.arg else {
            return Err(FrontendError::unsupported("** in call", (lctx.locate)(call.range)));
        };
        args.push(lower_expr(lctx, fc, &kw.value)?);
        keywords.push(name.to_string());
    }
    Ok(scripting::invoke_call(&mut fc.b, callee, args, keywords))
}

/// Dispatches to the `slice` builtin's 1-, 2-, or 3-argument form depending
/// on which of `lower`/`upper`/`step` are present (spec.md §4.5 Slice): the
/// 1-arg form's invariant is that only the upper bound is given.
fn lower_slice(lctx: &mut LowerCtx<'_>, fc: &mut FuncCtx, s: &ast::ExprSlice) -> Result<ValueId, FrontendError> {
    let upper = match &s.upper {
        Some(e) => lower_expr(lctx, fc, e)?,
        None => scripting::constant_none(&mut fc.b),
    };
    let args = if let Some(step_expr) = &s.step {
        let lower = match &s.lower {
            Some(e) => lower_expr(lctx, fc, e)?,
            None => scripting::constant_none(&mut fc.b),
        };
        let step = lower_expr(lctx, fc, step_expr)?;
        vec![lower, upper, step]
    } else if let Some(lower_bound) = &s.lower {
        vec![lower_expr(lctx, fc, lower_bound)?, upper]
    } else {
        vec![upper]
    };
    let slice_name = lctx.builtins.resolve("slice").expect("'slice' is a registered builtin");
    let slice_fn = scripting::load_builtin(&mut fc.b, slice_name);
    Ok(scripting::invoke_call(&mut fc.b, slice_fn, args, Vec::new()))
}

/// Lambdas lower to their own IR function (spec.md §3's parent/child ABI),
/// created via the same machinery `FunctionDef` uses (spec.md §4.7).
fn lower_lambda(lctx: &mut LowerCtx<'_>, fc: &mut FuncCtx, l: &ast::ExprLambda) -> Result<ValueId, FrontendError> {
    let param_names: Vec<String> = l.args.posonlyargs.iter().chain(&l.args.args).map(|a| a.def.arg.to_string()).collect();
    let body_scope = lctx
        .scope_map
        .get(&l.range)
        .ok_or_else(|| FrontendError::malformed("lambda missing from scope map", (lctx.locate)(l.range)))?;
    let ir_name = lctx.names.fresh(Some("lambda"));
    let captured_cells = super::driver::lower_nested_function(
        lctx,
        fc,
        ir_name.clone(),
        body_scope,
        &param_names,
        super::driver::NestedBody::Expr(&l.body),
    )?;
    Ok(scripting::make_closure(&mut fc.b, &ir_name, captured_cells))
}

pub(super) fn captured_cells_for(fc: &FuncCtx, names: &[String]) -> Vec<ValueId> {
    names.iter().map(|n| fc.cells.get(n).expect("free var resolves to an enclosing cell")).collect()
}

fn expr_range(expr: &ast::Expr) -> rustpython_ast::text_size::TextRange {
    use ast::Ranged;
    expr.range()
}

fn unary_op_symbol(op: ast::UnaryOp) -> &'static str {
    match op {
        ast::UnaryOp::Invert => "~",
        ast::UnaryOp::Not => "not",
        ast::UnaryOp::UAdd => "+",
        ast::UnaryOp::USub => "-",
    }
}

fn bin_op_symbol(op: ast::Operator) -> &'static str {
    match op {
        ast::Operator::Add => "+",
        ast::Operator::Sub => "-",
        ast::Operator::Mult => "*",
        ast::Operator::MatMult => "@",
        ast::Operator::Div => "/",
        ast::Operator::Mod => "%",
        ast::Operator::Pow => "**",
        ast::Operator::LShift => "<<",
        ast::Operator::RShift => ">>",
        ast::Operator::BitOr => "|",
        ast::Operator::BitXor => "^",
        ast::Operator::BitAnd => "&",
        ast::Operator::FloorDiv => "//",
    }
}

fn cmp_op_symbol(op: ast::CmpOp) -> &'static str {
    match op {
        ast::CmpOp::Eq => "==",
        ast::CmpOp::NotEq => "!=",
        ast::CmpOp::Lt => "<",
        ast::CmpOp::LtE => "<=",
        ast::CmpOp::Gt => ">",
        ast::CmpOp::GtE => ">=",
        ast::CmpOp::Is => "is",
        ast::CmpOp::IsNot => "is not",
        ast::CmpOp::In => "in",
        ast::CmpOp::NotIn => "not in",
    }
}
