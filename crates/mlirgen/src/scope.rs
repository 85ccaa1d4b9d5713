//! Scope Analyzer (spec.md §4.3).
//!
//! A recursive AST walker that computes, for every scope-introducing node
//! (lambda, function definition, list-comprehension generator), the set of
//! locally-defined names and the ordered list of free (captured) references.
//! Grounded directly in `genmlir.py`'s `VariableCapture`.
//!
//! Rust has no stable `id(ast_node)`; a node's byte range is unique within a
//! parse tree and serves as the identity key instead (an Open Question
//! resolution recorded in DESIGN.md).

use indexmap::{IndexMap, IndexSet};
use rustpython_ast::text_size::TextRange;

use crate::builtins::BuiltinRegistry;
use crate::diagnostics::{CodeLoc, FrontendError};
use crate::source::ast;

/// A single free-variable reference: name plus its first-occurrence location.
#[derive(Debug, Clone)]
pub struct FreeVar {
    pub name: String,
    pub loc: CodeLoc,
}

/// Locally-defined names and ordered captures for one scope-introducing node.
///
/// Invariant: `locals` and the names in `free` are disjoint (spec.md §3).
#[derive(Debug, Clone, Default)]
pub struct VariableScope {
    pub locals: IndexSet<String>,
    pub free: Vec<FreeVar>,
}

/// Maps AST-node identity (here, byte range) to the `VariableScope` the
/// analyzer computed for it.
pub type ScopeMap = IndexMap<TextRange, VariableScope>;

/// One scope's in-progress analysis state; nested scopes get their own.
struct Analyzer<'a> {
    builtins: &'a BuiltinRegistry,
    locals: IndexSet<String>,
    references: IndexMap<String, CodeLoc>,
}

/// Runs the Scope Analyzer over a module body, producing a `ScopeMap` plus
/// the module-level `VariableScope`.
///
/// # Errors
/// Returns `FrontendError::Unsupported` / `Malformed` for constructs the
/// analyzer cannot lower (spec.md §4.3).
pub fn analyze_module(
    body: &[ast::Stmt],
    builtins: &BuiltinRegistry,
    locate: &mut impl FnMut(TextRange) -> CodeLoc,
) -> Result<(ScopeMap, VariableScope), FrontendError> {
    let mut map = ScopeMap::new();
    let mut top = Analyzer::new(builtins);
    top.visit_stmts(body, &mut map, locate)?;
    Ok((map, top.into_scope()))
}

impl<'a> Analyzer<'a> {
    fn new(builtins: &'a BuiltinRegistry) -> Self {
        Self { builtins, locals: IndexSet::new(), references: IndexMap::new() }
    }

    fn into_scope(self) -> VariableScope {
        let free = self.references.into_iter().map(|(name, loc)| FreeVar { name, loc }).collect();
        VariableScope { locals: self.locals, free }
    }

    /// Records a read reference to `name`.
    fn add_reference(&mut self, name: &str, loc: CodeLoc) {
        if self.builtins.resolve(name).is_some() {
            return;
        }
        if self.locals.contains(name) || self.references.contains_key(name) {
            return;
        }
        self.references.insert(name.to_owned(), loc);
    }

    /// Records `name` as defined in this scope; any pending reference to it
    /// in this scope is cleared (a later definition shadows an earlier read,
    /// matching `genmlir.py`'s `addVar`).
    fn add_local(&mut self, name: &str) {
        self.locals.insert(name.to_owned());
        self.references.shift_remove(name);
    }

    /// Folds a nested scope's free references up into this scope, matching
    /// `close_scope`: captures bubble upward until resolved or reach module
    /// level.
    fn close_scope(&mut self, range: TextRange, inner: Analyzer<'_>, map: &mut ScopeMap) {
        let inner_scope = inner.into_scope();
        for fv in &inner_scope.free {
            self.add_reference(&fv.name, fv.loc);
        }
        map.insert(range, inner_scope);
    }

    fn visit_stmts(
        &mut self,
        stmts: &[ast::Stmt],
        map: &mut ScopeMap,
        locate: &mut impl FnMut(TextRange) -> CodeLoc,
    ) -> Result<(), FrontendError> {
        for stmt in stmts {
            self.visit_stmt(stmt, map, locate)?;
        }
        Ok(())
    }

    fn visit_stmt(
        &mut self,
        stmt: &ast::Stmt,
        map: &mut ScopeMap,
        locate: &mut impl FnMut(TextRange) -> CodeLoc,
    ) -> Result<(), FrontendError> {
        match stmt {
            ast::Stmt::Assign(a) => {
                self.visit_expr(&a.value, map, locate)?;
                if a.targets.len() != 1 {
                    return Err(FrontendError::unsupported(
                        "multi-target assignment",
                        locate(a.range),
                    ));
                }
                self.add_assign_lhs(&a.targets[0], map, locate)
            }
            ast::Stmt::AugAssign(a) => {
                // spec.md §9: the analyzer visits the LHS as a target but
                // does not read-visit it (the read-visit is an open issue).
                self.add_assign_lhs(&a.target, map, locate)?;
                self.visit_expr(&a.value, map, locate)
            }
            ast::Stmt::Expr(e) => self.visit_expr(&e.value, map, locate),
            ast::Stmt::If(s) => {
                self.visit_expr(&s.test, map, locate)?;
                self.visit_stmts(&s.body, map, locate)?;
                self.visit_stmts(&s.orelse, map, locate)
            }
            ast::Stmt::While(s) => {
                self.visit_expr(&s.test, map, locate)?;
                self.visit_stmts(&s.body, map, locate)?;
                self.visit_stmts(&s.orelse, map, locate)
            }
            ast::Stmt::For(s) => {
                self.add_lhs(&s.target, locate)?;
                self.visit_expr(&s.iter, map, locate)?;
                self.visit_stmts(&s.body, map, locate)?;
                self.visit_stmts(&s.orelse, map, locate)
            }
            ast::Stmt::FunctionDef(s) => {
                self.add_local(&s.name);
                for default in s.args.posonlyargs.iter().chain(&s.args.args).chain(&s.args.kwonlyargs) {
                    if default.default.is_some() {
                        return Err(FrontendError::malformed(
                            "parameter with a default value",
                            locate(s.range),
                        ));
                    }
                }
                let mut inner = Analyzer::new(self.builtins);
                inner.add_args(&s.args, locate)?;
                inner.visit_stmts(&s.body, map, locate)?;
                self.close_scope(s.range, inner, map);
                Ok(())
            }
            ast::Stmt::Import(s) => {
                for alias in &s.names {
                    let local = alias.asname.as_ref().unwrap_or(&alias.name);
                    self.add_local(local);
                }
                Ok(())
            }
            ast::Stmt::Return(s) => {
                if let Some(value) = &s.value {
                    self.visit_expr(value, map, locate)?;
                }
                Ok(())
            }
            ast::Stmt::With(w) => {
                for item in &w.items {
                    self.visit_expr(&item.context_expr, map, locate)?;
                    if let Some(target) = &item.optional_vars {
                        self.add_lhs(target, locate)?;
                    }
                }
                self.visit_stmts(&w.body, map, locate)
            }
            other => Err(FrontendError::unsupported(
                format!("{} statement", stmt_kind_name(other)),
                locate(stmt_range(other)),
            )),
        }
    }

    /// `for`-target / tuple-unpack definition (never a read).
    fn add_lhs(&mut self, tgt: &ast::Expr, locate: &mut impl FnMut(TextRange) -> CodeLoc) -> Result<(), FrontendError> {
        match tgt {
            ast::Expr::Tuple(t) => {
                for elt in &t.elts {
                    self.add_lhs(elt, locate)?;
                }
                Ok(())
            }
            ast::Expr::Name(n) => {
                self.add_local(&n.id);
                Ok(())
            }
            other => Err(FrontendError::malformed(
                format!("unexpected assignment target {}", expr_kind_name(other)),
                locate(expr_range(other)),
            )),
        }
    }

    /// Assignment LHS: subscript targets are reads of the base + index and
    /// define no local; everything else goes through `add_lhs`.
    fn add_assign_lhs(
        &mut self,
        tgt: &ast::Expr,
        map: &mut ScopeMap,
        locate: &mut impl FnMut(TextRange) -> CodeLoc,
    ) -> Result<(), FrontendError> {
        if let ast::Expr::Subscript(s) = tgt {
            self.visit_expr(&s.value, map, locate)?;
            self.visit_expr(&s.slice, map, locate)
        } else {
            self.add_lhs(tgt, locate)
        }
    }

    fn add_args(&mut self, args: &ast::Arguments, locate: &mut impl FnMut(TextRange) -> CodeLoc) -> Result<(), FrontendError> {
        if let Some(vararg) = &args.vararg {
            return Err(FrontendError::unsupported("*args parameter", locate(vararg.range)));
        }
        if let Some(kwarg) = &args.kwarg {
            return Err(FrontendError::unsupported("**kwargs parameter", locate(kwarg.range)));
        }
        if !args.kwonlyargs.is_empty() {
            return Err(FrontendError::unsupported(
                "keyword-only parameters",
                locate(args.kwonlyargs[0].def.range),
            ));
        }
        for param in args.posonlyargs.iter().chain(&args.args) {
            self.add_local(&param.def.arg);
        }
        Ok(())
    }

    fn visit_expr(
        &mut self,
        expr: &ast::Expr,
        map: &mut ScopeMap,
        locate: &mut impl FnMut(TextRange) -> CodeLoc,
    ) -> Result<(), FrontendError> {
        match expr {
            ast::Expr::Constant(_) => Ok(()),
            ast::Expr::Name(n) => {
                self.add_reference(&n.id, locate(n.range));
                Ok(())
            }
            ast::Expr::Attribute(a) => {
                if !matches!(a.ctx, ast::ExprContext::Load) {
                    return Err(FrontendError::unsupported(
                        "attribute store/delete",
                        locate(a.range),
                    ));
                }
                self.visit_expr(&a.value, map, locate)
            }
            ast::Expr::Subscript(s) => {
                self.visit_expr(&s.value, map, locate)?;
                self.visit_expr(&s.slice, map, locate)
            }
            ast::Expr::Slice(s) => {
                for part in [&s.lower, &s.upper, &s.step].into_iter().flatten() {
                    self.visit_expr(part, map, locate)?;
                }
                Ok(())
            }
            ast::Expr::Tuple(t) => {
                for e in &t.elts {
                    self.visit_expr(e, map, locate)?;
                }
                Ok(())
            }
            ast::Expr::List(l) => {
                for e in &l.elts {
                    self.visit_expr(e, map, locate)?;
                }
                Ok(())
            }
            ast::Expr::UnaryOp(u) => self.visit_expr(&u.operand, map, locate),
            ast::Expr::BinOp(b) => {
                self.visit_expr(&b.left, map, locate)?;
                self.visit_expr(&b.right, map, locate)
            }
            ast::Expr::Compare(c) => {
                self.visit_expr(&c.left, map, locate)?;
                for cmp in &c.comparators {
                    self.visit_expr(cmp, map, locate)?;
                }
                Ok(())
            }
            ast::Expr::Call(c) => {
                self.visit_expr(&c.func, map, locate)?;
                for a in &c.args {
                    self.visit_expr(a, map, locate)?;
                }
                for kw in &c.keywords {
                    if kw.arg.is_none() {
                        return Err(FrontendError::unsupported("** in call", locate(kw.range)));
                    }
                    self.visit_expr(&kw.value, map, locate)?;
                }
                Ok(())
            }
            ast::Expr::FormattedValue(fv) => {
                self.visit_expr(&fv.value, map, locate)?;
                if fv.conversion != ast::ConversionFlag::None {
                    return Err(FrontendError::unsupported(
                        "f-string conversion field",
                        locate(fv.range),
                    ));
                }
                if let Some(spec) = &fv.format_spec {
                    self.visit_expr(spec, map, locate)?;
                }
                Ok(())
            }
            ast::Expr::JoinedStr(s) => {
                for part in &s.values {
                    self.visit_expr(part, map, locate)?;
                }
                Ok(())
            }
            ast::Expr::Lambda(l) => {
                let mut inner = Analyzer::new(self.builtins);
                inner.add_args(&l.args, locate)?;
                inner.visit_expr(&l.body, map, locate)?;
                self.close_scope(l.range, inner, map);
                Ok(())
            }
            ast::Expr::ListComp(lc) => self.visit_list_comp(lc, map, locate),
            ast::Expr::GeneratorExp(g) => Err(FrontendError::unsupported(
                "generator expression",
                locate(g.range),
            )),
            other => Err(FrontendError::unsupported(
                format!("{} expression", expr_kind_name(other)),
                locate(expr_range(other)),
            )),
        }
    }

    /// List comprehension: `e1` visits in the outer scope; each subsequent
    /// generator introduces a nested scope whose iterable is visited in the
    /// *previous* inner scope; `elt` visits in the innermost (spec.md §4.3).
    fn visit_list_comp(
        &mut self,
        lc: &ast::ExprListComp,
        map: &mut ScopeMap,
        locate: &mut impl FnMut(TextRange) -> CodeLoc,
    ) -> Result<(), FrontendError> {
        let mut chain: Vec<Analyzer<'_>> = Vec::with_capacity(lc.generators.len());
        for (i, generator) in lc.generators.iter().enumerate() {
            if generator.is_async {
                return Err(FrontendError::unsupported(
                    "async comprehension generator",
                    locate(generator.range),
                ));
            }
            if !generator.ifs.is_empty() {
                return Err(FrontendError::unsupported(
                    "comprehension if-clause",
                    locate(generator.range),
                ));
            }
            if i == 0 {
                self.visit_expr(&generator.iter, map, locate)?;
            } else {
                chain.last_mut().unwrap().visit_expr(&generator.iter, map, locate)?;
            }
            let mut next = Analyzer::new(self.builtins);
            next.add_lhs(&generator.target, locate)?;
            chain.push(next);
        }

        chain.last_mut().unwrap().visit_expr(&lc.elt, map, locate)?;

        // Pop innermost-first, closing each generator's scope into its
        // enclosing analyzer (outer-most is `self`).
        while let Some(inner) = chain.pop() {
            let generator = &lc.generators[chain.len()];
            let outer = chain.last_mut();
            match outer {
                Some(outer) => outer.close_scope(generator.range, inner, map),
                None => self.close_scope(generator.range, inner, map),
            }
        }
        Ok(())
    }
}

fn stmt_range(stmt: &ast::Stmt) -> TextRange {
    use ast::Ranged;
    stmt.range()
}

fn expr_range(expr: &ast::Expr) -> TextRange {
    use ast::Ranged;
    expr.range()
}

fn stmt_kind_name(stmt: &ast::Stmt) -> &'static str {
    match stmt {
        ast::Stmt::ClassDef(_) => "class definition",
        ast::Stmt::Delete(_) => "del",
        ast::Stmt::AnnAssign(_) => "annotated assignment",
        ast::Stmt::AsyncFunctionDef(_) => "async def",
        ast::Stmt::AsyncFor(_) => "async for",
        ast::Stmt::AsyncWith(_) => "async with",
        ast::Stmt::Raise(_) => "raise",
        ast::Stmt::Try(_) | ast::Stmt::TryStar(_) => "try",
        ast::Stmt::Assert(_) => "assert",
        ast::Stmt::ImportFrom(_) => "from-import",
        ast::Stmt::Global(_) => "global",
        ast::Stmt::Nonlocal(_) => "nonlocal",
        ast::Stmt::Pass(_) => "pass",
        ast::Stmt::Break(_) => "break",
        ast::Stmt::Continue(_) => "continue",
        ast::Stmt::TypeAlias(_) => "type alias",
        _ => "unrecognized",
    }
}

fn expr_kind_name(expr: &ast::Expr) -> &'static str {
    match expr {
        ast::Expr::BoolOp(_) => "boolean operator",
        ast::Expr::NamedExpr(_) => "named expression (walrus)",
        ast::Expr::Dict(_) => "dict literal",
        ast::Expr::Set(_) => "set literal",
        ast::Expr::SetComp(_) => "set comprehension",
        ast::Expr::DictComp(_) => "dict comprehension",
        ast::Expr::Await(_) => "await",
        ast::Expr::Yield(_) => "yield",
        ast::Expr::YieldFrom(_) => "yield from",
        ast::Expr::Starred(_) => "starred expression",
        ast::Expr::IfExp(_) => "conditional expression",
        _ => "unrecognized expression",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::ParsedModule;

    fn analyze(src: &str) -> Result<(ScopeMap, VariableScope), FrontendError> {
        let builtins = BuiltinRegistry::new();
        let mut parsed = ParsedModule::parse(src, "<test>").unwrap();
        let body = std::mem::take(&mut parsed.body);
        analyze_module(&body, &builtins, &mut |r| parsed.locate(r.start()))
    }

    #[test]
    fn locals_and_free_are_disjoint_and_cover_names() {
        let (_, top) = analyze("x = 1\nprint(x)\n").unwrap();
        assert!(top.locals.contains("x"));
        assert!(top.free.is_empty());
    }

    #[test]
    fn free_variable_at_module_level_is_reported() {
        let (_, top) = analyze("print(foo)\n").unwrap();
        assert_eq!(top.free.len(), 1);
        assert_eq!(top.free[0].name, "foo");
    }

    #[test]
    fn local_shadowing_builtin_wins() {
        let (_, top) = analyze("print = 1\nprint(print)\n").unwrap();
        assert!(top.locals.contains("print"));
        assert!(top.free.is_empty());
    }

    #[test]
    fn nested_function_captures_free_variable() {
        let (map, top) = analyze("def f():\n    return x\nx = 1\n").unwrap();
        assert!(top.locals.contains("f"));
        assert!(top.locals.contains("x"));
        assert_eq!(map.len(), 1);
        let inner = map.values().next().unwrap();
        assert_eq!(inner.free.len(), 1);
        assert_eq!(inner.free[0].name, "x");
    }

    #[test]
    fn subscript_assignment_does_not_define_a_local() {
        let (_, top) = analyze("a[0] = 1\n").unwrap();
        assert!(top.locals.is_empty());
        assert_eq!(top.free.len(), 1);
        assert_eq!(top.free[0].name, "a");
    }

    #[test]
    fn multi_target_assignment_is_rejected() {
        let err = analyze("a = b = 1\n").unwrap_err();
        assert!(matches!(err, FrontendError::Unsupported { .. }));
    }

    #[test]
    fn list_comp_target_does_not_escape() {
        let (map, top) = analyze("[x for x in xs]\n").unwrap();
        assert!(top.free.iter().any(|f| f.name == "xs"));
        assert!(!top.locals.contains("x"));
        assert_eq!(map.len(), 1);
    }
}
