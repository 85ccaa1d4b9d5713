//! Cell Allocator / Scope Builder (spec.md §4.4).
//!
//! Every local in a function gets a heap cell allocated at function entry,
//! regardless of whether anything closes over it. This trades the teacher's
//! (and `genmlir.py`'s) finer-grained "only allocate a cell when a nested
//! scope actually captures this name" rule for a simpler, still-correct
//! scheme: reads and writes always go through a cell, so join points in the
//! control-flow graph never need block-argument threading for data values
//! (only loop/iteration *control* state does, via `invoke_next`). The
//! tradeoff is recorded in DESIGN.md.

use indexmap::IndexMap;

use crate::ir::builder::FunctionBuilder;
use crate::ir::dialects::scripting;
use crate::ir::value::ValueId;
use crate::scope::VariableScope;

/// Name-to-cell lookup for the function currently being lowered.
#[derive(Debug, Clone, Default)]
pub struct CellMap {
    cells: IndexMap<String, ValueId>,
}

impl CellMap {
    #[must_use]
    pub fn get(&self, name: &str) -> Option<ValueId> {
        self.cells.get(name).copied()
    }

    /// Binds `name` to `cell`, shadowing any existing binding. Used when a
    /// nested scope (a list comprehension's generator target) introduces a
    /// name the enclosing function never declared as a local.
    pub fn insert(&mut self, name: String, cell: ValueId) {
        self.cells.insert(name, cell);
    }
}

/// Allocates a cell for every local in `scope`, then stores each incoming
/// positional-parameter value into its cell. `captured` supplies, in the
/// child function's free-variable order, the `!scripting.cell` values
/// received as extra trailing parameters (the parent/child closure ABI).
///
/// # Panics
/// Panics if `param_names` contains a name absent from `scope.locals` — the
/// scope analyzer always adds every parameter as a local, so this would
/// indicate a mismatch between the analyzer and the caller.
pub fn build_cells(
    b: &mut FunctionBuilder,
    scope: &VariableScope,
    param_names: &[String],
    param_values: &[ValueId],
    captured: &[(String, ValueId)],
) -> CellMap {
    let mut cells = IndexMap::new();
    for name in &scope.locals {
        let cell = scripting::cell_alloc(b);
        cells.insert(name.clone(), cell);
    }
    for (name, value) in param_names.iter().zip(param_values) {
        let cell = *cells.get(name).expect("every parameter is a local");
        scripting::cell_store(b, cell, *value);
    }
    for (name, cell) in captured {
        cells.insert(name.clone(), *cell);
    }
    CellMap { cells }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::types::Type;
    use indexmap::IndexSet;

    #[test]
    fn allocates_a_cell_per_local_and_stores_params() {
        let mut b = FunctionBuilder::new("f", &[Type::Value]);
        let p: Vec<ValueId> = b.params().iter().map(|(v, _)| *v).collect();
        let scope = VariableScope { locals: IndexSet::from(["x".to_owned()]), free: Vec::new() };
        let cells = build_cells(&mut b, &scope, &["x".to_owned()], &p, &[]);
        assert!(cells.get("x").is_some());
        assert!(cells.get("y").is_none());
    }
}
