//! Expression/statement lowering and the module driver (spec.md §4.5-§4.10, §2 item 7).

pub mod cell;
pub mod driver;
pub mod expr;
pub mod stmt;

pub use driver::lower_module;

use rustpython_ast::text_size::TextRange;

use crate::builtins::BuiltinRegistry;
use crate::diagnostics::CodeLoc;
use crate::ir::builder::FunctionBuilder;
use crate::ir::value::ValueId;
use crate::names::NameAllocator;
use crate::scope::ScopeMap;

use cell::CellMap;

/// Module-wide state shared by every function being lowered.
pub struct LowerCtx<'a> {
    pub scope_map: &'a ScopeMap,
    pub builtins: &'a BuiltinRegistry,
    pub names: &'a mut NameAllocator,
    pub locate: &'a mut dyn FnMut(TextRange) -> CodeLoc,
    pub functions: Vec<crate::ir::Function>,
}

/// Per-function lowering state.
pub struct FuncCtx {
    pub b: FunctionBuilder,
    pub cells: CellMap,
    /// Stack of active `with`-statement cleanups (spec.md §3's `on_done`):
    /// each frame holds that statement's `__exit__` method values in
    /// item-entry order. A `return` runs every frame innermost-first; a
    /// `with` body's normal fall-through runs and pops only its own frame.
    pub on_done: Vec<Vec<ValueId>>,
}
