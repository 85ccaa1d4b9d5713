//! Lowers a Python-like AST into a block-and-region SSA IR.
//!
//! The pipeline is: [`source::ParsedModule::parse`] → [`scope::analyze_module`]
//! → [`lower::lower_module`] → [`ir::print`]. Each stage is its own module;
//! `source` is the only one aware of the concrete host-parser crate.

pub mod builtins;
pub mod diagnostics;
pub mod ir;
pub mod lower;
pub mod names;
pub mod scope;
pub mod source;

use diagnostics::FrontendError;

/// Parses, analyzes, and lowers `source` into the textual IR form (spec.md §6.3).
///
/// # Errors
/// Propagates parse errors (wrapped as [`FrontendError::Unsupported`]) and any
/// of the three fatal error kinds raised while analyzing or lowering.
pub fn compile(source_text: &str, path: &str) -> Result<String, FrontendError> {
    let mut parsed = source::ParsedModule::parse(source_text, path)
        .map_err(|e| FrontendError::unsupported(e.to_string(), diagnostics::CodeLoc::default()))?;
    let body = std::mem::take(&mut parsed.body);
    let registry = builtins::BuiltinRegistry::new();
    let (scope_map, module_scope) =
        scope::analyze_module(&body, &registry, &mut |r| parsed.locate(r.start()))?;
    if !module_scope.free.is_empty() {
        let offenders = module_scope.free.iter().map(|f| (f.name.clone(), f.loc)).collect();
        return Err(FrontendError::UnresolvedNames { offenders });
    }
    let module = lower::lower_module(&body, &scope_map, &registry, &mut parsed)?;
    Ok(ir::print::print_module(&module))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compiles_a_trivial_module() {
        let out = compile("x = 1\nprint(x)\n", "<test>").unwrap();
        assert!(out.contains("scripting.constant"));
    }
}
