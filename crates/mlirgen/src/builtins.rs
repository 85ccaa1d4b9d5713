//! Builtin Registry (spec.md §4.1).
//!
//! A fixed, bidirectional mapping from source-level builtin names to IR-level
//! builtin symbols, seeded once and immutable after construction. Grounded in
//! `genmlir.py`'s `BuiltinSet`: most names pass through unchanged; a few are
//! renamed to dodge reserved IR words.

use indexmap::IndexMap;

/// Source-level names that would otherwise clash with reserved IR words,
/// paired with the IR name they resolve to.
const RENAMED: &[(&str, &str)] = &[
    ("bool", "bool_builtin"),
    ("float", "float_builtin"),
    ("int", "int_builtin"),
    ("__import__", "import"),
    ("__name__", "scriptmain"),
];

/// Builtins that resolve to themselves.
const IDENTITY: &[&str] = &[
    "abs", "aiter", "all", "any", "anext", "ascii", "bin", "breakpoint", "bytearray", "bytes", "callable", "chr",
    "classmethod", "compile", "complex", "delattr", "dict", "dir", "divmod", "enumerate", "eval", "exec", "filter",
    "format", "frozenset", "getattr", "globals", "hasattr", "hash", "help", "hex", "id", "input", "isinstance",
    "issubclass", "iter", "len", "list", "locals", "map", "max", "memoryview", "min", "next", "object", "oct",
    "open", "ord", "pow", "print", "property", "range", "repr", "reversed", "round", "set", "setattr", "slice",
    "sorted", "staticmethod", "str", "sum", "super", "tuple", "type", "vars", "zip",
];

/// Resolves source-level builtin names to their IR-level symbol.
///
/// Immutable after construction: source programs cannot shadow a builtin
/// unless they assign to it in a scope, in which case the Scope Analyzer's
/// local-wins rule takes over and this registry is never consulted for that
/// name (spec.md §4.1).
pub struct BuiltinRegistry {
    names: IndexMap<&'static str, &'static str>,
}

impl BuiltinRegistry {
    #[must_use]
    pub fn new() -> Self {
        let mut names = IndexMap::with_capacity(RENAMED.len() + IDENTITY.len());
        for &name in IDENTITY {
            names.insert(name, name);
        }
        for &(py_name, ir_name) in RENAMED {
            names.insert(py_name, ir_name);
        }
        Self { names }
    }

    /// Resolves `name` to its IR-level symbol. Never fails.
    #[must_use]
    pub fn resolve(&self, name: &str) -> Option<&'static str> {
        self.names.get(name).copied()
    }
}

impl Default for BuiltinRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_identity_and_renamed_builtins() {
        let reg = BuiltinRegistry::new();
        assert_eq!(reg.resolve("print"), Some("print"));
        assert_eq!(reg.resolve("bool"), Some("bool_builtin"));
        assert_eq!(reg.resolve("__import__"), Some("import"));
        assert_eq!(reg.resolve("__name__"), Some("scriptmain"));
    }

    #[test]
    fn unknown_name_resolves_to_none() {
        assert_eq!(BuiltinRegistry::new().resolve("not_a_builtin"), None);
    }
}
