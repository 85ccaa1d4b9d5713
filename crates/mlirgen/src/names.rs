//! Name Allocator (spec.md §4.2).
//!
//! Mints unique IR symbol names by appending a disambiguating suffix to a
//! requested base; shared per module. Grounded in `genmlir.py`'s
//! `Module.fresh_symbol`: the fallback stem for a null/empty base is kept
//! exactly as `_mlir_gen` (spec.md §E resolves the "e.g." wording this way).

use indexmap::IndexMap;

const FALLBACK_STEM: &str = "_mlir_gen";

/// Deterministic, monotone per-base name allocator.
pub struct NameAllocator {
    counts: IndexMap<String, u32>,
}

impl NameAllocator {
    #[must_use]
    pub fn new() -> Self {
        Self { counts: IndexMap::new() }
    }

    /// Returns `base` the first time it is requested, then `base@0`, `base@1`, ...
    /// on subsequent requests. A null/empty base (after `@`-stripping) falls
    /// back to `_mlir_gen`.
    pub fn fresh(&mut self, base: Option<&str>) -> String {
        let mut stem = base.unwrap_or_default().replace('@', "");
        if stem.is_empty() {
            FALLBACK_STEM.clone_into(&mut stem);
        }
        match self.counts.get_mut(&stem) {
            None => {
                self.counts.insert(stem.clone(), 0);
                stem
            }
            Some(count) => {
                let name = format!("{stem}@{count}");
                *count += 1;
                name
            }
        }
    }
}

impl Default for NameAllocator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_request_returns_base_unchanged() {
        let mut alloc = NameAllocator::new();
        assert_eq!(alloc.fresh(Some("f")), "f");
    }

    #[test]
    fn repeated_requests_disambiguate_in_order() {
        let mut alloc = NameAllocator::new();
        assert_eq!(alloc.fresh(Some("f")), "f");
        assert_eq!(alloc.fresh(Some("f")), "f@0");
        assert_eq!(alloc.fresh(Some("f")), "f@1");
    }

    #[test]
    fn null_or_empty_base_uses_fallback_stem() {
        let mut alloc = NameAllocator::new();
        assert_eq!(alloc.fresh(None), "_mlir_gen");
        assert_eq!(alloc.fresh(Some("")), "_mlir_gen@0");
    }

    #[test]
    fn at_sign_in_base_is_stripped() {
        let mut alloc = NameAllocator::new();
        assert_eq!(alloc.fresh(Some("f@weird")), "fweird");
    }

    #[test]
    fn different_bases_do_not_interfere() {
        let mut alloc = NameAllocator::new();
        assert_eq!(alloc.fresh(Some("f")), "f");
        assert_eq!(alloc.fresh(Some("g")), "g");
        assert_eq!(alloc.fresh(Some("f")), "f@0");
    }
}
