//! The `builtin` dialect: module/function structure shared by every dialect.
//!
//! Holds no ops of its own in this IR — `scripting.func` plays the role a
//! `builtin.func` would — but stays a separate module, per spec.md §6.2,
//! since a textual-form reader keys off the dialect prefix to decide what a
//! mnemonic means, and module/function shape is conceptually a `builtin`
//! concern rather than a `scripting` one.

pub use crate::ir::op::{Function, Module};
