pub mod builtin;
pub mod cf;
pub mod scripting;
