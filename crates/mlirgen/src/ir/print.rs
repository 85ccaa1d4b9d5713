//! Textual IR serializer (spec.md §6.3).
//!
//! Emission order follows insertion order throughout: functions as appended
//! to the module, blocks as appended to the function, ops as appended to
//! each block. No sorting or reordering pass runs over the output.

use std::fmt::Write as _;

use super::op::{Function, Module, Operation};

#[must_use]
pub fn print_module(module: &Module) -> String {
    let mut out = String::new();
    for (i, func) in module.functions.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        print_function(&mut out, func);
    }
    out
}

fn print_function(out: &mut String, func: &Function) {
    write!(out, "scripting.func @{}(", func.name).unwrap();
    for (i, (v, ty)) in func.params.iter().enumerate() {
        if i > 0 {
            write!(out, ", ").unwrap();
        }
        write!(out, "{v}: {ty}").unwrap();
    }
    writeln!(out, ") {{").unwrap();
    for block in &func.blocks {
        write!(out, "{}", block.id).unwrap();
        if !block.args.is_empty() {
            write!(out, "(").unwrap();
            for (i, (v, ty)) in block.args.iter().enumerate() {
                if i > 0 {
                    write!(out, ", ").unwrap();
                }
                write!(out, "{v}: {ty}").unwrap();
            }
            write!(out, ")").unwrap();
        }
        writeln!(out, ":").unwrap();
        for op in &block.ops {
            print_op(out, op);
        }
    }
    writeln!(out, "}}").unwrap();
}

fn print_op(out: &mut String, op: &Operation) {
    write!(out, "  ").unwrap();
    if !op.results.is_empty() {
        for (i, (v, _)) in op.results.iter().enumerate() {
            if i > 0 {
                write!(out, ", ").unwrap();
            }
            write!(out, "{v}").unwrap();
        }
        write!(out, " = ").unwrap();
    }
    write!(out, "{}(", op.mnemonic).unwrap();
    for (i, operand) in op.operands.iter().enumerate() {
        if i > 0 {
            write!(out, ", ").unwrap();
        }
        write!(out, "{operand}").unwrap();
    }
    write!(out, ")").unwrap();
    if !op.attributes.is_empty() {
        write!(out, " {{").unwrap();
        for (i, (name, value)) in op.attributes.iter().enumerate() {
            if i > 0 {
                write!(out, ", ").unwrap();
            }
            write!(out, "{name} = {value}").unwrap();
        }
        write!(out, "}}").unwrap();
    }
    if !op.successors.is_empty() {
        write!(out, " -> [").unwrap();
        for (i, (target, args)) in op.successors.iter().enumerate() {
            if i > 0 {
                write!(out, ", ").unwrap();
            }
            write!(out, "{target}").unwrap();
            if !args.is_empty() {
                write!(out, "(").unwrap();
                for (j, a) in args.iter().enumerate() {
                    if j > 0 {
                        write!(out, ", ").unwrap();
                    }
                    write!(out, "{a}").unwrap();
                }
                write!(out, ")").unwrap();
            }
        }
        write!(out, "]").unwrap();
    }
    writeln!(out).unwrap();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::builder::FunctionBuilder;
    use crate::ir::types::Type;

    #[test]
    fn prints_a_function_with_a_branch() {
        let mut b = FunctionBuilder::new("main", &[]);
        let entry = b.current_block();
        let target = b.new_block();
        b.set_insertion_block(entry);
        b.br(target, Vec::new());
        b.set_insertion_block(target);
        let c = b.emit("scripting.constant", Vec::new(), vec![("value", crate::ir::attribute::Attribute::I64(1))], &[Type::Value]);
        let false_ = b.emit("scripting.constant", Vec::new(), vec![("value", crate::ir::attribute::Attribute::Bool(false))], &[Type::I1]);
        b.scripting_return(c[0], false_[0]);
        let func = b.finish();
        let module = Module { functions: vec![func] };
        let text = print_module(&module);
        assert!(text.contains("scripting.func @main"));
        assert!(text.contains("cf.br"));
        assert!(text.contains("scripting.return"));
    }
}
