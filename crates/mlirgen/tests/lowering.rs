use mlirgen::compile;
use mlirgen::diagnostics::FrontendError;

fn lowered(src: &str) -> String {
    compile(src, "test.py").expect("expected successful lowering")
}

fn error(src: &str) -> FrontendError {
    compile(src, "test.py").expect_err("expected lowering to fail")
}

#[test]
fn assignment_and_builtin_call_lower_to_a_module_function() {
    let ir = lowered("x = 1\nprint(x)\n");
    assert!(ir.contains("scripting.func @module"));
    assert!(ir.contains("scripting.load_builtin() {name = \"print\"}"));
    assert!(ir.contains("scripting.invoke_call"));
}

#[test]
fn function_def_lowers_to_its_own_ir_function() {
    let ir = lowered("def add_one(x):\n    return x + 1\n");
    assert!(ir.contains("scripting.func @add_one(%0: !scripting.value)"));
    assert!(ir.contains("scripting.invoke_binop"));
}

/// A nested function closing over its enclosing parameter takes the
/// captured cell as a trailing `!scripting.cell` parameter (spec.md §3's
/// parent/child closure ABI).
#[test]
fn nested_function_captures_enclosing_variable_by_cell() {
    let ir = lowered(
        "def make_counter(start):\n    def increment():\n        return start + 1\n    return increment\n",
    );
    assert!(ir.contains("scripting.func @increment(%0: !scripting.cell)"));
    assert!(ir.contains("{callee = @increment}"));
}

/// A named function can call itself: its own name resolves as a free
/// variable captured by the enclosing scope before the closure is built.
#[test]
fn self_recursive_function_compiles() {
    let ir = lowered("def fact(n):\n    return fact(n)\n");
    assert!(ir.contains("scripting.func @fact"));
}

#[test]
fn if_statement_lowers_to_three_blocks_with_a_merge() {
    let ir = lowered("x = 1\nif x:\n    y = 1\nelse:\n    y = 2\nprint(y)\n");
    assert!(ir.contains("scripting.truthy"));
    assert!(ir.contains("cf.cond_br") || ir.contains("cond_br"));
}

#[test]
fn while_loop_lowers_with_a_header_block() {
    let ir = lowered("x = 0\nwhile x:\n    x = 0\n");
    assert!(ir.contains("scripting.truthy"));
}

#[test]
fn for_loop_uses_invoke_iter_and_invoke_next() {
    let ir = lowered("for x in range(3):\n    print(x)\n");
    assert!(ir.contains("scripting.invoke_iter"));
    assert!(ir.contains("scripting.invoke_next"));
}

/// List comprehensions lower via nested generator loops rather than a
/// separate closure (spec.md §4.6): no extra `scripting.func` is emitted.
#[test]
fn list_comprehension_lowers_without_a_separate_function() {
    let ir = lowered("values = [n + 1 for n in range(3)]\n");
    assert!(ir.contains("scripting.list_append"));
    assert!(ir.contains("scripting.invoke_next"));
    let function_count = ir.matches("scripting.func @").count();
    assert_eq!(function_count, 1, "comprehension should not spawn its own IR function");
}

/// The comprehension's target name must not leak into the enclosing
/// scope: reusing it as an ordinary module-level name right after the
/// comprehension must still compile and resolve to the *later* binding.
#[test]
fn list_comprehension_target_does_not_escape() {
    let ir = lowered("n = 99\nvalues = [n for n in range(3)]\nprint(n)\n");
    assert!(ir.contains("scripting.invoke_next"));
}

#[test]
fn nested_multi_generator_comprehension_threads_each_target() {
    let ir = lowered("pairs = [a + b for a in range(2) for b in range(2)]\n");
    assert_eq!(ir.matches("scripting.invoke_iter").count(), 2);
}

#[test]
fn lambda_lowers_to_its_own_ir_function() {
    let ir = lowered("square = lambda x: x * x\n");
    assert!(ir.contains("scripting.func @lambda"));
}

#[test]
fn import_statement_stores_into_the_aliased_name() {
    let ir = lowered("import os\nprint(os)\n");
    assert!(ir.contains("scripting.invoke_import"));
}

#[test]
fn big_integer_literal_falls_back_to_a_string_constant() {
    let ir = lowered("x = 123456789012345678901234567890\n");
    assert!(ir.contains("scripting.constant_big_int"));
}

#[test]
fn unresolved_module_level_name_is_a_fatal_error() {
    let err = error("print(totally_unknown_name)\n");
    assert!(matches!(err, FrontendError::UnresolvedNames { .. }));
    assert!(err.to_string().contains("totally_unknown_name"));
}

#[test]
fn multi_target_assignment_is_unsupported() {
    let err = error("a = b = 1\n");
    assert!(matches!(err, FrontendError::Unsupported { .. }));
}

#[test]
fn starred_expression_is_unsupported() {
    let err = error("a, *b = [1, 2, 3]\n");
    assert!(matches!(err, FrontendError::Unsupported { .. } | FrontendError::Malformed { .. }));
}

/// Keyword arguments append their values to the positional list and collect
/// their names into a `keywords` attribute array (spec.md §4.5 Call).
#[test]
fn keyword_argument_call_appends_value_and_records_name() {
    let ir = lowered("def f(x):\n    return x\nf(x=1)\n");
    assert!(ir.contains(r#"{keywords = ["x"]}"#));
}

#[test]
fn double_star_call_is_unsupported() {
    let err = error("def f(x):\n    return x\nf(**{\"x\": 1})\n");
    assert!(matches!(err, FrontendError::Unsupported { .. }));
}

/// Chained comparisons lower left-to-right, each comparison reusing the
/// previous right operand (spec.md §4.5 Compare): two `invoke_compare`s for
/// a three-term chain.
#[test]
fn chained_comparison_lowers_left_to_right() {
    let ir = lowered("x = 1\nif 0 < x < 2:\n    y = 1\n");
    assert_eq!(ir.matches("scripting.invoke_compare").count(), 2);
}

/// `with` calls `__enter__`/`__exit__` and binds the optional target; on
/// normal fall-through the exit is called before the statement after the
/// block (spec.md §4.7 With).
#[test]
fn with_statement_enters_binds_and_exits() {
    let ir = lowered("with open(\"f\") as fh:\n    print(fh)\n");
    assert!(ir.contains(r#"{name = "__enter__"}"#));
    assert!(ir.contains(r#"{name = "__exit__"}"#));
}

/// A `return` inside a `with` body runs the enclosing `__exit__` before the
/// terminal `scripting.return` (spec.md §4.7 Return).
#[test]
fn return_inside_with_runs_exit_first() {
    let ir = lowered("def f():\n    with open(\"f\") as fh:\n        return fh\n");
    let f_body = &ir[ir.find("scripting.func @f()").expect("@f is emitted")..];
    let exit_pos = f_body.find(r#"{name = "__exit__"}"#).expect("__exit__ looked up");
    // The landing-pad block's `return` (the raised-exception path, shared by
    // every fallible op in the function) prints first; the normal-path
    // return that `__exit__` actually guards is the *last* one.
    let return_pos = f_body.rfind("scripting.return(").expect("a return is emitted");
    assert!(exit_pos < return_pos, "__exit__ call must precede the return it guards");
}

/// f-string format specs lower the spec expression (or `none` when absent)
/// and dispatch through `__format__` (spec.md §4.5 FormattedValue).
#[test]
fn formatted_value_dispatches_through_dunder_format() {
    let ir = lowered("x = 1\nprint(f\"{x:>10}\")\n");
    assert!(ir.contains(r#"{name = "__format__"}"#));
    assert!(ir.contains("scripting.concat_str"));
}

#[test]
fn formatted_value_without_spec_uses_none() {
    let ir = lowered("x = 1\nprint(f\"{x}\")\n");
    assert!(ir.contains("scripting.constant_none"));
    assert!(ir.contains(r#"{name = "__format__"}"#));
}

/// A slice with only an upper bound dispatches to the `slice` builtin's
/// 1-argument form (spec.md §4.5 Slice).
#[test]
fn slice_with_only_upper_uses_one_argument_form() {
    let ir = lowered("x = [1, 2, 3]\ny = x[:2]\n");
    assert!(ir.contains(r#"scripting.load_builtin() {name = "slice"}"#));
}

/// A full `lower:upper:step` slice dispatches to the 3-argument form.
#[test]
fn slice_with_step_uses_three_argument_form() {
    let ir = lowered("x = [1, 2, 3]\ny = x[0:2:1]\n");
    assert!(ir.contains(r#"scripting.load_builtin() {name = "slice"}"#));
    assert!(ir.contains("scripting.invoke_call"));
}

#[test]
fn error_message_reports_line_and_column() {
    let err = error("\n\nprint(nope)\n");
    let rendered = err.to_string();
    assert!(rendered.contains("3:"));
}
