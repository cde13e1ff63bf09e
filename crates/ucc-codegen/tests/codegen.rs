//! End-to-end tests over the whole pipeline: source text in, IR out.

use ucc_codegen::compile;
use ucc_codegen::error::CompileError;
use ucc_codegen::instr::Instr;

fn compile_ok(source: &str) -> Vec<Instr> {
    compile(source).expect("compilation should succeed")
}

fn opcodes(instrs: &[Instr]) -> Vec<&str> {
    instrs.iter().map(|i| i.opcode.as_str()).collect()
}

/// The position of the first instruction with the given opcode.
fn position(instrs: &[Instr], opcode: &str) -> usize {
    instrs
        .iter()
        .position(|i| i.opcode == opcode)
        .unwrap_or_else(|| panic!("no '{opcode}' instruction emitted"))
}

fn first<'a>(instrs: &'a [Instr], opcode: &str) -> &'a Instr {
    &instrs[position(instrs, opcode)]
}

#[test]
fn scalar_declaration_and_print() {
    let instrs = compile_ok("int main() { int x; x = 3; print(x); return 0; }");

    let expected = vec![
        Instr::new("define", vec!["@main".into()]),
        Instr::new("alloc_int", vec!["%0".into()]),
        Instr::new("alloc_int", vec!["%2".into()]),
        Instr::new("literal_int", vec!["3".into(), "%3".into()]),
        Instr::new("store_int", vec!["%3".into(), "%2".into()]),
        Instr::new("load_int", vec!["%2".into(), "%4".into()]),
        Instr::new("print_int", vec!["%4".into()]),
        Instr::new("literal_int", vec!["0".into(), "%5".into()]),
        Instr::new("store_int", vec!["%5".into(), "%0".into()]),
        Instr::new("jump", vec!["%1".into()]),
        Instr::label("%1"),
        Instr::new("load_int", vec!["%0".into(), "%6".into()]),
        Instr::new("return_int", vec!["%6".into()]),
    ];

    assert_eq!(instrs, expected);
}

#[test]
fn global_array_with_inferred_size() {
    let instrs = compile_ok("int a[] = {1, 2, 3, 4};");

    assert_eq!(
        instrs,
        vec![Instr::new("global_int_4", vec!["@a".into(), "[1, 2, 3, 4]".into()])]
    );
}

#[test]
fn two_dimensional_read_linearizes_the_index() {
    let instrs = compile_ok(
        "int main() { int m[2][3]; int v; int i; int j; v = m[i][j]; return 0; }",
    );

    // The row is scaled by the inner dimension, the column added, and the
    // flat index fed to elem
    let literal_dim = first(&instrs, "literal_int");
    assert_eq!(literal_dim.operands[0], "3");

    let mul = first(&instrs, "mul_int");
    let add = first(&instrs, "add_int");
    let elem = first(&instrs, "elem_int");
    let load = first(&instrs, "load_int_*");

    assert_eq!(mul.operands[0], literal_dim.operands[1]);
    assert_eq!(add.operands[0], mul.operands[2]);
    assert_eq!(elem.operands[1], add.operands[2]);
    assert_eq!(load.operands[0], elem.operands[2]);

    // The loaded element lands in v's slot
    let store = instrs
        .iter()
        .find(|i| i.opcode == "store_int" && i.operands[0] == load.operands[1])
        .expect("element value should be stored");
    assert_eq!(store.operands[1], "%3");

    assert!(position(&instrs, "mul_int") < position(&instrs, "add_int"));
    assert!(position(&instrs, "add_int") < position(&instrs, "elem_int"));
}

#[test]
fn while_with_break_jumps_to_the_exit_label() {
    let instrs = compile_ok(
        "int main() { int i; int n; int k; i = 0; \
         while (i < n) { if (i == k) break; i = i + 1; } return 0; }",
    );

    // The first cbranch belongs to the while condition
    let cbranch = first(&instrs, "cbranch");
    let body_label = cbranch.operands[1].trim_start_matches('%').to_string();
    let exit_label = cbranch.operands[2].clone();

    // entry label precedes the cbranch, body label follows it
    let cbranch_pos = position(&instrs, "cbranch");
    assert!(instrs[..cbranch_pos].iter().any(Instr::is_label));
    assert!(instrs[cbranch_pos..].iter().any(|i| i.is_label() && i.opcode == body_label));

    // break lowers to a jump to the loop's exit; the loop-back jump goes
    // elsewhere, so there is exactly one
    let exit_jumps = instrs
        .iter()
        .filter(|i| i.opcode == "jump" && i.operands[0] == exit_label)
        .count();
    assert_eq!(exit_jumps, 1);
}

#[test]
fn assert_failure_path_prints_and_exits() {
    let instrs = compile_ok("int main() {\n  int x;\n  assert x < 0;\n  return 0;\n}");

    // The message is anchored to the asserted expression's coordinate
    let message = first(&instrs, "global_string");
    assert_eq!(message.operands[1], "assertion_fail on 3:10");

    // Text precedes code
    assert_eq!(position(&instrs, "global_string"), 0);

    let print = first(&instrs, "print_string");
    assert_eq!(print.operands[0], message.operands[0]);

    // cbranch, true: jump exit, false: print + jump to the function exit
    let cbranch_pos = position(&instrs, "cbranch");
    let print_pos = position(&instrs, "print_string");
    assert!(cbranch_pos < print_pos);

    let jump_after_print = &instrs[print_pos + 1];
    assert_eq!(jump_after_print.opcode, "jump");
    assert_eq!(jump_after_print.operands[0], "%1");
}

#[test]
fn type_mismatch_produces_a_diagnostic_and_no_ir() {
    let err = compile("int x;\nfloat y;\nint main() { x = y; return 0; }")
        .expect_err("compilation should fail");

    assert!(matches!(err, CompileError::Semantic(_)));
    assert_eq!(err.to_string(), "3:14 - cannot assign 'float' to 'int'.");
}

#[test]
fn lexical_error_surfaces_through_the_pipeline() {
    let err = compile("int main() { int x; x = 3 @ 4; return 0; }")
        .expect_err("compilation should fail");

    assert!(matches!(err, CompileError::Parse(_)));
    assert!(err.to_string().contains("Lexical error: Illegal character '@'"));
}

#[test]
fn temporaries_are_defined_at_most_once() {
    let instrs = compile_ok(
        "int main() { int i; int s; s = 0; \
         for (int k = 0; k < 10; k++) { s += k; } \
         i = s * 2; print(i, s); return i; }",
    );

    // Every defining opcode writes its last operand; no %N may be written
    // twice within one function
    let defining = [
        "alloc", "literal", "load", "add", "sub", "mul", "div", "mod", "eq", "ne", "lt", "gt",
        "le", "ge", "and", "or", "not", "elem", "call", "read", "fptosi", "sitofp",
    ];

    let mut defined = std::collections::HashSet::new();
    for instr in &instrs {
        let stem = instr.opcode.split('_').next().unwrap_or("");
        if defining.contains(&stem)
            && let Some(target) = instr.operands.last()
        {
            assert!(defined.insert(target.clone()), "{target} defined twice");
        }
    }
}

#[test]
fn each_function_has_a_single_labeled_return() {
    let instrs = compile_ok(
        "int abs(int x) { if (x < 0) return 0 - x; return x; }\n\
         int main() { print(abs(0 - 5)); return 0; }",
    );

    let defines = instrs.iter().filter(|i| i.opcode == "define").count();
    let returns =
        instrs.iter().filter(|i| i.opcode.starts_with("return_")).count();
    assert_eq!(defines, 2);
    assert_eq!(returns, 2);

    // Both return statements in abs lower to jumps to one shared label
    let jumps: Vec<_> = instrs.iter().filter(|i| i.opcode == "jump").collect();
    assert!(jumps.len() >= 3);
}

#[test]
fn globals_and_strings_precede_all_code() {
    let instrs = compile_ok(
        "int g;\nchar msg[] = \"hi\";\nint main() { g = 1; print(msg); return g; }",
    );

    let first_define = position(&instrs, "define");
    for instr in &instrs[..first_define] {
        assert!(instr.opcode.starts_with("global_"), "unexpected {instr} in text section");
    }

    assert!(instrs[..first_define].iter().any(|i| i.opcode == "global_int"));
    assert!(instrs[..first_define].iter().any(|i| i.opcode == "global_char_2"));
}

#[test]
fn parameters_are_allocated_then_initialized() {
    let instrs = compile_ok(
        "int add(int a, int b) { return a + b; }\nint main() { return add(1, 2); }",
    );

    // Two inbound temporaries are pre-reserved, so the parameter allocs
    // are %2 and %3, and arg_init stores %0/%1 into them in order
    let expected_prefix = vec![
        Instr::new("define", vec!["@add".into()]),
        Instr::new("alloc_int", vec!["%2".into()]),
        Instr::new("alloc_int", vec!["%3".into()]),
        Instr::new("alloc_int", vec!["%4".into()]),
        Instr::new("store_int", vec!["%0".into(), "%2".into()]),
        Instr::new("store_int", vec!["%1".into(), "%3".into()]),
    ];
    assert_eq!(&instrs[..expected_prefix.len()], expected_prefix.as_slice());
}

#[test]
fn call_arguments_are_passed_as_params() {
    let instrs = compile_ok(
        "int add(int a, int b) { return a + b; }\n\
         int main() { int r; r = add(1, 2); return r; }",
    );

    let call_pos = position(&instrs, "call");
    assert_eq!(instrs[call_pos].operands[0], "@add");
    assert_eq!(instrs[call_pos - 1].opcode, "param_int");
    assert_eq!(instrs[call_pos - 2].opcode, "param_int");
}

#[test]
fn compound_assignment_expands_to_load_op_store() {
    let instrs = compile_ok("int main() { int s; s = 1; s += 4; return s; }");

    let add = first(&instrs, "add_int");
    let add_pos = position(&instrs, "add_int");

    // load current value, apply, store back to the same slot
    let load = &instrs[add_pos - 1];
    assert_eq!(load.opcode, "load_int");
    assert_eq!(add.operands[0], load.operands[1]);

    let store = &instrs[add_pos + 1];
    assert_eq!(store.opcode, "store_int");
    assert_eq!(store.operands[0], add.operands[2]);
    assert_eq!(store.operands[1], load.operands[0]);
}

#[test]
fn postfix_increment_keeps_the_previous_value() {
    let instrs = compile_ok("int main() { int i; int x; i = 0; x = i++; return x; }");

    let add_pos = position(&instrs, "add_int");
    let add = &instrs[add_pos];
    let one = &instrs[add_pos - 1];
    assert_eq!(one.opcode, "literal_int");
    assert_eq!(one.operands[0], "1");

    // The updated value goes back into i's slot
    let writeback = &instrs[add_pos + 1];
    assert_eq!(writeback.opcode, "store_int");
    assert_eq!(writeback.operands[0], add.operands[2]);

    // x receives the pre-update value, not the updated one
    let assign = &instrs[add_pos + 2];
    assert_eq!(assign.opcode, "store_int");
    assert_eq!(assign.operands[0], add.operands[0]);
}

#[test]
fn casts_select_the_conversion_opcode() {
    let instrs = compile_ok(
        "int main() { int x; float f; f = 2.5; x = (int) f; f = (float) x; return x; }",
    );

    let fptosi = first(&instrs, "fptosi");
    let sitofp = first(&instrs, "sitofp");
    assert_eq!(fptosi.operands.len(), 2);
    assert_eq!(sitofp.operands.len(), 2);
}

#[test]
fn read_stores_into_the_target_slot() {
    let instrs = compile_ok("int main() { int x; read(x); print(x); return 0; }");

    let read_pos = position(&instrs, "read_int");
    let read = &instrs[read_pos];
    let store = &instrs[read_pos + 1];

    assert_eq!(store.opcode, "store_int");
    assert_eq!(store.operands[0], read.operands[0]);
}

#[test]
fn bare_print_lowers_to_print_void() {
    let instrs = compile_ok("void shout() { print(); }\nint main() { shout(); return 0; }");

    assert!(opcodes(&instrs).contains(&"print_void"));
    assert!(opcodes(&instrs).contains(&"return_void"));
}

#[test]
fn string_literals_become_global_strings() {
    let instrs = compile_ok("int main() { print(\"hello\"); return 0; }");

    let global = first(&instrs, "global_string");
    assert_eq!(global.operands[0], "@.str.0");
    assert_eq!(global.operands[1], "hello");

    let print = first(&instrs, "print_string");
    assert_eq!(print.operands[0], "@.str.0");
}

#[test]
fn dereference_and_address_of_lower_through_pointer_ops() {
    let instrs = compile_ok(
        "int main() { int x; int *p; int y; x = 7; p = &x; y = *p; return y; }",
    );

    // p = &x stores an address through get_int_*
    let get = first(&instrs, "get_int_*");
    assert_eq!(get.operands.len(), 2);

    // y = *p loads through the pointer
    assert!(opcodes(&instrs).contains(&"load_int_*"));
}

#[test]
fn for_loop_emits_init_cond_step_in_order() {
    let instrs = compile_ok(
        "int main() { int s; s = 0; for (int i = 0; i < 3; i++) s += i; return s; }",
    );

    // The initializer's store precedes the entry label; the step's
    // writeback precedes the loop-back jump
    let cbranch_pos = position(&instrs, "cbranch");
    let lt_pos = position(&instrs, "lt_int");
    assert!(lt_pos < cbranch_pos);

    let init_store = instrs
        .iter()
        .position(|i| i.opcode == "store_int")
        .expect("for initializer should store");
    assert!(init_store < lt_pos);

    // The i++ step lands between the body and the loop-back jump
    let jump_back = instrs
        .iter()
        .rposition(|i| i.opcode == "jump")
        .expect("loop-back jump should exist");
    let step_add = instrs
        .iter()
        .rposition(|i| i.opcode == "add_int")
        .expect("step should add");
    assert!(step_add < jump_back);
}
