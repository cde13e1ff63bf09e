//! Tests for the semantic analyzer

use ucc_analyzer::analyze;
use ucc_analyzer::error::SemanticError;
use ucc_ast::arena::{Ast, NodeId};
use ucc_ast::nodes::ConstValue;
use ucc_ast::types::{SymbolKind, TypeName};

fn analyze_ok(source: &str) -> Ast {
    let mut ast = ucc_parser::parse(source).expect("parsing should succeed");
    analyze(&mut ast).expect("analysis should succeed");

    ast
}

fn analyze_err(source: &str) -> SemanticError {
    let mut ast = ucc_parser::parse(source).expect("parsing should succeed");

    analyze(&mut ast).expect_err("analysis should fail")
}

/// All nodes of the analyzed program, in pre-order.
fn all_nodes(ast: &Ast) -> Vec<NodeId> {
    ast.collect_pre_order(ast.root().expect("root should be set"))
}

/// The declaring identifier for `name` (the one carrying a `bind`).
fn declared_ident(ast: &Ast, name: &str) -> NodeId {
    all_nodes(ast)
        .into_iter()
        .find(|&id| {
            ast.node(id)
                .as_ident()
                .is_some_and(|i| i.name == name && i.bind.is_some() && i.scope.is_some())
        })
        .expect("identifier should be declared")
}

#[test]
fn globals_are_decorated_at_scope_one() {
    let ast = analyze_ok("int x;\nint main() { x = 3; return 0; }");

    let ident = ast.node(declared_ident(&ast, "x")).as_ident().unwrap();
    assert_eq!(ident.scope, Some(1));
    assert_eq!(ident.kind, Some(SymbolKind::Var));
    assert_eq!(ident.ty.as_ref().unwrap().names, vec![TypeName::Int]);
}

#[test]
fn locals_sit_below_globals() {
    let ast = analyze_ok("int main() { int x; x = 3; return 0; }");

    let ident = ast.node(declared_ident(&ast, "x")).as_ident().unwrap();
    assert_eq!(ident.scope, Some(2));
}

#[test]
fn declarators_prepend_aggregate_tags() {
    let ast = analyze_ok("int m[2][3];\nint *p;\nchar *s[4];");

    let m = ast.node(declared_ident(&ast, "m")).as_ident().unwrap();
    assert_eq!(
        m.ty.as_ref().unwrap().names,
        vec![TypeName::Array, TypeName::Array, TypeName::Int]
    );

    let p = ast.node(declared_ident(&ast, "p")).as_ident().unwrap();
    assert_eq!(p.ty.as_ref().unwrap().names, vec![TypeName::Ptr, TypeName::Int]);

    let s = ast.node(declared_ident(&ast, "s")).as_ident().unwrap();
    assert_eq!(
        s.ty.as_ref().unwrap().names,
        vec![TypeName::Array, TypeName::Ptr, TypeName::Char]
    );
}

#[test]
fn array_dimension_is_inferred_from_initializer() {
    let ast = analyze_ok("int a[] = {1, 2, 3, 4};");

    let bind = ast.node(declared_ident(&ast, "a")).as_ident().unwrap().bind.unwrap();
    let dim = ast.node(bind).as_array_decl().unwrap().dim.expect("dim should be filled");

    assert_eq!(ast.node(dim).as_constant().unwrap().value, ConstValue::Int(4));
}

#[test]
fn nested_dimensions_are_inferred_per_level() {
    let ast = analyze_ok("int m[][2] = {{1, 2}, {3, 4}, {5, 6}};");

    let outer = ast.node(declared_ident(&ast, "m")).as_ident().unwrap().bind.unwrap();
    let outer_decl = ast.node(outer).as_array_decl().unwrap();
    let outer_dim = outer_decl.dim.expect("outer dim should be filled");
    assert_eq!(ast.node(outer_dim).as_constant().unwrap().value, ConstValue::Int(3));

    let inner = outer_decl.inner.unwrap();
    let inner_dim = ast.node(inner).as_array_decl().unwrap().dim.unwrap();
    assert_eq!(ast.node(inner_dim).as_constant().unwrap().value, ConstValue::Int(2));
}

#[test]
fn string_initializer_sets_char_array_dimension() {
    let ast = analyze_ok("char s[] = \"abc\";");

    let bind = ast.node(declared_ident(&ast, "s")).as_ident().unwrap().bind.unwrap();
    let dim = ast.node(bind).as_array_decl().unwrap().dim.unwrap();

    assert_eq!(ast.node(dim).as_constant().unwrap().value, ConstValue::Int(3));
}

#[test]
fn string_initializer_length_must_match_declared_dimension() {
    let err = analyze_err("char s[5] = \"abc\";");

    assert!(matches!(err, SemanticError::InitSizeMismatch { .. }));
}

#[test]
fn ragged_initializer_lists_are_rejected() {
    let err = analyze_err("int m[2][2] = {{1, 2}, {3}};");

    assert!(matches!(err, SemanticError::RaggedInitList { .. }));
}

#[test]
fn initializer_element_type_must_match() {
    let err = analyze_err("int a[2] = {1, 2.5};");

    assert!(matches!(err, SemanticError::InitTypeMismatch { .. }));
}

#[test]
fn assignment_between_unequal_types_is_rejected() {
    let err = analyze_err("int x;\nfloat y;\nint main() { x = y; return 0; }");

    assert!(matches!(
        err,
        SemanticError::AssignMismatch { ltype: TypeName::Int, rtype: TypeName::Float, .. }
    ));
    assert!(err.to_string().ends_with("cannot assign 'float' to 'int'."));
}

#[test]
fn char_target_rejects_compound_assignment() {
    let err = analyze_err("int main() { char c; c += 'a'; return 0; }");

    assert!(matches!(err, SemanticError::AssignOpUnsupported { ty: TypeName::Char, .. }));
}

#[test]
fn redeclaration_in_the_same_scope_is_rejected() {
    let err = analyze_err("int main() { int x; float x; return 0; }");

    assert!(matches!(err, SemanticError::Redeclaration { .. }));
}

#[test]
fn shadowing_in_an_inner_scope_is_allowed() {
    let _ast = analyze_ok("int x;\nint main() { int x; x = 1; return 0; }");
}

#[test]
fn undeclared_use_is_rejected() {
    let err = analyze_err("int main() { y = 1; return 0; }");

    assert!(matches!(err, SemanticError::UndeclaredName { .. }));
}

#[test]
fn relational_operands_yield_bool() {
    let ast = analyze_ok("int main() { int a; int b; if (a < b) a = 1; return 0; }");

    let cmp = all_nodes(&ast)
        .into_iter()
        .find_map(|id| ast.node(id).as_binary_op())
        .expect("comparison should exist");

    assert_eq!(cmp.ty.as_ref().unwrap().names, vec![TypeName::Bool]);
}

#[test]
fn binary_operands_must_have_equal_types() {
    let err = analyze_err("int main() { int a; float b; a = a + b; return 0; }");

    assert!(matches!(err, SemanticError::BinaryMismatch { .. }));
}

#[test]
fn logical_and_on_floats_is_rejected() {
    // '&&' is in neither the binary nor the relational set for float
    let err = analyze_err("int main() { float a; float b; a = a && b; return 0; }");

    assert!(matches!(err, SemanticError::BinaryOpUnsupported { .. }));
}

#[test]
fn float_increment_is_rejected() {
    let err = analyze_err("int main() { float f; f++; return 0; }");

    assert!(matches!(err, SemanticError::UnaryOpUnsupported { .. }));
}

#[test]
fn dereference_pops_the_pointer_tag() {
    let ast = analyze_ok("int main() { int x; int *p; p = &x; x = *p; return 0; }");

    let deref = all_nodes(&ast)
        .into_iter()
        .find_map(|id| {
            let op = ast.node(id).as_unary_op()?;
            (op.op == ucc_ast::operators::UnaryOperator::Deref).then_some(op)
        })
        .expect("dereference should exist");

    assert_eq!(deref.ty.as_ref().unwrap().names, vec![TypeName::Int]);
}

#[test]
fn address_of_prepends_the_pointer_tag() {
    let ast = analyze_ok("int main() { int x; int *p; p = &x; return 0; }");

    let addr = all_nodes(&ast)
        .into_iter()
        .find_map(|id| {
            let op = ast.node(id).as_unary_op()?;
            (op.op == ucc_ast::operators::UnaryOperator::AddrOf).then_some(op)
        })
        .expect("address-of should exist");

    assert_eq!(addr.ty.as_ref().unwrap().names, vec![TypeName::Ptr, TypeName::Int]);
}

#[test]
fn subscript_must_be_int() {
    let err = analyze_err("int a[3];\nint main() { return a[1.5]; }");

    assert!(matches!(err, SemanticError::SubscriptNotInt { ty: TypeName::Float, .. }));
}

#[test]
fn subscripting_removes_one_array_tag() {
    let ast = analyze_ok("int m[2][3];\nint main() { int v; int i; int j; v = m[i][j]; return 0; }");

    let refs: Vec<_> =
        all_nodes(&ast).into_iter().filter_map(|id| ast.node(id).as_array_ref()).collect();

    // Outer reference types first in pre-order: m[i][j] then m[i]
    assert_eq!(refs[0].ty.as_ref().unwrap().names, vec![TypeName::Int]);
    assert_eq!(refs[1].ty.as_ref().unwrap().names, vec![TypeName::Array, TypeName::Int]);
}

#[test]
fn condition_must_be_boolean() {
    let err = analyze_err("int main() { int x; if (x) x = 1; return 0; }");

    assert!(matches!(err, SemanticError::ConditionNotBool { ty: TypeName::Int, .. }));
}

#[test]
fn break_outside_a_loop_is_rejected() {
    let err = analyze_err("int main() { break; return 0; }");

    assert!(matches!(err, SemanticError::BreakOutsideLoop { .. }));
}

#[test]
fn break_binds_to_the_innermost_loop() {
    let ast =
        analyze_ok("int main() { int i; i = 0; while (i < 3) { if (i == 2) break; i = i + 1; } return 0; }");

    let nodes = all_nodes(&ast);
    let while_id = nodes
        .iter()
        .copied()
        .find(|&id| ast.node(id).as_while().is_some())
        .expect("while should exist");
    let break_node = nodes
        .iter()
        .copied()
        .find_map(|id| ast.node(id).as_break())
        .expect("break should exist");

    assert_eq!(break_node.bind, Some(while_id));
}

#[test]
fn return_type_must_match_the_function() {
    let err = analyze_err("int main() { return; }");

    assert!(matches!(
        err,
        SemanticError::ReturnMismatch { found: TypeName::Void, expected: TypeName::Int, .. }
    ));
}

#[test]
fn void_function_accepts_bare_return() {
    let _ast = analyze_ok("void f() { return; }\nint main() { f(); return 0; }");
}

#[test]
fn call_argument_count_must_match() {
    let err = analyze_err(
        "int add(int a, int b) { return a + b; }\nint main() { return add(1); }",
    );

    assert!(matches!(err, SemanticError::ArgCountMismatch { .. }));
}

#[test]
fn call_argument_types_must_match() {
    let err = analyze_err(
        "int add(int a, int b) { return a + b; }\nint main() { return add(1, 2.5); }",
    );

    assert!(matches!(err, SemanticError::ArgTypeMismatch { ref param, .. } if param == "b"));
}

#[test]
fn calling_a_variable_is_rejected() {
    let err = analyze_err("int x;\nint main() { return x(); }");

    assert!(matches!(err, SemanticError::NotAFunction { .. }));
}

#[test]
fn assert_requires_a_boolean_expression() {
    let err = analyze_err("int main() { assert 1; return 0; }");

    assert!(matches!(err, SemanticError::AssertNotBool { .. }));
}

#[test]
fn read_target_must_be_a_variable() {
    let err = analyze_err("int main() { read(3); return 0; }");

    assert!(matches!(err, SemanticError::NotAVariable { .. }));
}

#[test]
fn for_initializer_declarations_escape_into_the_funcdef() {
    let ast = analyze_ok("int main() { int s; s = 0; for (int i = 0; i < 3; i++) s += i; return s; }");

    let funcdef = all_nodes(&ast)
        .into_iter()
        .find_map(|id| ast.node(id).as_func_def())
        .expect("funcdef should exist");

    assert_eq!(funcdef.decls.len(), 1);
}

#[test]
fn nested_block_declarations_escape_into_the_funcdef() {
    let ast = analyze_ok("int main() { int a; { int b; b = 1; a = b; } return a; }");

    let funcdef = all_nodes(&ast)
        .into_iter()
        .find_map(|id| ast.node(id).as_func_def())
        .expect("funcdef should exist");

    assert_eq!(funcdef.decls.len(), 1);
}

#[test]
fn reanalysis_keeps_decorations_intact() {
    let source = "int a[] = {1, 2, 3};\nint main() { int x; x = a[0]; return x; }";
    let mut ast = ucc_parser::parse(source).expect("parsing should succeed");

    analyze(&mut ast).expect("first analysis should succeed");
    let ty_before =
        ast.node(declared_ident(&ast, "x")).as_ident().unwrap().ty.clone();

    analyze(&mut ast).expect("second analysis should succeed");
    let ty_after = ast.node(declared_ident(&ast, "x")).as_ident().unwrap().ty.clone();

    assert_eq!(ty_before, ty_after);

    let bind = ast.node(declared_ident(&ast, "a")).as_ident().unwrap().bind.unwrap();
    let dim = ast.node(bind).as_array_decl().unwrap().dim.unwrap();
    assert_eq!(ast.node(dim).as_constant().unwrap().value, ConstValue::Int(3));
}
