//! Tests for the parser module

use ucc_ast::arena::{Ast, NodeId};
use ucc_ast::nodes::{AnyNode, ConstValue};
use ucc_ast::operators::{AssignOperator, BinaryOperator, UnaryOperator};
use ucc_ast::types::TypeName;
use ucc_parser::error::ParseError;
use ucc_parser::parse;

fn parse_ok(source: &str) -> Ast {
    parse(source).expect("parsing should succeed")
}

/// The global declarations of the parsed program.
fn gdecls(ast: &Ast) -> Vec<NodeId> {
    let root = ast.root().expect("root should be set");
    ast.node(root).as_program().expect("root should be a Program").gdecls.clone()
}

/// The single `Decl` of a one-declaration program.
fn single_decl(ast: &Ast) -> NodeId {
    let gdecls = gdecls(ast);
    assert_eq!(gdecls.len(), 1);

    let decls = &ast.node(gdecls[0]).as_global_decl().expect("expected GlobalDecl").decls;
    assert_eq!(decls.len(), 1);

    decls[0]
}

fn decl_name<'a>(ast: &'a Ast, decl: NodeId) -> &'a str {
    let name = ast.node(decl).as_decl().unwrap().name.expect("decl name should be fixed");
    &ast.node(name).as_ident().unwrap().name
}

#[test]
fn scalar_declaration_has_fixed_name_and_type() {
    let ast = parse_ok("int x;");
    let decl = single_decl(&ast);

    assert_eq!(decl_name(&ast, decl), "x");

    let var_decl = ast.node(ast.node(decl).as_decl().unwrap().declarator).as_var_decl().unwrap();
    let spec = var_decl.type_spec.expect("base type should be planted");
    let ty = &ast.node(spec).as_type_spec().unwrap().ty;

    assert_eq!(ty.names, vec![TypeName::Int]);
}

#[test]
fn multiple_declarators_share_one_specifier() {
    let ast = parse_ok("int a, b = 2, *c;");
    let gdecls = gdecls(&ast);
    let decls = ast.node(gdecls[0]).as_global_decl().unwrap().decls.clone();

    assert_eq!(decls.len(), 3);
    assert_eq!(decl_name(&ast, decls[0]), "a");
    assert_eq!(decl_name(&ast, decls[1]), "b");
    assert_eq!(decl_name(&ast, decls[2]), "c");

    assert!(ast.node(decls[0]).as_decl().unwrap().init.is_none());
    assert!(ast.node(decls[1]).as_decl().unwrap().init.is_some());

    // The third declarator is a pointer wrapping the VarDecl leaf
    let ptr = ast.node(decls[2]).as_decl().unwrap().declarator;
    let inner = ast.node(ptr).as_ptr_decl().expect("expected PtrDecl").inner.unwrap();
    assert!(ast.node(inner).as_var_decl().is_some());

    // Each leaf gets its own planted specifier
    let spec_a = {
        let leaf = ast.node(decls[0]).as_decl().unwrap().declarator;
        ast.node(leaf).as_var_decl().unwrap().type_spec.unwrap()
    };
    let spec_c = ast.node(inner).as_var_decl().unwrap().type_spec.unwrap();
    assert_ne!(spec_a, spec_c);
}

#[test]
fn two_dimensional_array_nests_outer_first() {
    let ast = parse_ok("int m[2][3];");
    let decl = single_decl(&ast);

    let outer = ast.node(decl).as_decl().unwrap().declarator;
    let outer_decl = ast.node(outer).as_array_decl().expect("expected ArrayDecl");
    let outer_dim = outer_decl.dim.expect("outer dim");
    let AnyNode::Constant(c) = ast.node(outer_dim) else { panic!("dim should be a constant") };
    assert_eq!(c.value, ConstValue::Int(2));

    let inner = outer_decl.inner.unwrap();
    let inner_decl = ast.node(inner).as_array_decl().expect("expected nested ArrayDecl");
    let inner_dim = inner_decl.dim.expect("inner dim");
    let AnyNode::Constant(c) = ast.node(inner_dim) else { panic!("dim should be a constant") };
    assert_eq!(c.value, ConstValue::Int(3));

    assert!(ast.node(inner_decl.inner.unwrap()).as_var_decl().is_some());
}

#[test]
fn array_initializer_with_trailing_comma() {
    let ast = parse_ok("int a[] = {1, 2, 3,};");
    let decl = single_decl(&ast);

    let declarator = ast.node(decl).as_decl().unwrap().declarator;
    assert!(ast.node(declarator).as_array_decl().unwrap().dim.is_none());

    let init = ast.node(decl).as_decl().unwrap().init.unwrap();
    assert_eq!(ast.node(init).as_init_list().unwrap().exprs.len(), 3);
}

#[test]
fn function_definition_shape() {
    let ast = parse_ok("int main() { return 0; }");
    let gdecls = gdecls(&ast);
    let func_def = ast.node(gdecls[0]).as_func_def().expect("expected FuncDef");

    let spec_ty = &ast.node(func_def.spec).as_type_spec().unwrap().ty;
    assert_eq!(spec_ty.names, vec![TypeName::Int]);

    assert_eq!(decl_name(&ast, func_def.decl), "main");

    let declarator = ast.node(func_def.decl).as_decl().unwrap().declarator;
    let func_decl = ast.node(declarator).as_func_decl().expect("expected FuncDecl");
    assert!(func_decl.args.is_none());

    let body = ast.node(func_def.body).as_compound().unwrap();
    assert_eq!(body.block_items.len(), 1);
    assert!(ast.node(body.block_items[0]).as_return().is_some());
}

#[test]
fn function_without_specifier_defaults_to_int() {
    let ast = parse_ok("main() { return 0; }");
    let gdecls = gdecls(&ast);
    let func_def = ast.node(gdecls[0]).as_func_def().unwrap();

    let spec_ty = &ast.node(func_def.spec).as_type_spec().unwrap().ty;
    assert_eq!(spec_ty.names, vec![TypeName::Int]);
}

#[test]
fn parameters_are_declarations() {
    let ast = parse_ok("int add(int a, int b) { return a + b; }");
    let gdecls = gdecls(&ast);
    let func_def = ast.node(gdecls[0]).as_func_def().unwrap();

    let declarator = ast.node(func_def.decl).as_decl().unwrap().declarator;
    let args = ast.node(declarator).as_func_decl().unwrap().args.unwrap();
    let params = &ast.node(args).as_param_list().unwrap().params;

    assert_eq!(params.len(), 2);
    assert_eq!(decl_name(&ast, params[0]), "a");
    assert_eq!(decl_name(&ast, params[1]), "b");
}

#[test]
fn multiplication_binds_tighter_than_addition() {
    let ast = parse_ok("int f() { x = a + b * c; }");
    let gdecls = gdecls(&ast);
    let func_def = ast.node(gdecls[0]).as_func_def().unwrap();
    let body = &ast.node(func_def.body).as_compound().unwrap().block_items;

    let assignment = ast.node(body[0]).as_assignment().unwrap();
    let add = ast.node(assignment.rvalue).as_binary_op().unwrap();
    assert_eq!(add.op, BinaryOperator::Add);

    let mul = ast.node(add.right).as_binary_op().unwrap();
    assert_eq!(mul.op, BinaryOperator::Mul);
}

#[test]
fn relational_binds_tighter_than_logical() {
    let ast = parse_ok("int f() { x = a < b && c < d; }");
    let gdecls = gdecls(&ast);
    let func_def = ast.node(gdecls[0]).as_func_def().unwrap();
    let body = &ast.node(func_def.body).as_compound().unwrap().block_items;

    let assignment = ast.node(body[0]).as_assignment().unwrap();
    let and = ast.node(assignment.rvalue).as_binary_op().unwrap();
    assert_eq!(and.op, BinaryOperator::And);
    assert_eq!(ast.node(and.left).as_binary_op().unwrap().op, BinaryOperator::Lt);
    assert_eq!(ast.node(and.right).as_binary_op().unwrap().op, BinaryOperator::Lt);
}

#[test]
fn assignment_is_right_associative() {
    let ast = parse_ok("int f() { a = b = c; }");
    let gdecls = gdecls(&ast);
    let func_def = ast.node(gdecls[0]).as_func_def().unwrap();
    let body = &ast.node(func_def.body).as_compound().unwrap().block_items;

    let outer = ast.node(body[0]).as_assignment().unwrap();
    assert_eq!(outer.op, AssignOperator::Assign);
    assert!(ast.node(outer.rvalue).as_assignment().is_some());
}

#[test]
fn else_associates_to_nearest_if() {
    let ast = parse_ok("int f() { if (a < b) if (c < d) x = 1; else x = 2; }");
    let gdecls = gdecls(&ast);
    let func_def = ast.node(gdecls[0]).as_func_def().unwrap();
    let body = &ast.node(func_def.body).as_compound().unwrap().block_items;

    let outer = ast.node(body[0]).as_if().unwrap();
    assert!(outer.iffalse.is_none());

    let inner = ast.node(outer.iftrue).as_if().unwrap();
    assert!(inner.iffalse.is_some());
}

#[test]
fn for_with_declaration_initializer() {
    let ast = parse_ok("int f() { for (int i = 0; i < 10; i++) print(i); }");
    let gdecls = gdecls(&ast);
    let func_def = ast.node(gdecls[0]).as_func_def().unwrap();
    let body = &ast.node(func_def.body).as_compound().unwrap().block_items;

    let for_stmt = ast.node(body[0]).as_for().unwrap();
    let init = for_stmt.init.unwrap();
    let decl_list = ast.node(init).as_decl_list().expect("init should be a DeclList");
    assert_eq!(decl_list.decls.len(), 1);

    let next = for_stmt.next.unwrap();
    assert_eq!(ast.node(next).as_unary_op().unwrap().op, UnaryOperator::PostInc);
}

#[test]
fn cast_is_distinguished_from_grouping() {
    let ast = parse_ok("int f() { x = (float) y; z = (y); }");
    let gdecls = gdecls(&ast);
    let func_def = ast.node(gdecls[0]).as_func_def().unwrap();
    let body = &ast.node(func_def.body).as_compound().unwrap().block_items;

    let cast_assign = ast.node(body[0]).as_assignment().unwrap();
    let cast = ast.node(cast_assign.rvalue).as_cast().expect("expected Cast");
    let to_ty = &ast.node(cast.to_type).as_type_spec().unwrap().ty;
    assert_eq!(to_ty.names, vec![TypeName::Float]);

    let group_assign = ast.node(body[1]).as_assignment().unwrap();
    assert!(ast.node(group_assign.rvalue).as_ident().is_some());
}

#[test]
fn subscript_chain_nests_inner_first() {
    let ast = parse_ok("int f() { v = m[i][j]; }");
    let gdecls = gdecls(&ast);
    let func_def = ast.node(gdecls[0]).as_func_def().unwrap();
    let body = &ast.node(func_def.body).as_compound().unwrap().block_items;

    let assignment = ast.node(body[0]).as_assignment().unwrap();
    let outer = ast.node(assignment.rvalue).as_array_ref().unwrap();
    let inner = ast.node(outer.name).as_array_ref().expect("expected nested ArrayRef");
    assert!(ast.node(inner.name).as_ident().is_some());
}

#[test]
fn print_with_expression_list() {
    let ast = parse_ok("int f() { print(a, b); }");
    let gdecls = gdecls(&ast);
    let func_def = ast.node(gdecls[0]).as_func_def().unwrap();
    let body = &ast.node(func_def.body).as_compound().unwrap().block_items;

    let print = ast.node(body[0]).as_print().unwrap();
    let exprs = &ast.node(print.expr.unwrap()).as_expr_list().unwrap().exprs;
    assert_eq!(exprs.len(), 2);
}

#[test]
fn unexpected_token_is_reported_near_the_symbol() {
    let err = parse("int 3;").expect_err("parsing should fail");

    match err {
        ParseError::NearSymbol { ref symbol, .. } => assert_eq!(symbol, "3"),
        other => panic!("expected NearSymbol, got {other:?}"),
    }
    assert!(err.to_string().starts_with("Error near the symbol"));
}

#[test]
fn truncated_input_is_reported_at_end() {
    let err = parse("int main() {").expect_err("parsing should fail");

    assert_eq!(err.to_string(), "Error at the end of input");
}

#[test]
fn non_function_declaration_requires_a_specifier() {
    let err = parse("x;").expect_err("parsing should fail");

    assert!(matches!(err, ParseError::MissingType { .. }));
}
