//! AST node type definitions.
//!
//! One struct per node kind, consolidated in the [`AnyNode`] enum that the
//! arena stores. The `as_*` accessors are generated from a single master
//! list so adding a node kind touches one place.

mod declarations;
mod expressions;
mod statements;

pub use declarations::*;
pub use expressions::*;
pub use statements::*;

use crate::arena::NodeId;
use crate::types::Ty;

/// Generates typed accessors for every [`AnyNode`] variant.
macro_rules! node_accessors {
    ($( $variant:ident($ty:ty) => $as_ref:ident, $as_mut:ident; )+) => {
        impl AnyNode {
            $(
                /// Returns the payload if this node is of the named kind.
                #[must_use]
                pub fn $as_ref(&self) -> Option<&$ty> {
                    match self {
                        Self::$variant(node) => Some(node),
                        _ => None,
                    }
                }

                /// Mutable counterpart of the typed accessor.
                pub fn $as_mut(&mut self) -> Option<&mut $ty> {
                    match self {
                        Self::$variant(node) => Some(node),
                        _ => None,
                    }
                }
            )+
        }
    };
}

/// The tagged union of all AST node kinds.
#[derive(Debug, Clone)]
pub enum AnyNode {
    /// Program root
    Program(Program),
    /// Global declaration statement
    GlobalDecl(GlobalDecl),
    /// Single declaration
    Decl(Decl),
    /// Declarator leaf
    VarDecl(VarDecl),
    /// Array type modifier
    ArrayDecl(ArrayDecl),
    /// Pointer type modifier
    PtrDecl(PtrDecl),
    /// Function type modifier
    FuncDecl(FuncDecl),
    /// Function definition
    FuncDef(FuncDef),
    /// Type specifier
    TypeSpec(TypeSpec),
    /// Parameter list
    ParamList(ParamList),
    /// `for`-initializer declarations
    DeclList(DeclList),
    /// Block
    Compound(Compound),
    /// `if` statement
    If(If),
    /// `while` loop
    While(While),
    /// `for` loop
    For(For),
    /// `break` statement
    Break(Break),
    /// `return` statement
    Return(Return),
    /// `assert` statement
    Assert(Assert),
    /// `print` statement
    Print(Print),
    /// `read` statement
    Read(Read),
    /// Assignment expression
    Assignment(Assignment),
    /// Binary operation
    BinaryOp(BinaryOp),
    /// Unary operation
    UnaryOp(UnaryOp),
    /// Cast expression
    Cast(Cast),
    /// Function call
    FuncCall(FuncCall),
    /// Array subscript
    ArrayRef(ArrayRef),
    /// Identifier
    Ident(Ident),
    /// Literal constant
    Constant(Constant),
    /// Brace initializer list
    InitList(InitList),
    /// Comma expression list
    ExprList(ExprList),
    /// Bare `;`
    EmptyStatement(EmptyStatement),
}

node_accessors! {
    Program(Program) => as_program, as_program_mut;
    GlobalDecl(GlobalDecl) => as_global_decl, as_global_decl_mut;
    Decl(Decl) => as_decl, as_decl_mut;
    VarDecl(VarDecl) => as_var_decl, as_var_decl_mut;
    ArrayDecl(ArrayDecl) => as_array_decl, as_array_decl_mut;
    PtrDecl(PtrDecl) => as_ptr_decl, as_ptr_decl_mut;
    FuncDecl(FuncDecl) => as_func_decl, as_func_decl_mut;
    FuncDef(FuncDef) => as_func_def, as_func_def_mut;
    TypeSpec(TypeSpec) => as_type_spec, as_type_spec_mut;
    ParamList(ParamList) => as_param_list, as_param_list_mut;
    DeclList(DeclList) => as_decl_list, as_decl_list_mut;
    Compound(Compound) => as_compound, as_compound_mut;
    If(If) => as_if, as_if_mut;
    While(While) => as_while, as_while_mut;
    For(For) => as_for, as_for_mut;
    Break(Break) => as_break, as_break_mut;
    Return(Return) => as_return, as_return_mut;
    Assert(Assert) => as_assert, as_assert_mut;
    Print(Print) => as_print, as_print_mut;
    Read(Read) => as_read, as_read_mut;
    Assignment(Assignment) => as_assignment, as_assignment_mut;
    BinaryOp(BinaryOp) => as_binary_op, as_binary_op_mut;
    UnaryOp(UnaryOp) => as_unary_op, as_unary_op_mut;
    Cast(Cast) => as_cast, as_cast_mut;
    FuncCall(FuncCall) => as_func_call, as_func_call_mut;
    ArrayRef(ArrayRef) => as_array_ref, as_array_ref_mut;
    Ident(Ident) => as_ident, as_ident_mut;
    Constant(Constant) => as_constant, as_constant_mut;
    InitList(InitList) => as_init_list, as_init_list_mut;
    ExprList(ExprList) => as_expr_list, as_expr_list_mut;
    EmptyStatement(EmptyStatement) => as_empty_statement, as_empty_statement_mut;
}

impl AnyNode {
    /// The resolved type of an expression node, if the semantic pass has
    /// attached one. Non-expression nodes return `None`; a `TypeSpec`
    /// returns its parsed type stack.
    #[must_use]
    pub fn ty(&self) -> Option<&Ty> {
        match self {
            Self::BinaryOp(node) => node.ty.as_ref(),
            Self::UnaryOp(node) => node.ty.as_ref(),
            Self::Cast(node) => node.ty.as_ref(),
            Self::FuncCall(node) => node.ty.as_ref(),
            Self::ArrayRef(node) => node.ty.as_ref(),
            Self::Ident(node) => node.ty.as_ref(),
            Self::Constant(node) => node.ty.as_ref(),
            Self::TypeSpec(node) => Some(&node.ty),
            _ => None,
        }
    }

    /// Attaches a resolved type to an expression node. Attaching to a
    /// non-expression node is a no-op and returns `false`.
    pub fn set_ty(&mut self, ty: Ty) -> bool {
        match self {
            Self::BinaryOp(node) => node.ty = Some(ty),
            Self::UnaryOp(node) => node.ty = Some(ty),
            Self::Cast(node) => node.ty = Some(ty),
            Self::FuncCall(node) => node.ty = Some(ty),
            Self::ArrayRef(node) => node.ty = Some(ty),
            Self::Ident(node) => node.ty = Some(ty),
            Self::Constant(node) => node.ty = Some(ty),
            _ => return false,
        }

        true
    }

    /// The IR operand name attached to an expression node, if code
    /// generation has assigned one.
    #[must_use]
    pub fn gen_location(&self) -> Option<&str> {
        match self {
            Self::BinaryOp(node) => node.gen_location.as_deref(),
            Self::UnaryOp(node) => node.gen_location.as_deref(),
            Self::Cast(node) => node.gen_location.as_deref(),
            Self::FuncCall(node) => node.gen_location.as_deref(),
            Self::ArrayRef(node) => node.gen_location.as_deref(),
            Self::Ident(node) => node.gen_location.as_deref(),
            Self::Constant(node) => node.gen_location.as_deref(),
            _ => None,
        }
    }

    /// Attaches an IR operand name to an expression node. Attaching to a
    /// non-expression node is a no-op and returns `false`.
    pub fn set_gen_location(&mut self, location: String) -> bool {
        match self {
            Self::BinaryOp(node) => node.gen_location = Some(location),
            Self::UnaryOp(node) => node.gen_location = Some(location),
            Self::Cast(node) => node.gen_location = Some(location),
            Self::FuncCall(node) => node.gen_location = Some(location),
            Self::ArrayRef(node) => node.gen_location = Some(location),
            Self::Ident(node) => node.gen_location = Some(location),
            Self::Constant(node) => node.gen_location = Some(location),
            _ => return false,
        }

        true
    }

    /// The child nodes, in source order. Back-references (`bind`, loop
    /// binds) are not children.
    #[must_use]
    pub fn children(&self) -> Vec<NodeId> {
        match self {
            Self::Program(node) => node.gdecls.clone(),
            Self::GlobalDecl(node) => node.decls.clone(),
            Self::Decl(node) => {
                let mut children = vec![node.declarator];
                children.extend(node.init);
                children
            }
            Self::VarDecl(node) => {
                let mut children = vec![node.declname];
                children.extend(node.type_spec);
                children
            }
            Self::ArrayDecl(node) => {
                let mut children = Vec::new();
                children.extend(node.inner);
                children.extend(node.dim);
                children
            }
            Self::PtrDecl(node) => node.inner.into_iter().collect(),
            Self::FuncDecl(node) => {
                let mut children = Vec::new();
                children.extend(node.args);
                children.extend(node.inner);
                children
            }
            Self::FuncDef(node) => {
                let mut children = vec![node.spec, node.decl];
                children.extend(node.param_decls.iter().copied());
                children.push(node.body);
                children
            }
            Self::ParamList(node) => node.params.clone(),
            Self::DeclList(node) => node.decls.clone(),
            Self::Compound(node) => node.block_items.clone(),
            Self::If(node) => {
                let mut children = vec![node.cond, node.iftrue];
                children.extend(node.iffalse);
                children
            }
            Self::While(node) => vec![node.cond, node.stmt],
            Self::For(node) => {
                let mut children = Vec::new();
                children.extend(node.init);
                children.extend(node.cond);
                children.extend(node.next);
                children.push(node.stmt);
                children
            }
            Self::Return(node) => node.expr.into_iter().collect(),
            Self::Assert(node) => vec![node.expr],
            Self::Print(node) => node.expr.into_iter().collect(),
            Self::Read(node) => vec![node.expr],
            Self::Assignment(node) => vec![node.lvalue, node.rvalue],
            Self::BinaryOp(node) => vec![node.left, node.right],
            Self::UnaryOp(node) => vec![node.expr],
            Self::Cast(node) => vec![node.to_type, node.expr],
            Self::FuncCall(node) => {
                let mut children = vec![node.name];
                children.extend(node.args);
                children
            }
            Self::ArrayRef(node) => vec![node.name, node.subscript],
            Self::InitList(node) => node.exprs.clone(),
            Self::ExprList(node) => node.exprs.clone(),
            Self::TypeSpec(_)
            | Self::Break(_)
            | Self::Ident(_)
            | Self::Constant(_)
            | Self::EmptyStatement(_) => Vec::new(),
        }
    }
}
