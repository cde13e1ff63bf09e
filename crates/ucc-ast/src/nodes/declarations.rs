//! Declaration node types: the program root, declarators, and function
//! definitions.
//!
//! A declarator is built inside-out: the leaf is always a [`VarDecl`]
//! carrying the declared identifier, and every type modifier ([`ArrayDecl`],
//! [`PtrDecl`], [`FuncDecl`]) wraps it. The parser's modifier-stacking
//! helper maintains that invariant; the analyzer later walks the chain to
//! prepend aggregate tags onto the leaf's type stack.

use crate::arena::NodeId;
use crate::types::Ty;

/// The program root: an ordered list of global declarations.
#[derive(Debug, Clone)]
pub struct Program {
    /// Global declarations and function definitions, in source order
    pub gdecls: Vec<NodeId>,
}

/// A global declaration statement, holding one `Decl` per init-declarator.
#[derive(Debug, Clone)]
pub struct GlobalDecl {
    /// The declarations sharing one specifier
    pub decls: Vec<NodeId>,
}

/// A single declaration: a name, its declarator chain, and an optional
/// initializer.
#[derive(Debug, Clone)]
pub struct Decl {
    /// The declared identifier (an `Ident`), filled by the name/type fixer
    pub name: Option<NodeId>,
    /// The outermost node of the declarator chain
    pub declarator: NodeId,
    /// Optional initializer expression or `InitList`
    pub init: Option<NodeId>,
}

/// The declarator leaf: the declared identifier plus its base type.
#[derive(Debug, Clone)]
pub struct VarDecl {
    /// The declared identifier (an `Ident`)
    pub declname: NodeId,
    /// The planted base type (a `TypeSpec`), filled by the name/type fixer
    pub type_spec: Option<NodeId>,
}

/// An array type modifier wrapping an inner declarator.
#[derive(Debug, Clone)]
pub struct ArrayDecl {
    /// The wrapped declarator; `None` only transiently during modifier
    /// stacking
    pub inner: Option<NodeId>,
    /// Optional dimension expression; an absent dimension may be filled in
    /// from a well-typed initializer
    pub dim: Option<NodeId>,
}

/// A pointer type modifier wrapping an inner declarator.
#[derive(Debug, Clone)]
pub struct PtrDecl {
    /// The wrapped declarator; `None` only transiently during modifier
    /// stacking
    pub inner: Option<NodeId>,
}

/// A function type modifier: a parameter list wrapping the declarator that
/// names the function.
#[derive(Debug, Clone)]
pub struct FuncDecl {
    /// The parameter list (a `ParamList`), if the function takes parameters
    pub args: Option<NodeId>,
    /// The wrapped declarator; `None` only transiently during modifier
    /// stacking
    pub inner: Option<NodeId>,
    /// For a function-pointer declarator: the slot holding the bound
    /// target, filled by code generation when the pointer is assigned
    pub gen_location: Option<String>,
}

/// A function definition.
#[derive(Debug, Clone)]
pub struct FuncDef {
    /// The return type specifier (a `TypeSpec`)
    pub spec: NodeId,
    /// The declaration of the function itself (a `Decl` whose declarator
    /// chain ends in a `FuncDecl`)
    pub decl: NodeId,
    /// Old-style parameter declarations between declarator and body
    pub param_decls: Vec<NodeId>,
    /// The function body (a `Compound`)
    pub body: NodeId,
    /// Declarations that are not direct children of the body (nested blocks,
    /// `for` initializers), accumulated by the semantic pass so code
    /// generation can allocate every local in one sweep
    pub decls: Vec<NodeId>,
}

/// A type specifier: the ordered list of type names.
#[derive(Debug, Clone)]
pub struct TypeSpec {
    /// The type stack, outer tags first
    pub ty: Ty,
}

/// A function parameter list.
#[derive(Debug, Clone)]
pub struct ParamList {
    /// One `Decl` per parameter
    pub params: Vec<NodeId>,
}

/// The declarations of a `for` initializer.
#[derive(Debug, Clone)]
pub struct DeclList {
    /// One `Decl` per init-declarator
    pub decls: Vec<NodeId>,
}
