//! Declaration parsing: the program root, declarations, declarators, and
//! function definitions.
//!
//! Declarators are built inside-out. Every array `[dim]`, pointer `*`, or
//! parameter-list `(…)` suffix becomes a modifier node that wraps the
//! current declarator; [`Parser::type_modify_decl`] walks the modifier
//! chain to its innermost hole, splices the existing declarator there, and
//! returns the outermost node. The invariant is that the innermost leaf is
//! always a `VarDecl` carrying the identifier.
//!
//! After a declarator is assembled, [`Parser::fix_decl_name_type`] walks to
//! the leaf, copies the declared name up into the `Decl`, and plants the
//! type specifier. A declaration with no specifier is only legal when its
//! outermost modifier is a `FuncDecl`, in which case the return type
//! defaults to `int`.

use ucc_ast::arena::NodeId;
use ucc_ast::nodes::{
    AnyNode,
    ArrayDecl,
    Decl,
    DeclList,
    FuncDecl,
    FuncDef,
    GlobalDecl,
    Ident,
    InitList,
    ParamList,
    Program,
    PtrDecl,
    TypeSpec,
    VarDecl,
};
use ucc_ast::types::{Ty, TypeName};
use ucc_source::Coord;

use crate::error::{ParseError, ParseResult};
use crate::lexer::TokenKind;
use crate::parser::Parser;

/// A type specifier, before it is planted into a declarator leaf.
pub(super) type Spec = (TypeName, Coord);

impl Parser<'_> {
    /// Parses the whole program: one or more global declarations.
    pub(crate) fn parse_program(&mut self) -> ParseResult<NodeId> {
        let coord = self.coord();
        let mut gdecls = Vec::new();

        while !self.check(TokenKind::EndOfFile) {
            gdecls.push(self.parse_global_declaration()?);
        }

        if gdecls.is_empty() {
            return Err(ParseError::EndOfInput);
        }

        Ok(self.alloc(AnyNode::Program(Program { gdecls }), coord))
    }

    /// Whether the current token opens a type specifier.
    pub(super) fn at_type_specifier(&self) -> bool {
        self.matches(&[TokenKind::Void, TokenKind::Char, TokenKind::Int, TokenKind::Float])
    }

    /// Parses a type specifier keyword.
    pub(super) fn parse_type_specifier(&mut self) -> ParseResult<Spec> {
        let name = match self.current_token().kind {
            TokenKind::Void => TypeName::Void,
            TokenKind::Char => TypeName::Char,
            TokenKind::Int => TypeName::Int,
            TokenKind::Float => TypeName::Float,
            _ => return Err(self.unexpected()),
        };
        let coord = self.coord();
        let _ = self.advance()?;

        Ok((name, coord))
    }

    /// Parses a global declaration: either a function definition or a
    /// declaration statement.
    ///
    /// Both start with an optional specifier and a declarator; what follows
    /// decides the production. A `{` or an old-style parameter declaration
    /// list continues as a function definition, anything else as an
    /// init-declarator list.
    fn parse_global_declaration(&mut self) -> ParseResult<NodeId> {
        let coord = self.coord();

        if !self.at_type_specifier() {
            // No specifier: must be a function definition defaulting to int
            let declarator = self.parse_declarator()?;
            return self.parse_function_definition(None, declarator, coord);
        }

        let spec = self.parse_type_specifier()?;

        if self.check(TokenKind::Semi) {
            // Specifier with no declarators
            let _ = self.advance()?;
            return Ok(self.alloc(AnyNode::GlobalDecl(GlobalDecl { decls: Vec::new() }), coord));
        }

        let declarator = self.parse_declarator()?;

        if self.check(TokenKind::LBrace) || self.at_type_specifier() {
            return self.parse_function_definition(Some(spec), declarator, coord);
        }

        // Declaration statement: finish the init-declarator list
        let list = self.parse_init_declarator_list(declarator)?;
        let _ = self.expect(TokenKind::Semi)?;
        let decls = self.build_declarations(Some(spec), list)?;

        Ok(self.alloc(AnyNode::GlobalDecl(GlobalDecl { decls }), coord))
    }

    /// Parses a declaration (`type_specifier init_declarator_list_opt ;`),
    /// returning one `Decl` per init-declarator.
    pub(super) fn parse_declaration(&mut self) -> ParseResult<Vec<NodeId>> {
        let spec = self.parse_type_specifier()?;

        let list = if self.check(TokenKind::Semi) {
            Vec::new()
        } else {
            let declarator = self.parse_declarator()?;
            self.parse_init_declarator_list(declarator)?
        };

        let _ = self.expect(TokenKind::Semi)?;

        self.build_declarations(Some(spec), list)
    }

    /// Finishes an init-declarator list whose first declarator is already
    /// parsed.
    fn parse_init_declarator_list(
        &mut self,
        first: NodeId,
    ) -> ParseResult<Vec<(NodeId, Option<NodeId>)>> {
        let init = self.parse_optional_initializer()?;
        let mut list = vec![(first, init)];

        while self.check(TokenKind::Comma) {
            let _ = self.advance()?;
            let declarator = self.parse_declarator()?;
            let init = self.parse_optional_initializer()?;
            list.push((declarator, init));
        }

        Ok(list)
    }

    /// Parses `= initializer` if present.
    fn parse_optional_initializer(&mut self) -> ParseResult<Option<NodeId>> {
        if self.check(TokenKind::Equals) {
            let _ = self.advance()?;
            Ok(Some(self.parse_initializer()?))
        } else {
            Ok(None)
        }
    }

    /// Parses an initializer: a single assignment expression or a
    /// brace-enclosed list (trailing comma allowed, lists nest).
    fn parse_initializer(&mut self) -> ParseResult<NodeId> {
        if !self.check(TokenKind::LBrace) {
            return self.parse_assignment_expression();
        }

        let coord = self.coord();
        let _ = self.advance()?;
        let mut exprs = Vec::new();

        while !self.check(TokenKind::RBrace) {
            exprs.push(self.parse_initializer()?);

            if self.check(TokenKind::Comma) {
                let _ = self.advance()?;
            } else {
                break;
            }
        }

        let _ = self.expect(TokenKind::RBrace)?;

        Ok(self.alloc(AnyNode::InitList(InitList { exprs }), coord))
    }

    /// Parses a declarator: an optional pointer chain applied to a direct
    /// declarator.
    pub(super) fn parse_declarator(&mut self) -> ParseResult<NodeId> {
        if !self.check(TokenKind::Times) {
            return self.parse_direct_declarator();
        }

        // Build the pointer chain, one PtrDecl per star
        let coord = self.coord();
        let _ = self.advance()?;
        let head = self.alloc(AnyNode::PtrDecl(PtrDecl { inner: None }), coord);
        let mut tail = head;

        while self.check(TokenKind::Times) {
            let coord = self.coord();
            let _ = self.advance()?;
            let next = self.alloc(AnyNode::PtrDecl(PtrDecl { inner: None }), coord);
            self.set_declarator_inner(tail, next);
            tail = next;
        }

        let direct = self.parse_direct_declarator()?;

        Ok(self.type_modify_decl(direct, head))
    }

    /// Parses a direct declarator: an identifier or a parenthesized
    /// declarator, followed by any number of array and parameter-list
    /// suffixes.
    fn parse_direct_declarator(&mut self) -> ParseResult<NodeId> {
        let mut decl = match self.current_token().kind {
            TokenKind::Identifier => {
                let token = self.advance()?;
                let ident =
                    self.alloc(AnyNode::Ident(Ident::new(token.lexeme.to_string())), token.coord);

                self.alloc(
                    AnyNode::VarDecl(VarDecl { declname: ident, type_spec: None }),
                    token.coord,
                )
            }
            TokenKind::LParen => {
                let _ = self.advance()?;
                let inner = self.parse_declarator()?;
                let _ = self.expect(TokenKind::RParen)?;

                inner
            }
            _ => return Err(self.unexpected()),
        };

        loop {
            match self.current_token().kind {
                TokenKind::LBracket => {
                    let coord = self.coord();
                    let _ = self.advance()?;

                    let dim = if self.check(TokenKind::RBracket) {
                        None
                    } else {
                        Some(self.parse_binary_expression(0)?)
                    };
                    let _ = self.expect(TokenKind::RBracket)?;

                    let array =
                        self.alloc(AnyNode::ArrayDecl(ArrayDecl { inner: None, dim }), coord);
                    decl = self.type_modify_decl(decl, array);
                }
                TokenKind::LParen => {
                    let coord = self.coord();
                    let _ = self.advance()?;

                    let args = if self.check(TokenKind::RParen) {
                        None
                    } else {
                        Some(self.parse_parameter_list()?)
                    };
                    let _ = self.expect(TokenKind::RParen)?;

                    let func = self.alloc(AnyNode::FuncDecl(FuncDecl { args, inner: None, gen_location: None }), coord);
                    decl = self.type_modify_decl(decl, func);
                }
                _ => break,
            }
        }

        Ok(decl)
    }

    /// Parses a comma-separated list of parameter declarations.
    fn parse_parameter_list(&mut self) -> ParseResult<NodeId> {
        let coord = self.coord();
        let mut params = vec![self.parse_parameter_declaration()?];

        while self.check(TokenKind::Comma) {
            let _ = self.advance()?;
            params.push(self.parse_parameter_declaration()?);
        }

        Ok(self.alloc(AnyNode::ParamList(ParamList { params }), coord))
    }

    /// Parses a single parameter declaration (`type_specifier declarator`).
    fn parse_parameter_declaration(&mut self) -> ParseResult<NodeId> {
        if !self.at_type_specifier() {
            return Err(self.unexpected());
        }

        let spec = self.parse_type_specifier()?;
        let declarator = self.parse_declarator()?;

        self.build_declaration(Some(spec), declarator, None)
    }

    /// Parses a function definition whose specifier and declarator are
    /// already consumed: old-style parameter declarations, then the body.
    fn parse_function_definition(
        &mut self,
        spec: Option<Spec>,
        declarator: NodeId,
        coord: Coord,
    ) -> ParseResult<NodeId> {
        let decl = self.build_declaration(spec, declarator, None)?;

        let mut param_decls = Vec::new();
        while self.at_type_specifier() {
            param_decls.extend(self.parse_declaration()?);
        }

        let body = self.parse_compound()?;

        let (name, spec_coord) = spec.unwrap_or((TypeName::Int, coord));
        let spec_node =
            self.alloc(AnyNode::TypeSpec(TypeSpec { ty: Ty::scalar(name) }), spec_coord);

        Ok(self.alloc(
            AnyNode::FuncDef(FuncDef { spec: spec_node, decl, param_decls, body, decls: Vec::new() }),
            coord,
        ))
    }

    /// Wraps each declarator of a shared-specifier list into a `Decl` and
    /// fixes its name and base type.
    fn build_declarations(
        &mut self,
        spec: Option<Spec>,
        list: Vec<(NodeId, Option<NodeId>)>,
    ) -> ParseResult<Vec<NodeId>> {
        let mut decls = Vec::with_capacity(list.len());

        for (declarator, init) in list {
            decls.push(self.build_declaration(spec, declarator, init)?);
        }

        Ok(decls)
    }

    /// Wraps one declarator into a `Decl` and fixes its name and base type.
    fn build_declaration(
        &mut self,
        spec: Option<Spec>,
        declarator: NodeId,
        init: Option<NodeId>,
    ) -> ParseResult<NodeId> {
        let coord = self.ast().coord(declarator);
        let decl = self.alloc(AnyNode::Decl(Decl { name: None, declarator, init }), coord);
        self.fix_decl_name_type(decl, spec)?;

        Ok(decl)
    }

    /// Parses the declarations of a `for` initializer into a `DeclList`.
    pub(super) fn parse_decl_list(&mut self) -> ParseResult<NodeId> {
        let coord = self.coord();
        let decls = self.parse_declaration()?;

        Ok(self.alloc(AnyNode::DeclList(DeclList { decls }), coord))
    }

    /// The wrapped declarator of a type modifier node, if any.
    fn declarator_inner(&self, id: NodeId) -> Option<NodeId> {
        match self.ast().node(id) {
            AnyNode::ArrayDecl(node) => node.inner,
            AnyNode::PtrDecl(node) => node.inner,
            AnyNode::FuncDecl(node) => node.inner,
            _ => None,
        }
    }

    /// Fills a type modifier node's hole.
    fn set_declarator_inner(&mut self, id: NodeId, inner: NodeId) {
        match self.ast_mut().node_mut(id) {
            AnyNode::ArrayDecl(node) => node.inner = Some(inner),
            AnyNode::PtrDecl(node) => node.inner = Some(inner),
            AnyNode::FuncDecl(node) => node.inner = Some(inner),
            _ => {}
        }
    }

    /// Tacks a type modifier onto a declarator and returns the outermost
    /// node of the combined chain.
    ///
    /// The modifier may itself be a chain; its innermost hole receives
    /// either the declarator (when the declarator is the bare `VarDecl`
    /// leaf) or the leaf spliced out of the declarator chain's tail.
    fn type_modify_decl(&mut self, decl: NodeId, modifier: NodeId) -> NodeId {
        // Reach the modifier chain's innermost hole
        let mut modifier_tail = modifier;
        while let Some(inner) = self.declarator_inner(modifier_tail) {
            modifier_tail = inner;
        }

        if self.ast().node(decl).as_var_decl().is_some() {
            self.set_declarator_inner(modifier_tail, decl);
            return modifier;
        }

        // Reach the node holding the VarDecl leaf and splice the modifier
        // between them
        let mut decl_tail = decl;
        while let Some(inner) = self.declarator_inner(decl_tail) {
            if self.ast().node(inner).as_var_decl().is_some() {
                self.set_declarator_inner(modifier_tail, inner);
                self.set_declarator_inner(decl_tail, modifier);
                return decl;
            }

            decl_tail = inner;
        }

        // Parser-built chains always end in a VarDecl leaf, so the walk
        // above cannot fall through; keep the declarator unchanged if it
        // somehow does.
        decl
    }

    /// Walks a `Decl` to its `VarDecl` leaf, copies the declared name up,
    /// and plants the base type specifier at the leaf.
    fn fix_decl_name_type(&mut self, decl: NodeId, spec: Option<Spec>) -> ParseResult<()> {
        let Some(declarator) = self.ast().node(decl).as_decl().map(|d| d.declarator) else {
            return Ok(());
        };

        // Reach the underlying VarDecl leaf
        let mut leaf = declarator;
        while self.ast().node(leaf).as_var_decl().is_none() {
            match self.declarator_inner(leaf) {
                Some(inner) => leaf = inner,
                None => break,
            }
        }

        if let Some(declname) = self.ast().node(leaf).as_var_decl().map(|v| v.declname)
            && let Some(node) = self.ast_mut().node_mut(decl).as_decl_mut()
        {
            node.name = Some(declname);
        }

        let (name, coord) = match spec {
            Some(spec) => spec,
            None => {
                // Functions default to returning int
                if self.ast().node(declarator).as_func_decl().is_some() {
                    (TypeName::Int, self.ast().coord(decl))
                } else {
                    return Err(ParseError::MissingType { coord: self.ast().coord(decl) });
                }
            }
        };

        let spec_node = self.alloc(AnyNode::TypeSpec(TypeSpec { ty: Ty::scalar(name) }), coord);
        if let Some(node) = self.ast_mut().node_mut(leaf).as_var_decl_mut() {
            node.type_spec = Some(spec_node);
        }

        Ok(())
    }
}
