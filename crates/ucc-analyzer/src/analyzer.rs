//! The semantic visitor.
//!
//! A pre-order walk with per-kind dispatch. Scope frames are pushed by the
//! `Program` node, by `FuncDecl` declarators (together with the declared
//! return-type list), and by `for` loops with a declaration initializer.
//! Declarator visits register the declared identifier and build its type
//! stack bottom-up: `ArrayDecl` and `PtrDecl` prepend their tag onto the
//! leaf identifier's type list.
//!
//! The pass decorates the tree in place and aborts on the first diagnostic.

use ucc_ast::arena::{Ast, NodeId};
use ucc_ast::nodes::{AnyNode, ConstValue, Constant};
use ucc_ast::operators::UnaryOperator;
use ucc_ast::types::{SymbolKind, Ty, TypeName};
use ucc_source::Coord;

use crate::environment::Environment;
use crate::error::SemanticError;

type SemResult<T> = Result<T, SemanticError>;

/// Analyzes a parsed program, decorating the tree in place.
///
/// ## Errors
///
/// Returns the first semantic diagnostic encountered.
pub fn analyze(ast: &mut Ast) -> SemResult<()> {
    let Some(root) = ast.root() else {
        return Ok(());
    };

    Analyzer::new().visit(ast, root)
}

/// The semantic analyzer state.
#[derive(Debug)]
pub struct Analyzer {
    env: Environment,
    /// Active function definitions: (`FuncDef`, its `Decl`)
    funcdefs: Vec<(NodeId, NodeId)>,
    /// Nesting depth of compounds inside the active function body
    compound_depth: usize,
    /// Whether the current declaration comes from a `for` initializer
    in_decl_list: bool,
}

impl Default for Analyzer {
    fn default() -> Self { Self::new() }
}

impl Analyzer {
    /// Creates a fresh analyzer.
    #[must_use]
    pub fn new() -> Self {
        Self {
            env: Environment::new(),
            funcdefs: Vec::new(),
            compound_depth: 0,
            in_decl_list: false,
        }
    }

    /// Per-kind dispatch.
    fn visit(&mut self, ast: &mut Ast, id: NodeId) -> SemResult<()> {
        match ast.node(id) {
            AnyNode::Program(_) => self.visit_program(ast, id),
            AnyNode::GlobalDecl(_) => self.visit_global_decl(ast, id),
            AnyNode::Decl(_) => self.visit_decl(ast, id),
            AnyNode::VarDecl(_) => self.visit_var_decl(ast, id),
            AnyNode::ArrayDecl(_) => self.visit_array_decl(ast, id),
            AnyNode::PtrDecl(_) => self.visit_ptr_decl(ast, id),
            AnyNode::FuncDecl(_) => self.visit_func_decl(ast, id),
            AnyNode::FuncDef(_) => self.visit_func_def(ast, id),
            AnyNode::ParamList(_) => self.visit_param_list(ast, id),
            AnyNode::DeclList(_) => self.visit_decl_list(ast, id),
            AnyNode::Compound(_) => self.visit_compound(ast, id),
            AnyNode::If(_) => self.visit_if(ast, id),
            AnyNode::While(_) => self.visit_while(ast, id),
            AnyNode::For(_) => self.visit_for(ast, id),
            AnyNode::Break(_) => self.visit_break(ast, id),
            AnyNode::Return(_) => self.visit_return(ast, id),
            AnyNode::Assert(_) => self.visit_assert(ast, id),
            AnyNode::Print(_) => self.visit_print(ast, id),
            AnyNode::Read(_) => self.visit_read(ast, id),
            AnyNode::Assignment(_) => self.visit_assignment(ast, id),
            AnyNode::BinaryOp(_) => self.visit_binary_op(ast, id),
            AnyNode::UnaryOp(_) => self.visit_unary_op(ast, id),
            AnyNode::Cast(_) => self.visit_cast(ast, id),
            AnyNode::FuncCall(_) => self.visit_func_call(ast, id),
            AnyNode::ArrayRef(_) => self.visit_array_ref(ast, id),
            AnyNode::Ident(_) => self.visit_ident(ast, id),
            AnyNode::Constant(_) => self.visit_constant(ast, id),
            AnyNode::InitList(_) => self.visit_init_list(ast, id),
            AnyNode::ExprList(_) => self.visit_expr_list(ast, id),
            AnyNode::TypeSpec(_) | AnyNode::EmptyStatement(_) => Ok(()),
        }
    }

    // ------------------------------------------------------------------
    // Chain helpers
    // ------------------------------------------------------------------

    /// The wrapped declarator of a type modifier node.
    fn inner_of(ast: &Ast, id: NodeId) -> Option<NodeId> {
        match ast.node(id) {
            AnyNode::ArrayDecl(node) => node.inner,
            AnyNode::PtrDecl(node) => node.inner,
            AnyNode::FuncDecl(node) => node.inner,
            _ => None,
        }
    }

    /// Walks a declarator chain to its `VarDecl` leaf.
    fn leaf_var_decl(ast: &Ast, mut id: NodeId) -> Option<NodeId> {
        loop {
            if ast.node(id).as_var_decl().is_some() {
                return Some(id);
            }

            id = Self::inner_of(ast, id)?;
        }
    }

    /// The declared identifier at a declarator chain's leaf.
    fn leaf_ident(ast: &Ast, id: NodeId) -> Option<NodeId> {
        let leaf = Self::leaf_var_decl(ast, id)?;

        ast.node(leaf).as_var_decl().map(|v| v.declname)
    }

    /// Strips leading pointer modifiers off a declarator chain.
    fn strip_ptr(ast: &Ast, mut id: NodeId) -> NodeId {
        while let Some(node) = ast.node(id).as_ptr_decl() {
            match node.inner {
                Some(inner) => id = inner,
                None => break,
            }
        }

        id
    }

    /// The resolved type attached to an expression node.
    fn expr_ty(ast: &Ast, id: NodeId) -> SemResult<Ty> {
        ast.node(id)
            .ty()
            .cloned()
            .ok_or(SemanticError::UnsupportedExpression { coord: ast.coord(id) })
    }

    /// The name of an identifier node.
    fn ident_name(ast: &Ast, id: NodeId) -> String {
        ast.node(id).as_ident().map(|i| i.name.clone()).unwrap_or_default()
    }

    // ------------------------------------------------------------------
    // Declarations
    // ------------------------------------------------------------------

    fn visit_program(&mut self, ast: &mut Ast, id: NodeId) -> SemResult<()> {
        let Some(gdecls) = ast.node(id).as_program().map(|p| p.gdecls.clone()) else {
            return Ok(());
        };

        self.env.push_scope(None);
        for gdecl in gdecls {
            self.visit(ast, gdecl)?;
        }
        self.env.pop_scope();

        Ok(())
    }

    fn visit_global_decl(&mut self, ast: &mut Ast, id: NodeId) -> SemResult<()> {
        let Some(decls) = ast.node(id).as_global_decl().map(|g| g.decls.clone()) else {
            return Ok(());
        };

        for decl in decls {
            self.visit(ast, decl)?;
        }

        Ok(())
    }

    fn visit_func_def(&mut self, ast: &mut Ast, id: NodeId) -> SemResult<()> {
        let Some((decl, param_decls, body)) =
            ast.node(id).as_func_def().map(|f| (f.decl, f.param_decls.clone(), f.body))
        else {
            return Ok(());
        };

        // The decls-escape list is rebuilt on every analysis run
        if let Some(node) = ast.node_mut(id).as_func_def_mut() {
            node.decls.clear();
        }

        self.funcdefs.push((id, decl));
        self.compound_depth = 0;

        self.visit(ast, decl)?;
        for param_decl in param_decls {
            self.visit(ast, param_decl)?;
        }
        self.visit(ast, body)?;

        // The function scope was pushed by the declarator's FuncDecl
        self.env.pop_scope();
        let _ = self.funcdefs.pop();

        Ok(())
    }

    fn visit_decl(&mut self, ast: &mut Ast, id: NodeId) -> SemResult<()> {
        let Some((name, declarator, init)) =
            ast.node(id).as_decl().map(|d| (d.name, d.declarator, d.init))
        else {
            return Ok(());
        };

        self.visit(ast, declarator)?;

        // The declared identifier keeps a back-reference to its declarator
        if let Some(name) = name
            && let Some(ident) = ast.node_mut(name).as_ident_mut()
        {
            ident.bind = Some(declarator);
        }

        let var = name.map(|n| Self::ident_name(ast, n)).unwrap_or_default();
        let coord = name.map_or_else(|| ast.coord(id), |n| ast.coord(n));

        let target = Self::strip_ptr(ast, declarator);

        if ast.node(target).as_func_decl().is_some() {
            if self.env.lookup(&var).is_none() {
                return Err(SemanticError::UndeclaredName { name: var, coord });
            }

            // A standalone prototype leaves the parameter scope open; only
            // a definition's declarator hands it to the enclosing FuncDef
            let is_funcdef_decl = self.funcdefs.last().is_some_and(|&(_, d)| d == id);
            if !is_funcdef_decl {
                self.env.pop_scope();
            }

            return Ok(());
        }

        if !self.env.find_local(&var) {
            return Err(SemanticError::UndeclaredName { name: var, coord });
        }

        if let Some(init) = init {
            self.check_init(ast, target, init, &var, coord)?;
        }

        // Locals outside the body's top level escape into the FuncDef so
        // code generation can allocate them in its var_decl sweep
        if (self.compound_depth >= 2 || self.in_decl_list)
            && let Some(&(funcdef, _)) = self.funcdefs.last()
            && let Some(node) = ast.node_mut(funcdef).as_func_def_mut()
        {
            node.decls.push(id);
        }

        Ok(())
    }

    fn visit_var_decl(&mut self, ast: &mut Ast, id: NodeId) -> SemResult<()> {
        let Some((declname, type_spec)) =
            ast.node(id).as_var_decl().map(|v| (v.declname, v.type_spec))
        else {
            return Ok(());
        };

        let name = Self::ident_name(ast, declname);
        let coord = ast.coord(declname);

        if self.env.find_local(&name) {
            return Err(SemanticError::Redeclaration { name, coord });
        }

        let base_ty = type_spec
            .and_then(|spec| ast.node(spec).as_type_spec().map(|t| t.ty.clone()))
            .unwrap_or_default();

        self.env.add_local(name, declname);
        let scope = self.env.scope_level();

        if let Some(ident) = ast.node_mut(declname).as_ident_mut() {
            ident.kind = Some(SymbolKind::Var);
            ident.scope = Some(scope);
            ident.ty = Some(base_ty);
        }

        Ok(())
    }

    fn visit_array_decl(&mut self, ast: &mut Ast, id: NodeId) -> SemResult<()> {
        let Some((inner, dim)) = ast.node(id).as_array_decl().map(|a| (a.inner, a.dim)) else {
            return Ok(());
        };

        if let Some(inner) = inner {
            self.visit(ast, inner)?;
        }

        // The prepends compose bottom-up into the leaf's type stack
        if let Some(ident) = Self::leaf_ident(ast, id)
            && let Some(node) = ast.node_mut(ident).as_ident_mut()
            && let Some(ty) = node.ty.as_mut()
        {
            ty.prepend(TypeName::Array);
        }

        if let Some(dim) = dim {
            self.visit(ast, dim)?;
        }

        Ok(())
    }

    fn visit_ptr_decl(&mut self, ast: &mut Ast, id: NodeId) -> SemResult<()> {
        let Some(inner) = ast.node(id).as_ptr_decl().and_then(|p| p.inner) else {
            return Ok(());
        };

        self.visit(ast, inner)?;

        if let Some(ident) = Self::leaf_ident(ast, id)
            && let Some(node) = ast.node_mut(ident).as_ident_mut()
            && let Some(ty) = node.ty.as_mut()
        {
            ty.prepend(TypeName::Ptr);
        }

        Ok(())
    }

    fn visit_func_decl(&mut self, ast: &mut Ast, id: NodeId) -> SemResult<()> {
        let Some((args, inner)) = ast.node(id).as_func_decl().map(|f| (f.args, f.inner)) else {
            return Ok(());
        };

        // Register the function name in the enclosing scope first
        if let Some(inner) = inner {
            self.visit(ast, inner)?;
        }

        let rtype = Self::leaf_ident(ast, id)
            .and_then(|ident| ast.node(ident).as_ident().and_then(|i| i.ty.clone()))
            .map_or_else(|| vec![TypeName::Void], |ty| ty.names);

        if let Some(ident) = Self::leaf_ident(ast, id)
            && let Some(node) = ast.node_mut(ident).as_ident_mut()
        {
            node.kind = Some(SymbolKind::Func);
        }

        // Parameters live in the function scope, which also carries the
        // declared return type for checking `return` statements
        self.env.push_scope(Some(rtype));

        if let Some(args) = args {
            self.visit(ast, args)?;
        }

        Ok(())
    }

    fn visit_param_list(&mut self, ast: &mut Ast, id: NodeId) -> SemResult<()> {
        let Some(params) = ast.node(id).as_param_list().map(|p| p.params.clone()) else {
            return Ok(());
        };

        for param in params {
            self.visit(ast, param)?;
        }

        Ok(())
    }

    fn visit_decl_list(&mut self, ast: &mut Ast, id: NodeId) -> SemResult<()> {
        let Some(decls) = ast.node(id).as_decl_list().map(|d| d.decls.clone()) else {
            return Ok(());
        };

        self.in_decl_list = true;
        for decl in decls {
            let result = self.visit(ast, decl);
            if result.is_err() {
                self.in_decl_list = false;
                return result;
            }
        }
        self.in_decl_list = false;

        Ok(())
    }

    // ------------------------------------------------------------------
    // Initializer checking
    // ------------------------------------------------------------------

    /// Fills or verifies an array dimension against an inferred length.
    fn set_dim(
        &mut self,
        ast: &mut Ast,
        array_decl: NodeId,
        length: i64,
        var: &str,
        coord: Coord,
    ) -> SemResult<()> {
        let Some(dim) = ast.node(array_decl).as_array_decl().and_then(|a| a.dim) else {
            // Unset dimension: fill it with the inferred length
            let mut constant = Constant::new(ConstValue::Int(length));
            constant.ty = Some(Ty::scalar(TypeName::Int));
            let dim = ast.alloc(AnyNode::Constant(constant), coord);

            if let Some(node) = ast.node_mut(array_decl).as_array_decl_mut() {
                node.dim = Some(dim);
            }

            return Ok(());
        };

        if let Some(constant) = ast.node(dim).as_constant()
            && let ConstValue::Int(value) = constant.value
            && value != length
        {
            return Err(SemanticError::InitSizeMismatch { name: var.to_string(), coord });
        }

        Ok(())
    }

    /// Validates an initializer against the (pointer-stripped) declarator
    /// it initializes.
    fn check_init(
        &mut self,
        ast: &mut Ast,
        target: NodeId,
        init: NodeId,
        var: &str,
        coord: Coord,
    ) -> SemResult<()> {
        self.visit(ast, init)?;

        let target_ty = Self::leaf_ident(ast, target)
            .and_then(|ident| ast.node(ident).as_ident().and_then(|i| i.ty.clone()))
            .unwrap_or_default();

        match ast.node(init) {
            AnyNode::Constant(constant) => {
                if let ConstValue::Str(text) = &constant.value {
                    // A string initializer requires a char array target
                    let length = i64::try_from(text.chars().count()).unwrap_or(i64::MAX);

                    if target_ty.names != vec![TypeName::Array, TypeName::Char] {
                        return Err(SemanticError::InitTypeMismatch {
                            name: var.to_string(),
                            coord,
                        });
                    }

                    self.set_dim(ast, target, length, var, coord)
                } else {
                    let rawtype = constant.value.rawtype();

                    if target_ty.outer() != Some(rawtype) {
                        return Err(SemanticError::InitTypeMismatch {
                            name: var.to_string(),
                            coord,
                        });
                    }

                    Ok(())
                }
            }

            AnyNode::InitList(list) => {
                let exprs = list.exprs.clone();

                if ast.node(target).as_array_decl().is_some() {
                    self.check_array_init(ast, target, &exprs, var, coord)
                } else {
                    // A scalar accepts a single-element list of its own type
                    if exprs.len() != 1 {
                        return Err(SemanticError::InitSingleElement {
                            name: var.to_string(),
                            coord,
                        });
                    }

                    let expr_ty = Self::expr_ty(ast, exprs[0])?;
                    if expr_ty != target_ty {
                        return Err(SemanticError::InitTypeMismatch {
                            name: var.to_string(),
                            coord,
                        });
                    }

                    Ok(())
                }
            }

            AnyNode::ArrayRef(_) | AnyNode::Ident(_) => {
                let init_ty = Self::expr_ty(ast, init)?;

                if init_ty != target_ty {
                    return Err(SemanticError::InitTypeMismatch { name: var.to_string(), coord });
                }

                // An array initialized from an array copies the source's
                // dimension
                if ast.node(target).as_array_decl().is_some()
                    && let Some(length) = Self::bound_array_dim(ast, init)
                {
                    self.set_dim(ast, target, length, var, coord)?;
                }

                Ok(())
            }

            // Other expression forms are typed by their own visits
            _ => Ok(()),
        }
    }

    /// Recursively validates a nested initializer list, filling unset
    /// dimensions with each level's sibling count.
    fn check_array_init(
        &mut self,
        ast: &mut Ast,
        array_decl: NodeId,
        exprs: &[NodeId],
        var: &str,
        coord: Coord,
    ) -> SemResult<()> {
        let length = i64::try_from(exprs.len()).unwrap_or(i64::MAX);
        self.set_dim(ast, array_decl, length, var, coord)?;

        let inner = ast.node(array_decl).as_array_decl().and_then(|a| a.inner);

        if let Some(inner) = inner
            && ast.node(inner).as_array_decl().is_some()
        {
            // Every sibling sub-list must exist and have the same length
            let mut expected = None;
            let mut sublists = Vec::with_capacity(exprs.len());

            for &expr in exprs {
                let Some(list) = ast.node(expr).as_init_list() else {
                    return Err(SemanticError::InitTypeMismatch { name: var.to_string(), coord });
                };

                match expected {
                    None => expected = Some(list.exprs.len()),
                    Some(n) if n != list.exprs.len() => {
                        return Err(SemanticError::RaggedInitList { coord });
                    }
                    Some(_) => {}
                }

                sublists.push(list.exprs.clone());
            }

            for sublist in sublists {
                self.check_array_init(ast, inner, &sublist, var, coord)?;
            }

            return Ok(());
        }

        // Leaf level: every element must be a scalar of the element type
        let element = Self::leaf_ident(ast, array_decl)
            .and_then(|ident| ast.node(ident).as_ident().and_then(|i| i.ty.clone()))
            .and_then(|ty| ty.element());

        for &expr in exprs {
            let expr_ty = Self::expr_ty(ast, expr)?;

            if expr_ty.names.len() != 1 || expr_ty.element() != element {
                return Err(SemanticError::InitTypeMismatch { name: var.to_string(), coord });
            }
        }

        Ok(())
    }

    /// The declared dimension of an array-typed identifier, if it is bound
    /// to an array declarator with a constant dimension.
    fn bound_array_dim(ast: &Ast, init: NodeId) -> Option<i64> {
        let bind = ast.node(init).as_ident().and_then(|i| i.bind)?;
        let dim = ast.node(bind).as_array_decl().and_then(|a| a.dim)?;

        match ast.node(dim).as_constant()?.value {
            ConstValue::Int(value) => Some(value),
            _ => None,
        }
    }

    // ------------------------------------------------------------------
    // Expressions
    // ------------------------------------------------------------------

    fn visit_ident(&mut self, ast: &mut Ast, id: NodeId) -> SemResult<()> {
        let name = Self::ident_name(ast, id);

        let Some(declared) = self.env.lookup(&name) else {
            return Err(SemanticError::UndeclaredName { name, coord: ast.coord(id) });
        };

        let Some(source) = ast.node(declared).as_ident() else {
            return Ok(());
        };
        let (ty, kind, scope, bind) =
            (source.ty.clone(), source.kind, source.scope, source.bind);

        if let Some(ident) = ast.node_mut(id).as_ident_mut() {
            ident.ty = ty;
            ident.kind = kind;
            ident.scope = scope;
            ident.bind = bind;
        }

        Ok(())
    }

    fn visit_constant(&mut self, ast: &mut Ast, id: NodeId) -> SemResult<()> {
        if let Some(constant) = ast.node_mut(id).as_constant_mut()
            && constant.ty.is_none()
        {
            constant.ty = Some(Ty::scalar(constant.value.rawtype()));
        }

        Ok(())
    }

    fn visit_binary_op(&mut self, ast: &mut Ast, id: NodeId) -> SemResult<()> {
        let Some((op, left, right)) =
            ast.node(id).as_binary_op().map(|b| (b.op, b.left, b.right))
        else {
            return Ok(());
        };
        let coord = ast.coord(id);

        self.visit(ast, left)?;
        self.visit(ast, right)?;

        let lty = Self::expr_ty(ast, left)?;
        let rty = Self::expr_ty(ast, right)?;

        if lty != rty {
            return Err(SemanticError::BinaryMismatch {
                ltype: lty.element().unwrap_or(TypeName::Void),
                rtype: rty.element().unwrap_or(TypeName::Void),
                coord,
            });
        }

        let element = lty.element().unwrap_or(TypeName::Void);

        let result = if element.supports_binary(op) {
            Ty::scalar(element)
        } else if element.supports_rel(op) {
            Ty::scalar(TypeName::Bool)
        } else {
            return Err(SemanticError::BinaryOpUnsupported { op, ty: element, coord });
        };

        let _ = ast.node_mut(id).set_ty(result);

        Ok(())
    }

    fn visit_unary_op(&mut self, ast: &mut Ast, id: NodeId) -> SemResult<()> {
        let Some((op, expr)) = ast.node(id).as_unary_op().map(|u| (u.op, u.expr)) else {
            return Ok(());
        };
        let coord = ast.coord(id);

        self.visit(ast, expr)?;

        let operand_ty = Self::expr_ty(ast, expr)?;
        let element = operand_ty.element().unwrap_or(TypeName::Void);

        if !element.supports_unary(op) {
            return Err(SemanticError::UnaryOpUnsupported { op, coord });
        }

        let mut result = operand_ty;

        match op {
            UnaryOperator::Deref => {
                // Dereference pops the outer aggregate tag
                if result.names.len() > 1 {
                    let _ = result.names.remove(0);
                } else {
                    return Err(SemanticError::UnaryOpUnsupported { op, coord });
                }
            }
            UnaryOperator::AddrOf => result.prepend(TypeName::Ptr),
            _ => {}
        }

        let _ = ast.node_mut(id).set_ty(result);

        Ok(())
    }

    fn visit_assignment(&mut self, ast: &mut Ast, id: NodeId) -> SemResult<()> {
        let Some((op, lvalue, rvalue)) =
            ast.node(id).as_assignment().map(|a| (a.op, a.lvalue, a.rvalue))
        else {
            return Ok(());
        };
        let coord = ast.coord(id);

        self.visit(ast, rvalue)?;
        let rty = Self::expr_ty(ast, rvalue)?;

        self.visit(ast, lvalue)?;
        let lty = Self::expr_ty(ast, lvalue)?;

        if lty != rty {
            return Err(SemanticError::AssignMismatch {
                ltype: lty.outer().unwrap_or(TypeName::Void),
                rtype: rty.outer().unwrap_or(TypeName::Void),
                coord,
            });
        }

        let element = lty.element().unwrap_or(TypeName::Void);
        if !element.supports_assign(op) {
            return Err(SemanticError::AssignOpUnsupported { op, ty: element, coord });
        }

        Ok(())
    }

    fn visit_cast(&mut self, ast: &mut Ast, id: NodeId) -> SemResult<()> {
        let Some((to_type, expr)) = ast.node(id).as_cast().map(|c| (c.to_type, c.expr)) else {
            return Ok(());
        };

        self.visit(ast, expr)?;

        let ty = ast.node(to_type).as_type_spec().map(|t| t.ty.clone()).unwrap_or_default();
        let _ = ast.node_mut(id).set_ty(ty);

        Ok(())
    }

    fn visit_func_call(&mut self, ast: &mut Ast, id: NodeId) -> SemResult<()> {
        let Some((name, args)) = ast.node(id).as_func_call().map(|f| (f.name, f.args)) else {
            return Ok(());
        };
        let coord = ast.coord(id);
        let func_name = Self::ident_name(ast, name);

        let Some(declared) = self.env.lookup(&func_name) else {
            return Err(SemanticError::UndeclaredName { name: func_name, coord });
        };

        let Some(label) = ast.node(declared).as_ident() else {
            return Ok(());
        };
        let (ty, kind, scope, bind) = (label.ty.clone(), label.kind, label.scope, label.bind);

        if kind != Some(SymbolKind::Func) {
            return Err(SemanticError::NotAFunction { name: func_name, coord });
        }

        // Decorate both the call and its callee identifier
        if let Some(ty) = ty.clone() {
            let _ = ast.node_mut(id).set_ty(ty);
        }
        if let Some(ident) = ast.node_mut(name).as_ident_mut() {
            ident.ty = ty;
            ident.kind = kind;
            ident.scope = scope;
            ident.bind = bind;
        }

        // Arity and per-argument type checks against the signature
        let params = bind
            .map(|b| Self::strip_ptr(ast, b))
            .and_then(|b| ast.node(b).as_func_decl().and_then(|f| f.args))
            .and_then(|a| ast.node(a).as_param_list().map(|p| p.params.clone()))
            .unwrap_or_default();

        let arg_exprs = match args {
            None => Vec::new(),
            Some(list) => match ast.node(list).as_expr_list() {
                Some(exprs) => exprs.exprs.clone(),
                None => vec![list],
            },
        };

        if arg_exprs.len() != params.len() {
            return Err(SemanticError::ArgCountMismatch { name: func_name, coord });
        }

        for (&arg, &param) in arg_exprs.iter().zip(params.iter()) {
            self.visit(ast, arg)?;

            let arg_ty = Self::expr_ty(ast, arg)?;
            let param_ident = ast.node(param).as_decl().and_then(|d| d.name);
            let param_ty = param_ident
                .and_then(|ident| ast.node(ident).as_ident().and_then(|i| i.ty.clone()))
                .unwrap_or_default();

            if arg_ty != param_ty {
                let param_name =
                    param_ident.map(|ident| Self::ident_name(ast, ident)).unwrap_or_default();

                return Err(SemanticError::ArgTypeMismatch { param: param_name, coord });
            }
        }

        Ok(())
    }

    fn visit_array_ref(&mut self, ast: &mut Ast, id: NodeId) -> SemResult<()> {
        let Some((name, subscript)) =
            ast.node(id).as_array_ref().map(|a| (a.name, a.subscript))
        else {
            return Ok(());
        };
        let coord = ast.coord(id);

        self.visit(ast, subscript)?;
        let sub_ty = Self::expr_ty(ast, subscript)?;

        if sub_ty.element() != Some(TypeName::Int) {
            return Err(SemanticError::SubscriptNotInt {
                ty: sub_ty.element().unwrap_or(TypeName::Void),
                coord,
            });
        }

        self.visit(ast, name)?;
        let name_ty = Self::expr_ty(ast, name)?;

        // Subscripting removes one outer aggregate tag
        let element_names: Vec<TypeName> = name_ty.names.iter().skip(1).copied().collect();
        let _ = ast.node_mut(id).set_ty(Ty::new(element_names));

        Ok(())
    }

    fn visit_init_list(&mut self, ast: &mut Ast, id: NodeId) -> SemResult<()> {
        let Some(exprs) = ast.node(id).as_init_list().map(|l| l.exprs.clone()) else {
            return Ok(());
        };

        for expr in exprs {
            self.visit(ast, expr)?;
        }

        Ok(())
    }

    fn visit_expr_list(&mut self, ast: &mut Ast, id: NodeId) -> SemResult<()> {
        let Some(exprs) = ast.node(id).as_expr_list().map(|l| l.exprs.clone()) else {
            return Ok(());
        };

        for expr in exprs {
            self.visit(ast, expr)?;
        }

        Ok(())
    }

    // ------------------------------------------------------------------
    // Statements
    // ------------------------------------------------------------------

    fn visit_compound(&mut self, ast: &mut Ast, id: NodeId) -> SemResult<()> {
        let Some(items) = ast.node(id).as_compound().map(|c| c.block_items.clone()) else {
            return Ok(());
        };

        self.compound_depth += 1;
        for item in items {
            let result = self.visit(ast, item);
            if result.is_err() {
                self.compound_depth -= 1;
                return result;
            }
        }
        self.compound_depth -= 1;

        Ok(())
    }

    /// Requires a condition expression to resolve to `bool`.
    fn check_condition(&mut self, ast: &mut Ast, cond: Option<NodeId>, coord: Coord) -> SemResult<()> {
        let Some(cond) = cond else {
            return Err(SemanticError::ConditionNotBool { ty: TypeName::Void, coord });
        };

        self.visit(ast, cond)?;
        let ty = Self::expr_ty(ast, cond)?;

        if ty.outer() != Some(TypeName::Bool) {
            return Err(SemanticError::ConditionNotBool {
                ty: ty.outer().unwrap_or(TypeName::Void),
                coord: ast.coord(cond),
            });
        }

        Ok(())
    }

    fn visit_if(&mut self, ast: &mut Ast, id: NodeId) -> SemResult<()> {
        let Some((cond, iftrue, iffalse)) =
            ast.node(id).as_if().map(|i| (i.cond, i.iftrue, i.iffalse))
        else {
            return Ok(());
        };
        let coord = ast.coord(id);

        self.check_condition(ast, Some(cond), coord)?;
        self.visit(ast, iftrue)?;

        if let Some(iffalse) = iffalse {
            self.visit(ast, iffalse)?;
        }

        Ok(())
    }

    fn visit_while(&mut self, ast: &mut Ast, id: NodeId) -> SemResult<()> {
        let Some((cond, stmt)) = ast.node(id).as_while().map(|w| (w.cond, w.stmt)) else {
            return Ok(());
        };
        let coord = ast.coord(id);

        self.check_condition(ast, Some(cond), coord)?;

        self.env.push_loop(id);
        let result = self.visit(ast, stmt);
        self.env.pop_loop();

        result
    }

    fn visit_for(&mut self, ast: &mut Ast, id: NodeId) -> SemResult<()> {
        let Some((init, cond, next, stmt)) =
            ast.node(id).as_for().map(|f| (f.init, f.cond, f.next, f.stmt))
        else {
            return Ok(());
        };
        let coord = ast.coord(id);

        // A declaration initializer opens its own scope
        let has_decl_scope = init.is_some_and(|i| ast.node(i).as_decl_list().is_some());
        if has_decl_scope {
            self.env.push_scope(None);
        }

        self.env.push_loop(id);

        let result = (|| {
            if let Some(init) = init {
                self.visit(ast, init)?;
            }
            self.check_condition(ast, cond, coord)?;
            if let Some(next) = next {
                self.visit(ast, next)?;
            }
            self.visit(ast, stmt)
        })();

        self.env.pop_loop();
        if has_decl_scope {
            self.env.pop_scope();
        }

        result
    }

    fn visit_break(&mut self, ast: &mut Ast, id: NodeId) -> SemResult<()> {
        let Some(enclosing) = self.env.current_loop() else {
            return Err(SemanticError::BreakOutsideLoop { coord: ast.coord(id) });
        };

        if let Some(node) = ast.node_mut(id).as_break_mut() {
            node.bind = Some(enclosing);
        }

        Ok(())
    }

    fn visit_return(&mut self, ast: &mut Ast, id: NodeId) -> SemResult<()> {
        let Some(expr) = ast.node(id).as_return().map(|r| r.expr) else {
            return Ok(());
        };
        let coord = ast.coord(id);

        let found = match expr {
            Some(expr) => {
                self.visit(ast, expr)?;
                Self::expr_ty(ast, expr)?.names
            }
            None => vec![TypeName::Void],
        };

        if found != self.env.cur_rtype() {
            return Err(SemanticError::ReturnMismatch {
                found: found.first().copied().unwrap_or(TypeName::Void),
                expected: self.env.cur_rtype().first().copied().unwrap_or(TypeName::Void),
                coord,
            });
        }

        Ok(())
    }

    fn visit_assert(&mut self, ast: &mut Ast, id: NodeId) -> SemResult<()> {
        let Some(expr) = ast.node(id).as_assert().map(|a| a.expr) else {
            return Ok(());
        };

        self.visit(ast, expr)?;
        let ty = Self::expr_ty(ast, expr)?;

        if ty.outer() != Some(TypeName::Bool) {
            return Err(SemanticError::AssertNotBool { coord: ast.coord(expr) });
        }

        Ok(())
    }

    fn visit_print(&mut self, ast: &mut Ast, id: NodeId) -> SemResult<()> {
        let Some(expr) = ast.node(id).as_print().map(|p| p.expr) else {
            return Ok(());
        };

        if let Some(expr) = expr {
            self.visit(ast, expr)?;
        }

        Ok(())
    }

    fn visit_read(&mut self, ast: &mut Ast, id: NodeId) -> SemResult<()> {
        let Some(expr) = ast.node(id).as_read().map(|r| r.expr) else {
            return Ok(());
        };

        let targets = match ast.node(expr).as_expr_list() {
            Some(list) => list.exprs.clone(),
            None => vec![expr],
        };

        for target in targets {
            if !matches!(ast.node(target), AnyNode::Ident(_) | AnyNode::ArrayRef(_)) {
                return Err(SemanticError::NotAVariable { coord: ast.coord(target) });
            }

            self.visit(ast, target)?;
        }

        Ok(())
    }
}
