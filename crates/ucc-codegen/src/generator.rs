//! The IR generator.
//!
//! Consumes the decorated AST and appends three-address instructions to two
//! buffers: `text` (globals and string literals) and `code` (function
//! bodies). The final sequence is `text` followed by `code`.
//!
//! Temporaries are numbered per function through a name-keyed counter map;
//! the `_glob_` key numbers string-literal symbols and acts as the
//! module-level namespace. Basic-block labels come from the same
//! per-function counter and are emitted as bare-number instructions.
//!
//! Function lowering runs in phases over the same declarator subtrees:
//! parameter allocation (`arg_decl`), return-slot and exit-label
//! allocation, parameter initialization (`arg_init`), local allocation
//! (`var_decl`, covering nested blocks and `for` initializers through the
//! decls-escape list), then body emission (`var_init`). The ordering
//! guarantees that every alloca precedes any store and that `return`
//! lowers to a single jump-to-exit.

use std::collections::VecDeque;

use log::debug;
use rustc_hash::FxHashMap;
use ucc_ast::arena::{Ast, NodeId};
use ucc_ast::nodes::{AnyNode, ConstValue};
use ucc_ast::operators::{BinaryOperator, UnaryOperator};
use ucc_ast::types::{SymbolKind, TypeName};

use crate::error::CodegenError;
use crate::instr::Instr;

type GenResult<T> = Result<T, CodegenError>;

/// The counter namespace for module-level names.
const GLOBAL_NS: &str = "_glob_";

/// The sub-passes of a function lowering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AllocPhase {
    /// Allocate parameter slots
    ArgDecl,
    /// Store inbound parameter temporaries into their slots
    ArgInit,
    /// Allocate every local slot
    VarDecl,
    /// Emit body instructions; declarations store their initializers
    VarInit,
}

/// Generates the IR list for an analyzed program.
///
/// ## Errors
///
/// Returns an internal error if a required decoration is missing, which
/// indicates an earlier pass's incompleteness.
pub fn generate(ast: &mut Ast) -> GenResult<Vec<Instr>> {
    let Some(root) = ast.root() else {
        return Ok(Vec::new());
    };

    let mut generator = CodeGenerator::new();
    generator.visit(ast, root)?;

    // Globals and string literals precede all function bodies
    let mut out = generator.text;
    out.extend(generator.code);

    Ok(out)
}

/// The code generator state.
#[derive(Debug)]
pub struct CodeGenerator {
    /// Per-function temporary counters, keyed by function name
    versions: FxHashMap<String, usize>,
    /// The active counter key (`@name` inside a function, `_glob_` outside)
    fname: String,
    /// Global allocations and string literals
    text: Vec<Instr>,
    /// Function bodies
    code: Vec<Instr>,
    /// The active function-lowering phase
    phase: Option<AllocPhase>,
    /// Inbound parameter temporaries awaiting their arg_init store
    queue: VecDeque<String>,
    /// The active function's return slot
    ret_location: Option<String>,
    /// The active function's exit label
    ret_label: Option<String>,
}

impl Default for CodeGenerator {
    fn default() -> Self { Self::new() }
}

impl CodeGenerator {
    /// Creates a fresh generator.
    #[must_use]
    pub fn new() -> Self {
        let mut versions = FxHashMap::default();
        let _ = versions.insert(GLOBAL_NS.to_string(), 0);

        Self {
            versions,
            fname: GLOBAL_NS.to_string(),
            text: Vec::new(),
            code: Vec::new(),
            phase: None,
            queue: VecDeque::new(),
            ret_location: None,
            ret_label: None,
        }
    }

    /// A fresh temporary `%N` in the active function's namespace.
    fn new_temp(&mut self) -> String {
        let counter = self.versions.entry(self.fname.clone()).or_insert(0);
        let name = format!("%{counter}");
        *counter += 1;

        name
    }

    /// A fresh string-literal symbol `@.str.N` in the module namespace.
    fn new_text(&mut self) -> String {
        let counter = self.versions.entry(GLOBAL_NS.to_string()).or_insert(0);
        let name = format!("@.str.{counter}");
        *counter += 1;

        name
    }

    fn emit(&mut self, opcode: impl Into<String>, operands: Vec<String>) {
        self.code.push(Instr::new(opcode, operands));
    }

    fn emit_label(&mut self, temp: &str) { self.code.push(Instr::label(temp)); }

    fn ret_label(&self) -> GenResult<String> {
        self.ret_label.clone().ok_or_else(|| CodegenError::internal("no active exit label"))
    }

    fn ret_location(&self) -> GenResult<String> {
        self.ret_location.clone().ok_or_else(|| CodegenError::internal("no active return slot"))
    }

    // ------------------------------------------------------------------
    // Decoration access
    // ------------------------------------------------------------------

    /// The IR operand already attached to a node.
    fn gen_location(ast: &Ast, id: NodeId) -> GenResult<String> {
        ast.node(id).gen_location().map(str::to_string).ok_or_else(|| {
            CodegenError::internal(format!("node at {} has no location", ast.coord(id)))
        })
    }

    /// The scalar element name of an expression's resolved type.
    fn element_name(ast: &Ast, id: NodeId) -> GenResult<&'static str> {
        ast.node(id)
            .ty()
            .and_then(|ty| ty.element())
            .map(TypeName::as_str)
            .ok_or_else(|| {
                CodegenError::internal(format!("node at {} has no type", ast.coord(id)))
            })
    }

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
    fn leaf_var_decl(ast: &Ast, mut id: NodeId) -> GenResult<NodeId> {
        loop {
            if ast.node(id).as_var_decl().is_some() {
                return Ok(id);
            }

            id = Self::inner_of(ast, id)
                .ok_or_else(|| CodegenError::internal("declarator chain has no leaf"))?;
        }
    }

    /// The declared identifier at a declarator chain's leaf.
    fn leaf_ident(ast: &Ast, id: NodeId) -> GenResult<NodeId> {
        let leaf = Self::leaf_var_decl(ast, id)?;

        ast.node(leaf)
            .as_var_decl()
            .map(|v| v.declname)
            .ok_or_else(|| CodegenError::internal("declarator leaf is not a VarDecl"))
    }

    /// The constant value of an array declarator's dimension.
    fn array_dim_value(ast: &Ast, array_decl: NodeId) -> GenResult<i64> {
        let dim = ast
            .node(array_decl)
            .as_array_decl()
            .and_then(|a| a.dim)
            .ok_or_else(|| CodegenError::internal("array declarator has no dimension"))?;

        match ast.node(dim).as_constant().map(|c| &c.value) {
            Some(&ConstValue::Int(value)) => Ok(value),
            _ => Err(CodegenError::internal("array dimension is not an int constant")),
        }
    }

    /// Renders a constant operand.
    fn render_const(value: &ConstValue) -> String { value.to_string() }

    /// Renders an initializer list as a bracketed value array, nesting for
    /// multi-dimensional aggregates.
    fn render_init_value(ast: &Ast, init: NodeId) -> GenResult<String> {
        match ast.node(init) {
            AnyNode::Constant(constant) => Ok(Self::render_const(&constant.value)),
            AnyNode::InitList(list) => {
                let mut parts = Vec::with_capacity(list.exprs.len());
                for &expr in &list.exprs {
                    parts.push(Self::render_init_value(ast, expr)?);
                }

                Ok(format!("[{}]", parts.join(", ")))
            }
            _ => Err(CodegenError::internal("global initializer is not constant")),
        }
    }

    // ------------------------------------------------------------------
    // Dispatch
    // ------------------------------------------------------------------

    fn visit(&mut self, ast: &mut Ast, id: NodeId) -> GenResult<()> {
        match ast.node(id) {
            AnyNode::Program(_) => self.visit_program(ast, id),
            AnyNode::GlobalDecl(_) => self.visit_global_decl(ast, id),
            AnyNode::Decl(_) => self.visit_decl(ast, id),
            AnyNode::DeclList(_) => self.visit_decl_list(ast, id),
            AnyNode::FuncDef(_) => self.visit_func_def(ast, id),
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
            AnyNode::ExprList(_) => self.visit_expr_list(ast, id),
            AnyNode::VarDecl(_)
            | AnyNode::ArrayDecl(_)
            | AnyNode::PtrDecl(_)
            | AnyNode::FuncDecl(_)
            | AnyNode::TypeSpec(_)
            | AnyNode::ParamList(_)
            | AnyNode::InitList(_)
            | AnyNode::EmptyStatement(_) => Ok(()),
        }
    }

    fn visit_program(&mut self, ast: &mut Ast, id: NodeId) -> GenResult<()> {
        let Some(gdecls) = ast.node(id).as_program().map(|p| p.gdecls.clone()) else {
            return Ok(());
        };

        for gdecl in gdecls {
            self.visit(ast, gdecl)?;
        }

        Ok(())
    }

    fn visit_global_decl(&mut self, ast: &mut Ast, id: NodeId) -> GenResult<()> {
        let Some(decls) = ast.node(id).as_global_decl().map(|g| g.decls.clone()) else {
            return Ok(());
        };

        for decl in decls {
            // Function prototypes emit nothing at global scope
            let is_func = ast
                .node(decl)
                .as_decl()
                .is_some_and(|d| ast.node(d.declarator).as_func_decl().is_some());

            if !is_func {
                self.visit(ast, decl)?;
            }
        }

        Ok(())
    }

    // ------------------------------------------------------------------
    // Declarations and function lowering
    // ------------------------------------------------------------------

    fn visit_decl(&mut self, ast: &mut Ast, id: NodeId) -> GenResult<()> {
        let Some(declarator) = ast.node(id).as_decl().map(|d| d.declarator) else {
            return Ok(());
        };

        match ast.node(declarator) {
            AnyNode::VarDecl(_) => self.lower_var_decl(ast, declarator, id, String::new()),
            AnyNode::ArrayDecl(_) => self.lower_array_decl(ast, declarator, id),
            AnyNode::PtrDecl(_) => self.lower_ptr_decl(ast, declarator, id),
            AnyNode::FuncDecl(_) => self.lower_func_decl(ast, declarator),
            _ => Ok(()),
        }
    }

    fn visit_decl_list(&mut self, ast: &mut Ast, id: NodeId) -> GenResult<()> {
        let Some(decls) = ast.node(id).as_decl_list().map(|d| d.decls.clone()) else {
            return Ok(());
        };

        for decl in decls {
            self.visit(ast, decl)?;
        }

        Ok(())
    }

    /// Assembles the dimensional suffix of an array declarator chain and
    /// lowers its leaf.
    fn lower_array_decl(&mut self, ast: &mut Ast, declarator: NodeId, decl: NodeId) -> GenResult<()> {
        let mut dim = format!("_{}", Self::array_dim_value(ast, declarator)?);

        let mut current = declarator;
        while ast.node(current).as_var_decl().is_none() {
            current = Self::inner_of(ast, current)
                .ok_or_else(|| CodegenError::internal("declarator chain has no leaf"))?;

            match ast.node(current) {
                AnyNode::ArrayDecl(_) => {
                    dim.push_str(&format!("_{}", Self::array_dim_value(ast, current)?));
                }
                AnyNode::PtrDecl(_) => dim.push_str("_*"),
                _ => {}
            }
        }

        self.lower_var_decl(ast, current, decl, dim)
    }

    /// Assembles the pointer suffix of a pointer declarator chain and
    /// lowers its leaf.
    fn lower_ptr_decl(&mut self, ast: &mut Ast, declarator: NodeId, decl: NodeId) -> GenResult<()> {
        let mut dim = String::from("_*");

        let mut current = declarator;
        while ast.node(current).as_var_decl().is_none() {
            current = Self::inner_of(ast, current)
                .ok_or_else(|| CodegenError::internal("declarator chain has no leaf"))?;

            match ast.node(current) {
                AnyNode::PtrDecl(_) => dim.push_str("_*"),
                AnyNode::ArrayDecl(_) => {
                    dim.push_str(&format!("_{}", Self::array_dim_value(ast, current)?));
                }
                _ => {}
            }
        }

        self.lower_var_decl(ast, current, decl, dim)
    }

    /// Lowers a `VarDecl` leaf according to the active phase.
    fn lower_var_decl(
        &mut self,
        ast: &mut Ast,
        var_decl: NodeId,
        decl: NodeId,
        dim: String,
    ) -> GenResult<()> {
        let Some(declname) = ast.node(var_decl).as_var_decl().map(|v| v.declname) else {
            return Ok(());
        };

        let scope = ast.node(declname).as_ident().and_then(|i| i.scope);
        if scope == Some(1) {
            return self.global_location(ast, declname, decl, &dim);
        }

        let typename = format!("{}{dim}", Self::element_name(ast, declname)?);

        match self.phase {
            Some(AllocPhase::ArgDecl | AllocPhase::VarDecl) => {
                let varname = self.new_temp();
                self.emit(format!("alloc_{typename}"), vec![varname.clone()]);

                let _ = ast.node_mut(declname).set_gen_location(varname);
            }
            Some(AllocPhase::ArgInit) => {
                let inbound = self
                    .queue
                    .pop_front()
                    .ok_or_else(|| CodegenError::internal("parameter queue exhausted"))?;
                let slot = Self::gen_location(ast, declname)?;

                self.emit(format!("store_{typename}"), vec![inbound, slot]);
            }
            Some(AllocPhase::VarInit) => {
                if let Some(init) = ast.node(decl).as_decl().and_then(|d| d.init) {
                    let slot = Self::gen_location(ast, declname)?;
                    self.store_location(ast, &typename, init, &slot)?;
                }
            }
            None => {}
        }

        Ok(())
    }

    /// Emits a global allocation into the text section.
    fn global_location(
        &mut self,
        ast: &mut Ast,
        declname: NodeId,
        decl: NodeId,
        dim: &str,
    ) -> GenResult<()> {
        let typename = format!("{}{dim}", Self::element_name(ast, declname)?);
        let name = ast.node(declname).as_ident().map(|i| i.name.clone()).unwrap_or_default();
        let varname = format!("@{name}");

        let init = ast.node(decl).as_decl().and_then(|d| d.init);
        let instr = match init {
            None => Instr::new(format!("global_{typename}"), vec![varname.clone()]),
            Some(init) => {
                let value = Self::render_init_value(ast, init)?;

                Instr::new(format!("global_{typename}"), vec![varname.clone(), value])
            }
        };
        self.text.push(instr);

        let _ = ast.node_mut(declname).set_gen_location(varname);

        Ok(())
    }

    /// Lowers a function declarator: `define`, parameter pre-reservation,
    /// the arg_decl and arg_init phases, and the return slot and exit
    /// label between them.
    fn lower_func_decl(&mut self, ast: &mut Ast, declarator: NodeId) -> GenResult<()> {
        let declname = Self::leaf_ident(ast, declarator)?;
        let name = ast.node(declname).as_ident().map(|i| i.name.clone()).unwrap_or_default();

        self.fname = format!("@{name}");
        debug!("lowering function {}", self.fname);

        self.emit("define", vec![self.fname.clone()]);
        let _ = ast.node_mut(declname).set_gen_location(self.fname.clone());

        let params = ast
            .node(declarator)
            .as_func_decl()
            .and_then(|f| f.args)
            .and_then(|a| ast.node(a).as_param_list().map(|p| p.params.clone()))
            .unwrap_or_default();

        // Pre-reserve the caller-provided operand names
        self.queue.clear();
        for _ in &params {
            let temp = self.new_temp();
            self.queue.push_back(temp);
        }

        self.phase = Some(AllocPhase::ArgDecl);
        for &param in &params {
            self.visit(ast, param)?;
        }

        // The return slot and exit label sit between the two parameter
        // phases; void functions carry a slotless exit
        let ret_element = ast
            .node(declname)
            .as_ident()
            .and_then(|i| i.ty.as_ref())
            .and_then(|ty| ty.element())
            .unwrap_or(TypeName::Void);

        let ret_location = self.new_temp();
        if ret_element != TypeName::Void {
            self.emit(format!("alloc_{}", ret_element.as_str()), vec![ret_location.clone()]);
        }
        self.ret_location = Some(ret_location);
        self.ret_label = Some(self.new_temp());

        self.phase = Some(AllocPhase::ArgInit);
        for &param in &params {
            self.visit(ast, param)?;
        }

        Ok(())
    }

    fn visit_func_def(&mut self, ast: &mut Ast, id: NodeId) -> GenResult<()> {
        let Some((spec, decl, body, escaped)) =
            ast.node(id).as_func_def().map(|f| (f.spec, f.decl, f.body, f.decls.clone()))
        else {
            return Ok(());
        };

        self.phase = None;
        self.visit(ast, decl)?;

        let body_items =
            ast.node(body).as_compound().map(|c| c.block_items.clone()).unwrap_or_default();

        // All local allocas precede any body instruction
        self.phase = Some(AllocPhase::VarDecl);
        for &item in &body_items {
            if ast.node(item).as_decl().is_some() {
                self.visit(ast, item)?;
            }
        }
        for &item in &escaped {
            self.visit(ast, item)?;
        }

        self.phase = Some(AllocPhase::VarInit);
        for &item in &body_items {
            self.visit(ast, item)?;
        }

        // Single exit: the return label, then the slot load and return
        let ret_label = self.ret_label()?;
        self.emit_label(&ret_label);

        let spec_element = ast
            .node(spec)
            .as_type_spec()
            .and_then(|t| t.ty.element())
            .unwrap_or(TypeName::Void);

        if spec_element == TypeName::Void {
            self.emit("return_void", Vec::new());
        } else {
            let ret_location = self.ret_location()?;
            let rvalue = self.new_temp();

            self.emit(format!("load_{}", spec_element.as_str()), vec![ret_location, rvalue.clone()]);
            self.emit(format!("return_{}", spec_element.as_str()), vec![rvalue]);
        }

        self.fname = GLOBAL_NS.to_string();

        Ok(())
    }

    fn visit_compound(&mut self, ast: &mut Ast, id: NodeId) -> GenResult<()> {
        let Some(items) = ast.node(id).as_compound().map(|c| c.block_items.clone()) else {
            return Ok(());
        };

        for item in items {
            self.visit(ast, item)?;
        }

        Ok(())
    }

    // ------------------------------------------------------------------
    // Loads and stores
    // ------------------------------------------------------------------

    /// Loads an address-bearing access (`Ident` or `ArrayRef`) into a
    /// fresh temporary before its value is consumed.
    fn load_location(&mut self, ast: &mut Ast, id: NodeId) -> GenResult<()> {
        let varname = self.new_temp();
        let mut typename = Self::element_name(ast, id)?.to_string();

        if ast.node(id).as_array_ref().is_some() {
            typename.push_str("_*");
        } else if let Some(bind) = ast.node(id).as_ident().and_then(|i| i.bind)
            && ast.node(bind).as_array_decl().is_some()
        {
            typename.push_str(&format!("_{}", Self::array_dim_value(ast, bind)?));
        }

        let source = Self::gen_location(ast, id)?;
        self.emit(format!("load_{typename}"), vec![source, varname.clone()]);

        let _ = ast.node_mut(id).set_gen_location(varname);

        Ok(())
    }

    /// Loads the node's value if it is an address-bearing access.
    fn load_if_needed(&mut self, ast: &mut Ast, id: NodeId) -> GenResult<()> {
        if matches!(ast.node(id), AnyNode::Ident(_) | AnyNode::ArrayRef(_)) {
            self.load_location(ast, id)?;
        }

        Ok(())
    }

    /// Lowers an initializer and stores its value into a slot.
    fn store_location(
        &mut self,
        ast: &mut Ast,
        typename: &str,
        init: NodeId,
        target: &str,
    ) -> GenResult<()> {
        self.visit(ast, init)?;

        // Aggregate initializers store their rendered value array
        if ast.node(init).as_init_list().is_some() {
            let value = Self::render_init_value(ast, init)?;
            self.emit(format!("store_{typename}"), vec![value, target.to_string()]);

            return Ok(());
        }

        self.load_if_needed(ast, init)?;
        let value = Self::gen_location(ast, init)?;
        self.emit(format!("store_{typename}"), vec![value, target.to_string()]);

        Ok(())
    }

    // ------------------------------------------------------------------
    // Expressions
    // ------------------------------------------------------------------

    fn visit_ident(&mut self, ast: &mut Ast, id: NodeId) -> GenResult<()> {
        // Never regenerate a location for a node that already has one
        if ast.node(id).gen_location().is_some() {
            return Ok(());
        }

        let Some(ident) = ast.node(id).as_ident() else {
            return Ok(());
        };
        let (name, kind, scope, bind) =
            (ident.name.clone(), ident.kind, ident.scope, ident.bind);

        let Some(bind) = bind else {
            return Ok(());
        };
        let leaf = Self::leaf_ident(ast, bind)?;

        match ast.node(leaf).gen_location().map(str::to_string) {
            Some(location) => {
                let _ = ast.node_mut(id).set_gen_location(location);
            }
            None => {
                if kind == Some(SymbolKind::Func) && scope == Some(1) {
                    let _ = ast.node_mut(id).set_gen_location(format!("@{name}"));
                }
            }
        }

        Ok(())
    }

    fn visit_constant(&mut self, ast: &mut Ast, id: NodeId) -> GenResult<()> {
        if ast.node(id).gen_location().is_some() {
            return Ok(());
        }

        let Some(value) = ast.node(id).as_constant().map(|c| c.value.clone()) else {
            return Ok(());
        };

        let target = if let ConstValue::Str(text) = &value {
            let target = self.new_text();
            self.text.push(Instr::new("global_string", vec![target.clone(), text.clone()]));

            target
        } else {
            let target = self.new_temp();
            self.emit(
                format!("literal_{}", value.rawtype().as_str()),
                vec![Self::render_const(&value), target.clone()],
            );

            target
        };

        let _ = ast.node_mut(id).set_gen_location(target);

        Ok(())
    }

    fn visit_expr_list(&mut self, ast: &mut Ast, id: NodeId) -> GenResult<()> {
        let Some(exprs) = ast.node(id).as_expr_list().map(|l| l.exprs.clone()) else {
            return Ok(());
        };

        for expr in exprs {
            self.visit(ast, expr)?;
        }

        Ok(())
    }

    /// The opcode stem of a binary operator.
    const fn binary_opcode(op: BinaryOperator) -> &'static str {
        match op {
            BinaryOperator::Add => "add",
            BinaryOperator::Sub => "sub",
            BinaryOperator::Mul => "mul",
            BinaryOperator::Div => "div",
            BinaryOperator::Mod => "mod",
            BinaryOperator::Eq => "eq",
            BinaryOperator::Ne => "ne",
            BinaryOperator::Lt => "lt",
            BinaryOperator::Gt => "gt",
            BinaryOperator::Le => "le",
            BinaryOperator::Ge => "ge",
            BinaryOperator::And => "and",
            BinaryOperator::Or => "or",
        }
    }

    fn visit_binary_op(&mut self, ast: &mut Ast, id: NodeId) -> GenResult<()> {
        let Some((op, left, right)) =
            ast.node(id).as_binary_op().map(|b| (b.op, b.left, b.right))
        else {
            return Ok(());
        };

        self.visit(ast, left)?;
        self.visit(ast, right)?;
        self.load_if_needed(ast, left)?;
        self.load_if_needed(ast, right)?;

        let target = self.new_temp();
        let opcode = format!("{}_{}", Self::binary_opcode(op), Self::element_name(ast, left)?);
        let lhs = Self::gen_location(ast, left)?;
        let rhs = Self::gen_location(ast, right)?;

        self.emit(opcode, vec![lhs, rhs, target.clone()]);
        let _ = ast.node_mut(id).set_gen_location(target);

        Ok(())
    }

    fn visit_unary_op(&mut self, ast: &mut Ast, id: NodeId) -> GenResult<()> {
        let Some((op, expr)) = ast.node(id).as_unary_op().map(|u| (u.op, u.expr)) else {
            return Ok(());
        };

        self.visit(ast, expr)?;

        // The address the step operators store back into
        let source = Self::gen_location(ast, expr)?;

        match op {
            UnaryOperator::AddrOf => {
                // Address identity
                let _ = ast.node_mut(id).set_gen_location(source);
            }
            UnaryOperator::Deref => {
                let target = self.new_temp();
                let element = Self::element_name(ast, expr)?;

                self.emit(format!("load_{element}_*"), vec![source, target.clone()]);
                let _ = ast.node_mut(id).set_gen_location(target);
            }
            UnaryOperator::Plus => {
                self.load_if_needed(ast, expr)?;
                let value = Self::gen_location(ast, expr)?;
                let _ = ast.node_mut(id).set_gen_location(value);
            }
            UnaryOperator::Minus => {
                self.load_if_needed(ast, expr)?;
                let element = Self::element_name(ast, expr)?;

                let zero = self.new_temp();
                self.emit(format!("literal_{element}"), vec!["0".to_string(), zero.clone()]);

                let target = self.new_temp();
                let value = Self::gen_location(ast, expr)?;
                self.emit(format!("sub_{element}"), vec![zero, value, target.clone()]);

                let _ = ast.node_mut(id).set_gen_location(target);
            }
            UnaryOperator::Not => {
                self.load_if_needed(ast, expr)?;
                let element = Self::element_name(ast, expr)?;

                let target = self.new_temp();
                let value = Self::gen_location(ast, expr)?;
                self.emit(format!("not_{element}"), vec![value, target.clone()]);

                let _ = ast.node_mut(id).set_gen_location(target);
            }
            UnaryOperator::PreInc
            | UnaryOperator::PreDec
            | UnaryOperator::PostInc
            | UnaryOperator::PostDec => {
                self.load_if_needed(ast, expr)?;
                let element = Self::element_name(ast, expr)?;
                let value = Self::gen_location(ast, expr)?;

                let one = self.new_temp();
                self.emit("literal_int", vec!["1".to_string(), one.clone()]);

                let stem = if matches!(op, UnaryOperator::PreInc | UnaryOperator::PostInc) {
                    "add"
                } else {
                    "sub"
                };
                let updated = self.new_temp();
                self.emit(format!("{stem}_{element}"), vec![value.clone(), one, updated.clone()]);
                self.emit(format!("store_{element}"), vec![updated.clone(), source]);

                // Postfix keeps the pre-update value
                let result = if matches!(op, UnaryOperator::PostInc | UnaryOperator::PostDec) {
                    value
                } else {
                    updated
                };
                let _ = ast.node_mut(id).set_gen_location(result);
            }
        }

        Ok(())
    }

    fn visit_cast(&mut self, ast: &mut Ast, id: NodeId) -> GenResult<()> {
        let Some((to_type, expr)) = ast.node(id).as_cast().map(|c| (c.to_type, c.expr)) else {
            return Ok(());
        };

        self.visit(ast, expr)?;
        self.load_if_needed(ast, expr)?;

        let to_int = ast
            .node(to_type)
            .as_type_spec()
            .and_then(|t| t.ty.element())
            .is_some_and(|e| e == TypeName::Int);
        let opcode = if to_int { "fptosi" } else { "sitofp" };

        let value = Self::gen_location(ast, expr)?;
        let target = self.new_temp();
        self.emit(opcode, vec![value, target.clone()]);

        let _ = ast.node_mut(id).set_gen_location(target);

        Ok(())
    }

    fn visit_assignment(&mut self, ast: &mut Ast, id: NodeId) -> GenResult<()> {
        let Some((op, lvalue, rvalue)) =
            ast.node(id).as_assignment().map(|a| (a.op, a.lvalue, a.rvalue))
        else {
            return Ok(());
        };

        self.visit(ast, rvalue)?;
        self.load_if_needed(ast, rvalue)?;

        // Store through a dereferenced pointer: the target is the
        // operand's slot, the opcode carries the pointer suffix
        if let Some(unary) = ast.node(lvalue).as_unary_op()
            && unary.op == UnaryOperator::Deref
        {
            let pointee = unary.expr;
            self.visit(ast, pointee)?;

            let element = Self::element_name(ast, lvalue)?;
            let value = Self::gen_location(ast, rvalue)?;
            let slot = Self::gen_location(ast, pointee)?;
            self.emit(format!("store_{element}_*"), vec![value, slot]);

            return Ok(());
        }

        self.visit(ast, lvalue)?;

        if let Some(stem) = op.binary_op() {
            // Compound assignment expands to load, op, store on the
            // lvalue's address
            let element = Self::element_name(ast, lvalue)?.to_string();
            let suffix =
                if ast.node(lvalue).as_array_ref().is_some() { "_*" } else { "" };
            let slot = Self::gen_location(ast, lvalue)?;

            let current = self.new_temp();
            self.emit(format!("load_{element}{suffix}"), vec![slot.clone(), current.clone()]);

            let target = self.new_temp();
            let value = Self::gen_location(ast, rvalue)?;
            self.emit(
                format!("{}_{element}", Self::binary_opcode(stem)),
                vec![current, value, target.clone()],
            );

            self.emit(format!("store_{element}{suffix}"), vec![target, slot]);

            return Ok(());
        }

        let mut typename = Self::element_name(ast, lvalue)?.to_string();
        let value = Self::gen_location(ast, rvalue)?;
        let slot = Self::gen_location(ast, lvalue)?;

        if ast.node(lvalue).as_array_ref().is_some() {
            typename.push_str("_*");
        } else if let Some(ident) = ast.node(lvalue).as_ident() {
            let bind = ident.bind;
            let outer = ident.ty.as_ref().and_then(|ty| ty.outer());
            let kind = ident.kind;

            if bind.is_some_and(|b| ast.node(b).as_array_decl().is_some()) {
                let bind = bind.unwrap_or(lvalue);
                typename.push_str(&format!("_{}", Self::array_dim_value(ast, bind)?));
            } else if outer == Some(TypeName::Ptr) {
                // A bound function pointer records its slot for the
                // call-through-pointer lowering
                if kind == Some(SymbolKind::Func)
                    && let Some(bind) = bind
                    && let Some(func_decl) = Self::inner_of(ast, bind)
                    && let Some(node) = ast.node_mut(func_decl).as_func_decl_mut()
                {
                    node.gen_location = Some(slot.clone());
                }

                typename.push_str("_*");
                self.emit(format!("get_{typename}"), vec![value, slot]);

                return Ok(());
            }
        }

        self.emit(format!("store_{typename}"), vec![value, slot]);

        Ok(())
    }

    fn visit_func_call(&mut self, ast: &mut Ast, id: NodeId) -> GenResult<()> {
        let Some((name, args)) = ast.node(id).as_func_call().map(|f| (f.name, f.args)) else {
            return Ok(());
        };

        if let Some(args) = args {
            let exprs = match ast.node(args).as_expr_list() {
                Some(list) => list.exprs.clone(),
                None => vec![args],
            };

            // Evaluate every argument before any param is emitted
            let mut params = Vec::with_capacity(exprs.len());
            for expr in exprs {
                self.visit(ast, expr)?;
                self.load_if_needed(ast, expr)?;

                let element = Self::element_name(ast, expr)?;
                let value = Self::gen_location(ast, expr)?;
                params.push(Instr::new(format!("param_{element}"), vec![value]));
            }

            self.code.extend(params);
        }

        let bind = ast.node(name).as_ident().and_then(|i| i.bind);
        let through_pointer = bind.is_some_and(|b| ast.node(b).as_ptr_decl().is_some());

        if through_pointer {
            // Load the bound target out of the pointer's slot
            let slot = bind
                .and_then(|b| Self::inner_of(ast, b))
                .and_then(|f| ast.node(f).as_func_decl().and_then(|d| d.gen_location.clone()))
                .ok_or_else(|| CodegenError::internal("function pointer has no bound slot"))?;

            let element = Self::element_name(ast, id)?;
            let target = self.new_temp();
            self.emit(format!("load_{element}_*"), vec![slot, target.clone()]);

            let result = self.new_temp();
            self.emit("call", vec![target, result.clone()]);
            let _ = ast.node_mut(id).set_gen_location(result);
        } else {
            let result = self.new_temp();
            self.visit(ast, name)?;

            let callee = ast.node(name).as_ident().map(|i| i.name.clone()).unwrap_or_default();
            self.emit("call", vec![format!("@{callee}"), result.clone()]);
            let _ = ast.node_mut(id).set_gen_location(result);
        }

        Ok(())
    }

    fn visit_array_ref(&mut self, ast: &mut Ast, id: NodeId) -> GenResult<()> {
        let Some((name, subscript)) = ast.node(id).as_array_ref().map(|a| (a.name, a.subscript))
        else {
            return Ok(());
        };
        let element = Self::element_name(ast, id)?.to_string();

        self.visit(ast, subscript)?;

        if let Some(inner_sub) = ast.node(name).as_array_ref().map(|a| a.subscript) {
            // Two-dimensional access: flat index = outer * dim + inner
            let inner_name = ast
                .node(name)
                .as_array_ref()
                .map(|a| a.name)
                .ok_or_else(|| CodegenError::internal("nested array reference lost its base"))?;

            let bind = ast
                .node(inner_name)
                .as_ident()
                .and_then(|i| i.bind)
                .ok_or_else(|| CodegenError::internal("array reference base is unbound"))?;

            let row_decl = Self::inner_of(ast, bind)
                .filter(|&d| ast.node(d).as_array_decl().is_some())
                .ok_or_else(|| CodegenError::internal("array reference is not two-dimensional"))?;
            let dim = ast
                .node(row_decl)
                .as_array_decl()
                .and_then(|a| a.dim)
                .ok_or_else(|| CodegenError::internal("array dimension is missing"))?;

            self.visit(ast, inner_sub)?;
            self.visit(ast, dim)?;
            self.load_if_needed(ast, inner_sub)?;

            let scaled = self.new_temp();
            let dim_value = Self::gen_location(ast, dim)?;
            let outer_index = Self::gen_location(ast, inner_sub)?;
            self.emit(format!("mul_{element}"), vec![dim_value, outer_index, scaled.clone()]);

            self.load_if_needed(ast, subscript)?;
            let index = self.new_temp();
            let inner_index = Self::gen_location(ast, subscript)?;
            self.emit(format!("add_{element}"), vec![scaled, inner_index, index.clone()]);

            let base = Self::gen_location(ast, Self::leaf_ident(ast, bind)?)?;
            let target = self.new_temp();
            self.emit(format!("elem_{element}"), vec![base, index, target.clone()]);
            let _ = ast.node_mut(id).set_gen_location(target);

            return Ok(());
        }

        // One-dimensional access
        self.load_if_needed(ast, subscript)?;

        let bind = ast
            .node(name)
            .as_ident()
            .and_then(|i| i.bind)
            .ok_or_else(|| CodegenError::internal("array reference base is unbound"))?;

        let base = Self::gen_location(ast, Self::leaf_ident(ast, bind)?)?;
        let index = Self::gen_location(ast, subscript)?;
        let target = self.new_temp();
        self.emit(format!("elem_{element}"), vec![base, index, target.clone()]);
        let _ = ast.node_mut(id).set_gen_location(target);

        Ok(())
    }

    // ------------------------------------------------------------------
    // Statements
    // ------------------------------------------------------------------

    fn visit_if(&mut self, ast: &mut Ast, id: NodeId) -> GenResult<()> {
        let Some((cond, iftrue, iffalse)) =
            ast.node(id).as_if().map(|i| (i.cond, i.iftrue, i.iffalse))
        else {
            return Ok(());
        };

        let true_label = self.new_temp();
        let false_label = self.new_temp();
        let exit_label = self.new_temp();

        self.visit(ast, cond)?;
        let cond_value = Self::gen_location(ast, cond)?;
        self.emit("cbranch", vec![cond_value, true_label.clone(), false_label.clone()]);

        self.emit_label(&true_label);
        self.visit(ast, iftrue)?;

        if let Some(iffalse) = iffalse {
            self.emit("jump", vec![exit_label.clone()]);
            self.emit_label(&false_label);
            self.visit(ast, iffalse)?;
            self.emit_label(&exit_label);
        } else {
            self.emit_label(&false_label);
        }

        Ok(())
    }

    fn visit_while(&mut self, ast: &mut Ast, id: NodeId) -> GenResult<()> {
        let Some((cond, stmt)) = ast.node(id).as_while().map(|w| (w.cond, w.stmt)) else {
            return Ok(());
        };

        let entry_label = self.new_temp();
        let body_label = self.new_temp();
        let exit_label = self.new_temp();

        if let Some(node) = ast.node_mut(id).as_while_mut() {
            node.exit_label = Some(exit_label.clone());
        }

        self.emit_label(&entry_label);
        self.visit(ast, cond)?;
        let cond_value = Self::gen_location(ast, cond)?;
        self.emit("cbranch", vec![cond_value, body_label.clone(), exit_label.clone()]);

        self.emit_label(&body_label);
        self.visit(ast, stmt)?;
        self.emit("jump", vec![entry_label]);
        self.emit_label(&exit_label);

        Ok(())
    }

    fn visit_for(&mut self, ast: &mut Ast, id: NodeId) -> GenResult<()> {
        let Some((init, cond, next, stmt)) =
            ast.node(id).as_for().map(|f| (f.init, f.cond, f.next, f.stmt))
        else {
            return Ok(());
        };

        let entry_label = self.new_temp();
        let body_label = self.new_temp();
        let exit_label = self.new_temp();

        if let Some(node) = ast.node_mut(id).as_for_mut() {
            node.exit_label = Some(exit_label.clone());
        }

        if let Some(init) = init {
            self.visit(ast, init)?;
        }

        self.emit_label(&entry_label);
        let cond =
            cond.ok_or_else(|| CodegenError::internal("for statement has no condition"))?;
        self.visit(ast, cond)?;
        let cond_value = Self::gen_location(ast, cond)?;
        self.emit("cbranch", vec![cond_value, body_label.clone(), exit_label.clone()]);

        self.emit_label(&body_label);
        self.visit(ast, stmt)?;
        if let Some(next) = next {
            self.visit(ast, next)?;
        }
        self.emit("jump", vec![entry_label]);
        self.emit_label(&exit_label);

        Ok(())
    }

    fn visit_break(&mut self, ast: &mut Ast, id: NodeId) -> GenResult<()> {
        let bind = ast
            .node(id)
            .as_break()
            .and_then(|b| b.bind)
            .ok_or_else(|| CodegenError::internal("break is not bound to a loop"))?;

        let exit_label = match ast.node(bind) {
            AnyNode::While(node) => node.exit_label.clone(),
            AnyNode::For(node) => node.exit_label.clone(),
            _ => None,
        }
        .ok_or_else(|| CodegenError::internal("enclosing loop has no exit label"))?;

        self.emit("jump", vec![exit_label]);

        Ok(())
    }

    fn visit_return(&mut self, ast: &mut Ast, id: NodeId) -> GenResult<()> {
        let Some(expr) = ast.node(id).as_return().map(|r| r.expr) else {
            return Ok(());
        };

        if let Some(expr) = expr {
            self.visit(ast, expr)?;
            self.load_if_needed(ast, expr)?;

            let element = Self::element_name(ast, expr)?;
            let value = Self::gen_location(ast, expr)?;
            let ret_location = self.ret_location()?;
            self.emit(format!("store_{element}"), vec![value, ret_location]);
        }

        let ret_label = self.ret_label()?;
        self.emit("jump", vec![ret_label]);

        Ok(())
    }

    fn visit_assert(&mut self, ast: &mut Ast, id: NodeId) -> GenResult<()> {
        let Some(expr) = ast.node(id).as_assert().map(|a| a.expr) else {
            return Ok(());
        };

        self.visit(ast, expr)?;

        let true_label = self.new_temp();
        let false_label = self.new_temp();
        let exit_label = self.new_temp();

        let cond_value = Self::gen_location(ast, expr)?;
        self.emit("cbranch", vec![cond_value, true_label.clone(), false_label.clone()]);

        self.emit_label(&true_label);
        self.emit("jump", vec![exit_label.clone()]);
        self.emit_label(&false_label);

        let coord = ast.coord(expr);
        let message = format!("assertion_fail on {coord}");
        let target = self.new_text();
        self.text.push(Instr::new("global_string", vec![target.clone(), message]));

        self.emit("print_string", vec![target]);
        let ret_label = self.ret_label()?;
        self.emit("jump", vec![ret_label]);
        self.emit_label(&exit_label);

        Ok(())
    }

    fn visit_print(&mut self, ast: &mut Ast, id: NodeId) -> GenResult<()> {
        let Some(expr) = ast.node(id).as_print().map(|p| p.expr) else {
            return Ok(());
        };

        let Some(expr) = expr else {
            self.emit("print_void", Vec::new());
            return Ok(());
        };

        let exprs = match ast.node(expr).as_expr_list() {
            Some(list) => list.exprs.clone(),
            None => vec![expr],
        };

        for expr in exprs {
            self.visit(ast, expr)?;
            self.load_if_needed(ast, expr)?;

            let element = Self::element_name(ast, expr)?;
            let value = Self::gen_location(ast, expr)?;
            self.emit(format!("print_{element}"), vec![value]);
        }

        Ok(())
    }

    fn visit_read(&mut self, ast: &mut Ast, id: NodeId) -> GenResult<()> {
        let Some(expr) = ast.node(id).as_read().map(|r| r.expr) else {
            return Ok(());
        };

        let targets = match ast.node(expr).as_expr_list() {
            Some(list) => list.exprs.clone(),
            None => vec![expr],
        };

        for target in targets {
            self.visit(ast, target)?;
            self.read_location(ast, target)?;
        }

        Ok(())
    }

    /// Reads a value into a fresh temporary, then stores it into the
    /// target's address.
    fn read_location(&mut self, ast: &mut Ast, source: NodeId) -> GenResult<()> {
        let temp = self.new_temp();
        let mut typename = Self::element_name(ast, source)?.to_string();

        self.emit(format!("read_{typename}"), vec![temp.clone()]);

        if ast.node(source).as_array_ref().is_some() {
            typename.push_str("_*");
        }

        let slot = Self::gen_location(ast, source)?;
        self.emit(format!("store_{typename}"), vec![temp, slot]);

        Ok(())
    }
}
