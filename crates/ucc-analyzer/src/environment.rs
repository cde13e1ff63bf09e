//! The scope environment threaded through semantic analysis.
//!
//! A stack of frames, each mapping an identifier to the `Ident` node that
//! declared it. Lookup walks the stack top-down; insertion targets the top
//! frame. Alongside the frames the environment carries a stack of current
//! return-type lists (one entry per pushed scope, changed only by function
//! scopes) and a stack of enclosing loop nodes for `break` binding.

use rustc_hash::FxHashMap;
use ucc_ast::arena::NodeId;
use ucc_ast::types::TypeName;

/// The scope environment.
#[derive(Debug)]
pub struct Environment {
    /// Scope frames, innermost last
    stack: Vec<FxHashMap<String, NodeId>>,
    /// Saved return-type lists, one per pushed scope
    rtypes: Vec<Vec<TypeName>>,
    /// The active function's return-type list
    cur_rtype: Vec<TypeName>,
    /// Enclosing loop nodes, innermost last
    loops: Vec<NodeId>,
}

impl Default for Environment {
    fn default() -> Self { Self::new() }
}

impl Environment {
    /// Creates an empty environment. The global frame is pushed when the
    /// `Program` node is visited, so global declarations land at scope
    /// depth 1.
    #[must_use]
    pub fn new() -> Self {
        Self {
            stack: Vec::new(),
            rtypes: Vec::new(),
            cur_rtype: vec![TypeName::Void],
            loops: Vec::new(),
        }
    }

    /// Pushes a scope frame. Function scopes pass their declared
    /// return-type list; other scopes keep the enclosing one.
    pub fn push_scope(&mut self, rtype: Option<Vec<TypeName>>) {
        self.stack.push(FxHashMap::default());
        self.rtypes.push(self.cur_rtype.clone());

        if let Some(rtype) = rtype {
            self.cur_rtype = rtype;
        }
    }

    /// Pops the top scope frame, restoring the saved return-type list.
    pub fn pop_scope(&mut self) {
        let _ = self.stack.pop();

        if let Some(rtype) = self.rtypes.pop() {
            self.cur_rtype = rtype;
        }
    }

    /// The current scope depth (1 = global).
    #[must_use]
    pub fn scope_level(&self) -> usize { self.stack.len() }

    /// Looks a name up, walking the frames innermost-first.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<NodeId> {
        self.stack.iter().rev().find_map(|frame| frame.get(name).copied())
    }

    /// Whether the top frame already binds the name.
    #[must_use]
    pub fn find_local(&self, name: &str) -> bool {
        self.stack.last().is_some_and(|frame| frame.contains_key(name))
    }

    /// Binds a name to its declaring `Ident` node in the top frame.
    pub fn add_local(&mut self, name: String, ident: NodeId) {
        if let Some(frame) = self.stack.last_mut() {
            let _ = frame.insert(name, ident);
        }
    }

    /// The active function's return-type list.
    #[must_use]
    pub fn cur_rtype(&self) -> &[TypeName] { &self.cur_rtype }

    /// Enters a loop for `break` binding.
    pub fn push_loop(&mut self, node: NodeId) { self.loops.push(node); }

    /// Leaves the innermost loop.
    pub fn pop_loop(&mut self) { let _ = self.loops.pop(); }

    /// The innermost enclosing loop, if any.
    #[must_use]
    pub fn current_loop(&self) -> Option<NodeId> { self.loops.last().copied() }
}
