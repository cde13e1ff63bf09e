//! Arena storage for AST nodes.
//!
//! All nodes are stored in a single `Vec` and addressed by [`NodeId`].
//! Nodes are allocated by the parser and never removed; decoration passes
//! mutate them in place through [`Ast::node_mut`]. Back-references between
//! nodes are plain `NodeId`s, which keeps the tree acyclic from an ownership
//! point of view.

use ucc_source::Coord;

use crate::nodes::AnyNode;

/// A handle to a node in the AST arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    /// Returns the arena index of this node.
    #[must_use]
    pub const fn index(self) -> usize { self.0 as usize }
}

/// A stored node: its payload plus the source coordinate it was parsed at.
#[derive(Debug)]
pub struct Node {
    /// The node payload
    pub data: AnyNode,
    /// Source coordinate of the construct
    pub coord: Coord,
}

/// The AST arena.
#[derive(Debug, Default)]
pub struct Ast {
    nodes: Vec<Node>,
    root: Option<NodeId>,
}

impl Ast {
    /// Creates a new empty arena.
    #[must_use]
    pub const fn new() -> Self { Self { nodes: Vec::new(), root: None } }

    /// Allocates a node and returns its handle.
    pub fn alloc(&mut self, data: AnyNode, coord: Coord) -> NodeId {
        let id = NodeId(u32::try_from(self.nodes.len()).unwrap_or(u32::MAX));
        self.nodes.push(Node { data, coord });

        id
    }

    /// Sets the root node (the `Program`).
    pub const fn set_root(&mut self, root: NodeId) { self.root = Some(root); }

    /// Returns the root node, if the parser has set one.
    #[must_use]
    pub const fn root(&self) -> Option<NodeId> { self.root }

    /// Returns the number of allocated nodes.
    #[must_use]
    pub fn len(&self) -> usize { self.nodes.len() }

    /// Whether the arena is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool { self.nodes.is_empty() }

    /// Returns a node's payload.
    ///
    /// ## Panics
    ///
    /// Panics if the id was not produced by this arena. Ids are only created
    /// by [`Self::alloc`] and never invalidated, so this cannot happen for
    /// ids threaded through the pipeline.
    #[must_use]
    pub fn node(&self, id: NodeId) -> &AnyNode { &self.nodes[id.index()].data }

    /// Returns a mutable reference to a node's payload.
    ///
    /// ## Panics
    ///
    /// Panics if the id was not produced by this arena.
    pub fn node_mut(&mut self, id: NodeId) -> &mut AnyNode { &mut self.nodes[id.index()].data }

    /// Returns the source coordinate a node was parsed at.
    ///
    /// ## Panics
    ///
    /// Panics if the id was not produced by this arena.
    #[must_use]
    pub fn coord(&self, id: NodeId) -> Coord { self.nodes[id.index()].coord }

    /// Visits `id` and all nodes reachable from it in pre-order.
    pub fn walk_pre_order<F>(&self, id: NodeId, visit: &mut F)
    where F: FnMut(NodeId) {
        visit(id);

        for child in self.node(id).children() {
            self.walk_pre_order(child, visit);
        }
    }

    /// Collects all nodes reachable from `id` in pre-order.
    #[must_use]
    pub fn collect_pre_order(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        self.walk_pre_order(id, &mut |node| out.push(node));

        out
    }
}
