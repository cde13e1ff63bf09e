//! Abstract Syntax Tree for the uC compiler.
//!
//! This crate defines the tree the parser produces and the later passes
//! decorate:
//!
//! - [`arena`]: arena storage for nodes, addressed by [`arena::NodeId`]
//! - [`nodes`]: one struct per node kind, wrapped in [`nodes::AnyNode`]
//! - [`types`]: the eight type singletons and resolved type stacks
//! - [`operators`]: unary, binary, and assignment operator enums
//!
//! Nodes live for the entire compilation and are mutated in place exactly
//! twice: the semantic pass fills `ty`/`scope`/`kind`/`bind`, and code
//! generation fills `gen_location`/`exit_label`. Back-references (an
//! identifier to its declarator, a `break` to its enclosing loop) are plain
//! [`arena::NodeId`]s, so the tree never owns a cycle.

pub mod arena;
pub mod nodes;
pub mod operators;
pub mod types;

pub use arena::{Ast, Node, NodeId};
pub use nodes::AnyNode;
pub use types::{SymbolKind, Ty, TypeName};
