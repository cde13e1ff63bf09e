//! Source text handling and position tracking for the uC compiler.
//!
//! This crate provides the fundamental types for working with source code in
//! the compiler pipeline: byte spans, 1-based line/column coordinates, and a
//! source wrapper with an offset-to-coordinate index.
//!
//! Every diagnostic the compiler emits is anchored to a [`types::Coord`], so
//! the whole pipeline depends on this crate for location tracking.

pub mod types;

pub use types::{Coord, Source, Span};
