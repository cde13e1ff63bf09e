//! Intermediate-code generation for the uC compiler.
//!
//! The final pass of the pipeline: a tree walk over the decorated AST that
//! emits a flat sequence of three-address instructions ([`instr::Instr`]).
//! Function bodies are lowered in phases (parameter allocation, parameter
//! initialization, local allocation, body emission) so that every `alloc`
//! precedes any `store` and every function has a single labeled exit.
//!
//! This crate also hosts the front-end facade: [`compile`] runs the whole
//! pipeline over a source text and returns either the IR list or the first
//! diagnostic, wrapped in [`error::CompileError`]. The core never touches
//! the filesystem.

pub mod error;
pub mod generator;
pub mod instr;

use log::debug;

pub use error::{CodegenError, CompileError};
pub use generator::generate;
pub use instr::Instr;

/// Compiles a source text to its IR instruction list.
///
/// Runs lexing, parsing, semantic analysis, and code generation in order;
/// each pass fully consumes its input before the next begins.
///
/// ## Errors
///
/// Returns the first diagnostic of whichever pass fails.
pub fn compile(source: &str) -> Result<Vec<Instr>, CompileError> {
    let mut ast = ucc_parser::parse(source)?;
    debug!("parsed {} nodes", ast.len());

    ucc_analyzer::analyze(&mut ast)?;
    debug!("semantic analysis complete");

    let instrs = generator::generate(&mut ast)?;
    debug!("generated {} instructions", instrs.len());

    Ok(instrs)
}
