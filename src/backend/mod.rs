//! Dream Compiler Backend
//!
//! This module turns an analyzed AST into a C translation unit and drives the host C toolchain.
//!
//! The pipeline is:
//! 1. Analyzed (and optimized) AST → [`codegen::generate`] → C source
//! 2. Write the C source next to `dream_runtime.h`
//! 3. Invoke the C compiler and, for `run`, the produced executable
//!
//! ## Module Organization
//!
//! - `codegen/` - Code generation from AST to C
//!   - `mod.rs` - Generator state and entry point
//!   - `decls.rs` - Enums, structs, globals, prototypes and function definitions
//!   - `stmts.rs` - Statement emission, including `try` frames
//!   - `exprs.rs` - Expression emission and left-to-right sequencing
//! - `c_emitter.rs` - Low-level C code string builder
//! - `names.rs` - Identifier mangling
//! - `toolchain.rs` - Compiling and running generated C
//! - `runtime/dream_runtime.h` - Header-only runtime the generated code includes

#![deny(clippy::unwrap_used)]

pub mod c_emitter;
pub mod codegen;
pub mod names;
pub mod toolchain;

use thiserror::Error;

use crate::frontend::ast::Pos;

pub use codegen::generate;
pub use toolchain::{BuildResult, RunResult, Toolchain};

/// Source of the runtime header, written next to every generated C file.
pub const RUNTIME_HEADER: &str = include_str!("runtime/dream_runtime.h");

/// File name the generated code includes.
pub const RUNTIME_HEADER_NAME: &str = "dream_runtime.h";

/// Failure to lower an AST to C.
///
/// The analyzer rejects everything the generator cannot express, so these indicate an AST that skipped analysis or
/// still carries error placeholders.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodegenError {
    #[error("{pos}: cannot generate code for {what}")]
    Unsupported { what: String, pos: Pos },
    #[error("{pos}: {what} has no resolved type")]
    Untyped { what: String, pos: Pos },
}
