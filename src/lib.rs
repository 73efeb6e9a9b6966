#![forbid(unsafe_code)]
//! Dream Programming Language Compiler
//!
//! Dream is a small imperative language with C-like syntax. This crate provides the compiler pipeline on top of the
//! shared syntax frontend: semantic analysis, the optimizer, and the C backend, plus the embedding API and the CLI.
//!
//! ## Pipeline
//!
//! source → lexer → parser → [`frontend::analyzer`] → [`optimizer`] → [`backend`] → C source → C toolchain
//!
//! Diagnostics accumulate across the lexer, parser and analyzer; the optimizer and code generator only run on
//! programs without errors.
//!
//! ## Panic Policy
//!
//! This codebase follows explicit error handling:
//!
//! - **Production code**: Use `Result` or `Option` with `?` / `ok_or` / `map_err`. The `cli` and `backend` modules
//!   enforce `#![deny(clippy::unwrap_used)]`.
//!
//! - **Test code**: `.unwrap()` and `.expect()` are acceptable in tests.
//!
//! - **True invariants**: If a panic represents a compiler bug (logic error), use `.expect("INVARIANT: reason")` with a
//!   clear explanation.

pub mod api;
pub mod backend;
pub mod cli;
pub mod config;
pub mod error;
pub mod frontend;
pub mod optimizer;
pub mod version;

pub use frontend::ast;
pub use frontend::diagnostics;
pub use frontend::lexer;
pub use frontend::parser;
pub use frontend::symbols;

pub use api::{CompileOutput, RunOutput, Status, compile_string, run_string};
pub use config::CompilerConfig;
pub use error::DreamError;
