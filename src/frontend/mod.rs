//! Dream compiler frontend
//!
//! Lexing and parsing live in the shared `dream_syntax` crate and are re-exported here; this module adds the
//! symbol table and the semantic analyzer.
//!
//! ## Modules
//!
//! - `symbols` - Scope chain and symbol definitions
//! - `analyzer` - Name resolution, type checking and declaration validation
//! - `errors` - Catalog of semantic diagnostics

pub mod analyzer;
pub mod errors;
pub mod symbols;

pub use dream_syntax::{ast, diagnostics, lexer, parser, stack};
