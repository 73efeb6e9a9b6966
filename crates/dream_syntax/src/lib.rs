//! Syntax frontend for the Dream language: lexer, parser, AST, diagnostics.
//!
//! ## Notes
//! - This crate is "syntax-only": it does not resolve names or check types. The root `dream` crate owns those
//!   passes and mutates the AST produced here in place.
//! - Vocabulary identity (keywords/operators/punctuation) comes from `dream_core::lang` registries.
//!
//! ## Examples
//! ```rust
//! use dream_syntax::ast::NodeKind;
//! use dream_syntax::parser::{self, ParseOptions};
//!
//! let out = parser::parse_source("int x = 1;", &ParseOptions::default()).unwrap();
//! assert!(!out.has_errors());
//! let decl = out.ast.child(out.root, 0).unwrap();
//! assert!(matches!(out.ast.kind(decl), NodeKind::VarDecl(_)));
//! ```

#![forbid(unsafe_code)]

pub mod ast;
pub mod diagnostics;
pub mod lexer;
pub mod parser;
pub mod stack;
