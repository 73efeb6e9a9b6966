//! Parser for the Dream programming language
//!
//! Converts a token stream into an arena-owned AST rooted at a top-level `Block`, collecting syntax diagnostics
//! instead of stopping at the first error.
//!
//! ## Grammar overview
//!
//! Statements are parsed by recursive descent. Expressions use precedence climbing: the binary operator levels
//! (`||`, `&&`, equality, relational, additive, multiplicative) come from the `dream_core::lang::operators`
//! registry; assignment, `?:`, prefix operators and postfix forms have their own rules.
//!
//! ## Examples
//!
//! ```rust
//! use dream_syntax::parser::{self, ParseOptions};
//!
//! let out = parser::parse_source("func int add(int a, int b) { return a + b; }", &ParseOptions::default()).unwrap();
//! assert!(!out.has_errors());
//! assert_eq!(out.ast.child_count(out.root), 1);
//! ```

use la_arena::ArenaMap;

use crate::ast::*;
use crate::diagnostics::{Diagnostic, Diagnostics, FatalError, Stage};
use crate::lexer::{self, Token, TokenKind};
use dream_core::lang::keywords::{self, KeywordId};
use dream_core::lang::operators::{self, OperatorId};
use dream_core::lang::punctuation::PunctuationId;

// NOTE: This module is split across multiple files using `include!` to keep all parser
// methods in the same Rust module (preserving privacy + call patterns) while avoiding
// a single large source file.

include!("parser/core.rs");
include!("parser/helpers.rs");
include!("parser/decl.rs");
include!("parser/types.rs");
include!("parser/stmts.rs");
include!("parser/expr.rs");
include!("parser/api.rs");
include!("parser/tests.rs");
