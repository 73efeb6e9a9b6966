//! Token types for the Dream lexer.
//!
//! The lexer uses **registry-backed IDs** for language vocabulary:
//! - `Keyword(KeywordId)` for reserved words
//! - `Operator(OperatorId)` for operators
//! - `Punctuation(PunctuationId)` for punctuation tokens
//!
//! ## Notes
//! - Numeric literals keep their raw text; range checks belong to semantic analysis.
//! - `Error` carries the lexer's message and ends the token stream (the next token is `Eof`).

use crate::ast::{Pos, Span};
use dream_core::lang::keywords::{self, KeywordId};
use dream_core::lang::operators::{self, OperatorId};
use dream_core::lang::punctuation::{self, PunctuationId};

// ============================================================================
// TOKEN TYPES
// ============================================================================

/// Kind of token produced by the lexer.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // ========== Keyword / operator / punctuation (ID-based) ==========
    Keyword(KeywordId),
    Operator(OperatorId),
    Punctuation(PunctuationId),

    // ========== Identifiers and Literals ==========
    Ident(String),
    Int(String),
    Float(String),
    Char(char),
    Str(String),

    // ========== Special ==========
    Error(String),
    Eof,
}

impl TokenKind {
    /// Stable, upper-case name of the token kind (`INT_LITERAL`, `KEYWORD`, ...).
    pub fn name(&self) -> &'static str {
        match self {
            TokenKind::Keyword(_) => "KEYWORD",
            TokenKind::Operator(_) => "OPERATOR",
            TokenKind::Punctuation(_) => "PUNCTUATION",
            TokenKind::Ident(_) => "IDENTIFIER",
            TokenKind::Int(_) => "INT_LITERAL",
            TokenKind::Float(_) => "FLOAT_LITERAL",
            TokenKind::Char(_) => "CHAR_LITERAL",
            TokenKind::Str(_) => "STRING_LITERAL",
            TokenKind::Error(_) => "ERROR",
            TokenKind::Eof => "EOF",
        }
    }

    /// Human-readable description used in "found ..." diagnostics.
    pub fn describe(&self) -> String {
        match self {
            TokenKind::Keyword(k) => format!("'{}'", keywords::as_str(*k)),
            TokenKind::Operator(o) => format!("'{}'", operators::as_str(*o)),
            TokenKind::Punctuation(p) => format!("'{}'", punctuation::as_str(*p)),
            TokenKind::Ident(name) => format!("identifier '{name}'"),
            TokenKind::Int(raw) | TokenKind::Float(raw) => format!("'{raw}'"),
            TokenKind::Char(_) => "character literal".to_string(),
            TokenKind::Str(_) => "string literal".to_string(),
            TokenKind::Error(_) => "invalid token".to_string(),
            TokenKind::Eof => "end of file".to_string(),
        }
    }

    pub fn keyword_id(&self) -> Option<KeywordId> {
        match self {
            TokenKind::Keyword(id) => Some(*id),
            _ => None,
        }
    }

    pub fn is_keyword(&self, id: KeywordId) -> bool {
        matches!(self, TokenKind::Keyword(k) if *k == id)
    }

    pub fn operator_id(&self) -> Option<OperatorId> {
        match self {
            TokenKind::Operator(id) => Some(*id),
            _ => None,
        }
    }

    pub fn is_operator(&self, id: OperatorId) -> bool {
        matches!(self, TokenKind::Operator(o) if *o == id)
    }

    pub fn is_punctuation(&self, id: PunctuationId) -> bool {
        matches!(self, TokenKind::Punctuation(p) if *p == id)
    }

    /// `Eof` or `Error`: nothing meaningful follows.
    pub fn is_terminal(&self) -> bool {
        matches!(self, TokenKind::Eof | TokenKind::Error(_))
    }
}

/// A token with its kind, byte span and line/column position.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
    pub pos: Pos,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span, pos: Pos) -> Self {
        Self { kind, span, pos }
    }

    /// Length of the token's source text in bytes.
    pub fn len(&self) -> usize {
        self.span.len()
    }

    pub fn is_empty(&self) -> bool {
        self.span.is_empty()
    }
}

/// Resolve an identifier spelling to a keyword id, if reserved.
pub fn keyword_id(name: &str) -> Option<KeywordId> {
    keywords::from_str(name)
}
