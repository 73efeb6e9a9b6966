//! Punctuation vocabulary.
//!
//! Delimiters and separators used by the lexer/parser. Vocabulary only: this module does not tokenize source text.
//!
//! ## Examples
//! ```rust
//! use dream_core::lang::punctuation::{self, PunctuationId};
//!
//! assert_eq!(punctuation::from_char(';'), Some(PunctuationId::Semicolon));
//! assert_eq!(punctuation::as_str(PunctuationId::LBrace), "{");
//! ```

/// Stable identifier for punctuation tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PunctuationId {
    // Separators
    Semicolon,
    Comma,
    Colon,

    // Access
    Dot,

    // Delimiters
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
}

/// Metadata for a punctuation token.
#[derive(Debug, Clone, Copy)]
pub struct PunctuationInfo {
    pub id: PunctuationId,
    pub canonical: &'static str,
}

/// Registry of all punctuation tokens.
pub const PUNCTUATION: &[PunctuationInfo] = &[
    info(PunctuationId::Semicolon, ";"),
    info(PunctuationId::Comma, ","),
    info(PunctuationId::Colon, ":"),
    info(PunctuationId::Dot, "."),
    info(PunctuationId::LParen, "("),
    info(PunctuationId::RParen, ")"),
    info(PunctuationId::LBracket, "["),
    info(PunctuationId::RBracket, "]"),
    info(PunctuationId::LBrace, "{"),
    info(PunctuationId::RBrace, "}"),
];

pub fn info_for(id: PunctuationId) -> &'static PunctuationInfo {
    PUNCTUATION.iter().find(|p| p.id == id).expect("punctuation info missing")
}

pub fn as_str(id: PunctuationId) -> &'static str {
    info_for(id).canonical
}

pub fn from_str(s: &str) -> Option<PunctuationId> {
    PUNCTUATION.iter().find(|p| p.canonical == s).map(|p| p.id)
}

/// Single-character lookup used by the lexer's hot path.
pub fn from_char(c: char) -> Option<PunctuationId> {
    let mut buf = [0u8; 4];
    from_str(c.encode_utf8(&mut buf))
}

const fn info(id: PunctuationId, canonical: &'static str) -> PunctuationInfo {
    PunctuationInfo { id, canonical }
}
