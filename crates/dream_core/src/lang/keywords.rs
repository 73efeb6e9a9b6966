//! Define the reserved keyword vocabulary for the Dream language.
//!
//! This module is the single source of truth for reserved words: a stable identifier ([`KeywordId`]) plus a const
//! metadata table ([`KEYWORDS`]) that records canonical spellings and categories.
//!
//! ## Notes
//! - Lookup via [`from_str`] is **case-sensitive**.
//! - Type names (`int`, `string`, ...) are keywords too; [`is_type_name`] tells them apart.
//! - `class` is reserved so the parser can reject it with a targeted diagnostic.
//!
//! ## Examples
//! ```rust
//! use dream_core::lang::keywords::{self, KeywordId};
//!
//! assert_eq!(keywords::from_str("func"), Some(KeywordId::Func));
//! assert_eq!(keywords::as_str(KeywordId::Func), "func");
//! assert!(keywords::is_type_name(KeywordId::Int));
//! ```

/// Stable identifier for every reserved keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeywordId {
    // Control flow / statements
    If,
    Else,
    While,
    Do,
    For,
    Switch,
    Case,
    Default,
    Break,
    Continue,
    Return,
    Try,
    Catch,
    Throw,

    // Declarations
    Func,
    Struct,
    Enum,
    Const,
    Class,

    // Builtin type names
    Int,
    Float,
    Bool,
    Char,
    String,
    Void,

    // Literals
    True,
    False,
    Null,
}

/// High-level grouping for documentation and tooling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeywordCategory {
    ControlFlow,
    Definition,
    Type,
    Literal,
}

/// Metadata for a keyword.
#[derive(Debug, Clone, Copy)]
pub struct KeywordInfo {
    pub id: KeywordId,
    pub canonical: &'static str,
    pub category: KeywordCategory,
    /// Whether the keyword may start a statement (used by parser resynchronization).
    pub starts_statement: bool,
}

/// Registry of all keywords.
///
/// ## Notes
/// - The ordering is not semantically meaningful, but is grouped for readability.
pub const KEYWORDS: &[KeywordInfo] = &[
    // Control flow / statements
    info(KeywordId::If, "if", KeywordCategory::ControlFlow, true),
    info(KeywordId::Else, "else", KeywordCategory::ControlFlow, false),
    info(KeywordId::While, "while", KeywordCategory::ControlFlow, true),
    info(KeywordId::Do, "do", KeywordCategory::ControlFlow, true),
    info(KeywordId::For, "for", KeywordCategory::ControlFlow, true),
    info(KeywordId::Switch, "switch", KeywordCategory::ControlFlow, true),
    info(KeywordId::Case, "case", KeywordCategory::ControlFlow, true),
    info(KeywordId::Default, "default", KeywordCategory::ControlFlow, true),
    info(KeywordId::Break, "break", KeywordCategory::ControlFlow, true),
    info(KeywordId::Continue, "continue", KeywordCategory::ControlFlow, true),
    info(KeywordId::Return, "return", KeywordCategory::ControlFlow, true),
    info(KeywordId::Try, "try", KeywordCategory::ControlFlow, true),
    info(KeywordId::Catch, "catch", KeywordCategory::ControlFlow, false),
    info(KeywordId::Throw, "throw", KeywordCategory::ControlFlow, true),
    // Declarations
    info(KeywordId::Func, "func", KeywordCategory::Definition, true),
    info(KeywordId::Struct, "struct", KeywordCategory::Definition, true),
    info(KeywordId::Enum, "enum", KeywordCategory::Definition, true),
    info(KeywordId::Const, "const", KeywordCategory::Definition, true),
    info(KeywordId::Class, "class", KeywordCategory::Definition, true),
    // Builtin type names
    info(KeywordId::Int, "int", KeywordCategory::Type, true),
    info(KeywordId::Float, "float", KeywordCategory::Type, true),
    info(KeywordId::Bool, "bool", KeywordCategory::Type, true),
    info(KeywordId::Char, "char", KeywordCategory::Type, true),
    info(KeywordId::String, "string", KeywordCategory::Type, true),
    info(KeywordId::Void, "void", KeywordCategory::Type, true),
    // Literals
    info(KeywordId::True, "true", KeywordCategory::Literal, false),
    info(KeywordId::False, "false", KeywordCategory::Literal, false),
    info(KeywordId::Null, "null", KeywordCategory::Literal, false),
];

/// Return the canonical spelling for a keyword.
pub fn as_str(id: KeywordId) -> &'static str {
    info_for(id).canonical
}

pub fn category(id: KeywordId) -> KeywordCategory {
    info_for(id).category
}

/// Return `true` for builtin type names such as `int` and `string`.
pub fn is_type_name(id: KeywordId) -> bool {
    category(id) == KeywordCategory::Type
}

/// Return `true` if the keyword begins a statement at brace depth zero.
pub fn starts_statement(id: KeywordId) -> bool {
    info_for(id).starts_statement
}

pub fn info_for(id: KeywordId) -> &'static KeywordInfo {
    KEYWORDS.iter().find(|k| k.id == id).expect("keyword info missing")
}

/// Look up a keyword by its exact spelling.
pub fn from_str(s: &str) -> Option<KeywordId> {
    KEYWORDS.iter().find(|k| k.canonical == s).map(|k| k.id)
}

// --- helpers -----------------------------------------------------------------

const fn info(id: KeywordId, canonical: &'static str, category: KeywordCategory, starts_statement: bool) -> KeywordInfo {
    KeywordInfo {
        id,
        canonical,
        category,
        starts_statement,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_keyword_round_trips_through_its_spelling() {
        for k in KEYWORDS {
            assert_eq!(from_str(k.canonical), Some(k.id), "{}", k.canonical);
        }
    }

    #[test]
    fn lookup_is_case_sensitive() {
        assert_eq!(from_str("While"), None);
        assert_eq!(from_str("Console"), None);
    }

    #[test]
    fn type_names_are_classified() {
        assert!(is_type_name(KeywordId::String));
        assert!(!is_type_name(KeywordId::Struct));
        assert!(starts_statement(KeywordId::Return));
        assert!(!starts_statement(KeywordId::Else));
    }
}
