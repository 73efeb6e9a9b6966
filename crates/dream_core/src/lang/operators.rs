//! Operator vocabulary.
//!
//! This module defines the canonical operator set along with precedence, associativity and fixity. The parser's
//! precedence-climbing loop reads [`OperatorInfo::precedence`] directly, so this table is the grammar's source of
//! truth for binary operator binding.
//!
//! ## Notes
//! - Lookup via [`from_str`] is **case-sensitive** and exact; the lexer performs maximal munch.
//! - Higher precedence binds tighter. Assignment and `?` are listed for completeness; they are parsed by
//!   dedicated rules rather than by the binary loop.
//! - `&` exists only so pointer syntax can be rejected with a precise diagnostic.
//!
//! ## Examples
//! ```rust
//! use dream_core::lang::operators::{self, OperatorId};
//!
//! assert_eq!(operators::from_str("+"), Some(OperatorId::Plus));
//! assert!(operators::binary_precedence(OperatorId::Star) > operators::binary_precedence(OperatorId::Plus));
//! ```

/// Define how operators associate when chained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Associativity {
    Left,
    Right,
}

/// Define where an operator appears relative to its operand(s).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Fixity {
    Infix,
    Prefix,
    /// Usable as prefix and postfix (`++`, `--`).
    Affix,
}

/// Stable identifier for every operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperatorId {
    // Arithmetic
    Plus,
    Minus,
    Star,
    Slash,
    Percent,

    // Comparison
    EqEq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,

    // Logical
    AndAnd,
    OrOr,
    Bang,

    // Assignment
    Eq,
    PlusEq,
    MinusEq,
    StarEq,
    SlashEq,
    PercentEq,

    // Increment / decrement
    PlusPlus,
    MinusMinus,

    // Conditional
    Question,

    // Address-of (rejected by the parser)
    Amp,
}

/// Metadata for an operator.
#[derive(Debug, Clone, Copy)]
pub struct OperatorInfo {
    pub id: OperatorId,
    pub spelling: &'static str,
    pub precedence: u8,
    pub associativity: Associativity,
    pub fixity: Fixity,
}

/// Precedence of assignment operators (lowest).
pub const ASSIGNMENT_PRECEDENCE: u8 = 1;
/// Precedence of the `?:` conditional.
pub const CONDITIONAL_PRECEDENCE: u8 = 2;
/// Precedence of prefix operators and casts.
pub const PREFIX_PRECEDENCE: u8 = 70;

/// Registry of all operators.
pub const OPERATORS: &[OperatorInfo] = &[
    // Arithmetic
    op(OperatorId::Plus, "+", 50, Associativity::Left, Fixity::Infix),
    op(OperatorId::Minus, "-", 50, Associativity::Left, Fixity::Infix),
    op(OperatorId::Star, "*", 60, Associativity::Left, Fixity::Infix),
    op(OperatorId::Slash, "/", 60, Associativity::Left, Fixity::Infix),
    op(OperatorId::Percent, "%", 60, Associativity::Left, Fixity::Infix),
    // Comparison
    op(OperatorId::EqEq, "==", 30, Associativity::Left, Fixity::Infix),
    op(OperatorId::NotEq, "!=", 30, Associativity::Left, Fixity::Infix),
    op(OperatorId::Lt, "<", 40, Associativity::Left, Fixity::Infix),
    op(OperatorId::LtEq, "<=", 40, Associativity::Left, Fixity::Infix),
    op(OperatorId::Gt, ">", 40, Associativity::Left, Fixity::Infix),
    op(OperatorId::GtEq, ">=", 40, Associativity::Left, Fixity::Infix),
    // Logical
    op(OperatorId::AndAnd, "&&", 20, Associativity::Left, Fixity::Infix),
    op(OperatorId::OrOr, "||", 10, Associativity::Left, Fixity::Infix),
    op(OperatorId::Bang, "!", PREFIX_PRECEDENCE, Associativity::Right, Fixity::Prefix),
    // Assignment
    op(OperatorId::Eq, "=", ASSIGNMENT_PRECEDENCE, Associativity::Right, Fixity::Infix),
    op(OperatorId::PlusEq, "+=", ASSIGNMENT_PRECEDENCE, Associativity::Right, Fixity::Infix),
    op(OperatorId::MinusEq, "-=", ASSIGNMENT_PRECEDENCE, Associativity::Right, Fixity::Infix),
    op(OperatorId::StarEq, "*=", ASSIGNMENT_PRECEDENCE, Associativity::Right, Fixity::Infix),
    op(OperatorId::SlashEq, "/=", ASSIGNMENT_PRECEDENCE, Associativity::Right, Fixity::Infix),
    op(OperatorId::PercentEq, "%=", ASSIGNMENT_PRECEDENCE, Associativity::Right, Fixity::Infix),
    // Increment / decrement
    op(OperatorId::PlusPlus, "++", PREFIX_PRECEDENCE, Associativity::Right, Fixity::Affix),
    op(OperatorId::MinusMinus, "--", PREFIX_PRECEDENCE, Associativity::Right, Fixity::Affix),
    // Conditional
    op(OperatorId::Question, "?", CONDITIONAL_PRECEDENCE, Associativity::Right, Fixity::Infix),
    // Address-of
    op(OperatorId::Amp, "&", PREFIX_PRECEDENCE, Associativity::Right, Fixity::Prefix),
];

pub fn info_for(id: OperatorId) -> &'static OperatorInfo {
    OPERATORS.iter().find(|o| o.id == id).expect("operator info missing")
}

/// Return the spelling of an operator.
pub fn as_str(id: OperatorId) -> &'static str {
    info_for(id).spelling
}

/// Look up an operator by its exact spelling.
pub fn from_str(spelling: &str) -> Option<OperatorId> {
    OPERATORS.iter().find(|o| o.spelling == spelling).map(|o| o.id)
}

/// Return the binding power of an operator handled by the binary precedence-climbing loop.
///
/// ## Returns
/// - `Some(precedence)` for `||`, `&&`, equality, relational, additive and multiplicative operators.
/// - `None` for assignment, `?`, and prefix/affix operators.
pub fn binary_precedence(id: OperatorId) -> Option<u8> {
    let info = info_for(id);
    match info.fixity {
        Fixity::Infix if info.precedence > CONDITIONAL_PRECEDENCE => Some(info.precedence),
        _ => None,
    }
}

/// Return `true` for `=` and the compound assignment operators.
pub fn is_assignment(id: OperatorId) -> bool {
    info_for(id).precedence == ASSIGNMENT_PRECEDENCE
}

// --- helpers -----------------------------------------------------------------

const fn op(
    id: OperatorId,
    spelling: &'static str,
    precedence: u8,
    associativity: Associativity,
    fixity: Fixity,
) -> OperatorInfo {
    OperatorInfo {
        id,
        spelling,
        precedence,
        associativity,
        fixity,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spellings_are_unique() {
        for (i, a) in OPERATORS.iter().enumerate() {
            for b in &OPERATORS[i + 1..] {
                assert_ne!(a.spelling, b.spelling);
            }
        }
    }

    #[test]
    fn precedence_ladder_matches_grammar() {
        let p = |s: &str| binary_precedence(from_str(s).unwrap()).unwrap();
        assert!(p("||") < p("&&"));
        assert!(p("&&") < p("=="));
        assert!(p("==") < p("<"));
        assert!(p("<") < p("+"));
        assert!(p("+") < p("*"));
        assert_eq!(p("*"), p("%"));
    }

    #[test]
    fn non_binary_operators_have_no_binary_precedence() {
        assert_eq!(binary_precedence(OperatorId::Eq), None);
        assert_eq!(binary_precedence(OperatorId::PlusEq), None);
        assert_eq!(binary_precedence(OperatorId::Question), None);
        assert_eq!(binary_precedence(OperatorId::Bang), None);
        assert!(is_assignment(OperatorId::PercentEq));
        assert!(!is_assignment(OperatorId::EqEq));
    }
}
