//! Lexer for the Dream programming language
//!
//! Handles tokenization including:
//! - Keywords (func, struct, enum, switch, try, ...) and identifiers (non-ASCII allowed)
//! - Integer, float, string and character literals
//! - Operators with maximal munch (`==` over `=`, `++` over `+`, ...)
//! - `//` line comments and `/* */` block comments
//!
//! The lexer is a lazy, restartable iterator: it yields tokens on demand, exactly one `Eof` at the end, and an
//! `Error` token (followed by `Eof`) when it meets something it cannot tokenize.
//!
//! ## Module Structure
//!
//! - `tokens` - Token types (TokenKind, Token)
//! - `strings` - String and character literal scanning
//! - `numbers` - Numeric literal scanning

mod numbers;
mod strings;
pub mod tokens;

pub use tokens::{Token, TokenKind, keyword_id};

use crate::ast::{Pos, Span};
use crate::diagnostics::{Diagnostic, Diagnostics, Stage};
use dream_core::lang::operators::OperatorId;
use dream_core::lang::punctuation;

// ============================================================================
// LEXER STATE
// ----------------------------------------------------------------------------
// [Scanning] --Error token--> [Halted] --next--> Eof (repeated)
//     |                                            ^
//     +--------------- end of input --------------+
// ============================================================================

/// Lexer for Dream source code.
pub struct Lexer<'a> {
    source: &'a str,
    offset: usize,
    line: u32,
    col: u32,
    /// Byte offset of the first invalid UTF-8 byte (only for [`Lexer::from_bytes`]).
    invalid_at: Option<usize>,
    halted: bool,
    eof_emitted: bool,
}

impl<'a> Lexer<'a> {
    /// Create a new lexer for the given source code.
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            offset: 0,
            line: 1,
            col: 1,
            invalid_at: None,
            halted: false,
            eof_emitted: false,
        }
    }

    /// Create a lexer over raw bytes.
    ///
    /// The valid UTF-8 prefix is tokenized normally; an `Error` token is produced where the first invalid byte
    /// sequence starts.
    pub fn from_bytes(bytes: &'a [u8]) -> Self {
        match std::str::from_utf8(bytes) {
            Ok(source) => Self::new(source),
            Err(e) => {
                let valid = std::str::from_utf8(&bytes[..e.valid_up_to()]).unwrap_or_default();
                let mut lexer = Self::new(valid);
                lexer.invalid_at = Some(e.valid_up_to());
                lexer
            }
        }
    }

    /// Restart tokenization from the beginning of the input.
    pub fn rewind(&mut self) {
        self.offset = 0;
        self.line = 1;
        self.col = 1;
        self.halted = false;
        self.eof_emitted = false;
    }

    /// Produce the next token. After the end of input (or an `Error` token) this keeps returning `Eof`.
    pub fn next_token(&mut self) -> Token {
        if self.halted {
            return self.eof();
        }
        if let Some(error) = self.skip_trivia() {
            self.halted = true;
            return error;
        }

        let start = self.offset;
        let pos = self.here();

        let Some(c) = self.advance() else {
            self.halted = true;
            if let Some(at) = self.invalid_at {
                return Token::new(
                    TokenKind::Error("invalid UTF-8 byte sequence".to_string()),
                    Span::new(at, at + 1),
                    pos,
                );
            }
            return self.eof();
        };

        let kind = self.scan_token(start, c);
        if matches!(kind, TokenKind::Error(_)) {
            self.halted = true;
        }
        Token::new(kind, Span::new(start, self.offset), pos)
    }

    // ========================================================================
    // Core character handling
    // ========================================================================

    fn here(&self) -> Pos {
        Pos::new(self.line, self.col)
    }

    fn eof(&self) -> Token {
        Token::new(TokenKind::Eof, Span::new(self.offset, self.offset), self.here())
    }

    fn peek(&self) -> Option<char> {
        self.source[self.offset..].chars().next()
    }

    fn peek_next(&self) -> Option<char> {
        let mut iter = self.source[self.offset..].chars();
        iter.next(); // skip current
        iter.next()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.offset += c.len_utf8();
        if c == '\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        Some(c)
    }

    fn match_char(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Skip whitespace and comments. Returns an `Error` token for an unterminated block comment.
    fn skip_trivia(&mut self) -> Option<Token> {
        loop {
            match self.peek() {
                Some(c) if c.is_whitespace() => {
                    self.advance();
                }
                Some('/') if self.peek_next() == Some('/') => {
                    while let Some(c) = self.peek() {
                        if c == '\n' {
                            break;
                        }
                        self.advance();
                    }
                }
                Some('/') if self.peek_next() == Some('*') => {
                    let start = self.offset;
                    let pos = self.here();
                    self.advance();
                    self.advance();
                    loop {
                        match self.advance() {
                            None => {
                                return Some(Token::new(
                                    TokenKind::Error("unterminated block comment".to_string()),
                                    Span::new(start, self.offset),
                                    pos,
                                ));
                            }
                            Some('*') if self.match_char('/') => break,
                            Some(_) => {}
                        }
                    }
                }
                _ => return None,
            }
        }
    }

    // ========================================================================
    // Main scanning dispatch
    // ========================================================================

    fn scan_token(&mut self, start: usize, c: char) -> TokenKind {
        match c {
            // Operators
            '+' => self.operator(OperatorId::Plus, &[('+', OperatorId::PlusPlus), ('=', OperatorId::PlusEq)]),
            '-' => self.operator(
                OperatorId::Minus,
                &[('-', OperatorId::MinusMinus), ('=', OperatorId::MinusEq)],
            ),
            '*' => self.operator(OperatorId::Star, &[('=', OperatorId::StarEq)]),
            '/' => self.operator(OperatorId::Slash, &[('=', OperatorId::SlashEq)]),
            '%' => self.operator(OperatorId::Percent, &[('=', OperatorId::PercentEq)]),
            '=' => self.operator(OperatorId::Eq, &[('=', OperatorId::EqEq)]),
            '!' => self.operator(OperatorId::Bang, &[('=', OperatorId::NotEq)]),
            '<' => self.operator(OperatorId::Lt, &[('=', OperatorId::LtEq)]),
            '>' => self.operator(OperatorId::Gt, &[('=', OperatorId::GtEq)]),
            '&' => self.operator(OperatorId::Amp, &[('&', OperatorId::AndAnd)]),
            '?' => TokenKind::Operator(OperatorId::Question),
            '|' => {
                if self.match_char('|') {
                    TokenKind::Operator(OperatorId::OrOr)
                } else {
                    TokenKind::Error("unexpected character '|'".to_string())
                }
            }

            // Literals
            '"' => self.scan_string(),
            '\'' => self.scan_char(),
            '0'..='9' => self.scan_number(start),

            // Identifiers and keywords
            _ if is_ident_start(c) => self.scan_identifier(start),

            // Punctuation
            _ => match punctuation::from_char(c) {
                Some(id) => TokenKind::Punctuation(id),
                None => TokenKind::Error(format!("unexpected character '{}'", c.escape_default())),
            },
        }
    }

    // ========================================================================
    // Operator helpers
    // ========================================================================

    /// Try to match compound operator, fallback to simple.
    fn operator(&mut self, simple: OperatorId, compounds: &[(char, OperatorId)]) -> TokenKind {
        for (c, id) in compounds {
            if self.match_char(*c) {
                return TokenKind::Operator(*id);
            }
        }
        TokenKind::Operator(simple)
    }

    // ========================================================================
    // Identifier scanning
    // ========================================================================

    fn scan_identifier(&mut self, start: usize) -> TokenKind {
        while let Some(c) = self.peek() {
            if is_ident_continue(c) {
                self.advance();
            } else {
                break;
            }
        }

        let spelling = &self.source[start..self.offset];

        // Look up identifier spelling in the reserved-word registry (no allocation for keywords).
        match keyword_id(spelling) {
            Some(id) => TokenKind::Keyword(id),
            None => TokenKind::Ident(spelling.to_string()),
        }
    }
}

impl Iterator for Lexer<'_> {
    type Item = Token;

    /// Yields every token up to and including the single `Eof`, then `None`.
    fn next(&mut self) -> Option<Token> {
        if self.eof_emitted {
            return None;
        }
        let token = self.next_token();
        if token.kind == TokenKind::Eof {
            self.eof_emitted = true;
        }
        Some(token)
    }
}

// ============================================================================
// Helper functions
// ============================================================================

/// Check if a character can start an identifier. Any non-ASCII code point is accepted.
fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || !c.is_ascii()
}

fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || !c.is_ascii()
}

/// Lex a whole source string. The result always ends with `Eof`.
#[tracing::instrument(skip_all, fields(source_len = source.len()))]
pub fn lex(source: &str) -> Vec<Token> {
    Lexer::new(source).collect()
}

/// Lex a source string and report any `Error` token to the sink.
pub fn lex_into(source: &str, diagnostics: &mut Diagnostics) -> Vec<Token> {
    let tokens = lex(source);
    for token in &tokens {
        if let TokenKind::Error(message) = &token.kind {
            diagnostics.push(Diagnostic::error(Stage::Lexer, message.clone(), token.span, token.pos));
        }
    }
    tokens
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use dream_core::lang::keywords::KeywordId;
    use dream_core::lang::punctuation::PunctuationId;

    fn kinds(source: &str) -> Vec<TokenKind> {
        lex(source).into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_keyword_registry_parity() {
        use dream_core::lang::keywords;

        for k in keywords::KEYWORDS {
            let tokens = lex(k.canonical);
            assert_eq!(tokens.len(), 2, "expected token + EOF for keyword {:?}", k.id);
            assert!(tokens[0].kind.is_keyword(k.id));
            assert!(matches!(tokens[1].kind, TokenKind::Eof));
        }
    }

    #[test]
    fn test_operator_registry_parity() {
        use dream_core::lang::operators;

        for o in operators::OPERATORS {
            let tokens = lex(o.spelling);
            assert_eq!(tokens.len(), 2, "lex({:?}) produced {:?}", o.spelling, tokens);
            assert!(tokens[0].kind.is_operator(o.id), "{:?}", o.spelling);
        }
    }

    #[test]
    fn test_punctuation_registry_parity() {
        for p in punctuation::PUNCTUATION {
            let tokens = lex(p.canonical);
            assert!(tokens[0].kind.is_punctuation(p.id), "{:?}", p.canonical);
        }
    }

    #[test]
    fn test_maximal_munch() {
        let tokens = kinds("a==b<=c>=d!=e&&f||g++ h-- i+=1");
        assert!(tokens[1].is_operator(OperatorId::EqEq));
        assert!(tokens[3].is_operator(OperatorId::LtEq));
        assert!(tokens[5].is_operator(OperatorId::GtEq));
        assert!(tokens[7].is_operator(OperatorId::NotEq));
        assert!(tokens[9].is_operator(OperatorId::AndAnd));
        assert!(tokens[11].is_operator(OperatorId::OrOr));
        assert!(tokens[13].is_operator(OperatorId::PlusPlus));
        assert!(tokens[15].is_operator(OperatorId::MinusMinus));
        assert!(tokens[17].is_operator(OperatorId::PlusEq));

        // `+++` is `++` then `+`
        let tokens = kinds("+++");
        assert!(tokens[0].is_operator(OperatorId::PlusPlus));
        assert!(tokens[1].is_operator(OperatorId::Plus));
    }

    #[test]
    fn test_comments_are_skipped() {
        let tokens = kinds("int // line\n/* block\n comment */ x;");
        assert_eq!(tokens.len(), 4);
        assert!(tokens[0].is_keyword(KeywordId::Int));
        assert!(matches!(&tokens[1], TokenKind::Ident(n) if n == "x"));
        assert!(tokens[2].is_punctuation(PunctuationId::Semicolon));
    }

    #[test]
    fn test_unterminated_block_comment() {
        let tokens = kinds("x /* never closed");
        assert!(matches!(&tokens[1], TokenKind::Error(m) if m == "unterminated block comment"));
        assert!(matches!(tokens[2], TokenKind::Eof));
        assert_eq!(tokens.len(), 3);
    }

    #[test]
    fn test_string_escapes() {
        let tokens = kinds(r#""a\n\t\\\"\'b\0""#);
        assert!(matches!(&tokens[0], TokenKind::Str(s) if s == "a\n\t\\\"'b\0"));
    }

    #[test]
    fn test_unterminated_string_ends_stream() {
        let tokens = lex("string s = \"abc\nint y;");
        assert!(matches!(&tokens[3].kind, TokenKind::Error(m) if m == "unterminated string literal"));
        assert_eq!(tokens[3].pos, Pos::new(1, 12));
        assert!(matches!(tokens[4].kind, TokenKind::Eof));
        assert_eq!(tokens.len(), 5);
    }

    #[test]
    fn test_char_literals() {
        assert!(matches!(kinds("'a'")[0], TokenKind::Char('a')));
        assert!(matches!(kinds("'\\n'")[0], TokenKind::Char('\n')));
        assert!(matches!(&kinds("''")[0], TokenKind::Error(m) if m == "empty character literal"));
        assert!(matches!(&kinds("'ab'")[0], TokenKind::Error(_)));
        assert!(matches!(&kinds("'a")[0], TokenKind::Error(m) if m == "unterminated character literal"));
    }

    #[test]
    fn test_numbers() {
        let tokens = kinds("42 3.14 1e10 2.5e-3 7. 2147483648");
        assert!(matches!(&tokens[0], TokenKind::Int(s) if s == "42"));
        assert!(matches!(&tokens[1], TokenKind::Float(s) if s == "3.14"));
        assert!(matches!(&tokens[2], TokenKind::Float(s) if s == "1e10"));
        assert!(matches!(&tokens[3], TokenKind::Float(s) if s == "2.5e-3"));
        assert!(matches!(&tokens[4], TokenKind::Int(s) if s == "7"));
        assert!(tokens[5].is_punctuation(PunctuationId::Dot));
        assert!(matches!(&tokens[6], TokenKind::Int(s) if s == "2147483648"));
    }

    #[test]
    fn test_negative_literal_is_two_tokens() {
        let tokens = kinds("-2147483648");
        assert!(tokens[0].is_operator(OperatorId::Minus));
        assert!(matches!(&tokens[1], TokenKind::Int(s) if s == "2147483648"));
    }

    #[test]
    fn test_unexpected_characters() {
        for src in ["@", "#", "$", "`", "\\", "|", "\u{1}"] {
            let tokens = kinds(src);
            assert!(matches!(tokens[0], TokenKind::Error(_)), "{src:?}");
            assert!(matches!(tokens[1], TokenKind::Eof));
        }
    }

    #[test]
    fn test_non_ascii_identifiers() {
        let tokens = lex("int café = 1;");
        assert!(matches!(&tokens[1].kind, TokenKind::Ident(n) if n == "café"));
        // Columns count code points, not bytes.
        assert_eq!(tokens[2].pos, Pos::new(1, 10));
        assert_eq!(tokens[1].len(), "café".len());
    }

    #[test]
    fn test_positions_track_lines() {
        let tokens = lex("a\n  b\n\n c");
        assert_eq!(tokens[0].pos, Pos::new(1, 1));
        assert_eq!(tokens[1].pos, Pos::new(2, 3));
        assert_eq!(tokens[2].pos, Pos::new(4, 2));
    }

    #[test]
    fn test_invalid_utf8() {
        let bytes = b"int x\xff = 1;";
        let tokens: Vec<Token> = Lexer::from_bytes(bytes).collect();
        assert!(tokens[0].kind.is_keyword(KeywordId::Int));
        assert!(matches!(&tokens[1].kind, TokenKind::Ident(n) if n == "x"));
        assert!(matches!(&tokens[2].kind, TokenKind::Error(m) if m.contains("UTF-8")));
        assert_eq!(tokens[2].span.start, 5);
        assert!(matches!(tokens[3].kind, TokenKind::Eof));
    }

    #[test]
    fn test_iterator_ends_after_single_eof() {
        let mut lexer = Lexer::new("x");
        assert!(lexer.next().is_some());
        assert!(matches!(lexer.next().map(|t| t.kind), Some(TokenKind::Eof)));
        assert!(lexer.next().is_none());
        // next_token keeps answering Eof
        assert!(matches!(lexer.next_token().kind, TokenKind::Eof));
    }

    #[test]
    fn test_rewind_restarts() {
        let mut lexer = Lexer::new("a b");
        let first: Vec<Token> = lexer.by_ref().collect();
        lexer.rewind();
        let second: Vec<Token> = lexer.collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_lex_into_reports_errors() {
        let mut sink = Diagnostics::default();
        let tokens = lex_into("x = @;", &mut sink);
        assert_eq!(tokens.len(), 4);
        assert_eq!(sink.error_count(), 1);
        assert_eq!(sink.error_message(0), Some("unexpected character '@'"));
    }

    proptest::proptest! {
        #[test]
        fn test_positions_never_go_backwards(source in "[ -~\\n]{0,120}") {
            let tokens = lex(&source);
            for pair in tokens.windows(2) {
                let (a, b) = (pair[0].pos, pair[1].pos);
                proptest::prop_assert!((a.line, a.col) <= (b.line, b.col));
            }
        }
    }
}
