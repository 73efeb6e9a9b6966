//! String and character literal scanning.
//!
//! Literals may not span lines: a raw newline (or end of input) before the closing quote makes the literal
//! unterminated.

use super::{Lexer, TokenKind};

impl Lexer<'_> {
    /// Scan the rest of a `"..."` literal; the opening quote is already consumed.
    pub(super) fn scan_string(&mut self) -> TokenKind {
        let mut value = String::new();
        loop {
            match self.peek() {
                None | Some('\n') => return TokenKind::Error("unterminated string literal".to_string()),
                Some('"') => {
                    self.advance();
                    return TokenKind::Str(value);
                }
                Some('\\') => {
                    self.advance();
                    match self.scan_escape() {
                        Some(c) => value.push(c),
                        None => return TokenKind::Error("unterminated string literal".to_string()),
                    }
                }
                Some(c) => {
                    self.advance();
                    value.push(c);
                }
            }
        }
    }

    /// Scan the rest of a `'c'` literal; the opening quote is already consumed.
    pub(super) fn scan_char(&mut self) -> TokenKind {
        let c = match self.peek() {
            None | Some('\n') => return TokenKind::Error("unterminated character literal".to_string()),
            Some('\'') => {
                self.advance();
                return TokenKind::Error("empty character literal".to_string());
            }
            Some('\\') => {
                self.advance();
                match self.scan_escape() {
                    Some(c) => c,
                    None => return TokenKind::Error("unterminated character literal".to_string()),
                }
            }
            Some(c) => {
                self.advance();
                c
            }
        };

        if self.match_char('\'') {
            return TokenKind::Char(c);
        }
        while let Some(next) = self.peek() {
            if next == '\n' {
                break;
            }
            self.advance();
            if next == '\'' {
                return TokenKind::Error("character literal must contain exactly one character".to_string());
            }
        }
        TokenKind::Error("unterminated character literal".to_string())
    }

    /// Decode the character after a backslash. Unknown escapes keep the escaped character.
    fn scan_escape(&mut self) -> Option<char> {
        if matches!(self.peek(), None | Some('\n')) {
            return None;
        }
        let c = self.advance()?;
        Some(match c {
            'n' => '\n',
            't' => '\t',
            'r' => '\r',
            '0' => '\0',
            other => other,
        })
    }
}
