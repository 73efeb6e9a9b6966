//! Numeric literal scanning.
//!
//! Literals keep their raw spelling (`42`, `3.14`, `1e10`, `2.5e-3`). A `.` only starts a fraction when a digit
//! follows it, and an exponent is only consumed when it is complete.

use super::{Lexer, TokenKind};

impl Lexer<'_> {
    /// Scan a numeric literal whose first digit is already consumed.
    pub(super) fn scan_number(&mut self, start: usize) -> TokenKind {
        self.eat_digits();
        let mut is_float = false;

        if self.peek() == Some('.') && self.peek_next().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
            self.eat_digits();
            is_float = true;
        }

        if matches!(self.peek(), Some('e' | 'E')) && self.exponent_follows() {
            self.advance();
            if matches!(self.peek(), Some('+' | '-')) {
                self.advance();
            }
            self.eat_digits();
            is_float = true;
        }

        let raw = self.source[start..self.offset].to_string();
        if is_float { TokenKind::Float(raw) } else { TokenKind::Int(raw) }
    }

    fn eat_digits(&mut self) {
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
        }
    }

    /// `e`/`E` followed by an optional sign and at least one digit.
    fn exponent_follows(&self) -> bool {
        let mut rest = self.source[self.offset..].chars().skip(1);
        match rest.next() {
            Some('+' | '-') => rest.next().is_some_and(|c| c.is_ascii_digit()),
            Some(c) => c.is_ascii_digit(),
            None => false,
        }
    }
}
