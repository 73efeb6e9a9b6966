/// Type syntax.
///
/// Dream types are a builtin keyword (`int`, `float`, `bool`, `char`, `string`, `void`) or a struct/enum name,
/// optionally followed by `[]`. Pointer and reference types are rejected here with a dedicated diagnostic.
impl<'a> Parser<'a> {
    /// Builtin type keyword at the current token.
    fn builtin_type_name(&self) -> Option<TypeName> {
        builtin_type_name(&self.peek().kind)
    }

    /// Return `true` if a declaration starts here: `int x`, `int[] x`, `Point p`, `Point[] ps`.
    fn at_declaration_start(&self) -> bool {
        if self.builtin_type_name().is_some() {
            return true;
        }
        if !matches!(self.peek().kind, TokenKind::Ident(_)) {
            return false;
        }
        match &self.peek_at(1).kind {
            TokenKind::Ident(_) => true,
            TokenKind::Punctuation(PunctuationId::LBracket) => {
                self.peek_at(2).kind.is_punctuation(PunctuationId::RBracket)
                    && matches!(self.peek_at(3).kind, TokenKind::Ident(_))
            }
            _ => false,
        }
    }

    /// Parse a type reference.
    fn type_ref(&mut self) -> PResult<TypeRef> {
        let name = match self.builtin_type_name() {
            Some(builtin) => {
                self.advance();
                builtin
            }
            None => TypeName::Named(self.expect_ident("a type name")?),
        };

        if self.check_op(OperatorId::Star) || self.check_op(OperatorId::Amp) || self.check_op(OperatorId::AndAnd) {
            return Err(self.error_here("pointer and reference types are not supported"));
        }

        let is_array =
            if self.check_punct(PunctuationId::LBracket) && self.peek_at(1).kind.is_punctuation(PunctuationId::RBracket) {
                self.advance();
                self.advance();
                true
            } else {
                false
            };
        Ok(TypeRef { name, is_array })
    }

    /// Return `true` at a cast prefix `(T)`.
    ///
    /// ## Notes
    /// - Builtin type names are unambiguous.
    /// - `(Name)` is a cast only when `Name` is a declared struct/enum and an operand follows the `)`.
    fn at_cast(&self) -> bool {
        if !self.check_punct(PunctuationId::LParen) || !self.peek_at(2).kind.is_punctuation(PunctuationId::RParen) {
            return false;
        }
        match &self.peek_at(1).kind {
            TokenKind::Keyword(k) => keywords::is_type_name(*k) && *k != KeywordId::Void,
            TokenKind::Ident(name) => self.type_names.contains(name) && can_start_operand(&self.peek_at(3).kind),
            _ => false,
        }
    }
}

fn builtin_type_name(kind: &TokenKind) -> Option<TypeName> {
    match kind.keyword_id()? {
        KeywordId::Int => Some(TypeName::Int),
        KeywordId::Float => Some(TypeName::Float),
        KeywordId::Bool => Some(TypeName::Bool),
        KeywordId::Char => Some(TypeName::Char),
        KeywordId::String => Some(TypeName::Str),
        KeywordId::Void => Some(TypeName::Void),
        _ => None,
    }
}

/// Tokens that can begin the operand of a cast.
fn can_start_operand(kind: &TokenKind) -> bool {
    match kind {
        TokenKind::Ident(_)
        | TokenKind::Int(_)
        | TokenKind::Float(_)
        | TokenKind::Char(_)
        | TokenKind::Str(_)
        | TokenKind::Punctuation(PunctuationId::LParen) => true,
        TokenKind::Keyword(k) => matches!(k, KeywordId::True | KeywordId::False),
        TokenKind::Operator(o) => matches!(
            o,
            OperatorId::Minus | OperatorId::Bang | OperatorId::PlusPlus | OperatorId::MinusMinus
        ),
        _ => false,
    }
}
