/// Token-stream helpers, node construction and error recovery.
///
/// This chunk contains the low-level primitives used throughout parsing:
/// - Peeking/consuming tokens (`peek`, `advance`)
/// - Matching / expecting keywords, operators, and punctuation
/// - Node allocation with nesting checks (`make`, `nested`)
/// - Error recovery (`report`, `sync_step`, `synchronize`)

/// One step of resynchronization, decided from the current token and the brace depth alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SyncAction {
    /// Skip the token and keep going.
    Skip,
    /// Skip a `{` and go one level deeper.
    Enter,
    /// Skip a `}` and go one level up.
    Leave,
    /// Consume the token and resume parsing after it.
    ConsumeAndStop,
    /// Resume parsing at this token.
    Stop,
}

/// Decide what resynchronization does with `kind` at brace `depth`.
///
/// ## Notes
/// - A `;` at depth 0 ends the broken statement.
/// - A `{ ... }` opened while skipping is skipped as a whole.
/// - An unmatched `}` belongs to an enclosing block, so recovery stops in front of it.
/// - A statement keyword at depth 0 starts the next statement.
fn sync_step(kind: &TokenKind, depth: usize) -> SyncAction {
    match kind {
        TokenKind::Eof | TokenKind::Error(_) => SyncAction::Stop,
        TokenKind::Punctuation(PunctuationId::Semicolon) if depth == 0 => SyncAction::ConsumeAndStop,
        TokenKind::Punctuation(PunctuationId::LBrace) => SyncAction::Enter,
        TokenKind::Punctuation(PunctuationId::RBrace) => match depth {
            0 => SyncAction::Stop,
            1 => SyncAction::ConsumeAndStop,
            _ => SyncAction::Leave,
        },
        TokenKind::Keyword(k) if depth == 0 && keywords::starts_statement(*k) => SyncAction::Stop,
        _ => SyncAction::Skip,
    }
}

impl<'a> Parser<'a> {
    // ========================================================================
    // Helpers
    // ========================================================================

    /// Return `true` at `Eof` or at a lexer `Error` token.
    fn is_at_end(&self) -> bool {
        self.peek().kind.is_terminal()
    }

    /// Return the current token without consuming it.
    fn peek(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    /// Return the token `n` positions ahead without consuming anything.
    fn peek_at(&self, n: usize) -> &Token {
        &self.tokens[(self.pos + n).min(self.tokens.len() - 1)]
    }

    /// Advance to the next token and return the token we just consumed.
    fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.pos += 1;
        }
        &self.tokens[self.pos.saturating_sub(1)]
    }

    fn check_keyword(&self, id: KeywordId) -> bool {
        self.peek().kind.is_keyword(id)
    }

    fn check_punct(&self, id: PunctuationId) -> bool {
        self.peek().kind.is_punctuation(id)
    }

    fn check_op(&self, id: OperatorId) -> bool {
        self.peek().kind.is_operator(id)
    }

    fn match_keyword(&mut self, id: KeywordId) -> bool {
        if self.check_keyword(id) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn match_punct(&mut self, id: PunctuationId) -> bool {
        if self.check_punct(id) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn match_op(&mut self, id: OperatorId) -> bool {
        if self.check_op(id) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect_keyword(&mut self, id: KeywordId, what: &str) -> PResult<()> {
        if self.match_keyword(id) {
            Ok(())
        } else {
            Err(self.unexpected(what))
        }
    }

    fn expect_punct(&mut self, id: PunctuationId, what: &str) -> PResult<()> {
        if self.match_punct(id) {
            Ok(())
        } else {
            Err(self.unexpected(what))
        }
    }

    /// Consume an identifier and return its spelling.
    fn expect_ident(&mut self, what: &str) -> PResult<String> {
        if let TokenKind::Ident(name) = &self.peek().kind {
            let name = name.clone();
            self.advance();
            Ok(name)
        } else {
            Err(self.unexpected(what))
        }
    }

    /// Consume the `;` ending a simple statement.
    ///
    /// A missing `;` is reported but does not abort the statement: the next token usually starts the next
    /// statement, so parsing continues there without cascading errors.
    fn expect_semicolon(&mut self, after: &str) {
        if self.match_punct(PunctuationId::Semicolon) {
            return;
        }
        if let ParseError::Report(diagnostic) = self.unexpected(&format!("';' after {after}")) {
            if !self.recovering {
                self.diagnostics.push(diagnostic);
            }
        }
    }

    // ========================================================================
    // Errors and recovery
    // ========================================================================

    /// Build an error at the current token.
    ///
    /// Failures at a lexer error token (or at the end of a stream cut short by one) are silent: the lexer has
    /// already reported the real problem.
    fn error_here(&self, message: impl Into<String>) -> ParseError {
        let token = self.peek();
        if self.stream_cut_short() {
            return ParseError::Silent;
        }
        ParseError::Report(Diagnostic::error(Stage::Parser, message, token.span, token.pos))
    }

    /// "expected X, found Y" at the current token.
    fn unexpected(&self, what: &str) -> ParseError {
        let found = self.peek().kind.describe();
        self.error_here(format!("expected {what}, found {found}"))
    }

    fn stream_cut_short(&self) -> bool {
        match &self.peek().kind {
            TokenKind::Error(_) => true,
            TokenKind::Eof => self.tokens.iter().rev().nth(1).is_some_and(|t| matches!(t.kind, TokenKind::Error(_))),
            _ => false,
        }
    }

    /// Record an error unless the parser is already recovering from an earlier one.
    fn report(&mut self, error: ParseError) {
        if let ParseError::Report(diagnostic) = error {
            if !self.recovering {
                self.diagnostics.push(diagnostic);
            }
        }
        self.recovering = true;
    }

    /// Report a problem that does not stop the current construct.
    fn report_soft(&mut self, message: impl Into<String>, span: Span, pos: Pos) {
        if !self.recovering {
            self.diagnostics.push(Diagnostic::error(Stage::Parser, message, span, pos));
        }
    }

    /// Skip tokens until a plausible statement boundary, then leave recovery mode.
    fn synchronize(&mut self) {
        let mut depth = 0usize;
        loop {
            match sync_step(&self.peek().kind, depth) {
                SyncAction::Skip => {}
                SyncAction::Enter => depth += 1,
                SyncAction::Leave => depth -= 1,
                SyncAction::ConsumeAndStop => {
                    self.advance();
                    break;
                }
                SyncAction::Stop => break,
            }
            self.advance();
        }
        self.recovering = false;
    }

    /// Skip a balanced `( ... )` group and a following `{ ... }` block or `;`.
    ///
    /// Used after rejecting a whole construct (a `class`, a function header without `func`) so its body is not
    /// parsed as loose statements.
    fn skip_construct(&mut self) {
        let mut parens = 0usize;
        while !self.is_at_end() {
            if self.check_punct(PunctuationId::LParen) {
                parens += 1;
            } else if self.check_punct(PunctuationId::RParen) {
                parens = parens.saturating_sub(1);
            } else if parens == 0 && self.check_punct(PunctuationId::Semicolon) {
                self.advance();
                return;
            } else if parens == 0 && self.check_punct(PunctuationId::LBrace) {
                break;
            } else if parens == 0 && self.check_punct(PunctuationId::RBrace) {
                return;
            }
            self.advance();
        }
        let mut depth = 0usize;
        while !self.is_at_end() {
            if self.check_punct(PunctuationId::LBrace) {
                depth += 1;
            } else if self.check_punct(PunctuationId::RBrace) {
                depth -= 1;
                if depth == 0 {
                    self.advance();
                    self.match_punct(PunctuationId::Semicolon);
                    return;
                }
            }
            self.advance();
        }
    }

    // ========================================================================
    // Node construction
    // ========================================================================

    /// Allocate a node spanning from token `start` to the last consumed token.
    fn make(&mut self, kind: NodeKind, start: usize, children: impl IntoIterator<Item = NodeId>) -> PResult<NodeId> {
        let first = &self.tokens[start.min(self.tokens.len() - 1)];
        let end = if self.pos > start {
            self.tokens[self.pos - 1].span.end
        } else {
            first.span.start
        };
        let span = Span::new(first.span.start, end.max(first.span.start));
        let node = Node::new(kind, span, first.pos).with_children(children);
        let height = 1 + node
            .children
            .iter()
            .filter_map(|c| self.heights.get(*c).copied())
            .max()
            .unwrap_or(0);
        if height as usize > self.max_nesting {
            return Err(self.exhausted());
        }
        let id = self.ast.alloc(node);
        self.heights.insert(id, height);
        Ok(id)
    }

    /// Run `f` one nesting level deeper.
    fn nested<T>(&mut self, f: impl FnOnce(&mut Self) -> PResult<T>) -> PResult<T> {
        if self.depth >= self.max_nesting {
            return Err(self.exhausted());
        }
        self.depth += 1;
        let result = crate::stack::ensure_sufficient_stack(|| f(self));
        self.depth -= 1;
        result
    }

    fn exhausted(&mut self) -> ParseError {
        if self.fatal.is_none() {
            self.fatal = Some(FatalError::NestingTooDeep {
                limit: self.max_nesting,
                line: self.peek().pos.line,
            });
        }
        ParseError::Fatal
    }

    /// Error node standing in for a construct that failed to parse.
    fn error_node(&mut self, start: usize) -> PResult<NodeId> {
        self.make(NodeKind::Error, start, [])
    }
}
