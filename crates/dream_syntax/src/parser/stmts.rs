/// Statement parsing.
///
/// Statement lists are the recovery points of the parser: a failing statement is reported once, the token
/// stream is resynchronized, and parsing continues with the next statement.
impl<'a> Parser<'a> {
    // ========================================================================
    // Statement lists
    // ========================================================================

    /// Parse statements until `stop` matches the current token or the stream ends.
    fn statement_list(&mut self, stop: fn(&TokenKind) -> bool) -> PResult<Vec<NodeId>> {
        let mut stmts = Vec::new();
        while !self.is_at_end() && !stop(&self.peek().kind) {
            let before = self.pos;
            match self.statement() {
                Ok(Some(stmt)) => stmts.push(stmt),
                Ok(None) => {}
                Err(ParseError::Fatal) => return Err(ParseError::Fatal),
                Err(error) => {
                    self.report(error);
                    self.synchronize();
                    if self.pos == before && !self.is_at_end() {
                        // A stray `}` (or similar) that synchronization refuses to skip.
                        self.advance();
                    }
                }
            }
        }
        Ok(stmts)
    }

    /// Parse one statement; `None` for an empty `;` or a rejected construct.
    fn statement(&mut self) -> PResult<Option<NodeId>> {
        self.nested(|p| p.statement_inner())
    }

    fn statement_inner(&mut self) -> PResult<Option<NodeId>> {
        if self.match_punct(PunctuationId::Semicolon) {
            return Ok(None);
        }
        if self.check_punct(PunctuationId::LBrace) {
            return self.block().map(Some);
        }
        if self.check_punct(PunctuationId::RBrace) {
            return Err(self.error_here("unexpected '}' without a matching '{'"));
        }

        if let Some(keyword) = self.peek().kind.keyword_id() {
            let stmt = match keyword {
                KeywordId::If => self.if_stmt(),
                KeywordId::While => self.while_stmt(),
                KeywordId::Do => self.do_while_stmt(),
                KeywordId::For => self.for_stmt(),
                KeywordId::Switch => self.switch_stmt(),
                KeywordId::Try => self.try_stmt(),
                KeywordId::Throw => self.throw_stmt(),
                KeywordId::Return => self.return_stmt(),
                KeywordId::Break => self.jump_stmt(NodeKind::Break, "'break'"),
                KeywordId::Continue => self.jump_stmt(NodeKind::Continue, "'continue'"),
                KeywordId::Func => self.func_decl(),
                KeywordId::Struct => self.struct_decl(),
                KeywordId::Enum => self.enum_decl(),
                KeywordId::Const => self.var_decl(true),
                KeywordId::Class => {
                    self.reject_construct("classes are not supported", "use 'struct' for plain data types");
                    return Ok(None);
                }
                KeywordId::Case | KeywordId::Default => {
                    let message = format!("'{}' label outside of a switch statement", keywords::as_str(keyword));
                    return Err(self.error_here(message));
                }
                KeywordId::Else => return Err(self.error_here("'else' without a matching 'if'")),
                KeywordId::Catch => return Err(self.error_here("'catch' without a matching 'try'")),
                k if keywords::is_type_name(k) => self.var_decl(true),
                _ => self.expression_statement(),
            };
            return stmt.map(Some);
        }

        if self.at_declaration_start() {
            return self.var_decl(true).map(Some);
        }
        self.expression_statement().map(Some)
    }

    /// Body of a control-flow statement; an empty `;` becomes an `Empty` node.
    fn sub_statement(&mut self) -> PResult<NodeId> {
        let start = self.pos;
        match self.scoped(|p| p.statement())? {
            Some(stmt) => Ok(stmt),
            None => self.make(NodeKind::Empty, start, []),
        }
    }

    /// `{ stmts }`
    fn block(&mut self) -> PResult<NodeId> {
        let start = self.pos;
        self.expect_punct(PunctuationId::LBrace, "'{'")?;
        let stmts = self.scoped(|p| p.statement_list(|k| k.is_punctuation(PunctuationId::RBrace)))?;
        if !self.match_punct(PunctuationId::RBrace) {
            return Err(self.unexpected("'}' to close block"));
        }
        self.make(NodeKind::Block, start, stmts)
    }

    // ========================================================================
    // Control flow
    // ========================================================================

    /// `( expr )` after a control-flow keyword.
    fn paren_condition(&mut self, keyword: &str) -> PResult<NodeId> {
        self.expect_punct(PunctuationId::LParen, &format!("'(' after '{keyword}'"))?;
        let cond = self.expression()?;
        self.expect_punct(PunctuationId::RParen, "')' after condition")?;
        Ok(cond)
    }

    fn if_stmt(&mut self) -> PResult<NodeId> {
        let start = self.pos;
        self.advance();
        let cond = self.paren_condition("if")?;
        let then = self.sub_statement()?;
        if self.match_keyword(KeywordId::Else) {
            let otherwise = self.sub_statement()?;
            return self.make(NodeKind::If, start, [cond, then, otherwise]);
        }
        self.make(NodeKind::If, start, [cond, then])
    }

    fn while_stmt(&mut self) -> PResult<NodeId> {
        let start = self.pos;
        self.advance();
        let cond = self.paren_condition("while")?;
        let body = self.sub_statement()?;
        self.make(NodeKind::While, start, [cond, body])
    }

    /// `do body while (cond);` stored as `[body, cond]`.
    fn do_while_stmt(&mut self) -> PResult<NodeId> {
        let start = self.pos;
        self.advance();
        let body = self.sub_statement()?;
        self.expect_keyword(KeywordId::While, "'while' after do-while body")?;
        let cond = self.paren_condition("while")?;
        self.expect_semicolon("do-while statement");
        self.make(NodeKind::DoWhile, start, [body, cond])
    }

    /// `for (init; cond; step) body`, always stored with four children.
    fn for_stmt(&mut self) -> PResult<NodeId> {
        let start = self.pos;
        self.advance();
        self.expect_punct(PunctuationId::LParen, "'(' after 'for'")?;
        self.scoped(|p| {
            let init = if p.check_punct(PunctuationId::Semicolon) {
                p.make(NodeKind::Empty, p.pos, [])?
            } else if p.check_keyword(KeywordId::Const) || p.at_declaration_start() {
                p.var_decl(false)?
            } else {
                p.expression()?
            };
            p.expect_punct(PunctuationId::Semicolon, "';' after for-loop initializer")?;

            let cond = if p.check_punct(PunctuationId::Semicolon) {
                p.make(NodeKind::Empty, p.pos, [])?
            } else {
                p.expression()?
            };
            p.expect_punct(PunctuationId::Semicolon, "';' after for-loop condition")?;

            let step = if p.check_punct(PunctuationId::RParen) {
                p.make(NodeKind::Empty, p.pos, [])?
            } else {
                p.expression()?
            };
            p.expect_punct(PunctuationId::RParen, "')' after for-loop clauses")?;

            let body = p.sub_statement()?;
            p.make(NodeKind::For, start, [init, cond, step, body])
        })
    }

    /// `switch (subject) { case v: ... default: ... }`
    fn switch_stmt(&mut self) -> PResult<NodeId> {
        let start = self.pos;
        self.advance();
        let subject = self.paren_condition("switch")?;
        self.expect_punct(PunctuationId::LBrace, "'{' after switch subject")?;

        let mut children = vec![subject];
        let mut seen_default = false;
        self.scoped(|p| {
            while !p.check_punct(PunctuationId::RBrace) && !p.is_at_end() {
                let case_start = p.pos;
                let (span, pos) = (p.peek().span, p.peek().pos);
                let label = if p.match_keyword(KeywordId::Case) {
                    p.case_label().map(Some)
                } else if p.match_keyword(KeywordId::Default) {
                    if seen_default {
                        p.report_soft("duplicate 'default' label in switch statement", span, pos);
                    }
                    seen_default = true;
                    p.expect_punct(PunctuationId::Colon, "':' after 'default'").map(|()| None)
                } else {
                    Err(p.unexpected("'case' or 'default'"))
                };

                let value = match label {
                    Ok(value) => value,
                    Err(ParseError::Fatal) => return Err(ParseError::Fatal),
                    Err(error) => {
                        p.report(error);
                        p.skip_to_case_boundary();
                        continue;
                    }
                };

                let stmts = p.statement_list(|k| {
                    k.is_keyword(KeywordId::Case) || k.is_keyword(KeywordId::Default) || k.is_punctuation(PunctuationId::RBrace)
                })?;
                let is_default = value.is_none();
                let case = p.make(NodeKind::Case { is_default }, case_start, value.into_iter().chain(stmts))?;
                children.push(case);
            }
            Ok(())
        })?;

        if !self.match_punct(PunctuationId::RBrace) {
            return Err(self.unexpected("'}' to close switch"));
        }
        self.make(NodeKind::Switch, start, children)
    }

    /// `value :` after `case`.
    fn case_label(&mut self) -> PResult<NodeId> {
        let value = self.nested(|p| p.binary(0))?;
        self.expect_punct(PunctuationId::Colon, "':' after case value")?;
        Ok(value)
    }

    /// Skip to the next `case`, `default` or the `}` closing the switch.
    fn skip_to_case_boundary(&mut self) {
        let mut depth = 0usize;
        while !self.is_at_end() {
            match &self.peek().kind {
                TokenKind::Keyword(KeywordId::Case | KeywordId::Default) if depth == 0 => break,
                TokenKind::Punctuation(PunctuationId::RBrace) if depth == 0 => break,
                TokenKind::Punctuation(PunctuationId::LBrace) => depth += 1,
                TokenKind::Punctuation(PunctuationId::RBrace) => depth -= 1,
                _ => {}
            }
            self.advance();
        }
        self.recovering = false;
    }

    /// `try { ... } catch [( ... )] { ... }`
    fn try_stmt(&mut self) -> PResult<NodeId> {
        let start = self.pos;
        self.advance();
        let body = self.scoped(|p| p.block())?;
        self.expect_keyword(KeywordId::Catch, "'catch' after try block")?;
        if self.match_punct(PunctuationId::LParen) {
            // The exception filter carries no meaning; exceptions are untyped.
            while !self.is_at_end() && !self.check_punct(PunctuationId::RParen) {
                self.advance();
            }
            self.expect_punct(PunctuationId::RParen, "')' after catch clause")?;
        }
        let handler = self.scoped(|p| p.block())?;
        self.make(NodeKind::Try, start, [body, handler])
    }

    // ========================================================================
    // Simple statements
    // ========================================================================

    fn throw_stmt(&mut self) -> PResult<NodeId> {
        let start = self.pos;
        self.advance();
        let value = if self.check_punct(PunctuationId::Semicolon) {
            None
        } else {
            Some(self.expression()?)
        };
        self.expect_semicolon("'throw'");
        self.make(NodeKind::Throw, start, value)
    }

    fn return_stmt(&mut self) -> PResult<NodeId> {
        let start = self.pos;
        self.advance();
        let value = if self.check_punct(PunctuationId::Semicolon) || self.check_punct(PunctuationId::RBrace) {
            None
        } else {
            Some(self.expression()?)
        };
        self.expect_semicolon("return statement");
        self.make(NodeKind::Return, start, value)
    }

    /// `break;` / `continue;`
    fn jump_stmt(&mut self, kind: NodeKind, what: &str) -> PResult<NodeId> {
        let start = self.pos;
        self.advance();
        self.expect_semicolon(what);
        self.make(kind, start, [])
    }

    fn expression_statement(&mut self) -> PResult<NodeId> {
        let start = self.pos;
        let expr = self.expression()?;
        self.expect_semicolon("expression");
        self.make(NodeKind::ExprStmt, start, [expr])
    }
}
