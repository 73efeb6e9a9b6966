/// Expression parsing.
///
/// Precedence climbing over the table in `dream_core::lang::operators`:
///
/// | Level | Operators                 | Assoc |
/// |-------|---------------------------|-------|
/// | 1     | `=` `+=` `-=` `*=` `/=` `%=` | right |
/// | 2     | `?:`                      | right |
/// | 10    | `\|\|`                    | left  |
/// | 20    | `&&`                      | left  |
/// | 30    | `==` `!=`                 | left  |
/// | 40    | `<` `<=` `>` `>=`         | left  |
/// | 50    | `+` `-`                   | left  |
/// | 60    | `*` `/` `%`               | left  |
/// | 70    | prefix `-` `!` `++` `--`, casts | right |
impl<'a> Parser<'a> {
    fn expression(&mut self) -> PResult<NodeId> {
        self.nested(|p| p.assignment())
    }

    fn assignment(&mut self) -> PResult<NodeId> {
        let start = self.pos;
        let target = self.conditional()?;
        let Some(op) = self.peek().kind.operator_id().and_then(assign_op) else {
            return Ok(target);
        };
        let (span, pos) = (self.peek().span, self.peek().pos);
        self.advance();
        let value = self.nested(|p| p.assignment())?;
        if !matches!(
            self.ast.kind(target),
            NodeKind::Ident(_) | NodeKind::Index | NodeKind::Field(_)
        ) {
            return Err(ParseError::Report(Diagnostic::error(
                Stage::Parser,
                "invalid assignment target",
                span,
                pos,
            )));
        }
        self.make(NodeKind::Assign(op), start, [target, value])
    }

    fn conditional(&mut self) -> PResult<NodeId> {
        let start = self.pos;
        let cond = self.binary(0)?;
        if !self.match_op(OperatorId::Question) {
            return Ok(cond);
        }
        let then = self.expression()?;
        self.expect_punct(PunctuationId::Colon, "':' in conditional expression")?;
        let otherwise = self.nested(|p| p.conditional())?;
        self.make(NodeKind::Conditional, start, [cond, then, otherwise])
    }

    /// Left-associative binary operators binding at least as tightly as `min_prec`.
    fn binary(&mut self, min_prec: u8) -> PResult<NodeId> {
        let start = self.pos;
        let mut lhs = self.unary()?;
        loop {
            let Some(id) = self.peek().kind.operator_id() else { break };
            let Some(prec) = operators::binary_precedence(id) else { break };
            if prec < min_prec {
                break;
            }
            let Some(op) = binary_op(id) else { break };
            self.advance();
            let rhs = self.nested(|p| p.binary(prec + 1))?;
            lhs = self.make(NodeKind::Binary(op), start, [lhs, rhs])?;
        }
        Ok(lhs)
    }

    fn unary(&mut self) -> PResult<NodeId> {
        self.nested(|p| p.unary_inner())
    }

    fn unary_inner(&mut self) -> PResult<NodeId> {
        let start = self.pos;
        if let Some(id) = self.peek().kind.operator_id() {
            let op = match id {
                OperatorId::Minus => Some(UnaryOp::Neg),
                OperatorId::Bang => Some(UnaryOp::Not),
                OperatorId::PlusPlus => Some(UnaryOp::PreInc),
                OperatorId::MinusMinus => Some(UnaryOp::PreDec),
                OperatorId::Plus => {
                    self.advance();
                    return self.unary();
                }
                OperatorId::Star | OperatorId::Amp => {
                    return Err(self
                        .error_here("pointer syntax is not supported"));
                }
                _ => None,
            };
            if let Some(op) = op {
                self.advance();
                let operand = self.unary()?;
                return self.make(NodeKind::Unary(op), start, [operand]);
            }
        }

        if self.at_cast() {
            self.advance();
            let ty = self.type_ref()?;
            self.expect_punct(PunctuationId::RParen, "')' after cast type")?;
            let operand = self.unary()?;
            return self.make(NodeKind::Cast(ty), start, [operand]);
        }
        self.postfix()
    }

    fn postfix(&mut self) -> PResult<NodeId> {
        let start = self.pos;
        let mut expr = self.primary()?;
        loop {
            if self.match_punct(PunctuationId::LBracket) {
                let index = self.expression()?;
                self.expect_punct(PunctuationId::RBracket, "']' after index")?;
                expr = self.make(NodeKind::Index, start, [expr, index])?;
            } else if self.check_punct(PunctuationId::Dot) {
                let (span, pos) = (self.peek().span, self.peek().pos);
                self.advance();
                let name = self.expect_ident("a member name after '.'")?;
                if matches!(self.ast.kind(expr), NodeKind::Field(_)) {
                    return Err(ParseError::Report(
                        Diagnostic::error(Stage::Parser, "chained member access is not supported", span, pos)
                            .with_hint("store the intermediate member in a variable first"),
                    ));
                }
                expr = self.make(NodeKind::Field(name), start, [expr])?;
            } else if self.match_op(OperatorId::PlusPlus) {
                expr = self.make(NodeKind::Unary(UnaryOp::PostInc), start, [expr])?;
            } else if self.match_op(OperatorId::MinusMinus) {
                expr = self.make(NodeKind::Unary(UnaryOp::PostDec), start, [expr])?;
            } else {
                break;
            }
        }
        Ok(expr)
    }

    fn primary(&mut self) -> PResult<NodeId> {
        let start = self.pos;
        let kind = self.peek().kind.clone();
        match kind {
            TokenKind::Int(raw) => {
                self.advance();
                // Digits only, so the sole failure is overflow; the analyzer reports out-of-range values.
                let value = raw.parse::<i64>().unwrap_or(i64::MAX);
                self.make(NodeKind::Int(value), start, [])
            }
            TokenKind::Float(raw) => {
                self.advance();
                match raw.parse::<f64>() {
                    Ok(value) => self.make(NodeKind::Float(value), start, []),
                    Err(_) => Err(ParseError::Report(Diagnostic::error(
                        Stage::Parser,
                        format!("invalid float literal '{raw}'"),
                        self.tokens[start].span,
                        self.tokens[start].pos,
                    ))),
                }
            }
            TokenKind::Char(c) => {
                self.advance();
                self.make(NodeKind::Char(c), start, [])
            }
            TokenKind::Str(s) => {
                self.advance();
                self.make(NodeKind::Str(s), start, [])
            }
            TokenKind::Keyword(KeywordId::True) => {
                self.advance();
                self.make(NodeKind::Bool(true), start, [])
            }
            TokenKind::Keyword(KeywordId::False) => {
                self.advance();
                self.make(NodeKind::Bool(false), start, [])
            }
            TokenKind::Keyword(KeywordId::Null) => {
                self.advance();
                self.make(NodeKind::Null, start, [])
            }
            TokenKind::Ident(name) => {
                self.advance();
                if name == "Console" && self.check_punct(PunctuationId::Dot) {
                    return self.console_call(start);
                }
                if self.check_punct(PunctuationId::LParen) {
                    let args = self.call_args()?;
                    let kind = if name == "print" {
                        NodeKind::Console(ConsoleOp::Print)
                    } else {
                        NodeKind::Call(name)
                    };
                    return self.make(kind, start, args);
                }
                self.make(NodeKind::Ident(name), start, [])
            }
            TokenKind::Punctuation(PunctuationId::LParen) => {
                self.advance();
                let inner = self.expression()?;
                self.expect_punct(PunctuationId::RParen, "')' to close parenthesized expression")?;
                Ok(inner)
            }
            TokenKind::Punctuation(PunctuationId::LBrace) => self.array_init(),
            _ => Err(self.unexpected("expression")),
        }
    }

    /// `( args )` of a call.
    fn call_args(&mut self) -> PResult<Vec<NodeId>> {
        self.expect_punct(PunctuationId::LParen, "'('")?;
        let mut args = Vec::new();
        if !self.check_punct(PunctuationId::RParen) {
            loop {
                args.push(self.expression()?);
                if !self.match_punct(PunctuationId::Comma) {
                    break;
                }
            }
        }
        self.expect_punct(PunctuationId::RParen, "')' after arguments")?;
        Ok(args)
    }

    /// `Console.Method(args)`; the `Console` identifier is already consumed.
    fn console_call(&mut self, start: usize) -> PResult<NodeId> {
        self.advance();
        let (span, pos) = (self.peek().span, self.peek().pos);
        let method = self.expect_ident("a Console method name")?;
        let op = match method.as_str() {
            "WriteLine" => ConsoleOp::WriteLine,
            "Write" => ConsoleOp::Write,
            "ReadLine" => ConsoleOp::ReadLine,
            _ => {
                return Err(ParseError::Report(
                    Diagnostic::error(Stage::Parser, format!("unknown Console method '{method}'"), span, pos)
                        .with_hint("available methods are WriteLine, Write and ReadLine"),
                ));
            }
        };
        let args = self.call_args()?;
        self.make(NodeKind::Console(op), start, args)
    }

    /// `{ e1, e2, ... }` with an optional trailing comma.
    fn array_init(&mut self) -> PResult<NodeId> {
        let start = self.pos;
        self.expect_punct(PunctuationId::LBrace, "'{'")?;
        let mut elems = Vec::new();
        while !self.check_punct(PunctuationId::RBrace) {
            elems.push(self.expression()?);
            if !self.match_punct(PunctuationId::Comma) {
                break;
            }
        }
        self.expect_punct(PunctuationId::RBrace, "'}' to close array initializer")?;
        self.make(NodeKind::ArrayInit, start, elems)
    }
}

fn assign_op(id: OperatorId) -> Option<AssignOp> {
    match id {
        OperatorId::Eq => Some(AssignOp::Assign),
        OperatorId::PlusEq => Some(AssignOp::Add),
        OperatorId::MinusEq => Some(AssignOp::Sub),
        OperatorId::StarEq => Some(AssignOp::Mul),
        OperatorId::SlashEq => Some(AssignOp::Div),
        OperatorId::PercentEq => Some(AssignOp::Mod),
        _ => None,
    }
}

fn binary_op(id: OperatorId) -> Option<BinaryOp> {
    match id {
        OperatorId::Plus => Some(BinaryOp::Add),
        OperatorId::Minus => Some(BinaryOp::Sub),
        OperatorId::Star => Some(BinaryOp::Mul),
        OperatorId::Slash => Some(BinaryOp::Div),
        OperatorId::Percent => Some(BinaryOp::Mod),
        OperatorId::EqEq => Some(BinaryOp::Eq),
        OperatorId::NotEq => Some(BinaryOp::Ne),
        OperatorId::Lt => Some(BinaryOp::Lt),
        OperatorId::LtEq => Some(BinaryOp::Le),
        OperatorId::Gt => Some(BinaryOp::Gt),
        OperatorId::GtEq => Some(BinaryOp::Ge),
        OperatorId::AndAnd => Some(BinaryOp::And),
        OperatorId::OrOr => Some(BinaryOp::Or),
        _ => None,
    }
}
