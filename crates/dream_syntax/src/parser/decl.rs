/// Declaration parsing: variables, functions, structs, enums.
///
/// Lists inside braces (struct fields, enum members) recover locally, so one bad member does not discard the
/// whole declaration.
impl<'a> Parser<'a> {
    /// Parse `[const] Type name [N] [= init]` and, when `terminated`, the trailing `;`.
    fn var_decl(&mut self, terminated: bool) -> PResult<NodeId> {
        let start = self.pos;
        let is_const = self.match_keyword(KeywordId::Const);
        let mut ty = self.type_ref()?;
        let (name_span, name_pos) = (self.peek().span, self.peek().pos);
        let name = self.expect_ident("a variable name")?;

        if self.check_punct(PunctuationId::LParen) {
            let message = format!("expected 'func' keyword before function declaration '{name}'");
            self.report(ParseError::Report(
                Diagnostic::error(Stage::Parser, message, name_span, name_pos)
                    .with_hint(format!("declare functions as `func {ty} {name}(...)`")),
            ));
            self.skip_construct();
            self.recovering = false;
            return self.error_node(start);
        }

        let array_len = self.array_suffix(&mut ty)?;
        let storage = if self.scope_depth == 0 { Storage::Global } else { Storage::Local };
        let decl = |ty: TypeRef| {
            NodeKind::VarDecl(VarDecl {
                name: name.clone(),
                ty,
                is_const,
                array_len,
                storage,
                constant: false,
                synthetic: false,
            })
        };

        let mut children = Vec::new();
        if self.match_op(OperatorId::Eq) {
            match self.expression() {
                Ok(init) => children.push(init),
                Err(error) if terminated && !matches!(error, ParseError::Fatal) => {
                    // Keep the declaration so later uses still resolve.
                    self.report(error);
                    self.synchronize();
                    let init = self.error_node(self.pos.saturating_sub(1))?;
                    return self.make(decl(ty), start, [init]);
                }
                Err(error) => return Err(error),
            }
        }
        if terminated {
            self.expect_semicolon("variable declaration");
        }
        self.make(decl(ty), start, children)
    }

    /// Optional `[N]` or `[]` after a declared name.
    fn array_suffix(&mut self, ty: &mut TypeRef) -> PResult<Option<u32>> {
        if !self.match_punct(PunctuationId::LBracket) {
            return Ok(None);
        }
        let mut len = None;
        match &self.peek().kind {
            TokenKind::Int(raw) => {
                let parsed = raw.parse::<u32>().ok().filter(|n| *n > 0);
                let (span, pos) = (self.peek().span, self.peek().pos);
                self.advance();
                match parsed {
                    Some(n) => len = Some(n),
                    None => self.report_soft("array size must be a positive integer literal", span, pos),
                }
            }
            TokenKind::Punctuation(PunctuationId::RBracket) => ty.is_array = true,
            _ => return Err(self.unexpected("an array size")),
        }
        self.expect_punct(PunctuationId::RBracket, "']' after array size")?;
        Ok(len)
    }

    /// `func Ret name(params) { body }` or a prototype ending in `;`.
    fn func_decl(&mut self) -> PResult<NodeId> {
        let start = self.pos;
        self.expect_keyword(KeywordId::Func, "'func'")?;
        let ret = self.type_ref()?;
        let name = self.expect_ident("a function name")?;
        self.expect_punct(PunctuationId::LParen, "'(' after function name")?;

        self.scoped(|p| {
            let mut children = Vec::new();
            if !p.check_punct(PunctuationId::RParen) {
                loop {
                    children.push(p.param()?);
                    if !p.match_punct(PunctuationId::Comma) {
                        break;
                    }
                }
            }
            p.expect_punct(PunctuationId::RParen, "')' after parameters")?;
            let param_count = children.len();

            let is_prototype = p.match_punct(PunctuationId::Semicolon);
            if !is_prototype {
                children.push(p.block()?);
            }
            p.make(
                NodeKind::Func(FuncDecl {
                    name,
                    ret,
                    param_count,
                    is_prototype,
                }),
                start,
                children,
            )
        })
    }

    fn param(&mut self) -> PResult<NodeId> {
        let start = self.pos;
        let mut ty = self.type_ref()?;
        let name = self.expect_ident("a parameter name")?;
        let array_len = self.array_suffix(&mut ty)?;
        self.make(
            NodeKind::VarDecl(VarDecl {
                name,
                ty,
                is_const: false,
                array_len,
                storage: Storage::Param,
                constant: false,
                synthetic: false,
            }),
            start,
            [],
        )
    }

    /// `struct Name { Type field; ... }`
    fn struct_decl(&mut self) -> PResult<NodeId> {
        let start = self.pos;
        self.expect_keyword(KeywordId::Struct, "'struct'")?;
        let name = self.expect_ident("a struct name")?;
        self.expect_punct(PunctuationId::LBrace, "'{' after struct name")?;

        let mut fields = Vec::new();
        while !self.check_punct(PunctuationId::RBrace) && !self.is_at_end() {
            let before = self.pos;
            match self.field() {
                Ok(field) => fields.push(field),
                Err(ParseError::Fatal) => return Err(ParseError::Fatal),
                Err(error) => {
                    self.report(error);
                    self.synchronize();
                    if self.pos == before {
                        self.advance();
                    }
                }
            }
        }
        self.expect_punct(PunctuationId::RBrace, "'}' to close struct")?;
        self.match_punct(PunctuationId::Semicolon);
        self.make(NodeKind::StructDecl { name }, start, fields)
    }

    fn field(&mut self) -> PResult<NodeId> {
        let start = self.pos;
        let mut ty = self.type_ref()?;
        let name = self.expect_ident("a field name")?;
        let array_len = self.array_suffix(&mut ty)?;
        if self.check_op(OperatorId::Eq) {
            return Err(self.error_here("struct fields cannot have initializers"));
        }
        self.expect_punct(PunctuationId::Semicolon, "';' after field")?;
        self.make(
            NodeKind::VarDecl(VarDecl {
                name,
                ty,
                is_const: false,
                array_len,
                storage: Storage::Field,
                constant: false,
                synthetic: false,
            }),
            start,
            [],
        )
    }

    /// `enum Name { A, B = 5, C }`
    fn enum_decl(&mut self) -> PResult<NodeId> {
        let start = self.pos;
        self.expect_keyword(KeywordId::Enum, "'enum'")?;
        let name = self.expect_ident("an enum name")?;
        self.expect_punct(PunctuationId::LBrace, "'{' after enum name")?;

        let mut members = Vec::new();
        while !self.check_punct(PunctuationId::RBrace) && !self.is_at_end() {
            match self.enum_variant() {
                Ok(member) => members.push(member),
                Err(ParseError::Fatal) => return Err(ParseError::Fatal),
                Err(error) => {
                    self.report(error);
                    while !self.is_at_end()
                        && !self.check_punct(PunctuationId::Comma)
                        && !self.check_punct(PunctuationId::RBrace)
                    {
                        self.advance();
                    }
                    self.recovering = false;
                }
            }
            if !self.match_punct(PunctuationId::Comma) {
                break;
            }
        }
        self.expect_punct(PunctuationId::RBrace, "'}' to close enum")?;
        self.match_punct(PunctuationId::Semicolon);
        self.make(NodeKind::EnumDecl { name }, start, members)
    }

    fn enum_variant(&mut self) -> PResult<NodeId> {
        let start = self.pos;
        let name = self.expect_ident("an enum member name")?;
        if self.match_op(OperatorId::Eq) {
            let value = self.unary()?;
            return self.make(NodeKind::EnumVariant { name, explicit: true }, start, [value]);
        }
        self.make(NodeKind::EnumVariant { name, explicit: false }, start, [])
    }

    /// Report an unsupported construct and skip it entirely.
    fn reject_construct(&mut self, message: &str, hint: &str) {
        let (span, pos) = (self.peek().span, self.peek().pos);
        self.report(ParseError::Report(
            Diagnostic::error(Stage::Parser, message, span, pos).with_hint(hint),
        ));
        self.advance();
        self.skip_construct();
        self.recovering = false;
    }

    /// Run `f` with declarations classified as non-global.
    fn scoped<T>(&mut self, f: impl FnOnce(&mut Self) -> PResult<T>) -> PResult<T> {
        self.scope_depth += 1;
        let result = f(self);
        self.scope_depth -= 1;
        result
    }
}
