/// Public parsing entrypoints.

/// Parse a token stream.
///
/// The stream should end with `Eof`; one is appended if it does not.
///
/// ## Errors
/// Returns a [`FatalError`] only when nesting exceeds [`ParseOptions::max_nesting`]. Syntax errors are collected in
/// [`ParseOutput::diagnostics`].
#[tracing::instrument(skip_all, fields(token_count = tokens.len()))]
pub fn parse(tokens: &[Token], source: &str, options: &ParseOptions) -> Result<ParseOutput, FatalError> {
    parse_with(tokens, source, options, Diagnostics::new(options.max_errors))
}

/// Lex and parse `source`, collecting lexical and syntax diagnostics into one sink.
///
/// ## Examples
///
/// ```rust
/// use dream_syntax::parser::{parse_source, ParseOptions};
///
/// let out = parse_source("int x = 1 +;", &ParseOptions::default()).unwrap();
/// assert_eq!(out.error_message(0), Some("expected expression, found ';'"));
/// ```
#[tracing::instrument(skip_all, fields(source_len = source.len()))]
pub fn parse_source(source: &str, options: &ParseOptions) -> Result<ParseOutput, FatalError> {
    let mut diagnostics = Diagnostics::new(options.max_errors);
    let tokens = lexer::lex_into(source, &mut diagnostics);
    parse_with(&tokens, source, options, diagnostics)
}

/// Parse into an existing diagnostics sink.
pub fn parse_with(
    tokens: &[Token],
    source: &str,
    options: &ParseOptions,
    diagnostics: Diagnostics,
) -> Result<ParseOutput, FatalError> {
    if tokens.last().is_some_and(|t| t.kind.is_terminal()) {
        return Parser::new(tokens, source, options, diagnostics).parse();
    }
    let end = tokens.last().map_or(0, |t| t.span.end);
    let mut owned = tokens.to_vec();
    owned.push(Token::new(TokenKind::Eof, Span::new(end, end), Pos::default()));
    let output = Parser::new(&owned, source, options, diagnostics).parse();
    tracing::debug!(count = owned.len(), "parsed stream without terminator");
    output
}
