/// Parser core types and entrypoint.
///
/// This chunk defines the [`Parser`] type, its options and output, and the top-level program loop.
///
/// ## Notes
/// - This file is `include!`'d into `crate::parser` to keep all parser methods in a
///   single module while avoiding a single “god file”.

/// Default limit on syntactic nesting (tree height and parser recursion).
///
/// The recursive passes grow their stack on demand, so this only stops inputs whose trees would exhaust memory.
pub const DEFAULT_MAX_NESTING: usize = 100_000;

/// Knobs for one parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseOptions {
    /// Deeper nesting is treated as resource exhaustion.
    pub max_nesting: usize,
    /// Error cap of the diagnostics sink created by [`parse`] / [`parse_source`].
    pub max_errors: usize,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            max_nesting: DEFAULT_MAX_NESTING,
            max_errors: crate::diagnostics::DEFAULT_MAX_ERRORS,
        }
    }
}

/// Result of a parse: the tree, its root block and every diagnostic reported so far.
#[derive(Debug, Clone)]
pub struct ParseOutput {
    pub ast: Ast,
    pub root: NodeId,
    pub diagnostics: Diagnostics,
}

impl ParseOutput {
    pub fn has_errors(&self) -> bool {
        self.diagnostics.has_errors()
    }

    pub fn error_count(&self) -> usize {
        self.diagnostics.error_count()
    }

    /// Message of the `index`-th error.
    pub fn error_message(&self, index: usize) -> Option<&str> {
        self.diagnostics.error_message(index)
    }
}

/// Why a parse function gave up.
#[derive(Debug)]
enum ParseError {
    /// A syntax error to report (unless the parser is already recovering).
    Report(Diagnostic),
    /// Failure caused by a lexer error token; the lexer already reported it.
    Silent,
    /// Resource exhaustion; unwinds the whole parse.
    Fatal,
}

type PResult<T> = Result<T, ParseError>;

/// Parser state.
///
/// ## Notes
/// - Errors propagate with `?` up to the nearest statement list, which reports them and calls
///   [`Parser::synchronize`]. While `recovering` is set, further reports are suppressed.
/// - `scope_depth` is zero only for statements directly at the top level; it decides `Storage::Global`.
pub struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    ast: Ast,
    diagnostics: Diagnostics,
    recovering: bool,
    /// Struct and enum names declared anywhere in the token stream (needed to recognize casts).
    type_names: Vec<String>,
    scope_depth: usize,
    depth: usize,
    heights: ArenaMap<NodeId, u32>,
    max_nesting: usize,
    fatal: Option<FatalError>,
}

impl<'a> Parser<'a> {
    /// Create a new parser for a token stream that ends with `Eof`.
    pub fn new(tokens: &'a [Token], source: &str, options: &ParseOptions, diagnostics: Diagnostics) -> Self {
        Self {
            tokens,
            pos: 0,
            ast: Ast::new(source),
            diagnostics,
            recovering: false,
            type_names: prescan_type_names(tokens),
            scope_depth: 0,
            depth: 0,
            heights: ArenaMap::default(),
            max_nesting: options.max_nesting.max(1),
            fatal: None,
        }
    }

    /// Parse the whole token stream into a program block.
    ///
    /// ## Errors
    /// Only resource exhaustion is an `Err`; syntax errors are reported in [`ParseOutput::diagnostics`].
    pub fn parse(mut self) -> Result<ParseOutput, FatalError> {
        let start = self.pos;
        let result = self
            .statement_list(|_| false)
            .and_then(|stmts| self.make(NodeKind::Block, start, stmts));
        match result {
            Ok(root) => {
                let Parser { ast, diagnostics, .. } = self;
                Ok(ParseOutput { ast, root, diagnostics })
            }
            Err(_) => Err(self.fatal.unwrap_or(FatalError::NestingTooDeep {
                limit: self.max_nesting,
                line: 0,
            })),
        }
    }
}

/// Collect every identifier that follows `struct` or `enum`.
fn prescan_type_names(tokens: &[Token]) -> Vec<String> {
    tokens
        .windows(2)
        .filter_map(|w| match (&w[0].kind, &w[1].kind) {
            (TokenKind::Keyword(KeywordId::Struct | KeywordId::Enum), TokenKind::Ident(name)) => Some(name.clone()),
            _ => None,
        })
        .collect()
}
