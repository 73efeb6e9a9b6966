//! Diagnostics and error reporting for Dream.
//!
//! Every stage reports problems as [`Diagnostic`] records pushed into one [`Diagnostics`] sink per compilation.
//! Records are immutable once pushed and keep their emission order.
//!
//! ## Notes
//! - Only *fatal* conditions (resource exhaustion) are Rust errors ([`FatalError`]); everything the user can fix is
//!   a diagnostic.
//! - The sink enforces an error cap: errors beyond `max_errors` are dropped and summarized by a single note when
//!   rendered.

use crate::ast::{Pos, Span};

/// Severity of a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    Error,
    Warning,
    Note,
}

/// Compilation stage a diagnostic originates from.
///
/// Ordering follows the pipeline, so the lowest error stage decides the status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Stage {
    Lexer,
    Parser,
    Semantic,
    Codegen,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::Lexer => write!(f, "lexical"),
            Stage::Parser => write!(f, "syntax"),
            Stage::Semantic => write!(f, "semantic"),
            Stage::Codegen => write!(f, "codegen"),
        }
    }
}

/// A user-facing problem report with location information.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub stage: Stage,
    pub message: String,
    pub span: Span,
    pub pos: Pos,
    pub notes: Vec<String>,
    pub hints: Vec<String>,
}

impl Diagnostic {
    fn new(severity: Severity, stage: Stage, message: impl Into<String>, span: Span, pos: Pos) -> Self {
        Self {
            severity,
            stage,
            message: message.into(),
            span,
            pos,
            notes: Vec::new(),
            hints: Vec::new(),
        }
    }

    pub fn error(stage: Stage, message: impl Into<String>, span: Span, pos: Pos) -> Self {
        Self::new(Severity::Error, stage, message, span, pos)
    }

    pub fn warning(stage: Stage, message: impl Into<String>, span: Span, pos: Pos) -> Self {
        Self::new(Severity::Warning, stage, message, span, pos)
    }

    pub fn note(stage: Stage, message: impl Into<String>, span: Span, pos: Pos) -> Self {
        Self::new(Severity::Note, stage, message, span, pos)
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hints.push(hint.into());
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    /// Convert into a `miette` report carrying the source, for graphical rendering.
    pub fn to_report(&self, file_name: &str, source: &str) -> miette::Report {
        let severity = match self.severity {
            Severity::Error => miette::Severity::Error,
            Severity::Warning => miette::Severity::Warning,
            Severity::Note => miette::Severity::Advice,
        };
        let end = self.span.end.max(self.span.start).min(source.len());
        let start = self.span.start.min(end);
        let mut diag = miette::MietteDiagnostic::new(self.message.clone())
            .with_severity(severity)
            .with_code(format!("dream::{}", self.stage))
            .with_label(miette::LabeledSpan::at(start..end.max(start), "here"));
        let help: Vec<&str> = self.notes.iter().chain(&self.hints).map(String::as_str).collect();
        if !help.is_empty() {
            diag = diag.with_help(help.join("\n"));
        }
        miette::Report::new(diag).with_source_code(miette::NamedSource::new(file_name, source.to_string()))
    }
}

/// Fatal, non-recoverable conditions that abort a compilation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, miette::Diagnostic)]
pub enum FatalError {
    #[error("resource exhausted: nesting depth exceeds {limit} at line {line}")]
    #[diagnostic(
        code(dream::resource_exhausted),
        help("split the construct into smaller functions or raise the nesting limit")
    )]
    NestingTooDeep { limit: usize, line: u32 },
}

// ============================================================================
// Sink
// ============================================================================

/// Ordered accumulator of diagnostics for one compilation.
#[derive(Debug, Clone)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
    max_errors: usize,
    error_count: usize,
    suppressed: usize,
}

impl Default for Diagnostics {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ERRORS)
    }
}

/// Default error cap.
pub const DEFAULT_MAX_ERRORS: usize = 100;

impl Diagnostics {
    pub fn new(max_errors: usize) -> Self {
        Self {
            items: Vec::new(),
            max_errors: max_errors.max(1),
            error_count: 0,
            suppressed: 0,
        }
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        if diagnostic.is_error() {
            if self.error_count >= self.max_errors {
                self.suppressed += 1;
                return;
            }
            self.error_count += 1;
        }
        self.items.push(diagnostic);
    }

    pub fn error(&mut self, stage: Stage, message: impl Into<String>, span: Span, pos: Pos) {
        self.push(Diagnostic::error(stage, message, span, pos));
    }

    pub fn warning(&mut self, stage: Stage, message: impl Into<String>, span: Span, pos: Pos) {
        self.push(Diagnostic::warning(stage, message, span, pos));
    }

    /// `true` if any error was reported, including suppressed ones.
    pub fn has_errors(&self) -> bool {
        self.error_count > 0
    }

    /// Number of errors, including the ones dropped by the cap.
    pub fn error_count(&self) -> usize {
        self.error_count + self.suppressed
    }

    pub fn suppressed(&self) -> usize {
        self.suppressed
    }

    pub fn warning_count(&self) -> usize {
        self.items.iter().filter(|d| d.severity == Severity::Warning).count()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter()
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter().filter(|d| d.is_error())
    }

    /// Message of the `index`-th recorded error.
    pub fn error_message(&self, index: usize) -> Option<&str> {
        self.errors().nth(index).map(|d| d.message.as_str())
    }

    /// Earliest pipeline stage that reported an error.
    pub fn first_error_stage(&self) -> Option<Stage> {
        self.errors().map(|d| d.stage).min()
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.items
    }

    /// Render every diagnostic as plain text, in emission order.
    pub fn render(&self, file_name: &str, source: &str) -> String {
        let mut out = String::new();
        for d in &self.items {
            out.push_str(&render_diagnostic(file_name, source, d));
        }
        if self.suppressed > 0 {
            out.push_str(&format!(
                "note: {} more error(s) not shown (limit is {})\n",
                self.suppressed, self.max_errors
            ));
        }
        out
    }
}

/// Render one diagnostic with its source line and a caret.
pub fn render_diagnostic(file_name: &str, source: &str, d: &Diagnostic) -> String {
    let kind = match d.severity {
        Severity::Error => "error",
        Severity::Warning => "warning",
        Severity::Note => "note",
    };
    let mut out = format!("{kind}[{}]: {}\n", d.stage, d.message);
    out.push_str(&format!("  --> {}:{}:{}\n", file_name, d.pos.line, d.pos.col));

    if let Some(line_text) = source.lines().nth(d.pos.line.saturating_sub(1) as usize) {
        let width = d.pos.line.to_string().len();
        let col = d.pos.col.max(1) as usize;
        let underline = line_text
            .chars()
            .skip(col - 1)
            .take(source.get(d.span.start..d.span.end).map_or(1, |s| s.chars().count()))
            .count()
            .max(1);
        out.push_str(&format!("  {:>width$} |\n", ""));
        out.push_str(&format!("  {:>width$} | {}\n", d.pos.line, line_text));
        out.push_str(&format!(
            "  {:>width$} | {}{}\n",
            "",
            " ".repeat(col - 1),
            "^".repeat(underline)
        ));
    }
    for note in &d.notes {
        out.push_str(&format!("  = note: {note}\n"));
    }
    for hint in &d.hints {
        out.push_str(&format!("  = hint: {hint}\n"));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn err(msg: &str) -> Diagnostic {
        Diagnostic::error(Stage::Parser, msg, Span::new(4, 5), Pos::new(1, 5))
    }

    #[test]
    fn cap_drops_errors_but_keeps_count() {
        let mut sink = Diagnostics::new(2);
        sink.push(err("a"));
        sink.push(err("b"));
        sink.push(err("c"));
        sink.push(Diagnostic::warning(Stage::Semantic, "w", Span::default(), Pos::default()));
        assert_eq!(sink.len(), 3);
        assert_eq!(sink.error_count(), 3);
        assert_eq!(sink.suppressed(), 1);
        assert_eq!(sink.error_message(1), Some("b"));
        assert!(sink.render("t.dr", "").contains("1 more error(s) not shown"));
    }

    #[test]
    fn first_error_stage_is_earliest() {
        let mut sink = Diagnostics::default();
        sink.error(Stage::Semantic, "late", Span::default(), Pos::default());
        sink.error(Stage::Lexer, "early", Span::default(), Pos::default());
        assert_eq!(sink.first_error_stage(), Some(Stage::Lexer));
    }

    #[test]
    fn render_points_at_column() {
        let d = err("expected ';'").with_hint("add a semicolon");
        let text = render_diagnostic("t.dr", "int x", &d);
        assert_eq!(
            text,
            "error[syntax]: expected ';'\n  --> t.dr:1:5\n    |\n  1 | int x\n    |     ^\n  = hint: add a semicolon\n"
        );
    }
}
