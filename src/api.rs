//! Embedding API
//!
//! [`compile_string`] runs the whole pipeline on a source string and returns the generated C together with every
//! diagnostic; [`run_string`] additionally builds the C with the configured toolchain and runs it.
//!
//! Both report a [`Status`] instead of failing: a non-zero status always comes with non-empty `errors` text.
//!
//! ## Examples
//!
//! ```rust
//! use dream::{CompilerConfig, Status, compile_string};
//!
//! let out = compile_string("print(2 + 3 * 4);", &CompilerConfig::default());
//! assert_eq!(out.status, Status::Ok);
//! assert!(out.code.unwrap().contains("dr_print_int(14, true);"));
//!
//! let bad = compile_string("int x = ;", &CompilerConfig::default());
//! assert_eq!(bad.status, Status::Parse);
//! assert!(!bad.errors.is_empty());
//! ```

use crate::backend::{self, Toolchain};
use crate::config::CompilerConfig;
use crate::error::{DreamError, MAX_SOURCE_BYTES};
use crate::frontend::analyzer;
use crate::frontend::diagnostics::{Diagnostic, Diagnostics, Stage, render_diagnostic};
use crate::frontend::parser;
use crate::optimizer;

/// Name used for the source in rendered diagnostics when none is given.
pub const DEFAULT_SOURCE_NAME: &str = "<input>";

/// Outcome of a compilation or run; the numeric values are the process exit codes of the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum Status {
    Ok = 0,
    Lex = 1,
    Parse = 2,
    Semantic = 3,
    /// Code generation or the C toolchain failed.
    Codegen = 4,
    Io = 5,
    /// The compiled program exited with a non-zero status.
    Runtime = 6,
    ResourceExhausted = 7,
}

impl Status {
    pub fn code(self) -> i32 {
        self as i32
    }

    pub fn is_ok(self) -> bool {
        self == Status::Ok
    }

    fn from_stage(stage: Stage) -> Self {
        match stage {
            Stage::Lexer => Status::Lex,
            Stage::Parser => Status::Parse,
            Stage::Semantic => Status::Semantic,
            Stage::Codegen => Status::Codegen,
        }
    }
}

/// Result of [`compile_string`].
#[derive(Debug, Clone)]
pub struct CompileOutput {
    pub status: Status,
    /// Generated C, present exactly when `status` is [`Status::Ok`].
    pub code: Option<String>,
    /// Rendered error report; empty on success.
    pub errors: String,
    /// Every diagnostic in emission order, warnings included.
    pub diagnostics: Vec<Diagnostic>,
    /// Errors beyond the configured cap, counted but not recorded.
    pub suppressed: usize,
}

impl CompileOutput {
    fn failed(err: &DreamError, diagnostics: Vec<Diagnostic>) -> Self {
        Self {
            status: err.status(),
            code: None,
            errors: format!("error: {err}\n"),
            diagnostics,
            suppressed: 0,
        }
    }
}

/// Result of [`run_string`].
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub status: Status,
    /// What the program printed; empty when it never ran.
    pub stdout: String,
    /// Compile errors, toolchain output, or the program's stderr after a failed run.
    pub errors: String,
}

/// Compile `source` to C.
pub fn compile_string(source: &str, config: &CompilerConfig) -> CompileOutput {
    compile_source(source, DEFAULT_SOURCE_NAME, config)
}

/// Compile `source`, naming it `file_name` in diagnostics.
#[tracing::instrument(skip_all, fields(file = file_name, bytes = source.len()))]
pub fn compile_source(source: &str, file_name: &str, config: &CompilerConfig) -> CompileOutput {
    if source.len() as u64 > MAX_SOURCE_BYTES {
        let err = DreamError::SourceTooLarge {
            size: source.len() as u64,
            limit: MAX_SOURCE_BYTES,
        };
        return CompileOutput::failed(&err, Vec::new());
    }

    let parser::ParseOutput {
        mut ast,
        root,
        mut diagnostics,
    } = match parser::parse_source(source, &config.parse_options()) {
        Ok(out) => out,
        Err(fatal) => return CompileOutput::failed(&DreamError::from(fatal), Vec::new()),
    };
    let analysis = analyzer::analyze(&mut ast, root, &mut diagnostics);

    if let Some(stage) = diagnostics.first_error_stage() {
        tracing::debug!(errors = diagnostics.error_count(), %stage, "compilation failed");
        return CompileOutput {
            status: Status::from_stage(stage),
            code: None,
            errors: render_errors(&diagnostics, file_name, source),
            suppressed: diagnostics.suppressed(),
            diagnostics: diagnostics.into_vec(),
        };
    }

    let stats = optimizer::optimize(&mut ast, root, &analysis.types, &config.effective_optimizer());
    tracing::debug!(rewrites = stats.total(), "optimized");

    match backend::generate(&ast, root, &analysis) {
        Ok(code) => CompileOutput {
            status: Status::Ok,
            code: Some(code),
            errors: String::new(),
            diagnostics: diagnostics.into_vec(),
            suppressed: 0,
        },
        Err(err) => CompileOutput::failed(&DreamError::from(err), diagnostics.into_vec()),
    }
}

/// Compile `source`, build it with the configured C compiler and run it with empty input.
pub fn run_string(source: &str, config: &CompilerConfig) -> RunOutput {
    run_string_with_input(source, "", config)
}

/// Like [`run_string`], feeding `input` to the program's standard input.
pub fn run_string_with_input(source: &str, input: &str, config: &CompilerConfig) -> RunOutput {
    run_source(source, DEFAULT_SOURCE_NAME, input, config)
}

/// Compile, build and run `source` (named `file_name` in diagnostics) with `input` on standard input.
#[tracing::instrument(skip_all, fields(file = file_name))]
pub fn run_source(source: &str, file_name: &str, input: &str, config: &CompilerConfig) -> RunOutput {
    let compiled = compile_source(source, file_name, config);
    let Some(code) = compiled.code else {
        return RunOutput {
            status: compiled.status,
            stdout: String::new(),
            errors: compiled.errors,
        };
    };
    let toolchain = Toolchain::from_config(config);
    match build_and_run(&toolchain, &code, input) {
        Ok(out) => out,
        Err(err) => RunOutput {
            status: err.status(),
            stdout: String::new(),
            errors: format!("error: {err}\n"),
        },
    }
}

fn build_and_run(toolchain: &Toolchain, code: &str, input: &str) -> Result<RunOutput, DreamError> {
    let build = toolchain.build(code).map_err(|source| DreamError::CompilerUnavailable {
        cc: toolchain.cc().to_string(),
        source,
    })?;
    if !build.success {
        return Err(DreamError::CompilerFailed { stderr: build.stderr });
    }
    let run = toolchain.run(&build, input).map_err(DreamError::Execute)?;
    if run.success {
        return Ok(RunOutput {
            status: Status::Ok,
            stdout: run.stdout,
            errors: String::new(),
        });
    }
    let mut errors = run.stderr;
    if errors.trim().is_empty() {
        errors = match run.exit_code {
            Some(code) => format!("error: program exited with status {code}\n"),
            None => "error: program was terminated by a signal\n".to_string(),
        };
    }
    Ok(RunOutput {
        status: Status::Runtime,
        stdout: run.stdout,
        errors,
    })
}

/// Render the error-severity diagnostics, plus a note about suppressed ones.
pub fn render_errors(diagnostics: &Diagnostics, file_name: &str, source: &str) -> String {
    let mut out: String = diagnostics
        .errors()
        .map(|d| render_diagnostic(file_name, source, d))
        .collect();
    if diagnostics.suppressed() > 0 {
        out.push_str(&format!("note: {} more error(s) not shown\n", diagnostics.suppressed()));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compile(source: &str) -> CompileOutput {
        compile_string(source, &CompilerConfig::default())
    }

    #[test]
    fn clean_program_compiles() {
        let out = compile("int x = 1; print(x);");
        assert_eq!(out.status, Status::Ok);
        assert!(out.errors.is_empty());
        assert!(out.code.is_some());
    }

    #[test]
    fn status_follows_the_earliest_failing_stage() {
        assert_eq!(compile("int x = 1 @ 2;").status, Status::Lex);
        assert_eq!(compile("int x = ;").status, Status::Parse);
        assert_eq!(compile("int x = y;").status, Status::Semantic);
    }

    #[test]
    fn failures_carry_error_text() {
        let out = compile("int x = y;");
        assert!(out.code.is_none());
        assert!(out.errors.contains("error[semantic]"), "{}", out.errors);
        assert!(out.errors.contains("<input>:1:9"), "{}", out.errors);
    }

    #[test]
    fn warnings_do_not_fail_a_compilation() {
        let out = compile("func int f(int x) { if (x > 0) { return 1; } } print(f(1));");
        assert_eq!(out.status, Status::Ok);
        assert!(out.errors.is_empty());
        assert!(out.diagnostics.iter().any(|d| !d.is_error()));
    }

    #[test]
    fn deep_nesting_is_resource_exhaustion() {
        let source = format!("int x = {}1{};", "(".repeat(64), ")".repeat(64));
        let out = compile_string(&source, &CompilerConfig::default().with_max_nesting(16));
        assert_eq!(out.status, Status::ResourceExhausted);
        assert!(!out.errors.is_empty());
    }

    #[test]
    fn error_cap_is_reported() {
        let source = "int a = ;\n".repeat(10);
        let out = compile_string(&source, &CompilerConfig::default().with_max_errors(3));
        assert_eq!(out.status, Status::Parse);
        assert!(out.errors.contains("more error(s) not shown"), "{}", out.errors);
    }

    #[test]
    fn compile_failures_do_not_run() {
        let out = run_string("int x = ;", &CompilerConfig::default().with_cc("dream-no-such-compiler"));
        assert_eq!(out.status, Status::Parse);
        assert!(out.stdout.is_empty());
    }

    #[test]
    fn missing_c_compiler_is_a_codegen_failure() {
        let out = run_string("print(1);", &CompilerConfig::default().with_cc("dream-no-such-compiler"));
        assert_eq!(out.status, Status::Codegen);
        assert!(out.errors.contains("dream-no-such-compiler"), "{}", out.errors);
    }
}
