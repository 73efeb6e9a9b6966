//! CLI command implementations
//!
//! All command functions return `CliResult<ExitCode>` instead of calling
//! `process::exit`. Error handling and exits happen in the top-level `run()`.

use std::fs;
use std::path::{Path, PathBuf};

use crate::api::{self, CompileOutput, Status};
use crate::backend::{RUNTIME_HEADER, RUNTIME_HEADER_NAME, Toolchain};
use crate::config::{CompilerConfig, ReportStyle};
use crate::error::{self, DreamError};
use crate::frontend::diagnostics::{Diagnostic, Stage, render_diagnostic};
use crate::frontend::lexer::{Lexer, TokenKind};
use crate::frontend::parser;

use super::{CliError, CliResult, ExitCode};

/// Read source file contents, enforcing the 100 MB cap.
pub fn read_source(path: &Path) -> CliResult<String> {
    Ok(error::read_source(path)?)
}

fn display_name(path: &Path) -> String {
    path.display().to_string()
}

// ============================================================================
// Reporting
// ============================================================================

fn print_diagnostic(d: &Diagnostic, file_name: &str, source: &str, config: &CompilerConfig) {
    match config.report_style {
        ReportStyle::Plain => eprint!("{}", render_diagnostic(file_name, source, d)),
        ReportStyle::Fancy => eprintln!("{:?}", d.to_report(file_name, source)),
    }
}

/// Print every diagnostic of a compilation in emission order.
///
/// Failures without a diagnostic (resource exhaustion, code generation) are printed from the error text.
fn report(out: &CompileOutput, file_name: &str, source: &str, config: &CompilerConfig) {
    for d in &out.diagnostics {
        print_diagnostic(d, file_name, source, config);
    }
    if out.suppressed > 0 {
        eprintln!(
            "note: {} more error(s) not shown (limit is {})",
            out.suppressed, config.max_errors
        );
    }
    if !out.status.is_ok() && !out.diagnostics.iter().any(Diagnostic::is_error) {
        eprint!("{}", out.errors);
    }
}

/// Compile, print the diagnostics, and hand back the C on success.
fn compile(source: &str, file_name: &str, config: &CompilerConfig) -> CliResult<String> {
    let out = api::compile_source(source, file_name, config);
    report(&out, file_name, source, config);
    match out.code {
        Some(code) => Ok(code),
        None => {
            let errors = out.diagnostics.iter().filter(|d| d.is_error()).count() + out.suppressed;
            let message = if errors > 0 {
                format!("error: could not compile '{file_name}' due to {errors} previous error(s)")
            } else {
                String::new()
            };
            Err(CliError::status(message, out.status))
        }
    }
}

// ============================================================================
// Debug commands
// ============================================================================

/// Lex and display tokens, one per line: position, kind name, source text.
pub fn lex_file(path: &Path) -> CliResult<ExitCode> {
    let source = read_source(path)?;
    let mut errors = 0usize;
    for token in Lexer::new(&source) {
        let text = source.get(token.span.start..token.span.end).unwrap_or_default();
        println!("{}:{}\t{}\t{}", token.pos.line, token.pos.col, token.kind.name(), text.escape_debug());
        if let TokenKind::Error(message) = &token.kind {
            eprintln!("error[lexical]: {message}\n  --> {}:{}:{}", display_name(path), token.pos.line, token.pos.col);
            errors += 1;
        }
    }
    if errors > 0 {
        return Err(CliError::status("", Status::Lex));
    }
    Ok(ExitCode::SUCCESS)
}

/// Parse and display the AST dump.
pub fn parse_file(path: &Path, config: &CompilerConfig) -> CliResult<ExitCode> {
    let source = read_source(path)?;
    let file_name = display_name(path);
    let out = parser::parse_source(&source, &config.parse_options()).map_err(DreamError::from)?;
    print!("{}", out.ast.dump(out.root));
    for d in out.diagnostics.iter() {
        print_diagnostic(d, &file_name, &source, config);
    }
    match out.diagnostics.first_error_stage() {
        Some(Stage::Lexer) => Err(CliError::status("", Status::Lex)),
        Some(_) => Err(CliError::status("", Status::Parse)),
        None => Ok(ExitCode::SUCCESS),
    }
}

/// Print the generated C.
pub fn emit_c(path: &Path, config: &CompilerConfig) -> CliResult<ExitCode> {
    let source = read_source(path)?;
    let code = compile(&source, &display_name(path), config)?;
    print!("{code}");
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// Commands
// ============================================================================

/// Check a file: everything up to and including code generation, without writing anything.
pub fn check_file(path: &Path, config: &CompilerConfig) -> CliResult<ExitCode> {
    let source = read_source(path)?;
    compile(&source, &display_name(path), config)?;
    println!("✓ {} checked", display_name(path));
    Ok(ExitCode::SUCCESS)
}

/// Write the generated C next to a copy of the runtime header.
pub fn build_file(path: &Path, output: Option<&Path>, config: &CompilerConfig) -> CliResult<ExitCode> {
    let source = read_source(path)?;
    let code = compile(&source, &display_name(path), config)?;

    let out_path = output.map_or_else(|| path.with_extension("c"), Path::to_path_buf);
    let header_path = out_path
        .parent()
        .map_or_else(|| PathBuf::from(RUNTIME_HEADER_NAME), |dir| dir.join(RUNTIME_HEADER_NAME));
    write_file(&out_path, &code)?;
    write_file(&header_path, RUNTIME_HEADER)?;

    println!("✓ Wrote {}", out_path.display());
    println!("  compile with: {} -std=c11 -fwrapv -O2 {}", config.cc, out_path.display());
    Ok(ExitCode::SUCCESS)
}

fn write_file(path: &Path, contents: &str) -> CliResult<()> {
    fs::write(path, contents).map_err(|source| {
        CliError::from(DreamError::Write {
            path: path.to_path_buf(),
            source,
        })
    })
}

/// Build and run a source file.
pub fn run_file(path: &Path, config: &CompilerConfig) -> CliResult<ExitCode> {
    let source = read_source(path)?;
    run_source(&source, &display_name(path), config)
}

/// Build and run `source` with the terminal attached, so the program can read input interactively.
pub fn run_source(source: &str, file_name: &str, config: &CompilerConfig) -> CliResult<ExitCode> {
    let code = compile(source, file_name, config)?;
    let toolchain = Toolchain::from_config(config);
    let build = toolchain.build(&code).map_err(|err| DreamError::CompilerUnavailable {
        cc: toolchain.cc().to_string(),
        source: err,
    })?;
    if !build.success {
        return Err(DreamError::CompilerFailed { stderr: build.stderr }.into());
    }
    let result = toolchain.run_inherited(&build).map_err(DreamError::Execute)?;
    if result.success {
        Ok(ExitCode::SUCCESS)
    } else {
        tracing::debug!(exit_code = ?result.exit_code, "program failed");
        Ok(Status::Runtime.into())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn scratch_file(name: &str, contents: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("dream-cli-{}-{name}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_check_reports_the_stage_exit_code() {
        let path = scratch_file("bad.dr", "int x = y;");
        let err = check_file(&path, &CompilerConfig::default()).unwrap_err();
        assert_eq!(err.exit_code, ExitCode(3));
        assert!(err.message.contains("1 previous error"), "{}", err.message);
    }

    #[test]
    fn test_missing_file_is_an_io_error() {
        let err = check_file(Path::new("/no/such/file.dr"), &CompilerConfig::default()).unwrap_err();
        assert_eq!(err.exit_code, ExitCode(5));
    }

    #[test]
    fn test_build_writes_c_and_runtime_header() {
        let path = scratch_file("hello.dr", "print(\"hello\");");
        let out = path.with_file_name("hello_out.c");
        build_file(&path, Some(&out), &CompilerConfig::default()).unwrap();
        let code = fs::read_to_string(&out).unwrap();
        assert!(code.contains("dr_print_str(\"hello\", true);"));
        assert!(out.with_file_name(RUNTIME_HEADER_NAME).is_file());
    }
}
