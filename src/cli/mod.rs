//! CLI module for the Dream compiler
//!
//! ## Commands
//!
//! - `check <file>` - Lex, parse and analyze (the default for a bare file argument)
//! - `build <file> [-o out.c]` - Write the generated C and the runtime header
//! - `run <file> | -c <code>` - Compile, build with the C compiler and run
//!
//! Debug flags `--lex`, `--parse` and `--emit-c` print the token stream, the AST dump and the generated C.
//!
//! ## Design
//!
//! The CLI uses clap for argument parsing with derive macros.
//! Command functions return `CliResult<T>` instead of calling `process::exit`.
//! Only the top-level `run()` function handles errors and exits.

// Enforce explicit error handling - no panicking in production code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub mod commands;

use std::fmt;
use std::path::PathBuf;
use std::process;

use clap::{Args, Parser, Subcommand};

use crate::api::Status;
use crate::config::{CompilerConfig, ReportStyle};
use crate::error::DreamError;
use crate::version::DREAM_VERSION;

// ============================================================================
// CLI Error handling
// ============================================================================

/// Exit code for CLI operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitCode(pub i32);

impl ExitCode {
    pub const SUCCESS: ExitCode = ExitCode(0);
    /// Usage errors that are not tied to a compilation stage.
    pub const FAILURE: ExitCode = ExitCode(1);
}

impl From<Status> for ExitCode {
    fn from(status: Status) -> Self {
        ExitCode(status.code())
    }
}

/// Error type for CLI operations.
///
/// Contains a user-facing message and an exit code. The CLI entry point
/// catches these errors, prints the message, and exits with the code.
#[derive(Debug)]
pub struct CliError {
    /// User-facing error message (already formatted for display)
    pub message: String,
    /// Exit code to return to the shell
    pub exit_code: ExitCode,
}

impl CliError {
    pub fn new(message: impl Into<String>, exit_code: ExitCode) -> Self {
        Self {
            message: message.into(),
            exit_code,
        }
    }

    /// Create a failure error (exit code 1).
    pub fn failure(message: impl Into<String>) -> Self {
        Self::new(message, ExitCode::FAILURE)
    }

    /// Create an error carrying the exit code of a compilation status.
    pub fn status(message: impl Into<String>, status: Status) -> Self {
        Self::new(message, status.into())
    }
}

impl From<DreamError> for CliError {
    fn from(err: DreamError) -> Self {
        let status = err.status();
        Self::status(format!("error: {err}"), status)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

// ============================================================================
// Clap CLI definition
// ============================================================================

/// The Dream programming language compiler
#[derive(Parser, Debug)]
#[command(name = "dream")]
#[command(version = DREAM_VERSION)]
#[command(about = "The Dream programming language compiler", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// File to check (default action when no subcommand given)
    #[arg(value_name = "FILE")]
    pub file: Option<PathBuf>,

    // Debug/development flags
    /// Tokenize only (debug)
    #[arg(long = "lex", value_name = "FILE", conflicts_with = "file")]
    pub lex_file: Option<PathBuf>,

    /// Parse only and dump the AST (debug)
    #[arg(long = "parse", value_name = "FILE", conflicts_with = "file")]
    pub parse_file: Option<PathBuf>,

    /// Print the generated C (debug)
    #[arg(long = "emit-c", value_name = "FILE", conflicts_with = "file")]
    pub emit_c_file: Option<PathBuf>,

    #[command(flatten)]
    pub options: GlobalOptions,
}

/// Options shared by every command.
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalOptions {
    /// Disable the optimizer
    #[arg(long = "no-opt", global = true)]
    pub no_opt: bool,

    /// Stop recording errors after this many
    #[arg(long = "max-errors", value_name = "N", global = true)]
    pub max_errors: Option<usize>,

    /// C compiler to use (default: $DREAM_CC or cc)
    #[arg(long = "cc", value_name = "CC", global = true)]
    pub cc: Option<String>,

    /// Render diagnostics as graphical reports
    #[arg(long = "fancy", global = true)]
    pub fancy: bool,

    /// Keep the C build directory after `run`
    #[arg(long = "keep-artifacts", global = true)]
    pub keep_artifacts: bool,
}

impl GlobalOptions {
    /// Apply the flags on top of the environment defaults.
    pub fn config(&self) -> CompilerConfig {
        let mut config = CompilerConfig::from_env()
            .with_optimize(!self.no_opt)
            .with_keep_artifacts(self.keep_artifacts);
        if let Some(max_errors) = self.max_errors {
            config = config.with_max_errors(max_errors);
        }
        if let Some(cc) = &self.cc {
            config = config.with_cc(cc.clone());
        }
        if self.fancy {
            config = config.with_report_style(ReportStyle::Fancy);
        }
        config
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Check a file for errors without generating code
    Check {
        /// Source file to check
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Compile to C
    Build {
        /// Source file to compile
        #[arg(value_name = "FILE")]
        file: PathBuf,
        /// Output C file (default: the source name with a `.c` extension)
        #[arg(short = 'o', long = "output", value_name = "OUT")]
        output: Option<PathBuf>,
    },

    /// Compile and run the program
    Run {
        /// Source file to run
        #[arg(value_name = "FILE", conflicts_with = "command")]
        file: Option<PathBuf>,
        /// Run inline source code
        #[arg(short = 'c', long = "command", value_name = "CODE")]
        command: Option<String>,
    },
}

// ============================================================================
// CLI entry point
// ============================================================================

/// Main CLI entry point.
///
/// This is the only place where `process::exit` is called. All command
/// implementations return `CliResult` and errors are handled here.
pub fn run() {
    let cli = Cli::parse();

    match execute(cli) {
        Ok(exit_code) => {
            if exit_code.0 != 0 {
                process::exit(exit_code.0);
            }
        }
        Err(e) => {
            if !e.message.is_empty() {
                eprintln!("{}", e.message);
            }
            process::exit(e.exit_code.0);
        }
    }
}

/// Execute the CLI command and return result.
fn execute(cli: Cli) -> CliResult<ExitCode> {
    let config = cli.options.config();

    // Handle debug flags first
    if let Some(file) = cli.lex_file {
        return commands::lex_file(&file);
    }
    if let Some(file) = cli.parse_file {
        return commands::parse_file(&file, &config);
    }
    if let Some(file) = cli.emit_c_file {
        return commands::emit_c(&file, &config);
    }

    match cli.command {
        Some(Command::Check { file }) => commands::check_file(&file, &config),
        Some(Command::Build { file, output }) => commands::build_file(&file, output.as_deref(), &config),
        Some(Command::Run { file, command }) => execute_run(file, command, &config),
        None => {
            // Default: check the file if provided
            if let Some(file) = cli.file {
                commands::check_file(&file, &config)
            } else {
                Err(CliError::failure("error: no input file (try `dream --help`)"))
            }
        }
    }
}

/// Handle the `run` subcommand with its various forms.
fn execute_run(file: Option<PathBuf>, code: Option<String>, config: &CompilerConfig) -> CliResult<ExitCode> {
    if let Some(code) = code {
        if code.is_empty() {
            return Err(CliError::failure("error: -c/--command requires source code string"));
        }
        commands::run_source(&code, "<command>", config)
    } else if let Some(file) = file {
        commands::run_file(&file, config)
    } else {
        Err(CliError::failure("error: run requires a file path or -c \"code\""))
    }
}

// ============================================================================
// Tests
// ============================================================================
