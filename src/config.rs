//! Compiler configuration
//!
//! One [`CompilerConfig`] drives a whole compilation: diagnostic limits, which optimizer passes run, and how the
//! generated C is compiled. CLI flags are applied on top of [`CompilerConfig::from_env`].

use crate::frontend::diagnostics::DEFAULT_MAX_ERRORS;
use crate::frontend::parser::{DEFAULT_MAX_NESTING, ParseOptions};
use crate::optimizer::OptimizerConfig;

/// Environment variable naming the C compiler.
pub const CC_ENV: &str = "DREAM_CC";

/// How diagnostics are rendered for humans.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportStyle {
    /// `file:line:col: error: message` with a caret line.
    #[default]
    Plain,
    /// `miette` graphical reports.
    Fancy,
}

/// Settings for one compilation.
#[derive(Debug, Clone)]
pub struct CompilerConfig {
    /// Run the optimizer at all.
    pub optimize: bool,
    /// Individual optimizer passes.
    pub optimizer: OptimizerConfig,
    /// Errors recorded before the rest are only counted.
    pub max_errors: usize,
    /// Deeper block or expression nesting is resource exhaustion.
    pub max_nesting: usize,
    /// C compiler executable.
    pub cc: String,
    /// Extra flags for the C compiler.
    pub cc_flags: Vec<String>,
    /// Keep the C build directory after running.
    pub keep_artifacts: bool,
    pub report_style: ReportStyle,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            optimize: true,
            optimizer: OptimizerConfig::default(),
            max_errors: DEFAULT_MAX_ERRORS,
            max_nesting: DEFAULT_MAX_NESTING,
            cc: "cc".to_string(),
            cc_flags: vec!["-O2".to_string()],
            keep_artifacts: false,
            report_style: ReportStyle::Plain,
        }
    }
}

impl CompilerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults, with the C compiler taken from `DREAM_CC` when set.
    pub fn from_env() -> Self {
        let config = Self::default();
        match std::env::var(CC_ENV) {
            Ok(cc) if !cc.trim().is_empty() => config.with_cc(cc.trim()),
            _ => config,
        }
    }

    pub fn with_optimize(mut self, optimize: bool) -> Self {
        self.optimize = optimize;
        self
    }

    pub fn with_optimizer(mut self, optimizer: OptimizerConfig) -> Self {
        self.optimizer = optimizer;
        self
    }

    /// Set the error cap; zero is treated as one so the first error is always kept.
    pub fn with_max_errors(mut self, max_errors: usize) -> Self {
        self.max_errors = max_errors.max(1);
        self
    }

    pub fn with_max_nesting(mut self, max_nesting: usize) -> Self {
        self.max_nesting = max_nesting;
        self
    }

    pub fn with_cc(mut self, cc: impl Into<String>) -> Self {
        self.cc = cc.into();
        self
    }

    pub fn with_cc_flags(mut self, flags: Vec<String>) -> Self {
        self.cc_flags = flags;
        self
    }

    pub fn with_keep_artifacts(mut self, keep: bool) -> Self {
        self.keep_artifacts = keep;
        self
    }

    pub fn with_report_style(mut self, style: ReportStyle) -> Self {
        self.report_style = style;
        self
    }

    /// Parser limits derived from this configuration.
    pub fn parse_options(&self) -> ParseOptions {
        ParseOptions {
            max_nesting: self.max_nesting,
            max_errors: self.max_errors,
        }
    }

    /// The optimizer passes that actually run: none when optimization is off.
    pub fn effective_optimizer(&self) -> OptimizerConfig {
        if self.optimize {
            self.optimizer
        } else {
            OptimizerConfig::disabled()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CompilerConfig::default();
        assert!(config.optimize);
        assert_eq!(config.max_errors, 100);
        assert_eq!(config.max_nesting, 100_000);
        assert_eq!(config.cc, "cc");
        assert_eq!(config.report_style, ReportStyle::Plain);
        assert!(!config.keep_artifacts);
    }

    #[test]
    fn test_builder_chain() {
        let config = CompilerConfig::new()
            .with_optimize(false)
            .with_max_errors(5)
            .with_max_nesting(64)
            .with_cc("clang")
            .with_report_style(ReportStyle::Fancy);
        assert_eq!(config.cc, "clang");
        assert_eq!(config.parse_options().max_errors, 5);
        assert_eq!(config.parse_options().max_nesting, 64);
        assert_eq!(config.effective_optimizer(), OptimizerConfig::disabled());
        assert_eq!(config.report_style, ReportStyle::Fancy);
    }

    #[test]
    fn test_zero_error_cap_keeps_one() {
        assert_eq!(CompilerConfig::new().with_max_errors(0).max_errors, 1);
    }
}
