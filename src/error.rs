//! Fatal compiler errors
//!
//! Problems in the Dream program itself are diagnostics (see [`crate::diagnostics`]) and never abort a compilation.
//! [`DreamError`] covers what does: host failures and resource exhaustion.

use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

use crate::backend::CodegenError;
use crate::frontend::diagnostics::FatalError;

/// Largest source file the compiler accepts.
pub const MAX_SOURCE_BYTES: u64 = 100 * 1024 * 1024;

#[derive(Debug, Error, Diagnostic)]
pub enum DreamError {
    #[error("cannot read '{}': {source}", path.display())]
    #[diagnostic(code(dream::io))]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot write '{}': {source}", path.display())]
    #[diagnostic(code(dream::io))]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("'{}' is not valid UTF-8", path.display())]
    #[diagnostic(code(dream::io), help("Dream source files must be UTF-8 encoded"))]
    NotUtf8 { path: PathBuf },

    #[error("source is {size} bytes, larger than the {limit} byte limit")]
    #[diagnostic(code(dream::resource_exhausted))]
    SourceTooLarge { size: u64, limit: u64 },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Fatal(#[from] FatalError),

    #[error("code generation failed: {0}")]
    #[diagnostic(code(dream::codegen))]
    Codegen(#[from] CodegenError),

    #[error("C compiler '{cc}' could not be started: {source}")]
    #[diagnostic(
        code(dream::toolchain),
        help("install a C11 compiler or point DREAM_CC (or --cc) at one")
    )]
    CompilerUnavailable {
        cc: String,
        #[source]
        source: std::io::Error,
    },

    #[error("C compilation failed:\n{stderr}")]
    #[diagnostic(code(dream::toolchain), help("this is a compiler bug; please report it with the source program"))]
    CompilerFailed { stderr: String },

    #[error("cannot run the compiled program: {0}")]
    #[diagnostic(code(dream::io))]
    Execute(#[source] std::io::Error),
}

impl DreamError {
    /// The status code reported for this error (see [`crate::api::Status`]).
    pub fn status(&self) -> crate::api::Status {
        use crate::api::Status;
        match self {
            Self::Read { .. } | Self::Write { .. } | Self::NotUtf8 { .. } | Self::Execute(_) => Status::Io,
            Self::SourceTooLarge { .. } | Self::Fatal(_) => Status::ResourceExhausted,
            Self::Codegen(_) | Self::CompilerUnavailable { .. } | Self::CompilerFailed { .. } => Status::Codegen,
        }
    }
}

/// Read a source file, enforcing the size cap and UTF-8.
///
/// ## Errors
/// Returns [`DreamError::Read`], [`DreamError::SourceTooLarge`] or [`DreamError::NotUtf8`].
pub fn read_source(path: impl Into<PathBuf>) -> Result<String, DreamError> {
    let path = path.into();
    let size = std::fs::metadata(&path)
        .map_err(|source| DreamError::Read {
            path: path.clone(),
            source,
        })?
        .len();
    if size > MAX_SOURCE_BYTES {
        return Err(DreamError::SourceTooLarge {
            size,
            limit: MAX_SOURCE_BYTES,
        });
    }
    let bytes = std::fs::read(&path).map_err(|source| DreamError::Read {
        path: path.clone(),
        source,
    })?;
    String::from_utf8(bytes).map_err(|_| DreamError::NotUtf8 { path })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::Status;

    #[test]
    fn missing_file_is_an_io_error() {
        let err = read_source("/definitely/not/here.dr").unwrap_err();
        assert!(matches!(err, DreamError::Read { .. }));
        assert_eq!(err.status(), Status::Io);
        assert!(err.to_string().contains("/definitely/not/here.dr"));
    }

    #[test]
    fn nesting_errors_are_resource_exhaustion() {
        let err = DreamError::from(FatalError::NestingTooDeep { limit: 4, line: 1 });
        assert_eq!(err.status(), Status::ResourceExhausted);
        assert!(err.to_string().contains("nesting depth exceeds 4"));
    }
}
