//! Dream compiler version information.
//!
//! This module exposes the compiler version as a single constant so all subsystems
//! (CLI, generated C headers) agree on the same value.
//!
//! ## Notes
//!
//! - The value is taken from Cargo metadata (`CARGO_PKG_VERSION`) at compile time.

/// The Dream compiler version string (for example, `0.1.0`).
pub const DREAM_VERSION: &str = env!("CARGO_PKG_VERSION");
