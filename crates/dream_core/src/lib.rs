//! Provide the canonical language vocabulary and the type model for the Dream compiler.
//!
//! This crate is intentionally small and dependency-light. It holds the pieces that both the syntax frontend and
//! the semantic passes agree on:
//! - the reserved keyword, operator and punctuation registries ([`lang`]), and
//! - the arena-backed type table ([`types`]).
//!
//! ## Notes
//!
//! - No IO and no global state. Every table is owned by the compilation that created it.

#![forbid(unsafe_code)]

pub mod lang;
pub mod types;
