//! On-demand stack growth for the recursive passes.
//!
//! Parsing, analysis, optimization and codegen all recurse over the tree, so a deeply nested program would
//! overflow a fixed thread stack long before it ran out of memory. Every recursive step goes through
//! [`ensure_sufficient_stack`], which switches to a fresh heap-allocated segment when the current one runs low.

/// Remaining stack below which a new segment is allocated.
const RED_ZONE: usize = 128 * 1024;

/// Size of each newly allocated segment.
const SEGMENT_SIZE: usize = 4 * 1024 * 1024;

/// Run `f`, moving to a new stack segment first if less than the red zone is left.
#[inline]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, SEGMENT_SIZE, f)
}
