//! AST-level optimizer
//!
//! Runs on analyzed, error-free programs. The passes rewrite the AST in place and keep every annotation valid:
//! a replaced node keeps its type, and new nodes get a type and binding before they are linked in.
//!
//! ## Passes
//! Applied in a fixed order and repeated until a full round changes nothing (or `max_iterations` is reached):
//! 1. [`fold`]: constant folding and propagation of flagged constants.
//! 2. [`dce`]: unreachable statements, constant branches and unused pure declarations.
//! 3. [`cse`]: repeated pure expressions reuse an earlier declaration with the same initializer.
//! 4. [`licm`]: loop-invariant pure expressions are hoisted into a temporary before the loop.
//!
//! ## Notes
//! - Nothing inside a `try` statement is touched.
//! - Effectful code is never removed or reordered; see [`effects::is_pure`].

mod cse;
mod dce;
pub mod effects;
mod fold;
mod licm;

#[cfg(test)]
mod tests;

use dream_core::types::TypeTable;

use crate::frontend::ast::{Ast, NodeId};

/// Which passes run, and how often.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OptimizerConfig {
    pub fold: bool,
    pub dce: bool,
    pub cse: bool,
    pub licm: bool,
    pub max_iterations: usize,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            fold: true,
            dce: true,
            cse: true,
            licm: true,
            max_iterations: 8,
        }
    }
}

impl OptimizerConfig {
    /// Every pass disabled.
    pub fn disabled() -> Self {
        Self {
            fold: false,
            dce: false,
            cse: false,
            licm: false,
            max_iterations: 0,
        }
    }
}

/// Rewrite counts, summed over all rounds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OptStats {
    pub rounds: usize,
    pub folded: usize,
    pub removed: usize,
    pub reused: usize,
    pub hoisted: usize,
}

impl OptStats {
    pub fn total(&self) -> usize {
        self.folded + self.removed + self.reused + self.hoisted
    }
}

/// Optimize the program rooted at `root`.
#[tracing::instrument(skip_all, fields(nodes = ast.len()))]
pub fn optimize(ast: &mut Ast, root: NodeId, types: &TypeTable, config: &OptimizerConfig) -> OptStats {
    let mut stats = OptStats::default();
    let mut hoist_names = 0usize;
    while stats.rounds < config.max_iterations {
        stats.rounds += 1;
        let mut changed = 0;
        if config.fold {
            let n = fold::run(ast, root, types);
            stats.folded += n;
            changed += n;
        }
        if config.dce {
            let n = dce::run(ast, root, types);
            stats.removed += n;
            changed += n;
        }
        if config.cse {
            let n = cse::run(ast, root, types);
            stats.reused += n;
            changed += n;
        }
        if config.licm {
            let n = licm::run(ast, root, types, &mut hoist_names);
            stats.hoisted += n;
            changed += n;
        }
        tracing::trace!(round = stats.rounds, changed, "optimizer round");
        if changed == 0 {
            break;
        }
    }
    tracing::debug!(
        rounds = stats.rounds,
        folded = stats.folded,
        removed = stats.removed,
        reused = stats.reused,
        hoisted = stats.hoisted,
        "optimization finished"
    );
    stats
}

/// Overwrite `id` with a copy of `src` (kind, children, type and binding), keeping the position of `id`.
pub(crate) fn replace_with_node(ast: &mut Ast, id: NodeId, src: NodeId) {
    let node = ast.get(src).clone();
    let target = ast.get_mut(id);
    target.kind = node.kind;
    target.children = node.children;
    target.ty = node.ty;
    target.binding = node.binding;
}
