//! Dead code elimination.
//!
//! Removes statements that can never run, collapses branches on literal conditions, and drops declarations that
//! are never read when their initializer is pure.

use std::collections::HashMap;

use dream_core::types::TypeTable;

use crate::frontend::ast::{Ast, NodeId, NodeKind, Storage};
use crate::frontend::stack::ensure_sufficient_stack;

use super::effects;

pub(super) fn run(ast: &mut Ast, root: NodeId, types: &TypeTable) -> usize {
    let references = effects::reference_counts(ast, root);
    let mut pass = Dce {
        ast,
        types,
        references,
        changes: 0,
    };
    pass.visit(root);
    pass.changes
}

struct Dce<'a> {
    ast: &'a mut Ast,
    types: &'a TypeTable,
    references: HashMap<NodeId, usize>,
    changes: usize,
}

/// Literal truth value of a condition.
fn literal_truth(kind: &NodeKind) -> Option<bool> {
    match kind {
        NodeKind::Bool(b) => Some(*b),
        NodeKind::Int(v) => Some(*v != 0),
        NodeKind::Char(c) => Some(*c != '\0'),
        _ => None,
    }
}

impl Dce<'_> {
    fn visit(&mut self, id: NodeId) {
        match self.ast.kind(id) {
            NodeKind::Try | NodeKind::StructDecl { .. } | NodeKind::EnumDecl { .. } => return,
            NodeKind::If => self.collapse_if(id),
            NodeKind::While => self.remove_false_loop(id),
            _ => {}
        }
        match self.ast.kind(id) {
            NodeKind::Block => self.prune_list(id, 0),
            NodeKind::Case { is_default } => {
                let skip = usize::from(!is_default);
                self.prune_list(id, skip);
            }
            _ => {}
        }
        for child in self.ast.children(id).to_vec() {
            ensure_sufficient_stack(|| self.visit(child));
        }
    }

    /// `if (true) a else b` becomes `{ a }`; a block keeps the branch's declarations scoped.
    fn collapse_if(&mut self, id: NodeId) {
        let children = self.ast.children(id).to_vec();
        let Some(taken) = literal_truth(self.ast.kind(children[0])) else { return };
        let branch = if taken { children.get(1) } else { children.get(2) };
        match branch {
            Some(&branch) => self.ast.replace(id, NodeKind::Block, [branch]),
            None => self.ast.replace(id, NodeKind::Empty, []),
        }
        self.changes += 1;
    }

    fn remove_false_loop(&mut self, id: NodeId) {
        let cond = self.ast.children(id)[0];
        if literal_truth(self.ast.kind(cond)) == Some(false) {
            self.ast.replace(id, NodeKind::Empty, []);
            self.changes += 1;
        }
    }

    /// Drop unreachable tails, empty statements and unused pure declarations from a statement list.
    fn prune_list(&mut self, id: NodeId, skip: usize) {
        let children = self.ast.children(id).to_vec();
        let (head, stmts) = children.split_at(skip.min(children.len()));
        let mut kept = head.to_vec();
        let mut removed = 0;
        for (i, &stmt) in stmts.iter().enumerate() {
            if self.is_removable(stmt) {
                removed += 1;
                continue;
            }
            kept.push(stmt);
            if matches!(
                self.ast.kind(stmt),
                NodeKind::Return | NodeKind::Break | NodeKind::Continue | NodeKind::Throw
            ) {
                removed += stmts.len() - i - 1;
                break;
            }
        }
        if removed > 0 {
            self.changes += removed;
            self.ast.set_children(id, kept);
        }
    }

    fn is_removable(&self, stmt: NodeId) -> bool {
        match self.ast.kind(stmt) {
            NodeKind::Empty => true,
            NodeKind::ExprStmt => self
                .ast
                .child(stmt, 0)
                .is_none_or(|e| effects::is_pure(self.ast, self.types, e)),
            NodeKind::VarDecl(var) => {
                let local = matches!(var.storage, Storage::Local | Storage::Global);
                let unused = self.references.get(&stmt).copied().unwrap_or(0) == 0;
                let pure_init = self
                    .ast
                    .child(stmt, 0)
                    .is_none_or(|init| effects::is_pure(self.ast, self.types, init));
                local && unused && pure_init
            }
            _ => false,
        }
    }
}
