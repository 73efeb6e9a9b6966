//! Effect and data-flow queries shared by the optimizer passes.
//!
//! An expression is *pure* when evaluating it can neither change state nor raise a runtime exception: no calls,
//! console operations, assignments or increments, no indexing (bounds are checked at run time) and no integer
//! division or modulo unless the divisor is a literal other than `0`.

use std::collections::{HashMap, HashSet};

use dream_core::types::TypeTable;

use crate::frontend::ast::{Ast, BinaryOp, NodeId, NodeKind, Storage};

pub fn is_pure(ast: &Ast, types: &TypeTable, root: NodeId) -> bool {
    let mut stack = vec![root];
    while let Some(id) = stack.pop() {
        let own = match ast.kind(id) {
            NodeKind::Call(_) | NodeKind::Console(_) | NodeKind::Assign(_) | NodeKind::Index => false,
            NodeKind::Unary(op) => !op.is_inc_dec(),
            NodeKind::Binary(BinaryOp::Div | BinaryOp::Mod) => !is_int(ast, types, id) || has_safe_divisor(ast, id),
            NodeKind::Error => false,
            _ => true,
        };
        if !own {
            return false;
        }
        stack.extend(ast.children(id).iter().copied());
    }
    true
}

fn is_int(ast: &Ast, types: &TypeTable, id: NodeId) -> bool {
    ast.ty(id).is_some_and(|t| types.is_integral(t))
}

/// Divisor is a literal that cannot trap (`0`) or overflow (`-1`).
pub fn has_safe_divisor(ast: &Ast, id: NodeId) -> bool {
    ast.child(id, 1)
        .is_some_and(|d| matches!(ast.kind(d), NodeKind::Int(v) if *v != 0 && *v != -1))
}

/// Literals, identifiers and enum members: nothing worth caching.
pub fn is_trivial(kind: &NodeKind) -> bool {
    kind.is_literal() || matches!(kind, NodeKind::Ident(_) | NodeKind::EnumMember { .. } | NodeKind::Empty)
}

/// The identifier at the root of an assignment target (`x`, `x[i]`, `x.f`).
pub fn target_root(ast: &Ast, mut id: NodeId) -> Option<NodeId> {
    loop {
        match ast.kind(id) {
            NodeKind::Ident(_) => return Some(id),
            NodeKind::Index | NodeKind::Field(_) => id = ast.child(id, 0)?,
            _ => return None,
        }
    }
}

/// Declarations written (assigned, incremented) anywhere inside `root`.
pub fn written_decls(ast: &Ast, root: NodeId) -> HashSet<NodeId> {
    let mut written = HashSet::new();
    let mut stack = vec![root];
    while let Some(id) = stack.pop() {
        let target = match ast.kind(id) {
            NodeKind::Assign(_) => ast.child(id, 0),
            NodeKind::Unary(op) if op.is_inc_dec() => ast.child(id, 0),
            _ => None,
        };
        if let Some(decl) = target.and_then(|t| target_root(ast, t)).and_then(|r| ast.binding(r)) {
            written.insert(decl);
        }
        stack.extend(ast.children(id).iter().copied());
    }
    written
}

/// Number of identifier uses per declaration inside `root`.
pub fn reference_counts(ast: &Ast, root: NodeId) -> HashMap<NodeId, usize> {
    let mut counts = HashMap::new();
    let mut stack = vec![root];
    while let Some(id) = stack.pop() {
        if matches!(ast.kind(id), NodeKind::Ident(_)) {
            if let Some(decl) = ast.binding(id) {
                *counts.entry(decl).or_insert(0) += 1;
            }
        }
        stack.extend(ast.children(id).iter().copied());
    }
    counts
}

/// Declarations introduced anywhere inside `root`.
pub fn declared_in(ast: &Ast, root: NodeId) -> HashSet<NodeId> {
    let mut declared = HashSet::new();
    let mut stack = vec![root];
    while let Some(id) = stack.pop() {
        if matches!(ast.kind(id), NodeKind::VarDecl(_)) {
            declared.insert(id);
        }
        stack.extend(ast.children(id).iter().copied());
    }
    declared
}

pub fn contains_call(ast: &Ast, root: NodeId) -> bool {
    let mut stack = vec![root];
    while let Some(id) = stack.pop() {
        if matches!(ast.kind(id), NodeKind::Call(_)) {
            return true;
        }
        stack.extend(ast.children(id).iter().copied());
    }
    false
}

pub fn is_global(ast: &Ast, decl: NodeId) -> bool {
    ast.var_decl(decl).is_some_and(|v| v.storage == Storage::Global)
}

/// Every identifier inside `id` binds to a declaration accepted by `ok`.
pub fn idents_all(ast: &Ast, id: NodeId, ok: &dyn Fn(NodeId) -> bool) -> bool {
    let mut stack = vec![id];
    while let Some(node) = stack.pop() {
        if matches!(ast.kind(node), NodeKind::Ident(_)) {
            match ast.binding(node) {
                Some(decl) if ok(decl) => {}
                _ => return false,
            }
        }
        stack.extend(ast.children(node).iter().copied());
    }
    true
}
