//! Common subexpression elimination within straight-line statement lists.
//!
//! A declaration `T x = e;` whose variable is never written, with `e` pure and built only from variables that are
//! never written, makes `x` a valid replacement for any later `e` of the same type in the same list. Only the
//! expressions evaluated at the list's own scope level are rewritten, so the replacement name cannot be shadowed.

use std::collections::{HashMap, HashSet};
use std::fmt::Write;

use dream_core::types::{TypeId, TypeTable};

use crate::frontend::ast::{Ast, NodeId, NodeKind};
use crate::frontend::stack::ensure_sufficient_stack;

use super::effects;

pub(super) fn run(ast: &mut Ast, root: NodeId, types: &TypeTable) -> usize {
    let written = effects::written_decls(ast, root);
    let mut pass = Cse {
        ast,
        types,
        written,
        changes: 0,
    };
    pass.visit(root);
    pass.changes
}

struct Cse<'a> {
    ast: &'a mut Ast,
    types: &'a TypeTable,
    written: HashSet<NodeId>,
    changes: usize,
}

/// An expression already held by a declaration.
struct Available {
    decl: NodeId,
    name: String,
    ty: TypeId,
}

impl Cse<'_> {
    fn visit(&mut self, id: NodeId) {
        match self.ast.kind(id) {
            NodeKind::Try | NodeKind::StructDecl { .. } | NodeKind::EnumDecl { .. } => return,
            NodeKind::Block => self.list(id, 0),
            NodeKind::Case { is_default } => {
                let skip = usize::from(!is_default);
                self.list(id, skip);
            }
            _ => {}
        }
        for child in self.ast.children(id).to_vec() {
            ensure_sufficient_stack(|| self.visit(child));
        }
    }

    fn list(&mut self, id: NodeId, skip: usize) {
        let mut available: HashMap<String, Available> = HashMap::new();
        for stmt in self.ast.children(id).iter().skip(skip).copied().collect::<Vec<_>>() {
            for expr in self.scope_level_exprs(stmt) {
                self.replace_in(expr, &available);
            }
            if let Some((key, entry)) = self.candidate(stmt) {
                available.entry(key).or_insert(entry);
            }
        }
    }

    /// Expressions of `stmt` that are evaluated directly in the enclosing scope.
    fn scope_level_exprs(&self, stmt: NodeId) -> Vec<NodeId> {
        match self.ast.kind(stmt) {
            NodeKind::VarDecl(_)
            | NodeKind::ExprStmt
            | NodeKind::Return
            | NodeKind::Throw
            | NodeKind::If
            | NodeKind::While
            | NodeKind::Switch => self.ast.child(stmt, 0).into_iter().collect(),
            _ => Vec::new(),
        }
    }

    fn candidate(&self, stmt: NodeId) -> Option<(String, Available)> {
        let var = self.ast.var_decl(stmt)?;
        let init = self.ast.child(stmt, 0)?;
        let ty = self.ast.ty(init)?;
        let same_type = self.ast.ty(stmt).is_some_and(|declared| self.types.equal(declared, ty));
        if !same_type || self.written.contains(&stmt) || self.types.as_array(ty).is_some() || !self.reusable(init) {
            return None;
        }
        let entry = Available {
            decl: stmt,
            name: var.name.clone(),
            ty,
        };
        Some((self.key(init), entry))
    }

    /// Non-trivial, pure, and reading only variables that never change.
    fn reusable(&self, expr: NodeId) -> bool {
        !effects::is_trivial(self.ast.kind(expr))
            && !matches!(self.ast.kind(expr), NodeKind::ArrayInit)
            && effects::is_pure(self.ast, self.types, expr)
            && effects::idents_all(self.ast, expr, &|decl| !self.written.contains(&decl))
    }

    /// Rewrite the largest matching subexpressions of `expr`.
    fn replace_in(&mut self, expr: NodeId, available: &HashMap<String, Available>) {
        if available.is_empty() {
            return;
        }
        let mut stack = vec![expr];
        while let Some(id) = stack.pop() {
            if self.reusable(id) {
                let found = available
                    .get(&self.key(id))
                    .filter(|a| self.ast.ty(id).is_some_and(|ty| self.types.equal(ty, a.ty)));
                if let Some(a) = found {
                    self.ast.replace(id, NodeKind::Ident(a.name.clone()), []);
                    self.ast.set_binding(id, a.decl);
                    self.changes += 1;
                    continue;
                }
            }
            stack.extend(self.ast.children(id).iter().copied());
        }
    }

    /// Structural key; identifiers are keyed by their declaration so shadowed names never collide.
    fn key(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.write_key(id, &mut out);
        out
    }

    fn write_key(&self, id: NodeId, out: &mut String) {
        match self.ast.kind(id) {
            NodeKind::Ident(_) => {
                let _ = write!(out, "v{:?}", self.ast.binding(id));
            }
            NodeKind::Float(v) => {
                let _ = write!(out, "f{:x}", v.to_bits());
            }
            other => {
                let _ = write!(out, "{other:?}");
            }
        }
        out.push('(');
        for &child in self.ast.children(id) {
            ensure_sufficient_stack(|| self.write_key(child, out));
            out.push(',');
        }
        out.push(')');
    }
}
