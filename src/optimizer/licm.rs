//! Loop-invariant code motion.
//!
//! A pure expression inside a loop whose variables are neither declared nor written in the loop is computed once
//! into a synthetic `dr_licm<N>` local placed right before the loop. A loop that calls a function is assumed to
//! write every global.
//!
//! Only expressions that cannot fail are moved: indexing is excluded, and integer division needs a literal divisor
//! other than `0` and `-1` (see [`effects::is_pure`]).

use std::collections::HashSet;

use dream_core::types::{Type, TypeId, TypeTable};

use crate::frontend::ast::{Ast, NodeId, NodeKind, Storage, TypeName, TypeRef, VarDecl};
use crate::frontend::stack::ensure_sufficient_stack;

use super::effects;

pub(super) fn run(ast: &mut Ast, root: NodeId, types: &TypeTable, next_name: &mut usize) -> usize {
    let mut pass = Licm {
        ast,
        types,
        next_name,
        changes: 0,
    };
    pass.visit(root);
    pass.changes
}

struct Licm<'a> {
    ast: &'a mut Ast,
    types: &'a TypeTable,
    next_name: &'a mut usize,
    changes: usize,
}

/// What a loop may change.
struct LoopFacts {
    declared: HashSet<NodeId>,
    written: HashSet<NodeId>,
    calls: bool,
}

impl Licm<'_> {
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
        let children = self.ast.children(id).to_vec();
        let mut out = Vec::with_capacity(children.len());
        let mut hoisted = false;
        for (i, &stmt) in children.iter().enumerate() {
            let is_loop = matches!(self.ast.kind(stmt), NodeKind::While | NodeKind::DoWhile | NodeKind::For);
            if i >= skip && is_loop {
                let decls = self.hoist_from(stmt);
                hoisted |= !decls.is_empty();
                out.extend(decls);
            }
            out.push(stmt);
        }
        if hoisted {
            self.ast.set_children(id, out);
        }
    }

    /// Hoist every maximal invariant expression of `lp`; returns the new declarations in evaluation order.
    fn hoist_from(&mut self, lp: NodeId) -> Vec<NodeId> {
        let facts = LoopFacts {
            declared: effects::declared_in(self.ast, lp),
            written: effects::written_decls(self.ast, lp),
            calls: effects::contains_call(self.ast, lp),
        };
        let children = self.ast.children(lp).to_vec();
        // The for-loop initializer runs once already.
        let parts = match self.ast.kind(lp) {
            NodeKind::For => &children[1..],
            _ => &children[..],
        };
        let mut found = Vec::new();
        for &part in parts {
            self.find(part, &facts, &mut found);
        }
        found.into_iter().filter_map(|expr| self.hoist(expr)).collect()
    }

    fn find(&self, id: NodeId, facts: &LoopFacts, found: &mut Vec<NodeId>) {
        if matches!(self.ast.kind(id), NodeKind::Try) {
            return;
        }
        if self.invariant(id, facts) {
            found.push(id);
            return;
        }
        for &child in self.ast.children(id) {
            ensure_sufficient_stack(|| self.find(child, facts, found));
        }
    }

    fn invariant(&self, id: NodeId, facts: &LoopFacts) -> bool {
        let computes = match self.ast.kind(id) {
            NodeKind::Unary(op) => !op.is_inc_dec(),
            NodeKind::Binary(_) | NodeKind::Concat | NodeKind::ToStr | NodeKind::Conditional | NodeKind::Cast(_) => {
                true
            }
            _ => false,
        };
        let scalar = self.ast.ty(id).is_some_and(|ty| self.type_ref(ty).is_some());
        computes
            && scalar
            && effects::is_pure(self.ast, self.types, id)
            && effects::idents_all(self.ast, id, &|decl| {
                !facts.declared.contains(&decl)
                    && !facts.written.contains(&decl)
                    && !(facts.calls && effects::is_global(self.ast, decl))
            })
    }

    /// Move `expr` into a new declaration and leave a reference to it in its place.
    fn hoist(&mut self, expr: NodeId) -> Option<NodeId> {
        let ty = self.ast.ty(expr)?;
        let type_ref = self.type_ref(ty)?;
        let name = format!("dr_licm{}", *self.next_name);
        *self.next_name += 1;

        let moved = self.ast.get(expr).clone();
        let value = self.ast.alloc(moved);
        let var = VarDecl {
            name: name.clone(),
            ty: type_ref,
            is_const: false,
            array_len: None,
            storage: Storage::Local,
            constant: false,
            synthetic: true,
        };
        let decl = self.ast.alloc_like(expr, NodeKind::VarDecl(var), [value]);
        self.ast.set_ty(decl, ty);
        self.ast.replace(expr, NodeKind::Ident(name), []);
        self.ast.set_binding(expr, decl);
        self.changes += 1;
        Some(decl)
    }

    /// Source-level spelling of a scalar type; `None` for aggregates.
    fn type_ref(&self, ty: TypeId) -> Option<TypeRef> {
        let name = match self.types.get(ty) {
            Type::Int => TypeName::Int,
            Type::Float => TypeName::Float,
            Type::Bool => TypeName::Bool,
            Type::Char => TypeName::Char,
            Type::Str => TypeName::Str,
            Type::Enum(e) => TypeName::Named(e.name.clone()),
            _ => return None,
        };
        Some(TypeRef::simple(name))
    }
}
