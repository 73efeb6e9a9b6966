//! Semantic analysis for Dream programs
//!
//! Resolves names, assigns a type to every expression node and validates declarations. The AST is annotated in
//! place: `ty` on expressions and declarations, `binding` on identifiers and calls. A few nodes are rewritten into
//! explicit forms (`Concat`, `ToStr`, `EnumMember`).
//!
//! ## Passes
//! 1. **Collect** (top level only): struct and enum names, then enum members, struct fields and function
//!    signatures. The struct graph is checked for by-value cycles once all fields are known.
//! 2. **Check**: statements and function bodies in source order.
//!
//! Afterwards, variables with a literal-only initializer that are never written are flagged `constant`.
//!
//! ## Notes
//! - Every error is recorded in the diagnostics sink; analysis always runs to completion.
//! - The error type is accepted silently by every check, so one mistake produces one diagnostic.

mod check_decl;
mod check_expr;
mod check_stmt;
mod collect;
mod struct_graph;

use std::collections::HashMap;

use dream_core::types::{Type, TypeId, TypeTable};

use crate::frontend::ast::{Ast, NodeId, NodeKind, TypeName, TypeRef};
use crate::frontend::diagnostics::{Diagnostic, Diagnostics};
use crate::frontend::errors::{self, At};
use crate::frontend::stack::ensure_sufficient_stack;
use crate::frontend::symbols::{SymbolId, SymbolKind, SymbolTable};

/// Output of semantic analysis besides the annotated AST.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub types: TypeTable,
    /// Struct types ordered so that every struct comes after the structs it contains by value.
    pub struct_order: Vec<TypeId>,
}

/// Analyze the program rooted at `root`, annotating `ast` in place.
#[tracing::instrument(skip_all, fields(nodes = ast.len()))]
pub fn analyze(ast: &mut Ast, root: NodeId, diagnostics: &mut Diagnostics) -> Analysis {
    let errors_before = diagnostics.error_count();
    let mut analyzer = Analyzer::new(ast, diagnostics);
    analyzer.collect(root);
    analyzer.check_top_level(root);
    analyzer.finish();
    let Analyzer {
        types, struct_order, ..
    } = analyzer;
    tracing::debug!(
        types = types.len(),
        errors = diagnostics.error_count() - errors_before,
        "semantic analysis finished"
    );
    Analysis { types, struct_order }
}

/// Analyzer state for one compilation.
pub(crate) struct Analyzer<'a> {
    ast: &'a mut Ast,
    diagnostics: &'a mut Diagnostics,
    types: TypeTable,
    symbols: SymbolTable,
    /// Struct and enum names declared at the top level.
    named_types: HashMap<String, TypeId>,
    /// Top-level struct declarations with their types, in source order.
    struct_decls: Vec<(TypeId, NodeId)>,
    struct_order: Vec<TypeId>,
    /// Variable symbol created for each declaring `VarDecl`.
    decl_symbols: HashMap<NodeId, SymbolId>,
}

impl<'a> Analyzer<'a> {
    fn new(ast: &'a mut Ast, diagnostics: &'a mut Diagnostics) -> Self {
        Self {
            ast,
            diagnostics,
            types: TypeTable::new(),
            symbols: SymbolTable::new(),
            named_types: HashMap::new(),
            struct_decls: Vec::new(),
            struct_order: Vec::new(),
            decl_symbols: HashMap::new(),
        }
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    fn at(&self, id: NodeId) -> At {
        (self.ast.span(id), self.ast.pos(id))
    }

    fn report(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    fn render(&self, ty: TypeId) -> String {
        self.types.render(ty)
    }

    fn set_ty(&mut self, id: NodeId, ty: TypeId) -> TypeId {
        self.ast.set_ty(id, ty);
        ty
    }

    /// Resolve a written type. Unknown names are reported at `at` and yield the error type.
    fn resolve_type(&mut self, ty: &TypeRef, array_len: Option<u32>, at: NodeId) -> TypeId {
        let base = match &ty.name {
            TypeName::Int => self.types.int(),
            TypeName::Float => self.types.float(),
            TypeName::Bool => self.types.bool(),
            TypeName::Char => self.types.char(),
            TypeName::Str => self.types.string(),
            TypeName::Void => self.types.void(),
            TypeName::Named(name) => match self.named_types.get(name) {
                Some(&id) => id,
                None => {
                    let diagnostic = errors::unknown_type(name, self.at(at));
                    self.report(diagnostic);
                    return self.types.error();
                }
            },
        };
        if ty.is_array || array_len.is_some() {
            return self.types.array_of(base, array_len);
        }
        base
    }

    fn is_void(&self, ty: TypeId) -> bool {
        matches!(self.types.get(ty), Type::Void)
    }

    /// The error type, or a composite type containing it.
    fn mentions_error(&self, ty: TypeId) -> bool {
        match self.types.get(ty) {
            Type::Error => true,
            Type::Array(a) => self.mentions_error(a.elem),
            Type::Function(f) => f.params.iter().chain([&f.ret]).any(|&p| self.mentions_error(p)),
            _ => false,
        }
    }

    /// Whether a value of type `from` may be stored where `to` is expected.
    fn assignable(&self, to: TypeId, from: TypeId) -> bool {
        let t = &self.types;
        if t.is_error(to) || t.is_error(from) || t.equal(to, from) {
            return true;
        }
        match (t.get(to), t.get(from)) {
            (Type::Float, Type::Int | Type::Char) => true,
            (Type::Int, Type::Char) => true,
            (Type::Str, Type::Null) => true,
            (Type::Array(a), Type::Array(b)) => a.len.is_none() && t.equal(a.elem, b.elem),
            _ => false,
        }
    }

    /// Report a mismatch unless `value` (already checked) fits `expected`.
    fn expect_assignable(&mut self, expected: TypeId, value: NodeId) {
        let Some(found) = self.ast.ty(value) else { return };
        if !self.assignable(expected, found) {
            let diagnostic = errors::type_mismatch(&self.render(expected), &self.render(found), self.at(value));
            self.report(diagnostic);
        }
    }

    /// Expression trees made only of literals and operators.
    fn is_literal_tree(&self, id: NodeId) -> bool {
        match self.ast.kind(id) {
            k if k.is_literal() => true,
            NodeKind::Unary(op) if !op.is_inc_dec() => {
                ensure_sufficient_stack(|| self.is_literal_tree(self.ast.children(id)[0]))
            }
            NodeKind::Binary(_) | NodeKind::Concat | NodeKind::ToStr | NodeKind::Conditional | NodeKind::Cast(_) => {
                ensure_sufficient_stack(|| self.ast.children(id).iter().all(|&c| self.is_literal_tree(c)))
            }
            _ => false,
        }
    }

    // ========================================================================
    // Finish
    // ========================================================================

    /// Flag never-written variables with literal initializers as compile-time constants.
    fn finish(&mut self) {
        let mut constants = Vec::new();
        for (&decl, &symbol) in &self.decl_symbols {
            let Some(sym) = self.symbols.get(symbol) else { continue };
            let SymbolKind::Variable(info) = &sym.kind else { continue };
            if info.mutated {
                continue;
            }
            let Some(var) = self.ast.var_decl(decl) else { continue };
            if var.ty.is_array || var.array_len.is_some() {
                continue;
            }
            let Some(init) = self.ast.child(decl, 0) else { continue };
            if self.is_literal_tree(init) && sym.ty.is_some_and(|ty| !self.types.is_error(ty)) {
                constants.push(decl);
            }
        }
        for decl in constants {
            if let NodeKind::VarDecl(var) = &mut self.ast.get_mut(decl).kind {
                var.constant = true;
            }
        }
    }
}

#[cfg(test)]
mod tests;
