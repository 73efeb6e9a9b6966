//! Second pass over declarations: variables, function bodies, and the top-level driver.

use dream_core::types::TypeId;

use crate::frontend::ast::*;
use crate::frontend::errors;
use crate::frontend::symbols::*;

use super::Analyzer;

impl Analyzer<'_> {
    /// Check every top-level statement in source order.
    pub(super) fn check_top_level(&mut self, root: NodeId) {
        let void = self.types.void();
        self.set_ty(root, void);
        for stmt in self.ast.children(root).to_vec() {
            match self.ast.kind(stmt) {
                // Collected in the first pass.
                NodeKind::StructDecl { .. } | NodeKind::EnumDecl { .. } => {}
                NodeKind::Func(_) => self.check_function(stmt),
                _ => self.check_stmt(stmt),
            }
        }
    }

    // ========================================================================
    // Variables
    // ========================================================================

    pub(super) fn check_var_decl(&mut self, id: NodeId) {
        let Some(decl) = self.ast.var_decl(id).cloned() else { return };
        let mut ty = self.resolve_type(&decl.ty, decl.array_len, id);
        if self.is_void(ty) {
            let diagnostic = errors::void_variable(&decl.name, self.at(id));
            self.report(diagnostic);
            ty = self.types.error();
        }

        let init = self.ast.child(id, 0);
        if decl.is_const && init.is_none() {
            let diagnostic = errors::const_uninitialized(&decl.name, self.at(id));
            self.report(diagnostic);
        }

        if let Some(elem) = self.types.as_array(ty).map(|a| a.elem) {
            ty = self.check_array_init(&decl, ty, elem, init, id);
        } else if let Some(init) = init {
            if matches!(self.ast.kind(init), NodeKind::ArrayInit) {
                let diagnostic = errors::array_init_outside_declaration(self.at(init));
                self.report(diagnostic);
                self.check_elements(init, None);
            } else {
                self.check_expr(init);
                self.expect_assignable(ty, init);
            }
        }
        self.set_ty(id, ty);
        self.define_variable(id, &decl, ty);
    }

    /// Validate an array declaration's initializer and return the final array type.
    fn check_array_init(&mut self, decl: &VarDecl, ty: TypeId, elem: TypeId, init: Option<NodeId>, id: NodeId) -> TypeId {
        let Some(init) = init else {
            if decl.array_len.is_none() {
                let diagnostic = errors::array_needs_initializer(&decl.name, self.at(id));
                self.report(diagnostic);
                return self.types.error();
            }
            return ty;
        };
        if !matches!(self.ast.kind(init), NodeKind::ArrayInit) {
            self.check_expr(init);
            let diagnostic = errors::array_assignment(self.at(init));
            self.report(diagnostic);
            return ty;
        }
        let count = self.check_elements(init, Some(elem));
        self.set_ty(init, ty);
        match decl.array_len {
            Some(len) if count > len as usize => {
                let diagnostic = errors::too_many_initializers(len, count, self.at(init));
                self.report(diagnostic);
                ty
            }
            Some(_) => ty,
            None if count == 0 => {
                let diagnostic = errors::array_needs_initializer(&decl.name, self.at(id));
                self.report(diagnostic);
                self.types.error()
            }
            None => {
                let len = u32::try_from(count).unwrap_or(u32::MAX);
                let ty = self.types.array_of(elem, Some(len));
                self.set_ty(init, ty)
            }
        }
    }

    /// Check the elements of an initializer list; returns the element count.
    fn check_elements(&mut self, init: NodeId, elem: Option<TypeId>) -> usize {
        let elements = self.ast.children(init).to_vec();
        for &e in &elements {
            if matches!(self.ast.kind(e), NodeKind::ArrayInit) {
                let diagnostic = errors::array_init_outside_declaration(self.at(e));
                self.report(diagnostic);
                continue;
            }
            self.check_expr(e);
            if let Some(elem) = elem {
                self.expect_assignable(elem, e);
            }
        }
        if elem.is_none() {
            let error = self.types.error();
            self.set_ty(init, error);
        }
        elements.len()
    }

    /// Enter a variable (or parameter) into the current scope.
    pub(super) fn define_variable(&mut self, id: NodeId, decl: &VarDecl, ty: TypeId) {
        let symbol = Symbol::new(
            &decl.name,
            SymbolKind::Variable(VariableInfo {
                is_const: decl.is_const,
                mutated: false,
            }),
            Some(ty),
            self.ast.pos(id),
        )
        .with_decl(id);
        match self.symbols.define(symbol) {
            Ok(symbol) => {
                self.decl_symbols.insert(id, symbol);
            }
            Err(existing) => self.report_duplicate(&decl.name, existing, id),
        }
    }

    // ========================================================================
    // Functions
    // ========================================================================

    /// Check a top-level function: parameters and body share one scope.
    pub(super) fn check_function(&mut self, id: NodeId) {
        let Some(func) = self.ast.func_decl(id).cloned() else { return };
        let Some(body) = self.ast.func_body(id) else { return };
        let ret = self
            .ast
            .ty(id)
            .and_then(|ty| self.types.as_function(ty))
            .map_or(self.types.error(), |f| f.ret);

        self.symbols.enter_scope(ScopeKind::Function);
        self.symbols.set_function(id, ret);
        for param in self.ast.children(id)[..func.param_count].to_vec() {
            let Some(decl) = self.ast.var_decl(param).cloned() else { continue };
            let ty = self.ast.ty(param).unwrap_or(self.types.error());
            self.define_variable(param, &decl, ty);
        }
        let void = self.types.void();
        self.set_ty(body, void);
        for stmt in self.ast.children(body).to_vec() {
            self.check_stmt(stmt);
        }
        self.symbols.exit_scope();

        if !self.is_void(ret) && !self.types.is_error(ret) && !self.always_exits(body) {
            let diagnostic = errors::missing_return(&func.name, self.at(id));
            self.report(diagnostic);
        }
    }
}
