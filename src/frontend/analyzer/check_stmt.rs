//! Statement checking and control-flow validation.

use std::collections::HashMap;

use dream_core::types::Type;

use crate::frontend::ast::*;
use crate::frontend::errors;
use crate::frontend::stack::ensure_sufficient_stack;
use crate::frontend::symbols::*;

use super::Analyzer;

impl Analyzer<'_> {
    pub(super) fn check_stmt(&mut self, id: NodeId) {
        ensure_sufficient_stack(|| self.check_stmt_inner(id));
    }

    fn check_stmt_inner(&mut self, id: NodeId) {
        let void = self.types.void();
        match self.ast.kind(id).clone() {
            // The declaration node carries the declared type, not void.
            NodeKind::VarDecl(_) => {
                self.check_var_decl(id);
                return;
            }
            NodeKind::Func(_) => {
                let diagnostic = errors::nested_declaration("function", self.at(id));
                self.report(diagnostic);
            }
            NodeKind::StructDecl { .. } => {
                let diagnostic = errors::nested_declaration("struct", self.at(id));
                self.report(diagnostic);
            }
            NodeKind::EnumDecl { .. } => {
                let diagnostic = errors::nested_declaration("enum", self.at(id));
                self.report(diagnostic);
            }
            NodeKind::Block => {
                self.symbols.enter_scope(ScopeKind::Block);
                for stmt in self.ast.children(id).to_vec() {
                    self.check_stmt(stmt);
                }
                self.symbols.exit_scope();
            }
            NodeKind::If => {
                let children = self.ast.children(id).to_vec();
                self.check_condition(children[0]);
                for &branch in &children[1..] {
                    self.check_body(branch, ScopeKind::Block);
                }
            }
            NodeKind::While => {
                let (cond, body) = (self.ast.children(id)[0], self.ast.children(id)[1]);
                self.check_condition(cond);
                self.check_body(body, ScopeKind::Loop);
            }
            NodeKind::DoWhile => {
                let (body, cond) = (self.ast.children(id)[0], self.ast.children(id)[1]);
                self.check_body(body, ScopeKind::Loop);
                self.check_condition(cond);
            }
            NodeKind::For => self.check_for(id),
            NodeKind::Switch => self.check_switch(id),
            NodeKind::Try => {
                let (body, handler) = (self.ast.children(id)[0], self.ast.children(id)[1]);
                self.check_body(body, ScopeKind::Try);
                self.check_body(handler, ScopeKind::Block);
            }
            NodeKind::Throw => self.check_throw(id),
            NodeKind::Return => self.check_return(id),
            NodeKind::Break => {
                if !self.symbols.in_breakable() {
                    let diagnostic = errors::break_outside(self.at(id));
                    self.report(diagnostic);
                }
            }
            NodeKind::Continue => {
                if !self.symbols.in_loop() {
                    let diagnostic = errors::continue_outside(self.at(id));
                    self.report(diagnostic);
                }
            }
            NodeKind::ExprStmt => {
                if let Some(expr) = self.ast.child(id, 0) {
                    self.check_expr(expr);
                }
            }
            NodeKind::Empty | NodeKind::Error => {}
            // A bare expression where a statement is expected (for-loop clauses).
            _ => {
                self.check_expr(id);
                return;
            }
        }
        self.set_ty(id, void);
    }

    /// Check a control-flow body in a fresh scope; a block body does not open a second one.
    fn check_body(&mut self, id: NodeId, kind: ScopeKind) {
        self.symbols.enter_scope(kind);
        if matches!(self.ast.kind(id), NodeKind::Block) {
            let void = self.types.void();
            self.set_ty(id, void);
            for stmt in self.ast.children(id).to_vec() {
                self.check_stmt(stmt);
            }
        } else {
            self.check_stmt(id);
        }
        self.symbols.exit_scope();
    }

    /// Conditions accept `bool` and the integral types.
    pub(super) fn check_condition(&mut self, id: NodeId) {
        let ty = self.check_expr(id);
        let ok = matches!(self.types.get(ty), Type::Bool | Type::Int | Type::Char | Type::Error);
        if !ok {
            let diagnostic = errors::invalid_condition(&self.render(ty), self.at(id));
            self.report(diagnostic);
        }
    }

    fn check_for(&mut self, id: NodeId) {
        let children = self.ast.children(id).to_vec();
        let [init, cond, step, body] = children[..] else { return };
        self.symbols.enter_scope(ScopeKind::Loop);
        self.check_stmt(init);
        if !matches!(self.ast.kind(cond), NodeKind::Empty) {
            self.check_condition(cond);
        }
        if !matches!(self.ast.kind(step), NodeKind::Empty) {
            self.check_expr(step);
        }
        self.check_body(body, ScopeKind::Block);
        self.symbols.exit_scope();
    }

    fn check_switch(&mut self, id: NodeId) {
        let children = self.ast.children(id).to_vec();
        let Some((&subject, cases)) = children.split_first() else { return };
        let subject_ty = self.check_expr(subject);
        let valid_subject = matches!(
            self.types.get(subject_ty),
            Type::Int | Type::Char | Type::Enum(_) | Type::Error
        );
        if !valid_subject {
            let diagnostic = errors::invalid_switch_subject(&self.render(subject_ty), self.at(subject));
            self.report(diagnostic);
        }

        let mut seen: HashMap<i64, NodeId> = HashMap::new();
        for &case in cases {
            let NodeKind::Case { is_default } = *self.ast.kind(case) else { continue };
            let mut stmts = self.ast.children(case).to_vec();
            if !is_default && !stmts.is_empty() {
                let value = stmts.remove(0);
                self.check_case_value(value, subject_ty, valid_subject, &mut seen);
            }
            self.symbols.enter_scope(ScopeKind::Switch);
            for stmt in stmts {
                self.check_stmt(stmt);
            }
            self.symbols.exit_scope();
            let void = self.types.void();
            self.set_ty(case, void);
        }
    }

    fn check_case_value(
        &mut self,
        value: NodeId,
        subject_ty: dream_core::types::TypeId,
        valid_subject: bool,
        seen: &mut HashMap<i64, NodeId>,
    ) {
        let ty = self.check_expr(value);
        if self.types.is_error(ty) {
            return;
        }
        let Some(constant) = self.case_constant(value) else {
            let diagnostic = errors::case_not_constant(self.at(value));
            self.report(diagnostic);
            return;
        };
        let compatible = match (self.types.get(subject_ty), self.types.get(ty)) {
            (Type::Int | Type::Char, Type::Int | Type::Char) => true,
            (Type::Enum(_), Type::Enum(_)) => self.types.equal(subject_ty, ty),
            _ => !valid_subject || self.types.is_error(subject_ty),
        };
        if !compatible {
            let diagnostic = errors::type_mismatch(&self.render(subject_ty), &self.render(ty), self.at(value));
            self.report(diagnostic);
            return;
        }
        if seen.insert(constant, value).is_some() {
            let diagnostic = errors::duplicate_case(constant, self.at(value));
            self.report(diagnostic);
        }
    }

    /// Integer value of a constant case label.
    fn case_constant(&self, id: NodeId) -> Option<i64> {
        match self.ast.kind(id) {
            NodeKind::Int(v) => Some(*v),
            NodeKind::Char(c) => Some(*c as i64),
            NodeKind::EnumMember { value, .. } => Some(*value),
            NodeKind::Unary(UnaryOp::Neg) => ensure_sufficient_stack(|| self.case_constant(self.ast.child(id, 0)?).map(|v| -v)),
            _ => None,
        }
    }

    fn check_throw(&mut self, id: NodeId) {
        let Some(value) = self.ast.child(id, 0) else { return };
        let ty = self.check_expr(value);
        match self.types.get(ty) {
            Type::Str | Type::Error => {}
            Type::Int | Type::Float | Type::Bool | Type::Char | Type::Enum(_) => {
                self.wrap_to_str(id, 0);
            }
            _ => {
                let diagnostic = errors::throw_value(&self.render(ty), self.at(value));
                self.report(diagnostic);
            }
        }
    }

    fn check_return(&mut self, id: NodeId) {
        let value = self.ast.child(id, 0);
        let Some((func, ret)) = self.symbols.current_function() else {
            let diagnostic = errors::return_outside(self.at(id));
            self.report(diagnostic);
            if let Some(value) = value {
                self.check_expr(value);
            }
            return;
        };
        let name = self.ast.func_decl(func).map(|f| f.name.clone()).unwrap_or_default();
        match value {
            Some(value) => {
                self.check_expr(value);
                if self.is_void(ret) {
                    let diagnostic = errors::void_return_value(&name, self.at(value));
                    self.report(diagnostic);
                } else {
                    self.expect_assignable(ret, value);
                }
            }
            None => {
                if !self.is_void(ret) && !self.types.is_error(ret) {
                    let diagnostic = errors::missing_return_value(&name, self.at(id));
                    self.report(diagnostic);
                }
            }
        }
    }

    // ========================================================================
    // Reachability
    // ========================================================================

    /// Whether control never falls off the end of `id` (it returns, throws or loops forever).
    pub(super) fn always_exits(&self, id: NodeId) -> bool {
        ensure_sufficient_stack(|| self.always_exits_inner(id))
    }

    fn always_exits_inner(&self, id: NodeId) -> bool {
        let children = self.ast.children(id);
        match self.ast.kind(id) {
            NodeKind::Return | NodeKind::Throw => true,
            NodeKind::Block => children.iter().any(|&c| self.always_exits(c)),
            NodeKind::If => children.len() == 3 && self.always_exits(children[1]) && self.always_exits(children[2]),
            NodeKind::While => self.is_true_literal(children[0]) && !self.breaks_out(children[1]),
            NodeKind::For => {
                let cond = children[1];
                (matches!(self.ast.kind(cond), NodeKind::Empty) || self.is_true_literal(cond))
                    && !self.breaks_out(children[3])
            }
            NodeKind::DoWhile => {
                self.always_exits(children[0])
                    || (self.is_true_literal(children[1]) && !self.breaks_out(children[0]))
            }
            NodeKind::Try => self.always_exits(children[0]) && self.always_exits(children[1]),
            NodeKind::Switch => {
                let cases = &children[1..];
                let has_default = cases
                    .iter()
                    .any(|&c| matches!(self.ast.kind(c), NodeKind::Case { is_default: true }));
                let last_exits = cases.last().is_some_and(|&c| self.always_exits_case(c));
                has_default && last_exits && !cases.iter().any(|&c| self.breaks_out(c))
            }
            _ => false,
        }
    }

    fn always_exits_case(&self, case: NodeId) -> bool {
        let skip = usize::from(matches!(self.ast.kind(case), NodeKind::Case { is_default: false }));
        self.ast.children(case)[skip..].iter().any(|&s| self.always_exits(s))
    }

    fn is_true_literal(&self, id: NodeId) -> bool {
        match self.ast.kind(id) {
            NodeKind::Bool(b) => *b,
            NodeKind::Int(v) => *v != 0,
            _ => false,
        }
    }

    /// Whether a `break` inside `id` leaves the enclosing loop or switch.
    fn breaks_out(&self, id: NodeId) -> bool {
        match self.ast.kind(id) {
            NodeKind::Break => true,
            NodeKind::While | NodeKind::DoWhile | NodeKind::For | NodeKind::Switch | NodeKind::Func(_) => false,
            _ => ensure_sufficient_stack(|| self.ast.children(id).iter().any(|&c| self.breaks_out(c))),
        }
    }
}
