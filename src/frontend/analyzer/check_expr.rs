//! Expression type checking.
//!
//! `check_expr` assigns a type to every node it visits and returns it. Nodes whose operands already carry the
//! error type get the error type too, without another diagnostic.

use dream_core::types::{Type, TypeId};

use crate::frontend::ast::*;
use crate::frontend::errors;
use crate::frontend::stack::ensure_sufficient_stack;
use crate::frontend::symbols::*;

use super::Analyzer;

/// The one literal that is only valid as the operand of unary minus.
const INT_MIN_MAGNITUDE: i64 = 2_147_483_648;

impl Analyzer<'_> {
    pub(super) fn check_expr(&mut self, id: NodeId) -> TypeId {
        let ty = ensure_sufficient_stack(|| self.check_expr_inner(id));
        self.set_ty(id, ty)
    }

    fn check_expr_inner(&mut self, id: NodeId) -> TypeId {
        match self.ast.kind(id).clone() {
            NodeKind::Int(v) => {
                if v > i64::from(i32::MAX) {
                    let diagnostic = errors::int_out_of_range(v, self.at(id));
                    self.report(diagnostic);
                    return self.types.error();
                }
                self.types.int()
            }
            NodeKind::Float(v) => {
                if !v.is_finite() {
                    let diagnostic = errors::float_out_of_range(self.at(id));
                    self.report(diagnostic);
                    return self.types.error();
                }
                self.types.float()
            }
            NodeKind::Char(c) => {
                if !c.is_ascii() {
                    let diagnostic = errors::non_ascii_char(c, self.at(id));
                    self.report(diagnostic);
                    return self.types.error();
                }
                self.types.char()
            }
            NodeKind::Str(_) => self.types.string(),
            NodeKind::Bool(_) => self.types.bool(),
            NodeKind::Null => self.types.null(),
            NodeKind::Ident(name) => self.check_ident(id, &name),
            NodeKind::Unary(op) => self.check_unary(id, op),
            NodeKind::Binary(op) => self.check_binary(id, op),
            NodeKind::Assign(op) => self.check_assign(id, op),
            NodeKind::Conditional => self.check_conditional(id),
            NodeKind::Index => self.check_index(id),
            NodeKind::Field(name) => self.check_field(id, &name),
            NodeKind::Call(name) => self.check_call(id, &name),
            NodeKind::Console(op) => self.check_console(id, op),
            NodeKind::Cast(target) => self.check_cast(id, &target),
            NodeKind::ArrayInit => {
                let diagnostic = errors::array_init_outside_declaration(self.at(id));
                self.report(diagnostic);
                self.types.error()
            }
            NodeKind::Concat | NodeKind::ToStr => self.types.string(),
            NodeKind::EnumMember { .. } => self.ast.ty(id).unwrap_or(self.types.error()),
            NodeKind::Empty => self.types.void(),
            _ => self.types.error(),
        }
    }

    // ========================================================================
    // Names
    // ========================================================================

    fn check_ident(&mut self, id: NodeId, name: &str) -> TypeId {
        let Some(symbol) = self.symbols.lookup(name).and_then(|s| self.symbols.get(s)).cloned() else {
            let diagnostic = errors::undefined_variable(name, self.at(id));
            self.report(diagnostic);
            return self.types.error();
        };
        match symbol.kind {
            SymbolKind::Variable(_) => {
                if let Some(decl) = symbol.decl {
                    self.ast.set_binding(id, decl);
                }
                symbol.ty.unwrap_or(self.types.error())
            }
            _ => {
                let what = match symbol.kind {
                    SymbolKind::Builtin => "builtin function",
                    _ => symbol.describe(),
                };
                let diagnostic = errors::not_a_value(name, what, self.at(id));
                self.report(diagnostic);
                self.types.error()
            }
        }
    }

    /// Record a write through `target` (an identifier, index or field chain).
    fn mark_written(&mut self, target: NodeId) {
        let mut root = target;
        while matches!(self.ast.kind(root), NodeKind::Index | NodeKind::Field(_)) {
            root = self.ast.children(root)[0];
        }
        let NodeKind::Ident(name) = self.ast.kind(root).clone() else { return };
        let Some(symbol) = self.ast.binding(root).and_then(|d| self.decl_symbols.get(&d)).copied() else {
            return;
        };
        let Some(SymbolKind::Variable(info)) = self.symbols.get_mut(symbol).map(|s| &mut s.kind) else { return };
        info.mutated = true;
        if info.is_const {
            let diagnostic = errors::const_assignment(&name, self.at(target));
            self.report(diagnostic);
        }
    }

    fn is_lvalue(&self, id: NodeId) -> bool {
        matches!(self.ast.kind(id), NodeKind::Ident(_) | NodeKind::Index | NodeKind::Field(_))
    }

    /// `s[i]` on a string reads a char but cannot be written.
    fn is_string_index(&self, id: NodeId) -> bool {
        matches!(self.ast.kind(id), NodeKind::Index)
            && self
                .ast
                .ty(self.ast.children(id)[0])
                .is_some_and(|t| self.types.is_string(t))
    }

    // ========================================================================
    // Operators
    // ========================================================================

    fn check_unary(&mut self, id: NodeId, op: UnaryOp) -> TypeId {
        let operand = self.ast.children(id)[0];
        if op == UnaryOp::Neg && matches!(self.ast.kind(operand), NodeKind::Int(INT_MIN_MAGNITUDE)) {
            self.ast.replace(id, NodeKind::Int(-INT_MIN_MAGNITUDE), []);
            return self.types.int();
        }
        let ty = self.check_expr(operand);
        if self.types.is_error(ty) {
            return ty;
        }
        match op {
            UnaryOp::Neg => match self.types.get(ty) {
                Type::Float => self.types.float(),
                Type::Int | Type::Char => self.types.int(),
                _ => self.invalid_unary(id, op, ty),
            },
            UnaryOp::Not => match self.types.get(ty) {
                Type::Bool => ty,
                _ => self.invalid_unary(id, op, ty),
            },
            _ => {
                if !self.is_lvalue(operand) || self.is_string_index(operand) {
                    let diagnostic = errors::not_assignable(self.at(operand));
                    self.report(diagnostic);
                    return self.types.error();
                }
                self.mark_written(operand);
                match self.types.get(ty) {
                    Type::Int | Type::Char | Type::Float => ty,
                    _ => self.invalid_unary(id, op, ty),
                }
            }
        }
    }

    fn invalid_unary(&mut self, id: NodeId, op: UnaryOp, ty: TypeId) -> TypeId {
        let diagnostic = errors::invalid_operand(op.as_str(), &self.render(ty), self.at(id));
        self.report(diagnostic);
        self.types.error()
    }

    /// Result type of an arithmetic operator on numeric operands.
    fn arithmetic_result(&self, lhs: TypeId, rhs: TypeId) -> TypeId {
        let is_float = |t| matches!(self.types.get(t), Type::Float);
        if is_float(lhs) || is_float(rhs) {
            self.types.float()
        } else {
            self.types.int()
        }
    }

    fn check_binary(&mut self, id: NodeId, op: BinaryOp) -> TypeId {
        let (lhs, rhs) = (self.ast.children(id)[0], self.ast.children(id)[1]);
        let lt = self.check_expr(lhs);
        let rt = self.check_expr(rhs);
        if self.types.is_error(lt) || self.types.is_error(rt) {
            return self.types.error();
        }
        let t = &self.types;
        if op == BinaryOp::Add && (t.is_string(lt) || t.is_string(rt)) {
            return self.check_concat(id, lt, rt);
        }

        let valid = if op.is_arithmetic() {
            if op == BinaryOp::Mod {
                t.is_integral(lt) && t.is_integral(rt)
            } else {
                t.is_numeric(lt) && t.is_numeric(rt)
            }
        } else if op.is_logical() {
            matches!((t.get(lt), t.get(rt)), (Type::Bool, Type::Bool))
        } else if matches!(op, BinaryOp::Eq | BinaryOp::Ne) {
            match (t.get(lt), t.get(rt)) {
                _ if t.is_numeric(lt) && t.is_numeric(rt) => true,
                (Type::Bool, Type::Bool) => true,
                (Type::Str | Type::Null, Type::Str | Type::Null) => true,
                (Type::Enum(_), Type::Enum(_)) => t.equal(lt, rt),
                _ => false,
            }
        } else {
            (t.is_numeric(lt) && t.is_numeric(rt)) || (t.is_enum(lt) && t.equal(lt, rt))
        };

        if !valid {
            let diagnostic = errors::invalid_operands(op.as_str(), &self.render(lt), &self.render(rt), self.at(id));
            self.report(diagnostic);
            return self.types.error();
        }
        if op.is_arithmetic() {
            self.arithmetic_result(lt, rt)
        } else {
            self.types.bool()
        }
    }

    /// Rewrite `a + b` with a string operand into `Concat`, coercing the other side.
    fn check_concat(&mut self, id: NodeId, lt: TypeId, rt: TypeId) -> TypeId {
        for (index, ty) in [(0, lt), (1, rt)] {
            if self.types.is_string(ty) {
                continue;
            }
            if !self.wrap_to_str_checked(id, index, ty) {
                return self.types.error();
            }
        }
        let children = self.ast.children(id).to_vec();
        self.ast.replace(id, NodeKind::Concat, children);
        self.types.string()
    }

    /// Wrap child `index` of `parent` in `ToStr` if its type can be converted, reporting otherwise.
    fn wrap_to_str_checked(&mut self, parent: NodeId, index: usize, ty: TypeId) -> bool {
        match self.types.get(ty) {
            Type::Int | Type::Float | Type::Bool | Type::Char | Type::Enum(_) => {
                self.wrap_to_str(parent, index);
                true
            }
            _ => {
                let child = self.ast.children(parent)[index];
                let diagnostic = errors::invalid_concat(&self.render(ty), self.at(child));
                self.report(diagnostic);
                false
            }
        }
    }

    /// Insert a `ToStr` node between `parent` and its child at `index`.
    pub(super) fn wrap_to_str(&mut self, parent: NodeId, index: usize) {
        let child = self.ast.children(parent)[index];
        let wrapped = self.ast.alloc_like(child, NodeKind::ToStr, [child]);
        let string = self.types.string();
        self.set_ty(wrapped, string);
        self.ast.get_mut(parent).children[index] = wrapped;
    }

    fn check_assign(&mut self, id: NodeId, op: AssignOp) -> TypeId {
        let (target, value) = (self.ast.children(id)[0], self.ast.children(id)[1]);
        let tt = self.check_expr(target);
        if self.is_string_index(target) {
            let diagnostic = errors::not_assignable(self.at(target));
            self.report(diagnostic);
        }
        self.mark_written(target);
        if self.types.as_array(tt).is_some() {
            let diagnostic = errors::array_assignment(self.at(id));
            self.report(diagnostic);
            if !matches!(self.ast.kind(value), NodeKind::ArrayInit) {
                self.check_expr(value);
            }
            return self.types.error();
        }
        if matches!(self.ast.kind(value), NodeKind::ArrayInit) {
            let diagnostic = errors::array_init_outside_declaration(self.at(value));
            self.report(diagnostic);
            return self.types.error();
        }
        let vt = self.check_expr(value);
        if self.types.is_error(tt) || self.types.is_error(vt) {
            return tt;
        }

        let Some(bin) = op.binary() else {
            self.expect_assignable(tt, value);
            return tt;
        };
        if bin == BinaryOp::Add && self.types.is_string(tt) {
            if !self.types.is_string(vt) {
                self.wrap_to_str_checked(id, 1, vt);
            }
            return tt;
        }
        let t = &self.types;
        let valid = if bin == BinaryOp::Mod {
            t.is_integral(tt) && t.is_integral(vt)
        } else {
            t.is_numeric(tt) && t.is_numeric(vt)
        };
        if !valid {
            let diagnostic = errors::invalid_operands(op.as_str(), &self.render(tt), &self.render(vt), self.at(id));
            self.report(diagnostic);
            return self.types.error();
        }
        let result = self.arithmetic_result(tt, vt);
        let narrowing_char = matches!(self.types.get(tt), Type::Char) && self.types.is_integral(vt);
        if !self.assignable(tt, result) && !narrowing_char {
            let diagnostic = errors::type_mismatch(&self.render(tt), &self.render(result), self.at(value));
            self.report(diagnostic);
        }
        tt
    }

    fn check_conditional(&mut self, id: NodeId) -> TypeId {
        let children = self.ast.children(id).to_vec();
        self.check_condition(children[0]);
        let a = self.check_expr(children[1]);
        let b = self.check_expr(children[2]);
        let t = &self.types;
        if t.is_error(a) || t.is_error(b) {
            return t.error();
        }
        if t.equal(a, b) {
            return a;
        }
        match (t.get(a), t.get(b)) {
            _ if t.is_numeric(a) && t.is_numeric(b) => self.arithmetic_result(a, b),
            (Type::Str | Type::Null, Type::Str | Type::Null) => t.string(),
            _ => {
                let diagnostic = errors::type_mismatch(&self.render(a), &self.render(b), self.at(children[2]));
                self.report(diagnostic);
                self.types.error()
            }
        }
    }

    // ========================================================================
    // Access
    // ========================================================================

    fn check_index(&mut self, id: NodeId) -> TypeId {
        let (base, index) = (self.ast.children(id)[0], self.ast.children(id)[1]);
        let bt = self.check_expr(base);
        let it = self.check_expr(index);
        if !self.types.is_error(it) && !self.types.is_integral(it) {
            let diagnostic = errors::index_not_int(&self.render(it), self.at(index));
            self.report(diagnostic);
        }
        if self.types.is_error(bt) {
            return bt;
        }
        if self.types.is_string(bt) {
            return self.types.char();
        }
        let Some(array) = self.types.as_array(bt).cloned() else {
            let diagnostic = errors::not_indexable(&self.render(bt), self.at(base));
            self.report(diagnostic);
            return self.types.error();
        };
        if let (Some(len), NodeKind::Int(i)) = (array.len, self.ast.kind(index)) {
            if *i >= i64::from(len) {
                let diagnostic = errors::index_out_of_bounds(*i, &self.render(bt), self.at(index));
                self.report(diagnostic);
            }
        }
        array.elem
    }

    fn check_field(&mut self, id: NodeId, name: &str) -> TypeId {
        let object = self.ast.children(id)[0];
        if let NodeKind::Ident(type_name) = self.ast.kind(object).clone() {
            let symbol = self.symbols.lookup(&type_name).and_then(|s| self.symbols.get(s)).cloned();
            if let Some(Symbol {
                kind: SymbolKind::Type { members },
                ty: Some(ty),
                ..
            }) = symbol
            {
                return self.resolve_enum_member(id, &type_name, name, members, ty);
            }
        }

        let ot = self.check_expr(object);
        if self.types.is_error(ot) {
            return ot;
        }
        let Some(s) = self.types.as_struct(ot) else {
            let diagnostic = errors::not_a_struct(&self.render(ot), self.at(object));
            self.report(diagnostic);
            return self.types.error();
        };
        match s.fields.iter().find(|f| f.name == name) {
            Some(field) => field.ty,
            None => {
                let diagnostic = errors::unknown_field(&s.name, name, self.at(id));
                self.report(diagnostic);
                self.types.error()
            }
        }
    }

    /// `Enum.Member` becomes an `EnumMember` node carrying its value.
    fn resolve_enum_member(
        &mut self,
        id: NodeId,
        type_name: &str,
        member: &str,
        members: Option<ScopeId>,
        ty: TypeId,
    ) -> TypeId {
        let Some(scope) = members else {
            // A struct name used as a value.
            let object = self.ast.children(id)[0];
            let diagnostic = errors::not_a_value(type_name, "type", self.at(object));
            self.report(diagnostic);
            return self.types.error();
        };
        let value = self
            .symbols
            .lookup_in(scope, member)
            .and_then(|s| self.symbols.get(s))
            .and_then(|s| match s.kind {
                SymbolKind::EnumMember { value } => Some(value),
                _ => None,
            });
        let Some(value) = value else {
            let diagnostic = errors::unknown_enum_member(type_name, member, self.at(id));
            self.report(diagnostic);
            return self.types.error();
        };
        self.ast.replace(
            id,
            NodeKind::EnumMember {
                enum_name: type_name.to_string(),
                member: member.to_string(),
                value,
            },
            [],
        );
        ty
    }

    // ========================================================================
    // Calls
    // ========================================================================

    fn check_call(&mut self, id: NodeId, name: &str) -> TypeId {
        let args = self.ast.children(id).to_vec();
        for &arg in &args {
            self.check_expr(arg);
        }

        let Some(symbol) = self.symbols.lookup(name).and_then(|s| self.symbols.get(s)).cloned() else {
            let diagnostic = errors::undefined_function(name, self.at(id));
            self.report(diagnostic);
            return self.types.error();
        };
        let SymbolKind::Function(info) = symbol.kind else {
            let diagnostic = errors::not_a_function(name, self.at(id));
            self.report(diagnostic);
            return self.types.error();
        };
        if let Some(decl) = symbol.decl {
            self.ast.set_binding(id, decl);
        }
        if info.params.len() != args.len() {
            let diagnostic = errors::arity_mismatch(name, info.params.len(), args.len(), self.at(id));
            self.report(diagnostic);
            return info.return_type;
        }
        for (&arg, &param) in args.iter().zip(&info.params) {
            self.expect_assignable(param, arg);
        }
        info.return_type
    }

    fn check_console(&mut self, id: NodeId, op: ConsoleOp) -> TypeId {
        let args = self.ast.children(id).to_vec();
        let arg_types: Vec<TypeId> = args.iter().map(|&a| self.check_expr(a)).collect();
        let (min, max, expected) = match op {
            ConsoleOp::ReadLine => (0, 0, "0"),
            ConsoleOp::Write => (1, 1, "1"),
            ConsoleOp::WriteLine | ConsoleOp::Print => (0, 1, "0 or 1"),
        };
        if args.len() < min || args.len() > max {
            let diagnostic = errors::console_arity(op.as_str(), expected, args.len(), self.at(id));
            self.report(diagnostic);
        }
        for (&arg, &ty) in args.iter().zip(&arg_types) {
            let printable = matches!(
                self.types.get(ty),
                Type::Int | Type::Float | Type::Bool | Type::Char | Type::Str | Type::Null | Type::Enum(_) | Type::Error
            );
            if !printable {
                let diagnostic = errors::not_printable(&self.render(ty), self.at(arg));
                self.report(diagnostic);
            }
        }
        match op {
            ConsoleOp::ReadLine => self.types.string(),
            _ => self.types.void(),
        }
    }

    fn check_cast(&mut self, id: NodeId, target: &TypeRef) -> TypeId {
        let operand = self.ast.children(id)[0];
        let to = self.resolve_type(target, None, id);
        let from = self.check_expr(operand);
        if self.types.is_error(to) || self.types.is_error(from) {
            return self.types.error();
        }
        if self.types.equal(to, from) {
            return to;
        }
        let t = &self.types;
        let valid = match (t.get(to), t.get(from)) {
            (Type::Int | Type::Float | Type::Char, Type::Int | Type::Float | Type::Char | Type::Bool | Type::Enum(_)) => {
                true
            }
            (Type::Enum(_), Type::Int | Type::Char) => true,
            (Type::Str, Type::Int | Type::Float | Type::Bool | Type::Char | Type::Enum(_)) => {
                // `(string)x` is an explicit to-string conversion.
                self.ast.replace(id, NodeKind::ToStr, [operand]);
                true
            }
            _ => false,
        };
        if !valid {
            let diagnostic = errors::invalid_cast(&self.render(from), &self.render(to), self.at(id));
            self.report(diagnostic);
            return self.types.error();
        }
        to
    }
}
