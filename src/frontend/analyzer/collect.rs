//! First pass: register top-level types, enum members, struct fields and function signatures.

use std::collections::HashMap;

use dream_core::types::{EnumMember, EnumType, Field, StructType, Type, TypeId};

use crate::frontend::ast::*;
use crate::frontend::errors;
use crate::frontend::symbols::*;

use super::Analyzer;

impl Analyzer<'_> {
    /// Run the whole first pass over the top-level statements of `root`.
    pub(super) fn collect(&mut self, root: NodeId) {
        let items: Vec<NodeId> = self.ast.children(root).to_vec();
        for &id in &items {
            self.collect_type_name(id);
        }
        for &id in &items {
            match self.ast.kind(id) {
                NodeKind::EnumDecl { .. } => self.collect_enum_members(id),
                NodeKind::StructDecl { .. } => self.collect_struct_fields(id),
                _ => {}
            }
        }
        self.check_struct_graph();
        for &id in &items {
            if matches!(self.ast.kind(id), NodeKind::Func(_)) {
                self.collect_function(id);
            }
        }
        self.report_undefined_prototypes();
    }

    fn collect_type_name(&mut self, id: NodeId) {
        let (name, ty) = match self.ast.kind(id) {
            NodeKind::StructDecl { name } => {
                let ty = Type::Struct(StructType {
                    name: name.clone(),
                    fields: Vec::new(),
                });
                (name.clone(), ty)
            }
            NodeKind::EnumDecl { name } => {
                let ty = Type::Enum(EnumType {
                    name: name.clone(),
                    members: Vec::new(),
                });
                (name.clone(), ty)
            }
            _ => return,
        };
        let ty = self.types.alloc(ty);
        self.set_ty(id, ty);
        let symbol = Symbol::new(&name, SymbolKind::Type { members: None }, Some(ty), self.ast.pos(id)).with_decl(id);
        match self.symbols.define(symbol) {
            Ok(_) => {
                self.named_types.insert(name, ty);
                if matches!(self.types.get(ty), Type::Struct(_)) {
                    self.struct_decls.push((ty, id));
                }
            }
            Err(existing) => self.report_duplicate(&name, existing, id),
        }
    }

    pub(super) fn report_duplicate(&mut self, name: &str, existing: SymbolId, at: NodeId) {
        let previous = self.symbols.get(existing).map(|s| s.pos).unwrap_or_default();
        let diagnostic = errors::duplicate_declaration(name, previous, self.at(at));
        self.report(diagnostic);
    }

    // ========================================================================
    // Enums
    // ========================================================================

    fn collect_enum_members(&mut self, id: NodeId) {
        let NodeKind::EnumDecl { name: enum_name } = self.ast.kind(id).clone() else { return };
        let Some(enum_ty) = self.ast.ty(id) else { return };
        if self.named_types.get(&enum_name) != Some(&enum_ty) {
            // A duplicate name; already reported.
            return;
        }
        let variants: Vec<NodeId> = self.ast.children(id).to_vec();
        if variants.is_empty() {
            let diagnostic = errors::empty_enum(&enum_name, self.at(id));
            self.report(diagnostic);
        }

        let scope = self.symbols.enter_scope(ScopeKind::Enum);
        let mut members = Vec::new();
        let mut seen_values: HashMap<i64, String> = HashMap::new();
        let mut next = 0i64;
        for variant in variants {
            let NodeKind::EnumVariant { name, explicit } = self.ast.kind(variant).clone() else {
                continue;
            };
            let value = if explicit {
                match self.ast.child(variant, 0).and_then(|v| self.enum_value(v)) {
                    Some(value) => value,
                    None => {
                        let diagnostic = errors::enum_value_not_constant(&name, self.at(variant));
                        self.report(diagnostic);
                        next
                    }
                }
            } else {
                next
            };
            if i32::try_from(value).is_err() {
                let diagnostic = errors::int_out_of_range(value, self.at(variant));
                self.report(diagnostic);
            }
            next = value.saturating_add(1);
            self.set_ty(variant, enum_ty);

            let symbol = Symbol::new(&name, SymbolKind::EnumMember { value }, Some(enum_ty), self.ast.pos(variant))
                .with_decl(variant);
            if self.symbols.define(symbol).is_err() {
                let diagnostic = errors::duplicate_enum_member(&enum_name, &name, self.at(variant));
                self.report(diagnostic);
                continue;
            }
            if let Some(first) = seen_values.get(&value) {
                let diagnostic = errors::duplicate_enum_value(&enum_name, value, first, &name, self.at(variant));
                self.report(diagnostic);
            } else {
                seen_values.insert(value, name.clone());
            }
            members.push(EnumMember { name, value });
        }
        self.symbols.exit_scope();

        if let Type::Enum(e) = self.types.get_mut(enum_ty) {
            e.members = members;
        }
        if let Some(symbol) = self.symbols.lookup(&enum_name).and_then(|s| self.symbols.get_mut(s)) {
            symbol.kind = SymbolKind::Type { members: Some(scope) };
        }
    }

    /// Value of an explicit enum initializer: an integer literal, optionally negated.
    fn enum_value(&mut self, id: NodeId) -> Option<i64> {
        let int = self.types.int();
        let value = match self.ast.kind(id) {
            NodeKind::Int(v) => *v,
            NodeKind::Unary(UnaryOp::Neg) => {
                let inner = self.ast.child(id, 0)?;
                let NodeKind::Int(v) = self.ast.kind(inner) else { return None };
                let v = -*v;
                self.set_ty(inner, int);
                v
            }
            _ => return None,
        };
        self.set_ty(id, int);
        Some(value)
    }

    // ========================================================================
    // Structs
    // ========================================================================

    fn collect_struct_fields(&mut self, id: NodeId) {
        let NodeKind::StructDecl { name: struct_name } = self.ast.kind(id).clone() else { return };
        let Some(struct_ty) = self.ast.ty(id) else { return };
        if self.named_types.get(&struct_name) != Some(&struct_ty) {
            return;
        }
        let mut fields: Vec<Field> = Vec::new();
        for field in self.ast.children(id).to_vec() {
            let Some(decl) = self.ast.var_decl(field).cloned() else { continue };
            let ty = self.resolve_type(&decl.ty, decl.array_len, field);
            let ty = if self.is_void(ty) {
                let diagnostic = errors::void_variable(&decl.name, self.at(field));
                self.report(diagnostic);
                self.types.error()
            } else if self.types.as_array(ty).is_some_and(|a| a.len.is_none()) {
                let diagnostic = errors::array_needs_initializer(&decl.name, self.at(field));
                self.report(diagnostic);
                self.types.error()
            } else {
                ty
            };
            self.set_ty(field, ty);
            if fields.iter().any(|f| f.name == decl.name) {
                let diagnostic = errors::duplicate_field(&struct_name, &decl.name, self.at(field));
                self.report(diagnostic);
                continue;
            }
            fields.push(Field { name: decl.name, ty });
        }
        if let Type::Struct(s) = self.types.get_mut(struct_ty) {
            s.fields = fields;
        }
    }

    // ========================================================================
    // Functions
    // ========================================================================

    /// Function type of a declaration; also types its parameter nodes.
    fn signature(&mut self, id: NodeId) -> TypeId {
        let Some(func) = self.ast.func_decl(id).cloned() else {
            return self.types.error();
        };
        let mut ret = self.resolve_type(&func.ret, None, id);
        if self.types.as_array(ret).is_some() {
            let diagnostic = errors::array_return(&func.name, self.at(id));
            self.report(diagnostic);
            ret = self.types.error();
        }
        let mut params = Vec::with_capacity(func.param_count);
        for param in self.ast.children(id)[..func.param_count].to_vec() {
            let Some(decl) = self.ast.var_decl(param).cloned() else { continue };
            let mut ty = self.resolve_type(&decl.ty, decl.array_len, param);
            if self.is_void(ty) {
                let diagnostic = errors::void_variable(&decl.name, self.at(param));
                self.report(diagnostic);
                ty = self.types.error();
            }
            // Array parameters accept arrays of any length.
            if let Some(elem) = self.types.as_array(ty).map(|a| a.elem) {
                ty = self.types.array_of(elem, None);
            }
            self.set_ty(param, ty);
            params.push(ty);
        }
        let ty = self.types.function(params, ret);
        self.set_ty(id, ty)
    }

    fn collect_function(&mut self, id: NodeId) {
        let Some(func) = self.ast.func_decl(id).cloned() else { return };
        let ty = self.signature(id);
        let Some(sig) = self.types.as_function(ty).cloned() else { return };
        let defines = !func.is_prototype;

        let is_builtin = self
            .symbols
            .lookup(&func.name)
            .and_then(|s| self.symbols.get(s))
            .is_some_and(|s| matches!(s.kind, SymbolKind::Builtin));
        if is_builtin {
            let diagnostic = errors::builtin_redefinition(&func.name, self.at(id));
            self.report(diagnostic);
            return;
        }

        let symbol = Symbol::new(
            &func.name,
            SymbolKind::Function(FunctionInfo {
                params: sig.params.clone(),
                return_type: sig.ret,
                defined: defines,
            }),
            Some(ty),
            self.ast.pos(id),
        )
        .with_decl(id);
        let existing = match self.symbols.define(symbol) {
            Ok(_) => return,
            Err(existing) => existing,
        };

        let Some(previous) = self.symbols.get(existing).cloned() else { return };
        let SymbolKind::Function(info) = &previous.kind else {
            self.report_duplicate(&func.name, existing, id);
            return;
        };
        let previous_ty = previous.ty.unwrap_or(self.types.error());
        if !self.types.equal(previous_ty, ty) {
            if self.mentions_error(previous_ty) || self.mentions_error(ty) {
                return;
            }
            let diagnostic = errors::conflicting_function(
                &func.name,
                &self.render(previous_ty),
                &self.render(ty),
                self.at(id),
            );
            self.report(diagnostic);
            return;
        }
        match (info.defined, defines) {
            (true, true) => {
                let diagnostic = errors::duplicate_function(&func.name, previous.pos, self.at(id));
                self.report(diagnostic);
            }
            (false, true) => {
                // Calls bind to the definition.
                if let Some(symbol) = self.symbols.get_mut(existing) {
                    symbol.decl = Some(id);
                    symbol.pos = self.ast.pos(id);
                    if let SymbolKind::Function(info) = &mut symbol.kind {
                        info.defined = true;
                    }
                }
            }
            _ => {}
        }
    }

    fn report_undefined_prototypes(&mut self) {
        let undefined: Vec<(String, NodeId)> = self
            .symbols
            .iter()
            .filter_map(|s| match (&s.kind, s.decl) {
                (SymbolKind::Function(info), Some(decl)) if !info.defined => Some((s.name.clone(), decl)),
                _ => None,
            })
            .collect();
        for (name, decl) in undefined {
            let diagnostic = errors::undefined_prototype(&name, self.at(decl));
            self.report(diagnostic);
        }
    }
}
