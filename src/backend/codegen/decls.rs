//! File-scope emission: enum constants, struct definitions, prototypes, globals, function definitions and `main`.

use dream_core::types::{Type, TypeId};

use crate::frontend::ast::{NodeId, NodeKind, Storage};

use super::super::c_emitter::signature;
use super::super::names;
use super::{CodeGenerator, Result};

impl CodeGenerator<'_> {
    /// One anonymous `enum` per Dream enum; members become `DR_<len><Enum>_<Member>` constants.
    pub(super) fn enums(&mut self, items: &[NodeId]) -> Result<()> {
        let mut emitted = false;
        for &item in items {
            if !matches!(self.ast.kind(item), NodeKind::EnumDecl { .. }) {
                continue;
            }
            let ty = self.ty(item)?;
            let Some(e) = self.types.as_enum(ty) else {
                return Err(self.unsupported(item, "an enum without an enum type"));
            };
            let mut constants = Vec::with_capacity(e.members.len());
            for member in &e.members {
                let value = i32::try_from(member.value)
                    .map_err(|_| self.unsupported(item, format!("enum value {} outside the int range", member.value)))?;
                constants.push(format!("{} = {value}", names::enum_constant(&e.name, &member.name)));
            }
            if constants.is_empty() {
                continue;
            }
            self.out.open("enum");
            let last = constants.len() - 1;
            for (i, constant) in constants.iter().enumerate() {
                let comma = if i == last { "" } else { "," };
                self.out.line(&format!("{constant}{comma}"));
            }
            self.out.close(";");
            emitted = true;
        }
        if emitted {
            self.out.blank_line();
        }
        Ok(())
    }

    pub(super) fn structs(&mut self, order: &[TypeId], root: NodeId) -> Result<()> {
        for &ty in order {
            let Some(s) = self.types.as_struct(ty) else { continue };
            let fields = s
                .fields
                .iter()
                .map(|f| self.declare(f.ty, &names::mangle(&f.name), false, root))
                .collect::<Result<Vec<_>>>()?;
            self.out.struct_def(&names::mangle(&s.name), &fields);
            self.out.blank_line();
        }
        Ok(())
    }

    pub(super) fn prototypes(&mut self, items: &[NodeId]) -> Result<()> {
        let mut emitted = false;
        for &item in items {
            if self.ast.func_body(item).is_some() {
                let header = self.function_header(item, false)?;
                self.out.line(&format!("{header};"));
                emitted = true;
            }
        }
        if emitted {
            self.out.blank_line();
        }
        Ok(())
    }

    /// `static T name[ = constant];` for every top-level variable.
    ///
    /// Constant initializers are applied statically; anything else is assigned in `main` where the declaration
    /// appears.
    pub(super) fn globals(&mut self, items: &[NodeId]) -> Result<()> {
        let ast = self.ast;
        let mut emitted = false;
        for &item in items {
            let Some(var) = ast.var_decl(item) else { continue };
            if var.storage != Storage::Global {
                continue;
            }
            let decl = self.declare(self.ty(item)?, &self.var_name(item)?, false, item)?;
            match ast.child(item, 0) {
                Some(init) if self.is_constant_init(init) => {
                    let value = if matches!(ast.kind(init), NodeKind::ArrayInit) {
                        self.init_list(ast.children(init))?
                    } else {
                        self.arg_expr(init)?
                    };
                    self.out.line(&format!("static {decl} = {value};"));
                }
                _ => self.out.line(&format!("static {decl};")),
            }
            emitted = true;
        }
        if emitted {
            self.out.blank_line();
        }
        Ok(())
    }

    /// `static R name(params)`; array parameters carry a hidden `int dr_len_<name>` after them.
    fn function_header(&self, id: NodeId, volatile: bool) -> Result<String> {
        let ast = self.ast;
        let func = ast
            .func_decl(id)
            .ok_or_else(|| self.unsupported(id, "a function header"))?;
        let ret = self.return_type(id)?;
        if self.types.as_array(ret).is_some() {
            return Err(self.unsupported(id, "a function returning an array"));
        }
        let mut params = Vec::with_capacity(func.param_count);
        for &param in &ast.children(id)[..func.param_count] {
            let ty = self.ty(param)?;
            let name = self.var_name(param)?;
            params.push(self.declare(ty, &name, volatile, param)?);
            if self.types.as_array(ty).is_some() {
                params.push(format!("int {}", names::array_len_param(&name)));
            }
        }
        let ret = format!("static {}", self.base_type(ret, id)?);
        Ok(signature(&ret, &names::mangle(&func.name), &params))
    }

    fn return_type(&self, func: NodeId) -> Result<TypeId> {
        self.types
            .as_function(self.ty(func)?)
            .map(|f| f.ret)
            .ok_or_else(|| self.unsupported(func, "a function without a signature"))
    }

    pub(super) fn function(&mut self, id: NodeId) -> Result<()> {
        let ast = self.ast;
        let Some(body) = ast.func_body(id) else { return Ok(()) };
        let volatile = self.contains_try(body);
        let ret = self.return_type(id)?;
        let header = self.function_header(id, volatile)?;
        self.out.open(&header);
        self.with_function_body(Some(ret), volatile, |g| {
            let stmts = ast.children(body);
            g.stmts(stmts)?;
            let returns = stmts
                .last()
                .is_some_and(|&s| matches!(ast.kind(s), NodeKind::Return | NodeKind::Throw));
            if !returns {
                g.fallback_return(ret, id)?;
            }
            Ok(())
        })?;
        self.out.close("");
        self.out.blank_line();
        Ok(())
    }

    /// A zero return at the end of a non-void function whose body may fall off its end.
    fn fallback_return(&mut self, ret: TypeId, at: NodeId) -> Result<()> {
        match self.types.get(ret) {
            Type::Void => {}
            Type::Struct(_) => {
                let ty = self.base_type(ret, at)?;
                self.out.line(&format!("return ({ty}){{0}};"));
            }
            _ => {
                let zero = self
                    .zero_value(ret)
                    .ok_or_else(|| self.unsupported(at, "a zero value for the return type"))?;
                self.out.line(&format!("return {zero};"));
            }
        }
        Ok(())
    }

    /// `int main(void)` running the top-level statements in order.
    pub(super) fn main(&mut self, items: &[NodeId]) -> Result<()> {
        let ast = self.ast;
        let stmts: Vec<NodeId> = items
            .iter()
            .copied()
            .filter(|&i| !matches!(ast.kind(i), NodeKind::Func(_) | NodeKind::StructDecl { .. } | NodeKind::EnumDecl { .. }))
            .collect();
        let volatile = stmts.iter().any(|&s| self.contains_try(s));
        self.out.open(&signature("int", "main", &[]));
        self.with_function_body(None, volatile, |g| g.stmts(&stmts))?;
        self.out.line("return 0;");
        self.out.close("");
        Ok(())
    }
}
