//! C code generation
//!
//! Lowers an analyzed (and usually optimized) AST to a single C translation unit that includes
//! `dream_runtime.h`.
//!
//! ## Output layout
//!
//! 1. Header comment and the runtime include
//! 2. Enum constants
//! 3. Struct definitions, contained structs first
//! 4. Prototypes of every function
//! 5. File-scope globals
//! 6. Function definitions
//! 7. `int main(void)` with the top-level statements
//!
//! ## Evaluation order
//!
//! C leaves the order of most operands unspecified. An operand that is followed by an operand with side effects is
//! stored in a `dr_t<N>` temporary first (`(dr_t0 = f(), dr_t0 + g())`), so evaluation is always left to right.
//! Temporaries are declared at the top of the enclosing function.
//!
//! ## Exceptions
//!
//! `try` pushes a runtime `dr_frame` and `setjmp`s on it. Every exit from a protected region other than falling off
//! its end (`break`, `continue`, `return`) pops the frames it leaves. Functions containing a `try` declare their
//! scalar locals `volatile` so their values survive the `longjmp`.

mod decls;
mod exprs;
mod stmts;
#[cfg(test)]
mod tests;

use dream_core::types::{Type, TypeId, TypeTable};

use crate::frontend::analyzer::Analysis;
use crate::frontend::ast::{Ast, NodeId, NodeKind};
use crate::frontend::stack::ensure_sufficient_stack;
use crate::version::DREAM_VERSION;

use super::CodegenError;
use super::c_emitter::CEmitter;
use super::names;

type Result<T> = std::result::Result<T, CodegenError>;

/// Generate the C translation unit for the program rooted at `root`.
///
/// ## Errors
/// Returns [`CodegenError`] when the tree still holds nodes analysis should have rejected or typed.
#[tracing::instrument(skip_all, fields(nodes = ast.len()))]
pub fn generate(ast: &Ast, root: NodeId, analysis: &Analysis) -> Result<String> {
    let mut generator = CodeGenerator::new(ast, &analysis.types);
    generator.program(root, &analysis.struct_order)?;
    let code = generator.out.finish();
    tracing::debug!(bytes = code.len(), "generated C source");
    Ok(code)
}

/// Generator state for one translation unit.
pub(crate) struct CodeGenerator<'a> {
    ast: &'a Ast,
    types: &'a TypeTable,
    out: CEmitter,
    func: FunctionState,
}

/// Per-function bookkeeping, reset for every function and for `main`.
#[derive(Debug, Default)]
struct FunctionState {
    /// Declarations of the `dr_t<N>` temporaries used so far.
    temps: Vec<String>,
    /// Active `try` frames, innermost last.
    frames: Vec<Frame>,
    /// Enclosing loops and switches, innermost last.
    breakables: Vec<Breakable>,
    next_frame: usize,
    /// Return type of the function being emitted; `None` in `main`.
    ret: Option<TypeId>,
    /// The function contains a `try`: locals are declared `volatile`.
    volatile: bool,
}

#[derive(Debug)]
struct Frame {
    name: String,
    /// Number of enclosing breakables when the frame was entered.
    depth: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Breakable {
    Loop,
    Switch,
}

impl<'a> CodeGenerator<'a> {
    fn new(ast: &'a Ast, types: &'a TypeTable) -> Self {
        Self {
            ast,
            types,
            out: CEmitter::new(),
            func: FunctionState::default(),
        }
    }

    fn program(&mut self, root: NodeId, struct_order: &[TypeId]) -> Result<()> {
        let items = self.ast.children(root).to_vec();
        self.out.comment(&format!("Generated by dream {DREAM_VERSION}"));
        self.out.line(&format!("#include \"{}\"", super::RUNTIME_HEADER_NAME));
        self.out.blank_line();

        self.enums(&items)?;
        self.structs(struct_order, root)?;
        self.prototypes(&items)?;
        self.globals(&items)?;
        for &item in &items {
            if self.ast.func_body(item).is_some() {
                self.function(item)?;
            }
        }
        self.main(&items)
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    fn unsupported(&self, id: NodeId, what: impl Into<String>) -> CodegenError {
        CodegenError::Unsupported {
            what: what.into(),
            pos: self.ast.pos(id),
        }
    }

    /// Resolved type of `id`, which analysis sets on every expression and declaration.
    fn ty(&self, id: NodeId) -> Result<TypeId> {
        let ty = self.ast.ty(id).ok_or_else(|| CodegenError::Untyped {
            what: self.ast.kind(id).label(),
            pos: self.ast.pos(id),
        })?;
        match self.types.get(ty) {
            Type::Error | Type::Unresolved(_) => Err(self.unsupported(id, "an expression with an invalid type")),
            _ => Ok(ty),
        }
    }

    /// C spelling of the element type `ty` (no array suffix, no declarator).
    fn base_type(&self, ty: TypeId, at: NodeId) -> Result<String> {
        let spelled = match self.types.get(ty) {
            Type::Int | Type::Enum(_) => "int".to_string(),
            Type::Float => "double".to_string(),
            Type::Bool => "bool".to_string(),
            Type::Char => "char".to_string(),
            Type::Str | Type::Null => "const char *".to_string(),
            Type::Void => "void".to_string(),
            Type::Struct(s) => format!("struct {}", names::mangle(&s.name)),
            Type::Array(a) => return self.base_type(a.elem, at),
            other => return Err(self.unsupported(at, format!("values of type {other:?}"))),
        };
        Ok(spelled)
    }

    /// A C declarator for `name` of type `ty`: `int x`, `const char *volatile s`, `double a[3]`.
    ///
    /// Arrays are never `volatile`: their elements live in memory and qualifying them would not convert to the
    /// unqualified parameter types of callees.
    fn declare(&self, ty: TypeId, name: &str, volatile: bool, at: NodeId) -> Result<String> {
        let base = self.base_type(ty, at)?;
        let (suffix, volatile) = match self.types.as_array(ty) {
            Some(a) => (a.len.map_or("[]".to_string(), |n| format!("[{n}]")), false),
            None => (String::new(), volatile),
        };
        let decl = match (base.ends_with('*'), volatile) {
            (true, true) => format!("{base}volatile {name}{suffix}"),
            (true, false) => format!("{base}{name}{suffix}"),
            (false, true) => format!("volatile {base} {name}{suffix}"),
            (false, false) => format!("{base} {name}{suffix}"),
        };
        Ok(decl)
    }

    /// C name of a variable declaration.
    fn var_name(&self, decl: NodeId) -> Result<String> {
        let var = self
            .ast
            .var_decl(decl)
            .ok_or_else(|| self.unsupported(decl, "a reference to a non-variable"))?;
        if var.synthetic {
            return Ok(var.name.clone());
        }
        Ok(names::mangle(&var.name).into_owned())
    }

    /// Zero value of a scalar type, or `None` for aggregates.
    fn zero_value(&self, ty: TypeId) -> Option<&'static str> {
        match self.types.get(ty) {
            Type::Int | Type::Enum(_) | Type::Char => Some("0"),
            Type::Float => Some("0.0"),
            Type::Bool => Some("false"),
            Type::Str | Type::Null => Some("NULL"),
            _ => None,
        }
    }

    /// Allocate a temporary of type `ty` and return its name.
    fn temp(&mut self, ty: TypeId, at: NodeId) -> Result<String> {
        let name = format!("dr_t{}", self.func.temps.len());
        let decl = self.declare(ty, &name, false, at)?;
        self.func.temps.push(decl);
        Ok(name)
    }

    fn contains_try(&self, id: NodeId) -> bool {
        matches!(self.ast.kind(id), NodeKind::Try)
            || ensure_sufficient_stack(|| self.ast.children(id).iter().any(|&c| self.contains_try(c)))
    }

    /// Emit a function body: statements go to a scratch emitter so the temporaries they need can be declared
    /// first.
    fn with_function_body(
        &mut self,
        ret: Option<TypeId>,
        volatile: bool,
        f: impl FnOnce(&mut Self) -> Result<()>,
    ) -> Result<()> {
        self.func = FunctionState {
            ret,
            volatile,
            ..FunctionState::default()
        };
        let scratch = self.out.nested();
        let outer = std::mem::replace(&mut self.out, scratch);
        let result = f(self);
        let body = std::mem::replace(&mut self.out, outer).finish();
        result?;
        for temp in std::mem::take(&mut self.func.temps) {
            self.out.line(&format!("{temp};"));
        }
        self.out.append(&body);
        Ok(())
    }
}
