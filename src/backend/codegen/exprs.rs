//! Expression emission.
//!
//! Every expression lowers to a C expression string. Compound expressions come back parenthesized; callers that
//! place an expression where C needs no parentheses (statements, arguments, initializers) strip them with
//! [`bare`] / [`arg`].

use dream_core::types::{Type, TypeId};

use crate::frontend::ast::{AssignOp, BinaryOp, ConsoleOp, NodeId, NodeKind, Storage, UnaryOp};
use crate::frontend::stack::ensure_sufficient_stack;
use crate::optimizer::effects;

use super::super::c_emitter::{c_char_literal, c_string_literal};
use super::super::names;
use super::{CodeGenerator, Result};

/// Operand values plus the temporary assignments that must run before them.
struct Sequenced {
    prefix: Vec<String>,
    values: Vec<String>,
}

/// A place being read or written: the assignments its index temporaries need, then the C lvalue.
struct Place {
    prefix: Vec<String>,
    lvalue: String,
}

/// One step outward from the root of an access chain.
enum Step {
    Field(String),
    Index { base: NodeId, index: NodeId },
}

impl CodeGenerator<'_> {
    pub(super) fn expr(&mut self, id: NodeId) -> Result<String> {
        ensure_sufficient_stack(|| self.expr_inner(id))
    }

    fn expr_inner(&mut self, id: NodeId) -> Result<String> {
        let ast = self.ast;
        match ast.kind(id) {
            NodeKind::Int(v) => Ok(int_literal(*v)),
            NodeKind::Float(v) => Ok(float_literal(*v)),
            NodeKind::Char(c) => Ok(c_char_literal(*c)),
            NodeKind::Str(s) => Ok(c_string_literal(s)),
            NodeKind::Bool(b) => Ok(b.to_string()),
            NodeKind::Null => Ok("NULL".to_string()),
            NodeKind::EnumMember { enum_name, member, .. } => Ok(names::enum_constant(enum_name, member)),
            NodeKind::Ident(_) => self.ident(id),
            NodeKind::Field(_) => self.read_place(id),
            NodeKind::Index => self.index(id),
            NodeKind::Unary(op) => self.unary(id, *op),
            NodeKind::Binary(op) => self.binary(id, *op),
            NodeKind::Assign(op) => self.assign(id, *op),
            NodeKind::Conditional => {
                let c = ast.children(id);
                let cond = self.expr(c[0])?;
                let then = self.expr(c[1])?;
                let otherwise = self.expr(c[2])?;
                Ok(format!("({cond} ? {then} : {otherwise})"))
            }
            NodeKind::Call(_) => self.call(id),
            NodeKind::Console(op) => self.console(id, *op),
            NodeKind::Cast(_) => self.cast(id),
            NodeKind::Concat => {
                let Sequenced { prefix, values } = self.sequenced(ast.children(id))?;
                Ok(wrap(&prefix, format!("dr_concat({}, {})", values[0], values[1])))
            }
            NodeKind::ToStr => self.to_str(id),
            other => Err(self.unsupported(id, format!("expression `{}`", other.label()))),
        }
    }

    /// An expression in statement position (expression statement, condition, `return` value).
    pub(super) fn top_expr(&mut self, id: NodeId) -> Result<String> {
        Ok(bare(self.expr(id)?))
    }

    /// An expression in argument or initializer position.
    pub(super) fn arg_expr(&mut self, id: NodeId) -> Result<String> {
        Ok(arg(self.expr(id)?))
    }

    fn ident(&mut self, id: NodeId) -> Result<String> {
        let decl = self
            .ast
            .binding(id)
            .ok_or_else(|| self.unsupported(id, "an unresolved identifier"))?;
        self.var_name(decl)
    }

    // ========================================================================
    // Sequencing
    // ========================================================================

    /// Emit `operands` so that they evaluate left to right.
    fn sequenced(&mut self, operands: &[NodeId]) -> Result<Sequenced> {
        let mut prefix = Vec::new();
        let mut values = Vec::with_capacity(operands.len());
        for (i, &op) in operands.iter().enumerate() {
            let code = self.expr(op)?;
            if self.needs_spill(op) && self.any_effects(&operands[i + 1..]) {
                let temp = self.temp(self.ty(op)?, op)?;
                prefix.push(format!("{temp} = {}", arg(code)));
                values.push(temp);
            } else {
                values.push(arg(code));
            }
        }
        Ok(Sequenced { prefix, values })
    }

    fn any_effects(&self, ids: &[NodeId]) -> bool {
        ids.iter().any(|&id| !effects::is_pure(self.ast, self.types, id))
    }

    /// Constants cannot change and arrays are passed by address, so neither needs a temporary.
    fn needs_spill(&self, id: NodeId) -> bool {
        let kind = self.ast.kind(id);
        if kind.is_literal() || matches!(kind, NodeKind::EnumMember { .. }) {
            return false;
        }
        !self.ast.ty(id).is_some_and(|t| self.types.as_array(t).is_some())
    }

    // ========================================================================
    // Places
    // ========================================================================

    fn read_place(&mut self, id: NodeId) -> Result<String> {
        let Place { prefix, lvalue } = self.place(id, None, false)?;
        Ok(wrap(&prefix, lvalue))
    }

    /// Lower an access chain (`a.b[i].c`).
    ///
    /// Index values are bounds-checked and go into temporaries when something evaluated after them (a later index
    /// or `value`) has effects. With `reuse` the lvalue will be evaluated twice, so effectful indices are always
    /// stored.
    fn place(&mut self, id: NodeId, value: Option<NodeId>, reuse: bool) -> Result<Place> {
        let ast = self.ast;
        let mut steps = Vec::new();
        let mut root = id;
        loop {
            match ast.kind(root) {
                NodeKind::Field(name) => {
                    steps.push(Step::Field(name.clone()));
                    root = ast.children(root)[0];
                }
                NodeKind::Index => {
                    let c = ast.children(root);
                    steps.push(Step::Index {
                        base: c[0],
                        index: c[1],
                    });
                    root = c[0];
                }
                _ => break,
            }
        }
        steps.reverse();

        let mut lvalue = match ast.kind(root) {
            NodeKind::Ident(_) => self.ident(root)?,
            _ if value.is_some() || reuse => return Err(self.unsupported(root, "assignment to a temporary value")),
            _ => self.expr(root)?,
        };
        let mut later: Vec<NodeId> = steps
            .iter()
            .filter_map(|s| match s {
                Step::Index { index, .. } => Some(*index),
                Step::Field(_) => None,
            })
            .chain(value)
            .collect();
        let mut prefix = Vec::new();
        for step in steps {
            match step {
                Step::Field(name) => {
                    lvalue = format!("{lvalue}.{}", names::mangle(&name));
                }
                Step::Index { base, index } => {
                    later.remove(0);
                    let len = self.array_len(base)?;
                    let checked = format!("dr_check_index({}, {len})", self.arg_expr(index)?);
                    let pure = effects::is_pure(ast, self.types, index);
                    if (reuse && !pure) || self.any_effects(&later) {
                        let temp = self.temp(self.types.int(), index)?;
                        prefix.push(format!("{temp} = {checked}"));
                        lvalue = format!("{lvalue}[{temp}]");
                    } else {
                        lvalue = format!("{lvalue}[{checked}]");
                    }
                }
            }
        }
        Ok(Place { prefix, lvalue })
    }

    /// Length of the array `base`: static for declared arrays, the hidden parameter for array parameters.
    pub(super) fn array_len(&self, base: NodeId) -> Result<String> {
        let ty = self.ty(base)?;
        let array = self
            .types
            .as_array(ty)
            .ok_or_else(|| self.unsupported(base, "indexing a non-array value"))?;
        if let Some(n) = array.len {
            return Ok(n.to_string());
        }
        let param = self
            .ast
            .binding(base)
            .filter(|&decl| self.ast.var_decl(decl).is_some_and(|v| v.storage == Storage::Param))
            .ok_or_else(|| self.unsupported(base, "an array of unknown length"))?;
        Ok(names::array_len_param(&self.var_name(param)?))
    }

    fn index(&mut self, id: NodeId) -> Result<String> {
        let ast = self.ast;
        let base = ast.children(id)[0];
        if self.types.is_string(self.ty(base)?) {
            let Sequenced { prefix, values } = self.sequenced(ast.children(id))?;
            return Ok(wrap(&prefix, format!("dr_str_at({}, {})", values[0], values[1])));
        }
        self.read_place(id)
    }

    // ========================================================================
    // Operators
    // ========================================================================

    fn unary(&mut self, id: NodeId, op: UnaryOp) -> Result<String> {
        let operand = self.ast.children(id)[0];
        match op {
            UnaryOp::Neg => Ok(format!("(-{})", self.expr(operand)?)),
            UnaryOp::Not => Ok(format!("(!{})", self.expr(operand)?)),
            UnaryOp::PreInc | UnaryOp::PreDec => {
                let Place { prefix, lvalue } = self.place(operand, None, false)?;
                Ok(wrap(&prefix, format!("({}{lvalue})", op.as_str())))
            }
            UnaryOp::PostInc | UnaryOp::PostDec => {
                let Place { prefix, lvalue } = self.place(operand, None, false)?;
                Ok(wrap(&prefix, format!("({lvalue}{})", op.as_str())))
            }
        }
    }

    fn binary(&mut self, id: NodeId, op: BinaryOp) -> Result<String> {
        let ast = self.ast;
        let (lhs, rhs) = (ast.children(id)[0], ast.children(id)[1]);
        if op.is_logical() {
            // `&&` and `||` already sequence their operands.
            let (l, r) = (self.expr(lhs)?, self.expr(rhs)?);
            return Ok(format!("({l} {} {r})", op.as_str()));
        }
        let strings = self.is_stringish(self.ty(lhs)?) || self.is_stringish(self.ty(rhs)?);
        let trapping = matches!(op, BinaryOp::Div | BinaryOp::Mod)
            && self.types.is_integral(self.ty(id)?)
            && !effects::has_safe_divisor(ast, id);
        let Sequenced { prefix, values } = self.sequenced(ast.children(id))?;
        let (l, r) = (&values[0], &values[1]);
        let core = match op {
            BinaryOp::Eq if strings => format!("dr_str_eq({l}, {r})"),
            BinaryOp::Ne if strings => format!("(!dr_str_eq({l}, {r}))"),
            BinaryOp::Div if trapping => format!("dr_idiv({l}, {r})"),
            BinaryOp::Mod if trapping => format!("dr_imod({l}, {r})"),
            _ => format!("({} {} {})", operand(l), op.as_str(), operand(r)),
        };
        Ok(wrap(&prefix, core))
    }

    fn is_stringish(&self, ty: TypeId) -> bool {
        matches!(self.types.get(ty), Type::Str | Type::Null)
    }

    fn assign(&mut self, id: NodeId, op: AssignOp) -> Result<String> {
        let ast = self.ast;
        let (target, value) = (ast.children(id)[0], ast.children(id)[1]);
        let Some(bin) = op.binary() else {
            let Place { prefix, lvalue } = self.place(target, Some(value), false)?;
            let v = self.arg_expr(value)?;
            return Ok(wrap(&prefix, format!("({lvalue} = {v})")));
        };

        let target_ty = self.ty(target)?;
        let concat = bin == BinaryOp::Add && self.types.is_string(target_ty);
        let trapping = matches!(bin, BinaryOp::Div | BinaryOp::Mod)
            && self.types.is_integral(target_ty)
            && !effects::has_safe_divisor(ast, id);
        let pure_value = effects::is_pure(ast, self.types, value);
        if pure_value && !concat && !trapping {
            let Place { prefix, lvalue } = self.place(target, Some(value), false)?;
            let v = self.arg_expr(value)?;
            return Ok(wrap(&prefix, format!("({lvalue} {} {v})", op.as_str())));
        }

        // `lv = lv op v` with the old value read before `v` runs.
        let Place { mut prefix, lvalue } = self.place(target, Some(value), true)?;
        let old = if pure_value {
            lvalue.clone()
        } else {
            let temp = self.temp(target_ty, target)?;
            prefix.push(format!("{temp} = {lvalue}"));
            temp
        };
        let v = self.arg_expr(value)?;
        let combined = match bin {
            _ if concat => format!("dr_concat({old}, {v})"),
            BinaryOp::Div if trapping => format!("dr_idiv({old}, {v})"),
            BinaryOp::Mod if trapping => format!("dr_imod({old}, {v})"),
            _ => format!("{old} {} {}", bin.as_str(), operand(&v)),
        };
        Ok(wrap(&prefix, format!("({lvalue} = {combined})")))
    }

    // ========================================================================
    // Calls and built-ins
    // ========================================================================

    fn call(&mut self, id: NodeId) -> Result<String> {
        let ast = self.ast;
        let callee = ast
            .binding(id)
            .ok_or_else(|| self.unsupported(id, "a call to an unresolved function"))?;
        let name = ast
            .func_decl(callee)
            .map(|f| names::mangle(&f.name).into_owned())
            .ok_or_else(|| self.unsupported(id, "a call to a non-function"))?;
        let params = self
            .types
            .as_function(self.ty(callee)?)
            .map(|f| f.params.clone())
            .ok_or_else(|| self.unsupported(callee, "a function without a signature"))?;

        let args = ast.children(id);
        let Sequenced { prefix, values } = self.sequenced(args)?;
        let mut c_args = Vec::with_capacity(values.len());
        for ((&a, value), &param) in args.iter().zip(values).zip(&params) {
            c_args.push(value);
            if self.types.as_array(param).is_some() {
                c_args.push(self.array_len(a)?);
            }
        }
        Ok(wrap(&prefix, format!("{name}({})", c_args.join(", "))))
    }

    fn console(&mut self, id: NodeId, op: ConsoleOp) -> Result<String> {
        if op == ConsoleOp::ReadLine {
            return Ok("dr_read_line()".to_string());
        }
        let newline = op != ConsoleOp::Write;
        let Some(&value) = self.ast.children(id).first() else {
            if newline {
                return Ok("dr_print_newline()".to_string());
            }
            return Err(self.unsupported(id, "Console.Write without an argument"));
        };
        let kind = match self.types.get(self.ty(value)?) {
            Type::Int | Type::Enum(_) => "int",
            Type::Float => "float",
            Type::Bool => "bool",
            Type::Char => "char",
            Type::Str | Type::Null => "str",
            _ => return Err(self.unsupported(value, "printing a value of this type")),
        };
        let v = self.arg_expr(value)?;
        Ok(format!("dr_print_{kind}({v}, {newline})"))
    }

    fn to_str(&mut self, id: NodeId) -> Result<String> {
        let value = self.ast.children(id)[0];
        let helper = match self.types.get(self.ty(value)?) {
            Type::Int | Type::Enum(_) => "dr_int_to_str",
            Type::Float => "dr_float_to_str",
            Type::Bool => "dr_bool_to_str",
            Type::Char => "dr_char_to_str",
            Type::Str => return self.expr(value),
            _ => return Err(self.unsupported(value, "converting this value to a string")),
        };
        Ok(format!("{helper}({})", self.arg_expr(value)?))
    }

    fn cast(&mut self, id: NodeId) -> Result<String> {
        let value = self.ast.children(id)[0];
        let (to, from) = (self.ty(id)?, self.ty(value)?);
        if self.types.equal(to, from) {
            return self.expr(value);
        }
        let target = match self.types.get(to) {
            Type::Int | Type::Enum(_) => "int",
            Type::Float => "double",
            Type::Char => "char",
            _ => return Err(self.unsupported(id, "this cast")),
        };
        Ok(format!("(({target}){})", self.expr(value)?))
    }

    // ========================================================================
    // Initializers
    // ========================================================================

    /// Whether `id` can initialize a variable with static storage.
    pub(super) fn is_constant_init(&self, id: NodeId) -> bool {
        let ast = self.ast;
        match ast.kind(id) {
            k if k.is_literal() => true,
            NodeKind::EnumMember { .. } => true,
            NodeKind::Unary(UnaryOp::Neg) => {
                matches!(ast.kind(ast.children(id)[0]), NodeKind::Int(_) | NodeKind::Float(_))
            }
            NodeKind::ArrayInit => ast.children(id).iter().all(|&e| self.is_constant_init(e)),
            _ => false,
        }
    }

    /// `{a, b, c}`; an empty list is spelled `{0}`.
    pub(super) fn init_list(&mut self, elements: &[NodeId]) -> Result<String> {
        if elements.is_empty() {
            return Ok("{0}".to_string());
        }
        let values = elements
            .iter()
            .map(|&e| self.arg_expr(e))
            .collect::<Result<Vec<_>>>()?;
        Ok(format!("{{{}}}", values.join(", ")))
    }
}

// ============================================================================
// Spelling helpers
// ============================================================================

pub(super) fn int_literal(v: i64) -> String {
    if v == i64::from(i32::MIN) {
        // `-2147483648` would be negation applied to a literal that does not fit in `int`.
        "(-2147483647 - 1)".to_string()
    } else if v < 0 {
        format!("({v})")
    } else {
        v.to_string()
    }
}

pub(super) fn float_literal(v: f64) -> String {
    let s = format!("{v:?}");
    if s.starts_with('-') { format!("({s})") } else { s }
}

/// Prefix assignments, then the value: `(dr_t0 = f(), dr_t0 + g())`.
fn wrap(prefix: &[String], core: String) -> String {
    if prefix.is_empty() {
        core
    } else {
        format!("({}, {})", prefix.join(", "), bare(core))
    }
}

/// Byte offsets of the parenthesis closing the one at offset 0, and whether a comma appears directly inside it.
fn outer_group(code: &str) -> Option<(usize, bool)> {
    let mut depth = 0usize;
    let mut quote: Option<u8> = None;
    let mut escaped = false;
    let mut comma = false;
    for (i, b) in code.bytes().enumerate() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == q {
                quote = None;
            }
            continue;
        }
        match b {
            b'"' | b'\'' => quote = Some(b),
            b'(' => depth += 1,
            b')' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some((i, comma));
                }
            }
            b',' if depth == 1 => comma = true,
            _ => {}
        }
    }
    None
}

/// Drop one pair of parentheses enclosing all of `code`.
pub(super) fn bare(code: String) -> String {
    match outer_group(&code) {
        Some((close, _)) if code.starts_with('(') && close + 1 == code.len() => code[1..close].to_string(),
        _ => code,
    }
}

/// Like [`bare`], but keeps the parentheses of a comma expression, which would otherwise split an argument list.
pub(super) fn arg(code: String) -> String {
    match outer_group(&code) {
        Some((close, false)) if code.starts_with('(') && close + 1 == code.len() => code[1..close].to_string(),
        _ => code,
    }
}

/// Operand of a binary operator: parenthesized unless it is a primary or postfix expression.
fn operand(code: &str) -> String {
    let mut depth = 0usize;
    let mut quote: Option<u8> = None;
    let mut escaped = false;
    for b in code.bytes() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == q {
                quote = None;
            }
            continue;
        }
        match b {
            b'"' | b'\'' => quote = Some(b),
            b'(' | b'[' => depth += 1,
            b')' | b']' => depth = depth.saturating_sub(1),
            b' ' if depth == 0 => return format!("({code})"),
            _ => {}
        }
    }
    code.to_string()
}
