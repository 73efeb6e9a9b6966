//! Constant folding.
//!
//! Integer arithmetic wraps at 32 bits like the generated C (`-fwrapv`). Divisions that would trap at run time
//! (`x / 0`, `INT_MIN / -1`) and float results that are not finite are left alone so the program still reports them.

use dream_core::types::{Type, TypeTable};

use crate::frontend::ast::{Ast, BinaryOp, NodeId, NodeKind, Storage, UnaryOp};
use crate::frontend::stack::ensure_sufficient_stack;

use super::replace_with_node;

pub(super) fn run(ast: &mut Ast, root: NodeId, types: &TypeTable) -> usize {
    let mut folder = Folder { ast, types, changes: 0 };
    folder.visit(root, false);
    folder.changes
}

/// Result of folding one node.
enum Folded {
    Literal(NodeKind),
    /// The node reduces to one of its children.
    Child(NodeId),
}

#[derive(Clone, Copy)]
enum Num {
    Int(i64),
    Float(f64),
}

impl Num {
    fn as_f64(self) -> f64 {
        match self {
            Num::Int(v) => v as f64,
            Num::Float(v) => v,
        }
    }
}

fn int_value(kind: &NodeKind) -> Option<i64> {
    match kind {
        NodeKind::Int(v) => Some(*v),
        NodeKind::Char(c) => Some(*c as i64),
        NodeKind::EnumMember { value, .. } => Some(*value),
        _ => None,
    }
}

fn num_value(kind: &NodeKind) -> Option<Num> {
    match kind {
        NodeKind::Float(v) => Some(Num::Float(*v)),
        other => int_value(other).map(Num::Int),
    }
}

fn finite(v: f64) -> Option<NodeKind> {
    v.is_finite().then_some(NodeKind::Float(v))
}

struct Folder<'a> {
    ast: &'a mut Ast,
    types: &'a TypeTable,
    changes: usize,
}

impl Folder<'_> {
    fn visit(&mut self, id: NodeId, in_function: bool) {
        let in_function = match self.ast.kind(id) {
            NodeKind::Try | NodeKind::StructDecl { .. } | NodeKind::EnumDecl { .. } => return,
            NodeKind::Func(_) => true,
            _ => in_function,
        };
        for child in self.ast.children(id).to_vec() {
            ensure_sufficient_stack(|| self.visit(child, in_function));
        }
        let folded = match self.ast.kind(id) {
            NodeKind::Binary(op) => self.binary(id, *op),
            NodeKind::Unary(op) => self.unary(id, *op),
            NodeKind::Conditional => self.conditional(id),
            NodeKind::Cast(_) => self.cast(id).map(Folded::Literal),
            NodeKind::ToStr => self.to_str(id).map(Folded::Literal),
            NodeKind::Concat => self.concat(id).map(Folded::Literal),
            NodeKind::Ident(_) => self.propagate(id, in_function).map(Folded::Literal),
            _ => None,
        };
        match folded {
            Some(Folded::Literal(kind)) => {
                self.ast.replace(id, kind, []);
                self.changes += 1;
            }
            Some(Folded::Child(child)) => {
                replace_with_node(self.ast, id, child);
                self.changes += 1;
            }
            None => {}
        }
    }

    fn operands(&self, id: NodeId) -> Option<(NodeId, NodeId)> {
        Some((self.ast.child(id, 0)?, self.ast.child(id, 1)?))
    }

    fn result_type(&self, id: NodeId) -> Option<&Type> {
        self.ast.ty(id).map(|ty| self.types.get(ty))
    }

    fn binary(&self, id: NodeId, op: BinaryOp) -> Option<Folded> {
        let (l, r) = self.operands(id)?;
        let (lk, rk) = (self.ast.kind(l), self.ast.kind(r));

        if op.is_logical() {
            let NodeKind::Bool(lb) = *lk else { return None };
            let short_circuits = (op == BinaryOp::And) != lb;
            if short_circuits {
                return Some(Folded::Literal(NodeKind::Bool(lb)));
            }
            let rhs_is_bool = self.result_type(r).is_some_and(|t| matches!(t, Type::Bool));
            return rhs_is_bool.then_some(Folded::Child(r));
        }

        if matches!(op, BinaryOp::Eq | BinaryOp::Ne) {
            let equal = match (lk, rk) {
                (NodeKind::Str(a), NodeKind::Str(b)) => Some(a == b),
                (NodeKind::Null, NodeKind::Null) => Some(true),
                (NodeKind::Str(_), NodeKind::Null) | (NodeKind::Null, NodeKind::Str(_)) => Some(false),
                (NodeKind::Bool(a), NodeKind::Bool(b)) => Some(a == b),
                _ => None,
            };
            if let Some(equal) = equal {
                return Some(Folded::Literal(NodeKind::Bool(equal == (op == BinaryOp::Eq))));
            }
        }

        let (a, b) = (num_value(lk)?, num_value(rk)?);
        if op.is_comparison() {
            let ordering = match (a, b) {
                (Num::Int(x), Num::Int(y)) => x.partial_cmp(&y),
                _ => a.as_f64().partial_cmp(&b.as_f64()),
            }?;
            let value = match op {
                BinaryOp::Eq => ordering.is_eq(),
                BinaryOp::Ne => ordering.is_ne(),
                BinaryOp::Lt => ordering.is_lt(),
                BinaryOp::Le => ordering.is_le(),
                BinaryOp::Gt => ordering.is_gt(),
                _ => ordering.is_ge(),
            };
            return Some(Folded::Literal(NodeKind::Bool(value)));
        }

        let kind = match self.result_type(id)? {
            Type::Float => {
                let (x, y) = (a.as_f64(), b.as_f64());
                match op {
                    BinaryOp::Add => finite(x + y),
                    BinaryOp::Sub => finite(x - y),
                    BinaryOp::Mul => finite(x * y),
                    BinaryOp::Div => finite(x / y),
                    _ => None,
                }
            }
            Type::Int => {
                let (Num::Int(x), Num::Int(y)) = (a, b) else { return None };
                let (x, y) = (i32::try_from(x).ok()?, i32::try_from(y).ok()?);
                let value = match op {
                    BinaryOp::Add => Some(x.wrapping_add(y)),
                    BinaryOp::Sub => Some(x.wrapping_sub(y)),
                    BinaryOp::Mul => Some(x.wrapping_mul(y)),
                    BinaryOp::Div => x.checked_div(y),
                    BinaryOp::Mod => x.checked_rem(y),
                    _ => None,
                };
                value.map(|v| NodeKind::Int(v.into()))
            }
            _ => None,
        };
        kind.map(Folded::Literal)
    }

    fn unary(&self, id: NodeId, op: UnaryOp) -> Option<Folded> {
        let operand = self.ast.kind(self.ast.child(id, 0)?);
        let kind = match (op, operand) {
            (UnaryOp::Neg, NodeKind::Float(v)) => NodeKind::Float(-v),
            (UnaryOp::Neg, other) => {
                let v = i32::try_from(int_value(other)?).ok()?;
                NodeKind::Int(v.wrapping_neg().into())
            }
            (UnaryOp::Not, NodeKind::Bool(b)) => NodeKind::Bool(!b),
            _ => return None,
        };
        Some(Folded::Literal(kind))
    }

    fn conditional(&self, id: NodeId) -> Option<Folded> {
        let children = self.ast.children(id);
        let [cond, then, otherwise] = children[..] else { return None };
        let taken = match self.ast.kind(cond) {
            NodeKind::Bool(b) => *b,
            NodeKind::Int(v) => *v != 0,
            _ => return None,
        };
        let branch = if taken { then } else { otherwise };
        let same_type = match (self.ast.ty(id), self.ast.ty(branch)) {
            (Some(a), Some(b)) => self.types.equal(a, b),
            _ => false,
        };
        same_type.then_some(Folded::Child(branch))
    }

    fn cast(&self, id: NodeId) -> Option<NodeKind> {
        let value = self.ast.kind(self.ast.child(id, 0)?);
        match (self.result_type(id)?, value) {
            (Type::Int, NodeKind::Bool(b)) => Some(NodeKind::Int(i64::from(*b))),
            (Type::Int, NodeKind::Float(v)) => {
                let t = v.trunc();
                (t >= f64::from(i32::MIN) && t <= f64::from(i32::MAX)).then_some(NodeKind::Int(t as i64))
            }
            (Type::Int, other) => int_value(other).map(NodeKind::Int),
            (Type::Float, other) => num_value(other).and_then(|n| finite(n.as_f64())),
            (Type::Char, NodeKind::Char(c)) => Some(NodeKind::Char(*c)),
            (Type::Char, NodeKind::Int(v)) => u8::try_from(*v)
                .ok()
                .filter(u8::is_ascii)
                .map(|b| NodeKind::Char(char::from(b))),
            (Type::Bool, NodeKind::Bool(b)) => Some(NodeKind::Bool(*b)),
            (Type::Str, NodeKind::Str(s)) => Some(NodeKind::Str(s.clone())),
            _ => None,
        }
    }

    /// Float formatting is left to the runtime.
    fn to_str(&self, id: NodeId) -> Option<NodeKind> {
        let text = match self.ast.kind(self.ast.child(id, 0)?) {
            NodeKind::Int(v) => v.to_string(),
            NodeKind::EnumMember { value, .. } => value.to_string(),
            NodeKind::Bool(b) => b.to_string(),
            NodeKind::Char(c) => c.to_string(),
            NodeKind::Str(s) => s.clone(),
            _ => return None,
        };
        Some(NodeKind::Str(text))
    }

    fn concat(&self, id: NodeId) -> Option<NodeKind> {
        let (l, r) = self.operands(id)?;
        match (self.ast.kind(l), self.ast.kind(r)) {
            (NodeKind::Str(a), NodeKind::Str(b)) => Some(NodeKind::Str(format!("{a}{b}"))),
            _ => None,
        }
    }

    /// Replace a use of a flagged constant by its literal value.
    ///
    /// Globals are only propagated into top-level code: a function may run before the global's initializer does.
    fn propagate(&self, id: NodeId, in_function: bool) -> Option<NodeKind> {
        let decl = self.ast.binding(id)?;
        let var = self.ast.var_decl(decl)?;
        let visible = match var.storage {
            Storage::Local => true,
            Storage::Global => !in_function,
            Storage::Param | Storage::Field => false,
        };
        if !var.constant || !visible {
            return None;
        }
        let literal = self.ast.kind(self.ast.child(decl, 0)?);
        match (self.result_type(id)?, literal) {
            (Type::Float, other) if !matches!(other, NodeKind::Float(_)) => {
                int_value(other).map(|v| NodeKind::Float(v as f64))
            }
            (Type::Int, NodeKind::Char(c)) => Some(NodeKind::Int(*c as i64)),
            (_, other) if other.is_literal() => Some(other.clone()),
            _ => None,
        }
    }
}
