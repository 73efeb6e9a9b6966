//! Arena-owned abstract syntax tree.
//!
//! All nodes of one compilation live in a single [`Ast`] and refer to each other through [`NodeId`] indices. A node
//! is a closed [`NodeKind`] tag plus an ordered child list; child order is both source order and evaluation order.
//!
//! ## Child layout
//!
//! | Kind | Children |
//! |---|---|
//! | `Block` | statements |
//! | `VarDecl` | `[init]` when initialized |
//! | `Func` | parameter `VarDecl`s, then the body `Block` unless it is a prototype |
//! | `StructDecl` | field `VarDecl`s |
//! | `EnumDecl` | `EnumVariant`s, each with `[value]` when explicit |
//! | `If` | `[cond, then, else?]` |
//! | `While` | `[cond, body]` |
//! | `DoWhile` | `[body, cond]` |
//! | `For` | `[init, cond, step, body]`, absent parts are `Empty` |
//! | `Switch` | `[subject, Case...]`; a `Case` holds `[value?, stmts...]` |
//! | `Try` | `[try_block, catch_block]` |
//! | `Return` / `Throw` | `[value?]` |
//! | `Binary` / `Assign` / `Index` / `Concat` | `[lhs, rhs]` |
//! | `Conditional` | `[cond, then, else]` |
//! | `Call` / `Console` / `ArrayInit` | arguments / elements |
//!
//! ## Notes
//! - Semantic passes annotate nodes in place (`ty`, `binding`) and the optimizer rewrites kinds and child lists.
//! - `binding` on an `Ident` (or `Call`) points at the declaring `VarDecl` (or `Func`) node.

use std::fmt::Write as _;

use dream_core::types::TypeId;
use la_arena::{Arena, Idx};
use smallvec::SmallVec;

/// Byte span in the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn merge(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Line/column position, both starting at 1. Columns count code points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Pos {
    pub line: u32,
    pub col: u32,
}

impl Pos {
    pub fn new(line: u32, col: u32) -> Self {
        Self { line, col }
    }
}

impl Default for Pos {
    fn default() -> Self {
        Self { line: 1, col: 1 }
    }
}

impl std::fmt::Display for Pos {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}

pub type NodeId = Idx<Node>;

// ============================================================================
// Node kinds
// ============================================================================

/// Syntactic type reference as written in source.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeRef {
    pub name: TypeName,
    /// `T[]` form.
    pub is_array: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeName {
    Int,
    Float,
    Bool,
    Char,
    Str,
    Void,
    Named(String),
}

impl TypeRef {
    pub fn simple(name: TypeName) -> Self {
        Self { name, is_array: false }
    }
}

impl std::fmt::Display for TypeRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.name {
            TypeName::Int => f.write_str("int")?,
            TypeName::Float => f.write_str("float")?,
            TypeName::Bool => f.write_str("bool")?,
            TypeName::Char => f.write_str("char")?,
            TypeName::Str => f.write_str("string")?,
            TypeName::Void => f.write_str("void")?,
            TypeName::Named(n) => f.write_str(n)?,
        }
        if self.is_array {
            f.write_str("[]")?;
        }
        Ok(())
    }
}

/// Where a variable lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Storage {
    Global,
    Local,
    Param,
    Field,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VarDecl {
    pub name: String,
    pub ty: TypeRef,
    pub is_const: bool,
    /// `N` in `T name[N]`.
    pub array_len: Option<u32>,
    pub storage: Storage,
    /// Set by the analyzer: literal initializer and never written afterwards.
    pub constant: bool,
    /// Introduced by the optimizer (hoisted temporaries); emitted without name mangling.
    pub synthetic: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FuncDecl {
    pub name: String,
    pub ret: TypeRef,
    pub param_count: usize,
    pub is_prototype: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Neg,
    Not,
    PreInc,
    PreDec,
    PostInc,
    PostDec,
}

impl UnaryOp {
    pub fn is_inc_dec(self) -> bool {
        !matches!(self, UnaryOp::Neg | UnaryOp::Not)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            UnaryOp::Neg => "-",
            UnaryOp::Not => "!",
            UnaryOp::PreInc | UnaryOp::PostInc => "++",
            UnaryOp::PreDec | UnaryOp::PostDec => "--",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

impl BinaryOp {
    pub fn as_str(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
        }
    }

    pub fn is_arithmetic(self) -> bool {
        matches!(self, BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod)
    }

    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinaryOp::Eq | BinaryOp::Ne | BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge
        )
    }

    pub fn is_logical(self) -> bool {
        matches!(self, BinaryOp::And | BinaryOp::Or)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssignOp {
    Assign,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

impl AssignOp {
    /// The arithmetic operator a compound assignment applies.
    pub fn binary(self) -> Option<BinaryOp> {
        match self {
            AssignOp::Assign => None,
            AssignOp::Add => Some(BinaryOp::Add),
            AssignOp::Sub => Some(BinaryOp::Sub),
            AssignOp::Mul => Some(BinaryOp::Mul),
            AssignOp::Div => Some(BinaryOp::Div),
            AssignOp::Mod => Some(BinaryOp::Mod),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AssignOp::Assign => "=",
            AssignOp::Add => "+=",
            AssignOp::Sub => "-=",
            AssignOp::Mul => "*=",
            AssignOp::Div => "/=",
            AssignOp::Mod => "%=",
        }
    }
}

/// Built-in console operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConsoleOp {
    WriteLine,
    Write,
    ReadLine,
    /// `print(x)`, same as `Console.WriteLine(x)`.
    Print,
}

impl ConsoleOp {
    pub fn as_str(self) -> &'static str {
        match self {
            ConsoleOp::WriteLine => "Console.WriteLine",
            ConsoleOp::Write => "Console.Write",
            ConsoleOp::ReadLine => "Console.ReadLine",
            ConsoleOp::Print => "print",
        }
    }
}

/// Closed set of node kinds.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    // ========== Declarations ==========
    VarDecl(VarDecl),
    Func(FuncDecl),
    StructDecl { name: String },
    EnumDecl { name: String },
    EnumVariant { name: String, explicit: bool },

    // ========== Statements ==========
    Block,
    If,
    While,
    DoWhile,
    For,
    Switch,
    Case { is_default: bool },
    Break,
    Continue,
    Return,
    ExprStmt,
    Try,
    Throw,
    /// Placeholder for an absent optional part (`for (;;)`).
    Empty,

    // ========== Literals ==========
    Int(i64),
    Float(f64),
    Char(char),
    Str(String),
    Bool(bool),
    Null,

    // ========== Expressions ==========
    Ident(String),
    Unary(UnaryOp),
    Binary(BinaryOp),
    Assign(AssignOp),
    Conditional,
    Index,
    /// One-level member access `obj.name`.
    Field(String),
    Call(String),
    Console(ConsoleOp),
    Cast(TypeRef),
    ArrayInit,

    // ========== Introduced by semantic analysis ==========
    /// String concatenation; both operands are strings.
    Concat,
    /// Explicit to-string coercion of a non-string operand.
    ToStr,
    /// Resolved `Enum.Member` reference.
    EnumMember { enum_name: String, member: String, value: i64 },

    /// Placeholder produced by error recovery.
    Error,
}

impl NodeKind {
    pub fn is_literal(&self) -> bool {
        matches!(
            self,
            NodeKind::Int(_)
                | NodeKind::Float(_)
                | NodeKind::Char(_)
                | NodeKind::Str(_)
                | NodeKind::Bool(_)
                | NodeKind::Null
        )
    }

    /// One-line label used by [`Ast::dump`].
    pub fn label(&self) -> String {
        match self {
            NodeKind::VarDecl(v) => {
                let mut s = String::from("VarDecl ");
                if v.is_const {
                    s.push_str("const ");
                }
                let _ = write!(s, "{} {}", v.ty, v.name);
                if let Some(n) = v.array_len {
                    let _ = write!(s, "[{n}]");
                }
                s
            }
            NodeKind::Func(f) => {
                let proto = if f.is_prototype { " (prototype)" } else { "" };
                format!("Func {} {}/{}{proto}", f.ret, f.name, f.param_count)
            }
            NodeKind::StructDecl { name } => format!("Struct {name}"),
            NodeKind::EnumDecl { name } => format!("Enum {name}"),
            NodeKind::EnumVariant { name, .. } => format!("Variant {name}"),
            NodeKind::Case { is_default: true } => "Default".to_string(),
            NodeKind::Case { is_default: false } => "Case".to_string(),
            NodeKind::Int(v) => format!("Int {v}"),
            NodeKind::Float(v) => format!("Float {v:?}"),
            NodeKind::Char(c) => format!("Char {c:?}"),
            NodeKind::Str(s) => format!("Str {s:?}"),
            NodeKind::Bool(b) => format!("Bool {b}"),
            NodeKind::Ident(n) => format!("Ident {n}"),
            NodeKind::Unary(op) => match op {
                UnaryOp::PostInc | UnaryOp::PostDec => format!("Postfix {}", op.as_str()),
                _ => format!("Unary {}", op.as_str()),
            },
            NodeKind::Binary(op) => format!("Binary {}", op.as_str()),
            NodeKind::Assign(op) => format!("Assign {}", op.as_str()),
            NodeKind::Field(n) => format!("Field {n}"),
            NodeKind::Call(n) => format!("Call {n}"),
            NodeKind::Console(op) => format!("Console {}", op.as_str()),
            NodeKind::Cast(t) => format!("Cast {t}"),
            NodeKind::EnumMember { enum_name, member, value } => format!("EnumMember {enum_name}.{member} = {value}"),
            other => format!("{other:?}"),
        }
    }
}

/// An AST node.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    pub span: Span,
    pub pos: Pos,
    pub children: SmallVec<[NodeId; 4]>,
    /// Resolved type, set by the analyzer.
    pub ty: Option<TypeId>,
    /// Declaring node for identifiers and calls, set by the analyzer.
    pub binding: Option<NodeId>,
}

impl Node {
    pub fn new(kind: NodeKind, span: Span, pos: Pos) -> Self {
        Self {
            kind,
            span,
            pos,
            children: SmallVec::new(),
            ty: None,
            binding: None,
        }
    }

    pub fn with_children(mut self, children: impl IntoIterator<Item = NodeId>) -> Self {
        self.children = children.into_iter().collect();
        self
    }
}

// ============================================================================
// Ast
// ============================================================================

/// Owner of every node of one compilation.
#[derive(Debug, Clone, Default)]
pub struct Ast {
    nodes: Arena<Node>,
    source: String,
}

impl Ast {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            nodes: Arena::new(),
            source: source.into(),
        }
    }

    pub fn alloc(&mut self, node: Node) -> NodeId {
        self.nodes.alloc(node)
    }

    pub fn get(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }

    pub fn get_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 0
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id].kind
    }

    pub fn pos(&self, id: NodeId) -> Pos {
        self.nodes[id].pos
    }

    pub fn span(&self, id: NodeId) -> Span {
        self.nodes[id].span
    }

    /// Source text covered by a node.
    pub fn text(&self, id: NodeId) -> &str {
        let span = self.nodes[id].span;
        self.source.get(span.start..span.end).unwrap_or("")
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id].children
    }

    pub fn child_count(&self, id: NodeId) -> usize {
        self.nodes[id].children.len()
    }

    pub fn child(&self, id: NodeId, index: usize) -> Option<NodeId> {
        self.nodes[id].children.get(index).copied()
    }

    pub fn ty(&self, id: NodeId) -> Option<TypeId> {
        self.nodes[id].ty
    }

    pub fn set_ty(&mut self, id: NodeId, ty: TypeId) {
        self.nodes[id].ty = Some(ty);
    }

    pub fn binding(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id].binding
    }

    pub fn set_binding(&mut self, id: NodeId, decl: NodeId) {
        self.nodes[id].binding = Some(decl);
    }

    pub fn set_children(&mut self, id: NodeId, children: impl IntoIterator<Item = NodeId>) {
        self.nodes[id].children = children.into_iter().collect();
    }

    /// Replace the kind and children of `id`, keeping position, type and binding.
    pub fn replace(&mut self, id: NodeId, kind: NodeKind, children: impl IntoIterator<Item = NodeId>) {
        let node = &mut self.nodes[id];
        node.kind = kind;
        node.children = children.into_iter().collect();
    }

    /// Allocate a node that takes its position from `origin`.
    pub fn alloc_like(&mut self, origin: NodeId, kind: NodeKind, children: impl IntoIterator<Item = NodeId>) -> NodeId {
        let (span, pos) = (self.nodes[origin].span, self.nodes[origin].pos);
        self.alloc(Node::new(kind, span, pos).with_children(children))
    }

    pub fn var_decl(&self, id: NodeId) -> Option<&VarDecl> {
        match &self.nodes[id].kind {
            NodeKind::VarDecl(v) => Some(v),
            _ => None,
        }
    }

    pub fn func_decl(&self, id: NodeId) -> Option<&FuncDecl> {
        match &self.nodes[id].kind {
            NodeKind::Func(f) => Some(f),
            _ => None,
        }
    }

    /// Body block of a function definition.
    pub fn func_body(&self, id: NodeId) -> Option<NodeId> {
        let f = self.func_decl(id)?;
        if f.is_prototype {
            return None;
        }
        self.child(id, f.param_count)
    }

    /// Indented tree dump, one node per line.
    pub fn dump(&self, root: NodeId) -> String {
        let mut out = String::new();
        let mut stack = vec![(root, 0usize)];
        while let Some((id, depth)) = stack.pop() {
            let _ = writeln!(out, "{}{}", "  ".repeat(depth), self.kind(id).label());
            for &child in self.children(id).iter().rev() {
                stack.push((child, depth + 1));
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn children_keep_insertion_order() {
        let mut ast = Ast::new("1 + 2");
        let one = ast.alloc(Node::new(NodeKind::Int(1), Span::new(0, 1), Pos::new(1, 1)));
        let two = ast.alloc(Node::new(NodeKind::Int(2), Span::new(4, 5), Pos::new(1, 5)));
        let add = ast.alloc(
            Node::new(NodeKind::Binary(BinaryOp::Add), Span::new(0, 5), Pos::new(1, 1)).with_children([one, two]),
        );
        assert_eq!(ast.child_count(add), 2);
        assert_eq!(ast.child(add, 0), Some(one));
        assert_eq!(ast.child(add, 1), Some(two));
        assert_eq!(ast.child(add, 2), None);
        assert_eq!(ast.text(add), "1 + 2");
        assert_eq!(ast.text(two), "2");
    }

    #[test]
    fn dump_is_preorder() {
        let mut ast = Ast::new("");
        let lit = ast.alloc(Node::new(NodeKind::Int(14), Span::default(), Pos::default()));
        let decl = ast.alloc(
            Node::new(
                NodeKind::VarDecl(VarDecl {
                    name: "x".into(),
                    ty: TypeRef::simple(TypeName::Int),
                    is_const: false,
                    array_len: None,
                    storage: Storage::Global,
                    constant: false,
                    synthetic: false,
                }),
                Span::default(),
                Pos::default(),
            )
            .with_children([lit]),
        );
        let root = ast.alloc(Node::new(NodeKind::Block, Span::default(), Pos::default()).with_children([decl]));
        assert_eq!(ast.dump(root), "Block\n  VarDecl int x\n    Int 14\n");
    }
}
