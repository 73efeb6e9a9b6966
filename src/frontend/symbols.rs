//! Symbol table and scope management for Dream
//!
//! Tracks all named entities (variables, constants, functions, enum members, types) and the lexical scopes that
//! hold them. Scopes form a parent chain; lookup walks outwards and the innermost definition wins.
//!
//! ## Notes
//! - Scopes are never freed during a compilation; `exit_scope` only moves the cursor back to the parent. Enum
//!   scopes stay reachable through their type symbol and answer `Enum.Member` lookups later on.
//! - Symbols and scopes are plain indices into vectors owned by the table.

use std::collections::HashMap;

use dream_core::types::TypeId;

use crate::frontend::ast::{NodeId, Pos};

/// Unique identifier for symbols
pub type SymbolId = usize;

/// Unique identifier for scopes
pub type ScopeId = usize;

/// Names that always resolve to a builtin.
pub const BUILTINS: &[&str] = &["print", "Console"];

/// Symbol table managing all named entities
#[derive(Debug)]
pub struct SymbolTable {
    symbols: Vec<Symbol>,
    scopes: Vec<Scope>,
    current_scope: ScopeId,
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

impl SymbolTable {
    /// A table positioned in the global scope, whose parent is the builtin prelude.
    pub fn new() -> Self {
        let mut table = Self {
            symbols: Vec::new(),
            scopes: vec![Scope::new(None, ScopeKind::Prelude, 0)],
            current_scope: 0,
        };
        for name in BUILTINS {
            // The prelude starts empty, so these never collide.
            let _ = table.define(Symbol::new(*name, SymbolKind::Builtin, None, Pos::default()));
        }
        table.enter_scope(ScopeKind::Global);
        table
    }

    /// Enter a new scope nested in the current one.
    pub fn enter_scope(&mut self, kind: ScopeKind) -> ScopeId {
        let depth = self.scopes[self.current_scope].depth + 1;
        self.scopes.push(Scope::new(Some(self.current_scope), kind, depth));
        self.current_scope = self.scopes.len() - 1;
        self.current_scope
    }

    /// Exit the current scope
    pub fn exit_scope(&mut self) {
        if let Some(parent) = self.scopes[self.current_scope].parent {
            self.current_scope = parent;
        }
    }

    /// Define a symbol in the current scope.
    ///
    /// ## Errors
    /// Returns the existing symbol when the name is already defined in this very scope. Shadowing an outer
    /// definition is fine.
    pub fn define(&mut self, mut symbol: Symbol) -> Result<SymbolId, SymbolId> {
        if let Some(existing) = self.lookup_local(&symbol.name) {
            return Err(existing);
        }
        symbol.scope = self.current_scope;
        let id = self.symbols.len();
        self.scopes[self.current_scope].symbols.insert(symbol.name.clone(), id);
        self.symbols.push(symbol);
        Ok(id)
    }

    /// Look up a symbol by name in the current scope chain
    pub fn lookup(&self, name: &str) -> Option<SymbolId> {
        let mut scope_idx = self.current_scope;
        loop {
            if let Some(&id) = self.scopes[scope_idx].symbols.get(name) {
                return Some(id);
            }
            scope_idx = self.scopes[scope_idx].parent?;
        }
    }

    /// Look up a symbol only in the current scope (no parent lookup)
    pub fn lookup_local(&self, name: &str) -> Option<SymbolId> {
        self.scopes[self.current_scope].symbols.get(name).copied()
    }

    /// Look up a name directly inside `scope`, e.g. a member of an enum scope.
    pub fn lookup_in(&self, scope: ScopeId, name: &str) -> Option<SymbolId> {
        self.scopes.get(scope)?.symbols.get(name).copied()
    }

    pub fn get(&self, id: SymbolId) -> Option<&Symbol> {
        self.symbols.get(id)
    }

    pub fn get_mut(&mut self, id: SymbolId) -> Option<&mut Symbol> {
        self.symbols.get_mut(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Symbol> {
        self.symbols.iter()
    }

    pub fn current_scope(&self) -> ScopeId {
        self.current_scope
    }

    pub fn current_scope_kind(&self) -> ScopeKind {
        self.scopes[self.current_scope].kind
    }

    /// Nesting depth of the current scope; the global scope has depth 1.
    pub fn depth(&self) -> u32 {
        self.scopes[self.current_scope].depth
    }

    pub fn at_global_scope(&self) -> bool {
        self.current_scope_kind() == ScopeKind::Global
    }

    /// Scope kinds from the current scope outwards, stopping at the enclosing function (inclusive).
    fn enclosing(&self) -> impl Iterator<Item = &Scope> {
        let mut next = Some(self.current_scope);
        let mut done = false;
        std::iter::from_fn(move || {
            if done {
                return None;
            }
            let scope = &self.scopes[next?];
            done = scope.kind == ScopeKind::Function;
            next = scope.parent;
            Some(scope)
        })
    }

    /// Check if `continue` is legal here.
    pub fn in_loop(&self) -> bool {
        self.enclosing().any(|s| s.kind == ScopeKind::Loop)
    }

    /// Check if `break` is legal here.
    pub fn in_breakable(&self) -> bool {
        self.enclosing().any(|s| matches!(s.kind, ScopeKind::Loop | ScopeKind::Switch))
    }

    /// Check if we're inside a function body
    pub fn in_function(&self) -> bool {
        self.enclosing().any(|s| s.kind == ScopeKind::Function)
    }

    /// The declaring node and return type of the enclosing function, if any.
    pub fn current_function(&self) -> Option<(NodeId, TypeId)> {
        self.enclosing()
            .find(|s| s.kind == ScopeKind::Function)
            .and_then(|s| s.function)
    }

    /// Attach the function being checked to the current (function) scope.
    pub fn set_function(&mut self, decl: NodeId, return_type: TypeId) {
        self.scopes[self.current_scope].function = Some((decl, return_type));
    }
}

/// A scope containing symbol definitions
#[derive(Debug)]
pub struct Scope {
    pub parent: Option<ScopeId>,
    pub kind: ScopeKind,
    pub depth: u32,
    pub symbols: HashMap<String, SymbolId>,
    /// Function declaration and return type, for function scopes.
    pub function: Option<(NodeId, TypeId)>,
}

impl Scope {
    pub fn new(parent: Option<ScopeId>, kind: ScopeKind, depth: u32) -> Self {
        Self {
            parent,
            kind,
            depth,
            symbols: HashMap::new(),
            function: None,
        }
    }
}

/// Kind of scope
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    /// Builtins, parent of the global scope.
    Prelude,
    Global,
    /// Parameters and the outermost block of a function body.
    Function,
    Block,
    /// Loop body (and `for` header declarations).
    Loop,
    /// One `case` or `default` arm.
    Switch,
    Try,
    /// Members of one enum.
    Enum,
}

/// A symbol in the symbol table
#[derive(Debug, Clone)]
pub struct Symbol {
    pub name: String,
    pub kind: SymbolKind,
    /// Declared type; `None` for builtins.
    pub ty: Option<TypeId>,
    /// Declaring AST node.
    pub decl: Option<NodeId>,
    pub scope: ScopeId,
    pub pos: Pos,
}

impl Symbol {
    pub fn new(name: impl Into<String>, kind: SymbolKind, ty: Option<TypeId>, pos: Pos) -> Self {
        Self {
            name: name.into(),
            kind,
            ty,
            decl: None,
            scope: 0,
            pos,
        }
    }

    pub fn with_decl(mut self, decl: NodeId) -> Self {
        self.decl = Some(decl);
        self
    }

    /// Short description used in "is a ..., not a value" diagnostics.
    pub fn describe(&self) -> &'static str {
        match self.kind {
            SymbolKind::Variable { .. } => "variable",
            SymbolKind::Function(_) => "function",
            SymbolKind::EnumMember { .. } => "enum member",
            SymbolKind::Type { .. } => "type",
            SymbolKind::Builtin => "builtin",
        }
    }
}

/// Kind of symbol
#[derive(Debug, Clone)]
pub enum SymbolKind {
    Variable(VariableInfo),
    Function(FunctionInfo),
    EnumMember { value: i64 },
    /// Struct or enum type; enums carry the scope of their members.
    Type { members: Option<ScopeId> },
    Builtin,
}

/// Variable information
#[derive(Debug, Clone, Default)]
pub struct VariableInfo {
    pub is_const: bool,
    /// Assigned or incremented anywhere after its declaration.
    pub mutated: bool,
}

/// Function information
#[derive(Debug, Clone)]
pub struct FunctionInfo {
    pub params: Vec<TypeId>,
    pub return_type: TypeId,
    /// A body has been seen (not just a prototype).
    pub defined: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use dream_core::types::TypeTable;

    fn var(name: &str, ty: TypeId) -> Symbol {
        Symbol::new(name, SymbolKind::Variable(VariableInfo::default()), Some(ty), Pos::default())
    }

    #[test]
    fn shadowing_resolves_innermost() {
        let types = TypeTable::new();
        let mut table = SymbolTable::new();
        let outer = table.define(var("x", types.int())).unwrap();
        table.enter_scope(ScopeKind::Block);
        let inner = table.define(var("x", types.float())).unwrap();
        assert_eq!(table.lookup("x"), Some(inner));
        table.exit_scope();
        assert_eq!(table.lookup("x"), Some(outer));
    }

    #[test]
    fn same_scope_redefinition_returns_existing() {
        let types = TypeTable::new();
        let mut table = SymbolTable::new();
        let first = table.define(var("x", types.int())).unwrap();
        assert_eq!(table.define(var("x", types.int())), Err(first));
    }

    #[test]
    fn builtins_live_in_the_prelude() {
        let table = SymbolTable::new();
        let id = table.lookup("print").unwrap();
        assert!(matches!(table.get(id).unwrap().kind, SymbolKind::Builtin));
        assert_eq!(table.lookup_local("print"), None);
        assert!(table.at_global_scope());
        assert_eq!(table.depth(), 1);
    }

    #[test]
    fn loop_context_stops_at_function_boundary() {
        let mut table = SymbolTable::new();
        table.enter_scope(ScopeKind::Loop);
        assert!(table.in_loop());
        table.enter_scope(ScopeKind::Switch);
        assert!(table.in_loop());
        assert!(table.in_breakable());
        table.exit_scope();
        table.exit_scope();
        table.enter_scope(ScopeKind::Switch);
        assert!(!table.in_loop());
        assert!(table.in_breakable());
        table.exit_scope();
        table.enter_scope(ScopeKind::Function);
        assert!(table.in_function());
        assert!(!table.in_breakable());
        assert_eq!(table.current_function(), None);
    }

    #[test]
    fn enum_scope_answers_member_lookups_after_exit() {
        let types = TypeTable::new();
        let mut table = SymbolTable::new();
        let scope = table.enter_scope(ScopeKind::Enum);
        table
            .define(Symbol::new("Red", SymbolKind::EnumMember { value: 0 }, Some(types.int()), Pos::default()))
            .unwrap();
        table.exit_scope();
        assert_eq!(table.lookup("Red"), None);
        assert!(table.lookup_in(scope, "Red").is_some());
    }
}
