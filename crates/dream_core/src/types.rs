//! The Dream type model.
//!
//! Every type a compilation mentions lives in one [`TypeTable`] and is referred to by a [`TypeId`] index. Struct
//! fields hold `TypeId`s of other structs, so mutually referencing (and even circular) struct declarations are
//! ordinary graph edges; the semantic analyzer is responsible for rejecting cycles.
//!
//! ## Notes
//! - Builtin types are allocated once per table and returned by accessor (`table.int()`).
//! - Array and function types are interned structurally; struct and enum types are nominal and always fresh.
//! - The error type never equals anything, itself included. Checks that see it stay silent, which is what keeps a
//!   single mistake from producing a cascade of diagnostics.
//!
//! ## Examples
//! ```rust
//! use dream_core::types::{Type, TypeTable};
//!
//! let mut types = TypeTable::new();
//! let arr = types.array_of(types.int(), Some(3));
//! assert_eq!(types.render(arr), "int[3]");
//! assert!(!types.equal(types.error(), types.error()));
//! ```

use std::collections::HashMap;

use la_arena::{Arena, Idx};

/// Index of a type inside a [`TypeTable`].
pub type TypeId = Idx<Type>;

/// Maximum length of a rendered type name.
pub const MAX_RENDER_LEN: usize = 100;

/// A Dream type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    Int,
    Float,
    Bool,
    Char,
    Str,
    Void,
    /// Type of the `null` literal; only comparable against strings.
    Null,
    Enum(EnumType),
    Struct(StructType),
    Array(ArrayType),
    Function(FunctionType),
    /// A named type the analyzer could not (yet) resolve.
    Unresolved(String),
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EnumType {
    pub name: String,
    pub members: Vec<EnumMember>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EnumMember {
    pub name: String,
    pub value: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StructType {
    pub name: String,
    /// Ordered fields; filled in after all type names are known.
    pub fields: Vec<Field>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Field {
    pub name: String,
    pub ty: TypeId,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArrayType {
    pub elem: TypeId,
    /// `Some(n)` for `T name[n]`, `None` for `T[] name = {...}` before the length is known.
    pub len: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FunctionType {
    pub params: Vec<TypeId>,
    pub ret: TypeId,
}

/// Arena of all types of one compilation.
#[derive(Debug, Clone)]
pub struct TypeTable {
    arena: Arena<Type>,
    interned: HashMap<Type, TypeId>,
    int: TypeId,
    float: TypeId,
    bool_: TypeId,
    char_: TypeId,
    string: TypeId,
    void: TypeId,
    null: TypeId,
    error: TypeId,
}

impl Default for TypeTable {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeTable {
    pub fn new() -> Self {
        let mut arena = Arena::new();
        let int = arena.alloc(Type::Int);
        let float = arena.alloc(Type::Float);
        let bool_ = arena.alloc(Type::Bool);
        let char_ = arena.alloc(Type::Char);
        let string = arena.alloc(Type::Str);
        let void = arena.alloc(Type::Void);
        let null = arena.alloc(Type::Null);
        let error = arena.alloc(Type::Error);
        Self {
            arena,
            interned: HashMap::new(),
            int,
            float,
            bool_,
            char_,
            string,
            void,
            null,
            error,
        }
    }

    // ========================================================================
    // Builtins
    // ========================================================================

    pub fn int(&self) -> TypeId {
        self.int
    }

    pub fn float(&self) -> TypeId {
        self.float
    }

    pub fn bool(&self) -> TypeId {
        self.bool_
    }

    pub fn char(&self) -> TypeId {
        self.char_
    }

    pub fn string(&self) -> TypeId {
        self.string
    }

    pub fn void(&self) -> TypeId {
        self.void
    }

    pub fn null(&self) -> TypeId {
        self.null
    }

    pub fn error(&self) -> TypeId {
        self.error
    }

    // ========================================================================
    // Construction
    // ========================================================================

    /// Allocate a fresh nominal type (struct, enum, unresolved).
    pub fn alloc(&mut self, ty: Type) -> TypeId {
        self.arena.alloc(ty)
    }

    fn intern(&mut self, ty: Type) -> TypeId {
        if let Some(&id) = self.interned.get(&ty) {
            return id;
        }
        let id = self.arena.alloc(ty.clone());
        self.interned.insert(ty, id);
        id
    }

    pub fn array_of(&mut self, elem: TypeId, len: Option<u32>) -> TypeId {
        self.intern(Type::Array(ArrayType { elem, len }))
    }

    pub fn function(&mut self, params: Vec<TypeId>, ret: TypeId) -> TypeId {
        self.intern(Type::Function(FunctionType { params, ret }))
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub fn get(&self, id: TypeId) -> &Type {
        &self.arena[id]
    }

    /// Mutable access, used to complete struct fields and enum members after name collection.
    pub fn get_mut(&mut self, id: TypeId) -> &mut Type {
        &mut self.arena[id]
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.len() == 0
    }

    pub fn is_error(&self, id: TypeId) -> bool {
        matches!(self.get(id), Type::Error)
    }

    /// `int` and `char` (enums need an explicit cast).
    pub fn is_integral(&self, id: TypeId) -> bool {
        matches!(self.get(id), Type::Int | Type::Char)
    }

    /// `int`, `float` and `char`.
    pub fn is_numeric(&self, id: TypeId) -> bool {
        matches!(self.get(id), Type::Int | Type::Float | Type::Char)
    }

    pub fn is_string(&self, id: TypeId) -> bool {
        matches!(self.get(id), Type::Str)
    }

    pub fn is_enum(&self, id: TypeId) -> bool {
        matches!(self.get(id), Type::Enum(_))
    }

    pub fn as_struct(&self, id: TypeId) -> Option<&StructType> {
        match self.get(id) {
            Type::Struct(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_enum(&self, id: TypeId) -> Option<&EnumType> {
        match self.get(id) {
            Type::Enum(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_array(&self, id: TypeId) -> Option<&ArrayType> {
        match self.get(id) {
            Type::Array(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_function(&self, id: TypeId) -> Option<&FunctionType> {
        match self.get(id) {
            Type::Function(f) => Some(f),
            _ => None,
        }
    }

    /// Structural equality.
    ///
    /// ## Notes
    /// - Two types are equal iff their kinds and payloads match. Struct fields compare by `TypeId`, so recursion
    ///   never follows a struct edge and terminates on cyclic graphs.
    /// - The error type equals nothing, including itself.
    pub fn equal(&self, a: TypeId, b: TypeId) -> bool {
        let (ta, tb) = (self.get(a), self.get(b));
        if matches!(ta, Type::Error) || matches!(tb, Type::Error) {
            return false;
        }
        if a == b {
            return true;
        }
        match (ta, tb) {
            (Type::Array(x), Type::Array(y)) => x.len == y.len && self.equal(x.elem, y.elem),
            (Type::Function(x), Type::Function(y)) => {
                x.params.len() == y.params.len()
                    && self.equal(x.ret, y.ret)
                    && x.params.iter().zip(&y.params).all(|(p, q)| self.equal(*p, *q))
            }
            _ => ta == tb,
        }
    }

    /// Render a type for diagnostics, truncated to [`MAX_RENDER_LEN`] characters.
    pub fn render(&self, id: TypeId) -> String {
        let mut out = String::new();
        self.render_into(id, &mut out);
        if out.chars().count() > MAX_RENDER_LEN {
            let mut cut: String = out.chars().take(MAX_RENDER_LEN - 3).collect();
            cut.push_str("...");
            return cut;
        }
        out
    }

    fn render_into(&self, id: TypeId, out: &mut String) {
        // Long parameter lists are cut off early; render() truncates the rest.
        if out.len() > MAX_RENDER_LEN * 4 {
            return;
        }
        match self.get(id) {
            Type::Int => out.push_str("int"),
            Type::Float => out.push_str("float"),
            Type::Bool => out.push_str("bool"),
            Type::Char => out.push_str("char"),
            Type::Str => out.push_str("string"),
            Type::Void => out.push_str("void"),
            Type::Null => out.push_str("null"),
            Type::Enum(e) => out.push_str(&e.name),
            Type::Struct(s) => out.push_str(&s.name),
            Type::Array(a) => {
                self.render_into(a.elem, out);
                match a.len {
                    Some(n) => out.push_str(&format!("[{n}]")),
                    None => out.push_str("[]"),
                }
            }
            Type::Function(f) => {
                out.push_str("func ");
                self.render_into(f.ret, out);
                out.push('(');
                for (i, p) in f.params.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    self.render_into(*p, out);
                }
                out.push(')');
            }
            Type::Unresolved(name) => {
                out.push_str("<unresolved ");
                out.push_str(name);
                out.push('>');
            }
            Type::Error => out.push_str("<error>"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtins_are_equal_to_themselves_only() {
        let t = TypeTable::new();
        assert!(t.equal(t.int(), t.int()));
        assert!(!t.equal(t.int(), t.float()));
        assert!(!t.equal(t.string(), t.null()));
    }

    #[test]
    fn error_type_equals_nothing() {
        let t = TypeTable::new();
        assert!(!t.equal(t.error(), t.error()));
        assert!(!t.equal(t.error(), t.int()));
        assert!(!t.equal(t.int(), t.error()));
    }

    #[test]
    fn arrays_and_functions_are_interned_structurally() {
        let mut t = TypeTable::new();
        let a = t.array_of(t.int(), Some(4));
        let b = t.array_of(t.int(), Some(4));
        let c = t.array_of(t.int(), None);
        assert_eq!(a, b);
        assert!(!t.equal(a, c));
        let f = t.function(vec![t.int(), t.float()], t.void());
        let g = t.function(vec![t.int(), t.float()], t.void());
        assert!(t.equal(f, g));
        assert_eq!(t.render(f), "func void(int, float)");
    }

    #[test]
    fn structs_are_nominal_and_may_reference_each_other() {
        let mut t = TypeTable::new();
        let a = t.alloc(Type::Struct(StructType {
            name: "A".into(),
            fields: vec![],
        }));
        let b = t.alloc(Type::Struct(StructType {
            name: "B".into(),
            fields: vec![Field { name: "a".into(), ty: a }],
        }));
        if let Type::Struct(s) = t.get_mut(a) {
            s.fields.push(Field { name: "b".into(), ty: b });
        }
        assert!(t.equal(a, a));
        assert!(!t.equal(a, b));
        assert_eq!(t.as_struct(a).unwrap().fields[0].ty, b);
    }

    #[test]
    fn render_is_capped() {
        let mut t = TypeTable::new();
        let params = vec![t.int(); 200];
        let f = t.function(params, t.int());
        let rendered = t.render(f);
        assert_eq!(rendered.chars().count(), MAX_RENDER_LEN);
        assert!(rendered.ends_with("..."));
    }
}
