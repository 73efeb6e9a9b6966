//! Catalog of semantic diagnostics.
//!
//! Every message the analyzer emits is built here so wording stays consistent and tests can refer to one place.
//! Each constructor takes the `(span, pos)` of the offending node.

use crate::frontend::ast::{Pos, Span};
use crate::frontend::diagnostics::{Diagnostic, Stage};

/// Source location of a node.
pub type At = (Span, Pos);

fn error(message: impl Into<String>, at: At) -> Diagnostic {
    Diagnostic::error(Stage::Semantic, message, at.0, at.1)
}

// ============================================================================
// Names and scopes
// ============================================================================

pub fn undefined_variable(name: &str, at: At) -> Diagnostic {
    error(format!("undefined variable '{name}'"), at)
}

pub fn undefined_function(name: &str, at: At) -> Diagnostic {
    error(format!("undefined function '{name}'"), at)
}

pub fn unknown_type(name: &str, at: At) -> Diagnostic {
    error(format!("unknown type '{name}'"), at).with_hint("struct and enum types must be declared at the top level")
}

pub fn duplicate_declaration(name: &str, previous: Pos, at: At) -> Diagnostic {
    error(format!("duplicate declaration of '{name}': redefinition in the same scope"), at)
        .with_note(format!("previous declaration at {previous}"))
}

pub fn not_a_function(name: &str, at: At) -> Diagnostic {
    error(format!("'{name}' is not a function"), at)
}

pub fn not_a_value(name: &str, what: &str, at: At) -> Diagnostic {
    error(format!("'{name}' is a {what}, not a value"), at)
}

// ============================================================================
// Functions
// ============================================================================

pub fn duplicate_function(name: &str, previous: Pos, at: At) -> Diagnostic {
    error(format!("redefinition of function '{name}'"), at).with_note(format!("previous definition at {previous}"))
}

pub fn conflicting_function(name: &str, previous: &str, current: &str, at: At) -> Diagnostic {
    error(format!("conflicting declaration of function '{name}'"), at)
        .with_note(format!("previously declared as '{previous}', now '{current}'"))
        .with_hint("function overloading is not supported")
}

pub fn undefined_prototype(name: &str, at: At) -> Diagnostic {
    error(format!("function '{name}' is declared but never defined"), at)
}

pub fn builtin_redefinition(name: &str, at: At) -> Diagnostic {
    error(format!("cannot redefine builtin function '{name}'"), at)
}

pub fn arity_mismatch(name: &str, expected: usize, found: usize, at: At) -> Diagnostic {
    error(format!("function '{name}' expects {expected} argument(s), found {found}"), at)
}

pub fn void_return_value(name: &str, at: At) -> Diagnostic {
    error(format!("void function '{name}' cannot return a value"), at)
}

pub fn missing_return_value(name: &str, at: At) -> Diagnostic {
    error(format!("non-void function '{name}' must return a value"), at)
}

pub fn missing_return(name: &str, at: At) -> Diagnostic {
    Diagnostic::warning(
        Stage::Semantic,
        format!("function '{name}' may reach the end without returning a value"),
        at.0,
        at.1,
    )
    .with_note("a zero value is returned in that case")
}

pub fn array_return(name: &str, at: At) -> Diagnostic {
    error(format!("function '{name}' cannot return an array"), at)
}

pub fn nested_declaration(what: &str, at: At) -> Diagnostic {
    error(format!("{what} declarations are only allowed at the top level"), at)
}

// ============================================================================
// Enums and structs
// ============================================================================

pub fn empty_enum(name: &str, at: At) -> Diagnostic {
    error(format!("enum '{name}' must have at least one member"), at)
}

pub fn duplicate_enum_member(enum_name: &str, member: &str, at: At) -> Diagnostic {
    error(format!("duplicate enum member '{member}' in enum '{enum_name}': redefinition"), at)
}

pub fn duplicate_enum_value(enum_name: &str, value: i64, first: &str, second: &str, at: At) -> Diagnostic {
    error(
        format!("duplicate enum value {value} in enum '{enum_name}': '{second}' has the same value as '{first}'"),
        at,
    )
}

pub fn enum_value_not_constant(member: &str, at: At) -> Diagnostic {
    error(format!("enum value for '{member}' must be an integer constant"), at)
}

pub fn unknown_enum_member(enum_name: &str, member: &str, at: At) -> Diagnostic {
    error(format!("enum '{enum_name}' has no member '{member}'"), at)
}

/// `path` lists the structs of the cycle, first one repeated at the end.
pub fn circular_struct(path: &[String], at: At) -> Diagnostic {
    error(format!("circular dependency between structs: {}", path.join(" -> ")), at)
        .with_hint("a struct cannot contain itself by value")
}

pub fn duplicate_field(struct_name: &str, field: &str, at: At) -> Diagnostic {
    error(format!("duplicate field '{field}' in struct '{struct_name}'"), at)
}

pub fn unknown_field(struct_name: &str, field: &str, at: At) -> Diagnostic {
    error(format!("struct '{struct_name}' has no field '{field}'"), at)
}

pub fn not_a_struct(ty: &str, at: At) -> Diagnostic {
    error(format!("member access on non-struct type '{ty}'"), at)
}

// ============================================================================
// Types and values
// ============================================================================

pub fn type_mismatch(expected: &str, found: &str, at: At) -> Diagnostic {
    let mut d = error(format!("type mismatch: expected '{expected}', found '{found}'"), at);
    if expected == "int" && found == "float" {
        d = d.with_hint("use an explicit cast: (int)value");
    }
    if found == "int" && (expected != "int" && expected != "float" && expected != "string") && !expected.contains('[') {
        d = d.with_hint(format!("use an explicit cast: ({expected})value"));
    }
    d
}

pub fn invalid_operands(op: &str, lhs: &str, rhs: &str, at: At) -> Diagnostic {
    error(format!("type mismatch: operator '{op}' cannot be applied to '{lhs}' and '{rhs}'"), at)
}

pub fn invalid_operand(op: &str, ty: &str, at: At) -> Diagnostic {
    error(format!("type mismatch: operator '{op}' cannot be applied to '{ty}'"), at)
}

pub fn invalid_concat(ty: &str, at: At) -> Diagnostic {
    error(format!("cannot concatenate 'string' with '{ty}'"), at)
}

pub fn int_out_of_range(value: i64, at: At) -> Diagnostic {
    error(format!("integer literal {value} is out of range for 'int'"), at)
        .with_note("'int' holds values from -2147483648 to 2147483647")
}

pub fn float_out_of_range(at: At) -> Diagnostic {
    error("float literal is out of range for 'float'", at)
}

pub fn non_ascii_char(c: char, at: At) -> Diagnostic {
    error(format!("character literal '{c}' is not ASCII"), at)
}

pub fn invalid_cast(from: &str, to: &str, at: At) -> Diagnostic {
    error(format!("invalid cast from '{from}' to '{to}'"), at)
}

pub fn invalid_condition(ty: &str, at: At) -> Diagnostic {
    error(format!("condition must be 'bool' or an integer, found '{ty}'"), at)
}

pub fn void_variable(name: &str, at: At) -> Diagnostic {
    error(format!("variable '{name}' cannot have type 'void'"), at)
}

pub fn not_indexable(ty: &str, at: At) -> Diagnostic {
    error(format!("cannot index a value of type '{ty}'"), at)
}

pub fn index_not_int(ty: &str, at: At) -> Diagnostic {
    error(format!("array index must be an integer, found '{ty}'"), at)
}

pub fn index_out_of_bounds(index: i64, ty: &str, at: At) -> Diagnostic {
    error(format!("array index {index} is out of bounds for '{ty}'"), at)
}

pub fn not_printable(ty: &str, at: At) -> Diagnostic {
    error(format!("cannot print a value of type '{ty}'"), at)
}

pub fn console_arity(op: &str, expected: &str, found: usize, at: At) -> Diagnostic {
    error(format!("{op} expects {expected} argument(s), found {found}"), at)
}

pub fn throw_value(ty: &str, at: At) -> Diagnostic {
    error(format!("cannot throw a value of type '{ty}'"), at)
}

// ============================================================================
// Assignment and arrays
// ============================================================================

pub fn const_assignment(name: &str, at: At) -> Diagnostic {
    error(format!("cannot assign to const variable '{name}'"), at)
}

pub fn const_uninitialized(name: &str, at: At) -> Diagnostic {
    error(format!("const variable '{name}' must be initialized"), at)
}

pub fn not_assignable(at: At) -> Diagnostic {
    error("expression is not assignable", at)
}

pub fn array_assignment(at: At) -> Diagnostic {
    error("arrays cannot be assigned", at).with_hint("assign the elements one by one")
}

pub fn array_init_outside_declaration(at: At) -> Diagnostic {
    error("array initializer is only allowed in an array declaration", at)
}

pub fn array_needs_initializer(name: &str, at: At) -> Diagnostic {
    error(format!("array '{name}' needs a size or an initializer list"), at)
}

pub fn too_many_initializers(len: u32, found: usize, at: At) -> Diagnostic {
    error(format!("too many initializers for array of size {len}: found {found}"), at)
}

// ============================================================================
// Control flow
// ============================================================================

pub fn break_outside(at: At) -> Diagnostic {
    error("'break' outside of a loop or switch", at)
}

pub fn continue_outside(at: At) -> Diagnostic {
    error("'continue' outside of a loop", at)
}

pub fn return_outside(at: At) -> Diagnostic {
    error("'return' outside of a function", at)
}

pub fn invalid_switch_subject(ty: &str, at: At) -> Diagnostic {
    error(format!("switch subject must be an integer, char or enum, found '{ty}'"), at)
}

pub fn case_not_constant(at: At) -> Diagnostic {
    error("case value must be a constant", at)
}

pub fn duplicate_case(value: i64, at: At) -> Diagnostic {
    error(format!("duplicate case value {value} in switch"), at)
}
