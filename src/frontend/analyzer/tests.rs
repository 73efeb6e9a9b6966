use super::*;
use crate::frontend::diagnostics::Severity;
use crate::frontend::parser::{self, ParseOptions};

struct Checked {
    ast: Ast,
    root: NodeId,
    diagnostics: Diagnostics,
    analysis: Analysis,
}

fn check(source: &str) -> Checked {
    let out = parser::parse_source(source, &ParseOptions::default()).expect("parse");
    assert!(!out.has_errors(), "unexpected syntax errors: {:?}", out.diagnostics.error_message(0));
    let parser::ParseOutput {
        mut ast,
        root,
        mut diagnostics,
    } = out;
    let analysis = analyze(&mut ast, root, &mut diagnostics);
    Checked {
        ast,
        root,
        diagnostics,
        analysis,
    }
}

fn errors(source: &str) -> Vec<String> {
    check(source).diagnostics.errors().map(|d| d.message.clone()).collect()
}

fn assert_clean(source: &str) {
    let errs = errors(source);
    assert!(errs.is_empty(), "expected no errors, got {errs:?}");
}

fn assert_error(source: &str, expected: &str) {
    let errs = errors(source);
    assert!(
        errs.iter().any(|e| e.contains(expected)),
        "expected an error containing {expected:?}, got {errs:?}"
    );
}

/// First top-level statement of kind `VarDecl` named `name`.
fn decl<'a>(c: &'a Checked, name: &str) -> (NodeId, &'a crate::frontend::ast::VarDecl) {
    c.ast
        .children(c.root)
        .iter()
        .find_map(|&id| c.ast.var_decl(id).filter(|v| v.name == name).map(|v| (id, v)))
        .expect("declaration")
}

// ============================================================================
// Scopes and names
// ============================================================================

#[test]
fn shadowing_in_nested_scopes_is_allowed() {
    assert_clean("int x = 1; { int x = 2; { int x = 3; print(x); } print(x); } print(x);");
}

#[test]
fn same_scope_redeclaration_is_rejected() {
    assert_error("int x = 1; int x = 2;", "duplicate declaration of 'x': redefinition");
}

#[test]
fn parameters_share_the_function_body_scope() {
    assert_error("func int f(int a) { int a = 1; return a; }", "duplicate declaration of 'a'");
}

#[test]
fn each_undefined_use_is_reported() {
    let errs = errors("int y = x + x * 2;");
    assert_eq!(errs, vec!["undefined variable 'x'", "undefined variable 'x'"]);
}

#[test]
fn identifiers_bind_to_their_declaration() {
    let c = check("int x = 1; int y = x;");
    let (x_decl, _) = decl(&c, "x");
    let (y_decl, _) = decl(&c, "y");
    let init = c.ast.child(y_decl, 0).unwrap();
    assert_eq!(c.ast.binding(init), Some(x_decl));
    assert!(c.analysis.types.equal(c.ast.ty(init).unwrap(), c.analysis.types.int()));
}

#[test]
fn using_a_function_or_type_as_a_value_is_rejected() {
    assert_error("func void f() {} int x = f;", "'f' is a function, not a value");
    assert_error("struct P { int x; } int y = P;", "'P' is a type, not a value");
}

// ============================================================================
// Literals
// ============================================================================

#[test]
fn int_boundaries() {
    assert_clean("int a = 2147483647; int b = -2147483648; int c = -2147483647;");
    assert_error("int a = 2147483648;", "integer literal 2147483648 is out of range for 'int'");
    assert_error("int a = 99999999999;", "out of range");
}

#[test]
fn int_min_literal_becomes_a_single_node() {
    let c = check("int b = -2147483648;");
    let (id, _) = decl(&c, "b");
    let init = c.ast.child(id, 0).unwrap();
    assert_eq!(c.ast.kind(init), &NodeKind::Int(-2_147_483_648));
}

#[test]
fn float_overflow_and_non_ascii_chars() {
    assert_error("float f = 1e999;", "float literal is out of range");
    assert_error("char c = 'é';", "is not ASCII");
}

// ============================================================================
// Types
// ============================================================================

#[test]
fn arithmetic_requires_numeric_operands() {
    assert_error("bool b = true; int x = b + 1;", "operator '+' cannot be applied to 'bool' and 'int'");
    assert_error("float f = 1.5 % 2.0;", "operator '%' cannot be applied");
    assert_clean("char c = 'a'; int x = c + 1; float f = x * 2.5;");
}

#[test]
fn int_float_promotion_is_one_way() {
    assert_clean("float f = 1;");
    assert_error("int i = 1.5;", "type mismatch: expected 'int', found 'float'");
    assert_clean("int i = (int)1.5;");
}

#[test]
fn logical_operators_need_bool() {
    assert_error("int x = 1; bool b = x && true;", "operator '&&' cannot be applied to 'int' and 'bool'");
    assert_clean("bool b = 1 < 2 && !false;");
}

#[test]
fn string_plus_becomes_concat_with_coercions() {
    let c = check("string s = \"n = \" + 42;");
    let (id, _) = decl(&c, "s");
    let init = c.ast.child(id, 0).unwrap();
    assert_eq!(c.ast.kind(init), &NodeKind::Concat);
    let rhs = c.ast.child(init, 1).unwrap();
    assert_eq!(c.ast.kind(rhs), &NodeKind::ToStr);
    assert_eq!(c.ast.kind(c.ast.child(rhs, 0).unwrap()), &NodeKind::Int(42));
}

#[test]
fn concat_rejects_null_structs_and_arrays() {
    assert_error("string s = \"a\" + null;", "cannot concatenate 'string' with 'null'");
    assert_error("struct P { int x; } P p; string s = \"a\" + p;", "cannot concatenate 'string' with 'P'");
    assert_error("int a[2]; string s = \"a\" + a;", "cannot concatenate 'string' with 'int[2]'");
}

#[test]
fn string_compound_assignment_coerces() {
    let c = check("string s = \"x\"; s += 1;");
    let stmt = c.ast.child(c.root, 1).unwrap();
    let assign = c.ast.child(stmt, 0).unwrap();
    let value = c.ast.child(assign, 1).unwrap();
    assert_eq!(c.ast.kind(value), &NodeKind::ToStr);
}

#[test]
fn strings_compare_only_for_equality() {
    assert_clean("string s = \"a\"; bool b = s == \"a\" || s != null;");
    assert_error("bool b = \"a\" < \"b\";", "operator '<' cannot be applied");
}

#[test]
fn error_type_does_not_cascade() {
    let errs = errors("int y = (undefined + 1) * 2 - undefined2;");
    assert_eq!(errs.len(), 2, "{errs:?}");
}

#[test]
fn conditions_accept_bool_and_integers() {
    assert_clean("int x = 1; if (x) { } while (true) { break; }");
    assert_error("if (\"s\") { }", "condition must be 'bool' or an integer, found 'string'");
}

#[test]
fn casts() {
    assert_clean("enum E { A, B } int i = (int)E.B; E e = (E)1; string s = (string)3.5; char c = (char)65;");
    assert_error("string s = \"1\"; int i = (int)s;", "invalid cast from 'string' to 'int'");
}

// ============================================================================
// Enums
// ============================================================================

#[test]
fn enum_values_auto_increment_from_previous() {
    let c = check("enum E { A, B = 5, C, D = 10 }");
    let decl = c.ast.child(c.root, 0).unwrap();
    let ty = c.ast.ty(decl).unwrap();
    let values: Vec<i64> = c
        .analysis
        .types
        .as_enum(ty)
        .unwrap()
        .members
        .iter()
        .map(|m| m.value)
        .collect();
    assert_eq!(values, vec![0, 5, 6, 10]);
}

#[test]
fn enum_duplicates_are_rejected() {
    assert_error("enum E { A, B, A }", "duplicate enum member 'A' in enum 'E': redefinition");
    assert_error("enum E { A = 1, B = 0, C }", "duplicate enum value 1 in enum 'E'");
    assert_error("enum E { }", "enum 'E' must have at least one member");
}

#[test]
fn enum_member_access_is_resolved() {
    let c = check("enum Color { Red, Green = 4 } Color c = Color.Green;");
    let (id, _) = decl(&c, "c");
    let init = c.ast.child(id, 0).unwrap();
    assert_eq!(
        c.ast.kind(init),
        &NodeKind::EnumMember {
            enum_name: "Color".into(),
            member: "Green".into(),
            value: 4
        }
    );
    assert_error("enum Color { Red } Color c = Color.Blue;", "enum 'Color' has no member 'Blue'");
}

#[test]
fn enums_need_casts_to_mix_with_ints() {
    assert_error("enum E { A } int x = E.A;", "type mismatch: expected 'int', found 'E'");
    assert_error("enum E { A } enum F { B } bool b = E.A == F.B;", "operator '==' cannot be applied");
}

// ============================================================================
// Structs
// ============================================================================

#[test]
fn circular_structs_are_detected() {
    assert_error(
        "struct A { B b; } struct B { A a; }",
        "circular dependency between structs: A -> B -> A",
    );
    assert_error("struct S { S inner[2]; }", "circular dependency between structs: S -> S");
}

#[test]
fn struct_order_puts_dependencies_first() {
    let c = check("struct Outer { Inner i; int n; } struct Inner { int x; }");
    let names: Vec<String> = c
        .analysis
        .struct_order
        .iter()
        .map(|&t| c.analysis.types.render(t))
        .collect();
    assert_eq!(names, vec!["Inner", "Outer"]);
}

#[test]
fn struct_fields_are_checked() {
    assert_clean("struct P { int x; float y; } P p; p.x = 3; float f = p.y + p.x;");
    assert_error("struct P { int x; } P p; int z = p.z;", "struct 'P' has no field 'z'");
    assert_error("struct P { int x; int x; }", "duplicate field 'x' in struct 'P'");
    assert_error("int n = 1; int z = n.x;", "member access on non-struct type 'int'");
}

// ============================================================================
// Functions
// ============================================================================

#[test]
fn prototype_then_definition_is_legal() {
    assert_clean(
        "func int odd(int n); func int even(int n) { if (n == 0) { return 1; } return odd(n - 1); } \
         func int odd(int n) { if (n == 0) { return 0; } return even(n - 1); } print(even(4));",
    );
}

#[test]
fn function_declaration_errors() {
    assert_error("func int f() { return 1; } func int f() { return 2; }", "redefinition of function 'f'");
    assert_error("func int f(int a); func int f(float a) { return 1; }", "conflicting declaration of function 'f'");
    assert_error("func int f(int a); print(1);", "function 'f' is declared but never defined");
    assert_error("func void print(int x) { }", "cannot redefine builtin function 'print'");
}

#[test]
fn calls_are_checked() {
    assert_error("func int f(int a) { return a; } int x = f(1, 2);", "function 'f' expects 1 argument(s), found 2");
    assert_error("int x = g(1);", "undefined function 'g'");
    assert_error("int v = 1; int x = v(1);", "'v' is not a function");
    assert_error("func void f(string s) { } f(1);", "type mismatch: expected 'string', found 'int'");
}

#[test]
fn calls_bind_to_the_definition() {
    let c = check("func int f(); int x = f(); func int f() { return 1; }");
    let def = c.ast.child(c.root, 2).unwrap();
    let (x, _) = decl(&c, "x");
    let call = c.ast.child(x, 0).unwrap();
    assert_eq!(c.ast.binding(call), Some(def));
}

#[test]
fn return_checks() {
    assert_error("func void f() { return 1; }", "void function 'f' cannot return a value");
    assert_error("func int f() { return; }", "non-void function 'f' must return a value");
    assert_error("return 1;", "'return' outside of a function");
    assert_error("func int f() { return \"s\"; }", "type mismatch: expected 'int', found 'string'");
}

#[test]
fn missing_return_is_a_warning() {
    let c = check("func int f(int x) { if (x > 0) { return 1; } }");
    assert!(!c.diagnostics.has_errors());
    let warning = c.diagnostics.iter().find(|d| d.severity == Severity::Warning).unwrap();
    assert_eq!(warning.message, "function 'f' may reach the end without returning a value");

    let c = check("func int g(int x) { if (x > 0) { return 1; } else { return 2; } }");
    assert_eq!(c.diagnostics.warning_count(), 0);
    let c = check("func int h() { while (true) { } }");
    assert_eq!(c.diagnostics.warning_count(), 0);
}

#[test]
fn nested_function_declarations_are_rejected() {
    assert_error("func void f() { func void g() { } }", "function declarations are only allowed at the top level");
}

// ============================================================================
// Control flow
// ============================================================================

#[test]
fn break_and_continue_need_a_target() {
    assert_error("break;", "'break' outside of a loop or switch");
    assert_error("switch (1) { case 1: continue; }", "'continue' outside of a loop");
    assert_clean("while (true) { switch (1) { case 1: continue; } break; }");
    assert_error("while (true) { } func void f() { break; }", "'break' outside of a loop or switch");
}

#[test]
fn switch_cases_must_be_distinct_constants() {
    assert_error("int x = 1; int y = 2; switch (x) { case y: break; }", "case value must be a constant");
    assert_error("switch (1) { case 1: break; case 1: break; }", "duplicate case value 1 in switch");
    assert_error("switch (\"s\") { default: break; }", "switch subject must be an integer, char or enum");
    assert_clean("enum E { A, B } E e = E.A; switch (e) { case E.A: break; case E.B: break; }");
}

#[test]
fn throw_coerces_non_strings() {
    let c = check("throw 42;");
    let throw = c.ast.child(c.root, 0).unwrap();
    assert_eq!(c.ast.kind(c.ast.child(throw, 0).unwrap()), &NodeKind::ToStr);
}

// ============================================================================
// Assignment, constants, arrays
// ============================================================================

#[test]
fn const_rules() {
    assert_error("const int x = 1; x = 2;", "cannot assign to const variable 'x'");
    assert_error("const int x = 1; x++;", "cannot assign to const variable 'x'");
    assert_error("const int x;", "const variable 'x' must be initialized");
}

#[test]
fn literal_never_written_declarations_are_constants() {
    let c = check("int a = 2 + 3; int b = 4; b = 5; int c = a; const int d = 7;");
    assert!(decl(&c, "a").1.constant);
    assert!(!decl(&c, "b").1.constant);
    assert!(!decl(&c, "c").1.constant);
    assert!(decl(&c, "d").1.constant);
}

#[test]
fn array_rules() {
    assert_clean("int a[3] = {1, 2, 3}; int[] b = {4, 5}; a[0] = b[1]; string s = \"hi\"; char c = s[0];");
    assert_error("int a[2] = {1, 2, 3};", "too many initializers for array of size 2: found 3");
    assert_error("int a[2]; int b[2]; a = b;", "arrays cannot be assigned");
    assert_error("int[] a;", "array 'a' needs a size or an initializer list");
    assert_error("int x = {1, 2};", "array initializer is only allowed in an array declaration");
    assert_error("int a[2]; int x = a[1.5];", "array index must be an integer, found 'float'");
    assert_error("int a[2]; int x = a[2];", "array index 2 is out of bounds for 'int[2]'");
    assert_error("string s = \"hi\"; s[0] = 'x';", "expression is not assignable");
}

#[test]
fn inferred_array_length_comes_from_the_initializer() {
    let c = check("int[] a = {1, 2, 3};");
    let (id, _) = decl(&c, "a");
    assert_eq!(c.analysis.types.render(c.ast.ty(id).unwrap()), "int[3]");
}

#[test]
fn declarations_keep_their_declared_type() {
    let c = check("struct Point { int a; } func int f() { return 1; } int x = f(); float y; Point p;");
    for (name, expected) in [("x", "int"), ("y", "float"), ("p", "Point")] {
        let (id, _) = decl(&c, name);
        assert_eq!(c.analysis.types.render(c.ast.ty(id).unwrap()), expected, "{name}");
    }
}

#[test]
fn console_operations() {
    assert_clean("Console.WriteLine(1); Console.Write(\"a\"); Console.WriteLine(); string s = Console.ReadLine();");
    assert_error("Console.Write();", "Console.Write expects 1 argument(s), found 0");
    assert_error("int a[2]; print(a);", "cannot print a value of type 'int[2]'");
}
