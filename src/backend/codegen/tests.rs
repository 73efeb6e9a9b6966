use super::*;
use crate::frontend::analyzer::analyze;
use crate::frontend::parser::{self, ParseOptions};
use crate::optimizer::{self, OptimizerConfig};

fn c_with(source: &str, config: &OptimizerConfig) -> String {
    let parser::ParseOutput {
        mut ast,
        root,
        mut diagnostics,
    } = parser::parse_source(source, &ParseOptions::default()).expect("parse");
    let analysis = analyze(&mut ast, root, &mut diagnostics);
    assert!(!diagnostics.has_errors(), "unexpected errors: {:?}", diagnostics.error_message(0));
    optimizer::optimize(&mut ast, root, &analysis.types, config);
    generate(&ast, root, &analysis).expect("generate")
}

/// Generated C without optimization, so the output mirrors the source.
fn c(source: &str) -> String {
    c_with(source, &OptimizerConfig::disabled())
}

// ============================================================================
// Layout
// ============================================================================

#[test]
fn program_layout_is_in_fixed_order() {
    let code = c("enum Color { Red, Green } struct P { int x; } int g = 1; func int f() { return g; } print(f());");
    let positions: Vec<usize> = [
        "#include \"dream_runtime.h\"",
        "enum {",
        "struct P {",
        "static int f(void);",
        "static int g = 1;",
        "static int f(void) {",
        "int main(void) {",
    ]
    .iter()
    .map(|needle| code.find(needle).unwrap_or_else(|| panic!("missing {needle:?} in\n{code}")))
    .collect();
    assert!(positions.windows(2).all(|w| w[0] < w[1]), "{code}");
}

#[test]
fn empty_program_is_an_empty_main() {
    let code = c("");
    assert!(code.ends_with("int main(void) {\n    return 0;\n}\n"), "{code}");
}

#[test]
fn enum_members_become_prefixed_constants() {
    let code = c("enum Level { Low, Mid = 5, High } print(Level.High);");
    assert!(code.contains("    DR_5Level_Low = 0,\n    DR_5Level_Mid = 5,\n    DR_5Level_High = 6\n};"), "{code}");
    assert!(code.contains("dr_print_int(DR_5Level_High, true);"), "{code}");
}

#[test]
fn contained_structs_are_defined_first() {
    let code = c("struct Line { Point a; Point b; } struct Point { int x; float y; string name; }");
    let point = code.find("struct Point {").expect("Point");
    let line = code.find("struct Line {").expect("Line");
    assert!(point < line, "{code}");
    assert!(code.contains("    int x;\n    double y;\n    const char *name;\n"), "{code}");
}

#[test]
fn colliding_names_are_mangled() {
    let code = c("func int main(int double) { return double; } print(main(1));");
    assert!(code.contains("static int dr_u_main(int dr_u_double) {"), "{code}");
    assert!(code.contains("return dr_u_double;"), "{code}");
}

// ============================================================================
// Expressions
// ============================================================================

#[test]
fn console_calls_pick_the_printer_by_type() {
    let code = c("print(1); Console.Write(2.5); Console.WriteLine('c'); print(true); print(\"s\"); print(); string line = Console.ReadLine();");
    for needle in [
        "dr_print_int(1, true);",
        "dr_print_float(2.5, false);",
        "dr_print_char('c', true);",
        "dr_print_bool(true, true);",
        "dr_print_str(\"s\", true);",
        "dr_print_newline();",
        "dr_read_line()",
    ] {
        assert!(code.contains(needle), "missing {needle:?} in\n{code}");
    }
}

#[test]
fn integer_division_traps_unless_the_divisor_is_safe() {
    let code = c("int a = 7; int b = 2; print(a / b); print(a % b); print(a / 2); print(7.0 / b);");
    assert!(code.contains("dr_idiv(a, b)"), "{code}");
    assert!(code.contains("dr_imod(a, b)"), "{code}");
    assert!(code.contains("dr_print_int(a / 2, true);"), "{code}");
    assert!(code.contains("dr_print_float(7.0 / b, true);"), "{code}");
}

#[test]
fn string_operations_use_the_runtime() {
    let code = c("string s = \"a\"; s += 1; print(s == \"a1\"); print(s != null); print(s[0]);");
    assert!(code.contains("s = dr_concat(s, dr_int_to_str(1));"), "{code}");
    assert!(code.contains("dr_str_eq(s, \"a1\")"), "{code}");
    assert!(code.contains("dr_print_bool(!dr_str_eq(s, NULL), true);"), "{code}");
    assert!(code.contains("dr_str_at(s, 0)"), "{code}");
}

#[test]
fn int_min_is_spelled_without_overflow() {
    let code = c_with("int m = -2147483647 - 1; print(m);", &OptimizerConfig::default());
    assert!(code.contains("-2147483647 - 1"), "{code}");
    assert!(!code.contains("2147483648"), "{code}");
}

#[test]
fn array_accesses_are_bounds_checked() {
    let code = c("int a[3]; a[1] = 4; print(a[2]);");
    assert!(code.contains("a[dr_check_index(1, 3)] = 4;"), "{code}");
    assert!(code.contains("dr_print_int(a[dr_check_index(2, 3)], true);"), "{code}");
}

#[test]
fn array_parameters_receive_their_length() {
    let code = c("func int first(int xs[]) { return xs[0]; } int a[] = {4, 5}; print(first(a));");
    assert!(code.contains("static int first(int xs[], int dr_len_xs)"), "{code}");
    assert!(code.contains("xs[dr_check_index(0, dr_len_xs)]"), "{code}");
    assert!(code.contains("first(a, 2)"), "{code}");
}

#[test]
fn operands_are_evaluated_left_to_right() {
    let code = c("int n = 0; func int next() { n++; return n; } print(n + next());");
    assert!(code.contains("int dr_t0;"), "{code}");
    assert!(code.contains("(dr_t0 = n, dr_t0 + next())"), "{code}");
}

#[test]
fn call_arguments_are_evaluated_left_to_right() {
    let code = c("func int id(int x) { print(x); return x; } func int add(int a, int b) { return a + b; } print(add(id(1), id(2)));");
    assert!(code.contains("(dr_t0 = id(1), add(dr_t0, id(2)))"), "{code}");
}

#[test]
fn compound_assignment_with_effects_reads_the_target_first() {
    let code = c("int x = 1; func int f() { x = 10; return 1; } x += f();");
    assert!(code.contains("dr_t0 = x, x = dr_t0 + f();"), "{code}");
}

#[test]
fn casts_and_conversions() {
    let code = c("float f = 2.5; print((int)f); print((char)65); print((string)f); print(\"v\" + f);");
    assert!(code.contains("dr_print_int((int)f, true);"), "{code}");
    assert!(code.contains("dr_print_char((char)65, true);"), "{code}");
    assert!(code.contains("dr_float_to_str(f)"), "{code}");
    assert!(code.contains("dr_concat(\"v\", dr_float_to_str(f))"), "{code}");
}

// ============================================================================
// Statements
// ============================================================================

#[test]
fn locals_are_zero_initialized() {
    let code = c("func void f() { int i; string s; float x; bool b; int a[2]; } f();");
    for needle in ["int i = 0;", "const char *s = NULL;", "double x = 0.0;", "bool b = false;", "int a[2] = {0};"] {
        assert!(code.contains(needle), "missing {needle:?} in\n{code}");
    }
}

#[test]
fn initializer_lists_with_effects_assign_in_order() {
    let code = c("func int f() { print(1); return 1; } func void g() { int a[] = {f(), f()}; print(a[0]); } g();");
    assert!(code.contains("int a[2] = {0};\n    a[0] = f();\n    a[1] = f();"), "{code}");
}

#[test]
fn switch_keeps_fallthrough() {
    let code = c("int x = 1; switch (x) { case 1: print(1); case 2: print(2); break; default: print(3); }");
    assert!(
        code.contains(
            "switch (x) {\n        case 1: {\n            dr_print_int(1, true);\n        }\n        case 2: {"
        ),
        "{code}"
    );
    assert!(code.contains("default: {"), "{code}");
}

#[test]
fn for_loops_keep_their_header() {
    let code = c("for (int i = 0; i < 3; i++) { print(i); } for (;;) { break; }");
    assert!(code.contains("for (int i = 0; i < 3; i++) {"), "{code}");
    assert!(code.contains("for (;;) {"), "{code}");
}

#[test]
fn else_if_chains_stay_flat() {
    let code = c("int x = 2; if (x == 1) { print(1); } else if (x == 2) { print(2); } else { print(3); }");
    assert!(code.contains("if (x == 1) {"), "{code}");
    assert!(code.contains("} else if (x == 2) {"), "{code}");
    assert!(code.contains("} else {"), "{code}");
}

#[test]
fn try_lowers_to_a_runtime_frame() {
    let code = c("try { throw \"boom\"; } catch (Exception e) { print(\"caught\"); }");
    for needle in [
        "dr_frame dr_f0;",
        "dr_try_enter(&dr_f0);",
        "if (setjmp(dr_f0.env) == 0) {",
        "dr_throw(\"boom\");",
        "dr_try_leave(&dr_f0);",
        "} else {",
    ] {
        assert!(code.contains(needle), "missing {needle:?} in\n{code}");
    }
}

#[test]
fn bare_throw_passes_null() {
    let code = c("throw;");
    assert!(code.contains("dr_throw(NULL);"), "{code}");
}

#[test]
fn locals_of_functions_with_try_are_volatile() {
    let code = c("func int f() { int n = 0; string s = \"x\"; try { n = 1; } catch (Exception e) { n = 2; } return n; } print(f());");
    assert!(code.contains("volatile int n = 0;"), "{code}");
    assert!(code.contains("const char *volatile s = \"x\";"), "{code}");
}

#[test]
fn leaving_a_try_early_pops_its_frame() {
    let code = c(
        "func int f() { try { return 1; } catch (Exception e) { return 2; } return 0; } \
         while (true) { try { break; } catch (Exception e) { } } print(f());",
    );
    assert!(code.contains("int dr_ret = 1;\n                dr_try_leave(&dr_f0);\n                return dr_ret;"), "{code}");
    assert!(code.contains("dr_try_leave(&dr_f0);\n                break;"), "{code}");
}

#[test]
fn globals_with_dynamic_initializers_are_assigned_in_main() {
    let code = c("func int f() { return 3; } int g = f(); string s = \"a\" + g;");
    assert!(code.contains("static int g;"), "{code}");
    assert!(code.contains("static const char *s;"), "{code}");
    assert!(code.contains("    g = f();\n    s = dr_concat(\"a\", dr_int_to_str(g));"), "{code}");
}

#[test]
fn hoisted_temporaries_keep_their_names() {
    let code = c_with(
        "func int sum(int n) { int s = 0; int i = 0; while (i < n) { s = s + n * 2; i = i + 1; } return s; } print(sum(3));",
        &OptimizerConfig::default(),
    );
    assert!(code.contains("int dr_licm0 = n * 2;"), "{code}");
}

#[test]
fn optimized_output_prints_folded_constants() {
    let code = c_with("print(2 + 3 * 4);", &OptimizerConfig::default());
    assert!(code.contains("dr_print_int(14, true);"), "{code}");
}

#[test]
fn locals_are_declared_with_their_own_type() {
    let code = c("func float half(int n) { float h = n / 2.0; return h; } \
                  int sum = 0; for (int i = 0; i < 3; i++) { sum = sum + i; } print(sum + half(sum));");
    assert!(code.contains("float h = "), "{code}");
    assert!(code.contains("static int sum = 0;"), "{code}");
    assert!(code.contains("for (int i = 0; i < 3; i++)"), "{code}");
    assert!(!code.contains("void sum") && !code.contains("void i"), "{code}");
}
