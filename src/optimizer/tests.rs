use super::*;
use crate::frontend::analyzer::{Analysis, analyze};
use crate::frontend::parser::{self, ParseOptions};

struct Optimized {
    ast: Ast,
    root: NodeId,
    analysis: Analysis,
    stats: OptStats,
}

fn optimized_with(source: &str, config: &OptimizerConfig) -> Optimized {
    let out = parser::parse_source(source, &ParseOptions::default()).expect("parse");
    let parser::ParseOutput {
        mut ast,
        root,
        mut diagnostics,
    } = out;
    let analysis = analyze(&mut ast, root, &mut diagnostics);
    assert!(!diagnostics.has_errors(), "unexpected errors: {:?}", diagnostics.error_message(0));
    let stats = optimize(&mut ast, root, &analysis.types, config);
    Optimized {
        ast,
        root,
        analysis,
        stats,
    }
}

fn optimized(source: &str) -> Optimized {
    optimized_with(source, &OptimizerConfig::default())
}

fn dump(source: &str) -> String {
    let o = optimized(source);
    o.ast.dump(o.root)
}

// ============================================================================
// Folding
// ============================================================================

#[test]
fn arithmetic_is_folded() {
    assert_eq!(
        dump("print(2 + 3 * 4);"),
        "Block\n  ExprStmt\n    Console print\n      Int 14\n"
    );
}

#[test]
fn folding_is_idempotent() {
    let mut o = optimized("print(2 + 3 * 4); print(\"a\" + 1 + true);");
    let again = optimize(&mut o.ast, o.root, &o.analysis.types, &OptimizerConfig::default());
    assert_eq!(again.total(), 0);
    assert_eq!(again.rounds, 1);
}

#[test]
fn integer_overflow_wraps() {
    assert!(dump("print(2147483647 + 1);").contains("Int -2147483648"));
    assert!(dump("print(-2147483648 - 1);").contains("Int 2147483647"));
}

#[test]
fn trapping_division_is_left_for_the_runtime() {
    assert!(dump("print(1 / 0);").contains("Binary /"));
    assert!(dump("print(5 % 0);").contains("Binary %"));
    assert!(dump("print(-2147483648 / -1);").contains("Binary /"));
}

#[test]
fn division_truncates_toward_zero() {
    assert!(dump("print(-7 / 2);").contains("Int -3"));
    assert!(dump("print(-7 % 2);").contains("Int -1"));
}

#[test]
fn float_arithmetic_is_folded_when_finite() {
    assert!(dump("print(1 / 2.0);").contains("Float 0.5"));
    assert!(dump("print(1.0 / 0.0);").contains("Binary /"));
}

#[test]
fn short_circuit_folds_keep_the_unevaluated_side_out() {
    let d = dump("func bool f() { print(1); return true; } print(false && f()); print(true || f());");
    assert!(d.contains("Console print\n      Bool false"));
    assert!(d.contains("Console print\n      Bool true"));
}

#[test]
fn string_concatenation_of_literals_is_folded() {
    assert!(dump("print(\"n=\" + 42 + \", ok=\" + true + \" \" + 'c');").contains("Str \"n=42, ok=true c\""));
}

#[test]
fn literal_casts_are_folded() {
    let d = dump("print((int)3.9); print((float)2); print((char)65); print((int)'a');");
    assert!(d.contains("Int 3"));
    assert!(d.contains("Float 2.0"));
    assert!(d.contains("Char 'A'"));
    assert!(d.contains("Int 97"));
}

#[test]
fn conditional_with_literal_condition_picks_a_branch() {
    assert!(dump("print(true ? 1 : 2);").ends_with("Console print\n      Int 1\n"));
}

// ============================================================================
// Constant propagation
// ============================================================================

#[test]
fn constants_are_propagated_and_their_declarations_dropped() {
    assert_eq!(
        dump("int x = 5; print(x * 2);"),
        "Block\n  ExprStmt\n    Console print\n      Int 10\n"
    );
}

#[test]
fn propagated_int_constant_in_float_context_becomes_float() {
    assert!(dump("float f = 2; print(f / 4);").contains("Float 0.5"));
}

#[test]
fn written_variables_are_not_propagated() {
    let d = dump("int x = 5; x = 6; print(x);");
    assert!(d.contains("Console print\n      Ident x"));
}

#[test]
fn globals_are_not_propagated_into_functions() {
    let d = dump("int g = 5; func int f() { return g; } print(f());");
    assert!(d.contains("VarDecl int g"));
    assert!(d.contains("Return\n        Ident g"));
}

// ============================================================================
// Dead code elimination
// ============================================================================

#[test]
fn statements_after_return_are_removed() {
    let d = dump("func int f() { return 1; print(2); } print(f());");
    assert!(!d.contains("Int 2"));
}

#[test]
fn statements_after_break_are_removed() {
    let d = dump("int i = 0; while (i < 3) { i++; break; print(9); }");
    assert!(!d.contains("Int 9"));
    assert!(d.contains("Break"));
}

#[test]
fn literal_if_becomes_the_taken_branch() {
    assert_eq!(
        dump("if (false) { print(1); } else { print(2); }"),
        "Block\n  Block\n    Block\n      ExprStmt\n        Console print\n          Int 2\n"
    );
}

#[test]
fn false_loops_are_removed() {
    assert_eq!(
        dump("while (false) { print(1); } print(2);"),
        "Block\n  ExprStmt\n    Console print\n      Int 2\n"
    );
}

#[test]
fn effectful_initializers_are_kept() {
    let d = dump("func int f() { print(1); return 1; } int unused = f();");
    assert!(d.contains("VarDecl int unused"));
}

#[test]
fn try_bodies_are_untouched() {
    let d = dump("try { print(1 + 2); } catch (Exception e) { print(0); }");
    assert!(d.contains("Binary +"));
}

// ============================================================================
// Common subexpressions
// ============================================================================

#[test]
fn repeated_expression_reuses_the_earlier_declaration() {
    let o = optimized("func int g(int a, int b) { int x = a * b + 1; int y = a * b + 1; return x + y; } print(g(2, 3));");
    let d = o.ast.dump(o.root);
    assert!(d.contains("VarDecl int y\n        Ident x\n"), "{d}");
    assert_eq!(o.stats.reused, 1);
}

#[test]
fn mutated_operands_block_reuse() {
    let d = dump("func int g(int a) { int x = a * 2; a = a + 1; int y = a * 2; return x + y; } print(g(1));");
    assert!(d.contains("VarDecl int y\n        Binary *"), "{d}");
}

#[test]
fn reuse_requires_matching_types() {
    let d = dump("func float g(int a) { float x = a * 2; int y = a * 2; return x + y; } print(g(1));");
    assert!(d.contains("VarDecl int y\n        Binary *"), "{d}");
}

// ============================================================================
// Loop-invariant code motion
// ============================================================================

const SUM: &str = "func int sum(int n) { int s = 0; int i = 0; while (i < n) { s = s + n * 2; i = i + 1; } return s; }
print(sum(3));";

#[test]
fn invariant_expression_is_hoisted_before_the_loop() {
    let o = optimized(SUM);
    let d = o.ast.dump(o.root);
    assert!(
        d.contains("VarDecl int dr_licm0\n        Binary *\n          Ident n\n          Int 2\n      While"),
        "{d}"
    );
    assert!(d.contains("Binary +\n                Ident s\n                Ident dr_licm0"), "{d}");
    assert_eq!(o.stats.hoisted, 1);
}

#[test]
fn hoisted_declarations_are_synthetic() {
    let o = optimized(SUM);
    let mut synthetic = Vec::new();
    let mut stack = vec![o.root];
    while let Some(id) = stack.pop() {
        if let Some(var) = o.ast.var_decl(id).filter(|v| v.synthetic) {
            synthetic.push(var.name.clone());
        }
        stack.extend(o.ast.children(id).iter().copied());
    }
    assert_eq!(synthetic, vec!["dr_licm0".to_string()]);
}

#[test]
fn loops_with_calls_keep_global_reads() {
    let d = dump("int g = 1; func void bump() { g = g + 1; } int i = 0; while (i < 3) { bump(); print(g * 2); i++; }");
    assert!(!d.contains("dr_licm"), "{d}");
}

#[test]
fn variable_divisors_are_not_hoisted() {
    let d = dump(
        "func int f(int a, int b) { int s = 0; for (int i = 0; i < 3; i++) { s += a / b; } return s; } print(f(4, 2));",
    );
    assert!(!d.contains("dr_licm"), "{d}");
}

#[test]
fn loop_variables_are_not_hoisted() {
    let d = dump("for (int i = 0; i < 3; i++) { print(i * 2); }");
    assert!(!d.contains("dr_licm"), "{d}");
}

#[test]
fn disabled_optimizer_changes_nothing() {
    let source = "int x = 5; print(x * 2 + 1);";
    let o = optimized_with(source, &OptimizerConfig::disabled());
    assert_eq!(o.stats, OptStats::default());
    assert!(o.ast.dump(o.root).contains("VarDecl int x"));
}
