//! Property-based tests for the Dream compiler
//!
//! These tests use proptest to verify invariants across many randomly
//! generated inputs, catching edge cases that hand-written tests might miss.

use dream::api::{Status, compile_string};
use dream::config::CompilerConfig;
use dream::frontend::lexer::{self, TokenKind};
use dream::frontend::parser::{self, ParseOptions};
use proptest::prelude::*;

/// Fragments that are mostly valid Dream, so random concatenations reach past the lexer.
fn fragment() -> impl Strategy<Value = &'static str> {
    prop::sample::select(vec![
        "int x = 1;",
        "x = x + 2;",
        "print(x);",
        "if (x > 0) {",
        "} else {",
        "}",
        "while (x < 10) { x++; }",
        "func int f(int a) { return a * 2; }",
        "print(f(x));",
        "string s = \"hi\" + x;",
        "try {",
        "} catch {",
        "throw \"e\";",
        "switch (x) { case 1: print(1); default: break; }",
        "struct P { int a; }",
        "enum E { A, B = 3 }",
        "(",
        ")",
        ";",
        "int[] xs = {1, 2};",
        "print(xs[0]);",
        "x / 0;",
        "@",
        "\"unterminated",
    ])
}

fn program() -> impl Strategy<Value = String> {
    prop::collection::vec(fragment(), 0..24).prop_map(|parts| parts.join("\n"))
}

// =============================================================================
// Lexer Properties
// =============================================================================

proptest! {
    /// Property: lexing any string terminates with exactly one Eof as the final token
    #[test]
    fn lexer_ends_with_single_eof(source in any::<String>()) {
        let tokens = lexer::lex(&source);
        prop_assert_eq!(tokens.last().map(|t| &t.kind), Some(&TokenKind::Eof));
        prop_assert_eq!(tokens.iter().filter(|t| t.kind == TokenKind::Eof).count(), 1);
    }

    /// Property: token spans are in bounds and non-decreasing
    #[test]
    fn lexer_spans_are_ordered(source in "[ -~\\n\\t]{0,200}") {
        let tokens = lexer::lex(&source);
        let mut last_end = 0;
        for token in &tokens {
            prop_assert!(token.span.start <= token.span.end);
            prop_assert!(token.span.end <= source.len());
            prop_assert!(token.span.start >= last_end);
            last_end = token.span.end;
        }
    }
}

// =============================================================================
// Parser Properties
// =============================================================================

proptest! {
    /// Property: parsing arbitrary text never panics; it yields diagnostics or a fatal nesting error
    #[test]
    fn parser_never_panics(source in any::<String>()) {
        let _ = parser::parse_source(&source, &ParseOptions::default());
    }

    /// Property: the error cap bounds the number of recorded errors
    #[test]
    fn parser_respects_error_cap(source in program(), cap in 1usize..5) {
        let options = ParseOptions { max_errors: cap, ..ParseOptions::default() };
        if let Ok(out) = parser::parse_source(&source, &options) {
            prop_assert!(out.diagnostics.errors().count() <= cap);
        }
    }

    /// Property: nesting past the limit is a fatal error, not a stack overflow
    #[test]
    fn deep_nesting_is_bounded(depth in 65usize..2000) {
        let options = ParseOptions { max_nesting: 64, ..ParseOptions::default() };
        let source = format!("int x = {}1{};", "(".repeat(depth), ")".repeat(depth));
        prop_assert!(parser::parse_source(&source, &options).is_err());
    }

    /// Property: nesting below the default limit parses cleanly however deep it goes
    #[test]
    fn deep_blocks_parse_with_default_limit(depth in 1usize..3000) {
        let source = format!("{}print(1);{}", "{".repeat(depth), "}".repeat(depth));
        let out = parser::parse_source(&source, &ParseOptions::default());
        prop_assert!(out.is_ok_and(|out| !out.has_errors()));
    }
}

// =============================================================================
// Pipeline Properties
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    /// Property: status is Ok exactly when code is produced, and failures always explain themselves
    #[test]
    fn compile_status_is_consistent(source in program()) {
        let out = compile_string(&source, &CompilerConfig::default());
        prop_assert_eq!(out.status == Status::Ok, out.code.is_some());
        if out.status == Status::Ok {
            prop_assert!(out.errors.is_empty());
            prop_assert!(!out.diagnostics.iter().any(|d| d.is_error()));
        } else {
            prop_assert!(!out.errors.is_empty());
        }
    }

    /// Property: the optimizer never turns a valid program into an invalid one
    #[test]
    fn optimizer_preserves_success(source in program()) {
        let optimized = compile_string(&source, &CompilerConfig::default());
        let plain = compile_string(&source, &CompilerConfig::default().with_optimize(false));
        prop_assert_eq!(optimized.status, plain.status);
    }

    /// Property: integer constant folding wraps like two's complement arithmetic
    #[test]
    fn folding_wraps_like_i32(a in (i32::MIN + 1)..=i32::MAX, b in (i32::MIN + 1)..=i32::MAX) {
        let source = format!("print(({a}) + ({b}));");
        let out = compile_string(&source, &CompilerConfig::default());
        prop_assert_eq!(out.status, Status::Ok, "{}", out.errors);
        let code = out.code.unwrap();
        let sum = a.wrapping_add(b);
        let expected = if sum == i32::MIN {
            "dr_print_int(-2147483647 - 1, true);".to_string()
        } else {
            format!("dr_print_int({sum}, true);")
        };
        prop_assert!(code.contains(&expected), "expected {} in\n{}", expected, code);
    }
}
