//! Integration tests for the Dream compiler pipeline
//!
//! Valid fixtures must compile with and without the optimizer; each invalid fixture starts with a
//! `// expect: <status> <message>` line naming the exit status and a fragment of the first error.

use std::fs;
use std::path::{Path, PathBuf};

use dream::api::{Status, compile_string};
use dream::config::CompilerConfig;
use dream::frontend::parser::{self, ParseOptions};

fn fixtures(kind: &str) -> Vec<PathBuf> {
    let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures").join(kind);
    let mut files: Vec<PathBuf> = fs::read_dir(&dir)
        .unwrap_or_else(|e| panic!("cannot read {}: {e}", dir.display()))
        .map(|entry| entry.unwrap().path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "dr"))
        .collect();
    files.sort();
    files
}

fn status_from_code(code: i32) -> Status {
    match code {
        0 => Status::Ok,
        1 => Status::Lex,
        2 => Status::Parse,
        3 => Status::Semantic,
        4 => Status::Codegen,
        5 => Status::Io,
        6 => Status::Runtime,
        7 => Status::ResourceExhausted,
        other => panic!("unknown status code {other}"),
    }
}

/// Test that all valid fixtures compile successfully
#[test]
fn test_valid_fixtures() {
    let files = fixtures("valid");
    assert!(!files.is_empty());
    for path in files {
        let source = fs::read_to_string(&path).unwrap();
        for config in [CompilerConfig::default(), CompilerConfig::default().with_optimize(false)] {
            let out = compile_string(&source, &config);
            assert_eq!(
                out.status,
                Status::Ok,
                "expected {} to compile (optimize = {}), got:\n{}",
                path.display(),
                config.optimize,
                out.errors
            );
            assert!(out.code.is_some_and(|code| code.contains("int main(void)")));
        }
    }
}

/// Test that invalid fixtures fail with the expected status and message
#[test]
fn test_invalid_fixtures() {
    let files = fixtures("invalid");
    assert!(!files.is_empty());
    for path in files {
        let source = fs::read_to_string(&path).unwrap();
        let expect = source
            .lines()
            .next()
            .and_then(|line| line.strip_prefix("// expect: "))
            .unwrap_or_else(|| panic!("{} has no expectation line", path.display()));
        let (code, message) = expect.split_once(' ').unwrap();
        let out = compile_string(&source, &CompilerConfig::default());
        assert_eq!(
            out.status,
            status_from_code(code.parse().unwrap()),
            "{}:\n{}",
            path.display(),
            out.errors
        );
        assert!(out.code.is_none());
        assert!(
            out.errors.contains(message),
            "{}: expected {message:?} in:\n{}",
            path.display(),
            out.errors
        );
    }
}

// ============================================================================
// Error accumulation
// ============================================================================

#[test]
fn test_independent_errors_are_all_reported() {
    let source = "int a = ;\nint b = 1 +;\nint ok = 1;\nint c = (2;\nbool d = !;\n";
    let out = parser::parse_source(source, &ParseOptions::default()).unwrap();
    assert!(out.error_count() >= 4, "got {} error(s)", out.error_count());
}

#[test]
fn test_semantic_errors_accumulate_without_cascading() {
    let out = compile_string("int a = x; int b = y; int c = a + b;", &CompilerConfig::default());
    assert_eq!(out.status, Status::Semantic);
    let errors: Vec<&str> = out
        .diagnostics
        .iter()
        .filter(|d| d.is_error())
        .map(|d| d.message.as_str())
        .collect();
    assert_eq!(errors, vec!["undefined variable 'x'", "undefined variable 'y'"]);
}

#[test]
fn test_empty_and_comment_only_programs_compile() {
    for source in ["", "   \n\t", "// nothing\n/* at all */"] {
        let out = compile_string(source, &CompilerConfig::default());
        assert_eq!(out.status, Status::Ok, "{source:?}: {}", out.errors);
    }
}

#[test]
fn test_boundary_literals_are_accepted() {
    let source = "int max = 2147483647; int min = -2147483648; char nul = '\\0'; float tiny = 0.0000001;";
    let out = compile_string(source, &CompilerConfig::default());
    assert_eq!(out.status, Status::Ok, "{}", out.errors);
}

#[test]
fn test_deeply_nested_programs_compile() {
    let depth = 2000;
    let blocks = format!("int x = 0; {}x = x + 1;{} print(x);", "{".repeat(depth), "}".repeat(depth));
    let parens = format!("int y = {}1{}; print(y);", "(".repeat(depth), ")".repeat(depth));
    let branches = format!("int z = 1; {} print(z);", "if (z > 0) { ".repeat(depth) + &"}".repeat(depth));
    for source in [blocks, parens, branches] {
        for config in [CompilerConfig::default(), CompilerConfig::default().with_optimize(false)] {
            let out = compile_string(&source, &config);
            assert_eq!(out.status, Status::Ok, "{}", out.errors);
            assert!(out.code.is_some_and(|code| code.contains("int main(void)")));
        }
    }
}

#[test]
fn test_out_of_range_literal_is_rejected() {
    let out = compile_string("int big = 2147483648;", &CompilerConfig::default());
    assert_eq!(out.status, Status::Semantic, "{}", out.errors);
}

// ============================================================================
// Optimization
// ============================================================================

#[test]
fn test_constant_expressions_fold() {
    let out = compile_string("print(2 + 3 * 4);", &CompilerConfig::default());
    let code = out.code.unwrap();
    assert!(code.contains("dr_print_int(14, true);"), "{code}");

    let unoptimized = compile_string("print(2 + 3 * 4);", &CompilerConfig::default().with_optimize(false));
    assert!(unoptimized.code.unwrap().contains("dr_print_int(2 + (3 * 4), true);"));
}

#[test]
fn test_side_effects_survive_optimization() {
    let source = "int n = 0; func int bump() { n++; return n; } int unused = bump() * 0; print(n);";
    let code = compile_string(source, &CompilerConfig::default()).code.unwrap();
    assert!(code.contains("bump()"), "{code}");
}

#[test]
fn test_generated_code_is_deterministic() {
    let source = fs::read_to_string(Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/valid/structs.dr"))
        .unwrap();
    let first = compile_string(&source, &CompilerConfig::default()).code;
    let second = compile_string(&source, &CompilerConfig::default()).code;
    assert_eq!(first, second);
}
