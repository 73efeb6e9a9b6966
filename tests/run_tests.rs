//! End-to-end execution tests
//!
//! Every valid fixture is compiled, built with the system C compiler and run; its standard output must match the
//! `.out` file next to it, with and without the optimizer. Tests are skipped when no C compiler is installed.

use std::fs;
use std::path::{Path, PathBuf};

use dream::api::{Status, run_string, run_string_with_input};
use dream::backend::Toolchain;
use dream::config::CompilerConfig;

fn have_cc() -> bool {
    let available = Toolchain::default().is_available();
    if !available {
        eprintln!("skipping: no C compiler");
    }
    available
}

fn valid_fixtures() -> Vec<PathBuf> {
    let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/valid");
    let mut files: Vec<PathBuf> = fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "dr"))
        .collect();
    files.sort();
    files
}

#[test]
fn test_fixture_output_matches() {
    if !have_cc() {
        return;
    }
    for path in valid_fixtures() {
        let source = fs::read_to_string(&path).unwrap();
        let expected = fs::read_to_string(path.with_extension("out")).unwrap();
        for config in [CompilerConfig::default(), CompilerConfig::default().with_optimize(false)] {
            let out = run_string(&source, &config);
            assert_eq!(out.status, Status::Ok, "{} failed:\n{}", path.display(), out.errors);
            assert_eq!(
                out.stdout,
                expected,
                "{} (optimize = {}) printed the wrong output",
                path.display(),
                config.optimize
            );
        }
    }
}

#[test]
fn test_uncaught_throw_is_a_runtime_failure() {
    if !have_cc() {
        return;
    }
    let out = run_string("print(\"before\"); throw \"bad input\"; print(\"after\");", &CompilerConfig::default());
    assert_eq!(out.status, Status::Runtime);
    assert_eq!(out.stdout, "before\n");
    assert!(out.errors.contains("Unhandled exception: bad input"), "{}", out.errors);
}

#[test]
fn test_out_of_bounds_index_throws() {
    if !have_cc() {
        return;
    }
    let source = "func int three() { return 3; } int[] a = {1, 2, 3}; int i = three(); int j = i - 4; \
                  try { print(a[i]); } catch { print(\"caught\"); } print(a[j]);";
    for config in [CompilerConfig::default(), CompilerConfig::default().with_optimize(false)] {
        let out = run_string(source, &config);
        assert_eq!(out.status, Status::Runtime, "{}", out.errors);
        assert_eq!(out.stdout, "caught\n");
        assert!(out.errors.contains("Unhandled exception"), "{}", out.errors);
    }
}

#[test]
fn test_computed_locals_run() {
    if !have_cc() {
        return;
    }
    let source = "func int triangle(int n) { int total = 0; for (int k = 1; k <= n; k++) { total = total + k; } return total; } \
                  int sum = 0; for (int i = 0; i < 3; i++) { sum = sum + i; } print(sum); print(triangle(sum));";
    for config in [CompilerConfig::default(), CompilerConfig::default().with_optimize(false)] {
        let out = run_string(source, &config);
        assert_eq!(out.status, Status::Ok, "{}", out.errors);
        assert_eq!(out.stdout, "3\n6\n");
    }
}

#[test]
fn test_read_line_consumes_stdin() {
    if !have_cc() {
        return;
    }
    let source = "string name = Console.ReadLine(); Console.Write(\"hello \"); Console.WriteLine(name);";
    let out = run_string_with_input(source, "dreamer\n", &CompilerConfig::default());
    assert_eq!(out.status, Status::Ok, "{}", out.errors);
    assert_eq!(out.stdout, "hello dreamer\n");
}

#[test]
fn test_integer_overflow_wraps() {
    if !have_cc() {
        return;
    }
    let source = "int big = 2147483647; big = big + 1; print(big); print(2147483647 + 1);";
    for config in [CompilerConfig::default(), CompilerConfig::default().with_optimize(false)] {
        let out = run_string(source, &config);
        assert_eq!(out.status, Status::Ok, "{}", out.errors);
        assert_eq!(out.stdout, "-2147483648\n-2147483648\n");
    }
}
