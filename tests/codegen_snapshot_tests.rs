//! Golden snapshot tests for codegen
//!
//! These tests generate C from small Dream programs and compare the output
//! against inline snapshots. This ensures codegen changes are reviewed and
//! intentional.
//!
//! Run with: `cargo test --test codegen_snapshot_tests`
//! Review changes: `cargo insta review`

use dream::api::{Status, compile_string};
use dream::config::CompilerConfig;

/// Generate C without the optimizer, dropping the version banner on the first line.
fn generate_c(source: &str) -> String {
    let out = compile_string(source, &CompilerConfig::default().with_optimize(false));
    assert_eq!(out.status, Status::Ok, "{}", out.errors);
    let code = out.code.expect("code");
    let (banner, rest) = code.split_once('\n').expect("banner line");
    assert!(banner.starts_with("/* Generated by dream "), "{banner}");
    rest.to_string()
}

#[test]
fn test_function_and_global_codegen() {
    let code = generate_c(
        r#"
func int add(int a, int b) {
    return a + b;
}
int total = add(2, 3);
print(total);
"#,
    );
    insta::assert_snapshot!(code, @r#"
    #include "dream_runtime.h"

    static int add(int a, int b);

    static int total;

    static int add(int a, int b) {
        return a + b;
    }

    int main(void) {
        total = add(2, 3);
        dr_print_int(total, true);
        return 0;
    }
    "#);
}

#[test]
fn test_struct_and_control_flow_codegen() {
    let code = generate_c(
        r#"
struct Point { int x; int y; }
Point p;
p.x = 3;
int i = 0;
while (i < 3) {
    if (i == 1) {
        print("one");
    } else {
        print(i);
    }
    i++;
}
"#,
    );
    insta::assert_snapshot!(code, @r#"
    #include "dream_runtime.h"

    struct Point {
        int x;
        int y;
    };

    static struct Point p;
    static int i = 0;

    int main(void) {
        p.x = 3;
        while (i < 3) {
            if (i == 1) {
                dr_print_str("one", true);
            } else {
                dr_print_int(i, true);
            }
            i++;
        }
        return 0;
    }
    "#);
}

#[test]
fn test_array_parameter_codegen() {
    let code = generate_c(
        r#"
func int sum(int xs[]) {
    int total = 0;
    for (int i = 0; i < 2; i++) {
        total += xs[i];
    }
    return total;
}
int[] values = {4, 8};
print(sum(values));
"#,
    );
    insta::assert_snapshot!(code, @r#"
    #include "dream_runtime.h"

    static int sum(int xs[], int dr_len_xs);

    static int values[2] = {4, 8};

    static int sum(int xs[], int dr_len_xs) {
        int dr_t0;
        int total = 0;
        for (int i = 0; i < 2; i++) {
            dr_t0 = total, total = dr_t0 + xs[dr_check_index(i, dr_len_xs)];
        }
        return total;
    }

    int main(void) {
        dr_print_int(sum(values, 2), true);
        return 0;
    }
    "#);
}
