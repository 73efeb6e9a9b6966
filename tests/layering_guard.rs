//! Layering guardrails to keep the shared crates independent of the compiler.
//!
//! `dream_core` and `dream_syntax` are reused by tools that never generate C (the fuzz target, editors), so they
//! must not depend on the `dream` crate or on anything beyond their own declared stack. These tests scan the member
//! manifests and fail if a forbidden dependency appears in `[dependencies]`.

fn dependencies(manifest: &str) -> Vec<String> {
    let mut in_dependencies = false;
    let mut names = Vec::new();
    for raw_line in manifest.lines() {
        let line = raw_line.trim();
        // Track when we enter/exit the `[dependencies]` table.
        if line.starts_with('[') {
            in_dependencies = line == "[dependencies]";
            continue;
        }
        if !in_dependencies || line.is_empty() || line.starts_with('#') {
            continue;
        }
        let line_no_comment = line.split('#').next().unwrap_or("").trim();
        if let Some((name, _)) = line_no_comment.split_once('=') {
            names.push(name.trim().to_string());
        }
    }
    names
}

#[test]
fn syntax_crate_does_not_depend_on_the_compiler() {
    let deps = dependencies(include_str!("../crates/dream_syntax/Cargo.toml"));
    assert!(deps.iter().any(|d| d == "dream_core"), "{deps:?}");
    assert!(!deps.iter().any(|d| d == "dream"), "`dream_syntax` must not depend on `dream`");
}

#[test]
fn core_crate_has_no_workspace_dependencies() {
    let deps = dependencies(include_str!("../crates/dream_core/Cargo.toml"));
    for forbidden in ["dream", "dream_syntax"] {
        assert!(!deps.iter().any(|d| d == forbidden), "`dream_core` must not depend on `{forbidden}`");
    }
}
