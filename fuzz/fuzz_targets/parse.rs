#![no_main]

use dream::frontend::{lexer::Lexer, parser};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Raw bytes go through the lexer directly so invalid UTF-8 is exercised too.
    let tokens: Vec<_> = Lexer::from_bytes(data).collect();
    let source = String::from_utf8_lossy(data);
    let _ = parser::parse(&tokens, &source, &parser::ParseOptions::default());

    if let Ok(source) = std::str::from_utf8(data) {
        let _ = dream::api::compile_string(source, &dream::config::CompilerConfig::default());
    }
});
