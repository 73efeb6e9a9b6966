//! C code emitter - builds C source text
//!
//! A line-oriented buffer with indentation tracking plus a few helpers for the C constructs the code generator
//! produces (braced blocks, struct definitions, function headers).

use std::fmt::Write;

/// A buffer for building C source code with proper indentation
#[derive(Debug)]
pub struct CEmitter {
    buffer: String,
    indent_level: usize,
    indent_str: &'static str,
}

impl Default for CEmitter {
    fn default() -> Self {
        Self::new()
    }
}

impl CEmitter {
    pub fn new() -> Self {
        Self {
            buffer: String::new(),
            indent_level: 0,
            indent_str: "    ",
        }
    }

    /// An empty emitter starting at the same indentation as `self`.
    pub fn nested(&self) -> Self {
        Self {
            buffer: String::new(),
            indent_level: self.indent_level,
            indent_str: self.indent_str,
        }
    }

    /// Get the generated code
    pub fn finish(self) -> String {
        self.buffer
    }

    /// Write a line with current indentation
    pub fn line(&mut self, s: &str) {
        self.write_indent();
        self.buffer.push_str(s);
        self.buffer.push('\n');
    }

    /// Write formatted text as one indented line
    pub fn linef(&mut self, args: std::fmt::Arguments<'_>) {
        self.write_indent();
        let _ = self.buffer.write_fmt(args);
        self.buffer.push('\n');
    }

    /// Append already-indented text verbatim.
    pub fn append(&mut self, text: &str) {
        self.buffer.push_str(text);
    }

    pub fn blank_line(&mut self) {
        self.buffer.push('\n');
    }

    fn write_indent(&mut self) {
        for _ in 0..self.indent_level {
            self.buffer.push_str(self.indent_str);
        }
    }

    pub fn indent(&mut self) {
        self.indent_level += 1;
    }

    pub fn dedent(&mut self) {
        self.indent_level = self.indent_level.saturating_sub(1);
    }

    /// Open a braced block: `header {`, or a bare `{` for an empty header.
    pub fn open(&mut self, header: &str) {
        if header.is_empty() {
            self.line("{");
        } else {
            self.linef(format_args!("{header} {{"));
        }
        self.indent();
    }

    /// Close the current block and open the next one on the same line (`} else {`).
    pub fn reopen(&mut self, middle: &str) {
        self.dedent();
        self.linef(format_args!("}} {middle} {{"));
        self.indent();
    }

    /// Close the current block; `tail` follows the brace (`} while (c);`).
    pub fn close(&mut self, tail: &str) {
        self.dedent();
        self.linef(format_args!("}}{tail}"));
    }

    /// Write a struct definition; an empty struct gets a placeholder member since C requires one.
    pub fn struct_def(&mut self, name: &str, fields: &[String]) {
        self.open(&format!("struct {name}"));
        if fields.is_empty() {
            self.line("char dr_unused;");
        }
        for field in fields {
            self.linef(format_args!("{field};"));
        }
        self.close(";");
    }

    /// Write a `/* ... */` comment line
    pub fn comment(&mut self, text: &str) {
        self.linef(format_args!("/* {text} */"));
    }
}

/// Function header `ret name(params)`; an empty parameter list is spelled `void`.
pub fn signature(return_type: &str, name: &str, params: &[String]) -> String {
    let params = if params.is_empty() {
        "void".to_string()
    } else {
        params.join(", ")
    };
    let sep = if return_type.ends_with('*') { "" } else { " " };
    format!("{return_type}{sep}{name}({params})")
}

/// Spell a C string literal for `s`.
///
/// Non-printable and non-ASCII bytes use three-digit octal escapes, so a following digit can never extend the
/// escape; `?` is escaped to rule out trigraphs.
pub fn c_string_literal(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for byte in s.bytes() {
        push_escaped(&mut out, byte, b'"');
    }
    out.push('"');
    out
}

/// Spell a C character literal.
pub fn c_char_literal(c: char) -> String {
    let mut out = String::from("'");
    let mut buf = [0u8; 4];
    for &byte in c.encode_utf8(&mut buf).as_bytes() {
        push_escaped(&mut out, byte, b'\'');
    }
    out.push('\'');
    out
}

fn push_escaped(out: &mut String, byte: u8, quote: u8) {
    match byte {
        b'\\' => out.push_str("\\\\"),
        b'\n' => out.push_str("\\n"),
        b'\t' => out.push_str("\\t"),
        b'\r' => out.push_str("\\r"),
        b'?' => out.push_str("\\?"),
        b if b == quote => {
            out.push('\\');
            out.push(char::from(b));
        }
        0x20..=0x7e => out.push(char::from(byte)),
        _ => {
            let _ = write!(out, "\\{byte:03o}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emitter_struct() {
        let mut e = CEmitter::new();
        e.struct_def("Point", &["int x".to_string(), "const char *label".to_string()]);
        assert_eq!(e.finish(), "struct Point {\n    int x;\n    const char *label;\n};\n");
    }

    #[test]
    fn test_empty_struct_gets_placeholder() {
        let mut e = CEmitter::new();
        e.struct_def("Empty", &[]);
        assert!(e.finish().contains("char dr_unused;"));
    }

    #[test]
    fn test_blocks_indent_their_body() {
        let mut e = CEmitter::new();
        e.open(&signature("int", "main", &[]));
        e.open("if (x)");
        e.line("a();");
        e.reopen("else");
        e.line("b();");
        e.close("");
        e.line("return 0;");
        e.close("");
        assert_eq!(
            e.finish(),
            "int main(void) {\n    if (x) {\n        a();\n    } else {\n        b();\n    }\n    return 0;\n}\n"
        );
    }

    #[test]
    fn test_signature_spells_parameters() {
        assert_eq!(signature("int", "f", &["int a".into(), "double b".into()]), "int f(int a, double b)");
        assert_eq!(signature("const char *", "name", &[]), "const char *name(void)");
    }

    #[test]
    fn test_string_escapes() {
        assert_eq!(c_string_literal("a\"b\\c\n"), "\"a\\\"b\\\\c\\n\"");
        assert_eq!(c_string_literal("??="), "\"\\?\\?=\"");
        assert_eq!(c_string_literal("\u{1}1"), "\"\\0011\"");
        assert_eq!(c_string_literal("é"), "\"\\303\\251\"");
    }

    #[test]
    fn test_char_escapes() {
        assert_eq!(c_char_literal('\''), "'\\''");
        assert_eq!(c_char_literal('\0'), "'\\000'");
        assert_eq!(c_char_literal('a'), "'a'");
    }
}
