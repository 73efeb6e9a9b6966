//! C identifier mangling.
//!
//! Dream names pass through unchanged unless they would collide with C: keywords, names the runtime header brings
//! into scope, `main`, and anything in the reserved `dr_`/`DR_`/leading-underscore space. Those get a `dr_u_`
//! prefix. Names with non-ASCII characters are hex-encoded under a `dr_x_` prefix. Every other `dr_` name in the
//! generated code (temporaries, frames, hidden array lengths) is produced by the code generator itself.

use std::borrow::Cow;
use std::fmt::Write;

const C_KEYWORDS: &[&str] = &[
    "auto", "break", "case", "char", "const", "continue", "default", "do", "double", "else", "enum", "extern",
    "float", "for", "goto", "if", "inline", "int", "long", "register", "restrict", "return", "short", "signed",
    "sizeof", "static", "struct", "switch", "typedef", "union", "unsigned", "void", "volatile", "while", "bool",
    "true", "false",
];

/// File-scope identifiers and macros the ISO C headers included by `dream_runtime.h` declare.
const LIBC_NAMES: &[&str] = &[
    // runtime entry and macros
    "main", "NULL", "EOF", "BUFSIZ", "FILENAME_MAX", "FOPEN_MAX", "L_tmpnam", "SEEK_CUR", "SEEK_END", "SEEK_SET",
    "TMP_MAX", "EXIT_FAILURE", "EXIT_SUCCESS", "MB_CUR_MAX", "RAND_MAX", "CHAR_BIT", "CHAR_MAX", "CHAR_MIN",
    "SCHAR_MAX", "SCHAR_MIN", "UCHAR_MAX", "SHRT_MAX", "SHRT_MIN", "USHRT_MAX", "INT_MAX", "INT_MIN", "UINT_MAX",
    "LONG_MAX", "LONG_MIN", "ULONG_MAX", "LLONG_MAX", "LLONG_MIN", "ULLONG_MAX", "MB_LEN_MAX", "errno", "assert",
    "offsetof", "stdin", "stdout", "stderr",
    // types
    "FILE", "fpos_t", "size_t", "div_t", "ldiv_t", "lldiv_t", "wchar_t", "jmp_buf",
    // setjmp.h
    "setjmp", "longjmp",
    // stdio.h
    "remove", "rename", "tmpfile", "tmpnam", "fclose", "fflush", "fopen", "freopen", "setbuf", "setvbuf", "fprintf",
    "fscanf", "printf", "scanf", "snprintf", "sprintf", "sscanf", "vfprintf", "vfscanf", "vprintf", "vscanf",
    "vsnprintf", "vsprintf", "vsscanf", "fgetc", "fgets", "fputc", "fputs", "getc", "getchar", "putc", "putchar",
    "puts", "ungetc", "fread", "fwrite", "fgetpos", "fseek", "fsetpos", "ftell", "rewind", "clearerr", "feof",
    "ferror", "perror",
    // stdlib.h
    "atof", "atoi", "atol", "atoll", "strtod", "strtof", "strtold", "strtol", "strtoll", "strtoul", "strtoull", "rand",
    "srand", "aligned_alloc", "calloc", "free", "malloc", "realloc", "abort", "atexit", "at_quick_exit", "exit",
    "quick_exit", "getenv", "system", "bsearch", "qsort", "abs", "labs", "llabs", "div", "ldiv", "lldiv", "mblen",
    "mbtowc", "wctomb", "mbstowcs", "wcstombs",
    // string.h
    "memcpy", "memmove", "strcpy", "strncpy", "strcat", "strncat", "memcmp", "strcmp", "strcoll", "strncmp",
    "strxfrm", "memchr", "strchr", "strcspn", "strpbrk", "strrchr", "strspn", "strstr", "strtok", "memset",
    "strerror", "strlen",
];

fn is_reserved(name: &str) -> bool {
    name.starts_with("dr_")
        || name.starts_with("DR_")
        || name.starts_with('_')
        || C_KEYWORDS.contains(&name)
        || LIBC_NAMES.contains(&name)
}

/// Hex-encode a non-ASCII identifier: `_` doubles, other non-alphanumerics become `_<hex>_`.
fn encode(name: &str) -> String {
    let mut out = String::with_capacity(name.len() * 2);
    for c in name.chars() {
        match c {
            '_' => out.push_str("__"),
            c if c.is_ascii_alphanumeric() => out.push(c),
            c => {
                let _ = write!(out, "_{:x}_", c as u32);
            }
        }
    }
    out
}

/// C spelling of a user-defined name (variable, function, field, struct tag).
pub fn mangle(name: &str) -> Cow<'_, str> {
    if !name.is_ascii() {
        Cow::Owned(format!("dr_x_{}", encode(name)))
    } else if is_reserved(name) {
        Cow::Owned(format!("dr_u_{name}"))
    } else {
        Cow::Borrowed(name)
    }
}

/// C constant for an enum member. The length prefix keeps `A_B.C` and `A.B_C` apart.
pub fn enum_constant(enum_name: &str, member: &str) -> String {
    let e = if enum_name.is_ascii() { enum_name.to_string() } else { encode(enum_name) };
    let m = if member.is_ascii() { member.to_string() } else { encode(member) };
    format!("DR_{}{e}_{m}", e.len())
}

/// Hidden length parameter accompanying an array parameter.
pub fn array_len_param(c_name: &str) -> String {
    format!("dr_len_{c_name}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordinary_names_are_unchanged() {
        assert_eq!(mangle("count"), "count");
        assert_eq!(mangle("Point"), "Point");
    }

    #[test]
    fn colliding_names_are_prefixed() {
        assert_eq!(mangle("main"), "dr_u_main");
        assert_eq!(mangle("double"), "dr_u_double");
        assert_eq!(mangle("printf"), "dr_u_printf");
        assert_eq!(mangle("dr_t0"), "dr_u_dr_t0");
        assert_eq!(mangle("_x"), "dr_u__x");
    }

    #[test]
    fn non_ascii_names_are_encoded_injectively() {
        assert_eq!(mangle("café"), "dr_x_caf_e9_");
        assert_ne!(mangle("a_b"), mangle("a\u{5f}b\u{0}"));
        assert_ne!(mangle("x_é"), mangle("xé_"));
    }

    #[test]
    fn enum_constants_are_length_prefixed() {
        assert_eq!(enum_constant("Color", "Red"), "DR_5Color_Red");
        assert_ne!(enum_constant("A_B", "C"), enum_constant("A", "B_C"));
    }
}
