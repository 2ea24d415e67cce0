use std::fmt::Write;

/// `(R (*)(P0, P1))`, or `(R (*)(void))` without parameters.
pub fn fn_pointer_cast(return_type: &str, params: &[String]) -> String {
    let params = if params.is_empty() {
        "void".to_string()
    } else {
        params.join(", ")
    };
    format!("({return_type} (*)({params}))")
}

/// `R name(P0 p_0, P1 p_1)`, or `R name(void)` without parameters.
pub fn signature(return_type: &str, name: &str, params: &[String]) -> String {
    if params.is_empty() {
        return format!("{return_type} {name}(void)");
    }
    let params = params
        .iter()
        .enumerate()
        .map(|(i, ty)| format!("{ty} p_{i}"))
        .collect::<Vec<_>>()
        .join(", ");
    format!("{return_type} {name}({params})")
}

/// C function name of a method.
///
/// Overloads share a source name, so they get their ordinal appended.
pub fn method_symbol(class_c_name: &str, method: &str, ordinal: usize, overloaded: bool) -> String {
    if overloaded {
        format!("{class_c_name}_{method}_{ordinal}")
    } else {
        format!("{class_c_name}_{method}")
    }
}

/// A C string literal with every UTF-8 byte written as `\xHH`.
pub fn escape_string(text: &str) -> String {
    let mut out = String::with_capacity(text.len() * 4 + 2);
    out.push('"');
    for byte in text.bytes() {
        let _ = write!(out, "\\x{byte:02X}");
    }
    out.push('"');
    out
}

/// Drop one pair of parentheses that encloses the whole expression.
///
/// Used where the surrounding syntax already parenthesises, such as
/// `if (...)` and `while (...)`.
pub fn strip_parens(code: &str) -> &str {
    let Some(inner) = code.strip_prefix('(').and_then(|c| c.strip_suffix(')')) else {
        return code;
    };
    let mut depth = 0i32;
    let mut in_string = false;
    let mut escaped = false;
    for ch in inner.chars() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth < 0 {
                    return code;
                }
            }
            _ => {}
        }
    }
    if depth == 0 { inner } else { code }
}
