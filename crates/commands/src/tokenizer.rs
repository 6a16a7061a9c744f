//! Splitting command text into argument tokens.

const LEFT_SMART_QUOTE: char = '\u{201C}';
const RIGHT_SMART_QUOTE: char = '\u{201D}';

/// Split `text` into tokens.
///
/// Tokens are separated by spaces. Double quotes (ASCII or smart quotes)
/// keep spaces together and are themselves dropped; single quotes are
/// dropped but do not protect spaces. Each quote style is literal inside the
/// other. A backslash escapes the next character: `a b f n r t v` map to
/// control characters, `\ ' " “ ” ?` pass through, anything else is dropped.
///
/// ```
/// use switchyard_commands::tokenize;
///
/// assert_eq!(tokenize(r#"deploy "my service" --now"#), ["deploy", "my service", "--now"]);
/// assert!(tokenize("   ").is_empty());
/// ```
#[must_use]
pub fn tokenize(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut buf = String::new();
    let mut in_double = false;
    let mut in_single = false;
    let mut escaped = false;

    for c in text.trim().chars() {
        if escaped {
            if let Some(literal) = unescape(c) {
                buf.push(literal);
            }
            escaped = false;
            continue;
        }
        match c {
            ' ' => {
                if in_double {
                    buf.push(c);
                } else if !buf.is_empty() {
                    tokens.push(std::mem::take(&mut buf));
                }
            },
            '\\' => escaped = true,
            '"' | LEFT_SMART_QUOTE | RIGHT_SMART_QUOTE => {
                if in_single {
                    buf.push('"');
                } else {
                    in_double = !in_double;
                }
            },
            '\'' => {
                if in_double {
                    buf.push('\'');
                } else {
                    in_single = !in_single;
                }
            },
            _ => buf.push(c),
        }
    }

    if !buf.is_empty() {
        tokens.push(buf);
    }
    tokens
}

fn unescape(c: char) -> Option<char> {
    match c {
        'a' => Some('\u{07}'),
        'b' => Some('\u{08}'),
        'f' => Some('\u{0C}'),
        'n' => Some('\n'),
        'r' => Some('\r'),
        't' => Some('\t'),
        'v' => Some('\u{0B}'),
        '\\' | '\'' | '"' | '?' | LEFT_SMART_QUOTE | RIGHT_SMART_QUOTE => Some(c),
        _ => None,
    }
}
