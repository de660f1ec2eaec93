// Brook Parser Scanning Helpers
// String and bracket aware searches over a single logical line

use std::str::CharIndices;

/// Characters that terminate an identifier when scanning an expression.
pub const RESERVED: &[char] = &[
    '+', '=', '-', '/', '*', ' ', '(', ')', '{', '}', ';', '[', ']', '!', '"', '<', '>', '&', '|',
    ',',
];

/// Iterates the characters of `text` that sit outside string literals and
/// outside nested parentheses or brackets. Opening brackets at the top level
/// are yielded, so callers can find the first call or index.
pub struct TopLevel<'a> {
    chars: CharIndices<'a>,
    depth: usize,
    in_string: bool,
    escaped: bool,
}

impl<'a> Iterator for TopLevel<'a> {
    type Item = (usize, char);

    fn next(&mut self) -> Option<Self::Item> {
        for (idx, c) in self.chars.by_ref() {
            if self.in_string {
                if self.escaped {
                    self.escaped = false;
                } else if c == '\\' {
                    self.escaped = true;
                } else if c == '"' {
                    self.in_string = false;
                }
                continue;
            }

            match c {
                '"' => self.in_string = true,
                '(' | '[' => {
                    self.depth += 1;
                    if self.depth == 1 {
                        return Some((idx, c));
                    }
                }
                ')' | ']' => self.depth = self.depth.saturating_sub(1),
                _ if self.depth == 0 => return Some((idx, c)),
                _ => {}
            }
        }
        None
    }
}

pub fn top_level(text: &str) -> TopLevel<'_> {
    TopLevel {
        chars: text.char_indices(),
        depth: 0,
        in_string: false,
        escaped: false,
    }
}

/// Byte offset of the bracket closing the one opened at `open`.
pub fn matching_close(text: &str, open: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (idx, c) in text[open..].char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '(' | '[' => depth += 1,
            ')' | ']' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(open + idx);
                }
            }
            _ => {}
        }
    }
    None
}

/// Splits on `separator` wherever it appears at the top level.
pub fn split_top_level(text: &str, separator: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    for (idx, c) in top_level(text) {
        if c == separator {
            parts.push(text[start..idx].trim());
            start = idx + c.len_utf8();
        }
    }
    parts.push(text[start..].trim());
    parts
}

/// Decodes a quoted literal. Returns `None` unless the whole text is exactly
/// one string literal.
pub fn decode_string_literal(text: &str) -> Option<String> {
    let inner = text.strip_prefix('"')?;
    let mut decoded = String::with_capacity(inner.len());
    let mut chars = inner.char_indices();

    while let Some((idx, c)) = chars.next() {
        match c {
            '"' => return (idx + 1 == inner.len()).then_some(decoded),
            '\\' => {
                let (_, escaped) = chars.next()?;
                decoded.push(match escaped {
                    'n' => '\n',
                    't' => '\t',
                    'r' => '\r',
                    '0' => '\0',
                    other => other,
                });
            }
            other => decoded.push(other),
        }
    }
    None
}

pub fn is_identifier(text: &str) -> bool {
    let mut chars = text.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == '_')
}

/// A dot-notation path: identifiers separated by `.`.
pub fn is_path(text: &str) -> bool {
    !text.is_empty() && text.split('.').all(is_identifier)
}

pub fn path_segments(text: &str) -> Vec<String> {
    text.split('.').map(str::to_string).collect()
}

/// First whitespace-or-paren delimited word of a line.
pub fn first_word(text: &str) -> &str {
    let end = text
        .find(|c: char| c.is_whitespace() || c == '(')
        .unwrap_or(text.len());
    &text[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_protects_nesting_and_strings() {
        let parts = split_top_level(r#"a, f(b, c), "x, y", [1, 2]"#, ',');
        assert_eq!(parts, vec!["a", "f(b, c)", r#""x, y""#, "[1, 2]"]);
    }

    #[test]
    fn test_matching_close_skips_strings() {
        let text = r#"f(")", g(1))"#;
        assert_eq!(matching_close(text, 1), Some(text.len() - 1));
    }

    #[test]
    fn test_top_level_skips_nested() {
        let found: Vec<char> = top_level("(a+b)*c").map(|(_, c)| c).collect();
        assert_eq!(found, vec!['(', '*', 'c']);
    }

    #[test]
    fn test_decode_string_literal() {
        assert_eq!(
            decode_string_literal(r#""a\"b\n""#),
            Some("a\"b\n".to_string())
        );
        assert_eq!(decode_string_literal(r#""a" + "b""#), None);
        assert_eq!(decode_string_literal("\"open"), None);
    }

    #[test]
    fn test_paths() {
        assert!(is_path("a.b_2.c"));
        assert!(!is_path("a..b"));
        assert!(!is_path("1a"));
        assert_eq!(first_word("if (x)"), "if");
        assert_eq!(first_word("print(1)"), "print");
    }
}
