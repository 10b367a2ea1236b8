//! GraphQL syntax check.
//!
//! History only needs to know that a text is a well-formed GraphQL document;
//! document-level rules (unique operation names, a single anonymous
//! operation, at least one operation) are not enforced here.
//!
//! ```
//! use gql_history::graphql::is_valid_document;
//!
//! assert!(is_valid_document("query Q1 { name }"));
//! assert!(is_valid_document("fragment F on User { id }"));
//! assert!(is_valid_document("query Q { a } type T { b: Int }"));
//! assert!(!is_valid_document("query {"));
//! ```

use async_graphql_parser::{parse_query, parse_schema, Error};
use tracing::debug;

/// Keywords that open a top-level definition.
const DEFINITION_KEYWORDS: &[&str] = &[
    "query",
    "mutation",
    "subscription",
    "fragment",
    "schema",
    "scalar",
    "type",
    "interface",
    "union",
    "enum",
    "input",
    "directive",
    "extend",
];

/// True when `source` is a syntactically well-formed document made of
/// executable and/or type-system definitions.
///
/// Selection sets nested past the parser's recursion limit are rejected.
pub fn is_valid_document(source: &str) -> bool {
    if parses(source) {
        return true;
    }

    // Mixed documents fit neither grammar as a whole; check each definition.
    let definitions = split_definitions(source);
    if definitions.len() > 1 && definitions.iter().all(|d| parses(d)) {
        return true;
    }

    debug!(definitions = definitions.len(), "not a GraphQL document");
    false
}

/// Parse as executable, then as type-system document. Only syntax errors
/// and the recursion limit count as failures.
fn parses(source: &str) -> bool {
    match parse_query(source) {
        Ok(_) => return true,
        Err(Error::RecursionLimitExceeded) => return false,
        Err(Error::Syntax { .. }) => {}
        Err(_) => return true,
    }
    match parse_schema(source) {
        Ok(_) => true,
        Err(Error::Syntax { .. } | Error::RecursionLimitExceeded) => false,
        Err(_) => true,
    }
}

/// Last significant token seen while scanning.
#[derive(Clone, Copy, PartialEq, Eq)]
enum Token<'a> {
    Start,
    Punct(u8),
    Name(&'a str),
    Str,
}

impl Token<'_> {
    /// Whether a definition may begin right after this token.
    fn ends_definition(self) -> bool {
        match self {
            Token::Start | Token::Str => false,
            Token::Punct(c) => !matches!(c, b'@' | b'|' | b'=' | b'&' | b':'),
            Token::Name(name) => {
                !DEFINITION_KEYWORDS.contains(&name) && !matches!(name, "on" | "implements")
            }
        }
    }
}

/// Split a document into its top-level definitions.
///
/// Pieces concatenate back to `source`, so a document is well-formed when
/// every piece is. Unbalanced input comes back as a single piece.
fn split_definitions(source: &str) -> Vec<&str> {
    let bytes = source.as_bytes();
    let mut pieces = Vec::new();
    let mut piece_start = 0;
    let mut depth = 0usize;
    let mut prev = Token::Start;
    let mut i = 0;

    let mut cut = |at: usize, piece_start: &mut usize| {
        let piece = &source[*piece_start..at];
        if !piece.trim().is_empty() {
            pieces.push(piece);
        }
        *piece_start = at;
    };

    while i < bytes.len() {
        let c = bytes[i];
        match c {
            b'#' => {
                while i < bytes.len() && bytes[i] != b'\n' && bytes[i] != b'\r' {
                    i += 1;
                }
            }
            b'"' => {
                if depth == 0 && prev.ends_definition() {
                    cut(i, &mut piece_start);
                }
                i = skip_string(bytes, i);
                prev = Token::Str;
            }
            b'A'..=b'Z' | b'a'..=b'z' | b'_' => {
                let start = i;
                while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_') {
                    i += 1;
                }
                let name = &source[start..i];
                if depth == 0 && DEFINITION_KEYWORDS.contains(&name) && prev.ends_definition() {
                    cut(start, &mut piece_start);
                }
                prev = Token::Name(name);
            }
            b'{' | b'(' | b'[' => {
                if c == b'{' && depth == 0 && prev == Token::Punct(b'}') {
                    cut(i, &mut piece_start);
                }
                depth += 1;
                prev = Token::Punct(c);
                i += 1;
            }
            b'}' | b')' | b']' => {
                let Some(next) = depth.checked_sub(1) else {
                    return vec![source];
                };
                depth = next;
                prev = Token::Punct(c);
                i += 1;
            }
            _ if c.is_ascii_whitespace() || c == b',' => i += 1,
            _ => {
                prev = Token::Punct(c);
                i += 1;
            }
        }
    }

    if depth != 0 {
        return vec![source];
    }
    cut(bytes.len(), &mut piece_start);
    pieces
}

/// Index just past the string literal starting at `start`.
fn skip_string(bytes: &[u8], start: usize) -> usize {
    if bytes[start..].starts_with(b"\"\"\"") {
        let mut i = start + 3;
        while i < bytes.len() {
            if bytes[i..].starts_with(b"\\\"\"\"") {
                i += 4;
            } else if bytes[i..].starts_with(b"\"\"\"") {
                return i + 3;
            } else {
                i += 1;
            }
        }
        return bytes.len();
    }

    let mut i = start + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'"' => return i + 1,
            b'\n' | b'\r' => return i,
            _ => i += 1,
        }
    }
    bytes.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operations_are_valid() {
        assert!(is_valid_document("query Q1 { name }"));
        assert!(is_valid_document("{ user(id: 1) { id ...F } } fragment F on User { name }"));
        assert!(is_valid_document("mutation M($v: Int) { bump(by: $v) }"));
    }

    #[test]
    fn test_type_system_documents_are_valid() {
        assert!(is_valid_document("type Query { name: String }"));
        assert!(is_valid_document("schema { mutation: M }"));
    }

    #[test]
    fn test_document_rule_violations_are_still_valid_syntax() {
        assert!(is_valid_document("fragment F on T { a }"));
        assert!(is_valid_document("{a} {b}"));
        assert!(is_valid_document("query A {a} query A {b}"));
        assert!(is_valid_document("fragment F on T { a } fragment F on T { b }"));
    }

    #[test]
    fn test_mixed_documents_are_valid() {
        assert!(is_valid_document("query Q { a } type T { b: Int }"));
        assert!(is_valid_document(
            "query Q { a } scalar Date type T { d: Date } extend type T { e: Int }"
        ));
        assert!(is_valid_document(
            "\"\"\"A type with a } in its docs\"\"\" type T { a: Int } { a }"
        ));
        assert!(is_valid_document("union U = A | B query Q { a } # trailing comment }"));
    }

    #[test]
    fn test_garbage_is_invalid() {
        assert!(!is_valid_document("{ name"));
        assert!(!is_valid_document("SELECT * FROM users"));
        assert!(!is_valid_document(""));
        assert!(!is_valid_document("   "));
        assert!(!is_valid_document("query Q type T { b: Int }"));
        assert!(!is_valid_document("query Q { a } type T { b: }"));
        assert!(!is_valid_document("{ a } }"));
    }

    #[test]
    fn test_excessive_nesting_is_rejected() {
        let depth = 200;
        let query = format!("{}a{}", "{ a ".repeat(depth), " }".repeat(depth));
        assert!(!is_valid_document(&query));
    }

    #[test]
    fn test_split_keeps_every_byte() {
        let source = "query Q { a }\n\"doc\" type T { b: Int }\n{ c }";
        let pieces = split_definitions(source);
        assert_eq!(pieces.len(), 3);
        assert_eq!(pieces.concat(), source);
        assert!(pieces[1].starts_with("\"doc\" type"));
    }
}
