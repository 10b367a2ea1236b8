//! Save policy: which executions are worth a new history entry.
//!
//! Pure functions over [`QueryRecord`]s, no storage involved.

use tracing::debug;

use super::types::QueryRecord;
use crate::graphql;

/// Queries longer than this, in UTF-16 code units, are never saved.
pub const MAX_QUERY_SIZE: usize = 100_000;

/// Why a candidate was not saved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decline {
    EmptyQuery,
    TooLarge,
    InvalidSyntax,
    Duplicate,
    /// Only difference from the last entry is an optional field appearing
    /// for the first time.
    FirstAppearance(&'static str),
}

/// Length as an editor buffer counts it: UTF-16 code units.
pub fn query_length(query: &str) -> usize {
    query.encode_utf16().count()
}

/// A field counts as present when it is set and non-empty.
pub fn is_present(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|s| !s.is_empty())
}

/// True when `candidate` differs from `previous` only because it now has a
/// value where there was none.
///
/// Changing an existing value, or removing one, is not a first appearance.
pub fn is_first_appearance(candidate: &Option<String>, previous: &Option<String>) -> bool {
    candidate != previous && is_present(candidate) && !is_present(previous)
}

/// Decide whether `candidate` should be appended after `last`.
pub fn check(candidate: &QueryRecord, last: Option<&QueryRecord>) -> Result<(), Decline> {
    let query = candidate.query.as_str();
    if query.is_empty() {
        return Err(Decline::EmptyQuery);
    }
    if query_length(query) > MAX_QUERY_SIZE {
        return Err(Decline::TooLarge);
    }
    if !graphql::is_valid_document(query) {
        return Err(Decline::InvalidSyntax);
    }

    let Some(last) = last else {
        return Ok(());
    };

    let query_match = candidate.query == last.query;
    let variables_match = candidate.variables == last.variables;
    let headers_match = candidate.headers == last.headers;
    let extensions_match = candidate.extensions == last.extensions;

    if query_match && variables_match && headers_match && extensions_match {
        return Err(Decline::Duplicate);
    }
    if query_match
        && variables_match
        && headers_match
        && is_first_appearance(&candidate.extensions, &last.extensions)
    {
        return Err(Decline::FirstAppearance("extensions"));
    }
    if query_match && variables_match && is_first_appearance(&candidate.headers, &last.headers) {
        return Err(Decline::FirstAppearance("headers"));
    }
    if query_match && is_first_appearance(&candidate.variables, &last.variables) {
        return Err(Decline::FirstAppearance("variables"));
    }

    Ok(())
}

/// Boolean form of [`check`], logging the reason for a decline.
pub fn should_save(candidate: &QueryRecord, last: Option<&QueryRecord>) -> bool {
    match check(candidate, last) {
        Ok(()) => true,
        Err(reason) => {
            debug!(?reason, "declined to save query");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const Q1: &str = "query Q1 { name }";
    const Q2: &str = "query Q2 { value }";

    fn base() -> QueryRecord {
        QueryRecord::new(Q1)
            .with_variables(r#"{"var": 1}"#)
            .with_headers(r#"{"Header": "one"}"#)
            .with_operation_name("Q1")
    }

    #[test]
    fn test_first_appearance_predicate() {
        let some = |s: &str| Some(s.to_string());
        assert!(is_first_appearance(&some("x"), &None));
        assert!(is_first_appearance(&some("x"), &some("")));
        assert!(!is_first_appearance(&some(""), &None));
        assert!(!is_first_appearance(&some("x"), &some("y")));
        // Removal is never suppressed
        assert!(!is_first_appearance(&None, &some("x")));
        assert!(!is_first_appearance(&None, &None));
    }

    #[test]
    fn test_rejects_empty_oversized_and_invalid() {
        assert_eq!(check(&QueryRecord::new(""), None), Err(Decline::EmptyQuery));
        assert_eq!(
            check(&QueryRecord::new("{ name"), None),
            Err(Decline::InvalidSyntax)
        );

        let big = format!("{{ a # {} \n}}", "x".repeat(MAX_QUERY_SIZE));
        assert_eq!(check(&QueryRecord::new(big), None), Err(Decline::TooLarge));
    }

    #[test]
    fn test_accepts_at_size_ceiling() {
        let filler = "x".repeat(MAX_QUERY_SIZE - "{ a #\n}".len());
        let query = format!("{{ a #{}\n}}", filler);
        assert_eq!(query_length(&query), MAX_QUERY_SIZE);
        assert!(should_save(&QueryRecord::new(query), None));
    }

    #[test]
    fn test_astral_characters_count_twice() {
        let query = format!("{{ a #{}\n}}", "\u{1F600}".repeat(MAX_QUERY_SIZE / 2));
        assert!(query.chars().count() < MAX_QUERY_SIZE);
        assert_eq!(query_length(&query), MAX_QUERY_SIZE + 7);
        assert_eq!(check(&QueryRecord::new(query), None), Err(Decline::TooLarge));
    }

    #[test]
    fn test_accepts_first_entry() {
        assert!(should_save(&base(), None));
    }

    #[test]
    fn test_exact_duplicate_declined() {
        let last = base().with_extensions(r#"{"ext": 1}"#);
        assert_eq!(check(&last.clone(), Some(&last)), Err(Decline::Duplicate));
    }

    #[test]
    fn test_duplicate_ignores_operation_name_and_label() {
        let last = base();
        let candidate = base().with_operation_name("Other").with_label("x");
        assert_eq!(check(&candidate, Some(&last)), Err(Decline::Duplicate));
    }

    #[test]
    fn test_first_extensions_declined() {
        let candidate = base().with_extensions(r#"{"ext": 1}"#);
        assert_eq!(
            check(&candidate, Some(&base())),
            Err(Decline::FirstAppearance("extensions"))
        );
    }

    #[test]
    fn test_first_headers_declined() {
        let mut last = base();
        last.headers = None;
        assert_eq!(
            check(&base(), Some(&last)),
            Err(Decline::FirstAppearance("headers"))
        );
    }

    #[test]
    fn test_first_variables_declined() {
        let mut last = base();
        last.variables = None;
        assert_eq!(
            check(&base(), Some(&last)),
            Err(Decline::FirstAppearance("variables"))
        );
    }

    #[test]
    fn test_changed_extensions_accepted() {
        let last = base().with_extensions(r#"{"ext": 1}"#);
        let candidate = base().with_extensions(r#"{"ext": 2}"#);
        assert!(should_save(&candidate, Some(&last)));
    }

    #[test]
    fn test_removed_field_accepted() {
        let last = base().with_extensions(r#"{"ext": 1}"#);
        assert!(should_save(&base(), Some(&last)));

        let mut candidate = base();
        candidate.variables = None;
        assert!(should_save(&candidate, Some(&base())));
    }

    #[test]
    fn test_changed_query_accepted() {
        let candidate = QueryRecord::new(Q2).with_extensions(r#"{"ext": 2}"#);
        assert!(should_save(&candidate, Some(&base())));
    }

    #[test]
    fn test_headers_appearing_with_changed_extensions_declined() {
        let mut last = base().with_extensions(r#"{"ext": 1}"#);
        last.headers = None;
        let candidate = base().with_extensions(r#"{"ext": 2}"#);
        assert_eq!(
            check(&candidate, Some(&last)),
            Err(Decline::FirstAppearance("headers"))
        );
    }
}
