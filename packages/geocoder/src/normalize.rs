//! Location query normalization.
//!
//! Applied to every query before the lookup cache is consulted and before
//! the provider is called, so that `"San Jose, CA."` and `"san jose ca"`
//! share one cache entry.

use regex::Regex;
use std::sync::LazyLock;

/// Commas and periods carry no meaning for a place lookup.
static PUNCTUATION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[,.]+").expect("valid regex"));

/// Normalizes a free-text location query.
///
/// The pipeline:
/// 1. Lowercase
/// 2. Trim
/// 3. Strip `,` and `.`
/// 4. Collapse whitespace runs to single spaces
#[must_use]
pub fn normalize_query(query: &str) -> String {
    let lower = query.to_lowercase();
    let no_punct = PUNCTUATION_RE.replace_all(lower.trim(), "");
    no_punct.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn punctuation_and_case_do_not_matter() {
        assert_eq!(normalize_query("San Jose, CA."), "san jose ca");
        assert_eq!(
            normalize_query("San Jose, CA."),
            normalize_query("san jose ca")
        );
    }

    #[test]
    fn collapses_whitespace() {
        assert_eq!(normalize_query("  san   jose\t ca \n"), "san jose ca");
    }

    #[test]
    fn removing_punctuation_joins_tokens() {
        assert_eq!(normalize_query("St.Helena"), "sthelena");
        assert_eq!(normalize_query("Boulder,CO"), "boulderco");
    }

    #[test]
    fn normalization_is_idempotent() {
        let once = normalize_query(" Mt. Tamalpais,  Marin County ");
        assert_eq!(normalize_query(&once), once);
    }

    #[test]
    fn blank_input_normalizes_to_empty() {
        assert_eq!(normalize_query(" , . "), "");
    }
}
