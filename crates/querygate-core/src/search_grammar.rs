//! Field-scoped search strings.
//!
//! A search string is a whitespace-separated run of tokens:
//!
//! ```text
//! field1:13 foo:"bar baz" bar:2 some free text
//! ```
//!
//! - `FIELD:value` scopes `value` to `FIELD` (word characters, `-`, `_`);
//! - a value is either a double-quoted run (quotes stripped, inner whitespace
//!   kept) or a run of non-whitespace characters;
//! - tokens without a `FIELD:` prefix belong to the default field.
//!
//! Parsing is best effort and never fails: a token that does not fit the
//! grammar degrades to a plain value (or is skipped when empty).

use crate::params::ParamMap;
use regex::Regex;
use std::sync::OnceLock;

static TOKEN_PATTERN: OnceLock<Regex> = OnceLock::new();

fn token_pattern() -> &'static Regex {
    TOKEN_PATTERN.get_or_init(|| {
        Regex::new(r#"(?:(?P<field>[\w-]+):)?(?:"(?P<quoted>[^"]*)"|(?P<bare>\S+))"#)
            .expect("search token pattern compiles")
    })
}

/// Split `input` into per-field value lists.
///
/// Fields appear in order of first occurrence; values keep the order they were
/// written in, duplicates included. Empty values are dropped.
///
/// ```
/// use querygate_core::search_grammar::parse_search;
///
/// let parsed = parse_search(r#"foo:"bar baz" hello"#, "search");
/// assert_eq!(parsed.get("foo"), Some(&vec!["bar baz".to_string()]));
/// assert_eq!(parsed.get("search"), Some(&vec!["hello".to_string()]));
/// ```
pub fn parse_search(input: &str, default_field: &str) -> ParamMap<Vec<String>> {
    let mut parsed: ParamMap<Vec<String>> = ParamMap::new();

    for caps in token_pattern().captures_iter(input) {
        let value = caps
            .name("quoted")
            .or_else(|| caps.name("bare"))
            .map(|m| m.as_str().trim())
            .unwrap_or_default();
        if value.is_empty() {
            continue;
        }

        let field = caps
            .name("field")
            .map(|m| m.as_str())
            .unwrap_or(default_field);

        match parsed.get_mut(field) {
            Some(values) => values.push(value.to_string()),
            None => {
                parsed.insert(field, vec![value.to_string()]);
            }
        }
    }

    parsed
}
