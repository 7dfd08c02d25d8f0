//! Raw input → [`NormalizedQuery`].
//!
//! Normalization runs in a fixed order:
//!
//! 1. drop transport artefacts (routing attributes);
//! 2. split `a|b|c` scalars into lists;
//! 3. extract the search string, and in parsed mode merge its field-scoped
//!    tokens into the input;
//! 4. bound base-query fields, once for the effective filters and once (with
//!    no-op suppression) for the shareable parameters;
//! 5. drop effective filters the contract does not allow;
//! 6. flatten lists back into scalars where the encoding calls for it;
//! 7. resolve limit, page and sort against the contract;
//! 8. pass the display parameter through.
//!
//! None of this fails: anything malformed or disallowed falls back to the
//! contract defaults or is dropped.

use crate::contract::InputContract;
use crate::params::ParamMap;
use crate::query::{FilterValue, NormalizedQuery, SortOrder};
use crate::raw_input::{RawInput, RawValue, MULTI_VALUE_SEPARATOR};
use crate::search_grammar::parse_search;
use std::collections::BTreeMap;

/// Routing attributes a transport adapter may leave in the input.
pub const TRANSPORT_NOISE: &[&str] = &["_route", "_route_params", "_controller"];

/// Separator for full-text values, which are never pipe-joined.
const FULLTEXT_SEPARATOR: &str = " ";

type Values = ParamMap<Vec<String>>;

/// Normalize `raw` against `contract` for the page identified by `route_name`.
pub fn normalize(contract: &InputContract, raw: &RawInput, route_name: &str) -> NormalizedQuery {
    let decoded = decode_input(raw);

    // Search extraction.
    let mut merged = decoded.clone();
    let mut raw_search_string = String::new();
    let mut search_string = String::new();
    let mut searched_fields: Vec<String> = Vec::new();
    let search_param = contract.search_param();
    if contract.is_search_enabled() {
        // Read from `raw`, not `decoded`: pipes in the search string are text.
        if let Some(value) = raw.get(search_param).filter(|v| !v.is_blank()) {
            raw_search_string = value.joined(FULLTEXT_SEPARATOR);
            if contract.is_search_parsed() {
                merged.remove(search_param);
                let parsed = parse_search(&raw_search_string, contract.search_target());
                tracing::trace!(fields = parsed.len(), "parsed search string");
                for (field, values) in parsed {
                    searched_fields.push(field.clone());
                    merge_union(&mut merged, field, values);
                }
                search_string = merged
                    .get(contract.search_target())
                    .map(|values| values.join(FULLTEXT_SEPARATOR))
                    .unwrap_or_default();
            } else {
                search_string = raw_search_string.clone();
            }
        }
    }

    // Effective filters: bounded by the base query, then allow-listed.
    let mut effective = merged;
    for (field, allowed) in contract.base_query().iter() {
        let bounded = match effective.get(field) {
            Some(requested) => intersect(requested, allowed),
            None => allowed.clone(),
        };
        effective.insert(field, bounded);
    }
    effective.retain(|field, _| {
        let allowed = contract.is_filter_allowed(field);
        if !allowed {
            tracing::debug!(field, "dropping disallowed filter");
        }
        allowed
    });

    // Shareable parameters: what the user typed, minus no-op base-query values.
    // A field the search string also scopes stays, or replaying the link would
    // bound it by the search values alone.
    let mut shareable = decoded.clone();
    for (field, allowed) in contract.base_query().iter() {
        let Some(requested) = decoded.get(field) else {
            continue;
        };
        let bounded = intersect(requested, allowed);
        let searched = searched_fields.iter().any(|f| f == field);
        if !searched && is_base_query_noop(requested, &bounded, allowed) {
            shareable.remove(field);
        } else {
            shareable.insert(field, bounded);
        }
    }

    let filters = flatten_filters(contract, effective);
    let shareable_parameters = flatten_shareable(contract, shareable, &raw_search_string);

    // Paging, limit and sort only ever read the decoded input.
    let first = |param: &str| decoded.get(param).and_then(|values| values.first());

    let limit = if contract.is_limit_allowed() {
        first(contract.limit_param())
            .map(|v| coerce_int(v))
            .filter(|n| *n > 0)
            .map(|n| n as u64)
            .unwrap_or(contract.default_limit())
    } else {
        contract.default_limit()
    };

    let page = if contract.is_pager_enabled() {
        first(contract.pager_param())
            .map(|v| coerce_int(v))
            .filter(|n| *n >= 1)
            .map(|n| n as u64)
            .unwrap_or(1)
    } else {
        1
    };

    let (sort_field, sort_order) = match first(contract.sort_field_param()) {
        Some(field) if contract.is_sort_allowed(field) => {
            let order = first(contract.sort_order_param())
                .map(|v| SortOrder::from_request(v))
                .unwrap_or(contract.default_sort_order());
            (Some(field.clone()), order)
        }
        requested => {
            if let Some(field) = requested {
                tracing::trace!(field = field.as_str(), "sort field not allowed, using default");
            }
            (
                contract.default_sort_field().map(str::to_string),
                contract.default_sort_order(),
            )
        }
    };

    let current_display = first(contract.display_param())
        .cloned()
        .unwrap_or_default();

    NormalizedQuery {
        route_name: route_name.to_string(),
        sort_field,
        sort_order,
        limit,
        page,
        offset: limit.saturating_mul(page - 1),
        raw_search_string,
        search_string,
        current_display,
        filters,
        shareable_parameters,
    }
}

/// Rebuild a query from parameters previously produced by
/// [`NormalizedQuery::shareable_parameters`], e.g. a stored link.
pub fn normalize_from_shareable_parameters(
    contract: &InputContract,
    parameters: &ParamMap<String>,
    route_name: &str,
) -> NormalizedQuery {
    normalize(contract, &RawInput::from_shareable(parameters), route_name)
}

/// Drop transport noise and split pipe-packed scalars into lists.
fn decode_input(raw: &RawInput) -> Values {
    raw.iter()
        .filter(|(key, _)| !TRANSPORT_NOISE.contains(key))
        .filter_map(|(key, value)| {
            let values = match value {
                RawValue::Single(value) if value.contains(MULTI_VALUE_SEPARATOR) => value
                    .split(MULTI_VALUE_SEPARATOR)
                    .map(str::to_string)
                    .collect(),
                RawValue::Single(value) => vec![value.clone()],
                RawValue::List(values) => values.clone(),
            };
            (!values.is_empty()).then(|| (key.to_string(), values))
        })
        .collect()
}

/// Union `incoming` into `field`: existing values first, new ones appended,
/// duplicates removed.
fn merge_union(values: &mut Values, field: String, incoming: Vec<String>) {
    let mut merged: Vec<String> = Vec::new();
    let existing = values.get(&field).cloned().unwrap_or_default();
    for value in existing.into_iter().chain(incoming) {
        if !merged.contains(&value) {
            merged.push(value);
        }
    }
    values.insert(field, merged);
}

/// Values of `allowed` that were requested, in `allowed` order.
fn intersect(requested: &[String], allowed: &[String]) -> Vec<String> {
    allowed
        .iter()
        .filter(|value| requested.contains(value))
        .cloned()
        .collect()
}

/// Whether bounding `requested` by `allowed` changed nothing worth putting in
/// a link.
///
/// The three checks are evaluated in this exact order: trimmed values are
/// kept, a narrowed selection is kept, and only a selection matching the
/// whole allowed set (as a sorted multiset) is suppressed.
fn is_base_query_noop(requested: &[String], bounded: &[String], allowed: &[String]) -> bool {
    if bounded.len() != requested.len() {
        return false;
    }
    if bounded.len() != allowed.len() {
        return false;
    }
    let mut bounded = bounded.to_vec();
    let mut allowed = allowed.to_vec();
    bounded.sort();
    allowed.sort();
    bounded == allowed
}

fn flatten_filters(contract: &InputContract, values: Values) -> BTreeMap<String, FilterValue> {
    values
        .into_iter()
        .map(|(field, mut values)| {
            let value = if contract.is_fulltext_key(&field) {
                FilterValue::Single(values.join(FULLTEXT_SEPARATOR))
            } else if values.len() == 1 {
                FilterValue::Single(values.remove(0))
            } else {
                FilterValue::Multiple(values)
            };
            (field, value)
        })
        .collect()
}

fn flatten_shareable(
    contract: &InputContract,
    values: Values,
    raw_search_string: &str,
) -> ParamMap<String> {
    let separator = MULTI_VALUE_SEPARATOR.to_string();
    values
        .into_iter()
        .map(|(field, values)| {
            let value = if contract.is_search_enabled()
                && field == contract.search_param()
                && !raw_search_string.is_empty()
            {
                raw_search_string.to_string()
            } else if contract.is_fulltext_key(&field) {
                values.join(FULLTEXT_SEPARATOR)
            } else {
                values.join(separator.as_str())
            };
            (field, value)
        })
        .collect()
}

/// Read a leading integer the way loosely typed query strings are usually
/// read: optional sign, then digits; anything else stops the scan. No digits
/// yields 0, overflow saturates.
fn coerce_int(value: &str) -> i64 {
    let value = value.trim_start();
    let (negative, digits) = match value.as_bytes().first() {
        Some(b'-') => (true, &value[1..]),
        Some(b'+') => (false, &value[1..]),
        _ => (false, value),
    };

    let mut out: i64 = 0;
    for b in digits.bytes().take_while(u8::is_ascii_digit) {
        out = out.saturating_mul(10).saturating_add(i64::from(b - b'0'));
    }
    if negative {
        -out
    } else {
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn coerces_leading_integers() {
        assert_eq!(coerce_int("12"), 12);
        assert_eq!(coerce_int("  7items"), 7);
        assert_eq!(coerce_int("-3"), -3);
        assert_eq!(coerce_int("+4"), 4);
        assert_eq!(coerce_int("abc"), 0);
        assert_eq!(coerce_int(""), 0);
        assert_eq!(coerce_int("-"), 0);
        assert_eq!(coerce_int("99999999999999999999999"), i64::MAX);
    }

    #[test]
    fn decode_splits_pipes_and_drops_noise() {
        let raw = RawInput::from_pairs([
            ("_route", RawValue::from("listing")),
            ("foo", RawValue::from("a|b")),
            ("bar", RawValue::from(vec!["x|y", "z"])),
            ("empty", RawValue::List(vec![])),
        ]);
        let decoded = decode_input(&raw);
        assert!(!decoded.contains_key("_route"));
        assert!(!decoded.contains_key("empty"));
        assert_eq!(decoded.get("foo"), Some(&strings(&["a", "b"])));
        assert_eq!(decoded.get("bar"), Some(&strings(&["x|y", "z"])));
    }

    #[test]
    fn merge_keeps_existing_values_first() {
        let mut values: Values = ParamMap::new();
        values.insert("foo", strings(&["c", "d", "e"]));
        merge_union(&mut values, "foo".into(), strings(&["a", "d", "f"]));
        merge_union(&mut values, "new".into(), strings(&["x", "x"]));
        assert_eq!(values.get("foo"), Some(&strings(&["c", "d", "e", "a", "f"])));
        assert_eq!(values.get("new"), Some(&strings(&["x"])));
    }

    #[test]
    fn intersection_follows_allowed_order() {
        let allowed = strings(&["a", "b", "c"]);
        assert_eq!(
            intersect(&strings(&["c", "d", "b"]), &allowed),
            strings(&["b", "c"])
        );
        assert!(intersect(&strings(&["z"]), &allowed).is_empty());
    }

    #[test]
    fn noop_detection_checks_trim_then_narrowing_then_content() {
        let allowed = strings(&["a", "b", "c"]);

        // Trimmed: d and e were not allowed.
        let requested = strings(&["b", "c", "d", "e"]);
        let bounded = intersect(&requested, &allowed);
        assert!(!is_base_query_noop(&requested, &bounded, &allowed));

        // Narrowed to a strict subset.
        let requested = strings(&["a", "b"]);
        let bounded = intersect(&requested, &allowed);
        assert!(!is_base_query_noop(&requested, &bounded, &allowed));

        // Same set, any order.
        let requested = strings(&["c", "a", "b"]);
        let bounded = intersect(&requested, &allowed);
        assert!(is_base_query_noop(&requested, &bounded, &allowed));

        // Duplicates count as trimming.
        let requested = strings(&["a", "a", "b", "c"]);
        let bounded = intersect(&requested, &allowed);
        assert!(!is_base_query_noop(&requested, &bounded, &allowed));
    }
}
