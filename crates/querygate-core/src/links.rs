//! Link helpers built on shareable parameters.
//!
//! Renderers use these to produce "toggle this value", "sort by this column"
//! and "go to page N" links without re-implementing query semantics. Every
//! helper starts from [`NormalizedQuery::shareable_parameters`], so links
//! never carry more than the user actually chose.

use crate::catalog::toggle_value;
use crate::contract::InputContract;
use crate::params::ParamMap;
use crate::query::NormalizedQuery;
use crate::raw_input::{encode_query_string, MULTI_VALUE_SEPARATOR};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Link {
    pub route: String,
    pub parameters: ParamMap<String>,
}

impl Link {
    fn new(query: &NormalizedQuery, parameters: ParamMap<String>) -> Self {
        Self {
            route: query.route_name().to_string(),
            parameters,
        }
    }

    /// Parameters rendered as a query string (without the leading `?`).
    pub fn query_string(&self) -> String {
        encode_query_string(&self.parameters)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterLink {
    pub value: String,
    pub label: String,
    /// Whether the value is part of the user's current selection.
    pub active: bool,
    pub link: Link,
}

/// The user's explicit selection for `field`, as carried by links.
fn current_selection(query: &NormalizedQuery, field: &str) -> Vec<String> {
    query
        .shareable_parameters()
        .get(field)
        .map(|value| {
            value
                .split(MULTI_VALUE_SEPARATOR)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// One toggle link per trusted value of `field`.
///
/// Multi-valued filters add or remove the value from the selection; single
/// valued ones switch to it, or clear it when it is already selected. Any
/// selection change goes back to the first page. Unknown or unrestricted
/// filters yield no links.
pub fn filter_links(
    contract: &InputContract,
    query: &NormalizedQuery,
    field: &str,
) -> Vec<FilterLink> {
    let Some(descriptor) = contract.filter(field) else {
        return Vec::new();
    };
    let selection = current_selection(query, field);
    let separator = MULTI_VALUE_SEPARATOR.to_string();

    descriptor
        .labelled_values()
        .into_iter()
        .map(|(value, label)| {
            let active = selection.iter().any(|v| v == value);
            let next = if descriptor.multiple {
                toggle_value(&selection, value)
            } else if active {
                Vec::new()
            } else {
                vec![value.to_string()]
            };

            let mut parameters = query.shareable_parameters().clone();
            parameters.remove(contract.pager_param());
            if next.is_empty() {
                parameters.remove(field);
            } else {
                parameters.insert(field, next.join(separator.as_str()));
            }

            FilterLink {
                value: value.to_string(),
                label: label.to_string(),
                active,
                link: Link::new(query, parameters),
            }
        })
        .collect()
}

/// Link sorting by `field`: the current sort column flips its order, any
/// other column starts at the contract's default order.
pub fn sort_link(contract: &InputContract, query: &NormalizedQuery, field: &str) -> Option<Link> {
    if !contract.is_sort_allowed(field) {
        return None;
    }
    let order = if query.is_sorted_by(field) {
        query.sort_order().reversed()
    } else {
        contract.default_sort_order()
    };

    let parameters = query.shareable_parameters_with([
        (contract.sort_field_param(), Some(field.to_string())),
        (contract.sort_order_param(), Some(order.to_string())),
        (contract.pager_param(), None),
    ]);
    Some(Link::new(query, parameters))
}

/// Link to `page` (1-based); `None` when paging is disabled.
pub fn page_link(contract: &InputContract, query: &NormalizedQuery, page: u64) -> Option<Link> {
    if !contract.is_pager_enabled() || page == 0 {
        return None;
    }
    let value = (page > 1).then(|| page.to_string());
    let parameters = query.shareable_parameters_with([(contract.pager_param(), value)]);
    Some(Link::new(query, parameters))
}
