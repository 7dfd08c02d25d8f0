//! Normalized query state.
//!
//! A [`NormalizedQuery`] is produced once per request by
//! [`normalize`](crate::normalizer::normalize) and never changes afterwards.
//! It carries two views of the same request:
//!
//! - `filters`: the effective, allow-listed values used to fetch data;
//! - `shareable_parameters`: the minimal parameter set that regenerates an
//!   equivalent query from a link.

use crate::error::ContractError;
use crate::params::ParamMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Sort order
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn as_str(self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }

    pub fn reversed(self) -> Self {
        match self {
            SortOrder::Asc => SortOrder::Desc,
            SortOrder::Desc => SortOrder::Asc,
        }
    }

    /// Lenient reading of a user-supplied order: only `desc` (any case) means
    /// descending, everything else is ascending.
    pub fn from_request(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("desc") {
            SortOrder::Desc
        } else {
            SortOrder::Asc
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortOrder {
    type Err = ContractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            v if v.eq_ignore_ascii_case("asc") => Ok(SortOrder::Asc),
            v if v.eq_ignore_ascii_case("desc") => Ok(SortOrder::Desc),
            other => Err(ContractError::InvalidSortOrder {
                value: other.to_string(),
            }),
        }
    }
}

impl TryFrom<String> for SortOrder {
    type Error = ContractError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

// ============================================================================
// Filter values
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FilterValue {
    Single(String),
    Multiple(Vec<String>),
}

impl FilterValue {
    pub fn values(&self) -> Vec<&str> {
        match self {
            FilterValue::Single(value) => vec![value.as_str()],
            FilterValue::Multiple(values) => values.iter().map(String::as_str).collect(),
        }
    }

    pub fn as_single(&self) -> Option<&str> {
        match self {
            FilterValue::Single(value) => Some(value),
            FilterValue::Multiple(_) => None,
        }
    }

    pub fn contains(&self, candidate: &str) -> bool {
        self.values().contains(&candidate)
    }
}

// ============================================================================
// Query
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NormalizedQuery {
    pub(crate) route_name: String,
    pub(crate) sort_field: Option<String>,
    pub(crate) sort_order: SortOrder,
    pub(crate) limit: u64,
    pub(crate) page: u64,
    pub(crate) offset: u64,
    pub(crate) raw_search_string: String,
    pub(crate) search_string: String,
    pub(crate) current_display: String,
    pub(crate) filters: BTreeMap<String, FilterValue>,
    pub(crate) shareable_parameters: ParamMap<String>,
}

impl NormalizedQuery {
    pub fn route_name(&self) -> &str {
        &self.route_name
    }

    pub fn sort_field(&self) -> Option<&str> {
        self.sort_field.as_deref()
    }

    pub fn sort_order(&self) -> SortOrder {
        self.sort_order
    }

    pub fn is_sorted_by(&self, field: &str) -> bool {
        self.sort_field.as_deref() == Some(field)
    }

    pub fn limit(&self) -> u64 {
        self.limit
    }

    /// 1-based page number.
    pub fn page(&self) -> u64 {
        self.page
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// The search parameter exactly as submitted.
    pub fn raw_search_string(&self) -> &str {
        &self.raw_search_string
    }

    /// Full-text terms left once field-scoped tokens are extracted.
    pub fn search_string(&self) -> &str {
        &self.search_string
    }

    pub fn current_display(&self) -> &str {
        &self.current_display
    }

    /// Effective filters (allow-listed, bounded by the base query).
    pub fn all(&self) -> &BTreeMap<String, FilterValue> {
        &self.filters
    }

    pub fn has(&self, name: &str) -> bool {
        self.filters.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&FilterValue> {
        self.filters.get(name)
    }

    pub fn get_values(&self, name: &str) -> Vec<&str> {
        self.filters
            .get(name)
            .map(FilterValue::values)
            .unwrap_or_default()
    }

    pub fn shareable_parameters(&self) -> &ParamMap<String> {
        &self.shareable_parameters
    }

    /// Shareable parameters with some entries replaced (`Some`) or removed
    /// (`None`); new keys are appended.
    pub fn shareable_parameters_with<I, K>(&self, overrides: I) -> ParamMap<String>
    where
        I: IntoIterator<Item = (K, Option<String>)>,
        K: Into<String>,
    {
        let mut params = self.shareable_parameters.clone();
        for (key, value) in overrides {
            let key = key.into();
            match value {
                Some(value) => {
                    params.insert(key, value);
                }
                None => {
                    params.remove(&key);
                }
            }
        }
        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sort_order_parsing() {
        assert_eq!(SortOrder::from_request("DESC"), SortOrder::Desc);
        assert_eq!(SortOrder::from_request("asc"), SortOrder::Asc);
        assert_eq!(SortOrder::from_request("sideways"), SortOrder::Asc);
        assert_eq!("Asc".parse::<SortOrder>(), Ok(SortOrder::Asc));
        assert_eq!(
            "up".parse::<SortOrder>(),
            Err(ContractError::InvalidSortOrder { value: "up".into() })
        );
        assert_eq!(SortOrder::Asc.reversed(), SortOrder::Desc);
    }

    #[test]
    fn sort_order_serde() {
        assert_eq!(serde_json::to_string(&SortOrder::Desc).expect("ser"), r#""desc""#);
        let order: SortOrder = serde_json::from_str(r#""ASC""#).expect("de");
        assert_eq!(order, SortOrder::Asc);
        assert!(serde_json::from_str::<SortOrder>(r#""up""#).is_err());
    }

    #[test]
    fn filter_values_serialize_untagged() {
        let single = FilterValue::Single("a".into());
        let multiple = FilterValue::Multiple(vec!["a".into(), "b".into()]);
        assert_eq!(serde_json::to_string(&single).expect("ser"), r#""a""#);
        assert_eq!(serde_json::to_string(&multiple).expect("ser"), r#"["a","b"]"#);
        assert!(multiple.contains("b"));
        assert_eq!(single.as_single(), Some("a"));
    }
}
