//! Untyped transport input.
//!
//! [`RawInput`] is what a transport adapter hands over: field names mapped to
//! a single string or an ordered list of strings. Nothing here is validated;
//! the normalizer decides what survives.

use crate::params::ParamMap;
use serde::{Deserialize, Serialize};
use url::form_urlencoded;

/// Separator packing several values into one parameter (`a|b|c`).
pub const MULTI_VALUE_SEPARATOR: char = '|';

/// Suffix marking a list parameter in query strings (`foo[]=a&foo[]=b`).
const LIST_KEY_SUFFIX: &str = "[]";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Single(String),
    List(Vec<String>),
}

impl RawValue {
    /// All values, in order; a single value yields a one-element list.
    pub fn to_vec(&self) -> Vec<String> {
        match self {
            RawValue::Single(value) => vec![value.clone()],
            RawValue::List(values) => values.clone(),
        }
    }

    pub fn first(&self) -> Option<&str> {
        match self {
            RawValue::Single(value) => Some(value),
            RawValue::List(values) => values.first().map(String::as_str),
        }
    }

    pub fn joined(&self, separator: &str) -> String {
        match self {
            RawValue::Single(value) => value.clone(),
            RawValue::List(values) => values.join(separator),
        }
    }

    pub fn is_blank(&self) -> bool {
        match self {
            RawValue::Single(value) => value.trim().is_empty(),
            RawValue::List(values) => values.iter().all(|v| v.trim().is_empty()),
        }
    }

    fn push(&mut self, value: String) {
        match self {
            RawValue::Single(existing) => {
                *self = RawValue::List(vec![std::mem::take(existing), value]);
            }
            RawValue::List(values) => values.push(value),
        }
    }
}

impl From<&str> for RawValue {
    fn from(value: &str) -> Self {
        RawValue::Single(value.to_string())
    }
}

impl From<String> for RawValue {
    fn from(value: String) -> Self {
        RawValue::Single(value)
    }
}

impl From<Vec<String>> for RawValue {
    fn from(values: Vec<String>) -> Self {
        RawValue::List(values)
    }
}

impl From<Vec<&str>> for RawValue {
    fn from(values: Vec<&str>) -> Self {
        RawValue::List(values.into_iter().map(str::to_string).collect())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawInput {
    params: ParamMap<RawValue>,
}

impl RawInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<RawValue>,
    {
        let mut input = Self::new();
        for (key, value) in pairs {
            input.insert(key, value);
        }
        input
    }

    /// Decode an `application/x-www-form-urlencoded` query string.
    ///
    /// `key[]` and repeated keys produce lists; a leading `?` is ignored.
    pub fn from_query_string(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        let mut input = Self::new();

        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            let (key, is_list) = match key.strip_suffix(LIST_KEY_SUFFIX) {
                Some(stripped) => (stripped.to_string(), true),
                None => (key.into_owned(), false),
            };
            let value = value.into_owned();

            match input.params.get_mut(&key) {
                Some(existing) => existing.push(value),
                None if is_list => {
                    input.params.insert(key, RawValue::List(vec![value]));
                }
                None => {
                    input.params.insert(key, RawValue::Single(value));
                }
            }
        }

        input
    }

    /// Rebuild input from previously generated shareable parameters.
    pub fn from_shareable(params: &ParamMap<String>) -> Self {
        Self::from_pairs(params.iter().map(|(k, v)| (k, v.as_str())))
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<RawValue>) {
        self.params.insert(key, value.into());
    }

    pub fn get(&self, key: &str) -> Option<&RawValue> {
        self.params.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.params.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &RawValue)> {
        self.params.iter()
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }
}

/// Render parameters as a query string (without the leading `?`).
pub fn encode_query_string(params: &ParamMap<String>) -> String {
    form_urlencoded::Serializer::new(String::new())
        .extend_pairs(params.iter())
        .finish()
}
