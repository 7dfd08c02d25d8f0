//! Filter and sort declarations.
//!
//! A [`FieldCatalog`] lists which fields an endpoint may filter on and which
//! it may sort by. Descriptors are plain values: they carry metadata for
//! consumers (labels, multiplicity, value domain) and are never mutated once
//! a contract has been built from them.

use crate::error::{ContractError, ContractResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

pub type Name = String;

/// Value submitted for a checked boolean filter.
pub const BOOLEAN_TRUE: &str = "1";
/// Value submitted for an unchecked boolean filter.
pub const BOOLEAN_FALSE: &str = "0";

// ============================================================================
// Choices
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Choice {
    pub value: String,
    pub label: String,
}

/// Ordered label-by-value map of the values a choice filter accepts.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct ChoiceSet {
    choices: Vec<Choice>,
}

impl ChoiceSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a choice; re-declaring a value replaces its label in place.
    pub fn with(mut self, value: impl Into<String>, label: impl Into<String>) -> Self {
        let value = value.into();
        let label = label.into();
        match self.choices.iter_mut().find(|c| c.value == value) {
            Some(existing) => existing.label = label,
            None => self.choices.push(Choice { value, label }),
        }
        self
    }

    pub fn from_pairs<I, V, L>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (V, L)>,
        V: Into<String>,
        L: Into<String>,
    {
        pairs
            .into_iter()
            .fold(Self::new(), |set, (value, label)| set.with(value, label))
    }

    pub fn label(&self, value: &str) -> Option<&str> {
        self.choices
            .iter()
            .find(|c| c.value == value)
            .map(|c| c.label.as_str())
    }

    pub fn contains(&self, value: &str) -> bool {
        self.choices.iter().any(|c| c.value == value)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Choice> {
        self.choices.iter()
    }

    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.choices.iter().map(|c| c.value.as_str())
    }

    pub fn len(&self) -> usize {
        self.choices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.choices.is_empty()
    }
}

// ============================================================================
// Filter descriptors
// ============================================================================

/// The value domain of a filter.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FilterKind {
    /// Any user-supplied string.
    #[default]
    Arbitrary,
    /// One of a pre-declared, trusted set of values.
    Choice { choices: ChoiceSet },
    /// [`BOOLEAN_TRUE`] or [`BOOLEAN_FALSE`].
    Boolean {
        true_label: String,
        false_label: String,
    },
    /// A calendar date, kept as the submitted string.
    Date,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub name: Name,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub multiple: bool,
    #[serde(default)]
    pub mandatory: bool,
    #[serde(default)]
    pub kind: FilterKind,
}

impl FieldDescriptor {
    pub fn new(name: impl Into<Name>, label: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            multiple: false,
            mandatory: false,
            kind: FilterKind::Arbitrary,
        }
    }

    pub fn multiple(mut self) -> Self {
        self.multiple = true;
        self
    }

    pub fn mandatory(mut self) -> Self {
        self.mandatory = true;
        self
    }

    pub fn with_choices(mut self, choices: ChoiceSet) -> Self {
        self.kind = FilterKind::Choice { choices };
        self
    }

    pub fn boolean(mut self, true_label: impl Into<String>, false_label: impl Into<String>) -> Self {
        self.kind = FilterKind::Boolean {
            true_label: true_label.into(),
            false_label: false_label.into(),
        };
        self
    }

    pub fn date(mut self) -> Self {
        self.kind = FilterKind::Date;
        self
    }

    /// Display label, falling back to the field name.
    pub fn title(&self) -> &str {
        if self.label.is_empty() {
            &self.name
        } else {
            &self.label
        }
    }

    /// Whether values come from a trusted, pre-declared set.
    ///
    /// This is advertised to renderers only; the normalizer does not reject
    /// values outside the set.
    pub fn is_choice_restricted(&self) -> bool {
        matches!(
            self.kind,
            FilterKind::Choice { .. } | FilterKind::Boolean { .. }
        )
    }

    /// The trusted value set, in declaration order, for restricted filters.
    pub fn allowed_values(&self) -> Option<Vec<&str>> {
        match &self.kind {
            FilterKind::Choice { choices } => Some(choices.values().collect()),
            FilterKind::Boolean { .. } => Some(vec![BOOLEAN_TRUE, BOOLEAN_FALSE]),
            FilterKind::Arbitrary | FilterKind::Date => None,
        }
    }

    /// `(value, label)` pairs for every trusted value, in declaration order.
    pub fn labelled_values(&self) -> Vec<(&str, &str)> {
        match &self.kind {
            FilterKind::Choice { choices } => choices
                .iter()
                .map(|c| (c.value.as_str(), c.label.as_str()))
                .collect(),
            FilterKind::Boolean {
                true_label,
                false_label,
            } => vec![
                (BOOLEAN_TRUE, true_label.as_str()),
                (BOOLEAN_FALSE, false_label.as_str()),
            ],
            FilterKind::Arbitrary | FilterKind::Date => Vec::new(),
        }
    }

    pub fn label_for(&self, value: &str) -> Option<&str> {
        self.labelled_values()
            .into_iter()
            .find(|(v, _)| *v == value)
            .map(|(_, label)| label)
    }
}

/// Toggle `candidate` in a selection.
///
/// Present values are removed (every occurrence); absent ones are appended
/// once. Remaining values keep their order and nothing is sorted, so the
/// result reflects the order the user clicked in.
pub fn toggle_value(current: &[String], candidate: &str) -> Vec<String> {
    if current.iter().any(|v| v == candidate) {
        current
            .iter()
            .filter(|v| v.as_str() != candidate)
            .cloned()
            .collect()
    } else {
        let mut next = current.to_vec();
        next.push(candidate.to_string());
        next
    }
}

// ============================================================================
// Sorts + catalog
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SortField {
    pub name: Name,
    #[serde(default)]
    pub label: String,
}

impl SortField {
    pub fn new(name: impl Into<Name>, label: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
        }
    }
}

/// The filters and sorts an endpoint allows, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldCatalog {
    filters: Vec<FieldDescriptor>,
    sorts: Vec<SortField>,
}

impl FieldCatalog {
    /// Build a catalog, rejecting duplicate filter or sort names.
    pub fn new(filters: Vec<FieldDescriptor>, sorts: Vec<SortField>) -> ContractResult<Self> {
        let mut seen = BTreeSet::new();
        for filter in &filters {
            if !seen.insert(filter.name.as_str()) {
                return Err(ContractError::DuplicateFilter {
                    field: filter.name.clone(),
                });
            }
        }

        let mut seen = BTreeSet::new();
        for sort in &sorts {
            if !seen.insert(sort.name.as_str()) {
                return Err(ContractError::DuplicateSort {
                    field: sort.name.clone(),
                });
            }
        }

        Ok(Self { filters, sorts })
    }

    pub fn filters(&self) -> &[FieldDescriptor] {
        &self.filters
    }

    pub fn sorts(&self) -> &[SortField] {
        &self.sorts
    }

    pub fn filter(&self, name: &str) -> Option<&FieldDescriptor> {
        self.filters.iter().find(|f| f.name == name)
    }

    pub fn sort(&self, name: &str) -> Option<&SortField> {
        self.sorts.iter().find(|s| s.name == name)
    }

    pub fn is_filter_allowed(&self, name: &str) -> bool {
        self.filter(name).is_some()
    }

    pub fn is_sort_allowed(&self, name: &str) -> bool {
        self.sort(name).is_some()
    }

    pub fn filter_names(&self) -> impl Iterator<Item = &str> {
        self.filters.iter().map(|f| f.name.as_str())
    }
}
