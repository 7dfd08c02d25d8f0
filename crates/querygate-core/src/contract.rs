//! Input contracts: what an endpoint lets its users ask for.
//!
//! An [`InputContract`] is built once per endpoint definition and then shared
//! by every request hitting that endpoint. Construction validates the whole
//! configuration up front; afterwards the contract is read-only, so it can be
//! wrapped in an `Arc` and used from any number of threads.

use crate::catalog::{FieldCatalog, FieldDescriptor, SortField};
use crate::error::{ContractError, ContractResult};
use crate::params::ParamMap;
use crate::query::SortOrder;
use serde::{Deserialize, Serialize};

pub const DEFAULT_LIMIT: u64 = 20;

// ============================================================================
// Options
// ============================================================================

/// Scalar policy options of a contract.
///
/// Every field has a default, so definition files only need to spell out what
/// they change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContractOptions {
    /// Per-field bound on the values users may select.
    pub base_query: ParamMap<Vec<String>>,
    pub limit_allowed: bool,
    pub default_limit: u64,
    pub limit_param: String,
    pub pager_enabled: bool,
    pub pager_param: String,
    pub search_enabled: bool,
    pub search_fields: Option<Vec<String>>,
    pub search_param: String,
    pub search_parsed: bool,
    /// Unset means "first declared sort".
    pub default_sort_field: Option<String>,
    pub default_sort_order: SortOrder,
    pub sort_field_param: String,
    pub sort_order_param: String,
    pub display_param: String,
}

impl Default for ContractOptions {
    fn default() -> Self {
        Self {
            base_query: ParamMap::new(),
            limit_allowed: false,
            default_limit: DEFAULT_LIMIT,
            limit_param: "limit".to_string(),
            pager_enabled: true,
            pager_param: "page".to_string(),
            search_enabled: false,
            search_fields: None,
            search_param: "search".to_string(),
            search_parsed: false,
            default_sort_field: None,
            default_sort_order: SortOrder::Desc,
            sort_field_param: "st".to_string(),
            sort_order_param: "by".to_string(),
            display_param: "disp".to_string(),
        }
    }
}

/// Serialized form of a whole contract (filters, sorts and options).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractDefinition {
    #[serde(default)]
    pub filters: Vec<FieldDescriptor>,
    #[serde(default)]
    pub sorts: Vec<SortField>,
    #[serde(default)]
    pub options: ContractOptions,
}

// ============================================================================
// Contract
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputContract {
    catalog: FieldCatalog,
    options: ContractOptions,
    search_fields: Vec<String>,
    default_sort_field: Option<String>,
}

impl InputContract {
    pub fn builder() -> InputContractBuilder {
        InputContractBuilder::default()
    }

    /// Validate and build a contract.
    ///
    /// Fails with a [`ContractError`] naming the offending field or option
    /// when the declaration is inconsistent.
    pub fn new(
        filters: Vec<FieldDescriptor>,
        sorts: Vec<SortField>,
        options: ContractOptions,
    ) -> ContractResult<Self> {
        let catalog = FieldCatalog::new(filters, sorts)?;
        let mut options = options;

        for (option, value) in [
            ("limit_param", &options.limit_param),
            ("pager_param", &options.pager_param),
            ("search_param", &options.search_param),
            ("sort_field_param", &options.sort_field_param),
            ("sort_order_param", &options.sort_order_param),
            ("display_param", &options.display_param),
        ] {
            if value.trim().is_empty() {
                return Err(ContractError::EmptyParameterName { option });
            }
        }

        if options.default_limit == 0 {
            return Err(ContractError::InvalidDefaultLimit {
                value: options.default_limit,
            });
        }

        let search_fields = options.search_fields.clone().unwrap_or_default();
        if let Some(field) = search_fields
            .iter()
            .find(|f| !catalog.is_filter_allowed(f))
        {
            return Err(ContractError::UnknownSearchField {
                field: field.clone(),
            });
        }
        if options.search_enabled && !options.search_parsed && search_fields.is_empty() {
            return Err(ContractError::MissingSearchField);
        }

        if let Some(field) = options
            .base_query
            .keys()
            .find(|f| !catalog.is_filter_allowed(f))
        {
            return Err(ContractError::UnknownBaseQueryField {
                field: field.to_string(),
            });
        }
        options.base_query = options
            .base_query
            .into_iter()
            .map(|(field, values)| (field, dedup_in_order(values)))
            .collect();

        let default_sort_field = match options.default_sort_field.as_deref() {
            Some(field) if !field.is_empty() => {
                if !catalog.is_sort_allowed(field) {
                    return Err(ContractError::UnknownDefaultSort {
                        field: field.to_string(),
                    });
                }
                Some(field.to_string())
            }
            _ => catalog.sorts().first().map(|s| s.name.clone()),
        };

        tracing::debug!(
            filters = catalog.filters().len(),
            sorts = catalog.sorts().len(),
            base_query = options.base_query.len(),
            search_enabled = options.search_enabled,
            "input contract built"
        );

        Ok(Self {
            catalog,
            options,
            search_fields,
            default_sort_field,
        })
    }

    pub fn from_definition(definition: ContractDefinition) -> ContractResult<Self> {
        Self::new(definition.filters, definition.sorts, definition.options)
    }

    pub fn catalog(&self) -> &FieldCatalog {
        &self.catalog
    }

    pub fn options(&self) -> &ContractOptions {
        &self.options
    }

    pub fn filters(&self) -> &[FieldDescriptor] {
        self.catalog.filters()
    }

    pub fn filter(&self, name: &str) -> Option<&FieldDescriptor> {
        self.catalog.filter(name)
    }

    pub fn sorts(&self) -> &[SortField] {
        self.catalog.sorts()
    }

    pub fn is_filter_allowed(&self, name: &str) -> bool {
        self.catalog.is_filter_allowed(name)
    }

    pub fn is_sort_allowed(&self, name: &str) -> bool {
        self.catalog.is_sort_allowed(name)
    }

    pub fn default_sort_field(&self) -> Option<&str> {
        self.default_sort_field.as_deref()
    }

    pub fn default_sort_order(&self) -> SortOrder {
        self.options.default_sort_order
    }

    pub fn base_query(&self) -> &ParamMap<Vec<String>> {
        &self.options.base_query
    }

    pub fn base_values(&self, field: &str) -> Option<&[String]> {
        self.options.base_query.get(field).map(Vec::as_slice)
    }

    pub fn is_limit_allowed(&self) -> bool {
        self.options.limit_allowed
    }

    pub fn default_limit(&self) -> u64 {
        self.options.default_limit
    }

    pub fn limit_param(&self) -> &str {
        &self.options.limit_param
    }

    pub fn is_pager_enabled(&self) -> bool {
        self.options.pager_enabled
    }

    pub fn pager_param(&self) -> &str {
        &self.options.pager_param
    }

    pub fn is_search_enabled(&self) -> bool {
        self.options.search_enabled
    }

    pub fn is_search_parsed(&self) -> bool {
        self.options.search_parsed
    }

    pub fn search_param(&self) -> &str {
        &self.options.search_param
    }

    pub fn search_fields(&self) -> &[String] {
        &self.search_fields
    }

    /// Field receiving unscoped tokens of a parsed search string: the first
    /// declared search field, else the search parameter itself.
    pub fn search_target(&self) -> &str {
        self.search_fields
            .first()
            .map(String::as_str)
            .unwrap_or(self.options.search_param.as_str())
    }

    /// Whether `name` carries full-text terms (space-joined, never piped).
    pub fn is_fulltext_key(&self, name: &str) -> bool {
        self.options.search_enabled
            && (name == self.options.search_param || self.search_fields.iter().any(|f| f == name))
    }

    pub fn sort_field_param(&self) -> &str {
        &self.options.sort_field_param
    }

    pub fn sort_order_param(&self) -> &str {
        &self.options.sort_order_param
    }

    pub fn display_param(&self) -> &str {
        &self.options.display_param
    }
}

fn dedup_in_order(values: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(values.len());
    for value in values {
        if !out.contains(&value) {
            out.push(value);
        }
    }
    out
}

// ============================================================================
// Builder
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct InputContractBuilder {
    filters: Vec<FieldDescriptor>,
    sorts: Vec<SortField>,
    options: ContractOptions,
}

impl InputContractBuilder {
    pub fn filter(mut self, filter: FieldDescriptor) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn sort(mut self, name: impl Into<String>, label: impl Into<String>) -> Self {
        self.sorts.push(SortField::new(name, label));
        self
    }

    /// Replace every option at once.
    pub fn options(mut self, options: ContractOptions) -> Self {
        self.options = options;
        self
    }

    pub fn base_query<I, S>(mut self, field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options
            .base_query
            .insert(field, values.into_iter().map(Into::into).collect());
        self
    }

    pub fn allow_limit(mut self, default_limit: u64) -> Self {
        self.options.limit_allowed = true;
        self.options.default_limit = default_limit;
        self
    }

    pub fn default_limit(mut self, default_limit: u64) -> Self {
        self.options.default_limit = default_limit;
        self
    }

    pub fn limit_param(mut self, name: impl Into<String>) -> Self {
        self.options.limit_param = name.into();
        self
    }

    pub fn disable_pager(mut self) -> Self {
        self.options.pager_enabled = false;
        self
    }

    pub fn pager_param(mut self, name: impl Into<String>) -> Self {
        self.options.pager_param = name.into();
        self
    }

    pub fn enable_search(mut self) -> Self {
        self.options.search_enabled = true;
        self
    }

    /// Enable search and decompose search strings with the field grammar.
    pub fn parsed_search(mut self) -> Self {
        self.options.search_enabled = true;
        self.options.search_parsed = true;
        self
    }

    pub fn search_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options.search_fields = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    pub fn search_param(mut self, name: impl Into<String>) -> Self {
        self.options.search_param = name.into();
        self
    }

    pub fn default_sort(mut self, field: impl Into<String>, order: SortOrder) -> Self {
        self.options.default_sort_field = Some(field.into());
        self.options.default_sort_order = order;
        self
    }

    pub fn default_sort_order(mut self, order: SortOrder) -> Self {
        self.options.default_sort_order = order;
        self
    }

    pub fn sort_params(
        mut self,
        field_param: impl Into<String>,
        order_param: impl Into<String>,
    ) -> Self {
        self.options.sort_field_param = field_param.into();
        self.options.sort_order_param = order_param.into();
        self
    }

    pub fn display_param(mut self, name: impl Into<String>) -> Self {
        self.options.display_param = name.into();
        self
    }

    pub fn build(self) -> ContractResult<InputContract> {
        InputContract::new(self.filters, self.sorts, self.options)
    }
}
