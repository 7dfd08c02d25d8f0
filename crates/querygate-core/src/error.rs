//! Configuration errors raised while building an [`InputContract`].
//!
//! Normalization itself never fails; only contract construction does.
//!
//! [`InputContract`]: crate::contract::InputContract

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContractError {
    #[error("search field `{field}` is not an allowed filter")]
    UnknownSearchField { field: String },

    #[error("base query field `{field}` is not an allowed filter")]
    UnknownBaseQueryField { field: String },

    #[error("search is enabled without grammar parsing but no search field is declared")]
    MissingSearchField,

    #[error("default sort field `{field}` is not an allowed sort")]
    UnknownDefaultSort { field: String },

    #[error("option `{option}` must be a non-empty parameter name")]
    EmptyParameterName { option: &'static str },

    #[error("option `default_limit` must be strictly positive, got {value}")]
    InvalidDefaultLimit { value: u64 },

    #[error("invalid sort order `{value}` (expected `asc` or `desc`)")]
    InvalidSortOrder { value: String },

    #[error("filter `{field}` is declared more than once")]
    DuplicateFilter { field: String },

    #[error("sort `{field}` is declared more than once")]
    DuplicateSort { field: String },
}

pub type ContractResult<T> = Result<T, ContractError>;
