//! Querygate: typed query input for listing pages.
//!
//! A listing page declares an [`InputContract`] once (allowed filters and
//! sorts, paging and search policy, an optional base-query restriction) and
//! every request is turned into a [`NormalizedQuery`] by [`normalize`]. The
//! normalized query exposes two views:
//!
//! - the effective filters a data source should apply;
//! - the minimal shareable parameters a link needs to reproduce the query.
//!
//! ```
//! use querygate_core::{normalize, FieldDescriptor, InputContract, RawInput};
//!
//! let contract = InputContract::builder()
//!     .filter(FieldDescriptor::new("status", "Status").multiple())
//!     .sort("created", "Created")
//!     .build()
//!     .expect("valid contract");
//!
//! let raw = RawInput::from_query_string("status=draft|live&page=2&junk=1");
//! let query = normalize(&contract, &raw, "admin.content");
//!
//! assert_eq!(query.get_values("status"), vec!["draft", "live"]);
//! assert!(!query.has("junk"));
//! assert_eq!(query.page(), 2);
//! assert_eq!(query.offset(), 20);
//! ```

pub mod catalog;
pub mod contract;
pub mod error;
pub mod links;
pub mod normalizer;
pub mod params;
pub mod query;
pub mod raw_input;
pub mod search_grammar;

pub use catalog::{
    toggle_value, Choice, ChoiceSet, FieldCatalog, FieldDescriptor, FilterKind, SortField,
};
pub use contract::{ContractDefinition, ContractOptions, InputContract, InputContractBuilder};
pub use error::{ContractError, ContractResult};
pub use links::{filter_links, page_link, sort_link, FilterLink, Link};
pub use normalizer::{normalize, normalize_from_shareable_parameters};
pub use params::ParamMap;
pub use query::{FilterValue, NormalizedQuery, SortOrder};
pub use raw_input::{encode_query_string, RawInput, RawValue};
pub use search_grammar::parse_search;
