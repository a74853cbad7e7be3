//! Declarative parameter synchronization.
//!
//! A page declares its parameters once as a [`BlueprintSet`]. The engine
//! resolves typed state from the query string, navigation state, persisted
//! default overrides and a hidden store, and encodes changes back as the
//! smallest query string that reproduces them.
//!
//! # Architecture
//!
//! ```text
//! ParamStore ──► DefaultOverrides ──► effective defaults
//!                                           │
//! Location ──► SearchParamsProvider ◄───────┘
//!                   │        ▲
//!                   │        └── full / delta / merge over BlueprintSet
//!                   ▼
//!              Navigator::navigate(path, visible query, hash)
//! ```
//!
//! # Key Concepts
//!
//! - **Blueprint**: one field's type, default and flags
//! - **FilterGrammar**: `NOT(...)` / `!(...)` wrapping for filter arrays
//! - **full / delta**: complete state vs. only what differs from defaults
//! - **Hidden fields**: kept in an internal store, never in the visible query
//!
//! # Example
//!
//! ```
//! use search_params::{Blueprint, BlueprintSet, SearchParams};
//!
//! let set = BlueprintSet::builder()
//!     .field("query", Blueprint::string(""))
//!     .field("rows", Blueprint::number(25.0).min(1.0).max(100.0))
//!     .field("filters", Blueprint::filters(["type:pe"]))
//!     .build()?;
//!
//! let search = SearchParams::parse("?query=evil&filters=NOT(type:pe)&filters=type:elf");
//! let delta = set.delta(&search);
//! assert_eq!(delta.to_string(), "filters=NOT%28type%3Ape%29&filters=type%3Aelf&query=evil");
//! # Ok::<(), search_params::ParamsError>(())
//! ```

pub mod blueprint;
pub mod config;
pub mod error;
pub mod grammar;
pub mod navigation;
pub mod overrides;
pub mod provider;
pub mod query;
pub mod resolve;
pub mod set;
pub mod storage;
pub mod value;

pub use blueprint::{Blueprint, FieldKind, Origin};
pub use config::{FieldConfig, KindConfig, SchemaConfig};
pub use error::ParamsError;
pub use grammar::{FilterEntry, FilterGrammar};
pub use navigation::{Location, MemoryNavigator, Navigator};
pub use overrides::{DefaultOverrides, OverridesConfig};
pub use provider::{ProviderConfig, SearchParamsProvider};
pub use query::SearchParams;
pub use resolve::{Resolved, Source, Sources};
pub use set::{BlueprintSet, BlueprintSetBuilder};
pub use storage::{JsonFileStore, MemoryStore, ParamStore};
pub use value::{ParamValue, ParamValues};

/// Default negation operator for filter entries.
pub const DEFAULT_NOT_TOKEN: &str = "NOT";

/// Default omission operator for filter entries.
pub const DEFAULT_OMIT_TOKEN: &str = "!";
