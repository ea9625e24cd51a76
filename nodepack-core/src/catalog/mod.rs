//! Node package catalog
//!
//! This module holds everything the manager server tells us about
//! installable node packages, and the lookup structures built on top of it.
//!
//! # Overview
//!
//! - [`PackageDescriptor`]: one installable package (`getlist`)
//! - [`MappingData`]: which node names each source provides (`getmappings`)
//! - [`NodePattern`]: a package's declared node name regex
//! - [`MappingIndex`]: node type → source lookup
//! - [`Catalog`]: the validated snapshot owned by a session
//!
//! # Architecture
//!
//! ```text
//! Manager server
//!     │
//!     ├── /customnode/getlist      ← catalog (titles, files, patterns, state)
//!     └── /customnode/getmappings  ← source → provided node names
//!            │
//!            ▼
//!     MappingIndex (exact names, then patterns in catalog order)
//!            │
//!            ▼
//!     resolver::filter_missing
//! ```

mod index;
mod mappings;
mod package;
mod pattern;
mod snapshot;

pub use index::{AmbiguousMappingWarning, MappingIndex};
pub use mappings::{MappingData, SourceNames};
pub use package::PackageDescriptor;
pub use pattern::NodePattern;
pub use snapshot::{search_packages, Catalog, CatalogResponse};

#[cfg(test)]
mod tests;
