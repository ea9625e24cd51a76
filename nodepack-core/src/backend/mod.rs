//! Manager backend trait - Abstraction over the manager server
//!
//! The core never speaks a wire protocol itself. Everything it needs from
//! the outside world goes through [`ManagerBackend`]:
//! - HTTP manager server ([`HttpBackend`], `http` feature)
//! - In-memory backend (testing and offline use)

use async_trait::async_trait;

use crate::catalog::{MappingData, PackageDescriptor};
use crate::config::DbMode;
use crate::error::FetchError;
use crate::lifecycle::BackendAction;

mod memory;

#[cfg(feature = "http")]
mod http;

pub use memory::MemoryBackend;

#[cfg(feature = "http")]
pub use http::HttpBackend;

/// Trait for manager server backends
///
/// Implementations handle transport, timeouts and parsing; any failure is
/// reported as a [`FetchError`]. No implementation retries.
#[async_trait]
pub trait ManagerBackend: Send + Sync {
    /// Fetch the package catalog
    async fn fetch_catalog(
        &self,
        mode: DbMode,
        skip_update_check: bool,
    ) -> Result<Vec<PackageDescriptor>, FetchError>;

    /// Fetch the source → node names mapping data
    async fn fetch_mappings(&self, mode: DbMode) -> Result<MappingData, FetchError>;

    /// Node types left unresolved inside components
    ///
    /// Failures are not fatal; implementations return an empty list instead.
    async fn fetch_unresolved_component_node_types(&self) -> Vec<String>;

    /// Run an action for a package; `Ok` means the server completed it
    async fn perform_action(
        &self,
        package: &PackageDescriptor,
        action: BackendAction,
    ) -> Result<(), FetchError>;

    /// Backend identifier for logging/debugging
    fn name(&self) -> &'static str;
}
