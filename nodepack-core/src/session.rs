//! Manager session - one open package manager dialog
//!
//! A session fetches a fresh catalog snapshot when it opens and owns it
//! until it is dropped. It exposes the operations the presentation layer
//! needs: the filtered catalog for a graph, the actions allowed for a
//! package, and running an action through the lifecycle state machine.
//!
//! Actions for different packages may run concurrently. A second action
//! for a package whose previous action has not completed is refused.

use std::collections::{BTreeSet, HashSet};
use std::sync::{Arc, Mutex};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::backend::ManagerBackend;
use crate::catalog::{Catalog, PackageDescriptor};
use crate::config::ManagerConfig;
use crate::error::{ManagerError, Result};
use crate::graph::{GraphSnapshot, ResolvedNodeRegistry};
use crate::lifecycle::{ActionSet, LifecycleState, PackageAction};
use crate::resolver;

/// Outcome of a filtered catalog request
#[derive(Debug, Clone)]
pub struct MissingPackages {
    /// Packages to offer, in catalog order
    pub packages: Vec<PackageDescriptor>,
    pub unresolved: BTreeSet<String>,
    /// Unresolved node types no package provides
    pub unprovided: BTreeSet<String>,
    /// Number of catalog patterns that failed to compile and were skipped
    pub skipped_patterns: usize,
}

/// Marks a package as busy until dropped
struct InFlightGuard {
    title: String,
    in_flight: Arc<Mutex<HashSet<String>>>,
}

impl InFlightGuard {
    fn acquire(in_flight: &Arc<Mutex<HashSet<String>>>, title: &str) -> Result<Self> {
        let mut busy = in_flight.lock().unwrap_or_else(|e| e.into_inner());
        if !busy.insert(title.to_string()) {
            return Err(ManagerError::ActionInFlight {
                title: title.to_string(),
            });
        }
        Ok(Self {
            title: title.to_string(),
            in_flight: Arc::clone(in_flight),
        })
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        let mut busy = self.in_flight.lock().unwrap_or_else(|e| e.into_inner());
        busy.remove(&self.title);
    }
}

/// One manager session over a catalog snapshot
#[derive(Clone)]
pub struct ManagerSession {
    backend: Arc<dyn ManagerBackend>,
    config: ManagerConfig,
    catalog: Arc<RwLock<Catalog>>,
    in_flight: Arc<Mutex<HashSet<String>>>,
}

impl ManagerSession {
    /// Open a session by fetching the catalog snapshot
    pub async fn open(backend: Arc<dyn ManagerBackend>, config: ManagerConfig) -> Result<Self> {
        debug!(
            "Opening session via {} backend (mode: {}, skip update check: {})",
            backend.name(),
            config.mode,
            config.skip_update_check
        );

        let packages = backend
            .fetch_catalog(config.mode, config.skip_update_check)
            .await?;
        let catalog = Catalog::from_packages(packages);

        info!("Session opened with {} packages", catalog.len());

        Ok(Self {
            backend,
            config,
            catalog: Arc::new(RwLock::new(catalog)),
            in_flight: Arc::new(Mutex::new(HashSet::new())),
        })
    }

    pub fn config(&self) -> &ManagerConfig {
        &self.config
    }

    /// Copy of the current snapshot
    pub async fn catalog(&self) -> Catalog {
        self.catalog.read().await.clone()
    }

    pub async fn package(&self, title: &str) -> Result<PackageDescriptor> {
        self.catalog
            .read()
            .await
            .get(title)
            .cloned()
            .ok_or_else(|| ManagerError::UnknownPackage {
                title: title.to_string(),
            })
    }

    /// Packages a graph needs, given what the host already recognizes
    ///
    /// Fails with a fetch error when the mapping data cannot be fetched;
    /// a failed component lookup only narrows the unresolved set.
    pub async fn filtered_catalog(
        &self,
        graph: &GraphSnapshot,
        registry: &ResolvedNodeRegistry,
    ) -> Result<MissingPackages> {
        let mappings = self.backend.fetch_mappings(self.config.mode).await?;
        let component_types = self.backend.fetch_unresolved_component_node_types().await;

        let catalog = self.catalog.read().await;
        let resolution = resolver::resolve_missing(
            catalog.packages(),
            &mappings,
            &graph.node_types(),
            registry,
            &component_types,
        );

        if !resolution.unprovided.is_empty() {
            debug!(
                "No package provides: {}",
                resolution
                    .unprovided
                    .iter()
                    .map(String::as_str)
                    .collect::<Vec<_>>()
                    .join(", ")
            );
        }

        Ok(MissingPackages {
            packages: resolution.packages.into_iter().cloned().collect(),
            unresolved: resolution.unresolved,
            unprovided: resolution.unprovided,
            skipped_patterns: resolution.pattern_errors.len(),
        })
    }

    /// Actions exposed for a package in its current state
    pub async fn allowed_actions(&self, title: &str) -> Result<ActionSet> {
        Ok(self.package(title).await?.state.allowed_actions())
    }

    /// Run an action and commit the resulting state
    ///
    /// The state only changes after the backend reports success. Illegal
    /// actions are rejected before anything is sent.
    pub async fn perform(&self, title: &str, action: PackageAction) -> Result<LifecycleState> {
        let _guard = InFlightGuard::acquire(&self.in_flight, title)?;

        let package = self.package(title).await?;
        let next = package.state.transition(title, action)?;

        info!("Running {} for '{}'", action, title);
        if let Err(e) = self
            .backend
            .perform_action(&package, action.backend_action())
            .await
        {
            warn!("{} failed for '{}': {}", action, title, e);
            return Err(e.into());
        }

        let mut catalog = self.catalog.write().await;
        let pkg = catalog
            .get_mut(title)
            .ok_or_else(|| ManagerError::UnknownPackage {
                title: title.to_string(),
            })?;
        let previous = pkg.state;
        pkg.state = next;

        info!("'{}' is now {} (was {})", title, next, previous);
        Ok(next)
    }

    /// Run one action over several packages, one after another
    ///
    /// Every package is attempted; the result for each is returned in order.
    pub async fn perform_batch(
        &self,
        titles: &[String],
        action: PackageAction,
    ) -> Vec<(String, Result<LifecycleState>)> {
        let mut results = Vec::with_capacity(titles.len());
        for title in titles {
            let result = self.perform(title, action).await;
            results.push((title.clone(), result));
        }
        results
    }

    /// Whether an action for this package is still running
    pub fn is_busy(&self, title: &str) -> bool {
        self.in_flight
            .lock()
            .map(|busy| busy.contains(title))
            .unwrap_or(false)
    }
}
