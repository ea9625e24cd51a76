//! In-memory backend
//!
//! Serves a fixed catalog and mapping data, records every action it is
//! asked to run, and can be told to fail specific operations. Used by the
//! tests and for resolving against exported server data without a server.

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::ManagerBackend;
use crate::catalog::{MappingData, PackageDescriptor};
use crate::config::DbMode;
use crate::error::FetchError;
use crate::lifecycle::BackendAction;

#[derive(Debug, Default)]
struct Failures {
    catalog: bool,
    mappings: bool,
    components: bool,
    /// Package titles whose actions fail
    actions: HashSet<String>,
}

/// Backend serving data held in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    catalog: Vec<PackageDescriptor>,
    mappings: MappingData,
    component_node_types: Vec<String>,
    action_delay: Option<Duration>,
    failures: Arc<Mutex<Failures>>,
    performed: Arc<Mutex<Vec<(String, BackendAction)>>>,
}

impl MemoryBackend {
    pub fn new(catalog: Vec<PackageDescriptor>, mappings: MappingData) -> Self {
        Self {
            catalog,
            mappings,
            ..Default::default()
        }
    }

    pub fn with_component_node_types(mut self, types: Vec<String>) -> Self {
        self.component_node_types = types;
        self
    }

    /// Make every action take this long before completing
    pub fn with_action_delay(mut self, delay: Duration) -> Self {
        self.action_delay = Some(delay);
        self
    }

    pub fn fail_catalog(&self, fail: bool) {
        self.with_failures(|f| f.catalog = fail);
    }

    pub fn fail_mappings(&self, fail: bool) {
        self.with_failures(|f| f.mappings = fail);
    }

    pub fn fail_components(&self, fail: bool) {
        self.with_failures(|f| f.components = fail);
    }

    pub fn fail_actions_for(&self, title: &str, fail: bool) {
        self.with_failures(|f| {
            if fail {
                f.actions.insert(title.to_string());
            } else {
                f.actions.remove(title);
            }
        });
    }

    /// Actions the backend completed, in order
    pub fn performed(&self) -> Vec<(String, BackendAction)> {
        self.performed
            .lock()
            .map(|p| p.clone())
            .unwrap_or_default()
    }

    fn with_failures(&self, f: impl FnOnce(&mut Failures)) {
        if let Ok(mut failures) = self.failures.lock() {
            f(&mut failures);
        }
    }

    fn check(&self, f: impl FnOnce(&Failures) -> bool) -> bool {
        self.failures.lock().map(|g| f(&g)).unwrap_or(false)
    }
}

#[async_trait]
impl ManagerBackend for MemoryBackend {
    async fn fetch_catalog(
        &self,
        _mode: DbMode,
        _skip_update_check: bool,
    ) -> Result<Vec<PackageDescriptor>, FetchError> {
        if self.check(|f| f.catalog) {
            return Err(FetchError::new("fetch package catalog", "catalog unavailable"));
        }
        Ok(self.catalog.clone())
    }

    async fn fetch_mappings(&self, _mode: DbMode) -> Result<MappingData, FetchError> {
        if self.check(|f| f.mappings) {
            return Err(FetchError::new("fetch node mappings", "mappings unavailable"));
        }
        Ok(self.mappings.clone())
    }

    async fn fetch_unresolved_component_node_types(&self) -> Vec<String> {
        if self.check(|f| f.components) {
            return Vec::new();
        }
        self.component_node_types.clone()
    }

    async fn perform_action(
        &self,
        package: &PackageDescriptor,
        action: BackendAction,
    ) -> Result<(), FetchError> {
        if let Some(delay) = self.action_delay {
            tokio::time::sleep(delay).await;
        }

        if self.check(|f| f.actions.contains(&package.title)) {
            return Err(FetchError::new(
                format!("{} '{}'", action.as_str(), package.title),
                "server reported failure",
            ));
        }

        if let Ok(mut performed) = self.performed.lock() {
            performed.push((package.title.clone(), action));
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
