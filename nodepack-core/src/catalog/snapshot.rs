//! Catalog snapshot for one manager session
//!
//! The snapshot is the validated list of packages the server returned. It is
//! fetched fresh for every session and owned by that session until it ends.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashSet;
use tracing::{debug, warn};

use super::PackageDescriptor;
use crate::error::{ManagerError, Result};
use crate::lifecycle::LifecycleState;

/// Body of the `getlist` endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogResponse {
    /// Entries that fail to parse are skipped with a warning
    #[serde(deserialize_with = "lenient_packages")]
    pub custom_nodes: Vec<PackageDescriptor>,

    /// Channel the list came from, when the server reports it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
}

fn lenient_packages<'de, D>(deserializer: D) -> std::result::Result<Vec<PackageDescriptor>, D::Error>
where
    D: Deserializer<'de>,
{
    let entries = Vec::<serde_json::Value>::deserialize(deserializer)?;
    let total = entries.len();

    let packages: Vec<PackageDescriptor> = entries
        .into_iter()
        .enumerate()
        .filter_map(|(i, entry)| match serde_json::from_value(entry) {
            Ok(pkg) => Some(pkg),
            Err(e) => {
                warn!("Skipping catalog entry #{}: {}", i, e);
                None
            }
        })
        .collect();

    if packages.len() < total {
        debug!("Parsed {} of {} catalog entries", packages.len(), total);
    }
    Ok(packages)
}

impl CatalogResponse {
    pub fn from_json(content: &str) -> Result<Self> {
        serde_json::from_str(content).map_err(|source| ManagerError::Parse {
            what: "package catalog",
            source,
        })
    }
}

/// Validated, ordered package list
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    packages: Vec<PackageDescriptor>,
}

impl Catalog {
    /// Build a snapshot, dropping packages that break the descriptor invariants
    ///
    /// Invalid descriptors and repeated titles are skipped with a warning so
    /// one bad entry never hides the rest of the catalog.
    pub fn from_packages(packages: Vec<PackageDescriptor>) -> Self {
        let total = packages.len();
        let mut titles = HashSet::new();
        let mut kept = Vec::with_capacity(total);

        for pkg in packages {
            if let Err(e) = pkg.validate() {
                warn!("Dropping catalog entry: {}", e);
                continue;
            }
            if !titles.insert(pkg.title.clone()) {
                warn!("Dropping duplicate catalog entry '{}'", pkg.title);
                continue;
            }
            kept.push(pkg);
        }

        debug!("Catalog snapshot: kept {} of {} packages", kept.len(), total);
        Self { packages: kept }
    }

    pub fn packages(&self) -> &[PackageDescriptor] {
        &self.packages
    }

    pub fn get(&self, title: &str) -> Option<&PackageDescriptor> {
        self.packages.iter().find(|p| p.title == title)
    }

    pub(crate) fn get_mut(&mut self, title: &str) -> Option<&mut PackageDescriptor> {
        self.packages.iter_mut().find(|p| p.title == title)
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    /// Search by keyword and optionally by state
    ///
    /// The keyword matches case-insensitively against author, description
    /// and title; an empty keyword matches everything.
    pub fn search(&self, keyword: &str, state: Option<LifecycleState>) -> Vec<&PackageDescriptor> {
        search_packages(&self.packages, keyword, state)
    }

    /// Number of packages per state, in [`LifecycleState::ALL`] order
    pub fn state_counts(&self) -> Vec<(LifecycleState, usize)> {
        LifecycleState::ALL
            .iter()
            .map(|state| {
                let count = self.packages.iter().filter(|p| p.state == *state).count();
                (*state, count)
            })
            .collect()
    }
}

/// Keyword and state filter over any package slice
pub fn search_packages<'a>(
    packages: &'a [PackageDescriptor],
    keyword: &str,
    state: Option<LifecycleState>,
) -> Vec<&'a PackageDescriptor> {
    let keyword = keyword.trim().to_lowercase();

    packages
        .iter()
        .filter(|pkg| state.map_or(true, |s| pkg.state == s))
        .filter(|pkg| keyword.is_empty() || pkg.search_text().contains(&keyword))
        .collect()
}
