//! Missing node resolution
//!
//! Works out which catalog packages a graph needs:
//!
//! 1. Build a [`MappingIndex`] from the catalog and mapping data
//! 2. Unresolved = graph node types the registry doesn't know, plus the
//!    node types left unresolved inside components
//! 3. Resolve each unresolved type to a source
//! 4. Keep the catalog packages that own any of those sources
//!
//! Resolution is pure: the catalog is only read, and the same inputs always
//! produce the same output.

use std::collections::{BTreeSet, HashSet};
use tracing::debug;

use crate::catalog::{AmbiguousMappingWarning, MappingData, MappingIndex, PackageDescriptor};
use crate::error::PatternError;
use crate::graph::ResolvedNodeRegistry;

/// Full outcome of one resolution run
#[derive(Debug, Clone)]
pub struct Resolution<'a> {
    /// Packages to offer, in catalog order
    pub packages: Vec<&'a PackageDescriptor>,

    /// Node types the host cannot instantiate
    pub unresolved: BTreeSet<String>,

    /// Sources that would provide unresolved node types
    pub missing_sources: BTreeSet<String>,

    /// Unresolved node types no catalog package provides
    pub unprovided: BTreeSet<String>,

    pub pattern_errors: Vec<PatternError>,
    pub ambiguities: Vec<AmbiguousMappingWarning>,
}

impl Resolution<'_> {
    fn empty() -> Self {
        Self {
            packages: Vec::new(),
            unresolved: BTreeSet::new(),
            missing_sources: BTreeSet::new(),
            unprovided: BTreeSet::new(),
            pattern_errors: Vec::new(),
            ambiguities: Vec::new(),
        }
    }
}

/// Node types that need a package
///
/// A type present in the registry is never part of the result, except when
/// the host separately reports it as unresolved inside a component.
pub fn unresolved_set(
    graph_node_types: &BTreeSet<String>,
    registry: &ResolvedNodeRegistry,
    unresolved_component_node_types: &[String],
) -> BTreeSet<String> {
    graph_node_types
        .iter()
        .filter(|t| !registry.contains(t))
        .cloned()
        .chain(unresolved_component_node_types.iter().cloned())
        .collect()
}

/// Packages that would resolve every unresolved node in the graph
pub fn filter_missing<'a>(
    catalog: &'a [PackageDescriptor],
    mappings: &MappingData,
    graph_node_types: &BTreeSet<String>,
    registry: &ResolvedNodeRegistry,
    unresolved_component_node_types: &[String],
) -> Vec<&'a PackageDescriptor> {
    resolve_missing(
        catalog,
        mappings,
        graph_node_types,
        registry,
        unresolved_component_node_types,
    )
    .packages
}

/// Like [`filter_missing`], but keeps the intermediate sets and diagnostics
pub fn resolve_missing<'a>(
    catalog: &'a [PackageDescriptor],
    mappings: &MappingData,
    graph_node_types: &BTreeSet<String>,
    registry: &ResolvedNodeRegistry,
    unresolved_component_node_types: &[String],
) -> Resolution<'a> {
    // A graph without nodes has no components either
    if graph_node_types.is_empty() {
        return Resolution::empty();
    }

    let index = MappingIndex::build(catalog, mappings);
    let unresolved = unresolved_set(graph_node_types, registry, unresolved_component_node_types);

    let mut missing_sources = BTreeSet::new();
    let mut unprovided = BTreeSet::new();
    for node_type in &unresolved {
        match index.resolve(node_type) {
            Some(source) => {
                missing_sources.insert(source.to_string());
            }
            None => {
                unprovided.insert(node_type.clone());
            }
        }
    }

    let wanted: HashSet<&str> = missing_sources.iter().map(|s| s.as_str()).collect();
    let packages: Vec<_> = catalog
        .iter()
        .filter(|pkg| pkg.files.iter().any(|f| wanted.contains(f.as_str())))
        .collect();

    debug!(
        "Resolved {} unresolved node types to {} sources ({} without provider), {} packages",
        unresolved.len(),
        missing_sources.len(),
        unprovided.len(),
        packages.len()
    );

    Resolution {
        packages,
        unresolved,
        missing_sources,
        unprovided,
        pattern_errors: index.pattern_errors().to_vec(),
        ambiguities: index.ambiguities().to_vec(),
    }
}
