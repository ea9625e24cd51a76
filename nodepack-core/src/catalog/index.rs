//! Node type → source lookup
//!
//! Combines the exact names from the mapping data with the name patterns
//! declared in the catalog. Exact names always win; patterns are tried in
//! catalog order, so when several patterns match the same node type the
//! earliest catalog entry wins. That ordering is whatever the caller passes
//! in and should not be relied on as a stable contract.

use std::collections::HashMap;
use tracing::{debug, warn};

use super::{MappingData, NodePattern, PackageDescriptor};
use crate::error::PatternError;

/// Two sources declared the same exact node name
///
/// The later source wins; the earlier one is remembered for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AmbiguousMappingWarning {
    pub node_type: String,
    pub overwritten: String,
    pub winner: String,
}

/// Lookup structures built from one catalog snapshot and its mapping data
#[derive(Debug, Default)]
pub struct MappingIndex {
    name_to_source: HashMap<String, String>,
    pattern_to_source: Vec<(NodePattern, String)>,
    pattern_errors: Vec<PatternError>,
    ambiguities: Vec<AmbiguousMappingWarning>,
}

impl MappingIndex {
    /// Build the index
    ///
    /// Never fails: packages with a broken pattern keep their exact-name
    /// mappings and the pattern is recorded in [`MappingIndex::pattern_errors`].
    pub fn build(catalog: &[PackageDescriptor], mappings: &MappingData) -> Self {
        let mut index = Self::default();

        for pkg in catalog {
            let Some(compiled) = pkg.compile_pattern() else {
                continue;
            };
            let Some(source) = pkg.primary_source() else {
                continue;
            };

            match compiled {
                Ok(pattern) => index.pattern_to_source.push((pattern, source.to_string())),
                Err(e) => {
                    warn!("Skipping node name pattern of '{}': {}", pkg.title, e);
                    index.pattern_errors.push(e);
                }
            }
        }

        for (source, names) in mappings.iter() {
            for name in &names.primary_names {
                index.insert_name(name, source);
            }
        }

        debug!(
            "Built mapping index: {} names, {} patterns, {} pattern errors, {} ambiguous names",
            index.name_to_source.len(),
            index.pattern_to_source.len(),
            index.pattern_errors.len(),
            index.ambiguities.len()
        );

        index
    }

    fn insert_name(&mut self, name: &str, source: &str) {
        if let Some(previous) = self
            .name_to_source
            .insert(name.to_string(), source.to_string())
        {
            if previous != source {
                warn!(
                    "Node '{}' is declared by both '{}' and '{}'; using '{}'",
                    name, previous, source, source
                );
                self.ambiguities.push(AmbiguousMappingWarning {
                    node_type: name.to_string(),
                    overwritten: previous,
                    winner: source.to_string(),
                });
            }
        }
    }

    /// Find the source providing `node_type`
    pub fn resolve(&self, node_type: &str) -> Option<&str> {
        self.exact_source(node_type).or_else(|| {
            self.pattern_to_source
                .iter()
                .find(|(pattern, _)| pattern.matches(node_type))
                .map(|(_, source)| source.as_str())
        })
    }

    /// Exact-name lookup only
    pub fn exact_source(&self, node_type: &str) -> Option<&str> {
        self.name_to_source.get(node_type.trim()).map(|s| s.as_str())
    }

    pub fn pattern_errors(&self) -> &[PatternError] {
        &self.pattern_errors
    }

    pub fn ambiguities(&self) -> &[AmbiguousMappingWarning] {
        &self.ambiguities
    }

    pub fn name_count(&self) -> usize {
        self.name_to_source.len()
    }

    pub fn pattern_count(&self) -> usize {
        self.pattern_to_source.len()
    }
}
