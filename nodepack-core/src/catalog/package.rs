//! Package descriptors as served by the manager's `getlist` endpoint

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashSet;

use super::NodePattern;
use crate::error::{ManagerError, PatternError, Result};
use crate::lifecycle::LifecycleState;

/// One installable node package
///
/// Fields the manager server sends that are not named here (`pip`,
/// `id`, ...) are kept in `extra` and posted back unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageDescriptor {
    /// Unique package title
    pub title: String,

    #[serde(default, deserialize_with = "null_as_empty")]
    pub author: String,

    #[serde(default, deserialize_with = "null_as_empty")]
    pub description: String,

    /// Homepage or repository URL
    #[serde(default, deserialize_with = "null_as_empty")]
    pub reference: String,

    /// Provided file identifiers (sources), in declaration order
    ///
    /// Missing on the wire means empty, which [`PackageDescriptor::validate`]
    /// rejects.
    #[serde(default)]
    pub files: Vec<String>,

    /// Regex matching the node types this package provides
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nodename_pattern: Option<String>,

    /// Installation status
    #[serde(rename = "installed", default = "unknown_state")]
    pub state: LifecycleState,

    /// How the server installs this package (git-clone, copy, unzip)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub install_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub js_path: Option<String>,

    /// Server fields not modeled above
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

fn unknown_state() -> LifecycleState {
    LifecycleState::Unknown
}

fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

impl PackageDescriptor {
    /// Create a descriptor with just a title and its files
    pub fn new(title: &str, files: &[&str]) -> Self {
        Self {
            title: title.to_string(),
            author: String::new(),
            description: String::new(),
            reference: String::new(),
            files: files.iter().map(|f| f.to_string()).collect(),
            nodename_pattern: None,
            state: LifecycleState::NotInstalled,
            install_type: None,
            js_path: None,
            extra: serde_json::Map::new(),
        }
    }

    pub fn with_pattern(mut self, pattern: &str) -> Self {
        self.nodename_pattern = Some(pattern.to_string());
        self
    }

    pub fn with_state(mut self, state: LifecycleState) -> Self {
        self.state = state;
        self
    }

    /// The source a node name pattern resolves to
    pub fn primary_source(&self) -> Option<&str> {
        self.files.first().map(|s| s.as_str())
    }

    /// The declared pattern, if any and not blank
    pub fn pattern(&self) -> Option<&str> {
        self.nodename_pattern
            .as_deref()
            .filter(|p| !p.trim().is_empty())
    }

    /// Compile the declared pattern
    pub fn compile_pattern(&self) -> Option<std::result::Result<NodePattern, PatternError>> {
        self.pattern().map(NodePattern::compile)
    }

    pub fn provides_any<'a, I>(&self, sources: I) -> bool
    where
        I: IntoIterator<Item = &'a str>,
    {
        let wanted: HashSet<&str> = sources.into_iter().collect();
        self.files.iter().any(|f| wanted.contains(f.as_str()))
    }

    /// Check the file identifier invariants
    ///
    /// The pattern is checked separately by the mapping index, which skips a
    /// broken pattern instead of dropping the whole package.
    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(self.invalid("title is empty"));
        }

        if self.files.is_empty() {
            return Err(self.invalid("no files declared"));
        }

        let mut seen = HashSet::new();
        for file in &self.files {
            if file.trim().is_empty() {
                return Err(self.invalid("empty file identifier"));
            }
            if !seen.insert(file.as_str()) {
                return Err(self.invalid(&format!("duplicate file '{file}'")));
            }
        }

        Ok(())
    }

    /// Lowercased text the keyword search runs against
    pub(crate) fn search_text(&self) -> String {
        format!("{}{}{}", self.author, self.description, self.title).to_lowercase()
    }

    fn invalid(&self, reason: &str) -> ManagerError {
        ManagerError::InvalidDescriptor {
            title: self.title.clone(),
            reason: reason.to_string(),
        }
    }
}
