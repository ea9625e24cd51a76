//! Node mapping data (`getmappings`)
//!
//! The server keys the data by source, and every value is a list whose first
//! element holds the provided node names, followed by optional metadata:
//!
//! ```json
//! {
//!   "https://github.com/a/pack": [
//!     ["NodeFoo", "NodeBar"],
//!     {"title_aux": "Pack A"}
//!   ],
//!   "b.py": [{"NodeBaz": "NodeBaz"}]
//! }
//! ```
//!
//! The name set may be an array or an object whose values are names. Both
//! deserialize into [`SourceNames`], and source order is kept because later
//! sources win name collisions. A source with a malformed value is skipped
//! with a warning; the rest of the data is still used.

use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::fmt;
use tracing::warn;

use crate::error::{ManagerError, Result};

/// Node names provided by one source
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceNames {
    pub primary_names: Vec<String>,
}

/// Mapping data in server order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MappingData {
    entries: Vec<(String, SourceNames)>,
}

impl MappingData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the server's JSON
    pub fn from_json(content: &str) -> Result<Self> {
        serde_json::from_str(content).map_err(|source| ManagerError::Parse {
            what: "node mappings",
            source,
        })
    }

    /// Append a source entry
    ///
    /// A source inserted twice keeps both entries; the later one wins when
    /// the index is built.
    pub fn insert<I, S>(&mut self, source: &str, names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.entries.push((
            source.to_string(),
            SourceNames {
                primary_names: names.into_iter().map(Into::into).collect(),
            },
        ));
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SourceNames)> {
        self.entries.iter().map(|(s, n)| (s.as_str(), n))
    }

    pub fn source_count(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl SourceNames {
    /// Read one source's value: `[names, metadata...]`
    ///
    /// Returns `None` when the value has the wrong shape. Names that are not
    /// strings are skipped.
    fn from_value(source: &str, value: Value) -> Option<Self> {
        let Value::Array(items) = value else {
            warn!("Skipping mappings for '{}': value is not a list", source);
            return None;
        };

        let names = match items.into_iter().next() {
            None => Vec::new(),
            Some(Value::Array(names)) => names,
            // Values are the names; keys are only positions
            Some(Value::Object(names)) => names.into_iter().map(|(_, v)| v).collect(),
            Some(other) => {
                warn!(
                    "Skipping mappings for '{}': expected an array or object of names, got {}",
                    source, other
                );
                return None;
            }
        };

        let mut primary_names = Vec::with_capacity(names.len());
        for name in names {
            match name {
                Value::String(name) => primary_names.push(name),
                other => warn!("Ignoring non-string node name {} in '{}'", other, source),
            }
        }

        Some(Self { primary_names })
    }
}

impl<'de> Deserialize<'de> for MappingData {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct MappingDataVisitor;

        impl<'de> Visitor<'de> for MappingDataVisitor {
            type Value = MappingData;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a map from source to [names, metadata]")
            }

            fn visit_map<M>(self, mut map: M) -> std::result::Result<Self::Value, M::Error>
            where
                M: MapAccess<'de>,
            {
                // Each source is read as a raw value so one malformed entry
                // only drops that source
                let mut data = MappingData::new();
                while let Some((source, value)) = map.next_entry::<String, Value>()? {
                    if let Some(names) = SourceNames::from_value(&source, value) {
                        data.entries.push((source, names));
                    }
                }
                Ok(data)
            }
        }

        deserializer.deserialize_map(MappingDataVisitor)
    }
}
