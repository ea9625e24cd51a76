//! Error types for nodepack with clear, actionable messages

use thiserror::Error;

use crate::lifecycle::{LifecycleState, PackageAction};

/// A node name pattern that is not a valid regular expression
#[derive(Error, Debug, Clone)]
#[error("Invalid node name pattern '{pattern}': {reason}")]
pub struct PatternError {
    /// The pattern as declared in the catalog
    pub pattern: String,
    /// Compiler diagnostic
    pub reason: String,
}

impl PatternError {
    pub(crate) fn new(pattern: &str, source: &regex::Error) -> Self {
        Self {
            pattern: pattern.to_string(),
            reason: source.to_string(),
        }
    }
}

/// Failure of an external fetch or package action
///
/// The reason carries the full context chain of the transport error so the
/// caller can show it verbatim.
#[derive(Error, Debug, Clone)]
#[error("Failed to {operation}: {reason}")]
pub struct FetchError {
    /// What was being attempted (e.g. "fetch node mappings")
    pub operation: String,
    /// Why it failed
    pub reason: String,
}

impl FetchError {
    pub fn new(operation: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self {
            operation: operation.into(),
            reason: reason.to_string(),
        }
    }

    /// Build from an `anyhow` error, keeping every context layer
    pub fn from_anyhow(operation: impl Into<String>, err: &anyhow::Error) -> Self {
        Self::new(operation, format!("{err:#}"))
    }
}

/// Main error type for nodepack operations
#[derive(Error, Debug)]
pub enum ManagerError {
    #[error(transparent)]
    Pattern(#[from] PatternError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// The requested action is not offered in the package's current state
    #[error("Cannot {action} '{title}': the package is {state}")]
    IllegalTransition {
        title: String,
        state: LifecycleState,
        action: PackageAction,
    },

    /// Another action for the same package has not completed yet
    #[error("An action for '{title}' is already in progress")]
    ActionInFlight { title: String },

    #[error("Package '{title}' not found in catalog")]
    UnknownPackage { title: String },

    #[error("Invalid package descriptor '{title}': {reason}")]
    InvalidDescriptor { title: String, reason: String },

    #[error("Cannot select '{title}' ({state}): the selection holds {target} packages")]
    Selection {
        title: String,
        state: LifecycleState,
        target: LifecycleState,
    },

    #[error("Failed to parse {what}: {source}")]
    Parse {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

pub type Result<T> = std::result::Result<T, ManagerError>;
