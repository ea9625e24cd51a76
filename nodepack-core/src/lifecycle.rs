//! Package lifecycle state machine
//!
//! Every catalog package is in exactly one [`LifecycleState`]. The only way
//! to move between states is a [`PackageAction`] that the backend reported as
//! completed; failures never change the state.
//!
//! ```text
//!  NotInstalled ──install──▶ Installed ◀──enable── Disabled
//!       ▲                     │  │                  ▲  │
//!       │                     │  └─────disable──────┘  │
//!       └──────uninstall──────┴────────────────────────┘
//!
//!  UpdateAvailable ──update──▶ Installed
//!  UpdateAvailable ──disable─▶ Disabled
//!  UpdateAvailable ──uninstall▶ NotInstalled
//!  Unknown ──try install──▶ Installed
//! ```

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeSet;
use std::fmt;

use crate::error::{ManagerError, Result};

/// Installation status of a package as reported by the manager server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LifecycleState {
    NotInstalled,
    Installed,
    Disabled,
    UpdateAvailable,
    /// The server could not determine the status
    Unknown,
}

impl LifecycleState {
    /// All states in display order
    pub const ALL: [LifecycleState; 5] = [
        LifecycleState::NotInstalled,
        LifecycleState::Installed,
        LifecycleState::Disabled,
        LifecycleState::UpdateAvailable,
        LifecycleState::Unknown,
    ];

    /// Parse the server's `installed` field
    ///
    /// Unrecognized values fall back to [`LifecycleState::Unknown`].
    pub fn from_wire(value: &str) -> Self {
        match value {
            "False" => LifecycleState::NotInstalled,
            "True" => LifecycleState::Installed,
            "Disabled" => LifecycleState::Disabled,
            "Update" => LifecycleState::UpdateAvailable,
            _ => LifecycleState::Unknown,
        }
    }

    /// The server's spelling of this state
    pub fn as_wire(&self) -> &'static str {
        match self {
            LifecycleState::NotInstalled => "False",
            LifecycleState::Installed => "True",
            LifecycleState::Disabled => "Disabled",
            LifecycleState::UpdateAvailable => "Update",
            LifecycleState::Unknown => "None",
        }
    }

    /// Parse a user-facing filter name (`installed`, `not-installed`, ...)
    pub fn from_filter_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "not-installed" | "not_installed" | "notinstalled" => Some(LifecycleState::NotInstalled),
            "installed" => Some(LifecycleState::Installed),
            "disabled" => Some(LifecycleState::Disabled),
            "update" | "update-available" => Some(LifecycleState::UpdateAvailable),
            "unknown" => Some(LifecycleState::Unknown),
            _ => None,
        }
    }

    /// Actions exposed for a package in this state
    pub fn allowed_actions(&self) -> ActionSet {
        use PackageAction::*;
        match self {
            LifecycleState::NotInstalled => ActionSet::new(Install, &[]),
            LifecycleState::Installed => ActionSet::new(Uninstall, &[Disable]),
            LifecycleState::Disabled => ActionSet::new(Uninstall, &[Enable]),
            LifecycleState::UpdateAvailable => ActionSet::new(Uninstall, &[Update, Disable]),
            LifecycleState::Unknown => ActionSet::new(TryInstall, &[]),
        }
    }

    /// State after `action` completes successfully
    ///
    /// Rejects every pair that is not in the allowed-action table.
    pub fn transition(&self, title: &str, action: PackageAction) -> Result<LifecycleState> {
        if !self.allowed_actions().contains(action) {
            return Err(ManagerError::IllegalTransition {
                title: title.to_string(),
                state: *self,
                action,
            });
        }

        Ok(match action {
            PackageAction::Install
            | PackageAction::TryInstall
            | PackageAction::Update
            | PackageAction::Enable => LifecycleState::Installed,
            PackageAction::Disable => LifecycleState::Disabled,
            PackageAction::Uninstall => LifecycleState::NotInstalled,
        })
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LifecycleState::NotInstalled => "not installed",
            LifecycleState::Installed => "installed",
            LifecycleState::Disabled => "disabled",
            LifecycleState::UpdateAvailable => "update available",
            LifecycleState::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

impl Serialize for LifecycleState {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_wire())
    }
}

impl<'de> Deserialize<'de> for LifecycleState {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        // The server sometimes sends null or a bool; anything odd is Unknown
        let value = serde_json::Value::deserialize(deserializer)?;
        Ok(match value {
            serde_json::Value::String(s) => LifecycleState::from_wire(&s),
            serde_json::Value::Bool(true) => LifecycleState::Installed,
            serde_json::Value::Bool(false) => LifecycleState::NotInstalled,
            _ => LifecycleState::Unknown,
        })
    }
}

/// A user-initiated action on a package
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PackageAction {
    Install,
    /// Best-effort install for a package whose status is unknown
    TryInstall,
    Uninstall,
    Update,
    Enable,
    Disable,
}

impl PackageAction {
    /// The request the backend has to execute for this action
    pub fn backend_action(&self) -> BackendAction {
        match self {
            PackageAction::Install | PackageAction::TryInstall => BackendAction::Install,
            PackageAction::Uninstall => BackendAction::Uninstall,
            PackageAction::Update => BackendAction::Update,
            PackageAction::Enable | PackageAction::Disable => BackendAction::ToggleActive,
        }
    }

    /// Whether the presentation layer must ask the user before running this
    pub fn requires_confirmation(&self) -> bool {
        matches!(self, PackageAction::Uninstall)
    }

    /// Button label
    pub fn label(&self) -> &'static str {
        match self {
            PackageAction::Install => "Install",
            PackageAction::TryInstall => "Try Install",
            PackageAction::Uninstall => "Uninstall",
            PackageAction::Update => "Update",
            PackageAction::Enable => "Enable",
            PackageAction::Disable => "Disable",
        }
    }
}

impl fmt::Display for PackageAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label().to_lowercase())
    }
}

/// Operations understood by the manager server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendAction {
    Install,
    Uninstall,
    Update,
    ToggleActive,
}

impl BackendAction {
    /// Endpoint path segment
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendAction::Install => "install",
            BackendAction::Uninstall => "uninstall",
            BackendAction::Update => "update",
            BackendAction::ToggleActive => "toggle_active",
        }
    }
}

/// The controls a package row exposes: one primary button and any secondary ones
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionSet {
    pub primary: PackageAction,
    pub secondary: &'static [PackageAction],
}

impl ActionSet {
    const fn new(primary: PackageAction, secondary: &'static [PackageAction]) -> Self {
        Self { primary, secondary }
    }

    pub fn contains(&self, action: PackageAction) -> bool {
        self.primary == action || self.secondary.contains(&action)
    }

    /// Primary action first, then secondaries in table order
    pub fn iter(&self) -> impl Iterator<Item = PackageAction> + '_ {
        std::iter::once(self.primary).chain(self.secondary.iter().copied())
    }

    pub fn to_set(&self) -> BTreeSet<PackageAction> {
        self.iter().collect()
    }
}
