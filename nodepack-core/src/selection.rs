//! Multi-select coordination for batch actions
//!
//! Batch actions run one action over every selected package, so all
//! selected packages must share a lifecycle state. The first checked
//! package fixes that target state; rows in any other state are disabled
//! until the selection is cleared again.

use std::collections::BTreeSet;

use crate::catalog::PackageDescriptor;
use crate::error::{ManagerError, Result};
use crate::lifecycle::{ActionSet, LifecycleState};

/// The checked packages, in display order, and their shared state
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionSet {
    pub titles: Vec<String>,
    pub target_state: Option<LifecycleState>,
}

impl SelectionSet {
    pub fn is_empty(&self) -> bool {
        self.titles.is_empty()
    }

    pub fn len(&self) -> usize {
        self.titles.len()
    }

    pub fn contains(&self, title: &str) -> bool {
        self.titles.iter().any(|t| t == title)
    }
}

#[derive(Debug, Clone)]
struct Row {
    title: String,
    state: LifecycleState,
}

/// Selection model over the currently displayed packages
///
/// Presentation reads checkbox and button state from here and never the
/// other way round.
#[derive(Debug, Clone, Default)]
pub struct SelectionCoordinator {
    rows: Vec<Row>,
    selected: BTreeSet<usize>,
    target_state: Option<LifecycleState>,
}

impl SelectionCoordinator {
    pub fn new<'a, I>(packages: I) -> Self
    where
        I: IntoIterator<Item = &'a PackageDescriptor>,
    {
        Self {
            rows: packages
                .into_iter()
                .map(|p| Row {
                    title: p.title.clone(),
                    state: p.state,
                })
                .collect(),
            selected: BTreeSet::new(),
            target_state: None,
        }
    }

    fn position(&self, title: &str) -> Result<usize> {
        self.rows
            .iter()
            .position(|r| r.title == title)
            .ok_or_else(|| ManagerError::UnknownPackage {
                title: title.to_string(),
            })
    }

    /// Check or uncheck one package
    ///
    /// Checking a package whose state differs from the target state fails
    /// and leaves the selection as it was.
    pub fn apply_selection(&mut self, title: &str, checked: bool) -> Result<SelectionSet> {
        let pos = self.position(title)?;
        let state = self.rows[pos].state;

        if checked {
            match self.target_state {
                Some(target) if target != state => {
                    return Err(ManagerError::Selection {
                        title: title.to_string(),
                        state,
                        target,
                    });
                }
                Some(_) => {}
                None => self.target_state = Some(state),
            }
            self.selected.insert(pos);
        } else {
            self.selected.remove(&pos);
            if self.selected.is_empty() {
                self.target_state = None;
            }
        }

        Ok(self.selection())
    }

    /// Toggle the group-level "select all" control
    ///
    /// Checking selects every package in the target state and does nothing
    /// while no selection is active. Unchecking clears the selection.
    pub fn select_all(&mut self, checked: bool) -> SelectionSet {
        if checked {
            if let Some(target) = self.target_state {
                self.selected = self
                    .rows
                    .iter()
                    .enumerate()
                    .filter(|(_, r)| r.state == target)
                    .map(|(i, _)| i)
                    .collect();
            }
        } else {
            self.clear();
        }

        self.selection()
    }

    pub fn clear(&mut self) {
        self.selected.clear();
        self.target_state = None;
    }

    pub fn selection(&self) -> SelectionSet {
        SelectionSet {
            titles: self
                .selected
                .iter()
                .map(|&i| self.rows[i].title.clone())
                .collect(),
            target_state: self.target_state,
        }
    }

    pub fn target_state(&self) -> Option<LifecycleState> {
        self.target_state
    }

    /// Whether a package's checkbox and buttons are usable
    pub fn is_enabled(&self, title: &str) -> bool {
        match (self.target_state, self.rows.iter().find(|r| r.title == title)) {
            (_, None) => false,
            (None, Some(_)) => true,
            (Some(target), Some(row)) => row.state == target,
        }
    }

    pub fn is_selected(&self, title: &str) -> bool {
        self.position(title)
            .map(|pos| self.selected.contains(&pos))
            .unwrap_or(false)
    }

    /// The "select all" control is only usable while a selection is active
    pub fn select_all_enabled(&self) -> bool {
        self.target_state.is_some()
    }

    /// Whether every package in the target state is selected
    pub fn select_all_checked(&self) -> bool {
        match self.target_state {
            None => false,
            Some(target) => self
                .rows
                .iter()
                .enumerate()
                .filter(|(_, r)| r.state == target)
                .all(|(i, _)| self.selected.contains(&i)),
        }
    }

    /// Actions that can run over the whole selection, `None` when it is empty
    pub fn batch_actions(&self) -> Option<ActionSet> {
        if self.selected.is_empty() {
            return None;
        }
        self.target_state.map(|s| s.allowed_actions())
    }

    /// Record a package's new state after a completed action
    ///
    /// A package whose state changed leaves the selection, since it no
    /// longer shares the target state.
    pub fn update_state(&mut self, title: &str, state: LifecycleState) -> Result<SelectionSet> {
        let pos = self.position(title)?;
        if self.rows[pos].state != state {
            self.rows[pos].state = state;
            self.selected.remove(&pos);
            if self.selected.is_empty() {
                self.target_state = None;
            }
        }
        Ok(self.selection())
    }
}
