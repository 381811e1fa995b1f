//! Execution planner - decides which lifecycle call each resource needs

use crate::resource::ResourceHandler;
use crate::types::{Attributes, Diagnostics};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Lifecycle call selected for a resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    Create,
    Read,
    Update,
    Delete,
    NoChange,
}

impl Action {
    /// Symbol used when displaying a plan
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Create => "+",
            Self::Update => "~",
            Self::Delete => "-",
            Self::Read => "<=",
            Self::NoChange => " ",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Create => "create",
            Self::Read => "read",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::NoChange => "no change",
        };
        write!(f, "{s}")
    }
}

/// A single planned change
#[derive(Debug, Clone, PartialEq)]
pub struct Change {
    /// Resource identifier (unique within its type)
    pub id: String,
    pub action: Action,
    /// State before the change, if the resource is known
    pub prior: Option<Attributes>,
    /// Attributes after the change, `None` for deletions
    pub planned: Option<Attributes>,
}

/// An execution plan for one resource type
#[derive(Debug, Default)]
pub struct ExecutionPlan {
    pub changes: Vec<Change>,
    /// Resources whose proposed attributes were rejected by the plan step
    pub rejected: Vec<(String, Diagnostics)>,
}

impl ExecutionPlan {
    /// Create a new empty plan
    pub fn new() -> Self {
        Self::default()
    }

    /// Compare desired resources with the current state
    ///
    /// Resources only in `desired` are created, resources only in `current`
    /// are deleted, and resources in both are updated when the planned
    /// attributes differ from the stored ones.
    pub fn build(
        handler: &dyn ResourceHandler,
        desired: &BTreeMap<String, Attributes>,
        current: &BTreeMap<String, Attributes>,
    ) -> Self {
        let mut plan = Self::new();

        for (id, proposed) in desired {
            let prior = current.get(id);
            let response = handler.plan(prior, proposed);
            if response.diagnostics.has_errors() {
                plan.rejected.push((id.clone(), response.diagnostics));
                continue;
            }

            let action = match prior {
                None => Action::Create,
                Some(p) if *p != response.planned => Action::Update,
                Some(_) => Action::NoChange,
            };
            plan.changes.push(Change {
                id: id.clone(),
                action,
                prior: prior.cloned(),
                planned: Some(response.planned),
            });
        }

        for (id, prior) in current {
            if !desired.contains_key(id) {
                plan.changes.push(Change {
                    id: id.clone(),
                    action: Action::Delete,
                    prior: Some(prior.clone()),
                    planned: None,
                });
            }
        }

        plan
    }

    /// Plan that deletes every resource in `current`
    pub fn destroy(current: &BTreeMap<String, Attributes>) -> Self {
        Self {
            changes: current
                .iter()
                .map(|(id, prior)| Change {
                    id: id.clone(),
                    action: Action::Delete,
                    prior: Some(prior.clone()),
                    planned: None,
                })
                .collect(),
            rejected: Vec::new(),
        }
    }

    /// Keep only changes whose id matches the target
    pub fn filter_by_target(self, target: Option<&str>) -> Self {
        match target {
            None => self,
            Some(t) => Self {
                changes: self.changes.into_iter().filter(|c| c.id == t).collect(),
                rejected: self.rejected.into_iter().filter(|(id, _)| id == t).collect(),
            },
        }
    }

    /// Changes that require a lifecycle call
    pub fn pending(&self) -> impl Iterator<Item = &Change> {
        self.changes.iter().filter(|c| c.action != Action::NoChange)
    }

    pub fn has_changes(&self) -> bool {
        self.pending().next().is_some()
    }

    pub fn is_valid(&self) -> bool {
        self.rejected.is_empty()
    }
}
