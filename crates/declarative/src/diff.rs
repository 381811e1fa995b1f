//! Diff computation for planned changes

use crate::planner::{Action, Change, ExecutionPlan};
use crate::types::Value;
use std::collections::BTreeSet;

/// Change of a single attribute within a resource
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeChange {
    pub name: String,
    pub before: Option<Value>,
    pub after: Option<Value>,
}

/// List the attributes that differ between prior and planned state
pub fn attribute_changes(change: &Change) -> Vec<AttributeChange> {
    let empty = Default::default();
    let before = change.prior.as_ref().unwrap_or(&empty);
    let after = change.planned.as_ref().unwrap_or(&empty);

    let names: BTreeSet<&String> = before.keys().chain(after.keys()).collect();
    names
        .into_iter()
        .filter_map(|name| {
            let b = before.get(name).filter(|v| !v.is_null());
            let a = after.get(name).filter(|v| !v.is_null());
            (b != a).then(|| AttributeChange {
                name: name.clone(),
                before: b.cloned(),
                after: a.cloned(),
            })
        })
        .collect()
}

/// Diff summary statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiffSummary {
    pub additions: usize,
    pub removals: usize,
    pub modifications: usize,
}

impl DiffSummary {
    /// Create a summary from a plan
    pub fn from_plan(plan: &ExecutionPlan) -> Self {
        let mut summary = Self::default();
        for change in plan.pending() {
            match change.action {
                Action::Create => summary.additions += 1,
                Action::Delete => summary.removals += 1,
                Action::Update => summary.modifications += 1,
                Action::Read | Action::NoChange => {}
            }
        }
        summary
    }

    /// Total number of changes
    pub fn total(&self) -> usize {
        self.additions + self.removals + self.modifications
    }

    pub fn has_changes(&self) -> bool {
        self.total() > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Attributes;

    fn attrs(pairs: &[(&str, Value)]) -> Attributes {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_attribute_changes_update() {
        let change = Change {
            id: "github".into(),
            action: Action::Update,
            prior: Some(attrs(&[
                ("name", "github".into()),
                ("url", "https://old".into()),
                ("forward_headers", false.into()),
            ])),
            planned: Some(attrs(&[
                ("name", "github".into()),
                ("url", "https://new".into()),
                ("forward_headers", false.into()),
                ("additional_headers", Value::Null),
            ])),
        };

        let changes = attribute_changes(&change);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].name, "url");
        assert_eq!(changes[0].before, Some("https://old".into()));
        assert_eq!(changes[0].after, Some("https://new".into()));
    }

    #[test]
    fn test_attribute_changes_delete() {
        let change = Change {
            id: "github".into(),
            action: Action::Delete,
            prior: Some(attrs(&[("name", "github".into())])),
            planned: None,
        };
        let changes = attribute_changes(&change);
        assert_eq!(changes.len(), 1);
        assert!(changes[0].after.is_none());
    }

    #[test]
    fn test_summary_from_plan() {
        let plan = ExecutionPlan {
            changes: vec![
                Change {
                    id: "a".into(),
                    action: Action::Create,
                    prior: None,
                    planned: Some(Attributes::new()),
                },
                Change {
                    id: "b".into(),
                    action: Action::NoChange,
                    prior: Some(Attributes::new()),
                    planned: Some(Attributes::new()),
                },
                Change {
                    id: "c".into(),
                    action: Action::Delete,
                    prior: Some(Attributes::new()),
                    planned: None,
                },
            ],
            rejected: Vec::new(),
        };

        let summary = DiffSummary::from_plan(&plan);
        assert_eq!(summary.additions, 1);
        assert_eq!(summary.removals, 1);
        assert_eq!(summary.modifications, 0);
        assert_eq!(summary.total(), 2);
    }
}
