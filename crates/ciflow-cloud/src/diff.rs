//! Resource-level diff between two synthesized templates

use crate::synth::Template;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A change to one template resource
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Change {
    /// Logical ID of the resource
    pub logical_id: String,

    /// Type of change
    pub change_type: ChangeType,

    /// Resource type (e.g., "AWS::CodeBuild::Project")
    pub resource_type: String,

    /// Top-level properties whose values differ (updates only)
    #[serde(default)]
    pub changed_properties: Vec<String>,
}

/// Type of change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeType {
    /// Resource only exists in the new template
    Create,
    /// Resource exists in both with different definitions
    Update,
    /// Resource only exists in the old template
    Delete,
    /// No changes needed
    NoOp,
}

impl std::fmt::Display for ChangeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChangeType::Create => write!(f, "create"),
            ChangeType::Update => write!(f, "update"),
            ChangeType::Delete => write!(f, "delete"),
            ChangeType::NoOp => write!(f, "no-op"),
        }
    }
}

/// All changes between two templates, ordered by logical ID
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeSet {
    pub changes: Vec<Change>,

    /// Whether any change is not a no-op
    pub has_changes: bool,
}

impl ChangeSet {
    pub fn new(changes: Vec<Change>) -> Self {
        let has_changes = changes.iter().any(|c| c.change_type != ChangeType::NoOp);
        Self {
            changes,
            has_changes,
        }
    }

    /// Get changes by type
    pub fn changes_by_type(&self, change_type: ChangeType) -> Vec<&Change> {
        self.changes
            .iter()
            .filter(|c| c.change_type == change_type)
            .collect()
    }

    /// Summary of the change set
    pub fn summary(&self) -> ChangeSummary {
        ChangeSummary {
            create: self.changes_by_type(ChangeType::Create).len(),
            update: self.changes_by_type(ChangeType::Update).len(),
            delete: self.changes_by_type(ChangeType::Delete).len(),
            no_change: self.changes_by_type(ChangeType::NoOp).len(),
        }
    }
}

/// Summary of a change set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeSummary {
    pub create: usize,
    pub update: usize,
    pub delete: usize,
    pub no_change: usize,
}

impl std::fmt::Display for ChangeSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} to create, {} to update, {} to delete, {} unchanged",
            self.create, self.update, self.delete, self.no_change
        )
    }
}

fn changed_properties(old: &serde_json::Value, new: &serde_json::Value) -> Vec<String> {
    let keys = |v: &serde_json::Value| -> BTreeSet<String> {
        v.as_object()
            .map(|o| o.keys().cloned().collect())
            .unwrap_or_default()
    };
    let mut all = keys(old);
    all.extend(keys(new));

    all.into_iter()
        .filter(|k| old.get(k) != new.get(k))
        .collect()
}

/// Compare a previously stored template against a freshly synthesized one
///
/// `old` is `None` when nothing has been synthesized yet, in which case every
/// resource is a create.
pub fn diff(old: Option<&Template>, new: &Template) -> ChangeSet {
    let empty = Template::new("");
    let old = old.unwrap_or(&empty);

    let ids: BTreeSet<&String> = old.resources.keys().chain(new.resources.keys()).collect();
    let changes = ids
        .into_iter()
        .filter_map(|id| match (old.resources.get(id), new.resources.get(id)) {
            (None, Some(added)) => Some(Change {
                logical_id: id.clone(),
                change_type: ChangeType::Create,
                resource_type: added.resource_type.clone(),
                changed_properties: Vec::new(),
            }),
            (Some(removed), None) => Some(Change {
                logical_id: id.clone(),
                change_type: ChangeType::Delete,
                resource_type: removed.resource_type.clone(),
                changed_properties: Vec::new(),
            }),
            (Some(before), Some(after)) if before == after => Some(Change {
                logical_id: id.clone(),
                change_type: ChangeType::NoOp,
                resource_type: after.resource_type.clone(),
                changed_properties: Vec::new(),
            }),
            (Some(before), Some(after)) => {
                let mut props = changed_properties(&before.properties, &after.properties);
                if before.resource_type != after.resource_type {
                    props.insert(0, "Type".to_string());
                }
                if before.depends_on != after.depends_on {
                    props.push("DependsOn".to_string());
                }
                Some(Change {
                    logical_id: id.clone(),
                    change_type: ChangeType::Update,
                    resource_type: after.resource_type.clone(),
                    changed_properties: props,
                })
            }
            (None, None) => None,
        })
        .collect();

    ChangeSet::new(changes)
}
