//! Conflict records, manual resolutions and summaries

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Field name used for conflicts that concern the whole document.
pub const DOCUMENT_FIELD: &str = "$document";

/// Overall outcome classification of a merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictType {
    /// Local and remote were already identical.
    NoConflict,
    /// Every field was decided without human input.
    CleanMerge,
    /// At least one field needs attention.
    FieldConflict,
    /// The inputs were not mappings and could not be merged at all.
    TypeConflict,
}

/// How a recorded conflict was (or must be) settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resolution {
    /// Nothing was written for the field; a person has to choose.
    ManualRequired,
    /// The local value was kept pending review.
    LocalDefault,
    LocalWins,
    RemoteWins,
}

impl Resolution {
    pub fn is_manual(&self) -> bool {
        matches!(self, Resolution::ManualRequired)
    }
}

/// One divergence found during a merge. Absent values are `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conflict {
    pub field: String,
    pub base_value: Option<Value>,
    pub local_value: Option<Value>,
    pub remote_value: Option<Value>,
    pub reason: String,
    pub resolution: Resolution,
}

impl Conflict {
    pub fn new(
        field: impl Into<String>,
        base: Option<&Value>,
        local: Option<&Value>,
        remote: Option<&Value>,
        reason: impl Into<String>,
        resolution: Resolution,
    ) -> Self {
        Conflict {
            field: field.into(),
            base_value: base.cloned(),
            local_value: local.cloned(),
            remote_value: remote.cloned(),
            reason: reason.into(),
            resolution,
        }
    }
}

/// A person's decision on a conflict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManualResolution {
    pub field: String,
    pub base_value: Option<Value>,
    pub local_value: Option<Value>,
    pub remote_value: Option<Value>,
    pub chosen_value: Value,
    pub resolved_by: String,
    pub resolved_at: DateTime<Utc>,
    pub reason: String,
}

impl ManualResolution {
    pub const DEFAULT_REASON: &'static str = "Manual resolution";

    pub fn new(
        conflict: &Conflict,
        chosen_value: Value,
        user_id: &str,
        reason: Option<&str>,
    ) -> Self {
        ManualResolution {
            field: conflict.field.clone(),
            base_value: conflict.base_value.clone(),
            local_value: conflict.local_value.clone(),
            remote_value: conflict.remote_value.clone(),
            chosen_value,
            resolved_by: user_id.to_string(),
            resolved_at: Utc::now(),
            reason: reason.unwrap_or(Self::DEFAULT_REASON).to_string(),
        }
    }
}

/// Counts over a list of conflicts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictSummary {
    pub total_conflicts: usize,
    pub fields: Vec<String>,
    pub manual_required: usize,
    pub auto_resolved: usize,
}

impl ConflictSummary {
    pub fn from_conflicts(conflicts: &[Conflict]) -> Self {
        let manual_required = conflicts
            .iter()
            .filter(|c| c.resolution.is_manual())
            .count();
        ConflictSummary {
            total_conflicts: conflicts.len(),
            fields: conflicts.iter().map(|c| c.field.clone()).collect(),
            manual_required,
            auto_resolved: conflicts.len() - manual_required,
        }
    }
}
