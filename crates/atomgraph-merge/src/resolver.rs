//! Three-version conflict resolver

use crate::conflict::{
    Conflict, ConflictSummary, ConflictType, DOCUMENT_FIELD, ManualResolution, Resolution,
};
use crate::strategy::{MergeError, MergeStrategy};
use crate::structural::auto_merge;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeSet;

/// One version of an atom record: a mapping of field names to values.
pub type Record = Map<String, Value>;

/// Optional hints for `last_write_wins`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeMetadata {
    /// ISO-8601 modification time of the local version.
    pub local_timestamp: Option<String>,
    /// ISO-8601 modification time of the remote version.
    pub remote_timestamp: Option<String>,
}

impl MergeMetadata {
    pub fn new(local_timestamp: impl Into<String>, remote_timestamp: impl Into<String>) -> Self {
        Self {
            local_timestamp: Some(local_timestamp.into()),
            remote_timestamp: Some(remote_timestamp.into()),
        }
    }
}

/// Outcome of a single merge call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergeResult {
    pub success: bool,
    pub merged_data: Record,
    pub conflicts: Vec<Conflict>,
    pub conflict_type: ConflictType,
    /// Fields left out of `merged_data` until someone resolves them.
    pub unresolved_fields: Vec<String>,
    pub strategy: MergeStrategy,
    pub timestamp: DateTime<Utc>,
}

impl MergeResult {
    fn new(strategy: MergeStrategy) -> Self {
        Self {
            success: true,
            merged_data: Record::new(),
            conflicts: Vec::new(),
            conflict_type: ConflictType::CleanMerge,
            unresolved_fields: Vec::new(),
            strategy,
            timestamp: Utc::now(),
        }
    }

    /// True when `field` had no automatic resolution and is absent from
    /// `merged_data` for that reason (as opposed to being deleted).
    pub fn is_unresolved(&self, field: &str) -> bool {
        self.unresolved_fields.iter().any(|f| f == field)
    }

    pub fn summary(&self) -> ConflictSummary {
        ConflictSummary::from_conflicts(&self.conflicts)
    }

    fn settle(mut self) -> Self {
        self.success = self.conflicts.is_empty();
        self.conflict_type = if self.success {
            ConflictType::CleanMerge
        } else {
            ConflictType::FieldConflict
        };
        self
    }
}

/// Stateless resolver; one instance can serve any number of merges.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConflictResolver;

impl ConflictResolver {
    pub fn new() -> Self {
        Self
    }

    /// Merge three versions of a record under `strategy`.
    ///
    /// Never fails: fields that cannot be decided automatically are
    /// reported as conflicts in the result.
    pub fn merge(
        &self,
        base: &Record,
        local: &Record,
        remote: &Record,
        strategy: MergeStrategy,
        metadata: Option<&MergeMetadata>,
    ) -> MergeResult {
        tracing::debug!(
            "Merging {} base / {} local / {} remote fields with {}",
            base.len(),
            local.len(),
            remote.len(),
            strategy
        );

        let result = match strategy {
            MergeStrategy::LastWriteWins => self.last_write_wins(local, remote, metadata),
            MergeStrategy::FieldLevel | MergeStrategy::ThreeWay => {
                self.per_field(base, local, remote, strategy)
            }
        };

        if result.success {
            tracing::debug!("Merge finished: {:?}", result.conflict_type);
        } else {
            tracing::info!(
                "Merge left {} conflict(s): {}",
                result.conflicts.len(),
                result
                    .conflicts
                    .iter()
                    .map(|c| c.field.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            );
        }
        result
    }

    /// Like [`merge`](Self::merge), selecting the strategy by name.
    pub fn merge_named(
        &self,
        base: &Record,
        local: &Record,
        remote: &Record,
        strategy: &str,
        metadata: Option<&MergeMetadata>,
    ) -> Result<MergeResult, MergeError> {
        let strategy = strategy.parse::<MergeStrategy>()?;
        Ok(self.merge(base, local, remote, strategy, metadata))
    }

    /// Merge arbitrary documents, such as parsed YAML files.
    ///
    /// Local and remote must be mappings. A null base is an empty mapping.
    /// Anything else yields a `type_conflict` result with no merged data.
    pub fn merge_documents(
        &self,
        base: &Value,
        local: &Value,
        remote: &Value,
        strategy: MergeStrategy,
        metadata: Option<&MergeMetadata>,
    ) -> MergeResult {
        let empty = Record::new();
        let base_record = match base {
            Value::Null => Some(&empty),
            other => other.as_object(),
        };

        match (base_record, local.as_object(), remote.as_object()) {
            (Some(b), Some(l), Some(r)) => self.merge(b, l, r, strategy, metadata),
            _ => {
                tracing::warn!(
                    "Cannot merge documents of kinds {} / {} / {}",
                    kind_of(base),
                    kind_of(local),
                    kind_of(remote)
                );
                let mut result = MergeResult::new(strategy);
                result.success = false;
                result.conflict_type = ConflictType::TypeConflict;
                result.conflicts.push(Conflict::new(
                    DOCUMENT_FIELD,
                    Some(base),
                    Some(local),
                    Some(remote),
                    "documents must be mappings",
                    Resolution::ManualRequired,
                ));
                result
            }
        }
    }

    /// Record a person's choice for `conflict`. Nothing is applied.
    pub fn resolve_manually(
        &self,
        conflict: &Conflict,
        chosen_value: Value,
        user_id: &str,
        reason: Option<&str>,
    ) -> ManualResolution {
        ManualResolution::new(conflict, chosen_value, user_id, reason)
    }

    pub fn conflict_summary(&self, conflicts: &[Conflict]) -> ConflictSummary {
        ConflictSummary::from_conflicts(conflicts)
    }

    fn last_write_wins(
        &self,
        local: &Record,
        remote: &Record,
        metadata: Option<&MergeMetadata>,
    ) -> MergeResult {
        let timestamps = metadata.and_then(|m| {
            m.local_timestamp
                .as_deref()
                .zip(m.remote_timestamp.as_deref())
        });

        let (winner, resolution, reason) = match timestamps {
            Some((local_ts, remote_ts)) if local_ts > remote_ts => (
                local,
                Resolution::LocalWins,
                format!("local timestamp {local_ts} is newer than remote {remote_ts}"),
            ),
            Some((local_ts, remote_ts)) => (
                remote,
                Resolution::RemoteWins,
                format!("remote timestamp {remote_ts} is not older than local {local_ts}"),
            ),
            None => (
                remote,
                Resolution::RemoteWins,
                "no timestamps supplied, remote is authoritative".to_string(),
            ),
        };

        let mut result = MergeResult::new(MergeStrategy::LastWriteWins);
        result.merged_data = winner.clone();
        result.conflicts.push(Conflict::new(
            DOCUMENT_FIELD,
            None,
            Some(&Value::Object(local.clone())),
            Some(&Value::Object(remote.clone())),
            reason,
            resolution,
        ));
        result
    }

    fn per_field(
        &self,
        base: &Record,
        local: &Record,
        remote: &Record,
        strategy: MergeStrategy,
    ) -> MergeResult {
        let mut result = MergeResult::new(strategy);

        if local == remote {
            result.merged_data = local.clone();
            result.conflict_type = ConflictType::NoConflict;
            return result;
        }

        let fields: BTreeSet<&String> = base
            .keys()
            .chain(local.keys())
            .chain(remote.keys())
            .collect();

        for field in fields {
            let b = base.get(field);
            let l = local.get(field);
            let r = remote.get(field);

            let decided = if l == r || r == b {
                l
            } else if l == b {
                r
            } else {
                match strategy {
                    MergeStrategy::ThreeWay => match auto_merge(b, l, r) {
                        Ok(value) => {
                            tracing::debug!("Auto-merged field '{}'", field);
                            result.merged_data.insert(field.clone(), value);
                            continue;
                        }
                        Err(reason) => {
                            result.conflicts.push(Conflict::new(
                                field.as_str(),
                                b,
                                l,
                                r,
                                reason,
                                Resolution::ManualRequired,
                            ));
                            result.unresolved_fields.push(field.clone());
                            continue;
                        }
                    },
                    _ => {
                        result.conflicts.push(Conflict::new(
                            field.as_str(),
                            b,
                            l,
                            r,
                            "both modified differently",
                            Resolution::LocalDefault,
                        ));
                        l
                    }
                }
            };

            if let Some(value) = decided {
                result.merged_data.insert(field.clone(), value.clone());
            }
        }

        result.settle()
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "mapping",
    }
}
