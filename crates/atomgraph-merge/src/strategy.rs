//! Merge strategy selection

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MergeError {
    #[error("unknown merge strategy '{0}' (expected one of: last_write_wins, field_level, three_way)")]
    UnknownStrategy(String),
}

/// How a resolver combines base, local and remote versions of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MergeStrategy {
    /// Pick one whole side: the newer timestamp, or remote when undated.
    LastWriteWins,
    /// Per-field three-case decision; true conflicts keep the local value.
    FieldLevel,
    /// Per-field decision plus structural auto-merge of diverging values.
    #[default]
    ThreeWay,
}

impl MergeStrategy {
    pub const ALL: [MergeStrategy; 3] = [
        MergeStrategy::LastWriteWins,
        MergeStrategy::FieldLevel,
        MergeStrategy::ThreeWay,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MergeStrategy::LastWriteWins => "last_write_wins",
            MergeStrategy::FieldLevel => "field_level",
            MergeStrategy::ThreeWay => "three_way",
        }
    }
}

impl fmt::Display for MergeStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MergeStrategy {
    type Err = MergeError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name {
            "last_write_wins" => Ok(MergeStrategy::LastWriteWins),
            "field_level" => Ok(MergeStrategy::FieldLevel),
            "three_way" => Ok(MergeStrategy::ThreeWay),
            _ => Err(MergeError::UnknownStrategy(name.to_string())),
        }
    }
}
