//! Core data structures for the atom graph

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize};

/// Globally unique, stable atom identifier.
pub type AtomId = String;

/// Module identifier.
pub type ModuleId = String;

/// Opaque record fields, kept as parsed YAML so any key type survives.
pub type Extra = BTreeMap<String, serde_yaml::Value>;

/// Discriminates what kind of documentation record an atom represents.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum AtomType {
    // ── Intent ──────────────────────────────────────────────
    Requirement,
    Design,
    Policy,

    // ── Execution ───────────────────────────────────────────
    Procedure,
    Process,
    Validation,

    // ── Governance ──────────────────────────────────────────
    Risk,
    Control,

    // ── Fallback ────────────────────────────────────────────
    #[default]
    #[serde(other)]
    Other,
}

impl AtomType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AtomType::Requirement => "requirement",
            AtomType::Design => "design",
            AtomType::Policy => "policy",
            AtomType::Procedure => "procedure",
            AtomType::Process => "process",
            AtomType::Validation => "validation",
            AtomType::Risk => "risk",
            AtomType::Control => "control",
            AtomType::Other => "other",
        }
    }
}

impl fmt::Display for AtomType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which side of an atom a link was declared on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkDirection {
    /// Predecessor: the atom depends on the target.
    Upstream,
    /// Successor: the target depends on the atom.
    Downstream,
}

impl LinkDirection {
    /// The direction the target must declare to reciprocate this link.
    pub fn reciprocal(self) -> Self {
        match self {
            LinkDirection::Upstream => LinkDirection::Downstream,
            LinkDirection::Downstream => LinkDirection::Upstream,
        }
    }
}

impl fmt::Display for LinkDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkDirection::Upstream => f.write_str("upstream"),
            LinkDirection::Downstream => f.write_str("downstream"),
        }
    }
}

/// A single record in the documentation graph.
///
/// Only `id`, `type` and the two link sets are read by the graph cores;
/// everything else in the source record is carried through `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Atom {
    #[serde(deserialize_with = "scalar_id")]
    pub id: AtomId,
    #[serde(rename = "type", default)]
    pub kind: AtomType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Atoms this atom depends on.
    #[serde(default, deserialize_with = "nullable_set")]
    pub upstream_ids: BTreeSet<AtomId>,
    /// Atoms that depend on this atom.
    #[serde(default, deserialize_with = "nullable_set")]
    pub downstream_ids: BTreeSet<AtomId>,
    /// Opaque fields (summary, content, metadata, ...).
    #[serde(flatten)]
    pub extra: Extra,
}

impl Atom {
    pub fn new(id: impl Into<AtomId>, kind: AtomType) -> Self {
        Atom {
            id: id.into(),
            kind,
            title: None,
            upstream_ids: BTreeSet::new(),
            downstream_ids: BTreeSet::new(),
            extra: BTreeMap::new(),
        }
    }

    pub fn with_upstream<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<AtomId>,
    {
        self.upstream_ids.extend(ids.into_iter().map(Into::into));
        self
    }

    pub fn with_downstream<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<AtomId>,
    {
        self.downstream_ids.extend(ids.into_iter().map(Into::into));
        self
    }

    /// Links declared in one direction.
    pub fn links(&self, direction: LinkDirection) -> &BTreeSet<AtomId> {
        match direction {
            LinkDirection::Upstream => &self.upstream_ids,
            LinkDirection::Downstream => &self.downstream_ids,
        }
    }

    /// Every declared link, upstream first.
    pub fn references(&self) -> impl Iterator<Item = (LinkDirection, &AtomId)> {
        self.upstream_ids
            .iter()
            .map(|id| (LinkDirection::Upstream, id))
            .chain(
                self.downstream_ids
                    .iter()
                    .map(|id| (LinkDirection::Downstream, id)),
            )
    }

    /// True when the atom has no links in either direction.
    pub fn is_orphan(&self) -> bool {
        self.upstream_ids.is_empty() && self.downstream_ids.is_empty()
    }
}

/// A named grouping of atoms.
///
/// Records are keyed by `module_id`, falling back to `id`. When both are
/// present `module_id` wins and `id` is kept in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "ModuleRecord")]
pub struct Module {
    pub module_id: ModuleId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub atom_ids: BTreeSet<AtomId>,
    pub metadata: ModuleMetadata,
    #[serde(flatten)]
    pub extra: Extra,
}

/// On-disk shape of a module record.
#[derive(Deserialize)]
struct ModuleRecord {
    #[serde(default, deserialize_with = "optional_scalar_id")]
    module_id: Option<ModuleId>,
    #[serde(default, deserialize_with = "optional_scalar_id")]
    id: Option<ModuleId>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default, deserialize_with = "nullable_set")]
    atom_ids: BTreeSet<AtomId>,
    #[serde(default, deserialize_with = "nullable_metadata")]
    metadata: ModuleMetadata,
    #[serde(flatten)]
    extra: Extra,
}

impl From<ModuleRecord> for Module {
    fn from(record: ModuleRecord) -> Self {
        let mut extra = record.extra;
        let module_id = match (record.module_id, record.id) {
            (Some(module_id), Some(id)) => {
                extra.insert("id".to_string(), serde_yaml::Value::String(id));
                module_id
            }
            (Some(module_id), None) => module_id,
            (None, id) => id.unwrap_or_default(),
        };
        Module {
            module_id,
            name: record.name,
            atom_ids: record.atom_ids,
            metadata: record.metadata,
            extra,
        }
    }
}

impl Module {
    pub fn new(module_id: impl Into<ModuleId>) -> Self {
        Module {
            module_id: module_id.into(),
            name: None,
            atom_ids: BTreeSet::new(),
            metadata: ModuleMetadata::default(),
            extra: BTreeMap::new(),
        }
    }

    pub fn with_atoms<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<AtomId>,
    {
        self.atom_ids.extend(ids.into_iter().map(Into::into));
        self
    }

    pub fn with_dependencies<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<ModuleId>,
    {
        self.metadata
            .dependencies
            .extend(ids.into_iter().map(Into::into));
        self
    }

    /// Modules this module declares a dependency on.
    pub fn dependencies(&self) -> &BTreeSet<ModuleId> {
        &self.metadata.dependencies
    }
}

/// Module metadata. Only `dependencies` is interpreted.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ModuleMetadata {
    #[serde(default, deserialize_with = "nullable_set")]
    pub dependencies: BTreeSet<ModuleId>,
    #[serde(flatten)]
    pub extra: Extra,
}

/// An identifier written as any YAML scalar; `42` reads as `"42"`.
struct ScalarId(String);

impl<'de> Deserialize<'de> for ScalarId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ScalarIdVisitor;

        impl Visitor<'_> for ScalarIdVisitor {
            type Value = ScalarId;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an id (string, number or boolean)")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<ScalarId, E> {
                Ok(ScalarId(v.to_string()))
            }

            fn visit_string<E: de::Error>(self, v: String) -> Result<ScalarId, E> {
                Ok(ScalarId(v))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<ScalarId, E> {
                Ok(ScalarId(v.to_string()))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<ScalarId, E> {
                Ok(ScalarId(v.to_string()))
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<ScalarId, E> {
                Ok(ScalarId(v.to_string()))
            }

            fn visit_bool<E: de::Error>(self, v: bool) -> Result<ScalarId, E> {
                Ok(ScalarId(v.to_string()))
            }
        }

        deserializer.deserialize_any(ScalarIdVisitor)
    }
}

fn scalar_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(ScalarId::deserialize(deserializer)?.0)
}

fn optional_scalar_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<ScalarId>::deserialize(deserializer)?.map(|id| id.0))
}

/// `key: ~` in a record reads as an empty set.
fn nullable_set<'de, D>(deserializer: D) -> Result<BTreeSet<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let ids = Option::<Vec<ScalarId>>::deserialize(deserializer)?.unwrap_or_default();
    Ok(ids.into_iter().map(|id| id.0).collect())
}

fn nullable_metadata<'de, D>(deserializer: D) -> Result<ModuleMetadata, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<ModuleMetadata>::deserialize(deserializer)?.unwrap_or_default())
}
