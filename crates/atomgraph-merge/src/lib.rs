//! Conflict resolution for atom records edited concurrently
//!
//! Three versions of one record (the common base, a local edit and a
//! remote edit) are combined under a selectable strategy. Fields that
//! cannot be combined are returned as conflicts rather than errors.

pub mod conflict;
pub mod resolver;
pub mod strategy;
pub mod structural;


pub use conflict::{
    Conflict, ConflictSummary, ConflictType, DOCUMENT_FIELD, ManualResolution, Resolution,
};
pub use resolver::{ConflictResolver, MergeMetadata, MergeResult, Record};
pub use strategy::{MergeError, MergeStrategy};
pub use structural::auto_merge;
