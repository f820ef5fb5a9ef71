//! The persistence boundary: an abstract bulk-write capability.

mod memory;
pub mod postgres;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::frame::Frame;

pub use memory::MemoryAdapter;

/// What the adapter should do when a row's key already exists in the store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictPolicy {
    /// Fail the whole operation if any row's key already exists.
    #[default]
    InsertOnly,
    /// Insert new rows; update existing rows matched by the declared unique
    /// key.
    Upsert,
}

/// One bulk write, as handed to an adapter.
#[derive(Debug, Clone, Copy)]
pub struct PersistRequest<'a> {
    /// The validated, coerced frame.
    pub frame: &'a Frame,
    /// The persistence target identifier (e.g. a table name).
    pub target: &'a str,
    /// The schema's declared unique key; empty when none was declared.
    pub unique_key: &'a [String],
    /// Conflict resolution policy.
    pub policy: ConflictPolicy,
}

/// Result of a successful bulk write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PersistOutcome {
    /// Rows durably written (inserted or updated).
    pub rows_written: usize,
}

/// Abstract capability to write a validated frame into a backing store.
///
/// The adapter owns transactional semantics: a call either writes every row
/// durably or none of them. Storage failures surface as
/// [`FrameError::Persistence`](crate::FrameError::Persistence) and are never
/// reinterpreted as validation errors; the caller decides whether to retry.
pub trait PersistenceAdapter: Send + Sync {
    /// Atomically write the request's frame into the store.
    fn persist(&self, request: PersistRequest<'_>) -> Result<PersistOutcome>;
}
