//! In-memory reference adapter.

use std::collections::HashMap;
use std::sync::Mutex;

use indexmap::IndexMap;

use crate::error::{FrameError, Result};
use crate::frame::Value;

use super::{ConflictPolicy, PersistOutcome, PersistenceAdapter, PersistRequest};

/// An in-memory keyed store honoring both conflict policies.
///
/// Serves as the executable documentation of the adapter contract and as
/// the store for tests: conflicts are detected before anything is written,
/// so a failed `InsertOnly` call leaves the table untouched.
#[derive(Default)]
pub struct MemoryAdapter {
    tables: Mutex<HashMap<String, StoredTable>>,
}

#[derive(Default, Clone)]
struct StoredTable {
    rows: Vec<IndexMap<String, Value>>,
    index: HashMap<String, usize>,
}

impl MemoryAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of rows currently stored for a target.
    pub fn row_count(&self, target: &str) -> usize {
        self.tables
            .lock()
            .map(|tables| tables.get(target).map_or(0, |t| t.rows.len()))
            .unwrap_or(0)
    }

    /// Snapshot of the rows stored for a target, in insertion order.
    pub fn rows(&self, target: &str) -> Vec<IndexMap<String, Value>> {
        self.tables
            .lock()
            .map(|tables| tables.get(target).map(|t| t.rows.clone()).unwrap_or_default())
            .unwrap_or_default()
    }
}

impl PersistenceAdapter for MemoryAdapter {
    fn persist(&self, request: PersistRequest<'_>) -> Result<PersistOutcome> {
        let frame = request.frame;
        let mut incoming = Vec::with_capacity(frame.row_count());
        for row in 0..frame.row_count() {
            let cells: IndexMap<String, Value> = frame
                .iter()
                .map(|(name, column)| {
                    (
                        name.to_string(),
                        column.get(row).cloned().unwrap_or(Value::Null),
                    )
                })
                .collect();
            let key = if request.unique_key.is_empty() {
                None
            } else {
                let rendered = frame
                    .row_values(request.unique_key, row)
                    .ok_or_else(|| {
                        FrameError::Persistence(format!(
                            "unique key column missing from frame for '{}'",
                            request.target
                        ))
                    })?
                    .iter()
                    .map(|v| v.to_string())
                    .collect::<Vec<_>>()
                    .join("\u{1f}");
                Some(rendered)
            };
            incoming.push((key, cells));
        }

        let mut tables = self
            .tables
            .lock()
            .map_err(|_| FrameError::Persistence("memory store lock poisoned".to_string()))?;
        let table = tables.entry(request.target.to_string()).or_default();

        // conflict scan before any mutation keeps the write atomic
        if request.policy == ConflictPolicy::InsertOnly {
            let mut batch_keys = std::collections::HashSet::new();
            for (key, _) in &incoming {
                if let Some(key) = key {
                    if table.index.contains_key(key) || !batch_keys.insert(key.clone()) {
                        return Err(FrameError::Persistence(format!(
                            "unique constraint violation on '{}' for key ({})",
                            request.target,
                            request.unique_key.join(", ")
                        )));
                    }
                }
            }
        }

        let mut written = 0;
        for (key, cells) in incoming {
            match key.and_then(|k| table.index.get(&k).copied().map(|slot| (k, slot))) {
                Some((_, slot)) => {
                    // reachable only under Upsert; InsertOnly bailed above
                    table.rows[slot] = cells;
                }
                None => {
                    let slot = table.rows.len();
                    if !request.unique_key.is_empty() {
                        let rendered = request
                            .unique_key
                            .iter()
                            .map(|k| cells.get(k).map(Value::to_string).unwrap_or_default())
                            .collect::<Vec<_>>()
                            .join("\u{1f}");
                        table.index.insert(rendered, slot);
                    }
                    table.rows.push(cells);
                }
            }
            written += 1;
        }

        Ok(PersistOutcome {
            rows_written: written,
        })
    }
}
