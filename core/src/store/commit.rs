//! Transactional multi-collection bulk write.
//!
//! All batches go through one SQLite transaction: either every operation
//! in every collection is applied, or the transaction is rolled back and
//! nothing is. Transient lock conflicts are retried here, not by callers.

use super::DocStore;
use crate::{
    document::WriteOp,
    error::{ReconError, ReconResult},
    projection::WriteBatches,
    types::{Collection, CollectionName},
};
use rusqlite::{params, Connection, ErrorCode};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;

const RETRY_BACKOFF: Duration = Duration::from_millis(50);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BulkWriteResult {
    /// Documents that matched a filter.
    pub matched: u64,
    /// Documents whose body actually changed.
    pub modified: u64,
}

pub type CommitResults = BTreeMap<CollectionName, BulkWriteResult>;

impl DocStore {
    /// Apply every batch atomically. Returns per-collection counts.
    pub fn apply_write_batches(&self, batches: &WriteBatches) -> ReconResult<CommitResults> {
        let mut attempt = 1;
        loop {
            match self.try_apply(batches) {
                Err(ReconError::Database(e)) if is_transient(&e) => {
                    if attempt > self.commit_max_retries {
                        return Err(ReconError::CommitConflict { attempts: attempt, source: e });
                    }
                    log::warn!("commit attempt {attempt} hit a lock conflict, retrying: {e}");
                    std::thread::sleep(RETRY_BACKOFF * attempt);
                    attempt += 1;
                }
                other => return other,
            }
        }
    }

    fn try_apply(&self, batches: &WriteBatches) -> ReconResult<CommitResults> {
        let tx = self.conn.unchecked_transaction()?;
        let mut results = CommitResults::new();

        for (name, ops) in batches {
            match apply_batch(&tx, name, ops) {
                Ok(result) => {
                    results.insert(name.clone(), result);
                }
                Err(e) => {
                    log::error!("bulk write of {} ops to '{name}' failed: {e}", ops.len());
                    if let Err(rb) = tx.rollback() {
                        log::error!("rollback failed: {rb}");
                    }
                    return Err(e);
                }
            }
        }

        tx.commit()?;
        Ok(results)
    }
}

fn is_transient(e: &rusqlite::Error) -> bool {
    matches!(
        e.sqlite_error_code(),
        Some(ErrorCode::DatabaseBusy) | Some(ErrorCode::DatabaseLocked)
    )
}

fn apply_batch(conn: &Connection, name: &str, ops: &[WriteOp]) -> ReconResult<BulkWriteResult> {
    let collection = Collection::from_name(name)
        .ok_or_else(|| ReconError::UnknownCollection { name: name.to_string() })?;
    let mut result = BulkWriteResult::default();

    for op in ops {
        for (key, body) in candidates(conn, collection, op)? {
            let mut doc: Value = serde_json::from_str(&body).map_err(|source| {
                ReconError::MalformedDocument {
                    collection: name.to_string(),
                    source,
                }
            })?;
            if !op.filter().matches(&doc) {
                continue;
            }
            result.matched += 1;

            let changed = op.update().apply(&mut doc).map_err(|field| ReconError::NotDecimal {
                collection: name.to_string(),
                field,
            })?;
            if changed {
                conn.execute(
                    "UPDATE document SET body = ?1 WHERE collection = ?2 AND doc_key = ?3",
                    params![doc.to_string(), name, key],
                )?;
                result.modified += 1;
            }

            if !op.is_many() {
                break;
            }
        }
    }

    Ok(result)
}

/// Documents an operation could touch: the pinned key if the filter
/// names one, the whole collection otherwise.
fn candidates(conn: &Connection, collection: Collection, op: &WriteOp) -> ReconResult<Vec<(String, String)>> {
    let rows = match op.filter().pinned_key(collection.key_field()) {
        Some(key) => {
            let mut stmt = conn.prepare_cached(
                "SELECT doc_key, body FROM document WHERE collection = ?1 AND doc_key = ?2",
            )?;
            let rows = stmt
                .query_map(params![collection.name(), key], |row| Ok((row.get(0)?, row.get(1)?)))?
                .collect::<Result<Vec<(String, String)>, _>>()?;
            rows
        }
        None => {
            let mut stmt = conn.prepare_cached(
                "SELECT doc_key, body FROM document WHERE collection = ?1 ORDER BY rowid ASC",
            )?;
            let rows = stmt
                .query_map(params![collection.name()], |row| Ok((row.get(0)?, row.get(1)?)))?
                .collect::<Result<Vec<(String, String)>, _>>()?;
            rows
        }
    };
    Ok(rows)
}
