//! The payout reconciliation job and its document-store data source.

use crate::{
    config::ReconConfig,
    error::ReconResult,
    harness::{DataSource, Job},
    model::Snapshot,
    projection::WriteBatches,
    rules::PayoutRules,
    store::{CommitResults, DocStore, LockMode},
    types::{Collection, Timestamp},
};
use chrono::Utc;
use uuid::Uuid;

/// Lock resource shared by every job that reads or writes the payout collections.
pub const LOCK_RESOURCE: &str = "payout-reconciliation";

/// Pays out on T+2, while banning suspicious customers, suspending
/// suspicious accounts and canceling bad payouts.
pub struct PayoutJob {
    id: String,
    rules: PayoutRules,
}

impl PayoutJob {
    pub fn new(config: &ReconConfig) -> Self {
        Self {
            id: format!("job-payout-{}", Uuid::new_v4()),
            rules: PayoutRules::new(config.settlement_window_hours),
        }
    }
}

impl Job for PayoutJob {
    type Inputs = Snapshot;
    type Outputs = WriteBatches;

    fn id(&self) -> &str {
        &self.id
    }

    fn run(&self, inputs: Snapshot, now: Timestamp) -> ReconResult<WriteBatches> {
        let ledger = self.rules.process(&inputs);
        let batches = ledger.project_batches(now);
        for (coll, ops) in &batches {
            log::info!("job {}: {} writes for '{coll}'", self.id, ops.len());
        }
        Ok(batches)
    }
}

/// Reads the three collections in one read transaction and commits
/// write batches through the store's transactional bulk write.
pub struct PayoutDataSource<'a> {
    store: &'a DocStore,
    cutoff: Option<Timestamp>,
    last_commit: Option<CommitResults>,
}

impl<'a> PayoutDataSource<'a> {
    pub fn new(store: &'a DocStore) -> Self {
        Self {
            store,
            cutoff: None,
            last_commit: None,
        }
    }

    /// Fix the settlement cutoff instead of using the fetch time.
    pub fn with_cutoff(mut self, cutoff: Timestamp) -> Self {
        self.cutoff = Some(cutoff);
        self
    }

    /// Per-collection counts from the last successful commit.
    pub fn last_commit(&self) -> Option<&CommitResults> {
        self.last_commit.as_ref()
    }
}

impl DataSource for PayoutDataSource<'_> {
    type Inputs = Snapshot;
    type Outputs = WriteBatches;

    fn lock_read(&mut self, job_id: &str) -> ReconResult<()> {
        self.store.acquire_lock(LOCK_RESOURCE, LockMode::Read, job_id)
    }

    fn lock_write(&mut self, job_id: &str) -> ReconResult<()> {
        self.store.acquire_lock(LOCK_RESOURCE, LockMode::Write, job_id)
    }

    fn unlock(&mut self, job_id: &str) -> ReconResult<()> {
        let n = self.store.release_locks(job_id)?;
        log::debug!("released {n} locks held by {job_id}");
        Ok(())
    }

    fn inputs(&mut self) -> ReconResult<Snapshot> {
        let cutoff = self.cutoff.unwrap_or_else(Utc::now);
        self.store.with_read_tx(|store| {
            Ok(Snapshot {
                cutoff,
                customers: store.find_all(Collection::Customers)?,
                accounts: store.find_all(Collection::Accounts)?,
                payouts: store.find_all(Collection::Payouts)?,
            })
        })
    }

    fn commit(&mut self, outputs: WriteBatches) -> ReconResult<()> {
        let results = self.store.apply_write_batches(&outputs)?;
        for (coll, result) in &results {
            log::info!(
                "{} documents matched, {} modified in collection '{coll}'",
                result.matched,
                result.modified
            );
        }
        self.last_commit = Some(results);
        Ok(())
    }
}
