//! Projection: turns a finished ledger into per-collection write batches.
//!
//! Bans collapse into a single `UpdateMany` over the sorted set of banned
//! ids. Every other entry becomes one `UpdateOne`, in ledger order within
//! its collection.

use crate::{
    change::{self, Change},
    document::{Filter, WriteOp},
    ledger::ChangeLedger,
    types::{Collection, CollectionName, Timestamp},
};
use serde::Serialize;
use std::collections::BTreeMap;

/// Collection name → ordered batch. Used for commit.
pub type WriteBatches = BTreeMap<CollectionName, Vec<WriteOp>>;

/// The same write-set with positional access.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CollectionWrites {
    pub customers: Vec<WriteOp>,
    pub accounts:  Vec<WriteOp>,
    pub payouts:   Vec<WriteOp>,
}

impl CollectionWrites {
    pub fn get(&self, collection: Collection) -> &[WriteOp] {
        match collection {
            Collection::Customers => &self.customers,
            Collection::Accounts  => &self.accounts,
            Collection::Payouts   => &self.payouts,
        }
    }

    fn get_mut(&mut self, collection: Collection) -> &mut Vec<WriteOp> {
        match collection {
            Collection::Customers => &mut self.customers,
            Collection::Accounts  => &mut self.accounts,
            Collection::Payouts   => &mut self.payouts,
        }
    }

    pub fn len(&self) -> usize {
        self.customers.len() + self.accounts.len() + self.payouts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Keyed form. Collections without writes are left out.
    pub fn into_batches(self) -> WriteBatches {
        let Self { customers, accounts, payouts } = self;
        [
            (Collection::Customers, customers),
            (Collection::Accounts, accounts),
            (Collection::Payouts, payouts),
        ]
        .into_iter()
        .filter(|(_, ops)| !ops.is_empty())
        .map(|(coll, ops)| (coll.name().to_string(), ops))
        .collect()
    }
}

impl ChangeLedger {
    /// Positional projection. `now` is the run's single commit timestamp.
    pub fn project(&self, now: Timestamp) -> CollectionWrites {
        let mut writes = CollectionWrites::default();

        let banned: Vec<&str> = self.banned().collect();
        if !banned.is_empty() {
            writes.customers.push(WriteOp::UpdateMany {
                filter: Filter::new().any_of("id", banned),
                update: change::ban_update(&change::stamp(now)),
            });
        }

        for entry in self.entries() {
            if let Change::CustomerBan { .. } = entry {
                continue;
            }
            writes.get_mut(entry.collection()).push(WriteOp::UpdateOne {
                filter: entry.filter(),
                update: entry.update(now),
            });
        }

        writes
    }

    /// Keyed projection, as handed to the transactional commit.
    pub fn project_batches(&self, now: Timestamp) -> WriteBatches {
        self.project(now).into_batches()
    }
}
