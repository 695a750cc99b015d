//! Whole-system properties over seeded mock data.

mod common;

use common::*;
use payout_recon_core::{
    change::Change,
    config::{HarnessConfig, ReconConfig},
    harness,
    mock::{self, MockConfig},
    model::{Account, Payout},
    payout_job::{PayoutDataSource, PayoutJob},
    rules::PayoutRules,
    types::Collection,
};
use rust_decimal::Decimal;
use std::collections::{BTreeSet, HashMap};

const SEEDS: [u64; 4] = [1, 42, 2024, 90_210];

fn busy() -> MockConfig {
    MockConfig {
        customers: 40,
        payouts: 200,
        banned_rate: 0.1,
        criminal_rate: 0.1,
        dangling_rate: 0.05,
        ..MockConfig::default()
    }
}

#[test]
fn ledger_never_settles_and_cancels_the_same_payout() {
    for seed in SEEDS {
        let snap = mock::generate(seed, &busy(), cutoff());
        let ledger = PayoutRules::default().process(&snap);

        let mut settled = BTreeSet::new();
        let mut canceled = BTreeSet::new();
        for entry in ledger.entries() {
            match entry {
                Change::PayoutSettle { id } => assert!(settled.insert(id.clone()), "seed {seed}: {id} settled twice"),
                Change::PayoutCancel { id } => assert!(canceled.insert(id.clone()), "seed {seed}: {id} canceled twice"),
                _ => {}
            }
        }
        assert!(settled.is_disjoint(&canceled), "seed {seed}");
    }
}

#[test]
fn every_settlement_has_a_balanced_transfer_pair() {
    for seed in SEEDS {
        let snap = mock::generate(seed, &busy(), cutoff());
        let ledger = PayoutRules::default().process(&snap);

        let mut legs: HashMap<&str, Vec<Decimal>> = HashMap::new();
        for entry in ledger.entries() {
            if let Change::AccountTransfer { amount, payout_id, .. } = entry {
                legs.entry(payout_id.as_str()).or_default().push(*amount);
            }
        }
        for entry in ledger.entries() {
            if let Change::PayoutSettle { id } = entry {
                let pair = &legs[id.as_str()];
                assert_eq!(pair.len(), 2, "seed {seed}: {id}");
                assert_eq!(pair[0] + pair[1], Decimal::ZERO, "seed {seed}: {id}");
            }
        }
        assert_eq!(legs.len(), ledger.entries().iter().filter(|c| matches!(c, Change::PayoutSettle { .. })).count());
    }
}

#[test]
fn committed_run_conserves_money_and_never_overdraws() {
    init_logging();
    for seed in SEEDS {
        let snap = mock::generate(seed, &busy(), cutoff());
        let store = seeded_store(&snap);
        let total_before: Decimal = snap.accounts.iter().map(|a| a.balance).sum();

        let job = PayoutJob::new(&ReconConfig::default_test());
        let mut ds = PayoutDataSource::new(&store).with_cutoff(cutoff());
        harness::start_at(&job, &mut ds, HarnessConfig::default(), cutoff()).unwrap();

        let accounts: Vec<Account> = store.find_all(Collection::Accounts).unwrap();
        let payouts: Vec<Payout> = store.find_all(Collection::Payouts).unwrap();
        let total_after: Decimal = accounts.iter().map(|a| a.balance).sum();
        assert_eq!(total_before, total_after, "seed {seed}");

        let before: HashMap<&str, &Account> =
            snap.accounts.iter().map(|a| (a.number.as_str(), a)).collect();
        for acc in &accounts {
            assert!(acc.balance >= Decimal::ZERO, "seed {seed}: {} overdrawn to {}", acc.number, acc.balance);
            if acc.suspended {
                assert_eq!(acc.balance, before[acc.number.as_str()].balance, "seed {seed}: {}", acc.number);
            }
        }
        for p in &payouts {
            assert!(!(p.settled && p.canceled), "seed {seed}: {}", p.id);
        }
    }
}
