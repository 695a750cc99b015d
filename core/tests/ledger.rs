//! Change ledger: dedup, cancel/settle exclusion, transfer pairs.

mod common;

use common::*;
use payout_recon_core::{change::Change, ledger::ChangeLedger};
use rust_decimal::Decimal;

#[test]
fn repeated_operations_append_one_entry_each() {
    let mut ledger = ChangeLedger::new();
    let mut cust = customer("c1");
    let mut acc = account("a1", "c1", 100);
    let mut canceled = payout("p1", "a1", "a2", 10);
    let mut settled = payout("p2", "a1", "a2", 10);
    let to = account("a2", "c2", 0);

    for _ in 0..2 {
        ledger.ban_customer(&mut cust);
        ledger.suspend_account(&mut acc);
        ledger.cancel_payout(&mut canceled);
        ledger.settle_payout(&mut settled, &acc, &to);
    }

    let count = |pred: fn(&Change) -> bool| ledger.entries().iter().filter(|c| pred(c)).count();
    assert_eq!(count(|c| matches!(c, Change::CustomerBan { .. })), 1);
    assert_eq!(count(|c| matches!(c, Change::AccountSuspend { .. })), 1);
    assert_eq!(count(|c| matches!(c, Change::PayoutCancel { .. })), 1);
    assert_eq!(count(|c| matches!(c, Change::PayoutSettle { .. })), 1);
    assert_eq!(count(|c| matches!(c, Change::AccountTransfer { .. })), 2);
    assert_eq!(ledger.len(), 6);
}

#[test]
fn operations_update_local_flags() {
    let mut ledger = ChangeLedger::new();
    let mut cust = customer("c1");
    let mut acc = account("a1", "c1", 100);

    ledger.ban_customer(&mut cust);
    ledger.suspend_account(&mut acc);

    assert!(cust.banned);
    assert!(acc.suspended);
    assert!(ledger.is_banned("c1"));
    assert!(ledger.is_suspended("a1"));
}

#[test]
fn settlement_appends_transfers_then_settle() {
    let mut ledger = ChangeLedger::new();
    let mut p = payout("p1", "a1", "a2", 40);
    let (from, to) = (account("a1", "c1", 100), account("a2", "c2", 0));

    assert!(ledger.settle_payout(&mut p, &from, &to));
    assert!(p.settled);

    assert_eq!(
        ledger.entries(),
        &[
            Change::AccountTransfer { number: "a1".into(), amount: dec(-40), payout_id: "p1".into() },
            Change::AccountTransfer { number: "a2".into(), amount: dec(40), payout_id: "p1".into() },
            Change::PayoutSettle { id: "p1".into() },
        ]
    );
}

#[test]
fn transfer_pair_is_balanced() {
    let mut ledger = ChangeLedger::new();
    let mut p = payout("p1", "a1", "a2", 0);
    p.amount = Decimal::new(123_456, 3); // 123.456
    let (from, to) = (account("a1", "c1", 1000), account("a2", "c2", 0));

    ledger.settle_payout(&mut p, &from, &to);

    let amounts: Vec<Decimal> = ledger
        .entries()
        .iter()
        .filter_map(|c| match c {
            Change::AccountTransfer { amount, .. } => Some(*amount),
            _ => None,
        })
        .collect();
    assert_eq!(amounts.len(), 2);
    assert_eq!(amounts[0], -amounts[1], "legs must be exact negatives");
    assert_eq!(amounts[0] + amounts[1], Decimal::ZERO);
    assert_eq!(amounts[1], p.amount);
}

#[test]
fn cancel_before_settle_blocks_settlement() {
    let mut ledger = ChangeLedger::new();
    let mut p = payout("p1", "a1", "a2", 10);
    let (from, to) = (account("a1", "c1", 100), account("a2", "c2", 0));

    ledger.cancel_payout(&mut p);
    assert!(!ledger.settle_payout(&mut p, &from, &to));

    assert_eq!(ledger.entries(), &[Change::PayoutCancel { id: "p1".into() }]);
    assert!(p.canceled && !p.settled);
}

#[test]
fn cancel_after_settle_retracts_settlement() {
    let mut ledger = ChangeLedger::new();
    let mut p = payout("p1", "a1", "a2", 10);
    let (from, to) = (account("a1", "c1", 100), account("a2", "c2", 0));

    ledger.settle_payout(&mut p, &from, &to);
    ledger.cancel_payout(&mut p);

    assert_eq!(ledger.entries(), &[Change::PayoutCancel { id: "p1".into() }]);
    assert!(!ledger.is_settled("p1"));
    assert!(ledger.is_canceled("p1"));

    // A canceled payout never settles again.
    assert!(!ledger.settle_payout(&mut p, &from, &to));
    assert_eq!(ledger.len(), 1);
}

#[test]
fn repeated_cancels_are_idempotent_and_keep_order() {
    let mut ledger = ChangeLedger::new();
    let mut p = payout("p1", "a1", "a2", 10);
    let mut acc = account("a1", "c1", 100);

    ledger.cancel_payout(&mut p);
    ledger.suspend_account(&mut acc);
    ledger.cancel_payout(&mut p);

    assert_eq!(
        ledger.entries(),
        &[
            Change::PayoutCancel { id: "p1".into() },
            Change::AccountSuspend { number: "a1".into() },
        ]
    );
}
