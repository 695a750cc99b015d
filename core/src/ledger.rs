//! Change ledger: the ordered, deduplicated record of one run's mutations.
//!
//! The four dedup sets live on the ledger itself; their lifetime is
//! exactly one run. Every operation also updates the caller's local copy
//! of the entity so that later rule checks in the same pass see it.

use crate::{
    change::Change,
    model::{Account, Customer, Payout},
    types::{AccountNumber, EntityId},
};
use std::collections::BTreeSet;

#[derive(Debug, Default)]
pub struct ChangeLedger {
    banned:    BTreeSet<EntityId>,
    suspended: BTreeSet<AccountNumber>,
    canceled:  BTreeSet<EntityId>,
    settled:   BTreeSet<EntityId>,
    entries:   Vec<Change>,
}

impl ChangeLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[Change] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Banned customer ids, sorted.
    pub fn banned(&self) -> impl Iterator<Item = &str> {
        self.banned.iter().map(String::as_str)
    }

    pub fn is_banned(&self, customer_id: &str) -> bool {
        self.banned.contains(customer_id)
    }

    pub fn is_suspended(&self, number: &str) -> bool {
        self.suspended.contains(number)
    }

    pub fn is_canceled(&self, payout_id: &str) -> bool {
        self.canceled.contains(payout_id)
    }

    pub fn is_settled(&self, payout_id: &str) -> bool {
        self.settled.contains(payout_id)
    }

    pub fn ban_customer(&mut self, customer: &mut Customer) {
        customer.banned = true;

        if !self.banned.insert(customer.id.clone()) {
            return;
        }
        self.entries.push(Change::CustomerBan { id: customer.id.clone() });
    }

    pub fn suspend_account(&mut self, account: &mut Account) {
        account.suspended = true;

        if !self.suspended.insert(account.number.clone()) {
            return;
        }
        self.entries.push(Change::AccountSuspend { number: account.number.clone() });
    }

    /// Cancellation always wins over settlement. If this ledger already
    /// holds a settlement for the payout, its `PayoutSettle` and both
    /// transfer legs are retracted.
    pub fn cancel_payout(&mut self, payout: &mut Payout) {
        payout.canceled = true;
        payout.settled = false;

        if self.settled.remove(&payout.id) {
            let before = self.entries.len();
            self.entries
                .retain(|c| c.settlement_of() != Some(payout.id.as_str()));
            log::warn!(
                "payout {}: settlement retracted by later cancellation ({} entries dropped)",
                payout.id,
                before - self.entries.len()
            );
        }

        if !self.canceled.insert(payout.id.clone()) {
            return;
        }
        self.entries.push(Change::PayoutCancel { id: payout.id.clone() });
    }

    /// Appends outgoing transfer, incoming transfer and settlement, in
    /// that order. Returns `true` only when entries were appended.
    pub fn settle_payout(&mut self, payout: &mut Payout, from: &Account, to: &Account) -> bool {
        if payout.canceled {
            return false;
        }

        payout.settled = true;

        if !self.settled.insert(payout.id.clone()) {
            return false;
        }

        self.entries.push(Change::AccountTransfer {
            number:    from.number.clone(),
            amount:    -payout.amount,
            payout_id: payout.id.clone(),
        });
        self.entries.push(Change::AccountTransfer {
            number:    to.number.clone(),
            amount:    payout.amount,
            payout_id: payout.id.clone(),
        });
        self.entries.push(Change::PayoutSettle { id: payout.id.clone() });
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use rust_decimal::Decimal;

    fn payout(id: &str) -> Payout {
        let t = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        Payout {
            id: id.into(),
            from: "a1".into(),
            to: "a2".into(),
            remarks: None,
            t,
            amount: Decimal::new(50, 0),
            settled: false,
            canceled: false,
            created_at: t,
            updated_at: None,
            settled_at: None,
            canceled_at: None,
        }
    }

    fn account(number: &str) -> Account {
        Account {
            number: number.into(),
            owner_id: "c1".into(),
            balance: Decimal::new(100, 0),
            suspended: false,
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            updated_at: None,
            suspended_at: None,
        }
    }

    #[test]
    fn settle_then_cancel_leaves_only_cancellation() {
        let mut ledger = ChangeLedger::new();
        let mut p = payout("p1");
        let (a1, a2) = (account("a1"), account("a2"));

        assert!(ledger.settle_payout(&mut p, &a1, &a2));
        assert_eq!(ledger.len(), 3);

        ledger.cancel_payout(&mut p);

        assert_eq!(ledger.entries(), &[Change::PayoutCancel { id: "p1".into() }]);
        assert!(p.canceled && !p.settled);
        assert!(!ledger.is_settled("p1"));
    }

    #[test]
    fn retraction_keeps_other_settlements() {
        let mut ledger = ChangeLedger::new();
        let (a1, a2) = (account("a1"), account("a2"));
        let mut p1 = payout("p1");
        let mut p2 = payout("p2");

        ledger.settle_payout(&mut p1, &a1, &a2);
        ledger.settle_payout(&mut p2, &a1, &a2);
        ledger.cancel_payout(&mut p1);

        let settled: Vec<_> = ledger.entries().iter().filter_map(Change::settlement_of).collect();
        assert_eq!(settled, vec!["p2", "p2", "p2"]);
    }
}
