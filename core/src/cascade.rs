//! Cascade closure passes, run once each after the main rule pass.
//!
//! Both passes walk the input snapshot, not the run's local copies.
//! They are not iterated to a fixed point: a suspension found here never
//! leads to a further ban.

use crate::{ledger::ChangeLedger, model::Snapshot};

/// Suspend every account owned by a customer banned in this run, and every
/// account owned by a customer already banned in the snapshot.
pub fn suspend_accounts_of_banned_customers(snapshot: &Snapshot, ledger: &mut ChangeLedger) {
    for acc in &snapshot.accounts {
        if ledger.is_banned(&acc.owner_id) {
            ledger.suspend_account(&mut acc.clone());
        }
    }

    for cust in snapshot.customers.iter().filter(|c| c.banned) {
        for acc in snapshot.accounts.iter().filter(|a| a.owner_id == cust.id) {
            ledger.suspend_account(&mut acc.clone());
        }
    }
}

/// Cancel every open payout whose source or destination account is now
/// in the suspended set.
pub fn cancel_payouts_with_suspended_accounts(snapshot: &Snapshot, ledger: &mut ChangeLedger) {
    for p in snapshot.payouts.iter().filter(|p| !p.is_terminal()) {
        if ledger.is_suspended(&p.from) || ledger.is_suspended(&p.to) {
            log::debug!("payout {}: canceled by suspension cascade", p.id);
            ledger.cancel_payout(&mut p.clone());
        }
    }
}
