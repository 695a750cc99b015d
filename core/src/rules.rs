//! Rule engine: a rule pass over payouts, the cascade passes, then settlement.
//!
//! Every rule is an independent check→effect step. All rules run for
//! every payout, in the order of `RULES`, so a payout that trips several
//! of them leaves an entry for each effect in the ledger. Payouts that
//! come through the rules undisqualified are settlement candidates.
//!
//! Checks read the run's local entity copies, which earlier payouts in
//! the same pass may already have suspended or banned.
//!
//! Settlement runs last, once both cascade passes are done, so no later
//! cancellation can take back money a balance gate already counted on.
//! The balance gate reads a running balance: each settlement debits and
//! credits the local account copies.

use crate::{
    cascade,
    ledger::ChangeLedger,
    model::{Account, Customer, Payout, Snapshot},
    types::Timestamp,
};
use chrono::Duration;
use std::collections::HashMap;

pub const DEFAULT_SETTLEMENT_WINDOW_HOURS: i64 = 48;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    From,
    To,
}

impl Side {
    fn other(self) -> Self {
        match self {
            Self::From => Self::To,
            Self::To   => Self::From,
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::From => "from",
            Self::To   => "to",
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Rule {
    MissingAccount(Side),
    SuspendedAccount(Side),
    MissingOwner(Side),
    /// Effect: suspend this side's account.
    BannedOwner(Side),
    /// Effect: ban the counterpart's owner and suspend the counterpart's account.
    CriminalOwner(Side),
}

/// Evaluation order. Never reorder: ledger entry order depends on it.
const RULES: [Rule; 10] = [
    Rule::MissingAccount(Side::From),
    Rule::MissingAccount(Side::To),
    Rule::SuspendedAccount(Side::From),
    Rule::SuspendedAccount(Side::To),
    Rule::MissingOwner(Side::From),
    Rule::MissingOwner(Side::To),
    Rule::BannedOwner(Side::From),
    Rule::BannedOwner(Side::To),
    Rule::CriminalOwner(Side::From),
    Rule::CriminalOwner(Side::To),
];

/// The run's mutable copies of the snapshot. Owned by one run only.
struct LocalCopies {
    payouts:   Vec<Payout>,
    accounts:  HashMap<String, Account>,
    customers: HashMap<String, Customer>,
}

impl LocalCopies {
    fn new(snapshot: &Snapshot) -> Self {
        Self {
            payouts: snapshot.payouts.clone(),
            accounts: snapshot
                .accounts
                .iter()
                .map(|a| (a.number.clone(), a.clone()))
                .collect(),
            customers: snapshot
                .customers
                .iter()
                .map(|c| (c.id.clone(), c.clone()))
                .collect(),
        }
    }
}

fn account_number(payout: &Payout, side: Side) -> &str {
    match side {
        Side::From => &payout.from,
        Side::To   => &payout.to,
    }
}

/// Id of the owning customer, if both the account and the customer exist.
fn owner_id(
    accounts: &HashMap<String, Account>,
    customers: &HashMap<String, Customer>,
    number: &str,
) -> Option<String> {
    accounts
        .get(number)
        .map(|a| &a.owner_id)
        .filter(|id| customers.contains_key(id.as_str()))
        .cloned()
}

pub struct PayoutRules {
    settlement_window: Duration,
}

impl Default for PayoutRules {
    fn default() -> Self {
        Self::new(DEFAULT_SETTLEMENT_WINDOW_HOURS)
    }
}

impl PayoutRules {
    pub fn new(settlement_window_hours: i64) -> Self {
        Self {
            settlement_window: Duration::hours(settlement_window_hours),
        }
    }

    /// Latest settlement time still eligible in a run with this cutoff.
    pub fn deadline(&self, cutoff: Timestamp) -> Timestamp {
        cutoff + self.settlement_window
    }

    /// Run the rules over every payout, then both cascade closure passes,
    /// then settle the candidates that are still eligible.
    ///
    /// The snapshot is never modified; all flag changes happen on
    /// local copies and are recorded in the returned ledger.
    pub fn process(&self, snapshot: &Snapshot) -> ChangeLedger {
        log::info!(
            "inputs: {} customers, {} accounts, {} payouts",
            snapshot.customers.len(),
            snapshot.accounts.len(),
            snapshot.payouts.len()
        );

        let mut local = LocalCopies::new(snapshot);
        let mut ledger = ChangeLedger::new();
        let deadline = self.deadline(snapshot.cutoff);

        let LocalCopies { payouts, accounts, customers } = &mut local;
        let candidates: Vec<usize> = payouts
            .iter_mut()
            .enumerate()
            .filter_map(|(i, p)| apply_rules(p, accounts, customers, &mut ledger).then_some(i))
            .collect();

        cascade::suspend_accounts_of_banned_customers(snapshot, &mut ledger);
        cascade::cancel_payouts_with_suspended_accounts(snapshot, &mut ledger);

        for i in candidates {
            try_settle(&mut payouts[i], accounts, customers, deadline, &mut ledger);
        }

        log::info!("ledger: {} entries", ledger.len());
        ledger
    }
}

/// Run every rule against `p`. Returns `true` if the payout may still settle.
fn apply_rules(
    p: &mut Payout,
    accounts: &mut HashMap<String, Account>,
    customers: &mut HashMap<String, Customer>,
    ledger: &mut ChangeLedger,
) -> bool {
    if p.is_terminal() {
        log::debug!("payout {}: already settled or canceled, left as is", p.id);
        return false;
    }

    log::debug!("payout {}: evaluating", p.id);

    for rule in RULES {
        apply_rule(rule, p, accounts, customers, ledger);
    }

    match disqualification(p, accounts, customers, ledger) {
        Some(reason) => {
            log::info!("payout {}: skipped due to {reason}", p.id);
            false
        }
        None => true,
    }
}

fn disqualification(
    p: &Payout,
    accounts: &HashMap<String, Account>,
    customers: &HashMap<String, Customer>,
    ledger: &ChangeLedger,
) -> Option<&'static str> {
    let from_owner = owner_id(accounts, customers, &p.from);
    let to_owner = owner_id(accounts, customers, &p.to);

    if ledger.is_canceled(&p.id) {
        Some("canceled payout")
    } else if ledger.is_suspended(&p.from) {
        Some("suspended from account")
    } else if ledger.is_suspended(&p.to) {
        Some("suspended to account")
    } else if from_owner.as_deref().is_some_and(|id| ledger.is_banned(id)) {
        Some("banned from customer")
    } else if to_owner.as_deref().is_some_and(|id| ledger.is_banned(id)) {
        Some("banned to customer")
    } else {
        None
    }
}

/// Balance and deadline gates, then settlement.
fn try_settle(
    p: &mut Payout,
    accounts: &mut HashMap<String, Account>,
    customers: &HashMap<String, Customer>,
    deadline: Timestamp,
    ledger: &mut ChangeLedger,
) {
    // The cascade passes may have disqualified a candidate since the rule pass.
    if let Some(reason) = disqualification(p, accounts, customers, ledger) {
        log::info!("payout {}: not settled due to {reason}", p.id);
        return;
    }

    // The rules cancel on a missing account, so both exist here.
    let (Some(from), Some(to)) = (accounts.get(&p.from), accounts.get(&p.to)) else {
        return;
    };

    if from.balance < p.amount {
        log::info!(
            "payout {}: canceled, insufficient balance ({} < {})",
            p.id, from.balance, p.amount
        );
        ledger.cancel_payout(p);
        return;
    }

    if p.t > deadline {
        log::info!("payout {}: left pending, due {} after deadline {deadline}", p.id, p.t);
        return;
    }

    if ledger.settle_payout(p, from, to) {
        log::info!("payout {}: settled {} from {} to {}", p.id, p.amount, p.from, p.to);
        if let Some(acc) = accounts.get_mut(&p.from) {
            acc.balance -= p.amount;
        }
        if let Some(acc) = accounts.get_mut(&p.to) {
            acc.balance += p.amount;
        }
    }
}

fn apply_rule(
    rule: Rule,
    p: &mut Payout,
    accounts: &mut HashMap<String, Account>,
    customers: &mut HashMap<String, Customer>,
    ledger: &mut ChangeLedger,
) {
    match rule {
        Rule::MissingAccount(side) => {
            if !accounts.contains_key(account_number(p, side)) {
                log::info!("payout {}: canceled, no {} account", p.id, side.label());
                ledger.cancel_payout(p);
            }
        }

        Rule::SuspendedAccount(side) => {
            if accounts.get(account_number(p, side)).is_some_and(|a| a.suspended) {
                log::info!("payout {}: canceled, suspended {} account", p.id, side.label());
                ledger.cancel_payout(p);
            }
        }

        // Also fires when the account itself is missing.
        Rule::MissingOwner(side) => {
            if owner_id(accounts, customers, account_number(p, side)).is_none() {
                log::info!("payout {}: canceled, no {} customer", p.id, side.label());
                ledger.cancel_payout(p);
            }
        }

        Rule::BannedOwner(side) => {
            let number = account_number(p, side).to_string();
            let banned = owner_id(accounts, customers, &number)
                .and_then(|id| customers.get(&id))
                .is_some_and(|c| c.banned);
            if banned {
                log::info!(
                    "payout {}: canceled, banned {} customer; suspending {number}",
                    p.id, side.label()
                );
                ledger.cancel_payout(p);
                if let Some(acc) = accounts.get_mut(&number) {
                    ledger.suspend_account(acc);
                }
            }
        }

        Rule::CriminalOwner(side) => {
            let criminal = owner_id(accounts, customers, account_number(p, side))
                .and_then(|id| customers.get(&id))
                .is_some_and(|c| c.criminal);
            if criminal {
                let counterpart = account_number(p, side.other()).to_string();
                log::info!(
                    "payout {}: canceled, criminal {} customer; banning owner of {counterpart}",
                    p.id, side.label()
                );
                ledger.cancel_payout(p);
                if let Some(id) = owner_id(accounts, customers, &counterpart) {
                    if let Some(cust) = customers.get_mut(&id) {
                        ledger.ban_customer(cust);
                    }
                }
                if let Some(acc) = accounts.get_mut(&counterpart) {
                    ledger.suspend_account(acc);
                }
            }
        }
    }
}
