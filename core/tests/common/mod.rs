//! Fixture builders shared by the integration tests.
#![allow(dead_code)]

use chrono::{Duration, TimeZone, Utc};
use payout_recon_core::{
    model::{Account, Customer, Payout, Snapshot},
    store::DocStore,
    types::{Collection, Timestamp},
};
use rust_decimal::Decimal;

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn cutoff() -> Timestamp {
    Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()
}

pub fn dec(units: i64) -> Decimal {
    Decimal::new(units, 0)
}

pub fn customer(id: &str) -> Customer {
    Customer {
        id: id.into(),
        name: format!("name of {id}"),
        banned: false,
        criminal: false,
        created_at: cutoff() - Duration::days(365),
        updated_at: None,
        banned_at: None,
    }
}

pub fn criminal(id: &str) -> Customer {
    Customer { criminal: true, ..customer(id) }
}

pub fn banned(id: &str) -> Customer {
    Customer { banned: true, ..customer(id) }
}

pub fn account(number: &str, owner: &str, balance: i64) -> Account {
    Account {
        number: number.into(),
        owner_id: owner.into(),
        balance: dec(balance),
        suspended: false,
        created_at: cutoff() - Duration::days(300),
        updated_at: None,
        suspended_at: None,
    }
}

pub fn suspended(number: &str, owner: &str, balance: i64) -> Account {
    Account { suspended: true, ..account(number, owner, balance) }
}

/// A payout due exactly at cutoff.
pub fn payout(id: &str, from: &str, to: &str, amount: i64) -> Payout {
    Payout {
        id: id.into(),
        from: from.into(),
        to: to.into(),
        remarks: None,
        t: cutoff(),
        amount: dec(amount),
        settled: false,
        canceled: false,
        created_at: cutoff() - Duration::days(1),
        updated_at: None,
        settled_at: None,
        canceled_at: None,
    }
}

pub fn snapshot(customers: Vec<Customer>, accounts: Vec<Account>, payouts: Vec<Payout>) -> Snapshot {
    Snapshot { cutoff: cutoff(), payouts, accounts, customers }
}

/// Fresh in-memory store holding `snap`'s documents.
pub fn seeded_store(snap: &Snapshot) -> DocStore {
    let store = DocStore::in_memory().expect("in-memory store");
    store.migrate().expect("migration");
    store.insert_many(Collection::Customers, &snap.customers).expect("insert customers");
    store.insert_many(Collection::Accounts, &snap.accounts).expect("insert accounts");
    store.insert_many(Collection::Payouts, &snap.payouts).expect("insert payouts");
    store
}
