//! Seeded mock data: customers, their accounts, and payouts between them.
//!
//! Ids follow the `cust_<n>` / `acc_<n>` / `payout_<n>` scheme so a
//! generated data set is easy to read back from the store.

use crate::{
    model::{Account, Customer, Payout, Snapshot},
    rng::{MockRng, MockStream},
    types::Timestamp,
};
use chrono::{Duration, TimeZone, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MockConfig {
    pub customers: usize,
    pub payouts: usize,
    pub max_accounts_per_customer: u64,
    pub banned_rate: f64,
    pub criminal_rate: f64,
    /// Share of payouts pointing at an account that does not exist.
    pub dangling_rate: f64,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            customers: 34,
            payouts: 60,
            max_accounts_per_customer: 3,
            banned_rate: 0.05,
            criminal_rate: 0.05,
            dangling_rate: 0.02,
        }
    }
}

fn bank_founded() -> Timestamp {
    Utc.with_ymd_and_hms(2020, 3, 27, 0, 0, 0)
        .single()
        .unwrap_or_default()
}

/// Generate a full snapshot for a run with the given cutoff.
pub fn generate(seed: u64, config: &MockConfig, cutoff: Timestamp) -> Snapshot {
    let customers = mock_customers(seed, config);
    let accounts = mock_accounts(seed, config, &customers);
    let payouts = mock_payouts(seed, config, &accounts, cutoff);
    log::info!(
        "mock data (seed {seed}): {} customers, {} accounts, {} payouts",
        customers.len(),
        accounts.len(),
        payouts.len()
    );
    Snapshot { cutoff, payouts, accounts, customers }
}

fn mock_customers(seed: u64, config: &MockConfig) -> Vec<Customer> {
    let mut rng = MockRng::for_stream(seed, MockStream::Customers);
    (0..config.customers)
        .map(|i| Customer {
            id: format!("cust_{i}"),
            name: format!("custname_{i}"),
            banned: rng.chance(config.banned_rate),
            criminal: rng.chance(config.criminal_rate),
            created_at: bank_founded() + Duration::days(i as i64),
            updated_at: None,
            banned_at: None,
        })
        .collect()
}

fn mock_accounts(seed: u64, config: &MockConfig, customers: &[Customer]) -> Vec<Account> {
    let mut rng = MockRng::for_stream(seed, MockStream::Accounts);
    let mut accounts = Vec::new();
    for cust in customers {
        let n = 1 + rng.next_u64_below(config.max_accounts_per_customer.max(1));
        for _ in 0..n {
            accounts.push(Account {
                number: format!("acc_{}", accounts.len()),
                owner_id: cust.id.clone(),
                // Up to 5,000.00, in cents.
                balance: Decimal::new(rng.range_inclusive(0, 500_000), 2),
                suspended: false,
                created_at: cust.created_at + Duration::days(1),
                updated_at: None,
                suspended_at: None,
            });
        }
    }
    accounts
}

fn mock_payouts(seed: u64, config: &MockConfig, accounts: &[Account], cutoff: Timestamp) -> Vec<Payout> {
    let mut rng = MockRng::for_stream(seed, MockStream::Payouts);
    if accounts.is_empty() {
        return Vec::new();
    }

    let pick = |rng: &mut MockRng| {
        if rng.chance(config.dangling_rate) {
            format!("acc_missing_{}", rng.next_u64_below(1000))
        } else {
            accounts[rng.next_u64_below(accounts.len() as u64) as usize].number.clone()
        }
    };

    (0..config.payouts)
        .map(|i| {
            let from = pick(&mut rng);
            let to = pick(&mut rng);
            Payout {
                id: format!("payout_{i}"),
                from,
                to,
                remarks: None,
                // Due anywhere from a day before cutoff to four days after.
                t: cutoff + Duration::hours(rng.range_inclusive(-24, 96)),
                amount: Decimal::new(rng.range_inclusive(100, 100_000), 2),
                settled: false,
                canceled: false,
                created_at: cutoff - Duration::days(1),
                updated_at: None,
                settled_at: None,
                canceled_at: None,
            }
        })
        .collect()
}
