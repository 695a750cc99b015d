//! Entity model: the records a reconciliation run reads.
//!
//! Field names match the persisted documents. Lifecycle flags are
//! always serialized so that store filters such as `suspended == false`
//! match records that were never suspended.

use crate::types::{AccountNumber, EntityId, Timestamp};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payout {
    pub id: EntityId,
    pub from: AccountNumber,
    pub to: AccountNumber,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remarks: Option<String>,
    /// Settlement time: the instant the payout is due.
    pub t: Timestamp,
    pub amount: Decimal,
    #[serde(default)]
    pub settled: bool,
    #[serde(default)]
    pub canceled: bool,
    pub created_at: Timestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settled_at: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub canceled_at: Option<Timestamp>,
}

impl Payout {
    /// Terminal payouts are never touched again.
    pub fn is_terminal(&self) -> bool {
        self.settled || self.canceled
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub number: AccountNumber,
    pub owner_id: EntityId,
    pub balance: Decimal,
    #[serde(default)]
    pub suspended: bool,
    pub created_at: Timestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suspended_at: Option<Timestamp>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub id: EntityId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub banned: bool,
    /// External risk signal. Read, never written, by the engine.
    #[serde(default)]
    pub criminal: bool,
    pub created_at: Timestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub banned_at: Option<Timestamp>,
}

/// One full read of the three collections, plus the run's cutoff.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Settlement date cutoff. Payouts due after `cutoff + window` stay pending.
    pub cutoff: Timestamp,
    pub payouts: Vec<Payout>,
    pub accounts: Vec<Account>,
    pub customers: Vec<Customer>,
}
