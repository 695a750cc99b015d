//! Shared primitive types used across the reconciliation engine.

use chrono::{DateTime, Utc};

/// Identifier of a payout or a customer.
pub type EntityId = String;

/// Account number.
pub type AccountNumber = String;

/// Wall-clock instant. All timestamps are UTC.
pub type Timestamp = DateTime<Utc>;

/// Name of a document collection in the backing store.
pub type CollectionName = String;

pub const COLLECTION_PAYOUTS: &str = "payouts";
pub const COLLECTION_ACCOUNTS: &str = "accounts";
pub const COLLECTION_CUSTOMERS: &str = "customers";

/// The three collections the engine reads and writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Collection {
    Payouts,
    Accounts,
    Customers,
}

impl Collection {
    pub const ALL: [Collection; 3] = [Self::Customers, Self::Accounts, Self::Payouts];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Payouts   => COLLECTION_PAYOUTS,
            Self::Accounts  => COLLECTION_ACCOUNTS,
            Self::Customers => COLLECTION_CUSTOMERS,
        }
    }

    /// The field holding each document's identity.
    pub fn key_field(&self) -> &'static str {
        match self {
            Self::Payouts   => "id",
            Self::Accounts  => "number",
            Self::Customers => "id",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            COLLECTION_PAYOUTS   => Some(Self::Payouts),
            COLLECTION_ACCOUNTS  => Some(Self::Accounts),
            COLLECTION_CUSTOMERS => Some(Self::Customers),
            _ => None,
        }
    }
}
