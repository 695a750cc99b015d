//! Ledger entries: the closed set of mutations a run can produce.
//!
//! Every variant knows its target collection, the filter identifying
//! its target record, and the partial update to apply. The update is
//! built at projection time from the run's single commit timestamp.

use crate::{
    document::{Filter, Update},
    types::{AccountNumber, Collection, EntityId, Timestamp},
};
use chrono::SecondsFormat;
use rust_decimal::Decimal;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Change {
    PayoutSettle {
        id: EntityId,
    },
    PayoutCancel {
        id: EntityId,
    },
    AccountSuspend {
        number: AccountNumber,
    },
    CustomerBan {
        id: EntityId,
    },
    /// Additive balance delta. Negative for the outgoing leg.
    AccountTransfer {
        number: AccountNumber,
        amount: Decimal,
        /// The settlement this leg belongs to.
        payout_id: EntityId,
    },
}

impl Change {
    pub fn collection(&self) -> Collection {
        match self {
            Self::PayoutSettle { .. } | Self::PayoutCancel { .. } => Collection::Payouts,
            Self::AccountSuspend { .. } | Self::AccountTransfer { .. } => Collection::Accounts,
            Self::CustomerBan { .. } => Collection::Customers,
        }
    }

    pub fn filter(&self) -> Filter {
        match self {
            Self::PayoutSettle { id } | Self::PayoutCancel { id } => {
                Filter::new().eq("id", id.as_str())
            }
            Self::AccountSuspend { number } => Filter::new().eq("number", number.as_str()),
            Self::CustomerBan { id } => Filter::new().eq("id", id.as_str()),
            // Suspended accounts never move money.
            Self::AccountTransfer { number, .. } => Filter::new()
                .eq("number", number.as_str())
                .eq("suspended", false),
        }
    }

    pub fn update(&self, now: Timestamp) -> Update {
        let now = stamp(now);
        match self {
            Self::PayoutSettle { .. } => Update::new()
                .set("settled", true)
                .set("settled_at", now.as_str())
                .set("updated_at", now),
            Self::PayoutCancel { .. } => Update::new()
                .set("canceled", true)
                .set("canceled_at", now.as_str())
                .set("updated_at", now),
            Self::AccountSuspend { .. } => Update::new()
                .set("suspended", true)
                .set("suspended_at", now.as_str())
                .set("updated_at", now),
            Self::CustomerBan { .. } => ban_update(&now),
            Self::AccountTransfer { amount, .. } => Update::new()
                .inc("balance", *amount)
                .set("updated_at", now),
        }
    }

    /// The payout whose settlement produced this entry, if any.
    pub fn settlement_of(&self) -> Option<&str> {
        match self {
            Self::PayoutSettle { id } => Some(id),
            Self::AccountTransfer { payout_id, .. } => Some(payout_id),
            _ => None,
        }
    }
}

/// Timestamps in update documents use the same RFC 3339 form the entity
/// records serialize to.
pub(crate) fn stamp(now: Timestamp) -> String {
    now.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

/// Shared by single bans and the collapsed bulk ban.
pub(crate) fn ban_update(now: &str) -> Update {
    Update::new()
        .set("banned", true)
        .set("banned_at", now)
        .set("updated_at", now)
}
