pub mod cascade;
pub mod change;
pub mod config;
pub mod document;
pub mod error;
pub mod harness;
pub mod ledger;
pub mod mock;
pub mod model;
pub mod payout_job;
pub mod projection;
pub mod rng;
pub mod rules;
pub mod store;
pub mod types;
