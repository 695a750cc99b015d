//! Deterministic random number generation for mock data.
//!
//! RULE: mock generation never calls a platform RNG. Every stream is
//! derived from one master seed, so the same seed always yields the same
//! customers, accounts and payouts.
//!
//! Each entity kind gets its own stream, seeded from
//! (master_seed XOR stream_index * golden ratio). Changing how many
//! payouts are drawn therefore never changes the customers.

use rand::{RngCore, SeedableRng};
use rand_pcg::Pcg64Mcg;

pub struct MockRng {
    pub name: &'static str,
    inner: Pcg64Mcg,
}

impl MockRng {
    /// The index must never change once assigned.
    pub fn new(master_seed: u64, stream_index: u64) -> Self {
        let derived_seed = master_seed ^ (stream_index.wrapping_mul(0x9e37_79b9_7f4a_7c15));
        Self {
            name: "unnamed",
            inner: Pcg64Mcg::seed_from_u64(derived_seed),
        }
    }

    pub fn for_stream(master_seed: u64, stream: MockStream) -> Self {
        Self {
            name: stream.name(),
            ..Self::new(master_seed, stream as u64)
        }
    }

    /// Roll a float in [0.0, 1.0).
    pub fn next_f64(&mut self) -> f64 {
        let bits = self.inner.next_u64();
        (bits >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
    }

    /// Roll a u64 in [0, n).
    pub fn next_u64_below(&mut self, n: u64) -> u64 {
        assert!(n > 0, "n must be > 0");
        self.inner.next_u64() % n
    }

    /// Roll an i64 in [lo, hi].
    pub fn range_inclusive(&mut self, lo: i64, hi: i64) -> i64 {
        assert!(lo <= hi, "empty range {lo}..={hi}");
        lo + self.next_u64_below((hi - lo) as u64 + 1) as i64
    }

    /// Bernoulli trial: returns true with probability p.
    pub fn chance(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }
}

/// Stable stream assignments. Append only.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u64)]
pub enum MockStream {
    Customers = 0,
    Accounts = 1,
    Payouts = 2,
}

impl MockStream {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Customers => "customers",
            Self::Accounts => "accounts",
            Self::Payouts => "payouts",
        }
    }
}
