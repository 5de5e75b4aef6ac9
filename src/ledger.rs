//! Redemption Ledger
//!
//! Boundary to the persisted redemption counters. The ledger is the only
//! shared mutable state the engine touches: evaluation only reads it, and
//! committed orders advance it through an atomic check-and-increment that
//! refuses to move past a rule's caps.

use std::sync::{Mutex, MutexGuard, PoisonError};

use rustc_hash::FxHashMap;
use thiserror::Error;

use crate::rules::limits::Limits;

/// Errors reported by a ledger backend.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// The backing store could not be read or written.
    #[error("ledger backend failure: {0}")]
    Backend(String),
}

/// Per-rule redemption counters, keyed globally and by customer.
pub trait RedemptionLedger {
    /// Return how many times the rule has been redeemed by the customer.
    ///
    /// # Errors
    ///
    /// Returns a [`LedgerError`] if the backing store cannot be read.
    fn customer_count(&self, rule_id: &str, customer_id: &str) -> Result<u64, LedgerError>;

    /// Return how many times the rule has been redeemed in total.
    ///
    /// # Errors
    ///
    /// Returns a [`LedgerError`] if the backing store cannot be read.
    fn global_count(&self, rule_id: &str) -> Result<u64, LedgerError>;

    /// Record one redemption, atomically.
    ///
    /// The increment succeeds and returns `true` only if the post-increment
    /// counts stay within the rule's `per_customer` and `total_redemptions`
    /// caps; otherwise nothing is written and `false` is returned. Anonymous
    /// redemptions (no customer id) advance only the global counter.
    ///
    /// # Errors
    ///
    /// Returns a [`LedgerError`] if the backing store cannot be written.
    fn try_increment(
        &self,
        rule_id: &str,
        customer_id: Option<&str>,
        limits: &Limits,
    ) -> Result<bool, LedgerError>;
}

#[derive(Debug, Default)]
struct Counters {
    global: FxHashMap<String, u64>,
    per_customer: FxHashMap<(String, String), u64>,
}

/// A mutex-guarded in-memory ledger for embedding applications and tests.
#[derive(Debug, Default)]
pub struct InMemoryLedger {
    counters: Mutex<Counters>,
}

impl InMemoryLedger {
    /// Create a ledger with all counters at zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Counters> {
        // The maps are updated in a single step, so a poisoned lock cannot
        // hold a half-written state; recover the guard.
        self.counters
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl RedemptionLedger for InMemoryLedger {
    fn customer_count(&self, rule_id: &str, customer_id: &str) -> Result<u64, LedgerError> {
        let counters = self.lock();
        let key = (rule_id.to_string(), customer_id.to_string());

        Ok(counters.per_customer.get(&key).copied().unwrap_or(0))
    }

    fn global_count(&self, rule_id: &str) -> Result<u64, LedgerError> {
        Ok(self.lock().global.get(rule_id).copied().unwrap_or(0))
    }

    fn try_increment(
        &self,
        rule_id: &str,
        customer_id: Option<&str>,
        limits: &Limits,
    ) -> Result<bool, LedgerError> {
        let mut counters = self.lock();

        let global = counters.global.get(rule_id).copied().unwrap_or(0);
        if limits
            .total_redemptions
            .is_some_and(|cap| global >= cap)
        {
            return Ok(false);
        }

        // The per-customer counter advances for every known customer, capped
        // or not; history must survive a later cap change on the rule.
        if let Some(customer) = customer_id {
            let key = (rule_id.to_string(), customer.to_string());
            let count = counters.per_customer.get(&key).copied().unwrap_or(0);

            if limits
                .per_customer
                .is_some_and(|cap| count >= u64::from(cap))
            {
                return Ok(false);
            }

            *counters.per_customer.entry(key).or_insert(0) += 1;
        }

        *counters.global.entry(rule_id.to_string()).or_insert(0) += 1;

        Ok(true)
    }
}
