//! Redemption Limits

use serde::{Deserialize, Serialize};

/// Redemption caps for a promotion rule.
///
/// Each cap is optional; an absent cap means unlimited. `per_order` and
/// `per_customer` are independent gates: failing either excludes the rule.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Limits {
    /// Maximum number of application instances within a single order.
    pub per_order: Option<u32>,

    /// Maximum number of redemptions per customer, lifetime.
    pub per_customer: Option<u32>,

    /// Maximum number of redemptions across all customers, lifetime.
    pub total_redemptions: Option<u64>,
}

impl Limits {
    /// Create limits with no caps.
    #[must_use]
    pub const fn unlimited() -> Self {
        Self {
            per_order: None,
            per_customer: None,
            total_redemptions: None,
        }
    }

    /// Create limits with a per-order cap only.
    #[must_use]
    pub const fn with_per_order(cap: u32) -> Self {
        Self {
            per_order: Some(cap),
            per_customer: None,
            total_redemptions: None,
        }
    }

    /// Create limits with a per-customer cap only.
    #[must_use]
    pub const fn with_per_customer(cap: u32) -> Self {
        Self {
            per_order: None,
            per_customer: Some(cap),
            total_redemptions: None,
        }
    }

    /// Create limits with a lifetime global cap only.
    #[must_use]
    pub const fn with_total_redemptions(cap: u64) -> Self {
        Self {
            per_order: None,
            per_customer: None,
            total_redemptions: Some(cap),
        }
    }

    /// Check whether any cap is configured.
    #[must_use]
    pub const fn has_constraints(&self) -> bool {
        self.per_order.is_some() || self.per_customer.is_some() || self.total_redemptions.is_some()
    }
}
