//! Promotion Rules
//!
//! The rule snapshot data model supplied by the Rule Store. Rules are
//! authored externally and handed to the engine as an immutable snapshot per
//! evaluation; the model therefore carries serde with the snapshot contract's
//! defaults, and a validation pass that lets the engine skip malformed
//! definitions instead of failing a checkout over one bad configuration.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::rules::{limits::Limits, schedule::Schedule, scope::Scope};

pub mod limits;
pub mod schedule;
pub mod scope;

/// The monetary mechanic of a promotion rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RuleKind {
    /// Reduce each matched line by `value` percent.
    Percent,

    /// Reduce the matched lines' combined subtotal by `value`, distributed
    /// proportionally.
    FixedAmount,

    /// Price the first `min_quantity` units (else all units) at `unit_price`.
    UnitPriceOverride,

    /// For every complete group of `min_quantity` units, reduce one unit by
    /// `value` percent (100 = free).
    BuyXGetY,

    /// Charge `unit_price` for the complete set of bundle products.
    BundlePrice,

    /// Zero the order's shipping fee.
    FreeShipping,

    /// A kind this engine version does not understand. Never matches.
    #[serde(other)]
    Unknown,
}

impl RuleKind {
    /// Whether `min_quantity` gates applicability for this kind.
    #[must_use]
    pub const fn is_quantity_gated(self) -> bool {
        matches!(
            self,
            Self::UnitPriceOverride | Self::BuyXGetY | Self::BundlePrice
        )
    }

    /// Whether each matched line counts as its own application instance for
    /// the per-order cap. Order-level kinds count as a single instance.
    #[must_use]
    pub const fn is_line_instanced(self) -> bool {
        matches!(self, Self::Percent | Self::UnitPriceOverride | Self::BuyXGetY)
    }
}

/// Errors detected in a rule definition.
///
/// A rule failing validation is skipped with a warning by the candidate
/// filter; it never matches and never aborts an evaluation.
#[derive(Debug, Error)]
pub enum RuleConfigError {
    /// The rule kind is not understood by this engine version.
    #[error("unknown rule kind")]
    UnknownKind,

    /// The rule identifier is blank.
    #[error("blank rule identifier")]
    BlankId,

    /// The rule value is negative.
    #[error("negative rule value: {0}")]
    NegativeValue(Decimal),

    /// A percent-based value lies outside 0..=100.
    #[error("percent value out of range: {0}")]
    PercentOutOfRange(Decimal),

    /// A unit price is required for this kind but missing or negative.
    #[error("missing or negative unit price")]
    InvalidUnitPrice,

    /// A positive minimum quantity is required for this kind.
    #[error("missing or zero minimum quantity")]
    InvalidMinQuantity,

    /// A bundle rule names no products to bundle.
    #[error("bundle rule without designated products")]
    EmptyBundle,

    /// The schedule names a timezone that cannot be resolved.
    #[error("unknown schedule timezone: {0}")]
    UnknownTimeZone(String),
}

fn default_true() -> bool {
    true
}

fn default_priority() -> i32 {
    100
}

/// A configurable marketing rule, as supplied by the Rule Store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromotionRule {
    /// Rule identifier.
    pub id: String,

    /// Display name.
    #[serde(default)]
    pub name: String,

    /// Optional redemption code.
    #[serde(default)]
    pub code: Option<String>,

    /// Monetary mechanic.
    pub kind: RuleKind,

    /// Mechanic value: a percentage for percent-based kinds, an amount for
    /// `FixedAmount`.
    #[serde(default)]
    pub value: Decimal,

    /// Configured price for `UnitPriceOverride` and `BundlePrice`.
    #[serde(default)]
    pub unit_price: Option<Decimal>,

    /// Whether the rule participates in evaluation at all.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Whether the rule may combine with other rules on one transaction.
    #[serde(default = "default_true")]
    pub stackable: bool,

    /// Application order; lower values are evaluated and applied first.
    #[serde(default = "default_priority")]
    pub priority: i32,

    /// Quantity threshold for quantity-sensitive kinds; ignored otherwise.
    #[serde(default)]
    pub min_quantity: Option<u32>,

    /// Targeting criteria.
    #[serde(default)]
    pub scope: Scope,

    /// Activation window.
    #[serde(default)]
    pub schedule: Schedule,

    /// Redemption caps.
    #[serde(default)]
    pub limits: Limits,
}

impl PromotionRule {
    /// Create an enabled, unrestricted, always-active rule with the snapshot
    /// contract's defaults.
    #[must_use]
    pub fn new(id: &str, kind: RuleKind) -> Self {
        Self {
            id: id.to_string(),
            name: id.to_string(),
            code: None,
            kind,
            value: Decimal::ZERO,
            unit_price: None,
            enabled: true,
            stackable: true,
            priority: default_priority(),
            min_quantity: None,
            scope: Scope::unrestricted(),
            schedule: Schedule::default(),
            limits: Limits::unlimited(),
        }
    }

    /// Check the definition for configuration errors.
    ///
    /// # Errors
    ///
    /// Returns the first [`RuleConfigError`] found. Callers skip such rules
    /// rather than failing the evaluation.
    pub fn validate(&self) -> Result<(), RuleConfigError> {
        if self.id.trim().is_empty() {
            return Err(RuleConfigError::BlankId);
        }

        if matches!(self.kind, RuleKind::Unknown) {
            return Err(RuleConfigError::UnknownKind);
        }

        if self.value < Decimal::ZERO {
            return Err(RuleConfigError::NegativeValue(self.value));
        }

        if matches!(self.kind, RuleKind::Percent | RuleKind::BuyXGetY)
            && self.value > Decimal::ONE_HUNDRED
        {
            return Err(RuleConfigError::PercentOutOfRange(self.value));
        }

        if matches!(self.kind, RuleKind::UnitPriceOverride | RuleKind::BundlePrice) {
            match self.unit_price {
                Some(price) if price >= Decimal::ZERO => {}
                _ => return Err(RuleConfigError::InvalidUnitPrice),
            }
        }

        if matches!(self.kind, RuleKind::BuyXGetY) && !self.min_quantity.is_some_and(|q| q > 0) {
            return Err(RuleConfigError::InvalidMinQuantity);
        }

        // A bundle is the co-presence of designated products; without any it
        // would degenerate into a wildcard reprice of the whole cart.
        if matches!(self.kind, RuleKind::BundlePrice) && self.scope.products.is_empty() {
            return Err(RuleConfigError::EmptyBundle);
        }

        if self.schedule.resolved_zone().is_none() {
            let name = self.schedule.time_zone.clone().unwrap_or_default();

            return Err(RuleConfigError::UnknownTimeZone(name));
        }

        Ok(())
    }
}
