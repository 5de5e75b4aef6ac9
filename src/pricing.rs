//! Pricing Math & Results
//!
//! Full-precision discount arithmetic and the result contract handed back to
//! checkout callers. Intermediate math stays in [`Decimal`] and is rounded
//! exactly once, at the end, to two decimal places using half-up rounding.

use decimal_percentage::Percentage;
use rust_decimal::{Decimal, RoundingStrategy};
use rusty_money::{Money, iso::Currency};
use thiserror::Error;

/// Errors specific to discount calculations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PricingError {
    /// Checked decimal arithmetic overflowed.
    #[error("discount arithmetic overflowed")]
    Overflow,
}

/// Calculate `percent` percent of `amount` at full precision.
///
/// `percent` is expressed the way rules carry it: `10` means 10%.
///
/// # Errors
///
/// Returns [`PricingError::Overflow`] if the multiplication cannot be safely
/// represented.
pub fn percent_of(amount: Decimal, percent: Decimal) -> Result<Decimal, PricingError> {
    let fraction = percent
        .checked_div(Decimal::ONE_HUNDRED)
        .ok_or(PricingError::Overflow)?;
    let percentage = Percentage::from(fraction);

    (percentage * Decimal::ONE) // decimal_percentage doesn't expose the underlying Decimal
        .checked_mul(amount)
        .ok_or(PricingError::Overflow)
}

/// Split `pool` across `weights` proportionally to each weight's share of the
/// weight total.
///
/// The last positive-weight share absorbs the division residue so the shares
/// sum exactly to the pool; every share is capped at its own weight and never
/// negative. A non-positive weight total yields all-zero shares.
///
/// # Errors
///
/// Returns [`PricingError::Overflow`] if the arithmetic cannot be safely
/// represented.
pub fn proportional_shares(pool: Decimal, weights: &[Decimal]) -> Result<Vec<Decimal>, PricingError> {
    let total = weights
        .iter()
        .try_fold(Decimal::ZERO, |acc, weight| acc.checked_add(*weight))
        .ok_or(PricingError::Overflow)?;

    if total <= Decimal::ZERO || pool <= Decimal::ZERO {
        return Ok(vec![Decimal::ZERO; weights.len()]);
    }

    let mut shares = Vec::with_capacity(weights.len());
    let mut assigned = Decimal::ZERO;
    let last = weights.len().saturating_sub(1);

    for (i, weight) in weights.iter().enumerate() {
        let share = if i == last {
            pool.checked_sub(assigned).ok_or(PricingError::Overflow)?
        } else {
            pool.checked_mul(*weight)
                .ok_or(PricingError::Overflow)?
                .checked_div(total)
                .ok_or(PricingError::Overflow)?
        };

        let share = share.min(*weight).max(Decimal::ZERO);

        assigned = assigned.checked_add(share).ok_or(PricingError::Overflow)?;
        shares.push(share);
    }

    Ok(shares)
}

/// Round a full-precision amount to two decimal places, half-up.
#[must_use]
pub fn round_half_up(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Convert a rounded amount into display money.
#[must_use]
pub fn to_money(amount: Decimal, currency: &'static Currency) -> Money<'static, Currency> {
    Money::from_decimal(amount, currency)
}

/// Why a candidate rule was excluded by the limit enforcer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// The rule's per-order application cap was already spent.
    PerOrderLimitReached,

    /// The customer has exhausted the rule's per-customer redemptions.
    PerCustomerLimitReached,

    /// The rule's lifetime global redemption cap is exhausted.
    TotalRedemptionsReached,
}

/// A rule that survived resolution and produced a monetary effect.
#[derive(Debug, Clone, PartialEq)]
pub struct AppliedRule {
    /// Rule identifier.
    pub rule_id: String,

    /// The rule's total monetary effect on the order.
    pub amount: Money<'static, Currency>,
}

/// A rule excluded by the limit enforcer, with its reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedRule {
    /// Rule identifier.
    pub rule_id: String,

    /// Why the rule was excluded.
    pub reason: RejectReason,
}

/// Final pricing of one cart line.
#[derive(Debug, Clone, PartialEq)]
pub struct LinePricing {
    /// Product identifier of the line.
    pub product_id: String,

    /// The line's undiscounted total.
    pub original_total: Money<'static, Currency>,

    /// The line's total after all admitted rules were applied.
    pub discounted_total: Money<'static, Currency>,

    /// Identifiers of the rules that reduced this line, in application order.
    pub applied_rule_ids: Vec<String>,
}

/// The outcome of one checkout evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct PricingResult {
    /// Per-line original and discounted totals.
    pub lines: Vec<LinePricing>,

    /// Sum of all line-level discounts.
    pub order_discount_total: Money<'static, Currency>,

    /// The order shipping fee after evaluation.
    pub shipping_fee: Money<'static, Currency>,

    /// Whether a rule waived the shipping fee.
    pub shipping_waived: bool,

    /// Rules that produced a monetary effect, in application order.
    pub applied_rules: Vec<AppliedRule>,

    /// Rules excluded by the limit enforcer, with reasons.
    pub rejected_rules: Vec<RejectedRule>,
}

impl PricingResult {
    /// The subset of the result fit for a customer-facing display: totals
    /// only, no rule identifiers.
    #[must_use]
    pub fn display_view(&self) -> DisplayTotals {
        DisplayTotals {
            lines: self
                .lines
                .iter()
                .map(|line| DisplayLine {
                    product_id: line.product_id.clone(),
                    original_total: line.original_total.clone(),
                    discounted_total: line.discounted_total.clone(),
                })
                .collect(),
            order_discount_total: self.order_discount_total.clone(),
            shipping_waived: self.shipping_waived,
        }
    }
}

/// Customer-facing line totals.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayLine {
    /// Product identifier of the line.
    pub product_id: String,

    /// The line's undiscounted total.
    pub original_total: Money<'static, Currency>,

    /// The line's discounted total.
    pub discounted_total: Money<'static, Currency>,
}

/// Customer-facing order totals, stripped of rule internals.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayTotals {
    /// Per-line totals.
    pub lines: Vec<DisplayLine>,

    /// Total discount across all lines.
    pub order_discount_total: Money<'static, Currency>,

    /// Whether shipping was waived.
    pub shipping_waived: bool,
}
