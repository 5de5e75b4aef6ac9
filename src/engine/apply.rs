//! Discount Calculator
//!
//! Per-kind monetary effects, computed against a mutable working copy of the
//! cart. Each rule operates on the then-current discounted subtotals of its
//! matched lines, so rules compound sequentially instead of stacking
//! independent discounts on the same dollar. All math stays in full-precision
//! [`Decimal`]; rounding happens once, in the aggregator.

use rust_decimal::Decimal;

use crate::{
    checkout::TransactionContext,
    pricing::{PricingError, percent_of, proportional_shares},
    rules::{PromotionRule, RuleKind},
};

/// A cart line's evolving pricing state.
#[derive(Debug)]
pub(crate) struct WorkingLine {
    /// Product identifier of the line.
    pub product_id: String,

    /// Submitted quantity.
    pub quantity: u32,

    /// Undiscounted line subtotal.
    pub original: Decimal,

    /// Line subtotal after the rules applied so far.
    pub current: Decimal,

    /// Rules that reduced this line, in application order.
    pub applied_rule_ids: Vec<String>,
}

/// The mutable order state an evaluation applies discounts to.
#[derive(Debug)]
pub(crate) struct WorkingCart {
    /// Line pricing states, in cart order.
    pub lines: Vec<WorkingLine>,

    /// The order shipping fee.
    pub shipping: Decimal,

    /// Whether a rule waived the shipping fee.
    pub shipping_waived: bool,
}

impl WorkingCart {
    /// Build the working state from a transaction context.
    pub(crate) fn from_context(ctx: &TransactionContext<'_>) -> Result<Self, PricingError> {
        let lines = ctx
            .lines()
            .iter()
            .map(|line| {
                let subtotal = line
                    .unit_price()
                    .amount()
                    .checked_mul(Decimal::from(line.quantity()))
                    .ok_or(PricingError::Overflow)?;

                Ok(WorkingLine {
                    product_id: line.product_id().to_string(),
                    quantity: line.quantity(),
                    original: subtotal,
                    current: subtotal,
                    applied_rule_ids: Vec::new(),
                })
            })
            .collect::<Result<Vec<_>, PricingError>>()?;

        Ok(Self {
            lines,
            shipping: *ctx.shipping_fee().amount(),
            shipping_waived: false,
        })
    }

    fn matched(&self, indices: &[usize]) -> impl Iterator<Item = &WorkingLine> {
        self.lines
            .iter()
            .enumerate()
            .filter(|(i, _)| indices.contains(i))
            .map(|(_, line)| line)
    }

    fn matched_mut(&mut self, indices: &[usize]) -> impl Iterator<Item = &mut WorkingLine> {
        self.lines
            .iter_mut()
            .enumerate()
            .filter(|(i, _)| indices.contains(i))
            .map(|(_, line)| line)
    }

    fn matched_total(&self, indices: &[usize]) -> Result<Decimal, PricingError> {
        self.matched(indices)
            .try_fold(Decimal::ZERO, |acc, line| acc.checked_add(line.current))
            .ok_or(PricingError::Overflow)
    }
}

/// Clamp a discount to the line's current subtotal, apply it and record the
/// rule on the line. Returns the amount actually taken off.
fn reduce(line: &mut WorkingLine, discount: Decimal, rule_id: &str) -> Result<Decimal, PricingError> {
    let discount = discount.min(line.current).max(Decimal::ZERO);

    if discount > Decimal::ZERO {
        line.current = line
            .current
            .checked_sub(discount)
            .ok_or(PricingError::Overflow)?;
        line.applied_rule_ids.push(rule_id.to_string());
    }

    Ok(discount)
}

/// Apply one admitted rule to the working cart.
///
/// Returns the rule's total monetary effect at full precision; zero means
/// the rule had no effect (and the aggregator will not report it applied,
/// free shipping aside).
///
/// # Errors
///
/// Returns a [`PricingError`] if the decimal arithmetic cannot be safely
/// represented.
pub(crate) fn apply_rule(
    rule: &PromotionRule,
    indices: &[usize],
    cart: &mut WorkingCart,
) -> Result<Decimal, PricingError> {
    match rule.kind {
        RuleKind::Percent => apply_percent(rule, indices, cart),
        RuleKind::FixedAmount => apply_fixed_amount(rule, indices, cart),
        RuleKind::UnitPriceOverride => apply_unit_price_override(rule, indices, cart),
        RuleKind::BuyXGetY => apply_buy_x_get_y(rule, indices, cart),
        RuleKind::BundlePrice => apply_bundle_price(rule, indices, cart),
        RuleKind::FreeShipping => Ok(apply_free_shipping(cart)),
        // Filtered out upstream; an unknown kind never has an effect.
        RuleKind::Unknown => Ok(Decimal::ZERO),
    }
}

fn apply_percent(
    rule: &PromotionRule,
    indices: &[usize],
    cart: &mut WorkingCart,
) -> Result<Decimal, PricingError> {
    let mut total = Decimal::ZERO;

    for line in cart.matched_mut(indices) {
        let discount = percent_of(line.current, rule.value)?;

        total = total
            .checked_add(reduce(line, discount, &rule.id)?)
            .ok_or(PricingError::Overflow)?;
    }

    Ok(total)
}

fn apply_fixed_amount(
    rule: &PromotionRule,
    indices: &[usize],
    cart: &mut WorkingCart,
) -> Result<Decimal, PricingError> {
    let weights: Vec<Decimal> = cart.matched(indices).map(|line| line.current).collect();
    let matched_total = cart.matched_total(indices)?;
    let pool = rule.value.min(matched_total);
    let shares = proportional_shares(pool, &weights)?;

    let mut total = Decimal::ZERO;

    for (line, share) in cart.matched_mut(indices).zip(shares) {
        total = total
            .checked_add(reduce(line, share, &rule.id)?)
            .ok_or(PricingError::Overflow)?;
    }

    Ok(total)
}

fn apply_unit_price_override(
    rule: &PromotionRule,
    indices: &[usize],
    cart: &mut WorkingCart,
) -> Result<Decimal, PricingError> {
    let Some(override_price) = rule.unit_price else {
        return Ok(Decimal::ZERO);
    };

    let mut total = Decimal::ZERO;

    for line in cart.matched_mut(indices) {
        // The first `min_quantity` units take the override; the rest keep
        // their current per-unit price.
        let covered = rule
            .min_quantity
            .map_or(line.quantity, |min| min.min(line.quantity));
        let remainder = line.quantity - covered;

        let per_unit = line
            .current
            .checked_div(Decimal::from(line.quantity))
            .ok_or(PricingError::Overflow)?;

        let target = Decimal::from(covered)
            .checked_mul(override_price)
            .ok_or(PricingError::Overflow)?
            .checked_add(
                Decimal::from(remainder)
                    .checked_mul(per_unit)
                    .ok_or(PricingError::Overflow)?,
            )
            .ok_or(PricingError::Overflow)?;

        // A discount mechanic never raises a charge; `reduce` clamps at zero.
        let discount = line
            .current
            .checked_sub(target)
            .ok_or(PricingError::Overflow)?;

        total = total
            .checked_add(reduce(line, discount, &rule.id)?)
            .ok_or(PricingError::Overflow)?;
    }

    Ok(total)
}

fn apply_buy_x_get_y(
    rule: &PromotionRule,
    indices: &[usize],
    cart: &mut WorkingCart,
) -> Result<Decimal, PricingError> {
    let group = rule.min_quantity.unwrap_or(1).max(1);
    let mut total = Decimal::ZERO;

    for line in cart.matched_mut(indices) {
        // One unit per complete group of `min_quantity` units is reduced.
        let groups = line.quantity / group;

        if groups == 0 {
            continue;
        }

        let per_unit = line
            .current
            .checked_div(Decimal::from(line.quantity))
            .ok_or(PricingError::Overflow)?;
        let reduced_units = per_unit
            .checked_mul(Decimal::from(groups))
            .ok_or(PricingError::Overflow)?;
        let discount = percent_of(reduced_units, rule.value)?;

        total = total
            .checked_add(reduce(line, discount, &rule.id)?)
            .ok_or(PricingError::Overflow)?;
    }

    Ok(total)
}

fn apply_bundle_price(
    rule: &PromotionRule,
    indices: &[usize],
    cart: &mut WorkingCart,
) -> Result<Decimal, PricingError> {
    let Some(bundle_price) = rule.unit_price else {
        return Ok(Decimal::ZERO);
    };

    // Upstream filtering matched the lines; re-validate completeness here so
    // a partial bundle can never charge the bundle price.
    let required = rule.min_quantity.unwrap_or(1);
    let complete = rule.scope.products.iter().all(|product_id| {
        cart.matched(indices)
            .any(|line| line.product_id == product_id && line.quantity >= required)
    });

    if !complete {
        return Ok(Decimal::ZERO);
    }

    let matched_total = cart.matched_total(indices)?;
    let pool = matched_total
        .checked_sub(bundle_price)
        .ok_or(PricingError::Overflow)?;

    if pool <= Decimal::ZERO {
        return Ok(Decimal::ZERO);
    }

    let weights: Vec<Decimal> = cart.matched(indices).map(|line| line.current).collect();
    let shares = proportional_shares(pool, &weights)?;

    let mut total = Decimal::ZERO;

    for (line, share) in cart.matched_mut(indices).zip(shares) {
        total = total
            .checked_add(reduce(line, share, &rule.id)?)
            .ok_or(PricingError::Overflow)?;
    }

    Ok(total)
}

fn apply_free_shipping(cart: &mut WorkingCart) -> Decimal {
    let amount = cart.shipping;

    cart.shipping = Decimal::ZERO;
    cart.shipping_waived = true;

    amount
}
