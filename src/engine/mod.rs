//! Promotion Engine
//!
//! Resolves which promotion rules apply to a checkout and what they are
//! worth. Evaluation runs a fixed pipeline over an immutable rule snapshot:
//! candidate filtering, priority/stacking resolution, limit enforcement,
//! sequential discount application and result aggregation. Evaluation never
//! writes to the redemption ledger; [`Engine::commit`] does, revoking and
//! re-evaluating when a concurrent order wins a contended redemption.

use rust_decimal::Decimal;
use rustc_hash::FxHashSet;
use rusty_money::iso::Currency;
use thiserror::Error;

use crate::{
    catalog::CatalogIndex,
    checkout::TransactionContext,
    ledger::{LedgerError, RedemptionLedger},
    pricing::{
        AppliedRule, LinePricing, PricingError, PricingResult, RejectedRule, round_half_up,
        to_money,
    },
    rules::{PromotionRule, RuleKind},
};

use self::apply::WorkingCart;

mod apply;
mod candidates;
mod enforcement;
mod stacking;

/// Errors surfaced by an evaluation or commit.
#[derive(Debug, Error)]
pub enum EvaluateError {
    /// The redemption ledger backend failed.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// Discount arithmetic could not be represented.
    #[error(transparent)]
    Pricing(#[from] PricingError),
}

/// The outcome of committing an order's promotions.
#[derive(Debug)]
pub struct CommitOutcome {
    /// The pricing the order was committed at.
    pub pricing: PricingResult,

    /// Rules that were priced during this commit but lost their redemption
    /// to a concurrent order and were revoked.
    pub revoked: Vec<String>,
}

impl CommitOutcome {
    /// Whether the committed pricing differs from what the caller last
    /// displayed, because a rule was revoked mid-commit.
    #[must_use]
    pub fn requires_reconfirmation(&self) -> bool {
        !self.revoked.is_empty()
    }
}

/// The applicability-resolution engine.
///
/// Holds borrows of the catalog index and redemption ledger; the rule
/// snapshot and transaction context are supplied per call.
#[derive(Debug)]
pub struct Engine<'a, C, L> {
    catalog: &'a C,
    ledger: &'a L,
}

impl<'a, C, L> Engine<'a, C, L>
where
    C: CatalogIndex,
    L: RedemptionLedger,
{
    /// Create an engine over the given catalog index and redemption ledger.
    #[must_use]
    pub fn new(catalog: &'a C, ledger: &'a L) -> Self {
        Self { catalog, ledger }
    }

    /// Price the transaction against the rule snapshot, without recording
    /// any redemption.
    ///
    /// # Errors
    ///
    /// Returns an [`EvaluateError`] if the ledger backend fails or discount
    /// arithmetic cannot be represented.
    pub fn evaluate(
        &self,
        rules: &[PromotionRule],
        ctx: &TransactionContext<'_>,
    ) -> Result<PricingResult, EvaluateError> {
        self.evaluate_inner(rules, ctx, &FxHashSet::default(), &FxHashSet::default())
    }

    /// Price the transaction as [`Engine::evaluate`] would, treating the
    /// given rules as if absent from the snapshot.
    ///
    /// # Errors
    ///
    /// Returns an [`EvaluateError`] if the ledger backend fails or discount
    /// arithmetic cannot be represented.
    pub fn evaluate_excluding(
        &self,
        rules: &[PromotionRule],
        ctx: &TransactionContext<'_>,
        excluded: &FxHashSet<String>,
    ) -> Result<PricingResult, EvaluateError> {
        self.evaluate_inner(rules, ctx, excluded, &FxHashSet::default())
    }

    fn evaluate_inner(
        &self,
        rules: &[PromotionRule],
        ctx: &TransactionContext<'_>,
        excluded: &FxHashSet<String>,
        committed: &FxHashSet<String>,
    ) -> Result<PricingResult, EvaluateError> {
        let candidates = candidates::collect(rules, ctx, self.catalog, excluded);
        let accepted = stacking::resolve_order(candidates);
        let (admitted, rejected) = enforcement::enforce(accepted, ctx, self.ledger, committed)?;

        let mut cart = WorkingCart::from_context(ctx)?;
        let mut applied = Vec::with_capacity(admitted.len());

        for entry in &admitted {
            let amount = apply::apply_rule(entry.rule, &entry.lines, &mut cart)?;

            // A rule with no monetary effect did not apply; a shipping waiver
            // counts even when the fee was already zero.
            if amount > Decimal::ZERO || matches!(entry.rule.kind, RuleKind::FreeShipping) {
                applied.push((entry.rule.id.clone(), amount));
            }
        }

        Ok(finalize(cart, applied, rejected, ctx.currency())?)
    }

    /// Price the transaction and record a redemption for every applied rule.
    ///
    /// Increments are claimed one rule at a time through the ledger's atomic
    /// check-and-increment. When a claim fails, a concurrent order exhausted
    /// the rule between evaluation and commit; the rule is revoked and the
    /// remaining cart is re-evaluated without it. Increments already claimed
    /// for other rules stay valid across re-evaluation, so the loop never
    /// strands a recorded redemption.
    ///
    /// # Errors
    ///
    /// Returns an [`EvaluateError`] if the ledger backend fails or discount
    /// arithmetic cannot be represented.
    pub fn commit(
        &self,
        rules: &[PromotionRule],
        ctx: &TransactionContext<'_>,
    ) -> Result<CommitOutcome, EvaluateError> {
        let mut excluded: FxHashSet<String> = FxHashSet::default();
        let mut committed: FxHashSet<String> = FxHashSet::default();
        let mut revoked = Vec::new();

        // Terminates: every retry permanently excludes at least one rule.
        loop {
            let pricing = self.evaluate_inner(rules, ctx, &excluded, &committed)?;
            let mut lost_race = false;

            for applied in &pricing.applied_rules {
                if committed.contains(&applied.rule_id) {
                    continue;
                }

                let Some(rule) = rules.iter().find(|rule| rule.id == applied.rule_id) else {
                    continue;
                };

                if self
                    .ledger
                    .try_increment(&rule.id, ctx.customer_id(), &rule.limits)?
                {
                    committed.insert(rule.id.clone());
                } else {
                    tracing::warn!(
                        rule = %rule.id,
                        "revoking promotion lost to a concurrent redemption"
                    );

                    excluded.insert(rule.id.clone());
                    revoked.push(rule.id.clone());
                    lost_race = true;

                    break;
                }
            }

            if !lost_race {
                return Ok(CommitOutcome { pricing, revoked });
            }
        }
    }
}

/// Round the working cart once and assemble the caller-facing result.
fn finalize(
    cart: WorkingCart,
    applied: Vec<(String, Decimal)>,
    rejected_rules: Vec<RejectedRule>,
    currency: &'static Currency,
) -> Result<PricingResult, PricingError> {
    let mut order_discount_total = Decimal::ZERO;
    let mut lines = Vec::with_capacity(cart.lines.len());

    for line in cart.lines {
        let original = round_half_up(line.original);
        let discounted = round_half_up(line.current);

        // The order total is the sum of the rounded line discounts, so the
        // two always reconcile exactly.
        let discount = original
            .checked_sub(discounted)
            .ok_or(PricingError::Overflow)?;

        order_discount_total = order_discount_total
            .checked_add(discount)
            .ok_or(PricingError::Overflow)?;

        lines.push(LinePricing {
            product_id: line.product_id,
            original_total: to_money(original, currency),
            discounted_total: to_money(discounted, currency),
            applied_rule_ids: line.applied_rule_ids,
        });
    }

    Ok(PricingResult {
        lines,
        order_discount_total: to_money(order_discount_total, currency),
        shipping_fee: to_money(round_half_up(cart.shipping), currency),
        shipping_waived: cart.shipping_waived,
        applied_rules: applied
            .into_iter()
            .map(|(rule_id, amount)| AppliedRule {
                rule_id,
                amount: to_money(round_half_up(amount), currency),
            })
            .collect(),
        rejected_rules,
    })
}
