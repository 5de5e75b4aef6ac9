//! Limit Enforcer
//!
//! Vetoes accepted rules that would exceed their per-order, per-customer or
//! global redemption caps. Per-order and per-customer caps are independent
//! gates: failing either excludes the rule, and the evaluation simply
//! proceeds without it — a cap is never a checkout failure.

use rustc_hash::FxHashSet;
use smallvec::SmallVec;

use crate::{
    checkout::TransactionContext,
    ledger::{LedgerError, RedemptionLedger},
    pricing::{RejectReason, RejectedRule},
    rules::PromotionRule,
};

use super::candidates::Candidate;

/// A rule that cleared every limit gate, with its (possibly capped) lines.
#[derive(Debug)]
pub(crate) struct Admitted<'r> {
    /// The underlying rule definition.
    pub rule: &'r PromotionRule,

    /// Matched line indices, truncated to the per-order instance cap for
    /// line-instanced kinds.
    pub lines: SmallVec<[usize; 4]>,
}

/// Enforce redemption caps over the accepted rules, in order.
///
/// Rules in `committed` already hold a ledger increment for this order, so
/// their ledger gates are skipped; re-reading the counters would count the
/// order's own redemption against itself.
///
/// # Errors
///
/// Returns a [`LedgerError`] if the ledger backend cannot be read.
pub(crate) fn enforce<'r, L: RedemptionLedger>(
    accepted: Vec<Candidate<'r>>,
    ctx: &TransactionContext<'_>,
    ledger: &L,
    committed: &FxHashSet<String>,
) -> Result<(Vec<Admitted<'r>>, Vec<RejectedRule>), LedgerError> {
    let mut admitted = Vec::with_capacity(accepted.len());
    let mut rejected = Vec::new();

    for candidate in accepted {
        let rule = candidate.rule;
        let mut lines = candidate.lines;

        if let Some(cap) = rule.limits.per_order {
            let cap = usize::try_from(cap).unwrap_or(usize::MAX);

            if cap == 0 {
                rejected.push(RejectedRule {
                    rule_id: rule.id.clone(),
                    reason: RejectReason::PerOrderLimitReached,
                });

                continue;
            }

            // Line-instanced kinds spend one instance per matched line;
            // order-level kinds spend a single instance regardless.
            if rule.kind.is_line_instanced() && lines.len() > cap {
                lines.truncate(cap);
            }
        }

        if !committed.contains(&rule.id) {
            if let Some(cap) = rule.limits.per_customer {
                // Anonymous transactions have nothing to key the counter on.
                if let Some(customer) = ctx.customer_id() {
                    if ledger.customer_count(&rule.id, customer)? >= u64::from(cap) {
                        rejected.push(RejectedRule {
                            rule_id: rule.id.clone(),
                            reason: RejectReason::PerCustomerLimitReached,
                        });

                        continue;
                    }
                }
            }

            if let Some(cap) = rule.limits.total_redemptions {
                if ledger.global_count(&rule.id)? >= cap {
                    rejected.push(RejectedRule {
                        rule_id: rule.id.clone(),
                        reason: RejectReason::TotalRedemptionsReached,
                    });

                    continue;
                }
            }
        }

        admitted.push(Admitted { rule, lines });
    }

    Ok((admitted, rejected))
}
