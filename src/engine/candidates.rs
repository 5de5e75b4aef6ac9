//! Candidate Filter
//!
//! First stage of the pipeline: keep the rules that are enabled, well-formed,
//! time-active and scope-matched to at least one cart line, remembering which
//! lines matched for the later stages.

use rustc_hash::FxHashSet;
use smallvec::SmallVec;

use crate::{
    catalog::CatalogIndex,
    checkout::TransactionContext,
    rules::PromotionRule,
};

/// A rule that passed the candidate filter.
#[derive(Debug)]
pub(crate) struct Candidate<'r> {
    /// The underlying rule definition.
    pub rule: &'r PromotionRule,

    /// The rule's position in the snapshot, used as the deterministic
    /// tiebreaker for equal priorities.
    pub position: usize,

    /// Indices of the cart lines the rule's scope matched.
    pub lines: SmallVec<[usize; 4]>,
}

/// Filter the snapshot down to the rules eligible for this transaction.
///
/// Malformed rules are skipped with a warning — a bad configuration must
/// never break checkout, and must never match either.
pub(crate) fn collect<'r, C: CatalogIndex>(
    rules: &'r [PromotionRule],
    ctx: &TransactionContext<'_>,
    catalog: &C,
    excluded: &FxHashSet<String>,
) -> Vec<Candidate<'r>> {
    rules
        .iter()
        .enumerate()
        .filter_map(|(position, rule)| {
            if excluded.contains(&rule.id) || !rule.enabled {
                return None;
            }

            if let Err(error) = rule.validate() {
                tracing::warn!(rule = %rule.id, %error, "skipping malformed promotion rule");

                return None;
            }

            if !rule.schedule.is_active_at(ctx.now()) {
                return None;
            }

            let lines: SmallVec<[usize; 4]> = ctx
                .lines()
                .iter()
                .enumerate()
                .filter(|(_, line)| {
                    if !rule.scope.matches_line(ctx, line, catalog) {
                        return false;
                    }

                    // Quantity-gated kinds need the threshold met on the line itself.
                    !(rule.kind.is_quantity_gated()
                        && rule.min_quantity.is_some_and(|min| line.quantity() < min))
                })
                .map(|(i, _)| i)
                .collect();

            if lines.is_empty() {
                return None;
            }

            Some(Candidate {
                rule,
                position,
                lines,
            })
        })
        .collect()
}
