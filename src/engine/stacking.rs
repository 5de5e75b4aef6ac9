//! Priority/Stacking Resolver
//!
//! Orders candidates deterministically and prunes them per stacking
//! semantics: a non-stackable rule is the last one admitted, blocking
//! everything of equal-or-lower precedence behind it without evicting rules
//! already locked in ahead of it.

use super::candidates::Candidate;

/// Sort candidates into application order and apply the stacking cutoff.
///
/// Candidates are ordered by ascending priority, tie-broken by snapshot
/// position, so the result is identical across runs for the same snapshot.
pub(crate) fn resolve_order(mut candidates: Vec<Candidate<'_>>) -> Vec<Candidate<'_>> {
    candidates.sort_by_key(|candidate| (candidate.rule.priority, candidate.position));

    let mut accepted = Vec::with_capacity(candidates.len());

    for candidate in candidates {
        let stackable = candidate.rule.stackable;

        accepted.push(candidate);

        if !stackable {
            break;
        }
    }

    accepted
}
