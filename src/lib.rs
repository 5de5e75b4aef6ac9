//! Promenade
//!
//! Promenade is a promotion applicability and pricing-resolution engine for retail
//! checkout. Given an immutable snapshot of promotion rules and a transaction
//! context, it decides which rules apply, how they combine under priority and
//! stacking semantics, and the resulting monetary adjustments.

pub mod catalog;
pub mod checkout;
pub mod engine;
pub mod ids;
pub mod ledger;
pub mod pricing;
pub mod rules;
