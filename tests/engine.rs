//! End-to-end engine scenarios over the public API.

use promenade::{
    catalog::InMemoryCatalog,
    checkout::{CartLine, TransactionContext},
    engine::Engine,
    ids::IdSet,
    ledger::InMemoryLedger,
    pricing::RejectReason,
    rules::{PromotionRule, RuleKind, limits::Limits, scope::Scope},
};
use rust_decimal::Decimal;
use rusty_money::{Money, iso::USD};
use testresult::TestResult;

fn context<'a>(lines: Vec<CartLine<'a>>) -> TransactionContext<'a> {
    TransactionContext::new("pos", "2026-08-27T12:00:00Z".parse().unwrap(), USD)
        .with_customer("alice")
        .with_lines(lines)
        .unwrap()
}

fn percent_rule(id: &str, percent: u32) -> PromotionRule {
    let mut rule = PromotionRule::new(id, RuleKind::Percent);
    rule.value = Decimal::from(percent);
    rule
}

#[test]
fn unrestricted_scope_matches_every_line() -> TestResult {
    let catalog = InMemoryCatalog::new();
    let ledger = InMemoryLedger::new();
    let engine = Engine::new(&catalog, &ledger);

    let ctx = context(vec![
        CartLine::new("cola", 1, Money::from_minor(100_00, USD)),
        CartLine::new("bread", 1, Money::from_minor(50_00, USD)),
    ]);

    let result = engine.evaluate(&[percent_rule("storewide", 10)], &ctx)?;

    assert_eq!(result.lines[0].discounted_total, Money::from_minor(90_00, USD));
    assert_eq!(result.lines[1].discounted_total, Money::from_minor(45_00, USD));
    assert_eq!(result.order_discount_total, Money::from_minor(15_00, USD));

    Ok(())
}

#[test]
fn category_scope_resolves_through_the_catalog_index() -> TestResult {
    let mut catalog = InMemoryCatalog::new();
    catalog.add_to_category("beverages", "cola");

    let ledger = InMemoryLedger::new();
    let engine = Engine::new(&catalog, &ledger);

    let ctx = context(vec![
        CartLine::new("cola", 1, Money::from_minor(100_00, USD)),
        CartLine::new("bread", 1, Money::from_minor(50_00, USD)),
    ]);

    let mut rule = percent_rule("beverage-sale", 10);
    rule.scope = Scope {
        categories: IdSet::from_strs(&["beverages"]),
        ..Scope::default()
    };

    let result = engine.evaluate(&[rule], &ctx)?;

    assert_eq!(result.lines[0].discounted_total, Money::from_minor(90_00, USD));
    // The bread line is outside the category and untouched.
    assert_eq!(result.lines[1].discounted_total, Money::from_minor(50_00, USD));

    Ok(())
}

#[test]
fn priorities_decide_application_order() -> TestResult {
    let catalog = InMemoryCatalog::new();
    let ledger = InMemoryLedger::new();
    let engine = Engine::new(&catalog, &ledger);

    let ctx = context(vec![CartLine::new("cola", 1, Money::from_minor(100_00, USD))]);

    let mut a = percent_rule("a", 10);
    a.priority = 1;
    let mut b = percent_rule("b", 10);
    b.priority = 2;

    // Present b first; a's lower priority must still apply first.
    let result = engine.evaluate(&[b, a], &ctx)?;

    assert_eq!(result.lines[0].applied_rule_ids, ["a", "b"]);
    // Sequential compounding: 100 -> 90 -> 81.
    assert_eq!(result.lines[0].discounted_total, Money::from_minor(81_00, USD));

    Ok(())
}

#[test]
fn equal_priorities_fall_back_to_snapshot_order() -> TestResult {
    let catalog = InMemoryCatalog::new();
    let ledger = InMemoryLedger::new();
    let engine = Engine::new(&catalog, &ledger);

    let ctx = context(vec![CartLine::new("cola", 1, Money::from_minor(100_00, USD))]);

    let result = engine.evaluate(&[percent_rule("first", 10), percent_rule("second", 10)], &ctx)?;

    assert_eq!(result.lines[0].applied_rule_ids, ["first", "second"]);

    Ok(())
}

#[test]
fn non_stackable_rule_suppresses_lower_precedence_rules() -> TestResult {
    let catalog = InMemoryCatalog::new();
    let ledger = InMemoryLedger::new();
    let engine = Engine::new(&catalog, &ledger);

    let ctx = context(vec![CartLine::new("cola", 1, Money::from_minor(100_00, USD))]);

    let mut exclusive = percent_rule("exclusive", 20);
    exclusive.priority = 1;
    exclusive.stackable = false;
    let blocked = percent_rule("blocked", 10);

    let result = engine.evaluate(&[exclusive, blocked], &ctx)?;

    assert_eq!(result.applied_rules.len(), 1);
    assert_eq!(result.applied_rules[0].rule_id, "exclusive");
    assert_eq!(result.lines[0].discounted_total, Money::from_minor(80_00, USD));

    Ok(())
}

#[test]
fn per_order_cap_limits_line_instances() -> TestResult {
    let catalog = InMemoryCatalog::new();
    let ledger = InMemoryLedger::new();
    let engine = Engine::new(&catalog, &ledger);

    let ctx = context(vec![
        CartLine::new("cola", 1, Money::from_minor(100_00, USD)),
        CartLine::new("water", 1, Money::from_minor(100_00, USD)),
    ]);

    let mut rule = percent_rule("one-per-order", 10);
    rule.limits = Limits::with_per_order(1);

    let result = engine.evaluate(&[rule], &ctx)?;

    // Two qualifying lines, exactly one applied instance.
    assert_eq!(result.lines[0].discounted_total, Money::from_minor(90_00, USD));
    assert_eq!(result.lines[1].discounted_total, Money::from_minor(100_00, USD));
    assert_eq!(result.order_discount_total, Money::from_minor(10_00, USD));

    Ok(())
}

#[test]
fn buy_three_get_one_free_over_six_units() -> TestResult {
    let catalog = InMemoryCatalog::new();
    let ledger = InMemoryLedger::new();
    let engine = Engine::new(&catalog, &ledger);

    let ctx = context(vec![CartLine::new("cola", 6, Money::from_minor(2_00, USD))]);

    let mut rule = PromotionRule::new("three-for-two", RuleKind::BuyXGetY);
    rule.value = Decimal::ONE_HUNDRED;
    rule.min_quantity = Some(3);

    let result = engine.evaluate(&[rule], &ctx)?;

    // Two complete groups of three: two of the six units free.
    assert_eq!(result.order_discount_total, Money::from_minor(4_00, USD));
    assert_eq!(result.lines[0].discounted_total, Money::from_minor(8_00, USD));

    Ok(())
}

#[test]
fn bundle_price_charges_the_configured_total() -> TestResult {
    let catalog = InMemoryCatalog::new();
    let ledger = InMemoryLedger::new();
    let engine = Engine::new(&catalog, &ledger);

    let ctx = context(vec![
        CartLine::new("burger", 1, Money::from_minor(3_00, USD)),
        CartLine::new("fries", 1, Money::from_minor(2_50, USD)),
    ]);

    let mut rule = PromotionRule::new("meal-deal", RuleKind::BundlePrice);
    rule.scope = Scope {
        products: IdSet::from_strs(&["burger", "fries"]),
        ..Scope::default()
    };
    rule.unit_price = Some(Decimal::from(5));

    let result = engine.evaluate(&[rule.clone()], &ctx)?;

    assert_eq!(result.order_discount_total, Money::from_minor(50, USD));

    // Missing one bundle product: no effect at all.
    let partial = context(vec![CartLine::new("burger", 1, Money::from_minor(3_00, USD))]);
    let result = engine.evaluate(&[rule], &partial)?;

    assert!(result.applied_rules.is_empty());
    assert_eq!(result.order_discount_total, Money::from_minor(0, USD));

    Ok(())
}

#[test]
fn bundle_without_designated_products_is_skipped_as_malformed() -> TestResult {
    let catalog = InMemoryCatalog::new();
    let ledger = InMemoryLedger::new();
    let engine = Engine::new(&catalog, &ledger);

    let ctx = context(vec![
        CartLine::new("cola", 1, Money::from_minor(100_00, USD)),
        CartLine::new("bread", 1, Money::from_minor(50_00, USD)),
    ]);

    // No designated products: must never degenerate into repricing the
    // whole cart to the bundle price.
    let mut rule = PromotionRule::new("empty-deal", RuleKind::BundlePrice);
    rule.unit_price = Some(Decimal::from(5));

    let result = engine.evaluate(&[rule], &ctx)?;

    assert!(result.applied_rules.is_empty());
    assert_eq!(result.order_discount_total, Money::from_minor(0, USD));
    assert_eq!(result.lines[0].discounted_total, Money::from_minor(100_00, USD));

    Ok(())
}

#[test]
fn free_shipping_waives_the_fee() -> TestResult {
    let catalog = InMemoryCatalog::new();
    let ledger = InMemoryLedger::new();
    let engine = Engine::new(&catalog, &ledger);

    let ctx = TransactionContext::new("web", "2026-08-27T12:00:00Z".parse()?, USD)
        .with_shipping_fee(Money::from_minor(5_99, USD))?
        .with_lines(vec![CartLine::new("cola", 1, Money::from_minor(100, USD))])?;

    let result = engine.evaluate(&[PromotionRule::new("ships-free", RuleKind::FreeShipping)], &ctx)?;

    assert!(result.shipping_waived);
    assert_eq!(result.shipping_fee, Money::from_minor(0, USD));
    assert_eq!(result.applied_rules[0].amount, Money::from_minor(5_99, USD));
    // Shipping is not a line discount.
    assert_eq!(result.order_discount_total, Money::from_minor(0, USD));

    Ok(())
}

#[test]
fn exhausted_global_cap_is_reported_with_its_reason() -> TestResult {
    let catalog = InMemoryCatalog::new();
    let ledger = InMemoryLedger::new();
    let engine = Engine::new(&catalog, &ledger);

    let mut rule = percent_rule("first-one", 10);
    rule.limits = Limits::with_total_redemptions(1);
    let rules = vec![rule];

    let ctx = context(vec![CartLine::new("cola", 1, Money::from_minor(100_00, USD))]);

    let first = engine.commit(&rules, &ctx)?;
    assert_eq!(first.pricing.applied_rules.len(), 1);

    let later = TransactionContext::new("pos", "2026-08-27T13:00:00Z".parse()?, USD)
        .with_customer("bob")
        .with_lines(vec![CartLine::new("cola", 1, Money::from_minor(100_00, USD))])?;
    let second = engine.evaluate(&rules, &later)?;

    assert!(second.applied_rules.is_empty());
    assert_eq!(second.rejected_rules.len(), 1);
    assert_eq!(
        second.rejected_rules[0].reason,
        RejectReason::TotalRedemptionsReached
    );
    assert_eq!(second.lines[0].discounted_total, Money::from_minor(100_00, USD));

    Ok(())
}

#[test]
fn per_customer_cap_tracks_each_customer_separately() -> TestResult {
    let catalog = InMemoryCatalog::new();
    let ledger = InMemoryLedger::new();
    let engine = Engine::new(&catalog, &ledger);

    let mut rule = percent_rule("welcome", 10);
    rule.limits = Limits::with_per_customer(1);
    let rules = vec![rule];

    let cart = || vec![CartLine::new("cola", 1, Money::from_minor(100_00, USD))];

    let alice = context(cart());
    engine.commit(&rules, &alice)?;

    // Alice is spent; Bob is not.
    let again = engine.evaluate(&rules, &alice)?;
    assert!(again.applied_rules.is_empty());

    let bob = TransactionContext::new("pos", "2026-08-27T12:00:00Z".parse()?, USD)
        .with_customer("bob")
        .with_lines(cart())?;
    let fresh = engine.evaluate(&rules, &bob)?;
    assert_eq!(fresh.applied_rules.len(), 1);

    Ok(())
}

#[test]
fn order_discount_total_equals_the_sum_of_line_discounts() -> TestResult {
    let catalog = InMemoryCatalog::new();
    let ledger = InMemoryLedger::new();
    let engine = Engine::new(&catalog, &ledger);

    let ctx = context(vec![
        CartLine::new("a", 3, Money::from_minor(3_33, USD)),
        CartLine::new("b", 1, Money::from_minor(9_99, USD)),
        CartLine::new("c", 2, Money::from_minor(12_49, USD)),
    ]);

    let mut fixed = PromotionRule::new("seven-off", RuleKind::FixedAmount);
    fixed.value = Decimal::from(7);
    fixed.priority = 1;

    let result = engine.evaluate(&[fixed, percent_rule("odd-percent", 13)], &ctx)?;

    let line_sum: Decimal = result
        .lines
        .iter()
        .map(|line| *line.original_total.amount() - *line.discounted_total.amount())
        .sum();

    assert_eq!(line_sum, *result.order_discount_total.amount());

    Ok(())
}

#[test]
fn display_view_carries_totals_but_no_rule_internals() -> TestResult {
    let catalog = InMemoryCatalog::new();
    let ledger = InMemoryLedger::new();
    let engine = Engine::new(&catalog, &ledger);

    let ctx = context(vec![CartLine::new("cola", 1, Money::from_minor(100_00, USD))]);
    let result = engine.evaluate(&[percent_rule("internal-name", 10)], &ctx)?;

    let view = result.display_view();

    assert_eq!(view.lines[0].original_total, Money::from_minor(100_00, USD));
    assert_eq!(view.lines[0].discounted_total, Money::from_minor(90_00, USD));
    assert_eq!(view.order_discount_total, Money::from_minor(10_00, USD));

    Ok(())
}

#[test]
fn channel_scope_restricts_where_a_rule_fires() -> TestResult {
    let catalog = InMemoryCatalog::new();
    let ledger = InMemoryLedger::new();
    let engine = Engine::new(&catalog, &ledger);

    let mut rule = percent_rule("web-only", 10);
    rule.scope = Scope {
        channels: IdSet::from_strs(&["web"]),
        ..Scope::default()
    };
    let rules = vec![rule];

    let cart = || vec![CartLine::new("cola", 1, Money::from_minor(100_00, USD))];

    let pos = context(cart());
    assert!(engine.evaluate(&rules, &pos)?.applied_rules.is_empty());

    let web = TransactionContext::new("web", "2026-08-27T12:00:00Z".parse()?, USD)
        .with_lines(cart())?;
    assert_eq!(engine.evaluate(&rules, &web)?.applied_rules.len(), 1);

    Ok(())
}
