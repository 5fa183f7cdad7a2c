// tests/pricing_tests.rs
mod common;

use common::*;
use ordergate::model::{CartLine, PriceBasis};
use ordergate::settings::PromotionRule;
use ordergate::validation::{pricing_order, ResolvedLine};
use ordergate::{CheckoutError, CheckoutSettings, PricingEngine};

fn addon_rule() -> PromotionRule {
  CheckoutSettings::default().promotions[0].clone()
}

fn resolved(line: CartLine, product: ordergate::model::Product) -> ResolvedLine {
  ResolvedLine { line, product }
}

#[test]
fn test_wholesale_price_applies_from_minimum_quantity() {
  let rules = [addon_rule()];
  let engine = PricingEngine::new(&rules);
  let beans = wholesale_product("beans", 12_000, 9_000, 5, 100);

  let at_minimum = engine.unit_price(&beans, 5, None, 0);
  assert_eq!(at_minimum.unit_price, 9_000);
  assert_eq!(at_minimum.basis, PriceBasis::Wholesale);

  let one_below = engine.unit_price(&beans, 4, None, 0);
  assert_eq!(one_below.unit_price, 12_000);
  assert_eq!(one_below.basis, PriceBasis::Retail);
}

#[test]
fn test_wholesale_needs_both_price_and_minimum() {
  let engine = PricingEngine::new(&[]);
  let mut half_configured = product("tea", 8_000, 50);
  half_configured.wholesale_price = Some(6_000);

  assert_eq!(engine.unit_price(&half_configured, 500, None, 0).unit_price, 8_000);
}

#[test]
fn test_promotion_requires_prior_subtotal_threshold() {
  let rules = [addon_rule()];
  let engine = PricingEngine::new(&rules);
  let mug = product("mug", 25_000, 3);

  let unlocked = engine.unit_price(&mug, 1, Some("addon"), 60_000);
  assert_eq!(unlocked.unit_price, 10_000);
  assert_eq!(unlocked.basis, PriceBasis::Promotion("addon".to_string()));

  let exactly_threshold = engine.unit_price(&mug, 1, Some("addon"), 50_000);
  assert_eq!(exactly_threshold.unit_price, 10_000);

  let locked = engine.unit_price(&mug, 1, Some("addon"), 49_999);
  assert_eq!(locked.unit_price, 25_000);
  assert_eq!(locked.basis, PriceBasis::Retail);
}

#[test]
fn test_promotion_requires_exact_quantity() {
  let rules = [addon_rule()];
  let engine = PricingEngine::new(&rules);
  let mug = product("mug", 25_000, 3);

  let quote = engine.unit_price(&mug, 2, Some("addon"), 100_000);
  assert_eq!(quote.unit_price, 25_000);
}

#[test]
fn test_unknown_promotion_tag_prices_normally() {
  let rules = [addon_rule()];
  let engine = PricingEngine::new(&rules);
  let mug = product("mug", 25_000, 3);

  assert_eq!(engine.unit_price(&mug, 1, Some("black-friday"), 100_000).unit_price, 25_000);
}

#[test]
fn test_promotional_line_priced_after_plain_lines_gets_fixed_price() {
  setup_tracing();
  let rules = [addon_rule()];
  let engine = PricingEngine::new(&rules);
  let lines = pricing_order(&[CartLine::tagged("mug", 1, "addon"), CartLine::plain("coffee", 2)]);
  assert_eq!(lines[0].product_id, "coffee");

  let priced = engine
    .price(&[
      resolved(lines[0].clone(), product("coffee", 30_000, 10)),
      resolved(lines[1].clone(), product("mug", 25_000, 3)),
    ])
    .unwrap();

  assert_eq!(priced.lines[1].unit_price, 10_000);
  assert_eq!(priced.subtotal, 70_000);
}

#[test]
fn test_promotional_line_cannot_unlock_itself() {
  let rules = [addon_rule()];
  let engine = PricingEngine::new(&rules);

  let priced = engine
    .price(&[resolved(CartLine::tagged("mug", 1, "addon"), product("mug", 25_000, 3))])
    .unwrap();

  assert_eq!(priced.lines[0].unit_price, 25_000);
  assert_eq!(priced.lines[0].price_basis, PriceBasis::Retail);
  assert_eq!(priced.subtotal, 25_000);
}

#[test]
fn test_line_totals_sum_to_subtotal() {
  let rules = [addon_rule()];
  let engine = PricingEngine::new(&rules);
  let priced = engine
    .price(&[
      resolved(CartLine::plain("coffee", 3), product("coffee", 30_000, 10)),
      resolved(CartLine::plain("beans", 6), wholesale_product("beans", 12_000, 9_000, 5, 100)),
    ])
    .unwrap();

  let sum: i64 = priced.lines.iter().map(|l| l.line_total).sum();
  assert_eq!(sum, priced.subtotal);
  assert_eq!(priced.subtotal, 90_000 + 54_000);
}

#[test]
fn test_pricing_order_is_stable_within_groups() {
  let ordered = pricing_order(&[
    CartLine::tagged("t1", 1, "addon"),
    CartLine::plain("p1", 1),
    CartLine::tagged("t2", 1, "addon"),
    CartLine::plain("p2", 1),
  ]);
  let ids: Vec<&str> = ordered.iter().map(|l| l.product_id.as_str()).collect();
  assert_eq!(ids, vec!["p1", "p2", "t1", "t2"]);
}

#[test]
fn test_line_total_overflow_is_reported() {
  let engine = PricingEngine::new(&[]);
  let result = engine.price(&[resolved(CartLine::plain("gold", u32::MAX), product("gold", i64::MAX / 2, i64::MAX))]);

  match result {
    Err(CheckoutError::AmountOverflow { product_id }) => assert_eq!(product_id, "gold"),
    other => panic!("Expected AmountOverflow, got {:?}", other),
  }
}
