// ordergate/src/pricing.rs

//! Pricing Engine.
//!
//! Unit price precedence for one line:
//! 1. wholesale price, when the product has a wholesale tier and the quantity reaches it;
//! 2. otherwise the retail price;
//! 3. a recognized promotion tag overrides both with the rule's fixed price, but only when
//!    the running subtotal of the lines priced before it reaches the rule's threshold and the
//!    quantity equals the rule's required quantity.
//!
//! The running subtotal is an explicit argument. `PricingEngine::price` feeds it in the order
//! produced by the validator, so a promotional line can never unlock itself.

use crate::error::{CheckoutError, CheckoutResult};
use crate::model::{PriceBasis, Product, ValidatedLine};
use crate::settings::PromotionRule;
use crate::validation::ResolvedLine;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceQuote {
  pub unit_price: i64,
  pub basis: PriceBasis,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricedCart {
  pub lines: Vec<ValidatedLine>,
  pub subtotal: i64,
}

#[derive(Debug, Clone, Copy)]
pub struct PricingEngine<'a> {
  promotions: &'a [PromotionRule],
}

impl<'a> PricingEngine<'a> {
  pub fn new(promotions: &'a [PromotionRule]) -> Self {
    Self { promotions }
  }

  pub fn unit_price(
    &self,
    product: &Product,
    quantity: u32,
    promotion_tag: Option<&str>,
    running_subtotal: i64,
  ) -> PriceQuote {
    let promotion = promotion_tag
      .and_then(|tag| self.promotions.iter().find(|rule| rule.tag == tag))
      .filter(|rule| running_subtotal >= rule.min_prior_subtotal && quantity == rule.required_quantity);
    if let Some(rule) = promotion {
      return PriceQuote {
        unit_price: rule.fixed_price,
        basis: PriceBasis::Promotion(rule.tag.clone()),
      };
    }

    match product.wholesale_price_for(quantity) {
      Some(price) => PriceQuote {
        unit_price: price,
        basis: PriceBasis::Wholesale,
      },
      None => PriceQuote {
        unit_price: product.retail_price,
        basis: PriceBasis::Retail,
      },
    }
  }

  /// Prices `lines` in the given order, accumulating the running subtotal as it goes.
  pub fn price(&self, lines: &[ResolvedLine]) -> CheckoutResult<PricedCart> {
    let mut priced = Vec::with_capacity(lines.len());
    let mut subtotal: i64 = 0;
    for resolved in lines {
      let product = &resolved.product;
      let quantity = resolved.line.quantity;
      let quote = self.unit_price(product, quantity, resolved.line.promotion_tag.as_deref(), subtotal);
      let overflow = || CheckoutError::AmountOverflow {
        product_id: product.id.clone(),
      };
      let line_total = quote.unit_price.checked_mul(i64::from(quantity)).ok_or_else(overflow)?;
      subtotal = subtotal.checked_add(line_total).ok_or_else(overflow)?;
      priced.push(ValidatedLine {
        product_id: product.id.clone(),
        name: product.name.clone(),
        unit: product.unit.clone(),
        image_url: product.image_url.clone(),
        unit_price: quote.unit_price,
        quantity,
        line_total,
        price_basis: quote.basis,
      });
    }
    Ok(PricedCart { lines: priced, subtotal })
  }
}
