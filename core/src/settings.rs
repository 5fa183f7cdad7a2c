// ordergate/src/settings.rs

//! Tunables for pricing, entitlements and the commit. One `PointsPolicy` is shared by
//! checkout redemption and the points-for-voucher exchange so both value a point the same way.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SettingsError {
  #[error("points.currency_per_point must be positive, got {0}")]
  NonPositivePointValue(i64),
  #[error("points.max_redeem_percent must be within 0..=100, got {0}")]
  RedeemPercentOutOfRange(u8),
  #[error("{field}: prefix must not be empty and length must be positive")]
  InvalidCodeFormat { field: &'static str },
  #[error("{field} must be at least 1")]
  ZeroAttempts { field: &'static str },
  #[error("promotion '{tag}': {message}")]
  InvalidPromotion { tag: String, message: String },
}

/// Fixed-price override for a tagged line, unlocked by what was already priced before it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromotionRule {
  pub tag: String,
  pub fixed_price: i64,
  /// Running subtotal of earlier lines required to unlock the price.
  pub min_prior_subtotal: i64,
  /// The line must request exactly this many units.
  pub required_quantity: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PointsPolicy {
  /// Currency units one point is worth.
  pub currency_per_point: i64,
  /// Share of the pre-discount subtotal that points may cover.
  pub max_redeem_percent: u8,
}

impl Default for PointsPolicy {
  fn default() -> Self {
    Self {
      currency_per_point: 1,
      max_redeem_percent: 50,
    }
  }
}

impl PointsPolicy {
  /// Points redeemable against `subtotal` with `balance` available.
  pub fn redeemable_points(&self, balance: i64, subtotal: i64) -> i64 {
    if balance <= 0 || subtotal <= 0 {
      return 0;
    }
    let cap_value = subtotal.saturating_mul(i64::from(self.max_redeem_percent)) / 100;
    let cap_points = cap_value / self.currency_per_point;
    balance.min(cap_points)
  }

  /// Currency value of `points`.
  pub fn value_of(&self, points: i64) -> Option<i64> {
    points.checked_mul(self.currency_per_point)
  }
}

/// Shape of generated identifiers: `prefix` followed by `length` random symbols.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeFormat {
  pub prefix: String,
  pub length: usize,
}

impl CodeFormat {
  pub fn new(prefix: impl Into<String>, length: usize) -> Self {
    Self {
      prefix: prefix.into(),
      length,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CheckoutSettings {
  pub promotions: Vec<PromotionRule>,
  pub points: PointsPolicy,
  pub order_ids: CodeFormat,
  pub voucher_codes: CodeFormat,
  /// Fresh order ids tried when the generated one is already taken.
  pub max_id_attempts: u32,
  /// Whole-checkout runs allowed when a commit loses an optimistic-concurrency race.
  pub max_checkout_attempts: u32,
}

impl Default for CheckoutSettings {
  fn default() -> Self {
    Self {
      promotions: vec![PromotionRule {
        tag: "addon".to_string(),
        fixed_price: 10_000,
        min_prior_subtotal: 50_000,
        required_quantity: 1,
      }],
      points: PointsPolicy::default(),
      order_ids: CodeFormat::new("ORD-", 8),
      voucher_codes: CodeFormat::new("VCR-", 8),
      max_id_attempts: 5,
      max_checkout_attempts: 4,
    }
  }
}

impl CheckoutSettings {
  pub fn promotion(&self, tag: &str) -> Option<&PromotionRule> {
    self.promotions.iter().find(|rule| rule.tag == tag)
  }

  pub fn validate(&self) -> Result<(), SettingsError> {
    if self.points.currency_per_point <= 0 {
      return Err(SettingsError::NonPositivePointValue(self.points.currency_per_point));
    }
    if self.points.max_redeem_percent > 100 {
      return Err(SettingsError::RedeemPercentOutOfRange(self.points.max_redeem_percent));
    }
    for (field, format) in [("order_ids", &self.order_ids), ("voucher_codes", &self.voucher_codes)] {
      if format.prefix.is_empty() || format.length == 0 {
        return Err(SettingsError::InvalidCodeFormat { field });
      }
    }
    if self.max_id_attempts == 0 {
      return Err(SettingsError::ZeroAttempts { field: "max_id_attempts" });
    }
    if self.max_checkout_attempts == 0 {
      return Err(SettingsError::ZeroAttempts {
        field: "max_checkout_attempts",
      });
    }
    for rule in &self.promotions {
      if rule.tag.trim().is_empty() {
        return Err(SettingsError::InvalidPromotion {
          tag: rule.tag.clone(),
          message: "tag must not be blank".to_string(),
        });
      }
      if rule.fixed_price < 0 || rule.min_prior_subtotal < 0 {
        return Err(SettingsError::InvalidPromotion {
          tag: rule.tag.clone(),
          message: "prices and thresholds must not be negative".to_string(),
        });
      }
      if rule.required_quantity == 0 {
        return Err(SettingsError::InvalidPromotion {
          tag: rule.tag.clone(),
          message: "required quantity must be at least 1".to_string(),
        });
      }
    }
    Ok(())
  }
}
