// ordergate/src/model/cart.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One client-supplied cart line. Only `quantity` and `promotion_tag` are used as given;
/// everything else is re-read from the product record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
  pub product_id: String,
  pub quantity: u32,
  #[serde(default)]
  pub promotion_tag: Option<String>,
}

impl CartLine {
  pub fn plain(product_id: impl Into<String>, quantity: u32) -> Self {
    Self {
      product_id: product_id.into(),
      quantity,
      promotion_tag: None,
    }
  }

  pub fn tagged(product_id: impl Into<String>, quantity: u32, tag: impl Into<String>) -> Self {
    Self {
      product_id: product_id.into(),
      quantity,
      promotion_tag: Some(tag.into()),
    }
  }

  pub fn is_tagged(&self) -> bool {
    self.promotion_tag.is_some()
  }
}

/// Which rule produced a line's unit price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "tag", rename_all = "camelCase")]
pub enum PriceBasis {
  Retail,
  Wholesale,
  Promotion(String),
}

/// A priced line as persisted inside an order. Never modified after the order is created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidatedLine {
  pub product_id: String,
  pub name: String,
  pub unit: String,
  pub image_url: Option<String>,
  pub unit_price: i64,
  pub quantity: u32,
  pub line_total: i64,
  pub price_basis: PriceBasis,
}

/// The server-side copy of a signed-in user's cart; emptied when an order commits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartSnapshot {
  pub user_id: String,
  pub lines: Vec<CartLine>,
  pub updated_at: DateTime<Utc>,
}
