// ordergate/src/model/product.rs

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Catalog record. `stock` is the aggregate available quantity and never goes below zero
/// through a committed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
  pub id: String,
  pub name: String,
  pub unit: String,
  #[serde(default)]
  pub image_url: Option<String>,
  pub retail_price: i64,
  #[serde(default)]
  pub wholesale_price: Option<i64>,
  #[serde(default)]
  pub wholesale_min_quantity: Option<u32>,
  pub stock: i64,
  /// Per-warehouse breakdown kept by stock-in/out. Checkout only touches `stock`.
  #[serde(default)]
  pub warehouse_stock: BTreeMap<String, i64>,
}

impl Product {
  /// Wholesale price when the tier is configured and `quantity` reaches its minimum.
  pub fn wholesale_price_for(&self, quantity: u32) -> Option<i64> {
    match (self.wholesale_price, self.wholesale_min_quantity) {
      (Some(price), Some(min_quantity)) if quantity >= min_quantity => Some(price),
      _ => None,
    }
  }
}
