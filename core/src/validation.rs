// ordergate/src/validation.rs

//! Cart Validator: re-reads every product a cart references and checks quantities against
//! current stock. Read-only.

use crate::error::{CheckoutError, CheckoutResult};
use crate::model::{CartLine, Product};
use crate::store::DocumentStore;
use std::collections::BTreeMap;
use tracing::{event, instrument, Level};

/// A cart line paired with the authoritative product record it refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedLine {
  pub line: CartLine,
  pub product: Product,
}

/// Stock of every referenced product as read during validation, with the total quantity the
/// cart asks for. The commit uses the read value as its optimistic precondition.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StockSnapshot {
  entries: BTreeMap<String, StockEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockEntry {
  pub product_name: String,
  pub stock_read: i64,
  pub requested: u32,
}

impl StockSnapshot {
  pub fn entries(&self) -> impl Iterator<Item = (&str, &StockEntry)> {
    self.entries.iter().map(|(id, entry)| (id.as_str(), entry))
  }

  pub fn get(&self, product_id: &str) -> Option<&StockEntry> {
    self.entries.get(product_id)
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedCart {
  /// Lines in pricing order: untagged first, then tagged.
  pub lines: Vec<ResolvedLine>,
  pub stock: StockSnapshot,
}

/// Stable reorder: untagged lines keep their relative order and come first, tagged lines
/// keep theirs and follow. Promotional prices depend on what was priced before them.
pub fn pricing_order(lines: &[CartLine]) -> Vec<CartLine> {
  let mut ordered = lines.to_vec();
  ordered.sort_by_key(CartLine::is_tagged);
  ordered
}

#[instrument(name = "validate_cart", skip_all, fields(lines = lines.len()), err(Display))]
pub async fn validate_cart(store: &dyn DocumentStore, lines: &[CartLine]) -> CheckoutResult<ValidatedCart> {
  if lines.is_empty() {
    return Err(CheckoutError::EmptyCart);
  }
  if let Some(line) = lines.iter().find(|l| l.quantity == 0) {
    return Err(CheckoutError::InvalidQuantity {
      product_id: line.product_id.clone(),
    });
  }

  let mut products: BTreeMap<String, Product> = BTreeMap::new();
  let mut requested: BTreeMap<String, u32> = BTreeMap::new();
  for line in lines {
    if !products.contains_key(&line.product_id) {
      let product = store
        .get_product(&line.product_id)
        .await?
        .ok_or_else(|| CheckoutError::ProductNotFound {
          product_id: line.product_id.clone(),
        })?;
      products.insert(line.product_id.clone(), product);
    }
    let total = requested.entry(line.product_id.clone()).or_insert(0);
    *total = total.saturating_add(line.quantity);
  }

  let mut stock = StockSnapshot::default();
  for (product_id, quantity) in requested {
    let Some(product) = products.get(&product_id) else {
      continue;
    };
    if i64::from(quantity) > product.stock {
      event!(
        Level::WARN,
        product_id = %product_id,
        requested = quantity,
        available = product.stock,
        "Cart rejected: insufficient stock."
      );
      return Err(CheckoutError::InsufficientStock {
        product_id,
        product_name: product.name.clone(),
        remaining: product.stock.max(0),
      });
    }
    stock.entries.insert(
      product_id,
      StockEntry {
        product_name: product.name.clone(),
        stock_read: product.stock,
        requested: quantity,
      },
    );
  }

  let mut resolved = Vec::with_capacity(lines.len());
  for line in pricing_order(lines) {
    if let Some(product) = products.get(&line.product_id) {
      resolved.push(ResolvedLine {
        product: product.clone(),
        line,
      });
    }
  }

  event!(Level::DEBUG, products = products.len(), "Cart validated.");
  Ok(ValidatedCart { lines: resolved, stock })
}
