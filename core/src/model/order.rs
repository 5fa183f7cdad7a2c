// ordergate/src/model/order.rs

use crate::model::cart::ValidatedLine;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
  Pending,
  Processing,
  Shipped,
  Completed,
  Cancelled,
}

impl OrderStatus {
  pub fn as_str(&self) -> &'static str {
    match self {
      OrderStatus::Pending => "PENDING",
      OrderStatus::Processing => "PROCESSING",
      OrderStatus::Shipped => "SHIPPED",
      OrderStatus::Completed => "COMPLETED",
      OrderStatus::Cancelled => "CANCELLED",
    }
  }

  pub fn parse(value: &str) -> Option<Self> {
    [
      OrderStatus::Pending,
      OrderStatus::Processing,
      OrderStatus::Shipped,
      OrderStatus::Completed,
      OrderStatus::Cancelled,
    ]
    .into_iter()
    .find(|status| status.as_str() == value)
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
  pub name: String,
  pub phone: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delivery {
  pub method: String,
  #[serde(default)]
  pub address: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
  pub method: String,
  #[serde(default)]
  pub proof_ref: Option<String>,
}

/// A committed order. Created once, in `Pending`, by the checkout commit; its lines are
/// never edited afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
  /// Human-readable id, e.g. `ORD-7KX2QH9M`. Also the document key.
  pub id: String,
  pub record_id: Uuid,
  /// `None` for guest orders.
  pub user_id: Option<String>,
  pub customer: Customer,
  pub delivery: Delivery,
  pub payment: Payment,
  pub lines: Vec<ValidatedLine>,
  pub subtotal: i64,
  pub points_used: i64,
  pub points_value: i64,
  pub voucher_id: Option<String>,
  pub voucher_discount: i64,
  pub discount_total: i64,
  pub total: i64,
  pub status: OrderStatus,
  pub created_at: DateTime<Utc>,
}
