// ordergate/src/model/account.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The parts of a user record checkout cares about. `points` never drops below zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAccount {
  pub id: String,
  pub name: String,
  pub points: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum LedgerReason {
  #[serde(rename_all = "camelCase")]
  CheckoutRedemption { order_id: String },
  #[serde(rename_all = "camelCase")]
  VoucherExchange { voucher_id: String },
}

/// Append-only record of one change to a points balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PointsLedgerEntry {
  pub id: Uuid,
  pub user_id: String,
  /// Negative for redemptions and exchanges.
  pub delta: i64,
  pub balance_after: i64,
  pub reason: LedgerReason,
  pub created_at: DateTime<Utc>,
}

impl PointsLedgerEntry {
  pub fn debit(user_id: &str, points: i64, balance_before: i64, reason: LedgerReason) -> Self {
    Self {
      id: Uuid::new_v4(),
      user_id: user_id.to_string(),
      delta: -points,
      balance_after: balance_before - points,
      reason,
      created_at: Utc::now(),
    }
  }
}
