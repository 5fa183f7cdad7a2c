// ordergate/src/model/voucher.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VoucherStatus {
  Active,
  Used,
}

impl VoucherStatus {
  pub fn as_str(&self) -> &'static str {
    match self {
      VoucherStatus::Active => "ACTIVE",
      VoucherStatus::Used => "USED",
    }
  }

  pub fn parse(value: &str) -> Option<Self> {
    match value {
      "ACTIVE" => Some(VoucherStatus::Active),
      "USED" => Some(VoucherStatus::Used),
      _ => None,
    }
  }
}

/// Single-use, fixed-value discount owned by one user. Goes `Active` → `Used` exactly once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Voucher {
  pub id: String,
  pub user_id: String,
  pub code: String,
  pub value: i64,
  pub status: VoucherStatus,
  pub created_at: DateTime<Utc>,
  #[serde(default)]
  pub used_at: Option<DateTime<Utc>>,
  #[serde(default)]
  pub used_in_order: Option<String>,
}
