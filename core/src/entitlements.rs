// ordergate/src/entitlements.rs

//! Entitlement Resolver: the two optional reductions on an order, a voucher and a
//! loyalty-point redemption, and how they settle against the subtotal.

use crate::error::CheckoutResult;
use crate::model::{Requester, UserAccount, VoucherStatus};
use crate::settings::PointsPolicy;
use crate::store::{DocumentStore, VoucherFilter};
use tracing::{event, instrument, Level};

/// A voucher found for this checkout. Consumed only if the order commits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedVoucher {
  pub voucher_id: String,
  pub code: String,
  pub value: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PointsRedemption {
  pub user_id: String,
  pub points: i64,
  pub value: i64,
  /// Balance read when the redemption was computed; the commit's precondition.
  pub balance_read: i64,
}

/// Final money figures of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settlement {
  pub subtotal: i64,
  pub points_used: i64,
  pub points_value: i64,
  pub voucher_discount: i64,
  pub discount_total: i64,
  pub total: i64,
}

/// Looks up an `Active` voucher with `code` owned by the requester.
///
/// Guests, blank codes, unknown codes, used vouchers and vouchers of other users all resolve
/// to `None` without an error. Store failures still propagate.
#[instrument(name = "resolve_voucher", skip_all, err(Display))]
pub async fn resolve_voucher(
  store: &dyn DocumentStore,
  requester: &Requester,
  code: Option<&str>,
) -> CheckoutResult<Option<AppliedVoucher>> {
  let (Some(user_id), Some(code)) = (requester.user_id(), code.map(str::trim).filter(|c| !c.is_empty())) else {
    return Ok(None);
  };

  let filter = VoucherFilter {
    user_id: user_id.to_string(),
    code: Some(code.to_string()),
    status: Some(VoucherStatus::Active),
  };
  let voucher = store.find_vouchers(&filter).await?.into_iter().next();
  match voucher {
    Some(v) => {
      event!(Level::DEBUG, voucher_id = %v.id, value = v.value, "Voucher applies.");
      Ok(Some(AppliedVoucher {
        voucher_id: v.id,
        code: v.code,
        value: v.value.max(0),
      }))
    }
    None => {
      event!(Level::DEBUG, user_id, "Voucher code did not match an active voucher; ignoring.");
      Ok(None)
    }
  }
}

/// Points to redeem: the lesser of the balance and the policy's share of the subtotal.
/// Returns `None` when nothing can be redeemed.
pub fn resolve_points(account: &UserAccount, subtotal: i64, policy: &PointsPolicy) -> Option<PointsRedemption> {
  let points = policy.redeemable_points(account.points, subtotal);
  if points <= 0 {
    return None;
  }
  let value = policy.value_of(points)?;
  Some(PointsRedemption {
    user_id: account.id.clone(),
    points,
    value,
    balance_read: account.points,
  })
}

/// Applies the points value first, then the voucher, each capped so the total cannot go
/// below zero. The voucher discount recorded is what was actually deducted.
pub fn settle(subtotal: i64, points: Option<&PointsRedemption>, voucher: Option<&AppliedVoucher>) -> Settlement {
  let subtotal = subtotal.max(0);
  let points_value = points.map_or(0, |p| p.value).clamp(0, subtotal);
  let remaining = subtotal - points_value;
  let voucher_discount = voucher.map_or(0, |v| v.value).clamp(0, remaining);
  let discount_total = points_value + voucher_discount;
  Settlement {
    subtotal,
    points_used: points.map_or(0, |p| p.points),
    points_value,
    voucher_discount,
    discount_total,
    total: (subtotal - discount_total).max(0),
  }
}
