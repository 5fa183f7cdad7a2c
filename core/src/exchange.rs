// ordergate/src/exchange.rs

//! Points-for-voucher exchange: debit points, record the ledger entry and issue an `Active`
//! voucher, all in one transaction.

use crate::codes::CodeGenerator;
use crate::error::{CheckoutError, CheckoutResult};
use crate::model::{LedgerReason, PointsLedgerEntry, Requester, Voucher, VoucherStatus};
use crate::settings::CheckoutSettings;
use crate::store::{Collection, DocumentStore, StoreError, Transaction, Write};
use chrono::Utc;
use serde::Serialize;
use tracing::{event, instrument, Level};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoucherIssued {
  pub voucher: Voucher,
  /// Balance left after the debit.
  pub points_balance: i64,
}

#[instrument(name = "exchange_points", skip(store, codes, settings), fields(requester = ?requester))]
pub async fn exchange_points(
  store: &dyn DocumentStore,
  codes: &dyn CodeGenerator,
  settings: &CheckoutSettings,
  requester: &Requester,
  points: i64,
) -> CheckoutResult<VoucherIssued> {
  let user_id = requester.user_id().ok_or(CheckoutError::Unauthenticated)?;
  if points <= 0 {
    return Err(CheckoutError::InvalidExchange(format!(
      "points must be positive, got {}",
      points
    )));
  }

  let account = store
    .get_user(user_id)
    .await?
    .ok_or_else(|| CheckoutError::AccountNotFound {
      user_id: user_id.to_string(),
    })?;
  if account.points < points {
    return Err(CheckoutError::InsufficientPoints {
      balance: account.points,
      requested: points,
    });
  }
  let value = settings
    .points
    .value_of(points)
    .ok_or_else(|| CheckoutError::InvalidExchange(format!("{} points is too large to exchange", points)))?;

  let voucher_id = Uuid::new_v4().to_string();
  for code_attempt in 1..=settings.max_id_attempts {
    let voucher = Voucher {
      id: voucher_id.clone(),
      user_id: user_id.to_string(),
      code: codes.generate(&settings.voucher_codes),
      value,
      status: VoucherStatus::Active,
      created_at: Utc::now(),
      used_at: None,
      used_in_order: None,
    };
    let mut tx = Transaction::new();
    tx.push(Write::AdjustPoints {
      user_id: user_id.to_string(),
      expected: account.points,
      delta: -points,
    })
    .push(Write::AppendLedger(PointsLedgerEntry::debit(
      user_id,
      points,
      account.points,
      LedgerReason::VoucherExchange {
        voucher_id: voucher_id.clone(),
      },
    )))
    .push(Write::CreateVoucher(voucher.clone()));

    match store.commit(tx).await {
      Ok(()) => {
        event!(Level::INFO, voucher_id = %voucher.id, code = %voucher.code, points, value, "Voucher issued for points.");
        return Ok(VoucherIssued {
          voucher,
          points_balance: account.points - points,
        });
      }
      Err(StoreError::DuplicateKey {
        collection: Collection::Vouchers,
        key,
      }) => {
        event!(Level::WARN, code = %key, code_attempt, "Voucher code taken, generating another.");
      }
      Err(StoreError::Conflict(conflict)) => {
        return Err(CheckoutError::Conflict {
          resource: conflict.to_string(),
        });
      }
      Err(other) => return Err(other.into()),
    }
  }

  Err(CheckoutError::OrderCommitFailed {
    source: anyhow::anyhow!(
      "no free voucher code after {} attempts",
      settings.max_id_attempts
    ),
  })
}
