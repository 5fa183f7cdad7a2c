// ordergate/src/checkout/commit.rs

//! Order Committer: turns a priced, settled checkout into one atomic transaction.
//!
//! The transaction creates the order in `Pending` and, together with it, decrements stock
//! (conditioned on the stock read during validation), debits points (conditioned on the
//! balance read), consumes the voucher (conditioned on it still being active) and clears the
//! customer's cart. Either all of it lands or none of it does.

use crate::codes::CodeGenerator;
use crate::entitlements::{AppliedVoucher, PointsRedemption, Settlement};
use crate::error::{CheckoutError, CheckoutResult};
use crate::model::{LedgerReason, Order, OrderStatus, PointsLedgerEntry, Requester};
use crate::pricing::PricedCart;
use crate::settings::CheckoutSettings;
use crate::store::{Collection, Conflict, DocumentStore, StoreError, Transaction, Write};
use crate::validation::StockSnapshot;
use crate::checkout::context::CheckoutRequest;
use chrono::Utc;
use tracing::{event, instrument, Level};
use uuid::Uuid;

/// Everything the commit needs, borrowed from the checkout context.
#[derive(Debug, Clone, Copy)]
pub struct CommitPlan<'a> {
  pub requester: &'a Requester,
  pub request: &'a CheckoutRequest,
  pub priced: &'a PricedCart,
  pub stock: &'a StockSnapshot,
  pub voucher: Option<&'a AppliedVoucher>,
  pub points: Option<&'a PointsRedemption>,
  pub settlement: &'a Settlement,
}

impl CommitPlan<'_> {
  fn build_order(&self, order_id: String) -> Order {
    let voucher = self.voucher.filter(|_| self.settlement.voucher_discount > 0);
    Order {
      id: order_id,
      record_id: Uuid::new_v4(),
      user_id: self.requester.user_id().map(str::to_string),
      customer: self.request.customer.clone(),
      delivery: self.request.delivery.clone(),
      payment: self.request.payment.clone(),
      lines: self.priced.lines.clone(),
      subtotal: self.settlement.subtotal,
      points_used: self.settlement.points_used,
      points_value: self.settlement.points_value,
      voucher_id: voucher.map(|v| v.voucher_id.clone()),
      voucher_discount: self.settlement.voucher_discount,
      discount_total: self.settlement.discount_total,
      total: self.settlement.total,
      status: OrderStatus::Pending,
      created_at: Utc::now(),
    }
  }

  /// The transaction for `order`. A voucher whose discount came out as zero is left active.
  pub fn transaction(&self, order: &Order) -> Transaction {
    let mut tx = Transaction::new();
    tx.push(Write::CreateOrder(order.clone()));

    for (product_id, entry) in self.stock.entries() {
      tx.push(Write::AdjustStock {
        product_id: product_id.to_string(),
        expected: entry.stock_read,
        delta: -i64::from(entry.requested),
      });
    }

    if let Some(points) = self.points.filter(|p| p.points > 0) {
      tx.push(Write::AdjustPoints {
        user_id: points.user_id.clone(),
        expected: points.balance_read,
        delta: -points.points,
      });
      tx.push(Write::AppendLedger(PointsLedgerEntry::debit(
        &points.user_id,
        points.points,
        points.balance_read,
        LedgerReason::CheckoutRedemption {
          order_id: order.id.clone(),
        },
      )));
    }

    if let Some(voucher_id) = &order.voucher_id {
      tx.push(Write::ConsumeVoucher {
        voucher_id: voucher_id.clone(),
        order_id: order.id.clone(),
      });
    }

    if let Some(user_id) = self.requester.user_id() {
      tx.push(Write::ClearCart {
        user_id: user_id.to_string(),
      });
    }
    tx
  }
}

/// Commits the order, drawing a fresh order id whenever the generated one is already taken.
#[instrument(
  name = "commit_order",
  skip_all,
  fields(total = plan.settlement.total, lines = plan.priced.lines.len()),
  err(Display)
)]
pub async fn commit_order(
  store: &dyn DocumentStore,
  codes: &dyn CodeGenerator,
  settings: &CheckoutSettings,
  plan: CommitPlan<'_>,
) -> CheckoutResult<Order> {
  for id_attempt in 1..=settings.max_id_attempts {
    let order = plan.build_order(codes.generate(&settings.order_ids));
    let tx = plan.transaction(&order);

    match store.commit(tx).await {
      Ok(()) => {
        event!(Level::INFO, order_id = %order.id, record_id = %order.record_id, "Order committed.");
        return Ok(order);
      }
      Err(StoreError::DuplicateKey {
        collection: Collection::Orders,
        key,
      }) => {
        event!(Level::WARN, order_id = %key, id_attempt, "Order id already taken, drawing another.");
      }
      Err(err) => return Err(map_commit_error(err, plan.stock)),
    }
  }

  event!(Level::ERROR, attempts = settings.max_id_attempts, "No unique order id could be generated.");
  Err(CheckoutError::OrderCommitFailed {
    source: anyhow::anyhow!("no unique order id after {} attempts", settings.max_id_attempts),
  })
}

/// Translates a failed commit into the checkout taxonomy. A stock conflict that leaves less
/// than the cart needs is a plain shortfall; one that still leaves enough is
/// `StockContended`; any other lost race is a retryable `Conflict`.
pub(crate) fn map_commit_error(err: StoreError, stock: &StockSnapshot) -> CheckoutError {
  match err {
    StoreError::Conflict(Conflict::Stock {
      product_id, current, ..
    }) => match stock.get(&product_id) {
      Some(entry) if current < i64::from(entry.requested) => {
        event!(Level::WARN, %product_id, current, "Stock sold out under a concurrent checkout.");
        CheckoutError::InsufficientStock {
          product_id,
          product_name: entry.product_name.clone(),
          remaining: current.max(0),
        }
      }
      _ => {
        event!(Level::WARN, %product_id, current, "Stock changed since validation.");
        CheckoutError::StockContended { product_id, current }
      }
    },
    StoreError::Conflict(conflict) => {
      event!(Level::WARN, %conflict, "Commit precondition failed.");
      let resource = match conflict {
        Conflict::Points { user_id, .. } => format!("points of user '{}'", user_id),
        Conflict::Voucher { voucher_id, .. } => format!("voucher '{}'", voucher_id),
        Conflict::Stock { product_id, .. } => format!("stock of product '{}'", product_id),
      };
      CheckoutError::Conflict { resource }
    }
    StoreError::NotFound {
      collection: Collection::Products,
      key,
    } => CheckoutError::ProductNotFound { product_id: key },
    other => {
      event!(Level::ERROR, error = %other, "Order commit failed.");
      CheckoutError::OrderCommitFailed {
        source: anyhow::Error::new(other),
      }
    }
  }
}
