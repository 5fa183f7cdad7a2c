// ordergate/src/checkout/context.rs

//! Request, receipt and the shared context the checkout stages work on.

use crate::checkout::notify::OrderNotifier;
use crate::codes::CodeGenerator;
use crate::entitlements::{AppliedVoucher, PointsRedemption, Settlement};
use crate::error::PipelineError;
use crate::model::{CartLine, Customer, Delivery, Order, Payment, Requester};
use crate::pricing::PricedCart;
use crate::settings::CheckoutSettings;
use crate::store::DocumentStore;
use crate::validation::ValidatedCart;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// What the storefront submits. Identity is deliberately absent: it arrives separately as a
/// verified `Requester`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
  pub items: Vec<CartLine>,
  pub customer: Customer,
  pub delivery: Delivery,
  pub payment: Payment,
  #[serde(default)]
  pub voucher_code: Option<String>,
  #[serde(default)]
  pub use_points: bool,
}

impl CheckoutRequest {
  pub fn has_voucher_code(&self) -> bool {
    self.voucher_code.as_deref().is_some_and(|c| !c.trim().is_empty())
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutReceipt {
  pub order_id: String,
  pub record_id: Uuid,
  pub subtotal: i64,
  pub discount_total: i64,
  pub total: i64,
}

impl From<&Order> for CheckoutReceipt {
  fn from(order: &Order) -> Self {
    Self {
      order_id: order.id.clone(),
      record_id: order.record_id,
      subtotal: order.subtotal,
      discount_total: order.discount_total,
      total: order.total,
    }
  }
}

/// Collaborators every stage may reach. Cheap to clone.
#[derive(Clone)]
pub struct CheckoutDeps {
  pub store: Arc<dyn DocumentStore>,
  pub settings: Arc<CheckoutSettings>,
  pub codes: Arc<dyn CodeGenerator>,
  pub notifier: Arc<dyn OrderNotifier>,
}

/// Underlying data of one checkout run. Each stage fills in its own field.
#[derive(Clone)]
pub struct CheckoutCtxData {
  pub deps: CheckoutDeps,
  pub requester: Requester,
  pub request: CheckoutRequest,
  pub attempt: u32,
  pub validated: Option<ValidatedCart>,
  pub priced: Option<PricedCart>,
  pub voucher: Option<AppliedVoucher>,
  pub points: Option<PointsRedemption>,
  pub settlement: Option<Settlement>,
  pub order: Option<Order>,
}

impl CheckoutCtxData {
  pub fn new(deps: CheckoutDeps, requester: Requester, request: CheckoutRequest, attempt: u32) -> Self {
    Self {
      deps,
      requester,
      request,
      attempt,
      validated: None,
      priced: None,
      voucher: None,
      points: None,
      settlement: None,
      order: None,
    }
  }
}

/// Error for a stage that found an earlier stage's output missing.
pub(crate) fn missing(stage_name: &str, what: &str) -> PipelineError {
  PipelineError::IncompleteContext {
    stage_name: stage_name.to_string(),
    message: format!("{} not available", what),
  }
}
