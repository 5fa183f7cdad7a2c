// ordergate/src/checkout/pipeline.rs

//! The checkout pipeline. Stages run once each, in this order:
//!
//! | stage             | work                                              | skipped when                 |
//! |-------------------|---------------------------------------------------|------------------------------|
//! | `validate_cart`   | re-read products, check stock                     | never                        |
//! | `price_lines`     | unit prices, promotions, subtotal                 | never                        |
//! | `resolve_voucher` | find the caller's active voucher for the code     | guest, or no code            |
//! | `resolve_points`  | cap the redemption                                | guest, or points not asked   |
//! | `commit_order`    | settle totals (before), commit, notify (after)    | never                        |
//!
//! Nothing is written before `commit_order`, and `commit_order` writes in one transaction.

use crate::checkout::commit::{commit_order, CommitPlan};
use crate::checkout::context::{missing, CheckoutCtxData};
use crate::entitlements::{resolve_points, resolve_voucher, settle};
use crate::error::CheckoutError;
use crate::pipeline::{ContextData, Pipeline, PipelineControl, SkipCondition};
use crate::pricing::PricingEngine;
use crate::validation::validate_cart;
use std::sync::Arc;
use tracing::{info, warn};

pub const VALIDATE_CART: &str = "validate_cart";
pub const PRICE_LINES: &str = "price_lines";
pub const RESOLVE_VOUCHER: &str = "resolve_voucher";
pub const RESOLVE_POINTS: &str = "resolve_points";
pub const COMMIT_ORDER: &str = "commit_order";

pub type CheckoutPipeline = Pipeline<CheckoutCtxData, CheckoutError>;

pub fn build_checkout_pipeline() -> CheckoutPipeline {
  let skip_voucher: SkipCondition<CheckoutCtxData> = Arc::new(|ctx: ContextData<CheckoutCtxData>| {
    let guard = ctx.read();
    guard.requester.is_guest() || !guard.request.has_voucher_code()
  });
  let skip_points: SkipCondition<CheckoutCtxData> = Arc::new(|ctx: ContextData<CheckoutCtxData>| {
    let guard = ctx.read();
    guard.requester.is_guest() || !guard.request.use_points
  });

  let mut p = Pipeline::<CheckoutCtxData, CheckoutError>::new(&[
    (VALIDATE_CART, false, None),
    (PRICE_LINES, false, None),
    (RESOLVE_VOUCHER, false, Some(skip_voucher)),
    (RESOLVE_POINTS, false, Some(skip_points)),
    (COMMIT_ORDER, false, None),
  ]);

  p.on(VALIDATE_CART, |ctx_data: ContextData<CheckoutCtxData>| {
    Box::pin(async move {
      let (store, items) = {
        let guard = ctx_data.read();
        (guard.deps.store.clone(), guard.request.items.clone())
      };
      let validated = validate_cart(store.as_ref(), &items).await?;
      ctx_data.write().validated = Some(validated);
      Ok::<_, CheckoutError>(PipelineControl::Continue)
    })
  });

  p.on(PRICE_LINES, |ctx_data: ContextData<CheckoutCtxData>| {
    Box::pin(async move {
      let mut guard = ctx_data.write();
      let validated = guard.validated.as_ref().ok_or_else(|| missing(PRICE_LINES, "validated cart"))?;
      let priced = PricingEngine::new(&guard.deps.settings.promotions).price(&validated.lines)?;
      guard.priced = Some(priced);
      Ok::<_, CheckoutError>(PipelineControl::Continue)
    })
  });

  p.on(RESOLVE_VOUCHER, |ctx_data: ContextData<CheckoutCtxData>| {
    Box::pin(async move {
      let (store, requester, code) = {
        let guard = ctx_data.read();
        (
          guard.deps.store.clone(),
          guard.requester.clone(),
          guard.request.voucher_code.clone(),
        )
      };
      let voucher = resolve_voucher(store.as_ref(), &requester, code.as_deref()).await?;
      ctx_data.write().voucher = voucher;
      Ok::<_, CheckoutError>(PipelineControl::Continue)
    })
  });

  p.on(RESOLVE_POINTS, |ctx_data: ContextData<CheckoutCtxData>| {
    Box::pin(async move {
      let (store, user_id, subtotal) = {
        let guard = ctx_data.read();
        let priced = guard.priced.as_ref().ok_or_else(|| missing(RESOLVE_POINTS, "priced cart"))?;
        (
          guard.deps.store.clone(),
          guard.requester.user_id().map(str::to_string),
          priced.subtotal,
        )
      };
      let Some(user_id) = user_id else {
        return Ok(PipelineControl::Continue);
      };
      let account = store
        .get_user(&user_id)
        .await?
        .ok_or_else(|| CheckoutError::AccountNotFound { user_id: user_id.clone() })?;
      let mut guard = ctx_data.write();
      guard.points = resolve_points(&account, subtotal, &guard.deps.settings.points);
      Ok::<_, CheckoutError>(PipelineControl::Continue)
    })
  });

  p.before(COMMIT_ORDER, |ctx_data: ContextData<CheckoutCtxData>| {
    Box::pin(async move {
      let mut guard = ctx_data.write();
      let subtotal = guard
        .priced
        .as_ref()
        .ok_or_else(|| missing(COMMIT_ORDER, "priced cart"))?
        .subtotal;
      let settlement = settle(subtotal, guard.points.as_ref(), guard.voucher.as_ref());
      guard.settlement = Some(settlement);
      Ok::<_, CheckoutError>(PipelineControl::Continue)
    })
  });

  p.on(COMMIT_ORDER, |ctx_data: ContextData<CheckoutCtxData>| {
    Box::pin(async move {
      let snapshot = ctx_data.read().clone();
      let (Some(validated), Some(priced), Some(settlement)) =
        (&snapshot.validated, &snapshot.priced, &snapshot.settlement)
      else {
        return Err(missing(COMMIT_ORDER, "validated cart, priced cart or settlement").into());
      };
      let plan = CommitPlan {
        requester: &snapshot.requester,
        request: &snapshot.request,
        priced,
        stock: &validated.stock,
        voucher: snapshot.voucher.as_ref(),
        points: snapshot.points.as_ref(),
        settlement,
      };
      let deps = &snapshot.deps;
      let order = commit_order(deps.store.as_ref(), deps.codes.as_ref(), &deps.settings, plan).await?;
      info!(
        order_id = %order.id,
        attempt = snapshot.attempt,
        subtotal = order.subtotal,
        discount = order.discount_total,
        total = order.total,
        "Checkout committed."
      );
      ctx_data.write().order = Some(order);
      Ok::<_, CheckoutError>(PipelineControl::Continue)
    })
  });

  p.after(COMMIT_ORDER, |ctx_data: ContextData<CheckoutCtxData>| {
    Box::pin(async move {
      let guard = ctx_data.read();
      match &guard.order {
        Some(order) => guard.deps.notifier.order_placed(order),
        None => warn!("Commit stage finished without an order; nothing to notify."),
      }
      Ok::<_, CheckoutError>(PipelineControl::Continue)
    })
  });

  p
}
