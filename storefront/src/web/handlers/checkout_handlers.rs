// storefront/src/web/handlers/checkout_handlers.rs

use actix_web::{web, HttpResponse};
use ordergate::CheckoutRequest;
use serde_json::json;
use tracing::{info, instrument};

use crate::errors::AppError;
use crate::state::AppState;
use crate::web::extractors::CurrentRequester;

#[instrument(
    name = "handler::checkout",
    skip(app_state, requester, payload),
    fields(requester = ?requester.0, lines = payload.items.len())
)]
pub async fn checkout_handler(
  app_state: web::Data<AppState>,
  requester: CurrentRequester,
  payload: web::Json<CheckoutRequest>,
) -> Result<HttpResponse, AppError> {
  let receipt = app_state.checkout.checkout(requester.0, payload.into_inner()).await?;

  info!(order_id = %receipt.order_id, total = receipt.total, "Checkout succeeded.");
  Ok(HttpResponse::Ok().json(json!({
    "success": true,
    "orderId": receipt.order_id,
    "internalRecordId": receipt.record_id,
    "subtotal": receipt.subtotal,
    "discountTotal": receipt.discount_total,
    "total": receipt.total,
  })))
}
