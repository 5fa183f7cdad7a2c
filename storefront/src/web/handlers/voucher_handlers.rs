// storefront/src/web/handlers/voucher_handlers.rs

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument};

use crate::errors::AppError;
use crate::state::AppState;
use crate::web::extractors::CurrentRequester;

#[derive(Deserialize, Debug)]
pub struct ExchangePointsPayload {
  pub points: i64,
}

#[instrument(
    name = "handler::exchange_points",
    skip(app_state, requester, payload),
    fields(requester = ?requester.0, points = payload.points)
)]
pub async fn exchange_points_handler(
  app_state: web::Data<AppState>,
  requester: CurrentRequester,
  payload: web::Json<ExchangePointsPayload>,
) -> Result<HttpResponse, AppError> {
  let issued = app_state.checkout.exchange_points(&requester.0, payload.points).await?;

  info!(voucher_id = %issued.voucher.id, "Points exchanged for a voucher.");
  Ok(HttpResponse::Created().json(json!({
    "voucherId": issued.voucher.id,
    "code": issued.voucher.code,
    "value": issued.voucher.value,
    "pointsBalance": issued.points_balance,
  })))
}
