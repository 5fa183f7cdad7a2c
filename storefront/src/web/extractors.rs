// storefront/src/web/extractors.rs

use crate::errors::AppError;
use crate::services::session_service;
use crate::state::AppState;
use actix_web::http::header::AUTHORIZATION;
use actix_web::{web, FromRequest, HttpRequest};
use futures_util::future::LocalBoxFuture;
use ordergate::model::Requester;

/// The verified caller: a guest when no credentials are sent, a customer for a live session.
#[derive(Debug, Clone)]
pub struct CurrentRequester(pub Requester);

impl FromRequest for CurrentRequester {
  type Error = AppError;
  type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

  fn from_request(req: &HttpRequest, _payload: &mut actix_web::dev::Payload) -> Self::Future {
    let state = req.app_data::<web::Data<AppState>>().cloned();
    let header = match req.headers().get(AUTHORIZATION).map(|h| h.to_str()) {
      None => Ok(None),
      Some(Ok(value)) => Ok(Some(value.to_string())),
      Some(Err(_)) => Err(AppError::Unauthenticated("Malformed Authorization header".to_string())),
    };

    Box::pin(async move {
      let state = state.ok_or_else(|| AppError::Internal("application state not configured".to_string()))?;
      let requester = session_service::resolve_requester(&state.db_pool, header?.as_deref()).await?;
      Ok(CurrentRequester(requester))
    })
  }
}
