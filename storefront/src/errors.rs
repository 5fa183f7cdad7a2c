// storefront/src/errors.rs

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use ordergate::{CheckoutError, SettingsError};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
  /// The request cannot succeed as sent; the message is shown verbatim.
  #[error("{0}")]
  Validation(String),

  #[error("{0}")]
  Unauthenticated(String),

  /// Lost a race with a concurrent update; resubmitting may succeed.
  #[error("{0}")]
  Conflict(String),

  #[error("Configuration Error: {0}")]
  Config(String),

  #[error("Database Error: {0}")]
  Sqlx(#[from] sqlx::Error),

  #[error("Checkout Error: {0}")]
  Checkout(CheckoutError),

  #[error("Internal Server Error: {0}")]
  Internal(String),
}

impl From<CheckoutError> for AppError {
  fn from(err: CheckoutError) -> Self {
    match err {
      CheckoutError::Unauthenticated => AppError::Unauthenticated(err.to_string()),
      CheckoutError::Conflict { .. } | CheckoutError::StockContended { .. } => AppError::Conflict(err.to_string()),
      err if err.is_validation() => AppError::Validation(err.to_string()),
      err => AppError::Checkout(err),
    }
  }
}

impl From<SettingsError> for AppError {
  fn from(err: SettingsError) -> Self {
    AppError::Config(err.to_string())
  }
}

impl From<anyhow::Error> for AppError {
  fn from(err: anyhow::Error) -> Self {
    match err.downcast::<sqlx::Error>() {
      Ok(sqlx_err) => AppError::Sqlx(sqlx_err),
      Err(other) => AppError::Internal(format!("{:#}", other)),
    }
  }
}

impl AppError {
  /// Message safe to return to the client. Server-side failures never expose their cause.
  pub fn public_message(&self) -> String {
    match self {
      AppError::Validation(m) | AppError::Unauthenticated(m) | AppError::Conflict(m) => m.clone(),
      AppError::Checkout(CheckoutError::OrderCommitFailed { .. }) => {
        "Order could not be committed, please retry".to_string()
      }
      AppError::Config(_) | AppError::Sqlx(_) | AppError::Checkout(_) | AppError::Internal(_) => {
        "An internal error occurred".to_string()
      }
    }
  }
}

impl ResponseError for AppError {
  fn status_code(&self) -> StatusCode {
    match self {
      AppError::Validation(_) => StatusCode::BAD_REQUEST,
      AppError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
      AppError::Conflict(_) => StatusCode::CONFLICT,
      AppError::Config(_) | AppError::Sqlx(_) | AppError::Checkout(_) | AppError::Internal(_) => {
        StatusCode::INTERNAL_SERVER_ERROR
      }
    }
  }

  fn error_response(&self) -> HttpResponse {
    let status = self.status_code();
    if status.is_server_error() {
      tracing::error!(application_error = %self, "Responding with error");
    } else {
      tracing::info!(application_error = %self, status = status.as_u16(), "Request rejected");
    }
    HttpResponse::build(status).json(json!({ "error": self.public_message() }))
  }
}

pub type Result<T, E = AppError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
  use super::*;
  use actix_web::body::to_bytes;
  use ordergate::store::StoreError;

  async fn body_of(err: AppError) -> serde_json::Value {
    let bytes = to_bytes(err.error_response().into_body()).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
  }

  #[test]
  fn validation_failures_map_to_bad_request() {
    for err in [
      CheckoutError::EmptyCart,
      CheckoutError::ProductNotFound {
        product_id: "p".to_string(),
      },
      CheckoutError::InsufficientStock {
        product_id: "p".to_string(),
        product_name: "Kettle".to_string(),
        remaining: 1,
      },
      CheckoutError::InsufficientPoints {
        balance: 1,
        requested: 2,
      },
    ] {
      assert_eq!(AppError::from(err).status_code(), StatusCode::BAD_REQUEST);
    }
  }

  #[test]
  fn unauthenticated_and_conflict_statuses() {
    assert_eq!(
      AppError::from(CheckoutError::Unauthenticated).status_code(),
      StatusCode::UNAUTHORIZED
    );
    assert_eq!(
      AppError::from(CheckoutError::Conflict {
        resource: "stock of product 'p'".to_string()
      })
      .status_code(),
      StatusCode::CONFLICT
    );
    assert_eq!(
      AppError::from(CheckoutError::StockContended {
        product_id: "p".to_string(),
        current: 3,
      })
      .status_code(),
      StatusCode::CONFLICT
    );
  }

  #[test]
  fn store_failures_map_to_internal_error() {
    let err = AppError::from(CheckoutError::OrderCommitFailed {
      source: anyhow::anyhow!("connection reset"),
    });
    assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);

    let err = AppError::from(CheckoutError::Store(StoreError::Backend(anyhow::anyhow!("pool timed out"))));
    assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
  }

  #[actix_web::test]
  async fn validation_body_carries_message_verbatim() {
    let body = body_of(AppError::from(CheckoutError::InsufficientStock {
      product_id: "kettle".to_string(),
      product_name: "Gooseneck kettle".to_string(),
      remaining: 2,
    }))
    .await;
    assert_eq!(body["error"], "Insufficient stock for Gooseneck kettle: only 2 left");
  }

  #[actix_web::test]
  async fn internal_body_hides_backend_detail() {
    let body = body_of(AppError::from(CheckoutError::OrderCommitFailed {
      source: anyhow::anyhow!("password authentication failed for user app"),
    }))
    .await;
    assert_eq!(body["error"], "Order could not be committed, please retry");

    let body = body_of(AppError::Internal("secret detail".to_string())).await;
    assert_eq!(body["error"], "An internal error occurred");
  }
}
