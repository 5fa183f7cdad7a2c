// storefront/src/web/routes.rs

use crate::errors::AppError;
use crate::state::AppState;
use actix_web::{web, HttpResponse};
use serde_json::json;

async fn health_check_handler(app_state: web::Data<AppState>) -> HttpResponse {
  match sqlx::query("SELECT 1").execute(&app_state.db_pool).await {
    Ok(_) => HttpResponse::Ok().json(json!({ "status": "ok" })),
    Err(e) => {
      tracing::warn!(error = %e, "Health check could not reach the database.");
      HttpResponse::ServiceUnavailable().json(json!({ "status": "degraded" }))
    }
  }
}

/// Rejected JSON bodies answer with the same `{"error": ...}` shape as every other failure.
pub fn json_config() -> web::JsonConfig {
  web::JsonConfig::default()
    .limit(256 * 1024)
    .error_handler(|err, _req| AppError::Validation(format!("Invalid request body: {}", err)).into())
}

pub fn configure_app_routes(cfg: &mut web::ServiceConfig) {
  cfg.service(
    web::scope("/api/v1")
      .route("/health", web::get().to(health_check_handler))
      .service(
        web::scope("/checkout").route(
          "",
          web::post().to(crate::web::handlers::checkout_handlers::checkout_handler),
        ),
      )
      .service(
        web::scope("/vouchers").route(
          "/exchange",
          web::post().to(crate::web::handlers::voucher_handlers::exchange_points_handler),
        ),
      ),
  );
}
