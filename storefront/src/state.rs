// storefront/src/state.rs
use ordergate::CheckoutService;
use sqlx::PgPool;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
  pub db_pool: PgPool,
  pub checkout: Arc<CheckoutService>,
}
