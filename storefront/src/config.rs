// storefront/src/config.rs

use crate::errors::{AppError, Result};
use dotenvy::dotenv;
use ordergate::settings::{CheckoutSettings, PromotionRule};
use std::env;
use std::str::FromStr;

#[derive(Debug, Clone)]
pub struct AppConfig {
  pub server_host: String,
  pub server_port: u16,
  pub database_url: String,
  pub database_max_connections: u32,
  pub run_migrations: bool,
  pub checkout: CheckoutSettings,
}

fn parse_var<T>(name: &str, raw: Option<String>, default: T) -> Result<T>
where
  T: FromStr,
  T::Err: std::fmt::Display,
{
  match raw {
    None => Ok(default),
    Some(value) => value
      .trim()
      .parse::<T>()
      .map_err(|e| AppError::Config(format!("Invalid {}: {}", name, e))),
  }
}

/// Checkout tunables layered over the defaults. `lookup` returns the raw value of a variable.
pub fn checkout_settings_from(lookup: impl Fn(&str) -> Option<String>) -> Result<CheckoutSettings> {
  let mut settings = CheckoutSettings::default();

  if let Some(prefix) = lookup("ORDER_ID_PREFIX") {
    settings.order_ids.prefix = prefix;
  }
  if let Some(prefix) = lookup("VOUCHER_CODE_PREFIX") {
    settings.voucher_codes.prefix = prefix;
  }
  settings.points.currency_per_point = parse_var(
    "POINTS_CURRENCY_PER_POINT",
    lookup("POINTS_CURRENCY_PER_POINT"),
    settings.points.currency_per_point,
  )?;
  settings.points.max_redeem_percent = parse_var(
    "POINTS_MAX_REDEEM_PERCENT",
    lookup("POINTS_MAX_REDEEM_PERCENT"),
    settings.points.max_redeem_percent,
  )?;
  settings.max_checkout_attempts = parse_var(
    "CHECKOUT_MAX_ATTEMPTS",
    lookup("CHECKOUT_MAX_ATTEMPTS"),
    settings.max_checkout_attempts,
  )?;
  if let Some(raw) = lookup("PROMOTION_RULES") {
    settings.promotions = serde_json::from_str::<Vec<PromotionRule>>(&raw)
      .map_err(|e| AppError::Config(format!("Invalid PROMOTION_RULES: {}", e)))?;
  }

  settings.validate()?;
  Ok(settings)
}

impl AppConfig {
  pub fn from_env() -> Result<Self> {
    dotenv().ok(); // .env is optional

    let get_env = |var_name: &str| env::var(var_name).ok();

    let server_host = get_env("SERVER_HOST").unwrap_or_else(|| "127.0.0.1".to_string());
    let server_port = parse_var("SERVER_PORT", get_env("SERVER_PORT"), 8080u16)?;
    let database_url =
      get_env("DATABASE_URL").ok_or_else(|| AppError::Config("Missing environment variable 'DATABASE_URL'".to_string()))?;
    let database_max_connections = parse_var("DATABASE_MAX_CONNECTIONS", get_env("DATABASE_MAX_CONNECTIONS"), 10u32)?;
    let run_migrations = parse_var("RUN_MIGRATIONS", get_env("RUN_MIGRATIONS"), true)?;
    let checkout = checkout_settings_from(get_env)?;

    tracing::info!(
      server_host = %server_host,
      server_port,
      database_max_connections,
      run_migrations,
      order_prefix = %checkout.order_ids.prefix,
      "Application configuration loaded."
    );

    Ok(Self {
      server_host,
      server_port,
      database_url,
      database_max_connections,
      run_migrations,
      checkout,
    })
  }
}
