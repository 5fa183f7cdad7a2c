// storefront/src/services/session_service.rs

//! Resolves who is calling from the `Authorization` header. The checkout core only ever sees
//! the resulting `Requester`; a user id in a request body is never trusted.

use crate::errors::AppError;
use ordergate::model::Requester;
use sqlx::PgPool;
use tracing::{debug, instrument, warn};

/// Extracts the bearer token from an `Authorization` header value.
///
/// `None` means no credentials were presented. A header in any other shape is an error, not a
/// silent downgrade to guest.
pub fn bearer_token(header: Option<&str>) -> Result<Option<&str>, AppError> {
  let Some(header) = header else {
    return Ok(None);
  };
  let token = header
    .strip_prefix("Bearer ")
    .or_else(|| header.strip_prefix("bearer "))
    .map(str::trim)
    .filter(|t| !t.is_empty())
    .ok_or_else(|| AppError::Unauthenticated("Malformed Authorization header".to_string()))?;
  Ok(Some(token))
}

#[instrument(name = "session_service::resolve_requester", skip_all, err(Display))]
pub async fn resolve_requester(pool: &PgPool, header: Option<&str>) -> Result<Requester, AppError> {
  let Some(token) = bearer_token(header)? else {
    debug!("No credentials presented; continuing as guest.");
    return Ok(Requester::Guest);
  };

  let user_id: Option<String> = sqlx::query_scalar("SELECT user_id FROM sessions WHERE token = $1 AND expires_at > NOW()")
    .bind(token)
    .fetch_optional(pool)
    .await?;

  match user_id {
    Some(user_id) => {
      debug!(%user_id, "Session verified.");
      Ok(Requester::Customer(user_id))
    }
    None => {
      warn!("Unknown or expired session token presented.");
      Err(AppError::Unauthenticated("Session is invalid or expired".to_string()))
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn missing_header_means_guest() {
    assert_eq!(bearer_token(None).unwrap(), None);
  }

  #[test]
  fn bearer_token_is_extracted_and_trimmed() {
    assert_eq!(bearer_token(Some("Bearer abc123 ")).unwrap(), Some("abc123"));
    assert_eq!(bearer_token(Some("bearer xyz")).unwrap(), Some("xyz"));
  }

  #[test]
  fn other_schemes_and_empty_tokens_are_rejected() {
    assert!(matches!(bearer_token(Some("Basic dXNlcg==")), Err(AppError::Unauthenticated(_))));
    assert!(matches!(bearer_token(Some("Bearer   ")), Err(AppError::Unauthenticated(_))));
  }
}
