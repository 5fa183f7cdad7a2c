// ordergate/src/error.rs
use crate::store::StoreError;
use anyhow::Error as AnyhowError;
use thiserror::Error;

/// Failures raised by the stage runner itself rather than by stage logic.
#[derive(Debug, Error)]
pub enum PipelineError {
  #[error("Handler missing for mandatory stage: {stage_name}")]
  HandlerMissing { stage_name: String },

  #[error("Stage '{stage_name}' left the context incomplete: {message}")]
  IncompleteContext { stage_name: String, message: String },

  #[error("Internal pipeline error: {0}")]
  Internal(String),
}

/// Everything a checkout or a points exchange can fail with.
///
/// Validation failures are detected before any write and are safe to show verbatim.
/// `Conflict` and `OrderCommitFailed` leave no partial state and can be retried as a whole.
#[derive(Debug, Error)]
pub enum CheckoutError {
  #[error("Cart is empty")]
  EmptyCart,

  #[error("Quantity for product '{product_id}' must be at least 1")]
  InvalidQuantity { product_id: String },

  #[error("Product '{product_id}' not found")]
  ProductNotFound { product_id: String },

  #[error("Insufficient stock for {product_name}: only {remaining} left")]
  InsufficientStock {
    product_id: String,
    product_name: String,
    remaining: i64,
  },

  #[error("Order amount for product '{product_id}' is too large")]
  AmountOverflow { product_id: String },

  #[error("Checkout collided with a concurrent update of {resource}, please retry")]
  Conflict { resource: String },

  /// Another order took units of the product between validation and commit, and `current`
  /// still covers this cart.
  #[error("Stock of product '{product_id}' changed during checkout, please retry")]
  StockContended { product_id: String, current: i64 },

  #[error("Order could not be committed, please retry")]
  OrderCommitFailed {
    #[source]
    source: AnyhowError,
  },

  #[error("Sign in required")]
  Unauthenticated,

  #[error("Account '{user_id}' not found")]
  AccountNotFound { user_id: String },

  #[error("Insufficient points: balance {balance}, requested {requested}")]
  InsufficientPoints { balance: i64, requested: i64 },

  #[error("Invalid points exchange: {0}")]
  InvalidExchange(String),

  #[error("Document store error: {0}")]
  Store(#[from] StoreError),

  #[error("Checkout pipeline error: {0}")]
  Pipeline(#[from] PipelineError),
}

impl CheckoutError {
  /// Caller-side mistakes, reported as a bad request. Nothing was written.
  pub fn is_validation(&self) -> bool {
    matches!(
      self,
      CheckoutError::EmptyCart
        | CheckoutError::InvalidQuantity { .. }
        | CheckoutError::ProductNotFound { .. }
        | CheckoutError::InsufficientStock { .. }
        | CheckoutError::AmountOverflow { .. }
        | CheckoutError::AccountNotFound { .. }
        | CheckoutError::InsufficientPoints { .. }
        | CheckoutError::InvalidExchange(_)
    )
  }

  /// The whole operation may be re-run from scratch.
  pub fn is_retryable(&self) -> bool {
    matches!(
      self,
      CheckoutError::Conflict { .. } | CheckoutError::StockContended { .. } | CheckoutError::OrderCommitFailed { .. }
    )
  }
}

pub type CheckoutResult<T, E = CheckoutError> = std::result::Result<T, E>;
