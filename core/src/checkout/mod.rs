// ordergate/src/checkout/mod.rs

//! The checkout service: runs the checkout pipeline for a verified requester and re-runs it
//! from scratch when the commit loses an optimistic-concurrency race.

pub mod commit;
pub mod context;
pub mod notify;
pub mod pipeline;

pub use commit::{commit_order, CommitPlan};
pub use context::{CheckoutCtxData, CheckoutDeps, CheckoutReceipt, CheckoutRequest};
pub use notify::{LogNotifier, OrderNotifier};
pub use pipeline::{build_checkout_pipeline, CheckoutPipeline};

use crate::codes::{CodeGenerator, RandomCodes};
use crate::error::{CheckoutError, CheckoutResult, PipelineError};
use crate::exchange::{self, VoucherIssued};
use crate::model::Requester;
use crate::pipeline::{ContextData, PipelineResult};
use crate::settings::{CheckoutSettings, SettingsError};
use crate::store::DocumentStore;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{event, instrument, Level};

pub struct CheckoutService {
  deps: CheckoutDeps,
  pipeline: CheckoutPipeline,
}

impl std::fmt::Debug for CheckoutService {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("CheckoutService")
      .field("settings", &self.deps.settings)
      .field("stages", &self.pipeline.stage_names())
      .finish()
  }
}

impl CheckoutService {
  /// Builds the service with random codes and log-only notifications.
  pub fn new(store: Arc<dyn DocumentStore>, settings: CheckoutSettings) -> Result<Self, SettingsError> {
    settings.validate()?;
    Ok(Self {
      deps: CheckoutDeps {
        store,
        settings: Arc::new(settings),
        codes: Arc::new(RandomCodes),
        notifier: Arc::new(LogNotifier),
      },
      pipeline: build_checkout_pipeline(),
    })
  }

  pub fn with_code_generator(mut self, codes: Arc<dyn CodeGenerator>) -> Self {
    self.deps.codes = codes;
    self
  }

  pub fn with_notifier(mut self, notifier: Arc<dyn OrderNotifier>) -> Self {
    self.deps.notifier = notifier;
    self
  }

  pub fn settings(&self) -> &CheckoutSettings {
    &self.deps.settings
  }

  pub fn store(&self) -> &Arc<dyn DocumentStore> {
    &self.deps.store
  }

  /// Places an order for `requester`. Every run re-reads products, balances and vouchers;
  /// a failed run leaves nothing behind.
  ///
  /// A run that loses stock to a concurrent order is re-run without spending
  /// `max_checkout_attempts` as long as the contended stock keeps falling: each drop is an
  /// order that landed, so these re-runs end in a commit or in `InsufficientStock`. Other
  /// conflicts, and stock that rose again, spend the attempt budget.
  #[instrument(name = "checkout", skip(self, request), fields(requester = ?requester, lines = request.items.len()))]
  pub async fn checkout(&self, requester: Requester, request: CheckoutRequest) -> CheckoutResult<CheckoutReceipt> {
    let max_attempts = self.deps.settings.max_checkout_attempts;
    let mut attempt = 1;
    let mut run = 1;
    let mut stock_seen: HashMap<String, i64> = HashMap::new();
    loop {
      let err = match self.run_once(&requester, &request, run).await {
        Ok(receipt) => return Ok(receipt),
        Err(err) => err,
      };
      let retry = match &err {
        CheckoutError::StockContended { product_id, current }
          if stock_seen.get(product_id).map_or(true, |seen| current < seen) =>
        {
          event!(Level::WARN, run, %product_id, current, "Stock taken by a concurrent checkout, retrying.");
          stock_seen.insert(product_id.clone(), *current);
          true
        }
        CheckoutError::Conflict { .. } | CheckoutError::StockContended { .. } if attempt < max_attempts => {
          event!(Level::WARN, run, attempt, error = %err, "Checkout lost a concurrent update, retrying.");
          attempt += 1;
          true
        }
        _ => false,
      };
      if !retry {
        if err.is_validation() {
          event!(Level::INFO, run, error = %err, "Checkout rejected.");
        } else {
          event!(Level::ERROR, run, error = %err, "Checkout failed.");
        }
        return Err(err);
      }
      run += 1;
    }
  }

  async fn run_once(
    &self,
    requester: &Requester,
    request: &CheckoutRequest,
    attempt: u32,
  ) -> CheckoutResult<CheckoutReceipt> {
    let ctx_data = ContextData::new(CheckoutCtxData::new(
      self.deps.clone(),
      requester.clone(),
      request.clone(),
      attempt,
    ));

    match self.pipeline.run(ctx_data.clone()).await? {
      PipelineResult::Completed => {}
      PipelineResult::Stopped => {
        return Err(PipelineError::Internal("checkout pipeline stopped before commit".to_string()).into());
      }
    }

    let guard = ctx_data.read();
    let order = guard
      .order
      .as_ref()
      .ok_or_else(|| PipelineError::Internal("checkout completed without an order".to_string()))?;
    Ok(CheckoutReceipt::from(order))
  }

  /// Trades `points` of the requester's balance for a new voucher worth their value.
  #[instrument(name = "exchange", skip(self), fields(requester = ?requester))]
  pub async fn exchange_points(&self, requester: &Requester, points: i64) -> CheckoutResult<VoucherIssued> {
    let max_attempts = self.deps.settings.max_checkout_attempts;
    let mut attempt = 1;
    loop {
      let result = exchange::exchange_points(
        self.deps.store.as_ref(),
        self.deps.codes.as_ref(),
        &self.deps.settings,
        requester,
        points,
      )
      .await;
      match result {
        Err(err @ CheckoutError::Conflict { .. }) if attempt < max_attempts => {
          event!(Level::WARN, attempt, error = %err, "Points balance changed during exchange, retrying.");
          attempt += 1;
        }
        other => return other,
      }
    }
  }
}
