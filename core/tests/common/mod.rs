// tests/common/mod.rs
#![allow(dead_code)] // Not every test binary uses every fixture.

use async_trait::async_trait;
use chrono::Utc;
use ordergate::model::{
  CartLine, CartSnapshot, Customer, Delivery, Order, Payment, PointsLedgerEntry, Product, UserAccount, Voucher,
  VoucherStatus,
};
use ordergate::settings::CodeFormat;
use ordergate::store::{DocumentStore, StoreError, Transaction, VoucherFilter};
use ordergate::{
  CheckoutRequest, CheckoutService, CheckoutSettings, CodeGenerator, ContextData, InMemoryStore, OrderNotifier,
  PipelineControl, PipelineError, RandomCodes,
};
use parking_lot::Mutex;
use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use tracing::Level;

// --- Pipeline engine fixtures ---
#[derive(Clone, Debug, Default)]
pub struct TestContext {
  pub counter: i32,
  pub message: String,
  pub stages_executed: Vec<String>,
  pub should_stop_at: Option<String>,
}

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum TestError {
  #[error("Pipeline error: {0}")]
  Pipeline(String), // Stored as Debug text so assertions can compare.

  #[error("Test handler failed: {0}")]
  Handler(String),
}

impl From<PipelineError> for TestError {
  fn from(err: PipelineError) -> Self {
    TestError::Pipeline(format!("{:?}", err))
  }
}

pub fn create_simple_handler(
  stage_name: &'static str,
  message_to_append: &'static str,
) -> ordergate::pipeline::Handler<TestContext, TestError> {
  Box::new(move |ctx: ContextData<TestContext>| {
    let stage_name_owned = stage_name.to_string();
    Box::pin(async move {
      let mut guard = ctx.write();
      guard.counter += 1;
      guard.message.push_str(message_to_append);
      guard.stages_executed.push(stage_name_owned.clone());
      tracing::debug!(target: "test_handlers", stage = %stage_name_owned, counter = guard.counter, "executed");
      if guard.should_stop_at.as_deref() == Some(stage_name_owned.as_str()) {
        return Ok(PipelineControl::Stop);
      }
      Ok(PipelineControl::Continue)
    })
  })
}

pub fn create_failing_handler(
  stage_name: &'static str,
  error_message: &'static str,
) -> ordergate::pipeline::Handler<TestContext, TestError> {
  Box::new(move |ctx: ContextData<TestContext>| {
    let stage_name_owned = stage_name.to_string();
    let error_message_owned = error_message.to_string();
    Box::pin(async move {
      ctx.write().stages_executed.push(stage_name_owned.clone());
      tracing::warn!(target: "test_handlers", stage = %stage_name_owned, "failing with: '{}'", error_message_owned);
      Err(TestError::Handler(error_message_owned))
    })
  })
}

// --- Tracing setup (once per test binary) ---
use once_cell::sync::Lazy;
static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer()
    .try_init()
    .ok();
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}

// --- Catalog and account fixtures ---
pub const ALICE: &str = "user-alice";
pub const BOB: &str = "user-bob";

pub fn product(id: &str, retail_price: i64, stock: i64) -> Product {
  Product {
    id: id.to_string(),
    name: format!("Product {}", id),
    unit: "pcs".to_string(),
    image_url: None,
    retail_price,
    wholesale_price: None,
    wholesale_min_quantity: None,
    stock,
    warehouse_stock: BTreeMap::new(),
  }
}

pub fn wholesale_product(id: &str, retail_price: i64, wholesale_price: i64, min_quantity: u32, stock: i64) -> Product {
  Product {
    wholesale_price: Some(wholesale_price),
    wholesale_min_quantity: Some(min_quantity),
    ..product(id, retail_price, stock)
  }
}

pub fn account(id: &str, points: i64) -> UserAccount {
  UserAccount {
    id: id.to_string(),
    name: id.trim_start_matches("user-").to_string(),
    points,
  }
}

pub fn active_voucher(id: &str, user_id: &str, code: &str, value: i64) -> Voucher {
  Voucher {
    id: id.to_string(),
    user_id: user_id.to_string(),
    code: code.to_string(),
    value,
    status: VoucherStatus::Active,
    created_at: Utc::now(),
    used_at: None,
    used_in_order: None,
  }
}

pub fn cart_of(user_id: &str, lines: Vec<CartLine>) -> CartSnapshot {
  CartSnapshot {
    user_id: user_id.to_string(),
    lines,
    updated_at: Utc::now(),
  }
}

pub fn request(items: Vec<CartLine>) -> CheckoutRequest {
  CheckoutRequest {
    items,
    customer: Customer {
      name: "Dana".to_string(),
      phone: "+15550100".to_string(),
    },
    delivery: Delivery {
      method: "courier".to_string(),
      address: Some("12 Harbour Road".to_string()),
    },
    payment: Payment {
      method: "bank_transfer".to_string(),
      proof_ref: None,
    },
    voucher_code: None,
    use_points: false,
  }
}

/// Store seeded with a small catalog:
/// - `coffee`: 30_000 retail, stock 10
/// - `beans`: 12_000 retail, 9_000 wholesale from 5 units, stock 100
/// - `mug`: 25_000 retail, stock 3
/// and two customers, Alice with 40_000 points and Bob with none.
pub fn seeded_store() -> Arc<InMemoryStore> {
  let store = InMemoryStore::new();
  store.insert_product(product("coffee", 30_000, 10));
  store.insert_product(wholesale_product("beans", 12_000, 9_000, 5, 100));
  store.insert_product(product("mug", 25_000, 3));
  store.insert_user(account(ALICE, 40_000));
  store.insert_user(account(BOB, 0));
  Arc::new(store)
}

pub fn service(store: Arc<InMemoryStore>) -> CheckoutService {
  service_with(store, CheckoutSettings::default())
}

pub fn service_with(store: Arc<InMemoryStore>, settings: CheckoutSettings) -> CheckoutService {
  CheckoutService::new(store, settings).expect("test settings are valid")
}

// --- Collaborator doubles ---

/// Hands out scripted codes first, then random ones.
#[derive(Debug, Default)]
pub struct ScriptedCodes {
  queue: Mutex<VecDeque<String>>,
}

impl ScriptedCodes {
  pub fn new<I, S>(codes: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    Self {
      queue: Mutex::new(codes.into_iter().map(Into::into).collect()),
    }
  }
}

impl CodeGenerator for ScriptedCodes {
  fn generate(&self, format: &CodeFormat) -> String {
    self.queue.lock().pop_front().unwrap_or_else(|| RandomCodes.generate(format))
  }
}

/// Always returns the same code.
#[derive(Debug)]
pub struct FixedCode(pub &'static str);

impl CodeGenerator for FixedCode {
  fn generate(&self, _format: &CodeFormat) -> String {
    self.0.to_string()
  }
}

#[derive(Debug, Default)]
pub struct RecordingNotifier {
  pub placed: Mutex<Vec<String>>,
}

impl OrderNotifier for RecordingNotifier {
  fn order_placed(&self, order: &Order) {
    self.placed.lock().push(order.id.clone());
  }
}

/// An `InMemoryStore` seen through a busier backend: product reads can be slowed down, and
/// queued rival transactions are committed just before the next commit goes through.
pub struct InterposedStore {
  pub inner: Arc<InMemoryStore>,
  read_delay: Duration,
  rivals: Mutex<VecDeque<Transaction>>,
}

impl InterposedStore {
  pub fn new(inner: Arc<InMemoryStore>) -> Self {
    Self {
      inner,
      read_delay: Duration::ZERO,
      rivals: Mutex::new(VecDeque::new()),
    }
  }

  pub fn with_read_delay(mut self, delay: Duration) -> Self {
    self.read_delay = delay;
    self
  }

  /// Lands `tx` between the caller's reads and its next commit.
  pub fn before_next_commit(&self, tx: Transaction) {
    self.rivals.lock().push_back(tx);
  }
}

#[async_trait]
impl DocumentStore for InterposedStore {
  async fn get_product(&self, product_id: &str) -> Result<Option<Product>, StoreError> {
    if !self.read_delay.is_zero() {
      tokio::time::sleep(self.read_delay).await;
    }
    self.inner.get_product(product_id).await
  }

  async fn get_user(&self, user_id: &str) -> Result<Option<UserAccount>, StoreError> {
    self.inner.get_user(user_id).await
  }

  async fn get_order(&self, order_id: &str) -> Result<Option<Order>, StoreError> {
    self.inner.get_order(order_id).await
  }

  async fn get_cart(&self, user_id: &str) -> Result<Option<CartSnapshot>, StoreError> {
    self.inner.get_cart(user_id).await
  }

  async fn find_vouchers(&self, filter: &VoucherFilter) -> Result<Vec<Voucher>, StoreError> {
    self.inner.find_vouchers(filter).await
  }

  async fn ledger_for(&self, user_id: &str) -> Result<Vec<PointsLedgerEntry>, StoreError> {
    self.inner.ledger_for(user_id).await
  }

  async fn commit(&self, tx: Transaction) -> Result<(), StoreError> {
    let rival = self.rivals.lock().pop_front();
    if let Some(rival) = rival {
      self.inner.commit(rival).await.expect("rival transaction commits");
    }
    self.inner.commit(tx).await
  }
}

/// Stock decrement as another buyer's commit would write it.
pub fn rival_purchase(product_id: &str, expected: i64, quantity: i64) -> Transaction {
  let mut tx = Transaction::new();
  tx.push(ordergate::store::Write::AdjustStock {
    product_id: product_id.to_string(),
    expected,
    delta: -quantity,
  });
  tx
}
