// ordergate/src/store/mod.rs

//! The document-store port checkout is written against.
//!
//! Reads are single bounded requests. Every mutation goes through `DocumentStore::commit`,
//! which applies a whole `Transaction` or nothing. Each `Write` carries the precondition it
//! was planned under, so a concurrent change between read and commit is detected instead of
//! overwritten.

pub mod memory;

use crate::model::{CartSnapshot, Order, PointsLedgerEntry, Product, UserAccount, Voucher, VoucherStatus};
use async_trait::async_trait;
use thiserror::Error;

pub use memory::InMemoryStore;

/// Logical collections, used for error reporting and by adapters for routing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
  Products,
  Users,
  Vouchers,
  Orders,
  Carts,
  PointsLedger,
}

impl std::fmt::Display for Collection {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    let name = match self {
      Collection::Products => "products",
      Collection::Users => "users",
      Collection::Vouchers => "vouchers",
      Collection::Orders => "orders",
      Collection::Carts => "carts",
      Collection::PointsLedger => "points_ledger",
    };
    f.write_str(name)
  }
}

/// A write precondition that no longer held at commit time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Conflict {
  Stock {
    product_id: String,
    expected: i64,
    current: i64,
  },
  Points {
    user_id: String,
    expected: i64,
    current: i64,
  },
  Voucher {
    voucher_id: String,
    current: VoucherStatus,
  },
}

impl std::fmt::Display for Conflict {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Conflict::Stock {
        product_id,
        expected,
        current,
      } => write!(f, "stock of product '{}' is {} (expected {})", product_id, current, expected),
      Conflict::Points {
        user_id,
        expected,
        current,
      } => write!(f, "points of user '{}' are {} (expected {})", user_id, current, expected),
      Conflict::Voucher { voucher_id, current } => {
        write!(f, "voucher '{}' is {} (expected ACTIVE)", voucher_id, current.as_str())
      }
    }
  }
}

#[derive(Debug, Error)]
pub enum StoreError {
  #[error("Write conflict: {0}")]
  Conflict(Conflict),

  #[error("Duplicate key '{key}' in {collection}")]
  DuplicateKey { collection: Collection, key: String },

  #[error("Document '{key}' not found in {collection}")]
  NotFound { collection: Collection, key: String },

  #[error("Store backend failure: {0}")]
  Backend(#[source] anyhow::Error),
}

/// One mutation inside a `Transaction`, with its precondition.
#[derive(Debug, Clone, PartialEq)]
pub enum Write {
  /// Fails with `DuplicateKey` when an order with the same id exists.
  CreateOrder(Order),
  /// Requires `stock == expected` and `expected + delta >= 0`.
  AdjustStock {
    product_id: String,
    expected: i64,
    delta: i64,
  },
  /// Requires `points == expected` and `expected + delta >= 0`.
  AdjustPoints {
    user_id: String,
    expected: i64,
    delta: i64,
  },
  AppendLedger(PointsLedgerEntry),
  /// Requires the voucher to be `Active`; marks it `Used` by `order_id`.
  ConsumeVoucher { voucher_id: String, order_id: String },
  /// Fails with `DuplicateKey` on an existing id, or an existing code for the same user.
  CreateVoucher(Voucher),
  ClearCart { user_id: String },
}

/// An ordered batch of writes committed atomically.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Transaction {
  writes: Vec<Write>,
}

impl Transaction {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn push(&mut self, write: Write) -> &mut Self {
    self.writes.push(write);
    self
  }

  pub fn writes(&self) -> &[Write] {
    &self.writes
  }

  pub fn is_empty(&self) -> bool {
    self.writes.is_empty()
  }

  pub fn into_writes(self) -> Vec<Write> {
    self.writes
  }
}

/// Equality filter for the voucher scan. `None` fields match anything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VoucherFilter {
  pub user_id: String,
  pub code: Option<String>,
  pub status: Option<VoucherStatus>,
}

impl VoucherFilter {
  pub fn matches(&self, voucher: &Voucher) -> bool {
    voucher.user_id == self.user_id
      && self.code.as_ref().map_or(true, |code| *code == voucher.code)
      && self.status.map_or(true, |status| status == voucher.status)
  }
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
  async fn get_product(&self, product_id: &str) -> Result<Option<Product>, StoreError>;

  async fn get_user(&self, user_id: &str) -> Result<Option<UserAccount>, StoreError>;

  async fn get_order(&self, order_id: &str) -> Result<Option<Order>, StoreError>;

  async fn get_cart(&self, user_id: &str) -> Result<Option<CartSnapshot>, StoreError>;

  async fn find_vouchers(&self, filter: &VoucherFilter) -> Result<Vec<Voucher>, StoreError>;

  /// Ledger entries of one user, oldest first.
  async fn ledger_for(&self, user_id: &str) -> Result<Vec<PointsLedgerEntry>, StoreError>;

  /// Applies every write of `tx` or none of them.
  async fn commit(&self, tx: Transaction) -> Result<(), StoreError>;
}
