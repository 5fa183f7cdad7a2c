// ordergate/src/store/memory.rs

//! Process-local `DocumentStore`, used by tests, benchmarks and local demos.
//!
//! A commit stages every write on a copy of the collections while holding the write lock and
//! swaps the copy in only if all preconditions held, so readers never see half a transaction.

use super::{Collection, Conflict, DocumentStore, StoreError, Transaction, VoucherFilter, Write};
use crate::model::{CartSnapshot, Order, PointsLedgerEntry, Product, UserAccount, Voucher, VoucherStatus};
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use tracing::{event, instrument, Level};

#[derive(Debug, Clone, Default)]
struct Collections {
  products: HashMap<String, Product>,
  users: HashMap<String, UserAccount>,
  vouchers: HashMap<String, Voucher>,
  orders: HashMap<String, Order>,
  carts: HashMap<String, CartSnapshot>,
  ledger: Vec<PointsLedgerEntry>,
}

#[derive(Debug, Default)]
pub struct InMemoryStore {
  data: RwLock<Collections>,
  failing_commits: AtomicU32,
  commits: AtomicU64,
}

impl InMemoryStore {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn insert_product(&self, product: Product) {
    self.data.write().products.insert(product.id.clone(), product);
  }

  pub fn insert_user(&self, user: UserAccount) {
    self.data.write().users.insert(user.id.clone(), user);
  }

  pub fn insert_voucher(&self, voucher: Voucher) {
    self.data.write().vouchers.insert(voucher.id.clone(), voucher);
  }

  pub fn put_cart(&self, cart: CartSnapshot) {
    self.data.write().carts.insert(cart.user_id.clone(), cart);
  }

  /// Makes the next `n` commits fail with a backend error before touching anything.
  pub fn fail_next_commits(&self, n: u32) {
    self.failing_commits.store(n, Ordering::SeqCst);
  }

  /// Number of transactions applied so far.
  pub fn commit_count(&self) -> u64 {
    self.commits.load(Ordering::SeqCst)
  }

  pub fn orders(&self) -> Vec<Order> {
    let mut orders: Vec<Order> = self.data.read().orders.values().cloned().collect();
    orders.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
    orders
  }

  pub fn vouchers(&self) -> Vec<Voucher> {
    self.data.read().vouchers.values().cloned().collect()
  }

  pub fn stock_of(&self, product_id: &str) -> Option<i64> {
    self.data.read().products.get(product_id).map(|p| p.stock)
  }

  pub fn points_of(&self, user_id: &str) -> Option<i64> {
    self.data.read().users.get(user_id).map(|u| u.points)
  }

  fn take_injected_failure(&self) -> bool {
    self
      .failing_commits
      .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
      .is_ok()
  }
}

fn apply(staged: &mut Collections, write: Write) -> Result<(), StoreError> {
  match write {
    Write::CreateOrder(order) => {
      if staged.orders.contains_key(&order.id) {
        return Err(StoreError::DuplicateKey {
          collection: Collection::Orders,
          key: order.id,
        });
      }
      staged.orders.insert(order.id.clone(), order);
    }
    Write::AdjustStock {
      product_id,
      expected,
      delta,
    } => {
      let product = staged.products.get_mut(&product_id).ok_or_else(|| StoreError::NotFound {
        collection: Collection::Products,
        key: product_id.clone(),
      })?;
      if product.stock != expected || expected + delta < 0 {
        return Err(StoreError::Conflict(Conflict::Stock {
          product_id,
          expected,
          current: product.stock,
        }));
      }
      product.stock = expected + delta;
    }
    Write::AdjustPoints {
      user_id,
      expected,
      delta,
    } => {
      let user = staged.users.get_mut(&user_id).ok_or_else(|| StoreError::NotFound {
        collection: Collection::Users,
        key: user_id.clone(),
      })?;
      if user.points != expected || expected + delta < 0 {
        return Err(StoreError::Conflict(Conflict::Points {
          user_id,
          expected,
          current: user.points,
        }));
      }
      user.points = expected + delta;
    }
    Write::AppendLedger(entry) => {
      if staged.ledger.iter().any(|e| e.id == entry.id) {
        return Err(StoreError::DuplicateKey {
          collection: Collection::PointsLedger,
          key: entry.id.to_string(),
        });
      }
      staged.ledger.push(entry);
    }
    Write::ConsumeVoucher { voucher_id, order_id } => {
      let voucher = staged.vouchers.get_mut(&voucher_id).ok_or_else(|| StoreError::NotFound {
        collection: Collection::Vouchers,
        key: voucher_id.clone(),
      })?;
      if voucher.status != VoucherStatus::Active {
        return Err(StoreError::Conflict(Conflict::Voucher {
          voucher_id,
          current: voucher.status,
        }));
      }
      voucher.status = VoucherStatus::Used;
      voucher.used_at = Some(Utc::now());
      voucher.used_in_order = Some(order_id);
    }
    Write::CreateVoucher(voucher) => {
      let code_taken = staged
        .vouchers
        .values()
        .any(|v| v.user_id == voucher.user_id && v.code == voucher.code);
      if staged.vouchers.contains_key(&voucher.id) || code_taken {
        return Err(StoreError::DuplicateKey {
          collection: Collection::Vouchers,
          key: voucher.code,
        });
      }
      staged.vouchers.insert(voucher.id.clone(), voucher);
    }
    Write::ClearCart { user_id } => {
      if let Some(cart) = staged.carts.get_mut(&user_id) {
        cart.lines.clear();
        cart.updated_at = Utc::now();
      }
    }
  }
  Ok(())
}

#[async_trait]
impl DocumentStore for InMemoryStore {
  async fn get_product(&self, product_id: &str) -> Result<Option<Product>, StoreError> {
    Ok(self.data.read().products.get(product_id).cloned())
  }

  async fn get_user(&self, user_id: &str) -> Result<Option<UserAccount>, StoreError> {
    Ok(self.data.read().users.get(user_id).cloned())
  }

  async fn get_order(&self, order_id: &str) -> Result<Option<Order>, StoreError> {
    Ok(self.data.read().orders.get(order_id).cloned())
  }

  async fn get_cart(&self, user_id: &str) -> Result<Option<CartSnapshot>, StoreError> {
    Ok(self.data.read().carts.get(user_id).cloned())
  }

  async fn find_vouchers(&self, filter: &VoucherFilter) -> Result<Vec<Voucher>, StoreError> {
    let guard = self.data.read();
    let mut found: Vec<Voucher> = guard.vouchers.values().filter(|v| filter.matches(v)).cloned().collect();
    found.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
    Ok(found)
  }

  async fn ledger_for(&self, user_id: &str) -> Result<Vec<PointsLedgerEntry>, StoreError> {
    Ok(self.data.read().ledger.iter().filter(|e| e.user_id == user_id).cloned().collect())
  }

  #[instrument(name = "InMemoryStore::commit", skip_all, fields(writes = tx.writes().len()), err(Display))]
  async fn commit(&self, tx: Transaction) -> Result<(), StoreError> {
    if self.take_injected_failure() {
      return Err(StoreError::Backend(anyhow::anyhow!("injected commit failure")));
    }

    let mut guard = self.data.write();
    let mut staged = guard.clone();
    for write in tx.into_writes() {
      apply(&mut staged, write)?;
    }
    *guard = staged;
    self.commits.fetch_add(1, Ordering::SeqCst);
    event!(Level::DEBUG, "Transaction applied.");
    Ok(())
  }
}
