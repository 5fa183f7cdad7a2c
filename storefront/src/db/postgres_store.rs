// storefront/src/db/postgres_store.rs

//! `DocumentStore` over PostgreSQL.
//!
//! A `Transaction` becomes one database transaction. Every precondition is part of the
//! statement's `WHERE` clause, so a row changed by a concurrent checkout matches zero rows
//! and the whole transaction is rolled back.

use crate::db::rows::{CartRow, LedgerRow, OrderRow, ProductRow, UserRow, VoucherRow};
use async_trait::async_trait;
use ordergate::model::{CartSnapshot, Order, PointsLedgerEntry, Product, UserAccount, Voucher, VoucherStatus};
use ordergate::store::{Collection, Conflict, DocumentStore, StoreError, Transaction, VoucherFilter, Write};
use sqlx::types::Json;
use sqlx::{PgPool, Postgres};
use tracing::{debug, instrument, warn};

type PgTx<'c> = sqlx::Transaction<'c, Postgres>;

fn backend(err: sqlx::Error) -> StoreError {
  StoreError::Backend(anyhow::Error::new(err))
}

fn encode(err: serde_json::Error) -> StoreError {
  StoreError::Backend(anyhow::Error::new(err).context("document could not be encoded"))
}

#[derive(Debug, Clone)]
pub struct PgDocumentStore {
  pool: PgPool,
}

impl PgDocumentStore {
  pub fn new(pool: PgPool) -> Self {
    Self { pool }
  }
}

async fn apply(tx: &mut PgTx<'_>, write: Write) -> Result<(), StoreError> {
  match write {
    Write::CreateOrder(order) => {
      let inserted = sqlx::query(
        r#"
        INSERT INTO orders (id, record_id, user_id, customer, delivery, payment, lines, subtotal,
                            points_used, points_value, voucher_id, voucher_discount, discount_total,
                            total, status, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
        ON CONFLICT (id) DO NOTHING
        "#,
      )
      .bind(&order.id)
      .bind(order.record_id)
      .bind(&order.user_id)
      .bind(Json(&order.customer))
      .bind(Json(&order.delivery))
      .bind(Json(&order.payment))
      .bind(Json(&order.lines))
      .bind(order.subtotal)
      .bind(order.points_used)
      .bind(order.points_value)
      .bind(&order.voucher_id)
      .bind(order.voucher_discount)
      .bind(order.discount_total)
      .bind(order.total)
      .bind(order.status.as_str())
      .bind(order.created_at)
      .execute(&mut **tx)
      .await
      .map_err(backend)?;
      if inserted.rows_affected() == 0 {
        return Err(StoreError::DuplicateKey {
          collection: Collection::Orders,
          key: order.id,
        });
      }
    }
    Write::AdjustStock {
      product_id,
      expected,
      delta,
    } => {
      let updated = sqlx::query(
        "UPDATE products SET stock = stock + $3, updated_at = NOW() \
         WHERE id = $1 AND stock = $2 AND stock + $3 >= 0",
      )
      .bind(&product_id)
      .bind(expected)
      .bind(delta)
      .execute(&mut **tx)
      .await
      .map_err(backend)?;
      if updated.rows_affected() == 0 {
        let current: Option<i64> = sqlx::query_scalar("SELECT stock FROM products WHERE id = $1")
          .bind(&product_id)
          .fetch_optional(&mut **tx)
          .await
          .map_err(backend)?;
        return Err(match current {
          Some(current) => StoreError::Conflict(Conflict::Stock {
            product_id,
            expected,
            current,
          }),
          None => StoreError::NotFound {
            collection: Collection::Products,
            key: product_id,
          },
        });
      }
    }
    Write::AdjustPoints {
      user_id,
      expected,
      delta,
    } => {
      let updated = sqlx::query("UPDATE users SET points = points + $3 WHERE id = $1 AND points = $2 AND points + $3 >= 0")
        .bind(&user_id)
        .bind(expected)
        .bind(delta)
        .execute(&mut **tx)
        .await
        .map_err(backend)?;
      if updated.rows_affected() == 0 {
        let current: Option<i64> = sqlx::query_scalar("SELECT points FROM users WHERE id = $1")
          .bind(&user_id)
          .fetch_optional(&mut **tx)
          .await
          .map_err(backend)?;
        return Err(match current {
          Some(current) => StoreError::Conflict(Conflict::Points {
            user_id,
            expected,
            current,
          }),
          None => StoreError::NotFound {
            collection: Collection::Users,
            key: user_id,
          },
        });
      }
    }
    Write::AppendLedger(entry) => {
      let reason = serde_json::to_value(&entry.reason).map_err(encode)?;
      sqlx::query(
        "INSERT INTO points_ledger (id, user_id, delta, balance_after, reason, created_at) \
         VALUES ($1, $2, $3, $4, $5, $6)",
      )
      .bind(entry.id)
      .bind(&entry.user_id)
      .bind(entry.delta)
      .bind(entry.balance_after)
      .bind(reason)
      .bind(entry.created_at)
      .execute(&mut **tx)
      .await
      .map_err(backend)?;
    }
    Write::ConsumeVoucher { voucher_id, order_id } => {
      let updated = sqlx::query(
        "UPDATE vouchers SET status = $3, used_at = NOW(), used_in_order = $2 WHERE id = $1 AND status = $4",
      )
      .bind(&voucher_id)
      .bind(&order_id)
      .bind(VoucherStatus::Used.as_str())
      .bind(VoucherStatus::Active.as_str())
      .execute(&mut **tx)
      .await
      .map_err(backend)?;
      if updated.rows_affected() == 0 {
        let current: Option<String> = sqlx::query_scalar("SELECT status FROM vouchers WHERE id = $1")
          .bind(&voucher_id)
          .fetch_optional(&mut **tx)
          .await
          .map_err(backend)?;
        return Err(match current {
          Some(status) => StoreError::Conflict(Conflict::Voucher {
            voucher_id,
            current: VoucherStatus::parse(&status).unwrap_or(VoucherStatus::Used),
          }),
          None => StoreError::NotFound {
            collection: Collection::Vouchers,
            key: voucher_id,
          },
        });
      }
    }
    Write::CreateVoucher(voucher) => {
      let inserted = sqlx::query(
        "INSERT INTO vouchers (id, user_id, code, value, status, created_at, used_at, used_in_order) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8) ON CONFLICT DO NOTHING",
      )
      .bind(&voucher.id)
      .bind(&voucher.user_id)
      .bind(&voucher.code)
      .bind(voucher.value)
      .bind(voucher.status.as_str())
      .bind(voucher.created_at)
      .bind(voucher.used_at)
      .bind(&voucher.used_in_order)
      .execute(&mut **tx)
      .await
      .map_err(backend)?;
      if inserted.rows_affected() == 0 {
        return Err(StoreError::DuplicateKey {
          collection: Collection::Vouchers,
          key: voucher.code,
        });
      }
    }
    Write::ClearCart { user_id } => {
      sqlx::query("UPDATE carts SET lines = '[]'::jsonb, updated_at = NOW() WHERE user_id = $1")
        .bind(&user_id)
        .execute(&mut **tx)
        .await
        .map_err(backend)?;
    }
  }
  Ok(())
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
  async fn get_product(&self, product_id: &str) -> Result<Option<Product>, StoreError> {
    sqlx::query_as::<_, ProductRow>(
      "SELECT id, name, unit, image_url, retail_price, wholesale_price, wholesale_min_quantity, stock, \
       warehouse_stock FROM products WHERE id = $1",
    )
    .bind(product_id)
    .fetch_optional(&self.pool)
    .await
    .map_err(backend)?
    .map(Product::try_from)
    .transpose()
  }

  async fn get_user(&self, user_id: &str) -> Result<Option<UserAccount>, StoreError> {
    let row = sqlx::query_as::<_, UserRow>("SELECT id, name, points FROM users WHERE id = $1")
      .bind(user_id)
      .fetch_optional(&self.pool)
      .await
      .map_err(backend)?;
    Ok(row.map(UserAccount::from))
  }

  async fn get_order(&self, order_id: &str) -> Result<Option<Order>, StoreError> {
    sqlx::query_as::<_, OrderRow>(
      "SELECT id, record_id, user_id, customer, delivery, payment, lines, subtotal, points_used, points_value, \
       voucher_id, voucher_discount, discount_total, total, status, created_at FROM orders WHERE id = $1",
    )
    .bind(order_id)
    .fetch_optional(&self.pool)
    .await
    .map_err(backend)?
    .map(Order::try_from)
    .transpose()
  }

  async fn get_cart(&self, user_id: &str) -> Result<Option<CartSnapshot>, StoreError> {
    let row = sqlx::query_as::<_, CartRow>("SELECT user_id, lines, updated_at FROM carts WHERE user_id = $1")
      .bind(user_id)
      .fetch_optional(&self.pool)
      .await
      .map_err(backend)?;
    Ok(row.map(CartSnapshot::from))
  }

  async fn find_vouchers(&self, filter: &VoucherFilter) -> Result<Vec<Voucher>, StoreError> {
    let rows = sqlx::query_as::<_, VoucherRow>(
      "SELECT id, user_id, code, value, status, created_at, used_at, used_in_order FROM vouchers \
       WHERE user_id = $1 AND ($2::TEXT IS NULL OR code = $2) AND ($3::TEXT IS NULL OR status = $3) \
       ORDER BY created_at, id",
    )
    .bind(&filter.user_id)
    .bind(&filter.code)
    .bind(filter.status.map(|s| s.as_str()))
    .fetch_all(&self.pool)
    .await
    .map_err(backend)?;
    rows.into_iter().map(Voucher::try_from).collect()
  }

  async fn ledger_for(&self, user_id: &str) -> Result<Vec<PointsLedgerEntry>, StoreError> {
    let rows = sqlx::query_as::<_, LedgerRow>(
      "SELECT id, user_id, delta, balance_after, reason, created_at FROM points_ledger \
       WHERE user_id = $1 ORDER BY created_at, id",
    )
    .bind(user_id)
    .fetch_all(&self.pool)
    .await
    .map_err(backend)?;
    Ok(rows.into_iter().map(PointsLedgerEntry::from).collect())
  }

  #[instrument(name = "PgDocumentStore::commit", skip_all, fields(writes = tx.writes().len()), err(Display))]
  async fn commit(&self, tx: Transaction) -> Result<(), StoreError> {
    let mut db_tx = self.pool.begin().await.map_err(backend)?;
    for write in tx.into_writes() {
      if let Err(err) = apply(&mut db_tx, write).await {
        if let Err(rollback_err) = db_tx.rollback().await {
          warn!(error = %rollback_err, "Rollback failed; the connection discards the transaction.");
        }
        return Err(err);
      }
    }
    db_tx.commit().await.map_err(backend)?;
    debug!("Transaction committed.");
    Ok(())
  }
}
