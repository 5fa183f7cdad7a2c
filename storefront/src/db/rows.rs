// storefront/src/db/rows.rs

//! Table rows and their conversion into `ordergate` documents.

use chrono::{DateTime, Utc};
use ordergate::model::{
  CartLine, CartSnapshot, Customer, Delivery, LedgerReason, Order, OrderStatus, Payment, PointsLedgerEntry, Product,
  UserAccount, ValidatedLine, Voucher, VoucherStatus,
};
use ordergate::StoreError;
use sqlx::types::Json;
use sqlx::FromRow;
use std::collections::BTreeMap;
use uuid::Uuid;

fn corrupt(what: &str, detail: impl std::fmt::Display) -> StoreError {
  StoreError::Backend(anyhow::anyhow!("corrupt {} row: {}", what, detail))
}

#[derive(Debug, FromRow)]
pub struct ProductRow {
  pub id: String,
  pub name: String,
  pub unit: String,
  pub image_url: Option<String>,
  pub retail_price: i64,
  pub wholesale_price: Option<i64>,
  pub wholesale_min_quantity: Option<i32>,
  pub stock: i64,
  pub warehouse_stock: Json<BTreeMap<String, i64>>,
}

impl TryFrom<ProductRow> for Product {
  type Error = StoreError;

  fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
    let wholesale_min_quantity = row
      .wholesale_min_quantity
      .map(u32::try_from)
      .transpose()
      .map_err(|e| corrupt("product", e))?;
    Ok(Product {
      id: row.id,
      name: row.name,
      unit: row.unit,
      image_url: row.image_url,
      retail_price: row.retail_price,
      wholesale_price: row.wholesale_price,
      wholesale_min_quantity,
      stock: row.stock,
      warehouse_stock: row.warehouse_stock.0,
    })
  }
}

#[derive(Debug, FromRow)]
pub struct UserRow {
  pub id: String,
  pub name: String,
  pub points: i64,
}

impl From<UserRow> for UserAccount {
  fn from(row: UserRow) -> Self {
    UserAccount {
      id: row.id,
      name: row.name,
      points: row.points,
    }
  }
}

#[derive(Debug, FromRow)]
pub struct VoucherRow {
  pub id: String,
  pub user_id: String,
  pub code: String,
  pub value: i64,
  pub status: String,
  pub created_at: DateTime<Utc>,
  pub used_at: Option<DateTime<Utc>>,
  pub used_in_order: Option<String>,
}

impl TryFrom<VoucherRow> for Voucher {
  type Error = StoreError;

  fn try_from(row: VoucherRow) -> Result<Self, Self::Error> {
    let status = VoucherStatus::parse(&row.status).ok_or_else(|| corrupt("voucher", &row.status))?;
    Ok(Voucher {
      id: row.id,
      user_id: row.user_id,
      code: row.code,
      value: row.value,
      status,
      created_at: row.created_at,
      used_at: row.used_at,
      used_in_order: row.used_in_order,
    })
  }
}

#[derive(Debug, FromRow)]
pub struct OrderRow {
  pub id: String,
  pub record_id: Uuid,
  pub user_id: Option<String>,
  pub customer: Json<Customer>,
  pub delivery: Json<Delivery>,
  pub payment: Json<Payment>,
  pub lines: Json<Vec<ValidatedLine>>,
  pub subtotal: i64,
  pub points_used: i64,
  pub points_value: i64,
  pub voucher_id: Option<String>,
  pub voucher_discount: i64,
  pub discount_total: i64,
  pub total: i64,
  pub status: String,
  pub created_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
  type Error = StoreError;

  fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
    let status = OrderStatus::parse(&row.status).ok_or_else(|| corrupt("order", &row.status))?;
    Ok(Order {
      id: row.id,
      record_id: row.record_id,
      user_id: row.user_id,
      customer: row.customer.0,
      delivery: row.delivery.0,
      payment: row.payment.0,
      lines: row.lines.0,
      subtotal: row.subtotal,
      points_used: row.points_used,
      points_value: row.points_value,
      voucher_id: row.voucher_id,
      voucher_discount: row.voucher_discount,
      discount_total: row.discount_total,
      total: row.total,
      status,
      created_at: row.created_at,
    })
  }
}

#[derive(Debug, FromRow)]
pub struct LedgerRow {
  pub id: Uuid,
  pub user_id: String,
  pub delta: i64,
  pub balance_after: i64,
  pub reason: Json<LedgerReason>,
  pub created_at: DateTime<Utc>,
}

impl From<LedgerRow> for PointsLedgerEntry {
  fn from(row: LedgerRow) -> Self {
    PointsLedgerEntry {
      id: row.id,
      user_id: row.user_id,
      delta: row.delta,
      balance_after: row.balance_after,
      reason: row.reason.0,
      created_at: row.created_at,
    }
  }
}

#[derive(Debug, FromRow)]
pub struct CartRow {
  pub user_id: String,
  pub lines: Json<Vec<CartLine>>,
  pub updated_at: DateTime<Utc>,
}

impl From<CartRow> for CartSnapshot {
  fn from(row: CartRow) -> Self {
    CartSnapshot {
      user_id: row.user_id,
      lines: row.lines.0,
      updated_at: row.updated_at,
    }
  }
}
