// ordergate/src/model/mod.rs

//! Documents read and written by checkout. Amounts are integers in the smallest currency
//! unit; quantities are unsigned.

pub mod account;
pub mod cart;
pub mod order;
pub mod product;
pub mod requester;
pub mod voucher;

pub use account::{LedgerReason, PointsLedgerEntry, UserAccount};
pub use cart::{CartLine, CartSnapshot, PriceBasis, ValidatedLine};
pub use order::{Customer, Delivery, Order, OrderStatus, Payment};
pub use product::Product;
pub use requester::Requester;
pub use voucher::{Voucher, VoucherStatus};
