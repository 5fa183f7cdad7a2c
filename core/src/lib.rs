// ordergate/src/lib.rs

//! Ordergate: storefront checkout that turns a client cart into a committed order.
//!
//! A checkout runs as a pipeline of named stages over one shared context:
//!  - the cart is re-validated against the catalog and current stock,
//!  - lines are priced server-side (retail, wholesale tier, promotional add-on),
//!  - a voucher and a loyalty-point redemption are resolved for signed-in customers,
//!  - everything is written in one atomic, precondition-checked transaction.
//!
//! Storage sits behind the `DocumentStore` port; `InMemoryStore` implements it for tests and
//! embedded use.

pub mod checkout;
pub mod codes;
pub mod entitlements;
pub mod error;
pub mod exchange;
pub mod model;
pub mod pipeline;
pub mod pricing;
pub mod settings;
pub mod store;
pub mod validation;

pub use crate::checkout::{CheckoutReceipt, CheckoutRequest, CheckoutService, LogNotifier, OrderNotifier};
pub use crate::codes::{CodeGenerator, RandomCodes, CODE_ALPHABET};
pub use crate::entitlements::{AppliedVoucher, PointsRedemption, Settlement};
pub use crate::error::{CheckoutError, CheckoutResult, PipelineError};
pub use crate::exchange::VoucherIssued;
pub use crate::pipeline::{ContextData, Pipeline, PipelineControl, PipelineResult};
pub use crate::pricing::{PriceQuote, PricedCart, PricingEngine};
pub use crate::settings::{CheckoutSettings, CodeFormat, PointsPolicy, PromotionRule, SettingsError};
pub use crate::store::{DocumentStore, InMemoryStore, StoreError, Transaction, Write};
pub use crate::validation::{StockSnapshot, ValidatedCart};
