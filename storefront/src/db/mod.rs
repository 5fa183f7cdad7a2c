// storefront/src/db/mod.rs

pub mod postgres_store;
pub mod rows;

pub use postgres_store::PgDocumentStore;
