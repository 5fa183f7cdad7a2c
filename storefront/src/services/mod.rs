// storefront/src/services/mod.rs

pub mod notifier;
pub mod session_service;
