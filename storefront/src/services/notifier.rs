// storefront/src/services/notifier.rs
use ordergate::model::Order;
use ordergate::OrderNotifier;
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct OrderConfirmation {
  pub order_id: String,
  pub customer_name: String,
  pub phone: String,
  pub total: i64,
}

impl From<&Order> for OrderConfirmation {
  fn from(order: &Order) -> Self {
    Self {
      order_id: order.id.clone(),
      customer_name: order.customer.name.clone(),
      phone: order.customer.phone.clone(),
      total: order.total,
    }
  }
}

/// Sends order confirmations from a spawned task so the checkout response never waits on them.
#[derive(Debug, Clone, Default)]
pub struct SpawnedConfirmationNotifier;

impl OrderNotifier for SpawnedConfirmationNotifier {
  fn order_placed(&self, order: &Order) {
    let confirmation = OrderConfirmation::from(order);
    match tokio::runtime::Handle::try_current() {
      Ok(handle) => {
        handle.spawn(async move {
          if let Err(message) = send_mock_confirmation(&confirmation).await {
            warn!(order_id = %confirmation.order_id, error = %message, "Order confirmation not delivered.");
          }
        });
      }
      Err(_) => warn!(order_id = %order.id, "No runtime available; order confirmation skipped."),
    }
  }
}

async fn send_mock_confirmation(confirmation: &OrderConfirmation) -> Result<(), String> {
  info!(
    order_id = %confirmation.order_id,
    to = %confirmation.phone,
    "Simulating order confirmation for {}",
    confirmation.customer_name
  );
  tokio::time::sleep(std::time::Duration::from_millis(20)).await; // network latency

  if confirmation.phone.trim().is_empty() {
    return Err("customer phone is empty".to_string());
  }
  info!(order_id = %confirmation.order_id, total = confirmation.total, "Mock order confirmation sent.");
  Ok(())
}
