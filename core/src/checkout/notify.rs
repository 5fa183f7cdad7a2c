// ordergate/src/checkout/notify.rs

use crate::model::Order;
use tracing::info;

/// Told about every committed order. Runs after the commit, outside its critical path:
/// implementations must return promptly (hand the work to a task or queue) and cannot fail
/// the checkout.
pub trait OrderNotifier: Send + Sync {
  fn order_placed(&self, order: &Order);
}

/// Default notifier: a log line per order.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl OrderNotifier for LogNotifier {
  fn order_placed(&self, order: &Order) {
    info!(order_id = %order.id, total = order.total, lines = order.lines.len(), "Order placed.");
  }
}
