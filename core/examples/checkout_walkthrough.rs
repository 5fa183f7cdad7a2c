// ordergate/examples/checkout_walkthrough.rs

use ordergate::model::{CartLine, Customer, Delivery, Payment, Product, Requester, UserAccount};
use ordergate::{CheckoutRequest, CheckoutService, CheckoutSettings, InMemoryStore};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;

fn product(id: &str, name: &str, retail_price: i64, stock: i64) -> Product {
  Product {
    id: id.to_string(),
    name: name.to_string(),
    unit: "pcs".to_string(),
    image_url: None,
    retail_price,
    wholesale_price: None,
    wholesale_min_quantity: None,
    stock,
    warehouse_stock: BTreeMap::new(),
  }
}

fn request(items: Vec<CartLine>) -> CheckoutRequest {
  CheckoutRequest {
    items,
    customer: Customer {
      name: "Rin".to_string(),
      phone: "+15550142".to_string(),
    },
    delivery: Delivery {
      method: "courier".to_string(),
      address: Some("7 Quay Street".to_string()),
    },
    payment: Payment {
      method: "bank_transfer".to_string(),
      proof_ref: None,
    },
    voucher_code: None,
    use_points: false,
  }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt().with_max_level(tracing::Level::INFO).init();

  info!("--- Checkout walkthrough ---");

  let store = Arc::new(InMemoryStore::new());
  store.insert_product(product("kettle", "Gooseneck kettle", 65_000, 2));
  store.insert_product(product("filter", "Paper filters", 18_000, 40));
  store.insert_user(UserAccount {
    id: "user-rin".to_string(),
    name: "Rin".to_string(),
    points: 20_000,
  });

  let svc = CheckoutService::new(store.clone(), CheckoutSettings::default())?;
  let rin = Requester::Customer("user-rin".to_string());

  // 1. Trade some points for a voucher.
  let issued = svc.exchange_points(&rin, 5_000).await?;
  info!(code = %issued.voucher.code, balance = issued.points_balance, "Voucher issued.");

  // 2. Kettle plus a promotional add-on, paid with the voucher and remaining points.
  let mut req = request(vec![CartLine::tagged("filter", 1, "addon"), CartLine::plain("kettle", 1)]);
  req.voucher_code = Some(issued.voucher.code.clone());
  req.use_points = true;
  let receipt = svc.checkout(rin.clone(), req).await?;
  info!(
    order_id = %receipt.order_id,
    subtotal = receipt.subtotal,
    discount = receipt.discount_total,
    total = receipt.total,
    "Order placed."
  );

  // 3. A guest asks for more kettles than are left.
  match svc.checkout(Requester::Guest, request(vec![CartLine::plain("kettle", 5)])).await {
    Err(err) => info!(error = %err, validation = err.is_validation(), "Checkout rejected as expected."),
    Ok(receipt) => info!(order_id = %receipt.order_id, "Unexpected success."),
  }

  info!(
    kettles_left = store.stock_of("kettle"),
    points_left = store.points_of("user-rin"),
    orders = store.orders().len(),
    "Final state."
  );
  Ok(())
}
