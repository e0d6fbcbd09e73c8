//! Cart, order and invoice records.
//!
//! Orders are created by the checkout flow and updated by payment
//! notifications; the account pages only read them.

use chrono::{DateTime, Utc};
use serde::Serialize;

use karya_core::{
    CartId, CartItemId, InvoiceId, OrderId, PaymentStatus, Price, ProductId, ShippingStatus,
    UserId,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    pub id: CartId,
    pub user_id: UserId,
    pub items: Vec<CartItem>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Cart {
    /// Total number of units across all lines.
    #[must_use]
    pub fn total_quantity(&self) -> u64 {
        self.items.iter().map(|item| u64::from(item.quantity)).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub id: CartItemId,
    pub cart_id: CartId,
    pub product_id: ProductId,
    pub quantity: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub cart_id: CartId,
    pub payment_status: PaymentStatus,
    pub shipping_status: ShippingStatus,
    pub shipping_address: String,
    pub shipping_courier: String,
    pub shipping_cost: Price,
    /// Payment gateway token; absent until checkout reaches the gateway.
    pub snap_token: Option<String>,
    pub snap_redirect_url: Option<String>,
    pub total_price: Price,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A snapshot of an order taken when the invoice was issued.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    pub id: InvoiceId,
    pub user_id: UserId,
    pub order_id: OrderId,
    pub phone_number: String,
    pub payment_status: PaymentStatus,
    pub shipping_status: ShippingStatus,
    pub shipping_address: String,
    pub shipping_courier: String,
    pub shipping_cost: Price,
    pub total_price: Price,
    /// Parcel weight in grams.
    pub weight: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
