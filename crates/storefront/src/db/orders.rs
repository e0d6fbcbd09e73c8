//! Order, invoice and cart repositories.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use karya_core::{CartId, CartItemId, OrderId, ProductId, UserId};

use super::RepositoryError;
use crate::models::{Cart, CartItem, Invoice, Order};

const ORDER_COLUMNS: &str = "id, user_id, cart_id, payment_status, shipping_status, \
                             shipping_address, shipping_courier, shipping_cost, snap_token, \
                             snap_redirect_url, total_price, created_at, updated_at";

const INVOICE_COLUMNS: &str = "id, user_id, order_id, phone_number, payment_status, \
                               shipping_status, shipping_address, shipping_courier, \
                               shipping_cost, total_price, weight, created_at, updated_at";

/// Repository for orders and their invoices.
#[derive(Clone, Copy)]
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// The user's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_user(&self, owner: UserId) -> Result<Vec<Order>, RepositoryError> {
        let orders = sqlx::query_as(&format!(
            r#"SELECT {ORDER_COLUMNS} FROM store."order" WHERE user_id = $1 ORDER BY created_at DESC"#
        ))
        .bind(owner)
        .fetch_all(self.pool)
        .await?;
        Ok(orders)
    }

    /// One of the user's orders.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_for_user(
        &self,
        owner: UserId,
        id: OrderId,
    ) -> Result<Option<Order>, RepositoryError> {
        let order = sqlx::query_as(&format!(
            r#"SELECT {ORDER_COLUMNS} FROM store."order" WHERE id = $1 AND user_id = $2"#
        ))
        .bind(id)
        .bind(owner)
        .fetch_optional(self.pool)
        .await?;
        Ok(order)
    }

    /// Issue an invoice that snapshots the order's current state.
    ///
    /// The copy happens in a single `INSERT ... SELECT`, so the invoice
    /// always matches one consistent version of the order row.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user has no such order.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn issue_invoice(
        &self,
        owner: UserId,
        order_id: OrderId,
        weight_grams: i32,
        phone_number: &str,
    ) -> Result<Invoice, RepositoryError> {
        let invoice: Option<Invoice> = sqlx::query_as(&format!(
            r#"
            INSERT INTO store.invoice (
                user_id, order_id, phone_number, payment_status, shipping_status,
                shipping_address, shipping_courier, shipping_cost, total_price, weight
            )
            SELECT o.user_id, o.id, $3, o.payment_status, o.shipping_status,
                   o.shipping_address, o.shipping_courier, o.shipping_cost, o.total_price, $4
            FROM store."order" o
            WHERE o.id = $1 AND o.user_id = $2
            RETURNING {INVOICE_COLUMNS}
            "#
        ))
        .bind(order_id)
        .bind(owner)
        .bind(phone_number)
        .bind(weight_grams)
        .fetch_optional(self.pool)
        .await?;

        invoice.ok_or(RepositoryError::NotFound)
    }

    /// The user's invoices, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_invoices_for_user(
        &self,
        owner: UserId,
    ) -> Result<Vec<Invoice>, RepositoryError> {
        let invoices = sqlx::query_as(&format!(
            "SELECT {INVOICE_COLUMNS} FROM store.invoice WHERE user_id = $1 ORDER BY created_at DESC"
        ))
        .bind(owner)
        .fetch_all(self.pool)
        .await?;
        Ok(invoices)
    }
}

#[derive(sqlx::FromRow)]
struct CartRow {
    id: CartId,
    user_id: UserId,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct CartItemRow {
    id: CartItemId,
    cart_id: CartId,
    product_id: ProductId,
    quantity: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<CartItemRow> for CartItem {
    type Error = RepositoryError;

    fn try_from(row: CartItemRow) -> Result<Self, Self::Error> {
        let quantity = u32::try_from(row.quantity).map_err(|_| {
            RepositoryError::DataCorruption(format!(
                "negative quantity {} on cart item {}",
                row.quantity, row.id
            ))
        })?;

        Ok(Self {
            id: row.id,
            cart_id: row.cart_id,
            product_id: row.product_id,
            quantity,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Repository for shopping carts.
#[derive(Clone, Copy)]
pub struct CartRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CartRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// The user's cart with its items, if one exists.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    /// Returns `RepositoryError::DataCorruption` if an item has a negative quantity.
    pub async fn for_user(&self, owner: UserId) -> Result<Option<Cart>, RepositoryError> {
        let cart: Option<CartRow> = sqlx::query_as(
            "SELECT id, user_id, created_at, updated_at FROM store.cart WHERE user_id = $1",
        )
        .bind(owner)
        .fetch_optional(self.pool)
        .await?;

        let Some(cart) = cart else {
            return Ok(None);
        };

        let rows: Vec<CartItemRow> = sqlx::query_as(
            r"
            SELECT id, cart_id, product_id, quantity, created_at, updated_at
            FROM store.cart_item
            WHERE cart_id = $1
            ORDER BY created_at
            ",
        )
        .bind(cart.id)
        .fetch_all(self.pool)
        .await?;

        let items = rows
            .into_iter()
            .map(CartItem::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Some(Cart {
            id: cart.id,
            user_id: cart.user_id,
            items,
            created_at: cart.created_at,
            updated_at: cart.updated_at,
        }))
    }
}
