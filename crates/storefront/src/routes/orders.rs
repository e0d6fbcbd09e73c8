//! Order, invoice and cart route handlers.
//!
//! These routes require authentication and only ever return the signed-in
//! user's records.

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
};
use serde::Deserialize;

use karya_core::OrderId;

use crate::db::store::UserStore;
use crate::db::{CartRepository, OrderRepository, RepositoryError, UserRepository};
use crate::error::{AppError, Result};
use crate::middleware::auth::RequireAuth;
use crate::models::{Cart, Invoice, Order, User};
use crate::state::AppState;

/// Body of an invoice request.
#[derive(Debug, Deserialize)]
pub struct InvoiceRequest {
    /// Parcel weight in grams.
    pub weight: i32,
}

/// `GET /account/orders`
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Vec<Order>>> {
    let orders = OrderRepository::new(state.pool())
        .list_for_user(user.id)
        .await?;
    Ok(Json(orders))
}

/// `GET /account/orders/{id}`
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<OrderId>,
) -> Result<Json<Order>> {
    OrderRepository::new(state.pool())
        .get_for_user(user.id, id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("order {id}")))
}

/// Parcel weight of an invoice request, in grams. Malformed bodies get the
/// same JSON error shape as every other failure.
fn invoice_weight(payload: std::result::Result<Json<InvoiceRequest>, JsonRejection>) -> Result<i32> {
    let Json(request) = payload.map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;
    if request.weight <= 0 {
        return Err(AppError::BadRequest("weight must be positive".to_owned()));
    }
    Ok(request.weight)
}

/// Invoices are stamped with the stored phone number, so one must exist.
fn invoice_phone(stored: Option<User>) -> Result<String> {
    stored
        .and_then(|user| user.phone)
        .filter(|phone| !phone.trim().is_empty())
        .ok_or_else(|| AppError::BadRequest("add a phone number to your profile".to_owned()))
}

/// `POST /account/orders/{id}/invoice`
///
/// Snapshots the order into a new invoice, stamped with the user's phone.
pub async fn issue_invoice(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<OrderId>,
    payload: std::result::Result<Json<InvoiceRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Invoice>)> {
    let weight = invoice_weight(payload)?;
    let phone = invoice_phone(UserRepository::new(state.pool()).get_by_id(user.id).await?)?;

    let invoice = OrderRepository::new(state.pool())
        .issue_invoice(user.id, id, weight, &phone)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => AppError::NotFound(format!("order {id}")),
            other => AppError::Database(other),
        })?;

    tracing::info!(invoice_id = %invoice.id, order_id = %id, "Invoice issued");
    Ok((StatusCode::CREATED, Json(invoice)))
}

/// `GET /account/invoices`
pub async fn invoices(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Vec<Invoice>>> {
    let invoices = OrderRepository::new(state.pool())
        .list_invoices_for_user(user.id)
        .await?;
    Ok(Json(invoices))
}

/// `GET /account/cart`
///
/// `null` when the user has never added anything.
pub async fn cart(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Option<Cart>>> {
    let cart = CartRepository::new(state.pool()).for_user(user.id).await?;
    Ok(Json(cart))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::{Body, to_bytes};
    use axum::extract::FromRequest;
    use axum::http::{Request, header};
    use axum::response::IntoResponse;

    use super::*;
    use crate::services::auth::tests::sample_user;

    async fn payload(body: &str) -> std::result::Result<Json<InvoiceRequest>, JsonRejection> {
        let request = Request::builder()
            .method("POST")
            .uri("/account/orders/1/invoice")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_owned()))
            .unwrap();
        Json::<InvoiceRequest>::from_request(request, &()).await
    }

    async fn error_body(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_invoice_weight_accepts_positive() {
        assert_eq!(invoice_weight(payload(r#"{"weight":1200}"#).await).unwrap(), 1200);
    }

    #[tokio::test]
    async fn test_invoice_weight_rejects_zero_and_negative() {
        for body in [r#"{"weight":0}"#, r#"{"weight":-5}"#] {
            let (status, json) = error_body(invoice_weight(payload(body).await).unwrap_err()).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(json["success"], false);
            assert_eq!(json["message"], "weight must be positive");
        }
    }

    #[tokio::test]
    async fn test_malformed_invoice_body_is_json() {
        let err = invoice_weight(payload(r#"{"weight":"heavy"}"#).await).unwrap_err();
        let (status, json) = error_body(err).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["success"], false);
        assert!(!json["message"].as_str().unwrap().is_empty());
    }

    #[test]
    fn test_invoice_phone_requires_stored_number() {
        let mut user = sample_user("budi@example.com");
        user.phone = Some("0812345".to_owned());
        assert_eq!(invoice_phone(Some(user.clone())).unwrap(), "0812345");

        user.phone = Some("  ".to_owned());
        assert!(matches!(
            invoice_phone(Some(user.clone())),
            Err(AppError::BadRequest(_))
        ));

        user.phone = None;
        assert!(matches!(invoice_phone(Some(user)), Err(AppError::BadRequest(_))));
        assert!(matches!(invoice_phone(None), Err(AppError::BadRequest(_))));
    }
}
