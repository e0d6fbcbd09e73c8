//! HTTP route handlers for storefront.
//!
//! Action endpoints answer `200 {success, message}`; read endpoints answer
//! JSON or an `AppError` status.
//!
//! # Route Structure
//!
//! ```text
//! # Auth
//! POST   /auth/signin                     - Credentials sign-in
//! POST   /auth/signup                     - Register and sign in
//! POST   /auth/signout                    - Clear the session
//! GET    /auth/google/login               - Redirect to Google
//! GET    /auth/google/callback            - Handle OAuth callback
//!
//! # Account (requires auth)
//! GET    /account/addresses               - Address list (cached)
//! POST   /account/addresses               - Create address
//! POST   /account/addresses/{id}          - Edit address
//! DELETE /account/addresses/{id}          - Delete address
//! POST   /account/addresses/{id}/active   - Make address the active one
//! GET    /account/profile                 - Profile (cached)
//! POST   /account/profile                 - Update profile (multipart)
//! GET    /account/orders                  - Order history
//! GET    /account/orders/{id}             - Order detail
//! POST   /account/orders/{id}/invoice     - Issue invoice
//! GET    /account/invoices                - Invoice history
//! GET    /account/cart                    - Current cart
//!
//! # Regions
//! GET    /regions/provinces               - Province list
//! GET    /regions/provinces/{id}/cities   - Cities of a province
//! ```

pub mod account;
pub mod auth;
pub mod google_auth;
pub mod orders;
pub mod regions;

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, rejection::JsonRejection},
    routing::{get, post},
};

use crate::services::outcome::ActionOutcome;
use crate::state::AppState;

/// Largest accepted profile form (picture included).
const PROFILE_BODY_LIMIT: usize = 5 * 1024 * 1024;

/// Turn a JSON extraction failure into a validation outcome.
fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ActionOutcome> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| ActionOutcome::validation(rejection.body_text()))
}

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/signin", post(auth::sign_in))
        .route("/signup", post(auth::sign_up))
        .route("/signout", post(auth::sign_out))
        // Google OAuth
        .route("/google/login", get(google_auth::login))
        .route("/google/callback", get(google_auth::callback))
}

/// Create the account routes router.
pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/addresses",
            get(account::addresses).post(account::create_address),
        )
        .route(
            "/addresses/{id}",
            post(account::edit_address).delete(account::delete_address),
        )
        .route("/addresses/{id}/active", post(account::set_active_address))
        .route(
            "/profile",
            get(account::profile)
                .post(account::update_profile)
                .layer(DefaultBodyLimit::max(PROFILE_BODY_LIMIT)),
        )
        .route("/orders", get(orders::index))
        .route("/orders/{id}", get(orders::show))
        .route("/orders/{id}/invoice", post(orders::issue_invoice))
        .route("/invoices", get(orders::invoices))
        .route("/cart", get(orders::cart))
}

/// Create the region routes router.
pub fn region_routes() -> Router<AppState> {
    Router::new()
        .route("/provinces", get(regions::provinces))
        .route("/provinces/{id}/cities", get(regions::cities))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth_routes())
        .nest("/account", account_routes())
        .nest("/regions", region_routes())
}
