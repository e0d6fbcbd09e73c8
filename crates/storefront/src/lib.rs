//! Karya storefront library.
//!
//! Account, address, order and authentication backend. The binary in
//! `main.rs` wires these modules into an axum server; tests use them
//! directly.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
