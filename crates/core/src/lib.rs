//! Karya Core - Shared domain types.
//!
//! This crate provides the types shared by the storefront server and the CLI:
//! - `storefront` - Account, address, order and authentication backend
//! - `cli` - Migrations and reference-data seeding
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no database access,
//! no HTTP clients. The optional `postgres` feature adds `sqlx` encoding
//! for the id newtypes and value types.
//!
//! # Modules
//!
//! - [`types`] - Typed ids, emails, image descriptors, prices and statuses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
