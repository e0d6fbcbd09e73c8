//! Core types for the Karya storefront.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod image;
pub mod price;
pub mod status;

pub use email::{Email, EmailError};
pub use id::*;
pub use image::{ImageDescriptor, ImageUpdate};
pub use price::{Price, PriceError};
pub use status::{PaymentStatus, ShippingStatus, UnknownStatus};
