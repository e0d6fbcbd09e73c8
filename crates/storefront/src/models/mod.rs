//! Domain models for the storefront.
//!
//! These types are what repositories return and what workflows operate on;
//! database row shapes that need conversion stay private to `crate::db`.

pub mod address;
pub mod order;
pub mod region;
pub mod session;
pub mod user;

pub use address::{Address, AddressInput};
pub use order::{Cart, CartItem, Invoice, Order};
pub use region::{City, Province};
pub use session::{CurrentUser, keys as session_keys};
pub use user::{NewUser, ProfileChanges, ProfileWrite, User, UserScope};
