//! Newtype IDs for type-safe entity references.
//!
//! Account entities (users, addresses, carts, orders, invoices) are keyed by
//! UUIDs generated in the database. Reference data (provinces and cities)
//! keeps the numeric ids published by the shipping-rate provider.

use uuid::Uuid;

/// Macro to define a type-safe ID wrapper around a `Copy` key type.
///
/// Creates a newtype with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `Copy`, `PartialEq`, `Eq`, `Hash`, `Display`
/// - `new()` / `get()` accessors and `From` conversions both ways
/// - `FromStr`, parsing the inner key type
/// - `sqlx` `Type`, `Encode` and `Decode` delegating to the inner type
///   (with the `postgres` feature)
///
/// # Example
///
/// ```rust
/// # use karya_core::define_id;
/// define_id!(TicketId, i32);
/// define_id!(SeatId, i32);
///
/// let ticket = TicketId::new(7);
/// assert_eq!(ticket.get(), 7);
///
/// // Distinct types, so this won't compile:
/// // let _: SeatId = ticket;
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident, $inner:ty) => {
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            Hash,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name($inner);

        impl $name {
            /// Wrap a raw key.
            #[must_use]
            pub const fn new(id: $inner) -> Self {
                Self(id)
            }

            /// Get the raw key.
            #[must_use]
            pub const fn get(&self) -> $inner {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl ::core::str::FromStr for $name {
            type Err = <$inner as ::core::str::FromStr>::Err;

            fn from_str(s: &str) -> ::core::result::Result<Self, Self::Err> {
                s.parse::<$inner>().map(Self)
            }
        }

        impl From<$inner> for $name {
            fn from(id: $inner) -> Self {
                Self(id)
            }
        }

        impl From<$name> for $inner {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        #[cfg(feature = "postgres")]
        impl ::sqlx::Type<::sqlx::Postgres> for $name {
            fn type_info() -> ::sqlx::postgres::PgTypeInfo {
                <$inner as ::sqlx::Type<::sqlx::Postgres>>::type_info()
            }

            fn compatible(ty: &::sqlx::postgres::PgTypeInfo) -> bool {
                <$inner as ::sqlx::Type<::sqlx::Postgres>>::compatible(ty)
            }
        }

        #[cfg(feature = "postgres")]
        impl<'r> ::sqlx::Decode<'r, ::sqlx::Postgres> for $name {
            fn decode(
                value: ::sqlx::postgres::PgValueRef<'r>,
            ) -> ::core::result::Result<Self, ::sqlx::error::BoxDynError> {
                <$inner as ::sqlx::Decode<::sqlx::Postgres>>::decode(value).map(Self)
            }
        }

        #[cfg(feature = "postgres")]
        impl ::sqlx::Encode<'_, ::sqlx::Postgres> for $name {
            fn encode_by_ref(
                &self,
                buf: &mut ::sqlx::postgres::PgArgumentBuffer,
            ) -> ::std::result::Result<::sqlx::encode::IsNull, ::sqlx::error::BoxDynError> {
                <$inner as ::sqlx::Encode<::sqlx::Postgres>>::encode_by_ref(&self.0, buf)
            }
        }
    };
}

// Account entities
define_id!(UserId, Uuid);
define_id!(AddressId, Uuid);
define_id!(CartId, Uuid);
define_id!(CartItemId, Uuid);
define_id!(ProductId, Uuid);
define_id!(OrderId, Uuid);
define_id!(InvoiceId, Uuid);

// Reference data
define_id!(ProvinceId, i32);
define_id!(CityId, i32);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_uuid_id_parses_and_displays() {
        let raw = "6f1c2a1e-8a0b-4c44-9d5e-2f3b4a5c6d7e";
        let id: AddressId = raw.parse().unwrap();
        assert_eq!(id.to_string(), raw);
        assert_eq!(Uuid::from(id), id.get());
    }

    #[test]
    fn test_numeric_id_rejects_garbage() {
        assert!("twelve".parse::<ProvinceId>().is_err());
        assert_eq!("12".parse::<CityId>().unwrap(), CityId::new(12));
    }

    #[test]
    fn test_serde_is_transparent() {
        let id = ProvinceId::new(9);
        assert_eq!(serde_json::to_string(&id).unwrap(), "9");
        let back: ProvinceId = serde_json::from_str("9").unwrap();
        assert_eq!(back, id);
    }
}
