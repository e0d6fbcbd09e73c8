//! Shipping address types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use karya_core::{AddressId, CityId, ProvinceId, UserId};

/// Longest recipient name accepted.
pub const MAX_ADDRESS_TO_LEN: usize = 100;
/// Longest street address accepted.
pub const MAX_FULL_ADDRESS_LEN: usize = 500;

/// A saved shipping address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub id: AddressId,
    pub user_id: UserId,
    pub province_id: ProvinceId,
    pub city_id: CityId,
    /// Recipient name.
    pub address_to: String,
    pub full_address: String,
    /// At most one address per user has this set.
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Submitted address fields, shared by create and edit.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressInput {
    pub province_id: ProvinceId,
    pub city_id: CityId,
    pub address_to: String,
    pub full_address: String,
}

impl AddressInput {
    /// Trim text fields and check them for emptiness and length.
    ///
    /// # Errors
    ///
    /// Returns a user-facing message describing the first invalid field.
    pub fn validate(mut self) -> Result<Self, &'static str> {
        self.address_to = self.address_to.trim().to_owned();
        self.full_address = self.full_address.trim().to_owned();

        if self.address_to.is_empty() {
            return Err("Recipient name is required.");
        }
        if self.address_to.chars().count() > MAX_ADDRESS_TO_LEN {
            return Err("Recipient name is too long.");
        }
        if self.full_address.is_empty() {
            return Err("Full address is required.");
        }
        if self.full_address.chars().count() > MAX_FULL_ADDRESS_LEN {
            return Err("Full address is too long.");
        }
        Ok(self)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn input(to: &str, full: &str) -> AddressInput {
        AddressInput {
            province_id: ProvinceId::new(9),
            city_id: CityId::new(23),
            address_to: to.to_owned(),
            full_address: full.to_owned(),
        }
    }

    #[test]
    fn test_validate_trims() {
        let valid = input("  Budi ", " Jl. Merdeka 1\n").validate().unwrap();
        assert_eq!(valid.address_to, "Budi");
        assert_eq!(valid.full_address, "Jl. Merdeka 1");
    }

    #[test]
    fn test_validate_rejects_blank_fields() {
        assert_eq!(
            input("   ", "Jl. Merdeka 1").validate(),
            Err("Recipient name is required.")
        );
        assert_eq!(input("Budi", "").validate(), Err("Full address is required."));
    }

    #[test]
    fn test_validate_rejects_overlong_recipient() {
        let long = "a".repeat(MAX_ADDRESS_TO_LEN + 1);
        assert!(input(&long, "Jl. Merdeka 1").validate().is_err());
    }

    #[test]
    fn test_deserialize_camel_case() {
        let parsed: AddressInput = serde_json::from_str(
            r#"{"provinceId":9,"cityId":23,"addressTo":"Budi","fullAddress":"Jl. Merdeka 1"}"#,
        )
        .unwrap();
        assert_eq!(parsed.city_id, CityId::new(23));
    }
}
