//! Seed shipping regions from YAML.
//!
//! ```yaml
//! - id: 9
//!   name: Jawa Barat
//!   cities:
//!     - id: 22
//!       name: Bandung
//!     - id: 23
//!       name: Bandung Barat
//! ```
//!
//! Rows are upserted, so the command can be re-run after the file changes.
//! The same upsert backs `seed rajaongkir`, which pulls the data from the
//! RajaOngkir API instead of a file.

use std::collections::HashSet;

use serde::Deserialize;
use tracing::info;

use karya_core::{CityId, ProvinceId};
use karya_storefront::db::RegionRepository;

use super::rajaongkir::RajaOngkir;
use super::{CommandError, connect};

#[derive(Debug, Deserialize)]
pub(crate) struct ProvinceSeed {
    pub(crate) id: i32,
    pub(crate) name: String,
    #[serde(default)]
    pub(crate) cities: Vec<CitySeed>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CitySeed {
    pub(crate) id: i32,
    pub(crate) name: String,
}

/// Check ids are unique and names non-empty before touching the database.
fn validate(provinces: &[ProvinceSeed]) -> Vec<String> {
    let mut errors = Vec::new();
    let mut province_ids = HashSet::new();
    let mut city_ids = HashSet::new();

    for province in provinces {
        if !province_ids.insert(province.id) {
            errors.push(format!("duplicate province id {}", province.id));
        }
        if province.name.trim().is_empty() {
            errors.push(format!("province {} has no name", province.id));
        }
        for city in &province.cities {
            if !city_ids.insert(city.id) {
                errors.push(format!("duplicate city id {}", city.id));
            }
            if city.name.trim().is_empty() {
                errors.push(format!("city {} has no name", city.id));
            }
        }
    }

    errors
}

/// Upsert every province and city in `file_path`.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, fails validation,
/// or a database write fails.
pub async fn regions(file_path: &str) -> Result<(), CommandError> {
    info!(path = %file_path, "Loading regions from file");

    let content = tokio::fs::read_to_string(file_path)
        .await
        .map_err(|source| CommandError::Read {
            path: file_path.to_owned(),
            source,
        })?;
    let provinces: Vec<ProvinceSeed> = serde_yaml::from_str(&content)?;

    upsert(&provinces).await
}

/// Fetch every province and city from RajaOngkir and upsert them.
///
/// # Errors
///
/// Returns an error if the API is unreachable or rejects the key, the data
/// fails validation, or a database write fails.
pub async fn rajaongkir() -> Result<(), CommandError> {
    let provinces = RajaOngkir::from_env()?.regions().await?;
    upsert(&provinces).await
}

async fn upsert(provinces: &[ProvinceSeed]) -> Result<(), CommandError> {
    let errors = validate(provinces);
    if !errors.is_empty() {
        for err in &errors {
            tracing::error!("  - {err}");
        }
        return Err(CommandError::Invalid(format!(
            "{} validation errors found",
            errors.len()
        )));
    }

    let pool = connect().await?;
    let repo = RegionRepository::new(&pool);

    let mut cities = 0usize;
    for province in provinces {
        let province_id = ProvinceId::new(province.id);
        repo.upsert_province(province_id, province.name.trim()).await?;
        for city in &province.cities {
            repo.upsert_city(CityId::new(city.id), province_id, city.name.trim())
                .await?;
            cities += 1;
        }
    }

    info!(provinces = provinces.len(), cities, "Seeding complete!");
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_nested_cities() {
        let yaml = "- id: 9\n  name: Jawa Barat\n  cities:\n    - id: 22\n      name: Bandung\n- id: 11\n  name: Jawa Timur\n";
        let provinces: Vec<ProvinceSeed> = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(provinces.len(), 2);
        assert_eq!(provinces[0].cities[0].name, "Bandung");
        assert!(provinces[1].cities.is_empty());
        assert!(validate(&provinces).is_empty());
    }

    #[test]
    fn test_rejects_duplicates_and_blank_names() {
        let yaml = "- id: 9\n  name: ' '\n  cities:\n    - id: 22\n      name: Bandung\n- id: 9\n  name: Banten\n  cities:\n    - id: 22\n      name: Serang\n";
        let provinces: Vec<ProvinceSeed> = serde_yaml::from_str(yaml).unwrap();

        let errors = validate(&provinces);
        assert_eq!(
            errors,
            vec![
                "province 9 has no name".to_owned(),
                "duplicate province id 9".to_owned(),
                "duplicate city id 22".to_owned(),
            ]
        );
    }
}
