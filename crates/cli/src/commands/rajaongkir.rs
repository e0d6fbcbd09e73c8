//! Shipping regions straight from the RajaOngkir API.
//!
//! Uses `RAJAONGKIR_API_BASEURL` (e.g. `https://api.rajaongkir.com/starter`)
//! and `RAJAONGKIR_API_KEY`. Both `/province` and `/city` answer inside a
//! `{"rajaongkir": {"status": .., "results": [..]}}` envelope, with ids as
//! strings.

use std::collections::BTreeMap;

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::info;

use super::CommandError;
use super::seed::{CitySeed, ProvinceSeed};

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    rajaongkir: Body<T>,
}

#[derive(Debug, Deserialize)]
struct Body<T> {
    status: Status,
    #[serde(default = "Vec::new")]
    results: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct Status {
    code: u16,
    description: String,
}

impl<T> Envelope<T> {
    fn into_results(self) -> Result<Vec<T>, CommandError> {
        let Body { status, results } = self.rajaongkir;
        if status.code != 200 {
            return Err(CommandError::Api(format!(
                "RajaOngkir answered {}: {}",
                status.code, status.description
            )));
        }
        Ok(results)
    }
}

#[derive(Debug, Deserialize)]
struct ProvinceRow {
    province_id: String,
    province: String,
}

#[derive(Debug, Deserialize)]
struct CityRow {
    city_id: String,
    province_id: String,
    #[serde(rename = "type")]
    kind: String,
    city_name: String,
}

fn parse_id(kind: &str, raw: &str) -> Result<i32, CommandError> {
    raw.trim()
        .parse()
        .map_err(|_| CommandError::Api(format!("{kind} id {raw:?} is not a number")))
}

/// Nest cities under their provinces. City names carry their type
/// ("Kota Bandung", "Kabupaten Bandung") since bare names repeat.
fn into_seeds(
    provinces: Vec<ProvinceRow>,
    cities: Vec<CityRow>,
) -> Result<Vec<ProvinceSeed>, CommandError> {
    let mut seeds = BTreeMap::new();
    for row in provinces {
        let id = parse_id("province", &row.province_id)?;
        seeds.insert(
            id,
            ProvinceSeed {
                id,
                name: row.province,
                cities: Vec::new(),
            },
        );
    }

    for row in cities {
        let province_id = parse_id("province", &row.province_id)?;
        let province = seeds.get_mut(&province_id).ok_or_else(|| {
            CommandError::Api(format!(
                "city {} belongs to unknown province {province_id}",
                row.city_id
            ))
        })?;
        province.cities.push(CitySeed {
            id: parse_id("city", &row.city_id)?,
            name: format!("{} {}", row.kind.trim(), row.city_name.trim()),
        });
    }

    Ok(seeds.into_values().collect())
}

/// RajaOngkir API client.
pub struct RajaOngkir {
    client: reqwest::Client,
    base_url: String,
    api_key: SecretString,
}

impl RajaOngkir {
    /// Read the base URL and key from the environment (after `.env`).
    ///
    /// # Errors
    ///
    /// Returns `CommandError::MissingEnvVar` if either variable is unset.
    pub fn from_env() -> Result<Self, CommandError> {
        dotenvy::dotenv().ok();

        let base_url = std::env::var("RAJAONGKIR_API_BASEURL")
            .map_err(|_| CommandError::MissingEnvVar("RAJAONGKIR_API_BASEURL"))?;
        let api_key = std::env::var("RAJAONGKIR_API_KEY")
            .map(SecretString::from)
            .map_err(|_| CommandError::MissingEnvVar("RAJAONGKIR_API_KEY"))?;

        Ok(Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_owned(),
            api_key,
        })
    }

    async fn fetch<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>, CommandError> {
        let url = format!("{}/{path}", self.base_url);
        info!(%url, "Fetching regions");

        // Error statuses still carry the envelope, so parse before judging.
        let envelope: Envelope<T> = self
            .client
            .get(&url)
            .header("key", self.api_key.expose_secret())
            .send()
            .await?
            .json()
            .await?;
        envelope.into_results()
    }

    /// Every province with its cities.
    ///
    /// # Errors
    ///
    /// Returns an error if a request fails, the API reports an error status,
    /// or an id is not numeric.
    pub async fn regions(&self) -> Result<Vec<ProvinceSeed>, CommandError> {
        let provinces = self.fetch("province").await?;
        let cities = self.fetch("city").await?;
        into_seeds(provinces, cities)
    }
}
