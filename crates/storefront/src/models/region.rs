//! Province and city reference data.
//!
//! Ids are the numeric ids of the shipping-rate provider, so they are stable
//! across reseeds and can be passed straight to courier cost lookups.

use serde::{Deserialize, Serialize};

use karya_core::{CityId, ProvinceId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Province {
    pub id: ProvinceId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct City {
    pub id: CityId,
    pub province_id: ProvinceId,
    pub name: String,
}
