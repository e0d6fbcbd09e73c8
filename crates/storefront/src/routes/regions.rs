//! Shipping region lookups used by the address form.

use axum::{
    Json,
    extract::{Path, State},
};

use karya_core::ProvinceId;

use crate::db::RegionRepository;
use crate::error::Result;
use crate::models::{City, Province};
use crate::state::AppState;

/// `GET /regions/provinces`
pub async fn provinces(State(state): State<AppState>) -> Result<Json<Vec<Province>>> {
    Ok(Json(RegionRepository::new(state.pool()).provinces().await?))
}

/// `GET /regions/provinces/{id}/cities`
pub async fn cities(
    State(state): State<AppState>,
    Path(id): Path<ProvinceId>,
) -> Result<Json<Vec<City>>> {
    Ok(Json(RegionRepository::new(state.pool()).cities(id).await?))
}
