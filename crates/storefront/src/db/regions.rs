//! Province and city reference data.

use sqlx::PgPool;

use karya_core::{CityId, ProvinceId};

use super::RepositoryError;
use crate::models::{City, Province};

/// Repository for shipping regions.
#[derive(Clone, Copy)]
pub struct RegionRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> RegionRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// All provinces, alphabetically.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn provinces(&self) -> Result<Vec<Province>, RepositoryError> {
        let provinces = sqlx::query_as("SELECT id, name FROM store.province ORDER BY name")
            .fetch_all(self.pool)
            .await?;
        Ok(provinces)
    }

    /// Cities of one province, alphabetically.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn cities(&self, province_id: ProvinceId) -> Result<Vec<City>, RepositoryError> {
        let cities = sqlx::query_as(
            "SELECT id, province_id, name FROM store.city WHERE province_id = $1 ORDER BY name",
        )
        .bind(province_id)
        .fetch_all(self.pool)
        .await?;
        Ok(cities)
    }

    /// Insert or rename a province.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn upsert_province(&self, id: ProvinceId, name: &str) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO store.province (id, name) VALUES ($1, $2)
            ON CONFLICT (id) DO UPDATE SET name = EXCLUDED.name
            ",
        )
        .bind(id)
        .bind(name)
        .execute(self.pool)
        .await?;
        Ok(())
    }

    /// Insert or update a city.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the province does not exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn upsert_city(
        &self,
        id: CityId,
        province_id: ProvinceId,
        name: &str,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO store.city (id, province_id, name) VALUES ($1, $2, $3)
            ON CONFLICT (id) DO UPDATE
            SET province_id = EXCLUDED.province_id, name = EXCLUDED.name
            ",
        )
        .bind(id)
        .bind(province_id)
        .bind(name)
        .execute(self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_foreign_key_violation()
            {
                return RepositoryError::NotFound;
            }
            RepositoryError::Database(e)
        })?;
        Ok(())
    }
}
