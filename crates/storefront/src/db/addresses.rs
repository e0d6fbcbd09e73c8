//! Address repository.
//!
//! The single-active rule is backed by the deferred exclusion constraint
//! `address_one_active_per_user`; [`AddressRepository::set_active`] flips
//! every row of the owner in one statement so the constraint only ever sees
//! the committed state.

use sqlx::PgPool;

use karya_core::{AddressId, UserId};

use super::RepositoryError;
use super::store::AddressStore;
use crate::models::{Address, AddressInput};

const ADDRESS_COLUMNS: &str = "id, user_id, province_id, city_id, address_to, full_address, \
                               is_active, created_at, updated_at";

/// Repository for address database operations.
#[derive(Clone, Copy)]
pub struct AddressRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> AddressRepository<'a> {
    /// Create a new address repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }
}

impl AddressStore for AddressRepository<'_> {
    async fn create(&self, owner: UserId, input: &AddressInput) -> Result<Address, RepositoryError> {
        let address = sqlx::query_as(&format!(
            r"
            INSERT INTO store.address (user_id, province_id, city_id, address_to, full_address)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {ADDRESS_COLUMNS}
            "
        ))
        .bind(owner)
        .bind(input.province_id)
        .bind(input.city_id)
        .bind(&input.address_to)
        .bind(&input.full_address)
        .fetch_one(self.pool)
        .await?;

        Ok(address)
    }

    async fn update(
        &self,
        owner: UserId,
        id: AddressId,
        input: &AddressInput,
    ) -> Result<Address, RepositoryError> {
        let address: Option<Address> = sqlx::query_as(&format!(
            r"
            UPDATE store.address
            SET province_id = $3, city_id = $4, address_to = $5, full_address = $6,
                updated_at = now()
            WHERE id = $1 AND user_id = $2
            RETURNING {ADDRESS_COLUMNS}
            "
        ))
        .bind(id)
        .bind(owner)
        .bind(input.province_id)
        .bind(input.city_id)
        .bind(&input.address_to)
        .bind(&input.full_address)
        .fetch_optional(self.pool)
        .await?;

        address.ok_or(RepositoryError::NotFound)
    }

    async fn delete(&self, owner: UserId, id: AddressId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM store.address WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(owner)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn set_active(&self, owner: UserId, id: AddressId) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        // Lock the owner's rows so concurrent switches serialize.
        let owned: Vec<AddressId> =
            sqlx::query_scalar("SELECT id FROM store.address WHERE user_id = $1 FOR UPDATE")
                .bind(owner)
                .fetch_all(&mut *tx)
                .await?;

        if !owned.contains(&id) {
            return Err(RepositoryError::NotFound);
        }

        sqlx::query(
            r"
            UPDATE store.address
            SET is_active = (id = $2), updated_at = now()
            WHERE user_id = $1 AND is_active IS DISTINCT FROM (id = $2)
            ",
        )
        .bind(owner)
        .bind(id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(())
    }

    async fn list_for_user(&self, owner: UserId) -> Result<Vec<Address>, RepositoryError> {
        let addresses = sqlx::query_as(&format!(
            r"
            SELECT {ADDRESS_COLUMNS}
            FROM store.address
            WHERE user_id = $1
            ORDER BY is_active DESC, created_at DESC
            "
        ))
        .bind(owner)
        .fetch_all(self.pool)
        .await?;

        Ok(addresses)
    }
}
