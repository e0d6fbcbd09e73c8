//! Account mutation workflows.
//!
//! Each action runs its storage work, invalidates the affected account view
//! on success, and collapses every failure into an [`ActionOutcome`].
//!
//! [`ActionOutcome`]: crate::services::outcome::ActionOutcome

mod addresses;
mod profile;

pub use addresses::AddressWorkflow;
pub use profile::{ProfileUpdate, ProfileWorkflow};

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use std::sync::Mutex;

    use chrono::Utc;
    use uuid::Uuid;

    use karya_core::{AddressId, CityId, ProvinceId, UserId};

    use crate::db::RepositoryError;
    use crate::db::store::AddressStore;
    use crate::models::{Address, AddressInput};

    pub(crate) fn user_id(n: u128) -> UserId {
        UserId::new(Uuid::from_u128(n))
    }

    pub(crate) fn address_input(to: &str) -> AddressInput {
        AddressInput {
            province_id: ProvinceId::new(9),
            city_id: CityId::new(23),
            address_to: to.to_owned(),
            full_address: "Jl. Merdeka No. 1, Bandung".to_owned(),
        }
    }

    /// In-memory `AddressStore` with owner scoping and an atomic `set_active`.
    #[derive(Default)]
    pub(crate) struct MemoryAddressStore {
        pub(crate) rows: Mutex<Vec<Address>>,
        pub(crate) fail: bool,
    }

    impl MemoryAddressStore {
        pub(crate) fn failing() -> Self {
            Self {
                fail: true,
                ..Self::default()
            }
        }

        /// Insert a row directly, bypassing the workflow.
        pub(crate) fn insert_raw(&self, owner: UserId, is_active: bool) -> AddressId {
            let now = Utc::now();
            let input = address_input("Seed");
            let address = Address {
                id: AddressId::new(Uuid::new_v4()),
                user_id: owner,
                province_id: input.province_id,
                city_id: input.city_id,
                address_to: input.address_to,
                full_address: input.full_address,
                is_active,
                created_at: now,
                updated_at: now,
            };
            let id = address.id;
            self.rows.lock().unwrap().push(address);
            id
        }

        pub(crate) fn get(&self, id: AddressId) -> Option<Address> {
            self.rows.lock().unwrap().iter().find(|a| a.id == id).cloned()
        }

        pub(crate) fn active_count(&self, owner: UserId) -> usize {
            self.rows
                .lock()
                .unwrap()
                .iter()
                .filter(|a| a.user_id == owner && a.is_active)
                .count()
        }

        fn check(&self) -> Result<(), RepositoryError> {
            if self.fail {
                return Err(RepositoryError::Database(sqlx::Error::PoolTimedOut));
            }
            Ok(())
        }
    }

    impl AddressStore for MemoryAddressStore {
        async fn create(
            &self,
            owner: UserId,
            input: &AddressInput,
        ) -> Result<Address, RepositoryError> {
            self.check()?;
            let id = self.insert_raw(owner, false);
            let mut rows = self.rows.lock().unwrap();
            let row = rows.iter_mut().find(|a| a.id == id).unwrap();
            row.province_id = input.province_id;
            row.city_id = input.city_id;
            row.address_to.clone_from(&input.address_to);
            row.full_address.clone_from(&input.full_address);
            Ok(row.clone())
        }

        async fn update(
            &self,
            owner: UserId,
            id: AddressId,
            input: &AddressInput,
        ) -> Result<Address, RepositoryError> {
            self.check()?;
            let mut rows = self.rows.lock().unwrap();
            let row = rows
                .iter_mut()
                .find(|a| a.id == id && a.user_id == owner)
                .ok_or(RepositoryError::NotFound)?;
            row.province_id = input.province_id;
            row.city_id = input.city_id;
            row.address_to.clone_from(&input.address_to);
            row.full_address.clone_from(&input.full_address);
            row.updated_at = Utc::now();
            Ok(row.clone())
        }

        async fn delete(&self, owner: UserId, id: AddressId) -> Result<(), RepositoryError> {
            self.check()?;
            let mut rows = self.rows.lock().unwrap();
            let before = rows.len();
            rows.retain(|a| !(a.id == id && a.user_id == owner));
            if rows.len() == before {
                return Err(RepositoryError::NotFound);
            }
            Ok(())
        }

        async fn set_active(&self, owner: UserId, id: AddressId) -> Result<(), RepositoryError> {
            self.check()?;
            let mut rows = self.rows.lock().unwrap();
            if !rows.iter().any(|a| a.id == id && a.user_id == owner) {
                return Err(RepositoryError::NotFound);
            }
            for row in rows.iter_mut().filter(|a| a.user_id == owner) {
                row.is_active = row.id == id;
            }
            Ok(())
        }

        async fn list_for_user(&self, owner: UserId) -> Result<Vec<Address>, RepositoryError> {
            self.check()?;
            let mut owned: Vec<Address> = self
                .rows
                .lock()
                .unwrap()
                .iter()
                .filter(|a| a.user_id == owner)
                .cloned()
                .collect();
            owned.sort_by(|a, b| {
                b.is_active
                    .cmp(&a.is_active)
                    .then(b.created_at.cmp(&a.created_at))
            });
            Ok(owned)
        }
    }
}
