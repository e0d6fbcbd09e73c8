//! Address create, edit, delete and set-active.

use tracing::{error, instrument};

use karya_core::{AddressId, UserId};

use crate::db::RepositoryError;
use crate::db::store::AddressStore;
use crate::models::AddressInput;
use crate::services::cache::{RevalidateScope, ViewInvalidator, ViewPath};
use crate::services::outcome::ActionOutcome;

/// Address actions for one store and view cache.
pub struct AddressWorkflow<'a, S, C> {
    store: &'a S,
    views: &'a C,
}

impl<'a, S: AddressStore, C: ViewInvalidator> AddressWorkflow<'a, S, C> {
    #[must_use]
    pub const fn new(store: &'a S, views: &'a C) -> Self {
        Self { store, views }
    }

    /// Add an inactive address for `owner`. Duplicates are allowed.
    #[instrument(skip(self, input), fields(user_id = %owner))]
    pub async fn create(&self, owner: UserId, input: &AddressInput) -> ActionOutcome {
        let result = self.store.create(owner, input).await;
        self.finish(owner, result, "Successfully created new address.")
            .await
    }

    /// Replace the fields of one of `owner`'s addresses.
    #[instrument(skip(self, input), fields(user_id = %owner, address_id = %id))]
    pub async fn edit(
        &self,
        owner: UserId,
        id: AddressId,
        input: &AddressInput,
    ) -> ActionOutcome {
        let result = self.store.update(owner, id, input).await;
        self.finish(owner, result, "Successfully edit address.").await
    }

    /// Remove one of `owner`'s addresses. If it was active, none is active
    /// afterwards.
    #[instrument(skip(self), fields(user_id = %owner, address_id = %id))]
    pub async fn delete(&self, owner: UserId, id: AddressId) -> ActionOutcome {
        let result = self.store.delete(owner, id).await;
        self.finish(owner, result, "Successfully delete address.")
            .await
    }

    /// Make `id` the only active address of `owner`.
    #[instrument(skip(self), fields(user_id = %owner, address_id = %id))]
    pub async fn set_active(&self, owner: UserId, id: AddressId) -> ActionOutcome {
        let result = self.store.set_active(owner, id).await;
        self.finish(owner, result, "Successfully set new active address.")
            .await
    }

    async fn finish<T>(
        &self,
        owner: UserId,
        result: Result<T, RepositoryError>,
        success: &'static str,
    ) -> ActionOutcome {
        match result {
            Ok(_) => {
                self.views
                    .invalidate(&ViewPath::Addresses(owner), RevalidateScope::Page)
                    .await;
                ActionOutcome::Success(success)
            }
            Err(e) => {
                error!(error = %e, "Address action failed");
                ActionOutcome::unknown()
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use uuid::Uuid;

    use super::*;
    use crate::services::account::tests::{MemoryAddressStore, address_input, user_id};
    use crate::services::cache::tests::RecordingInvalidator;

    #[tokio::test]
    async fn test_create_adds_inactive_address() {
        let owner = user_id(1);
        let store = MemoryAddressStore::default();
        let views = RecordingInvalidator::default();
        let workflow = AddressWorkflow::new(&store, &views);

        let outcome = workflow.create(owner, &address_input("Budi")).await;

        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "success": true, "message": "Successfully created new address." })
        );
        let rows = store.list_for_user(owner).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert!(!rows.first().unwrap().is_active);
        assert_eq!(views.paths(), vec![ViewPath::Addresses(owner)]);
    }

    #[tokio::test]
    async fn test_create_allows_duplicates() {
        let owner = user_id(1);
        let store = MemoryAddressStore::default();
        let views = RecordingInvalidator::default();
        let workflow = AddressWorkflow::new(&store, &views);

        for _ in 0..2 {
            assert!(workflow.create(owner, &address_input("Budi")).await.is_success());
        }
        assert_eq!(store.list_for_user(owner).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_storage_failures_return_unknown_error() {
        let owner = user_id(1);
        let id = AddressId::new(Uuid::new_v4());
        let store = MemoryAddressStore::failing();
        let views = RecordingInvalidator::default();
        let workflow = AddressWorkflow::new(&store, &views);

        let outcomes = [
            workflow.create(owner, &address_input("Budi")).await,
            workflow.edit(owner, id, &address_input("Budi")).await,
            workflow.delete(owner, id).await,
            workflow.set_active(owner, id).await,
        ];
        for outcome in outcomes {
            assert!(!outcome.is_success());
            assert_eq!(outcome.message(), "Unknown error.");
        }
        assert!(views.paths().is_empty());
    }

    #[tokio::test]
    async fn test_edit_missing_address_fails() {
        let owner = user_id(1);
        let store = MemoryAddressStore::default();
        let views = RecordingInvalidator::default();
        let workflow = AddressWorkflow::new(&store, &views);

        let outcome = workflow
            .edit(owner, AddressId::new(Uuid::new_v4()), &address_input("Budi"))
            .await;
        assert!(!outcome.is_success());
    }

    #[tokio::test]
    async fn test_edit_updates_in_place() {
        let owner = user_id(1);
        let store = MemoryAddressStore::default();
        let views = RecordingInvalidator::default();
        let workflow = AddressWorkflow::new(&store, &views);
        let id = store.insert_raw(owner, true);

        let outcome = workflow.edit(owner, id, &address_input("Siti")).await;

        assert_eq!(outcome.message(), "Successfully edit address.");
        let row = store.get(id).unwrap();
        assert_eq!(row.address_to, "Siti");
        assert!(row.is_active);
    }

    #[tokio::test]
    async fn test_other_users_addresses_are_untouched() {
        let owner = user_id(1);
        let intruder = user_id(2);
        let store = MemoryAddressStore::default();
        let views = RecordingInvalidator::default();
        let workflow = AddressWorkflow::new(&store, &views);
        let id = store.insert_raw(owner, false);

        assert!(!workflow.edit(intruder, id, &address_input("X")).await.is_success());
        assert!(!workflow.delete(intruder, id).await.is_success());
        assert!(!workflow.set_active(intruder, id).await.is_success());
        assert_eq!(store.get(id).unwrap().address_to, "Seed");
        assert!(!store.get(id).unwrap().is_active);
    }

    #[tokio::test]
    async fn test_delete_active_leaves_none_active() {
        let owner = user_id(1);
        let store = MemoryAddressStore::default();
        let views = RecordingInvalidator::default();
        let workflow = AddressWorkflow::new(&store, &views);
        let active = store.insert_raw(owner, true);
        store.insert_raw(owner, false);

        let outcome = workflow.delete(owner, active).await;

        assert_eq!(outcome.message(), "Successfully delete address.");
        assert!(store.get(active).is_none());
        assert_eq!(store.active_count(owner), 0);
    }

    #[tokio::test]
    async fn test_set_active_switches_single_active() {
        let owner = user_id(1);
        let neighbour = user_id(2);
        let store = MemoryAddressStore::default();
        let views = RecordingInvalidator::default();
        let workflow = AddressWorkflow::new(&store, &views);
        let first = store.insert_raw(owner, true);
        let second = store.insert_raw(owner, false);
        let other = store.insert_raw(neighbour, true);

        let outcome = workflow.set_active(owner, second).await;

        assert_eq!(outcome.message(), "Successfully set new active address.");
        assert!(!store.get(first).unwrap().is_active);
        assert!(store.get(second).unwrap().is_active);
        assert_eq!(store.active_count(owner), 1);
        // Another user's active address is not affected.
        assert!(store.get(other).unwrap().is_active);
        assert_eq!(views.paths(), vec![ViewPath::Addresses(owner)]);
    }

    #[tokio::test]
    async fn test_set_active_is_idempotent() {
        let owner = user_id(1);
        let store = MemoryAddressStore::default();
        let views = RecordingInvalidator::default();
        let workflow = AddressWorkflow::new(&store, &views);
        let id = store.insert_raw(owner, true);

        assert!(workflow.set_active(owner, id).await.is_success());
        assert!(workflow.set_active(owner, id).await.is_success());
        assert_eq!(store.active_count(owner), 1);
    }

    #[tokio::test]
    async fn test_set_active_unknown_id_changes_nothing() {
        let owner = user_id(1);
        let store = MemoryAddressStore::default();
        let views = RecordingInvalidator::default();
        let workflow = AddressWorkflow::new(&store, &views);
        let active = store.insert_raw(owner, true);

        let outcome = workflow
            .set_active(owner, AddressId::new(Uuid::new_v4()))
            .await;

        assert!(!outcome.is_success());
        assert!(store.get(active).unwrap().is_active);
    }
}
