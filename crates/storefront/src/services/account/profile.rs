//! Profile update, including replacing the profile picture.
//!
//! Ordering: upload the new picture, persist, and only then delete the
//! picture the write displaced. A failed persist never loses the stored
//! image, and keeping the picture never writes the image column at all.

use tracing::{error, instrument, warn};

use karya_core::{ImageDescriptor, ImageUpdate};

use crate::db::store::UserStore;
use crate::models::{CurrentUser, ProfileChanges};
use crate::services::auth::SessionWriter;
use crate::services::cache::{RevalidateScope, ViewInvalidator, ViewPath};
use crate::services::media::ImageHost;
use crate::services::outcome::{ActionOutcome, FailureKind};

/// Longest username accepted.
const MAX_USERNAME_LEN: usize = 50;

/// Submitted profile form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileUpdate {
    pub username: String,
    pub full_name: String,
    pub phone: String,
    pub image: ImageUpdate,
}

impl ProfileUpdate {
    /// Trim text fields and reject an empty or overlong username.
    ///
    /// # Errors
    ///
    /// Returns a user-facing message describing the invalid field.
    pub fn validate(mut self) -> Result<Self, &'static str> {
        self.username = self.username.trim().to_owned();
        self.full_name = self.full_name.trim().to_owned();
        self.phone = self.phone.trim().to_owned();

        if self.username.is_empty() {
            return Err("Username is required.");
        }
        if self.username.chars().count() > MAX_USERNAME_LEN {
            return Err("Username is too long.");
        }
        Ok(self)
    }
}

/// Profile actions for one user store, image host and view cache.
pub struct ProfileWorkflow<'a, S, H, C> {
    users: &'a S,
    images: &'a H,
    views: &'a C,
    folder: &'a str,
}

impl<'a, S: UserStore, H: ImageHost, C: ViewInvalidator> ProfileWorkflow<'a, S, H, C> {
    /// New uploads go into `folder` on the image host.
    #[must_use]
    pub const fn new(users: &'a S, images: &'a H, views: &'a C, folder: &'a str) -> Self {
        Self {
            users,
            images,
            views,
            folder,
        }
    }

    /// Apply a profile update for the signed-in user and rewrite the
    /// session's copy of them.
    #[instrument(skip_all, fields(user_id))]
    pub async fn update<W: SessionWriter>(
        &self,
        current: Option<&CurrentUser>,
        session: &W,
        update: ProfileUpdate,
    ) -> ActionOutcome {
        let Some(current) = current else {
            return ActionOutcome::Failure(FailureKind::Unauthorized);
        };
        tracing::Span::current().record("user_id", tracing::field::display(current.id));

        let ProfileUpdate {
            username,
            full_name,
            phone,
            image,
        } = update;

        let uploaded = match image {
            ImageUpdate::NoChange => None,
            ImageUpdate::NewImage(bytes) => match self.images.upload(bytes, self.folder).await {
                Ok(uploaded) => Some(uploaded),
                Err(e) => {
                    error!(error = %e, "Profile picture upload failed");
                    return ActionOutcome::unknown();
                }
            },
        };

        let changes = ProfileChanges {
            name: full_name,
            username,
            phone,
            image: uploaded,
        };

        let write = match self.users.update_profile(current.id, &changes).await {
            Ok(write) => write,
            Err(e) => {
                error!(error = %e, "Profile update failed");
                if let Some(uploaded) = &changes.image {
                    self.release(uploaded).await;
                }
                return ActionOutcome::unknown();
            }
        };

        if let Some(old) = &write.replaced_image
            && changes.image.as_ref() != Some(old)
        {
            self.release(old).await;
        }

        if let Err(e) = session.refresh(&CurrentUser::from(&write.user)).await {
            warn!(error = %e, "Failed to refresh session after profile update");
        }

        self.views
            .invalidate(&ViewPath::Profile(current.id), RevalidateScope::Page)
            .await;
        ActionOutcome::Success("Successfully updated.")
    }

    /// Delete an asset; failure only leaves an orphan behind.
    async fn release(&self, image: &ImageDescriptor) {
        if let Err(e) = self.images.destroy(&image.public_id).await {
            warn!(error = %e, public_id = %image.public_id, "Failed to delete image");
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::{Arc, Mutex};

    use karya_core::{Email, UserId};

    use super::*;
    use crate::db::RepositoryError;
    use crate::models::{NewUser, ProfileWrite, User};
    use crate::services::auth::tests::{MemorySession, MemoryUserStore, sample_user};
    use crate::services::cache::tests::RecordingInvalidator;
    use crate::services::media::tests::FakeImageHost;

    const FOLDER: &str = "karyaciptamagnet/user_pictures";

    /// Wraps the in-memory store and logs successful profile writes.
    struct LoggingUserStore {
        inner: MemoryUserStore,
        log: Arc<Mutex<Vec<String>>>,
    }

    impl UserStore for LoggingUserStore {
        async fn create_with_password(
            &self,
            user: &NewUser,
            password_hash: &str,
        ) -> Result<User, RepositoryError> {
            self.inner.create_with_password(user, password_hash).await
        }

        async fn create_oauth(&self, user: &NewUser) -> Result<User, RepositoryError> {
            self.inner.create_oauth(user).await
        }

        async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
            self.inner.get_by_id(id).await
        }

        async fn get_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
            self.inner.get_by_email(email).await
        }

        async fn get_password_hash(
            &self,
            email: &Email,
        ) -> Result<Option<(User, String)>, RepositoryError> {
            self.inner.get_password_hash(email).await
        }

        async fn update_profile(
            &self,
            id: UserId,
            changes: &ProfileChanges,
        ) -> Result<ProfileWrite, RepositoryError> {
            let result = self.inner.update_profile(id, changes).await;
            let entry = if result.is_ok() { "persist" } else { "persist-failed" };
            self.log.lock().unwrap().push(entry.to_owned());
            result
        }
    }

    struct Fixture {
        user: User,
        store: LoggingUserStore,
        host: FakeImageHost,
        views: RecordingInvalidator,
        session: MemorySession,
        log: Arc<Mutex<Vec<String>>>,
    }

    impl Fixture {
        fn new() -> Self {
            Self::with_user(sample_user("budi@example.com"))
        }

        fn with_user(user: User) -> Self {
            let log = Arc::new(Mutex::new(Vec::new()));
            Self {
                store: LoggingUserStore {
                    inner: MemoryUserStore::with_user(user.clone()),
                    log: Arc::clone(&log),
                },
                host: FakeImageHost::new(Arc::clone(&log)),
                views: RecordingInvalidator::default(),
                session: MemorySession::default(),
                user,
                log,
            }
        }

        fn update(image: ImageUpdate) -> ProfileUpdate {
            ProfileUpdate {
                username: "budi_s".to_owned(),
                full_name: "Budi Santoso".to_owned(),
                phone: "0899".to_owned(),
                image,
            }
        }

        async fn apply(&self, update: ProfileUpdate) -> ActionOutcome {
            let workflow = ProfileWorkflow::new(&self.store, &self.host, &self.views, FOLDER);
            let current = CurrentUser::from(&self.user);
            workflow.update(Some(&current), &self.session, update).await
        }

        async fn run(&self, image: ImageUpdate) -> ActionOutcome {
            self.apply(Self::update(image)).await
        }

        fn log(&self) -> Vec<String> {
            self.log.lock().unwrap().clone()
        }

        async fn stored(&self) -> User {
            self.store.get_by_id(self.user.id).await.unwrap().unwrap()
        }
    }

    #[tokio::test]
    async fn test_no_change_keeps_old_image_exactly() {
        let fx = Fixture::new();

        let outcome = fx.run(ImageUpdate::NoChange).await;

        assert_eq!(outcome, ActionOutcome::Success("Successfully updated."));
        let stored = fx.stored().await;
        assert_eq!(stored.image, fx.user.image);
        assert_eq!(stored.username, "budi_s");
        assert_eq!(stored.name.as_deref(), Some("Budi Santoso"));
        // Neither upload nor destroy happened.
        assert_eq!(fx.log(), vec!["persist"]);
        assert_eq!(fx.views.paths(), vec![ViewPath::Profile(fx.user.id)]);
    }

    #[tokio::test]
    async fn test_new_image_destroys_old_after_persist() {
        let fx = Fixture::new();

        let outcome = fx.run(ImageUpdate::NewImage(vec![1, 2, 3])).await;

        assert!(outcome.is_success());
        assert_eq!(
            fx.log(),
            vec![
                format!("upload:{FOLDER}:3"),
                "persist".to_owned(),
                "destroy:karyaciptamagnet/user_pictures/old".to_owned(),
            ]
        );
        let stored = fx.stored().await;
        assert_eq!(stored.image.unwrap().public_id, format!("{FOLDER}/new"));
    }

    #[tokio::test]
    async fn test_late_no_change_keeps_newer_image() {
        let fx = Fixture::new();
        // Built before the picture below is replaced.
        let late = Fixture::update(ImageUpdate::NoChange);

        assert!(fx.run(ImageUpdate::NewImage(vec![1, 2])).await.is_success());
        assert!(fx.apply(late).await.is_success());

        let stored = fx.stored().await;
        assert_eq!(stored.image.unwrap().public_id, format!("{FOLDER}/new"));
        assert_eq!(
            fx.log(),
            vec![
                format!("upload:{FOLDER}:2"),
                "persist".to_owned(),
                "destroy:karyaciptamagnet/user_pictures/old".to_owned(),
                "persist".to_owned(),
            ]
        );
    }

    #[tokio::test]
    async fn test_destroys_the_image_it_displaced() {
        let fx = Fixture::new();

        assert!(fx.run(ImageUpdate::NewImage(vec![1])).await.is_success());
        assert!(fx.run(ImageUpdate::NewImage(vec![2])).await.is_success());

        let log = fx.log();
        assert_eq!(log.last().unwrap(), &format!("destroy:{FOLDER}/new"));
        assert_eq!(
            log.iter()
                .filter(|entry| entry.ends_with("/old"))
                .count(),
            1
        );
        let stored = fx.stored().await;
        assert_eq!(stored.image.unwrap().public_id, format!("{FOLDER}/new2"));
    }

    #[tokio::test]
    async fn test_session_follows_new_username() {
        let fx = Fixture::new();

        assert!(fx.run(ImageUpdate::NoChange).await.is_success());

        let current = fx.session.current.lock().unwrap().clone().unwrap();
        assert_eq!(current.username, "budi_s");
        assert_eq!(current.id, fx.user.id);
        // Same session id; only the stored user changed.
        assert_eq!(*fx.session.establish_calls.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_persist_failure_keeps_old_image() {
        let mut fx = Fixture::new();
        fx.store.inner = MemoryUserStore {
            fail_writes: true,
            ..MemoryUserStore::with_user(fx.user.clone())
        };

        let outcome = fx.run(ImageUpdate::NewImage(vec![9])).await;

        assert_eq!(outcome.message(), "Unknown error.");
        let log = fx.log();
        assert!(!log.contains(&"destroy:karyaciptamagnet/user_pictures/old".to_owned()));
        // The fresh upload is released instead of being orphaned.
        assert_eq!(log.last().unwrap(), &format!("destroy:{FOLDER}/new"));
        assert_eq!(fx.stored().await.image, fx.user.image);
        assert!(fx.views.paths().is_empty());
        assert!(fx.session.current.lock().unwrap().is_none());
    }

    #[tokio::test]
    async fn test_upload_failure_persists_nothing() {
        let mut fx = Fixture::new();
        fx.host.fail_upload = true;

        let outcome = fx.run(ImageUpdate::NewImage(vec![9])).await;

        assert!(!outcome.is_success());
        assert_eq!(fx.log(), vec![format!("upload:{FOLDER}:1")]);
        assert_eq!(fx.stored().await.username, "budi");
    }

    #[tokio::test]
    async fn test_destroy_failure_is_not_a_failure() {
        let mut fx = Fixture::new();
        fx.host.fail_destroy = true;

        let outcome = fx.run(ImageUpdate::NewImage(vec![1])).await;

        assert!(outcome.is_success());
    }

    #[tokio::test]
    async fn test_first_picture_destroys_nothing() {
        let mut user = sample_user("budi@example.com");
        user.image = None;
        let fx = Fixture::with_user(user);

        let outcome = fx.run(ImageUpdate::NewImage(vec![1])).await;

        assert!(outcome.is_success());
        assert!(!fx.log().iter().any(|entry| entry.starts_with("destroy:")));
    }

    #[tokio::test]
    async fn test_requires_signed_in_user() {
        let fx = Fixture::new();
        let workflow = ProfileWorkflow::new(&fx.store, &fx.host, &fx.views, FOLDER);

        let outcome = workflow
            .update(None, &fx.session, Fixture::update(ImageUpdate::NoChange))
            .await;

        assert_eq!(outcome, ActionOutcome::Failure(FailureKind::Unauthorized));
        assert!(fx.log().is_empty());
    }

    #[test]
    fn test_validate_requires_username() {
        let update = ProfileUpdate {
            username: "   ".to_owned(),
            ..ProfileUpdate::default()
        };
        assert_eq!(update.validate(), Err("Username is required."));
    }
}
