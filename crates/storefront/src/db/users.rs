//! User repository for database operations.
//!
//! Password hashes live in `store.user_password` and are only read by
//! [`UserRepository::get_password_hash`].

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use sqlx::types::Json;

use karya_core::{Email, ImageDescriptor, UserId};

use super::store::UserStore;
use super::{RepositoryError, map_unique};
use crate::models::{NewUser, ProfileChanges, ProfileWrite, User, UserScope};

const USER_COLUMNS: &str =
    "id, username, name, email, phone_number, image, scope, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct UserRow {
    id: UserId,
    username: String,
    name: Option<String>,
    email: String,
    phone_number: Option<String>,
    image: Option<Json<ImageDescriptor>>,
    scope: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = RepositoryError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        Ok(Self {
            id: row.id,
            username: row.username,
            name: row.name,
            email,
            phone: row.phone_number,
            image: row.image.map(|Json(image)| image),
            scope: UserScope::from_db(&row.scope),
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct ProfileWriteRow {
    #[sqlx(flatten)]
    user: UserRow,
    previous_image: Option<Json<ImageDescriptor>>,
}

#[derive(sqlx::FromRow)]
struct CredentialRow {
    #[sqlx(flatten)]
    user: UserRow,
    password_hash: Option<String>,
}

/// Repository for user database operations.
#[derive(Clone, Copy)]
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    async fn insert<'e>(
        executor: impl sqlx::PgExecutor<'e>,
        user: &NewUser,
    ) -> Result<User, RepositoryError> {
        let row: UserRow = sqlx::query_as(&format!(
            r"
            INSERT INTO store.user (username, name, email, phone_number, image)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {USER_COLUMNS}
            "
        ))
        .bind(&user.username)
        .bind(user.name.as_deref())
        .bind(user.email.as_str())
        .bind(user.phone.as_deref())
        .bind(user.image.as_ref().map(Json))
        .fetch_one(executor)
        .await
        .map_err(|e| map_unique(e, "email or username"))?;

        row.try_into()
    }
}

impl UserStore for UserRepository<'_> {
    /// Create a user and its password entry in one transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email or username already exists.
    /// Returns `RepositoryError::Database` for other database errors.
    async fn create_with_password(
        &self,
        user: &NewUser,
        password_hash: &str,
    ) -> Result<User, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let created = Self::insert(&mut *tx, user).await?;

        sqlx::query(
            r"
            INSERT INTO store.user_password (user_id, password_hash)
            VALUES ($1, $2)
            ",
        )
        .bind(created.id)
        .bind(password_hash)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(created)
    }

    async fn create_oauth(&self, user: &NewUser) -> Result<User, RepositoryError> {
        Self::insert(self.pool, user).await
    }

    async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let row: Option<UserRow> = sqlx::query_as(&format!(
            "SELECT {USER_COLUMNS} FROM store.user WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(User::try_from).transpose()
    }

    async fn get_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        let row: Option<UserRow> = sqlx::query_as(&format!(
            "SELECT {USER_COLUMNS} FROM store.user WHERE email = $1"
        ))
        .bind(email.as_str())
        .fetch_optional(self.pool)
        .await?;

        row.map(User::try_from).transpose()
    }

    async fn get_password_hash(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        let row: Option<CredentialRow> = sqlx::query_as(
            r"
            SELECT u.id, u.username, u.name, u.email, u.phone_number, u.image, u.scope,
                   u.created_at, u.updated_at,
                   p.password_hash
            FROM store.user u
            LEFT JOIN store.user_password p ON u.id = p.user_id
            WHERE u.email = $1
            ",
        )
        .bind(email.as_str())
        .fetch_optional(self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let Some(password_hash) = row.password_hash else {
            return Ok(None);
        };

        Ok(Some((row.user.try_into()?, password_hash)))
    }

    async fn update_profile(
        &self,
        id: UserId,
        changes: &ProfileChanges,
    ) -> Result<ProfileWrite, RepositoryError> {
        let row: Option<ProfileWriteRow> = sqlx::query_as(&format!(
            r"
            WITH previous AS (
                SELECT id AS previous_id, image AS previous_image
                FROM store.user
                WHERE id = $1
                FOR UPDATE
            )
            UPDATE store.user AS u
            SET name = $2, username = $3, phone_number = $4,
                image = COALESCE($5, u.image), updated_at = now()
            FROM previous
            WHERE u.id = previous.previous_id
            RETURNING {USER_COLUMNS}, previous.previous_image
            "
        ))
        .bind(id)
        .bind(&changes.name)
        .bind(&changes.username)
        .bind(&changes.phone)
        .bind(changes.image.as_ref().map(Json))
        .fetch_optional(self.pool)
        .await
        .map_err(|e| map_unique(e, "username"))?;

        let row = row.ok_or(RepositoryError::NotFound)?;
        let replaced_image = changes
            .image
            .as_ref()
            .and(row.previous_image)
            .map(|Json(image)| image);
        Ok(ProfileWrite {
            user: row.user.try_into()?,
            replaced_image,
        })
    }
}
