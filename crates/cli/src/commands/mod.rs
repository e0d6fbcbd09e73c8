//! Subcommand implementations.

pub mod migrate;
pub mod rajaongkir;
pub mod seed;

use secrecy::SecretString;
use sqlx::PgPool;

use karya_storefront::db::RepositoryError;

#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("session store error: {0}")]
    SessionStore(String),

    #[error("repository error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("invalid seed file: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The regions API answered, but not with usable data.
    #[error("{0}")]
    Api(String),

    #[error("{0}")]
    Invalid(String),
}

/// Connect using `DATABASE_URL`, loading `.env` first.
pub(crate) async fn connect() -> Result<PgPool, CommandError> {
    dotenvy::dotenv().ok();

    let database_url = std::env::var("DATABASE_URL")
        .map(SecretString::from)
        .map_err(|_| CommandError::MissingEnvVar("DATABASE_URL"))?;

    tracing::info!("Connecting to database...");
    Ok(karya_storefront::db::create_pool(&database_url).await?)
}
