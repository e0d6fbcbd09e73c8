//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;
use url::Url;

use crate::config::StorefrontConfig;
use crate::services::{CloudinaryClient, GoogleClient, PageCache};

/// Error building the application state.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("invalid base_url: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("base_url must have a host")]
    MissingHost,
}

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like database connections and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    pool: PgPool,
    pages: PageCache,
    images: CloudinaryClient,
    google: GoogleClient,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `config` - Storefront configuration
    /// * `pool` - `PostgreSQL` connection pool
    ///
    /// # Errors
    ///
    /// Returns an error if `base_url` is not an absolute URL with a host,
    /// since OAuth redirect URIs are built from it.
    pub fn new(config: StorefrontConfig, pool: PgPool) -> Result<Self, StateError> {
        let url = Url::parse(&config.base_url)?;
        if url.host_str().is_none() {
            return Err(StateError::MissingHost);
        }

        let images = CloudinaryClient::new(&config.cloudinary);
        let google = GoogleClient::new(&config);

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                pages: PageCache::new(),
                images,
                google,
            }),
        })
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Cached account views.
    #[must_use]
    pub fn pages(&self) -> &PageCache {
        &self.inner.pages
    }

    /// Profile picture host.
    #[must_use]
    pub fn images(&self) -> &CloudinaryClient {
        &self.inner.images
    }

    /// Google OAuth client.
    #[must_use]
    pub fn google(&self) -> &GoogleClient {
        &self.inner.google
    }
}
