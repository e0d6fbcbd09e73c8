//! Cached account views and their invalidation.
//!
//! Read routes serve address lists and profiles through [`PageCache`]
//! (`moka`, 5-minute TTL). Mutating workflows call
//! [`ViewInvalidator::invalidate`] after a successful write so the next read
//! goes back to the database.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use moka::future::Cache;
use tracing::debug;

use karya_core::UserId;

use crate::db::RepositoryError;
use crate::db::store::{AddressStore, UserStore};
use crate::models::{Address, User};

/// A cached account page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewPath {
    Addresses(UserId),
    Profile(UserId),
}

impl fmt::Display for ViewPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Addresses(user) => write!(f, "/store/myaccount/{user}/addresses"),
            Self::Profile(user) => write!(f, "/store/myaccount/{user}/profile"),
        }
    }
}

/// How much of a view to drop. Account actions only ever refresh the page
/// itself, never the surrounding layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevalidateScope {
    Page,
}

/// Marks cached views stale after a write.
pub trait ViewInvalidator: Send + Sync {
    fn invalidate(
        &self,
        path: &ViewPath,
        scope: RevalidateScope,
    ) -> impl Future<Output = ()> + Send;
}

#[derive(Debug, Clone)]
enum CachedView {
    Addresses(Arc<Vec<Address>>),
    Profile(Arc<User>),
}

/// In-memory cache of account views.
///
/// Each invalidation stamps the path with a fresh generation. A loader only
/// keeps what it read if the generation it started under is still current,
/// so a slow read can never re-cache a view a concurrent write has already
/// invalidated.
#[derive(Clone)]
pub struct PageCache {
    cache: Cache<ViewPath, CachedView>,
    generations: Cache<ViewPath, u64>,
    next_generation: Arc<AtomicU64>,
}

impl Default for PageCache {
    fn default() -> Self {
        Self::new()
    }
}

impl PageCache {
    #[must_use]
    pub fn new() -> Self {
        let cache = Cache::builder()
            .max_capacity(10_000)
            .time_to_live(Duration::from_secs(300)) // 5 minutes
            .build();
        // Outlives any cached view so a pending load still sees the bump.
        let generations = Cache::builder()
            .max_capacity(10_000)
            .time_to_idle(Duration::from_secs(600))
            .build();
        Self {
            cache,
            generations,
            next_generation: Arc::new(AtomicU64::new(1)),
        }
    }

    /// 0 until the path is first invalidated.
    async fn generation(&self, key: &ViewPath) -> u64 {
        self.generations.get(key).await.unwrap_or(0)
    }

    /// Cache `view` unless `key` was invalidated since `started` was read.
    async fn keep(&self, key: ViewPath, view: CachedView, started: u64) {
        self.cache.insert(key, view).await;
        if self.generation(&key).await != started {
            self.cache.invalidate(&key).await;
            debug!(path = %key, "Dropped view loaded before invalidation");
        }
    }

    /// The owner's addresses, loading them on a miss.
    ///
    /// # Errors
    ///
    /// Returns the store's error if the load fails; nothing is cached then.
    pub async fn addresses<S: AddressStore>(
        &self,
        owner: UserId,
        store: &S,
    ) -> Result<Arc<Vec<Address>>, RepositoryError> {
        let key = ViewPath::Addresses(owner);
        if let Some(CachedView::Addresses(addresses)) = self.cache.get(&key).await {
            debug!(path = %key, "Cache hit");
            return Ok(addresses);
        }

        let started = self.generation(&key).await;
        let addresses = Arc::new(store.list_for_user(owner).await?);
        self.keep(key, CachedView::Addresses(Arc::clone(&addresses)), started)
            .await;
        Ok(addresses)
    }

    /// The user's profile, loading it on a miss. Missing users are not cached.
    ///
    /// # Errors
    ///
    /// Returns the store's error if the load fails; nothing is cached then.
    pub async fn profile<S: UserStore>(
        &self,
        user: UserId,
        store: &S,
    ) -> Result<Option<Arc<User>>, RepositoryError> {
        let key = ViewPath::Profile(user);
        if let Some(CachedView::Profile(profile)) = self.cache.get(&key).await {
            debug!(path = %key, "Cache hit");
            return Ok(Some(profile));
        }

        let started = self.generation(&key).await;
        let Some(profile) = store.get_by_id(user).await? else {
            return Ok(None);
        };
        let profile = Arc::new(profile);
        self.keep(key, CachedView::Profile(Arc::clone(&profile)), started)
            .await;
        Ok(Some(profile))
    }
}

impl ViewInvalidator for PageCache {
    async fn invalidate(&self, path: &ViewPath, scope: RevalidateScope) {
        match scope {
            RevalidateScope::Page => {
                let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
                self.generations.insert(*path, generation).await;
                self.cache.invalidate(path).await;
            }
        }
        debug!(path = %path, "View invalidated");
    }
}
