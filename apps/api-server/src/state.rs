//! Application state - shared across all handlers.

use std::sync::Arc;
use std::time::Duration;

use folio_core::ports::{
    AuthorRepository, BookRepository, Cache, JobQueue, PasswordService, TokenService,
    UserRepository,
};
use folio_infra::cache::{InMemoryCache, RedisCache, RedisConfig, cache_ttl_from_env};
use folio_infra::database::{
    SeaOrmAuthorRepository, SeaOrmBookRepository, SeaOrmUserRepository, connect,
    memory::InMemoryStore,
};
use folio_infra::jobs::{InMemoryJobQueue, RedisJobQueue, RedisJobQueueConfig};
use folio_infra::{Argon2PasswordService, JwtTokenService};

use crate::config::AppConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub cache: Arc<dyn Cache>,
    /// TTL for cached listings (CACHE_TTL_SECS, 300 s default).
    pub cache_ttl: Duration,
    pub users: Arc<dyn UserRepository>,
    pub authors: Arc<dyn AuthorRepository>,
    pub books: Arc<dyn BookRepository>,
    pub jobs: Arc<dyn JobQueue>,
    pub tokens: Arc<dyn TokenService>,
    pub passwords: Arc<dyn PasswordService>,
}

impl AppState {
    /// Build the application state with appropriate implementations.
    ///
    /// Missing DATABASE_URL or REDIS_URL falls back to the in-memory
    /// adapters with a warning; handy for local development, useless for
    /// anything that must survive a restart.
    pub async fn new(config: &AppConfig) -> Self {
        let (users, authors, books): (
            Arc<dyn UserRepository>,
            Arc<dyn AuthorRepository>,
            Arc<dyn BookRepository>,
        ) = match &config.database {
            Some(db_config) => match connect(db_config).await {
                Ok(db) => (
                    Arc::new(SeaOrmUserRepository::new(db.clone())),
                    Arc::new(SeaOrmAuthorRepository::new(db.clone())),
                    Arc::new(SeaOrmBookRepository::new(db)),
                ),
                Err(e) => {
                    tracing::error!(
                        "Failed to connect to database: {}. Using in-memory repositories.",
                        e
                    );
                    Self::in_memory_repos()
                }
            },
            None => {
                tracing::warn!("DATABASE_URL not set. Running with in-memory repositories.");
                Self::in_memory_repos()
            }
        };

        let cache: Arc<dyn Cache> = if config.redis_url.is_some() {
            match RedisCache::new(RedisConfig::from_env()).await {
                Ok(cache) => Arc::new(cache),
                Err(e) => {
                    tracing::error!("Failed to connect to Redis cache: {}. Using in-memory.", e);
                    Arc::new(InMemoryCache::new())
                }
            }
        } else {
            Arc::new(InMemoryCache::new())
        };

        let jobs: Arc<dyn JobQueue> = if config.redis_url.is_some() {
            match RedisJobQueue::new(RedisJobQueueConfig::from_env()).await {
                Ok(queue) => Arc::new(queue),
                Err(e) => {
                    tracing::error!("Failed to connect to Redis queue: {}. Using in-memory.", e);
                    Arc::new(InMemoryJobQueue::from_env())
                }
            }
        } else {
            Arc::new(InMemoryJobQueue::from_env())
        };

        tracing::info!("Application state initialized");

        Self {
            cache,
            cache_ttl: cache_ttl_from_env(),
            users,
            authors,
            books,
            jobs,
            tokens: Arc::new(JwtTokenService::from_env()),
            passwords: Arc::new(Argon2PasswordService::new()),
        }
    }

    fn in_memory_repos() -> (
        Arc<dyn UserRepository>,
        Arc<dyn AuthorRepository>,
        Arc<dyn BookRepository>,
    ) {
        let store = InMemoryStore::new();
        (
            Arc::new(store.users()),
            Arc::new(store.authors()),
            Arc::new(store.books()),
        )
    }
}

#[cfg(test)]
impl AppState {
    /// Fully in-memory state for handler tests; the returned store shares
    /// rows with the repositories, so tests can seed data directly.
    pub fn for_tests() -> (Self, InMemoryStore) {
        let store = InMemoryStore::new();
        let state = Self {
            cache: Arc::new(InMemoryCache::new()),
            cache_ttl: cache_ttl_from_env(),
            users: Arc::new(store.users()),
            authors: Arc::new(store.authors()),
            books: Arc::new(store.books()),
            jobs: Arc::new(InMemoryJobQueue::from_env()),
            tokens: Arc::new(JwtTokenService::from_env()),
            passwords: Arc::new(Argon2PasswordService::new()),
        };
        (state, store)
    }
}
