//! # Folio Infrastructure
//!
//! Concrete implementations of the ports defined in `folio-core`.
//! This crate contains database, cache, queue, and auth integrations.
//!
//! ## Feature Flags
//!
//! - `full` (default) - All features enabled
//! - `minimal` - No external dependencies, in-memory only
//! - `postgres` - PostgreSQL support via SeaORM
//! - `auth` - JWT + Argon2 authentication
//! - `redis` - Redis cache and job queue backends

pub mod cache;
pub mod database;
pub mod jobs;

#[cfg(feature = "auth")]
pub mod auth;

// Re-exports - In-Memory
pub use cache::{InMemoryCache, read_through};
pub use database::memory::{
    InMemoryAuthorRepository, InMemoryBookRepository, InMemoryStore, InMemoryUserRepository,
};
pub use jobs::InMemoryJobQueue;

#[cfg(feature = "auth")]
pub use auth::{Argon2PasswordService, JwtConfig, JwtTokenService};

// Re-exports - Redis
#[cfg(feature = "redis")]
pub use cache::{RedisCache, RedisConfig};
#[cfg(feature = "redis")]
pub use jobs::{RedisJobQueue, RedisJobQueueConfig};
