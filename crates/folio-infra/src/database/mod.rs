//! Database connection management and repository implementations.

mod connections;
pub mod memory;

#[cfg(feature = "postgres")]
pub mod entity;
#[cfg(feature = "postgres")]
mod seaorm_repo;

pub use connections::DatabaseConfig;
#[cfg(feature = "postgres")]
pub use connections::connect;

#[cfg(feature = "postgres")]
pub use seaorm_repo::{SeaOrmAuthorRepository, SeaOrmBookRepository, SeaOrmUserRepository};

#[cfg(feature = "postgres")]
#[cfg(test)]
mod tests;
