//! Ports - trait definitions for external dependencies.
//! These are the "interfaces" that infrastructure must implement.

mod auth;
mod cache;
mod job_queue;
mod repository;

pub use auth::{AuthError, PasswordService, TokenClaims, TokenPurpose, TokenService};
pub use cache::{AUTHORS_KEY, BOOKS_KEY, Cache, CacheError, USERS_KEY};
pub use job_queue::{
    JOB_RENDER_PDF, JOB_SEND_WELCOME_EMAIL, Job, JobHandler, JobQueue, JobQueueError, JobResult,
    QueueStats,
};
pub use repository::{AuthorRepository, BookRepository, UserRepository};
