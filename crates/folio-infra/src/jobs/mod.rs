//! Job queue implementations - the dispatcher behind the fire-and-forget
//! email/PDF side-effects.

mod memory;

pub use memory::{InMemoryJobQueue, InMemoryJobQueueConfig};

#[cfg(feature = "redis")]
mod redis;
#[cfg(feature = "redis")]
pub use self::redis::{RedisJobQueue, RedisJobQueueConfig};
