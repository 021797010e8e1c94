//! Orchestration flows - signup and login sequencing over the ports.

mod auth;

pub use auth::{NewAccount, TokenPair, login, signup};
