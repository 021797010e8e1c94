//! # Folio Core
//!
//! The domain layer of the Folio library catalog.
//! This crate contains pure business logic with zero infrastructure dependencies.

pub mod domain;
pub mod error;
pub mod flows;
pub mod ports;

pub use error::DomainError;
