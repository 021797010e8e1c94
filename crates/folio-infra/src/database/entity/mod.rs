//! SeaORM entities for the catalog schema.

pub mod author;
pub mod book;
pub mod book_author;
pub mod user;
