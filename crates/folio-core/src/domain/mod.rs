//! Domain entities - the core business objects.

mod author;
mod book;
mod user;

pub use author::Author;
pub use book::Book;
pub use user::User;
