use async_trait::async_trait;

use crate::domain::{Author, Book, User};
use crate::error::RepoError;

/// User repository. Every read filters on `is_active = true`; soft-deleted
/// accounts are invisible to all lookups.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// All active users.
    async fn list(&self) -> Result<Vec<User>, RepoError>;

    /// Find an active user by id.
    async fn find_by_id(&self, id: i64) -> Result<Option<User>, RepoError>;

    /// Find an active user by login.
    async fn find_by_login(&self, login: &str) -> Result<Option<User>, RepoError>;

    /// Insert (id == 0) or update an existing row. Returns the stored user
    /// with its assigned id.
    async fn save(&self, user: User) -> Result<User, RepoError>;

    /// Flip `is_active` to false. `RepoError::NotFound` if no active row.
    async fn soft_delete(&self, id: i64) -> Result<(), RepoError>;
}

/// Author repository with relation traversal to active books.
#[async_trait]
pub trait AuthorRepository: Send + Sync {
    async fn list(&self) -> Result<Vec<Author>, RepoError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<Author>, RepoError>;

    /// Active authors with exactly the given name.
    async fn find_by_name(&self, name: &str) -> Result<Vec<Author>, RepoError>;

    /// Active authors among the given ids, for linking.
    async fn find_by_ids(&self, ids: &[i64]) -> Result<Vec<Author>, RepoError>;

    async fn save(&self, author: Author) -> Result<Author, RepoError>;

    async fn soft_delete(&self, id: i64) -> Result<(), RepoError>;

    /// Active books linked to this author. Soft-deleted books are excluded
    /// even though the association rows remain.
    async fn books_of(&self, author_id: i64) -> Result<Vec<Book>, RepoError>;

    /// Replace this author's book links with the given set.
    async fn set_books(&self, author_id: i64, book_ids: &[i64]) -> Result<(), RepoError>;
}

/// Book repository with relation traversal to active authors.
#[async_trait]
pub trait BookRepository: Send + Sync {
    async fn list(&self) -> Result<Vec<Book>, RepoError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<Book>, RepoError>;

    /// Active books whose title contains the given fragment,
    /// case-insensitively.
    async fn find_by_title(&self, title: &str) -> Result<Vec<Book>, RepoError>;

    async fn find_by_ids(&self, ids: &[i64]) -> Result<Vec<Book>, RepoError>;

    async fn save(&self, book: Book) -> Result<Book, RepoError>;

    async fn soft_delete(&self, id: i64) -> Result<(), RepoError>;

    /// Active authors linked to this book.
    async fn authors_of(&self, book_id: i64) -> Result<Vec<Author>, RepoError>;

    /// Replace this book's author links with the given set.
    async fn set_authors(&self, book_id: i64, author_ids: &[i64]) -> Result<(), RepoError>;
}
