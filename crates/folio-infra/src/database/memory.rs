//! In-memory repositories - used when DATABASE_URL is not configured and as
//! the backing store for handler tests. Rows are lost on process restart.
//!
//! All repositories created from one [`InMemoryStore`] share state, so
//! book/author links behave like the real association table.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use folio_core::domain::{Author, Book, User};
use folio_core::error::RepoError;
use folio_core::ports::{AuthorRepository, BookRepository, UserRepository};

#[derive(Default)]
struct State {
    users: Vec<User>,
    authors: Vec<Author>,
    books: Vec<Book>,
    /// (book_id, author_id) association rows.
    links: Vec<(i64, i64)>,
    next_user_id: i64,
    next_author_id: i64,
    next_book_id: i64,
}

/// Shared in-memory backing store.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    state: Arc<Mutex<State>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn users(&self) -> InMemoryUserRepository {
        InMemoryUserRepository {
            store: self.clone(),
        }
    }

    pub fn authors(&self) -> InMemoryAuthorRepository {
        InMemoryAuthorRepository {
            store: self.clone(),
        }
    }

    pub fn books(&self) -> InMemoryBookRepository {
        InMemoryBookRepository {
            store: self.clone(),
        }
    }
}

/// In-memory user repository.
#[derive(Clone)]
pub struct InMemoryUserRepository {
    store: InMemoryStore,
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn list(&self) -> Result<Vec<User>, RepoError> {
        let state = self.store.state.lock().unwrap();
        Ok(state.users.iter().filter(|u| u.is_active).cloned().collect())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, RepoError> {
        let state = self.store.state.lock().unwrap();
        Ok(state
            .users
            .iter()
            .find(|u| u.id == id && u.is_active)
            .cloned())
    }

    async fn find_by_login(&self, login: &str) -> Result<Option<User>, RepoError> {
        let state = self.store.state.lock().unwrap();
        Ok(state
            .users
            .iter()
            .find(|u| u.login == login && u.is_active)
            .cloned())
    }

    async fn save(&self, mut user: User) -> Result<User, RepoError> {
        let mut state = self.store.state.lock().unwrap();
        if user.id == 0 {
            if state
                .users
                .iter()
                .any(|u| u.login == user.login && u.is_active)
            {
                return Err(RepoError::Constraint("Entity already exists".to_string()));
            }
            state.next_user_id += 1;
            user.id = state.next_user_id;
            state.users.push(user.clone());
        } else {
            // Same uniqueness rule the login index enforces in Postgres.
            if state
                .users
                .iter()
                .any(|u| u.login == user.login && u.is_active && u.id != user.id)
            {
                return Err(RepoError::Constraint("Entity already exists".to_string()));
            }
            match state.users.iter_mut().find(|u| u.id == user.id) {
                Some(existing) => *existing = user.clone(),
                None => return Err(RepoError::NotFound),
            }
        }
        Ok(user)
    }

    async fn soft_delete(&self, id: i64) -> Result<(), RepoError> {
        let mut state = self.store.state.lock().unwrap();
        match state.users.iter_mut().find(|u| u.id == id && u.is_active) {
            Some(user) => {
                user.is_active = false;
                Ok(())
            }
            None => Err(RepoError::NotFound),
        }
    }
}

/// In-memory author repository.
#[derive(Clone)]
pub struct InMemoryAuthorRepository {
    store: InMemoryStore,
}

#[async_trait]
impl AuthorRepository for InMemoryAuthorRepository {
    async fn list(&self) -> Result<Vec<Author>, RepoError> {
        let state = self.store.state.lock().unwrap();
        Ok(state
            .authors
            .iter()
            .filter(|a| a.is_active)
            .cloned()
            .collect())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Author>, RepoError> {
        let state = self.store.state.lock().unwrap();
        Ok(state
            .authors
            .iter()
            .find(|a| a.id == id && a.is_active)
            .cloned())
    }

    async fn find_by_name(&self, name: &str) -> Result<Vec<Author>, RepoError> {
        let state = self.store.state.lock().unwrap();
        Ok(state
            .authors
            .iter()
            .filter(|a| a.name == name && a.is_active)
            .cloned()
            .collect())
    }

    async fn find_by_ids(&self, ids: &[i64]) -> Result<Vec<Author>, RepoError> {
        let state = self.store.state.lock().unwrap();
        Ok(state
            .authors
            .iter()
            .filter(|a| ids.contains(&a.id) && a.is_active)
            .cloned()
            .collect())
    }

    async fn save(&self, mut author: Author) -> Result<Author, RepoError> {
        let mut state = self.store.state.lock().unwrap();
        if author.id == 0 {
            state.next_author_id += 1;
            author.id = state.next_author_id;
            state.authors.push(author.clone());
        } else {
            match state.authors.iter_mut().find(|a| a.id == author.id) {
                Some(existing) => *existing = author.clone(),
                None => return Err(RepoError::NotFound),
            }
        }
        Ok(author)
    }

    async fn soft_delete(&self, id: i64) -> Result<(), RepoError> {
        let mut state = self.store.state.lock().unwrap();
        match state.authors.iter_mut().find(|a| a.id == id && a.is_active) {
            Some(author) => {
                author.is_active = false;
                Ok(())
            }
            None => Err(RepoError::NotFound),
        }
    }

    async fn books_of(&self, author_id: i64) -> Result<Vec<Book>, RepoError> {
        let state = self.store.state.lock().unwrap();
        let book_ids: Vec<i64> = state
            .links
            .iter()
            .filter(|(_, a)| *a == author_id)
            .map(|(b, _)| *b)
            .collect();
        Ok(state
            .books
            .iter()
            .filter(|b| book_ids.contains(&b.id) && b.is_active)
            .cloned()
            .collect())
    }

    async fn set_books(&self, author_id: i64, book_ids: &[i64]) -> Result<(), RepoError> {
        let mut state = self.store.state.lock().unwrap();
        state.links.retain(|(_, a)| *a != author_id);
        for book_id in book_ids {
            state.links.push((*book_id, author_id));
        }
        Ok(())
    }
}

/// In-memory book repository.
#[derive(Clone)]
pub struct InMemoryBookRepository {
    store: InMemoryStore,
}

#[async_trait]
impl BookRepository for InMemoryBookRepository {
    async fn list(&self) -> Result<Vec<Book>, RepoError> {
        let state = self.store.state.lock().unwrap();
        Ok(state
            .books
            .iter()
            .filter(|b| b.is_active)
            .cloned()
            .collect())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Book>, RepoError> {
        let state = self.store.state.lock().unwrap();
        Ok(state
            .books
            .iter()
            .find(|b| b.id == id && b.is_active)
            .cloned())
    }

    async fn find_by_title(&self, title: &str) -> Result<Vec<Book>, RepoError> {
        let needle = title.to_lowercase();
        let state = self.store.state.lock().unwrap();
        Ok(state
            .books
            .iter()
            .filter(|b| b.title.to_lowercase().contains(&needle) && b.is_active)
            .cloned()
            .collect())
    }

    async fn find_by_ids(&self, ids: &[i64]) -> Result<Vec<Book>, RepoError> {
        let state = self.store.state.lock().unwrap();
        Ok(state
            .books
            .iter()
            .filter(|b| ids.contains(&b.id) && b.is_active)
            .cloned()
            .collect())
    }

    async fn save(&self, mut book: Book) -> Result<Book, RepoError> {
        let mut state = self.store.state.lock().unwrap();
        if book.id == 0 {
            state.next_book_id += 1;
            book.id = state.next_book_id;
            state.books.push(book.clone());
        } else {
            match state.books.iter_mut().find(|b| b.id == book.id) {
                Some(existing) => *existing = book.clone(),
                None => return Err(RepoError::NotFound),
            }
        }
        Ok(book)
    }

    async fn soft_delete(&self, id: i64) -> Result<(), RepoError> {
        let mut state = self.store.state.lock().unwrap();
        match state.books.iter_mut().find(|b| b.id == id && b.is_active) {
            Some(book) => {
                book.is_active = false;
                Ok(())
            }
            None => Err(RepoError::NotFound),
        }
    }

    async fn authors_of(&self, book_id: i64) -> Result<Vec<Author>, RepoError> {
        let state = self.store.state.lock().unwrap();
        let author_ids: Vec<i64> = state
            .links
            .iter()
            .filter(|(b, _)| *b == book_id)
            .map(|(_, a)| *a)
            .collect();
        Ok(state
            .authors
            .iter()
            .filter(|a| author_ids.contains(&a.id) && a.is_active)
            .cloned()
            .collect())
    }

    async fn set_authors(&self, book_id: i64, author_ids: &[i64]) -> Result<(), RepoError> {
        let mut state = self.store.state.lock().unwrap();
        state.links.retain(|(b, _)| *b != book_id);
        for author_id in author_ids {
            state.links.push((book_id, *author_id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn soft_deleted_rows_vanish_from_all_reads() {
        let store = InMemoryStore::new();
        let books = store.books();

        let book = books
            .save(Book::new("Dead Souls".to_string(), None))
            .await
            .unwrap();
        books.soft_delete(book.id).await.unwrap();

        assert!(books.list().await.unwrap().is_empty());
        assert!(books.find_by_id(book.id).await.unwrap().is_none());
        assert!(books.find_by_title("dead").await.unwrap().is_empty());
        assert!(matches!(
            books.soft_delete(book.id).await.unwrap_err(),
            RepoError::NotFound
        ));
    }

    #[tokio::test]
    async fn soft_deleted_book_disappears_from_author_relation() {
        let store = InMemoryStore::new();
        let authors = store.authors();
        let books = store.books();

        let author = authors.save(Author::new("Gogol".to_string())).await.unwrap();
        let kept = books
            .save(Book::new("The Nose".to_string(), None))
            .await
            .unwrap();
        let dropped = books
            .save(Book::new("Dead Souls".to_string(), None))
            .await
            .unwrap();
        authors
            .set_books(author.id, &[kept.id, dropped.id])
            .await
            .unwrap();

        books.soft_delete(dropped.id).await.unwrap();

        let linked = authors.books_of(author.id).await.unwrap();
        assert_eq!(linked.len(), 1);
        assert_eq!(linked[0].id, kept.id);

        // The author itself stays active - no recursive soft-delete.
        assert!(authors.find_by_id(author.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn title_search_is_case_insensitive_contains() {
        let store = InMemoryStore::new();
        let books = store.books();

        books
            .save(Book::new("War and Peace".to_string(), None))
            .await
            .unwrap();

        assert_eq!(books.find_by_title("peace").await.unwrap().len(), 1);
        assert_eq!(books.find_by_title("WAR").await.unwrap().len(), 1);
        assert!(books.find_by_title("karenina").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn duplicate_active_login_rejected_on_insert() {
        let store = InMemoryStore::new();
        let users = store.users();

        users
            .save(User::new(
                "Ann".to_string(),
                "ann".to_string(),
                "hash".to_string(),
                None,
            ))
            .await
            .unwrap();

        let err = users
            .save(User::new(
                "Ann Again".to_string(),
                "ann".to_string(),
                "hash".to_string(),
                None,
            ))
            .await
            .unwrap_err();
        assert!(matches!(err, RepoError::Constraint(_)));
    }

    #[tokio::test]
    async fn duplicate_active_login_rejected_on_update() {
        let store = InMemoryStore::new();
        let users = store.users();

        users
            .save(User::new(
                "Ann".to_string(),
                "ann".to_string(),
                "hash".to_string(),
                None,
            ))
            .await
            .unwrap();
        let mut bob = users
            .save(User::new(
                "Bob".to_string(),
                "bob".to_string(),
                "hash".to_string(),
                None,
            ))
            .await
            .unwrap();

        bob.login = "ann".to_string();
        let err = users.save(bob.clone()).await.unwrap_err();
        assert!(matches!(err, RepoError::Constraint(_)));

        // Re-saving under the original login still works.
        bob.login = "bob".to_string();
        assert!(users.save(bob).await.is_ok());
    }
}
