//! SeaORM repository implementations.
//!
//! Deletion never removes rows: `soft_delete` flips `is_active` with a
//! single-row UPDATE, and every read filters on `is_active = true`, so a
//! soft-deleted row disappears from listings, lookups, and relation
//! traversals alike.

use async_trait::async_trait;
use sea_orm::sea_query::Expr;
use sea_orm::sea_query::extension::postgres::PgExpr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DbConn, DbErr, EntityTrait, JoinType, QueryFilter, QuerySelect,
    RelationTrait,
};

use folio_core::domain::{Author, Book, User};
use folio_core::error::RepoError;
use folio_core::ports::{AuthorRepository, BookRepository, UserRepository};

use super::entity::{author, book, book_author, user};

fn map_db_err(e: DbErr) -> RepoError {
    let msg = e.to_string();
    if msg.contains("duplicate") || msg.contains("unique") {
        RepoError::Constraint("Entity already exists".to_string())
    } else {
        RepoError::Query(msg)
    }
}

/// User repository backed by the `users` table.
pub struct SeaOrmUserRepository {
    db: DbConn,
}

impl SeaOrmUserRepository {
    pub fn new(db: DbConn) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserRepository for SeaOrmUserRepository {
    async fn list(&self) -> Result<Vec<User>, RepoError> {
        let rows = user::Entity::find()
            .filter(user::Column::IsActive.eq(true))
            .all(&self.db)
            .await
            .map_err(map_db_err)?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, RepoError> {
        let row = user::Entity::find()
            .filter(user::Column::Id.eq(id))
            .filter(user::Column::IsActive.eq(true))
            .one(&self.db)
            .await
            .map_err(map_db_err)?;
        Ok(row.map(Into::into))
    }

    async fn find_by_login(&self, login: &str) -> Result<Option<User>, RepoError> {
        let row = user::Entity::find()
            .filter(user::Column::Login.eq(login))
            .filter(user::Column::IsActive.eq(true))
            .one(&self.db)
            .await
            .map_err(map_db_err)?;
        Ok(row.map(Into::into))
    }

    async fn save(&self, user: User) -> Result<User, RepoError> {
        let is_insert = user.id == 0;
        let active: user::ActiveModel = user.into();
        let model = if is_insert {
            active.insert(&self.db).await
        } else {
            active.update(&self.db).await
        }
        .map_err(map_db_err)?;
        Ok(model.into())
    }

    async fn soft_delete(&self, id: i64) -> Result<(), RepoError> {
        let result = user::Entity::update_many()
            .col_expr(user::Column::IsActive, Expr::value(false))
            .filter(user::Column::Id.eq(id))
            .filter(user::Column::IsActive.eq(true))
            .exec(&self.db)
            .await
            .map_err(map_db_err)?;

        if result.rows_affected == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }
}

/// Author repository backed by the `authors` table.
pub struct SeaOrmAuthorRepository {
    db: DbConn,
}

impl SeaOrmAuthorRepository {
    pub fn new(db: DbConn) -> Self {
        Self { db }
    }
}

#[async_trait]
impl AuthorRepository for SeaOrmAuthorRepository {
    async fn list(&self) -> Result<Vec<Author>, RepoError> {
        let rows = author::Entity::find()
            .filter(author::Column::IsActive.eq(true))
            .all(&self.db)
            .await
            .map_err(map_db_err)?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Author>, RepoError> {
        let row = author::Entity::find()
            .filter(author::Column::Id.eq(id))
            .filter(author::Column::IsActive.eq(true))
            .one(&self.db)
            .await
            .map_err(map_db_err)?;
        Ok(row.map(Into::into))
    }

    async fn find_by_name(&self, name: &str) -> Result<Vec<Author>, RepoError> {
        let rows = author::Entity::find()
            .filter(author::Column::Name.eq(name))
            .filter(author::Column::IsActive.eq(true))
            .all(&self.db)
            .await
            .map_err(map_db_err)?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn find_by_ids(&self, ids: &[i64]) -> Result<Vec<Author>, RepoError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows = author::Entity::find()
            .filter(author::Column::Id.is_in(ids.to_vec()))
            .filter(author::Column::IsActive.eq(true))
            .all(&self.db)
            .await
            .map_err(map_db_err)?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn save(&self, author: Author) -> Result<Author, RepoError> {
        let is_insert = author.id == 0;
        let active: author::ActiveModel = author.into();
        let model = if is_insert {
            active.insert(&self.db).await
        } else {
            active.update(&self.db).await
        }
        .map_err(map_db_err)?;
        Ok(model.into())
    }

    async fn soft_delete(&self, id: i64) -> Result<(), RepoError> {
        let result = author::Entity::update_many()
            .col_expr(author::Column::IsActive, Expr::value(false))
            .filter(author::Column::Id.eq(id))
            .filter(author::Column::IsActive.eq(true))
            .exec(&self.db)
            .await
            .map_err(map_db_err)?;

        if result.rows_affected == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }

    async fn books_of(&self, author_id: i64) -> Result<Vec<Book>, RepoError> {
        let rows = book::Entity::find()
            .join(JoinType::InnerJoin, book::Relation::BookAuthor.def())
            .filter(book_author::Column::AuthorId.eq(author_id))
            .filter(book::Column::IsActive.eq(true))
            .all(&self.db)
            .await
            .map_err(map_db_err)?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn set_books(&self, author_id: i64, book_ids: &[i64]) -> Result<(), RepoError> {
        book_author::Entity::delete_many()
            .filter(book_author::Column::AuthorId.eq(author_id))
            .exec(&self.db)
            .await
            .map_err(map_db_err)?;

        if book_ids.is_empty() {
            return Ok(());
        }

        let links: Vec<book_author::ActiveModel> = book_ids
            .iter()
            .map(|book_id| book_author::ActiveModel {
                book_id: sea_orm::Set(*book_id),
                author_id: sea_orm::Set(author_id),
            })
            .collect();

        book_author::Entity::insert_many(links)
            .exec(&self.db)
            .await
            .map_err(map_db_err)?;
        Ok(())
    }
}

/// Book repository backed by the `books` table.
pub struct SeaOrmBookRepository {
    db: DbConn,
}

impl SeaOrmBookRepository {
    pub fn new(db: DbConn) -> Self {
        Self { db }
    }
}

#[async_trait]
impl BookRepository for SeaOrmBookRepository {
    async fn list(&self) -> Result<Vec<Book>, RepoError> {
        let rows = book::Entity::find()
            .filter(book::Column::IsActive.eq(true))
            .all(&self.db)
            .await
            .map_err(map_db_err)?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Book>, RepoError> {
        let row = book::Entity::find()
            .filter(book::Column::Id.eq(id))
            .filter(book::Column::IsActive.eq(true))
            .one(&self.db)
            .await
            .map_err(map_db_err)?;
        Ok(row.map(Into::into))
    }

    async fn find_by_title(&self, title: &str) -> Result<Vec<Book>, RepoError> {
        let rows = book::Entity::find()
            .filter(Expr::col(book::Column::Title).ilike(format!("%{title}%")))
            .filter(book::Column::IsActive.eq(true))
            .all(&self.db)
            .await
            .map_err(map_db_err)?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn find_by_ids(&self, ids: &[i64]) -> Result<Vec<Book>, RepoError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows = book::Entity::find()
            .filter(book::Column::Id.is_in(ids.to_vec()))
            .filter(book::Column::IsActive.eq(true))
            .all(&self.db)
            .await
            .map_err(map_db_err)?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn save(&self, book: Book) -> Result<Book, RepoError> {
        let is_insert = book.id == 0;
        let active: book::ActiveModel = book.into();
        let model = if is_insert {
            active.insert(&self.db).await
        } else {
            active.update(&self.db).await
        }
        .map_err(map_db_err)?;
        Ok(model.into())
    }

    async fn soft_delete(&self, id: i64) -> Result<(), RepoError> {
        let result = book::Entity::update_many()
            .col_expr(book::Column::IsActive, Expr::value(false))
            .filter(book::Column::Id.eq(id))
            .filter(book::Column::IsActive.eq(true))
            .exec(&self.db)
            .await
            .map_err(map_db_err)?;

        if result.rows_affected == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }

    async fn authors_of(&self, book_id: i64) -> Result<Vec<Author>, RepoError> {
        let rows = author::Entity::find()
            .join(JoinType::InnerJoin, author::Relation::BookAuthor.def())
            .filter(book_author::Column::BookId.eq(book_id))
            .filter(author::Column::IsActive.eq(true))
            .all(&self.db)
            .await
            .map_err(map_db_err)?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn set_authors(&self, book_id: i64, author_ids: &[i64]) -> Result<(), RepoError> {
        book_author::Entity::delete_many()
            .filter(book_author::Column::BookId.eq(book_id))
            .exec(&self.db)
            .await
            .map_err(map_db_err)?;

        if author_ids.is_empty() {
            return Ok(());
        }

        let links: Vec<book_author::ActiveModel> = author_ids
            .iter()
            .map(|author_id| book_author::ActiveModel {
                book_id: sea_orm::Set(book_id),
                author_id: sea_orm::Set(*author_id),
            })
            .collect();

        book_author::Entity::insert_many(links)
            .exec(&self.db)
            .await
            .map_err(map_db_err)?;
        Ok(())
    }
}
