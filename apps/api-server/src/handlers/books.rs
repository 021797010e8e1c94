//! Book management handlers.
//!
//! Book views embed the book's active authors. The unfiltered listing is
//! served through the cache; a `?title=` search (case-insensitive contains)
//! always hits the database. `GET /books/catalog/pdf` enqueues a render job
//! over the active catalog and returns the listing.

use actix_web::{HttpResponse, web};
use serde::Deserialize;
use serde_json::json;

use folio_core::domain::Book;
use folio_core::ports::{AUTHORS_KEY, BOOKS_KEY, JOB_RENDER_PDF, Job};
use folio_infra::cache::read_through;
use folio_shared::dto::{
    AuthorRef, BookView, CreateBookRequest, DetailResponse, UpdateBookRequest,
};

use crate::middleware::auth::Identity;
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct BookListQuery {
    pub title: Option<String>,
}

async fn book_view(state: &AppState, book: &Book) -> AppResult<BookView> {
    let authors = state.books.authors_of(book.id).await?;
    Ok(BookView {
        id: book.id,
        title: book.title.clone(),
        description: book.description.clone(),
        authors: authors
            .into_iter()
            .map(|a| AuthorRef {
                id: a.id,
                name: a.name,
            })
            .collect(),
    })
}

async fn book_views(state: &AppState, books: Vec<Book>) -> AppResult<Vec<BookView>> {
    let mut views = Vec::with_capacity(books.len());
    for book in &books {
        views.push(book_view(state, book).await?);
    }
    Ok(views)
}

/// Reject author ids that do not resolve to active rows.
async fn resolve_authors(state: &AppState, ids: &[i64]) -> AppResult<()> {
    let found = state.authors.find_by_ids(ids).await?;
    if found.len() != ids.len() {
        return Err(AppError::NotFound("Author not found".to_string()));
    }
    Ok(())
}

/// GET /books?title=
pub async fn list(
    state: web::Data<AppState>,
    _identity: Identity,
    query: web::Query<BookListQuery>,
) -> AppResult<HttpResponse> {
    let views = match &query.title {
        Some(title) => {
            let books = state.books.find_by_title(title).await?;
            book_views(&state, books).await?
        }
        None => {
            read_through(
                state.cache.as_ref(),
                BOOKS_KEY,
                state.cache_ttl,
                || async {
                    let books = state.books.list().await.map_err(AppError::from)?;
                    book_views(&state, books).await
                },
            )
            .await?
        }
    };

    Ok(HttpResponse::Ok().json(views))
}

/// GET /books/{id}
pub async fn get(
    state: web::Data<AppState>,
    _identity: Identity,
    path: web::Path<i64>,
) -> AppResult<HttpResponse> {
    let book = state
        .books
        .find_by_id(path.into_inner())
        .await?
        .ok_or_else(|| AppError::NotFound("Book not found".to_string()))?;

    Ok(HttpResponse::Ok().json(book_view(&state, &book).await?))
}

/// GET /books/catalog/pdf
///
/// Fire-and-forget: the handler returns the listing whether or not the
/// render job could be queued.
pub async fn catalog_pdf(
    state: web::Data<AppState>,
    _identity: Identity,
) -> AppResult<HttpResponse> {
    let books = state.books.list().await?;
    let views = book_views(&state, books).await?;

    let job = Job::new(JOB_RENDER_PDF, json!({ "kind": "books", "items": views }));
    if let Err(e) = state.jobs.enqueue(job).await {
        tracing::warn!("Failed to enqueue catalog PDF render: {}", e);
    }

    Ok(HttpResponse::Ok().json(views))
}

/// POST /books - admin only.
pub async fn create(
    state: web::Data<AppState>,
    identity: Identity,
    body: web::Json<CreateBookRequest>,
) -> AppResult<HttpResponse> {
    identity.require_admin()?;
    let req = body.into_inner();

    if req.title.is_empty() {
        return Err(AppError::BadRequest("Please provide a title".to_string()));
    }
    if let Some(ids) = &req.author_ids {
        resolve_authors(&state, ids).await?;
    }

    let _ = state.cache.delete(BOOKS_KEY).await;

    let saved = state
        .books
        .save(Book::new(req.title, req.description))
        .await?;
    if let Some(ids) = &req.author_ids {
        state.books.set_authors(saved.id, ids).await?;
        let _ = state.cache.delete(AUTHORS_KEY).await;
    }

    Ok(HttpResponse::Created().json(book_view(&state, &saved).await?))
}

/// PUT /books/{id} - admin only. Absent fields keep their current value.
pub async fn update(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<i64>,
    body: web::Json<UpdateBookRequest>,
) -> AppResult<HttpResponse> {
    identity.require_admin()?;
    let req = body.into_inner();

    if req.title.is_none() && req.description.is_none() && req.author_ids.is_none() {
        return Err(AppError::BadRequest(
            "Please provide at least one parameter to update".to_string(),
        ));
    }
    if let Some(ids) = &req.author_ids {
        resolve_authors(&state, ids).await?;
    }

    let _ = state.cache.delete(BOOKS_KEY).await;

    let mut book = state
        .books
        .find_by_id(path.into_inner())
        .await?
        .ok_or_else(|| AppError::NotFound("Book not found".to_string()))?;

    if let Some(title) = req.title {
        book.title = title;
    }
    if let Some(description) = req.description {
        book.description = Some(description);
    }
    let saved = state.books.save(book).await?;

    if let Some(ids) = &req.author_ids {
        // Link replacement after the row update is not rolled back if it
        // fails; the row update stands on its own.
        state.books.set_authors(saved.id, ids).await?;
        let _ = state.cache.delete(AUTHORS_KEY).await;
    }

    Ok(HttpResponse::Ok().json(book_view(&state, &saved).await?))
}

/// DELETE /books/{id} - admin only, soft.
pub async fn delete(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<i64>,
) -> AppResult<HttpResponse> {
    identity.require_admin()?;

    let _ = state.cache.delete(BOOKS_KEY).await;

    state
        .books
        .soft_delete(path.into_inner())
        .await
        .map_err(|e| match e {
            folio_core::error::RepoError::NotFound => {
                AppError::NotFound("Book not found".to_string())
            }
            other => other.into(),
        })?;

    Ok(HttpResponse::Ok().json(DetailResponse::new("Book has been deleted")))
}
