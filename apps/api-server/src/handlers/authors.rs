//! Author management handlers.
//!
//! Author views embed the author's active books. The unfiltered listing is
//! served through the cache; a `?name=` search always hits the database.

use actix_web::{HttpResponse, web};
use serde::Deserialize;

use folio_core::domain::Author;
use folio_core::ports::AUTHORS_KEY;
use folio_infra::cache::read_through;
use folio_shared::dto::{
    AuthorView, BookRef, CreateAuthorRequest, DetailResponse, UpdateAuthorRequest,
};

use crate::middleware::auth::Identity;
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AuthorListQuery {
    pub name: Option<String>,
}

async fn author_view(state: &AppState, author: &Author) -> AppResult<AuthorView> {
    let books = state.authors.books_of(author.id).await?;
    Ok(AuthorView {
        id: author.id,
        name: author.name.clone(),
        books: books
            .into_iter()
            .map(|b| BookRef {
                id: b.id,
                title: b.title,
            })
            .collect(),
    })
}

async fn author_views(state: &AppState, authors: Vec<Author>) -> AppResult<Vec<AuthorView>> {
    let mut views = Vec::with_capacity(authors.len());
    for author in &authors {
        views.push(author_view(state, author).await?);
    }
    Ok(views)
}

/// Resolve requested book ids, rejecting any that are not active rows.
async fn resolve_books(state: &AppState, ids: &[i64]) -> AppResult<()> {
    let found = state.books.find_by_ids(ids).await?;
    if found.len() != ids.len() {
        return Err(AppError::NotFound("Book not found".to_string()));
    }
    Ok(())
}

/// GET /authors?name=
pub async fn list(
    state: web::Data<AppState>,
    _identity: Identity,
    query: web::Query<AuthorListQuery>,
) -> AppResult<HttpResponse> {
    let views = match &query.name {
        Some(name) => {
            let authors = state.authors.find_by_name(name).await?;
            author_views(&state, authors).await?
        }
        None => {
            read_through(
                state.cache.as_ref(),
                AUTHORS_KEY,
                state.cache_ttl,
                || async {
                    let authors = state.authors.list().await.map_err(AppError::from)?;
                    author_views(&state, authors).await
                },
            )
            .await?
        }
    };

    Ok(HttpResponse::Ok().json(views))
}

/// GET /authors/{id}
pub async fn get(
    state: web::Data<AppState>,
    _identity: Identity,
    path: web::Path<i64>,
) -> AppResult<HttpResponse> {
    let author = state
        .authors
        .find_by_id(path.into_inner())
        .await?
        .ok_or_else(|| AppError::NotFound("Author not found".to_string()))?;

    Ok(HttpResponse::Ok().json(author_view(&state, &author).await?))
}

/// POST /authors - admin only.
pub async fn create(
    state: web::Data<AppState>,
    identity: Identity,
    body: web::Json<CreateAuthorRequest>,
) -> AppResult<HttpResponse> {
    identity.require_admin()?;
    let req = body.into_inner();

    if req.name.is_empty() {
        return Err(AppError::BadRequest("Please provide a name".to_string()));
    }
    if let Some(ids) = &req.book_ids {
        resolve_books(&state, ids).await?;
    }

    let _ = state.cache.delete(AUTHORS_KEY).await;

    let saved = state.authors.save(Author::new(req.name)).await?;
    if let Some(ids) = &req.book_ids {
        state.authors.set_books(saved.id, ids).await?;
        let _ = state.cache.delete(folio_core::ports::BOOKS_KEY).await;
    }

    Ok(HttpResponse::Created().json(author_view(&state, &saved).await?))
}

/// PUT /authors/{id} - admin only. Absent fields keep their current value.
pub async fn update(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<i64>,
    body: web::Json<UpdateAuthorRequest>,
) -> AppResult<HttpResponse> {
    identity.require_admin()?;
    let req = body.into_inner();

    if req.name.is_none() && req.book_ids.is_none() {
        return Err(AppError::BadRequest(
            "Please provide at least one parameter to update".to_string(),
        ));
    }
    if let Some(ids) = &req.book_ids {
        resolve_books(&state, ids).await?;
    }

    let _ = state.cache.delete(AUTHORS_KEY).await;

    let mut author = state
        .authors
        .find_by_id(path.into_inner())
        .await?
        .ok_or_else(|| AppError::NotFound("Author not found".to_string()))?;

    if let Some(name) = req.name {
        author.name = name;
    }
    let saved = state.authors.save(author).await?;

    if let Some(ids) = &req.book_ids {
        // Link replacement after the row update is not rolled back if it
        // fails; the row update stands on its own.
        state.authors.set_books(saved.id, ids).await?;
        let _ = state.cache.delete(folio_core::ports::BOOKS_KEY).await;
    }

    Ok(HttpResponse::Ok().json(author_view(&state, &saved).await?))
}

/// DELETE /authors/{id} - admin only, soft.
pub async fn delete(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<i64>,
) -> AppResult<HttpResponse> {
    identity.require_admin()?;

    let _ = state.cache.delete(AUTHORS_KEY).await;

    state
        .authors
        .soft_delete(path.into_inner())
        .await
        .map_err(|e| match e {
            folio_core::error::RepoError::NotFound => {
                AppError::NotFound("Author not found".to_string())
            }
            other => other.into(),
        })?;

    Ok(HttpResponse::Ok().json(DetailResponse::new("Author has been deleted")))
}
