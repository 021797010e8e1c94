//! User management handlers. Listing is cached; create/update/delete are
//! admin-only and invalidate the cached listing before mutating.

use actix_web::{HttpResponse, web};

use folio_core::domain::User;
use folio_core::ports::USERS_KEY;
use folio_infra::cache::read_through;
use folio_shared::dto::{CreateUserRequest, DetailResponse, UpdateUserRequest, UserView};

use crate::middleware::auth::Identity;
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

pub fn user_view(user: &User) -> UserView {
    UserView {
        id: user.id,
        name: user.name.clone(),
        login: user.login.clone(),
        email: user.email.clone(),
        is_active: user.is_active,
        is_admin: user.is_admin,
    }
}

/// GET /users
pub async fn list(state: web::Data<AppState>, _identity: Identity) -> AppResult<HttpResponse> {
    let views: Vec<UserView> = read_through(
        state.cache.as_ref(),
        USERS_KEY,
        state.cache_ttl,
        || async {
            let users = state.users.list().await.map_err(AppError::from)?;
            Ok::<Vec<UserView>, AppError>(users.iter().map(user_view).collect())
        },
    )
    .await?;

    Ok(HttpResponse::Ok().json(views))
}

/// GET /users/{id}
pub async fn get(
    state: web::Data<AppState>,
    _identity: Identity,
    path: web::Path<i64>,
) -> AppResult<HttpResponse> {
    let user = state
        .users
        .find_by_id(path.into_inner())
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    Ok(HttpResponse::Ok().json(user_view(&user)))
}

/// POST /users - admin only.
pub async fn create(
    state: web::Data<AppState>,
    identity: Identity,
    body: web::Json<CreateUserRequest>,
) -> AppResult<HttpResponse> {
    identity.require_admin()?;
    let req = body.into_inner();

    if req.name.is_empty() || req.login.is_empty() || req.password.is_empty() {
        return Err(AppError::BadRequest(
            "Please provide name, login and password".to_string(),
        ));
    }

    if state.users.find_by_login(&req.login).await?.is_some() {
        return Err(AppError::Conflict(
            "User already exists. Please Log in".to_string(),
        ));
    }

    let _ = state.cache.delete(USERS_KEY).await;

    let password_hash = state
        .passwords
        .hash(&req.password)
        .map_err(|e| AppError::Internal(e.to_string()))?;

    let user = User::new(req.name, req.login, password_hash, req.email);
    let saved = state.users.save(user).await?;

    Ok(HttpResponse::Created().json(user_view(&saved)))
}

/// PUT /users/{id} - admin only. Absent fields keep their current value.
pub async fn update(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<i64>,
    body: web::Json<UpdateUserRequest>,
) -> AppResult<HttpResponse> {
    identity.require_admin()?;
    let req = body.into_inner();

    if req.name.is_none() && req.login.is_none() && req.password.is_none() {
        return Err(AppError::BadRequest(
            "Please provide at least one parameter to update".to_string(),
        ));
    }

    let _ = state.cache.delete(USERS_KEY).await;

    let mut user = state
        .users
        .find_by_id(path.into_inner())
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    if let Some(name) = req.name {
        user.name = name;
    }
    if let Some(login) = req.login {
        user.login = login;
    }
    if let Some(password) = req.password {
        user.password_hash = state
            .passwords
            .hash(&password)
            .map_err(|e| AppError::Internal(e.to_string()))?;
    }

    let saved = state.users.save(user).await?;

    Ok(HttpResponse::Ok().json(user_view(&saved)))
}

/// DELETE /users/{id} - admin only, soft.
pub async fn delete(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<i64>,
) -> AppResult<HttpResponse> {
    identity.require_admin()?;

    let _ = state.cache.delete(USERS_KEY).await;

    state
        .users
        .soft_delete(path.into_inner())
        .await
        .map_err(|e| match e {
            folio_core::error::RepoError::NotFound => {
                AppError::NotFound("User not found".to_string())
            }
            other => other.into(),
        })?;

    Ok(HttpResponse::Ok().json(DetailResponse::new("User has been deleted")))
}
