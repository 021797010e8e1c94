//! Signup and login handlers.

use actix_web::{HttpResponse, web};

use folio_core::flows::{self, NewAccount};
use folio_core::ports::USERS_KEY;
use folio_shared::dto::{LoginForm, SignupRequest, TokenResponse};

use crate::middleware::error::AppResult;
use crate::state::AppState;

use super::users::user_view;

/// POST /signup
///
/// Registers a new active, non-admin account. When an email address is
/// supplied, a welcome email is enqueued; if that enqueue fails, the
/// account is rolled back and the request fails with 500.
pub async fn signup(
    state: web::Data<AppState>,
    body: web::Json<SignupRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();

    // The user listing is about to change.
    let _ = state.cache.delete(USERS_KEY).await;

    let user = flows::signup(
        state.users.as_ref(),
        state.passwords.as_ref(),
        state.jobs.as_ref(),
        NewAccount {
            name: req.name,
            login: req.login,
            password: req.password,
            email: req.email,
        },
    )
    .await?;

    Ok(HttpResponse::Created().json(user_view(&user)))
}

/// POST /login
///
/// Form-encoded OAuth2 password-flow field names. Unknown login and wrong
/// password answer with the same 401.
pub async fn login(
    state: web::Data<AppState>,
    form: web::Form<LoginForm>,
) -> AppResult<HttpResponse> {
    let form = form.into_inner();

    let pair = flows::login(
        state.users.as_ref(),
        state.passwords.as_ref(),
        state.tokens.as_ref(),
        &form.username,
        &form.password,
    )
    .await?;

    Ok(HttpResponse::Ok().json(TokenResponse {
        access_token: pair.access_token,
        refresh_token: pair.refresh_token,
    }))
}
