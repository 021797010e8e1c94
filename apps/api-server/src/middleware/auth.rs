//! Authentication middleware and extractors.

use actix_web::{FromRequest, HttpRequest, dev::Payload, http::header, web};
use futures::future::LocalBoxFuture;

use folio_core::domain::User;
use folio_core::ports::AuthError;

use crate::middleware::error::AppError;
use crate::state::AppState;

/// Authenticated user identity extractor.
///
/// Parses the `Authorization: Bearer <token>` header, validates the access
/// token, then loads the live principal by the token subject. A valid token
/// whose user has since been deactivated or removed is rejected with the
/// same 401 as an invalid token.
///
/// Use this in handlers to require authentication:
/// ```ignore
/// async fn protected_route(identity: Identity) -> impl Responder {
///     format!("Hello, {}!", identity.user.login)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Identity {
    pub user: User,
}

impl Identity {
    /// Gate for mutating endpoints: Forbidden unless the live principal is
    /// an admin. The token's role claims are deliberately not consulted, so
    /// a demotion takes effect on the next request even while an older
    /// token is unexpired.
    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.user.is_admin {
            Ok(())
        } else {
            Err(AppError::Forbidden)
        }
    }
}

/// Error type for authentication failures.
#[derive(Debug)]
pub struct AuthenticationError(pub AuthError);

impl std::fmt::Display for AuthenticationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl actix_web::ResponseError for AuthenticationError {
    fn status_code(&self) -> actix_web::http::StatusCode {
        match &self.0 {
            AuthError::Forbidden => actix_web::http::StatusCode::FORBIDDEN,
            AuthError::Hashing(_) | AuthError::Signing(_) => {
                actix_web::http::StatusCode::INTERNAL_SERVER_ERROR
            }
            _ => actix_web::http::StatusCode::UNAUTHORIZED,
        }
    }

    fn error_response(&self) -> actix_web::HttpResponse {
        use folio_shared::ErrorResponse;

        let error = match &self.0 {
            AuthError::MissingAuth => ErrorResponse::unauthorized(
                "Please provide a valid Bearer token in the Authorization header",
            ),
            AuthError::InvalidToken => {
                ErrorResponse::unauthorized(AuthError::InvalidToken.to_string())
            }
            AuthError::Forbidden => ErrorResponse::forbidden(),
            AuthError::Hashing(_) | AuthError::Signing(_) => ErrorResponse::internal_error(),
        };

        actix_web::HttpResponse::build(self.status_code()).json(error)
    }
}

impl FromRequest for Identity {
    type Error = AuthenticationError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let state = req.app_data::<web::Data<AppState>>().cloned();
        let token = bearer_token(req).map(str::to_owned);

        Box::pin(async move {
            let state = match state {
                Some(state) => state,
                None => {
                    tracing::error!("AppState not found in app data");
                    return Err(AuthenticationError(AuthError::InvalidToken));
                }
            };
            let token = token?;

            let claims = state
                .tokens
                .validate(&token)
                .map_err(AuthenticationError)?;

            // Live principal check: the subject must still resolve to an
            // active user.
            let user = state
                .users
                .find_by_login(&claims.sub)
                .await
                .map_err(|e| {
                    tracing::error!("Principal lookup failed: {}", e);
                    AuthenticationError(AuthError::InvalidToken)
                })?
                .ok_or(AuthenticationError(AuthError::InvalidToken))?;

            Ok(Identity { user })
        })
    }
}

fn bearer_token(req: &HttpRequest) -> Result<&str, AuthenticationError> {
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .ok_or(AuthenticationError(AuthError::MissingAuth))?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| AuthenticationError(AuthError::InvalidToken))?;

    auth_str
        .strip_prefix("Bearer ")
        .ok_or(AuthenticationError(AuthError::InvalidToken))
}
