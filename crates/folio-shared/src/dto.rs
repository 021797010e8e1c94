//! Data Transfer Objects - request/response types for the API.

use serde::{Deserialize, Serialize};

/// Request to sign up a new user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignupRequest {
    pub name: String,
    pub login: String,
    pub password: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// Login form, submitted form-encoded (OAuth2 password-flow field names).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

/// Response containing the issued token pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
}

/// Public view of a user. Never exposes the password hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserView {
    pub id: i64,
    pub name: String,
    pub login: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub is_active: bool,
    pub is_admin: bool,
}

/// Request to create a user (admin surface, distinct from signup).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUserRequest {
    pub name: String,
    pub login: String,
    pub password: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// Request to update a user. Absent fields keep their current value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateUserRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub login: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

/// A book as embedded in an author view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookRef {
    pub id: i64,
    pub title: String,
}

/// An author as embedded in a book view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorRef {
    pub id: i64,
    pub name: String,
}

/// Author with its active books.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorView {
    pub id: i64,
    pub name: String,
    pub books: Vec<BookRef>,
}

/// Request to create an author.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAuthorRequest {
    pub name: String,
    #[serde(default)]
    pub book_ids: Option<Vec<i64>>,
}

/// Request to update an author. Absent fields keep their current value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateAuthorRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub book_ids: Option<Vec<i64>>,
}

/// Book with its active authors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookView {
    pub id: i64,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub authors: Vec<AuthorRef>,
}

/// Request to create a book.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateBookRequest {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub author_ids: Option<Vec<i64>>,
}

/// Request to update a book. Absent fields keep their current value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateBookRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub author_ids: Option<Vec<i64>>,
}

/// Plain confirmation message, e.g. after a delete.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetailResponse {
    pub detail: String,
}

impl DetailResponse {
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: detail.into(),
        }
    }
}
