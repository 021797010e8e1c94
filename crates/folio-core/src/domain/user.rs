use serde::{Deserialize, Serialize};

/// User entity - an account (principal) in the catalog.
///
/// Users are never hard-deleted; deletion flips `is_active` and all reads
/// filter on it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub login: String,
    pub password_hash: String,
    pub email: Option<String>,
    pub is_active: bool,
    pub is_admin: bool,
}

impl User {
    /// Create a new, not-yet-persisted user: active, non-admin.
    pub fn new(name: String, login: String, password_hash: String, email: Option<String>) -> Self {
        Self {
            id: 0,
            name,
            login,
            password_hash,
            email,
            is_active: true,
            is_admin: false,
        }
    }

    /// Role claims embedded into tokens at issuance time.
    pub fn groups(&self) -> Vec<String> {
        if self.is_admin {
            vec!["user".to_string(), "admin".to_string()]
        } else {
            vec!["user".to_string()]
        }
    }
}
