use serde::{Deserialize, Serialize};

/// Book entity. Linked to authors through a many-to-many association.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Book {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub is_active: bool,
}

impl Book {
    pub fn new(title: String, description: Option<String>) -> Self {
        Self {
            id: 0,
            title,
            description,
            is_active: true,
        }
    }
}
