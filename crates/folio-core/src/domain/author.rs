use serde::{Deserialize, Serialize};

/// Author entity. Linked to books through a many-to-many association.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Author {
    pub id: i64,
    pub name: String,
    pub is_active: bool,
}

impl Author {
    pub fn new(name: String) -> Self {
        Self {
            id: 0,
            name,
            is_active: true,
        }
    }
}
