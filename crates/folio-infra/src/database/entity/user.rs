//! User entity for SeaORM.

use sea_orm::Set;
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub name: String,
    #[sea_orm(unique)]
    pub login: String,
    pub password_hash: String,
    pub email: Option<String>,
    pub is_active: bool,
    pub is_admin: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Conversion from SeaORM Model to the domain User.
impl From<Model> for folio_core::domain::User {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            login: model.login,
            password_hash: model.password_hash,
            email: model.email,
            is_active: model.is_active,
            is_admin: model.is_admin,
        }
    }
}

/// Conversion from the domain User to an ActiveModel. A zero id means
/// not-yet-persisted and maps to NotSet so the database assigns one.
impl From<folio_core::domain::User> for ActiveModel {
    fn from(user: folio_core::domain::User) -> Self {
        Self {
            id: if user.id == 0 {
                sea_orm::ActiveValue::NotSet
            } else {
                Set(user.id)
            },
            name: Set(user.name),
            login: Set(user.login),
            password_hash: Set(user.password_hash),
            email: Set(user.email),
            is_active: Set(user.is_active),
            is_admin: Set(user.is_admin),
        }
    }
}
