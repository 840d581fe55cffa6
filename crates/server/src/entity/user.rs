//! User entity - a local account that can sign in through the login flow.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "app_user")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    #[sea_orm(unique)]
    pub user_name: Option<String>,
    #[sea_orm(unique)]
    pub email: Option<String>,
    pub name: Option<String>,
    pub last_name: Option<String>,
    /// Argon2 PHC string
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::application_role::Entity")]
    ApplicationRoles,
}

impl Related<super::application_role::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ApplicationRoles.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
