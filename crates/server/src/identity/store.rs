//! Database-backed user store.

use std::sync::Arc;

use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, TransactionTrait,
};
use time::OffsetDateTime;

use crate::entity::{application_role, user};
use crate::error::UserStoreError;
use crate::identity::{
    ApplicationGrant, CredentialVerifier, UserDirectory, UserRecord, hash_password,
    verify_password,
};

/// Parameters for creating a local account.
#[derive(Clone, Debug, Default)]
pub struct NewUser {
    pub user_name: Option<String>,
    pub email: Option<String>,
    pub name: Option<String>,
    pub last_name: Option<String>,
    pub password: String,
    pub applications: Vec<ApplicationGrant>,
}

/// User store on top of the `app_user` and `application_role` tables.
#[derive(Clone)]
pub struct DbUserStore {
    db: Arc<DatabaseConnection>,
}

impl DbUserStore {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Username match wins over email match.
    async fn find_model(&self, identifier: &str) -> Result<user::Model, UserStoreError> {
        if let Some(found) = user::Entity::find()
            .filter(user::Column::UserName.eq(identifier))
            .one(self.db.as_ref())
            .await?
        {
            return Ok(found);
        }

        user::Entity::find()
            .filter(user::Column::Email.eq(identifier))
            .one(self.db.as_ref())
            .await?
            .ok_or_else(|| UserStoreError::NotFound(identifier.to_string()))
    }

    async fn grants_for(&self, user_id: &str) -> Result<Vec<ApplicationGrant>, UserStoreError> {
        let rows = application_role::Entity::find()
            .filter(application_role::Column::UserId.eq(user_id))
            .order_by_asc(application_role::Column::Id)
            .all(self.db.as_ref())
            .await?;

        rows.into_iter()
            .map(|row| {
                let roles = row.roles_list().map_err(|e| {
                    tracing::warn!(row_id = row.id, error = %e, "Unreadable roles column");
                    UserStoreError::Invalid(format!("roles of application_role {}: {e}", row.id))
                })?;
                Ok(ApplicationGrant {
                    roles,
                    application: row.application_name,
                })
            })
            .collect()
    }

    /// Create a local account with its application role grants.
    ///
    /// A username or an email and a non-empty password are required; both
    /// identifiers must be unused.
    #[tracing::instrument(skip_all, fields(user_name = ?new_user.user_name, email = ?new_user.email))]
    pub async fn create_user(&self, new_user: NewUser) -> Result<UserRecord, UserStoreError> {
        let user_name = non_empty(new_user.user_name);
        let email = non_empty(new_user.email);

        if user_name.is_none() && email.is_none() {
            return Err(UserStoreError::Invalid(
                "a user needs at least a username or an email".into(),
            ));
        }
        if new_user.password.is_empty() {
            return Err(UserStoreError::Invalid("a user needs a password".into()));
        }

        for identifier in [&user_name, &email].into_iter().flatten() {
            match self.find_model(identifier).await {
                Ok(_) => {
                    return Err(UserStoreError::Conflict(format!(
                        "'{identifier}' is already taken"
                    )));
                }
                Err(UserStoreError::NotFound(_)) => {}
                Err(e) => return Err(e),
            }
        }

        let password_hash = hash_password(&new_user.password)?;
        let now = OffsetDateTime::now_utc();
        let id = uuid::Uuid::new_v4().to_string();

        let txn = self.db.begin().await?;
        let model = user::ActiveModel {
            id: Set(id.clone()),
            user_name: Set(user_name),
            email: Set(email),
            name: Set(new_user.name),
            last_name: Set(new_user.last_name),
            password_hash: Set(password_hash),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await?;

        for grant in &new_user.applications {
            application_role::ActiveModel {
                user_id: Set(id.clone()),
                application_name: Set(grant.application.clone()),
                roles: Set(serde_json::to_string(&grant.roles).unwrap_or_else(|_| "[]".into())),
                ..Default::default()
            }
            .insert(&txn)
            .await?;
        }
        txn.commit().await?;

        tracing::info!(user_id = %id, "Created user");
        Ok(to_record(model, new_user.applications))
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn to_record(model: user::Model, applications: Vec<ApplicationGrant>) -> UserRecord {
    UserRecord {
        id: model.id,
        user_name: model.user_name.unwrap_or_default(),
        email: model.email.unwrap_or_default(),
        name: model.name.unwrap_or_default(),
        last_name: model.last_name.unwrap_or_default(),
        applications,
    }
}

#[async_trait]
impl UserDirectory for DbUserStore {
    #[tracing::instrument(skip(self))]
    async fn find_by_identifier(&self, identifier: &str) -> Result<UserRecord, UserStoreError> {
        let model = self.find_model(identifier).await?;
        let applications = self.grants_for(&model.id).await?;
        Ok(to_record(model, applications))
    }
}

#[async_trait]
impl CredentialVerifier for DbUserStore {
    #[tracing::instrument(skip(self, secret))]
    async fn verify(&self, identifier: &str, secret: &str) -> Result<bool, UserStoreError> {
        let model = self.find_model(identifier).await?;
        Ok(verify_password(secret, &model.password_hash))
    }
}
