//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use identity_gate::identity::{ApplicationGrant, DbUserStore, NewUser};
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, DbBackend, Statement};
use std::sync::Arc;

/// In-memory database with the user tables.
pub async fn create_user_db() -> Arc<DatabaseConnection> {
    let db = Database::connect("sqlite::memory:").await.expect("connect");

    db.execute(Statement::from_string(
        DbBackend::Sqlite,
        r#"CREATE TABLE app_user (
            id TEXT PRIMARY KEY,
            user_name TEXT NULL UNIQUE,
            email TEXT NULL UNIQUE,
            name TEXT NULL,
            last_name TEXT NULL,
            password_hash TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );"#,
    ))
    .await
    .expect("create app_user table");

    db.execute(Statement::from_string(
        DbBackend::Sqlite,
        r#"CREATE TABLE application_role (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id TEXT NOT NULL REFERENCES app_user(id) ON DELETE CASCADE,
            application_name TEXT NOT NULL,
            roles TEXT NOT NULL DEFAULT '[]'
        );"#,
    ))
    .await
    .expect("create application_role table");

    Arc::new(db)
}

pub fn grant(application: &str, roles: &[&str]) -> ApplicationGrant {
    ApplicationGrant {
        application: application.to_string(),
        roles: roles.iter().map(|r| r.to_string()).collect(),
    }
}

/// `toky` / `toky@example.com` with password `pwd`, holding roles on `portal` and `wiki`.
pub async fn seed_toky(store: &DbUserStore) {
    store
        .create_user(NewUser {
            user_name: Some("toky".into()),
            email: Some("toky@example.com".into()),
            name: Some("Toky".into()),
            last_name: Some("Tokyo".into()),
            password: "pwd".into(),
            applications: vec![
                grant("portal", &["admin", "editor"]),
                grant("wiki", &["reader"]),
            ],
        })
        .await
        .expect("seed toky");
}
