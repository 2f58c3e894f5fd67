//! Shared fixtures for integration tests
#![allow(dead_code)]

use std::sync::Arc;

use chrono::{DateTime, Utc};
use linktrail::storage::{Link, NewLink, SeaOrmStorage, StorageOptions};
use migration::entities::user;
use sea_orm::{ActiveModelTrait, Set};
use tempfile::TempDir;

/// Fresh SQLite file with migrations applied. Keep the `TempDir` alive.
pub async fn test_storage() -> (Arc<SeaOrmStorage>, TempDir) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = temp_dir.path().join("linktrail_test.db");
    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());

    let storage = SeaOrmStorage::new(&db_url, "sqlite", StorageOptions::default())
        .await
        .expect("Failed to create storage");

    (Arc::new(storage), temp_dir)
}

pub async fn insert_user(storage: &SeaOrmStorage, username: &str) -> i64 {
    let model = user::ActiveModel {
        username: Set(username.to_string()),
        email: Set(format!("{}@example.com", username)),
        password_hash: Set("not-a-real-hash".to_string()),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(storage.get_db())
    .await
    .expect("Failed to insert user");

    model.id
}

pub fn new_link(slug: &str, owner_id: i64) -> NewLink {
    NewLink {
        slug: slug.to_string(),
        target_url: format!("https://example.com/{}", slug),
        expires_at: None,
        click_limit: None,
        owner_id: Some(owner_id),
    }
}

/// Insert a link directly through the store, bypassing the service checks.
pub async fn insert_link(
    storage: &SeaOrmStorage,
    slug: &str,
    owner_id: i64,
    expires_at: Option<DateTime<Utc>>,
    click_limit: Option<i64>,
) -> Link {
    let mut link = new_link(slug, owner_id);
    link.expires_at = expires_at;
    link.click_limit = click_limit;
    storage
        .create_link(link)
        .await
        .expect("Failed to insert link")
}
