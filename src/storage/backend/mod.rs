//! SeaORM storage backend
//!
//! This module provides database storage using SeaORM,
//! supporting SQLite, MySQL/MariaDB, and PostgreSQL.
//!
//! Every operation is a method on [`SeaOrmStorage`]; the methods are split
//! by table across the submodules.

mod access_logs;
mod connection;
mod converters;
mod links;
pub mod retry;
mod sweep;
mod users;

use sea_orm::{ConnectionTrait, DatabaseConnection};
use tracing::info;

use crate::errors::{LinktrailError, Result};
use crate::storage::models::StorageOptions;

pub use connection::{connect_generic, connect_sqlite, run_migrations};
pub use converters::{
    access_log_to_entry, model_to_link, model_to_user, new_access_log_to_active_model,
    new_link_to_active_model, new_user_to_active_model,
};

/// 从数据库 URL 推断数据库类型
pub fn infer_backend_from_url(database_url: &str) -> Result<String> {
    if database_url.starts_with("sqlite:")
        || database_url.ends_with(".db")
        || database_url.ends_with(".sqlite")
        || database_url == ":memory:"
    {
        Ok("sqlite".to_string())
    } else if database_url.starts_with("mysql://") || database_url.starts_with("mariadb://") {
        Ok("mysql".to_string())
    } else if database_url.starts_with("postgres://") || database_url.starts_with("postgresql://") {
        Ok("postgres".to_string())
    } else {
        Err(LinktrailError::database_config(format!(
            "Cannot infer database type from URL: {}. Supported: sqlite://, mysql://, mariadb://, postgres://",
            database_url
        )))
    }
}

/// SeaORM-based storage backend
#[derive(Clone)]
pub struct SeaOrmStorage {
    db: DatabaseConnection,
    backend_name: String,
    retry_config: retry::RetryConfig,
}

impl SeaOrmStorage {
    /// Connect, run pending migrations and return a ready store.
    pub async fn new(
        database_url: &str,
        backend_name: &str,
        options: StorageOptions,
    ) -> Result<Self> {
        if database_url.is_empty() {
            return Err(LinktrailError::database_config("database_url is not set"));
        }

        let db = if backend_name == "sqlite" {
            connect_sqlite(database_url).await?
        } else {
            connect_generic(database_url, backend_name, &options).await?
        };

        let storage = SeaOrmStorage {
            db,
            backend_name: backend_name.to_string(),
            retry_config: options.retry,
        };

        run_migrations(&storage.db).await?;

        info!(
            "{} storage initialized",
            storage.backend_name.to_uppercase()
        );
        Ok(storage)
    }

    pub fn backend_name(&self) -> &str {
        &self.backend_name
    }

    /// 获取数据库连接（测试中用于直接写入 users 等外部表）
    pub fn get_db(&self) -> &DatabaseConnection {
        &self.db
    }

    /// 健康检查
    pub async fn ping(&self) -> Result<()> {
        self.db
            .ping()
            .await
            .map_err(|e| {
                LinktrailError::service_unavailable(format!("database ping failed: {}", e))
            })
    }

    /// 关闭连接池
    pub async fn close(self) -> Result<()> {
        self.db
            .close()
            .await
            .map_err(|e| {
                LinktrailError::service_unavailable(format!("failed to close database: {}", e))
            })
    }
}
