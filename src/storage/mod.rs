use std::sync::Arc;

use crate::config::DatabaseConfig;
use crate::errors::Result;

pub mod backend;
pub mod models;

pub use backend::SeaOrmStorage;
pub use models::{
    AccessLogEntry, ExpiryReason, Link, LogFilter, NewAccessLog, NewLink, NewUser, StorageOptions,
    SweepReport, User, validate_link_input,
};

pub struct StorageFactory;

impl StorageFactory {
    /// Build the shared store from the database section of the static config.
    pub async fn create(config: &DatabaseConfig) -> Result<Arc<SeaOrmStorage>> {
        let database_url = &config.database_url;

        // 从 URL 自动推断数据库类型
        let backend_type = backend::infer_backend_from_url(database_url)?;

        let storage =
            SeaOrmStorage::new(database_url, &backend_type, StorageOptions::from(config)).await?;
        Ok(Arc::new(storage))
    }
}
