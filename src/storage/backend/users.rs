//! User table operations for SeaOrmStorage

use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, SqlErr};
use tracing::info;

use super::converters::{model_to_user, new_user_to_active_model};
use super::{SeaOrmStorage, retry};
use crate::errors::{LinktrailError, Result};
use crate::storage::{NewUser, User};

use migration::entities::user;

impl SeaOrmStorage {
    /// Insert a registered user.
    ///
    /// Username and email are each unique; a duplicate of either is
    /// [`LinktrailError::Conflict`].
    pub async fn create_user(&self, new_user: NewUser) -> Result<User> {
        let db = &self.db;
        let active = new_user_to_active_model(&new_user);

        let result = retry::with_retry(
            &format!("create_user({})", new_user.username),
            self.retry_config,
            || {
                let model = active.clone();
                async move { model.insert(db).await }
            },
        )
        .await;

        match result {
            Ok(model) => {
                info!("User created: {} (id {})", model.username, model.id);
                Ok(model_to_user(model))
            }
            Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => Err(
                LinktrailError::conflict("username or email already registered"),
            ),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        self.find_user(user::Column::Email, email).await
    }

    pub async fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
        self.find_user(user::Column::Username, username).await
    }

    async fn find_user(&self, column: user::Column, value: &str) -> Result<Option<User>> {
        let db = &self.db;

        let model = retry::with_retry(
            &format!("find_user({:?})", column),
            self.retry_config,
            || async {
                user::Entity::find()
                    .filter(column.eq(value))
                    .one(db)
                    .await
            },
        )
        .await?;

        Ok(model.map(model_to_user))
    }
}
