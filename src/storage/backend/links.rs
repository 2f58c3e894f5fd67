//! Link table operations for SeaOrmStorage

use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DbErr, EntityTrait, ExprTrait, PaginatorTrait,
    QueryFilter, QueryOrder, SqlErr, TransactionTrait,
};
use tracing::{debug, info};

use super::converters::{model_to_link, new_link_to_active_model};
use super::{SeaOrmStorage, retry};
use crate::errors::{LinktrailError, Result};
use crate::storage::{Link, NewLink, validate_link_input};

use migration::entities::link;

fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

impl SeaOrmStorage {
    /// Insert a new live link with a zero click count.
    ///
    /// The unique index on `slug` is the final arbiter: if another writer
    /// claimed the slug after the caller's availability check, this returns
    /// [`LinktrailError::SlugConflict`].
    pub async fn create_link(&self, new_link: NewLink) -> Result<Link> {
        validate_link_input(&new_link.target_url, new_link.click_limit)?;

        let db = &self.db;
        let active = new_link_to_active_model(&new_link);

        let result = retry::with_retry(
            &format!("create_link({})", new_link.slug),
            self.retry_config,
            || {
                let model = active.clone();
                async move { model.insert(db).await }
            },
        )
        .await;

        match result {
            Ok(model) => {
                info!("Link created: {} -> {}", model.slug, model.target_url);
                Ok(model_to_link(model))
            }
            Err(e) if is_unique_violation(&e) => Err(LinktrailError::slug_conflict(format!(
                "slug already taken: {}",
                new_link.slug
            ))),
            Err(e) => Err(e.into()),
        }
    }

    /// Look up a non-deleted link. Expiry is not evaluated here.
    pub async fn get_link_by_slug(&self, slug: &str) -> Result<Link> {
        let db = &self.db;

        let found = retry::with_retry(
            &format!("get_link_by_slug({})", slug),
            self.retry_config,
            || async {
                link::Entity::find()
                    .filter(link::Column::Slug.eq(slug))
                    .filter(link::Column::DeletedAt.is_null())
                    .one(db)
                    .await
            },
        )
        .await?;

        found
            .map(model_to_link)
            .ok_or_else(|| LinktrailError::not_found(format!("link not found: {}", slug)))
    }

    /// Whether any row, deleted or not, holds `slug`. Deleted slugs stay retired.
    pub async fn slug_exists(&self, slug: &str) -> Result<bool> {
        let db = &self.db;

        let count = retry::with_retry(
            &format!("slug_exists({})", slug),
            self.retry_config,
            || async {
                link::Entity::find()
                    .filter(link::Column::Slug.eq(slug))
                    .count(db)
                    .await
            },
        )
        .await?;

        Ok(count > 0)
    }

    /// Atomically add one click in a single UPDATE statement.
    ///
    /// Soft-deleted rows still count: a sweep landing between a resolve's
    /// read and this write must not drop the click.
    pub async fn increment_clicks(&self, slug: &str) -> Result<()> {
        let db = &self.db;

        let result = retry::with_retry(
            &format!("increment_clicks({})", slug),
            self.retry_config,
            || async {
                link::Entity::update_many()
                    .col_expr(
                        link::Column::ClickCount,
                        Expr::col(link::Column::ClickCount).add(1),
                    )
                    .filter(link::Column::Slug.eq(slug))
                    .exec(db)
                    .await
            },
        )
        .await?;

        if result.rows_affected == 0 {
            return Err(LinktrailError::not_found(format!(
                "link not found: {}",
                slug
            )));
        }

        debug!("Click recorded for {}", slug);
        Ok(())
    }

    /// Live links owned by `owner_id`, newest first.
    pub async fn list_links_by_owner(
        &self,
        owner_id: i64,
        now: DateTime<Utc>,
    ) -> Result<Vec<Link>> {
        let db = &self.db;

        let models = retry::with_retry(
            &format!("list_links_by_owner({})", owner_id),
            self.retry_config,
            || async {
                link::Entity::find()
                    .filter(link::Column::UserId.eq(owner_id))
                    .filter(link::Column::DeletedAt.is_null())
                    .filter(
                        Condition::any()
                            .add(link::Column::ExpiresAt.is_null())
                            .add(link::Column::ExpiresAt.gt(now)),
                    )
                    .filter(
                        Condition::any()
                            .add(link::Column::ClickLimit.is_null())
                            .add(
                                Expr::col(link::Column::ClickCount)
                                    .lt(Expr::col(link::Column::ClickLimit)),
                            ),
                    )
                    .order_by_desc(link::Column::CreatedAt)
                    .order_by_desc(link::Column::Id)
                    .all(db)
                    .await
            },
        )
        .await?;

        Ok(models.into_iter().map(model_to_link).collect())
    }

    /// Mark a link deleted on behalf of its owner.
    ///
    /// Absent or already-deleted links are `NotFound`; a different owner is
    /// `Forbidden` and nothing is written.
    pub async fn soft_delete_link(&self, slug: &str, requesting_owner_id: i64) -> Result<()> {
        let txn = self.db.begin().await.map_err(|e| {
            LinktrailError::service_unavailable(format!("failed to begin transaction: {}", e))
        })?;

        let existing = link::Entity::find()
            .filter(link::Column::Slug.eq(slug))
            .filter(link::Column::DeletedAt.is_null())
            .one(&txn)
            .await?
            .ok_or_else(|| LinktrailError::not_found(format!("link not found: {}", slug)))?;

        if existing.user_id != Some(requesting_owner_id) {
            return Err(LinktrailError::forbidden(
                "you are not allowed to delete this link",
            ));
        }

        let result = link::Entity::update_many()
            .col_expr(link::Column::DeletedAt, Expr::value(Utc::now()))
            .filter(link::Column::Id.eq(existing.id))
            .filter(link::Column::DeletedAt.is_null())
            .exec(&txn)
            .await?;

        if result.rows_affected == 0 {
            return Err(LinktrailError::not_found(format!(
                "link not found: {}",
                slug
            )));
        }

        txn.commit().await.map_err(|e| {
            LinktrailError::service_unavailable(format!("failed to commit transaction: {}", e))
        })?;

        info!("Link soft-deleted: {} (owner {})", slug, requesting_owner_id);
        Ok(())
    }
}
