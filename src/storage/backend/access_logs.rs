//! Access log operations for SeaOrmStorage

use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, JoinType, QueryFilter, QueryOrder, QuerySelect,
    RelationTrait,
};

use super::converters::{access_log_to_entry, new_access_log_to_active_model};
use super::{SeaOrmStorage, retry};
use crate::errors::Result;
use crate::storage::{AccessLogEntry, LogFilter, NewAccessLog};

use migration::entities::{access_log, link, user};

impl SeaOrmStorage {
    pub async fn insert_access_log(&self, entry: NewAccessLog) -> Result<AccessLogEntry> {
        let db = &self.db;
        let link_id = entry.link_id;
        let active = new_access_log_to_active_model(entry);

        let model = retry::with_retry(
            &format!("insert_access_log(link={})", link_id),
            self.retry_config,
            || {
                let model = active.clone();
                async move { model.insert(db).await }
            },
        )
        .await?;

        Ok(access_log_to_entry(model))
    }

    /// Newest entries first, at most `limit` rows.
    pub async fn list_access_logs(
        &self,
        filter: &LogFilter,
        limit: u64,
    ) -> Result<Vec<AccessLogEntry>> {
        let db = &self.db;

        let models = retry::with_retry("list_access_logs", self.retry_config, || async {
            let query = access_log::Entity::find();
            let query = match filter {
                LogFilter::All => query,
                LogFilter::ByLink(link_id) => {
                    query.filter(access_log::Column::LinkId.eq(*link_id))
                }
                LogFilter::ByOwnerId(owner_id) => query
                    .join(JoinType::InnerJoin, access_log::Relation::Link.def())
                    .filter(link::Column::UserId.eq(*owner_id)),
                LogFilter::ByUsername(username) => query
                    .join(JoinType::InnerJoin, access_log::Relation::Link.def())
                    .join(JoinType::InnerJoin, link::Relation::User.def())
                    .filter(user::Column::Username.eq(username.as_str())),
            };

            query
                .order_by_desc(access_log::Column::AccessedAt)
                .order_by_desc(access_log::Column::Id)
                .limit(limit)
                .all(db)
                .await
        })
        .await?;

        Ok(models.into_iter().map(access_log_to_entry).collect())
    }
}
