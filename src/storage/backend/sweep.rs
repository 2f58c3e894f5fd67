//! Bulk expiry for SeaOrmStorage
//!
//! A sweep runs two UPDATEs (time-expired, then click-exhausted) inside one
//! transaction. Either both commit or neither does.

use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ColumnTrait, Condition, DatabaseConnection, DbErr, EntityTrait, ExprTrait, PaginatorTrait,
    QueryFilter, TransactionTrait,
};
use tracing::debug;

use super::{SeaOrmStorage, retry};
use crate::errors::Result;
use crate::storage::SweepReport;

use migration::entities::link;

async fn sweep_in_transaction(
    db: &DatabaseConnection,
    now: DateTime<Utc>,
) -> std::result::Result<SweepReport, DbErr> {
    let txn = db.begin().await?;

    let time_expired = link::Entity::update_many()
        .col_expr(link::Column::DeletedAt, Expr::value(now))
        .filter(link::Column::DeletedAt.is_null())
        .filter(link::Column::ExpiresAt.is_not_null())
        .filter(link::Column::ExpiresAt.lte(now))
        .exec(&txn)
        .await?
        .rows_affected;

    let click_expired = link::Entity::update_many()
        .col_expr(link::Column::DeletedAt, Expr::value(now))
        .filter(link::Column::DeletedAt.is_null())
        .filter(link::Column::ClickLimit.is_not_null())
        .filter(Expr::col(link::Column::ClickCount).gte(Expr::col(link::Column::ClickLimit)))
        .exec(&txn)
        .await?
        .rows_affected;

    txn.commit().await?;

    Ok(SweepReport {
        time_expired,
        click_expired,
    })
}

impl SeaOrmStorage {
    /// Soft-delete every live link that is expired at `now`.
    ///
    /// A link that is both time-expired and click-exhausted is counted once,
    /// under `time_expired`. Running the sweep again is a no-op.
    pub async fn sweep_expired(&self, now: DateTime<Utc>) -> Result<SweepReport> {
        let db = &self.db;

        let report = retry::with_retry("sweep_expired", self.retry_config, || {
            sweep_in_transaction(db, now)
        })
        .await?;

        debug!(
            "Sweep at {}: {} time-expired, {} click-expired",
            now, report.time_expired, report.click_expired
        );
        Ok(report)
    }

    /// Number of live rows that a sweep at `now` would retire.
    pub async fn count_expired(&self, now: DateTime<Utc>) -> Result<u64> {
        let db = &self.db;

        let count = retry::with_retry("count_expired", self.retry_config, || async {
            link::Entity::find()
                .filter(link::Column::DeletedAt.is_null())
                .filter(
                    Condition::any()
                        .add(
                            Condition::all()
                                .add(link::Column::ExpiresAt.is_not_null())
                                .add(link::Column::ExpiresAt.lte(now)),
                        )
                        .add(
                            Condition::all()
                                .add(link::Column::ClickLimit.is_not_null())
                                .add(
                                    Expr::col(link::Column::ClickCount)
                                        .gte(Expr::col(link::Column::ClickLimit)),
                                ),
                        ),
                )
                .count(db)
                .await
        })
        .await?;

        Ok(count)
    }
}
