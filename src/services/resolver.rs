//! Slug resolution: lookup, expiry check, click accounting, visit logging
//!
//! The expiry check and the increment are separate statements. A sweep that
//! lands between them can let one extra click through on a link that just
//! expired; the sweep interval bounds that window and it is tolerated.

use std::sync::Arc;

use chrono::Utc;
use tracing::warn;

use super::access_logger::{AccessLogger, VisitContext};
use crate::errors::{LinktrailError, Result};
use crate::storage::{ExpiryReason, Link, SeaOrmStorage};

/// Where the access-log write runs relative to the redirect
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogDispatch {
    /// Await the write before returning
    #[default]
    Inline,
    /// Spawn the write onto the runtime
    Background,
}

#[derive(Clone)]
pub struct LinkResolver {
    storage: Arc<SeaOrmStorage>,
    logger: AccessLogger,
    dispatch: LogDispatch,
}

impl LinkResolver {
    pub fn new(storage: Arc<SeaOrmStorage>, logger: AccessLogger) -> Self {
        Self {
            storage,
            logger,
            dispatch: LogDispatch::Inline,
        }
    }

    pub fn with_dispatch(mut self, dispatch: LogDispatch) -> Self {
        self.dispatch = dispatch;
        self
    }

    /// Resolve a slug to its link, counting the click.
    ///
    /// The returned link carries the click count read before the increment.
    ///
    /// `NotFound` for unknown or deleted slugs; `Gone` when the link exists
    /// but is past its expiry or click limit. Neither case counts a click or
    /// writes a log entry.
    pub async fn resolve(&self, slug: &str, visit: VisitContext) -> Result<Link> {
        let link = self.storage.get_link_by_slug(slug).await?;

        match link.expiry_reason(Utc::now()) {
            Some(ExpiryReason::TimeExpired) => {
                return Err(LinktrailError::gone("Link has expired"));
            }
            Some(ExpiryReason::ClickLimitReached) => {
                return Err(LinktrailError::gone("Link has reached its click limit"));
            }
            Some(ExpiryReason::Deleted) => {
                return Err(LinktrailError::not_found(format!("link not found: {}", slug)));
            }
            None => {}
        }

        // 并发清扫可能已在读取后软删除该行，计数仍然落在该行上
        if let Err(e) = self.storage.increment_clicks(slug).await {
            warn!("Failed to count click for {}: {}", slug, e);
        }

        self.dispatch_log(link.id, slug, visit).await;
        Ok(link)
    }

    async fn dispatch_log(&self, link_id: i64, slug: &str, visit: VisitContext) {
        let logger = self.logger.clone();
        let slug = slug.to_string();
        let write = async move {
            if let Err(e) = logger.record(link_id, &visit).await {
                warn!("Failed to record access log for {}: {}", slug, e);
            }
        };

        match self.dispatch {
            LogDispatch::Inline => write.await,
            LogDispatch::Background => {
                tokio::spawn(write);
            }
        }
    }
}
