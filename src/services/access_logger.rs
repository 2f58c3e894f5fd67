//! Access logging
//!
//! Decorates each visit with user-agent and location tags and appends it.
//! Recording never changes the outcome of a redirect; callers log and drop
//! the error.

use std::sync::Arc;

use chrono::Utc;
use tracing::trace;

use super::enrichment::parse_user_agent;
use super::geoip::GeoIpProvider;
use crate::errors::Result;
use crate::storage::{AccessLogEntry, LogFilter, NewAccessLog, SeaOrmStorage};

pub const DEFAULT_LOG_LIMIT: u64 = 50;
pub const MAX_LOG_LIMIT: u64 = 100;

/// Out-of-range or missing limits fall back to the default rather than clamping.
pub fn normalize_limit(requested: Option<i64>) -> u64 {
    match requested {
        Some(n) if (1..=MAX_LOG_LIMIT as i64).contains(&n) => n as u64,
        _ => DEFAULT_LOG_LIMIT,
    }
}

/// 一次访问的请求侧信息
#[derive(Debug, Clone, Default)]
pub struct VisitContext {
    pub ip_address: String,
    pub user_agent: String,
    pub referer: String,
}

#[derive(Clone)]
pub struct AccessLogger {
    storage: Arc<SeaOrmStorage>,
    geo: GeoIpProvider,
}

impl AccessLogger {
    pub fn new(storage: Arc<SeaOrmStorage>, geo: GeoIpProvider) -> Self {
        Self { storage, geo }
    }

    pub async fn record(&self, link_id: i64, visit: &VisitContext) -> Result<AccessLogEntry> {
        let ua = parse_user_agent(&visit.user_agent);
        let geo = self.geo.lookup(&visit.ip_address).await.unwrap_or_default();

        let entry = NewAccessLog {
            link_id,
            accessed_at: Utc::now(),
            ip_address: visit.ip_address.clone(),
            user_agent: visit.user_agent.clone(),
            referer: visit.referer.clone(),
            country: geo.country.unwrap_or_default(),
            city: geo.city.unwrap_or_default(),
            device_type: ua.device.to_string(),
            browser: ua.browser.to_string(),
            os: ua.os.to_string(),
        };

        let saved = self.storage.insert_access_log(entry).await?;
        trace!("Access log {} recorded for link {}", saved.id, link_id);
        Ok(saved)
    }

    pub async fn list(
        &self,
        filter: &LogFilter,
        limit: Option<i64>,
    ) -> Result<Vec<AccessLogEntry>> {
        self.storage
            .list_access_logs(filter, normalize_limit(limit))
            .await
    }
}
