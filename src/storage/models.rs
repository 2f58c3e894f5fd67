use chrono::{DateTime, Utc};
use serde::Serialize;

use super::backend::retry::RetryConfig;
use crate::config::DatabaseConfig;
use crate::errors::{LinktrailError, Result};
use crate::utils::url_validator::validate_url;

/// 短链接记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Link {
    pub id: i64,
    pub slug: String,
    pub target_url: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    pub click_limit: Option<i64>,
    pub click_count: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
    #[serde(rename = "user_id")]
    pub owner_id: Option<i64>,
}

/// 链接为何不再可用
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpiryReason {
    Deleted,
    TimeExpired,
    ClickLimitReached,
}

impl Link {
    pub fn is_time_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires_at| now >= expires_at)
    }

    pub fn is_click_exhausted(&self) -> bool {
        self.click_limit.is_some_and(|limit| self.click_count >= limit)
    }

    /// `None` means the link is live at `now`.
    pub fn expiry_reason(&self, now: DateTime<Utc>) -> Option<ExpiryReason> {
        if self.deleted_at.is_some() {
            Some(ExpiryReason::Deleted)
        } else if self.is_time_expired(now) {
            Some(ExpiryReason::TimeExpired)
        } else if self.is_click_exhausted() {
            Some(ExpiryReason::ClickLimitReached)
        } else {
            None
        }
    }

    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.expiry_reason(now).is_none()
    }
}

/// 目标必须是合法的 http(s) URL，点击上限必须为正数
pub fn validate_link_input(target_url: &str, click_limit: Option<i64>) -> Result<()> {
    validate_url(target_url).map_err(|e| LinktrailError::invalid_input(e.public_message()))?;
    if let Some(limit) = click_limit
        && limit <= 0
    {
        return Err(LinktrailError::invalid_input(
            "click_limit must be a positive integer",
        ));
    }
    Ok(())
}

/// 待插入的链接
#[derive(Debug, Clone)]
pub struct NewLink {
    pub slug: String,
    pub target_url: String,
    pub expires_at: Option<DateTime<Utc>>,
    pub click_limit: Option<i64>,
    pub owner_id: Option<i64>,
}

/// 注册用户，`password_hash` 不会序列化到响应里
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    #[serde(skip)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

/// 访问日志（只追加）
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccessLogEntry {
    pub id: i64,
    pub link_id: i64,
    pub accessed_at: DateTime<Utc>,
    pub ip_address: String,
    pub user_agent: String,
    pub referer: String,
    pub country: String,
    pub city: String,
    pub device_type: String,
    pub browser: String,
    pub os: String,
}

#[derive(Debug, Clone, Default)]
pub struct NewAccessLog {
    pub link_id: i64,
    pub accessed_at: DateTime<Utc>,
    pub ip_address: String,
    pub user_agent: String,
    pub referer: String,
    pub country: String,
    pub city: String,
    pub device_type: String,
    pub browser: String,
    pub os: String,
}

/// 访问日志查询范围
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogFilter {
    All,
    ByLink(i64),
    ByOwnerId(i64),
    ByUsername(String),
}

/// 一次清扫的结果
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    pub time_expired: u64,
    pub click_expired: u64,
}

impl SweepReport {
    pub fn total(&self) -> u64 {
        self.time_expired + self.click_expired
    }
}

/// 存储连接参数
#[derive(Debug, Clone, Copy)]
pub struct StorageOptions {
    pub pool_size: u32,
    pub connect_timeout_secs: u64,
    pub retry: RetryConfig,
}

impl Default for StorageOptions {
    fn default() -> Self {
        Self {
            pool_size: 10,
            connect_timeout_secs: 8,
            retry: RetryConfig::default(),
        }
    }
}

impl From<&DatabaseConfig> for StorageOptions {
    fn from(config: &DatabaseConfig) -> Self {
        Self {
            pool_size: config.pool_size,
            connect_timeout_secs: config.timeout,
            retry: RetryConfig {
                max_retries: config.retry_count,
                base_delay_ms: config.retry_base_delay_ms,
                max_delay_ms: config.retry_max_delay_ms,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn link() -> Link {
        Link {
            id: 1,
            slug: "abc12345".to_string(),
            target_url: "https://example.com".to_string(),
            created_at: Utc::now(),
            expires_at: None,
            click_limit: None,
            click_count: 0,
            deleted_at: None,
            owner_id: Some(7),
        }
    }

    #[test]
    fn test_plain_link_is_live() {
        assert!(link().is_live(Utc::now()));
    }

    #[test]
    fn test_expiry_reason_order() {
        let now = Utc::now();
        let mut l = link();
        l.expires_at = Some(now - Duration::seconds(1));
        l.click_limit = Some(1);
        l.click_count = 1;
        assert_eq!(l.expiry_reason(now), Some(ExpiryReason::TimeExpired));

        l.deleted_at = Some(now);
        assert_eq!(l.expiry_reason(now), Some(ExpiryReason::Deleted));
    }

    #[test]
    fn test_click_limit_boundary() {
        let now = Utc::now();
        let mut l = link();
        l.click_limit = Some(3);
        l.click_count = 2;
        assert!(l.is_live(now));
        l.click_count = 3;
        assert_eq!(l.expiry_reason(now), Some(ExpiryReason::ClickLimitReached));
    }

    #[test]
    fn test_future_expiry_is_live() {
        let now = Utc::now();
        let mut l = link();
        l.expires_at = Some(now + Duration::hours(1));
        assert!(l.is_live(now));
        assert!(!l.is_live(now + Duration::hours(2)));
    }

    #[test]
    fn test_validate_link_input() {
        assert!(validate_link_input("https://example.com", None).is_ok());
        assert!(validate_link_input("https://example.com", Some(1)).is_ok());
        assert!(matches!(
            validate_link_input("https://example.com", Some(0)),
            Err(LinktrailError::InvalidInput(_))
        ));
        assert!(matches!(
            validate_link_input("javascript:alert(1)", None),
            Err(LinktrailError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_owner_serializes_as_user_id() {
        let json = serde_json::to_value(link()).unwrap();
        assert_eq!(json["user_id"], 7);
        assert!(json.get("deleted_at").is_none());
    }
}
