//! GeoIP Provider 抽象层

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use super::external_api::ExternalApiProvider;
use crate::config::AnalyticsConfig;
use crate::utils::ip::{is_private_or_local, parse_ip};

/// 地理位置信息
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeoInfo {
    /// ISO 3166-1 alpha-2 国家代码 (e.g., "CN", "US")
    pub country: Option<String>,
    pub city: Option<String>,
}

/// GeoIP 查询 trait
#[async_trait]
pub trait GeoIpLookup: Send + Sync {
    async fn lookup(&self, ip: &str) -> Option<GeoInfo>;

    /// provider 名称（用于日志）
    fn name(&self) -> &'static str;
}

/// 关闭地理位置查询时使用
pub struct DisabledProvider;

#[async_trait]
impl GeoIpLookup for DisabledProvider {
    async fn lookup(&self, _ip: &str) -> Option<GeoInfo> {
        None
    }

    fn name(&self) -> &'static str {
        "Disabled"
    }
}

/// 统一 GeoIP Provider
///
/// 私有地址、回环地址和无法解析的字符串不会发给下游 provider。
#[derive(Clone)]
pub struct GeoIpProvider {
    inner: Arc<dyn GeoIpLookup>,
}

impl GeoIpProvider {
    pub fn new(config: &AnalyticsConfig) -> Self {
        let inner: Arc<dyn GeoIpLookup> = if config.enable_geo_lookup {
            Arc::new(ExternalApiProvider::new(&config.geoip_api_url))
        } else {
            debug!("GeoIP: lookups disabled by configuration");
            Arc::new(DisabledProvider)
        };

        info!("GeoIP: Initialized with {} provider", inner.name());
        Self { inner }
    }

    pub fn from_lookup(inner: Arc<dyn GeoIpLookup>) -> Self {
        Self { inner }
    }

    pub fn disabled() -> Self {
        Self {
            inner: Arc::new(DisabledProvider),
        }
    }

    pub async fn lookup(&self, ip: &str) -> Option<GeoInfo> {
        let addr = parse_ip(ip)?;
        if is_private_or_local(&addr) {
            return None;
        }
        self.inner.lookup(&addr.to_string()).await
    }

    pub fn provider_name(&self) -> &'static str {
        self.inner.name()
    }
}
