//! HTTP GeoIP lookups against an ip-api.com style endpoint

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use moka::Expiry;
use moka::future::Cache;
use serde_json::Value;
use tracing::{debug, trace, warn};
use ureq::Agent;

use super::provider::{GeoInfo, GeoIpLookup};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(2);
const CACHE_CAPACITY: u64 = 10_000;
/// 命中结果保留 15 分钟
const HIT_TTL: Duration = Duration::from_secs(15 * 60);
/// 查询失败只缓存 1 分钟，服务恢复后能尽快重新查到
const MISS_TTL: Duration = Duration::from_secs(60);

/// 成功和失败的结果用不同的 TTL
struct GeoExpiry;

impl Expiry<String, Option<GeoInfo>> for GeoExpiry {
    fn expire_after_create(
        &self,
        _ip: &String,
        value: &Option<GeoInfo>,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(if value.is_some() { HIT_TTL } else { MISS_TTL })
    }
}

/// 读取 ip-api.com 风格的响应体
///
/// `{"status":"fail"}` 或国家、城市都缺失时返回 `None`。空字符串视为缺失。
pub(crate) fn parse_geo_response(json: &Value) -> Option<GeoInfo> {
    if json["status"].as_str() == Some("fail") {
        return None;
    }

    let field = |name: &str| {
        json[name]
            .as_str()
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };
    let country = ["countryCode", "country_code", "country"]
        .into_iter()
        .find_map(field);
    let city = field("city");

    (country.is_some() || city.is_some()).then_some(GeoInfo { country, city })
}

/// 阻塞式 HTTP 客户端，只在 `spawn_blocking` 里调用
struct GeoApiClient {
    agent: Agent,
    url_template: String,
}

impl GeoApiClient {
    fn new(url_template: &str) -> Self {
        if !url_template.contains("{ip}") {
            warn!("GeoIP URL template has no {{ip}} placeholder: {}", url_template);
        }

        let agent = Agent::config_builder()
            .timeout_global(Some(REQUEST_TIMEOUT))
            .build()
            .into();

        Self {
            agent,
            url_template: url_template.to_string(),
        }
    }

    fn url_for(&self, ip: &str) -> String {
        self.url_template.replace("{ip}", ip)
    }

    fn fetch(&self, ip: &str) -> Option<GeoInfo> {
        let url = self.url_for(ip);

        let body: Value = match self.agent.get(&url).call() {
            Ok(resp) => match resp.into_body().read_json() {
                Ok(body) => body,
                Err(e) => {
                    warn!("GeoIP response for {} is not JSON: {}", ip, e);
                    return None;
                }
            },
            Err(e) => {
                warn!("GeoIP request for {} failed: {}", ip, e);
                return None;
            }
        };

        let geo = parse_geo_response(&body);
        trace!("GeoIP {} -> {:?}", ip, geo);
        geo
    }
}

/// [`GeoIpLookup`] backed by a remote JSON API.
///
/// Results (including failures) are cached per IP. Concurrent lookups of
/// one IP share a single request.
pub struct ExternalApiProvider {
    client: Arc<GeoApiClient>,
    cache: Cache<String, Option<GeoInfo>>,
}

impl ExternalApiProvider {
    /// `url_template` 中的 `{ip}` 会被替换成客户端 IP
    pub fn new(url_template: &str) -> Self {
        let cache = Cache::builder()
            .max_capacity(CACHE_CAPACITY)
            .expire_after(GeoExpiry)
            .build();

        Self {
            client: Arc::new(GeoApiClient::new(url_template)),
            cache,
        }
    }

    async fn fetch(&self, ip: &str) -> Option<GeoInfo> {
        let client = Arc::clone(&self.client);
        let ip = ip.to_string();

        match tokio::task::spawn_blocking(move || client.fetch(&ip)).await {
            Ok(geo) => geo,
            Err(e) => {
                warn!("GeoIP lookup task failed: {}", e);
                None
            }
        }
    }
}

#[async_trait]
impl GeoIpLookup for ExternalApiProvider {
    async fn lookup(&self, ip: &str) -> Option<GeoInfo> {
        // get_with 对同一 key 只执行一次 init future
        self.cache
            .get_with(ip.to_string(), async {
                debug!("GeoIP cache miss for {}", ip);
                self.fetch(ip).await
            })
            .await
    }

    fn name(&self) -> &'static str {
        "ExternalAPI"
    }
}
