use serde::{Deserialize, Serialize};

pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// 静态配置（从 TOML 加载，启动时使用）
///
/// - server: 监听地址、端口、worker 数量、短链接对外前缀
/// - database: 数据库连接与重试
/// - logging: 日志输出
/// - links: slug 生成参数
/// - reconciler: 过期清扫任务
/// - analytics: 访问日志的地理位置查询
/// - auth: 令牌校验
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StaticConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub links: LinksConfig,
    #[serde(default)]
    pub reconciler: ReconcilerConfig,
    #[serde(default)]
    pub analytics: AnalyticsConfig,
    #[serde(default)]
    pub auth: AuthConfig,
}

impl StaticConfig {
    /// 从 TOML 文件和环境变量加载配置
    ///
    /// 优先级：ENV > config.toml > 默认值
    /// ENV 前缀：LT，分隔符：__
    /// 示例：LT__SERVER__PORT=9999
    pub fn load(path: &str) -> Self {
        use config::{Config, Environment, File};

        let builder = Config::builder()
            .add_source(File::with_name(path).required(false))
            .add_source(
                Environment::with_prefix("LT")
                    .separator("__")
                    .try_parsing(true),
            );

        match builder.build() {
            Ok(settings) => match settings.try_deserialize::<StaticConfig>() {
                Ok(config) => {
                    if std::path::Path::new(path).exists() {
                        eprintln!("[INFO] Configuration loaded from: {}", path);
                    }
                    config
                }
                Err(e) => {
                    eprintln!("[ERROR] Failed to deserialize config: {}", e);
                    Self::default()
                }
            },
            Err(e) => {
                eprintln!("[ERROR] Failed to build config: {}", e);
                Self::default()
            }
        }
    }

    /// 生成示例 TOML 配置文件
    pub fn generate_sample_config() -> String {
        let sample_config = Self::default();
        toml::to_string_pretty(&sample_config)
            .unwrap_or_else(|e| format!("Error generating sample config: {}", e))
    }

    /// 保存配置到 TOML 文件
    pub fn save_to_file<P: AsRef<std::path::Path>>(
        &self,
        path: P,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let content = toml::to_string_pretty(self)?;

        if let Some(parent) = path.as_ref().parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, content)?;
        Ok(())
    }
}

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_server_host")]
    pub host: String,
    #[serde(default = "default_server_port")]
    pub port: u16,
    #[serde(default = "default_cpu_count")]
    pub cpu_count: usize,
    /// 短链接对外前缀，例如 https://go.example.com
    /// 未设置时从请求的 scheme 和 host 推导
    #[serde(default)]
    pub public_base_url: Option<String>,
    /// 允许跨域的来源，空列表表示同源，`["*"]` 表示任意来源
    #[serde(default)]
    pub cors_allowed_origins: Vec<String>,
}

/// 数据库连接配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_database_url")]
    pub database_url: String,
    #[serde(default = "default_database_pool_size")]
    pub pool_size: u32,
    #[serde(default = "default_database_timeout")]
    pub timeout: u64,
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,
    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,
    #[serde(default = "default_retry_max_delay_ms")]
    pub retry_max_delay_ms: u64,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    /// text 或 json
    #[serde(default = "default_log_format")]
    pub format: String,
    #[serde(default)]
    pub file: Option<String>,
    #[serde(default = "default_max_backups")]
    pub max_backups: u32,
    #[serde(default = "default_enable_rotation")]
    pub enable_rotation: bool,
}

/// slug 生成配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinksConfig {
    #[serde(default = "default_slug_length")]
    pub slug_length: usize,
    /// 生成 + 插入的总尝试次数
    #[serde(default = "default_max_slug_attempts")]
    pub max_slug_attempts: u32,
}

/// 过期清扫任务配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconcilerConfig {
    #[serde(default = "default_reconciler_enabled")]
    pub enabled: bool,
    #[serde(default = "default_reconciler_interval_secs")]
    pub interval_secs: u64,
}

/// 访问日志地理位置配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsConfig {
    #[serde(default = "default_enable_geo_lookup")]
    pub enable_geo_lookup: bool,

    /// 外部 GeoIP API URL
    /// 使用 {ip} 作为占位符，例如: http://ip-api.com/json/{ip}?fields=countryCode,city
    #[serde(default = "default_geoip_api_url")]
    pub geoip_api_url: String,
}

/// 令牌与账号配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// HS256 签名密钥，必须与签发令牌的服务一致
    #[serde(default)]
    pub jwt_secret: String,

    /// /signup 与 /login 签发的令牌有效期
    #[serde(default = "default_token_ttl_hours")]
    pub token_ttl_hours: i64,

    /// /signup 与 /login 按客户端 IP 限流：每 N 秒补充一个令牌
    #[serde(default = "default_rate_limit_period_secs")]
    pub rate_limit_period_secs: u64,

    /// 限流突发上限
    #[serde(default = "default_rate_limit_burst")]
    pub rate_limit_burst: u32,
}

// ============================================================
// Default value functions for static config
// ============================================================

fn default_server_host() -> String {
    "127.0.0.1".to_string()
}

fn default_server_port() -> u16 {
    8081
}

fn default_cpu_count() -> usize {
    num_cpus::get()
}

fn default_database_url() -> String {
    "sqlite://linktrail.db?mode=rwc".to_string()
}

fn default_database_pool_size() -> u32 {
    10
}

fn default_database_timeout() -> u64 {
    30
}

fn default_retry_count() -> u32 {
    3
}

fn default_retry_base_delay_ms() -> u64 {
    100
}

fn default_retry_max_delay_ms() -> u64 {
    2000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

fn default_max_backups() -> u32 {
    5
}

fn default_enable_rotation() -> bool {
    true
}

fn default_slug_length() -> usize {
    8
}

fn default_max_slug_attempts() -> u32 {
    10
}

fn default_reconciler_enabled() -> bool {
    true
}

fn default_reconciler_interval_secs() -> u64 {
    300
}

fn default_enable_geo_lookup() -> bool {
    true
}

fn default_geoip_api_url() -> String {
    "http://ip-api.com/json/{ip}?fields=countryCode,city".to_string()
}

fn default_token_ttl_hours() -> i64 {
    24
}

fn default_rate_limit_period_secs() -> u64 {
    6
}

fn default_rate_limit_burst() -> u32 {
    10
}

// ============================================================
// Default implementations
// ============================================================

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_server_host(),
            port: default_server_port(),
            cpu_count: default_cpu_count(),
            public_base_url: None,
            cors_allowed_origins: Vec::new(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            database_url: default_database_url(),
            pool_size: default_database_pool_size(),
            timeout: default_database_timeout(),
            retry_count: default_retry_count(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
            retry_max_delay_ms: default_retry_max_delay_ms(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            file: None,
            max_backups: default_max_backups(),
            enable_rotation: default_enable_rotation(),
        }
    }
}

impl Default for LinksConfig {
    fn default() -> Self {
        Self {
            slug_length: default_slug_length(),
            max_slug_attempts: default_max_slug_attempts(),
        }
    }
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            enabled: default_reconciler_enabled(),
            interval_secs: default_reconciler_interval_secs(),
        }
    }
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            enable_geo_lookup: default_enable_geo_lookup(),
            geoip_api_url: default_geoip_api_url(),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            token_ttl_hours: default_token_ttl_hours(),
            rate_limit_period_secs: default_rate_limit_period_secs(),
            rate_limit_burst: default_rate_limit_burst(),
        }
    }
}
