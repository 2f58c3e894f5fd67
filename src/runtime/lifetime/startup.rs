use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use chrono::Utc;
use tracing::{debug, info, warn};

use crate::api::{AppState, AuthRateLimit, JwtPrincipal, PrincipalResolver, auth_rate_limit};
use crate::config::StaticConfig;
use crate::reconciler::ExpiryReconciler;
use crate::services::{AccessLogger, AccountService, GeoIpProvider, LinkResolver, LinkService};
use crate::storage::{SeaOrmStorage, StorageFactory};

pub struct StartupContext {
    pub storage: Arc<SeaOrmStorage>,
    pub state: AppState,
    pub principal: Arc<dyn PrincipalResolver>,
    pub auth_limit: AuthRateLimit,
    /// `reconciler.enabled = false` 时为 None
    pub reconciler: Option<Arc<ExpiryReconciler>>,
}

/// 打开存储并执行迁移
pub async fn open_storage(config: &StaticConfig) -> Result<Arc<SeaOrmStorage>> {
    let storage = StorageFactory::create(&config.database)
        .await
        .context("Failed to create storage backend")?;
    info!("Using storage backend: {}", storage.backend_name());
    Ok(storage)
}

/// 组装请求处理共享的服务
pub fn build_app_state(
    storage: Arc<SeaOrmStorage>,
    config: &StaticConfig,
    geo: GeoIpProvider,
) -> AppState {
    let access_logs = AccessLogger::new(storage.clone(), geo);
    let resolver = LinkResolver::new(storage.clone(), access_logs.clone());
    let links = LinkService::new(storage.clone(), &config.links);
    let accounts = AccountService::new(storage.clone());

    AppState {
        storage,
        links: Arc::new(links),
        resolver: Arc::new(resolver),
        access_logs: Arc::new(access_logs),
        accounts: Arc::new(accounts),
        token_ttl: chrono::Duration::hours(config.auth.token_ttl_hours.max(1)),
        public_base_url: config
            .server
            .public_base_url
            .as_deref()
            .map(|base| base.trim_end_matches('/').to_string())
            .filter(|base| !base.is_empty()),
        started_at: Utc::now(),
    }
}

/// 准备服务器启动的上下文
/// 包括存储、服务和过期清扫任务
pub async fn prepare_server_startup(config: &StaticConfig) -> Result<StartupContext> {
    let start_time = std::time::Instant::now();
    debug!("Starting pre-startup processing...");

    if config.auth.jwt_secret.trim().is_empty() {
        bail!("auth.jwt_secret is empty; set it in the config file or LT__AUTH__JWT_SECRET");
    }
    let principal: Arc<dyn PrincipalResolver> =
        Arc::new(JwtPrincipal::new(&config.auth.jwt_secret));
    let auth_limit = auth_rate_limit(&config.auth).context("Invalid auth settings")?;

    let storage = open_storage(config).await?;
    let state = build_app_state(
        storage.clone(),
        config,
        GeoIpProvider::new(&config.analytics),
    );

    let reconciler = if config.reconciler.enabled {
        Some(ExpiryReconciler::new(
            storage.clone(),
            Duration::from_secs(config.reconciler.interval_secs),
        ))
    } else {
        warn!("Expiry reconciler disabled; expired links are only rejected at resolve time");
        None
    };

    info!(
        "Pre-startup processing completed in {} ms",
        start_time.elapsed().as_millis()
    );

    Ok(StartupContext {
        storage,
        state,
        principal,
        auth_limit,
        reconciler,
    })
}
