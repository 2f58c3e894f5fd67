//! Server mode
//!
//! Starts the expiry reconciler and the HTTP server, then waits for either
//! the server to exit or a shutdown signal.

use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{
    App, HttpServer,
    middleware::{Compress, DefaultHeaders},
    web,
};
use anyhow::{Context, Result};
use tracing::{error, warn};

use crate::api::{PrincipalResolver, configure_routes};
use crate::config::{ServerConfig, StaticConfig};
use crate::runtime::lifetime;

/// Build CORS middleware from configuration
fn build_cors_middleware(server: &ServerConfig) -> Cors {
    // 未配置来源时使用浏览器默认的同源策略
    if server.cors_allowed_origins.is_empty() {
        return Cors::default();
    }

    let mut cors = Cors::default()
        .allowed_methods(vec!["GET", "POST", "DELETE", "OPTIONS"])
        .allowed_headers(vec![
            actix_web::http::header::AUTHORIZATION,
            actix_web::http::header::CONTENT_TYPE,
            actix_web::http::header::ACCEPT,
        ])
        .max_age(3600);

    if server.cors_allowed_origins.iter().any(|o| o == "*") {
        cors = cors.allow_any_origin();
    } else {
        for origin in &server.cors_allowed_origins {
            cors = cors.allowed_origin(origin);
        }
    }
    cors
}

/// Run the HTTP server
///
/// **Note**: Logging system must be initialized before calling this function
pub async fn run_server(config: &StaticConfig) -> Result<()> {
    let startup = lifetime::startup::prepare_server_startup(config)
        .await
        .inspect_err(|e| error!("Server startup failed: {:#}", e))?;

    if let Some(reconciler) = &startup.reconciler {
        reconciler.start();
    }

    let state = web::Data::new(startup.state.clone());
    let principal: web::Data<Arc<dyn PrincipalResolver>> =
        web::Data::new(startup.principal.clone());
    let server_config = config.server.clone();

    let cpu_count = server_config.cpu_count.clamp(1, 32);
    warn!("Using {} CPU cores for the server", cpu_count);

    let bind_address = format!("{}:{}", server_config.host, server_config.port);
    let cors_config = server_config.clone();
    let auth_limit = startup.auth_limit.clone();

    let server = HttpServer::new(move || {
        App::new()
            .wrap(build_cors_middleware(&cors_config))
            .wrap(Compress::default())
            .wrap(
                DefaultHeaders::new()
                    .add(("Cache-Control", "no-cache, no-store, must-revalidate"))
                    .add(("X-Content-Type-Options", "nosniff")),
            )
            .app_data(state.clone())
            .app_data(principal.clone())
            .app_data(web::PayloadConfig::new(64 * 1024))
            .configure(configure_routes(&auth_limit))
    })
    .keep_alive(std::time::Duration::from_secs(30))
    .client_request_timeout(std::time::Duration::from_millis(5000))
    .workers(cpu_count);

    warn!("Starting server at http://{}", bind_address);
    let server = server
        .bind(&bind_address)
        .with_context(|| format!("Failed to bind {}", bind_address))?
        .run();
    let server_handle = server.handle();

    tokio::select! {
        res = server => {
            res.context("HTTP server exited with an error")?;
        }
        _ = lifetime::shutdown::listen_for_shutdown(startup.reconciler.clone()) => {
            server_handle.stop(true).await;
            warn!("Graceful shutdown: server stopped");
        }
    }

    // 服务器自行退出时也要停止清扫任务
    if let Some(reconciler) = &startup.reconciler {
        reconciler.stop();
    }

    Ok(())
}
