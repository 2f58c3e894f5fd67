use std::time::{Duration, Instant};

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, Responder, web};
use serde::Serialize;
use tracing::{error, trace};

use crate::api::AppState;

/// 存储探测超时
const PING_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Serialize)]
struct StorageCheck {
    status: &'static str,
    backend: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    timestamp: String,
    uptime: u64,
    storage: StorageCheck,
    response_time_ms: u32,
}

/// Health Service
///
/// 直接调用 storage，不经过业务层。
pub struct HealthService;

impl HealthService {
    pub async fn health_check(state: web::Data<AppState>) -> impl Responder {
        let start_time = Instant::now();
        trace!("Received health check request");

        let backend = state.storage.backend_name().to_string();
        let storage = match tokio::time::timeout(PING_TIMEOUT, state.storage.ping()).await {
            Ok(Ok(())) => StorageCheck {
                status: "healthy",
                backend,
                error: None,
            },
            Ok(Err(e)) => {
                error!("Storage health check failed: {}", e);
                StorageCheck {
                    status: "unhealthy",
                    backend,
                    error: Some(format!("database error: {}", e)),
                }
            }
            Err(_) => {
                error!("Storage health check timeout");
                StorageCheck {
                    status: "unhealthy",
                    backend,
                    error: Some("timeout".to_string()),
                }
            }
        };

        let now = chrono::Utc::now();
        let healthy = storage.error.is_none();
        let body = HealthResponse {
            status: if healthy { "healthy" } else { "unhealthy" },
            timestamp: now.to_rfc3339(),
            uptime: (now - state.started_at).num_seconds().max(0) as u64,
            storage,
            response_time_ms: start_time.elapsed().as_millis() as u32,
        };

        let status = if healthy {
            StatusCode::OK
        } else {
            StatusCode::SERVICE_UNAVAILABLE
        };
        HttpResponse::build(status).json(body)
    }
}

pub fn health_routes() -> actix_web::Scope {
    web::scope("/health")
        .route("", web::get().to(HealthService::health_check))
        .route("", web::head().to(HealthService::health_check))
}
