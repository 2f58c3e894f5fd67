//! HTTP surface
//!
//! Thin actix-web transport over the service layer. Handlers only parse
//! requests and shape responses.

pub mod auth;
pub mod jwt;
pub mod services;

use std::sync::Arc;

use actix_web::{HttpResponse, web};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::errors::LinktrailError;
use crate::services::{AccessLogger, AccountService, LinkResolver, LinkService};
use crate::storage::SeaOrmStorage;

pub use auth::AuthenticatedOwner;
pub use jwt::{JwtPrincipal, PrincipalResolver};
pub use services::{AuthRateLimit, auth_rate_limit};

/// 请求处理所需的共享组件
#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<SeaOrmStorage>,
    pub links: Arc<LinkService>,
    pub resolver: Arc<LinkResolver>,
    pub access_logs: Arc<AccessLogger>,
    pub accounts: Arc<AccountService>,
    /// /signup 与 /login 签发的令牌有效期
    pub token_ttl: chrono::Duration,
    /// 例如 https://go.example.com，末尾不带 `/`
    pub public_base_url: Option<String>,
    pub started_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    code: &'a str,
    error: &'a str,
    message: &'a str,
}

/// LinktrailError → JSON 错误响应
pub fn error_response(err: &LinktrailError) -> HttpResponse {
    HttpResponse::build(err.http_status()).json(ErrorBody {
        code: err.code(),
        error: err.error_type(),
        message: err.message(),
    })
}

/// 注册全部路由，server 与测试共用
///
/// 调用方需提供 `web::Data<AppState>` 和 `web::Data<Arc<dyn PrincipalResolver>>`。
pub fn configure_routes(limit: &AuthRateLimit) -> impl FnOnce(&mut web::ServiceConfig) + '_ {
    move |cfg| {
        cfg.service(services::health_routes())
            .service(services::redirect_routes())
            .service(services::link_routes())
            .service(services::log_routes());
        services::account_routes(cfg, limit);
    }
}
