//! Signup and login endpoints
//!
//! Both issue a bearer token through the injected [`PrincipalResolver`] and
//! share one per-IP rate limiter.

use std::sync::Arc;

use actix_governor::{
    Governor, GovernorConfig, GovernorConfigBuilder, KeyExtractor, SimpleKeyExtractionError,
};
use actix_web::dev::ServiceRequest;
use actix_web::{HttpRequest, HttpResponse, web};
use governor::middleware::NoOpMiddleware;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::api::{AppState, PrincipalResolver};
use crate::config::AuthConfig;
use crate::errors::{LinktrailError, Result};
use crate::services::SignupRequest;
use crate::storage::User;
use crate::utils::ip::extract_client_ip;

/// 按客户端 IP 限流
#[derive(Debug, Clone, Copy)]
pub struct ClientIpKeyExtractor;

impl KeyExtractor for ClientIpKeyExtractor {
    type Key = String;
    type KeyExtractionError = SimpleKeyExtractionError<&'static str>;

    fn extract(
        &self,
        req: &ServiceRequest,
    ) -> std::result::Result<Self::Key, Self::KeyExtractionError> {
        Ok(extract_client_ip(req.request()))
    }
}

pub type AuthRateLimit = GovernorConfig<ClientIpKeyExtractor, NoOpMiddleware>;

/// 构建 /signup 与 /login 共享的限流配置；两个参数都至少为 1
pub fn auth_rate_limit(settings: &AuthConfig) -> Result<AuthRateLimit> {
    let period = settings.rate_limit_period_secs.max(1);
    let burst = settings.rate_limit_burst.max(1);

    let config = GovernorConfigBuilder::default()
        .seconds_per_request(period)
        .burst_size(burst)
        .key_extractor(ClientIpKeyExtractor)
        .finish()
        .ok_or_else(|| LinktrailError::invalid_input("invalid auth rate limit settings"))?;

    debug!("Auth rate limiter: 1 req per {}s, burst {}", period, burst);
    Ok(config)
}

#[derive(Debug, Deserialize)]
pub struct SignupBody {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginBody {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
struct UserSummary {
    id: i64,
    username: String,
    email: String,
}

impl From<User> for UserSummary {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
        }
    }
}

#[derive(Debug, Serialize)]
struct AuthResponse {
    message: &'static str,
    user: UserSummary,
    token: String,
}

fn issue_token(
    principal: &web::Data<Arc<dyn PrincipalResolver>>,
    state: &AppState,
    user: &User,
) -> Result<String> {
    principal.issue(user.id, state.token_ttl)
}

pub struct AccountRoutes;

impl AccountRoutes {
    pub async fn signup(
        req: HttpRequest,
        state: web::Data<AppState>,
        principal: web::Data<Arc<dyn PrincipalResolver>>,
        body: web::Json<SignupBody>,
    ) -> Result<HttpResponse> {
        let body = body.into_inner();
        let user = state
            .accounts
            .signup(SignupRequest {
                username: body.username,
                email: body.email,
                password: body.password,
            })
            .await?;

        let token = issue_token(&principal, &state, &user)?;
        info!("Signup from {}: user {}", extract_client_ip(&req), user.id);

        Ok(HttpResponse::Created().json(AuthResponse {
            message: "User created successfully",
            user: user.into(),
            token,
        }))
    }

    pub async fn login(
        req: HttpRequest,
        state: web::Data<AppState>,
        principal: web::Data<Arc<dyn PrincipalResolver>>,
        body: web::Json<LoginBody>,
    ) -> Result<HttpResponse> {
        let user = state.accounts.login(&body.email, &body.password).await?;

        let token = issue_token(&principal, &state, &user)?;
        debug!("Login from {}: user {}", extract_client_ip(&req), user.id);

        Ok(HttpResponse::Ok().json(AuthResponse {
            message: "Login successful",
            user: user.into(),
            token,
        }))
    }
}

fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(16 * 1024)
        .error_handler(|err, _req| LinktrailError::invalid_input(err.to_string()).into())
}

/// `/signup` 和 `/login` 挂在根路径下，共用同一个限流器
pub fn account_routes(cfg: &mut web::ServiceConfig, limit: &AuthRateLimit) {
    cfg.service(
        web::resource("/signup")
            .app_data(json_config())
            .wrap(Governor::new(limit))
            .route(web::post().to(AccountRoutes::signup)),
    )
    .service(
        web::resource("/login")
            .app_data(json_config())
            .wrap(Governor::new(limit))
            .route(web::post().to(AccountRoutes::login)),
    );
}
