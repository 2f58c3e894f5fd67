//! Access log queries

use actix_web::{Responder, web};
use serde::{Deserialize, Serialize};

use crate::api::AppState;
use crate::errors::{LinktrailError, Result};
use crate::storage::{AccessLogEntry, LogFilter};

/// 查询参数都按字符串接收，非法 limit 回退到默认值而不是 400
#[derive(Debug, Default, Deserialize)]
pub struct LogQuery {
    pub link_id: Option<String>,
    pub user_id: Option<String>,
    pub username: Option<String>,
    pub limit: Option<String>,
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

impl LogQuery {
    fn limit(&self) -> Option<i64> {
        non_empty(&self.limit).and_then(|s| s.parse().ok())
    }

    /// `link_id` 缺省时查询全部
    pub fn link_filter(&self) -> Result<LogFilter> {
        match non_empty(&self.link_id) {
            None => Ok(LogFilter::All),
            Some(raw) => raw
                .parse()
                .map(LogFilter::ByLink)
                .map_err(|_| LinktrailError::invalid_input("Invalid link ID format")),
        }
    }

    /// user_id 优先于 username，两者都缺省时退回 link 过滤
    pub fn user_filter(&self) -> Result<LogFilter> {
        if let Some(raw) = non_empty(&self.user_id) {
            return raw
                .parse()
                .map(LogFilter::ByOwnerId)
                .map_err(|_| LinktrailError::invalid_input("Invalid user ID format"));
        }
        if let Some(username) = non_empty(&self.username) {
            return Ok(LogFilter::ByUsername(username.to_string()));
        }
        self.link_filter()
    }
}

#[derive(Debug, Serialize)]
struct LogsResponse {
    count: usize,
    logs: Vec<AccessLogEntry>,
}

pub struct LogRoutes;

impl LogRoutes {
    pub async fn by_link(
        state: web::Data<AppState>,
        query: web::Query<LogQuery>,
    ) -> Result<impl Responder> {
        let filter = query.link_filter()?;
        Self::respond(&state, &filter, query.limit()).await
    }

    pub async fn by_user(
        state: web::Data<AppState>,
        query: web::Query<LogQuery>,
    ) -> Result<impl Responder> {
        let filter = query.user_filter()?;
        Self::respond(&state, &filter, query.limit()).await
    }

    async fn respond(
        state: &AppState,
        filter: &LogFilter,
        limit: Option<i64>,
    ) -> Result<web::Json<LogsResponse>> {
        let logs = state.access_logs.list(filter, limit).await?;
        Ok(web::Json(LogsResponse {
            count: logs.len(),
            logs,
        }))
    }
}

pub fn log_routes() -> actix_web::Scope {
    web::scope("/logs")
        .route("", web::get().to(LogRoutes::by_link))
        .route("/user", web::get().to(LogRoutes::by_user))
}
