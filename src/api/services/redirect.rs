use actix_web::http::header;
use actix_web::{HttpRequest, HttpResponse, web};
use tracing::{debug, trace};

use crate::api::AppState;
use crate::errors::{LinktrailError, Result};
use crate::services::VisitContext;
use crate::services::slug::is_valid_slug;
use crate::utils::ip::extract_client_ip;

fn header_string(req: &HttpRequest, name: header::HeaderName) -> String {
    req.headers()
        .get(name)
        .and_then(|h| h.to_str().ok())
        .map(String::from)
        .unwrap_or_default()
}

/// 同步阶段：只提取原始字符串
pub fn visit_from_request(req: &HttpRequest) -> VisitContext {
    VisitContext {
        ip_address: extract_client_ip(req),
        user_agent: header_string(req, header::USER_AGENT),
        referer: header_string(req, header::REFERER),
    }
}

pub struct RedirectService;

impl RedirectService {
    pub async fn handle_redirect(
        req: HttpRequest,
        path: web::Path<String>,
        state: web::Data<AppState>,
    ) -> Result<HttpResponse> {
        let slug = path.into_inner();

        // 非法 slug 不查库
        if !is_valid_slug(&slug) {
            trace!("Invalid slug rejected: {}", slug);
            return Err(LinktrailError::not_found("Link not found"));
        }

        let link = state
            .resolver
            .resolve(&slug, visit_from_request(&req))
            .await
            .inspect_err(|e| debug!("Redirect for {} refused: {}", slug, e))?;

        Ok(HttpResponse::Found()
            .insert_header((header::LOCATION, link.target_url))
            .finish())
    }
}

pub fn redirect_routes() -> actix_web::Scope {
    web::scope("/l").route("/{slug}", web::get().to(RedirectService::handle_redirect))
}
