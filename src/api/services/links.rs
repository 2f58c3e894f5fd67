//! Owner link management endpoints

use actix_web::{HttpRequest, HttpResponse, Responder, web};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, trace};

use crate::api::{AppState, AuthenticatedOwner};
use crate::errors::{LinktrailError, Result};
use crate::services::CreateLinkRequest;
use crate::storage::Link;

#[derive(Debug, Deserialize)]
pub struct CreateLinkBody {
    pub target_url: String,
    /// RFC 3339
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub click_limit: Option<i64>,
}

#[derive(Debug, Serialize)]
struct CreatedResponse {
    message: &'static str,
    slug: String,
    short_url: String,
    link: Link,
}

#[derive(Debug, Serialize)]
struct ListResponse {
    message: &'static str,
    count: usize,
    links: Vec<Link>,
}

#[derive(Debug, Serialize)]
struct DeletedResponse<'a> {
    message: &'static str,
    slug: &'a str,
}

/// `{base}/l/{slug}`，base 未配置时从请求推导
pub fn build_short_url(public_base_url: Option<&str>, req: &HttpRequest, slug: &str) -> String {
    match public_base_url {
        Some(base) => format!("{}/l/{}", base.trim_end_matches('/'), slug),
        None => {
            let conn = req.connection_info();
            format!("{}://{}/l/{}", conn.scheme(), conn.host(), slug)
        }
    }
}

pub struct LinkRoutes;

impl LinkRoutes {
    pub async fn create(
        req: HttpRequest,
        owner: AuthenticatedOwner,
        state: web::Data<AppState>,
        body: web::Json<CreateLinkBody>,
    ) -> Result<HttpResponse> {
        let body = body.into_inner();
        trace!("Create link request from owner {}: {}", owner.id(), body.target_url);

        let link = state
            .links
            .create_link(CreateLinkRequest {
                target_url: body.target_url,
                expires_at: body.expires_at,
                click_limit: body.click_limit,
                owner_id: owner.id(),
            })
            .await?;

        let short_url = build_short_url(state.public_base_url.as_deref(), &req, &link.slug);
        info!("Link {} created: {}", link.slug, short_url);

        Ok(HttpResponse::Created().json(CreatedResponse {
            message: "Link generated successfully",
            slug: link.slug.clone(),
            short_url,
            link,
        }))
    }

    pub async fn list(
        owner: AuthenticatedOwner,
        state: web::Data<AppState>,
    ) -> Result<impl Responder> {
        let links = state.links.list_links(owner.id()).await?;
        Ok(web::Json(ListResponse {
            message: "Links retrieved successfully",
            count: links.len(),
            links,
        }))
    }

    pub async fn delete(
        owner: AuthenticatedOwner,
        state: web::Data<AppState>,
        path: web::Path<String>,
    ) -> Result<HttpResponse> {
        let slug = path.into_inner();
        state.links.delete_link(&slug, owner.id()).await?;
        info!("Link {} deleted by owner {}", slug, owner.id());

        Ok(HttpResponse::Ok().json(DeletedResponse {
            message: "Link deleted successfully",
            slug: &slug,
        }))
    }
}

pub fn link_routes() -> actix_web::Scope {
    let json_config = web::JsonConfig::default()
        .limit(64 * 1024)
        .error_handler(|err, _req| LinktrailError::invalid_input(err.to_string()).into());

    web::scope("/links")
        .app_data(json_config)
        .route("", web::post().to(LinkRoutes::create))
        .route("", web::get().to(LinkRoutes::list))
        .route("/{slug}", web::delete().to(LinkRoutes::delete))
}
