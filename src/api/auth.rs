//! Bearer token extractor

use std::sync::Arc;

use actix_web::{FromRequest, HttpRequest, dev::Payload, http::header, web};
use futures_util::future::{Ready, ready};
use tracing::{error, info};

use super::jwt::PrincipalResolver;
use crate::errors::LinktrailError;

/// 所有认证失败统一返回的消息
const UNAUTHORIZED_MESSAGE: &str = "Unauthorized: invalid or missing token";

/// 已认证的调用者
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedOwner(pub i64);

impl AuthenticatedOwner {
    pub fn id(&self) -> i64 {
        self.0
    }
}

/// 从 Authorization header 提取 Bearer token
fn extract_bearer_token(req: &HttpRequest) -> Option<&str> {
    req.headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

fn authenticate(req: &HttpRequest) -> Result<AuthenticatedOwner, LinktrailError> {
    let Some(resolver) = req.app_data::<web::Data<Arc<dyn PrincipalResolver>>>() else {
        error!("PrincipalResolver is not registered as app data");
        return Err(LinktrailError::service_unavailable(
            "authentication service not available",
        ));
    };

    let Some(token) = extract_bearer_token(req) else {
        info!("Request without bearer token rejected: {}", req.path());
        return Err(LinktrailError::unauthorized(UNAUTHORIZED_MESSAGE));
    };

    match resolver.resolve(token) {
        Ok(owner_id) => Ok(AuthenticatedOwner(owner_id)),
        Err(e) => {
            info!("Bearer token validation failed: {}", e);
            Err(LinktrailError::unauthorized(UNAUTHORIZED_MESSAGE))
        }
    }
}

impl FromRequest for AuthenticatedOwner {
    type Error = LinktrailError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(authenticate(req))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    struct FixedResolver;

    impl PrincipalResolver for FixedResolver {
        fn resolve(&self, token: &str) -> crate::errors::Result<i64> {
            match token {
                "good" => Ok(9),
                _ => Err(LinktrailError::unauthorized("bad signature")),
            }
        }
    }

    fn data() -> web::Data<Arc<dyn PrincipalResolver>> {
        web::Data::new(Arc::new(FixedResolver) as Arc<dyn PrincipalResolver>)
    }

    #[test]
    fn test_valid_token() {
        let req = TestRequest::default()
            .app_data(data())
            .insert_header(("Authorization", "Bearer good"))
            .to_http_request();
        assert_eq!(authenticate(&req).unwrap(), AuthenticatedOwner(9));
    }

    #[test]
    fn test_failures_share_one_message() {
        let missing = TestRequest::default().app_data(data()).to_http_request();
        let wrong_scheme = TestRequest::default()
            .app_data(data())
            .insert_header(("Authorization", "Basic good"))
            .to_http_request();
        let bad = TestRequest::default()
            .app_data(data())
            .insert_header(("Authorization", "Bearer nope"))
            .to_http_request();

        for req in [missing, wrong_scheme, bad] {
            match authenticate(&req) {
                Err(LinktrailError::Unauthorized(msg)) => assert_eq!(msg, UNAUTHORIZED_MESSAGE),
                other => panic!("expected Unauthorized, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_missing_resolver() {
        let req = TestRequest::default()
            .insert_header(("Authorization", "Bearer good"))
            .to_http_request();
        assert!(matches!(
            authenticate(&req),
            Err(LinktrailError::ServiceUnavailable(_))
        ));
    }
}
