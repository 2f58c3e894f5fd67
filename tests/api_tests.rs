//! HTTP API tests
//!
//! The full route table over a temporary SQLite database, with real HS256
//! tokens.

mod common;

use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::test::{self, TestRequest};
use actix_web::{App, web};
use chrono::{Duration, Utc};
use serde_json::{Value, json};

use linktrail::api::{
    AppState, AuthRateLimit, JwtPrincipal, PrincipalResolver, auth_rate_limit, configure_routes,
};
use linktrail::config::{AuthConfig, StaticConfig};
use linktrail::runtime::lifetime::startup::build_app_state;
use linktrail::services::GeoIpProvider;

use common::{insert_link, insert_user, test_storage};

const SECRET: &str = "api-test-secret-0123456789abcdef";

fn test_state(storage: Arc<linktrail::storage::SeaOrmStorage>) -> AppState {
    let mut config = StaticConfig::default();
    config.server.public_base_url = Some("https://go.test/".to_string());
    build_app_state(storage, &config, GeoIpProvider::disabled())
}

fn bearer(owner_id: i64) -> (&'static str, String) {
    let token = JwtPrincipal::new(SECRET)
        .issue(owner_id, Duration::minutes(10))
        .unwrap();
    ("Authorization", format!("Bearer {}", token))
}

/// 限流给得足够宽，只有专门的用例会触发
fn relaxed_limit() -> AuthRateLimit {
    auth_rate_limit(&AuthConfig {
        rate_limit_burst: 1000,
        ..AuthConfig::default()
    })
    .unwrap()
}

macro_rules! test_app {
    ($state:expr) => {
        test_app!($state, relaxed_limit())
    };
    ($state:expr, $limit:expr) => {{
        let principal: Arc<dyn PrincipalResolver> = Arc::new(JwtPrincipal::new(SECRET));
        let limit: AuthRateLimit = $limit;
        test::init_service(
            App::new()
                .app_data(web::Data::new($state))
                .app_data(web::Data::new(principal))
                .configure(configure_routes(&limit)),
        )
        .await
    }};
}

// =============================================================================
// Authentication
// =============================================================================

#[actix_rt::test]
async fn test_links_require_token() {
    let (storage, _temp) = test_storage().await;
    let app = test_app!(test_state(storage));

    let req = TestRequest::post()
        .uri("/links")
        .set_json(json!({ "target_url": "https://example.com" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], "E004");

    let forged = JwtPrincipal::new("some-other-secret-entirely!!")
        .issue(1, Duration::minutes(10))
        .unwrap();
    let req = TestRequest::get()
        .uri("/links")
        .insert_header(("Authorization", format!("Bearer {}", forged)))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

// =============================================================================
// Create / Redirect
// =============================================================================

#[actix_rt::test]
async fn test_create_then_redirect() {
    let (storage, _temp) = test_storage().await;
    let app = test_app!(test_state(storage.clone()));

    let req = TestRequest::post()
        .uri("/links")
        .insert_header(bearer(1))
        .set_json(json!({
            "target_url": "https://example.com/landing",
            "expires_at": (Utc::now() + Duration::days(1)).to_rfc3339(),
            "click_limit": 2,
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "Link generated successfully");
    let slug = body["slug"].as_str().unwrap().to_string();
    assert_eq!(body["short_url"], format!("https://go.test/l/{}", slug));
    assert_eq!(body["link"]["click_limit"], 2);
    assert_eq!(body["link"]["user_id"], 1);

    let req = TestRequest::get()
        .uri(&format!("/l/{}", slug))
        .insert_header(("User-Agent", "Mozilla/5.0 (Windows NT 10.0; Win64; x64) Firefox/120.0"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(
        resp.headers().get("Location").unwrap(),
        "https://example.com/landing"
    );

    // 第二次点击用完额度
    let req = TestRequest::get().uri(&format!("/l/{}", slug)).to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FOUND);

    let req = TestRequest::get().uri(&format!("/l/{}", slug)).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::GONE);

    assert_eq!(storage.get_link_by_slug(&slug).await.unwrap().click_count, 2);
}

#[actix_rt::test]
async fn test_create_rejects_bad_bodies() {
    let (storage, _temp) = test_storage().await;
    let app = test_app!(test_state(storage));

    let cases = [
        json!({ "target_url": "javascript:alert(1)" }),
        json!({ "target_url": "https://example.com", "click_limit": 0 }),
        json!({ "target_url": "https://example.com", "expires_at": "2001-01-01T00:00:00Z" }),
        json!({ "target_url": "https://example.com", "expires_at": "tomorrow" }),
        json!({ "click_limit": 3 }),
    ];

    for body in cases {
        let req = TestRequest::post()
            .uri("/links")
            .insert_header(bearer(1))
            .set_json(&body)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "body: {}", body);
    }
}

#[actix_rt::test]
async fn test_redirect_not_found_and_expired() {
    let (storage, _temp) = test_storage().await;
    insert_link(&storage, "old00001", 1, Some(Utc::now() - Duration::hours(1)), None).await;
    let app = test_app!(test_state(storage));

    let req = TestRequest::get().uri("/l/missing1").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let req = TestRequest::get().uri("/l/bad%20slug").to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::NOT_FOUND
    );

    let req = TestRequest::get().uri("/l/old00001").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::GONE);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "Link has expired");
}

// =============================================================================
// List / Delete
// =============================================================================

#[actix_rt::test]
async fn test_list_and_delete() {
    let (storage, _temp) = test_storage().await;
    insert_link(&storage, "owner1aa", 1, None, None).await;
    insert_link(&storage, "owner1bb", 1, None, None).await;
    insert_link(&storage, "owner2aa", 2, None, None).await;
    let app = test_app!(test_state(storage));

    let req = TestRequest::get()
        .uri("/links")
        .insert_header(bearer(1))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["count"], 2);
    assert_eq!(body["links"][0]["slug"], "owner1bb");

    let req = TestRequest::delete()
        .uri("/links/owner1aa")
        .insert_header(bearer(2))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::FORBIDDEN
    );

    let req = TestRequest::delete()
        .uri("/links/owner1aa")
        .insert_header(bearer(1))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "Link deleted successfully");
    assert_eq!(body["slug"], "owner1aa");

    let req = TestRequest::delete()
        .uri("/links/owner1aa")
        .insert_header(bearer(1))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::NOT_FOUND
    );

    let req = TestRequest::get().uri("/l/owner1aa").to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::NOT_FOUND
    );
}

// =============================================================================
// Access logs / Health
// =============================================================================

#[actix_rt::test]
async fn test_access_log_endpoints() {
    let (storage, _temp) = test_storage().await;
    let alice = insert_user(&storage, "alice").await;
    let link = insert_link(&storage, "alicelnk", alice, None, None).await;
    insert_link(&storage, "otherlnk", alice + 100, None, None).await;
    let app = test_app!(test_state(storage));

    for slug in ["alicelnk", "alicelnk", "otherlnk"] {
        let req = TestRequest::get()
            .uri(&format!("/l/{}", slug))
            .insert_header(("X-Forwarded-For", "198.51.100.20"))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FOUND);
    }

    let req = TestRequest::get()
        .uri(&format!("/logs?link_id={}", link.id))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["count"], 2);
    assert_eq!(body["logs"][0]["ip_address"], "198.51.100.20");

    let req = TestRequest::get().uri("/logs?limit=1").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["count"], 1);

    let req = TestRequest::get().uri("/logs?limit=500").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["count"], 3);

    let req = TestRequest::get()
        .uri("/logs/user?username=alice")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["count"], 2);

    let req = TestRequest::get()
        .uri(&format!("/logs/user?user_id={}", alice))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["count"], 2);

    let req = TestRequest::get()
        .uri("/logs/user?user_id=abc")
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::BAD_REQUEST
    );
}

// =============================================================================
// Accounts
// =============================================================================

fn signup_body(username: &str, email: &str) -> Value {
    json!({ "username": username, "email": email, "password": "Sup3rSecret" })
}

#[actix_rt::test]
async fn test_signup_login_then_create_link() {
    let (storage, _temp) = test_storage().await;
    let app = test_app!(test_state(storage));

    let req = TestRequest::post()
        .uri("/signup")
        .set_json(signup_body(" carol ", "Carol@Example.com"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "User created successfully");
    assert_eq!(body["user"]["username"], "carol");
    assert_eq!(body["user"]["email"], "carol@example.com");
    assert!(body["user"].get("password_hash").is_none());
    let user_id = body["user"]["id"].as_i64().unwrap();

    let req = TestRequest::post()
        .uri("/login")
        .set_json(json!({ "email": "CAROL@example.com", "password": "Sup3rSecret" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "Login successful");
    let token = body["token"].as_str().unwrap().to_string();

    let req = TestRequest::post()
        .uri("/links")
        .insert_header(("Authorization", format!("Bearer {}", token)))
        .set_json(json!({ "target_url": "https://example.com/carol" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["link"]["user_id"], user_id);
    let slug = body["slug"].as_str().unwrap().to_string();

    // 注册后的用户名可以用来查询访问日志
    let req = TestRequest::get().uri(&format!("/l/{}", slug)).to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FOUND);

    let req = TestRequest::get()
        .uri("/logs/user?username=carol")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["count"], 1);
}

#[actix_rt::test]
async fn test_signup_rejections() {
    let (storage, _temp) = test_storage().await;
    let app = test_app!(test_state(storage));

    let req = TestRequest::post()
        .uri("/signup")
        .set_json(signup_body("dave", "dave@example.com"))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);

    let duplicates = [
        signup_body("dave2", "DAVE@example.com"),
        signup_body("dave", "other@example.com"),
    ];
    for body in duplicates {
        let req = TestRequest::post()
            .uri("/signup")
            .set_json(&body)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CONFLICT, "body: {}", body);
    }

    let invalid = [
        json!({ "username": "ed", "email": "ed@example.com", "password": "Sup3rSecret" }),
        json!({ "username": "eddie", "email": "not-an-email", "password": "Sup3rSecret" }),
        json!({ "username": "eddie", "email": "ed@example.com", "password": "weakpass" }),
        json!({ "username": "eddie", "email": "ed@example.com" }),
    ];
    for body in invalid {
        let req = TestRequest::post()
            .uri("/signup")
            .set_json(&body)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "body: {}", body);
    }
}

#[actix_rt::test]
async fn test_login_failures_are_indistinguishable() {
    let (storage, _temp) = test_storage().await;
    let app = test_app!(test_state(storage));

    let req = TestRequest::post()
        .uri("/signup")
        .set_json(signup_body("frank", "frank@example.com"))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);

    let attempts = [
        json!({ "email": "frank@example.com", "password": "WrongPass1" }),
        json!({ "email": "nobody@example.com", "password": "Sup3rSecret" }),
    ];
    let mut messages = Vec::new();
    for body in attempts {
        let req = TestRequest::post()
            .uri("/login")
            .set_json(&body)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        let body: Value = test::read_body_json(resp).await;
        messages.push(body["message"].clone());
    }
    assert_eq!(messages[0], messages[1]);
    assert_eq!(messages[0], "Invalid email or password");
}

#[actix_rt::test]
async fn test_auth_endpoints_rate_limited() {
    let (storage, _temp) = test_storage().await;
    let limit = auth_rate_limit(&AuthConfig {
        rate_limit_period_secs: 60,
        rate_limit_burst: 2,
        ..AuthConfig::default()
    })
    .unwrap();
    let app = test_app!(test_state(storage), limit);

    let login = || {
        TestRequest::post()
            .uri("/login")
            .insert_header(("X-Forwarded-For", "198.51.100.77"))
            .set_json(json!({ "email": "x@example.com", "password": "Whatever1" }))
            .to_request()
    };

    for _ in 0..2 {
        let resp = test::call_service(&app, login()).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }
    let resp = test::call_service(&app, login()).await;
    assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);

    // 其他客户端不受影响，重定向等接口也不限流
    let req = TestRequest::post()
        .uri("/login")
        .insert_header(("X-Forwarded-For", "198.51.100.78"))
        .set_json(json!({ "email": "x@example.com", "password": "Whatever1" }))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::UNAUTHORIZED
    );
}

#[actix_rt::test]
async fn test_health() {
    let (storage, _temp) = test_storage().await;
    let app = test_app!(test_state(storage));

    let req = TestRequest::get().uri("/health").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["storage"]["backend"], "sqlite");
}
