mod common;

use std::net::{IpAddr, Ipv4Addr};

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use common::{memory_pool, read_json_body};
use house_finder::config::{
    AppConfig, AppEnvironment, DatabaseConfig, ListingConfig, ModelConfig, NotifierConfig,
    ServerConfig, SessionConfig, TelemetryConfig,
};
use house_finder::estimate::PriceEstimator;
use house_finder::HouseFinder;
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;

fn test_config() -> AppConfig {
    AppConfig {
        environment: AppEnvironment::Test,
        server: ServerConfig {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST).to_string(),
            port: 0,
        },
        telemetry: TelemetryConfig {
            log_level: "debug".to_string(),
        },
        database: DatabaseConfig::in_memory(),
        listings: ListingConfig::default(),
        notifier: NotifierConfig::default(),
        sessions: SessionConfig::default(),
        model: ModelConfig::default(),
    }
}

async fn app() -> Router {
    let pool = memory_pool().await;
    HouseFinder::new(
        pool,
        &test_config(),
        PriceEstimator::default(),
        CancellationToken::new(),
    )
    .router()
}

fn json_request(method: Method, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder
        .body(Body::from(body.to_string()))
        .expect("valid request")
}

fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(Method::GET).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::empty()).expect("valid request")
}

fn listing_body() -> Value {
    json!({
        "price": 200000.0,
        "bedrooms": 3,
        "year_built": 2015,
        "garage_cars": 2,
        "lot_area": 6000,
        "overall_qual": 7,
        "duration_days": 7
    })
}

async fn login(app: &Router, username: &str) -> String {
    let response = app
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/v1/users/register",
            None,
            json!({ "username": username, "password": "hunter22" }),
        ))
        .await
        .expect("register response");
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/v1/users/login",
            None,
            json!({ "username": username, "password": "hunter22" }),
        ))
        .await
        .expect("login response");
    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    payload["token"]
        .as_str()
        .expect("token string")
        .to_string()
}

#[tokio::test]
async fn listing_flow_over_http() {
    let app = app().await;

    let response = app
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/v1/listings",
            None,
            listing_body(),
        ))
        .await
        .expect("create response");
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = read_json_body(response).await;
    let id = created["id"].as_i64().expect("listing id");
    assert_eq!(created["interest_count"], 0);
    assert!(created["owner"].is_null());

    let response = app
        .clone()
        .oneshot(get(
            "/api/v1/listings/search?max_price=250000&bedrooms=3&min_year=2000&garage_cars=2&min_lot_area=5000&min_quality=5",
            None,
        ))
        .await
        .expect("search response");
    assert_eq!(response.status(), StatusCode::OK);
    let found = read_json_body(response).await;
    assert_eq!(found.as_array().map(Vec::len), Some(1));
    assert_eq!(found[0]["id"].as_i64(), Some(id));

    for expected in 1..=3 {
        let response = app
            .clone()
            .oneshot(json_request(
                Method::POST,
                &format!("/api/v1/listings/{id}/interest"),
                None,
                json!({}),
            ))
            .await
            .expect("interest response");
        assert_eq!(response.status(), StatusCode::OK);
        let receipt = read_json_body(response).await;
        assert_eq!(receipt["interest_count"].as_u64(), Some(expected));
    }

    let response = app
        .clone()
        .oneshot(get("/api/v1/listings/markers?garage_cars=2", None))
        .await
        .expect("markers response");
    let markers = read_json_body(response).await;
    assert_eq!(markers[0]["lat"].as_f64(), Some(42.0347));

    let response = app
        .clone()
        .oneshot(get("/api/v1/listings/announcements", None))
        .await
        .expect("announcements response");
    assert_eq!(response.status(), StatusCode::OK);
    let announcements = read_json_body(response).await;
    assert_eq!(announcements[0]["listing"]["interest_count"], 3);
}

#[tokio::test]
async fn unknown_listing_and_bad_draft_statuses() {
    let app = app().await;

    let response = app
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/v1/listings/999/interest",
            None,
            json!({}),
        ))
        .await
        .expect("interest response");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .clone()
        .oneshot(get("/api/v1/listings/999", None))
        .await
        .expect("fetch response");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let mut body = listing_body();
    body["overall_qual"] = json!(0);
    let response = app
        .clone()
        .oneshot(json_request(Method::POST, "/api/v1/listings", None, body))
        .await
        .expect("create response");
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn registration_conflicts_and_login_failures() {
    let app = app().await;
    let _token = login(&app, "dilnoza").await;

    let response = app
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/v1/users/register",
            None,
            json!({ "username": "dilnoza", "password": "different" }),
        ))
        .await
        .expect("register response");
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = app
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/v1/users/login",
            None,
            json!({ "username": "dilnoza", "password": "different" }),
        ))
        .await
        .expect("login response");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn sessions_own_listings_and_expose_notifications() {
    let app = app().await;
    let token = login(&app, "seller").await;

    let response = app
        .clone()
        .oneshot(get("/api/v1/session", Some(&token)))
        .await
        .expect("whoami response");
    assert_eq!(response.status(), StatusCode::OK);
    let session = read_json_body(response).await;
    assert_eq!(session["user"]["username"], "seller");
    let user_id = session["user"]["id"].as_i64().expect("user id");

    let response = app
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/v1/listings",
            Some(&token),
            listing_body(),
        ))
        .await
        .expect("create response");
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = read_json_body(response).await;
    assert_eq!(created["owner"].as_i64(), Some(user_id));

    let response = app
        .clone()
        .oneshot(get("/api/v1/session/notifications", Some(&token)))
        .await
        .expect("notifications response");
    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert!(payload.get("notification").is_some());

    let response = app
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/v1/users/logout",
            Some(&token),
            json!({}),
        ))
        .await
        .expect("logout response");
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .clone()
        .oneshot(get("/api/v1/session", Some(&token)))
        .await
        .expect("whoami response");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // A stale token cannot be used to attribute a listing.
    let response = app
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/v1/listings",
            Some(&token),
            listing_body(),
        ))
        .await
        .expect("create response");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn estimate_endpoint_uses_baseline_model() {
    let app = app().await;
    let response = app
        .oneshot(json_request(
            Method::POST,
            "/api/v1/estimate",
            None,
            json!({
                "living_area": 1500,
                "bedrooms": 3,
                "year_built": 2000,
                "garage_cars": 2,
                "lot_area": 9000,
                "overall_qual": 6
            }),
        ))
        .await
        .expect("estimate response");
    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["estimated_price"].as_f64(), Some(217_900.0));
    assert_eq!(payload["model"], "baseline");
}

#[tokio::test]
async fn announcements_as_of_far_future_excludes_everything() {
    let app = app().await;
    let response = app
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/v1/listings",
            None,
            listing_body(),
        ))
        .await
        .expect("create response");
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .oneshot(get(
            "/api/v1/listings/announcements?as_of=%2B10000-01-01T00:00:00Z",
            None,
        ))
        .await
        .expect("announcements response");
    assert_eq!(response.status(), StatusCode::OK);
    let announcements = read_json_body(response).await;
    assert_eq!(announcements.as_array().map(Vec::len), Some(0));
}
