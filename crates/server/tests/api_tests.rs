//! End-to-end tests of the HTTP surface.
//!
//! The authorization server admin API is mocked with wiremock and users live
//! in an in-memory SQLite database.

mod common;

use std::sync::Arc;

use axum::http::StatusCode;
use axum_test::TestServer;
use common::{create_user_db, seed_toky};
use identity_gate::api::{AppState, router};
use identity_gate::challenge::HydraClient;
use identity_gate::config::{AppConfig, ConsentConfig, HydraConfig};
use identity_gate::flows::Flows;
use identity_gate::identity::DbUserStore;
use serde_json::{Value, json};
use wiremock::matchers::{any, body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const FORM: &str = "application/x-www-form-urlencoded";

fn test_config(hydra: &MockServer) -> AppConfig {
    AppConfig {
        database_url: "sqlite::memory:".into(),
        listen_addr: "127.0.0.1:0".into(),
        hydra: HydraConfig {
            admin_url: hydra.uri(),
            timeout_secs: 5,
        },
        login: Default::default(),
        consent: ConsentConfig::default(),
        pages: Default::default(),
    }
}

async fn test_server_with(hydra: &MockServer, config: AppConfig) -> TestServer {
    let store = Arc::new(DbUserStore::new(create_user_db().await));
    seed_toky(&store).await;
    let gateway = Arc::new(HydraClient::new(&config.hydra).expect("hydra client"));

    let state = AppState {
        flows: Flows::new(gateway, store.clone(), store, &config),
        pages: Arc::new(config.pages.clone()),
    };
    TestServer::new(router(state)).expect("create test server")
}

async fn test_server(hydra: &MockServer) -> TestServer {
    test_server_with(hydra, test_config(hydra)).await
}

async fn mock_read(hydra: &MockServer, kind: &str, challenge: &str, body: Value) {
    Mock::given(method("GET"))
        .and(path(format!("/oauth2/auth/requests/{kind}")))
        .and(query_param(format!("{kind}_challenge"), challenge))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .expect(1)
        .mount(hydra)
        .await;
}

fn redirect_to(url: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({ "redirect_to": url }))
}

fn toky_claims(roles: &[&str]) -> Value {
    json!({
        "email": "toky@example.com",
        "username": "toky",
        "last_name": "Tokyo",
        "roles": roles
    })
}

// =============================================================================
// Request validation
// =============================================================================

#[tokio::test]
async fn missing_challenge_is_rejected_without_upstream_calls() {
    let hydra = MockServer::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&hydra)
        .await;
    let server = test_server(&hydra).await;

    for route in ["/login", "/consent", "/logout"] {
        let response = server.get(route).await;
        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_eq!(body["error"], "invalid_request");
    }
}

#[tokio::test]
async fn repeated_challenge_is_rejected() {
    let hydra = MockServer::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&hydra)
        .await;
    let server = test_server(&hydra).await;

    let response = server
        .get("/login?login_challenge=a&login_challenge=b")
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn repeated_form_challenge_is_rejected_without_upstream_calls() {
    let hydra = MockServer::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&hydra)
        .await;
    let server = test_server(&hydra).await;

    for (route, body) in [
        ("/consent", "challenge=a&challenge=b&subject=toky&client_id=portal&scope=openid"),
        ("/login", "challenge=a&challenge=b&username=toky&password=pwd"),
        ("/logout", "challenge=a&challenge=b&accept=true"),
    ] {
        let response = server.post(route).bytes(body.into()).content_type(FORM).await;
        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_eq!(body["error"], "invalid_request");
    }
}

#[tokio::test]
async fn empty_form_challenge_is_rejected() {
    let hydra = MockServer::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&hydra)
        .await;
    let server = test_server(&hydra).await;

    let response = server
        .post("/logout")
        .bytes("challenge=&accept=true".into())
        .content_type(FORM)
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

// =============================================================================
// Login
// =============================================================================

#[tokio::test]
async fn login_skip_redirects_with_long_remember() {
    let hydra = MockServer::start().await;
    mock_read(&hydra, "login", "x", json!({ "skip": true, "subject": "toky" })).await;
    Mock::given(method("PUT"))
        .and(path("/oauth2/auth/requests/login/accept"))
        .and(query_param("login_challenge", "x"))
        .and(body_json(json!({ "subject": "toky", "remember": true, "remember_for": 3600 })))
        .respond_with(redirect_to("https://auth.example/continue"))
        .expect(1)
        .mount(&hydra)
        .await;
    let server = test_server(&hydra).await;

    let response = server.get("/login").add_query_param("login_challenge", "x").await;
    response.assert_status(StatusCode::FOUND);
    assert_eq!(response.header("location"), "https://auth.example/continue");
}

#[tokio::test]
async fn login_without_skip_renders_form() {
    let hydra = MockServer::start().await;
    mock_read(&hydra, "login", "x", json!({ "skip": false, "subject": "" })).await;
    let server = test_server(&hydra).await;

    let response = server.get("/login").add_query_param("login_challenge", "x").await;
    response.assert_status_ok();
    let html = response.text();
    assert!(html.contains(r#"name="challenge" value="x""#));
    assert!(html.contains(r#"name="password""#));
}

#[tokio::test]
async fn login_with_valid_credentials_accepts() {
    let hydra = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/oauth2/auth/requests/login/accept"))
        .and(query_param("login_challenge", "x"))
        .and(body_json(json!({ "subject": "toky", "remember": true, "remember_for": 20 })))
        .respond_with(redirect_to("/next"))
        .expect(1)
        .mount(&hydra)
        .await;
    let server = test_server(&hydra).await;

    let response = server
        .post("/login")
        .bytes("challenge=x&username=toky&password=pwd".into())
        .content_type(FORM)
        .await;
    response.assert_status(StatusCode::FOUND);
    assert_eq!(response.header("location"), "/next");
}

#[tokio::test]
async fn login_with_wrong_password_rerenders_with_403() {
    let hydra = MockServer::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&hydra)
        .await;
    let server = test_server(&hydra).await;

    for body in [
        "challenge=x&username=toky&password=nope",
        "challenge=x&username=ghost&password=pwd",
    ] {
        let response = server.post("/login").bytes(body.into()).content_type(FORM).await;
        response.assert_status(StatusCode::FORBIDDEN);
        let html = response.text();
        assert!(html.contains("Invalid username or password"));
        assert!(html.contains(r#"name="challenge" value="x""#));
    }
}

#[tokio::test]
async fn unknown_challenge_maps_to_bad_gateway() {
    let hydra = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/oauth2/auth/requests/login"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "error": "Not Found" })))
        .expect(1)
        .mount(&hydra)
        .await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&hydra)
        .await;
    let server = test_server(&hydra).await;

    let response = server.get("/login?login_challenge=stale").await;
    response.assert_status(StatusCode::BAD_GATEWAY);
    let body: Value = response.json();
    assert_eq!(body["error"], "bad_gateway");
    assert!(!body["error_description"].as_str().unwrap_or_default().contains("Not Found"));
}

// =============================================================================
// Consent
// =============================================================================

#[tokio::test]
async fn consent_skip_grants_requested_access_with_client_roles() {
    let hydra = MockServer::start().await;
    mock_read(
        &hydra,
        "consent",
        "c-1",
        json!({
            "skip": true,
            "subject": "toky",
            "client": { "client_id": "portal", "client_name": "Portal" },
            "requested_scope": ["openid", "profile"],
            "requested_access_token_audience": ["api"]
        }),
    )
    .await;
    Mock::given(method("PUT"))
        .and(path("/oauth2/auth/requests/consent/accept"))
        .and(query_param("consent_challenge", "c-1"))
        .and(body_json(json!({
            "grant_scope": ["openid", "profile"],
            "grant_access_token_audience": ["api"],
            "remember": true,
            "remember_for": 0,
            "session": {
                "access_token": toky_claims(&["admin", "editor"]),
                "id_token": toky_claims(&["admin", "editor"])
            }
        })))
        .respond_with(redirect_to("/consented"))
        .expect(1)
        .mount(&hydra)
        .await;
    let server = test_server(&hydra).await;

    let response = server.get("/consent?consent_challenge=c-1").await;
    response.assert_status(StatusCode::FOUND);
    assert_eq!(response.header("location"), "/consented");
}

#[tokio::test]
async fn consent_without_skip_renders_requested_entries() {
    let hydra = MockServer::start().await;
    mock_read(
        &hydra,
        "consent",
        "c-1",
        json!({
            "skip": false,
            "subject": "toky",
            "client": { "client_id": "portal", "client_name": "" },
            "requested_scope": ["openid"],
            "requested_access_token_audience": ["api"]
        }),
    )
    .await;
    let server = test_server(&hydra).await;

    let response = server.get("/consent?consent_challenge=c-1").await;
    response.assert_status_ok();
    let html = response.text();
    assert!(html.contains("portal wants to access your account"));
    assert!(html.contains(r#"name="scope" value="openid""#));
    assert!(html.contains(r#"name="audience" value="api""#));
    assert!(html.contains(r#"name="subject" value="toky""#));
}

#[tokio::test]
async fn consent_for_unknown_user_fails_without_accepting() {
    let hydra = MockServer::start().await;
    mock_read(
        &hydra,
        "consent",
        "c-1",
        json!({
            "skip": true,
            "subject": "ghost",
            "client": { "client_id": "portal" },
            "requested_scope": ["openid"]
        }),
    )
    .await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&hydra)
        .await;
    let server = test_server(&hydra).await;

    let response = server.get("/consent?consent_challenge=c-1").await;
    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn consent_submission_grants_ticked_entries() {
    let hydra = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/oauth2/auth/requests/consent/accept"))
        .and(query_param("consent_challenge", "c-1"))
        .and(body_json(json!({
            "grant_scope": ["openid", "email"],
            "grant_access_token_audience": [],
            "remember": true,
            "remember_for": 0,
            "session": {
                "access_token": toky_claims(&["reader"]),
                "id_token": toky_claims(&["reader"])
            }
        })))
        .respond_with(redirect_to("/granted"))
        .expect(1)
        .mount(&hydra)
        .await;
    let server = test_server(&hydra).await;

    let response = server
        .post("/consent")
        .bytes(
            "challenge=c-1&scope=openid&scope=email&subject=toky%40example.com&client_id=wiki&action=approve"
                .into(),
        )
        .content_type(FORM)
        .await;
    response.assert_status(StatusCode::FOUND);
    assert_eq!(response.header("location"), "/granted");
}

#[tokio::test]
async fn restricted_consent_drops_unrequested_entries() {
    let hydra = MockServer::start().await;
    mock_read(
        &hydra,
        "consent",
        "c-1",
        json!({
            "skip": false,
            "subject": "toky",
            "client": { "client_id": "portal" },
            "requested_scope": ["openid", "profile"],
            "requested_access_token_audience": ["api"]
        }),
    )
    .await;
    Mock::given(method("PUT"))
        .and(path("/oauth2/auth/requests/consent/accept"))
        .and(body_json(json!({
            "grant_scope": ["openid"],
            "grant_access_token_audience": ["api"],
            "remember": true,
            "remember_for": 0,
            "session": {
                "access_token": toky_claims(&["admin", "editor"]),
                "id_token": toky_claims(&["admin", "editor"])
            }
        })))
        .respond_with(redirect_to("/granted"))
        .expect(1)
        .mount(&hydra)
        .await;
    let mut config = test_config(&hydra);
    config.consent.restrict_to_requested = true;
    let server = test_server_with(&hydra, config).await;

    let response = server
        .post("/consent")
        .bytes(
            "challenge=c-1&scope=admin%3Aall&scope=openid&audience=api&audience=other&subject=toky&client_id=portal"
                .into(),
        )
        .content_type(FORM)
        .await;
    response.assert_status(StatusCode::FOUND);
}

#[tokio::test]
async fn consent_denial_rejects_with_access_denied() {
    let hydra = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/oauth2/auth/requests/consent/reject"))
        .and(query_param("consent_challenge", "c-1"))
        .respond_with(redirect_to("/denied"))
        .expect(1)
        .mount(&hydra)
        .await;
    Mock::given(method("PUT"))
        .and(path("/oauth2/auth/requests/consent/accept"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&hydra)
        .await;
    let server = test_server(&hydra).await;

    let response = server
        .post("/consent")
        .bytes("challenge=c-1&scope=openid&subject=toky&client_id=portal&action=deny".into())
        .content_type(FORM)
        .await;
    response.assert_status(StatusCode::FOUND);
    assert_eq!(response.header("location"), "/denied");

    let requests = hydra.received_requests().await.unwrap_or_default();
    let reject: Value = requests
        .iter()
        .find(|r| r.url.path().ends_with("/reject"))
        .map(|r| serde_json::from_slice(&r.body).expect("json body"))
        .expect("reject request");
    assert_eq!(reject["error"], "access_denied");
}

// =============================================================================
// Logout
// =============================================================================

#[tokio::test]
async fn logout_not_rp_initiated_accepts_immediately() {
    let hydra = MockServer::start().await;
    mock_read(&hydra, "logout", "bye", json!({ "subject": "toky", "rp_initiated": false })).await;
    Mock::given(method("PUT"))
        .and(path("/oauth2/auth/requests/logout/accept"))
        .and(query_param("logout_challenge", "bye"))
        .respond_with(redirect_to("/logged-out"))
        .expect(1)
        .mount(&hydra)
        .await;
    let server = test_server(&hydra).await;

    let response = server.get("/logout?logout_challenge=bye").await;
    response.assert_status(StatusCode::FOUND);
    assert_eq!(response.header("location"), "/logged-out");
}

#[tokio::test]
async fn logout_rp_initiated_asks_then_honours_the_answer() {
    let hydra = MockServer::start().await;
    mock_read(&hydra, "logout", "bye", json!({ "subject": "toky", "rp_initiated": true })).await;
    Mock::given(method("PUT"))
        .and(path("/oauth2/auth/requests/logout/reject"))
        .and(query_param("logout_challenge", "bye"))
        .respond_with(redirect_to("/still-here"))
        .expect(1)
        .mount(&hydra)
        .await;
    Mock::given(method("PUT"))
        .and(path("/oauth2/auth/requests/logout/accept"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&hydra)
        .await;
    let server = test_server(&hydra).await;

    let response = server.get("/logout?logout_challenge=bye").await;
    response.assert_status_ok();
    assert!(response.text().contains(r#"name="accept" value="true""#));

    let response = server
        .post("/logout")
        .bytes("challenge=bye&accept=false".into())
        .content_type(FORM)
        .await;
    response.assert_status(StatusCode::FOUND);
    assert_eq!(response.header("location"), "/still-here");
}

// =============================================================================
// Miscellaneous
// =============================================================================

#[tokio::test]
async fn health_and_api_docs_are_served() {
    let hydra = MockServer::start().await;
    let server = test_server(&hydra).await;

    let response = server.get("/healthz").await;
    response.assert_status_ok();
    response.assert_text("ok");

    server.get("/api-docs").await.assert_status_ok();
}
