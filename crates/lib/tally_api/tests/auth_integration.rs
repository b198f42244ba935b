//! Integration tests — build the router over an in-memory store and drive
//! the register / login / protected-route flows end to end.

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE, COOKIE, SET_COOKIE};
use axum::http::{Method, Request, StatusCode};
use chrono::{Duration, Utc};
use serde_json::{Value, json};
use tally_api::AppState;
use tally_api::config::ApiConfig;
use tally_core::auth::{AuthConfig, PasswordHasher, SigningSecret, TokenIssuer};
use tally_core::models::auth::UserId;
use tally_core::store::{CredentialStore, MemoryUserStore};
use tower::ServiceExt;

const SECRET: &str = "integration-secret";

struct TestApp {
    router: Router,
    store: Arc<MemoryUserStore>,
    auth: AuthConfig,
}

fn test_app() -> TestApp {
    let auth = AuthConfig::new(SigningSecret::new(SECRET).unwrap());
    let store = Arc::new(MemoryUserStore::new());
    let state = AppState::new(ApiConfig::new(auth.clone()), store.clone())
        .with_hasher(PasswordHasher::with_cost(4));
    TestApp {
        router: tally_api::router(state),
        store,
        auth,
    }
}

struct TestResponse {
    status: StatusCode,
    body: Value,
    set_cookie: Option<String>,
}

async fn send(app: &TestApp, req: Request<Body>) -> TestResponse {
    let resp = app.router.clone().oneshot(req).await.expect("request");
    let status = resp.status();
    let set_cookie = resp
        .headers()
        .get(SET_COOKIE)
        .map(|v| v.to_str().unwrap().to_string());
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("read body");
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("parse JSON")
    };
    TestResponse {
        status,
        body,
        set_cookie,
    }
}

fn json_request(method: Method, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn authed(method: Method, uri: &str, uid: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("Uid", uid)
        .header(AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap()
}

async fn register(app: &TestApp, email: &str, password: &str, phone: &str) -> TestResponse {
    send(
        app,
        json_request(
            Method::POST,
            "/register",
            json!({ "email": email, "name": "Test", "password": password, "phone": phone }),
        ),
    )
    .await
}

async fn login(app: &TestApp, email: &str, password: &str) -> TestResponse {
    send(
        app,
        json_request(
            Method::POST,
            "/login",
            json!({ "email": email, "password": password }),
        ),
    )
    .await
}

/// Register and log in, returning (uid, token).
async fn signed_in(app: &TestApp, email: &str, phone: &str) -> (String, String) {
    assert_eq!(register(app, email, "secret1", phone).await.status, StatusCode::OK);
    let resp = login(app, email, "secret1").await;
    assert_eq!(resp.status, StatusCode::OK);
    (
        resp.body["user"]["id"].to_string(),
        resp.body["token"].as_str().unwrap().to_string(),
    )
}

#[tokio::test]
async fn root_reports_service() {
    let app = test_app();
    let resp = send(
        &app,
        Request::builder().uri("/").body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["message"], "tally-backend");
}

#[tokio::test]
async fn register_then_login() {
    let app = test_app();

    let resp = register(&app, "a@x.com", "secret1", "1").await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["message"], "User created");

    let resp = login(&app, "a@x.com", "secret1").await;
    assert_eq!(resp.status, StatusCode::OK);
    let token = resp.body["token"].as_str().unwrap();
    assert!(!token.is_empty());
    assert_eq!(resp.body["user"]["email"], "a@x.com");
    assert!(resp.body["user"].get("password_hash").is_none());
    assert!(resp.body["user"].get("password").is_none());

    let cookie = resp.set_cookie.expect("auth cookie set");
    assert!(cookie.starts_with(&format!("Authorization={token}")));
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("SameSite=Lax"));
    assert!(cookie.contains("Max-Age=2592000"));
}

#[tokio::test]
async fn login_failures_are_indistinguishable() {
    let app = test_app();
    register(&app, "a@x.com", "secret1", "1").await;

    let wrong_password = login(&app, "a@x.com", "wrong").await;
    let unknown_email = login(&app, "nobody@x.com", "secret1").await;

    for resp in [&wrong_password, &unknown_email] {
        assert_eq!(resp.status, StatusCode::BAD_REQUEST);
        assert_eq!(resp.body["message"], "Invalid email or password");
        assert!(resp.set_cookie.is_none());
    }
    assert_eq!(wrong_password.body, unknown_email.body);
}

#[tokio::test]
async fn register_rejects_duplicates_and_bad_bodies() {
    let app = test_app();
    assert_eq!(register(&app, "a@x.com", "secret1", "1").await.status, StatusCode::OK);

    let dup_email = register(&app, "a@x.com", "secret2", "2").await;
    assert_eq!(dup_email.status, StatusCode::BAD_REQUEST);
    let dup_phone = register(&app, "b@x.com", "secret2", "1").await;
    assert_eq!(dup_phone.status, StatusCode::BAD_REQUEST);

    let bad = send(
        &app,
        Request::builder()
            .method(Method::POST)
            .uri("/register")
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap(),
    )
    .await;
    assert_eq!(bad.status, StatusCode::BAD_REQUEST);
    assert_eq!(bad.body["message"], "Failed to read body");

    let overlong = register(&app, "c@x.com", &"x".repeat(100), "3").await;
    assert_eq!(overlong.status, StatusCode::BAD_REQUEST);
    assert_eq!(overlong.body["message"], "Failed to hash password");
}

#[tokio::test]
async fn register_accepts_capitalized_fields() {
    let app = test_app();
    let resp = send(
        &app,
        json_request(
            Method::POST,
            "/register",
            json!({ "Email": "a@x.com", "Name": "A", "Password": "secret1", "Phone": "1" }),
        ),
    )
    .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(login(&app, "a@x.com", "secret1").await.status, StatusCode::OK);
}

#[tokio::test]
async fn validate_token_returns_identity() {
    let app = test_app();
    let (uid, token) = signed_in(&app, "a@x.com", "1").await;

    let resp = send(&app, authed(Method::GET, "/validate-token", &uid, &token)).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["message"]["email"], "a@x.com");
    assert_eq!(resp.body["message"]["id"].to_string(), uid);
}

#[tokio::test]
async fn raw_authorization_header_and_cookie_are_accepted() {
    let app = test_app();
    let (uid, token) = signed_in(&app, "a@x.com", "1").await;

    let raw = Request::builder()
        .uri("/validate-token")
        .header("Uid", &uid)
        .header(AUTHORIZATION, &token)
        .body(Body::empty())
        .unwrap();
    assert_eq!(send(&app, raw).await.status, StatusCode::OK);

    let cookie = Request::builder()
        .uri("/validate-token")
        .header("Uid", &uid)
        .header(COOKIE, format!("Authorization={token}"))
        .body(Body::empty())
        .unwrap();
    assert_eq!(send(&app, cookie).await.status, StatusCode::OK);
}

#[tokio::test]
async fn identity_header_failures() {
    let app = test_app();
    let (_, token) = signed_in(&app, "a@x.com", "1").await;

    let missing = Request::builder()
        .uri("/validate-token")
        .header(AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    let resp = send(&app, missing).await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(resp.body["error"], "missing_identity_header");

    let resp = send(&app, authed(Method::GET, "/validate-token", "abc", &token)).await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(resp.body["error"], "malformed_identity_header");

    // Valid token, but the identity header names nobody.
    let resp = send(&app, authed(Method::GET, "/validate-token", "7", &token)).await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(resp.body["error"], "unknown_identity");
    assert_eq!(resp.body["message"], "Can't find this user");
}

#[tokio::test]
async fn token_failures() {
    let app = test_app();
    let (uid, token) = signed_in(&app, "a@x.com", "1").await;

    let no_token = Request::builder()
        .uri("/validate-token")
        .header("Uid", &uid)
        .body(Body::empty())
        .unwrap();
    let resp = send(&app, no_token).await;
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
    assert_eq!(resp.body["error"], "missing_token");

    let resp = send(&app, authed(Method::GET, "/validate-token", &uid, "garbage")).await;
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
    assert_eq!(resp.body["error"], "malformed_token");

    let (message, signature) = token.rsplit_once('.').unwrap();
    let mut sig: Vec<char> = signature.chars().collect();
    let mid = sig.len() / 2;
    sig[mid] = if sig[mid] == 'A' { 'B' } else { 'A' };
    let tampered = format!("{message}.{}", sig.into_iter().collect::<String>());
    let forged = format!("{message}.{}", "A".repeat(43));
    for bad in [tampered, forged] {
        let resp = send(&app, authed(Method::GET, "/validate-token", &uid, &bad)).await;
        assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
        assert_eq!(resp.body["error"], "invalid_signature");
    }

    let issuer = TokenIssuer::new(&app.auth);
    let uid_num = UserId(uid.parse().unwrap());
    let expired = issuer
        .issue_at(uid_num, Utc::now() - Duration::days(31))
        .unwrap();
    let resp = send(
        &app,
        authed(Method::GET, "/validate-token", &uid, &expired.token),
    )
    .await;
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
    assert_eq!(resp.body["error"], "token_expired");
}

#[tokio::test]
async fn deleted_subject_invalidates_token() {
    let app = test_app();
    let (a_uid, a_token) = signed_in(&app, "a@x.com", "1").await;
    let (b_uid, _) = signed_in(&app, "b@x.com", "2").await;

    // A deletes their own account.
    let resp = send(
        &app,
        authed(
            Method::DELETE,
            &format!("/delete-user/{a_uid}"),
            &a_uid,
            &a_token,
        ),
    )
    .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["message"], "User deleted");

    // With B's uid the identity gate passes, and A's token now names nobody.
    let resp = send(&app, authed(Method::GET, "/validate-token", &b_uid, &a_token)).await;
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
    assert_eq!(resp.body["error"], "subject_not_found");
}

#[tokio::test]
async fn delete_other_user_is_forbidden() {
    let app = test_app();
    let (a_uid, a_token) = signed_in(&app, "a@x.com", "1").await;
    let (b_uid, _) = signed_in(&app, "b@x.com", "2").await;

    let resp = send(
        &app,
        authed(
            Method::DELETE,
            &format!("/delete-user/{b_uid}"),
            &a_uid,
            &a_token,
        ),
    )
    .await;
    assert_eq!(resp.status, StatusCode::FORBIDDEN);
    let b = UserId(b_uid.parse().unwrap());
    assert!(app.store.exists(b).await.unwrap());
}

#[tokio::test]
async fn get_user_lookup() {
    let app = test_app();
    let (uid, token) = signed_in(&app, "a@x.com", "1").await;

    let resp = send(
        &app,
        authed(Method::GET, &format!("/get-user/{uid}"), &uid, &token),
    )
    .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["user"]["email"], "a@x.com");

    let resp = send(&app, authed(Method::GET, "/get-user/999", &uid, &token)).await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);

    let resp = send(&app, authed(Method::GET, "/get-user/abc", &uid, &token)).await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(resp.body["message"], "Failed to parse id from param");
}

#[tokio::test]
async fn update_user_rehashes_password_and_keeps_old_tokens() {
    let app = test_app();
    let (uid, token) = signed_in(&app, "a@x.com", "1").await;

    let req = Request::builder()
        .method(Method::PUT)
        .uri("/update-user")
        .header("Uid", &uid)
        .header(AUTHORIZATION, format!("Bearer {token}"))
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(
            json!({ "name": "Renamed", "password": "secret2" }).to_string(),
        ))
        .unwrap();
    let resp = send(&app, req).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["message"], "User data updated");

    assert_eq!(login(&app, "a@x.com", "secret1").await.status, StatusCode::BAD_REQUEST);
    let relogin = login(&app, "a@x.com", "secret2").await;
    assert_eq!(relogin.status, StatusCode::OK);
    assert_eq!(relogin.body["user"]["name"], "Renamed");

    // Tokens issued before the password change remain valid until expiry.
    let resp = send(&app, authed(Method::GET, "/validate-token", &uid, &token)).await;
    assert_eq!(resp.status, StatusCode::OK);
}

#[tokio::test]
async fn update_other_user_is_forbidden() {
    let app = test_app();
    let (uid, token) = signed_in(&app, "a@x.com", "1").await;

    let req = Request::builder()
        .method(Method::PUT)
        .uri("/update-user")
        .header("Uid", &uid)
        .header(AUTHORIZATION, format!("Bearer {token}"))
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(json!({ "id": 999, "name": "X" }).to_string()))
        .unwrap();
    assert_eq!(send(&app, req).await.status, StatusCode::FORBIDDEN);
}
