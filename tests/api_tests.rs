mod common;

use reqwest::StatusCode;

use ensure_login::config::Config;
use ensure_login::error::ConfigError;
use ensure_login::gate::GateSettings;

use common::{location, session_cookie};

// ── Health ──────────────────────────────────────────────────────

#[tokio::test]
async fn health_returns_ok() {
    let app = common::spawn_app().await;

    let resp = app.get("/health", None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()["x-frame-options"], "DENY");
    assert_eq!(resp.headers()["x-content-type-options"], "nosniff");
    assert_eq!(resp.text().await.unwrap(), "ok");
}

#[tokio::test]
async fn health_checks_do_not_create_sessions() {
    let app = common::spawn_app().await;

    for _ in 0..5 {
        let resp = app.get("/health", None).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(resp.headers().get("set-cookie").is_none());
    }
}

// ── Gate ────────────────────────────────────────────────────────

#[tokio::test]
async fn anonymous_request_is_redirected_and_resumed_after_sign_in() {
    let app = common::spawn_app().await;

    let resp = app.get("/app/foo", None).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp).as_deref(), Some("signin"));
    let pre_login = session_cookie(&resp).expect("session cookie issued");

    let resp = app.sign_in("/app/signin", Some(&pre_login), "alice").await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp).as_deref(), Some("/app/foo"));
    let session = session_cookie(&resp).expect("session cookie reissued");

    let resp = app.get("/app/foo", Some(&session)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = resp.text().await.unwrap();
    assert!(body.contains("alice"), "unexpected body: {body}");
    assert!(body.contains("/app/foo"), "unexpected body: {body}");
}

#[tokio::test]
async fn query_string_is_remembered() {
    let app = common::spawn_app().await;

    let resp = app.get("/app/reports?page=2", None).await;
    assert_eq!(location(&resp).as_deref(), Some("signin"));
    let session = session_cookie(&resp).unwrap();

    let resp = app.sign_in("/app/signin", Some(&session), "alice").await;
    assert_eq!(location(&resp).as_deref(), Some("/app/reports?page=2"));
}

#[tokio::test]
async fn request_from_other_mount_walks_up_into_gate_mount() {
    let app = common::spawn_app().await;

    let resp = app.get("/sub/foo", None).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp).as_deref(), Some("../app/signin"));
    let session = session_cookie(&resp).unwrap();

    let resp = app.sign_in("/app/signin", Some(&session), "bob").await;
    assert_eq!(location(&resp).as_deref(), Some("/sub/foo"));
}

#[tokio::test]
async fn resource_request_is_not_remembered() {
    let app = common::spawn_app().await;

    let resp = app.get("/app/foo.png", None).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp).as_deref(), Some("signin"));
    assert_eq!(session_cookie(&resp), None);

    let resp = app.sign_in("/app/signin", None, "alice").await;
    assert_eq!(location(&resp).as_deref(), Some("/"));
}

#[tokio::test]
async fn xhr_request_is_not_remembered_by_default() {
    let app = common::spawn_app().await;

    let resp = app.get_xhr("/app/foo").await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp).as_deref(), Some("signin"));
    assert_eq!(session_cookie(&resp), None);
}

#[tokio::test]
async fn xhr_request_is_remembered_when_enabled() {
    let mut config = common::test_config();
    config.gate = config.gate.set_return_when_xhr(true);
    let app = common::spawn_app_with(config).await;

    let resp = app.get_xhr("/app/foo").await;
    let session = session_cookie(&resp).unwrap();

    let resp = app.sign_in("/app/signin", Some(&session), "alice").await;
    assert_eq!(location(&resp).as_deref(), Some("/app/foo"));
}

#[tokio::test]
async fn default_gate_redirects_to_login() {
    let config = Config {
        gate: GateSettings::new(),
        protected_mounts: vec!["/app".to_string()],
        ..common::test_config()
    };
    let app = common::spawn_app_with(config).await;

    let resp = app.get("/app/foo", None).await;
    assert_eq!(location(&resp).as_deref(), Some("/login"));

    let resp = app.get("/login", None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.headers().get("set-cookie").is_none());
    assert!(resp.text().await.unwrap().contains("<form"));
}

// ── Sign in / out ───────────────────────────────────────────────

#[tokio::test]
async fn sign_in_requires_username() {
    let app = common::spawn_app().await;

    let resp = app.get("/app/foo", None).await;
    let session = session_cookie(&resp).unwrap();

    let resp = app.sign_in("/app/signin", Some(&session), "   ").await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = app.get("/app/foo", Some(&session)).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn sign_in_issues_a_new_session_id() {
    let app = common::spawn_app().await;

    let resp = app.get("/app/foo", None).await;
    let pre_login = session_cookie(&resp).unwrap();

    let resp = app.sign_in("/app/signin", Some(&pre_login), "alice").await;
    let session = session_cookie(&resp).expect("session cookie reissued");
    assert_ne!(session, pre_login);

    assert_eq!(app.get("/app/foo", Some(&session)).await.status(), StatusCode::OK);

    // Whoever planted the pre-login id gets nothing from it.
    let resp = app.get("/app/foo", Some(&pre_login)).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp).as_deref(), Some("signin"));
}

#[tokio::test]
async fn sign_in_without_prior_session_starts_one() {
    let app = common::spawn_app().await;

    let resp = app.sign_in("/app/signin", None, "alice").await;
    assert_eq!(location(&resp).as_deref(), Some("/"));
    let session = session_cookie(&resp).expect("session cookie issued");

    assert_eq!(app.get("/app/foo", Some(&session)).await.status(), StatusCode::OK);
}

#[tokio::test]
async fn remembered_path_is_consumed_by_sign_in() {
    let app = common::spawn_app().await;

    let resp = app.get("/app/foo", None).await;
    let session = session_cookie(&resp).unwrap();

    let resp = app.sign_in("/app/signin", Some(&session), "alice").await;
    assert_eq!(location(&resp).as_deref(), Some("/app/foo"));
    let session = session_cookie(&resp).unwrap();

    let resp = app.sign_in("/app/signin", Some(&session), "alice").await;
    assert_eq!(location(&resp).as_deref(), Some("/"));
}

#[tokio::test]
async fn sign_out_ends_the_session() {
    let app = common::spawn_app().await;

    let resp = app.sign_in("/app/signin", None, "alice").await;
    let session = session_cookie(&resp).unwrap();

    assert_eq!(app.get("/app/foo", Some(&session)).await.status(), StatusCode::OK);

    assert_eq!(app.sign_out(&session).await, StatusCode::SEE_OTHER);

    let resp = app.get("/app/foo", Some(&session)).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    let fresh = session_cookie(&resp).expect("a new session is issued");
    assert_ne!(fresh, session);
}

#[tokio::test]
async fn unknown_session_cookie_gets_a_fresh_session() {
    let app = common::spawn_app().await;

    let resp = app.get("/app/foo", Some("sid=forged")).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    let session = session_cookie(&resp).unwrap();
    assert_ne!(session, "sid=forged");
}

// ── Setup errors ────────────────────────────────────────────────

#[test]
fn build_app_rejects_root_mount() {
    let config = Config {
        protected_mounts: vec!["/".to_string()],
        ..common::test_config()
    };

    assert!(matches!(
        ensure_login::build_app(config),
        Err(ConfigError::InvalidMount(_))
    ));
}

#[test]
fn build_app_rejects_unsendable_redirect_target() {
    let config = Config {
        gate: GateSettings::new().redirect_to("/sign\nin"),
        ..common::test_config()
    };

    assert!(matches!(
        ensure_login::build_app(config),
        Err(ConfigError::InvalidRedirectTarget(_))
    ));
}
