use std::net::SocketAddr;
use std::time::Duration;

use reqwest::{Client, Response, StatusCode};

use ensure_login::config::Config;
use ensure_login::gate::GateSettings;

/// A running test server instance.
pub struct TestApp {
    pub addr: SocketAddr,
    pub client: Client,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// GET `path`, optionally inside an existing session.
    pub async fn get(&self, path: &str, session: Option<&str>) -> Response {
        let mut req = self.client.get(self.url(path));
        if let Some(cookie) = session {
            req = req.header("cookie", cookie);
        }
        req.send().await.expect("get request failed")
    }

    /// GET `path` the way a script-driven client would.
    pub async fn get_xhr(&self, path: &str) -> Response {
        self.client
            .get(self.url(path))
            .header("x-requested-with", "XMLHttpRequest")
            .send()
            .await
            .expect("xhr request failed")
    }

    /// Submit the sign-in form, optionally inside an existing session.
    pub async fn sign_in(&self, path: &str, session: Option<&str>, username: &str) -> Response {
        let mut req = self.client.post(self.url(path));
        if let Some(cookie) = session {
            req = req.header("cookie", cookie);
        }
        req.form(&[("username", username)])
            .send()
            .await
            .expect("sign in request failed")
    }

    pub async fn sign_out(&self, session: &str) -> StatusCode {
        self.client
            .post(self.url("/logout"))
            .header("cookie", session)
            .send()
            .await
            .expect("sign out request failed")
            .status()
    }
}

pub fn location(resp: &Response) -> Option<String> {
    resp.headers()
        .get("location")
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_string())
}

/// The `sid=...` pair from a response's `Set-Cookie`, ready for a `Cookie` header.
pub fn session_cookie(resp: &Response) -> Option<String> {
    resp.headers()
        .get_all("set-cookie")
        .iter()
        .filter_map(|v| v.to_str().ok())
        .filter_map(|v| v.split(';').next())
        .find(|pair| pair.starts_with("sid="))
        .map(|pair| pair.to_string())
}

/// Gate at `/app` redirecting to `/signin`, protecting `/app` and `/sub`.
pub fn test_config() -> Config {
    Config {
        host: "127.0.0.1".parse().unwrap(),
        port: 0, // unused, we bind to random port
        gate: GateSettings::new().redirect_to("/signin").base_url("/app"),
        protected_mounts: vec!["/app".to_string(), "/sub".to_string()],
        secure_cookies: false,
        session_idle: Duration::from_secs(3600),
        log_level: "warn".to_string(),
    }
}

pub async fn spawn_app() -> TestApp {
    spawn_app_with(test_config()).await
}

pub async fn spawn_app_with(config: Config) -> TestApp {
    let (app, _state) = ensure_login::build_app(config).expect("Failed to build app");

    // Bind to random port
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind to random port");
    let addr = listener.local_addr().unwrap();

    // Spawn server in background
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Server failed");
    });

    let client = Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap();

    TestApp { addr, client }
}
