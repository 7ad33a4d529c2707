//! Test helpers for capture-proxy integration tests.
//!
//! Spawns the real application on a random port, pointed at a local fake of
//! the Gemini `generateContent` endpoint that records every call it gets.

#![allow(dead_code)]

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::post,
    Router,
};
use capture_proxy::config::{HttpConfig, ProxyConfig};
use capture_proxy::services::providers::gemini::GeminiConfig;
use capture_proxy::startup::Application;
use service_core::config::{Config, Environment};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;

/// One request as seen by the fake upstream.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    /// Last path segment, e.g. `gemini-2.0-flash:generateContent`.
    pub method: String,
    pub query: HashMap<String, String>,
    pub body: serde_json::Value,
}

#[derive(Clone, Default)]
struct FakeState {
    response: Arc<Mutex<(u16, String)>>,
    calls: Arc<Mutex<Vec<RecordedCall>>>,
}

/// Local stand-in for the Gemini API.
pub struct FakeGemini {
    pub base_url: String,
    state: FakeState,
}

impl FakeGemini {
    /// Start a fake that answers every call with `status` and `body`.
    pub async fn start(status: u16, body: &str) -> Self {
        let state = FakeState::default();
        *state.response.lock().unwrap() = (status, body.to_string());

        let router = Router::new()
            .route("/v1beta/models/:method", post(generate_content))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind fake upstream");
        let port = listener.local_addr().unwrap().port();

        tokio::spawn(async move {
            let _ = axum::serve(listener, router).await;
        });

        Self {
            base_url: format!("http://127.0.0.1:{}/v1beta", port),
            state,
        }
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.state.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.state.calls.lock().unwrap().len()
    }
}

async fn generate_content(
    State(state): State<FakeState>,
    Path(method): Path<String>,
    Query(query): Query<HashMap<String, String>>,
    body: Bytes,
) -> impl IntoResponse {
    state.calls.lock().unwrap().push(RecordedCall {
        method,
        query,
        body: serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null),
    });

    let (status, body) = state.response.lock().unwrap().clone();
    (
        StatusCode::from_u16(status).unwrap(),
        [(header::CONTENT_TYPE, "application/json")],
        body,
    )
}

/// Running proxy instance.
pub struct TestApp {
    pub address: String,
    pub port: u16,
    client: reqwest::Client,
}

impl TestApp {
    /// Spawn the proxy with the given key, forwarding to `upstream_base`.
    pub async fn spawn(api_key: Option<&str>, upstream_base: &str) -> Self {
        Self::spawn_with(api_key, upstream_base, HttpConfig::default()).await
    }

    pub async fn spawn_with(api_key: Option<&str>, upstream_base: &str, http: HttpConfig) -> Self {
        let mut gemini = GeminiConfig::new(api_key.map(str::to_string));
        gemini.base_url = upstream_base.to_string();
        gemini.timeout = Duration::from_secs(5);

        let config = ProxyConfig {
            common: Config {
                port: 0, // Random port
                environment: Environment::Test,
            },
            service_name: "capture-proxy-test".to_string(),
            log_level: "debug".to_string(),
            gemini,
            http,
        };

        let app = Application::build(config)
            .await
            .expect("Failed to build application");
        let port = app.port();

        tokio::spawn(async move {
            let _ = app.run_until_stopped().await;
        });

        Self {
            address: format!("http://127.0.0.1:{}", port),
            port,
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(10))
                .build()
                .unwrap(),
        }
    }

    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }

    pub async fn post_analyze(&self, body: impl Into<reqwest::Body>) -> reqwest::Response {
        self.client
            .post(format!("{}/api/analyze", self.address))
            .header("content-type", "application/json")
            .body(body)
            .send()
            .await
            .expect("Failed to execute request")
    }
}

pub const SUCCESS_BODY: &str = r#"{"candidates":[{"content":{"parts":[{"text":"A red mug on a desk."}],"role":"model"},"finishReason":"STOP"}],"usageMetadata":{"promptTokenCount":270,"candidatesTokenCount":7}}"#;

pub fn analysis_body(prompt: &str, image: &str) -> String {
    serde_json::json!({ "prompt": prompt, "image": image }).to_string()
}
