//! Application startup and lifecycle management.

use crate::config::{HttpConfig, ProxyConfig};
use crate::handlers;
use crate::services::providers::gemini::GeminiVisionProvider;
use crate::services::ImageAnalyzer;
use axum::{
    extract::{DefaultBodyLimit, Request, State},
    http::{header, HeaderName, HeaderValue, Method},
    middleware::{from_fn, from_fn_with_state, Next},
    response::Response,
    routing::{get, post},
    Router,
};
use service_core::error::AppError;
use service_core::middleware::{
    metrics::metrics_middleware, security_headers::security_headers_middleware,
    tracing::{request_id_middleware, REQUEST_ID_HEADER},
};
use service_core::observability::{init_metrics, MetricsHandle};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceExt;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub service_name: String,
    pub analyzer: Arc<dyn ImageAnalyzer>,
    pub metrics: Option<MetricsHandle>,
}

pub fn build_router(state: AppState, http: &HttpConfig) -> Router {
    let analyze_route = Router::new()
        .route(
            "/api/analyze",
            post(handlers::analyze).fallback(handlers::method_not_allowed),
        )
        .layer(DefaultBodyLimit::max(http.body_limit_bytes));

    let app = Router::new()
        .route("/health", get(handlers::health_check))
        .route("/metrics", get(handlers::metrics))
        .merge(analyze_route)
        .with_state(state)
        .layer(from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http().make_span_with(
            |request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get(REQUEST_ID_HEADER)
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri().path(),
                    version = ?request.version(),
                )
            },
        ))
        .layer(from_fn(request_id_middleware))
        .layer(from_fn(security_headers_middleware));

    app.clone()
        .layer(cors_layer(&http.allowed_origins))
        .layer(from_fn_with_state(app, preflight_only))
}

/// `CorsLayer` answers every `OPTIONS` itself. Only requests carrying
/// `Access-Control-Request-Method` are preflights; any other `OPTIONS` is
/// routed without CORS so it gets the route's own 405.
async fn preflight_only(State(routes): State<Router>, request: Request, next: Next) -> Response {
    let bare_options = request.method() == Method::OPTIONS
        && !request
            .headers()
            .contains_key(header::ACCESS_CONTROL_REQUEST_METHOD);

    if !bare_options {
        return next.run(request).await;
    }

    match routes.oneshot(request).await {
        Ok(response) => response,
        Err(never) => match never {},
    }
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origin = if allowed_origins.iter().any(|o| o == "*") {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(allowed_origins.iter().filter_map(|o| {
            o.parse::<HeaderValue>()
                .map_err(|e| tracing::error!("Invalid CORS origin '{}': {}. Skipping.", o, e))
                .ok()
        }))
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            HeaderName::from_static(REQUEST_ID_HEADER),
        ])
        .expose_headers([HeaderName::from_static(REQUEST_ID_HEADER)])
}

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    router: Router,
}

impl Application {
    /// Build the application with the given configuration.
    pub async fn build(config: ProxyConfig) -> Result<Self, AppError> {
        let model = config.gemini.model.clone();
        let provider = GeminiVisionProvider::new(config.gemini).map_err(|e| {
            tracing::error!("Failed to initialize Gemini provider: {}", e);
            AppError::ConfigError(anyhow::Error::new(e))
        })?;

        tracing::info!(model = %model, "Initialized Gemini vision provider");

        let state = AppState {
            service_name: config.service_name,
            analyzer: Arc::new(provider),
            metrics: init_metrics(),
        };

        Self::build_with_state(state, &config.http, config.common.port).await
    }

    /// Bind a listener for an already-assembled state (port 0 = random port for testing).
    pub async fn build_with_state(
        state: AppState,
        http: &HttpConfig,
        port: u16,
    ) -> Result<Self, AppError> {
        let addr = SocketAddr::from(([0, 0, 0, 0], port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind HTTP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!(port, "Capture proxy listening");

        Ok(Self {
            port,
            listener,
            router: build_router(state, http),
        })
    }

    /// Get the port the server is listening on.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Run the application until stopped.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        self.run_with_shutdown(std::future::pending()).await
    }

    /// Run until `shutdown` resolves, letting in-flight requests finish.
    pub async fn run_with_shutdown<F>(self, shutdown: F) -> std::io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| {
                tracing::error!("HTTP server error: {}", e);
                std::io::Error::other(format!("HTTP server error: {}", e))
            })
    }
}
