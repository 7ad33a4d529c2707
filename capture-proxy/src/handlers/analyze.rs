//! `POST /api/analyze`: forward a captured image and prompt to the model.

use crate::dtos::AnalysisRequest;
use crate::services::ProviderError;
use crate::startup::AppState;
use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, State},
    http::{header, Method, StatusCode},
    response::{IntoResponse, Response},
};
use service_core::error::AppError;

/// Relay one analysis to the upstream model.
///
/// Order matters: the credential is checked before the body is looked at, so
/// a missing key is reported the same way whatever the client sent.
pub async fn analyze(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Response, AppError> {
    state.analyzer.ensure_configured().map_err(|e| {
        tracing::error!(error = %e, "Rejecting analysis request: provider not configured");
        provider_error(e)
    })?;

    let body = body.map_err(|rejection| {
        tracing::error!(
            status = %rejection.status(),
            error = %rejection.body_text(),
            "Failed to read request body"
        );
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            AppError::PayloadTooLarge(rejection.body_text())
        } else {
            AppError::InternalError(anyhow::anyhow!(
                "Failed to read request body: {}",
                rejection.body_text()
            ))
        }
    })?;

    let request: AnalysisRequest = serde_json::from_slice(&body).map_err(|e| {
        tracing::error!(error = %e, body_len = body.len(), "Malformed analysis request");
        AppError::InternalError(anyhow::anyhow!("Invalid request body: {}", e))
    })?;

    let result = state.analyzer.analyze(&request).await.map_err(|e| {
        match &e {
            ProviderError::Api { status, message } => tracing::error!(
                upstream_status = status,
                error = %message,
                "Upstream API rejected analysis"
            ),
            _ => tracing::error!(error = %e, "Analysis failed"),
        }
        provider_error(e)
    })?;

    tracing::info!(
        response_len = result.len(),
        prompt_len = request.prompt.len(),
        "Analysis completed"
    );

    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/json")],
        result,
    )
        .into_response())
}

/// Fallback for every method except `POST` on the analysis route.
pub async fn method_not_allowed(method: Method) -> AppError {
    tracing::warn!(%method, "Rejected analysis request with unsupported method");
    AppError::MethodNotAllowed { allow: "POST" }
}

fn provider_error(err: ProviderError) -> AppError {
    match err {
        ProviderError::NotConfigured(msg) => AppError::ConfigError(anyhow::anyhow!(msg)),
        ProviderError::Api { message, .. } => AppError::UpstreamError(message),
        other => AppError::InternalError(anyhow::Error::new(other)),
    }
}
