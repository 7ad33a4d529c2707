//! AI provider abstractions and implementations.
//!
//! Handlers talk to [`ImageAnalyzer`]; the Gemini implementation is the only
//! one used in production, the mock exists for tests.

pub mod gemini;
pub mod mock;

use crate::dtos::AnalysisRequest;
use async_trait::async_trait;
use axum::body::Bytes;
use thiserror::Error;

/// Error type for provider operations.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    /// The upstream API answered with a non-success status.
    #[error("{message}")]
    Api { status: u16, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Network error: {0}")]
    Network(String),
}

/// Sends an image and a prompt to a generative model.
#[async_trait]
pub trait ImageAnalyzer: Send + Sync {
    /// Fails with [`ProviderError::NotConfigured`] when the provider cannot be
    /// called at all. Never performs I/O.
    fn ensure_configured(&self) -> Result<(), ProviderError>;

    /// Run one analysis and return the upstream JSON body untouched.
    async fn analyze(&self, request: &AnalysisRequest) -> Result<Bytes, ProviderError>;

    /// Health check.
    async fn health_check(&self) -> Result<(), ProviderError>;
}
