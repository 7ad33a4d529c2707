//! Mock provider implementation for testing.

use super::{ImageAnalyzer, ProviderError};
use crate::dtos::AnalysisRequest;
use async_trait::async_trait;
use axum::body::Bytes;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Canned outcome returned by [`MockImageAnalyzer::analyze`].
#[derive(Debug, Clone)]
pub enum MockOutcome {
    Success(String),
    ApiError { status: u16, message: String },
    NetworkError(String),
}

/// Mock analyzer that counts calls instead of talking to a model.
pub struct MockImageAnalyzer {
    configured: bool,
    outcome: MockOutcome,
    calls: AtomicUsize,
}

impl MockImageAnalyzer {
    pub fn new(outcome: MockOutcome) -> Self {
        Self {
            configured: true,
            outcome,
            calls: AtomicUsize::new(0),
        }
    }

    /// Behaves like a provider whose credential is missing.
    pub fn unconfigured() -> Self {
        Self {
            configured: false,
            outcome: MockOutcome::Success("{}".to_string()),
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of `analyze` calls that got past the configuration check.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ImageAnalyzer for MockImageAnalyzer {
    fn ensure_configured(&self) -> Result<(), ProviderError> {
        if self.configured {
            Ok(())
        } else {
            Err(ProviderError::NotConfigured(
                "Mock analyzer not configured".to_string(),
            ))
        }
    }

    async fn analyze(&self, _request: &AnalysisRequest) -> Result<Bytes, ProviderError> {
        self.ensure_configured()?;
        self.calls.fetch_add(1, Ordering::SeqCst);

        match &self.outcome {
            MockOutcome::Success(body) => Ok(Bytes::from(body.clone())),
            MockOutcome::ApiError { status, message } => Err(ProviderError::Api {
                status: *status,
                message: message.clone(),
            }),
            MockOutcome::NetworkError(msg) => Err(ProviderError::Network(msg.clone())),
        }
    }

    async fn health_check(&self) -> Result<(), ProviderError> {
        self.ensure_configured()
    }
}
