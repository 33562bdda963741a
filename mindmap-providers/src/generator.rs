//! The generator seam between the service and an upstream model.

use crate::provider::ProviderError;
use async_trait::async_trait;
use mindmap_core::{MindMapSettings, MindMapStructure};
use mindmap_retries::{CallFailure, CancellationToken, FailureKind, RequestError};
use std::time::Duration;
use thiserror::Error;

/// A generated structure plus call metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct Generation {
    /// The validated graph.
    pub structure: MindMapStructure,
    /// Upstream attempts it took.
    pub attempts: u32,
    /// Time spent upstream, backoff included.
    pub elapsed: Duration,
    /// Total tokens reported by the provider.
    pub total_tokens: Option<u64>,
}

/// Why a generation failed.
#[derive(Debug, Error)]
pub enum GenerateError {
    /// Provider is not configured well enough to make a request.
    #[error("Provider configuration error: {0}")]
    Config(#[from] ProviderError),

    /// The outbound request could not be built.
    #[error("Failed to build upstream request: {0}")]
    Request(#[from] RequestError),

    /// The upstream call failed after the retry policy ran its course.
    #[error(transparent)]
    Call(#[from] CallFailure),
}

impl GenerateError {
    /// Failure taxonomy entry for this error.
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Config(_) | Self::Request(_) => FailureKind::InvalidRequest,
            Self::Call(failure) => failure.kind,
        }
    }

    /// Upstream attempts made before failing.
    pub fn attempts(&self) -> u32 {
        match self {
            Self::Call(failure) => failure.attempts,
            _ => 0,
        }
    }
}

/// Produces a mind map structure from free text.
#[async_trait]
pub trait MindMapGenerator: Send + Sync {
    /// Generator name for logs.
    fn name(&self) -> &str;

    /// Generate a structure for `content`.
    ///
    /// Dropping the returned future or cancelling `cancel` stops any
    /// in-flight attempt and pending backoff.
    async fn generate(
        &self,
        content: &str,
        settings: &MindMapSettings,
        cancel: &CancellationToken,
    ) -> Result<Generation, GenerateError>;
}
