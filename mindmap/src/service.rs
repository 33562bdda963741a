//! Generate-and-persist service.
//!
//! [`MindMapService`] validates a request, asks the generator for a
//! structure, stores the result and hands back the record. Failures are
//! mapped to a generic user-facing error; internal detail goes to the log.

#[cfg(feature = "openai")]
use crate::config::{AppConfig, ConfigError};
#[cfg(feature = "openai")]
use crate::store::InMemoryStore;
use crate::store::{MindMapStore, StoreError};
use mindmap_core::{MindMap, MindMapId, MindMapSettings, NewMindMap};
use mindmap_providers::{GenerateError, MindMapGenerator};
#[cfg(feature = "openai")]
use mindmap_providers::OpenAIGenerator;
use mindmap_retries::{CancellationToken, FailureKind};
#[cfg(feature = "openai")]
use mindmap_retries::{ReqwestTransport, ResilientCaller};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, info_span, Instrument};

/// Generic error label shown to users when generation fails.
pub const GENERATION_FAILED: &str = "Failed to generate mind map";

/// A request to generate a mind map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateRequest {
    /// Title for the record.
    pub title: String,
    /// Source text.
    pub content: String,
    /// Display settings; defaults apply when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<MindMapSettings>,
}

impl GenerateRequest {
    /// Create a request with default settings.
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            settings: None,
        }
    }

    /// Set explicit settings.
    #[must_use]
    pub fn with_settings(mut self, settings: MindMapSettings) -> Self {
        self.settings = Some(settings);
        self
    }

    /// Check required fields.
    pub fn validate(&self) -> Result<(), ServiceError> {
        if self.title.trim().is_empty() {
            return Err(ServiceError::Validation {
                field: "title",
                message: "The title field is required.".to_string(),
            });
        }
        if self.content.trim().is_empty() {
            return Err(ServiceError::Validation {
                field: "content",
                message: "The content field is required.".to_string(),
            });
        }
        Ok(())
    }
}

/// Service errors.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The request is missing required input.
    #[error("Invalid {field}: {message}")]
    Validation {
        /// Offending field.
        field: &'static str,
        /// Message for the user.
        message: String,
    },

    /// The generator failed.
    #[error("Generation failed: {0}")]
    Generation(#[from] GenerateError),

    /// The store failed.
    #[error("Store failed: {0}")]
    Store(#[from] StoreError),

    /// No record with this id.
    #[error("Mind map not found: {0}")]
    NotFound(MindMapId),
}

impl ServiceError {
    /// Short label for the `error` field of a response.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "Invalid request",
            Self::Generation(_) | Self::Store(_) => GENERATION_FAILED,
            Self::NotFound(_) => "Mind map not found",
        }
    }

    /// Human-readable message safe to show to users.
    ///
    /// Never includes upstream bodies, attempt counts or transport detail.
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation { message, .. } => message.clone(),
            Self::Generation(err) => describe_failure(err.kind()).to_string(),
            Self::Store(_) => "The mind map could not be saved.".to_string(),
            Self::NotFound(id) => format!("No mind map with id {}.", id),
        }
    }

    /// Upstream failure kind, for generation errors.
    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            Self::Generation(err) => Some(err.kind()),
            _ => None,
        }
    }
}

fn describe_failure(kind: FailureKind) -> &'static str {
    match kind {
        FailureKind::TransientTransport => {
            "Could not reach the AI provider. Please try again later."
        }
        FailureKind::TransientServer => {
            "The AI provider is temporarily unavailable. Please try again later."
        }
        FailureKind::PermanentClient => "The AI provider rejected the request.",
        FailureKind::MalformedResponse => "The AI provider returned an invalid mind map.",
        FailureKind::InvalidRequest => "The request to the AI provider could not be prepared.",
        FailureKind::Cancelled => "The request was cancelled.",
        FailureKind::DeadlineExceeded => "Generating the mind map took too long.",
    }
}

/// Generates mind maps and stores them.
#[derive(Clone)]
pub struct MindMapService {
    generator: Arc<dyn MindMapGenerator>,
    store: Arc<dyn MindMapStore>,
}

impl std::fmt::Debug for MindMapService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MindMapService")
            .field("generator", &self.generator.name())
            .finish_non_exhaustive()
    }
}

impl MindMapService {
    /// Create a service.
    pub fn new(generator: Arc<dyn MindMapGenerator>, store: Arc<dyn MindMapStore>) -> Self {
        Self { generator, store }
    }

    /// Wire the OpenAI generator and an in-memory store from configuration.
    #[cfg(feature = "openai")]
    pub fn from_config(config: &AppConfig) -> Result<Self, ConfigError> {
        let transport = ReqwestTransport::new(&config.http)?;
        let generator = OpenAIGenerator::new(config.provider.clone(), ResilientCaller::new(transport))?
            .with_policy(config.retry.clone());
        Ok(Self::new(Arc::new(generator), Arc::new(InMemoryStore::new())))
    }

    /// The backing store.
    pub fn store(&self) -> &Arc<dyn MindMapStore> {
        &self.store
    }

    /// Generate and store a mind map.
    pub async fn generate(&self, request: GenerateRequest) -> Result<MindMap, ServiceError> {
        self.generate_cancellable(request, &CancellationToken::new())
            .await
    }

    /// Generate and store a mind map, stopping early if `cancel` fires.
    pub async fn generate_cancellable(
        &self,
        request: GenerateRequest,
        cancel: &CancellationToken,
    ) -> Result<MindMap, ServiceError> {
        request.validate()?;

        let span = info_span!("generate_mind_map", generator = %self.generator.name());
        self.run(request, cancel).instrument(span).await
    }

    async fn run(
        &self,
        request: GenerateRequest,
        cancel: &CancellationToken,
    ) -> Result<MindMap, ServiceError> {
        info!(
            title = %request.title,
            content_length = request.content.len(),
            "Generating mind map"
        );

        let settings = request.settings.unwrap_or_default();
        let generation = match self
            .generator
            .generate(&request.content, &settings, cancel)
            .await
        {
            Ok(generation) => generation,
            Err(err) => {
                error!(
                    kind = %err.kind(),
                    attempts = err.attempts(),
                    error = %err,
                    "Mind map generation failed"
                );
                return Err(err.into());
            }
        };

        let new = NewMindMap::new(request.title, request.content, generation.structure)
            .with_settings(settings);
        let record = self.store.create(new).await.map_err(|err| {
            error!(error = %err, "Failed to store mind map");
            ServiceError::from(err)
        })?;

        info!(
            id = %record.id,
            attempts = generation.attempts,
            nodes = record.structure.nodes.len(),
            "Mind map stored"
        );
        Ok(record)
    }

    /// Fetch a stored mind map.
    pub async fn show(&self, id: MindMapId) -> Result<MindMap, ServiceError> {
        self.store
            .get(id)
            .await?
            .ok_or(ServiceError::NotFound(id))
    }
}
