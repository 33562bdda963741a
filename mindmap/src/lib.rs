//! # mindmap
//!
//! Turn free text into a mind map with an LLM, store it, and serve it.
//!
//! Generation goes through a resilient upstream caller: transient failures
//! (connection errors, timeouts, 5xx) are retried with exponential backoff,
//! while client errors and malformed replies fail fast. Each request has an
//! overall deadline and stops as soon as the caller goes away.
//!
//! ## Quick Start
//!
//! ```ignore
//! use mindmap::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     mindmap::telemetry::init_tracing(LogFormat::from_env());
//!
//!     let config = AppConfig::from_env()?;
//!     let service = MindMapService::from_config(&config)?;
//!
//!     let record = service
//!         .generate(GenerateRequest::new("Rust", "Ownership, borrowing and lifetimes"))
//!         .await?;
//!     println!("{}", serde_json::to_string_pretty(&record.structure)?);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Description | Default |
//! |---------|-------------|--------|
//! | `openai` | OpenAI chat completions generator | ✅ |
//! | `server` | Axum HTTP surface and `mindmap-server` binary | ❌ |
//! | `full` | All features | ❌ |
//!
//! ## Architecture
//!
//! - [`mindmap_core`] - Graph, settings and record types
//! - [`mindmap_retries`] - Resilient caller, retry policy, transports
//! - [`mindmap_providers`] - Upstream generators
//! - this crate - service, store, configuration, telemetry, HTTP surface

#![warn(missing_docs)]
#![deny(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod config;
pub mod service;
pub mod store;
pub mod telemetry;

#[cfg(feature = "server")]
#[cfg_attr(docsrs, doc(cfg(feature = "server")))]
pub mod server;

// Re-export crates
pub use mindmap_core;
pub use mindmap_providers;
pub use mindmap_retries;

// Re-exports
pub use config::{AppConfig, ConfigError};
pub use service::{GenerateRequest, MindMapService, ServiceError, GENERATION_FAILED};
pub use store::{InMemoryStore, MindMapStore, StoreError};
pub use telemetry::{init_tracing, LogFormat};

pub use mindmap_core::{
    MindMap, MindMapEdge, MindMapId, MindMapNode, MindMapSettings, MindMapStructure,
    MindMapStyle, NewMindMap,
};
pub use mindmap_providers::{GenerateError, Generation, MindMapGenerator, ProviderConfig};
pub use mindmap_retries::{
    CallFailure, CallRequest, CancellationToken, FailureKind, HttpClientConfig, ResilientCaller,
    RetryPolicy,
};

#[cfg(feature = "openai")]
pub use mindmap_providers::OpenAIGenerator;

/// Prelude for common imports.
pub mod prelude {
    pub use crate::{
        AppConfig, CancellationToken, FailureKind, GenerateRequest, LogFormat, MindMap,
        MindMapService, MindMapSettings, MindMapStructure, RetryPolicy, ServiceError,
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prelude_imports() {
        use crate::prelude::*;

        let request = GenerateRequest::new("t", "c");
        assert!(request.validate().is_ok());
        assert_eq!(MindMapSettings::default().max_depth, 3);
    }

    #[cfg(feature = "openai")]
    #[test]
    fn test_from_config_requires_key() {
        let config = AppConfig::default();
        assert!(matches!(
            MindMapService::from_config(&config),
            Err(ConfigError::Provider(_))
        ));
    }

    #[cfg(feature = "openai")]
    #[tokio::test]
    async fn test_from_config() {
        let mut config = AppConfig::default();
        config.provider = ProviderConfig::new().with_api_key("sk-test");
        let service = MindMapService::from_config(&config).unwrap();
        assert!(service.show(MindMapId::new(1)).await.is_err());
    }
}
