//! Upstream mind map generators.
//!
//! A [`MindMapGenerator`] turns free text into a validated
//! [`MindMapStructure`](mindmap_core::MindMapStructure). The OpenAI
//! implementation sends one chat completion per attempt through a
//! [`ResilientCaller`](mindmap_retries::ResilientCaller), so transient
//! upstream failures are retried with backoff while malformed replies fail
//! fast.
//!
//! ## Example
//!
//! ```rust,ignore
//! use mindmap_providers::{MindMapGenerator, OpenAIGenerator, ProviderConfig};
//! use mindmap_retries::{CancellationToken, HttpClientConfig, ReqwestTransport, ResilientCaller};
//!
//! let config = ProviderConfig::from_env("OPENAI")?;
//! let caller = ResilientCaller::new(ReqwestTransport::new(&HttpClientConfig::default())?);
//! let generator = OpenAIGenerator::new(config, caller)?;
//!
//! let generation = generator
//!     .generate("Rust ownership", &Default::default(), &CancellationToken::new())
//!     .await?;
//! println!("{} nodes", generation.structure.nodes.len());
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

mod generator;
mod prompt;
mod provider;
pub mod types;

#[cfg(feature = "openai")]
mod openai;

// Re-exports
pub use generator::{GenerateError, Generation, MindMapGenerator};
pub use prompt::{PromptTemplate, CONTENT_PLACEHOLDER, DEPTH_PLACEHOLDER};
pub use provider::{ProviderConfig, ProviderError, DEFAULT_BASE_URL, DEFAULT_MODEL};

#[cfg(feature = "openai")]
pub use openai::{parse_completion, OpenAIGenerator, ParsedCompletion};
