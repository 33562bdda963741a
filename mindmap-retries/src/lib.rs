//! # mindmap-retries
//!
//! Resilient outbound calls for mindmap.
//!
//! One logical call ("invocation") may span several physical attempts. The
//! [`ResilientCaller`] retries transient failures with bounded exponential
//! backoff, honors a cancellation token and an optional overall deadline,
//! and always finishes with exactly one [`CallResult`].
//!
//! ## Core Concepts
//!
//! - **[`CallRequest`]**: immutable description of the outbound request
//! - **[`RetryPolicy`]**: attempt ceiling, backoff curve, deadline, predicate
//! - **[`Transport`]**: sends one attempt; [`ReqwestTransport`] is the HTTP one
//! - **[`AttemptObserver`]**: sees every attempt; cannot change the outcome
//! - **[`CallFailure`]** / **[`FailureKind`]**: terminal failure taxonomy
//!
//! ## Backoff
//!
//! The wait after failed attempt `n` is `min(base_delay * 2^(n-1), max_delay)`.
//!
//! ## Example
//!
//! ```ignore
//! use mindmap_retries::prelude::*;
//! use std::time::Duration;
//!
//! let policy = RetryPolicy::builder()
//!     .max_attempts(3)
//!     .base_delay(Duration::from_secs(1))
//!     .deadline(Duration::from_secs(300))
//!     .build()?;
//!
//! let caller = ResilientCaller::new(ReqwestTransport::new(&HttpClientConfig::default())?);
//! let request = CallRequest::post("https://api.example.com/v1/jobs")?
//!     .with_json(&serde_json::json!({"input": "hello"}))?;
//!
//! match caller.invoke(&request, &policy).await {
//!     Ok(success) => println!("{} in {} attempts", success.status, success.attempts),
//!     Err(failure) => eprintln!("{}: {}", failure.kind, failure.message),
//! }
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod error;
pub mod executor;
pub mod observer;
pub mod policy;
pub mod request;
pub mod transport;

// Re-exports
pub use error::{AttemptError, CallFailure, FailureKind, TransportError};
pub use executor::{CallResult, CallSuccess, ResilientCaller};
pub use observer::{AttemptLog, AttemptObserver, AttemptOutcome, CallAttempt, TracingObserver};
pub use policy::{default_predicate, PolicyError, RetryPolicy, RetryPolicyBuilder, RetryPredicate};
pub use request::{CallRequest, RequestError};
pub use tokio_util::sync::CancellationToken;
pub use transport::{Transport, TransportResponse};
#[cfg(feature = "reqwest")]
pub use transport::{HttpClientConfig, ReqwestTransport};

/// Prelude for common imports.
pub mod prelude {
    pub use crate::{
        CallFailure, CallRequest, CallResult, CancellationToken, FailureKind, ResilientCaller,
        RetryPolicy, Transport,
    };
    #[cfg(feature = "reqwest")]
    pub use crate::{HttpClientConfig, ReqwestTransport};
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_prelude_imports() {
        use crate::prelude::*;

        let policy = RetryPolicy::builder().max_attempts(5).build().unwrap();
        assert_eq!(policy.max_attempts(), 5);
    }

    #[test]
    fn test_policy_defaults() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for(1), Duration::from_secs(1));
        assert_eq!(policy.delay_for(3), Duration::from_secs(4));
    }

    #[test]
    fn test_request_builder() {
        let request = CallRequest::get("https://example.com").unwrap();
        tokio_test::assert_ok!(request.clone().with_json(&[1, 2, 3]));
        assert_eq!(request.method(), "GET");
    }
}
