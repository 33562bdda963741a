//! The resilient caller: bounded retries with exponential backoff,
//! cancellation and an overall deadline.

use crate::error::{AttemptError, CallFailure, FailureKind, TransportError};
use crate::observer::{notify, AttemptObserver, AttemptOutcome, CallAttempt, TracingObserver};
use crate::policy::RetryPolicy;
use crate::request::CallRequest;
use crate::transport::{Transport, TransportResponse};
use bytes::Bytes;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, sleep_until, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info_span, warn, Instrument};
use uuid::Uuid;

/// Successful outcome of an invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct CallSuccess<T> {
    /// HTTP status of the final response.
    pub status: u16,
    /// Validated body.
    pub body: T,
    /// Attempts made, including the successful one.
    pub attempts: u32,
    /// Wall-clock time spent in the invocation.
    pub elapsed: Duration,
}

/// Result of one invocation.
pub type CallResult<T = Bytes> = Result<CallSuccess<T>, CallFailure>;

/// Why an attempt or wait was cut short.
enum Interrupt {
    Cancelled,
    Deadline,
}

impl Interrupt {
    fn kind(&self) -> FailureKind {
        match self {
            Self::Cancelled => FailureKind::Cancelled,
            Self::Deadline => FailureKind::DeadlineExceeded,
        }
    }
}

/// Performs logical calls against an upstream [`Transport`], retrying
/// transient failures according to a [`RetryPolicy`].
///
/// The caller keeps no per-call state, so one instance can serve any number
/// of concurrent invocations.
///
/// # Example
///
/// ```ignore
/// use mindmap_retries::{CallRequest, HttpClientConfig, ReqwestTransport, ResilientCaller, RetryPolicy};
///
/// let caller = ResilientCaller::new(ReqwestTransport::new(&HttpClientConfig::default())?);
/// let request = CallRequest::get("https://api.example.com/health")?;
/// let response = caller.invoke(&request, &RetryPolicy::default()).await?;
/// println!("{} after {} attempts", response.status, response.attempts);
/// ```
#[derive(Clone)]
pub struct ResilientCaller {
    transport: Arc<dyn Transport>,
    observers: Vec<Arc<dyn AttemptObserver>>,
}

impl std::fmt::Debug for ResilientCaller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResilientCaller")
            .field("transport", &self.transport)
            .field("observer_count", &self.observers.len())
            .finish()
    }
}

impl ResilientCaller {
    /// Create a caller that logs attempts through `tracing`.
    pub fn new(transport: impl Transport + 'static) -> Self {
        Self::from_arc(Arc::new(transport))
    }

    /// Create from a shared transport.
    pub fn from_arc(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            observers: vec![Arc::new(TracingObserver)],
        }
    }

    /// Add an attempt observer.
    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn AttemptObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    /// Remove all observers, including the tracing one.
    #[must_use]
    pub fn without_observers(mut self) -> Self {
        self.observers.clear();
        self
    }

    /// The underlying transport.
    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    /// Invoke and return the raw body.
    pub async fn invoke(&self, request: &CallRequest, policy: &RetryPolicy) -> CallResult {
        self.invoke_cancellable(request, policy, &CancellationToken::new())
            .await
    }

    /// Invoke with a cancellation signal and return the raw body.
    pub async fn invoke_cancellable(
        &self,
        request: &CallRequest,
        policy: &RetryPolicy,
        cancel: &CancellationToken,
    ) -> CallResult {
        self.invoke_validated(request, policy, cancel, |_, body| Ok(body.clone()))
            .await
    }

    /// Invoke and deserialize the body as JSON.
    ///
    /// A body that does not deserialize into `T` is a terminal
    /// [`FailureKind::MalformedResponse`].
    pub async fn invoke_json<T: DeserializeOwned>(
        &self,
        request: &CallRequest,
        policy: &RetryPolicy,
        cancel: &CancellationToken,
    ) -> CallResult<T> {
        self.invoke_validated(request, policy, cancel, |_, body| {
            serde_json::from_slice(body).map_err(|e| e.to_string())
        })
        .await
    }

    /// Invoke and validate a success body with `validate`.
    ///
    /// `validate` runs only for 2xx responses. Returning `Err(reason)` ends
    /// the invocation with [`FailureKind::MalformedResponse`] unless the
    /// policy's predicate says otherwise.
    pub async fn invoke_validated<T, V>(
        &self,
        request: &CallRequest,
        policy: &RetryPolicy,
        cancel: &CancellationToken,
        validate: V,
    ) -> CallResult<T>
    where
        V: Fn(u16, &Bytes) -> Result<T, String>,
    {
        let invocation_id = format!("inv_{}", Uuid::new_v4().simple());
        let span = info_span!(
            "invoke",
            invocation_id = %invocation_id,
            method = %request.method(),
            target = %request.target(),
        );

        self.run(request, policy, cancel, validate)
            .instrument(span)
            .await
    }

    async fn run<T, V>(
        &self,
        request: &CallRequest,
        policy: &RetryPolicy,
        cancel: &CancellationToken,
        validate: V,
    ) -> CallResult<T>
    where
        V: Fn(u16, &Bytes) -> Result<T, String>,
    {
        let started = Instant::now();
        // A deadline past the end of the clock never fires.
        let deadline = policy.deadline().and_then(|d| started.checked_add(d));
        let mut attempt: u32 = 0;

        loop {
            if cancel.is_cancelled() {
                return Err(interrupted(Interrupt::Cancelled, None, attempt, started, policy));
            }
            if deadline.is_some_and(|d| Instant::now() >= d) {
                return Err(interrupted(Interrupt::Deadline, None, attempt, started, policy));
            }

            attempt += 1;
            debug!(
                attempt,
                max_attempts = policy.max_attempts(),
                "Executing attempt"
            );

            let attempt_started = Instant::now();
            let sent = tokio::select! {
                biased;
                _ = cancel.cancelled() => Err(Interrupt::Cancelled),
                _ = wait_for(deadline) => Err(Interrupt::Deadline),
                result = self.transport.send(request) => Ok(result),
            };

            let result = match sent {
                Ok(result) => result,
                Err(interrupt) => {
                    self.observe(CallAttempt {
                        attempt,
                        outcome: AttemptOutcome::TerminalFailure(interrupt.kind()),
                        elapsed: attempt_started.elapsed(),
                        status: None,
                        next_delay: None,
                    });
                    return Err(interrupted(interrupt, None, attempt, started, policy));
                }
            };

            let error = match classify(result, &validate) {
                Ok((status, body)) => {
                    self.observe(CallAttempt {
                        attempt,
                        outcome: AttemptOutcome::Success,
                        elapsed: attempt_started.elapsed(),
                        status: Some(status),
                        next_delay: None,
                    });
                    return Ok(CallSuccess {
                        status,
                        body,
                        attempts: attempt,
                        elapsed: started.elapsed(),
                    });
                }
                Err(error) => error,
            };

            let kind = error.kind();
            let retryable = policy.should_retry(&error);

            if !retryable || attempt >= policy.max_attempts() {
                self.observe(CallAttempt {
                    attempt,
                    outcome: AttemptOutcome::TerminalFailure(kind),
                    elapsed: attempt_started.elapsed(),
                    status: error.http_status(),
                    next_delay: None,
                });

                let message = if retryable {
                    format!("{error} (retries exhausted)")
                } else {
                    error.to_string()
                };
                warn!(attempt, kind = %kind, error = %error, "Call failed");

                return Err(CallFailure::new(kind, message, attempt)
                    .with_status(error.http_status())
                    .with_elapsed(started.elapsed()));
            }

            let delay = policy.delay_for(attempt);
            self.observe(CallAttempt {
                attempt,
                outcome: AttemptOutcome::RetryableFailure(kind),
                elapsed: attempt_started.elapsed(),
                status: error.http_status(),
                next_delay: Some(delay),
            });

            let waited = tokio::select! {
                biased;
                _ = cancel.cancelled() => Err(Interrupt::Cancelled),
                _ = wait_for(deadline) => Err(Interrupt::Deadline),
                _ = sleep(delay) => Ok(()),
            };

            if let Err(interrupt) = waited {
                return Err(interrupted(
                    interrupt,
                    Some(&error),
                    attempt,
                    started,
                    policy,
                ));
            }
        }
    }

    fn observe(&self, attempt: CallAttempt) {
        for observer in &self.observers {
            notify(observer.as_ref(), &attempt);
        }
    }
}

/// Sleep until the deadline, or forever without one.
async fn wait_for(deadline: Option<Instant>) {
    match deadline {
        Some(at) => sleep_until(at).await,
        None => std::future::pending().await,
    }
}

fn classify<T, V>(
    result: Result<TransportResponse, TransportError>,
    validate: &V,
) -> Result<(u16, T), AttemptError>
where
    V: Fn(u16, &Bytes) -> Result<T, String>,
{
    let response = result?;
    if !response.is_success() {
        return Err(AttemptError::status(response.status, &response.body));
    }

    validate(response.status, &response.body)
        .map(|body| (response.status, body))
        .map_err(|reason| AttemptError::malformed(response.status, reason))
}

fn interrupted(
    interrupt: Interrupt,
    last_error: Option<&AttemptError>,
    attempts: u32,
    started: Instant,
    policy: &RetryPolicy,
) -> CallFailure {
    let mut message = match interrupt {
        Interrupt::Cancelled => "call cancelled".to_string(),
        Interrupt::Deadline => match policy.deadline() {
            Some(deadline) => format!("deadline of {deadline:?} exceeded"),
            None => "deadline exceeded".to_string(),
        },
    };
    if let Some(error) = last_error {
        message.push_str(&format!("; last error: {error}"));
    }

    warn!(attempts, kind = %interrupt.kind(), "Call interrupted");

    CallFailure::new(interrupt.kind(), message, attempts)
        .with_status(last_error.and_then(AttemptError::http_status))
        .with_elapsed(started.elapsed())
}
