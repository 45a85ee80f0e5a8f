use crate::core::config::ExchangeConfig;
use crate::core::errors::ExchangeError;
use crate::core::kernel::request::{Access, RawResponse, RequestIntent, RequestKind, SignedRequest};
use crate::core::kernel::rest::{RestClient, TransportFailure};
use crate::core::kernel::signer::Signer;
use governor::{
    clock::DefaultClock,
    middleware::NoOpMiddleware,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tokio_retry::strategy::ExponentialBackoff;
use tracing::{debug, instrument, warn};

type Limiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock, NoOpMiddleware>;

/// Internal error; the request was not processed.
pub const CODE_INTERNAL_NOT_PROCESSED: i32 = -1001;
/// Backend timeout; execution status unknown.
pub const CODE_EXECUTION_UNKNOWN: i32 = -1007;
/// Timestamp outside of recvWindow.
pub const CODE_TIMESTAMP_OUTSIDE_WINDOW: i32 = -1021;
pub const CODE_TOO_MANY_REQUESTS: i32 = -1003;

/// Upper bound on the time one call may take across all of its attempts.
pub const MAX_CALL_BUDGET: Duration = Duration::from_secs(3600);

/// Retry and timeout settings for [`HttpTransport`].
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    /// First backoff delay; each later one doubles
    pub base_delay: Duration,
    pub max_delay: Duration,
    /// Bound on a single attempt
    pub attempt_timeout: Duration,
    /// Bound on all attempts and backoff sleeps of one call
    pub budget: Duration,
}

impl RetryPolicy {
    pub fn new(attempt_timeout: Duration, max_retries: u32) -> Self {
        Self {
            max_retries,
            base_delay: Duration::from_millis(250),
            max_delay: Duration::from_secs(4),
            attempt_timeout,
            budget: attempt_timeout
                .saturating_mul(max_retries.saturating_add(1))
                .min(MAX_CALL_BUDGET),
        }
    }

    pub fn from_config(config: &ExchangeConfig) -> Self {
        Self::new(config.timeout, config.max_retries)
    }

    #[must_use]
    pub const fn with_backoff(mut self, base_delay: Duration, max_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self.max_delay = max_delay;
        self
    }

    #[must_use]
    pub fn with_budget(mut self, budget: Duration) -> Self {
        self.budget = budget.min(MAX_CALL_BUDGET);
        self
    }

    /// Doubling delays starting at `base_delay` (rounded to whole even
    /// milliseconds), capped at `max_delay`, one per permitted retry.
    pub fn delays(&self) -> impl Iterator<Item = Duration> {
        let factor = (self.base_delay.as_millis() as u64 / 2).max(1);
        ExponentialBackoff::from_millis(2)
            .factor(factor)
            .max_delay(self.max_delay)
            .take(self.max_retries as usize)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(Duration::from_secs(5), 2)
    }
}

/// Error body shape shared by all endpoints.
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    code: Option<i64>,
    msg: Option<String>,
}

/// Result of classifying one attempt.
enum Verdict {
    Success(RawResponse),
    /// Safe to try again; `error` is surfaced if no retry is left.
    Retry(ExchangeError),
    Fail(ExchangeError),
}

/// Executes request intents: signs every attempt, enforces timeouts and
/// retries according to the idempotency of the call.
///
/// Holds no per-request state, so one instance (or its clones) can serve any
/// number of concurrent calls.
#[derive(Clone)]
pub struct HttpTransport<R: RestClient> {
    rest: R,
    signer: Option<Arc<dyn Signer>>,
    policy: RetryPolicy,
    recv_window: u64,
    limiter: Option<Arc<Limiter>>,
    exchange_name: &'static str,
}

impl<R: RestClient> std::fmt::Debug for HttpTransport<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport")
            .field("exchange", &self.exchange_name)
            .field("signer", &self.signer.as_ref().map(|s| s.scheme()))
            .field("policy", &self.policy)
            .field("recv_window", &self.recv_window)
            .field("rate_limited", &self.limiter.is_some())
            .finish_non_exhaustive()
    }
}

impl<R: RestClient> HttpTransport<R> {
    pub fn new(rest: R, policy: RetryPolicy) -> Self {
        Self {
            rest,
            signer: None,
            policy,
            recv_window: crate::core::config::DEFAULT_RECV_WINDOW_MS,
            limiter: None,
            exchange_name: "aster",
        }
    }

    #[must_use]
    pub fn with_signer(mut self, signer: Arc<dyn Signer>) -> Self {
        self.signer = Some(signer);
        self
    }

    #[must_use]
    pub const fn with_recv_window(mut self, recv_window: u64) -> Self {
        self.recv_window = recv_window;
        self
    }

    /// Throttle all requests through this transport and its clones.
    #[must_use]
    pub fn with_rate_limit(mut self, per_second: NonZeroU32) -> Self {
        self.limiter = Some(Arc::new(RateLimiter::direct(Quota::per_second(per_second))));
        self
    }

    #[must_use]
    pub const fn with_exchange_name(mut self, exchange_name: &'static str) -> Self {
        self.exchange_name = exchange_name;
        self
    }

    pub const fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn can_sign(&self) -> bool {
        self.signer.is_some()
    }

    pub fn signer_scheme(&self) -> Option<&'static str> {
        self.signer.as_ref().map(|s| s.scheme())
    }

    /// Execute and deserialize the response body.
    pub async fn execute_json<T: DeserializeOwned>(
        &self,
        intent: &RequestIntent,
    ) -> Result<T, ExchangeError> {
        let response = self.execute(intent).await?;
        serde_json::from_str(&response.body).map_err(|e| match intent.kind() {
            // The exchange took the call; only the reply is unusable
            RequestKind::Mutating => unknown_outcome(
                intent,
                format!(
                    "accepted (HTTP {}) but response unreadable: {}",
                    response.status, e
                ),
            ),
            RequestKind::Idempotent => ExchangeError::DeserializationError(format!(
                "{} {}: {} (body: {})",
                intent.method(),
                intent.endpoint(),
                e,
                response.body
            )),
        })
    }

    /// Execute with retry: idempotent calls retry on any transient failure;
    /// mutating calls retry only when the request provably had no effect and
    /// otherwise end in [`ExchangeError::UnknownOutcome`].
    #[instrument(
        skip(self, intent),
        fields(exchange = self.exchange_name, method = %intent.method(), endpoint = intent.endpoint())
    )]
    pub async fn execute(&self, intent: &RequestIntent) -> Result<RawResponse, ExchangeError> {
        let kind = intent.kind();
        let deadline = Instant::now() + self.policy.budget;
        let mut delays = self.policy.delays();
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;

            // Throttle before stamping so the signed timestamp is fresh
            if let Some(limiter) = &self.limiter {
                limiter.until_ready().await;
            }

            let remaining = deadline.saturating_duration_since(Instant::now());
            let verdict = if remaining.is_zero() {
                Self::on_failure(
                    kind,
                    intent,
                    TransportFailure::NotSent("retry budget exhausted".to_string()),
                )
            } else {
                let signed = self.prepare(intent)?;
                let limit = remaining.min(self.policy.attempt_timeout);
                match tokio::time::timeout(limit, self.rest.send(&signed)).await {
                    Ok(Ok(response)) => Self::classify(kind, intent, response),
                    Ok(Err(failure)) => Self::on_failure(kind, intent, failure),
                    Err(_) => Self::on_failure(
                        kind,
                        intent,
                        TransportFailure::Ambiguous {
                            reason: format!("no response within {:?}", limit),
                            timed_out: true,
                        },
                    ),
                }
            };

            let error = match verdict {
                Verdict::Success(response) => {
                    debug!(attempt, status = response.status, "request completed");
                    return Ok(response);
                }
                Verdict::Fail(error) => return Err(error),
                Verdict::Retry(error) => error,
            };

            let Some(delay) = delays.next() else {
                return Err(error);
            };
            if Instant::now() + delay >= deadline {
                debug!(attempt, ?delay, "backoff would overrun the call budget");
                return Err(error);
            }

            warn!(attempt, ?delay, error = %error, "retrying request");
            tokio::time::sleep(delay).await;
        }
    }

    /// Stamp and sign a fresh copy of the intent. Signed intents never leave
    /// without a signature.
    fn prepare(&self, intent: &RequestIntent) -> Result<SignedRequest, ExchangeError> {
        match intent.access() {
            Access::Public => SignedRequest::public(intent),
            Access::Signed => {
                let signer = self.signer.as_ref().ok_or_else(|| {
                    ExchangeError::signing(format!(
                        "{} requires credentials; none configured",
                        intent.endpoint()
                    ))
                })?;
                let stamped = intent.stamp(self.recv_window)?;
                signer.sign(&stamped)
            }
        }
    }

    fn on_failure(kind: RequestKind, intent: &RequestIntent, failure: TransportFailure) -> Verdict {
        match (failure, kind) {
            (TransportFailure::NotSent(reason), _) => {
                Verdict::Retry(ExchangeError::TransportError(reason))
            }
            (TransportFailure::Ambiguous { reason, .. }, RequestKind::Idempotent) => {
                Verdict::Retry(ExchangeError::TransportError(reason))
            }
            (TransportFailure::Ambiguous { reason, .. }, RequestKind::Mutating) => {
                Verdict::Fail(unknown_outcome(intent, reason))
            }
        }
    }

    fn classify(kind: RequestKind, intent: &RequestIntent, response: RawResponse) -> Verdict {
        let body: Option<ApiErrorBody> = serde_json::from_str(&response.body).ok();
        let code = body
            .as_ref()
            .and_then(|b| b.code)
            .and_then(|c| i32::try_from(c).ok());
        let message = body
            .as_ref()
            .and_then(|b| b.msg.clone())
            .unwrap_or_else(|| response.body.clone());

        let status = response.status;
        let rejected_in_body = response.is_success() && code.is_some_and(|c| c < 0);
        if response.is_success() && !rejected_in_body {
            return Verdict::Success(response);
        }

        let rejection = |code: i32| ExchangeError::ExchangeRejection {
            code,
            message: message.clone(),
            retry_after: response.retry_after,
        };

        if status == 429 || status == 418 || code == Some(CODE_TOO_MANY_REQUESTS) {
            return Verdict::Fail(rejection(code.unwrap_or(i32::from(status))));
        }

        match code {
            Some(c @ (CODE_INTERNAL_NOT_PROCESSED | CODE_TIMESTAMP_OUTSIDE_WINDOW)) => {
                return Verdict::Retry(rejection(c));
            }
            Some(c @ CODE_EXECUTION_UNKNOWN) => {
                return match kind {
                    RequestKind::Idempotent => Verdict::Retry(rejection(c)),
                    RequestKind::Mutating => Verdict::Fail(unknown_outcome(
                        intent,
                        format!("exchange reported {}: {}", c, message),
                    )),
                };
            }
            _ => {}
        }

        if status >= 500 {
            let reason = format!("HTTP {}: {}", status, message);
            return match kind {
                RequestKind::Idempotent => Verdict::Retry(ExchangeError::TransportError(reason)),
                RequestKind::Mutating => Verdict::Fail(unknown_outcome(intent, reason)),
            };
        }

        Verdict::Fail(rejection(code.unwrap_or(i32::from(status))))
    }
}

fn unknown_outcome(intent: &RequestIntent, reason: String) -> ExchangeError {
    ExchangeError::UnknownOutcome {
        endpoint: format!("{} {}", intent.method(), intent.endpoint()),
        reason,
    }
}
