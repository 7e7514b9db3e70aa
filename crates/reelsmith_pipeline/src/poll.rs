//! Polling protocol for long-running video generation.

use derive_builder::Builder;
use derive_getters::Getters;
use reelsmith_error::{GenerationError, GenerationErrorKind, ReelsmithError, ReelsmithResult};
use reelsmith_interface::{MediaLocator, VideoRequest, VideoSynthesis};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tokio_retry2::strategy::{ExponentialBackoff, FixedInterval, jitter};
use tokio_util::sync::CancellationToken;

/// Growth of the delay between status polls.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::Display,
)]
#[serde(rename_all = "lowercase")]
pub enum Backoff {
    /// Same delay every time
    #[default]
    #[display("fixed")]
    Fixed,
    /// Delay grows by `multiplier` up to `max_interval_ms`
    #[display("exponential")]
    Exponential,
}

/// Delay schedule and bounds for the poll loop.
///
/// # Examples
///
/// ```
/// use reelsmith_pipeline::PollPolicy;
/// use std::time::Duration;
///
/// let policy = PollPolicy::default();
/// let delays: Vec<Duration> = policy.delays().take(2).collect();
/// assert_eq!(delays, vec![Duration::from_secs(5), Duration::from_secs(5)]);
/// assert_eq!(policy.delays().count(), 120);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters, Builder)]
#[builder(default)]
pub struct PollPolicy {
    /// Delay before the first poll, in milliseconds.
    #[serde(default = "default_interval_ms")]
    interval_ms: u64,

    /// Delay growth strategy.
    #[serde(default)]
    backoff: Backoff,

    /// Growth factor for exponential backoff.
    #[serde(default = "default_multiplier")]
    multiplier: u64,

    /// Cap for exponential backoff, in milliseconds.
    #[serde(default = "default_max_interval_ms")]
    max_interval_ms: u64,

    /// Randomize each delay.
    #[serde(default)]
    jitter: bool,

    /// Maximum number of status polls.
    #[serde(default = "default_max_attempts")]
    max_attempts: Option<usize>,

    /// Wall-clock bound from submission, in seconds.
    #[serde(default)]
    timeout_secs: Option<u64>,
}

fn default_interval_ms() -> u64 {
    5000
}

fn default_multiplier() -> u64 {
    2
}

fn default_max_interval_ms() -> u64 {
    60_000
}

fn default_max_attempts() -> Option<usize> {
    Some(120)
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            backoff: Backoff::default(),
            multiplier: default_multiplier(),
            max_interval_ms: default_max_interval_ms(),
            jitter: false,
            max_attempts: default_max_attempts(),
            timeout_secs: None,
        }
    }
}

impl PollPolicy {
    /// Creates a new policy builder.
    pub fn builder() -> PollPolicyBuilder {
        PollPolicyBuilder::default()
    }

    /// The delays to sleep before each poll, bounded by `max_attempts`.
    pub fn delays(&self) -> Box<dyn Iterator<Item = Duration> + Send> {
        let schedule: Box<dyn Iterator<Item = Duration> + Send> = match self.backoff {
            Backoff::Fixed => Box::new(FixedInterval::from_millis(self.interval_ms)),
            Backoff::Exponential => {
                let multiplier = self.multiplier.max(1);
                Box::new(
                    ExponentialBackoff::from_millis(multiplier)
                        .factor((self.interval_ms / multiplier).max(1))
                        .max_delay(Duration::from_millis(self.max_interval_ms)),
                )
            }
        };

        let schedule: Box<dyn Iterator<Item = Duration> + Send> = if self.jitter {
            Box::new(schedule.map(jitter))
        } else {
            schedule
        };

        match self.max_attempts {
            Some(attempts) => Box::new(schedule.take(attempts)),
            None => schedule,
        }
    }

    /// Wall-clock bound, if any.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

/// Drives a video job from submission to a fetchable result.
#[derive(Debug, Clone, Default)]
pub struct PollingController {
    policy: PollPolicy,
}

impl PollingController {
    /// Create a controller with the given policy.
    pub fn new(policy: PollPolicy) -> Self {
        Self { policy }
    }

    /// The active policy.
    pub fn policy(&self) -> &PollPolicy {
        &self.policy
    }

    /// Submit `request` and poll until the job finishes.
    ///
    /// # Errors
    ///
    /// - `GenerationErrorKind::Cancelled` when `cancel` fires
    /// - `GenerationErrorKind::Timeout` when the policy bounds are exceeded
    /// - `GenerationErrorKind::OperationFailed` when the backend reports failure
    /// - `GenerationErrorKind::NoResult` when the job finished without media
    /// - any backend error, unchanged
    #[tracing::instrument(
        skip(self, backend, request, cancel),
        fields(provider = backend.provider_name(), has_image = request.image.is_some())
    )]
    pub async fn run<B>(
        &self,
        backend: &B,
        request: &VideoRequest,
        cancel: &CancellationToken,
    ) -> ReelsmithResult<MediaLocator>
    where
        B: VideoSynthesis + ?Sized,
    {
        let started = Instant::now();
        let mut operation = until_cancelled(cancel, backend.start_video_generation(request)).await?;
        tracing::info!(operation = %operation.name, "Video generation submitted");

        let mut delays = self.policy.delays();
        let mut attempts = 0_usize;

        while !operation.done {
            if cancel.is_cancelled() {
                Err(GenerationError::new(GenerationErrorKind::Cancelled))?
            }

            let Some(delay) = delays.next() else {
                tracing::warn!(attempts, "Poll attempts exhausted");
                return Err(timed_out(attempts, started));
            };

            if let Some(limit) = self.policy.timeout()
                && started.elapsed() + delay > limit
            {
                tracing::warn!(attempts, limit_secs = limit.as_secs(), "Poll deadline reached");
                return Err(timed_out(attempts, started));
            }

            tokio::select! {
                _ = cancel.cancelled() => {
                    return Err(GenerationError::new(GenerationErrorKind::Cancelled).into());
                }
                _ = tokio::time::sleep(delay) => {}
            }

            attempts += 1;
            operation = until_cancelled(cancel, backend.poll_video_operation(&operation)).await?;
            tracing::debug!(attempt = attempts, done = operation.done, "Polled video operation");
        }

        if let Some(message) = operation.error.as_deref() {
            tracing::error!(operation = %operation.name, error = %message, "Video operation failed");
            Err(GenerationError::new(GenerationErrorKind::OperationFailed(
                message.to_string(),
            )))?
        }

        let locator = until_cancelled(cancel, backend.resolve_video_result(&operation))
            .await?
            .ok_or_else(|| {
                GenerationError::new(GenerationErrorKind::NoResult(format!(
                    "operation {} finished without a video",
                    operation.name
                )))
            })?;

        tracing::info!(attempts, elapsed_ms = started.elapsed().as_millis() as u64, "Video generation finished");
        Ok(locator)
    }
}

fn timed_out(attempts: usize, started: Instant) -> ReelsmithError {
    GenerationError::new(GenerationErrorKind::Timeout {
        attempts,
        elapsed_secs: started.elapsed().as_secs(),
    })
    .into()
}

/// Race `future` against `cancel`, failing with `Cancelled` if the token wins.
pub async fn until_cancelled<T, F>(cancel: &CancellationToken, future: F) -> ReelsmithResult<T>
where
    F: Future<Output = ReelsmithResult<T>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(GenerationError::new(GenerationErrorKind::Cancelled).into()),
        result = future => result,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exponential_delays_grow_to_the_cap() {
        let policy = PollPolicy::builder()
            .interval_ms(1000)
            .backoff(Backoff::Exponential)
            .multiplier(2)
            .max_interval_ms(4000)
            .max_attempts(Some(5))
            .build()
            .unwrap();
        let delays: Vec<u64> = policy.delays().map(|d| d.as_millis() as u64).collect();
        assert_eq!(delays, vec![1000, 2000, 4000, 4000, 4000]);
    }

    #[test]
    fn unbounded_policy_keeps_yielding() {
        let policy = PollPolicy::builder()
            .interval_ms(10)
            .max_attempts(None)
            .build()
            .unwrap();
        assert_eq!(policy.delays().take(500).count(), 500);
    }

    #[test]
    fn deserializes_partial_policy() {
        let policy: PollPolicy =
            serde_json::from_str(r#"{"interval_ms": 250, "backoff": "exponential"}"#).unwrap();
        assert_eq!(*policy.interval_ms(), 250);
        assert_eq!(*policy.backoff(), Backoff::Exponential);
        assert_eq!(*policy.max_attempts(), Some(120));
    }
}
