//! Resilient invocation — bounded retry around a single generative call.
//!
//! A response counts as successful only if it is present AND its extractable
//! text is non-empty. A transport exception and an empty response are treated
//! identically for retry purposes; the exception message wins as the terminal
//! diagnostic when both occur. Attempts are strictly sequential; the only
//! suspension point is the backoff sleep between attempts.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::diagnostics::DiagnosticSink;
use crate::llm_client::{GenerateResponse, LlmError};

/// Retry configuration for all agent calls.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    /// Backoff applied after failed attempt `attempt` (0-indexed): linear,
    /// `base_delay * (attempt + 1)`. Never applied after the final attempt.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay * (attempt + 1)
    }
}

/// Outcome of one attempt inside the retry loop. Ephemeral — used only to
/// decide whether to retry and to compose the terminal diagnostic.
#[derive(Debug)]
enum AttemptOutcome {
    Success(GenerateResponse),
    Empty(GenerateResponse),
    Error(String),
}

/// Executes `op` until it yields a response with non-empty text, retrying up to
/// `policy.max_attempts` times with linear backoff. On exhaustion, writes a
/// terminal diagnostic record and returns [`LlmError::RetryExhausted`] — a
/// terminal failure is never silently dropped.
pub async fn invoke_with_retry<F, Fut>(
    policy: &RetryPolicy,
    diagnostics: &DiagnosticSink,
    operation: &str,
    mut op: F,
) -> Result<GenerateResponse, LlmError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<GenerateResponse, LlmError>>,
{
    let mut last_detail = "no attempts were made".to_string();
    let mut last_response: Option<GenerateResponse> = None;

    for attempt in 0..policy.max_attempts {
        let outcome = match op().await {
            Ok(response) => {
                if response.text().is_some() {
                    AttemptOutcome::Success(response)
                } else {
                    AttemptOutcome::Empty(response)
                }
            }
            Err(e) => AttemptOutcome::Error(e.to_string()),
        };

        match outcome {
            AttemptOutcome::Success(response) => return Ok(response),
            AttemptOutcome::Empty(response) => {
                last_detail = LlmError::EmptyContent.to_string();
                last_response = Some(response);
            }
            AttemptOutcome::Error(detail) => {
                last_detail = detail;
            }
        }

        if attempt + 1 < policy.max_attempts {
            let delay = policy.delay_for(attempt);
            warn!(
                "{operation}: attempt {} failed ({last_detail}), retrying after {}ms",
                attempt + 1,
                delay.as_millis()
            );
            tokio::time::sleep(delay).await;
        }
    }

    let introspection = last_response.as_ref().map(|r| r.introspection());
    diagnostics.record_call_exhausted(
        operation,
        policy.max_attempts,
        &last_detail,
        introspection.as_deref(),
    );

    Err(LlmError::RetryExhausted {
        attempts: policy.max_attempts,
        detail: last_detail,
    })
}
