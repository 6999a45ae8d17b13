//! Fixed-budget polling of an eventually-consistent resource.
//!
//! The loop knows nothing about what "done" means: callers pass the fetch
//! and the completion predicate, and receive every fetched payload through
//! an observer for live display.

use std::future::Future;
use std::time::Duration;

use serde_json::Value;

use crate::error::UpstreamError;

/// Attempt budget and wait between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub max_attempts: u32,
    pub interval: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            interval: Duration::from_millis(1500),
        }
    }
}

/// One observed attempt, handed to the observer after each fetch.
#[derive(Debug, Clone, Copy)]
pub struct PollProgress<'a> {
    pub resource: &'a str,
    pub attempt: u32,
    pub max_attempts: u32,
    pub payload: &'a Value,
}

#[derive(Debug, thiserror::Error)]
pub enum PollError {
    /// The predicate never held within the attempt budget.
    #[error("timed out polling {resource} after {attempts} attempts")]
    Timeout { resource: String, attempts: u32 },
    #[error(transparent)]
    Upstream(#[from] UpstreamError),
}

/// Fetch `resource` until `is_done` holds or the budget runs out.
///
/// Each attempt waits `policy.interval` first, then fetches, reports the
/// payload to `observe`, and checks `is_done`. The first satisfying payload
/// is returned without further attempts. A fetch error ends polling at once.
pub async fn poll_until<F, Fut, P, O>(
    resource: &str,
    policy: PollPolicy,
    mut fetch: F,
    is_done: P,
    mut observe: O,
) -> Result<Value, PollError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Value, UpstreamError>>,
    P: Fn(&Value) -> bool,
    O: FnMut(&PollProgress<'_>),
{
    for attempt in 1..=policy.max_attempts {
        tokio::time::sleep(policy.interval).await;

        let payload = fetch().await?;
        tracing::debug!(resource, attempt, max = policy.max_attempts, "poll attempt");
        observe(&PollProgress {
            resource,
            attempt,
            max_attempts: policy.max_attempts,
            payload: &payload,
        });

        if is_done(&payload) {
            return Ok(payload);
        }
    }

    tracing::warn!(resource, attempts = policy.max_attempts, "polling timed out");
    Err(PollError::Timeout {
        resource: resource.to_string(),
        attempts: policy.max_attempts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::cell::Cell;
    use tokio::time::Instant;

    fn status(attempt: u32, done_at: u32) -> Value {
        if attempt >= done_at {
            json!({ "status": "completed", "attempt": attempt })
        } else {
            json!({ "status": "processing", "attempt": attempt })
        }
    }

    fn is_completed(v: &Value) -> bool {
        v["status"] == "completed"
    }

    #[tokio::test(start_paused = true)]
    async fn test_returns_payload_of_first_satisfying_attempt() {
        for done_at in 1..=10 {
            let calls = Cell::new(0u32);
            let result = poll_until(
                "document/doc_1",
                PollPolicy::default(),
                || {
                    calls.set(calls.get() + 1);
                    let n = calls.get();
                    async move { Ok(status(n, done_at)) }
                },
                is_completed,
                |_| {},
            )
            .await
            .unwrap();

            assert_eq!(result["attempt"], done_at);
            assert_eq!(calls.get(), done_at, "no attempts after success");
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_never_done_times_out_after_exactly_ten_attempts() {
        let calls = Cell::new(0u32);
        let start = Instant::now();
        let err = poll_until(
            "document/doc_1",
            PollPolicy::default(),
            || {
                calls.set(calls.get() + 1);
                async { Ok(json!({ "status": "processing" })) }
            },
            is_completed,
            |_| {},
        )
        .await
        .unwrap_err();

        assert!(matches!(err, PollError::Timeout { attempts: 10, .. }));
        assert_eq!(calls.get(), 10);
        assert_eq!(start.elapsed(), Duration::from_millis(15_000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_waits_before_every_attempt() {
        let start = Instant::now();
        let seen = Cell::new(Vec::<Duration>::new());
        poll_until(
            "standardization/std_1",
            PollPolicy::default(),
            || {
                let mut v = seen.take();
                v.push(start.elapsed());
                seen.set(v);
                async { Ok(json!({ "data": null })) }
            },
            |v| !v["data"].is_null(),
            |_| {},
        )
        .await
        .unwrap_err();

        let times = seen.take();
        assert_eq!(times.len(), 10);
        assert_eq!(times[0], Duration::from_millis(1500));
        assert_eq!(times[9], Duration::from_millis(15_000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_observer_sees_every_payload() {
        let calls = Cell::new(0u32);
        let mut observed = Vec::new();
        poll_until(
            "document/doc_1",
            PollPolicy::default(),
            || {
                calls.set(calls.get() + 1);
                let n = calls.get();
                async move { Ok(status(n, 4)) }
            },
            is_completed,
            |p: &PollProgress<'_>| {
                observed.push((p.attempt, p.max_attempts, p.payload["status"].clone()));
            },
        )
        .await
        .unwrap();

        assert_eq!(observed.len(), 4);
        assert_eq!(observed[0], (1, 10, json!("processing")));
        assert_eq!(observed[3], (4, 10, json!("completed")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_error_stops_polling() {
        let calls = Cell::new(0u32);
        let err = poll_until(
            "document/doc_1",
            PollPolicy::default(),
            || {
                calls.set(calls.get() + 1);
                let n = calls.get();
                async move {
                    if n == 2 {
                        Err(UpstreamError::Parse("not json".into()))
                    } else {
                        Ok(json!({ "status": "processing" }))
                    }
                }
            },
            is_completed,
            |_| {},
        )
        .await
        .unwrap_err();

        assert!(matches!(err, PollError::Upstream(UpstreamError::Parse(_))));
        assert_eq!(calls.get(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_custom_policy_budget() {
        let policy = PollPolicy {
            max_attempts: 3,
            interval: Duration::from_millis(10),
        };
        let calls = Cell::new(0u32);
        let err = poll_until(
            "document/doc_1",
            policy,
            || {
                calls.set(calls.get() + 1);
                async { Ok(json!({})) }
            },
            is_completed,
            |_| {},
        )
        .await
        .unwrap_err();
        assert!(matches!(err, PollError::Timeout { attempts: 3, .. }));
        assert_eq!(calls.get(), 3);
    }
}
