// Report polling
// Drives an asynchronous video job to a terminal state under a fixed retry
// budget. The status fetch is injected so the loop can be tested against
// simulated providers under paused tokio time.

use crate::error::VerifyError;
use crate::models::StatusSnapshot;
use serde_json::Value;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, info, warn};

pub const MAX_POLL_ATTEMPTS: u32 = 60;
pub const POLL_INTERVAL: Duration = Duration::from_secs(10);
/// Per-attempt request deadline. Kept below POLL_INTERVAL so a hung request
/// cannot stall the loop past one interval.
pub const POLL_REQUEST_TIMEOUT: Duration = Duration::from_secs(8);

/// One failed status probe, before classification into the error taxonomy.
/// Transport failures and timeouts are transient; HTTP statuses may or may
/// not be, depending on the code.
#[derive(Debug, Clone)]
pub enum ProbeFailure {
    Transport(String),
    Timeout,
    Http(u16),
    /// Successful HTTP exchange whose body cannot be read as a status
    /// response. Fatal: retrying will not fix a shape mismatch.
    Malformed(String),
}

/// Poll the report identified by `report_id` until the provider reaches a
/// terminal state or the attempt budget runs out.
///
/// `fetch_status` is called once per attempt with the 1-based attempt number.
/// The only success exit is status `completed` with a report body attached.
pub async fn poll_report<F, Fut>(report_id: &str, mut fetch_status: F) -> Result<Value, VerifyError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<StatusSnapshot, ProbeFailure>>,
{
    for attempt in 1..=MAX_POLL_ATTEMPTS {
        match fetch_status(attempt).await {
            // A missing report will never appear; stop immediately.
            Err(ProbeFailure::Http(404)) => {
                warn!("[POLLER] report {} not found (attempt {})", report_id, attempt);
                return Err(VerifyError::ReportNotFound(report_id.to_string()));
            }
            Err(ProbeFailure::Http(401)) => {
                warn!("[POLLER] authentication rejected while polling report {}", report_id);
                return Err(VerifyError::AuthenticationFailed);
            }
            Err(ProbeFailure::Malformed(message)) => {
                warn!(
                    "[POLLER] report {} returned an unreadable status body: {}",
                    report_id, message
                );
                return Err(VerifyError::MalformedResponse(message));
            }
            Err(ProbeFailure::Http(status)) => {
                warn!(
                    "[POLLER] report {} attempt {}/{}: HTTP {}",
                    report_id, attempt, MAX_POLL_ATTEMPTS, status
                );
                if attempt == MAX_POLL_ATTEMPTS {
                    return Err(VerifyError::StatusCheckFailed(status));
                }
            }
            Err(ProbeFailure::Transport(message)) => {
                warn!(
                    "[POLLER] report {} attempt {}/{}: transport error: {}",
                    report_id, attempt, MAX_POLL_ATTEMPTS, message
                );
                if attempt == MAX_POLL_ATTEMPTS {
                    return Err(VerifyError::PollingExhausted {
                        attempts: MAX_POLL_ATTEMPTS,
                    });
                }
            }
            Err(ProbeFailure::Timeout) => {
                warn!(
                    "[POLLER] report {} attempt {}/{}: request timed out",
                    report_id, attempt, MAX_POLL_ATTEMPTS
                );
                if attempt == MAX_POLL_ATTEMPTS {
                    return Err(VerifyError::PollingExhausted {
                        attempts: MAX_POLL_ATTEMPTS,
                    });
                }
            }
            Ok(snapshot) => match snapshot.status.as_str() {
                "completed" => {
                    return match snapshot.report {
                        Some(report) => {
                            info!(
                                "[POLLER] report {} completed after {} attempts",
                                report_id, attempt
                            );
                            Ok(report)
                        }
                        None => Err(VerifyError::MalformedResponse(
                            "completed status without a report body".to_string(),
                        )),
                    };
                }
                // The provider has declared the job permanently unsuccessful.
                "failed" | "error" => {
                    warn!(
                        "[POLLER] report {} terminal provider status: {}",
                        report_id, snapshot.status
                    );
                    return Err(VerifyError::ProviderProcessingFailed(snapshot.status));
                }
                // uploaded / pending / processing / anything unrecognized:
                // still working.
                other => {
                    debug!(
                        "[POLLER] report {} attempt {}/{}: status {:?}",
                        report_id, attempt, MAX_POLL_ATTEMPTS, other
                    );
                }
            },
        }

        if attempt < MAX_POLL_ATTEMPTS {
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    Err(VerifyError::PollingTimeout {
        attempts: MAX_POLL_ATTEMPTS,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn working(status: &str) -> Result<StatusSnapshot, ProbeFailure> {
        Ok(StatusSnapshot {
            status: status.to_string(),
            report: None,
        })
    }

    fn completed(report: Value) -> Result<StatusSnapshot, ProbeFailure> {
        Ok(StatusSnapshot {
            status: "completed".to_string(),
            report: Some(report),
        })
    }

    #[tokio::test(start_paused = true)]
    async fn test_returns_report_after_pending_sequence() {
        let calls = Arc::new(AtomicU32::new(0));
        let seen = calls.clone();
        let result = poll_report("r1", move |_| {
            let n = seen.fetch_add(1, Ordering::SeqCst);
            async move {
                match n {
                    0 | 1 => working("pending"),
                    _ => completed(json!({"ai_video": {"is_detected": true}})),
                }
            }
        })
        .await
        .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(result["ai_video"]["is_detected"], json!(true));
    }

    #[tokio::test(start_paused = true)]
    async fn test_not_found_fails_after_one_call() {
        let calls = Arc::new(AtomicU32::new(0));
        let seen = calls.clone();
        let err = poll_report("ghost", move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
            async { Err(ProbeFailure::Http(404)) }
        })
        .await
        .unwrap_err();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(matches!(err, VerifyError::ReportNotFound(id) if id == "ghost"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_unauthorized_fails_immediately() {
        let err = poll_report("r1", |_| async { Err(ProbeFailure::Http(401)) })
            .await
            .unwrap_err();
        assert!(matches!(err, VerifyError::AuthenticationFailed));
    }

    #[tokio::test(start_paused = true)]
    async fn test_sixty_processing_responses_time_out_exactly() {
        let calls = Arc::new(AtomicU32::new(0));
        let seen = calls.clone();
        let err = poll_report("slow", move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
            async { working("processing") }
        })
        .await
        .unwrap_err();

        assert_eq!(calls.load(Ordering::SeqCst), MAX_POLL_ATTEMPTS);
        assert!(matches!(
            err,
            VerifyError::PollingTimeout { attempts } if attempts == MAX_POLL_ATTEMPTS
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_provider_failure_is_terminal() {
        let calls = Arc::new(AtomicU32::new(0));
        let seen = calls.clone();
        let err = poll_report("r1", move |_| {
            let n = seen.fetch_add(1, Ordering::SeqCst);
            async move {
                match n {
                    0 => working("uploaded"),
                    _ => working("failed"),
                }
            }
        })
        .await
        .unwrap_err();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(matches!(err, VerifyError::ProviderProcessingFailed(s) if s == "failed"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_errors_consume_budget_then_exhaust() {
        let err = poll_report("flaky", |_| async {
            Err(ProbeFailure::Transport("connection reset".to_string()))
        })
        .await
        .unwrap_err();
        assert!(matches!(
            err,
            VerifyError::PollingExhausted { attempts } if attempts == MAX_POLL_ATTEMPTS
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_server_error_retried_then_recovers() {
        let calls = Arc::new(AtomicU32::new(0));
        let seen = calls.clone();
        let result = poll_report("r1", move |_| {
            let n = seen.fetch_add(1, Ordering::SeqCst);
            async move {
                match n {
                    0 => Err(ProbeFailure::Http(502)),
                    1 => Err(ProbeFailure::Timeout),
                    _ => completed(json!({"verdict": "human"})),
                }
            }
        })
        .await
        .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(result["verdict"], json!("human"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_unreadable_status_body_is_fatal() {
        let calls = Arc::new(AtomicU32::new(0));
        let seen = calls.clone();
        let err = poll_report("r1", move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
            async { Err(ProbeFailure::Malformed("expected a JSON object".to_string())) }
        })
        .await
        .unwrap_err();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(matches!(err, VerifyError::MalformedResponse(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_completed_without_report_is_malformed() {
        let err = poll_report("r1", |_| async { working("completed") })
            .await
            .unwrap_err();
        assert!(matches!(err, VerifyError::MalformedResponse(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_status_keeps_polling() {
        let calls = Arc::new(AtomicU32::new(0));
        let seen = calls.clone();
        let result = poll_report("r1", move |_| {
            let n = seen.fetch_add(1, Ordering::SeqCst);
            async move {
                match n {
                    0 => working("warming_up"),
                    _ => completed(json!({})),
                }
            }
        })
        .await;
        assert!(result.is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
