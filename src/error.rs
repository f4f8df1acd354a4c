// Verification Error Taxonomy
// Every workflow failure surfaces as one of these kinds; nothing is swallowed.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum VerifyError {
    #[error("unsupported media type: {0}")]
    UnsupportedMediaType(String),
    #[error("API key not configured")]
    MissingApiKey,
    #[error("authentication failed (HTTP 401)")]
    AuthenticationFailed,
    #[error("access forbidden (HTTP 403)")]
    AccessForbidden,
    #[error("rate limited (HTTP 429)")]
    RateLimited,
    #[error("payload too large (HTTP 413)")]
    PayloadTooLarge,
    #[error("provider server error (HTTP {0})")]
    ProviderServerError(u16),
    #[error("submission rejected (HTTP {status}): {message}")]
    SubmissionRejected { status: u16, message: String },
    #[error("report {0} not found")]
    ReportNotFound(String),
    #[error("provider marked the job as {0}")]
    ProviderProcessingFailed(String),
    #[error("status check failed (HTTP {0})")]
    StatusCheckFailed(u16),
    #[error("polling budget consumed by transport failures after {attempts} attempts")]
    PollingExhausted { attempts: u32 },
    #[error("report still processing after {attempts} attempts")]
    PollingTimeout { attempts: u32 },
    #[error("network error: {0}")]
    Network(String),
    #[error("request timed out")]
    Timeout,
    #[error("malformed provider response: {0}")]
    MalformedResponse(String),
}

impl VerifyError {
    /// True for failures the caller should not bother retrying with the same
    /// input. Transient transport classification only exists inside the
    /// poller; by the time an error reaches the caller it is final.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, VerifyError::RateLimited)
    }

    pub fn from_transport(err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            VerifyError::Timeout
        } else {
            VerifyError::Network(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limit_is_retryable_by_caller() {
        assert!(!VerifyError::RateLimited.is_fatal());
        assert!(VerifyError::AuthenticationFailed.is_fatal());
        assert!(VerifyError::PollingTimeout { attempts: 60 }.is_fatal());
    }

    #[test]
    fn test_display_names_the_kind() {
        let err = VerifyError::SubmissionRejected {
            status: 400,
            message: "bad multipart".to_string(),
        };
        assert!(err.to_string().contains("400"));
        assert!(err.to_string().contains("bad multipart"));
    }
}
