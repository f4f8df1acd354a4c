// Verification Client
// Submits media to the detection provider and orchestrates polling and
// normalization. One network call per submission; transient retry lives
// only in the poller.

use crate::error::VerifyError;
use crate::models::{MediaFile, MediaKind, NormalizerPolicy, StatusSnapshot, VerificationResult};
use crate::services::config_store::ConfigStore;
use crate::services::verification::media_type::classify;
use crate::services::verification::normalizer::{normalize_report, NormalizeContext};
use crate::services::verification::poller::{poll_report, ProbeFailure, POLL_REQUEST_TIMEOUT};
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde_json::Value;
use std::env;
use std::future::Future;
use std::time::{Duration, Instant};
use tracing::{info, warn};

const IMAGE_REPORT_DEFAULT_URL: &str = "https://api.aiornot.com/v1/reports/image";
const VIDEO_REPORT_DEFAULT_URL: &str = "https://api.aiornot.com/v1/reports/video";
/// `{id}` is replaced with the report id.
const REPORT_STATUS_DEFAULT_URL: &str = "https://api.aiornot.com/v1/reports/{id}";

// Images are expected to return a report inline; videos only acknowledge
// receipt, so their upload window is wider.
const IMAGE_UPLOAD_TIMEOUT: Duration = Duration::from_secs(30);
const VIDEO_UPLOAD_TIMEOUT: Duration = Duration::from_secs(180);

// ============ Endpoints ============

/// Provider endpoint set. Resolution order: environment variable, config
/// file override, built-in default. Never hard-coded-only.
#[derive(Debug, Clone)]
pub struct DetectorEndpoints {
    pub image_report_url: String,
    pub video_report_url: String,
    pub report_status_url: String,
}

impl Default for DetectorEndpoints {
    fn default() -> Self {
        Self {
            image_report_url: IMAGE_REPORT_DEFAULT_URL.to_string(),
            video_report_url: VIDEO_REPORT_DEFAULT_URL.to_string(),
            report_status_url: REPORT_STATUS_DEFAULT_URL.to_string(),
        }
    }
}

impl DetectorEndpoints {
    pub fn resolved() -> Self {
        let overrides = ConfigStore::from_default_dir()
            .and_then(|store| store.load().ok())
            .map(|config| config.detector)
            .unwrap_or_default();

        Self {
            image_report_url: resolve_url(
                "VERISCAN_IMAGE_REPORT_URL",
                overrides.image_report_url,
                IMAGE_REPORT_DEFAULT_URL,
            ),
            video_report_url: resolve_url(
                "VERISCAN_VIDEO_REPORT_URL",
                overrides.video_report_url,
                VIDEO_REPORT_DEFAULT_URL,
            ),
            report_status_url: resolve_url(
                "VERISCAN_REPORT_STATUS_URL",
                overrides.report_status_url,
                REPORT_STATUS_DEFAULT_URL,
            ),
        }
    }

    fn status_url_for(&self, report_id: &str) -> String {
        if self.report_status_url.contains("{id}") {
            self.report_status_url.replace("{id}", report_id)
        } else {
            format!(
                "{}/{}",
                self.report_status_url.trim_end_matches('/'),
                report_id
            )
        }
    }
}

fn resolve_url(env_key: &str, config_value: Option<String>, default: &str) -> String {
    match env::var(env_key) {
        Ok(v) if !v.trim().is_empty() => v,
        _ => config_value
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| default.to_string()),
    }
}

// ============ Submission Handoff ============

/// What the submission payload turned out to be: a terminal report, or an
/// acknowledgement that needs polling.
#[derive(Debug)]
enum Handoff {
    Inline { report_id: String, report: Value },
    Pending { report_id: String },
}

fn extract_handoff(payload: &Value) -> Handoff {
    let report_id = payload
        .get("report_id")
        .or_else(|| payload.get("reportId"))
        .or_else(|| payload.get("id"))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    match payload.get("report") {
        Some(report) if !report.is_null() => Handoff::Inline {
            report_id,
            report: report.clone(),
        },
        _ if !report_id.is_empty() => Handoff::Pending { report_id },
        // Some response variants put the report fields at the top level.
        _ => Handoff::Inline {
            report_id,
            report: payload.clone(),
        },
    }
}

fn submission_error(status: u16, message: String) -> VerifyError {
    match status {
        401 => VerifyError::AuthenticationFailed,
        403 => VerifyError::AccessForbidden,
        413 => VerifyError::PayloadTooLarge,
        429 => VerifyError::RateLimited,
        500..=599 => VerifyError::ProviderServerError(status),
        _ => VerifyError::SubmissionRejected { status, message },
    }
}

// ============ Client ============

pub struct VerificationClient {
    client: Client,
    endpoints: DetectorEndpoints,
}

impl Default for VerificationClient {
    fn default() -> Self {
        Self::new()
    }
}

impl VerificationClient {
    pub fn new() -> Self {
        Self::with_endpoints(DetectorEndpoints::resolved())
    }

    pub fn with_endpoints(endpoints: DetectorEndpoints) -> Self {
        // Timeouts are per-request (media kind dependent), not client-wide.
        let client = Client::builder().build().unwrap_or_default();
        Self { client, endpoints }
    }

    pub fn endpoints(&self) -> &DetectorEndpoints {
        &self.endpoints
    }

    /// Run the full workflow with the default normalization policy.
    pub async fn verify(
        &self,
        file: &MediaFile,
        api_key: &str,
    ) -> Result<VerificationResult, VerifyError> {
        self.verify_with(file, api_key, NormalizerPolicy::default())
            .await
    }

    /// Run the full workflow: classify, submit, poll if asynchronous,
    /// normalize. Exactly one submission call; zero network activity when
    /// the credential is missing or the file cannot be classified.
    pub async fn verify_with(
        &self,
        file: &MediaFile,
        api_key: &str,
        policy: NormalizerPolicy,
    ) -> Result<VerificationResult, VerifyError> {
        if api_key.trim().is_empty() {
            return Err(VerifyError::MissingApiKey);
        }
        let media_kind = classify(&file.mime_type, &file.file_name)?;
        info!(
            "[CLIENT] submitting {} ({} bytes) as {}",
            file.file_name,
            file.bytes.len(),
            media_kind.as_str()
        );

        let started = Instant::now();
        let payload = self.submit(file, media_kind, api_key).await?;

        let (report_id, report) = match extract_handoff(&payload) {
            Handoff::Inline { report_id, report } => (report_id, report),
            Handoff::Pending { report_id } => {
                info!(
                    "[CLIENT] report {} accepted for asynchronous processing",
                    report_id
                );
                let report =
                    poll_report(&report_id, |_| self.fetch_status(&report_id, api_key)).await?;
                (report_id, report)
            }
        };

        let ctx = NormalizeContext {
            media_kind,
            report_id,
            processing_time: started.elapsed().as_secs_f64(),
            policy,
        };
        normalize_report(&report, &ctx)
    }

    async fn submit(
        &self,
        file: &MediaFile,
        media_kind: MediaKind,
        api_key: &str,
    ) -> Result<Value, VerifyError> {
        let (url, timeout) = self.upload_target(media_kind);

        let mut part = Part::bytes(file.bytes.clone()).file_name(file.file_name.clone());
        let mime = file.mime_type.trim();
        if !mime.is_empty() {
            part = part
                .mime_str(mime)
                .map_err(|_| VerifyError::UnsupportedMediaType(mime.to_string()))?;
        }
        let form = Form::new().part(media_kind.upload_field(), part);

        let response = self
            .client
            .post(url)
            .bearer_auth(api_key)
            .timeout(timeout)
            .multipart(form)
            .send()
            .await
            .map_err(|e| VerifyError::from_transport(&e))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            warn!(
                "[CLIENT] submission of {} rejected: HTTP {}",
                file.file_name, status
            );
            return Err(submission_error(status.as_u16(), message));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| VerifyError::MalformedResponse(e.to_string()))
    }

    fn upload_target(&self, media_kind: MediaKind) -> (&str, Duration) {
        match media_kind {
            MediaKind::Image => (self.endpoints.image_report_url.as_str(), IMAGE_UPLOAD_TIMEOUT),
            MediaKind::Video => (self.endpoints.video_report_url.as_str(), VIDEO_UPLOAD_TIMEOUT),
        }
    }

    /// One status probe for the poller. The request is built synchronously so
    /// the returned future owns everything it needs.
    fn fetch_status(
        &self,
        report_id: &str,
        api_key: &str,
    ) -> impl Future<Output = Result<StatusSnapshot, ProbeFailure>> {
        let request = self
            .client
            .get(self.endpoints.status_url_for(report_id))
            .bearer_auth(api_key)
            .timeout(POLL_REQUEST_TIMEOUT);

        async move {
            let response = request.send().await.map_err(|e| {
                if e.is_timeout() {
                    ProbeFailure::Timeout
                } else {
                    ProbeFailure::Transport(e.to_string())
                }
            })?;

            let status = response.status();
            if !status.is_success() {
                return Err(ProbeFailure::Http(status.as_u16()));
            }

            response
                .json::<StatusSnapshot>()
                .await
                .map_err(|e| ProbeFailure::Malformed(e.to_string()))
        }
    }
}
