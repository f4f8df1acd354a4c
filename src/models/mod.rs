// Veriscan Data Models
// Stable shapes shared by the verification workflow and its callers

use serde::{Deserialize, Serialize};
use serde_json::Value;

// ============ Media Classification ============

#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Video => "video",
        }
    }

    /// Multipart field name the provider expects for this media kind.
    pub fn upload_field(&self) -> &'static str {
        match self {
            MediaKind::Image => "object",
            MediaKind::Video => "video",
        }
    }
}

/// One file submitted for verification. Ephemeral request input; never persisted here.
#[derive(Debug, Clone)]
pub struct MediaFile {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

// ============ Verification Status ============

/// The derived authenticity band. `Suspicious` only appears under a banded
/// status policy; the default majority policy is binary.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerificationStatus {
    Authentic,
    Suspicious,
    Fake,
}

impl VerificationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VerificationStatus::Authentic => "authentic",
            VerificationStatus::Suspicious => "suspicious",
            VerificationStatus::Fake => "fake",
        }
    }
}

// ============ Detection Details ============

/// Named facet scores (0-100). A facet is `Some` only when the provider
/// supplied it; nothing here is ever fabricated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct DetectionDetails {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub face_analysis: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temporal_consistency: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_analysis: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compression_artifacts: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata_analysis: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pixel_analysis: Option<f64>,
}

impl DetectionDetails {
    pub fn is_empty(&self) -> bool {
        self.face_analysis.is_none()
            && self.temporal_consistency.is_none()
            && self.audio_analysis.is_none()
            && self.compression_artifacts.is_none()
            && self.metadata_analysis.is_none()
            && self.pixel_analysis.is_none()
    }
}

// ============ Verification Result ============

/// The normalizer's output contract. Built exactly once per successful
/// workflow invocation, immutable thereafter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationResult {
    pub id: String,
    pub report_id: String,
    pub content_type: MediaKind,
    pub status: VerificationStatus,
    /// 0-100, the probability behind whichever status won.
    pub confidence: f64,
    pub ai_probability: f64,
    pub human_probability: f64,
    pub detection_details: DetectionDetails,
    #[serde(default)]
    pub risk_factors: Vec<String>,
    #[serde(default)]
    pub recommendations: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolution: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    /// Wall-clock seconds from submission to normalized result.
    pub processing_time: f64,
    /// Full terminal payload, preserved for audit and report generation.
    pub raw_api_response: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generator_analysis: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_verdict: Option<String>,
}

// ============ Poll Status ============

/// One parsed status response from the report endpoint. Missing fields
/// deserialize to defaults so an unexpected body reads as "still working".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusSnapshot {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub report: Option<Value>,
}

// ============ Normalization Policy ============

/// Maps the extracted AI probability (0-100) to a status band when the
/// provider gave no explicit detected flag or verdict.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "camelCase")]
pub enum StatusPolicy {
    /// Strictly-greater side wins; ties stay authentic.
    Majority,
    /// Three bands: >= fakeMin is fake, <= authenticMax is authentic,
    /// anything between is suspicious.
    #[serde(rename_all = "camelCase")]
    Banded {
        #[serde(default = "default_fake_min")]
        fake_min: f64,
        #[serde(default = "default_authentic_max")]
        authentic_max: f64,
    },
}

impl Default for StatusPolicy {
    fn default() -> Self {
        StatusPolicy::Majority
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizerPolicy {
    /// When only one probability side is known, infer the other as its
    /// complement. Off, the missing side stays at zero.
    #[serde(default = "default_true")]
    pub infer_complement: bool,
    #[serde(default)]
    pub status_policy: StatusPolicy,
}

impl Default for NormalizerPolicy {
    fn default() -> Self {
        Self {
            infer_complement: true,
            status_policy: StatusPolicy::default(),
        }
    }
}

// ============ Default Value Functions ============

fn default_true() -> bool { true }
fn default_fake_min() -> f64 { 70.0 }
fn default_authentic_max() -> f64 { 30.0 }
