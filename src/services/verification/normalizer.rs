// Report normalization
// Maps the provider's variably shaped report JSON into one stable
// VerificationResult. The provider has shipped several historical formats
// (different nesting for image vs. video, probabilities as fractions or
// percentages, sides missing entirely), so extraction runs a declarative
// chain of per-media-kind strategies in priority order instead of nested
// conditional probing. Performs no I/O and is fully deterministic: the
// result id is derived from the report id and payload, never random.

use crate::error::VerifyError;
use crate::models::{
    DetectionDetails, MediaKind, NormalizerPolicy, StatusPolicy, VerificationResult,
    VerificationStatus,
};
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

/// Floor for the reported wall-clock processing time, seconds. Avoids a
/// zero or negative display value for near-instant image reports.
const MIN_PROCESSING_TIME: f64 = 0.1;

/// Context the workflow supplies alongside the raw payload. Processing time
/// is measured by the caller; the normalizer never reads a clock.
#[derive(Debug, Clone)]
pub struct NormalizeContext {
    pub media_kind: MediaKind,
    pub report_id: String,
    pub processing_time: f64,
    pub policy: NormalizerPolicy,
}

/// Raw probability signal pulled out of one payload shape. Values are on
/// the 0-100 scale after extraction.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct SignalExtract {
    ai: Option<f64>,
    human: Option<f64>,
    detected: Option<bool>,
}

impl SignalExtract {
    fn is_empty(&self) -> bool {
        self.ai.is_none() && self.human.is_none() && self.detected.is_none()
    }
}

type Strategy = fn(&Value) -> Option<SignalExtract>;

/// Most specific shape first; the first strategy that yields anything wins.
const IMAGE_STRATEGIES: &[Strategy] = &[
    extract_image_block,
    extract_probability_pair,
    extract_confidence_object,
];

const VIDEO_STRATEGIES: &[Strategy] = &[
    extract_video_block,
    extract_probability_pair,
    extract_confidence_object,
];

/// Convert one terminal provider payload into exactly one VerificationResult.
pub fn normalize_report(
    raw: &Value,
    ctx: &NormalizeContext,
) -> Result<VerificationResult, VerifyError> {
    if !raw.is_object() {
        return Err(VerifyError::MalformedResponse(
            "report payload is not a JSON object".to_string(),
        ));
    }

    let strategies = match ctx.media_kind {
        MediaKind::Image => IMAGE_STRATEGIES,
        MediaKind::Video => VIDEO_STRATEGIES,
    };
    let signal = strategies
        .iter()
        .find_map(|strategy| strategy(raw))
        .unwrap_or_default();

    if signal.is_empty() {
        debug!(
            "[NORMALIZER] report {}: no numeric signal in payload, falling back to verdict",
            ctx.report_id
        );
    }

    let verdict = raw
        .get("verdict")
        .and_then(Value::as_str)
        .map(|v| v.trim().to_ascii_lowercase());

    let (ai_probability, human_probability) =
        resolve_sides(signal.ai, signal.human, ctx.policy.infer_complement);
    let (status, confidence) = decide_status(
        &signal,
        ai_probability,
        human_probability,
        verdict.as_deref(),
        ctx.policy.status_policy,
    );

    Ok(VerificationResult {
        id: derive_result_id(&ctx.report_id, raw),
        report_id: ctx.report_id.clone(),
        content_type: ctx.media_kind,
        status,
        confidence,
        ai_probability,
        human_probability,
        detection_details: extract_details(raw),
        risk_factors: string_list(raw, "risk_factors"),
        recommendations: string_list(raw, "recommendations"),
        resolution: extract_resolution(raw),
        duration: extract_duration(raw),
        processing_time: ctx.processing_time.max(MIN_PROCESSING_TIME),
        raw_api_response: raw.clone(),
        generator_analysis: raw
            .get("generator")
            .or_else(|| raw.get("generator_analysis"))
            .cloned(),
        api_verdict: verdict,
    })
}

/// Stable id for downstream persistence: UUID v5 over the report id and the
/// payload text, so the same terminal payload always yields the same result.
fn derive_result_id(report_id: &str, raw: &Value) -> String {
    let seed = format!("{}:{}", report_id, raw);
    Uuid::new_v5(&Uuid::NAMESPACE_OID, seed.as_bytes()).to_string()
}

// ============ Extraction Strategies ============

/// Promote a 0-1 fraction to the 0-100 scale; values already above 1 are
/// taken as percentages. Clamped either way.
fn scale(value: f64) -> f64 {
    let value = if value <= 1.0 { value * 100.0 } else { value };
    value.clamp(0.0, 100.0)
}

fn block_probability(block: &Value) -> Option<f64> {
    block
        .get("probability")
        .and_then(Value::as_f64)
        .or_else(|| block.get("confidence").and_then(Value::as_f64))
        .map(scale)
}

/// Per-video analysis block: `ai_video` / `human_video` with their own
/// is_detected / probability / confidence fields.
fn extract_video_block(raw: &Value) -> Option<SignalExtract> {
    let ai_block = raw.get("ai_video")?;
    let signal = SignalExtract {
        ai: block_probability(ai_block),
        human: raw.get("human_video").and_then(block_probability),
        detected: ai_block.get("is_detected").and_then(Value::as_bool),
    };
    (!signal.is_empty()).then_some(signal)
}

/// Per-image analysis block: `ai` / `human` sub-objects.
fn extract_image_block(raw: &Value) -> Option<SignalExtract> {
    let ai_block = raw.get("ai")?;
    if !ai_block.is_object() {
        return None;
    }
    let signal = SignalExtract {
        ai: block_probability(ai_block),
        human: raw
            .get("human")
            .filter(|v| v.is_object())
            .and_then(block_probability),
        detected: ai_block.get("is_detected").and_then(Value::as_bool),
    };
    (!signal.is_empty()).then_some(signal)
}

/// Generic top-level probability pair.
fn extract_probability_pair(raw: &Value) -> Option<SignalExtract> {
    let ai = raw
        .get("ai_probability")
        .or_else(|| raw.get("aiProbability"))
        .and_then(Value::as_f64)
        .map(scale);
    let human = raw
        .get("human_probability")
        .or_else(|| raw.get("humanProbability"))
        .and_then(Value::as_f64)
        .map(scale);
    if ai.is_none() && human.is_none() {
        return None;
    }
    Some(SignalExtract {
        ai,
        human,
        detected: None,
    })
}

/// Generic nested confidence: either `confidence: {ai, human}` or a scalar
/// `confidence` that only means something next to a verdict field.
fn extract_confidence_object(raw: &Value) -> Option<SignalExtract> {
    let confidence = raw.get("confidence")?;
    if let Some(map) = confidence.as_object() {
        let ai = map.get("ai").and_then(Value::as_f64).map(scale);
        let human = map.get("human").and_then(Value::as_f64).map(scale);
        if ai.is_none() && human.is_none() {
            return None;
        }
        return Some(SignalExtract {
            ai,
            human,
            detected: None,
        });
    }

    let scalar = confidence.as_f64().map(scale)?;
    match raw.get("verdict").and_then(Value::as_str) {
        Some(v) if v.eq_ignore_ascii_case("ai") => Some(SignalExtract {
            ai: Some(scalar),
            human: None,
            detected: None,
        }),
        Some(v) if v.eq_ignore_ascii_case("human") => Some(SignalExtract {
            ai: None,
            human: Some(scalar),
            detected: None,
        }),
        // A bare scalar with no side attached is unusable.
        _ => None,
    }
}

// ============ Status Decision ============

/// Fill in both sides. The missing side becomes the complement of the known
/// one only when policy permits; otherwise it stays at zero.
fn resolve_sides(ai: Option<f64>, human: Option<f64>, infer_complement: bool) -> (f64, f64) {
    match (ai, human) {
        (Some(a), Some(h)) => (a, h),
        (Some(a), None) if infer_complement => (a, (100.0 - a).clamp(0.0, 100.0)),
        (None, Some(h)) if infer_complement => ((100.0 - h).clamp(0.0, 100.0), h),
        (Some(a), None) => {
            debug!("[NORMALIZER] human side missing, complement inference disabled");
            (a, 0.0)
        }
        (None, Some(h)) => {
            debug!("[NORMALIZER] ai side missing, complement inference disabled");
            (0.0, h)
        }
        (None, None) => (0.0, 0.0),
    }
}

/// Decide the status band and its confidence. Precedence: explicit detected
/// flag, then provider verdict, then probability comparison under the
/// configured policy. Ties and all-zero signals stay authentic with zero
/// confidence; the alarming state is never the default.
fn decide_status(
    signal: &SignalExtract,
    ai: f64,
    human: f64,
    verdict: Option<&str>,
    policy: StatusPolicy,
) -> (VerificationStatus, f64) {
    if let Some(detected) = signal.detected {
        return if detected {
            (VerificationStatus::Fake, ai)
        } else {
            (VerificationStatus::Authentic, human)
        };
    }

    match verdict {
        Some("ai") => return (VerificationStatus::Fake, ai),
        Some("human") => return (VerificationStatus::Authentic, human),
        _ => {}
    }

    if ai == 0.0 && human == 0.0 {
        return (VerificationStatus::Authentic, 0.0);
    }

    match policy {
        StatusPolicy::Majority => {
            if ai > human {
                (VerificationStatus::Fake, ai)
            } else if human > ai {
                (VerificationStatus::Authentic, human)
            } else {
                (VerificationStatus::Authentic, 0.0)
            }
        }
        StatusPolicy::Banded {
            fake_min,
            authentic_max,
        } => {
            if ai >= fake_min {
                (VerificationStatus::Fake, ai)
            } else if ai <= authentic_max {
                (VerificationStatus::Authentic, human)
            } else {
                (VerificationStatus::Suspicious, ai)
            }
        }
    }
}

// ============ Field Mapping ============

/// Facet score at `key`, either a bare number or an object carrying
/// `score`/`confidence`. Checked at the top level and under `details`.
fn facet_score(raw: &Value, key: &str) -> Option<f64> {
    let node = raw
        .get(key)
        .or_else(|| raw.get("details").and_then(|d| d.get(key)))?;
    match node {
        Value::Number(_) => node.as_f64().map(scale),
        Value::Object(_) => node
            .get("score")
            .or_else(|| node.get("confidence"))
            .and_then(Value::as_f64)
            .map(scale),
        _ => None,
    }
}

fn extract_details(raw: &Value) -> DetectionDetails {
    DetectionDetails {
        face_analysis: facet_score(raw, "face_analysis"),
        temporal_consistency: facet_score(raw, "temporal_consistency"),
        audio_analysis: facet_score(raw, "audio_analysis"),
        compression_artifacts: facet_score(raw, "compression_artifacts"),
        metadata_analysis: facet_score(raw, "metadata_analysis"),
        pixel_analysis: facet_score(raw, "pixel_analysis"),
    }
}

fn string_list(raw: &Value, key: &str) -> Vec<String> {
    raw.get(key)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn extract_resolution(raw: &Value) -> Option<String> {
    if let Some(s) = raw.get("resolution").and_then(Value::as_str) {
        return Some(s.to_string());
    }
    let metadata = raw.get("metadata")?;
    let width = metadata.get("width").and_then(Value::as_u64)?;
    let height = metadata.get("height").and_then(Value::as_u64)?;
    Some(format!("{}x{}", width, height))
}

fn extract_duration(raw: &Value) -> Option<f64> {
    raw.get("duration")
        .or_else(|| raw.get("metadata").and_then(|m| m.get("duration")))
        .and_then(Value::as_f64)
}
