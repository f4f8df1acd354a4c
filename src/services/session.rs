// Session Store
// Persists the most recent verification result so an interrupted session can
// resume. The core workflow never calls this itself; callers inject it and
// decide when to record.

use crate::models::VerificationResult;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

pub trait SessionStore {
    fn save_latest(&self, result: &VerificationResult) -> Result<(), String>;
    fn load_latest(&self) -> Result<Option<VerificationResult>, String>;
    fn clear(&self) -> Result<(), String>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SessionEnvelope {
    saved_at: String,
    result: VerificationResult,
}

/// File-backed session store writing one timestamped JSON envelope.
pub struct JsonSessionStore {
    path: PathBuf,
}

impl JsonSessionStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Store under the platform config directory, when one exists.
    pub fn from_default_dir() -> Option<Self> {
        crate::services::config_store::default_config_dir()
            .map(|dir| Self::new(dir.join("session.json")))
    }
}

impl SessionStore for JsonSessionStore {
    fn save_latest(&self, result: &VerificationResult) -> Result<(), String> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create session dir: {}", e))?;
        }

        let envelope = SessionEnvelope {
            saved_at: chrono::Utc::now().to_rfc3339(),
            result: result.clone(),
        };
        let content = serde_json::to_string_pretty(&envelope)
            .map_err(|e| format!("Failed to serialize session: {}", e))?;

        fs::write(&self.path, content).map_err(|e| format!("Failed to write session: {}", e))
    }

    fn load_latest(&self) -> Result<Option<VerificationResult>, String> {
        if !self.path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&self.path)
            .map_err(|e| format!("Failed to read session: {}", e))?;

        let envelope: SessionEnvelope = serde_json::from_str(&content)
            .map_err(|e| format!("Failed to parse session: {}", e))?;
        Ok(Some(envelope.result))
    }

    fn clear(&self) -> Result<(), String> {
        if self.path.exists() {
            fs::remove_file(&self.path).map_err(|e| format!("Failed to clear session: {}", e))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        DetectionDetails, MediaKind, VerificationStatus,
    };
    use serde_json::json;

    fn sample_result() -> VerificationResult {
        VerificationResult {
            id: "00000000-0000-0000-0000-000000000001".to_string(),
            report_id: "r1".to_string(),
            content_type: MediaKind::Image,
            status: VerificationStatus::Fake,
            confidence: 82.0,
            ai_probability: 82.0,
            human_probability: 18.0,
            detection_details: DetectionDetails::default(),
            risk_factors: vec!["face swap artifacts".to_string()],
            recommendations: vec![],
            resolution: None,
            duration: None,
            processing_time: 1.2,
            raw_api_response: json!({"ai_probability": 0.82}),
            generator_analysis: None,
            api_verdict: None,
        }
    }

    fn temp_store() -> JsonSessionStore {
        let path = std::env::temp_dir()
            .join(format!("veriscan-session-{}", uuid::Uuid::new_v4()))
            .join("session.json");
        JsonSessionStore::new(path)
    }

    #[test]
    fn test_empty_store_loads_none() {
        let store = temp_store();
        assert!(store.load_latest().unwrap().is_none());
    }

    #[test]
    fn test_save_load_clear_round_trip() {
        let store = temp_store();
        let result = sample_result();
        store.save_latest(&result).unwrap();

        let loaded = store.load_latest().unwrap().expect("saved result");
        assert_eq!(loaded, result);

        store.clear().unwrap();
        assert!(store.load_latest().unwrap().is_none());
        // Clearing twice is harmless.
        store.clear().unwrap();
        let _ = fs::remove_dir_all(store.path.parent().unwrap());
    }
}
