// Veriscan Core Services

pub mod client;
pub mod config_store;
pub mod session;
pub mod verification;

pub use client::{DetectorEndpoints, VerificationClient};
pub use config_store::{default_config_dir, get_api_key, AppConfig, ConfigStore, DetectorSettings};
pub use session::{JsonSessionStore, SessionStore};

// Re-export verification module functions
pub use verification::{
    classify,
    normalize_report,
    poll_report,
    NormalizeContext,
    ProbeFailure,
    MAX_POLL_ATTEMPTS,
    POLL_INTERVAL,
    POLL_REQUEST_TIMEOUT,
};
