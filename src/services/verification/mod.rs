// Verification Module
// Media verification core logic organized into specialized submodules:
// - media_type: classifies uploads as image or video
// - poller: drives asynchronous video jobs to a terminal state
// - normalizer: maps raw provider reports into one stable result shape

pub mod media_type;
pub mod normalizer;
pub mod poller;

pub use media_type::classify;
pub use normalizer::{normalize_report, NormalizeContext};
pub use poller::{
    poll_report, ProbeFailure, MAX_POLL_ATTEMPTS, POLL_INTERVAL, POLL_REQUEST_TIMEOUT,
};
