// Media type classification
// MIME prefix decides; generic or absent MIME falls back to the file extension.
// Anything unclassifiable is rejected before the first network call.

use crate::error::VerifyError;
use crate::models::MediaKind;
use regex::Regex;
use std::sync::OnceLock;

static VIDEO_EXT_RE: OnceLock<Regex> = OnceLock::new();
static IMAGE_EXT_RE: OnceLock<Regex> = OnceLock::new();

fn video_ext_re() -> &'static Regex {
    VIDEO_EXT_RE.get_or_init(|| {
        Regex::new(r"(?i)\.(mp4|m4v|mov|avi|mkv|webm|wmv|flv|3gp|mpe?g|ts)$").unwrap()
    })
}

fn image_ext_re() -> &'static Regex {
    IMAGE_EXT_RE.get_or_init(|| {
        Regex::new(r"(?i)\.(jpe?g|png|gif|webp|bmp|tiff?|heic|heif|avif)$").unwrap()
    })
}

fn is_generic_mime(mime: &str) -> bool {
    mime.is_empty() || mime == "application/octet-stream" || mime == "binary/octet-stream"
}

/// Resolve a file to exactly one media kind, or fail with
/// `UnsupportedMediaType`.
pub fn classify(mime_type: &str, file_name: &str) -> Result<MediaKind, VerifyError> {
    let mime = mime_type.trim().to_ascii_lowercase();

    if mime.starts_with("image/") {
        return Ok(MediaKind::Image);
    }
    if mime.starts_with("video/") {
        return Ok(MediaKind::Video);
    }

    // Browsers often hand video files over with a generic MIME type; the
    // extension is the only usable signal then.
    if is_generic_mime(&mime) {
        if video_ext_re().is_match(file_name) {
            return Ok(MediaKind::Video);
        }
        if image_ext_re().is_match(file_name) {
            return Ok(MediaKind::Image);
        }
    }

    let label = if mime.is_empty() {
        file_name.to_string()
    } else {
        mime
    };
    Err(VerifyError::UnsupportedMediaType(label))
}
