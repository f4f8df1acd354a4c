// Manual end-to-end check: verify one file against the configured provider
// and print the normalized result as JSON.

use anyhow::{Context, Result};
use veriscan::services::config_store;
use veriscan::{init_logging, MediaFile, VerificationClient};

fn guess_mime(file_name: &str) -> String {
    let ext = file_name
        .rsplit('.')
        .next()
        .unwrap_or_default()
        .to_ascii_lowercase();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "mp4" | "m4v" => "video/mp4",
        "mov" => "video/quicktime",
        "webm" => "video/webm",
        "avi" => "video/x-msvideo",
        // Let extension fallback in the classifier handle the rest.
        _ => "",
    }
    .to_string()
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();

    let path = std::env::args()
        .nth(1)
        .context("usage: verify_file <path>")?;
    let bytes = std::fs::read(&path).with_context(|| format!("failed to read {}", path))?;
    let file_name = std::path::Path::new(&path)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("upload.bin")
        .to_string();
    let mime_type = guess_mime(&file_name);

    let api_key = config_store::get_api_key()
        .context("no API key configured (set VERISCAN_API_KEY or store one in the config file)")?;

    let client = VerificationClient::new();
    let result = client
        .verify(
            &MediaFile {
                file_name,
                mime_type,
                bytes,
            },
            &api_key,
        )
        .await?;

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}
