//! Seed image encoding for transmission.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::ImageFormat;
use std::path::Path;

use crate::error::{RunwayError, RunwayResult};

/// Read an image file and encode it as a `data:` URI.
pub async fn encode_image_file(path: &Path) -> RunwayResult<String> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|source| RunwayError::SeedImage {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(data_uri(&bytes))
}

/// Encode image bytes as a base64 `data:` URI; mime type sniffed from magic bytes.
pub fn data_uri(bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime_type(bytes), STANDARD.encode(bytes))
}

fn mime_type(bytes: &[u8]) -> &'static str {
    match image::guess_format(bytes) {
        Ok(ImageFormat::Jpeg) => "image/jpeg",
        Ok(ImageFormat::WebP) => "image/webp",
        _ => "image/png",
    }
}
