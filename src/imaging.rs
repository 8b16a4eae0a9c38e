//! Image preparation for upload.
//!
//! Fixed policy: decode, scale to fit within 2400x2400, re-encode as a
//! quality-85 JPEG, and rename the extension to `.jpg`. Input that does not
//! decode is uploaded untouched rather than rejected.

use bytes::Bytes;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use tracing::{debug, warn};

const MAX_DIMENSION: u32 = 2400;
const JPEG_QUALITY: u8 = 85;

/// Bytes and file name ready for `upload_file`.
#[derive(Debug, Clone)]
pub struct PreparedImage {
    pub data: Bytes,
    pub file_name: String,
}

/// Swaps a file name's extension for `.jpg`.
pub fn jpg_file_name(file_name: &str) -> String {
    match file_name.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => format!("{}.jpg", stem),
        _ => format!("{}.jpg", file_name),
    }
}

/// Applies the compression policy to one uploaded file.
pub fn compress_for_upload(data: Bytes, file_name: &str) -> PreparedImage {
    let decoded = match image::load_from_memory(&data) {
        Ok(decoded) => decoded,
        Err(error) => {
            warn!(%error, file_name, "input did not decode as an image, uploading as-is");
            return PreparedImage {
                data,
                file_name: file_name.to_string(),
            };
        }
    };

    let resized = if decoded.width() > MAX_DIMENSION || decoded.height() > MAX_DIMENSION {
        decoded.resize(MAX_DIMENSION, MAX_DIMENSION, FilterType::Lanczos3)
    } else {
        decoded
    };

    let rgb = resized.to_rgb8();
    let mut encoded = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut encoded, JPEG_QUALITY);
    if let Err(error) = rgb.write_with_encoder(encoder) {
        warn!(%error, file_name, "re-encoding failed, uploading as-is");
        return PreparedImage {
            data,
            file_name: file_name.to_string(),
        };
    }

    debug!(
        original = data.len(),
        compressed = encoded.len(),
        width = rgb.width(),
        height = rgb.height(),
        "compressed image for upload"
    );
    PreparedImage {
        data: Bytes::from(encoded),
        file_name: jpg_file_name(file_name),
    }
}
