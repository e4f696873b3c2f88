use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use image::DynamicImage;
use image::imageops::FilterType;
use std::io::Cursor;

/// Longer side of any image sent upstream; larger uploads are rescaled.
pub const MAX_DIMENSION: u32 = 1024;
const JPEG_QUALITY: u8 = 85;

#[derive(Debug, thiserror::Error)]
pub enum NormalizeError {
    #[error("No image provided")]
    EmptyImage,
}

#[derive(Debug, thiserror::Error)]
enum DownscaleError {
    #[error("base64 decode failed: {0}")]
    Decode(#[from] base64::DecodeError),
    #[error("image decode/encode failed: {0}")]
    Image(#[from] image::ImageError),
}

/// Receiving-side check at the server boundary. Only emptiness is
/// rejected here; payloads that do not look like a data URL pass
/// through unchanged and are re-wrapped by the identification client.
pub fn check_inbound_image(payload: &str) -> Result<&str, NormalizeError> {
    if payload.is_empty() {
        return Err(NormalizeError::EmptyImage);
    }
    Ok(payload)
}

/// Best-effort downscale of a `data:image/...` URL before the upstream
/// call. Never fails: any decode or encode problem returns the
/// original payload unchanged.
pub fn downscale_image(data_url: &str) -> String {
    match try_downscale(data_url) {
        Ok(Some(scaled)) => {
            log::info!(
                "Downscaled image payload from {} to {} bytes",
                data_url.len(),
                scaled.len()
            );
            scaled
        }
        Ok(None) => data_url.to_string(),
        Err(e) => {
            log::warn!("Image downscaling failed, sending original: {}", e);
            data_url.to_string()
        }
    }
}

/// Ok(None) means the payload needs no rescaling (not a data URL, or
/// already within bounds).
fn try_downscale(data_url: &str) -> Result<Option<String>, DownscaleError> {
    let Some(rest) = data_url.strip_prefix("data:image/") else {
        return Ok(None);
    };
    let Some((_, encoded)) = rest.split_once("base64,") else {
        return Ok(None);
    };

    let bytes = BASE64.decode(encoded.trim())?;
    let img = image::load_from_memory(&bytes)?;

    let (width, height) = (img.width(), img.height());
    if width.max(height) <= MAX_DIMENSION {
        return Ok(None);
    }

    let (new_width, new_height) = scaled_dimensions(width, height);
    let resized = img.resize_exact(new_width, new_height, FilterType::Lanczos3);
    // JPEG output; flatten any alpha channel first.
    let rgb = DynamicImage::ImageRgb8(resized.to_rgb8());

    let mut buf = Cursor::new(Vec::new());
    let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buf, JPEG_QUALITY);
    rgb.write_with_encoder(encoder)?;

    Ok(Some(format!(
        "data:image/jpeg;base64,{}",
        BASE64.encode(buf.into_inner())
    )))
}

/// Proportional dimensions with the longer side pinned to
/// `MAX_DIMENSION` and the shorter side rounded.
fn scaled_dimensions(width: u32, height: u32) -> (u32, u32) {
    if width > height {
        let scaled = (height as f64 * MAX_DIMENSION as f64 / width as f64).round() as u32;
        (MAX_DIMENSION, scaled.max(1))
    } else {
        let scaled = (width as f64 * MAX_DIMENSION as f64 / height as f64).round() as u32;
        (scaled.max(1), MAX_DIMENSION)
    }
}
