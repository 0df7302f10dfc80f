//! Off-thread JPEG compression.

use futures_util::StreamExt;
use futures_util::stream::FuturesUnordered;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView};
use serde::{Deserialize, Serialize};
use sitereport_protocol::Payload;
use sitereport_protocol::constants::{DEFAULT_EXTENSION, DEFAULT_MIME};
use tracing::debug;

use crate::error::ImagingError;
use crate::processed::Processed;

/// Quality decrement between encode attempts.
const QUALITY_STEP: u8 = 10;

/// Size envelope for compressed photos.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CompressionOptions {
    /// Target upper bound for the encoded size.
    pub max_bytes: usize,
    /// Longest edge, in pixels.
    pub max_dimension: u32,
    /// JPEG quality of the first attempt.
    pub initial_quality: u8,
    /// Lowest JPEG quality tried before giving up on the byte target.
    pub min_quality: u8,
}

impl Default for CompressionOptions {
    fn default() -> Self {
        Self {
            max_bytes: 512 * 1024,
            max_dimension: 1920,
            initial_quality: 90,
            min_quality: 30,
        }
    }
}

/// Compresses one photo on the blocking pool.
///
/// The output is always `image/jpeg` with a `.jpg` file name. Any failure
/// yields [`Processed::Fallback`] with `payload` unchanged.
pub async fn compress_image(payload: Payload, options: &CompressionOptions) -> Processed<Payload> {
    let opts = *options;
    let input = payload.clone();
    let result = tokio::task::spawn_blocking(move || compress_blocking(&input, &opts))
        .await
        .map_err(ImagingError::from)
        .and_then(|r| r);

    match result {
        Ok(compressed) => {
            debug!(
                file = %payload.name,
                before = payload.len(),
                after = compressed.len(),
                "photo compressed"
            );
            Processed::Optimized(compressed)
        }
        Err(e) => {
            debug!(file = %payload.name, error = %e, "compression skipped, keeping original");
            Processed::Fallback {
                original: payload,
                reason: e.to_string(),
            }
        }
    }
}

/// Compresses photos one after another, reporting `(completed, total)`
/// after each. Output order matches input order.
pub async fn compress_sequential(
    payloads: Vec<Payload>,
    options: &CompressionOptions,
    mut on_progress: impl FnMut(usize, usize),
) -> Vec<Processed<Payload>> {
    let total = payloads.len();
    let mut results = Vec::with_capacity(total);
    for payload in payloads {
        results.push(compress_image(payload, options).await);
        on_progress(results.len(), total);
    }
    results
}

/// Compresses photos concurrently, reporting `(completed, total)` as each
/// finishes. Output order matches input order.
pub async fn compress_parallel(
    payloads: Vec<Payload>,
    options: &CompressionOptions,
    mut on_progress: impl FnMut(usize, usize),
) -> Vec<Processed<Payload>> {
    let total = payloads.len();
    let mut pending: FuturesUnordered<_> = payloads
        .into_iter()
        .enumerate()
        .map(|(idx, payload)| async move { (idx, compress_image(payload, options).await) })
        .collect();

    let mut slots: Vec<Option<Processed<Payload>>> = (0..total).map(|_| None).collect();
    let mut completed = 0;
    while let Some((idx, result)) = pending.next().await {
        slots[idx] = Some(result);
        completed += 1;
        on_progress(completed, total);
    }
    slots.into_iter().flatten().collect()
}

fn compress_blocking(
    payload: &Payload,
    options: &CompressionOptions,
) -> Result<Payload, ImagingError> {
    let img = decode(payload)?;
    let data = shrink_to_jpeg(
        img,
        options.max_dimension,
        FilterType::Lanczos3,
        options.max_bytes,
        options.initial_quality,
        options.min_quality,
    )?;
    Ok(Payload::new(
        payload.renamed_with_extension(DEFAULT_EXTENSION),
        DEFAULT_MIME,
        data,
    ))
}

pub(crate) fn decode(payload: &Payload) -> Result<DynamicImage, ImagingError> {
    if payload.is_empty() {
        return Err(ImagingError::Empty);
    }
    image::load_from_memory(&payload.data).map_err(ImagingError::Decode)
}

/// Downscales `img` to fit `max_dimension` and encodes it as JPEG, stepping
/// quality down until the output fits `max_bytes` or `min_quality` is hit.
pub(crate) fn shrink_to_jpeg(
    img: DynamicImage,
    max_dimension: u32,
    filter: FilterType,
    max_bytes: usize,
    initial_quality: u8,
    min_quality: u8,
) -> Result<Vec<u8>, ImagingError> {
    let (width, height) = img.dimensions();
    let img = if width.max(height) > max_dimension {
        img.resize(max_dimension, max_dimension, filter)
    } else {
        img
    };

    let min_quality = min_quality.clamp(1, 100);
    let mut quality = initial_quality.clamp(min_quality, 100);
    loop {
        let out = encode_jpeg(&img, quality)?;
        if out.len() <= max_bytes || quality <= min_quality {
            return Ok(out);
        }
        quality = quality.saturating_sub(QUALITY_STEP).max(min_quality);
    }
}

fn encode_jpeg(img: &DynamicImage, quality: u8) -> Result<Vec<u8>, ImagingError> {
    // JPEG has no alpha channel.
    let rgb = img.to_rgb8();
    let mut buf = Vec::new();
    {
        let mut encoder = JpegEncoder::new_with_quality(&mut buf, quality);
        encoder.encode_image(&rgb).map_err(ImagingError::Encode)?;
    }
    Ok(buf)
}
