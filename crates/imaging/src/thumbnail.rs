//! Fast preview thumbnails.

use image::imageops::FilterType;
use sitereport_protocol::Payload;
use sitereport_protocol::constants::{DEFAULT_EXTENSION, DEFAULT_MIME};
use tracing::debug;

use crate::compress::{decode, shrink_to_jpeg};
use crate::error::ImagingError;
use crate::processed::Processed;
use crate::registry::{PreviewHandle, PreviewRegistry};

/// Thumbnail envelope: small and cheap rather than pretty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThumbnailOptions {
    pub max_dimension: u32,
    pub max_bytes: usize,
    pub quality: u8,
}

impl Default for ThumbnailOptions {
    fn default() -> Self {
        Self {
            max_dimension: 300,
            max_bytes: 50 * 1024,
            quality: 70,
        }
    }
}

/// Produces a thumbnail payload on the blocking pool.
///
/// On failure the original payload is returned as the preview.
pub async fn generate_thumbnail(payload: Payload, options: ThumbnailOptions) -> Processed<Payload> {
    let input = payload.clone();
    let result = tokio::task::spawn_blocking(move || thumbnail_blocking(&input, &options))
        .await
        .map_err(ImagingError::from)
        .and_then(|r| r);

    match result {
        Ok(thumb) => Processed::Optimized(thumb),
        Err(e) => {
            debug!(file = %payload.name, error = %e, "thumbnail failed, previewing original");
            Processed::Fallback {
                original: payload,
                reason: e.to_string(),
            }
        }
    }
}

/// Generates a thumbnail and registers it as a local preview.
///
/// Returns the owning handle and whether the original had to be used.
pub async fn create_thumbnail(
    registry: &PreviewRegistry,
    payload: Payload,
    options: ThumbnailOptions,
) -> (PreviewHandle, bool) {
    let processed = generate_thumbnail(payload, options).await;
    let degraded = processed.is_degraded();
    (registry.register(processed.into_inner()), degraded)
}

fn thumbnail_blocking(
    payload: &Payload,
    options: &ThumbnailOptions,
) -> Result<Payload, ImagingError> {
    let img = decode(payload)?;
    // A single encode pass is usually enough at this size; the quality floor
    // keeps the loop short when it is not.
    let data = shrink_to_jpeg(
        img,
        options.max_dimension,
        FilterType::Triangle,
        options.max_bytes,
        options.quality,
        options.quality.saturating_sub(30),
    )?;
    Ok(Payload::new(
        payload.renamed_with_extension(DEFAULT_EXTENSION),
        DEFAULT_MIME,
        data,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compress::tests::png_payload;
    use image::GenericImageView;

    #[tokio::test]
    async fn thumbnail_fits_envelope() {
        let input = png_payload("wall.png", 1200, 800);
        let opts = ThumbnailOptions::default();
        let result = generate_thumbnail(input, opts).await;
        assert!(!result.is_degraded());

        let thumb = result.into_inner();
        assert_eq!(thumb.mime, "image/jpeg");
        assert!(thumb.len() <= opts.max_bytes);
        let decoded = image::load_from_memory(&thumb.data).unwrap();
        assert_eq!(decoded.dimensions(), (300, 200));
    }

    #[tokio::test]
    async fn unreadable_input_previews_original() {
        let input = Payload::new("scan.raw", "", vec![7u8; 32]);
        let result = generate_thumbnail(input.clone(), ThumbnailOptions::default()).await;
        assert!(result.is_degraded());
        assert_eq!(result.into_inner(), input);
    }

    #[tokio::test]
    async fn create_thumbnail_registers_preview() {
        let registry = PreviewRegistry::new();
        let input = Payload::new("scan.raw", "", vec![7u8; 32]);

        let (handle, degraded) =
            create_thumbnail(&registry, input.clone(), ThumbnailOptions::default()).await;
        assert!(degraded);
        assert_eq!(registry.live_count(), 1);
        assert_eq!(registry.resolve(handle.id()), Some(input));

        drop(handle);
        assert_eq!(registry.live_count(), 0);
    }
}
