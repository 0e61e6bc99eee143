use std::path::{Path, PathBuf};

use async_trait::async_trait;
use image::codecs::jpeg::JpegEncoder;
use uuid::Uuid;

use crate::{
    entities::asset::{CompressedImage, ImageFormat, ScanAsset},
    errors::PreprocessError,
    repositories::preprocessor::ImagePreprocessor,
};

/// Content types the decoder accepts. Anything else (HEIC, RAW, video...) is rejected up front.
const SUPPORTED_MIME_TYPES: &[&str] = &[
    "image/jpeg",
    "image/png",
    "image/webp",
    "image/gif",
    "image/bmp",
    "image/tiff",
];

/// Re-encodes scan assets as JPEG at a fixed quality into a scratch directory.
#[derive(Debug, Clone)]
pub struct JpegCompressor {
    output_dir: PathBuf,
    quality: f32,
}

impl JpegCompressor {
    pub fn new(output_dir: impl Into<PathBuf>, quality: f32) -> Self {
        JpegCompressor {
            output_dir: output_dir.into(),
            quality: quality.clamp(0.01, 1.0),
        }
    }

    pub fn quality(&self) -> f32 {
        self.quality
    }

    /// Quality on the encoder's 1..=100 scale.
    fn encoder_quality(&self) -> u8 {
        (self.quality * 100.0).round().clamp(1.0, 100.0) as u8
    }
}

/// Decodes `bytes` and encodes them as a baseline RGB JPEG.
fn encode_jpeg(bytes: &[u8], quality: u8) -> Result<Vec<u8>, PreprocessError> {
    let decoded = image::load_from_memory(bytes)?;
    let rgb = decoded.to_rgb8();

    let mut out = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut out, quality);
    encoder.encode_image(&rgb)?;

    Ok(out)
}

/// Writes the encoded image, removing whatever was written if the write fails.
async fn write_scratch(target: &Path, encoded: &[u8]) -> Result<(), PreprocessError> {
    if let Err(e) = tokio::fs::write(target, encoded).await {
        if let Err(cleanup) = tokio::fs::remove_file(target).await {
            if cleanup.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!("Could not remove partial image {}: {}", target.display(), cleanup);
            }
        }
        return Err(PreprocessError::EncodeFailed(format!("{}: {}", target.display(), e)));
    }
    Ok(())
}

#[async_trait]
impl ImagePreprocessor for JpegCompressor {
    async fn compress(&self, asset: &ScanAsset) -> Result<CompressedImage, PreprocessError> {
        let source = asset
            .local_path()
            .ok_or_else(|| PreprocessError::Unreadable(format!("not a local asset: {}", asset.uri)))?;

        let bytes = tokio::fs::read(&source)
            .await
            .map_err(|e| PreprocessError::Unreadable(format!("{}: {}", source.display(), e)))?;

        let detected = infer::get(&bytes)
            .map(|kind| kind.mime_type())
            .ok_or_else(|| PreprocessError::UnsupportedFormat("unrecognized content".to_string()))?;

        if !SUPPORTED_MIME_TYPES.contains(&detected) {
            return Err(PreprocessError::UnsupportedFormat(detected.to_string()));
        }
        if let Some(hint) = asset.mime_type.as_deref() {
            if hint != detected {
                tracing::debug!("Asset declared {} but content is {}", hint, detected);
            }
        }

        let quality = self.encoder_quality();
        let encoded = tokio::task::spawn_blocking(move || encode_jpeg(&bytes, quality))
            .await
            .map_err(|e| PreprocessError::EncodeFailed(e.to_string()))??;

        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .map_err(|e| PreprocessError::EncodeFailed(e.to_string()))?;

        let format = ImageFormat::Jpeg;
        let target = self
            .output_dir
            .join(format!("{}.{}", Uuid::new_v4().simple(), format.extension()));

        write_scratch(&target, &encoded).await?;

        tracing::debug!(
            "Compressed {} ({}) to {} bytes at quality {}",
            source.display(),
            detected,
            encoded.len(),
            quality
        );

        Ok(CompressedImage::new(target, format, self.quality, encoded.len() as u64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn scratch() -> PathBuf {
        std::env::temp_dir().join(format!("scan_ingest_jpeg_{}", Uuid::new_v4().simple()))
    }

    fn write_png(dir: &std::path::Path) -> PathBuf {
        std::fs::create_dir_all(dir).unwrap();
        let path = dir.join("source.png");
        let img = RgbaImage::from_fn(32, 24, |x, y| Rgba([(x * 8) as u8, (y * 10) as u8, 128, 200]));
        img.save(&path).unwrap();
        path
    }

    #[tokio::test]
    async fn png_is_reencoded_as_jpeg() {
        let dir = scratch();
        let source = write_png(&dir);
        let compressor = JpegCompressor::new(dir.join("out"), 0.75);

        let compressed = compressor.compress(&ScanAsset::from_path(&source)).await.unwrap();

        assert_eq!(compressed.format, ImageFormat::Jpeg);
        assert_eq!(compressed.quality, 0.75);
        let bytes = std::fs::read(&compressed.path).unwrap();
        assert_eq!(infer::get(&bytes).unwrap().mime_type(), "image/jpeg");
        assert_eq!(bytes.len() as u64, compressed.byte_len);

        let path = compressed.path.clone();
        drop(compressed);
        assert!(!path.exists());

        std::fs::remove_dir_all(dir).ok();
    }

    #[tokio::test]
    async fn missing_file_is_unreadable() {
        let compressor = JpegCompressor::new(scratch(), 0.75);
        let err = compressor
            .compress(&ScanAsset::new("/definitely/not/here.png"))
            .await
            .unwrap_err();
        assert!(matches!(err, PreprocessError::Unreadable(_)));
    }

    #[tokio::test]
    async fn non_image_content_is_rejected() {
        let dir = scratch();
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("notes.txt");
        std::fs::write(&path, b"just some text, not pixels").unwrap();

        let compressor = JpegCompressor::new(dir.join("out"), 0.75);
        let err = compressor.compress(&ScanAsset::from_path(&path)).await.unwrap_err();
        assert!(matches!(err, PreprocessError::UnsupportedFormat(_)));

        std::fs::remove_dir_all(dir).ok();
    }

    #[tokio::test]
    async fn failed_scratch_write_leaves_nothing_behind() {
        let dir = scratch();
        let target = dir.join("missing-parent").join("out.jpg");

        let err = write_scratch(&target, b"jpeg").await.unwrap_err();

        assert!(matches!(err, PreprocessError::EncodeFailed(_)));
        assert!(!target.exists());
    }

    #[test]
    fn quality_maps_to_encoder_scale() {
        assert_eq!(JpegCompressor::new("/tmp", 0.75).encoder_quality(), 75);
        assert_eq!(JpegCompressor::new("/tmp", 3.0).encoder_quality(), 100);
    }
}
