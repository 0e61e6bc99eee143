use async_trait::async_trait;

use crate::{
    entities::asset::{CompressedImage, ScanAsset},
    errors::PreprocessError,
};

#[async_trait]
pub trait ImagePreprocessor: Send + Sync {
    /// Normalizes an asset into a compressed, upload-ready JPEG.
    async fn compress(&self, asset: &ScanAsset) -> Result<CompressedImage, PreprocessError>;
}
