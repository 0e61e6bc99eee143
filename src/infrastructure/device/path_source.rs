use std::{collections::VecDeque, path::PathBuf};

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::{
    entities::asset::{Acquisition, CaptureSource, ScanAsset},
    errors::BackendError,
    repositories::device::ImageSource,
};

/// Image source fed from a queue of files. Once the queue is drained every
/// request behaves like a dismissed picker.
#[derive(Debug, Default)]
pub struct PathImageSource {
    queue: Mutex<VecDeque<PathBuf>>,
}

impl PathImageSource {
    pub fn new(paths: impl IntoIterator<Item = PathBuf>) -> Self {
        PathImageSource {
            queue: Mutex::new(paths.into_iter().collect()),
        }
    }

    pub fn remaining(&self) -> usize {
        self.queue.lock().len()
    }
}

#[async_trait]
impl ImageSource for PathImageSource {
    async fn acquire(&self, source: CaptureSource) -> Result<Acquisition, BackendError> {
        let next = self.queue.lock().pop_front();
        match next {
            Some(path) => {
                tracing::debug!("Picked {} from {}", path.display(), source);
                Ok(Acquisition::Asset(ScanAsset::from_path(path)))
            }
            None => Ok(Acquisition::Cancelled),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn drains_queue_then_cancels() {
        let source = PathImageSource::new([PathBuf::from("/tmp/a.jpg")]);

        match source.acquire(CaptureSource::Library).await.unwrap() {
            Acquisition::Asset(asset) => assert_eq!(asset.uri, "/tmp/a.jpg"),
            other => panic!("expected asset, got {:?}", other),
        }
        assert!(matches!(
            source.acquire(CaptureSource::Library).await.unwrap(),
            Acquisition::Cancelled
        ));
        assert_eq!(source.remaining(), 0);
    }
}
