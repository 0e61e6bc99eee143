use async_trait::async_trait;

use crate::{
    entities::{
        asset::{Acquisition, CaptureSource},
        notice::Notice,
    },
    errors::BackendError,
};

/// Camera or photo library picker.
#[async_trait]
pub trait ImageSource: Send + Sync {
    async fn acquire(&self, source: CaptureSource) -> Result<Acquisition, BackendError>;
}

/// Shows alerts to the user.
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);
}
