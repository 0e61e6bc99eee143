use crate::{entities::notice::Notice, repositories::device::Notifier};

/// Sends user-facing notices to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notice: Notice) {
        tracing::info!("{}: {}", notice.title, notice.message);
    }
}
