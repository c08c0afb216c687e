pub mod action;
pub mod events;

pub use action::ActionService;
pub use events::EventService;

use std::sync::{Arc, atomic};

use eyre::{Result, eyre};
use std::time::Duration;
use tokio::sync::oneshot;

use crate::config::constants::SHUTDOWN_TIMEOUT;

/// ShutdownCoordinator waits for in-flight backend requests before the
/// process exits. Requests are never cancelled, only awaited.
pub struct ShutdownCoordinator {
    pub pending_tasks: Arc<atomic::AtomicUsize>,
    pub shutdown_complete: oneshot::Sender<Result<()>>,
    pub timeout: Option<Duration>,
}

impl ShutdownCoordinator {
    pub async fn wait_for_completion(self) -> Result<()> {
        let timeout = self.timeout.unwrap_or(SHUTDOWN_TIMEOUT);
        let result = match tokio::time::timeout(timeout, self.wait_pending_tasks()).await {
            Ok(_) => Ok(()),
            Err(_) => Err(eyre!(
                "shutdown timeout reached with {} pending requests",
                self.pending_tasks.load(atomic::Ordering::SeqCst)
            )),
        };
        let _ = self.shutdown_complete.send(result);
        Ok(())
    }

    async fn wait_pending_tasks(&self) {
        while self.pending_tasks.load(atomic::Ordering::SeqCst) > 0 {
            log::debug!(
                "Waiting for {} pending requests",
                self.pending_tasks.load(atomic::Ordering::SeqCst)
            );
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
    }
}
