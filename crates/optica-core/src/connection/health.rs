use tokio::task::JoinHandle;
use tracing::debug;

/// Handle to the periodic health-check task. The task stops when the handle
/// is stopped or dropped.
#[derive(Debug)]
pub struct HealthMonitor {
    handle: JoinHandle<()>,
}

impl HealthMonitor {
    pub(crate) fn from_handle(handle: JoinHandle<()>) -> Self {
        Self { handle }
    }

    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }

    pub fn stop(self) {
        // Drop aborts the task
    }
}

impl Drop for HealthMonitor {
    fn drop(&mut self) {
        debug!("Stopping health monitor");
        self.handle.abort();
    }
}
