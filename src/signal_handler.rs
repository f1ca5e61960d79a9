use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::signal;
use tracing::{info, warn};

/// Shared cancellation flag for batch runs. The orchestrator checks it
/// between tracks, so an interrupt never aborts a request mid-flight.
#[derive(Clone)]
pub struct SignalHandler {
    shutdown_requested: Arc<AtomicBool>,
}

impl SignalHandler {
    pub fn new() -> Self {
        Self {
            shutdown_requested: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.shutdown_requested)
    }

    /// Flip the flag on the first ctrl-c; the batch stops at the next
    /// between-tracks checkpoint.
    pub fn spawn_ctrl_c_listener(&self) -> tokio::task::JoinHandle<()> {
        let flag = Arc::clone(&self.shutdown_requested);
        tokio::spawn(async move {
            match signal::ctrl_c().await {
                Ok(()) => {
                    info!("Interrupt received, stopping after the current track");
                    flag.store(true, Ordering::Release);
                }
                Err(e) => {
                    warn!("Failed to listen for ctrl-c: {}", e);
                }
            }
        })
    }
}

impl Default for SignalHandler {
    fn default() -> Self {
        Self::new()
    }
}
