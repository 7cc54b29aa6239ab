//! Stop signal for the accrual scheduler.
//!
//! The daemon waits here for SIGINT or SIGTERM; `AccrualService::stop` fires
//! the same signal directly. The scheduler task exits on its next `select!`.

use tokio::signal;
use tokio::sync::broadcast;

/// One-shot stop signal shared by the service and its scheduler task.
///
/// The scheduler holds a receiver from [`subscribe`](Self::subscribe) and
/// polls it ahead of its interval timer, so a pending stop wins over a due tick.
#[derive(Clone)]
pub struct ShutdownController {
    tx: broadcast::Sender<()>,
}

impl ShutdownController {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    /// Receiver for the scheduler loop.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Signal every receiver to stop. A no-op when nobody is listening.
    pub fn shutdown(&self) {
        let _ = self.tx.send(());
    }

    /// Block until the process gets SIGINT or SIGTERM, then signal a stop.
    pub async fn wait_for_signal(&self) {
        let ctrl_c = signal::ctrl_c();

        #[cfg(unix)]
        let terminate = async {
            match signal::unix::signal(signal::unix::SignalKind::terminate()) {
                Ok(mut sigterm) => {
                    sigterm.recv().await;
                }
                Err(e) => {
                    tracing::warn!(error = %e, "failed to install SIGTERM handler");
                    std::future::pending::<()>().await;
                }
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => { tracing::info!("SIGINT received"); }
            _ = terminate => { tracing::info!("SIGTERM received"); }
        }

        self.shutdown();
    }
}

impl Default for ShutdownController {
    fn default() -> Self {
        Self::new()
    }
}
