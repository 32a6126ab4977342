//! Shutdown signal handling for the watch loop

use std::sync::Arc;

use colored::Colorize;
use tokio::sync::watch;

/// Flag raised by SIGINT/SIGTERM (Ctrl+C elsewhere)
pub struct ShutdownSignal {
    tx: Arc<watch::Sender<bool>>,
    rx: watch::Receiver<bool>,
}

impl ShutdownSignal {
    /// Create a new shutdown signal handler
    pub fn new() -> Self {
        let (tx, rx) = watch::channel(false);
        Self {
            tx: Arc::new(tx),
            rx,
        }
    }

    /// Check if shutdown was requested
    pub fn is_shutdown(&self) -> bool {
        *self.rx.borrow()
    }

    /// Request shutdown
    pub fn trigger(&self) {
        self.tx.send_replace(true);
    }

    /// Resolve once shutdown has been requested
    pub async fn wait(&self) {
        let mut rx = self.rx.clone();
        // The sender lives as long as self, so this only ends on `true`.
        let _ = rx.wait_for(|down| *down).await;
    }

    /// Install the OS signal listeners
    #[cfg(unix)]
    pub async fn setup(&self) -> Result<(), std::io::Error> {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigint = signal(SignalKind::interrupt())?;
        let mut sigterm = signal(SignalKind::terminate())?;
        let tx = Arc::clone(&self.tx);
        tokio::spawn(async move {
            tokio::select! {
                _ = sigint.recv() => {}
                _ = sigterm.recv() => {}
            }
            eprintln!("{} Stopping", "↓".cyan());
            tx.send_replace(true);
        });
        Ok(())
    }

    /// Install the OS signal listeners
    #[cfg(not(unix))]
    pub async fn setup(&self) -> Result<(), std::io::Error> {
        let tx = Arc::clone(&self.tx);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                eprintln!("{} Stopping", "↓".cyan());
                tx.send_replace(true);
            }
        });
        Ok(())
    }
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}
