//! External shutdown signal.
//!
//! A single-fire flag: once raised it stays raised. The supervisor observes
//! it; the consumption task never does.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{error, info};

/// Raising side of the shutdown flag.
#[derive(Debug, Clone)]
pub struct ShutdownTrigger {
    tx: Arc<watch::Sender<bool>>,
}

/// Observing side of the shutdown flag.
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    rx: watch::Receiver<bool>,
}

/// Create a linked trigger / signal pair.
pub fn channel() -> (ShutdownTrigger, ShutdownSignal) {
    let (tx, rx) = watch::channel(false);
    (ShutdownTrigger { tx: Arc::new(tx) }, ShutdownSignal { rx })
}

impl ShutdownTrigger {
    /// Request shutdown. Idempotent.
    pub fn raise(&self) {
        self.tx.send_replace(true);
    }
}

impl ShutdownSignal {
    /// Signal raised by the first Ctrl-C (SIGINT) the process receives.
    pub fn ctrl_c() -> Self {
        let (trigger, signal) = channel();
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    info!("interrupt received");
                    trigger.raise();
                }
                Err(e) => error!(error = %e, "cannot listen for interrupt"),
            }
        });
        signal
    }

    /// A signal that is never raised.
    pub fn never() -> Self {
        let (_trigger, signal) = channel();
        signal
    }

    pub fn is_raised(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolve once shutdown has been requested. Pends forever if every
    /// trigger was dropped without raising.
    pub async fn raised(&mut self) {
        let abandoned = self.rx.wait_for(|raised| *raised).await.is_err();
        if abandoned {
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn raise_is_observed() {
        let (trigger, mut signal) = channel();
        assert!(!signal.is_raised());
        trigger.raise();
        trigger.raise();
        signal.raised().await;
        assert!(signal.is_raised());
    }

    #[tokio::test]
    async fn raised_before_wait_resolves_immediately() {
        let (trigger, mut signal) = channel();
        trigger.raise();
        drop(trigger);
        tokio::time::timeout(Duration::from_secs(1), signal.raised())
            .await
            .unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn never_signal_pends() {
        let mut signal = ShutdownSignal::never();
        let res = tokio::time::timeout(Duration::from_secs(60), signal.raised()).await;
        assert!(res.is_err());
    }
}
