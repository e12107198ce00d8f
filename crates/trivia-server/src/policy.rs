use std::sync::Arc;

use tokio::sync::watch;

/// Process-wide settings the games consult between quizzes. Cloned into every
/// game; changed only through `disable_restart`.
#[derive(Clone)]
pub struct ServerPolicy {
    restart: Arc<watch::Sender<bool>>,
}

impl ServerPolicy {
    pub fn new() -> Self {
        let (restart, _) = watch::channel(true);
        Self {
            restart: Arc::new(restart),
        }
    }

    pub fn restart_enabled(&self) -> bool {
        *self.restart.borrow()
    }

    /// Games waiting to start a quiz terminate; rounds in progress finish.
    pub fn disable_restart(&self) {
        self.restart.send_replace(false);
    }

    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.restart.subscribe()
    }
}

impl Default for ServerPolicy {
    fn default() -> Self {
        Self::new()
    }
}

/// Turns SIGHUP into `disable_restart`. SIGPIPE stays ignored, as the Rust
/// runtime leaves it, so a write to a departed client only fails that write.
#[cfg(unix)]
pub async fn watch_signals(policy: ServerPolicy) -> std::io::Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut hangup = signal(SignalKind::hangup())?;
    while hangup.recv().await.is_some() {
        tracing::info!("SIGHUP received, games will not restart");
        policy.disable_restart();
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_restart_enabled_by_default() {
        assert!(ServerPolicy::new().restart_enabled());
    }

    #[tokio::test]
    async fn test_disable_restart_reaches_subscribers() {
        let policy = ServerPolicy::new();
        let mut rx = policy.subscribe();
        let clone = policy.clone();

        clone.disable_restart();
        rx.changed().await.unwrap();
        assert!(!*rx.borrow());
        assert!(!policy.restart_enabled());
    }
}
