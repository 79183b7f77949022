use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::transport::Transport;

/// Keepalive mechanism armed once per established connection
///
/// The connection manager invokes `register` on the Disconnected to
/// Connected transition, and never again while the connection stays up.
#[async_trait]
pub trait HeartbeatSender: Send + Sync {
    async fn register(&self);
}

/// Heartbeat sender that probes transport liveness from a spawned task
///
/// On `register`, spawns a tokio task that ticks at the configured
/// interval and logs when the transport drops off. Registering again
/// replaces the previous probe task.
pub struct IntervalHeartbeat<T: Transport> {
    transport: Arc<T>,
    interval: Duration,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl<T: Transport> IntervalHeartbeat<T> {
    pub fn new(transport: Arc<T>, interval: Duration) -> Self {
        Self {
            transport,
            interval,
            task: Mutex::new(None),
        }
    }

    /// Whether a probe task is currently running
    pub fn is_armed(&self) -> bool {
        self.task
            .lock()
            .expect("heartbeat task lock poisoned")
            .as_ref()
            .map(|task| !task.is_finished())
            .unwrap_or(false)
    }
}

#[async_trait]
impl<T: Transport> HeartbeatSender for IntervalHeartbeat<T> {
    async fn register(&self) {
        let transport = self.transport.clone();
        let interval = self.interval;

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // the first tick fires immediately; skip it so probes start
            // one interval after registration
            ticker.tick().await;
            let mut was_connected = true;
            loop {
                ticker.tick().await;
                let connected = transport.is_connected().await;
                if connected {
                    debug!("heartbeat probe: transport alive");
                } else if was_connected {
                    warn!("heartbeat probe: transport connection lost");
                }
                was_connected = connected;
            }
        });

        let previous = self
            .task
            .lock()
            .expect("heartbeat task lock poisoned")
            .replace(handle);
        if let Some(previous) = previous {
            previous.abort();
        }
    }
}

impl<T: Transport> Drop for IntervalHeartbeat<T> {
    fn drop(&mut self) {
        if let Ok(mut guard) = self.task.lock() {
            if let Some(task) = guard.take() {
                task.abort();
            }
        }
    }
}

impl<T: Transport> std::fmt::Debug for IntervalHeartbeat<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IntervalHeartbeat")
            .field("interval", &self.interval)
            .field("armed", &self.is_armed())
            .finish()
    }
}
