use async_trait::async_trait;
use lapin::options::BasicQosOptions;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

use crate::channel::ChannelId;
use crate::error::{RabbitLinkError, Result};

/// Configuration for the AMQP transport
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// AMQP broker URL (e.g., "amqp://localhost:5672")
    pub url: String,
    /// Connection timeout in milliseconds
    pub connection_timeout_ms: u64,
    /// Heartbeat interval in seconds
    pub heartbeat_seconds: u16,
    /// Number of connection retry attempts
    pub max_retries: u32,
    /// Delay between retry attempts in milliseconds
    pub retry_delay_ms: u64,
    /// Channel prefetch count applied to fresh channels
    pub prefetch_count: u16,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            url: "amqp://localhost:5672".to_string(),
            connection_timeout_ms: 10_000,
            heartbeat_seconds: 60,
            max_retries: 5,
            retry_delay_ms: 1_000,
            prefetch_count: 10,
        }
    }
}

/// Capability interface over the wire-level broker connection
///
/// The connection manager composes a transport instead of inheriting from
/// one, so the wire layer can be swapped or mocked. `connect` must be
/// idempotent: calling it while already connected is a no-op.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Raw channel handle produced by `open_channel`
    type Raw: Send + Sync + 'static;

    /// Establish the broker connection if not already established
    async fn connect(&self) -> Result<()>;

    /// Whether the wire connection is currently live
    async fn is_connected(&self) -> bool;

    /// Open a raw channel for the given logical id over the live connection
    async fn open_channel(&self, id: ChannelId) -> Result<Self::Raw>;
}

/// Production transport backed by [`lapin`]
///
/// Connects lazily with a bounded retry loop. lapin assigns its own wire
/// channel ids; the logical id passed to `open_channel` only keys the
/// manager's channel table.
pub struct LapinTransport {
    config: ConnectionConfig,
    connection: RwLock<Option<Arc<lapin::Connection>>>,
}

impl LapinTransport {
    /// Create a transport for the given broker URL with default settings
    pub fn new(url: impl Into<String>) -> Self {
        let mut config = ConnectionConfig::default();
        config.url = url.into();
        Self::with_config(config)
    }

    /// Create a transport with custom configuration
    pub fn with_config(config: ConnectionConfig) -> Self {
        Self {
            config,
            connection: RwLock::new(None),
        }
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    async fn try_connect(&self) -> Result<lapin::Connection> {
        debug!("Attempting to connect to {}", self.config.url);

        let connection = lapin::Connection::connect(
            &self.config.url,
            lapin::ConnectionProperties::default()
                .with_connection_name(format!("rabbitlink-{}", uuid::Uuid::new_v4()).into()),
        )
        .await?;

        debug!("AMQP connection established");
        Ok(connection)
    }
}

#[async_trait]
impl Transport for LapinTransport {
    type Raw = lapin::Channel;

    async fn connect(&self) -> Result<()> {
        // Hold the write lock for the whole attempt so concurrent callers
        // cannot race two wire connections into existence.
        let mut guard = self.connection.write().await;
        if let Some(connection) = guard.as_ref() {
            if connection.status().connected() {
                return Ok(());
            }
        }

        let mut attempts = 0;
        let max_retries = self.config.max_retries;

        loop {
            match self.try_connect().await {
                Ok(connection) => {
                    info!("Connected to AMQP broker at {}", self.config.url);
                    *guard = Some(Arc::new(connection));
                    return Ok(());
                }
                Err(e) => {
                    attempts += 1;
                    if attempts >= max_retries {
                        error!("Failed to connect after {} attempts: {}", attempts, e);
                        return Err(e);
                    }

                    warn!(
                        "Connection attempt {} failed, retrying in {}ms: {}",
                        attempts, self.config.retry_delay_ms, e
                    );

                    tokio::time::sleep(Duration::from_millis(self.config.retry_delay_ms)).await;
                }
            }
        }
    }

    async fn is_connected(&self) -> bool {
        let guard = self.connection.read().await;
        guard
            .as_ref()
            .map(|conn| conn.status().connected())
            .unwrap_or(false)
    }

    async fn open_channel(&self, id: ChannelId) -> Result<lapin::Channel> {
        let connection = {
            let guard = self.connection.read().await;
            guard.as_ref().cloned().ok_or(RabbitLinkError::NotConnected)?
        };

        let channel = connection.create_channel().await?;
        channel
            .basic_qos(self.config.prefetch_count, BasicQosOptions::default())
            .await?;

        debug!("Opened channel {}", id);
        Ok(channel)
    }
}

impl std::fmt::Debug for LapinTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LapinTransport")
            .field("config", &self.config)
            .finish()
    }
}
