//! # rabbitlink - Lazy AMQP Connection Management
//!
//! rabbitlink sits between your application and a raw AMQP transport. It
//! defers the expensive network handshake until the first real use, hands
//! out identity-stable channels by numeric id, arms a heartbeat sender
//! exactly once per established connection, and resolves logical endpoint
//! names (producers, consumers, RPC clients, RPC servers) to the concrete
//! objects your wiring registered.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use rabbitlink::{Connection, EndpointMap, LapinTransport};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let transport = Arc::new(LapinTransport::new("amqp://localhost:5672"));
//!     let connection = Connection::new(transport);
//!
//!     connection
//!         .populate_registry(EndpointMap::new().producer("mailer", "producer.mailer"))
//!         .await;
//!
//!     // no network traffic until the first channel is needed
//!     let channel = connection.channel(None).await?;
//!     assert_eq!(channel.id(), 1);
//!     Ok(())
//! }
//! ```

pub mod channel;
pub mod connection;
pub mod diagnostics;
pub mod error;
pub mod heartbeat;
pub mod registry;
pub mod transport;

#[cfg(test)]
pub(crate) mod test_util;

pub use channel::{Channel, ChannelId};
pub use connection::{
    AscendingIds, ChannelIdAllocator, Connection, ConnectionBuilder, ConnectionStats,
};
pub use diagnostics::DiagnosticsPanel;
pub use error::{RabbitLinkError, Result};
pub use heartbeat::{HeartbeatSender, IntervalHeartbeat};
pub use registry::{
    Consumer, EndpointMap, EndpointResolver, Producer, RegistryCounts, ResourceKind,
    ResourceRegistry, RpcClient, RpcServer, ServiceId,
};
pub use transport::{ConnectionConfig, LapinTransport, Transport};
