use std::collections::BTreeMap;
use std::sync::{Arc, Mutex as StdMutex, OnceLock};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};

use crate::channel::{Channel, ChannelId};
use crate::diagnostics::DiagnosticsPanel;
use crate::error::{RabbitLinkError, Result};
use crate::heartbeat::HeartbeatSender;
use crate::registry::{
    Consumer, EndpointMap, EndpointResolver, Producer, RegistryCounts, ResourceKind,
    ResourceRegistry, RpcClient, RpcServer, ServiceId,
};
use crate::transport::Transport;

/// Strategy for picking the id of the next auto-allocated channel
pub trait ChannelIdAllocator: Send + Sync {
    /// Pick a free id given the ids currently in use, sorted ascending.
    /// Returns `None` when no id is free.
    fn next_id(&self, in_use: &[ChannelId]) -> Option<ChannelId>;
}

/// Default allocation policy: lowest free id, scanning up from 1
#[derive(Debug, Default, Clone, Copy)]
pub struct AscendingIds;

impl ChannelIdAllocator for AscendingIds {
    fn next_id(&self, in_use: &[ChannelId]) -> Option<ChannelId> {
        let mut candidate: ChannelId = 1;
        for &id in in_use {
            if id > candidate {
                break;
            }
            if id == candidate {
                candidate = candidate.checked_add(1)?;
            }
        }
        Some(candidate)
    }
}

/// Orchestrates lazy connect, channel acquisition, heartbeat activation,
/// and name-based endpoint resolution over a composed [`Transport`]
///
/// The connection starts logically disconnected; the first `connect` (or
/// the first `channel` call that needs one) performs the real network
/// handshake. A channel id, once allocated, resolves to the same
/// [`Channel`] object for the connection's whole lifetime.
pub struct Connection<T: Transport> {
    transport: Arc<T>,
    channels: Mutex<BTreeMap<ChannelId, Arc<Channel<T>>>>,
    // serializes the capture-connect-register sequence so concurrent
    // connect calls cannot double-register the heartbeat sender
    connect_gate: Mutex<()>,
    heartbeat: StdMutex<Option<Arc<dyn HeartbeatSender>>>,
    registry: RwLock<ResourceRegistry>,
    resolver: OnceLock<Arc<dyn EndpointResolver>>,
    panel: OnceLock<Arc<dyn DiagnosticsPanel>>,
    allocator: Box<dyn ChannelIdAllocator>,
}

impl<T: Transport> Connection<T> {
    /// Create a connection with default wiring over the given transport
    pub fn new(transport: Arc<T>) -> Self {
        Self::builder(transport).build()
    }

    pub fn builder(transport: Arc<T>) -> ConnectionBuilder<T> {
        ConnectionBuilder::new(transport)
    }

    pub fn transport(&self) -> &Arc<T> {
        &self.transport
    }

    pub async fn is_connected(&self) -> bool {
        self.transport.is_connected().await
    }

    /// Establish the transport connection if needed
    ///
    /// Idempotent. When the call takes the transport from Disconnected to
    /// Connected and a heartbeat sender is configured, the sender is
    /// registered exactly once; repeated calls while Connected register
    /// nothing. A transport failure propagates unchanged and leaves no
    /// partial state behind.
    pub async fn connect(&self) -> Result<()> {
        let _gate = self.connect_gate.lock().await;

        let was_connected = self.transport.is_connected().await;
        self.transport.connect().await?;

        if !was_connected && self.transport.is_connected().await {
            let sender = self
                .heartbeat
                .lock()
                .expect("heartbeat slot lock poisoned")
                .clone();
            if let Some(sender) = sender {
                sender.register().await;
                debug!("heartbeat sender registered");
            }
        }

        Ok(())
    }

    /// Fetch the channel for `id`, or create it if it does not exist yet
    ///
    /// An id already present in the table is served from the table with no
    /// connect attempt and no reconstruction. Otherwise the connection is
    /// established if needed, the lowest free id is allocated when none
    /// was given, and the new channel is opened on the transport, wired to
    /// the diagnostics panel if one is attached, stored, and returned.
    pub async fn channel(&self, id: Option<ChannelId>) -> Result<Arc<Channel<T>>> {
        // id 0 is the connection's own control channel on the wire
        if id == Some(0) {
            return Err(RabbitLinkError::config_error("channel id 0 is reserved"));
        }

        let mut channels = self.channels.lock().await;

        if let Some(id) = id {
            if let Some(existing) = channels.get(&id) {
                return Ok(existing.clone());
            }
        }

        self.connect().await?;

        let id = match id {
            Some(id) => id,
            None => {
                let in_use: Vec<ChannelId> = channels.keys().copied().collect();
                self.allocator
                    .next_id(&in_use)
                    .ok_or(RabbitLinkError::ChannelIdsExhausted)?
            }
        };

        let raw = self.transport.open_channel(id).await?;
        let channel = Arc::new(Channel::new(id, raw));

        if let Some(panel) = self.panel.get() {
            channel.attach_panel(panel.clone());
        }

        debug!("Created channel {}", id);
        channels.insert(id, channel.clone());
        Ok(channel)
    }

    /// Resolve a named producer endpoint
    pub async fn producer(&self, name: &str) -> Result<Arc<dyn Producer>> {
        let id = self.lookup(ResourceKind::Producer, name).await?;
        self.resolver()?.producer(&id).await
    }

    /// Resolve a named consumer endpoint
    pub async fn consumer(&self, name: &str) -> Result<Arc<dyn Consumer>> {
        let id = self.lookup(ResourceKind::Consumer, name).await?;
        self.resolver()?.consumer(&id).await
    }

    /// Resolve a named RPC client endpoint
    pub async fn rpc_client(&self, name: &str) -> Result<Arc<dyn RpcClient>> {
        let id = self.lookup(ResourceKind::RpcClient, name).await?;
        self.resolver()?.rpc_client(&id).await
    }

    /// Resolve a named RPC server endpoint
    pub async fn rpc_server(&self, name: &str) -> Result<Arc<dyn RpcServer>> {
        let id = self.lookup(ResourceKind::RpcServer, name).await?;
        self.resolver()?.rpc_server(&id).await
    }

    async fn lookup(&self, kind: ResourceKind, name: &str) -> Result<ServiceId> {
        let registry = self.registry.read().await;
        registry.lookup(kind, name).cloned()
    }

    /// Replace the whole resource registry with a new endpoint map
    ///
    /// Last write wins: names absent from the new map become unresolvable,
    /// across all four kinds.
    pub async fn populate_registry(&self, map: EndpointMap) {
        let mut registry = self.registry.write().await;
        registry.replace(map);
        info!("Resource registry populated");
    }

    /// Swap the heartbeat sender
    ///
    /// Swapping while Connected does not retroactively register the new
    /// sender; registration happens only on the next Disconnected to
    /// Connected transition.
    pub fn set_heartbeat_sender(&self, sender: Option<Arc<dyn HeartbeatSender>>) {
        *self
            .heartbeat
            .lock()
            .expect("heartbeat slot lock poisoned") = sender;
    }

    pub fn heartbeat_sender(&self) -> Option<Arc<dyn HeartbeatSender>> {
        self.heartbeat
            .lock()
            .expect("heartbeat slot lock poisoned")
            .clone()
    }

    /// Inject the endpoint resolver; only the first injection takes effect
    pub fn set_resolver(&self, resolver: Arc<dyn EndpointResolver>) {
        let _ = self.resolver.set(resolver);
    }

    /// Attach a diagnostics panel; only the first attach takes effect
    ///
    /// The panel is propagated to every channel created from this point
    /// on. Channels that already exist are not updated.
    pub fn attach_diagnostics_panel(&self, panel: Arc<dyn DiagnosticsPanel>) {
        if self.panel.set(panel).is_ok() {
            if let Some(panel) = self.panel.get() {
                panel.connection_attached();
            }
        }
    }

    /// Snapshot of connection state for monitoring
    pub async fn stats(&self) -> ConnectionStats {
        let is_connected = self.transport.is_connected().await;
        let open_channels = self.channels.lock().await.len();
        let registry = self.registry.read().await.counts();
        let heartbeat_configured = self.heartbeat_sender().is_some();

        ConnectionStats {
            is_connected,
            open_channels,
            registry,
            heartbeat_configured,
        }
    }

    fn resolver(&self) -> Result<Arc<dyn EndpointResolver>> {
        self.resolver
            .get()
            .cloned()
            .ok_or_else(|| RabbitLinkError::config_error("no endpoint resolver configured"))
    }
}

impl<T: Transport> std::fmt::Debug for Connection<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("resolver", &self.resolver.get().is_some())
            .field("panel", &self.panel.get().is_some())
            .finish()
    }
}

/// Assembles a [`Connection`] from its collaborators
///
/// Only the transport is mandatory; everything else has a working default
/// (no heartbeat sender, no panel, ascending id allocation, an empty
/// registry that rejects every lookup until populated).
pub struct ConnectionBuilder<T: Transport> {
    transport: Arc<T>,
    resolver: Option<Arc<dyn EndpointResolver>>,
    heartbeat: Option<Arc<dyn HeartbeatSender>>,
    panel: Option<Arc<dyn DiagnosticsPanel>>,
    allocator: Box<dyn ChannelIdAllocator>,
    registry: EndpointMap,
}

impl<T: Transport> ConnectionBuilder<T> {
    pub fn new(transport: Arc<T>) -> Self {
        Self {
            transport,
            resolver: None,
            heartbeat: None,
            panel: None,
            allocator: Box::new(AscendingIds),
            registry: EndpointMap::new(),
        }
    }

    pub fn resolver(mut self, resolver: Arc<dyn EndpointResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    pub fn heartbeat_sender(mut self, sender: Arc<dyn HeartbeatSender>) -> Self {
        self.heartbeat = Some(sender);
        self
    }

    pub fn diagnostics_panel(mut self, panel: Arc<dyn DiagnosticsPanel>) -> Self {
        self.panel = Some(panel);
        self
    }

    pub fn allocator(mut self, allocator: impl ChannelIdAllocator + 'static) -> Self {
        self.allocator = Box::new(allocator);
        self
    }

    /// Seed the registry so the connection is ready before first lookup
    pub fn registry(mut self, map: EndpointMap) -> Self {
        self.registry = map;
        self
    }

    pub fn build(self) -> Connection<T> {
        let connection = Connection {
            transport: self.transport,
            channels: Mutex::new(BTreeMap::new()),
            connect_gate: Mutex::new(()),
            heartbeat: StdMutex::new(self.heartbeat),
            registry: RwLock::new(ResourceRegistry::from_map(self.registry)),
            resolver: OnceLock::new(),
            panel: OnceLock::new(),
            allocator: self.allocator,
        };

        if let Some(resolver) = self.resolver {
            connection.set_resolver(resolver);
        }
        if let Some(panel) = self.panel {
            connection.attach_diagnostics_panel(panel);
        }

        connection
    }
}

/// Connection statistics for monitoring
#[derive(Debug, Clone, serde::Serialize)]
pub struct ConnectionStats {
    pub is_connected: bool,
    pub open_channels: usize,
    pub registry: RegistryCounts,
    pub heartbeat_configured: bool,
}
