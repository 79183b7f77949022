//! Shared fakes for the crate's unit tests.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::channel::ChannelId;
use crate::diagnostics::DiagnosticsPanel;
use crate::error::{RabbitLinkError, Result};
use crate::heartbeat::HeartbeatSender;
use crate::registry::{
    Consumer, EndpointResolver, Producer, RpcClient, RpcServer, ServiceId,
};
use crate::transport::Transport;

/// In-memory transport tracking how the manager drives it.
#[derive(Default)]
pub(crate) struct MockTransport {
    connected: AtomicBool,
    fail_connects: AtomicBool,
    connect_calls: AtomicUsize,
    open_calls: AtomicUsize,
    liveness_probes: AtomicUsize,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_next_connects(&self, fail: bool) {
        self.fail_connects.store(fail, Ordering::SeqCst);
    }

    pub fn connect_calls(&self) -> usize {
        self.connect_calls.load(Ordering::SeqCst)
    }

    pub fn open_calls(&self) -> usize {
        self.open_calls.load(Ordering::SeqCst)
    }

    pub fn liveness_probes(&self) -> usize {
        self.liveness_probes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for MockTransport {
    type Raw = ();

    async fn connect(&self) -> Result<()> {
        self.connect_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_connects.load(Ordering::SeqCst) {
            return Err(RabbitLinkError::internal_error("simulated connect failure"));
        }
        self.connected.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn is_connected(&self) -> bool {
        self.liveness_probes.fetch_add(1, Ordering::SeqCst);
        self.connected.load(Ordering::SeqCst)
    }

    async fn open_channel(&self, _id: ChannelId) -> Result<()> {
        if !self.connected.load(Ordering::SeqCst) {
            return Err(RabbitLinkError::NotConnected);
        }
        self.open_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Heartbeat sender that only counts its registrations.
#[derive(Default)]
pub(crate) struct CountingHeartbeat {
    registrations: AtomicUsize,
}

impl CountingHeartbeat {
    pub fn registrations(&self) -> usize {
        self.registrations.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl HeartbeatSender for CountingHeartbeat {
    async fn register(&self) {
        self.registrations.fetch_add(1, Ordering::SeqCst);
    }
}

/// Panel recording which channels it was propagated to.
#[derive(Default)]
pub(crate) struct RecordingPanel {
    connection_attaches: AtomicUsize,
    channel_ids: Mutex<Vec<ChannelId>>,
}

impl RecordingPanel {
    pub fn connection_attaches(&self) -> usize {
        self.connection_attaches.load(Ordering::SeqCst)
    }

    pub fn channel_ids(&self) -> Vec<ChannelId> {
        self.channel_ids.lock().unwrap().clone()
    }
}

impl DiagnosticsPanel for RecordingPanel {
    fn connection_attached(&self) {
        self.connection_attaches.fetch_add(1, Ordering::SeqCst);
    }

    fn channel_attached(&self, id: ChannelId) {
        self.channel_ids.lock().unwrap().push(id);
    }
}

/// Endpoint stub usable as any of the four kinds.
pub(crate) struct NamedEndpoint {
    name: String,
}

impl NamedEndpoint {
    pub fn new(name: impl Into<String>) -> Arc<Self> {
        Arc::new(Self { name: name.into() })
    }
}

impl Producer for NamedEndpoint {
    fn name(&self) -> &str {
        &self.name
    }
}

impl Consumer for NamedEndpoint {
    fn name(&self) -> &str {
        &self.name
    }
}

impl RpcClient for NamedEndpoint {
    fn name(&self) -> &str {
        &self.name
    }
}

impl RpcServer for NamedEndpoint {
    fn name(&self) -> &str {
        &self.name
    }
}

/// Resolver backed by fixed handle-to-endpoint tables.
#[derive(Default)]
pub(crate) struct StaticResolver {
    producers: HashMap<ServiceId, Arc<NamedEndpoint>>,
    consumers: HashMap<ServiceId, Arc<NamedEndpoint>>,
    rpc_clients: HashMap<ServiceId, Arc<NamedEndpoint>>,
    rpc_servers: HashMap<ServiceId, Arc<NamedEndpoint>>,
}

impl StaticResolver {
    pub fn with_producer(mut self, id: impl Into<ServiceId>, endpoint: Arc<NamedEndpoint>) -> Self {
        self.producers.insert(id.into(), endpoint);
        self
    }

    pub fn with_consumer(mut self, id: impl Into<ServiceId>, endpoint: Arc<NamedEndpoint>) -> Self {
        self.consumers.insert(id.into(), endpoint);
        self
    }

    pub fn with_rpc_client(
        mut self,
        id: impl Into<ServiceId>,
        endpoint: Arc<NamedEndpoint>,
    ) -> Self {
        self.rpc_clients.insert(id.into(), endpoint);
        self
    }

    pub fn with_rpc_server(
        mut self,
        id: impl Into<ServiceId>,
        endpoint: Arc<NamedEndpoint>,
    ) -> Self {
        self.rpc_servers.insert(id.into(), endpoint);
        self
    }

    fn missing(id: &ServiceId) -> RabbitLinkError {
        RabbitLinkError::internal_error(format!("no endpoint behind handle '{id}'"))
    }
}

#[async_trait]
impl EndpointResolver for StaticResolver {
    async fn producer(&self, id: &ServiceId) -> Result<Arc<dyn Producer>> {
        let endpoint = self.producers.get(id).ok_or_else(|| Self::missing(id))?;
        Ok(endpoint.clone())
    }

    async fn consumer(&self, id: &ServiceId) -> Result<Arc<dyn Consumer>> {
        let endpoint = self.consumers.get(id).ok_or_else(|| Self::missing(id))?;
        Ok(endpoint.clone())
    }

    async fn rpc_client(&self, id: &ServiceId) -> Result<Arc<dyn RpcClient>> {
        let endpoint = self.rpc_clients.get(id).ok_or_else(|| Self::missing(id))?;
        Ok(endpoint.clone())
    }

    async fn rpc_server(&self, id: &ServiceId) -> Result<Arc<dyn RpcServer>> {
        let endpoint = self.rpc_servers.get(id).ok_or_else(|| Self::missing(id))?;
        Ok(endpoint.clone())
    }
}
