use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::{RabbitLinkError, Result};

/// Categories of named messaging endpoints reachable through the directory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Producer,
    Consumer,
    RpcClient,
    RpcServer,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Producer => "producer",
            Self::Consumer => "consumer",
            Self::RpcClient => "rpc client",
            Self::RpcServer => "rpc server",
        };
        f.write_str(label)
    }
}

/// Opaque handle stored in the registry
///
/// The registry stores indirections, not live endpoint objects; a handle
/// only becomes a concrete resource when passed through the resolver.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ServiceId(String);

impl ServiceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ServiceId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for ServiceId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl fmt::Display for ServiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The four name-to-handle mappings accepted by a single population call
#[derive(Debug, Clone, Default)]
pub struct EndpointMap {
    pub producers: HashMap<String, ServiceId>,
    pub consumers: HashMap<String, ServiceId>,
    pub rpc_clients: HashMap<String, ServiceId>,
    pub rpc_servers: HashMap<String, ServiceId>,
}

impl EndpointMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn producer(mut self, name: impl Into<String>, id: impl Into<ServiceId>) -> Self {
        self.producers.insert(name.into(), id.into());
        self
    }

    pub fn consumer(mut self, name: impl Into<String>, id: impl Into<ServiceId>) -> Self {
        self.consumers.insert(name.into(), id.into());
        self
    }

    pub fn rpc_client(mut self, name: impl Into<String>, id: impl Into<ServiceId>) -> Self {
        self.rpc_clients.insert(name.into(), id.into());
        self
    }

    pub fn rpc_server(mut self, name: impl Into<String>, id: impl Into<ServiceId>) -> Self {
        self.rpc_servers.insert(name.into(), id.into());
        self
    }
}

/// Directory mapping (kind, logical name) to an opaque service handle
///
/// Population fully replaces prior content (last write wins, no merge).
/// Lookups are total: an absent name is a typed error, never an empty
/// success.
#[derive(Debug, Default)]
pub struct ResourceRegistry {
    map: EndpointMap,
}

impl ResourceRegistry {
    /// Create an empty registry; every lookup fails until populated
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_map(map: EndpointMap) -> Self {
        Self { map }
    }

    /// Replace the entire registry content with a new endpoint map
    pub fn replace(&mut self, map: EndpointMap) {
        self.map = map;
    }

    /// Resolve a logical name to its stored handle
    pub fn lookup(&self, kind: ResourceKind, name: &str) -> Result<&ServiceId> {
        let entries = match kind {
            ResourceKind::Producer => &self.map.producers,
            ResourceKind::Consumer => &self.map.consumers,
            ResourceKind::RpcClient => &self.map.rpc_clients,
            ResourceKind::RpcServer => &self.map.rpc_servers,
        };
        entries
            .get(name)
            .ok_or_else(|| RabbitLinkError::unknown_resource(kind, name))
    }

    /// Number of registered names per kind
    pub fn counts(&self) -> RegistryCounts {
        RegistryCounts {
            producers: self.map.producers.len(),
            consumers: self.map.consumers.len(),
            rpc_clients: self.map.rpc_clients.len(),
            rpc_servers: self.map.rpc_servers.len(),
        }
    }
}

/// Per-kind entry counts for monitoring
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct RegistryCounts {
    pub producers: usize,
    pub consumers: usize,
    pub rpc_clients: usize,
    pub rpc_servers: usize,
}

/// A named message publisher endpoint
pub trait Producer: Send + Sync {
    /// Endpoint name for diagnostics
    fn name(&self) -> &str;
}

/// A named message consumer endpoint
pub trait Consumer: Send + Sync {
    fn name(&self) -> &str;
}

/// A named RPC client endpoint
pub trait RpcClient: Send + Sync {
    fn name(&self) -> &str;
}

/// A named RPC server endpoint
pub trait RpcServer: Send + Sync {
    fn name(&self) -> &str;
}

/// Resolves opaque registry handles to live endpoint objects
///
/// The registry only maps names to handles; turning a handle into a
/// concrete endpoint (including constructing it lazily) is the resolver's
/// concern. Implementations typically close over whatever wiring built
/// the endpoints at startup.
#[async_trait]
pub trait EndpointResolver: Send + Sync {
    async fn producer(&self, id: &ServiceId) -> Result<Arc<dyn Producer>>;
    async fn consumer(&self, id: &ServiceId) -> Result<Arc<dyn Consumer>>;
    async fn rpc_client(&self, id: &ServiceId) -> Result<Arc<dyn RpcClient>>;
    async fn rpc_server(&self, id: &ServiceId) -> Result<Arc<dyn RpcServer>>;
}
