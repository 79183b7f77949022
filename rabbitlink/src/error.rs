use thiserror::Error;

use crate::registry::ResourceKind;

/// Result type alias for rabbitlink operations
pub type Result<T> = std::result::Result<T, RabbitLinkError>;

/// Error types for the connection-management layer
#[derive(Error, Debug)]
pub enum RabbitLinkError {
    /// AMQP transport errors, surfaced unchanged
    #[error("AMQP transport error: {0}")]
    Transport(#[from] lapin::Error),

    /// A name was looked up that the registry does not know
    #[error("unknown {kind} '{name}'")]
    UnknownResource { kind: ResourceKind, name: String },

    /// A channel-open primitive was used before the transport connected
    #[error("transport is not connected")]
    NotConnected,

    /// The allocator found no free channel id
    #[error("no free channel id available")]
    ChannelIdsExhausted,

    /// Configuration errors
    #[error("configuration error: {0}")]
    Config(String),

    /// Internal errors
    #[error("internal error: {0}")]
    Internal(String),

    /// Generic errors from external resolvers
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl RabbitLinkError {
    /// Create a new config error
    pub fn config_error<T: ToString>(message: T) -> Self {
        Self::Config(message.to_string())
    }

    /// Create a new internal error
    pub fn internal_error<T: ToString>(message: T) -> Self {
        Self::Internal(message.to_string())
    }

    /// Create an unknown-resource error naming both the kind and the name
    pub fn unknown_resource(kind: ResourceKind, name: impl Into<String>) -> Self {
        Self::UnknownResource {
            kind,
            name: name.into(),
        }
    }

    /// Check if error is recoverable by the caller
    ///
    /// Unknown-resource lookups are a configuration problem the caller can
    /// fall back from; transport failures are fatal to the operation that
    /// triggered them.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::UnknownResource { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_resource_names_kind_and_name() {
        let err = RabbitLinkError::unknown_resource(ResourceKind::Producer, "mailer");
        assert_eq!(err.to_string(), "unknown producer 'mailer'");
        assert!(err.is_recoverable());
    }

    #[test]
    fn transport_errors_are_fatal() {
        let err = RabbitLinkError::NotConnected;
        assert!(!err.is_recoverable());
    }
}
