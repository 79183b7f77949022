use crate::channel::ChannelId;

/// Passive observer of connection and channel wiring
///
/// A panel is attached once to a connection and propagated to every
/// channel created afterwards; channels that already exist are never
/// updated retroactively. The hooks are notifications only, with no-op
/// defaults, so implementors observe as much or as little as they want.
pub trait DiagnosticsPanel: Send + Sync {
    /// Called when the panel is attached to a connection
    fn connection_attached(&self) {}

    /// Called when the panel is propagated to a freshly created channel
    fn channel_attached(&self, _id: ChannelId) {}
}
