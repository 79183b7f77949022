use std::sync::{Arc, OnceLock};

use crate::diagnostics::DiagnosticsPanel;
use crate::transport::Transport;

/// Logical channel id, unique within its owning connection
pub type ChannelId = u16;

/// A multiplexed logical sub-connection over one transport
///
/// Owned exclusively by the connection that created it; the id is stable
/// for the channel's lifetime and a given id always resolves to the same
/// `Channel` object. The raw handle is whatever the transport produced
/// when the channel was opened.
pub struct Channel<T: Transport> {
    id: ChannelId,
    raw: T::Raw,
    panel: OnceLock<Arc<dyn DiagnosticsPanel>>,
}

impl<T: Transport> Channel<T> {
    pub(crate) fn new(id: ChannelId, raw: T::Raw) -> Self {
        Self {
            id,
            raw,
            panel: OnceLock::new(),
        }
    }

    pub fn id(&self) -> ChannelId {
        self.id
    }

    /// The transport's raw channel handle, for endpoint implementations
    pub fn raw(&self) -> &T::Raw {
        &self.raw
    }

    /// Attach a diagnostics panel; only the first attach takes effect
    pub fn attach_panel(&self, panel: Arc<dyn DiagnosticsPanel>) {
        if self.panel.set(panel).is_ok() {
            if let Some(panel) = self.panel.get() {
                panel.channel_attached(self.id);
            }
        }
    }

    pub fn panel(&self) -> Option<&Arc<dyn DiagnosticsPanel>> {
        self.panel.get()
    }
}

impl<T: Transport> std::fmt::Debug for Channel<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Channel")
            .field("id", &self.id)
            .field("panel", &self.panel.get().is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::{MockTransport, RecordingPanel};

    #[test]
    fn second_panel_attach_is_ignored() {
        let channel: Channel<MockTransport> = Channel::new(3, ());

        let first = Arc::new(RecordingPanel::default());
        let second = Arc::new(RecordingPanel::default());

        channel.attach_panel(first.clone());
        channel.attach_panel(second.clone());

        assert_eq!(first.channel_ids(), vec![3]);
        assert!(second.channel_ids().is_empty());

        let first_dyn: Arc<dyn DiagnosticsPanel> = first;
        assert!(Arc::ptr_eq(channel.panel().unwrap(), &first_dyn));
    }
}
