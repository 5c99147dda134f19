//! Host-facing notifications emitted by the conversation client.

use voicewire_protocol::ConversationItem;

use crate::error::ClientError;

/// Receives state-change notifications from a conversation client.
///
/// All methods default to no-ops so hosts implement only what they
/// render. Handlers run to completion on the client's dispatch task and
/// must not block.
pub trait ConversationObserver: Send + Sync {
    /// The local history was replaced, by a server snapshot or a local edit.
    fn history_replaced(&self, _history: &[ConversationItem]) {}

    /// The active agent name changed; `None` after a reset.
    fn agent_changed(&self, _name: Option<&str>) {}

    /// The connection became ready for sending, or stopped being ready.
    fn readiness_changed(&self, _ready: bool) {}

    /// The client started or stopped waiting for the server's reply to
    /// the most recent user turn.
    fn awaiting_changed(&self, _awaiting: bool) {}

    /// An operation failed and the observable error slot was updated.
    fn error_set(&self, _error: &ClientError) {}

    /// One decoded chunk of the agent's audio response.
    fn audio_delta(&self, _samples: &[i16]) {}

    /// The agent's audio response stream ended.
    fn audio_done(&self) {}
}

/// Observer that ignores every notification.
pub struct NoopObserver;

impl ConversationObserver for NoopObserver {}
