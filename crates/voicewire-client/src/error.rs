//! Error taxonomy for the conversation client.
//!
//! Every failure here is recovered locally: it lands in the client's
//! observable error slot, reaches the observer, and is logged. Nothing
//! crosses the public API as anything but a `Result`, and no failure
//! is retried on the caller's behalf.

/// Errors surfaced by conversation client operations.
///
/// Variants carry display strings rather than source errors so the most
/// recent error can be retained in the client state while also being
/// returned to the caller.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClientError {
    /// The transport could not be created (malformed endpoint, failed handshake).
    #[error("failed to create transport: {0}")]
    TransportCreate(String),
    /// The established transport reported an error.
    #[error("transport error: {0}")]
    TransportRuntime(String),
    /// A frame could not be handed to the transport.
    #[error("failed to send frame: {0}")]
    Send(String),
    /// The operation requires an open connection and none exists.
    #[error("not connected")]
    NotConnected,
    /// An inbound frame was not a well-formed protocol event.
    #[error("failed to decode frame: {0}")]
    Decode(String),
    /// An audio payload was not valid base64 PCM16.
    #[error("failed to decode audio payload: {0}")]
    AudioDecode(String),
}
