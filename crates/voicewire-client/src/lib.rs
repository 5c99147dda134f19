//! Client for one voicewire conversation socket.
//!
//! Owns a single WebSocket connection to a conversation server,
//! serializes outbound commands to wire frames, decodes inbound frames
//! into typed events, and notifies a host-provided observer on every
//! state change. It is structured into submodules for clarity:
//!
//! - `client`: connection lifecycle, optimistic history, and inbound dispatch.
//! - `transport`: the connector/sink/source seam over `tokio-tungstenite`.
//! - `observer`: the notification trait hosts implement to render state.
//! - `error`: the locally-recovered error taxonomy.
//!
//! There is deliberately no reconnection logic: a connection that
//! closes or fails stays dead, and the caller decides whether to start
//! a new one.

pub mod client;
pub mod error;
pub mod observer;
pub mod transport;

pub use client::{ConnectionState, ConversationClient};
pub use error::ClientError;
pub use observer::{ConversationObserver, NoopObserver};
pub use transport::{Connector, FrameSink, FrameSource, SocketEvent, WsConnector};
