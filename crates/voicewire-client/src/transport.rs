//! Transport seam between the conversation client and the socket.
//!
//! The client talks to the network through three narrow traits so the
//! protocol logic can be exercised against scripted transports. The
//! production implementation rides on `tokio-tungstenite`.

use async_trait::async_trait;
use futures_util::{
    SinkExt, StreamExt,
    stream::{SplitSink, SplitStream},
};
use tokio::net::TcpStream;
use tokio_tungstenite::{
    MaybeTlsStream, WebSocketStream, connect_async, tungstenite::protocol::Message,
};
use tracing::debug;

use crate::error::ClientError;

/// Lifecycle events surfaced by a frame source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SocketEvent {
    /// The transport finished its handshake and can carry frames.
    Opened,
    /// One complete text frame arrived.
    Frame(String),
    /// The transport closed, by a peer close frame or end of stream.
    Closed,
    /// The transport failed and is unusable afterwards.
    Errored(String),
}

/// Outbound half of a connection.
#[async_trait]
pub trait FrameSink: Send {
    /// Hands one text frame to the transport.
    async fn send(&mut self, frame: String) -> Result<(), ClientError>;

    /// Closes the outbound half. Idempotent.
    async fn close(&mut self);
}

/// Inbound half of a connection.
#[async_trait]
pub trait FrameSource: Send {
    /// Waits for the next lifecycle event. `None` once the source is
    /// exhausted after a close or error.
    async fn next_event(&mut self) -> Option<SocketEvent>;
}

/// Opens connections to a conversation endpoint.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Establishes a connection, returning its two halves.
    async fn connect(
        &self,
        endpoint: &str,
    ) -> Result<(Box<dyn FrameSink>, Box<dyn FrameSource>), ClientError>;
}

/// Production connector over `tokio-tungstenite`.
pub struct WsConnector;

#[async_trait]
impl Connector for WsConnector {
    async fn connect(
        &self,
        endpoint: &str,
    ) -> Result<(Box<dyn FrameSink>, Box<dyn FrameSource>), ClientError> {
        let (stream, _) = connect_async(endpoint)
            .await
            .map_err(|e| ClientError::TransportCreate(e.to_string()))?;
        let (tx, rx) = stream.split();
        Ok((
            Box::new(WsSink { tx }),
            Box::new(WsSource { rx, opened: false }),
        ))
    }
}

struct WsSink {
    tx: SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, Message>,
}

#[async_trait]
impl FrameSink for WsSink {
    async fn send(&mut self, frame: String) -> Result<(), ClientError> {
        self.tx
            .send(Message::Text(frame.into()))
            .await
            .map_err(|e| ClientError::Send(e.to_string()))
    }

    async fn close(&mut self) {
        let _ = self.tx.close().await;
    }
}

struct WsSource {
    rx: SplitStream<WebSocketStream<MaybeTlsStream<TcpStream>>>,
    opened: bool,
}

#[async_trait]
impl FrameSource for WsSource {
    async fn next_event(&mut self) -> Option<SocketEvent> {
        // The handshake completed inside `connect_async`, so the first
        // event out of this source is always `Opened`.
        if !self.opened {
            self.opened = true;
            return Some(SocketEvent::Opened);
        }
        loop {
            match self.rx.next().await {
                Some(Ok(Message::Text(text))) => return Some(SocketEvent::Frame(text.to_string())),
                Some(Ok(Message::Close(frame))) => {
                    debug!(?frame, "peer closed the socket");
                    return Some(SocketEvent::Closed);
                }
                // The protocol is text-only; binary and control frames
                // carry nothing for us.
                Some(Ok(_)) => continue,
                Some(Err(e)) => return Some(SocketEvent::Errored(e.to_string())),
                None => return Some(SocketEvent::Closed),
            }
        }
    }
}
