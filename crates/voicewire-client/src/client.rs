//! Conversation socket client: connection lifecycle, optimistic
//! history, and inbound event dispatch.

use std::sync::Arc;

use tokio::{sync::Mutex, task::JoinHandle};
use tracing::{error, info, trace, warn};
use voicewire_protocol::{ClientCommand, ConversationItem, Role, ServerEvent, audio};

use crate::{
    error::ClientError,
    observer::ConversationObserver,
    transport::{Connector, FrameSink, FrameSource, SocketEvent, WsConnector},
};

/// Lifecycle of the client's connection.
///
/// `Idle` is the resting state before the first `start`; the remaining
/// states describe one connection instance. `Closed` and `Failed` are
/// terminal for that instance — a later `start` begins a fresh one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Idle,
    Connecting,
    Open,
    Closing,
    Closed,
    Failed,
}

/// Client for one conversation socket.
///
/// Owns the connection exclusively, keeps the optimistic local view of
/// the conversation, and notifies a [`ConversationObserver`] on every
/// state change. Sending is fire-and-forget: no send waits for an
/// acknowledgement, and a send issued before the connection is open
/// fails fast instead of buffering.
pub struct ConversationClient {
    endpoint: String,
    connector: Arc<dyn Connector>,
    inner: Arc<Mutex<ClientInner>>,
    dispatch: Option<JoinHandle<()>>,
}

impl ConversationClient {
    /// Creates a client for `endpoint` using the production WebSocket
    /// connector.
    pub fn new(endpoint: impl Into<String>, observer: Arc<dyn ConversationObserver>) -> Self {
        Self::with_connector(endpoint, Arc::new(WsConnector), observer)
    }

    /// Creates a client that opens connections through a custom
    /// [`Connector`].
    pub fn with_connector(
        endpoint: impl Into<String>,
        connector: Arc<dyn Connector>,
        observer: Arc<dyn ConversationObserver>,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            connector,
            inner: Arc::new(Mutex::new(ClientInner::new(observer))),
            dispatch: None,
        }
    }

    /// Opens the connection and spawns the inbound dispatch task.
    ///
    /// Failure leaves the client in `Failed` and is returned to the
    /// caller; nothing is retried. Starting over a previous connection
    /// closes that connection first.
    pub async fn start(&mut self) -> Result<(), ClientError> {
        self.teardown().await;
        match self.connector.connect(&self.endpoint).await {
            Ok((sink, source)) => {
                self.inner.lock().await.attach(sink);
                info!(endpoint = %self.endpoint, "conversation socket connecting");
                self.dispatch = Some(tokio::spawn(dispatch_loop(self.inner.clone(), source)));
                Ok(())
            }
            Err(e) => {
                let mut inner = self.inner.lock().await;
                inner.set_state(ConnectionState::Failed);
                error!(endpoint = %self.endpoint, error = %e, "failed to open conversation socket");
                Err(inner.record(e))
            }
        }
    }

    /// Closes the connection. Safe to call at any point of the
    /// lifecycle, including while an open is still in flight.
    pub async fn stop(&mut self) {
        self.teardown().await;
    }

    async fn teardown(&mut self) {
        if let Some(handle) = self.dispatch.take() {
            handle.abort();
        }
        self.inner.lock().await.shutdown().await;
    }

    /// Appends a user turn to the optimistic history and pushes the
    /// full updated history to the server.
    pub async fn send_text_message(&self, text: impl Into<String>) -> Result<(), ClientError> {
        self.inner.lock().await.send_text_message(text.into()).await
    }

    /// Sends one PCM16 audio chunk as an append-then-commit turn.
    pub async fn send_audio_chunk(&self, samples: &[i16]) -> Result<(), ClientError> {
        self.inner.lock().await.send_audio_chunk(samples).await
    }

    /// Clears the local conversation and asks the server to reset the
    /// agent.
    pub async fn reset_conversation(&self) -> Result<(), ClientError> {
        self.inner.lock().await.reset_conversation().await
    }

    /// Current connection state.
    pub async fn connection_state(&self) -> ConnectionState {
        self.inner.lock().await.state
    }

    /// Whether the connection is open for sending.
    pub async fn is_ready(&self) -> bool {
        self.inner.lock().await.state == ConnectionState::Open
    }

    /// Whether the client is waiting for the server's reply to the most
    /// recent user turn.
    pub async fn is_awaiting_response(&self) -> bool {
        self.inner.lock().await.awaiting_response
    }

    /// Snapshot of the local history.
    pub async fn history(&self) -> Vec<ConversationItem> {
        self.inner.lock().await.history.clone()
    }

    /// Agent name, once the server has announced one.
    pub async fn agent_name(&self) -> Option<String> {
        self.inner.lock().await.agent_name.clone()
    }

    /// Most recent locally-recovered error, if any.
    pub async fn last_error(&self) -> Option<ClientError> {
        self.inner.lock().await.last_error.clone()
    }
}

impl Drop for ConversationClient {
    fn drop(&mut self) {
        // Dropping the dispatch task and the sink tears the socket
        // down with it; `stop` does the same but with an orderly close.
        if let Some(handle) = self.dispatch.take() {
            handle.abort();
        }
    }
}

/// Drives inbound transport events into the client until the
/// connection reaches a terminal state.
async fn dispatch_loop(inner: Arc<Mutex<ClientInner>>, mut source: Box<dyn FrameSource>) {
    while let Some(event) = source.next_event().await {
        let terminal = matches!(event, SocketEvent::Closed | SocketEvent::Errored(_));
        inner.lock().await.handle_socket_event(event);
        if terminal {
            break;
        }
    }
}

/// Connection handle plus conversation state, owned behind one lock so
/// the dispatch task and public operations never interleave mid-update.
struct ClientInner {
    state: ConnectionState,
    sink: Option<Box<dyn FrameSink>>,
    history: Vec<ConversationItem>,
    agent_name: Option<String>,
    awaiting_response: bool,
    last_error: Option<ClientError>,
    observer: Arc<dyn ConversationObserver>,
}

impl ClientInner {
    fn new(observer: Arc<dyn ConversationObserver>) -> Self {
        Self {
            state: ConnectionState::Idle,
            sink: None,
            history: Vec::new(),
            agent_name: None,
            awaiting_response: false,
            last_error: None,
            observer,
        }
    }

    /// Installs a freshly-connected sink and marks the connection as in
    /// flight until the transport reports it opened.
    fn attach(&mut self, sink: Box<dyn FrameSink>) {
        self.sink = Some(sink);
        self.set_state(ConnectionState::Connecting);
    }

    /// Closes whatever transport exists. A `Failed` connection keeps
    /// its state; everything else lands in `Closed`.
    async fn shutdown(&mut self) {
        let failed = self.state == ConnectionState::Failed;
        if let Some(mut sink) = self.sink.take() {
            if !failed {
                self.set_state(ConnectionState::Closing);
            }
            sink.close().await;
            if !failed {
                self.set_state(ConnectionState::Closed);
            }
            info!("conversation socket closed");
        }
    }

    fn set_state(&mut self, next: ConnectionState) {
        let was_ready = self.state == ConnectionState::Open;
        self.state = next;
        let ready = next == ConnectionState::Open;
        if was_ready != ready {
            self.observer.readiness_changed(ready);
        }
    }

    fn set_awaiting(&mut self, awaiting: bool) {
        if self.awaiting_response != awaiting {
            self.awaiting_response = awaiting;
            self.observer.awaiting_changed(awaiting);
        }
    }

    fn record(&mut self, error: ClientError) -> ClientError {
        self.observer.error_set(&error);
        self.last_error = Some(error.clone());
        error
    }

    fn clear_error(&mut self) {
        self.last_error = None;
    }

    fn handle_socket_event(&mut self, event: SocketEvent) {
        match event {
            SocketEvent::Opened => {
                self.clear_error();
                self.set_state(ConnectionState::Open);
                info!("conversation socket open");
            }
            SocketEvent::Closed => {
                self.set_state(ConnectionState::Closed);
                info!("conversation socket closed by transport");
            }
            SocketEvent::Errored(reason) => {
                self.set_state(ConnectionState::Failed);
                self.set_awaiting(false);
                error!(%reason, "conversation socket errored");
                self.record(ClientError::TransportRuntime(reason));
            }
            SocketEvent::Frame(frame) => self.handle_frame(&frame),
        }
    }

    fn handle_frame(&mut self, frame: &str) {
        let event = match ServerEvent::decode(frame) {
            Ok(Some(event)) => event,
            Ok(None) => {
                trace!(frame, "ignoring unknown event");
                return;
            }
            Err(e) => {
                warn!(error = %e, "dropping malformed frame");
                self.record(ClientError::Decode(e.to_string()));
                return;
            }
        };
        match event {
            ServerEvent::HistoryUpdated { inputs, agent_name } => {
                // A trailing user turn means the server has not replied
                // yet; anything else ends the wait.
                if inputs.last().map(|item| item.role) != Some(Role::User) {
                    self.set_awaiting(false);
                }
                self.history = inputs;
                self.observer.history_replaced(&self.history);
                if let Some(name) = agent_name {
                    self.agent_name = Some(name);
                    self.observer.agent_changed(self.agent_name.as_deref());
                }
            }
            ServerEvent::AudioDelta { delta } => match audio::decode_pcm16(&delta) {
                Ok(samples) => self.observer.audio_delta(&samples),
                Err(e) => {
                    warn!(error = %e, "dropping undecodable audio delta");
                    self.record(ClientError::AudioDecode(e.to_string()));
                }
            },
            ServerEvent::AudioDone => self.observer.audio_done(),
        }
    }

    async fn send_text_message(&mut self, text: String) -> Result<(), ClientError> {
        self.set_awaiting(true);
        self.history.push(ConversationItem::user(text));
        self.observer.history_replaced(&self.history);
        let command = ClientCommand::UpdateHistory {
            inputs: self.history.clone(),
            reset_agent: None,
        };
        match self.send_when_open(&command).await {
            Ok(()) => {
                self.clear_error();
                Ok(())
            }
            Err(e) => {
                // The optimistic append stays: the turn remains part of
                // the local view even though the server never saw it.
                self.set_awaiting(false);
                Err(self.record(e))
            }
        }
    }

    async fn send_audio_chunk(&mut self, samples: &[i16]) -> Result<(), ClientError> {
        if self.sink.is_none() || self.state != ConnectionState::Open {
            return Err(self.record(ClientError::NotConnected));
        }
        let commands = [
            ClientCommand::UpdateHistory {
                inputs: self.history.clone(),
                reset_agent: None,
            },
            ClientCommand::AppendAudio {
                delta: audio::encode_pcm16(samples),
            },
            ClientCommand::CommitAudio,
        ];
        // Append must reach the server before commit, so the three
        // frames go out one at a time in protocol order.
        for command in &commands {
            if let Err(e) = self.transmit(command).await {
                return Err(self.record(e));
            }
        }
        self.clear_error();
        Ok(())
    }

    async fn reset_conversation(&mut self) -> Result<(), ClientError> {
        self.history.clear();
        self.observer.history_replaced(&self.history);
        self.set_awaiting(false);
        if self.agent_name.take().is_some() {
            self.observer.agent_changed(None);
        }
        if self.sink.is_none() {
            // Nothing to tell; the local reset alone succeeds.
            return Ok(());
        }
        let command = ClientCommand::UpdateHistory {
            inputs: Vec::new(),
            reset_agent: Some(true),
        };
        match self.transmit(&command).await {
            Err(e) => Err(self.record(e)),
            Ok(()) => {
                if self.state != ConnectionState::Open {
                    // Readiness probe: the transport accepted the frame
                    // but the connection is not open, so treat it as
                    // gone rather than leave a half-dead socket around.
                    warn!("connection not open after reset; force-closing");
                    self.shutdown().await;
                    Err(self.record(ClientError::TransportRuntime(
                        "connection timed out".to_string(),
                    )))
                } else {
                    self.clear_error();
                    Ok(())
                }
            }
        }
    }

    /// Sends a command, requiring the connection to be `Open`.
    async fn send_when_open(&mut self, command: &ClientCommand) -> Result<(), ClientError> {
        if self.state != ConnectionState::Open {
            return Err(ClientError::Send("transport is not open".to_string()));
        }
        self.transmit(command).await
    }

    /// Hands a command to the sink without checking connection state.
    async fn transmit(&mut self, command: &ClientCommand) -> Result<(), ClientError> {
        let frame = command
            .to_frame()
            .map_err(|e| ClientError::Send(e.to_string()))?;
        let Some(sink) = self.sink.as_mut() else {
            return Err(ClientError::Send("transport is not open".to_string()));
        };
        sink.send(frame).await
    }
}
