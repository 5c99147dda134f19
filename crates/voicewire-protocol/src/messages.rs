//! Defines the JSON message protocol between the client and the conversation server.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Speaker role of a conversation turn.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

/// Kind discriminator of a conversation item.
///
/// Only plain messages are modelled; any other value decodes as `Other`
/// so newer servers do not break older clients.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    #[default]
    Message,
    #[serde(other)]
    Other,
}

/// One turn in the conversation exchange. Immutable once part of a
/// history snapshot.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ConversationItem {
    pub role: Role,
    #[serde(default)]
    pub content: String,
    #[serde(rename = "type", default)]
    pub kind: ItemKind,
}

impl ConversationItem {
    /// A user message turn.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            kind: ItemKind::Message,
        }
    }

    /// An assistant message turn.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            kind: ItemKind::Message,
        }
    }
}

/// Commands sent from the client to the conversation server.
///
/// One JSON object per frame; commands are never batched.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(tag = "type")]
pub enum ClientCommand {
    /// Pushes the full authoritative history, optionally resetting the agent.
    #[serde(rename = "history.update")]
    UpdateHistory {
        inputs: Vec<ConversationItem>,
        #[serde(skip_serializing_if = "Option::is_none")]
        reset_agent: Option<bool>,
    },
    /// Appends a base64-encoded PCM16 chunk to the input audio buffer.
    #[serde(rename = "input_audio_buffer.append")]
    AppendAudio { delta: String },
    /// Signals the end of one audio turn.
    #[serde(rename = "input_audio_buffer.commit")]
    CommitAudio,
}

impl ClientCommand {
    /// Serializes the command into one wire frame.
    pub fn to_frame(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Events received from the conversation server.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type")]
pub enum ServerEvent {
    /// Authoritative replacement of the conversation history.
    #[serde(rename = "history.updated")]
    HistoryUpdated {
        inputs: Vec<ConversationItem>,
        #[serde(default)]
        agent_name: Option<String>,
    },
    /// One streamed chunk of the agent's audio response.
    #[serde(rename = "response.audio.delta")]
    AudioDelta { delta: String },
    /// Marks the end of an audio response stream.
    #[serde(rename = "audio.done")]
    AudioDone,
}

impl ServerEvent {
    const KNOWN_TYPES: [&str; 3] = ["history.updated", "response.audio.delta", "audio.done"];

    /// Decodes one inbound frame.
    ///
    /// Returns `Ok(None)` for event kinds this client does not
    /// understand (including frames with no `type` field at all), so a
    /// newer server can add events without breaking us. Malformed JSON
    /// and malformed known events are errors.
    pub fn decode(frame: &str) -> serde_json::Result<Option<Self>> {
        let value: Value = serde_json::from_str(frame)?;
        let known = value
            .get("type")
            .and_then(Value::as_str)
            .is_some_and(|kind| Self::KNOWN_TYPES.contains(&kind));
        if !known {
            return Ok(None);
        }
        serde_json::from_value(value).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_history_frame_shape() {
        let command = ClientCommand::UpdateHistory {
            inputs: vec![ConversationItem::user("hi")],
            reset_agent: None,
        };
        assert_eq!(
            command.to_frame().unwrap(),
            r#"{"type":"history.update","inputs":[{"role":"user","content":"hi","type":"message"}]}"#
        );
    }

    #[test]
    fn test_reset_frame_carries_reset_agent() {
        let command = ClientCommand::UpdateHistory {
            inputs: vec![],
            reset_agent: Some(true),
        };
        assert_eq!(
            command.to_frame().unwrap(),
            r#"{"type":"history.update","inputs":[],"reset_agent":true}"#
        );
    }

    #[test]
    fn test_audio_command_frames() {
        let append = ClientCommand::AppendAudio {
            delta: "AAEC".to_string(),
        };
        assert_eq!(
            append.to_frame().unwrap(),
            r#"{"type":"input_audio_buffer.append","delta":"AAEC"}"#
        );
        assert_eq!(
            ClientCommand::CommitAudio.to_frame().unwrap(),
            r#"{"type":"input_audio_buffer.commit"}"#
        );
    }

    #[test]
    fn test_decode_history_updated() {
        let frame = r#"{"type":"history.updated","inputs":[{"role":"assistant","content":"hello","type":"message"}],"agent_name":"Triage Agent"}"#;
        let event = ServerEvent::decode(frame).unwrap().unwrap();
        match event {
            ServerEvent::HistoryUpdated { inputs, agent_name } => {
                assert_eq!(inputs.len(), 1);
                assert_eq!(inputs[0].role, Role::Assistant);
                assert_eq!(inputs[0].content, "hello");
                assert_eq!(agent_name.as_deref(), Some("Triage Agent"));
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn test_decode_history_updated_without_agent_name() {
        let frame = r#"{"type":"history.updated","inputs":[]}"#;
        let event = ServerEvent::decode(frame).unwrap().unwrap();
        assert_eq!(
            event,
            ServerEvent::HistoryUpdated {
                inputs: vec![],
                agent_name: None,
            }
        );
    }

    #[test]
    fn test_decode_audio_events() {
        let delta = ServerEvent::decode(r#"{"type":"response.audio.delta","delta":"AAEA"}"#)
            .unwrap()
            .unwrap();
        assert_eq!(
            delta,
            ServerEvent::AudioDelta {
                delta: "AAEA".to_string(),
            }
        );

        let done = ServerEvent::decode(r#"{"type":"audio.done"}"#).unwrap().unwrap();
        assert_eq!(done, ServerEvent::AudioDone);
    }

    #[test]
    fn test_decode_ignores_unknown_event_kinds() {
        assert_eq!(
            ServerEvent::decode(r#"{"type":"session.created","id":"abc"}"#).unwrap(),
            None
        );
        // No `type` field at all is treated the same way
        assert_eq!(ServerEvent::decode(r#"{"inputs":[]}"#).unwrap(), None);
    }

    #[test]
    fn test_decode_rejects_malformed_frames() {
        assert!(ServerEvent::decode("{not json").is_err());
        // Known kind with a missing required field
        assert!(ServerEvent::decode(r#"{"type":"history.updated"}"#).is_err());
        assert!(ServerEvent::decode(r#"{"type":"response.audio.delta"}"#).is_err());
    }

    #[test]
    fn test_item_defaults_are_lenient() {
        let item: ConversationItem = serde_json::from_str(r#"{"role":"system"}"#).unwrap();
        assert_eq!(item.role, Role::System);
        assert_eq!(item.content, "");
        assert_eq!(item.kind, ItemKind::Message);

        // Unrecognized item kinds are kept as opaque turns
        let item: ConversationItem =
            serde_json::from_str(r#"{"role":"user","content":"x","type":"function_call"}"#).unwrap();
        assert_eq!(item.kind, ItemKind::Other);
    }
}
