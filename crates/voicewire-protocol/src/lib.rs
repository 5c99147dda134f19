//! Wire protocol for voicewire conversation sockets.
//!
//! The client and the conversation server exchange one JSON object per
//! WebSocket text frame. This crate defines those frames and the base64
//! framing of PCM16 audio payloads:
//!
//! - `messages`: the tagged command and event types plus the conversation item model.
//! - `audio`: encoding and decoding of 16-bit PCM samples for the `delta` fields.

pub mod audio;
pub mod messages;

pub use messages::{ClientCommand, ConversationItem, ItemKind, Role, ServerEvent};
