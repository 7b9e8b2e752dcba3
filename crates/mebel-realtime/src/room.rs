//! Chat room state driven by inbound envelopes.
//!
//! A [`ChatRoom`] is the subscriber a UI hangs off the signaling channel:
//! it keeps the message history of one conversation, tracks who is
//! typing, applies read receipts and hands call payloads on to the call
//! session. It also builds the outbound envelopes for the same room.

use std::collections::{HashSet, VecDeque};

use mebel_common::{new_id, UserId};
use tracing::{debug, trace};

use crate::envelope::{Envelope, EnvelopeBody, EnvelopeKind, OutboundEnvelope, SignalPayload};

/// Messages kept per room when nothing else is configured.
pub const DEFAULT_MAX_MESSAGES: usize = 500;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct RoomConfig {
    /// Oldest messages are evicted past this many.
    pub max_messages: usize,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            max_messages: DEFAULT_MAX_MESSAGES,
        }
    }
}

/// One message in the room history.
#[derive(Debug, Clone, PartialEq)]
pub struct RoomMessage {
    pub id: String,
    pub sender_id: UserId,
    pub content: String,
    /// Sender's timestamp.
    pub created_at: String,
    /// Participants who have seen it, sender first.
    pub read_by: Vec<UserId>,
}

impl RoomMessage {
    /// Whether anyone besides the sender has read it.
    pub fn read_by_others(&self) -> bool {
        self.read_by.len() > 1
    }
}

/// What changed after applying an envelope.
#[derive(Debug, Clone, PartialEq)]
pub enum RoomUpdate {
    MessageAdded(RoomMessage),
    TypingChanged { user: UserId, is_typing: bool },
    MessageRead { message_id: String, reader: UserId },
    /// Handshake data for the call session.
    CallSignal {
        from: UserId,
        kind: EnvelopeKind,
        payload: SignalPayload,
    },
}

// ---------------------------------------------------------------------------
// Chat Room
// ---------------------------------------------------------------------------

pub struct ChatRoom {
    chat_id: String,
    user_id: UserId,
    participants: Vec<UserId>,
    config: RoomConfig,
    messages: VecDeque<RoomMessage>,
    typing: HashSet<UserId>,
}

impl ChatRoom {
    pub fn new(
        chat_id: impl Into<String>,
        user_id: UserId,
        participants: Vec<UserId>,
        config: RoomConfig,
    ) -> Self {
        Self {
            chat_id: chat_id.into(),
            user_id,
            participants,
            config,
            messages: VecDeque::new(),
            typing: HashSet::new(),
        }
    }

    pub fn chat_id(&self) -> &str {
        &self.chat_id
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    pub fn participants(&self) -> &[UserId] {
        &self.participants
    }

    /// History, oldest first.
    pub fn messages(&self) -> impl Iterator<Item = &RoomMessage> {
        self.messages.iter()
    }

    pub fn message(&self, id: &str) -> Option<&RoomMessage> {
        self.messages.iter().find(|m| m.id == id)
    }

    pub fn is_typing(&self, user: &UserId) -> bool {
        self.typing.contains(user)
    }

    /// Other participants currently typing, sorted for stable display.
    pub fn typing_users(&self) -> Vec<&UserId> {
        let mut users: Vec<&UserId> = self.typing.iter().collect();
        users.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        users
    }

    // -- Inbound ------------------------------------------------------------

    /// Apply one inbound envelope.
    ///
    /// Envelopes for other rooms, own typing echoes, duplicates and receipts
    /// for unknown messages change nothing and return `None`.
    pub fn apply(&mut self, envelope: &Envelope) -> Option<RoomUpdate> {
        if envelope.conversation_id != self.chat_id {
            trace!(chat_id = %envelope.conversation_id, "Envelope for another room");
            return None;
        }

        let sender = &envelope.sender_id;
        match &envelope.body {
            EnvelopeBody::Message {
                message_id,
                content,
            } => {
                if self.message(message_id).is_some() {
                    debug!(message_id = %message_id, "Duplicate message ignored");
                    return None;
                }
                let message = RoomMessage {
                    id: message_id.clone(),
                    sender_id: sender.clone(),
                    content: content.clone(),
                    created_at: envelope.timestamp.clone(),
                    read_by: vec![sender.clone()],
                };
                self.push_message(message.clone());
                // A message ends the sender's typing indicator.
                self.typing.remove(sender);
                Some(RoomUpdate::MessageAdded(message))
            }

            EnvelopeBody::Typing { is_typing } => {
                if *sender == self.user_id {
                    return None;
                }
                let changed = if *is_typing {
                    self.typing.insert(sender.clone())
                } else {
                    self.typing.remove(sender)
                };
                changed.then(|| RoomUpdate::TypingChanged {
                    user: sender.clone(),
                    is_typing: *is_typing,
                })
            }

            EnvelopeBody::ReadReceipt { message_id } => {
                let message = self.messages.iter_mut().find(|m| &m.id == message_id)?;
                if message.read_by.contains(sender) {
                    return None;
                }
                message.read_by.push(sender.clone());
                Some(RoomUpdate::MessageRead {
                    message_id: message_id.clone(),
                    reader: sender.clone(),
                })
            }

            EnvelopeBody::CallOffer(payload)
            | EnvelopeBody::CallAnswer(payload)
            | EnvelopeBody::CallCandidate(payload) => {
                if *sender == self.user_id {
                    return None;
                }
                Some(RoomUpdate::CallSignal {
                    from: sender.clone(),
                    kind: envelope.kind(),
                    payload: payload.clone(),
                })
            }
        }
    }

    fn push_message(&mut self, message: RoomMessage) {
        if self.config.max_messages == 0 {
            return;
        }
        while self.messages.len() >= self.config.max_messages {
            self.messages.pop_front();
        }
        self.messages.push_back(message);
    }

    // -- Outbound -----------------------------------------------------------

    /// A chat message to every participant. `None` for blank input.
    pub fn compose_message(&self, content: &str) -> Option<OutboundEnvelope> {
        if content.trim().is_empty() {
            return None;
        }
        Some(self.outbound(
            self.participants.clone(),
            EnvelopeBody::Message {
                message_id: new_id(),
                content: content.to_string(),
            },
        ))
    }

    /// A typing indicator for everyone but ourselves.
    pub fn compose_typing(&self, is_typing: bool) -> OutboundEnvelope {
        self.outbound(self.others(), EnvelopeBody::Typing { is_typing })
    }

    pub fn compose_read_receipt(&self, message_id: impl Into<String>) -> OutboundEnvelope {
        self.outbound(
            self.others(),
            EnvelopeBody::ReadReceipt {
                message_id: message_id.into(),
            },
        )
    }

    /// Wrap a call session payload for `recipient`.
    pub fn compose_call_signal(
        &self,
        recipient: UserId,
        payload: SignalPayload,
    ) -> OutboundEnvelope {
        self.outbound(vec![recipient], EnvelopeBody::call_signal(payload))
    }

    fn others(&self) -> Vec<UserId> {
        self.participants
            .iter()
            .filter(|p| **p != self.user_id)
            .cloned()
            .collect()
    }

    fn outbound(&self, recipient_ids: Vec<UserId>, body: EnvelopeBody) -> OutboundEnvelope {
        OutboundEnvelope {
            conversation_id: self.chat_id.clone(),
            sender_id: self.user_id.clone(),
            recipient_ids,
            body,
        }
    }
}
