//! Signaling envelope: the unit exchanged over the chat/signaling socket.
//!
//! The wire shape is a flat JSON object (`type`, `chat_id`, `message_id`,
//! `sender_id`, `recipients`, `content`, `data`, `timestamp`). In memory the
//! kind-specific fields live in [`EnvelopeBody`], so an envelope can never
//! carry a `content` for a typing event or a payload for a chat message.

use mebel_common::UserId;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Kinds
// ---------------------------------------------------------------------------

/// Discriminant carried in the `type` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnvelopeKind {
    Message,
    Typing,
    CallOffer,
    CallAnswer,
    CallCandidate,
    ReadReceipt,
}

impl EnvelopeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Message => "message",
            Self::Typing => "typing",
            Self::CallOffer => "call_offer",
            Self::CallAnswer => "call_answer",
            Self::CallCandidate => "call_candidate",
            Self::ReadReceipt => "read_receipt",
        }
    }

    pub fn is_call_signal(self) -> bool {
        matches!(
            self,
            Self::CallOffer | Self::CallAnswer | Self::CallCandidate
        )
    }
}

impl std::fmt::Display for EnvelopeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Signal payload
// ---------------------------------------------------------------------------

/// Opaque peer-negotiation data (session description or ICE candidate).
///
/// Passed through unexamined apart from the top-level `"type"` string,
/// which decides which call envelope kind carries it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SignalPayload(serde_json::Value);

impl SignalPayload {
    pub fn new(value: serde_json::Value) -> Self {
        Self(value)
    }

    pub fn as_value(&self) -> &serde_json::Value {
        &self.0
    }

    pub fn into_value(self) -> serde_json::Value {
        self.0
    }

    /// Envelope kind used to forward this payload: `offer` and `answer`
    /// descriptions map to their own kinds, everything else is a candidate.
    pub fn envelope_kind(&self) -> EnvelopeKind {
        match self.0.get("type").and_then(|t| t.as_str()) {
            Some("offer") => EnvelopeKind::CallOffer,
            Some("answer") => EnvelopeKind::CallAnswer,
            _ => EnvelopeKind::CallCandidate,
        }
    }
}

impl From<serde_json::Value> for SignalPayload {
    fn from(value: serde_json::Value) -> Self {
        Self(value)
    }
}

// ---------------------------------------------------------------------------
// Body
// ---------------------------------------------------------------------------

/// Kind-specific part of an envelope.
#[derive(Debug, Clone, PartialEq)]
pub enum EnvelopeBody {
    Message { message_id: String, content: String },
    Typing { is_typing: bool },
    CallOffer(SignalPayload),
    CallAnswer(SignalPayload),
    CallCandidate(SignalPayload),
    ReadReceipt { message_id: String },
}

impl EnvelopeBody {
    pub fn kind(&self) -> EnvelopeKind {
        match self {
            Self::Message { .. } => EnvelopeKind::Message,
            Self::Typing { .. } => EnvelopeKind::Typing,
            Self::CallOffer(_) => EnvelopeKind::CallOffer,
            Self::CallAnswer(_) => EnvelopeKind::CallAnswer,
            Self::CallCandidate(_) => EnvelopeKind::CallCandidate,
            Self::ReadReceipt { .. } => EnvelopeKind::ReadReceipt,
        }
    }

    /// Wrap a signal payload in the call body its `"type"` calls for.
    pub fn call_signal(payload: SignalPayload) -> Self {
        match payload.envelope_kind() {
            EnvelopeKind::CallOffer => Self::CallOffer(payload),
            EnvelopeKind::CallAnswer => Self::CallAnswer(payload),
            _ => Self::CallCandidate(payload),
        }
    }

    pub fn signal_payload(&self) -> Option<&SignalPayload> {
        match self {
            Self::CallOffer(p) | Self::CallAnswer(p) | Self::CallCandidate(p) => Some(p),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Envelope
// ---------------------------------------------------------------------------

/// A fully stamped envelope as it travels over the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "WireEnvelope", into = "WireEnvelope")]
pub struct Envelope {
    pub conversation_id: String,
    pub sender_id: UserId,
    /// Advisory routing hint; the transport does not filter on it.
    pub recipient_ids: Vec<UserId>,
    pub body: EnvelopeBody,
    /// ISO-8601, stamped by the sender.
    pub timestamp: String,
}

impl Envelope {
    pub fn kind(&self) -> EnvelopeKind {
        self.body.kind()
    }
}

/// An envelope that has not been stamped yet. `send` adds the timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundEnvelope {
    pub conversation_id: String,
    pub sender_id: UserId,
    pub recipient_ids: Vec<UserId>,
    pub body: EnvelopeBody,
}

impl OutboundEnvelope {
    pub fn stamp(self, timestamp: impl Into<String>) -> Envelope {
        Envelope {
            conversation_id: self.conversation_id,
            sender_id: self.sender_id,
            recipient_ids: self.recipient_ids,
            body: self.body,
            timestamp: timestamp.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Errors / decoding
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum EnvelopeError {
    /// Not JSON, unknown `type`, or a base field missing.
    #[error("malformed envelope: {0}")]
    Json(#[from] serde_json::Error),

    #[error("malformed {kind} envelope: missing `{field}`")]
    MissingField {
        kind: EnvelopeKind,
        field: &'static str,
    },
}

/// Parse one inbound text frame.
pub fn decode(text: &str) -> Result<Envelope, EnvelopeError> {
    let wire: WireEnvelope = serde_json::from_str(text)?;
    Envelope::try_from(wire)
}

/// Serialize an envelope into one outbound text frame.
pub fn encode(envelope: &Envelope) -> Result<String, EnvelopeError> {
    Ok(serde_json::to_string(envelope)?)
}

// ---------------------------------------------------------------------------
// Wire representation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
struct WireEnvelope {
    #[serde(rename = "type")]
    kind: EnvelopeKind,
    chat_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    message_id: Option<String>,
    sender_id: UserId,
    #[serde(default)]
    recipients: Vec<UserId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    data: Option<serde_json::Value>,
    timestamp: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct TypingData {
    is_typing: bool,
}

impl TryFrom<WireEnvelope> for Envelope {
    type Error = EnvelopeError;

    fn try_from(wire: WireEnvelope) -> Result<Self, Self::Error> {
        let kind = wire.kind;
        let missing = |field| EnvelopeError::MissingField { kind, field };

        let body = match kind {
            EnvelopeKind::Message => EnvelopeBody::Message {
                message_id: wire.message_id.ok_or_else(|| missing("message_id"))?,
                content: wire.content.ok_or_else(|| missing("content"))?,
            },
            EnvelopeKind::ReadReceipt => EnvelopeBody::ReadReceipt {
                message_id: wire.message_id.ok_or_else(|| missing("message_id"))?,
            },
            EnvelopeKind::Typing => {
                let data = wire.data.ok_or_else(|| missing("data"))?;
                let typing: TypingData = serde_json::from_value(data)?;
                EnvelopeBody::Typing {
                    is_typing: typing.is_typing,
                }
            }
            EnvelopeKind::CallOffer => {
                EnvelopeBody::CallOffer(wire.data.ok_or_else(|| missing("data"))?.into())
            }
            EnvelopeKind::CallAnswer => {
                EnvelopeBody::CallAnswer(wire.data.ok_or_else(|| missing("data"))?.into())
            }
            EnvelopeKind::CallCandidate => {
                EnvelopeBody::CallCandidate(wire.data.ok_or_else(|| missing("data"))?.into())
            }
        };

        Ok(Envelope {
            conversation_id: wire.chat_id,
            sender_id: wire.sender_id,
            recipient_ids: wire.recipients,
            body,
            timestamp: wire.timestamp,
        })
    }
}

impl From<Envelope> for WireEnvelope {
    fn from(env: Envelope) -> Self {
        let kind = env.body.kind();
        let (message_id, content, data) = match env.body {
            EnvelopeBody::Message {
                message_id,
                content,
            } => (Some(message_id), Some(content), None),
            EnvelopeBody::ReadReceipt { message_id } => (Some(message_id), None, None),
            EnvelopeBody::Typing { is_typing } => (
                None,
                None,
                Some(serde_json::json!({ "is_typing": is_typing })),
            ),
            EnvelopeBody::CallOffer(p) | EnvelopeBody::CallAnswer(p) | EnvelopeBody::CallCandidate(p) => {
                (None, None, Some(p.into_value()))
            }
        };

        WireEnvelope {
            kind,
            chat_id: env.conversation_id,
            message_id,
            sender_id: env.sender_id,
            recipients: env.recipient_ids,
            content,
            data,
            timestamp: env.timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn message_envelope() -> Envelope {
        Envelope {
            conversation_id: "chat-17".into(),
            sender_id: "buyer-1".into(),
            recipient_ids: vec!["buyer-1".into(), "maker-9".into()],
            body: EnvelopeBody::Message {
                message_id: "m-1".into(),
                content: "Is the oak wardrobe still available?".into(),
            },
            timestamp: "2026-10-17T09:41:05.123Z".into(),
        }
    }

    #[test]
    fn message_survives_the_wire() {
        let original = message_envelope();
        let text = encode(&original).unwrap();
        let parsed = decode(&text).unwrap();
        assert_eq!(parsed, original);
    }

    #[test]
    fn wire_field_names_match_server_format() {
        let text = encode(&message_envelope()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["type"], "message");
        assert_eq!(value["chat_id"], "chat-17");
        assert_eq!(value["message_id"], "m-1");
        assert_eq!(value["sender_id"], "buyer-1");
        assert_eq!(value["recipients"], json!(["buyer-1", "maker-9"]));
        assert!(value.get("data").is_none());
    }

    #[test]
    fn typing_uses_data_flag() {
        let text = r#"{"type":"typing","chat_id":"c","sender_id":"u","recipients":["v"],
            "data":{"is_typing":true},"timestamp":"t"}"#;
        let env = decode(text).unwrap();
        assert_eq!(env.body, EnvelopeBody::Typing { is_typing: true });

        let out: serde_json::Value = serde_json::from_str(&encode(&env).unwrap()).unwrap();
        assert_eq!(out["data"], json!({ "is_typing": true }));
        assert!(out.get("content").is_none());
        assert!(out.get("message_id").is_none());
    }

    #[test]
    fn call_payload_is_passed_through_untouched() {
        let sdp = json!({ "type": "offer", "sdp": "v=0\r\no=- 46117 2 IN IP4 127.0.0.1", "extra": [1, 2] });
        let text = json!({
            "type": "call_offer", "chat_id": "c", "sender_id": "u",
            "recipients": ["v"], "data": sdp, "timestamp": "t"
        })
        .to_string();
        let env = decode(&text).unwrap();
        assert_eq!(env.body.signal_payload().unwrap().as_value(), &sdp);
    }

    #[test]
    fn missing_recipients_defaults_to_empty() {
        let text = r#"{"type":"read_receipt","chat_id":"c","message_id":"m","sender_id":"u","timestamp":"t"}"#;
        let env = decode(text).unwrap();
        assert!(env.recipient_ids.is_empty());
        assert_eq!(env.kind(), EnvelopeKind::ReadReceipt);
    }

    #[test]
    fn non_json_is_rejected() {
        assert!(matches!(decode("hello"), Err(EnvelopeError::Json(_))));
    }

    #[test]
    fn unknown_kind_is_rejected() {
        let text = r#"{"type":"notification","chat_id":"c","sender_id":"u","timestamp":"t"}"#;
        assert!(matches!(decode(text), Err(EnvelopeError::Json(_))));
    }

    #[test]
    fn missing_discriminant_is_rejected() {
        let text = r#"{"chat_id":"c","sender_id":"u","content":"hi","timestamp":"t"}"#;
        assert!(decode(text).is_err());
    }

    #[test]
    fn message_without_content_is_rejected() {
        let text = r#"{"type":"message","chat_id":"c","message_id":"m","sender_id":"u","timestamp":"t"}"#;
        match decode(text) {
            Err(EnvelopeError::MissingField { kind, field }) => {
                assert_eq!(kind, EnvelopeKind::Message);
                assert_eq!(field, "content");
            }
            other => panic!("expected MissingField, got {other:?}"),
        }
    }

    #[test]
    fn call_kind_without_data_is_rejected() {
        let text = r#"{"type":"call_candidate","chat_id":"c","sender_id":"u","timestamp":"t"}"#;
        assert!(matches!(
            decode(text),
            Err(EnvelopeError::MissingField { field: "data", .. })
        ));
    }

    #[test]
    fn signal_kind_follows_payload_type() {
        let offer = SignalPayload::new(json!({ "type": "offer", "sdp": "x" }));
        let answer = SignalPayload::new(json!({ "type": "answer", "sdp": "y" }));
        let candidate = SignalPayload::new(json!({ "candidate": { "candidate": "a=1" } }));
        assert_eq!(offer.envelope_kind(), EnvelopeKind::CallOffer);
        assert_eq!(answer.envelope_kind(), EnvelopeKind::CallAnswer);
        assert_eq!(candidate.envelope_kind(), EnvelopeKind::CallCandidate);
        assert!(matches!(
            EnvelopeBody::call_signal(answer),
            EnvelopeBody::CallAnswer(_)
        ));
    }

    #[test]
    fn stamp_fills_timestamp() {
        let out = OutboundEnvelope {
            conversation_id: "c".into(),
            sender_id: "u".into(),
            recipient_ids: vec![],
            body: EnvelopeBody::Typing { is_typing: false },
        };
        let env = out.stamp("2026-10-17T00:00:00.000Z");
        assert_eq!(env.timestamp, "2026-10-17T00:00:00.000Z");
        assert!(!env.kind().is_call_signal());
    }
}
