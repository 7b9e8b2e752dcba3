//! Signaling endpoint configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Connection to the chat/signaling WebSocket.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RealtimeConfig {
    /// WebSocket endpoint (`ws://` or `wss://`).
    pub url: String,
    /// Bearer token appended as the `token` query parameter. Read from
    /// the config file but never written back out.
    #[serde(skip_serializing)]
    pub access_token: Option<String>,
    /// Fixed delay before reconnecting after an unexpected close.
    pub reconnect_delay_ms: u64,
    /// WebSocket handshake timeout.
    pub connect_timeout_secs: u64,
}

impl std::fmt::Debug for RealtimeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RealtimeConfig")
            .field("url", &self.url)
            .field(
                "access_token",
                &self.access_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("reconnect_delay_ms", &self.reconnect_delay_ms)
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .finish()
    }
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            url: "ws://localhost:8080/v2/ws".into(),
            access_token: None,
            reconnect_delay_ms: 3000,
            connect_timeout_secs: 15,
        }
    }
}

impl RealtimeConfig {
    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}
