//! Configuration and lifecycle state for the signaling channel.

use std::time::Duration;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Default delay before a reconnect attempt after an unexpected close.
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_millis(3000);

/// Default upper bound on the WebSocket handshake.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(15);

/// Configuration for a signaling channel.
#[derive(Clone)]
pub struct ChannelConfig {
    /// WebSocket endpoint, e.g. `wss://mebelplace.com.kz/api/v2/ws`.
    pub url: String,
    /// Optional bearer token, sent as the `token` query parameter.
    pub access_token: Option<String>,
    /// Fixed delay between an unexpected close and the next attempt.
    pub reconnect_delay: Duration,
    pub connect_timeout: Duration,
}

impl std::fmt::Debug for ChannelConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChannelConfig")
            .field("url", &self.url)
            .field(
                "access_token",
                &self.access_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("reconnect_delay", &self.reconnect_delay)
            .field("connect_timeout", &self.connect_timeout)
            .finish()
    }
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            access_token: None,
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }
}

impl ChannelConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    /// URL actually dialed, with the access token appended when present.
    pub(crate) fn ws_url(&self) -> String {
        match &self.access_token {
            Some(token) => {
                let sep = if self.url.contains('?') { '&' } else { '?' };
                format!("{}{sep}token={token}", self.url)
            }
            None => self.url.clone(),
        }
    }

    /// URL safe to put in logs.
    pub(crate) fn log_url(&self) -> &str {
        self.url.split('?').next().unwrap_or("")
    }
}

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

/// Connection lifecycle as observed by the owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    Disconnected,
    Connecting,
    Connected,
}
