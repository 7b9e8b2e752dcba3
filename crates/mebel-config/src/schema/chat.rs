//! Chat room configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Messages kept per room (valid range: 1-10000).
    pub max_messages: usize,
    /// Quiet period before the typing indicator is cleared.
    pub typing_timeout_ms: u64,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            max_messages: 500,
            typing_timeout_ms: 2000,
        }
    }
}

impl ChatConfig {
    pub fn typing_timeout(&self) -> Duration {
        Duration::from_millis(self.typing_timeout_ms)
    }
}
