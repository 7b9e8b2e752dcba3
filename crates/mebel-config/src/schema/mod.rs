//! Configuration schema types.
//!
//! All structs use `serde(default)` so partial configs work correctly.

mod call;
mod chat;
mod realtime;
mod system;

pub use call::*;
pub use chat::*;
pub use realtime::*;
pub use system::*;

use serde::{Deserialize, Serialize};

/// Current config schema version.
pub const CONFIG_SCHEMA_VERSION: u32 = 1;

/// Root configuration.
///
/// Only override what you want to change.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MebelConfig {
    pub realtime: RealtimeConfig,
    pub call: CallConfig,
    pub chat: ChatConfig,
    pub logging: LoggingConfig,
}

// =============================================================================
// Tests
// =============================================================================
