//! Config sections mapped onto the realtime crate's runtime types.

use mebel_config::{CallConfig, ChatConfig, RealtimeConfig};
use mebel_realtime::{CallOptions, ChannelConfig, RoomConfig};

pub fn channel_config(realtime: &RealtimeConfig) -> ChannelConfig {
    ChannelConfig {
        url: realtime.url.clone(),
        access_token: realtime.access_token.clone(),
        reconnect_delay: realtime.reconnect_delay(),
        connect_timeout: realtime.connect_timeout(),
    }
}

pub fn call_options(call: &CallConfig) -> CallOptions {
    CallOptions {
        video: call.video,
        audio: call.audio,
        trickle: call.trickle,
        ice_servers: call.ice_servers.clone(),
    }
}

pub fn room_config(chat: &ChatConfig) -> RoomConfig {
    RoomConfig {
        max_messages: chat.max_messages,
    }
}
