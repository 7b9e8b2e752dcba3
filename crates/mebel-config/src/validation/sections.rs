//! Per-section validation: realtime, call and chat.

use crate::schema::MebelConfig;

use super::helpers::{validate_range, validate_scheme};

pub(crate) fn validate_realtime(errors: &mut Vec<String>, config: &MebelConfig) {
    let realtime = &config.realtime;
    validate_scheme(errors, "realtime.url", &realtime.url, &["ws://", "wss://"]);
    validate_range(
        errors,
        "realtime.reconnect_delay_ms",
        realtime.reconnect_delay_ms,
        100,
        600_000,
    );
    validate_range(
        errors,
        "realtime.connect_timeout_secs",
        realtime.connect_timeout_secs,
        1,
        300,
    );
    if realtime.access_token.as_deref() == Some("") {
        errors.push("realtime.access_token must not be empty when set".into());
    }
}

pub(crate) fn validate_call(errors: &mut Vec<String>, config: &MebelConfig) {
    let call = &config.call;
    if !call.video && !call.audio {
        errors.push("call needs at least one of video or audio".into());
    }
    for (i, server) in call.ice_servers.iter().enumerate() {
        validate_scheme(
            errors,
            &format!("call.ice_servers[{i}]"),
            server,
            &["stun:", "stuns:", "turn:", "turns:"],
        );
    }
}

pub(crate) fn validate_chat(errors: &mut Vec<String>, config: &MebelConfig) {
    validate_range(
        errors,
        "chat.max_messages",
        config.chat.max_messages as u64,
        1,
        10_000,
    );
    validate_range(
        errors,
        "chat.typing_timeout_ms",
        config.chat.typing_timeout_ms,
        100,
        60_000,
    );
}
