use super::*;
use crate::schema::MebelConfig;

fn message(result: Result<(), ConfigError>) -> String {
    match result {
        Err(ConfigError::ValidationError(msg)) => msg,
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[test]
fn default_config_is_valid() {
    assert!(validate(&MebelConfig::default()).is_ok());
}

#[test]
fn realtime_url_must_be_websocket() {
    let mut config = MebelConfig::default();
    config.realtime.url = "https://mebelplace.com.kz/api".into();
    assert!(message(validate(&config)).contains("realtime.url"));

    config.realtime.url = "wss://mebelplace.com.kz/api/v2/ws".into();
    assert!(validate(&config).is_ok());
}

#[test]
fn reconnect_delay_out_of_range() {
    let mut config = MebelConfig::default();
    config.realtime.reconnect_delay_ms = 0;
    assert!(message(validate(&config)).contains("realtime.reconnect_delay_ms = 0"));
}

#[test]
fn connect_timeout_out_of_range() {
    let mut config = MebelConfig::default();
    config.realtime.connect_timeout_secs = 301;
    assert!(message(validate(&config)).contains("realtime.connect_timeout_secs"));
}

#[test]
fn empty_access_token_rejected() {
    let mut config = MebelConfig::default();
    config.realtime.access_token = Some(String::new());
    assert!(message(validate(&config)).contains("access_token"));
}

#[test]
fn call_needs_some_media() {
    let mut config = MebelConfig::default();
    config.call.video = false;
    assert!(validate(&config).is_ok());
    config.call.audio = false;
    assert!(message(validate(&config)).contains("video or audio"));
}

#[test]
fn ice_server_schemes() {
    let mut config = MebelConfig::default();
    config.call.ice_servers = vec![
        "turn:turn.example.test:3478".into(),
        "http://stun.example.test".into(),
    ];
    let msg = message(validate(&config));
    assert!(msg.contains("call.ice_servers[1]"));
    assert!(!msg.contains("call.ice_servers[0]"));
}

#[test]
fn chat_limits() {
    let mut config = MebelConfig::default();
    config.chat.max_messages = 0;
    config.chat.typing_timeout_ms = 50;
    let msg = message(validate(&config));
    assert!(msg.contains("chat.max_messages"));
    assert!(msg.contains("chat.typing_timeout_ms"));
}

#[test]
fn collects_all_errors() {
    let mut config = MebelConfig::default();
    config.realtime.url = "localhost".into();
    config.chat.max_messages = 20_000;
    let msg = message(validate(&config));
    assert_eq!(msg.matches("; ").count(), 1);
}
