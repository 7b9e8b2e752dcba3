//! Default TOML config template with inline documentation comments.

/// Generate the default TOML config content with comments.
pub(crate) fn default_config_toml() -> &'static str {
    r##"# Mebel realtime client configuration
# Schema version 1
# Only override what you want to change -- missing fields use defaults.

[realtime]
url = "ws://localhost:8080/v2/ws"
# access_token = ""          # sent as ?token=...
# reconnect_delay_ms = 3000  # fixed delay, retried forever
# connect_timeout_secs = 15  # 1-300

[call]
# video = true
# audio = true
# trickle = true
# ice_servers = [
#   "stun:stun.l.google.com:19302",
#   "stun:stun1.l.google.com:19302",
# ]

[chat]
# max_messages = 500         # 1-10000
# typing_timeout_ms = 2000   # 100-60000

[logging]
# level = "info"             # trace, debug, info, warn, error
"##
}
