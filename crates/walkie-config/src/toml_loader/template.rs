//! Default TOML config template with inline documentation comments.

/// Generate the default TOML config content with comments.
pub(crate) fn default_config_toml() -> String {
    r##"# Walkie Configuration
# Schema version 1
# Only override what you want to change -- missing fields use defaults.

[signaling]
# url = "ws://127.0.0.1:8080"
# connect_timeout_secs = 15      # 1-120

[ice]
# stun_urls = ["stun:relay.metered.ca:80"]
# turn_urls = [
#   "turn:relay.metered.ca:80",
#   "turn:relay.metered.ca:443",
#   "turn:relay.metered.ca:443?transport=tcp",
# ]

[session]
# auto_join = false

[relay]
# port = 8080
# turn_id = ""                   # empty: clients use direct transport only
# turn_pwd = ""
# hello_timeout_secs = 10        # 1-300

[logging]
# level = "info"                 # trace | debug | info | warn | error
"##
    .to_string()
}
