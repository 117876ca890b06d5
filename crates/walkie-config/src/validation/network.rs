//! Signaling, ICE and relay validation.

use super::helpers::{validate_ice_urls, validate_range};
use crate::schema::WalkieConfig;

pub(super) fn validate_signaling(errors: &mut Vec<String>, config: &WalkieConfig) {
    let url = config.signaling.url.trim();
    if url.is_empty() {
        errors.push("signaling.url is empty".into());
    } else if !(url.starts_with("ws://") || url.starts_with("wss://")) {
        errors.push(format!(
            "signaling.url = {url:?} must start with ws:// or wss://"
        ));
    }
    validate_range(
        errors,
        "signaling.connect_timeout_secs",
        config.signaling.connect_timeout_secs,
        1,
        120,
    );
}

pub(super) fn validate_ice(errors: &mut Vec<String>, config: &WalkieConfig) {
    validate_ice_urls(errors, "ice.stun_urls", &config.ice.stun_urls, &["stun", "stuns"]);
    validate_ice_urls(errors, "ice.turn_urls", &config.ice.turn_urls, &["turn", "turns"]);
}

pub(super) fn validate_relay(errors: &mut Vec<String>, config: &WalkieConfig) {
    let relay = &config.relay;
    if relay.port == 0 {
        errors.push("relay.port must not be 0".into());
    }
    if relay.turn_id.is_empty() != relay.turn_pwd.is_empty() {
        errors.push("relay.turn_id and relay.turn_pwd must be set together".into());
    }
    validate_range(
        errors,
        "relay.hello_timeout_secs",
        relay.hello_timeout_secs,
        1,
        300,
    );
}
