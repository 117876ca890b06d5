use std::time::Duration;

use walkie_config::WalkieConfig;

use crate::ice::IceServerUrls;

/// Runtime settings for one coordinator.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub signaling_url: String,
    pub connect_timeout: Duration,
    pub ice_urls: IceServerUrls,
    /// Send `join` as soon as the channel is up.
    pub auto_join: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::from(&WalkieConfig::default())
    }
}

impl From<&WalkieConfig> for SessionConfig {
    fn from(config: &WalkieConfig) -> Self {
        Self {
            signaling_url: config.signaling.url.clone(),
            connect_timeout: Duration::from_secs(u64::from(config.signaling.connect_timeout_secs)),
            ice_urls: IceServerUrls::from(&config.ice),
            auto_join: config.session.auto_join,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_follow_config_defaults() {
        let config = SessionConfig::default();
        assert_eq!(config.signaling_url, "ws://127.0.0.1:8080");
        assert_eq!(config.connect_timeout, Duration::from_secs(15));
        assert_eq!(config.ice_urls, IceServerUrls::default());
        assert!(!config.auto_join);
    }

    #[test]
    fn overrides_carry_through() {
        let mut file = WalkieConfig::default();
        file.signaling.url = "wss://example.org/ws".into();
        file.signaling.connect_timeout_secs = 3;
        file.session.auto_join = true;
        file.ice.stun_urls.clear();

        let config = SessionConfig::from(&file);
        assert_eq!(config.signaling_url, "wss://example.org/ws");
        assert_eq!(config.connect_timeout, Duration::from_secs(3));
        assert!(config.auto_join);
        assert!(config.ice_urls.stun.is_empty());
    }
}
