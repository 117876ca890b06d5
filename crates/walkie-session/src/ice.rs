//! ICE server configuration handed to every new peer transport.

use serde::{Deserialize, Serialize};

const DEFAULT_STUN: &[&str] = &["stun:relay.metered.ca:80"];
const DEFAULT_TURN: &[&str] = &[
    "turn:relay.metered.ca:80",
    "turn:relay.metered.ca:443",
    "turn:relay.metered.ca:443?transport=tcp",
];

/// Relay (TURN) credentials issued by the signaling channel in `init`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayCredentials {
    pub id: String,
    pub secret: String,
}

impl RelayCredentials {
    /// Build credentials from the optional `init` fields.
    ///
    /// An absent or empty id means the room offers no relay.
    pub fn from_init(turn_id: Option<&str>, turn_pwd: Option<&str>) -> Option<Self> {
        let id = turn_id.filter(|id| !id.is_empty())?;
        Some(Self {
            id: id.to_string(),
            secret: turn_pwd.unwrap_or_default().to_string(),
        })
    }
}

/// Fixed traversal server URLs, split by kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IceServerUrls {
    pub stun: Vec<String>,
    pub turn: Vec<String>,
}

impl Default for IceServerUrls {
    fn default() -> Self {
        Self {
            stun: DEFAULT_STUN.iter().map(|s| s.to_string()).collect(),
            turn: DEFAULT_TURN.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl From<&walkie_config::schema::IceServersConfig> for IceServerUrls {
    fn from(config: &walkie_config::schema::IceServersConfig) -> Self {
        Self {
            stun: config.stun_urls.clone(),
            turn: config.turn_urls.clone(),
        }
    }
}

/// One entry of the transport's server list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IceServer {
    pub urls: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credential: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IceConfig {
    pub ice_servers: Vec<IceServer>,
}

/// Build the transport configuration for the given credentials.
///
/// Returns `None` when no credentials are known, in which case transports
/// are created with no server configuration at all.
pub fn build_ice_config(
    credentials: Option<&RelayCredentials>,
    servers: &IceServerUrls,
) -> Option<IceConfig> {
    let creds = credentials.filter(|c| !c.id.is_empty())?;

    let stun = servers.stun.iter().map(|url| IceServer {
        urls: url.clone(),
        username: None,
        credential: None,
    });
    let turn = servers.turn.iter().map(|url| IceServer {
        urls: url.clone(),
        username: Some(creds.id.clone()),
        credential: Some(creds.secret.clone()),
    });

    Some(IceConfig {
        ice_servers: stun.chain(turn).collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn creds() -> RelayCredentials {
        RelayCredentials {
            id: "u".into(),
            secret: "p".into(),
        }
    }

    #[test]
    fn no_credentials_means_no_config() {
        assert_eq!(build_ice_config(None, &IceServerUrls::default()), None);
    }

    #[test]
    fn empty_id_means_no_config() {
        let empty = RelayCredentials {
            id: String::new(),
            secret: "p".into(),
        };
        assert_eq!(build_ice_config(Some(&empty), &IceServerUrls::default()), None);
    }

    #[test]
    fn turn_entries_carry_credentials() {
        let config = build_ice_config(Some(&creds()), &IceServerUrls::default()).unwrap();
        assert_eq!(config.ice_servers.len(), 4);

        let stun = &config.ice_servers[0];
        assert_eq!(stun.urls, "stun:relay.metered.ca:80");
        assert_eq!(stun.username, None);
        assert_eq!(stun.credential, None);

        for turn in &config.ice_servers[1..] {
            assert!(turn.urls.starts_with("turn:"));
            assert_eq!(turn.username.as_deref(), Some("u"));
            assert_eq!(turn.credential.as_deref(), Some("p"));
        }
    }

    #[test]
    fn serializes_like_a_browser_rtc_configuration() {
        let urls = IceServerUrls {
            stun: vec!["stun:a:3478".into()],
            turn: vec![],
        };
        let config = build_ice_config(Some(&creds()), &urls).unwrap();
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(json, r#"{"iceServers":[{"urls":"stun:a:3478"}]}"#);
    }

    #[test]
    fn credentials_from_init() {
        assert_eq!(RelayCredentials::from_init(None, Some("p")), None);
        assert_eq!(RelayCredentials::from_init(Some(""), Some("p")), None);
        assert_eq!(RelayCredentials::from_init(Some("u"), Some("p")), Some(creds()));

        let no_pwd = RelayCredentials::from_init(Some("u"), None).unwrap();
        assert_eq!(no_pwd.secret, "");
    }

    #[test]
    fn urls_follow_config() {
        let mut config = walkie_config::schema::IceServersConfig::default();
        config.turn_urls = vec!["turns:t.example.org:5349".into()];
        let urls = IceServerUrls::from(&config);
        assert_eq!(urls.stun, IceServerUrls::default().stun);
        assert_eq!(urls.turn, vec!["turns:t.example.org:5349"]);
    }
}
