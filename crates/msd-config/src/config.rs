//! Main configuration structure.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use msd_types::{GroupId, HostRecord, InvalidGroupIdError};

use crate::defaults::{MULTICAST_INTERFACE_ENV, get_defaults};

/// Identity an instance announces about itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostConfig {
    /// Peer identifier, exactly 8 characters.
    #[serde(rename = "Id")]
    pub id: String,
    /// Endpoint URL of this instance.
    #[serde(rename = "Url")]
    pub url: String,
}

fn default_port() -> u16 {
    get_defaults().default_port
}

fn default_multicast_hops() -> u32 {
    get_defaults().default_multicast_hops
}

fn default_discover_interval() -> u64 {
    get_defaults().default_discover_interval.as_secs()
}

fn default_cleanup_interval() -> u64 {
    get_defaults().default_cleanup_interval.as_secs()
}

fn default_peer_ttl() -> u64 {
    get_defaults().default_peer_ttl.as_secs()
}

/// Main node configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Multicast group id in hex format (14 bytes).
    #[serde(rename = "MulticastGroupID")]
    pub multicast_group_id: String,

    /// Name of the interface that joins the group.
    #[serde(
        rename = "MulticastInterface",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub multicast_interface: Option<String>,

    /// UDP port used for all discovery traffic.
    #[serde(rename = "Port", default = "default_port")]
    pub port: u16,

    /// Multicast hop limit.
    #[serde(rename = "MulticastHops", default = "default_multicast_hops")]
    pub multicast_hops: u32,

    /// Seconds between DISCOVER broadcasts.
    #[serde(rename = "DiscoverInterval", default = "default_discover_interval")]
    pub discover_interval: u64,

    /// Seconds between peer table sweeps.
    #[serde(rename = "CleanupInterval", default = "default_cleanup_interval")]
    pub cleanup_interval: u64,

    /// Seconds a peer stays listed without being heard from.
    #[serde(rename = "PeerTTL", default = "default_peer_ttl")]
    pub peer_ttl: u64,

    /// Identity to announce when running as an instance.
    #[serde(rename = "Host", default, skip_serializing_if = "Option::is_none")]
    pub host: Option<HostConfig>,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self::generate()
    }
}

impl NodeConfig {
    /// Generate a new configuration with default values.
    pub fn generate() -> Self {
        let defaults = get_defaults();

        Self {
            multicast_group_id: defaults.default_group_id,
            multicast_interface: None,
            port: defaults.default_port,
            multicast_hops: defaults.default_multicast_hops,
            discover_interval: defaults.default_discover_interval.as_secs(),
            cleanup_interval: defaults.default_cleanup_interval.as_secs(),
            peer_ttl: defaults.default_peer_ttl.as_secs(),
            host: None,
        }
    }

    /// Parse configuration from HJSON bytes.
    pub fn from_hjson(data: &[u8]) -> Result<Self, ConfigError> {
        let data = Self::strip_bom(data);

        let text = std::str::from_utf8(data).map_err(|e| ConfigError::Parse(e.to_string()))?;
        let mut config: Self =
            serde_hjson::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;

        config.postprocess()?;

        Ok(config)
    }

    /// Parse configuration from JSON bytes.
    pub fn from_json(data: &[u8]) -> Result<Self, ConfigError> {
        let mut config: Self = serde_json::from_slice(Self::strip_bom(data))
            .map_err(|e| ConfigError::Parse(e.to_string()))?;

        config.postprocess()?;

        Ok(config)
    }

    /// Serialize configuration to HJSON with explanatory comments.
    pub fn to_hjson_with_comments(&self) -> String {
        let mut output = String::new();
        output.push_str("{\n");

        output.push_str("  # 14-byte multicast group id in hex. Nodes sharing a group id\n");
        output.push_str("  # discover each other on ff02::<group id>.\n");
        output.push_str(&format!("  MulticastGroupID: \"{}\"\n", self.multicast_group_id));

        output.push_str("\n  # Interface that joins the multicast group. When unset, the\n");
        output.push_str(&format!(
            "  # {} environment variable is used, then the OS default.\n",
            MULTICAST_INTERFACE_ENV
        ));
        match &self.multicast_interface {
            Some(name) => output.push_str(&format!("  MulticastInterface: \"{}\"\n", name)),
            None => output.push_str("  # MulticastInterface: eth0\n"),
        }

        output.push_str("\n  # UDP port for all discovery traffic. Every node on the group\n");
        output.push_str("  # must use the same port.\n");
        output.push_str(&format!("  Port: {}\n", self.port));

        output.push_str("\n  # Hop limit for outgoing multicast datagrams.\n");
        output.push_str(&format!("  MulticastHops: {}\n", self.multicast_hops));

        output.push_str("\n  # Discoverer timers, in seconds: how often to broadcast DISCOVER,\n");
        output.push_str("  # how often to sweep the peer table, and how long a silent peer\n");
        output.push_str("  # stays listed.\n");
        output.push_str(&format!("  DiscoverInterval: {}\n", self.discover_interval));
        output.push_str(&format!("  CleanupInterval: {}\n", self.cleanup_interval));
        output.push_str(&format!("  PeerTTL: {}\n", self.peer_ttl));

        output.push_str("\n  # Identity announced when running as an instance. Id must be\n");
        output.push_str("  # exactly 8 characters and Url an absolute URL.\n");
        match &self.host {
            Some(host) => {
                output.push_str("  Host:\n");
                output.push_str("  {\n");
                output.push_str(&format!("    Id: \"{}\"\n", host.id));
                output.push_str(&format!("    Url: \"{}\"\n", host.url));
                output.push_str("  }\n");
            }
            None => output.push_str("  # Host: { Id: \"abcd1234\", Url: \"http://localhost:8080\" }\n"),
        }

        output.push_str("}\n");
        output
    }

    /// Serialize configuration to JSON.
    pub fn to_json(&self) -> Result<String, ConfigError> {
        serde_json::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))
    }

    /// Strip byte order mark if present.
    fn strip_bom(data: &[u8]) -> &[u8] {
        data.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(data)
    }

    /// Post-process the configuration after parsing.
    fn postprocess(&mut self) -> Result<(), ConfigError> {
        self.apply_interface_env(std::env::var(MULTICAST_INTERFACE_ENV).ok());
        self.validate()
    }

    /// Fill the interface from the environment unless the config names one.
    pub fn apply_interface_env(&mut self, env_value: Option<String>) {
        if self.multicast_interface.is_none() {
            if let Some(name) = env_value.filter(|n| !n.trim().is_empty()) {
                tracing::debug!(interface = %name, "Using multicast interface from environment");
                self.multicast_interface = Some(name);
            }
        }
    }

    /// Check values that cannot be expressed in the type system.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.group_id()?;
        if self.port == 0 {
            return Err(ConfigError::Invalid("Port must not be 0".to_string()));
        }
        for (name, secs) in [
            ("DiscoverInterval", self.discover_interval),
            ("CleanupInterval", self.cleanup_interval),
            ("PeerTTL", self.peer_ttl),
        ] {
            if secs == 0 {
                return Err(ConfigError::Invalid(format!("{name} must be positive")));
            }
        }
        Ok(())
    }

    /// Get the multicast group id.
    pub fn group_id(&self) -> Result<GroupId, ConfigError> {
        Ok(GroupId::from_hex(&self.multicast_group_id)?)
    }

    /// Get the host record to announce, if configured.
    ///
    /// Business rules are checked when the instance is constructed.
    pub fn host_record(&self) -> Option<HostRecord> {
        self.host
            .as_ref()
            .map(|h| HostRecord::new(h.id.clone(), h.url.clone()))
    }

    /// Period between DISCOVER broadcasts.
    pub fn discover_interval(&self) -> Duration {
        Duration::from_secs(self.discover_interval)
    }

    /// Period between peer table sweeps.
    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.cleanup_interval)
    }

    /// Time a silent peer stays listed.
    pub fn peer_ttl(&self) -> Duration {
        Duration::from_secs(self.peer_ttl)
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to parse configuration: {0}")]
    Parse(String),
    #[error("failed to serialize configuration: {0}")]
    Serialize(String),
    #[error(transparent)]
    GroupId(#[from] InvalidGroupIdError),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_defaults() {
        let config = NodeConfig::generate();
        assert_eq!(config.port, 53566);
        assert_eq!(config.multicast_hops, 128);
        assert_eq!(config.discover_interval(), Duration::from_secs(60));
        assert_eq!(config.cleanup_interval(), Duration::from_secs(120));
        assert_eq!(config.peer_ttl(), Duration::from_secs(120));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_hjson() {
        let data = br#"{
            # comments are allowed
            MulticastGroupID: "55c545258c440a731a50810425bc"
            MulticastInterface: eth0
            Host:
            {
                Id: abcd1234
                Url: "http://h:8080"
            }
        }"#;
        let config = NodeConfig::from_hjson(data).unwrap();
        assert_eq!(config.multicast_interface.as_deref(), Some("eth0"));
        assert_eq!(config.port, 53566);
        assert_eq!(
            config.group_id().unwrap().to_hex(),
            "55c545258c440a731a50810425bc"
        );
        assert_eq!(
            config.host_record(),
            Some(HostRecord::new("abcd1234", "http://h:8080"))
        );
    }

    #[test]
    fn test_parse_json_with_bom() {
        let mut data = b"\xEF\xBB\xBF".to_vec();
        data.extend_from_slice(
            br#"{"MulticastGroupID":"55c545258c440a731a50810425bc","MulticastInterface":"eth1","Port":9000}"#,
        );
        let config = NodeConfig::from_json(&data).unwrap();
        assert_eq!(config.port, 9000);
        assert!(config.host.is_none());
    }

    #[test]
    fn test_invalid_group_rejected() {
        let data = br#"{"MulticastGroupID":"55c5","MulticastInterface":"eth0"}"#;
        let err = NodeConfig::from_json(data).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::GroupId(InvalidGroupIdError::InvalidLength { actual: 2, .. })
        ));
    }

    #[test]
    fn test_zero_interval_rejected() {
        let mut config = NodeConfig::generate();
        config.cleanup_interval = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_interface_env_fallback() {
        let mut config = NodeConfig::generate();
        config.apply_interface_env(Some("wlan0".to_string()));
        assert_eq!(config.multicast_interface.as_deref(), Some("wlan0"));

        // Config value wins over the environment
        config.apply_interface_env(Some("eth9".to_string()));
        assert_eq!(config.multicast_interface.as_deref(), Some("wlan0"));

        let mut config = NodeConfig::generate();
        config.apply_interface_env(Some("  ".to_string()));
        assert!(config.multicast_interface.is_none());
    }

    #[test]
    fn test_commented_output_parses() {
        let mut config = NodeConfig::generate();
        config.host = Some(HostConfig {
            id: "abcd1234".to_string(),
            url: "http://localhost:8080".to_string(),
        });
        let text = config.to_hjson_with_comments();
        let parsed = NodeConfig::from_hjson(text.as_bytes()).unwrap();
        assert_eq!(parsed.multicast_group_id, config.multicast_group_id);
        assert_eq!(parsed.host, config.host);
        assert_eq!(parsed.peer_ttl, config.peer_ttl);
    }

    #[test]
    fn test_json_roundtrip() {
        let config = NodeConfig::generate();
        let json = config.to_json().unwrap();
        let parsed = NodeConfig::from_json(json.as_bytes()).unwrap();
        assert_eq!(parsed.port, config.port);
        assert_eq!(parsed.multicast_group_id, config.multicast_group_id);
    }
}
