//! Sentinel configuration with TOML file support.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use sentinel_rpc::{DaemonConfig, RpcCredentials};
use sentinel_types::NetworkId;
use sentinel_utils::LogFormat;

use crate::AgentError;

/// Configuration for a sentinel installation.
///
/// Loaded from a TOML file via [`SentinelConfig::from_toml_file`] or built
/// programmatically (e.g. for tests). Every field has a default, so an empty
/// file is a valid configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SentinelConfig {
    /// Network to run against. Unset means: follow `testnet=1` in the
    /// daemon's configuration file.
    #[serde(default)]
    pub network: Option<NetworkId>,

    /// The daemon's own `key=value` configuration file, read for RPC
    /// credentials.
    #[serde(default = "default_daemon_conf")]
    pub daemon_conf: PathBuf,

    /// Directory for the local object and vote cache.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    #[serde(default)]
    pub rpc_host: Option<String>,
    #[serde(default)]
    pub rpc_port: Option<u16>,
    #[serde(default)]
    pub rpc_user: Option<String>,
    #[serde(default)]
    pub rpc_password: Option<String>,

    /// Log format: "human" or "json".
    #[serde(default)]
    pub log_format: LogFormat,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Target seconds between blocks; used for expiry grace and for
    /// estimating the time of future blocks.
    #[serde(default = "default_block_spacing")]
    pub block_spacing_secs: u64,

    /// How long a run lease stays valid if the holder dies without releasing.
    #[serde(default = "default_lease_ttl")]
    pub lease_ttl_secs: u64,

    /// Upper bound of the random gap between scheduled runs.
    #[serde(default = "default_schedule_max_interval")]
    pub schedule_max_interval_secs: u64,

    /// Upper bound of the random delay before a scheduled run starts.
    #[serde(default = "default_max_start_delay")]
    pub max_start_delay_secs: u64,

    /// Overrides the per-network maturity phase length, in blocks.
    #[serde(default)]
    pub maturity_phase_blocks: Option<u64>,

    /// Vote valid=yes/no on every tracked object.
    #[serde(default)]
    pub vote_validity: bool,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_daemon_conf() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .unwrap_or_default()
        .join(".dashcore")
        .join("dash.conf")
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./sentinel_data")
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_block_spacing() -> u64 {
    150
}

fn default_lease_ttl() -> u64 {
    90
}

fn default_schedule_max_interval() -> u64 {
    1200
}

fn default_max_start_delay() -> u64 {
    60
}

// ── Impl ───────────────────────────────────────────────────────────────

impl SentinelConfig {
    pub fn from_toml_file(path: &Path) -> Result<Self, AgentError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AgentError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(s: &str) -> Result<Self, AgentError> {
        toml::from_str(s).map_err(|e| AgentError::Config(e.to_string()))
    }

    pub fn to_toml_string(&self) -> Result<String, AgentError> {
        toml::to_string_pretty(self).map_err(|e| AgentError::Config(e.to_string()))
    }

    /// Resolve the network and RPC credentials, reading the daemon
    /// configuration file and applying the overrides from this config.
    pub fn resolve_daemon(&self) -> Result<(NetworkId, RpcCredentials), AgentError> {
        let daemon = match DaemonConfig::load(&self.daemon_conf) {
            Ok(conf) => conf,
            Err(e) if self.has_full_rpc_override() => {
                tracing::debug!(error = %e, "daemon conf unreadable, using configured RPC settings");
                DaemonConfig::default()
            }
            Err(e) => return Err(AgentError::Config(e.to_string())),
        };
        self.apply_overrides(&daemon)
    }

    fn has_full_rpc_override(&self) -> bool {
        self.rpc_user.is_some() && self.rpc_password.is_some()
    }

    pub(crate) fn apply_overrides(
        &self,
        daemon: &DaemonConfig,
    ) -> Result<(NetworkId, RpcCredentials), AgentError> {
        let network = self.network.unwrap_or_else(|| daemon.network());
        let mut creds = match daemon.rpc_credentials(network) {
            Ok(creds) => creds,
            Err(_) if self.has_full_rpc_override() => RpcCredentials {
                host: sentinel_rpc::config::DEFAULT_RPC_HOST.to_string(),
                port: network.default_rpc_port(),
                user: String::new(),
                password: String::new(),
            },
            Err(e) => return Err(AgentError::Config(e.to_string())),
        };
        if let Some(host) = &self.rpc_host {
            creds.host = host.clone();
        }
        if let Some(port) = self.rpc_port {
            creds.port = port;
        }
        if let Some(user) = &self.rpc_user {
            creds.user = user.clone();
        }
        if let Some(password) = &self.rpc_password {
            creds.password = password.clone();
        }
        Ok((network, creds))
    }

    pub fn maturity_phase_blocks_for(&self, network: NetworkId) -> u64 {
        self.maturity_phase_blocks
            .unwrap_or_else(|| network.maturity_phase_blocks())
    }
}

impl Default for SentinelConfig {
    fn default() -> Self {
        Self {
            network: None,
            daemon_conf: default_daemon_conf(),
            data_dir: default_data_dir(),
            rpc_host: None,
            rpc_port: None,
            rpc_user: None,
            rpc_password: None,
            log_format: LogFormat::default(),
            log_level: default_log_level(),
            block_spacing_secs: default_block_spacing(),
            lease_ttl_secs: default_lease_ttl(),
            schedule_max_interval_secs: default_schedule_max_interval(),
            max_start_delay_secs: default_max_start_delay(),
            maturity_phase_blocks: None,
            vote_validity: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_round_trips_through_toml() {
        let config = SentinelConfig {
            network: Some(NetworkId::Testnet),
            ..SentinelConfig::default()
        };
        let toml_str = config.to_toml_string().unwrap();
        let parsed = SentinelConfig::from_toml_str(&toml_str).expect("should parse");
        assert_eq!(parsed.network, Some(NetworkId::Testnet));
        assert_eq!(parsed.lease_ttl_secs, config.lease_ttl_secs);
    }

    #[test]
    fn minimal_toml_uses_defaults() {
        let config = SentinelConfig::from_toml_str("").expect("empty toml should use defaults");
        assert_eq!(config.network, None);
        assert_eq!(config.block_spacing_secs, 150);
        assert_eq!(config.lease_ttl_secs, 90);
        assert_eq!(config.schedule_max_interval_secs, 1200);
        assert_eq!(config.max_start_delay_secs, 60);
        assert_eq!(config.log_format, LogFormat::Human);
        assert!(!config.vote_validity);
    }

    #[test]
    fn partial_toml_overrides() {
        let toml = r#"
            network = "testnet"
            log_format = "json"
            maturity_phase_blocks = 10
            vote_validity = true
        "#;
        let config = SentinelConfig::from_toml_str(toml).expect("should parse");
        assert_eq!(config.network, Some(NetworkId::Testnet));
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.maturity_phase_blocks_for(NetworkId::Testnet), 10);
        assert!(config.vote_validity);
    }

    #[test]
    fn maturity_defaults_per_network() {
        let config = SentinelConfig::default();
        assert_eq!(config.maturity_phase_blocks_for(NetworkId::Mainnet), 1662);
        assert_eq!(config.maturity_phase_blocks_for(NetworkId::Testnet), 24);
    }

    #[test]
    fn missing_file_returns_config_error() {
        let result = SentinelConfig::from_toml_file(Path::new("/nonexistent/sentinel.toml"));
        assert!(matches!(result, Err(AgentError::Config(_))));
    }

    #[test]
    fn overrides_apply_on_top_of_daemon_conf() {
        let daemon = DaemonConfig::parse("testnet=1\nrpcuser=u\nrpcpassword=p\n");
        let config = SentinelConfig {
            rpc_port: Some(1234),
            rpc_host: Some("10.1.1.1".into()),
            ..SentinelConfig::default()
        };
        let (network, creds) = config.apply_overrides(&daemon).unwrap();
        assert_eq!(network, NetworkId::Testnet);
        assert_eq!(creds.port, 1234);
        assert_eq!(creds.host, "10.1.1.1");
        assert_eq!(creds.user, "u");
    }

    #[test]
    fn explicit_network_wins_over_daemon_conf() {
        let daemon = DaemonConfig::parse("testnet=1\nrpcuser=u\nrpcpassword=p\n");
        let config = SentinelConfig {
            network: Some(NetworkId::Mainnet),
            ..SentinelConfig::default()
        };
        let (network, creds) = config.apply_overrides(&daemon).unwrap();
        assert_eq!(network, NetworkId::Mainnet);
        assert_eq!(creds.port, 9998);
    }

    #[test]
    fn full_override_needs_no_daemon_credentials() {
        let config = SentinelConfig {
            rpc_user: Some("u".into()),
            rpc_password: Some("p".into()),
            ..SentinelConfig::default()
        };
        let (_, creds) = config.apply_overrides(&DaemonConfig::default()).unwrap();
        assert_eq!(creds.user, "u");
        assert_eq!(creds.port, 9998);
    }
}
