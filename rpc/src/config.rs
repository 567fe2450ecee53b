//! Reading RPC credentials from the daemon's `key=value` configuration file.

use std::collections::HashMap;
use std::path::Path;

use sentinel_types::NetworkId;

use crate::RpcError;

pub const DEFAULT_RPC_HOST: &str = "127.0.0.1";

/// Where and how to reach the daemon's JSON-RPC endpoint.
#[derive(Clone, PartialEq, Eq)]
pub struct RpcCredentials {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
}

impl RpcCredentials {
    pub fn url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}

impl std::fmt::Debug for RpcCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpcCredentials")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Parsed daemon configuration.
#[derive(Debug, Clone, Default)]
pub struct DaemonConfig {
    entries: HashMap<String, String>,
}

impl DaemonConfig {
    /// Read the file at `path` with comment lines removed.
    pub fn slurp(path: &Path) -> Result<String, RpcError> {
        let text = std::fs::read_to_string(path)?;
        Ok(strip_comment_lines(&text))
    }

    pub fn load(path: &Path) -> Result<Self, RpcError> {
        Ok(Self::parse(&Self::slurp(path)?))
    }

    /// Later assignments win. Trailing `# comments` on a value are dropped.
    pub fn parse(text: &str) -> Self {
        let entries = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .filter_map(|line| line.split_once('='))
            .map(|(key, value)| {
                let value = value.split_once('#').map_or(value, |(v, _)| v);
                (key.trim().to_string(), value.trim().to_string())
            })
            .collect();
        Self { entries }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn network(&self) -> NetworkId {
        match self.get("testnet") {
            Some("1") => NetworkId::Testnet,
            _ => NetworkId::Mainnet,
        }
    }

    /// Credentials for `network`, defaulting the port per network and the
    /// host to localhost.
    pub fn rpc_credentials(&self, network: NetworkId) -> Result<RpcCredentials, RpcError> {
        let user = self
            .get("rpcuser")
            .ok_or_else(|| RpcError::Config("rpcuser is not set".into()))?;
        let password = self
            .get("rpcpassword")
            .ok_or_else(|| RpcError::Config("rpcpassword is not set".into()))?;
        let port = match self.get("rpcport") {
            Some(p) => p
                .parse()
                .map_err(|_| RpcError::Config(format!("invalid rpcport {p}")))?,
            None => network.default_rpc_port(),
        };
        let host = self
            .get("rpcconnect")
            .or_else(|| self.get("rpcbind"))
            .unwrap_or(DEFAULT_RPC_HOST);

        Ok(RpcCredentials {
            host: host.to_string(),
            port,
            user: user.to_string(),
            password: password.to_string(),
        })
    }
}

fn strip_comment_lines(text: &str) -> String {
    text.lines()
        .filter(|line| !line.trim_start().starts_with('#'))
        .map(|line| format!("{line}\n"))
        .collect()
}
