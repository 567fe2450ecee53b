//! The daemon façade and its HTTP implementation.

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::{debug, trace, warn};

use sentinel_governance::{MasternodeEntry, ObjectEnvelope};
use sentinel_types::{Amount, ObjectHash, Outpoint, Timestamp, VoteOutcome, VoteSignal};

use crate::config::RpcCredentials;
use crate::responses::{
    parse_amount, parse_current_votes, parse_masternode_list, parse_vote_result, BlockHeader,
    GovernanceInfo, MasternodeCount, MasternodeStatus, NetworkVote, NodeInfo, SyncStatus,
    VoteResult,
};
use crate::RpcError;

/// Everything the sentinel asks of the daemon.
///
/// Calls are awaited one at a time; implementations need not be `Sync`.
#[allow(async_fn_in_trait)]
pub trait DaemonRpc {
    async fn governance_info(&self) -> Result<GovernanceInfo, RpcError>;

    async fn node_info(&self) -> Result<NodeInfo, RpcError>;

    async fn is_synced(&self) -> Result<bool, RpcError>;

    async fn masternode_status(&self) -> Result<MasternodeStatus, RpcError>;

    async fn enabled_masternode_count(&self) -> Result<u64, RpcError>;

    async fn masternode_list(&self) -> Result<Vec<MasternodeEntry>, RpcError>;

    /// Every governance object the daemon currently tracks.
    async fn governance_objects(&self) -> Result<Vec<ObjectEnvelope>, RpcError>;

    async fn vote(
        &self,
        object_hash: &ObjectHash,
        signal: VoteSignal,
        outcome: VoteOutcome,
    ) -> Result<VoteResult, RpcError>;

    /// The votes the network holds from `agent` on one object.
    async fn current_votes(
        &self,
        object_hash: &ObjectHash,
        agent: &Outpoint,
    ) -> Result<Vec<NetworkVote>, RpcError>;

    /// Publish a superblock trigger; returns the new object's hash.
    async fn submit_superblock(
        &self,
        now: Timestamp,
        data_hex: &str,
    ) -> Result<ObjectHash, RpcError>;

    async fn superblock_budget(&self, height: u64) -> Result<Amount, RpcError>;

    async fn block_count(&self) -> Result<u64, RpcError>;

    async fn block_hash(&self, height: u64) -> Result<ObjectHash, RpcError>;

    async fn block_time(&self, height: u64) -> Result<Timestamp, RpcError>;

    async fn sentinel_ping(&self, version: &str) -> Result<(), RpcError>;

    /// Actual time of a past block, or an estimate for a future one.
    async fn block_height_to_epoch(
        &self,
        height: u64,
        now: Timestamp,
        block_spacing_secs: u64,
    ) -> Result<Timestamp, RpcError> {
        let current = self.block_count().await?;
        if height <= current {
            return self.block_time(height).await;
        }
        Ok(now.saturating_add((height - current).saturating_mul(block_spacing_secs)))
    }

    async fn next_superblock_max_budget(&self) -> Result<Amount, RpcError> {
        let info = self.governance_info().await?;
        self.superblock_budget(info.next_superblock).await
    }
}

/// JSON-RPC 1.0 client over HTTP basic auth.
#[derive(Clone)]
pub struct RpcClient {
    http: reqwest::Client,
    url: String,
    user: String,
    password: String,
}

impl RpcClient {
    pub fn new(creds: &RpcCredentials) -> Result<Self, RpcError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| RpcError::Transport(format!("failed to create HTTP client: {e}")))?;
        Ok(Self {
            http,
            url: creds.url(),
            user: creds.user.clone(),
            password: creds.password.clone(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Send one request and return its `result`.
    ///
    /// The daemon answers RPC errors with a non-2xx status and a JSON body,
    /// so the body is inspected before the status.
    pub async fn call(&self, method: &str, params: Vec<Value>) -> Result<Value, RpcError> {
        trace!(method, ?params, "rpc call");
        let body = json!({
            "jsonrpc": "1.0",
            "id": "sentinel",
            "method": method,
            "params": params,
        });
        let response = self
            .http
            .post(&self.url)
            .basic_auth(&self.user, Some(&self.password))
            .json(&body)
            .send()
            .await
            .map_err(|e| RpcError::Transport(format!("{method}: {e}")))?;

        let status = response.status();
        let json: Value = match response.json().await {
            Ok(json) => json,
            Err(_) if !status.is_success() => return Err(RpcError::Http(status.as_u16())),
            Err(e) => return Err(RpcError::invalid(method, e)),
        };

        if let Some(err) = json.get("error").filter(|e| !e.is_null()) {
            return Err(RpcError::Daemon {
                code: err.get("code").and_then(Value::as_i64).unwrap_or_default(),
                message: err
                    .get("message")
                    .and_then(Value::as_str)
                    .unwrap_or("unknown error")
                    .to_string(),
            });
        }
        if !status.is_success() {
            return Err(RpcError::Http(status.as_u16()));
        }
        Ok(json.get("result").cloned().unwrap_or(Value::Null))
    }

    async fn call_typed<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Vec<Value>,
    ) -> Result<T, RpcError> {
        let result = self.call(method, params).await?;
        serde_json::from_value(result).map_err(|e| RpcError::invalid(method, e))
    }
}

impl DaemonRpc for RpcClient {
    async fn governance_info(&self) -> Result<GovernanceInfo, RpcError> {
        self.call_typed("getgovernanceinfo", vec![]).await
    }

    async fn node_info(&self) -> Result<NodeInfo, RpcError> {
        self.call_typed("getinfo", vec![]).await
    }

    async fn is_synced(&self) -> Result<bool, RpcError> {
        let status: SyncStatus = self.call_typed("mnsync", vec![json!("status")]).await?;
        Ok(status.is_synced)
    }

    async fn masternode_status(&self) -> Result<MasternodeStatus, RpcError> {
        self.call_typed("masternode", vec![json!("status")]).await
    }

    async fn enabled_masternode_count(&self) -> Result<u64, RpcError> {
        let count: MasternodeCount = self.call_typed("masternode", vec![json!("count")]).await?;
        Ok(count.enabled())
    }

    async fn masternode_list(&self) -> Result<Vec<MasternodeEntry>, RpcError> {
        let result = self
            .call("masternode", vec![json!("list"), json!("full")])
            .await?;
        parse_masternode_list(result)
    }

    async fn governance_objects(&self) -> Result<Vec<ObjectEnvelope>, RpcError> {
        let listing: std::collections::BTreeMap<String, Value> =
            self.call_typed("gobject", vec![json!("list")]).await?;
        debug!(count = listing.len(), "fetched governance objects");
        Ok(listing
            .into_iter()
            .filter_map(|(key, raw)| match serde_json::from_value(raw) {
                Ok(envelope) => Some(envelope),
                Err(e) => {
                    warn!(%key, error = %e, "dropping listing entry without a usable envelope");
                    None
                }
            })
            .collect())
    }

    async fn vote(
        &self,
        object_hash: &ObjectHash,
        signal: VoteSignal,
        outcome: VoteOutcome,
    ) -> Result<VoteResult, RpcError> {
        let result = self
            .call(
                "gobject",
                vec![
                    json!("vote-conf"),
                    json!(object_hash.to_hex()),
                    json!(signal.as_str()),
                    json!(outcome.as_str()),
                ],
            )
            .await?;
        Ok(parse_vote_result(&result))
    }

    async fn current_votes(
        &self,
        object_hash: &ObjectHash,
        agent: &Outpoint,
    ) -> Result<Vec<NetworkVote>, RpcError> {
        let result = self
            .call(
                "gobject",
                vec![
                    json!("getcurrentvotes"),
                    json!(object_hash.to_hex()),
                    json!(agent.txid.to_hex()),
                    json!(agent.index.to_string()),
                ],
            )
            .await?;
        parse_current_votes(result)
    }

    async fn submit_superblock(
        &self,
        now: Timestamp,
        data_hex: &str,
    ) -> Result<ObjectHash, RpcError> {
        let hash: String = self
            .call_typed(
                "gobject",
                vec![
                    json!("submit"),
                    json!("0"),
                    json!("1"),
                    json!(now.as_secs().to_string()),
                    json!(data_hex),
                ],
            )
            .await?;
        ObjectHash::from_hex(&hash).map_err(|e| RpcError::invalid("gobject submit", e))
    }

    async fn superblock_budget(&self, height: u64) -> Result<Amount, RpcError> {
        let result = self.call("getsuperblockbudget", vec![json!(height)]).await?;
        parse_amount("getsuperblockbudget", &result)
    }

    async fn block_count(&self) -> Result<u64, RpcError> {
        self.call_typed("getblockcount", vec![]).await
    }

    async fn block_hash(&self, height: u64) -> Result<ObjectHash, RpcError> {
        let hash: String = self.call_typed("getblockhash", vec![json!(height)]).await?;
        ObjectHash::from_hex(&hash).map_err(|e| RpcError::invalid("getblockhash", e))
    }

    async fn block_time(&self, height: u64) -> Result<Timestamp, RpcError> {
        let hash = self.block_hash(height).await?;
        let header: BlockHeader = self
            .call_typed("getblock", vec![json!(hash.to_hex())])
            .await?;
        Ok(Timestamp::new(header.time))
    }

    async fn sentinel_ping(&self, version: &str) -> Result<(), RpcError> {
        self.call("sentinelping", vec![json!(version)]).await?;
        Ok(())
    }
}
