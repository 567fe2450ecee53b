//! Nullable daemon: a scripted, in-memory stand-in for the full node.
//!
//! Holds the governance state a real daemon would report, accepts votes and
//! submissions into that state, and records every call for assertions.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::Mutex;

use sentinel_crypto::sha256;
use sentinel_governance::superblock::trigger_payload_hex;
use sentinel_governance::{MasternodeEntry, ObjectEnvelope};
use sentinel_rpc::responses::{MasternodeStatus, NetworkVote, NodeInfo, VoteResult};
use sentinel_rpc::{DaemonRpc, GovernanceInfo, RpcError};
use sentinel_store::{Superblock, OBJECT_TYPE_PROPOSAL, OBJECT_TYPE_TRIGGER};
use sentinel_types::{Amount, ObjectHash, Outpoint, Timestamp, VoteOutcome, VoteSignal};

/// Time of block 0 in the simulated chain.
pub const GENESIS_TIME: u64 = 1_500_000_000;
/// Seconds between simulated blocks.
pub const BLOCK_SPACING: u64 = 150;

/// A test daemon whose chain and governance state are set directly.
pub struct NullDaemon {
    state: Mutex<DaemonState>,
    calls: Mutex<Vec<String>>,
}

/// The state a [`NullDaemon`] reports. Mutate through [`NullDaemon::with_state`].
pub struct DaemonState {
    pub reachable: bool,
    pub synced: bool,
    pub masternode: MasternodeStatus,
    pub governance: GovernanceInfo,
    pub protocol_version: u64,
    pub block_count: u64,
    pub superblock_budget: Amount,
    pub masternodes: Vec<MasternodeEntry>,
    pub objects: BTreeMap<ObjectHash, ObjectEnvelope>,
    /// Responses handed out to votes in order; `Success` once exhausted.
    pub vote_responses: VecDeque<VoteResult>,
    /// Votes the network holds, per object.
    pub network_votes: HashMap<ObjectHash, Vec<NetworkVote>>,
    /// Successful votes in the order they were cast.
    pub votes_cast: Vec<(ObjectHash, VoteSignal, VoteOutcome)>,
    /// Payloads accepted through `gobject submit`.
    pub submissions: Vec<String>,
    pub pings: u32,
}

impl NullDaemon {
    /// A synced daemon at height 1000 whose own masternode is `agent` and
    /// the only enabled masternode on the network.
    pub fn new(agent: Outpoint) -> Self {
        let state = DaemonState {
            reachable: true,
            synced: true,
            masternode: MasternodeStatus {
                outpoint: Some(agent.to_string()),
                vin: None,
                status: "Masternode successfully started".into(),
            },
            governance: GovernanceInfo {
                min_quorum: 1,
                superblock_cycle: 24,
                last_superblock: 984,
                next_superblock: 1008,
                max_data_size: 512,
            },
            protocol_version: 70208,
            block_count: 1000,
            superblock_budget: Amount::from_coins(1000),
            masternodes: vec![MasternodeEntry::new(agent, "ENABLED")],
            objects: BTreeMap::new(),
            vote_responses: VecDeque::new(),
            network_votes: HashMap::new(),
            votes_cast: Vec::new(),
            submissions: Vec::new(),
            pings: 0,
        };
        Self {
            state: Mutex::new(state),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Inspect or script the daemon state.
    pub fn with_state<R>(&self, f: impl FnOnce(&mut DaemonState) -> R) -> R {
        f(&mut self.state.lock().unwrap())
    }

    pub fn add_object(&self, envelope: ObjectEnvelope) {
        self.with_state(|s| s.objects.insert(envelope.hash, envelope));
    }

    pub fn queue_vote_response(&self, response: VoteResult) {
        self.with_state(|s| s.vote_responses.push_back(response));
    }

    /// Method names in call order, e.g. `"gobject vote-conf"`.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn votes_cast(&self) -> Vec<(ObjectHash, VoteSignal, VoteOutcome)> {
        self.with_state(|s| s.votes_cast.clone())
    }

    pub fn submissions(&self) -> Vec<String> {
        self.with_state(|s| s.submissions.clone())
    }

    fn enter(&self, method: &str) -> Result<(), RpcError> {
        self.calls.lock().unwrap().push(method.to_string());
        if self.with_state(|s| s.reachable) {
            Ok(())
        } else {
            Err(RpcError::Transport(format!("{method}: connection refused")))
        }
    }

    fn agent(&self) -> Option<Outpoint> {
        self.with_state(|s| s.masternode.agent_id())
    }
}

/// Deterministic block hash for a simulated height.
pub fn block_hash_at(height: u64) -> ObjectHash {
    ObjectHash::new(sha256(&height.to_be_bytes()))
}

/// A listing entry for a proposal.
pub fn proposal_envelope(
    hash: ObjectHash,
    name: &str,
    window: (u64, u64),
    payment_address: &str,
    payment_coins: u64,
    absolute_yes_count: i64,
) -> ObjectEnvelope {
    let document = serde_json::json!({
        "type": OBJECT_TYPE_PROPOSAL,
        "name": name,
        "url": format!("https://example.org/{name}"),
        "start_epoch": window.0,
        "end_epoch": window.1,
        "payment_address": payment_address,
        "payment_amount": payment_coins,
    });
    ObjectEnvelope {
        hash,
        collateral_hash: ObjectHash::new([0xcc; 32]),
        object_type: OBJECT_TYPE_PROPOSAL,
        data_hex: hex::encode(document.to_string()),
        absolute_yes_count,
        yes_count: absolute_yes_count.max(0) as u64,
        no_count: 0,
        abstain_count: 0,
        creation_time: GENESIS_TIME,
    }
}

/// A listing entry for a superblock trigger, with the canonical payload.
pub fn trigger_envelope(hash: ObjectHash, superblock: &Superblock) -> ObjectEnvelope {
    ObjectEnvelope {
        hash,
        collateral_hash: ObjectHash::ZERO,
        object_type: OBJECT_TYPE_TRIGGER,
        data_hex: trigger_payload_hex(superblock).unwrap_or_default(),
        absolute_yes_count: 0,
        yes_count: 0,
        no_count: 0,
        abstain_count: 0,
        creation_time: GENESIS_TIME,
    }
}

impl DaemonRpc for NullDaemon {
    async fn governance_info(&self) -> Result<GovernanceInfo, RpcError> {
        self.enter("getgovernanceinfo")?;
        Ok(self.with_state(|s| s.governance.clone()))
    }

    async fn node_info(&self) -> Result<NodeInfo, RpcError> {
        self.enter("getinfo")?;
        Ok(self.with_state(|s| NodeInfo {
            blocks: s.block_count,
            protocol_version: s.protocol_version,
            testnet: false,
        }))
    }

    async fn is_synced(&self) -> Result<bool, RpcError> {
        self.enter("mnsync status")?;
        Ok(self.with_state(|s| s.synced))
    }

    async fn masternode_status(&self) -> Result<MasternodeStatus, RpcError> {
        self.enter("masternode status")?;
        Ok(self.with_state(|s| s.masternode.clone()))
    }

    async fn enabled_masternode_count(&self) -> Result<u64, RpcError> {
        self.enter("masternode count")?;
        Ok(self.with_state(|s| s.masternodes.iter().filter(|m| m.is_enabled()).count() as u64))
    }

    async fn masternode_list(&self) -> Result<Vec<MasternodeEntry>, RpcError> {
        self.enter("masternode list full")?;
        Ok(self.with_state(|s| s.masternodes.clone()))
    }

    async fn governance_objects(&self) -> Result<Vec<ObjectEnvelope>, RpcError> {
        self.enter("gobject list")?;
        Ok(self.with_state(|s| s.objects.values().cloned().collect()))
    }

    async fn vote(
        &self,
        object_hash: &ObjectHash,
        signal: VoteSignal,
        outcome: VoteOutcome,
    ) -> Result<VoteResult, RpcError> {
        self.enter("gobject vote-conf")?;
        let agent = self.agent();
        Ok(self.with_state(|s| {
            let response = s.vote_responses.pop_front().unwrap_or(VoteResult::Success);
            if response == VoteResult::Success {
                s.votes_cast.push((*object_hash, signal, outcome));
                if let Some(agent) = agent {
                    let votes = s.network_votes.entry(*object_hash).or_default();
                    votes.retain(|v| !(v.outpoint == agent && v.signal == signal));
                    votes.push(NetworkVote {
                        outpoint: agent,
                        time: Timestamp::new(GENESIS_TIME),
                        outcome,
                        signal,
                    });
                }
            }
            response
        }))
    }

    async fn current_votes(
        &self,
        object_hash: &ObjectHash,
        agent: &Outpoint,
    ) -> Result<Vec<NetworkVote>, RpcError> {
        self.enter("gobject getcurrentvotes")?;
        Ok(self.with_state(|s| {
            s.network_votes
                .get(object_hash)
                .map(|votes| {
                    votes
                        .iter()
                        .filter(|v| v.outpoint == *agent)
                        .cloned()
                        .collect()
                })
                .unwrap_or_default()
        }))
    }

    async fn submit_superblock(
        &self,
        _now: Timestamp,
        data_hex: &str,
    ) -> Result<ObjectHash, RpcError> {
        self.enter("gobject submit")?;
        let hash = ObjectHash::new(sha256(data_hex.as_bytes()));
        self.with_state(|s| {
            s.submissions.push(data_hex.to_string());
            s.objects.insert(
                hash,
                ObjectEnvelope {
                    hash,
                    collateral_hash: ObjectHash::ZERO,
                    object_type: OBJECT_TYPE_TRIGGER,
                    data_hex: data_hex.to_string(),
                    absolute_yes_count: 0,
                    yes_count: 0,
                    no_count: 0,
                    abstain_count: 0,
                    creation_time: GENESIS_TIME,
                },
            );
        });
        Ok(hash)
    }

    async fn superblock_budget(&self, _height: u64) -> Result<Amount, RpcError> {
        self.enter("getsuperblockbudget")?;
        Ok(self.with_state(|s| s.superblock_budget))
    }

    async fn block_count(&self) -> Result<u64, RpcError> {
        self.enter("getblockcount")?;
        Ok(self.with_state(|s| s.block_count))
    }

    async fn block_hash(&self, height: u64) -> Result<ObjectHash, RpcError> {
        self.enter("getblockhash")?;
        if height > self.with_state(|s| s.block_count) {
            return Err(RpcError::Daemon {
                code: -8,
                message: "Block height out of range".into(),
            });
        }
        Ok(block_hash_at(height))
    }

    async fn block_time(&self, height: u64) -> Result<Timestamp, RpcError> {
        self.block_hash(height).await?;
        self.enter("getblock")?;
        Ok(Timestamp::new(GENESIS_TIME + height * BLOCK_SPACING))
    }

    async fn sentinel_ping(&self, _version: &str) -> Result<(), RpcError> {
        self.enter("sentinelping")?;
        self.with_state(|s| s.pings += 1);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn agent() -> Outpoint {
        Outpoint::new(ObjectHash::new([0x11; 32]), 0)
    }

    #[tokio::test]
    async fn unreachable_daemon_fails_every_call() {
        let daemon = NullDaemon::new(agent());
        daemon.with_state(|s| s.reachable = false);
        assert!(daemon.governance_info().await.is_err());
        assert!(daemon.is_synced().await.is_err());
        assert_eq!(daemon.calls(), vec!["getgovernanceinfo", "mnsync status"]);
    }

    #[tokio::test]
    async fn successful_votes_show_up_on_the_network() {
        let daemon = NullDaemon::new(agent());
        let hash = ObjectHash::new([5; 32]);
        let result = daemon
            .vote(&hash, VoteSignal::Delete, VoteOutcome::Yes)
            .await
            .unwrap();
        assert_eq!(result, VoteResult::Success);
        let votes = daemon.current_votes(&hash, &agent()).await.unwrap();
        assert_eq!(votes.len(), 1);
        assert_eq!(votes[0].signal, VoteSignal::Delete);
    }

    #[tokio::test]
    async fn scripted_vote_responses_are_used_in_order() {
        let daemon = NullDaemon::new(agent());
        daemon.queue_vote_response(VoteResult::TooOften);
        let hash = ObjectHash::new([5; 32]);
        let first = daemon.vote(&hash, VoteSignal::Funding, VoteOutcome::Yes).await.unwrap();
        let second = daemon.vote(&hash, VoteSignal::Funding, VoteOutcome::Yes).await.unwrap();
        assert_eq!(first, VoteResult::TooOften);
        assert_eq!(second, VoteResult::Success);
        assert_eq!(daemon.votes_cast().len(), 1);
    }

    #[tokio::test]
    async fn epoch_for_past_and_future_blocks() {
        let daemon = NullDaemon::new(agent());
        let now = Timestamp::new(GENESIS_TIME + 1000 * BLOCK_SPACING);
        let past = daemon.block_height_to_epoch(10, now, BLOCK_SPACING).await.unwrap();
        assert_eq!(past.as_secs(), GENESIS_TIME + 10 * BLOCK_SPACING);
        let future = daemon.block_height_to_epoch(1010, now, BLOCK_SPACING).await.unwrap();
        assert_eq!(future.as_secs(), now.as_secs() + 10 * BLOCK_SPACING);
    }

    #[tokio::test]
    async fn submissions_join_the_listing() {
        let daemon = NullDaemon::new(agent());
        let sb = Superblock {
            event_block_height: 1008,
            payment_addresses: vec!["a".into()],
            payment_amounts: vec![Amount::from_coins(1)],
            proposal_hashes: vec![],
        };
        let hex = trigger_payload_hex(&sb).unwrap();
        let hash = daemon.submit_superblock(Timestamp::EPOCH, &hex).await.unwrap();
        let listing = daemon.governance_objects().await.unwrap();
        assert_eq!(listing.len(), 1);
        assert_eq!(listing[0].hash, hash);
        assert_eq!(daemon.submissions(), vec![hex]);
    }
}
