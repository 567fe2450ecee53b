//! Typed daemon responses and the parsers for the loosely shaped ones.

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use sentinel_governance::MasternodeEntry;
use sentinel_types::{Amount, Outpoint, Timestamp, VoteOutcome, VoteSignal};

use crate::RpcError;

/// First protocol version whose daemons accept `sentinelping`.
pub const SENTINEL_PING_MIN_PROTOCOL: u64 = 70207;

// ── Chain / node ─────────────────────────────────────────────────────────

/// `getgovernanceinfo`
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GovernanceInfo {
    #[serde(rename = "governanceminquorum")]
    pub min_quorum: i64,
    #[serde(rename = "superblockcycle")]
    pub superblock_cycle: u64,
    #[serde(rename = "lastsuperblock", default)]
    pub last_superblock: u64,
    #[serde(rename = "nextsuperblock")]
    pub next_superblock: u64,
    #[serde(rename = "maxgovobjdatasize", default = "default_max_data_size")]
    pub max_data_size: usize,
}

fn default_max_data_size() -> usize {
    sentinel_governance::validity::DEFAULT_MAX_DATA_SIZE
}

/// `getinfo`
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NodeInfo {
    pub blocks: u64,
    #[serde(rename = "protocolversion")]
    pub protocol_version: u64,
    #[serde(default)]
    pub testnet: bool,
}

impl NodeInfo {
    pub fn supports_sentinel_ping(&self) -> bool {
        self.protocol_version >= SENTINEL_PING_MIN_PROTOCOL
    }
}

/// `mnsync status`
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct SyncStatus {
    #[serde(rename = "IsSynced", default)]
    pub is_synced: bool,
}

/// `getblock`
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct BlockHeader {
    pub time: u64,
}

// ── Masternodes ──────────────────────────────────────────────────────────

/// `masternode status`. Newer daemons report `outpoint`, older ones a `vin`
/// rendering that embeds it.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct MasternodeStatus {
    #[serde(default)]
    pub outpoint: Option<String>,
    #[serde(default)]
    pub vin: Option<String>,
    #[serde(default)]
    pub status: String,
}

impl MasternodeStatus {
    /// The collateral outpoint, if this node is a configured masternode.
    pub fn agent_id(&self) -> Option<Outpoint> {
        if let Some(op) = self.outpoint.as_deref().and_then(|s| s.parse::<Outpoint>().ok()) {
            return (!op.txid.is_zero()).then_some(op);
        }
        let vin = self.vin.as_deref()?;
        let start = vin.find("COutPoint(")?;
        let end = start + vin[start..].find(')')?;
        let op: Outpoint = vin[start..=end].parse().ok()?;
        (!op.txid.is_zero()).then_some(op)
    }
}

/// `masternode count` is a bare number on old daemons and an object on
/// newer ones.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum MasternodeCount {
    Detail { enabled: u64 },
    Plain(u64),
}

impl MasternodeCount {
    pub fn enabled(&self) -> u64 {
        match self {
            MasternodeCount::Detail { enabled } => *enabled,
            MasternodeCount::Plain(n) => *n,
        }
    }
}

/// `masternode list full`: outpoint → `"STATUS protocol payee ..."`.
pub fn parse_masternode_list(value: Value) -> Result<Vec<MasternodeEntry>, RpcError> {
    let rows: std::collections::BTreeMap<String, String> =
        serde_json::from_value(value).map_err(|e| RpcError::invalid("masternode list", e))?;
    let mut entries = Vec::with_capacity(rows.len());
    for (key, row) in rows {
        let Ok(outpoint) = key.parse::<Outpoint>() else {
            debug!(%key, "skipping masternode with unparseable outpoint");
            continue;
        };
        let status = row.split_whitespace().next().unwrap_or_default();
        entries.push(MasternodeEntry::new(outpoint, status));
    }
    Ok(entries)
}

// ── Votes ────────────────────────────────────────────────────────────────

/// How the daemon answered a vote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoteResult {
    Success,
    /// The network already holds a recent vote from this masternode.
    TooOften,
    Failed(String),
}

const RATE_LIMIT_MARKERS: [&str; 2] = ["too often", "time between votes is too soon"];

/// Classify a `gobject vote-conf` response.
pub fn parse_vote_result(value: &Value) -> VoteResult {
    let details: Vec<&Value> = match value.get("detail") {
        Some(Value::Object(map)) => map.values().collect(),
        _ => Vec::new(),
    };

    if details
        .iter()
        .any(|d| d.get("result").and_then(Value::as_str) == Some("success"))
    {
        return VoteResult::Success;
    }

    let messages: Vec<&str> = details
        .iter()
        .filter_map(|d| d.get("errorMessage").and_then(Value::as_str))
        .collect();
    if messages
        .iter()
        .any(|m| RATE_LIMIT_MARKERS.iter().any(|marker| m.contains(marker)))
    {
        return VoteResult::TooOften;
    }

    let reason = if messages.is_empty() {
        value
            .get("overall")
            .and_then(Value::as_str)
            .unwrap_or("no detail in vote response")
            .to_string()
    } else {
        messages.join("; ")
    };
    VoteResult::Failed(reason)
}

/// One of this masternode's votes as the network currently sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkVote {
    pub outpoint: Outpoint,
    pub time: Timestamp,
    pub outcome: VoteOutcome,
    pub signal: VoteSignal,
}

impl std::str::FromStr for NetworkVote {
    type Err = String;

    /// `outpoint:time:outcome:signal`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.rsplitn(4, ':');
        let (Some(signal), Some(outcome), Some(time), Some(outpoint)) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(format!("expected 4 fields in {s}"));
        };
        Ok(Self {
            outpoint: outpoint.parse().map_err(|e| format!("{e}"))?,
            time: Timestamp::new(time.trim().parse().map_err(|_| format!("bad time {time}"))?),
            outcome: outcome.parse().map_err(|e| format!("{e}"))?,
            signal: signal.parse().map_err(|e| format!("{e}"))?,
        })
    }
}

/// `gobject getcurrentvotes`: vote hash → vote string. Votes on signals this
/// agent does not know are skipped.
pub fn parse_current_votes(value: Value) -> Result<Vec<NetworkVote>, RpcError> {
    let rows: std::collections::BTreeMap<String, String> = serde_json::from_value(value)
        .map_err(|e| RpcError::invalid("gobject getcurrentvotes", e))?;
    Ok(rows
        .values()
        .filter_map(|row| match row.parse::<NetworkVote>() {
            Ok(vote) => Some(vote),
            Err(reason) => {
                debug!(%row, %reason, "skipping unparseable vote");
                None
            }
        })
        .collect())
}

// ── Budget ───────────────────────────────────────────────────────────────

/// Budget figures arrive as JSON numbers or decimal strings.
pub fn parse_amount(method: &str, value: &Value) -> Result<Amount, RpcError> {
    match value {
        Value::Number(n) => {
            if let Some(whole) = n.as_u64() {
                return Ok(Amount::from_coins(whole));
            }
            let coins = n
                .as_f64()
                .ok_or_else(|| RpcError::invalid(method, format!("bad amount {n}")))?;
            Amount::from_coins_f64(coins).map_err(|e| RpcError::invalid(method, e))
        }
        Value::String(s) => Amount::parse_decimal(s).map_err(|e| RpcError::invalid(method, e)),
        other => Err(RpcError::invalid(method, format!("bad amount {other}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sentinel_types::ObjectHash;
    use serde_json::json;

    fn txid() -> String {
        "ab".repeat(32)
    }

    #[test]
    fn governance_info_fields() {
        let info: GovernanceInfo = serde_json::from_value(json!({
            "governanceminquorum": 10,
            "masternodewatchdogmaxseconds": 7200,
            "proposalfee": 5.0,
            "superblockcycle": 16616,
            "lastsuperblock": 1000,
            "nextsuperblock": 17616
        }))
        .unwrap();
        assert_eq!(info.min_quorum, 10);
        assert_eq!(info.superblock_cycle, 16616);
        assert_eq!(info.next_superblock, 17616);
        assert_eq!(info.max_data_size, 512);
    }

    #[test]
    fn sentinel_ping_support() {
        let old = NodeInfo { blocks: 1, protocol_version: 70206, testnet: false };
        let new = NodeInfo { blocks: 1, protocol_version: 70207, testnet: false };
        assert!(!old.supports_sentinel_ping());
        assert!(new.supports_sentinel_ping());
    }

    #[test]
    fn agent_id_from_outpoint_or_vin() {
        let status = MasternodeStatus {
            outpoint: Some(format!("{}-1", txid())),
            ..Default::default()
        };
        assert_eq!(status.agent_id().unwrap().index, 1);

        let status = MasternodeStatus {
            vin: Some(format!("CTxIn(COutPoint({}, 3), scriptSig=)", txid())),
            ..Default::default()
        };
        assert_eq!(status.agent_id().unwrap().index, 3);

        let unconfigured = MasternodeStatus {
            outpoint: Some(format!("{}-0", "00".repeat(32))),
            ..Default::default()
        };
        assert_eq!(unconfigured.agent_id(), None);
        assert_eq!(MasternodeStatus::default().agent_id(), None);
    }

    #[test]
    fn masternode_count_both_shapes() {
        let plain: MasternodeCount = serde_json::from_value(json!(42)).unwrap();
        assert_eq!(plain.enabled(), 42);
        let detail: MasternodeCount =
            serde_json::from_value(json!({"total": 50, "enabled": 40})).unwrap();
        assert_eq!(detail.enabled(), 40);
    }

    #[test]
    fn masternode_list_status_column() {
        let list = parse_masternode_list(json!({
            format!("{}-0", txid()): "  ENABLED 70208 XpayeeAddr 1500000000 100 0 0 1.2.3.4:9999",
            format!("{}-1", txid()): "POSE_BANNED 70208 Xother 0 0 0 0 1.2.3.5:9999",
            "garbage": "ENABLED"
        }))
        .unwrap();
        assert_eq!(list.len(), 2);
        assert!(list[0].is_enabled());
        assert!(!list[1].is_enabled());
    }

    #[test]
    fn vote_success() {
        let v = json!({
            "overall": "Voted successfully 1 time(s) and failed 0 time(s).",
            "detail": {"dash.conf": {"result": "success"}}
        });
        assert_eq!(parse_vote_result(&v), VoteResult::Success);
    }

    #[test]
    fn vote_rate_limited() {
        for msg in [
            "Failure to process vote: Masternode voting too often",
            "Failure to process vote: time between votes is too soon",
        ] {
            let v = json!({
                "overall": "Voted successfully 0 time(s) and failed 1 time(s).",
                "detail": {"dash.conf": {"result": "failed", "errorMessage": msg}}
            });
            assert_eq!(parse_vote_result(&v), VoteResult::TooOften, "{msg}");
        }
    }

    #[test]
    fn vote_failed() {
        let v = json!({
            "overall": "Voted successfully 0 time(s) and failed 1 time(s).",
            "detail": {"dash.conf": {"result": "failed", "errorMessage": "Failure to find masternode in list"}}
        });
        assert_eq!(
            parse_vote_result(&v),
            VoteResult::Failed("Failure to find masternode in list".into())
        );
        assert!(matches!(parse_vote_result(&json!({})), VoteResult::Failed(_)));
    }

    #[test]
    fn current_votes_parse() {
        let votes = parse_current_votes(json!({
            "aa": format!("{}-1:1500000000:yes:funding", txid()),
            "bb": format!("{}-1:1500000100:no:delete", txid()),
            "cc": format!("{}-1:1500000200:yes:mystery", txid()),
        }))
        .unwrap();
        assert_eq!(votes.len(), 2);
        assert_eq!(votes[0].signal, VoteSignal::Funding);
        assert_eq!(votes[0].outcome, VoteOutcome::Yes);
        assert_eq!(votes[0].outpoint.txid, ObjectHash::new([0xab; 32]));
        assert_eq!(votes[1].time.as_secs(), 1_500_000_100);
    }

    #[test]
    fn amounts_from_numbers_and_strings() {
        assert_eq!(
            parse_amount("m", &json!(5)).unwrap(),
            Amount::from_coins(5)
        );
        assert_eq!(
            parse_amount("m", &json!(7.5)).unwrap().to_string(),
            "7.50000000"
        );
        assert_eq!(
            parse_amount("m", &json!("1.25")).unwrap().to_string(),
            "1.25000000"
        );
        assert!(parse_amount("m", &json!(null)).is_err());
    }
}
