//! One sentinel pass, end to end.
//!
//! Preconditions (daemon reachable, synced, a masternode), the scheduler
//! gate and start delay, then sync, ping, validity voting, pruning and
//! superblock arbitration, and finally the next run is scheduled. Every RPC
//! is awaited in sequence; nothing runs concurrently within a pass.

use rand::Rng;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

use sentinel_governance::policy::expiry_grace_secs;
use sentinel_governance::validity::ValidityContext;
use sentinel_rpc::{DaemonRpc, RpcError};
use sentinel_store::SentinelStore;
use sentinel_types::{Clock, NetworkId};

use crate::arbiter::{attempt_superblock, ArbiterSettings, SuperblockOutcome};
use crate::config::SentinelConfig;
use crate::lease::RunLease;
use crate::reconcile::{sync, SyncReport};
use crate::scheduler::Scheduler;
use crate::voting::{prune_expired_proposals, vote_validity, Voter};
use crate::AgentError;

/// Knobs for a pass, resolved from [`SentinelConfig`] and the command line.
#[derive(Clone, Debug)]
pub struct RunSettings {
    pub network: NetworkId,
    /// Run now regardless of the schedule, and skip the start delay.
    pub bypass_scheduler: bool,
    pub block_spacing_secs: u64,
    pub maturity_phase_blocks: u64,
    pub schedule_max_interval_secs: u64,
    pub max_start_delay_secs: u64,
    pub vote_validity: bool,
    pub lease_ttl_secs: u64,
    /// Reported to the daemon through `sentinelping`.
    pub version: String,
}

impl RunSettings {
    pub fn from_config(config: &SentinelConfig, network: NetworkId, bypass_scheduler: bool) -> Self {
        Self {
            network,
            bypass_scheduler,
            block_spacing_secs: config.block_spacing_secs,
            maturity_phase_blocks: config.maturity_phase_blocks_for(network),
            schedule_max_interval_secs: config.schedule_max_interval_secs,
            max_start_delay_secs: config.max_start_delay_secs,
            vote_validity: config.vote_validity,
            lease_ttl_secs: config.lease_ttl_secs,
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    fn arbiter(&self) -> ArbiterSettings {
        ArbiterSettings {
            network: self.network,
            maturity_phase_blocks: self.maturity_phase_blocks,
            block_spacing_secs: self.block_spacing_secs,
        }
    }
}

/// Why a pass did nothing. None of these are failures.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Unavailable {
    Unreachable,
    NotSynced,
    NotMasternode,
}

/// What the work of a completed pass amounted to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PassReport {
    pub sync: SyncReport,
    pub pruned: usize,
    pub validity_votes: usize,
    pub superblock: SuperblockOutcome,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RunOutcome {
    Completed(PassReport),
    /// The schedule says not yet.
    NotDue,
    Unavailable(Unavailable),
}

/// The sentinel: a daemon connection, a local cache and a clock.
pub struct Sentinel<D, S, C> {
    daemon: D,
    store: S,
    clock: C,
    settings: RunSettings,
}

impl<D, S, C> Sentinel<D, S, C>
where
    D: DaemonRpc,
    S: SentinelStore,
    C: Clock,
{
    pub fn new(daemon: D, store: S, clock: C, settings: RunSettings) -> Self {
        Self {
            daemon,
            store,
            clock,
            settings,
        }
    }

    pub fn daemon(&self) -> &D {
        &self.daemon
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn settings(&self) -> &RunSettings {
        &self.settings
    }

    fn scheduler(&self) -> Scheduler<'_, S> {
        Scheduler::new(
            &self.store,
            self.settings.schedule_max_interval_secs,
            self.settings.max_start_delay_secs,
        )
    }

    /// Take the run lease, then run one pass. The lease is released when
    /// this future completes or is dropped.
    pub async fn run_exclusive<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
    ) -> Result<RunOutcome, AgentError> {
        let _lease = RunLease::acquire(&self.store, self.clock.now(), self.settings.lease_ttl_secs)?;
        self.run_pass(rng).await
    }

    /// [`run_exclusive`](Self::run_exclusive), abandoned as soon as
    /// `shutdown` fires.
    pub async fn run_until_shutdown<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<RunOutcome, AgentError> {
        tokio::select! {
            biased;
            _ = shutdown.recv() => {
                error!("shutdown requested, pass abandoned");
                Err(AgentError::Interrupted)
            }
            outcome = self.run_exclusive(rng) => outcome,
        }
    }

    /// One pass without the lease.
    pub async fn run_pass<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<RunOutcome, AgentError> {
        let info = match self.daemon.governance_info().await {
            Ok(info) => info,
            Err(e) => {
                warn!(error = %e, "cannot connect to daemon");
                return Ok(RunOutcome::Unavailable(Unavailable::Unreachable));
            }
        };

        if !self.daemon.is_synced().await? {
            warn!("daemon not synced, nothing to do");
            return Ok(RunOutcome::Unavailable(Unavailable::NotSynced));
        }

        let agent = match self.daemon.masternode_status().await {
            Ok(status) => status.agent_id(),
            Err(RpcError::Daemon { message, .. }) => {
                debug!(%message, "masternode status refused");
                None
            }
            Err(e) => return Err(e.into()),
        };
        let Some(agent) = agent else {
            warn!("invalid masternode status, cannot continue");
            return Ok(RunOutcome::Unavailable(Unavailable::NotMasternode));
        };

        let scheduler = self.scheduler();
        if self.settings.bypass_scheduler {
            scheduler.clear_schedule()?;
        } else {
            if !scheduler.is_run_time(self.clock.now())? {
                debug!(next = ?scheduler.next_run_at(self.clock.now())?, "not yet time for a pass");
                return Ok(RunOutcome::NotDue);
            }
            let delay = scheduler.start_delay(rng);
            debug!(delay_secs = delay.as_secs(), "start delay");
            tokio::time::sleep(delay).await;
            scheduler.clear_schedule()?;
        }

        let now = self.clock.now();
        info!(%agent, network = self.settings.network.as_str(), "sentinel pass started");

        let sync_report = sync(&self.daemon, &self.store, now).await?;

        let node = self.daemon.node_info().await?;
        if node.supports_sentinel_ping() {
            if let Err(e) = self.daemon.sentinel_ping(&self.settings.version).await {
                warn!(error = %e, "sentinel ping failed");
            }
        }

        let voter = Voter::new(&self.daemon, &self.store, agent, now);

        let validity_votes = if self.settings.vote_validity {
            let ctx = ValidityContext {
                network: self.settings.network,
                max_budget: self.daemon.next_superblock_max_budget().await?,
                max_data_size: info.max_data_size,
            };
            vote_validity(&voter, &ctx).await?
        } else {
            0
        };

        let grace = expiry_grace_secs(info.superblock_cycle, self.settings.block_spacing_secs);
        let pruned = prune_expired_proposals(&voter, grace).await?;

        let superblock =
            attempt_superblock(&self.daemon, &self.store, Some(&voter), &self.settings.arbiter())
                .await?;

        scheduler.schedule_next_run(self.clock.now(), rng)?;

        let report = PassReport {
            sync: sync_report,
            pruned,
            validity_votes,
            superblock,
        };
        info!(pruned, validity_votes, superblock = ?report.superblock, "sentinel pass complete");
        Ok(RunOutcome::Completed(report))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use sentinel_nullables::{NullClock, NullDaemon, NullStore};
    use sentinel_store::MetaStore;
    use sentinel_types::{ObjectHash, Outpoint};

    use crate::lease::LEASE_NAME;

    const NOW: u64 = 1_500_200_000;

    fn agent() -> Outpoint {
        Outpoint::new(ObjectHash::new([0x42; 32]), 0)
    }

    fn settings(bypass: bool) -> RunSettings {
        let mut settings =
            RunSettings::from_config(&SentinelConfig::default(), NetworkId::Mainnet, bypass);
        settings.max_start_delay_secs = 0;
        settings
    }

    fn sentinel(bypass: bool) -> Sentinel<NullDaemon, NullStore, NullClock> {
        Sentinel::new(
            NullDaemon::new(agent()),
            NullStore::new(),
            NullClock::new(NOW),
            settings(bypass),
        )
    }

    #[tokio::test]
    async fn unreachable_daemon_is_a_no_op() {
        let s = sentinel(true);
        s.daemon().with_state(|st| st.reachable = false);
        let outcome = s.run_pass(&mut StdRng::seed_from_u64(1)).await.unwrap();
        assert_eq!(outcome, RunOutcome::Unavailable(Unavailable::Unreachable));
    }

    #[tokio::test]
    async fn non_masternode_stops_before_sync() {
        let s = sentinel(true);
        s.daemon().with_state(|st| st.masternode.outpoint = None);
        let outcome = s.run_pass(&mut StdRng::seed_from_u64(1)).await.unwrap();
        assert_eq!(outcome, RunOutcome::Unavailable(Unavailable::NotMasternode));
        assert!(!s.daemon().calls().contains(&"gobject list".to_string()));
    }

    #[tokio::test]
    async fn completed_pass_schedules_the_next() {
        let s = sentinel(false);
        let mut rng = StdRng::seed_from_u64(2);
        let outcome = s.run_pass(&mut rng).await.unwrap();
        assert!(matches!(outcome, RunOutcome::Completed(_)));
        assert_eq!(s.run_pass(&mut rng).await.unwrap(), RunOutcome::NotDue);
    }

    #[tokio::test]
    async fn bypass_ignores_the_schedule() {
        let s = sentinel(true);
        let mut rng = StdRng::seed_from_u64(3);
        s.run_pass(&mut rng).await.unwrap();
        assert!(matches!(
            s.run_pass(&mut rng).await.unwrap(),
            RunOutcome::Completed(_)
        ));
    }

    #[tokio::test]
    async fn ping_only_when_supported() {
        let s = sentinel(true);
        s.daemon().with_state(|st| st.protocol_version = 70206);
        s.run_pass(&mut StdRng::seed_from_u64(4)).await.unwrap();
        assert_eq!(s.daemon().with_state(|st| st.pings), 0);

        let s = sentinel(true);
        s.run_pass(&mut StdRng::seed_from_u64(4)).await.unwrap();
        assert_eq!(s.daemon().with_state(|st| st.pings), 1);
    }

    #[tokio::test]
    async fn lease_released_after_pass() {
        let s = sentinel(true);
        s.run_exclusive(&mut StdRng::seed_from_u64(5)).await.unwrap();
        let key = format!("__transient_{LEASE_NAME}");
        assert_eq!(s.store().get_meta(&key).unwrap(), None);
    }

    #[tokio::test]
    async fn shutdown_before_start_abandons_the_pass() {
        let s = sentinel(true);
        let (tx, rx) = broadcast::channel(1);
        tx.send(()).unwrap();
        let result = s
            .run_until_shutdown(&mut StdRng::seed_from_u64(6), rx)
            .await;
        assert!(matches!(result, Err(AgentError::Interrupted)));
        assert!(s.daemon().calls().is_empty());
    }
}
