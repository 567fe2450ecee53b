//! Full sentinel passes against the in-memory daemon and store.

use rand::rngs::StdRng;
use rand::SeedableRng;

use sentinel_agent::{
    AgentError, RunLease, RunOutcome, RunSettings, Sentinel, SentinelConfig, SuperblockOutcome,
    Unavailable,
};
use sentinel_nullables::{proposal_envelope, trigger_envelope, NullClock, NullDaemon, NullStore};
use sentinel_rpc::VoteResult;
use sentinel_store::{Superblock, VoteRecord, VoteStore};
use sentinel_types::{Amount, NetworkId, ObjectHash, Outpoint, Timestamp, VoteOutcome, VoteSignal};

const NOW: u64 = 1_500_500_000;
const ADDR: &str = "Xags3HEXJ4G4Uuf8va2eSxLCw2KCyEhiJ7";
/// superblock cycle (24) × block spacing (150)
const GRACE: u64 = 3600;
const NEXT_SUPERBLOCK: u64 = 1008;

fn agent() -> Outpoint {
    Outpoint::new(ObjectHash::new([0x42; 32]), 0)
}

fn hash(b: u8) -> ObjectHash {
    ObjectHash::new([b; 32])
}

fn sentinel() -> Sentinel<NullDaemon, NullStore, NullClock> {
    let mut settings =
        RunSettings::from_config(&SentinelConfig::default(), NetworkId::Mainnet, true);
    settings.max_start_delay_secs = 0;
    Sentinel::new(
        NullDaemon::new(agent()),
        NullStore::new(),
        NullClock::new(NOW),
        settings,
    )
}

fn rng() -> StdRng {
    StdRng::seed_from_u64(0x5e47)
}

fn superblock(amount_coins: u64) -> Superblock {
    Superblock {
        event_block_height: NEXT_SUPERBLOCK,
        payment_addresses: vec![ADDR.to_string()],
        payment_amounts: vec![Amount::from_coins(amount_coins)],
        proposal_hashes: vec![hash(0x77)],
    }
}

fn completed(outcome: RunOutcome) -> sentinel_agent::PassReport {
    match outcome {
        RunOutcome::Completed(report) => report,
        other => panic!("expected a completed pass, got {other:?}"),
    }
}

#[tokio::test]
async fn expired_proposals_get_exactly_one_delete_vote() {
    let s = sentinel();
    let ended = NOW - GRACE - 500;
    s.daemon()
        .add_object(proposal_envelope(hash(1), "old", (ended - 86_400, ended), ADDR, 5, 0));
    s.daemon().add_object(proposal_envelope(
        hash(2),
        "live",
        (NOW - 86_400, NOW + 86_400),
        ADDR,
        5,
        0,
    ));

    let report = completed(s.run_exclusive(&mut rng()).await.unwrap());
    assert_eq!(report.pruned, 1);
    assert_eq!(
        s.daemon().votes_cast(),
        vec![(hash(1), VoteSignal::Delete, VoteOutcome::Yes)]
    );

    let report = completed(s.run_exclusive(&mut rng()).await.unwrap());
    assert_eq!(report.pruned, 0);
    assert_eq!(s.daemon().votes_cast().len(), 1);
}

#[tokio::test]
async fn expiry_boundary_is_not_expired() {
    let s = sentinel();
    let end = NOW - GRACE;
    s.daemon()
        .add_object(proposal_envelope(hash(3), "edge", (end - 86_400, end), ADDR, 5, 0));

    completed(s.run_exclusive(&mut rng()).await.unwrap());
    assert!(s.daemon().votes_cast().is_empty());

    s.clock().advance(1);
    let report = completed(s.run_exclusive(&mut rng()).await.unwrap());
    assert_eq!(report.pruned, 1);
}

#[tokio::test]
async fn funding_winner_is_kept_and_competitors_voted_down() {
    let s = sentinel();
    for b in [0x10, 0x20, 0x30] {
        s.daemon()
            .add_object(trigger_envelope(hash(b), &superblock(b as u64)));
    }
    let held = |object_hash, outcome| VoteRecord {
        object_hash,
        signal: VoteSignal::Funding,
        outcome,
        agent: agent(),
        cast_at: Timestamp::new(NOW - 60),
    };
    s.store().put_vote(&held(hash(0x10), VoteOutcome::Yes)).unwrap();
    s.store().put_vote(&held(hash(0x30), VoteOutcome::No)).unwrap();

    let report = completed(s.run_exclusive(&mut rng()).await.unwrap());
    assert_eq!(
        report.superblock,
        SuperblockOutcome::RatifiedExisting {
            height: NEXT_SUPERBLOCK
        }
    );
    assert_eq!(
        s.daemon().votes_cast(),
        vec![(hash(0x20), VoteSignal::Funding, VoteOutcome::No)]
    );

    completed(s.run_exclusive(&mut rng()).await.unwrap());
    assert_eq!(s.daemon().votes_cast().len(), 1);
    let winner = s
        .store()
        .get_vote(&hash(0x10), VoteSignal::Funding, &agent())
        .unwrap()
        .unwrap();
    assert_eq!(winner.outcome, VoteOutcome::Yes);
}

#[tokio::test]
async fn not_synced_is_a_no_op() {
    let s = sentinel();
    s.daemon().with_state(|st| st.synced = false);
    s.daemon().add_object(proposal_envelope(hash(1), "old", (1, 2), ADDR, 5, 0));

    let outcome = s.run_exclusive(&mut rng()).await.unwrap();
    assert_eq!(outcome, RunOutcome::Unavailable(Unavailable::NotSynced));
    assert!(s.daemon().votes_cast().is_empty());
    assert_eq!(s.store().vote_count().unwrap(), 0);
    assert!(!s.daemon().calls().contains(&"gobject list".to_string()));
}

#[tokio::test]
async fn held_lease_aborts_without_rpc() {
    let s = sentinel();
    let other = RunLease::acquire(s.store(), Timestamp::new(NOW - 10), 90).unwrap();

    let result = s.run_exclusive(&mut rng()).await;
    assert!(matches!(result, Err(AgentError::LeaseHeld)));
    assert!(s.daemon().calls().is_empty());

    drop(other);
    assert!(s.run_exclusive(&mut rng()).await.is_ok());
}

#[tokio::test]
async fn racing_submissions_settle_on_highest_hash() {
    let s = sentinel();
    s.daemon().add_object(proposal_envelope(
        hash(0x77),
        "fund-me",
        (NOW - 86_400, NOW + 30 * 86_400),
        ADDR,
        5,
        5,
    ));

    let report = completed(s.run_exclusive(&mut rng()).await.unwrap());
    let SuperblockOutcome::Submitted { object_hash: ours, .. } = report.superblock else {
        panic!("expected a submission, got {:?}", report.superblock);
    };
    let payload = s.daemon().submissions()[0].clone();

    // a second masternode published the same payload under another hash
    let mut duplicate = trigger_envelope(hash(0xfe), &superblock(0));
    duplicate.data_hex = payload;
    s.daemon().add_object(duplicate);

    let winner = ours.max(hash(0xfe));
    let loser = ours.min(hash(0xfe));

    let report = completed(s.run_exclusive(&mut rng()).await.unwrap());
    assert_eq!(
        report.superblock,
        SuperblockOutcome::RatifiedCandidate {
            height: NEXT_SUPERBLOCK,
            winner
        }
    );
    let votes = s.daemon().votes_cast();
    assert!(votes.contains(&(winner, VoteSignal::Funding, VoteOutcome::Yes)));
    assert!(votes.contains(&(loser, VoteSignal::Delete, VoteOutcome::Yes)));
    assert!(!votes.contains(&(loser, VoteSignal::Funding, VoteOutcome::Yes)));
    assert_eq!(s.daemon().submissions().len(), 1);

    let report = completed(s.run_exclusive(&mut rng()).await.unwrap());
    assert_eq!(
        report.superblock,
        SuperblockOutcome::RatifiedExisting {
            height: NEXT_SUPERBLOCK
        }
    );
}

#[tokio::test]
async fn failed_funding_vote_never_deletes_the_winner() {
    let s = sentinel();
    s.daemon().add_object(proposal_envelope(
        hash(0x77),
        "fund-me",
        (NOW - 86_400, NOW + 30 * 86_400),
        ADDR,
        5,
        5,
    ));

    let report = completed(s.run_exclusive(&mut rng()).await.unwrap());
    let SuperblockOutcome::Submitted { object_hash: ours, .. } = report.superblock else {
        panic!("expected a submission, got {:?}", report.superblock);
    };

    s.daemon()
        .queue_vote_response(VoteResult::Failed("transient".into()));
    let report = completed(s.run_exclusive(&mut rng()).await.unwrap());
    assert_eq!(
        report.superblock,
        SuperblockOutcome::RatificationPending {
            height: NEXT_SUPERBLOCK,
            winner: ours
        }
    );
    assert!(s.daemon().votes_cast().is_empty());
    assert_eq!(
        s.store().get_vote(&ours, VoteSignal::Delete, &agent()).unwrap(),
        None
    );

    let report = completed(s.run_exclusive(&mut rng()).await.unwrap());
    assert_eq!(
        report.superblock,
        SuperblockOutcome::RatifiedCandidate {
            height: NEXT_SUPERBLOCK,
            winner: ours
        }
    );
    assert_eq!(
        s.daemon().votes_cast(),
        vec![(ours, VoteSignal::Funding, VoteOutcome::Yes)]
    );
}

#[tokio::test]
async fn unelected_agent_waits_for_submitter() {
    let s = sentinel();
    s.daemon().add_object(proposal_envelope(
        hash(0x77),
        "fund-me",
        (NOW - 86_400, NOW + 30 * 86_400),
        ADDR,
        5,
        5,
    ));
    s.daemon().with_state(|st| {
        for b in 1..=20u8 {
            st.masternodes.push(sentinel_governance::MasternodeEntry::new(
                Outpoint::new(hash(b), 0),
                "ENABLED",
            ));
        }
    });

    let report = completed(s.run_exclusive(&mut rng()).await.unwrap());
    match report.superblock {
        SuperblockOutcome::Submitted { .. } => assert_eq!(s.daemon().submissions().len(), 1),
        SuperblockOutcome::AwaitingSubmitter { elected, .. } => {
            assert!(elected.is_some_and(|e| e != agent()));
            assert!(s.daemon().submissions().is_empty());
        }
        other => panic!("unexpected outcome {other:?}"),
    }
}

#[tokio::test]
async fn maturity_phase_blocks_arbitration() {
    let mut settings =
        RunSettings::from_config(&SentinelConfig::default(), NetworkId::Testnet, true);
    settings.max_start_delay_secs = 0;
    let s = Sentinel::new(
        NullDaemon::new(agent()),
        NullStore::new(),
        NullClock::new(NOW),
        settings,
    );
    s.daemon().with_state(|st| {
        st.governance.next_superblock = 2000;
    });

    let report = completed(s.run_exclusive(&mut rng()).await.unwrap());
    assert_eq!(
        report.superblock,
        SuperblockOutcome::AwaitingMaturity {
            height: 2000,
            current: 1000
        }
    );
}
