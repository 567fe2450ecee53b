//! Randomized run scheduling.
//!
//! Cron starts the sentinel every minute. The scheduler turns that into one
//! pass every 1..=`max_interval` seconds, and a random start delay keeps
//! masternodes triggered by the same cron minute from hitting the network
//! together.

use std::time::Duration;

use rand::Rng;
use tracing::debug;

use sentinel_store::MetaStore;
use sentinel_types::Timestamp;
use sentinel_utils::format_duration;

use crate::lease::{delete_transient, get_transient, set_transient};
use crate::AgentError;

/// Transient flag holding the next eligible run time.
pub const SCHEDULE_NAME: &str = "NEXT_SENTINEL_CHECK_AT";

pub struct Scheduler<'a, S: MetaStore + ?Sized> {
    store: &'a S,
    max_interval_secs: u64,
    max_start_delay_secs: u64,
}

impl<'a, S: MetaStore + ?Sized> Scheduler<'a, S> {
    pub fn new(store: &'a S, max_interval_secs: u64, max_start_delay_secs: u64) -> Self {
        Self {
            store,
            max_interval_secs: max_interval_secs.max(1),
            max_start_delay_secs,
        }
    }

    /// Whether a pass is due. Nothing scheduled means due.
    pub fn is_run_time(&self, now: Timestamp) -> Result<bool, AgentError> {
        Ok(match get_transient(self.store, SCHEDULE_NAME, now)? {
            Some(flag) => now.as_secs() >= flag.value,
            None => true,
        })
    }

    pub fn clear_schedule(&self) -> Result<(), AgentError> {
        delete_transient(self.store, SCHEDULE_NAME)
    }

    pub fn next_run_at(&self, now: Timestamp) -> Result<Option<Timestamp>, AgentError> {
        Ok(get_transient(self.store, SCHEDULE_NAME, now)?.map(|f| Timestamp::new(f.value)))
    }

    /// Schedule the next pass `1..=max_interval` seconds from `now`.
    pub fn schedule_next_run<R: Rng + ?Sized>(
        &self,
        now: Timestamp,
        rng: &mut R,
    ) -> Result<Timestamp, AgentError> {
        let gap = rng.gen_range(1..=self.max_interval_secs);
        let next = now.saturating_add(gap);
        // kept alive past the run time so a late cron tick still sees it
        set_transient(
            self.store,
            SCHEDULE_NAME,
            next.as_secs(),
            now,
            gap + self.max_interval_secs,
        )?;
        debug!(next = %next, wait = %format_duration(gap), "next run scheduled");
        Ok(next)
    }

    pub fn start_delay<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        Duration::from_secs(rng.gen_range(0..=self.max_start_delay_secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use sentinel_nullables::NullStore;

    #[test]
    fn due_when_nothing_scheduled() {
        let store = NullStore::new();
        let scheduler = Scheduler::new(&store, 1200, 60);
        assert!(scheduler.is_run_time(Timestamp::new(5)).unwrap());
    }

    #[test]
    fn not_due_until_scheduled_time() {
        let store = NullStore::new();
        let scheduler = Scheduler::new(&store, 1200, 60);
        let mut rng = StdRng::seed_from_u64(7);
        let now = Timestamp::new(10_000);
        let next = scheduler.schedule_next_run(now, &mut rng).unwrap();
        assert!(next > now && next <= now.saturating_add(1200));
        assert!(!scheduler.is_run_time(now).unwrap());
        assert!(!scheduler.is_run_time(Timestamp::new(next.as_secs() - 1)).unwrap());
        assert!(scheduler.is_run_time(next).unwrap());
        assert_eq!(scheduler.next_run_at(now).unwrap(), Some(next));
    }

    #[test]
    fn clear_makes_it_due() {
        let store = NullStore::new();
        let scheduler = Scheduler::new(&store, 1200, 60);
        let mut rng = StdRng::seed_from_u64(1);
        scheduler
            .schedule_next_run(Timestamp::new(100), &mut rng)
            .unwrap();
        scheduler.clear_schedule().unwrap();
        assert!(scheduler.is_run_time(Timestamp::new(100)).unwrap());
    }

    #[test]
    fn delays_stay_in_range() {
        let store = NullStore::new();
        let scheduler = Scheduler::new(&store, 1200, 60);
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..100 {
            assert!(scheduler.start_delay(&mut rng) <= Duration::from_secs(60));
        }
        let no_delay = Scheduler::new(&store, 1200, 0);
        assert_eq!(no_delay.start_delay(&mut rng), Duration::ZERO);
    }
}
