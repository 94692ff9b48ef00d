//! Wall-clock alignment of rounds.
//!
//! Round `r` begins at `r * PHASES_PER_ROUND * interval` after the Unix Epoch. Nodes that agree on
//! the interval and whose clocks roughly agree therefore run the same round at the same time, and
//! number it the same way.

use std::time::{Duration, Instant, SystemTime};

use crate::types::data_types::{RoundNumber, Timestamp};

use super::phase::PHASES_PER_ROUND;

#[derive(Clone, Copy, Debug)]
pub struct RoundSchedule {
    interval: Duration,
}

impl RoundSchedule {
    /// `interval` is the time between two consecutive phase timer fires.
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    pub fn phase_interval(&self) -> Duration {
        self.interval
    }

    pub fn round_length(&self) -> Duration {
        self.interval * PHASES_PER_ROUND
    }

    /// When `round` begins.
    pub fn round_start(&self, round: RoundNumber) -> Timestamp {
        let round_ms = self.round_length_ms();
        Timestamp::new(round.int().saturating_mul(round_ms))
    }

    /// The first round that begins strictly after `now`.
    pub fn next_round_after(&self, now: Timestamp) -> RoundNumber {
        RoundNumber::new(now.millis() / self.round_length_ms() + 1)
    }

    /// The instant on the local monotonic clock that corresponds to wall-clock `timestamp`. Times
    /// in the past map to now.
    pub fn instant_of(&self, timestamp: Timestamp) -> Instant {
        let wait = timestamp
            .to_system_time()
            .duration_since(SystemTime::now())
            .unwrap_or(Duration::ZERO);
        Instant::now() + wait
    }

    fn round_length_ms(&self) -> u64 {
        (self.round_length().as_millis() as u64).max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounds_are_aligned_to_the_epoch() {
        let schedule = RoundSchedule::new(Duration::from_millis(250));
        assert_eq!(schedule.round_length(), Duration::from_secs(1));

        let round = schedule.next_round_after(Timestamp::new(10_400));
        assert_eq!(round, RoundNumber::new(11));
        assert_eq!(schedule.round_start(round), Timestamp::new(11_000));

        // A node woken exactly on a boundary waits for the following one.
        let round = schedule.next_round_after(Timestamp::new(11_000));
        assert_eq!(round, RoundNumber::new(12));
    }
}
