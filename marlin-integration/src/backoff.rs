use std::time::{Duration, Instant};

const EARLY_CAP: Duration = Duration::from_secs(15);
const EARLY_PHASE: Duration = Duration::from_secs(60);
const LATE_DELAY: Duration = Duration::from_secs(30);

/// Reconnect schedule for upstream connections.
///
/// Doubles from 1s and caps at 15s while the outage is younger than 60s,
/// then settles on a flat 30s until the connection recovers.
#[derive(Debug, Default)]
pub struct ReconnectBackoff {
    attempt: u32,
    outage_start: Option<Instant>,
}

impl ReconnectBackoff {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay to wait before the next reconnect attempt.
    pub fn next_delay(&mut self) -> Duration {
        let start = *self.outage_start.get_or_insert_with(Instant::now);
        let delay = delay_for(self.attempt, start.elapsed());
        self.attempt = self.attempt.saturating_add(1);
        delay
    }

    /// Clear outage tracking after a successful reconnect.
    pub fn reset(&mut self) {
        self.attempt = 0;
        self.outage_start = None;
    }
}

/// Pure schedule: attempt number and outage age to delay.
pub fn delay_for(attempt: u32, outage_age: Duration) -> Duration {
    if outage_age >= EARLY_PHASE {
        return LATE_DELAY;
    }
    let exponential = Duration::from_secs(1u64 << attempt.min(4));
    exponential.min(EARLY_CAP)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_early_phase_doubles_and_caps() {
        let age = Duration::from_secs(5);
        assert_eq!(delay_for(0, age), Duration::from_secs(1));
        assert_eq!(delay_for(1, age), Duration::from_secs(2));
        assert_eq!(delay_for(2, age), Duration::from_secs(4));
        assert_eq!(delay_for(3, age), Duration::from_secs(8));
        assert_eq!(delay_for(4, age), Duration::from_secs(15));
        assert_eq!(delay_for(9, age), Duration::from_secs(15));
    }

    #[test]
    fn test_late_phase_is_flat() {
        assert_eq!(delay_for(0, Duration::from_secs(60)), Duration::from_secs(30));
        assert_eq!(delay_for(7, Duration::from_secs(300)), Duration::from_secs(30));
    }

    #[test]
    fn test_reset_restarts_the_schedule() {
        let mut backoff = ReconnectBackoff::new();
        assert_eq!(backoff.next_delay(), Duration::from_secs(1));
        assert_eq!(backoff.next_delay(), Duration::from_secs(2));
        backoff.reset();
        assert_eq!(backoff.next_delay(), Duration::from_secs(1));
    }
}
