use parking_lot::Mutex;
use std::time::{Duration, Instant};
use tracing::warn;

#[derive(Debug)]
enum State {
    Closed,
    Open { since: Instant },
}

#[derive(Debug)]
struct Inner {
    consecutive_failures: u32,
    state: State,
}

/// Consecutive-failure circuit breaker.
///
/// Opens after `threshold` failures in a row; while open, callers skip the
/// protected operation except for a single probe once `cooldown` has
/// elapsed. Any success closes the circuit.
#[derive(Debug)]
pub struct CircuitBreaker {
    name: &'static str,
    threshold: u32,
    cooldown: Duration,
    inner: Mutex<Inner>,
}

impl CircuitBreaker {
    pub fn new(name: &'static str, threshold: u32, cooldown: Duration) -> Self {
        Self {
            name,
            threshold,
            cooldown,
            inner: Mutex::new(Inner {
                consecutive_failures: 0,
                state: State::Closed,
            }),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_open(&self) -> bool {
        matches!(self.inner.lock().state, State::Open { .. })
    }

    /// Record a failure. Returns true if this failure tripped the circuit open.
    pub fn record_failure(&self) -> bool {
        let mut inner = self.inner.lock();
        inner.consecutive_failures = inner.consecutive_failures.saturating_add(1);

        if matches!(inner.state, State::Closed) && inner.consecutive_failures >= self.threshold {
            inner.state = State::Open {
                since: Instant::now(),
            };
            warn!(
                circuit = self.name,
                failures = inner.consecutive_failures,
                "circuit breaker opened"
            );
            return true;
        }
        false
    }

    /// Record a success. Returns true if this success closed an open circuit.
    pub fn record_success(&self) -> bool {
        let mut inner = self.inner.lock();
        inner.consecutive_failures = 0;

        if matches!(inner.state, State::Open { .. }) {
            inner.state = State::Closed;
            warn!(circuit = self.name, "circuit breaker closed");
            return true;
        }
        false
    }

    /// While open, true once per cooldown period to allow a recovery probe.
    pub fn probe_allowed(&self) -> bool {
        let mut inner = self.inner.lock();
        match inner.state {
            State::Closed => true,
            State::Open { since } if since.elapsed() >= self.cooldown => {
                // Restart the cooldown so concurrent callers do not all probe.
                inner.state = State::Open {
                    since: Instant::now(),
                };
                true
            }
            State::Open { .. } => false,
        }
    }
}
