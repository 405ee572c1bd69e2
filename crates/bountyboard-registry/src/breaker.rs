use std::time::{Duration, Instant};

const MAX_RECOVERY: Duration = Duration::from_secs(600);

/// State of the registry-fetch circuit breaker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakerState {
    /// Normal operation, fetches go through.
    Closed,
    /// Fetches are short-circuited until the recovery timeout elapses.
    Open,
    /// A single probe fetch is allowed to demonstrate recovery.
    HalfOpen,
}

/// Circuit breaker guarding the external registry fetch.
///
/// Trips after a run of consecutive failures; the recovery timeout
/// doubles on every re-trip, capped at ten minutes.
#[derive(Debug)]
pub struct CircuitBreaker {
    state: BreakerState,
    failure_count: u32,
    threshold: u32,
    recovery_timeout: Duration,
    current_timeout: Duration,
    last_failure_at: Option<Instant>,
}

impl CircuitBreaker {
    pub fn new(threshold: u32, recovery_timeout: Duration) -> Self {
        Self {
            state: BreakerState::Closed,
            failure_count: 0,
            threshold,
            recovery_timeout,
            current_timeout: recovery_timeout,
            last_failure_at: None,
        }
    }

    pub fn state(&self) -> BreakerState {
        self.state
    }

    /// Check whether a fetch is allowed through, moving Open to HalfOpen
    /// once the recovery timeout has elapsed.
    pub fn can_execute(&mut self) -> bool {
        match self.state {
            BreakerState::Closed | BreakerState::HalfOpen => true,
            BreakerState::Open => {
                let elapsed = self
                    .last_failure_at
                    .map(|at| at.elapsed())
                    .unwrap_or_default();
                if elapsed >= self.current_timeout {
                    self.state = BreakerState::HalfOpen;
                    tracing::info!("registry circuit breaker half-open, allowing probe");
                    true
                } else {
                    false
                }
            }
        }
    }

    pub fn record_success(&mut self) {
        if self.state != BreakerState::Closed {
            tracing::info!("registry circuit breaker recovered");
        }
        self.state = BreakerState::Closed;
        self.failure_count = 0;
        self.current_timeout = self.recovery_timeout;
        self.last_failure_at = None;
    }

    pub fn record_failure(&mut self) {
        self.failure_count += 1;
        self.last_failure_at = Some(Instant::now());
        if self.failure_count >= self.threshold {
            if self.state == BreakerState::Open {
                self.current_timeout = (self.current_timeout * 2).min(MAX_RECOVERY);
            }
            self.state = BreakerState::Open;
            tracing::warn!(
                failures = self.failure_count,
                recovery_secs = self.current_timeout.as_secs(),
                "registry circuit breaker open"
            );
        }
    }
}
