//! Circuit breaker guarding calls to the stats provider.
//!
//! A run issues one request per season plus one per matched game for betting
//! lines. When the provider is down every one of those would wait out the
//! client timeout, so after `failure_threshold` consecutive failures the
//! breaker opens and further calls fail fast with `ProviderError::CircuitOpen`
//! until `recovery_timeout` has passed.

use parking_lot::Mutex;
use std::time::{Duration, Instant};
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    /// Requests flow normally
    Closed,
    /// Requests are rejected without touching the network
    Open,
    /// Trial requests decide whether the provider is back
    HalfOpen,
}

#[derive(Debug, Clone)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures that open the circuit
    pub failure_threshold: u32,
    /// Time the circuit stays open before a trial request is let through
    pub recovery_timeout: Duration,
    /// Successful trial requests needed to close the circuit again
    pub success_threshold: u32,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            recovery_timeout: Duration::from_secs(30),
            success_threshold: 2,
        }
    }
}

/// Each phase carries only the counter it needs.
#[derive(Debug, Clone, Copy)]
enum Phase {
    Closed { failures: u32 },
    Open { since: Instant },
    HalfOpen { successes: u32 },
}

impl Phase {
    fn state(self) -> CircuitState {
        match self {
            Phase::Closed { .. } => CircuitState::Closed,
            Phase::Open { .. } => CircuitState::Open,
            Phase::HalfOpen { .. } => CircuitState::HalfOpen,
        }
    }
}

/// Consecutive-failure circuit breaker for the CFBD client.
pub struct CircuitBreaker {
    name: String,
    config: CircuitBreakerConfig,
    phase: Mutex<Phase>,
}

impl CircuitBreaker {
    pub fn new(name: &str, config: CircuitBreakerConfig) -> Self {
        Self {
            name: name.to_string(),
            config,
            phase: Mutex::new(Phase::Closed { failures: 0 }),
        }
    }

    /// Whether a request may be sent now. An open circuit whose recovery
    /// timeout has elapsed turns half-open and lets the request through.
    pub fn is_available(&self) -> bool {
        let mut phase = self.phase.lock();
        match *phase {
            Phase::Closed { .. } | Phase::HalfOpen { .. } => true,
            Phase::Open { since } if since.elapsed() >= self.config.recovery_timeout => {
                *phase = Phase::HalfOpen { successes: 0 };
                info!("Circuit breaker '{}' half-open; trying provider again", self.name);
                true
            }
            Phase::Open { .. } => false,
        }
    }

    pub fn record_success(&self) {
        let mut phase = self.phase.lock();
        *phase = match *phase {
            Phase::HalfOpen { successes } if successes + 1 < self.config.success_threshold => {
                Phase::HalfOpen {
                    successes: successes + 1,
                }
            }
            Phase::HalfOpen { successes } => {
                info!(
                    "Circuit breaker '{}' closed after {} successful requests",
                    self.name,
                    successes + 1
                );
                Phase::Closed { failures: 0 }
            }
            Phase::Closed { .. } | Phase::Open { .. } => Phase::Closed { failures: 0 },
        };
    }

    pub fn record_failure(&self) {
        let mut phase = self.phase.lock();
        *phase = match *phase {
            Phase::Closed { failures } if failures + 1 >= self.config.failure_threshold => {
                warn!(
                    "Circuit breaker '{}' OPENED after {} consecutive failures",
                    self.name,
                    failures + 1
                );
                Phase::Open { since: Instant::now() }
            }
            Phase::Closed { failures } => Phase::Closed {
                failures: failures + 1,
            },
            Phase::HalfOpen { .. } => {
                warn!("Circuit breaker '{}' re-opened; provider still failing", self.name);
                Phase::Open { since: Instant::now() }
            }
            open @ Phase::Open { .. } => open,
        };
    }

    pub fn state(&self) -> CircuitState {
        self.phase.lock().state()
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}
