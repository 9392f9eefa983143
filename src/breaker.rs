//! Circuit breaker guarding outbound engine calls.
//!
//! The breaker is a pure in-memory state machine. It never talks to the
//! transport: callers consult [`CircuitBreaker::before_call`] before issuing a
//! request and report the outcome with [`CircuitBreaker::record_success`] or
//! [`CircuitBreaker::record_failure`].
//!
//! ```text
//! closed --(threshold consecutive failures)--> open
//! open --(recovery timeout elapsed, next gate)--> half-open
//! half-open --(success)--> closed
//! half-open --(one failure)--> open
//! ```

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// Source of monotonic time for the breaker.
///
/// Production code uses [`SystemClock`]; tests inject a clock they can advance.
pub trait Clock: Send + Sync + 'static {
    /// Returns the current instant.
    fn now(&self) -> Instant;
}

/// Clock backed by [`Instant::now`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    fn now(&self) -> Instant {
        (**self).now()
    }
}

/// Type-erased clock used by [`Client`](crate::Client).
pub type SharedClock = Arc<dyn Clock>;

/// Configuration for circuit breaker behavior.
///
/// # Examples
///
/// ```
/// use camrest::breaker::CircuitBreakerConfig;
/// use std::time::Duration;
///
/// let config = CircuitBreakerConfig::default()
///     .with_failure_threshold(3)
///     .with_recovery_timeout(Duration::from_secs(10));
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CircuitBreakerConfig {
    /// Number of consecutive failures that opens the circuit. Must be at least 1.
    pub failure_threshold: u32,
    /// How long the circuit stays open before a trial call is allowed. Must be non-zero.
    ///
    /// (De)serialized as fractional seconds.
    #[serde(with = "serde_secs")]
    pub recovery_timeout: Duration,
}

mod serde_secs {
    use serde::{de::Error as _, Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_f64(duration.as_secs_f64())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(D::Error::custom)
    }
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            recovery_timeout: Duration::from_secs(30),
        }
    }
}

impl CircuitBreakerConfig {
    /// Sets the failure threshold.
    pub fn with_failure_threshold(mut self, threshold: u32) -> Self {
        self.failure_threshold = threshold;
        self
    }

    /// Sets the recovery timeout.
    pub fn with_recovery_timeout(mut self, timeout: Duration) -> Self {
        self.recovery_timeout = timeout;
        self
    }

    /// Checks the configured limits.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigurationError`] if the threshold is zero or the
    /// recovery timeout is zero.
    pub fn validate(&self) -> Result<()> {
        if self.failure_threshold < 1 {
            return Err(Error::ConfigurationError(
                "failure_threshold must be >= 1".to_string(),
            ));
        }
        if self.recovery_timeout.is_zero() {
            return Err(Error::ConfigurationError(
                "recovery_timeout must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Current state of the circuit breaker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CircuitState {
    /// Calls flow normally; consecutive failures are counted.
    Closed,
    /// Calls are rejected until the recovery timeout elapses.
    Open,
    /// One trial outcome decides between closing and reopening.
    HalfOpen,
}

impl fmt::Display for CircuitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CircuitState::Closed => "closed",
            CircuitState::Open => "open",
            CircuitState::HalfOpen => "half-open",
        };
        f.write_str(name)
    }
}

#[derive(Debug)]
struct BreakerState {
    state: CircuitState,
    // Only meaningful while closed.
    failure_count: u32,
    opened_at: Option<Instant>,
}

/// Three-state circuit breaker shared by every call made through one client.
///
/// All state lives behind a single mutex, so the read-then-write steps of
/// [`before_call`](Self::before_call), [`record_success`](Self::record_success)
/// and [`record_failure`](Self::record_failure) are atomic with respect to each
/// other and concurrent failures never lose a count.
///
/// # Examples
///
/// ```
/// use camrest::breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitState};
///
/// let breaker = CircuitBreaker::new(CircuitBreakerConfig::default().with_failure_threshold(2))?;
/// breaker.record_failure();
/// breaker.record_failure();
/// assert_eq!(breaker.state(), CircuitState::Open);
/// assert!(breaker.before_call().is_err());
/// # Ok::<(), camrest::Error>(())
/// ```
pub struct CircuitBreaker<C: Clock = SystemClock> {
    config: CircuitBreakerConfig,
    clock: C,
    inner: Mutex<BreakerState>,
}

impl CircuitBreaker<SystemClock> {
    /// Creates a breaker using the system clock.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration fails [`CircuitBreakerConfig::validate`].
    pub fn new(config: CircuitBreakerConfig) -> Result<Self> {
        Self::with_clock(config, SystemClock)
    }
}

impl<C: Clock> CircuitBreaker<C> {
    /// Creates a breaker reading time from `clock`.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration fails [`CircuitBreakerConfig::validate`].
    pub fn with_clock(config: CircuitBreakerConfig, clock: C) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            clock,
            inner: Mutex::new(BreakerState {
                state: CircuitState::Closed,
                failure_count: 0,
                opened_at: None,
            }),
        })
    }

    /// Returns the breaker configuration.
    pub fn config(&self) -> &CircuitBreakerConfig {
        &self.config
    }

    /// Returns the current state without advancing it.
    pub fn state(&self) -> CircuitState {
        self.lock().state
    }

    /// Returns the consecutive failure count recorded while closed.
    pub fn failure_count(&self) -> u32 {
        self.lock().failure_count
    }

    /// Gates an outbound call.
    ///
    /// Passes in `closed` and `half-open`. In `open`, passes and moves to
    /// `half-open` once the recovery timeout has elapsed since opening.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CircuitOpen`] carrying the remaining wait while the
    /// recovery window is still running. This rejection is not itself recorded.
    pub fn before_call(&self) -> Result<()> {
        let mut inner = self.lock();
        if inner.state != CircuitState::Open {
            return Ok(());
        }

        let now = self.clock.now();
        let elapsed = inner
            .opened_at
            .map(|opened| now.saturating_duration_since(opened))
            .unwrap_or(self.config.recovery_timeout);

        if elapsed >= self.config.recovery_timeout {
            inner.state = CircuitState::HalfOpen;
            tracing::info!(
                elapsed_ms = elapsed.as_millis(),
                "Circuit breaker half-open, allowing trial request"
            );
            return Ok(());
        }

        Err(Error::CircuitOpen {
            retry_after: self.config.recovery_timeout - elapsed,
        })
    }

    /// Records a successful outcome: resets the counter and closes the circuit.
    pub fn record_success(&self) {
        let mut inner = self.lock();
        if inner.state != CircuitState::Closed {
            tracing::info!(previous = %inner.state, "Circuit breaker closed");
        }
        inner.failure_count = 0;
        inner.state = CircuitState::Closed;
    }

    /// Records a failed outcome.
    ///
    /// In `half-open` a single failure reopens the circuit and restarts the
    /// recovery timer. Otherwise the failure counter grows and the circuit opens
    /// when it reaches the threshold.
    pub fn record_failure(&self) {
        let mut inner = self.lock();
        match inner.state {
            CircuitState::HalfOpen => {
                self.open(&mut inner);
                tracing::warn!("Circuit breaker reopened after failed trial request");
            }
            CircuitState::Closed | CircuitState::Open => {
                inner.failure_count = inner.failure_count.saturating_add(1);
                if inner.failure_count >= self.config.failure_threshold {
                    self.open(&mut inner);
                    tracing::warn!(
                        failures = inner.failure_count,
                        recovery_timeout_ms = self.config.recovery_timeout.as_millis(),
                        "Circuit breaker opened"
                    );
                }
            }
        }
    }

    fn open(&self, inner: &mut BreakerState) {
        inner.state = CircuitState::Open;
        inner.opened_at = Some(self.clock.now());
    }

    fn lock(&self) -> MutexGuard<'_, BreakerState> {
        // Every update leaves the state consistent, so a poisoned lock is still usable.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<C: Clock> fmt::Debug for CircuitBreaker<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.lock();
        f.debug_struct("CircuitBreaker")
            .field("config", &self.config)
            .field("state", &inner.state)
            .field("failure_count", &inner.failure_count)
            .finish()
    }
}
