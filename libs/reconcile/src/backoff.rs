//! Retry backoff.
//!
//! A [`Backoff`] hands out successive wait durations. [`BackoffManager`]
//! owns one and rebuilds it from its factory on reset, so a loop can go
//! back to the fastest retry cadence after a success.

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// A steppable source of retry delays.
pub trait Backoff: Send {
    /// Return the next wait duration and advance.
    fn step(&mut self) -> Duration;
}

/// Builds a fresh backoff in its initial state.
pub type BackoffFactory = Arc<dyn Fn() -> Box<dyn Backoff> + Send + Sync>;

// =============================================================================
// Exponential Backoff
// =============================================================================

/// Capped exponential backoff.
///
/// Each step returns the current duration, then multiplies it by `factor`
/// while `steps` remain. Reaching `cap` ends growth early. Once the steps
/// are used up the last duration repeats. A factor of 1 or less never
/// grows the duration, so the sequence is always non-decreasing.
#[derive(Debug, Clone)]
pub struct ExponentialBackoff {
    /// Duration returned by the next step.
    pub duration: Duration,

    /// Growth factor applied after each step.
    pub factor: f64,

    /// Jitter factor (0.0 disables). Adds up to `jitter * duration`.
    pub jitter: f64,

    /// Remaining growth steps.
    pub steps: u32,

    /// Maximum duration.
    pub cap: Duration,
}

impl Default for ExponentialBackoff {
    fn default() -> Self {
        Self {
            duration: Duration::from_millis(50),
            factor: 10.0,
            jitter: 0.0,
            steps: 3,
            cap: Duration::from_secs(5),
        }
    }
}

impl ExponentialBackoff {
    /// Wrap this configuration in a factory that clones it on every reset.
    pub fn factory(self) -> BackoffFactory {
        Arc::new(move || Box::new(self.clone()) as Box<dyn Backoff>)
    }
}

impl Backoff for ExponentialBackoff {
    fn step(&mut self) -> Duration {
        if self.steps == 0 {
            return with_jitter(self.duration, self.jitter, self.cap);
        }
        self.steps -= 1;

        let current = self.duration;
        if self.factor > 1.0 {
            let next_nanos = current.as_nanos() as f64 * self.factor;
            if next_nanos > self.cap.as_nanos() as f64 {
                self.duration = self.cap;
                self.steps = 0;
            } else {
                self.duration = Duration::from_nanos(next_nanos.round() as u64);
            }
        }

        with_jitter(current, self.jitter, self.cap)
    }
}

/// Add up to `jitter * duration`, never going past `cap` (or `duration`
/// itself when that is already above the cap).
fn with_jitter(duration: Duration, jitter: f64, cap: Duration) -> Duration {
    if jitter <= 0.0 {
        return duration;
    }
    let extra = duration.as_secs_f64() * jitter * rand::random::<f64>();
    let extra = Duration::try_from_secs_f64(extra).unwrap_or(Duration::MAX);
    duration.saturating_add(extra).min(cap.max(duration))
}

// =============================================================================
// Sequence Backoff
// =============================================================================

/// Replays a fixed list of durations, repeating the last one.
///
/// Useful for deterministic tests of retry scheduling.
#[derive(Debug, Clone)]
pub struct SequenceBackoff {
    remaining: VecDeque<Duration>,
    last: Duration,
}

impl SequenceBackoff {
    /// Create a backoff that yields `durations` in order.
    pub fn new(durations: impl IntoIterator<Item = Duration>) -> Self {
        Self {
            remaining: durations.into_iter().collect(),
            last: Duration::ZERO,
        }
    }

    /// Factory producing a fresh copy of this sequence on every reset.
    pub fn factory(self) -> BackoffFactory {
        Arc::new(move || Box::new(self.clone()) as Box<dyn Backoff>)
    }
}

impl Backoff for SequenceBackoff {
    fn step(&mut self) -> Duration {
        if let Some(next) = self.remaining.pop_front() {
            self.last = next;
        }
        self.last
    }
}

// =============================================================================
// Backoff Manager
// =============================================================================

/// Owns a backoff and the factory used to rebuild it.
pub struct BackoffManager {
    current: Box<dyn Backoff>,
    factory: BackoffFactory,
}

impl BackoffManager {
    /// Create a manager whose backoff starts in the factory's initial state.
    pub fn new(factory: BackoffFactory) -> Self {
        Self {
            current: factory(),
            factory,
        }
    }

    /// Next wait duration.
    pub fn step(&mut self) -> Duration {
        self.current.step()
    }

    /// Restore the backoff to its initial state.
    pub fn reset(&mut self) {
        self.current = (self.factory)();
    }
}

impl Default for BackoffManager {
    fn default() -> Self {
        Self::new(ExponentialBackoff::default().factory())
    }
}

impl fmt::Debug for BackoffManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackoffManager").finish_non_exhaustive()
    }
}
