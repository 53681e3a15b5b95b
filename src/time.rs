use std::{cell::Cell, collections::HashMap, time::Instant};

/// Source of the monotonic millisecond timestamps that drive clock gates.
/// Evaluation never reads the wall clock directly; every time value flows
/// through an implementation of this trait so tests can substitute fixed or
/// stepped time.
pub trait TimeProvider {
    fn now_ms(&self) -> f64;
}

/// Closures work directly as providers, which is the shape the embedding UI
/// usually supplies.
impl<F: Fn() -> f64> TimeProvider for F {
    fn now_ms(&self) -> f64 {
        self()
    }
}

/// Monotonic wall-clock time, measured from construction.
#[derive(Debug)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    #[must_use]
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeProvider for SystemClock {
    fn now_ms(&self) -> f64 {
        self.origin.elapsed().as_secs_f64() * 1000.0
    }
}

/// Always returns the same instant. The deterministic-test provider.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FixedTime(pub f64);

impl TimeProvider for FixedTime {
    fn now_ms(&self) -> f64 {
        self.0
    }
}

/// Advances by a fixed step on every read, for simulated-time ticks.
/// Interior mutability keeps the provider usable behind a shared reference;
/// evaluation is single-threaded by design.
#[derive(Debug)]
pub struct SteppedTime {
    next: Cell<f64>,
    step: f64,
}

impl SteppedTime {
    #[must_use]
    pub fn new(start_ms: f64, step_ms: f64) -> Self {
        Self {
            next: Cell::new(start_ms),
            step: step_ms,
        }
    }
}

impl TimeProvider for SteppedTime {
    fn now_ms(&self) -> f64 {
        let now = self.next.get();
        self.next.set(now + self.step);
        now
    }
}

/// Per-pass evaluation context. The caller owns its lifecycle, typically
/// rebuilding it once per animation frame or simulation tick.
#[derive(Clone, Debug, Default)]
pub struct EvaluationContext {
    /// Milliseconds, from the configured [`TimeProvider`].
    pub current_time: f64,
    /// Scratch space for cross-call, non-per-gate data. The engine itself
    /// stores nothing here.
    pub memory: HashMap<String, serde_json::Value>,
}

impl EvaluationContext {
    #[must_use]
    pub fn at(current_time: f64) -> Self {
        Self {
            current_time,
            memory: HashMap::new(),
        }
    }

    #[must_use]
    pub fn from_provider(provider: &impl TimeProvider) -> Self {
        Self::at(provider.now_ms())
    }
}
