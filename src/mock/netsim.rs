use std::thread;
use std::time::Duration;

/// Routine mocking waits this long before fulfilling, so UI code sees
/// realistic async timing without real network I/O.
pub const DEFAULT_DELAY: Duration = Duration::from_millis(100);

/// Injectable latency and transport-failure behavior, composable with any
/// router branch: slow success, instant failure, slow failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkProfile {
    delay: Duration,
    fail: bool,
}

impl Default for NetworkProfile {
    fn default() -> Self {
        Self {
            delay: DEFAULT_DELAY,
            fail: false,
        }
    }
}

impl NetworkProfile {
    /// No delay at all. Keeps store/router unit tests fast.
    pub fn instant() -> Self {
        Self {
            delay: Duration::ZERO,
            fail: false,
        }
    }

    pub fn slow(delay: Duration) -> Self {
        Self { delay, fail: false }
    }

    /// Aborts at the transport level: no status code, no body.
    pub fn failing() -> Self {
        Self {
            delay: Duration::ZERO,
            fail: true,
        }
    }

    pub fn slow_failing(delay: Duration) -> Self {
        Self { delay, fail: true }
    }

    /// Suspends for the configured latency. Called once per intercepted
    /// request, before any routing decision.
    pub fn wait(&self) {
        if !self.delay.is_zero() {
            thread::sleep(self.delay);
        }
    }

    pub fn should_fail(&self) -> bool {
        self.fail
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }
}
