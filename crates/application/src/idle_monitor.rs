//! Idle timeout monitor.
//!
//! A single-timer state machine: `Disabled` or `Armed { deadline }`. Every
//! activity event and every enable transition re-arms the deadline; a
//! disable transition invalidates any pending timer via the generation
//! counter so a stale callback never fires after sign-out. There is exactly
//! one valid timer at a time.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Idle window after which the session is forced out.
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(5 * 60);

/// Callback invoked when the idle deadline elapses.
///
/// Expected to notify the user and sign the session out; the monitor has
/// already disabled itself by the time this runs.
#[async_trait]
pub trait IdleTimeoutHandler: Send + Sync {
    /// Invoked exactly once per elapsed deadline.
    async fn on_idle_timeout(&self);
}

enum MonitorState {
    Disabled,
    Armed { deadline: Instant },
}

struct MonitorInner {
    state: MonitorState,
    /// Bumped on every transition; a sleeping timer task only fires when
    /// its generation is still current.
    generation: u64,
}

/// Watches for user inactivity while a session is fully established.
pub struct IdleMonitor {
    timeout: Duration,
    handler: Arc<dyn IdleTimeoutHandler>,
    inner: Arc<Mutex<MonitorInner>>,
}

impl IdleMonitor {
    /// Creates a disabled monitor with the given idle window.
    #[must_use]
    pub fn new(timeout: Duration, handler: Arc<dyn IdleTimeoutHandler>) -> Self {
        Self {
            timeout,
            handler,
            inner: Arc::new(Mutex::new(MonitorInner {
                state: MonitorState::Disabled,
                generation: 0,
            })),
        }
    }

    /// Enables or disables the monitor.
    ///
    /// Callers sync this from the session-ready condition: an identity
    /// exists and any step-up requirement is satisfied. Enabling an
    /// already-armed monitor leaves its deadline untouched.
    pub async fn set_enabled(&self, enabled: bool) {
        if enabled {
            self.enable().await;
        } else {
            self.disable().await;
        }
    }

    /// Arms the deadline if the monitor is currently disabled.
    pub async fn enable(&self) {
        let mut inner = self.inner.lock().await;
        if matches!(inner.state, MonitorState::Disabled) {
            self.arm(&mut inner);
        }
    }

    /// Disables the monitor and invalidates any pending deadline.
    pub async fn disable(&self) {
        let mut inner = self.inner.lock().await;
        inner.generation = inner.generation.wrapping_add(1);
        inner.state = MonitorState::Disabled;
    }

    /// Records user activity, pushing the deadline out by the full window.
    ///
    /// Ignored while disabled: activity from a signed-out or pending-MFA
    /// client must not arm the timer.
    pub async fn record_activity(&self) {
        let mut inner = self.inner.lock().await;
        if matches!(inner.state, MonitorState::Armed { .. }) {
            self.arm(&mut inner);
        }
    }

    /// Returns whether a deadline is currently armed.
    pub async fn is_armed(&self) -> bool {
        matches!(self.inner.lock().await.state, MonitorState::Armed { .. })
    }

    /// Cancel-and-replace: bumps the generation, stores the new deadline,
    /// and spawns the matching timer task.
    fn arm(&self, inner: &mut MonitorInner) {
        inner.generation = inner.generation.wrapping_add(1);
        let generation = inner.generation;
        let deadline = Instant::now() + self.timeout;
        inner.state = MonitorState::Armed { deadline };

        let shared = Arc::clone(&self.inner);
        let handler = Arc::clone(&self.handler);
        tokio::spawn(async move {
            tokio::time::sleep_until(deadline).await;

            let fire = {
                let mut inner = shared.lock().await;
                let current = inner.generation == generation
                    && matches!(inner.state, MonitorState::Armed { .. });
                if current {
                    inner.state = MonitorState::Disabled;
                }
                current
            };

            if fire {
                handler.on_idle_timeout().await;
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;

    use super::{IdleMonitor, IdleTimeoutHandler};

    const WINDOW: Duration = Duration::from_secs(300);

    #[derive(Default)]
    struct CountingHandler {
        fired: AtomicUsize,
    }

    #[async_trait]
    impl IdleTimeoutHandler for CountingHandler {
        async fn on_idle_timeout(&self) {
            self.fired.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn monitor() -> (IdleMonitor, Arc<CountingHandler>) {
        let handler = Arc::new(CountingHandler::default());
        (IdleMonitor::new(WINDOW, handler.clone()), handler)
    }

    /// Gives spawned timer tasks a chance to run after a time jump.
    async fn settle() {
        for _ in 0..8 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_fires_exactly_once() {
        let (monitor, handler) = monitor();
        monitor.enable().await;

        tokio::time::advance(WINDOW + Duration::from_secs(1)).await;
        settle().await;

        assert_eq!(handler.fired.load(Ordering::SeqCst), 1);
        assert!(!monitor.is_armed().await);

        // Monitor disabled itself; more idle time must not fire again.
        tokio::time::advance(WINDOW * 2).await;
        settle().await;
        assert_eq!(handler.fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn activity_resets_the_deadline() {
        let (monitor, handler) = monitor();
        monitor.enable().await;

        tokio::time::advance(Duration::from_secs(240)).await;
        monitor.record_activity().await;

        // Past the original deadline but within the refreshed window.
        tokio::time::advance(Duration::from_secs(120)).await;
        settle().await;
        assert_eq!(handler.fired.load(Ordering::SeqCst), 0);

        tokio::time::advance(WINDOW).await;
        settle().await;
        assert_eq!(handler.fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn disable_cancels_a_pending_deadline() {
        let (monitor, handler) = monitor();
        monitor.enable().await;

        tokio::time::advance(Duration::from_secs(60)).await;
        monitor.disable().await;

        tokio::time::advance(WINDOW * 4).await;
        settle().await;

        assert_eq!(handler.fired.load(Ordering::SeqCst), 0);
        assert!(!monitor.is_armed().await);
    }

    #[tokio::test(start_paused = true)]
    async fn activity_while_disabled_does_not_arm() {
        let (monitor, handler) = monitor();

        monitor.record_activity().await;
        assert!(!monitor.is_armed().await);

        tokio::time::advance(WINDOW * 2).await;
        settle().await;
        assert_eq!(handler.fired.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn enable_is_idempotent_while_armed() {
        let (monitor, handler) = monitor();
        monitor.enable().await;

        tokio::time::advance(Duration::from_secs(200)).await;
        // A second enable must not push the deadline out.
        monitor.enable().await;

        tokio::time::advance(Duration::from_secs(101)).await;
        settle().await;
        assert_eq!(handler.fired.load(Ordering::SeqCst), 1);
    }
}
