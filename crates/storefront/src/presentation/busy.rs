//! Busy affordance for quantity controls.
//!
//! Pressing increase/decrease shows a spinner and disables the control for
//! a fixed time. The store call runs immediately; the hold only keeps the
//! control disabled, so a second press of the same control during the hold
//! is rejected rather than queued.

use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

/// Default hold, matching the storefront's spinner.
pub const DEFAULT_HOLD: Duration = Duration::from_millis(300);

/// Set of controls currently held busy.
#[derive(Debug)]
pub struct BusyControls {
    active: Mutex<HashSet<String>>,
    hold: Duration,
}

impl Default for BusyControls {
    fn default() -> Self {
        Self::new(DEFAULT_HOLD)
    }
}

impl BusyControls {
    #[must_use]
    pub fn new(hold: Duration) -> Self {
        Self {
            active: Mutex::new(HashSet::new()),
            hold,
        }
    }

    #[must_use]
    pub const fn hold(&self) -> Duration {
        self.hold
    }

    #[must_use]
    pub fn is_busy(&self, control: &str) -> bool {
        self.active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(control)
    }

    /// Mark `control` busy until the returned token is dropped. Returns
    /// `None` if it is already busy.
    pub fn try_acquire(&self, control: &str) -> Option<BusyToken<'_>> {
        let inserted = self
            .active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(control.to_owned());

        inserted.then(|| BusyToken {
            controls: self,
            control: control.to_owned(),
        })
    }

    /// Run `action` under the affordance for `control`.
    ///
    /// `action` runs at once; the control then stays busy for the hold
    /// duration. Returns `None`, without running `action`, if the control is
    /// already busy.
    pub async fn run<R>(&self, control: &str, action: impl FnOnce() -> R) -> Option<R> {
        let Some(token) = self.try_acquire(control) else {
            tracing::debug!(control, "Control busy, press ignored");
            return None;
        };

        let result = action();
        tokio::time::sleep(self.hold).await;
        drop(token);
        Some(result)
    }
}

/// Guard keeping one control busy.
#[derive(Debug)]
pub struct BusyToken<'a> {
    controls: &'a BusyControls,
    control: String,
}

impl Drop for BusyToken<'_> {
    fn drop(&mut self) {
        self.controls
            .active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.control);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[test]
    fn test_token_releases_on_drop() {
        let controls = BusyControls::default();
        let token = controls.try_acquire("increase:pump-1");

        assert!(token.is_some());
        assert!(controls.is_busy("increase:pump-1"));
        assert!(controls.try_acquire("increase:pump-1").is_none());

        drop(token);
        assert!(!controls.is_busy("increase:pump-1"));
    }

    #[test]
    fn test_controls_are_independent() {
        let controls = BusyControls::default();
        let _inc = controls.try_acquire("increase:pump-1");

        assert!(controls.try_acquire("decrease:pump-1").is_some());
        assert!(controls.try_acquire("increase:pump-2").is_some());
    }

    #[tokio::test]
    async fn test_second_press_rejected_while_busy() {
        let controls = BusyControls::new(Duration::from_millis(50));
        let runs = AtomicUsize::new(0);

        let (first, second) = tokio::join!(
            controls.run("increase:pump-1", || runs.fetch_add(1, Ordering::SeqCst)),
            controls.run("increase:pump-1", || runs.fetch_add(1, Ordering::SeqCst)),
        );

        assert_eq!(first, Some(0));
        assert_eq!(second, None);
        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert!(!controls.is_busy("increase:pump-1"));
    }

    #[tokio::test]
    async fn test_press_accepted_after_hold() {
        let controls = BusyControls::new(Duration::from_millis(10));

        assert_eq!(controls.run("decrease:pump-1", || 1).await, Some(1));
        assert_eq!(controls.run("decrease:pump-1", || 2).await, Some(2));
    }

    #[tokio::test]
    async fn test_action_runs_before_hold_elapses() {
        let controls = BusyControls::new(Duration::from_millis(50));
        let runs = AtomicUsize::new(0);

        let press = controls.run("increase:pump-1", || runs.fetch_add(1, Ordering::SeqCst));
        tokio::pin!(press);

        // Poll once: the action has run even though the hold is still pending.
        assert!(poll_once(press.as_mut()).await.is_none());
        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert!(controls.is_busy("increase:pump-1"));

        assert_eq!(press.await, Some(0));
    }

    /// Poll a future exactly once, returning its output if it completed.
    async fn poll_once<F: std::future::Future + Unpin>(fut: F) -> Option<F::Output> {
        let mut fut = fut;
        std::future::poll_fn(|cx| {
            std::task::Poll::Ready(match std::pin::Pin::new(&mut fut).poll(cx) {
                std::task::Poll::Ready(out) => Some(out),
                std::task::Poll::Pending => None,
            })
        })
        .await
    }
}
