// Mimic Engine — Startup gate
//
// The engine stays dormant until the brain reports ready or the init timeout
// elapses, whichever comes first. Activation happens exactly once: whichever
// trigger fires second (a late ready signal, a timeout racing a signal, a
// second `run`) is a no-op.

use crate::engine::brain::ReadySignal;
use log::{info, warn};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::OnceLock;
use std::time::Duration;
use tokio::sync::Notify;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    StoreReady,
    TimedOut,
}

#[derive(Default)]
pub struct StartupGate {
    active: AtomicBool,
    reason: OnceLock<Activation>,
    ignored: AtomicU32,
    notify: Notify,
}

impl StartupGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Why the gate opened, once it has.
    pub fn activation(&self) -> Option<Activation> {
        self.reason.get().copied()
    }

    /// Triggers that arrived after activation.
    pub fn ignored_triggers(&self) -> u32 {
        self.ignored.load(Ordering::Relaxed)
    }

    /// Open the gate. Returns true only for the trigger that actually opened it.
    pub fn fire(&self, reason: Activation) -> bool {
        if self.active.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire).is_err() {
            self.ignored.fetch_add(1, Ordering::Relaxed);
            info!("[gate] Ignoring {:?}: engine already active", reason);
            return false;
        }
        let _ = self.reason.set(reason);
        match reason {
            Activation::StoreReady => info!("[gate] Brain ready, engine active"),
            Activation::TimedOut => warn!("[gate] Brain not ready in time, engine active with a cold cache"),
        }
        self.notify.notify_waiters();
        true
    }

    /// Wait for `ready` or `timeout`, fire the gate, and report how it opened.
    /// When the timeout wins, a later ready signal is absorbed by `fire`.
    pub async fn run(&self, ready: ReadySignal, timeout: Duration) -> Activation {
        tokio::select! {
            _ = ready.wait() => { self.fire(Activation::StoreReady); }
            _ = tokio::time::sleep(timeout) => { self.fire(Activation::TimedOut); }
        }
        self.activation().unwrap_or(Activation::TimedOut)
    }

    /// Resolves once the gate is open.
    pub async fn wait_active(&self) {
        loop {
            let notified = self.notify.notified();
            if self.is_active() {
                return;
            }
            notified.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_ready_signal_opens_gate() {
        let gate = StartupGate::new();
        assert!(!gate.is_active());
        let how = gate.run(ReadySignal::ready(), Duration::from_secs(5)).await;
        assert_eq!(how, Activation::StoreReady);
        assert!(gate.is_active());
    }

    #[tokio::test]
    async fn test_timeout_then_late_signal_activates_once() {
        let gate = StartupGate::new();
        let (tx, signal) = ReadySignal::pair();

        let how = gate.run(signal, Duration::from_millis(10)).await;
        assert_eq!(how, Activation::TimedOut);

        // The receiver went away with `run`; the late signal is raised by hand.
        let _ = tx.send(true);
        assert!(!gate.fire(Activation::StoreReady));
        assert_eq!(gate.activation(), Some(Activation::TimedOut));
        assert_eq!(gate.ignored_triggers(), 1);
    }

    #[tokio::test]
    async fn test_second_run_is_noop() {
        let gate = StartupGate::new();
        gate.run(ReadySignal::ready(), Duration::from_secs(1)).await;
        let how = gate.run(ReadySignal::ready(), Duration::from_secs(1)).await;
        assert_eq!(how, Activation::StoreReady);
        assert_eq!(gate.ignored_triggers(), 1);
    }

    #[tokio::test]
    async fn test_wait_active_wakes() {
        let gate = Arc::new(StartupGate::new());
        let waiter = {
            let gate = gate.clone();
            tokio::spawn(async move { gate.wait_active().await })
        };
        tokio::task::yield_now().await;
        assert!(gate.fire(Activation::StoreReady));
        waiter.await.unwrap();
    }
}
