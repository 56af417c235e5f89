// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Single-flight gate and cooperative cancellation for reconciliation passes.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TryRecvError, bounded};

use crate::semantic::error::GateError;

/// Lets at most one reconciliation pass run per document.
///
/// The permit is a single token in a one-slot channel: acquiring takes the
/// token out, dropping the [`Permit`] puts it back.
///
/// Hand-off is not strictly fair: a returned token goes to whichever receiver
/// the channel wakes first, and a caller arriving just as it is released can
/// take it ahead of threads already waiting. Exclusion is all the gate
/// guarantees; waiters that lose out fall back to their `acquire` timeout.
#[derive(Debug, Clone)]
pub struct SyncGate {
    release: Sender<()>,
    take: Receiver<()>,
}

impl Default for SyncGate {
    fn default() -> Self {
        Self::new()
    }
}

impl SyncGate {
    pub fn new() -> Self {
        let (release, take) = bounded(1);
        // Cannot fail: the channel is new and has one free slot.
        let _ = release.try_send(());
        Self { release, take }
    }

    /// Waits up to `timeout` for the permit.
    pub fn acquire(&self, timeout: Duration) -> Result<Permit, GateError> {
        match self.take.recv_timeout(timeout) {
            Ok(()) => Ok(self.permit()),
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => Err(GateError::Timeout(timeout)),
        }
    }

    /// Takes the permit only if it is free right now.
    pub fn try_acquire(&self) -> Option<Permit> {
        match self.take.try_recv() {
            Ok(()) => Some(self.permit()),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }

    /// Returns true if no pass currently holds the permit.
    pub fn is_free(&self) -> bool {
        !self.take.is_empty()
    }

    fn permit(&self) -> Permit {
        Permit {
            release: self.release.clone(),
        }
    }
}

/// Proof of holding the gate. Released when dropped.
#[derive(Debug)]
#[must_use = "the gate is released as soon as the permit is dropped"]
pub struct Permit {
    release: Sender<()>,
}

impl Drop for Permit {
    fn drop(&mut self) {
        if self.release.try_send(()).is_err() {
            tracing::error!("highlighting permit released twice");
        }
    }
}

/// Shared flag a trigger uses to abandon an in-flight pass.
///
/// Cancellation is cooperative: the pass checks the flag between phases.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    canceled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.canceled.store(true, Ordering::Release);
    }

    pub fn is_canceled(&self) -> bool {
        self.canceled.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::thread;
    use std::time::Instant;

    #[test]
    fn test_acquire_and_release() {
        let gate = SyncGate::new();
        assert!(gate.is_free());

        let permit = gate.acquire(Duration::from_millis(10)).unwrap();
        assert!(!gate.is_free());
        assert!(gate.try_acquire().is_none());

        drop(permit);
        assert!(gate.is_free());
        assert!(gate.try_acquire().is_some());
    }

    #[test]
    fn test_acquire_times_out_while_held() {
        let gate = SyncGate::new();
        let _held = gate.acquire(Duration::from_millis(10)).unwrap();

        let started = Instant::now();
        let result = gate.acquire(Duration::from_millis(30));
        assert_eq!(result.unwrap_err(), GateError::Timeout(Duration::from_millis(30)));
        assert!(started.elapsed() >= Duration::from_millis(30));
    }

    #[test]
    fn test_waiter_gets_permit_after_release() {
        let gate = SyncGate::new();
        let held = gate.acquire(Duration::from_millis(10)).unwrap();

        let waiter = {
            let gate = gate.clone();
            thread::spawn(move || gate.acquire(Duration::from_secs(5)).is_ok())
        };
        thread::sleep(Duration::from_millis(20));
        drop(held);
        assert!(waiter.join().unwrap());
    }

    #[test]
    fn test_single_holder_across_threads() {
        let gate = SyncGate::new();
        let active = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let workers: Vec<_> = (0..8)
            .map(|_| {
                let gate = gate.clone();
                let active = Arc::clone(&active);
                let peak = Arc::clone(&peak);
                thread::spawn(move || {
                    for _ in 0..20 {
                        let _permit = gate.acquire(Duration::from_secs(10)).unwrap();
                        let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                        peak.fetch_max(now, Ordering::SeqCst);
                        thread::yield_now();
                        active.fetch_sub(1, Ordering::SeqCst);
                    }
                })
            })
            .collect();
        for worker in workers {
            worker.join().unwrap();
        }

        assert_eq!(peak.load(Ordering::SeqCst), 1);
        assert!(gate.is_free());
    }

    #[test]
    fn test_cancellation_token_is_shared() {
        let token = CancellationToken::new();
        let observer = token.clone();
        assert!(!observer.is_canceled());
        token.cancel();
        assert!(observer.is_canceled());
    }
}
