// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Reconcile notifications for semantic highlighting.
//!
//! The host posts a notification whenever a document was reconciled. A
//! background worker runs one highlighting pass per notification; a newer
//! notification cancels the pass in flight and supersedes any that are still
//! queued.

use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};

use crossbeam_channel::{Receiver, Sender, unbounded};

use crate::semantic::gate::CancellationToken;
use crate::semantic::highlighter::{PassOutcome, SemanticHighlighter};
use crate::semantic::provider::ResolvedReferenceProvider;

/// Why a pass was requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileReason {
    /// The editor was opened
    Opened,
    /// The reconciler finished after an edit
    Edited,
    /// Styles or preferences changed and everything must be repainted
    Refresh,
}

/// One request to re-highlight a document.
#[derive(Clone)]
pub struct ReconcileNotification {
    pub provider: Arc<dyn ResolvedReferenceProvider>,
    pub reason: ReconcileReason,
}

impl std::fmt::Debug for ReconcileNotification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReconcileNotification")
            .field("reason", &self.reason)
            .field("source_len", &self.provider.source().len())
            .finish()
    }
}

impl ReconcileNotification {
    pub fn new(provider: Arc<dyn ResolvedReferenceProvider>, reason: ReconcileReason) -> Self {
        Self { provider, reason }
    }

    pub fn opened(provider: Arc<dyn ResolvedReferenceProvider>) -> Self {
        Self::new(provider, ReconcileReason::Opened)
    }

    pub fn edited(provider: Arc<dyn ResolvedReferenceProvider>) -> Self {
        Self::new(provider, ReconcileReason::Edited)
    }

    pub fn refresh(provider: Arc<dyn ResolvedReferenceProvider>) -> Self {
        Self::new(provider, ReconcileReason::Refresh)
    }
}

struct Request {
    notification: ReconcileNotification,
    cancel: CancellationToken,
}

/// Background worker feeding notifications into a [`SemanticHighlighter`].
#[derive(Debug)]
pub struct ReconcileNotifier {
    requests: Option<Sender<Request>>,
    /// Token of the newest request; canceled when it is superseded
    current: Mutex<CancellationToken>,
    worker: Option<JoinHandle<()>>,
}

impl ReconcileNotifier {
    /// Starts the worker. Finished passes are reported on `outcomes`, if given.
    pub fn spawn(
        highlighter: Arc<SemanticHighlighter>,
        outcomes: Option<Sender<PassOutcome>>,
    ) -> std::io::Result<Self> {
        let (requests, queue) = unbounded::<Request>();
        let worker = thread::Builder::new()
            .name("semantic-reconcile".into())
            .spawn(move || run_worker(&highlighter, &queue, outcomes.as_ref()))?;
        Ok(Self {
            requests: Some(requests),
            current: Mutex::new(CancellationToken::new()),
            worker: Some(worker),
        })
    }

    /// Queues a pass and cancels the one in flight, if any.
    ///
    /// Returns false if the worker has stopped.
    pub fn notify(&self, notification: ReconcileNotification) -> bool {
        let Some(requests) = &self.requests else {
            return false;
        };
        let cancel = CancellationToken::new();
        {
            let mut current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
            current.cancel();
            *current = cancel.clone();
        }
        tracing::trace!(reason = ?notification.reason, "reconcile notification");
        requests.send(Request { notification, cancel }).is_ok()
    }

    /// Cancels the pass in flight and waits for the worker to exit.
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        self.current.lock().unwrap_or_else(PoisonError::into_inner).cancel();
        self.requests.take();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                tracing::error!("reconcile worker panicked");
            }
        }
    }
}

impl Drop for ReconcileNotifier {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run_worker(highlighter: &SemanticHighlighter, queue: &Receiver<Request>, outcomes: Option<&Sender<PassOutcome>>) {
    while let Ok(mut request) = queue.recv() {
        // Only the newest queued request is worth running.
        let mut superseded = 0usize;
        while let Ok(newer) = queue.try_recv() {
            request = newer;
            superseded += 1;
        }
        if superseded > 0 {
            tracing::debug!(superseded, "coalesced reconcile notifications");
        }

        let Request { notification, cancel } = request;
        let outcome = highlighter.reconcile(notification.provider.as_ref(), &cancel);
        if let Some(outcomes) = outcomes {
            let _ = outcomes.send(outcome);
        }
    }
    tracing::trace!("reconcile worker exiting");
}
