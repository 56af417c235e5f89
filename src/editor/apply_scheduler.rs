// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Hands highlight deltas to the UI thread.
//!
//! Classification and diffing run on a worker; only [`PresentationTarget::apply`]
//! touches UI-owned state, and it always runs on the [`UiThread`].

use std::panic::{self, AssertUnwindSafe};
use std::sync::Weak;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{Sender, unbounded};

use crate::semantic::diff::HighlightDelta;
use crate::semantic::position::Span;
use crate::semantic::style::Style;

/// A styled range to paint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StyleRange {
    pub span: Span,
    pub style: Style,
}

/// What the UI layer needs to repaint after one pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PresentationDelta {
    /// Ranges to paint, in offset order
    pub added: Vec<StyleRange>,
    /// Ranges whose previous styling must be cleared
    pub removed: Vec<Span>,
    /// Smallest range covering every added and removed span
    pub damage: Option<Span>,
}

impl PresentationDelta {
    pub fn from_delta(delta: &HighlightDelta) -> Self {
        let mut added: Vec<StyleRange> = delta
            .added
            .iter()
            .map(|position| StyleRange {
                span: position.span,
                style: position.style,
            })
            .collect();
        added.sort_by_key(|range| range.span);
        let mut removed: Vec<Span> = delta.removed.iter().map(|position| position.span).collect();
        removed.sort();

        let damage = added
            .iter()
            .map(|range| range.span)
            .chain(removed.iter().copied())
            .reduce(|covered, span| covered.union(&span));

        Self { added, removed, damage }
    }

    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// The editor surface a delta is painted onto.
///
/// The liveness checks are made on the worker before dispatch and again on
/// the UI thread before painting.
pub trait PresentationTarget: Send + Sync {
    /// The editor has not been closed.
    fn editor_alive(&self) -> bool;
    /// The editor is still attached to its workbench site.
    fn site_alive(&self) -> bool;
    /// The display backing the UI thread has not been disposed.
    fn display_alive(&self) -> bool;
    /// Paints the delta. Always called on the UI thread.
    fn apply(&self, delta: &PresentationDelta);
}

fn is_live(target: &dyn PresentationTarget) -> bool {
    target.editor_alive() && target.site_alive() && target.display_alive()
}

type UiTask = Box<dyn FnOnce() + Send + 'static>;

enum UiMessage {
    Run(UiTask),
    Stop,
}

/// A dedicated thread that runs posted tasks in order.
#[derive(Debug)]
pub struct UiThread {
    queue: Sender<UiMessage>,
    thread: Option<JoinHandle<()>>,
}

impl UiThread {
    pub fn spawn() -> std::io::Result<Self> {
        let (queue, messages) = unbounded::<UiMessage>();
        let thread = thread::Builder::new().name("semantic-ui".into()).spawn(move || {
            for message in messages {
                let UiMessage::Run(task) = message else {
                    break;
                };
                if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(task)) {
                    tracing::error!(panic = %panic_message(payload.as_ref()), "UI task panicked");
                }
            }
            tracing::trace!("UI thread exiting");
        })?;
        Ok(Self {
            queue,
            thread: Some(thread),
        })
    }

    /// Returns a handle tasks can be posted through.
    pub fn handle(&self) -> UiHandle {
        UiHandle {
            queue: Some(self.queue.clone()),
        }
    }

    /// Runs the tasks posted so far and stops the thread. Later posts are
    /// refused.
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        let Some(thread) = self.thread.take() else {
            return;
        };
        let _ = self.queue.send(UiMessage::Stop);
        if thread.join().is_err() {
            tracing::error!("UI thread panicked");
        }
    }
}

impl Drop for UiThread {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Posts work onto a [`UiThread`].
#[derive(Clone, Default)]
pub struct UiHandle {
    queue: Option<Sender<UiMessage>>,
}

impl std::fmt::Debug for UiHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UiHandle").field("attached", &self.queue.is_some()).finish()
    }
}

impl UiHandle {
    /// A handle with no UI thread behind it; every post is refused.
    pub fn detached() -> Self {
        Self::default()
    }

    /// Queues `task` without waiting for it to run. Returns false if the UI
    /// thread is gone.
    pub fn post(&self, task: impl FnOnce() + Send + 'static) -> bool {
        match &self.queue {
            Some(queue) => queue.send(UiMessage::Run(Box::new(task))).is_ok(),
            None => false,
        }
    }
}

/// What happened to one delta handed to the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// Nothing changed; the UI was not touched
    Empty,
    /// The editor, its site or its display is gone
    Dropped,
    /// Queued on the UI thread
    Posted,
}

/// Dispatches presentation deltas for one editor.
#[derive(Clone)]
pub struct ApplyScheduler {
    target: Weak<dyn PresentationTarget>,
    ui: UiHandle,
}

impl std::fmt::Debug for ApplyScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApplyScheduler")
            .field("target_alive", &(self.target.strong_count() > 0))
            .field("ui", &self.ui)
            .finish()
    }
}

impl ApplyScheduler {
    /// The scheduler does not keep the editor alive.
    pub fn new(target: Weak<dyn PresentationTarget>, ui: UiHandle) -> Self {
        Self { target, ui }
    }

    /// Posts `delta` to the UI thread as a single fire-and-forget task.
    pub fn schedule(&self, delta: PresentationDelta) -> ApplyOutcome {
        if delta.is_empty() {
            return ApplyOutcome::Empty;
        }
        let live = self.target.upgrade().is_some_and(|target| is_live(target.as_ref()));
        if !live {
            tracing::debug!("editor closed; dropping highlight update");
            return ApplyOutcome::Dropped;
        }

        let target = self.target.clone();
        let posted = self.ui.post(move || {
            // The editor may have closed while the task was queued.
            if let Some(target) = target.upgrade().filter(|target| is_live(target.as_ref())) {
                target.apply(&delta);
            }
        });
        if posted {
            ApplyOutcome::Posted
        } else {
            tracing::debug!("UI thread gone; dropping highlight update");
            ApplyOutcome::Dropped
        }
    }
}

pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
