// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Editor-facing glue: UI dispatch of highlight deltas and reconcile triggers.

pub mod apply_scheduler;
pub mod reconcile_notifier;

pub use apply_scheduler::{ApplyOutcome, ApplyScheduler, PresentationDelta, PresentationTarget, UiHandle, UiThread};
pub use reconcile_notifier::{ReconcileNotification, ReconcileNotifier, ReconcileReason};
