// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Performance baseline for semantic highlighting passes.
//!
//! Runs repeated reconciliation passes over synthetic units of increasing
//! size against a headless editor and prints a metrics report. Set
//! `RUST_LOG=semantic_highlight=debug` to see individual passes.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use semantic_highlight::editor::{ApplyScheduler, PresentationDelta, PresentationTarget, UiThread};
use semantic_highlight::semantic::sample::sample_unit;
use semantic_highlight::semantic::{
    CancellationToken, PassOutcome, ResolvedReferenceProvider, SemanticHighlighter, StyleRegistry,
};
use tracing_subscriber::EnvFilter;

/// Unit sizes, in classes.
const UNIT_SIZES: [usize; 4] = [10, 100, 500, 2_000];
const PASSES_PER_UNIT: usize = 5;
const PASS_BUDGET: Duration = Duration::from_millis(250);

/// Counts painted ranges instead of drawing them.
#[derive(Default)]
struct HeadlessEditor {
    painted: AtomicUsize,
}

impl PresentationTarget for HeadlessEditor {
    fn editor_alive(&self) -> bool {
        true
    }

    fn site_alive(&self) -> bool {
        true
    }

    fn display_alive(&self) -> bool {
        true
    }

    fn apply(&self, delta: &PresentationDelta) {
        self.painted.fetch_add(delta.added.len(), Ordering::Relaxed);
    }
}

fn main() -> std::io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    println!("=== Semantic Highlighting Performance Baseline ===\n");

    let ui = UiThread::spawn()?;
    let headless = Arc::new(HeadlessEditor::default());
    let editor: Arc<dyn PresentationTarget> = headless.clone();
    let registry = Arc::new(StyleRegistry::default());
    let mut slowest = Duration::ZERO;
    let mut combined = Vec::new();

    for classes in UNIT_SIZES {
        let unit = sample_unit(classes);
        let highlighter = SemanticHighlighter::new(
            Arc::clone(&registry),
            ApplyScheduler::new(Arc::downgrade(&editor), ui.handle()),
        );

        let started = Instant::now();
        for pass in 0..PASSES_PER_UNIT {
            let outcome = highlighter.reconcile(&unit, &CancellationToken::new());
            if let PassOutcome::Completed(summary) = &outcome {
                if pass == 0 {
                    println!(
                        "{classes:>5} classes, {:>7} bytes: {} positions",
                        unit.source().len(),
                        summary.records
                    );
                }
            } else {
                println!("  pass {pass} did not complete: {outcome:?}");
            }
        }
        let elapsed = started.elapsed();
        slowest = slowest.max(elapsed / PASSES_PER_UNIT as u32);

        let metrics = highlighter.metrics_snapshot();
        println!(
            "        average {}us, slowest {}us",
            metrics.avg_pass_time.as_micros(),
            metrics.max_pass_time.as_micros()
        );
        combined.push(metrics);
    }

    ui.shutdown();
    println!("\nRanges painted on the UI thread: {}", headless.painted.load(Ordering::Relaxed));

    for (classes, metrics) in UNIT_SIZES.iter().zip(&combined) {
        println!("\n--- {classes} classes ---");
        print!("{}", metrics.generate_report());
    }

    let mut issues = Vec::new();
    for metrics in &combined {
        let (_, found) = metrics.meets_requirements(PASS_BUDGET);
        issues.extend(found);
    }
    if issues.is_empty() {
        println!("\nAll passes within the {}ms budget.", PASS_BUDGET.as_millis());
    } else {
        println!("\nPerformance issues detected:");
        for issue in &issues {
            println!("  - {issue}");
        }
    }
    println!("Slowest average pass: {}us", slowest.as_micros());

    Ok(())
}
