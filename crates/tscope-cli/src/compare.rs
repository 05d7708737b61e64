use std::io::Write;
use std::thread;
use std::time::Duration;

use clap::Args;
use serde::Serialize;
use tscope::diff::batch::BatchProgress;
use tscope::{BatchOutcome, BatchSummary, Outline, OutlineGuides};

use crate::error::{CliError, EXIT_DIFFERENCES, Result};
use crate::store::StoreArgs;

const POLL_INTERVAL: Duration = Duration::from_millis(25);

#[derive(Debug, Clone, Args)]
pub struct CompareArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    /// Record token whose tensors are compared.
    pub token_a: String,

    /// Record token substituted to find each counterpart.
    pub token_b: String,

    /// Significance threshold; overrides the configured epsilon.
    #[arg(long)]
    pub epsilon: Option<f64>,

    /// Print the whole tree instead of only flagged branches.
    #[arg(long)]
    pub all: bool,

    /// Draw the tree with ASCII guides.
    #[arg(long)]
    pub ascii: bool,

    /// Emit a JSON report instead of the tree.
    #[arg(long)]
    pub json: bool,

    /// Exit non-zero when any significant difference is found.
    #[arg(long)]
    pub fail_on_diff: bool,
}

#[derive(Debug, Serialize)]
struct PairReport {
    left: String,
    right: String,
    error_magnitude: f64,
}

#[derive(Debug, Serialize)]
struct FailureReport {
    left: String,
    right: String,
    error_type: &'static str,
    detail: String,
}

#[derive(Debug, Serialize)]
struct CompareReport {
    token_a: String,
    token_b: String,
    compared: usize,
    significant: usize,
    unmatched: usize,
    results: Vec<PairReport>,
    failures: Vec<FailureReport>,
}

impl CompareReport {
    fn new(args: &CompareArgs, outcome: &BatchOutcome) -> Self {
        Self {
            token_a: args.token_a.clone(),
            token_b: args.token_b.clone(),
            compared: outcome.compared,
            significant: outcome.significant,
            unmatched: outcome.unmatched,
            results: outcome
                .results
                .iter()
                .map(|r| PairReport {
                    left: r.left.to_string(),
                    right: r.right.to_string(),
                    error_magnitude: r.error_magnitude,
                })
                .collect(),
            failures: outcome
                .failures
                .iter()
                .map(|f| FailureReport {
                    left: f.left.to_string(),
                    right: f.right.to_string(),
                    error_type: f.kind_label(),
                    detail: f.kind.to_string(),
                })
                .collect(),
        }
    }
}

fn log_progress(progress: &BatchProgress) {
    tracing::info!(
        target: "tscope.cli",
        done = progress.done,
        total = progress.total,
        current = %progress.current,
        "batch progress"
    );
}

pub fn run_compare(args: CompareArgs, out: &mut dyn Write) -> Result<()> {
    let mut config = args.store.viewer_config()?;
    if let Some(epsilon) = args.epsilon {
        config.batch.epsilon = epsilon;
    }
    let problems = config.validate();
    if !problems.is_empty() {
        return Err(CliError::invalid(problems.join("; ")));
    }
    let mut inspector = args.store.open_with(config)?;

    let mut job = inspector.spawn_batch_diff(&args.token_a, &args.token_b);
    let mut last_done = None;
    while !job.is_finished() {
        if let Some(progress) = job.poll_progress()
            && last_done != Some(progress.done)
        {
            last_done = Some(progress.done);
            log_progress(progress);
        }
        thread::sleep(POLL_INTERVAL);
    }
    let outcome = job.join()?;

    if args.json {
        let report = CompareReport::new(&args, &outcome);
        serde_json::to_writer_pretty(&mut *out, &report)?;
        writeln!(out)?;
    }
    let summary: BatchSummary = inspector.apply_batch_outcome(outcome);

    if !args.json {
        let guides = if args.ascii {
            OutlineGuides::Ascii
        } else {
            OutlineGuides::Unicode
        };
        let lines = Outline::new(inspector.tree())
            .guides(guides)
            .annotate(true)
            .only_flagged(!args.all)
            .lines();
        for line in lines {
            writeln!(out, "{line}")?;
        }
        writeln!(
            out,
            "compared {}, significant {}, unmatched {}, failed {}",
            summary.compared, summary.significant, summary.unmatched, summary.failures
        )?;
    }

    if args.fail_on_diff && summary.significant > 0 {
        return Err(CliError::exit(
            EXIT_DIFFERENCES,
            format!(
                "{} significant differences between '{}' and '{}'",
                summary.significant, args.token_a, args.token_b
            ),
        ));
    }
    Ok(())
}
