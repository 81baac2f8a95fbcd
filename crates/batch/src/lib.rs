//! # Batch
//!
//! Plans every run of the registry (technology x CRP x case x tax-credit case)
//! and executes the runs on a rayon pool. Runs share nothing but read-only
//! data, so each one is an independent unit of the parallel map and results
//! are gathered once the pool is done.

use chrono::{DateTime, TimeDelta, Utc};
use configuration::BatchSettings;
use core_types::{FinancialCase, TaxCreditCase};
use engine::{EngineError, RunContext, RunOutput, Runner};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{error, info, warn};
use uuid::Uuid;
use validator::{ConsistencyValidator, ValidationError};

pub mod error;
pub mod plan;

pub use error::BatchError;
pub use plan::{crp_choices, plan, plan_technology, tax_credit_cases};

/// A run that did not produce an output.
#[derive(Debug, Clone)]
pub struct RunFailure {
    pub technology: String,
    pub case: FinancialCase,
    pub crp_years: u32,
    pub tax_credit_case: Option<TaxCreditCase>,
    pub error: EngineError,
}

/// Everything a batch produced. Outputs keep the order of the plan.
#[derive(Debug)]
pub struct BatchReport {
    pub job_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub elapsed: TimeDelta,
    pub planned: usize,
    pub outputs: Vec<RunOutput>,
    pub failures: Vec<RunFailure>,
    /// Consistency check failures. Runs that fail a check still keep their output.
    pub mismatches: Vec<ValidationError>,
    /// Runs never started because the batch was aborted.
    pub skipped: usize,
}

impl BatchReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty() && self.mismatches.is_empty() && self.skipped == 0
    }
}

enum Outcome {
    Completed(Box<RunOutput>, Option<ValidationError>),
    Failed(RunFailure),
    Skipped,
}

pub struct BatchRunner {
    threads: usize,
    abort_on_configuration_error: bool,
    validator: Option<ConsistencyValidator>,
    show_progress: bool,
}

impl BatchRunner {
    pub fn new(settings: &BatchSettings) -> Self {
        Self {
            threads: settings.threads,
            abort_on_configuration_error: settings.abort_on_configuration_error,
            validator: None,
            show_progress: false,
        }
    }

    /// Checks every output against the source's reference tables.
    pub fn with_validator(mut self, validator: ConsistencyValidator) -> Self {
        self.validator = Some(validator);
        self
    }

    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// Executes `runs` and collects the results. Only setup problems (the
    /// worker pool or the progress bar) fail the batch as a whole.
    pub fn run(&self, runner: &Runner<'_>, runs: &[RunContext<'_>]) -> Result<BatchReport, BatchError> {
        let job_id = Uuid::new_v4();
        let started_at = Utc::now();
        let pool = rayon::ThreadPoolBuilder::new().num_threads(self.threads).build()?;
        info!(
            %job_id,
            runs = runs.len(),
            threads = pool.current_num_threads(),
            "Starting batch"
        );

        let progress = if self.show_progress {
            let bar = ProgressBar::new(runs.len() as u64);
            bar.set_style(
                ProgressStyle::default_bar()
                    .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")?
                    .progress_chars("=>-"),
            );
            bar
        } else {
            ProgressBar::hidden()
        };

        let aborted = AtomicBool::new(false);
        let outcomes: Vec<Outcome> = pool.install(|| {
            runs.par_iter()
                .map(|ctx| {
                    let outcome = self.execute(runner, ctx, &aborted);
                    progress.inc(1);
                    outcome
                })
                .collect()
        });
        progress.finish_with_message("Batch complete");

        let mut report = BatchReport {
            job_id,
            started_at,
            elapsed: Utc::now() - started_at,
            planned: runs.len(),
            outputs: Vec::new(),
            failures: Vec::new(),
            mismatches: Vec::new(),
            skipped: 0,
        };
        for outcome in outcomes {
            match outcome {
                Outcome::Completed(output, check) => {
                    report.outputs.push(*output);
                    report.mismatches.extend(check);
                }
                Outcome::Failed(failure) => report.failures.push(failure),
                Outcome::Skipped => report.skipped += 1,
            }
        }

        info!(
            %job_id,
            outputs = report.outputs.len(),
            failures = report.failures.len(),
            mismatches = report.mismatches.len(),
            skipped = report.skipped,
            elapsed_ms = report.elapsed.num_milliseconds(),
            "Batch finished"
        );
        Ok(report)
    }

    fn execute(&self, runner: &Runner<'_>, ctx: &RunContext<'_>, aborted: &AtomicBool) -> Outcome {
        if aborted.load(Ordering::SeqCst) {
            return Outcome::Skipped;
        }

        match runner.run(ctx) {
            Ok(output) => {
                let check = self.validator.as_ref().and_then(|v| v.check(runner, ctx, &output).err());
                if let Some(e) = &check {
                    warn!("{ctx}: {e}");
                }
                Outcome::Completed(Box::new(output), check)
            }
            Err(e) => {
                error!("Run aborted: {e}");
                if e.is_configuration() && self.abort_on_configuration_error {
                    warn!("Configuration error, remaining runs are not started");
                    aborted.store(true, Ordering::SeqCst);
                }
                Outcome::Failed(RunFailure {
                    technology: ctx.profile.name.clone(),
                    case: ctx.case,
                    crp_years: ctx.crp_years(),
                    tax_credit_case: ctx.tax_credit_case,
                    error: e,
                })
            }
        }
    }
}
