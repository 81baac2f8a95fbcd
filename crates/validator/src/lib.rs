use configuration::settings::Validation;
use core_types::source::{CAPEX_HEADER, LCOE_HEADER};
use core_types::MetricTable;
use engine::{RunContext, RunOutput, Runner};
use serde::Serialize;
use tracing::{debug, warn};

pub mod error;

pub use error::ValidationError;

/// Outcome of one table comparison.
#[derive(Debug, Clone, Serialize)]
pub struct ComparisonSummary {
    pub metric: String,
    pub cells: usize,
    pub max_abs_diff: f64,
}

/// Compares computed tables against reference tables, element-wise, with the
/// `allclose` rule `|a - b| <= atol + rtol * |b|`.
#[derive(Debug, Clone)]
pub struct ConsistencyValidator {
    rtol: f64,
    atol: f64,
    check_capex: bool,
    check_lcoe: bool,
}

impl ConsistencyValidator {
    pub fn new(rtol: f64, atol: f64) -> Self {
        Self { rtol, atol, check_capex: true, check_lcoe: true }
    }

    pub fn from_settings(config: &Validation) -> Self {
        Self {
            rtol: config.rtol,
            atol: config.atol,
            check_capex: config.check_capex,
            check_lcoe: config.check_lcoe,
        }
    }

    /// `b` is the reference value. NaN is never close to anything.
    pub fn is_close(&self, a: f64, b: f64) -> bool {
        (a - b).abs() <= self.atol + self.rtol * b.abs()
    }

    /// Compares `computed` with `reference`, cell by cell.
    pub fn compare(
        &self,
        ctx: &RunContext<'_>,
        metric: &str,
        computed: &MetricTable,
        reference: &MetricTable,
    ) -> Result<ComparisonSummary, ValidationError> {
        computed.ensure_same_shape(reference, metric)?;

        let mut first = None;
        let mut mismatches = 0;
        let mut max_abs_diff = 0.0_f64;
        for row in 0..computed.n_rows() {
            for col in 0..computed.n_years() {
                let (a, b) = (computed.value(row, col), reference.value(row, col));
                max_abs_diff = max_abs_diff.max((a - b).abs());
                if !self.is_close(a, b) {
                    mismatches += 1;
                    first.get_or_insert((row, col, a, b));
                }
            }
        }

        if let Some((row, col, computed_value, reference_value)) = first {
            warn!(metric, mismatches, "Computed values differ from the reference");
            return Err(ValidationError::ConsistencyMismatch {
                technology: ctx.profile.name.clone(),
                case: ctx.case.to_string(),
                crp: ctx.crp_years(),
                metric: metric.to_string(),
                row: computed.rows()[row].clone(),
                year: computed.years()[col],
                computed: computed_value,
                reference: reference_value,
                mismatches,
            });
        }

        debug!(metric, max_abs_diff, "Matches reference");
        Ok(ComparisonSummary {
            metric: metric.to_string(),
            cells: computed.n_rows() * computed.n_years(),
            max_abs_diff,
        })
    }

    /// Checks the CAPEX and LCOE of `output` against the reference tables the
    /// source holds for the same run. Tables the run did not produce are skipped.
    pub fn check(
        &self,
        runner: &Runner<'_>,
        ctx: &RunContext<'_>,
        output: &RunOutput,
    ) -> Result<Vec<ComparisonSummary>, ValidationError> {
        let mut summaries = Vec::new();
        if self.check_capex {
            if let Some(cost) = &output.cost {
                let reference = runner.reference_table(ctx, CAPEX_HEADER)?;
                summaries.push(self.compare(ctx, "CAPEX", &cost.capex, &reference)?);
            }
        }
        if self.check_lcoe {
            if let Some(lcoe) = &output.lcoe {
                let reference = runner.reference_table(ctx, LCOE_HEADER)?;
                summaries.push(self.compare(ctx, "LCOE", &lcoe.lcoe, &reference)?);
            }
        }
        Ok(summaries)
    }
}
