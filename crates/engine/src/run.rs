use crate::cost::{CostEngine, CostResult};
use crate::error::EngineError;
use crate::lcoe::{LcoeEngine, LcoeInputs, LcoeResult};
use configuration::Settings;
use core_types::source::CFF_HEADER;
use core_types::{
    AssumptionSource, CoreError, CrpChoice, FinancialAssumptions, FinancialCase, MetaRecord,
    MetricTable, SheetRequest, TaxCreditCase, TaxCreditRegime, WaccTables,
};
use finance::{FinanceFactorEngine, FinanceFactorResult, FinanceInputs, TaxCreditResolver, TaxCredits};
use std::collections::BTreeMap;
use std::fmt;
use technologies::{Metric, OutputField, TechRegistry, TechnologyProfile};
use tracing::{debug, info, info_span, warn};

/// One unit of execution: a technology under one financial case, CRP and
/// (optionally) tax-credit case.
#[derive(Debug, Clone, Copy)]
pub struct RunContext<'a> {
    pub profile: &'a TechnologyProfile,
    pub case: FinancialCase,
    pub crp: CrpChoice,
    pub tax_credit_case: Option<TaxCreditCase>,
}

impl<'a> RunContext<'a> {
    pub fn new(
        profile: &'a TechnologyProfile,
        case: FinancialCase,
        crp: CrpChoice,
        tax_credit_case: Option<TaxCreditCase>,
    ) -> Self {
        Self { profile, case, crp, tax_credit_case }
    }

    pub fn crp_years(&self) -> u32 {
        self.crp.years(self.profile.tech_life)
    }

    fn wrap(&self, error: EngineError) -> EngineError {
        EngineError::Run {
            technology: self.profile.name.clone(),
            case: self.case.to_string(),
            crp: self.crp_label(),
            source: Box::new(error),
        }
    }

    fn crp_label(&self) -> String {
        match self.crp {
            CrpChoice::TechLife => format!("TechLife ({})", self.profile.tech_life),
            other => other.to_string(),
        }
    }
}

impl fmt::Display for RunContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} / {} / CRP {}", self.profile.name, self.case, self.crp_label())?;
        if let Some(tcc) = self.tax_credit_case {
            write!(f, " / {tcc}")?;
        }
        Ok(())
    }
}

/// The slice of the settings a run depends on.
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub base_year: i32,
    pub end_year: i32,
    pub excluded_leading_years: usize,
    pub grid_roundtrip_efficiency: f64,
}

impl RunSettings {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            base_year: settings.years.base_year,
            end_year: settings.years.end_year,
            excluded_leading_years: settings.policy.tax_credit_excluded_leading_years,
            grid_roundtrip_efficiency: settings.hybrid.grid_roundtrip_efficiency,
        }
    }
}

impl Default for RunSettings {
    fn default() -> Self {
        Self::from_settings(&Settings::default())
    }
}

/// Every input table of a run, checked for shape and completeness.
#[derive(Debug, Clone)]
pub struct RunInputs {
    pub years: Vec<i32>,
    pub metrics: BTreeMap<Metric, MetricTable>,
    pub tax_credits: Option<MetricTable>,
    pub financial: FinancialAssumptions,
    pub wacc: Option<WaccTables>,
}

impl RunInputs {
    pub fn metric(&self, metric: Metric) -> Result<&MetricTable, EngineError> {
        self.metrics
            .get(&metric)
            .ok_or_else(|| CoreError::shape(metric.header(), "metric was not loaded").into())
    }
}

/// Everything a run produced. Immutable once returned.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub technology: String,
    pub case: FinancialCase,
    pub crp: CrpChoice,
    pub crp_years: u32,
    pub tax_credit_case: Option<TaxCreditCase>,
    pub regime: TaxCreditRegime,
    pub inputs: RunInputs,
    pub credits: TaxCredits,
    pub cost: Option<CostResult>,
    pub finance: Option<FinanceFactorResult>,
    pub lcoe: Option<LcoeResult>,
    pub meta: Vec<MetaRecord>,
    pub has_tax_credit: bool,
}

impl RunOutput {
    pub fn years(&self) -> &[i32] {
        &self.inputs.years
    }

    /// The table behind an output field, if the run produced it.
    pub fn field(&self, field: OutputField) -> Option<&MetricTable> {
        match field {
            OutputField::ConstructionFinanceCost => self.cost.as_ref().map(|c| &c.cfc),
            OutputField::Capex => self.cost.as_ref().map(|c| &c.capex),
            OutputField::Lcoe => self.lcoe.as_ref().map(|l| &l.lcoe),
            OutputField::Fuel => self.lcoe.as_ref().and_then(|l| l.fuel.as_ref()),
            other => other.source_metric().and_then(|m| self.inputs.metrics.get(&m)),
        }
    }
}

/// Runs `RunContext`s against an assumption source.
pub struct Runner<'a> {
    registry: &'a TechRegistry,
    source: &'a dyn AssumptionSource,
    settings: RunSettings,
}

impl<'a> Runner<'a> {
    pub fn new(registry: &'a TechRegistry, source: &'a dyn AssumptionSource, settings: RunSettings) -> Self {
        Self { registry, source, settings }
    }

    pub fn registry(&self) -> &TechRegistry {
        self.registry
    }

    pub fn settings(&self) -> &RunSettings {
        &self.settings
    }

    /// Loads the inputs of `ctx` and computes CAPEX, finance factors and LCOE.
    /// Any error aborts this run only and carries the run's identity.
    pub fn run(&self, ctx: &RunContext<'_>) -> Result<RunOutput, EngineError> {
        let span = info_span!(
            "run",
            technology = %ctx.profile.name,
            case = %ctx.case,
            crp = ctx.crp_years()
        );
        let _enter = span.enter();
        info!("Processing {ctx}");
        self.run_inner(ctx).map_err(|e| ctx.wrap(e))
    }

    fn run_inner(&self, ctx: &RunContext<'_>) -> Result<RunOutput, EngineError> {
        let profile = ctx.profile;
        let caps = profile.capabilities;
        let inputs = self.load_inputs(ctx)?;
        let years = inputs.years.clone();

        let resolver = TaxCreditResolver::new(self.settings.excluded_leading_years);
        let tax_table = if caps.has_tax_credit { inputs.tax_credits.as_ref() } else { None };
        let credits = resolver.resolve(tax_table, &years, &profile.scenarios, profile.itc_keys())?;
        let regime = if caps.has_tax_credit {
            resolver.classify(&credits, profile.classification_rule())
        } else {
            TaxCreditRegime::None
        };
        debug!(regime = %regime, "Classified tax credits");

        let cost = if caps.has_capex {
            let ncf = inputs.metrics.get(&Metric::NetCapacityFactor);
            Some(CostEngine::new().calculate(
                inputs.metric(Metric::ConstructionFinanceFactor)?,
                inputs.metric(Metric::OvernightCapitalCost)?,
                inputs.metric(Metric::GridConnectionCost)?,
                ncf,
            )?)
        } else {
            None
        };

        let (finance, lcoe) = match (&cost, &inputs.wacc) {
            (Some(cost), Some(wacc)) if caps.has_lcoe => {
                let fin_inputs = FinanceInputs {
                    wacc,
                    scenarios: &profile.scenarios,
                    crp_years: ctx.crp_years(),
                    case: ctx.case,
                    registry: self.registry.depreciation(),
                    selector: &profile.depreciation,
                };
                let finance = FinanceFactorEngine::new().calculate(&fin_inputs, &credits, profile.itc_keys())?;
                let lcoe = LcoeEngine::new().compute(
                    profile.strategy,
                    &LcoeInputs {
                        metrics: &inputs.metrics,
                        financial: &inputs.financial,
                        cost,
                        finance: &finance,
                        credits: &credits,
                        grid_roundtrip_efficiency: self.settings.grid_roundtrip_efficiency,
                    },
                )?;
                (Some(finance), lcoe)
            }
            _ => (None, None),
        };

        let meta = self.source.meta_data(&self.request(ctx))?;

        info!(regime = %regime, lcoe = lcoe.is_some(), "Run complete");
        Ok(RunOutput {
            technology: profile.name.clone(),
            case: ctx.case,
            crp: ctx.crp,
            crp_years: ctx.crp_years(),
            tax_credit_case: ctx.tax_credit_case,
            regime,
            inputs,
            credits,
            cost,
            finance,
            lcoe,
            meta,
            has_tax_credit: caps.has_tax_credit,
        })
    }

    /// The source request of a run.
    pub fn request<'c>(&self, ctx: &RunContext<'c>) -> SheetRequest<'c> {
        SheetRequest {
            sheet_name: &ctx.profile.sheet_name,
            case: ctx.case,
            crp: ctx.crp,
            tax_credit_case: ctx.tax_credit_case,
            scenarios: &ctx.profile.scenarios,
            base_year: ctx.profile.base_year_or(self.settings.base_year),
            end_year: self.settings.end_year,
        }
    }

    /// Reads every table the technology declares and checks it.
    pub fn load_inputs(&self, ctx: &RunContext<'_>) -> Result<RunInputs, EngineError> {
        let profile = ctx.profile;
        let caps = profile.capabilities;
        let req = self.request(ctx);
        let years = MetricTable::year_range(req.base_year, req.end_year);

        debug!("Loading metrics");
        let mut metrics = BTreeMap::new();
        for metric in profile.metrics.iter().filter(|m| **m != Metric::ConstructionFinanceFactor) {
            let table = self.metric_table(ctx, metric.header())?;
            metrics.insert(*metric, table);
        }

        if profile.has_metric(Metric::ConstructionFinanceFactor) {
            let occ = metrics.get(&Metric::OvernightCapitalCost).ok_or_else(|| {
                CoreError::shape(CFF_HEADER, "CFF is expanded onto the OCC rows, but OCC is not loaded")
            })?;
            let cff = self.construction_finance_factor(ctx, occ)?;
            metrics.insert(Metric::ConstructionFinanceFactor, cff);
        }

        let tax_credits = if caps.has_tax_credit {
            let table = self.source.tax_credits(&req)?;
            let table = table.restrict_years("tax credits", req.base_year, req.end_year)?;
            table.ensure_complete("tax credits")?;
            Some(table)
        } else {
            None
        };

        debug!("Loading assumptions");
        let financial = if caps.has_fin_assump {
            self.source.financial_assumptions(&req)?
        } else {
            FinancialAssumptions::default()
        };
        if let Some(sheet_crp) = financial.capital_recovery_period() {
            if (sheet_crp - f64::from(ctx.crp_years())).abs() > 0.5 {
                warn!(
                    sheet_crp,
                    run_crp = ctx.crp_years(),
                    "Financial assumptions were set up for a different CRP; using the run's CRP"
                );
            }
        }

        let wacc = if caps.has_wacc {
            debug!(wacc = profile.wacc_name(), "Loading WACC data");
            let wacc = self
                .source
                .wacc(&req, profile.wacc_name())?
                .restrict_years(req.base_year, req.end_year)?;
            wacc.full.ensure_complete("WACC")?;
            Some(wacc)
        } else {
            None
        };

        Ok(RunInputs { years, metrics, tax_credits, financial, wacc })
    }

    /// Reads a (tech-detail x scenario) table, drops split-layout separator
    /// rows and checks rows, years and completeness.
    pub fn metric_table(&self, ctx: &RunContext<'_>, header: &str) -> Result<MetricTable, EngineError> {
        let profile = ctx.profile;
        let req = self.request(ctx);
        let mut table =
            self.source.metric_values(&req, header, profile.num_tech_details, profile.split_layout)?;
        if profile.split_layout {
            if table.n_rows() != profile.read_window_rows() && table.n_rows() != profile.expected_rows() {
                return Err(CoreError::shape(
                    header,
                    format!(
                        "expected a read window of {} rows, found {}",
                        profile.read_window_rows(),
                        table.n_rows()
                    ),
                )
                .into());
            }
            table = table.drop_blank_rows();
        }
        table.ensure_row_count(header, profile.expected_rows())?;
        table.ensure_year_range(header, req.base_year, req.end_year)?;
        table.ensure_complete(header)?;
        Ok(table)
    }

    /// Reads the CFF rows and repeats them onto the rows of `occ`. Row `r` of
    /// `occ` is tech detail `r / scenarios` under scenario `r % scenarios`.
    fn construction_finance_factor(
        &self,
        ctx: &RunContext<'_>,
        occ: &MetricTable,
    ) -> Result<MetricTable, EngineError> {
        let profile = ctx.profile;
        let req = self.request(ctx);
        let n_scenarios = profile.scenarios.len();
        let row_count = profile.cff_layout.group_count() * n_scenarios;

        let short = self.source.construction_finance_factor(&req, CFF_HEADER, row_count)?;
        short.ensure_row_count(CFF_HEADER, row_count)?;
        short.ensure_year_range(CFF_HEADER, req.base_year, req.end_year)?;
        short.ensure_complete(CFF_HEADER)?;

        let picks: Vec<usize> = (0..occ.n_rows())
            .map(|r| {
                let group = profile.cff_layout.group_of(r / n_scenarios);
                group * n_scenarios + r % n_scenarios
            })
            .collect();
        Ok(short.pick_rows(&picks, occ.rows().to_vec())?)
    }

    /// A reference table from the source (e.g. the stored CAPEX or LCOE), read
    /// with the same checks as an input metric.
    pub fn reference_table(&self, ctx: &RunContext<'_>, header: &str) -> Result<MetricTable, EngineError> {
        self.metric_table(ctx, header).map_err(|e| ctx.wrap(e))
    }
}
