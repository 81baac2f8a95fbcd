use core_types::Scenario;
use serde::Deserialize;
use std::path::PathBuf;

/// The root configuration structure for the entire application.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub years: Years,
    #[serde(default)]
    pub policy: Policy,
    #[serde(default)]
    pub validation: Validation,
    #[serde(default)]
    pub hybrid: Hybrid,
    #[serde(default)]
    pub batch: BatchSettings,
    #[serde(default)]
    pub debt_fraction: DebtFractionSettings,
    #[serde(default)]
    pub logging: Logging,
    #[serde(default)]
    pub depreciation: DepreciationSettings,
}

/// The year range every assumption table is bounded to.
#[derive(Debug, Clone, Deserialize)]
pub struct Years {
    /// First year of data for technologies that do not override it.
    pub base_year: i32,
    /// Last projected year.
    pub end_year: i32,
}

/// Incentive-policy knobs that are dated to a specific law change.
#[derive(Debug, Clone, Deserialize)]
pub struct Policy {
    /// Leading year columns left out of the tax-credit classification sums.
    /// The first data year predates the current incentive regime.
    pub tax_credit_excluded_leading_years: usize,
    /// First year in which switching technologies move to the accelerated schedule.
    pub depreciation_switch_year: i32,
}

/// Tolerances for comparing computed tables against reference tables.
#[derive(Debug, Clone, Deserialize)]
pub struct Validation {
    pub rtol: f64,
    pub atol: f64,
    pub check_capex: bool,
    pub check_lcoe: bool,
}

/// Constants of the PV-plus-battery formula.
#[derive(Debug, Clone, Deserialize)]
pub struct Hybrid {
    /// Round-trip efficiency of battery energy charged from the grid.
    pub grid_roundtrip_efficiency: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BatchSettings {
    /// Worker threads for the batch pool. 0 lets rayon decide.
    pub threads: usize,
    /// Stop dispatching new runs after a configuration error.
    pub abort_on_configuration_error: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DebtFractionSettings {
    /// External solver program. Receives the parameter record as JSON on stdin.
    pub solver_command: Option<PathBuf>,
    #[serde(default)]
    pub solver_args: Vec<String>,
    pub representative_scenario: Scenario,
    /// CRP the representative run is evaluated with.
    pub crp_years: u32,
}

/// Output style of the console log.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Full,
    Compact,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Logging {
    /// When set, a daily rolling log file is written here as well.
    pub directory: Option<PathBuf>,
    pub file_prefix: String,
    #[serde(default)]
    pub format: LogFormat,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DepreciationSettings {
    /// Extra named schedules on top of the built-in MACRS tables.
    #[serde(default)]
    pub schedules: Vec<NamedSchedule>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NamedSchedule {
    pub name: String,
    pub fractions: Vec<f64>,
}

// --- Default Implementations ---
// This allows a user to omit any section from their toml
// and still have it work with the standard assumptions.

impl Default for Years {
    fn default() -> Self {
        Self { base_year: 2021, end_year: 2050 }
    }
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            tax_credit_excluded_leading_years: 1,
            depreciation_switch_year: 2025,
        }
    }
}

impl Default for Validation {
    fn default() -> Self {
        Self {
            rtol: 1e-5,
            atol: 1e-8,
            check_capex: true,
            check_lcoe: true,
        }
    }
}

impl Default for Hybrid {
    fn default() -> Self {
        Self { grid_roundtrip_efficiency: 0.85 }
    }
}

impl Default for BatchSettings {
    fn default() -> Self {
        Self {
            threads: 0,
            abort_on_configuration_error: true,
        }
    }
}

impl Default for DebtFractionSettings {
    fn default() -> Self {
        Self {
            solver_command: None,
            solver_args: Vec::new(),
            representative_scenario: Scenario::Moderate,
            crp_years: 20,
        }
    }
}

impl Default for Logging {
    fn default() -> Self {
        Self {
            directory: None,
            file_prefix: "atb-lcoe.log".to_string(),
            format: LogFormat::Full,
        }
    }
}
