use crate::error::ConfigError;
use std::path::Path;

// Declare the modules that make up this crate.
pub mod error;
pub mod settings;
pub mod telemetry;

// Re-export the core types to provide a clean public API.
pub use settings::{
    BatchSettings, DebtFractionSettings, DepreciationSettings, Hybrid, LogFormat, Logging,
    NamedSchedule, Policy, Settings, Validation, Years,
};
pub use telemetry::init_logging;

/// The file looked up in the working directory when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "lcoe.toml";

/// Loads the application configuration.
///
/// Reads `path` (or an optional `lcoe.toml` in the working directory), layers
/// `ATB__SECTION__KEY` environment variables on top, deserializes the result
/// into `Settings` and validates it. Every section has defaults, so running
/// without any file is valid.
pub fn load_settings(path: Option<&Path>) -> Result<Settings, ConfigError> {
    let file = match path {
        Some(p) => config::File::from(p).required(true),
        None => config::File::with_name(DEFAULT_CONFIG_FILE).required(false),
    };

    let builder = config::Config::builder()
        .add_source(file)
        .add_source(config::Environment::with_prefix("ATB").separator("__"))
        .build()?;

    let settings = builder.try_deserialize::<Settings>()?;
    validate(&settings)?;

    Ok(settings)
}

/// Checks the cross-field rules serde cannot express.
pub fn validate(settings: &Settings) -> Result<(), ConfigError> {
    let years = &settings.years;
    if years.end_year < years.base_year {
        return Err(ConfigError::ValidationError(format!(
            "end_year ({}) must not precede base_year ({})",
            years.end_year, years.base_year
        )));
    }
    if settings.validation.rtol < 0.0 || settings.validation.atol < 0.0 {
        return Err(ConfigError::ValidationError(
            "validation tolerances must be non-negative".to_string(),
        ));
    }
    let rte = settings.hybrid.grid_roundtrip_efficiency;
    if !(rte > 0.0 && rte <= 1.0) {
        return Err(ConfigError::ValidationError(format!(
            "grid_roundtrip_efficiency must be in (0, 1], got {rte}"
        )));
    }
    if settings.debt_fraction.crp_years == 0 {
        return Err(ConfigError::ValidationError(
            "debt_fraction.crp_years must be positive".to_string(),
        ));
    }
    for schedule in &settings.depreciation.schedules {
        if schedule.name.trim().is_empty() || schedule.fractions.is_empty() {
            return Err(ConfigError::ValidationError(
                "depreciation schedules need a name and at least one fraction".to_string(),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let settings = Settings::default();
        assert!(validate(&settings).is_ok());
        assert_eq!(settings.years.base_year, 2021);
        assert_eq!(settings.policy.tax_credit_excluded_leading_years, 1);
        assert!((settings.hybrid.grid_roundtrip_efficiency - 0.85).abs() < 1e-12);
    }

    #[test]
    fn inverted_year_range_is_rejected() {
        let mut settings = Settings::default();
        settings.years.end_year = 2000;
        assert!(matches!(validate(&settings), Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn loads_partial_file() {
        let path = std::env::temp_dir().join(format!("atb-lcoe-settings-{}.toml", std::process::id()));
        std::fs::write(
            &path,
            "[years]\nbase_year = 2023\nend_year = 2050\n\n[hybrid]\ngrid_roundtrip_efficiency = 0.9\n",
        )
        .unwrap();
        let settings = load_settings(Some(&path)).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(settings.years.base_year, 2023);
        assert!((settings.hybrid.grid_roundtrip_efficiency - 0.9).abs() < 1e-12);
        assert!(settings.validation.check_lcoe);
    }
}
