use crate::catalog::builtin_profiles;
use crate::error::TechnologyError;
use crate::profile::TechnologyProfile;
use configuration::Settings;
use finance::{DepreciationRegistry, DepreciationSchedule};
use std::collections::HashMap;
use tracing::{debug, info};

/// Read-only map from technology name to profile, plus the depreciation
/// schedules the profiles refer to. Built once and shared by reference.
#[derive(Debug, Clone)]
pub struct TechRegistry {
    profiles: Vec<TechnologyProfile>,
    index: HashMap<String, usize>,
    depreciation: DepreciationRegistry,
}

impl TechRegistry {
    /// Validates every profile against `depreciation` and indexes them by name.
    pub fn new(
        profiles: Vec<TechnologyProfile>,
        depreciation: DepreciationRegistry,
    ) -> Result<Self, TechnologyError> {
        let mut index = HashMap::with_capacity(profiles.len());
        for (i, profile) in profiles.iter().enumerate() {
            profile.validate(&depreciation)?;
            if index.insert(profile.name.clone(), i).is_some() {
                return Err(TechnologyError::Duplicate(profile.name.clone()));
            }
            debug!(technology = %profile.name, strategy = %profile.strategy, "Registered technology");
        }
        Ok(Self { profiles, index, depreciation })
    }

    /// The built-in catalog with the configured switch year and any extra
    /// depreciation schedules from the settings.
    pub fn from_settings(settings: &Settings) -> Result<Self, TechnologyError> {
        let mut depreciation = DepreciationRegistry::builtin();
        for extra in &settings.depreciation.schedules {
            depreciation.register(DepreciationSchedule::new(extra.name.clone(), extra.fractions.clone())?);
        }
        let registry = Self::new(builtin_profiles(settings.policy.depreciation_switch_year), depreciation)?;
        info!(technologies = registry.len(), "Technology registry ready");
        Ok(registry)
    }

    /// Looks a technology up by name, falling back to its sheet name.
    pub fn get(&self, name: &str) -> Result<&TechnologyProfile, TechnologyError> {
        if let Some(&i) = self.index.get(name) {
            return Ok(&self.profiles[i]);
        }
        self.profiles
            .iter()
            .find(|p| p.sheet_name == name)
            .ok_or_else(|| TechnologyError::UnknownTechnology(name.to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &TechnologyProfile> {
        self.profiles.iter()
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    pub fn depreciation(&self) -> &DepreciationRegistry {
        &self.depreciation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formula::FormulaStrategy;
    use configuration::NamedSchedule;
    use core_types::{FinancialCase, Scenario};

    #[test]
    fn builtin_catalog_is_valid() {
        let registry = TechRegistry::from_settings(&Settings::default()).unwrap();
        assert_eq!(registry.len(), 18);
        let nuclear = registry.get("Nuclear").unwrap();
        assert_eq!(nuclear.scenarios, vec![Scenario::Moderate]);
        assert_eq!(nuclear.strategy, FormulaStrategy::FuelAugmented);
        assert_eq!(registry.get("Solar - Utility PV").unwrap().name, "UtilityPV");
        assert!(registry.get("Tidal").is_err());
    }

    #[test]
    fn every_lcoe_technology_has_a_representative() {
        let registry = TechRegistry::from_settings(&Settings::default()).unwrap();
        for profile in registry.iter().filter(|p| p.capabilities.has_lcoe) {
            assert!(profile.default_tech_detail.is_some(), "{}", profile.name);
            assert!(profile.dscr.is_some(), "{}", profile.name);
        }
    }

    #[test]
    fn hydropower_switches_in_market_case() {
        let registry = TechRegistry::from_settings(&Settings::default()).unwrap();
        let hydro = registry.get("Hydropower").unwrap();
        assert_eq!(hydro.depreciation.select(FinancialCase::Market, 2024), finance::MACRS_21);
        assert_eq!(hydro.depreciation.select(FinancialCase::Market, 2025), finance::MACRS_6);
        assert_eq!(hydro.depreciation.select(FinancialCase::RAndD, 2030), finance::MACRS_21);
    }

    #[test]
    fn extra_schedules_are_registered_and_checked() {
        let mut settings = Settings::default();
        settings.depreciation.schedules.push(NamedSchedule {
            name: "SL-5".to_string(),
            fractions: vec![0.2; 5],
        });
        let registry = TechRegistry::from_settings(&settings).unwrap();
        assert!(registry.depreciation().contains("SL-5"));

        settings.depreciation.schedules.push(NamedSchedule {
            name: "broken".to_string(),
            fractions: vec![0.5],
        });
        let err = TechRegistry::from_settings(&settings).unwrap_err();
        assert!(matches!(err, TechnologyError::Finance(e) if e.is_configuration()));
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let p = TechnologyProfile::new("PSH", "PSH", 1, FormulaStrategy::CapexOnly);
        let err = TechRegistry::new(vec![p.clone(), p], DepreciationRegistry::builtin()).unwrap_err();
        assert_eq!(err, TechnologyError::Duplicate("PSH".to_string()));
    }
}
