use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Technology-advancement trajectory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Scenario {
    Advanced,
    Moderate,
    Conservative,
}

impl Scenario {
    /// The three scenarios in the order the assumption tables list them.
    pub const ALL: [Scenario; 3] = [Scenario::Advanced, Scenario::Moderate, Scenario::Conservative];

    pub fn as_str(&self) -> &'static str {
        match self {
            Scenario::Advanced => "Advanced",
            Scenario::Moderate => "Moderate",
            Scenario::Conservative => "Conservative",
        }
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Scenario {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Advanced" => Ok(Scenario::Advanced),
            "Moderate" => Ok(Scenario::Moderate),
            "Conservative" => Ok(Scenario::Conservative),
            other => Err(CoreError::Parse { kind: "scenario", value: other.to_string() }),
        }
    }
}

/// The financial assumption set a run is evaluated under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FinancialCase {
    Market,
    #[serde(rename = "R&D")]
    RAndD,
}

impl FinancialCase {
    pub const ALL: [FinancialCase; 2] = [FinancialCase::Market, FinancialCase::RAndD];

    pub fn as_str(&self) -> &'static str {
        match self {
            FinancialCase::Market => "Market",
            FinancialCase::RAndD => "R&D",
        }
    }
}

impl fmt::Display for FinancialCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FinancialCase {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "MARKET" => Ok(FinancialCase::Market),
            "R&D" => Ok(FinancialCase::RAndD),
            _ => Err(CoreError::Parse { kind: "financial case", value: s.to_string() }),
        }
    }
}

/// Capital recovery period choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CrpChoice {
    Years20,
    Years30,
    TechLife,
}

impl CrpChoice {
    pub const ALL: [CrpChoice; 3] = [CrpChoice::Years20, CrpChoice::Years30, CrpChoice::TechLife];

    /// Resolves the choice to a number of years for a technology with the given lifetime.
    pub fn years(&self, tech_life: u32) -> u32 {
        match self {
            CrpChoice::Years20 => 20,
            CrpChoice::Years30 => 30,
            CrpChoice::TechLife => tech_life,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CrpChoice::Years20 => "20",
            CrpChoice::Years30 => "30",
            CrpChoice::TechLife => "TechLife",
        }
    }
}

impl fmt::Display for CrpChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CrpChoice {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "20" => Ok(CrpChoice::Years20),
            "30" => Ok(CrpChoice::Years30),
            "TechLife" => Ok(CrpChoice::TechLife),
            other => Err(CoreError::Parse { kind: "CRP choice", value: other.to_string() }),
        }
    }
}

/// A tax-credit case requested from the assumption source. Only technologies
/// that declare cases (PV-plus-battery) are run once per case in the Market case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TaxCreditCase {
    #[serde(rename = "ITC only")]
    ItcOnly,
    #[serde(rename = "PV PTC and Battery ITC")]
    PvPtcBatteryItc,
}

impl TaxCreditCase {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaxCreditCase::ItcOnly => "ITC only",
            TaxCreditCase::PvPtcBatteryItc => "PV PTC and Battery ITC",
        }
    }
}

impl fmt::Display for TaxCreditCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaxCreditCase {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "ITC only" => Ok(TaxCreditCase::ItcOnly),
            "PV PTC and Battery ITC" => Ok(TaxCreditCase::PvPtcBatteryItc),
            other => Err(CoreError::Parse { kind: "tax credit case", value: other.to_string() }),
        }
    }
}

/// The credit regime a run turned out to be under, as written to the
/// `TaxCreditCase` output column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaxCreditRegime {
    None,
    Ptc,
    Itc,
    PtcAndItc,
    ItcOnly,
    PvPtcBatteryItc,
}

impl TaxCreditRegime {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaxCreditRegime::None => "None",
            TaxCreditRegime::Ptc => "PTC",
            TaxCreditRegime::Itc => "ITC",
            TaxCreditRegime::PtcAndItc => "PTC + ITC",
            TaxCreditRegime::ItcOnly => "ITC only",
            TaxCreditRegime::PvPtcBatteryItc => "PV PTC and Battery ITC",
        }
    }
}

impl fmt::Display for TaxCreditRegime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which ITC schedule row a PFF track reads from the tax-credit table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ItcKey {
    Plain,
    Pv,
    Battery,
}

impl ItcKey {
    pub fn suffix(&self) -> &'static str {
        match self {
            ItcKey::Plain => "",
            ItcKey::Pv => " - PV",
            ItcKey::Battery => " - Battery",
        }
    }

    /// Row label of the ITC schedule in a tax-credit table, e.g. `ITC Schedule - PV/*`.
    pub fn row_label(&self) -> String {
        format!("ITC Schedule{}/*", self.suffix())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crp_resolves_tech_life() {
        assert_eq!(CrpChoice::Years20.years(100), 20);
        assert_eq!(CrpChoice::TechLife.years(75), 75);
    }

    #[test]
    fn case_parsing_is_case_insensitive_for_market() {
        assert_eq!("market".parse::<FinancialCase>().unwrap(), FinancialCase::Market);
        assert_eq!("R&D".parse::<FinancialCase>().unwrap(), FinancialCase::RAndD);
        assert!("Policy".parse::<FinancialCase>().is_err());
    }

    #[test]
    fn itc_row_labels() {
        assert_eq!(ItcKey::Plain.row_label(), "ITC Schedule/*");
        assert_eq!(ItcKey::Battery.row_label(), "ITC Schedule - Battery/*");
    }
}
