//! # Run Engine
//!
//! Orchestrates a single run: one technology evaluated under one financial
//! case, capital recovery period and (optionally) tax-credit case.
//!
//! ## Flow
//!
//! 1. `Runner::load_inputs` reads every table the technology declares from the
//!    `AssumptionSource` and checks shape, year range and completeness.
//! 2. Tax credits are resolved and classified into a `TaxCreditRegime`.
//! 3. `CostEngine` computes CAPEX, CFC and AEP.
//! 4. The finance factors (CRF, PFF) are computed per scenario and year.
//! 5. `LcoeEngine` applies the technology's `FormulaStrategy`.
//!
//! A run never mutates shared state, so any number of runs can execute in
//! parallel against the same registry and source.

pub mod cost;
pub mod error;
pub mod flat;
pub mod lcoe;
pub mod run;

pub use cost::{CostEngine, CostResult, HOURS_PER_YEAR};
pub use error::EngineError;
pub use flat::{FlatRow, FlatTable, LongRecord, META_COLUMNS, PLACEHOLDER};
pub use lcoe::{LcoeEngine, LcoeInputs, LcoeResult};
pub use run::{RunContext, RunInputs, RunOutput, RunSettings, Runner};
