//! # Core Types
//!
//! The foundational data structures shared by every crate of the LCOE
//! calculator: the year-indexed `MetricTable`, the domain enums, the
//! financial-assumption containers and the read contract of the external
//! assumption-table source.

pub mod assumptions;
pub mod enums;
pub mod error;
pub mod source;
pub mod table;

// Re-export the core types to provide a clean public API.
pub use assumptions::{FinancialAssumptions, WaccTables};
pub use enums::{CrpChoice, FinancialCase, ItcKey, Scenario, TaxCreditCase, TaxCreditRegime};
pub use error::CoreError;
pub use source::{AssumptionSource, MetaRecord, SheetRequest};
pub use table::{split_label, MetricTable};
