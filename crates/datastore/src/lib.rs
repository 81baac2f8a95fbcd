//! # Assumption Datastore
//!
//! Implementations of the `AssumptionSource` read contract.
//!
//! ## Architectural Principles
//!
//! - **Adapter:** this crate is the only place that knows how assumption
//!   tables are stored. The engine sees `MetricTable`s and nothing else.
//! - **Read-only:** sources never change the data they serve, so one source is
//!   shared by every run of a parallel batch.
//!
//! ## Public API
//!
//! - `CsvAssumptionSource`: a directory of CSV files, one per table.
//! - `MemorySource`: tables built in code.
//! - `SourceError`: the specific error types that can be returned from this crate.

pub mod csv_source;
pub mod error;
pub mod memory;

pub use csv_source::{read_year_table, slug, CsvAssumptionSource};
pub use error::SourceError;
pub use memory::MemorySource;
