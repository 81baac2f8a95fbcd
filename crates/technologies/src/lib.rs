//! # Technology Catalog
//!
//! Data-driven descriptions of the generation technologies the calculator
//! knows about.
//!
//! ## Architectural Principles
//!
//! - **Records, not subclasses:** every technology is a `TechnologyProfile`
//!   value. Behaviour differences are expressed through flags, a depreciation
//!   rule table and one of a closed set of `FormulaStrategy` variants.
//! - **Built once:** the `TechRegistry` validates every profile when it is
//!   constructed and is only read afterwards, so it can be shared across the
//!   threads of a batch without locking.
//! - **Extensibility:** adding a technology means adding one entry to
//!   `catalog::builtin_profiles`.

pub mod catalog;
pub mod error;
pub mod formula;
pub mod metric;
pub mod profile;
pub mod registry;

pub use catalog::builtin_profiles;
pub use error::TechnologyError;
pub use formula::FormulaStrategy;
pub use metric::{Metric, OutputField};
pub use profile::{Capabilities, CffLayout, TechnologyProfile};
pub use registry::TechRegistry;
