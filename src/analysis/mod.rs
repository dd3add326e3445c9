//! Statistics aggregation.
//!
//! The engine in [`aggregator`] drives the forge client; the helpers in
//! [`contributors`] and [`languages`] hold the merge and filtering rules.

pub mod aggregator;
pub mod contributors;
pub mod languages;

pub use aggregator::{aggregate, AggregateOptions};
