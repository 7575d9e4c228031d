//! # covidviz Graphs
//!
//! Dataset loading, reshaping and chart rendering for COVID-19 time series.
//!
//! A run fetches one CSV source into a long-format [`Dataset`], pivots it into
//! a date-indexed [`WideTable`] per chart, applies the configured transforms
//! and hands the result to a [`ChartRenderer`] that writes a PNG.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod chart_spec;
pub mod data_fetcher;
pub mod dataset;
pub mod fonts;
pub mod loader;
pub mod manager;
pub mod renderer;
pub mod traits;
pub mod transform;
pub mod wide_table;

pub use chart_spec::*;
pub use data_fetcher::*;
pub use dataset::*;
pub use loader::*;
pub use manager::*;
pub use renderer::*;
pub use traits::*;
pub use transform::*;
pub use wide_table::*;
