//! # covidviz
//!
//! Fetches a COVID-19 dataset, reshapes it and renders a fixed set of charts.
//!
//! The `covidviz-kaggle`, `covidviz-owid` and `covidviz-wcota` binaries each
//! run one [`Preset`](covidviz_config::Preset) once and exit.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod app;
pub mod error;

pub use app::*;
pub use error::*;
