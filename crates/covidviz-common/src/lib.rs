//! # covidviz Common
//!
//! Shared error type, logging setup, small enums and formatting helpers.
//!
//! This crate is the foundation the configuration, graph and binary crates
//! of the covidviz workspace build on.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod logging;
pub mod types;
pub mod utils;

#[cfg(any(test, feature = "testing"))]
pub mod test_utils;

pub use error::{BoxedSource, CovidVizError, Result};
pub use logging::{init_logging, LoggingConfig};
pub use types::*;
pub use utils::*;
