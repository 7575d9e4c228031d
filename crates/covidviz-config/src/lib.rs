//! # covidviz Config
//!
//! Configuration schema, built-in source presets and loading for covidviz.
//!
//! Each binary starts from a [`Preset`], which may be replaced by a YAML file
//! and adjusted through `COVIDVIZ_*` environment variables before validation.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod defaults;
pub mod loader;
pub mod schema;
pub mod validator;

pub use defaults::*;
pub use loader::*;
pub use schema::*;
pub use validator::*;
