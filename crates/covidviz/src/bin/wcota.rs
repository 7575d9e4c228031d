//! Weekly Brazilian state charts from the wcota/covid19br dataset.

use covidviz_config::Preset;
use std::process::ExitCode;

fn main() -> ExitCode {
    covidviz::run_preset(Preset::Wcota)
}
