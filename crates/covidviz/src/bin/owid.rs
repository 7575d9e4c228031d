//! Charts from the Our World in Data dataset (`owid-covid-data.csv`).

use covidviz_config::Preset;
use std::process::ExitCode;

fn main() -> ExitCode {
    covidviz::run_preset(Preset::Owid)
}
