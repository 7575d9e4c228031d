//! Charts from the Kaggle Ministry of Health dataset (`brazil_covid19.csv`).

use covidviz_config::Preset;
use std::process::ExitCode;

fn main() -> ExitCode {
    covidviz::run_preset(Preset::Kaggle)
}
