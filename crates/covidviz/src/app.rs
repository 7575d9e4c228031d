//! One pipeline run, shared by the three binaries.

use crate::error::{AppError, AppResult};
use covidviz_common::{init_logging, LoggingConfig};
use covidviz_config::{ConfigLoader, PipelineConfig, Preset};
use covidviz_graphs::{ChartManager, DataFetcher, PlottersRenderer, RunReport};
use std::process::ExitCode;
use tracing::{error, info, warn};

/// Selects the log output format; `json` switches to one JSON object per line.
pub const LOG_FORMAT_ENV: &str = "COVIDVIZ_LOG_FORMAT";

/// Logging settings derived from the environment.
pub fn logging_config<F>(lookup: F) -> LoggingConfig
where
    F: Fn(&str) -> Option<String>,
{
    let json_format = lookup(LOG_FORMAT_ENV).is_some_and(|format| format.trim().eq_ignore_ascii_case("json"));
    LoggingConfig {
        json_format,
        ansi: !json_format,
        ..LoggingConfig::default()
    }
}

/// A validated configuration ready to run.
pub struct App {
    config: PipelineConfig,
}

impl App {
    pub const fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Loads the preset, honouring `COVIDVIZ_*` overrides.
    pub fn from_preset(preset: Preset) -> AppResult<Self> {
        ConfigLoader::load(preset).map(Self::new).map_err(AppError::Config)
    }

    /// Loads the dataset and renders every chart.
    pub fn run(self) -> AppResult<RunReport> {
        let fetcher = DataFetcher::from_source(&self.config.source)?;
        let renderer = PlottersRenderer::new(&self.config.output.font_paths);
        let manager = ChartManager::new(self.config, renderer);
        Ok(manager.run(&fetcher)?)
    }
}

/// Entry point of every binary: exit code 1 when the run aborts, 0 otherwise.
pub fn run_preset(preset: Preset) -> ExitCode {
    if let Err(err) = init_logging(&logging_config(|name| std::env::var(name).ok())) {
        eprintln!("{err}");
    }
    info!(preset = %preset, "Starting covidviz");

    exit_code(&App::from_preset(preset).and_then(App::run))
}

/// Logs the outcome of a run and maps it to the process exit code.
///
/// Charts that failed individually do not make the run fail.
pub fn exit_code(outcome: &AppResult<RunReport>) -> ExitCode {
    match outcome {
        Ok(report) => {
            if report.is_complete() {
                info!(charts = report.rendered.len(), "All charts generated");
            } else {
                let failed: Vec<&str> = report.failed.iter().map(|(name, _)| name.as_str()).collect();
                warn!(rendered = report.rendered.len(), failed = ?failed, "Some charts could not be generated");
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!(error = %err, status = ?err.status_code(), "Run aborted");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use covidviz_common::CovidVizError;

    #[test]
    fn test_logging_format_from_env() {
        assert!(!logging_config(|_| None).json_format);

        let json = logging_config(|name| (name == LOG_FORMAT_ENV).then(|| " JSON ".to_string()));
        assert!(json.json_format);
        assert!(!json.ansi);

        assert!(!logging_config(|_| Some("pretty".to_string())).json_format);
    }

    #[test]
    fn test_missing_local_source_aborts() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Preset::Owid.config();
        config.source.location = dir.path().join("owid-covid-data.csv").to_string_lossy().into_owned();
        config.output.dir = dir.path().join("imgs");

        let outcome = App::new(config).run();
        assert_eq!(exit_code(&outcome), ExitCode::FAILURE);

        let err = outcome.unwrap_err();
        assert!(matches!(err, AppError::Pipeline(_)));
        assert_eq!(err.status_code(), None);
    }

    #[test]
    fn test_failed_charts_still_exit_successfully() {
        let partial = RunReport {
            rendered: vec!["acumulados_kaggle".to_string()],
            failed: vec![("novos_casos_kaggle".to_string(), "Metric 'new_cases' not found".to_string())],
        };
        assert_eq!(exit_code(&Ok(partial)), ExitCode::SUCCESS);

        let complete = RunReport {
            rendered: vec!["acumulados_kaggle".to_string()],
            failed: Vec::new(),
        };
        assert_eq!(exit_code(&Ok(complete)), ExitCode::SUCCESS);
    }

    #[test]
    fn test_download_status_aborts() {
        let outcome = Err(AppError::Pipeline(CovidVizError::network_with_status("Unexpected status", 503)));
        assert_eq!(exit_code(&outcome), ExitCode::FAILURE);
        assert_eq!(outcome.unwrap_err().status_code(), Some(503));
    }
}
