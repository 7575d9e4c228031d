//! Configuration loading utilities

use crate::defaults::Preset;
use crate::schema::PipelineConfig;
use crate::validator::ConfigValidator;
use covidviz_common::{CovidVizError, Result as CovidVizResult};
use std::env;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;
use tracing::{debug, info};

/// Environment variable naming a YAML file that replaces the preset.
pub const CONFIG_PATH_ENV: &str = "COVIDVIZ_CONFIG";

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O error when reading configuration file
    #[error("Failed to read configuration file '{}': {source}", path.display())]
    IoError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// YAML parsing error
    #[error("Failed to parse YAML configuration: {0}")]
    ParseError(#[from] serde_yaml::Error),

    /// Configuration validation error
    #[error("Configuration validation failed: {0}")]
    ValidationError(#[source] CovidVizError),

    /// Environment variable parsing error
    #[error("Failed to parse environment variable '{var}': {source}")]
    EnvParseError {
        var: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl From<ConfigError> for CovidVizError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::ValidationError(inner) => inner,
            other => Self::config_with_source(other.to_string(), other),
        }
    }
}

/// Configuration loader for the pipeline binaries
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load the configuration for `preset` from the process environment.
    ///
    /// When `COVIDVIZ_CONFIG` is set the YAML file it names replaces the
    /// preset; environment overrides are applied on top and the result is
    /// validated.
    pub fn load(preset: Preset) -> CovidVizResult<PipelineConfig> {
        Ok(Self::load_with(preset, |name| env::var(name).ok())?)
    }

    /// Same as [`ConfigLoader::load`] with an injectable variable lookup.
    pub fn load_with<F>(preset: Preset, lookup: F) -> Result<PipelineConfig, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match lookup(CONFIG_PATH_ENV) {
            Some(path) if !path.trim().is_empty() => {
                info!(path = %path, "Loading configuration file");
                Self::read_file(path.trim())?
            }
            _ => {
                debug!(preset = %preset, "Using built-in configuration");
                preset.config()
            }
        };

        Self::apply_env_overrides(&mut config, &lookup)?;
        ConfigValidator::validate(&config).map_err(ConfigError::ValidationError)?;
        Ok(config)
    }

    /// Load and validate a configuration file without environment overrides.
    pub fn load_config<P: AsRef<Path>>(path: P) -> Result<PipelineConfig, ConfigError> {
        let config = Self::read_file(path)?;
        ConfigValidator::validate(&config).map_err(ConfigError::ValidationError)?;
        Ok(config)
    }

    /// Parse a configuration from YAML text without validating it.
    pub fn from_yaml_str(content: &str) -> Result<PipelineConfig, ConfigError> {
        Ok(serde_yaml::from_str(content)?)
    }

    fn read_file<P: AsRef<Path>>(path: P) -> Result<PipelineConfig, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::IoError {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&content)
    }

    /// Apply environment variable overrides to configuration
    pub fn apply_env_overrides<F>(config: &mut PipelineConfig, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(source) = lookup("COVIDVIZ_SOURCE") {
            config.source.location = source;
        }

        if let Some(dir) = lookup("COVIDVIZ_OUTPUT_DIR") {
            config.output.dir = PathBuf::from(dir);
        }

        if let Some(user_agent) = lookup("COVIDVIZ_USER_AGENT") {
            config.source.user_agent = user_agent;
        }

        if let Some(font) = lookup("COVIDVIZ_FONT") {
            config.output.font_paths.insert(0, PathBuf::from(font));
        }

        if let Some(timeout) = parse_var(&lookup, "COVIDVIZ_TIMEOUT_SECONDS")? {
            config.source.timeout_seconds = Some(timeout);
        }

        if let Some(width) = parse_var(&lookup, "COVIDVIZ_CHART_WIDTH")? {
            config.output.width = width;
        }

        if let Some(height) = parse_var(&lookup, "COVIDVIZ_CHART_HEIGHT")? {
            config.output.height = height;
        }

        Ok(())
    }
}

fn parse_var<F, T>(lookup: &F, var: &str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    lookup(var)
        .map(|raw| {
            raw.trim().parse().map_err(|e| ConfigError::EnvParseError {
                var: var.to_string(),
                source: Box::new(e),
            })
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    /// Create a temporary YAML config file for testing
    fn create_test_config_file(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("Failed to create temp file");
        file.write_all(content.as_bytes()).expect("Failed to write to temp file");
        file
    }

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    const MINIMAL_YAML: &str = r##"
source:
  name: test
  location: data.csv
  columns:
    date: [date, data]
    metrics:
      total_cases: [casosAcumulado]
charts:
  - name: acumulados
    file_name: acumulados.png
    title: Casos
    data:
      kind: metrics
      metrics: [total_cases]
    series:
      - column: total_cases
        color: "#1f77b4"
"##;

    #[test]
    fn test_load_valid_yaml_config() {
        let temp_file = create_test_config_file(MINIMAL_YAML);
        let config = ConfigLoader::load_config(temp_file.path()).expect("Failed to load config");

        assert_eq!(config.source.name, "test");
        assert_eq!(config.charts.len(), 1);
        // Should use defaults for unspecified values
        assert_eq!(config.output.dir, PathBuf::from("imgs"));
        assert_eq!(config.source.default_category, "all");
    }

    #[test]
    fn test_invalid_yaml() {
        let temp_file = create_test_config_file("source:\n  name: [unclosed");
        let result = ConfigLoader::load_config(temp_file.path());
        assert!(matches!(result.unwrap_err(), ConfigError::ParseError(_)));
    }

    #[test]
    fn test_validation_error() {
        let invalid = MINIMAL_YAML.replace("\"#1f77b4\"", "\"not-a-color\"");
        let temp_file = create_test_config_file(&invalid);
        let result = ConfigLoader::load_config(temp_file.path());
        assert!(matches!(result.unwrap_err(), ConfigError::ValidationError(_)));
    }

    #[test]
    fn test_missing_config_file() {
        let result = ConfigLoader::load_config("/nonexistent/path/config.yaml");
        assert!(matches!(result.unwrap_err(), ConfigError::IoError { .. }));
    }

    #[test]
    fn test_preset_without_overrides() {
        let config = ConfigLoader::load_with(Preset::Owid, vars(&[])).unwrap();
        assert_eq!(config, Preset::Owid.config());
    }

    #[test]
    fn test_environment_variable_overrides() {
        let lookup = vars(&[
            ("COVIDVIZ_SOURCE", "/tmp/other.csv"),
            ("COVIDVIZ_OUTPUT_DIR", "out"),
            ("COVIDVIZ_USER_AGENT", "agent/1.0"),
            ("COVIDVIZ_FONT", "/fonts/custom.ttf"),
            ("COVIDVIZ_TIMEOUT_SECONDS", "30"),
            ("COVIDVIZ_CHART_WIDTH", " 1600 "),
            ("COVIDVIZ_CHART_HEIGHT", "900"),
        ]);
        let config = ConfigLoader::load_with(Preset::Wcota, lookup).unwrap();

        assert_eq!(config.source.location, "/tmp/other.csv");
        assert_eq!(config.output.dir, PathBuf::from("out"));
        assert_eq!(config.source.user_agent, "agent/1.0");
        assert_eq!(config.output.font_paths[0], PathBuf::from("/fonts/custom.ttf"));
        assert_eq!(config.source.timeout_seconds, Some(30));
        assert_eq!(config.output.width, 1600);
        assert_eq!(config.output.height, 900);
    }

    #[test]
    fn test_env_parse_error() {
        let result = ConfigLoader::load_with(Preset::Kaggle, vars(&[("COVIDVIZ_CHART_WIDTH", "wide")]));
        match result.unwrap_err() {
            ConfigError::EnvParseError { var, .. } => assert_eq!(var, "COVIDVIZ_CHART_WIDTH"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_config_file_replaces_preset() {
        let temp_file = create_test_config_file(MINIMAL_YAML);
        let path = temp_file.path().to_string_lossy().into_owned();
        let config = ConfigLoader::load_with(Preset::Wcota, vars(&[(CONFIG_PATH_ENV, &path)])).unwrap();
        assert_eq!(config.source.name, "test");
    }

    #[test]
    fn test_validation_error_converts_to_common_error() {
        let lookup = vars(&[("COVIDVIZ_CHART_HEIGHT", "0")]);
        let err: CovidVizError = ConfigLoader::load_with(Preset::Kaggle, lookup).unwrap_err().into();
        assert!(matches!(err, CovidVizError::Validation { .. }));
    }
}
