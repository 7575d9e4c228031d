//! Error types and constructors shared across the covidviz crates.

use thiserror::Error;

/// Result type alias for covidviz operations.
pub type Result<T> = std::result::Result<T, CovidVizError>;

/// Boxed error source carried by the struct variants.
pub type BoxedSource = Box<dyn std::error::Error + Send + Sync>;

/// Main error type for covidviz operations.
#[derive(Error, Debug)]
pub enum CovidVizError {
    /// Configuration related errors.
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<BoxedSource>,
    },

    /// CSV decoding errors.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Network related errors (dataset download).
    #[error("Network error: {message}")]
    Network {
        message: String,
        status_code: Option<u16>,
        #[source]
        source: Option<BoxedSource>,
    },

    /// The dataset could not be turned into records.
    #[error("Data load error: {message}")]
    DataLoad {
        message: String,
        #[source]
        source: Option<BoxedSource>,
    },

    /// None of the aliases of a required column were found in the header.
    #[error("Missing column '{logical}': none of [{}] found in header", tried.join(", "))]
    MissingColumn { logical: String, tried: Vec<String> },

    /// Pivot, resample or derived-series failures.
    #[error("Reshape error: {message}")]
    Reshape { message: String },

    /// Chart drawing and image encoding failures.
    #[error("Graph error: {message}")]
    Graph {
        message: String,
        #[source]
        source: Option<BoxedSource>,
    },

    /// Validation errors for configuration values.
    #[error("Validation error: {message}")]
    Validation {
        message: String,
        field: Option<String>,
    },
}

impl CovidVizError {
    /// Create a new configuration error with source.
    pub fn config_with_source(
        msg: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Config {
            message: msg.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a new network error for an unexpected HTTP status.
    pub fn network_with_status(msg: impl Into<String>, status: u16) -> Self {
        Self::Network {
            message: msg.into(),
            status_code: Some(status),
            source: None,
        }
    }

    /// Create a new network error with source.
    pub fn network_with_source(
        msg: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Network {
            message: msg.into(),
            status_code: None,
            source: Some(Box::new(source)),
        }
    }

    /// Create a new data load error with source.
    pub fn data_load_with_source(
        msg: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::DataLoad {
            message: msg.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a missing column error listing the aliases that were tried.
    pub fn missing_column(logical: impl Into<String>, tried: &[String]) -> Self {
        Self::MissingColumn {
            logical: logical.into(),
            tried: tried.to_vec(),
        }
    }

    /// Create a new reshape error.
    pub fn reshape(msg: impl Into<String>) -> Self {
        Self::Reshape {
            message: msg.into(),
        }
    }

    /// Create a new graph error.
    pub fn graph(msg: impl Into<String>) -> Self {
        Self::Graph {
            message: msg.into(),
            source: None,
        }
    }

    /// Create a new graph error with source.
    pub fn graph_with_source(
        msg: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Graph {
            message: msg.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a new validation error with field name.
    pub fn validation_field(msg: impl Into<String>, field: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
            field: Some(field.into()),
        }
    }

    /// HTTP status attached to a network error, if any.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Network { status_code, .. } => *status_code,
            _ => None,
        }
    }
}

// Error conversion implementations for external types

/// Convert from reqwest::Error to CovidVizError
impl From<reqwest::Error> for CovidVizError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::network_with_source("Request timeout", err)
        } else if err.is_connect() {
            Self::network_with_source("Connection failed", err)
        } else if err.is_status() {
            let status_code = err.status().map(|s| s.as_u16()).unwrap_or(0);
            Self::network_with_source(format!("HTTP error: {status_code}"), err)
        } else {
            Self::network_with_source("Network request failed", err)
        }
    }
}

/// Convert from serde_yaml::Error to CovidVizError
impl From<serde_yaml::Error> for CovidVizError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::config_with_source("YAML parsing error", err)
    }
}

#[cfg(feature = "plotters")]
/// Convert from plotters drawing errors to CovidVizError
impl<T> From<plotters::drawing::DrawingAreaErrorKind<T>> for CovidVizError
where
    T: std::error::Error + Send + Sync + 'static,
{
    fn from(err: plotters::drawing::DrawingAreaErrorKind<T>) -> Self {
        Self::graph_with_source("Graph rendering failed", err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{error::Error, io};

    #[test]
    fn test_error_creation() {
        let config_error = CovidVizError::config_with_source(
            "Failed to create output directory 'imgs'",
            io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        );
        assert_eq!(
            config_error.to_string(),
            "Configuration error: Failed to create output directory 'imgs'"
        );

        let network_error = CovidVizError::network_with_status("bad status", 503);
        assert!(network_error.to_string().contains("Network error"));
        assert_eq!(network_error.status_code(), Some(503));

        let validation_error = CovidVizError::validation_field("Invalid window", "rolling");
        assert!(validation_error.to_string().contains("Validation error"));
        assert!(validation_error.to_string().contains("Invalid window"));

        assert_eq!(CovidVizError::reshape("x").status_code(), None);
    }

    #[test]
    fn test_missing_column_lists_aliases() {
        let err = CovidVizError::missing_column("date", &["date".to_string(), "data".to_string()]);
        assert_eq!(
            err.to_string(),
            "Missing column 'date': none of [date, data] found in header"
        );
    }

    #[test]
    fn test_error_with_source() {
        let wrapped = CovidVizError::data_load_with_source(
            "Failed to read dataset",
            io::Error::new(io::ErrorKind::NotFound, "File not found"),
        );

        assert!(wrapped.to_string().contains("Failed to read dataset"));
        assert!(wrapped.source().is_some());
    }

    #[test]
    fn test_yaml_error_conversion() {
        let yaml_error = serde_yaml::from_str::<Vec<u32>>("{ not: [a, list").unwrap_err();
        let err: CovidVizError = yaml_error.into();

        assert!(err.to_string().contains("Configuration error"));
        assert!(err.source().is_some());
    }
}
