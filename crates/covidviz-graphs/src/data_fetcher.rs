//! Dataset retrieval from a local file or a remote URL.

use covidviz_common::{CovidVizError, Result};
use covidviz_config::{SourceConfig, SourceLocation};
use reqwest::blocking::Client;
use reqwest::header::USER_AGENT;
use reqwest::StatusCode;
use std::time::Duration;
use tracing::{debug, info};

/// Reads the raw CSV text of a dataset.
pub struct DataFetcher {
    client: Client,
    user_agent: String,
}

impl DataFetcher {
    /// Creates a fetcher sending `user_agent`, with an optional request timeout.
    pub fn new(user_agent: impl Into<String>, timeout: Option<Duration>) -> Result<Self> {
        // reqwest's blocking client defaults to a 30s timeout; `None` disables it
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CovidVizError::network_with_source("Failed to build HTTP client", e))?;
        Ok(Self {
            client,
            user_agent: user_agent.into(),
        })
    }

    /// Creates a fetcher from the source configuration.
    pub fn from_source(source: &SourceConfig) -> Result<Self> {
        Self::new(
            source.user_agent.clone(),
            source.timeout_seconds.map(Duration::from_secs),
        )
    }

    /// Returns the dataset text at `location`.
    pub fn fetch(&self, location: &SourceLocation) -> Result<String> {
        match location {
            SourceLocation::Path(path) => {
                debug!(path = %path.display(), "Reading dataset from disk");
                std::fs::read_to_string(path).map_err(|e| {
                    CovidVizError::data_load_with_source(
                        format!("Failed to read dataset '{}'", path.display()),
                        e,
                    )
                })
            }
            SourceLocation::Url(url) => self.download(url),
        }
    }

    fn download(&self, url: &str) -> Result<String> {
        info!(url, "Downloading dataset");
        let response = self
            .client
            .get(url)
            .header(USER_AGENT, &self.user_agent)
            .send()?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(CovidVizError::network_with_status(
                format!("Failed to download dataset: HTTP {status}"),
                status.as_u16(),
            ));
        }

        let body = response.text()?;
        info!(url, bytes = body.len(), "Dataset downloaded");
        Ok(body)
    }
}
