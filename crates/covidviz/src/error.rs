//! Application-wide error types using thiserror.

use covidviz_common::CovidVizError;

/// Fatal errors that abort a run.
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    /// Configuration could not be loaded or failed validation.
    #[error("Configuration error: {0}")]
    Config(#[source] CovidVizError),

    /// The dataset could not be fetched or parsed, or the output directory is unusable.
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] CovidVizError),
}

impl AppError {
    /// HTTP status of a failed download, when that is what aborted the run.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Config(err) | Self::Pipeline(err) => err.status_code(),
        }
    }
}

/// Result type for the covidviz binaries.
pub type AppResult<T> = Result<T, AppError>;
