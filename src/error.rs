use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DashboardError {
    #[error("Failed to read data source {path}: {source}")]
    DataSource {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Unsupported data source format: {0}")]
    UnsupportedFormat(String),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Export to {path} failed: {message}")]
    Export { path: String, message: String },
}

impl DashboardError {
    /// True for failures that happened while fetching or decoding the record list.
    pub fn is_data_source(&self) -> bool {
        matches!(
            self,
            DashboardError::DataSource { .. }
                | DashboardError::UnsupportedFormat(_)
                | DashboardError::Json(_)
                | DashboardError::Csv(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, DashboardError>;

pub const LOAD_FAILURE_HEADLINE: &str = "Failed to load customer type data";

/// Structured failure body handed to whatever shows the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
}

impl From<&DashboardError> for ErrorBody {
    fn from(err: &DashboardError) -> Self {
        let error = if err.is_data_source() {
            LOAD_FAILURE_HEADLINE.to_string()
        } else {
            "Failed to build customer type reports".to_string()
        };
        ErrorBody {
            error,
            message: err.to_string(),
        }
    }
}
