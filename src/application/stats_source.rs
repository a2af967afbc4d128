// Source trait for dashboard statistics
use crate::domain::snapshot::DashboardSnapshot;
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    /// Network-level failure: connection refused, reset, timed out...
    #[error("Request to stats endpoint failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Stats endpoint returned status {status}: {message}")]
    Status { status: u16, message: String },

    /// Body could not be parsed into a snapshot.
    #[error("Malformed stats payload: {0}")]
    Malformed(String),

    /// Payload parsed but carried `success: false`.
    #[error("Stats endpoint reported failure: {0}")]
    Application(String),
}

impl FetchError {
    /// Text for the transient error banner.
    pub fn banner_message(&self) -> String {
        match self {
            FetchError::Transport(_) => "Dashboard data could not be loaded: network error".to_string(),
            FetchError::Status { status, .. } => {
                format!("Dashboard data could not be loaded (HTTP {})", status)
            }
            FetchError::Malformed(_) => {
                "Dashboard data could not be loaded: invalid response".to_string()
            }
            FetchError::Application(message) => message.clone(),
        }
    }
}

#[async_trait]
pub trait StatsSource: Send + Sync {
    /// Fetch and validate one snapshot from the statistics endpoint
    async fn fetch_snapshot(&self) -> Result<DashboardSnapshot, FetchError>;
}
