// HTTP client for the admin dashboard stats endpoint
use crate::application::stats_source::{FetchError, StatsSource};
use crate::domain::snapshot::DashboardSnapshot;
use crate::infrastructure::payload::{error_message, StatsPayload};
use anyhow::Context;
use async_trait::async_trait;
use reqwest::header::{ACCEPT, COOKIE};
use std::time::Duration;

const CSRF_HEADER: &str = "X-CSRFToken";
const MAX_ERROR_BODY_CHARS: usize = 200;

#[derive(Debug, Clone)]
pub struct HttpStatsSource {
    client: reqwest::Client,
    stats_url: String,
    csrf_token: Option<String>,
    session_id: Option<String>,
}

impl HttpStatsSource {
    pub fn new(
        stats_url: String,
        csrf_token: Option<String>,
        session_id: Option<String>,
        timeout: Option<Duration>,
    ) -> anyhow::Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            stats_url,
            csrf_token: csrf_token.filter(|t| !t.is_empty()),
            session_id: session_id.filter(|s| !s.is_empty()),
        })
    }

    /// The session cookie authenticates the request; Django also expects the
    /// anti-forgery token as a cookie matching the header.
    fn cookie_header(&self) -> Option<String> {
        let mut cookies = Vec::new();
        if let Some(token) = &self.csrf_token {
            cookies.push(format!("csrftoken={}", token));
        }
        if let Some(session) = &self.session_id {
            cookies.push(format!("sessionid={}", session));
        }
        (!cookies.is_empty()).then(|| cookies.join("; "))
    }
}

#[async_trait]
impl StatsSource for HttpStatsSource {
    async fn fetch_snapshot(&self) -> Result<DashboardSnapshot, FetchError> {
        let mut request = self
            .client
            .get(&self.stats_url)
            .header(ACCEPT, "application/json")
            .header("X-Requested-With", "XMLHttpRequest");
        if let Some(token) = &self.csrf_token {
            request = request.header(CSRF_HEADER, token);
        }
        if let Some(cookies) = self.cookie_header() {
            request = request.header(COOKIE, cookies);
        }

        tracing::debug!(url = %self.stats_url, "Fetching dashboard stats");
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = error_message(&body)
                .unwrap_or_else(|| body.chars().take(MAX_ERROR_BODY_CHARS).collect());
            return Err(FetchError::Status {
                status: status.as_u16(),
                message,
            });
        }

        StatsPayload::parse(&body)?.into_snapshot()
    }
}
