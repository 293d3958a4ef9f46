use crate::config::Endpoints;
use crate::errors::DashboardError;
use crate::models::{CommandUsageEntry, DatabaseStatus, ServerSummary, StatsSnapshot};
use serde::de::DeserializeOwned;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    Stats,
    Guilds,
    Commands,
    Database,
}

impl Section {
    pub const ALL: [Section; 4] = [
        Section::Stats,
        Section::Guilds,
        Section::Commands,
        Section::Database,
    ];

    pub fn all() -> &'static [Section] {
        &Self::ALL
    }
}

/// Issues one-shot GETs against the bot API.
#[derive(Debug, Clone)]
pub struct DataFetcher {
    client: reqwest::Client,
    base_url: String,
    endpoints: Endpoints,
}

impl DataFetcher {
    pub fn new(client: reqwest::Client, base_url: &str, endpoints: Endpoints) -> Self {
        Self {
            client,
            base_url: base_url.trim().trim_end_matches('/').to_string(),
            endpoints,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn fetch_stats(&self) -> Result<StatsSnapshot, DashboardError> {
        self.get_json(Section::Stats).await
    }

    pub async fn fetch_guilds(&self) -> Result<Vec<ServerSummary>, DashboardError> {
        self.get_json(Section::Guilds).await
    }

    pub async fn fetch_commands(&self) -> Result<Vec<CommandUsageEntry>, DashboardError> {
        self.get_json(Section::Commands).await
    }

    pub async fn fetch_database_status(&self) -> Result<DatabaseStatus, DashboardError> {
        self.get_json(Section::Database).await
    }

    /// Checks that the base URL answers like a bot API. The stats it returns
    /// are handed back so the caller can show them right away.
    pub async fn probe(&self) -> Result<StatsSnapshot, DashboardError> {
        self.fetch_stats().await
    }

    fn url(&self, section: Section) -> String {
        format!("{}{}", self.base_url, self.endpoints.path(section))
    }

    async fn get_json<T: DeserializeOwned>(&self, section: Section) -> Result<T, DashboardError> {
        let url = self.url(section);
        let response = self
            .client
            .get(&url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|source| DashboardError::Transport {
                url: url.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(DashboardError::Status { url, status });
        }

        let body = response
            .bytes()
            .await
            .map_err(|source| DashboardError::Transport {
                url: url.clone(),
                source,
            })?;
        serde_json::from_slice(&body).map_err(|source| DashboardError::Decode { url, source })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urls_join_base_and_endpoint() {
        let fetcher = DataFetcher::new(reqwest::Client::new(), " http://bot.local:8000/ ", Endpoints::default());
        assert_eq!(fetcher.base_url(), "http://bot.local:8000");
        assert_eq!(fetcher.url(Section::Commands), "http://bot.local:8000/api/commands");
    }
}
