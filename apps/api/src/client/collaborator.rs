use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;

use crate::agents::errors::{DashboardError, DashboardResult};
use crate::api::contracts::{AgentsResponse, CommandReceipt, CommandRequest, VoiceTranscript};
use crate::domain::agent::AgentSummary;

/// Request/response collaborators the dashboard depends on
///
/// Agent directory, command submission (task id allocation) and voice
/// transcription. Implementations own their transport details.
#[async_trait]
pub trait Collaborator: Send + Sync {
    /// Fetch the agent directory
    async fn list_agents(&self) -> DashboardResult<Vec<AgentSummary>>;

    /// Submit a command and receive its task id
    async fn submit_command(&self, command: &str) -> DashboardResult<CommandReceipt>;

    /// Turn recorded audio into text
    async fn transcribe(&self, audio: Vec<u8>) -> DashboardResult<VoiceTranscript>;
}

/// HTTP implementation of Collaborator against the `/api` endpoints
#[derive(Debug, Clone)]
pub struct HttpCollaborator {
    client: Client,
    base_url: String,
}

impl HttpCollaborator {
    /// Creates a new collaborator client
    ///
    /// # Arguments
    /// * `base_url` - Scheme, host and port of the API, without a trailing slash
    pub fn new(base_url: impl Into<String>) -> DashboardResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| DashboardError::Collaborator(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> DashboardResult<T> {
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(DashboardError::Collaborator(format!(
                "API returned error {}: {}",
                status, body
            )));
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl Collaborator for HttpCollaborator {
    async fn list_agents(&self) -> DashboardResult<Vec<AgentSummary>> {
        let response = self.client.get(self.url("/api/agents")).send().await?;
        let body: AgentsResponse = Self::read_json(response).await?;
        Ok(body.agents)
    }

    async fn submit_command(&self, command: &str) -> DashboardResult<CommandReceipt> {
        let request = CommandRequest {
            command: command.to_string(),
        };
        let response = self
            .client
            .post(self.url("/api/agents"))
            .json(&request)
            .send()
            .await?;
        Self::read_json(response).await
    }

    async fn transcribe(&self, audio: Vec<u8>) -> DashboardResult<VoiceTranscript> {
        let response = self
            .client
            .post(self.url("/api/voice/process"))
            .header(reqwest::header::CONTENT_TYPE, "audio/wav")
            .body(audio)
            .send()
            .await?;
        Self::read_json(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_loses_trailing_slash() {
        let collaborator = HttpCollaborator::new("http://localhost:8080/").unwrap();
        assert_eq!(collaborator.url("/api/agents"), "http://localhost:8080/api/agents");
    }

    #[tokio::test]
    async fn unreachable_api_is_an_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let collaborator = HttpCollaborator::new(format!("http://127.0.0.1:{port}")).unwrap();
        assert!(collaborator.list_agents().await.is_err());
    }
}
