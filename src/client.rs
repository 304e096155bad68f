//! Client for the NLU provider's agent management API. Export and restore
//! are long-running operations that must be polled to completion.

use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::caps::{self, Caps};
use crate::errors::{ConnectorError, Result};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentDescriptor {
    pub parent: String,
    #[serde(default)]
    pub display_name: Option<String>,
}

#[async_trait]
pub trait AgentClient: Send + Sync {
    /// Exports the remote agent and returns the raw archive bytes.
    async fn export_agent(&self) -> Result<Vec<u8>>;

    /// Fetches the current remote agent descriptor.
    async fn agent_descriptor(&self) -> Result<AgentDescriptor>;

    /// Overwrites the remote agent with the given archive bytes, waiting for
    /// the restore operation to finish.
    async fn restore_agent(&self, parent: &str, archive: &[u8]) -> Result<()>;
}

pub struct HttpAgentClient {
    http: reqwest::Client,
    endpoint: String,
    project_id: String,
    token: String,
    poll_interval: Duration,
}

impl HttpAgentClient {
    pub fn from_caps(caps: &Caps) -> Result<Self> {
        Ok(HttpAgentClient {
            http: reqwest::Client::new(),
            endpoint: caps.require_str(caps::ENDPOINT)?.to_string(),
            project_id: caps.require_str(caps::PROJECT_ID)?.to_string(),
            token: caps.require_str(caps::API_TOKEN)?.to_string(),
            poll_interval: Duration::from_secs(2),
        })
    }

    fn agent_url(&self) -> String {
        format!("{}/v2/projects/{}/agent", self.endpoint, self.project_id)
    }

    async fn get_json(&self, url: &str) -> Result<Value> {
        let value = self
            .http
            .get(url)
            .bearer_auth(&self.token)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(value)
    }

    async fn post_json(&self, url: &str, body: &Value) -> Result<Value> {
        let value = self
            .http
            .post(url)
            .bearer_auth(&self.token)
            .json(body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(value)
    }

    /// Polls a long-running operation until `done`, returning its response
    /// payload. Operation-level errors surface as connection failures.
    async fn await_operation(&self, operation: Value) -> Result<Value> {
        let mut operation = operation;
        loop {
            if operation
                .get("done")
                .and_then(Value::as_bool)
                .unwrap_or(false)
            {
                if let Some(error) = operation.get("error") {
                    return Err(ConnectorError::Connection(error.to_string()));
                }
                return Ok(operation
                    .get("response")
                    .cloned()
                    .unwrap_or(Value::Null));
            }
            let name = operation
                .get("name")
                .and_then(Value::as_str)
                .ok_or_else(|| {
                    ConnectorError::Connection("operation carries no name".to_string())
                })?;
            debug!("waiting for operation {}", name);
            tokio::time::sleep(self.poll_interval).await;
            operation = self
                .get_json(&format!("{}/v2/{}", self.endpoint, name))
                .await
                .map_err(|err| ConnectorError::Connection(err.to_string()))?;
        }
    }
}

#[async_trait]
impl AgentClient for HttpAgentClient {
    async fn export_agent(&self) -> Result<Vec<u8>> {
        let operation = self
            .post_json(&format!("{}:export", self.agent_url()), &json!({}))
            .await
            .map_err(|err| ConnectorError::Connection(err.to_string()))?;
        let response = self.await_operation(operation).await?;
        let content = response
            .get("agentContent")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                ConnectorError::Connection("export response carries no agent content".to_string())
            })?;
        BASE64
            .decode(content)
            .map_err(|err| ConnectorError::Unpack(err.to_string()))
    }

    async fn agent_descriptor(&self) -> Result<AgentDescriptor> {
        let value = self
            .get_json(&self.agent_url())
            .await
            .map_err(|err| ConnectorError::Connection(err.to_string()))?;
        serde_json::from_value(value)
            .map_err(|err| ConnectorError::Connection(err.to_string()))
    }

    async fn restore_agent(&self, parent: &str, archive: &[u8]) -> Result<()> {
        let operation = self
            .post_json(
                &format!("{}/v2/{}/agent:restore", self.endpoint, parent),
                &json!({ "agentContent": BASE64.encode(archive) }),
            )
            .await
            .map_err(|err| ConnectorError::Connection(err.to_string()))?;
        self.await_operation(operation).await?;
        Ok(())
    }
}
