use std::sync::Arc;

use async_trait::async_trait;
use biomecode_core::config::RemoteSettings;
use biomecode_core::error::{BiomeError, Result};
use biomecode_core::models::TileHandle;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::auth::{ServiceAccountKey, ServiceAccountTokens, TokenProvider};
use crate::expr::Expression;
use crate::ports::EarthEngine;

/// Earth Engine REST adapter
pub struct RestEngine {
    /// Base URL of the REST API (e.g., "https://earthengine.googleapis.com")
    base_url: String,

    /// Cloud project the calls are billed to
    project_id: String,

    /// Bearer token source
    tokens: Arc<dyn TokenProvider>,

    /// HTTP client
    client: reqwest::Client,
}

impl RestEngine {
    pub fn new(
        base_url: impl Into<String>,
        project_id: impl Into<String>,
        tokens: Arc<dyn TokenProvider>,
    ) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            project_id: project_id.into(),
            tokens,
            client: reqwest::Client::new(),
        }
    }

    /// Build from configuration, reading the service-account key from disk
    pub fn from_settings(settings: &RemoteSettings) -> Result<Self> {
        let key = ServiceAccountKey::from_file(&settings.key_path)?;
        let tokens = ServiceAccountTokens::new(key, settings.service_account_email.clone())?;

        tracing::info!(
            project_id = %settings.project_id,
            service_account = %tokens.email(),
            api_url = %settings.api_url,
            "Configured Earth Engine REST client"
        );

        Ok(Self::new(&settings.api_url, &settings.project_id, Arc::new(tokens)))
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    fn endpoint(&self, method: &str) -> String {
        format!("{}/v1/projects/{}/{}", self.base_url, self.project_id, method)
    }

    async fn post<B, R>(&self, method: &str, body: &B) -> Result<R>
    where
        B: Serialize + ?Sized,
        R: for<'de> Deserialize<'de>,
    {
        let url = self.endpoint(method);
        let token = self.tokens.access_token().await?;

        let response = self
            .client
            .post(&url)
            .bearer_auth(token)
            .header("x-goog-user-project", &self.project_id)
            .json(body)
            .send()
            .await
            .map_err(|e| BiomeError::RemoteUnavailable {
                reason: format!("Failed to connect to {}: {}", url, e),
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(remote_error(status, &error_text));
        }

        response.json().await.map_err(|e| BiomeError::RemoteEvaluation {
            status: "INVALID_RESPONSE".to_string(),
            message: format!("Failed to parse response from {}: {}", url, e),
        })
    }
}

/// Map a non-success response to `RemoteEvaluation`, keeping the remote message verbatim
fn remote_error(status: reqwest::StatusCode, body: &str) -> BiomeError {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => BiomeError::RemoteEvaluation {
            status: envelope.error.status.unwrap_or_else(|| status.as_u16().to_string()),
            message: envelope.error.message,
        },
        Err(_) => BiomeError::RemoteEvaluation {
            status: status.as_u16().to_string(),
            message: body.to_string(),
        },
    }
}

#[async_trait]
impl EarthEngine for RestEngine {
    async fn compute_value(&self, expression: &Expression) -> Result<JsonValue> {
        let response: ComputeValueResponse =
            self.post("value:compute", &ComputeValueRequest { expression }).await?;
        Ok(response.result)
    }

    async fn create_map(&self, expression: &Expression) -> Result<TileHandle> {
        let response: CreateMapResponse =
            self.post("maps", &CreateMapRequest { expression, file_format: "PNG" }).await?;
        Ok(TileHandle::new(response.name, ""))
    }

    fn tile_url(&self, handle: &TileHandle) -> String {
        handle.url_template(&self.base_url)
    }

    fn name(&self) -> &str {
        "earthengine-rest"
    }
}

/// Request body for `value:compute`
#[derive(Debug, Serialize)]
struct ComputeValueRequest<'a> {
    expression: &'a Expression,
}

/// Response from `value:compute`
#[derive(Debug, Deserialize)]
struct ComputeValueResponse {
    #[serde(default)]
    result: JsonValue,
}

/// Request body for `maps`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateMapRequest<'a> {
    expression: &'a Expression,
    file_format: &'a str,
}

/// Response from `maps`
#[derive(Debug, Deserialize)]
struct CreateMapResponse {
    name: String,
}

/// Google API error body
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
    #[serde(default)]
    status: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::StaticToken;

    #[test]
    fn test_endpoint() {
        let engine = RestEngine::new(
            "https://earthengine.googleapis.com/",
            "demo-project",
            Arc::new(StaticToken::new("t")),
        );
        assert_eq!(
            engine.endpoint("value:compute"),
            "https://earthengine.googleapis.com/v1/projects/demo-project/value:compute"
        );
        assert_eq!(engine.project_id(), "demo-project");
    }

    #[test]
    fn test_remote_error_keeps_message() {
        let body = serde_json::json!({
            "error": {
                "code": 400,
                "message": "Image.clip: Parameter 'input' is required.",
                "status": "INVALID_ARGUMENT"
            }
        });
        let err = remote_error(reqwest::StatusCode::BAD_REQUEST, &body.to_string());
        match err {
            BiomeError::RemoteEvaluation { status, message } => {
                assert_eq!(status, "INVALID_ARGUMENT");
                assert_eq!(message, "Image.clip: Parameter 'input' is required.");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_remote_error_plain_body() {
        let err = remote_error(reqwest::StatusCode::BAD_GATEWAY, "upstream hiccup");
        match err {
            BiomeError::RemoteEvaluation { status, message } => {
                assert_eq!(status, "502");
                assert_eq!(message, "upstream hiccup");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
