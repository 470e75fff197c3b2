//! Gemini-backed [`Oracle`] implementation.
//!
//! Calls the `generateContent` endpoint with a structured-output schema so
//! the model is constrained to the classification contract. Every failure
//! mode — transport, timeout, non-2xx, empty candidates, unparseable text
//! — surfaces as an [`OracleError`] for the pipeline's fallback policy.

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;

use crate::config::AppConfig;
use crate::error::OracleError;
use crate::oracle::{Oracle, RawClassification, response_schema, system_instruction};
use crate::registry::AgencyRegistry;

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Gemini classification client.
pub struct GeminiOracle {
    client: reqwest::Client,
    api_key: SecretString,
    model: String,
    timeout: Duration,
    /// Response schema, built once from the registry.
    schema: Value,
    /// System instruction, built once from the registry.
    instruction: String,
}

impl GeminiOracle {
    /// Build an oracle from the service config and the agency registry.
    pub fn new(config: &AppConfig, registry: &AgencyRegistry) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: config.gemini_api_key.clone(),
            model: config.gemini_model.clone(),
            timeout: config.oracle_timeout,
            schema: response_schema(registry),
            instruction: system_instruction(registry),
        }
    }

    fn endpoint(&self) -> String {
        format!("{GEMINI_API_BASE}/{}:generateContent", self.model)
    }

    async fn request(&self, text: &str) -> Result<String, OracleError> {
        let body = serde_json::json!({
            "contents": [{ "parts": [{ "text": text }] }],
            "systemInstruction": { "parts": [{ "text": self.instruction }] },
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": self.schema,
            }
        });

        let resp = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", self.api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| OracleError::Unavailable(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(OracleError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }

        let payload: Value = resp
            .json()
            .await
            .map_err(|e| OracleError::MalformedResponse(format!("response body: {e}")))?;

        extract_candidate_text(&payload)
    }
}

/// Pull the generated text out of a `generateContent` response.
fn extract_candidate_text(payload: &Value) -> Result<String, OracleError> {
    payload["candidates"][0]["content"]["parts"][0]["text"]
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| OracleError::MalformedResponse("no candidate text in response".into()))
}

#[async_trait]
impl Oracle for GeminiOracle {
    async fn classify(&self, text: &str) -> Result<RawClassification, OracleError> {
        let response_text = tokio::time::timeout(self.timeout, self.request(text))
            .await
            .map_err(|_| OracleError::Timeout(self.timeout))??;

        tracing::debug!(chars = response_text.len(), "Oracle responded");
        RawClassification::from_text(&response_text)
    }
}
