use std::time::Duration;

use anyhow::{bail, Context, Result};
use reqwest::blocking::Client as HttpClient;
use serde_json::{json, Value};

use crate::attachment::GenerationRequest;
use crate::client::{truncate_text, GenerationClient, ModelCallError};
use crate::config::EngineConfig;

const PROVIDER_LABEL: &str = "Gemini";

pub struct GeminiClient {
    api_base: String,
    api_key: Option<String>,
    model: String,
    request_timeout: Duration,
    http: HttpClient,
}

impl GeminiClient {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            api_base: config.api_base.trim().trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            request_timeout: config.request_timeout,
            http: HttpClient::new(),
        }
    }

    fn endpoint_for_model(&self, model: &str) -> String {
        let trimmed = model.trim();
        let model_path = if trimmed.starts_with("models/") {
            trimmed.to_string()
        } else {
            format!("models/{trimmed}")
        };
        format!("{}/{}:generateContent", self.api_base, model_path)
    }

    fn build_payload(request: &GenerationRequest) -> Value {
        json!({
            "contents": [{
                "role": "user",
                "parts": request.to_parts_json(),
            }],
            "generationConfig": {
                "thinkingConfig": { "thinkingBudget": 0 },
            },
        })
    }

    fn extract_text(response_payload: &Value) -> Result<String> {
        let parts = response_payload
            .get("candidates")
            .and_then(Value::as_array)
            .and_then(|candidates| candidates.first())
            .and_then(|candidate| candidate.get("content"))
            .and_then(|content| content.get("parts"))
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        let text = parts
            .iter()
            .filter_map(|part| part.get("text").and_then(Value::as_str))
            .collect::<String>();
        if text.trim().is_empty() {
            let reason = response_payload
                .get("candidates")
                .and_then(|candidates| candidates.get(0))
                .and_then(|candidate| candidate.get("finishReason"))
                .and_then(Value::as_str)
                .or_else(|| {
                    response_payload
                        .get("promptFeedback")
                        .and_then(|feedback| feedback.get("blockReason"))
                        .and_then(Value::as_str)
                })
                .unwrap_or("unknown");
            bail!("{PROVIDER_LABEL} returned no text (reason: {reason})");
        }
        Ok(text)
    }
}

impl GenerationClient for GeminiClient {
    fn name(&self) -> &str {
        "gemini"
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn generate_text(&self, request: &GenerationRequest) -> Result<String> {
        let Some(api_key) = self.api_key.as_deref() else {
            bail!("GEMINI_API_KEY or GOOGLE_API_KEY not set");
        };
        let endpoint = self.endpoint_for_model(&self.model);
        let response = self
            .http
            .post(&endpoint)
            .query(&[("key", api_key)])
            .timeout(self.request_timeout)
            .json(&Self::build_payload(request))
            .send()
            .with_context(|| format!("{PROVIDER_LABEL} request failed ({endpoint})"))?;

        let status = response.status();
        let body = response
            .text()
            .with_context(|| format!("{PROVIDER_LABEL} response body read failed"))?;
        if !status.is_success() {
            return Err(ModelCallError {
                provider: PROVIDER_LABEL.to_string(),
                status: status.as_u16(),
                body: truncate_text(&body, 512),
            }
            .into());
        }
        let payload: Value = serde_json::from_str(&body)
            .with_context(|| format!("{PROVIDER_LABEL} returned invalid JSON payload"))?;
        Self::extract_text(&payload)
    }
}
