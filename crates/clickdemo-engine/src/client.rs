use std::collections::BTreeMap;

use anyhow::{bail, Result};

use crate::attachment::GenerationRequest;
use crate::config::EngineConfig;
use crate::dryrun::DryrunClient;
use crate::gemini::GeminiClient;

/// A multimodal text generation backend.
pub trait GenerationClient: Send + Sync {
    fn name(&self) -> &str;
    fn model(&self) -> &str;
    fn generate_text(&self, request: &GenerationRequest) -> Result<String>;
}

/// Non-success answer from the model service, kept typed so the retry loop
/// can classify it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{provider} request failed ({status}): {body}")]
pub struct ModelCallError {
    pub provider: String,
    pub status: u16,
    pub body: String,
}

impl ModelCallError {
    pub fn is_overloaded(&self) -> bool {
        self.status == 503 || self.body.to_ascii_lowercase().contains("overloaded")
    }
}

/// Transient overload: a 503 from the service, or any error whose message
/// says the model is overloaded.
pub fn is_overload_error(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| {
        if let Some(call_err) = cause.downcast_ref::<ModelCallError>() {
            return call_err.is_overloaded();
        }
        let text = cause.to_string().to_ascii_lowercase();
        text.contains("overloaded") || text.contains("503")
    })
}

#[derive(Default)]
pub struct ClientRegistry {
    clients: BTreeMap<String, Box<dyn GenerationClient>>,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<C: GenerationClient + 'static>(&mut self, client: C) {
        self.clients
            .insert(client.name().to_string(), Box::new(client));
    }

    pub fn take(&mut self, name: &str) -> Result<Box<dyn GenerationClient>> {
        match self.clients.remove(name) {
            Some(client) => Ok(client),
            None => bail!(
                "unknown provider '{}' (available: {})",
                name,
                self.names().join(", ")
            ),
        }
    }

    pub fn names(&self) -> Vec<String> {
        self.clients.keys().cloned().collect()
    }
}

pub fn default_client_registry(config: &EngineConfig) -> ClientRegistry {
    let mut registry = ClientRegistry::new();
    registry.register(DryrunClient::new(&config.model));
    registry.register(GeminiClient::new(config));
    registry
}

/// Client selected by `config.provider`.
pub fn client_from_config(config: &EngineConfig) -> Result<Box<dyn GenerationClient>> {
    default_client_registry(config).take(&config.provider)
}

pub(crate) fn truncate_text(value: &str, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        return value.to_string();
    }
    value.chars().take(max_chars).collect::<String>() + "…"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overload_classification_matches_status_and_message() {
        let unavailable = anyhow::Error::new(ModelCallError {
            provider: "Gemini".to_string(),
            status: 503,
            body: "{}".to_string(),
        });
        assert!(is_overload_error(&unavailable));

        let overloaded_body = anyhow::Error::new(ModelCallError {
            provider: "Gemini".to_string(),
            status: 429,
            body: "The model is overloaded. Please try again later.".to_string(),
        });
        assert!(is_overload_error(&overloaded_body));

        let quota = anyhow::Error::new(ModelCallError {
            provider: "Gemini".to_string(),
            status: 429,
            body: "Quota exceeded".to_string(),
        });
        assert!(!is_overload_error(&quota));

        let wrapped = anyhow::anyhow!("upstream said: Service Unavailable (503)")
            .context("design extraction");
        assert!(is_overload_error(&wrapped));
        assert!(!is_overload_error(&anyhow::anyhow!("API key not valid")));
    }

    #[test]
    fn default_registry_includes_dryrun_and_gemini() -> anyhow::Result<()> {
        let config = EngineConfig::default();
        let mut registry = default_client_registry(&config);
        assert_eq!(registry.names(), vec!["dryrun", "gemini"]);
        assert_eq!(registry.take("gemini")?.model(), "gemini-1.5-flash");

        let err = registry.take("openai").err().map(|err| err.to_string());
        assert_eq!(
            err.as_deref(),
            Some("unknown provider 'openai' (available: dryrun)")
        );
        let client = registry.take("dryrun")?;
        assert_eq!(client.name(), "dryrun");
        Ok(())
    }

    #[test]
    fn truncate_text_marks_cut_bodies() {
        assert_eq!(truncate_text("short", 10), "short");
        assert_eq!(truncate_text("abcdefgh", 3), "abc…");
    }
}
