use std::env;
use std::fmt;
use std::time::Duration;

pub const DEFAULT_PROVIDER: &str = "gemini";
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";
pub const DEFAULT_GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_PUBLIC_BASE_URL: &str = "http://localhost:5000";

const REQUEST_TIMEOUT_DEFAULT_S: f64 = 90.0;
const RETRY_BACKOFF_DEFAULT_S: f64 = 5.0;

/// Settings for the generation clients and the retry loop.
#[derive(Clone, PartialEq)]
pub struct EngineConfig {
    pub provider: String,
    pub model: String,
    pub api_base: String,
    pub api_key: Option<String>,
    pub request_timeout: Duration,
    pub retry_backoff: Duration,
    pub public_base_url: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            provider: DEFAULT_PROVIDER.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_base: DEFAULT_GEMINI_API_BASE.to_string(),
            api_key: None,
            request_timeout: Duration::from_secs_f64(REQUEST_TIMEOUT_DEFAULT_S),
            retry_backoff: Duration::from_secs_f64(RETRY_BACKOFF_DEFAULT_S),
            public_base_url: DEFAULT_PUBLIC_BASE_URL.to_string(),
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(non_empty_env)
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            provider: lookup("CLICKDEMO_PROVIDER")
                .map(|value| value.to_ascii_lowercase())
                .unwrap_or(defaults.provider),
            model: lookup("CLICKDEMO_MODEL").unwrap_or(defaults.model),
            api_base: lookup("GEMINI_API_BASE")
                .map(|value| value.trim_end_matches('/').to_string())
                .filter(|value| !value.is_empty())
                .unwrap_or(defaults.api_base),
            api_key: lookup("GEMINI_API_KEY").or_else(|| lookup("GOOGLE_API_KEY")),
            request_timeout: seconds_setting(
                lookup("CLICKDEMO_REQUEST_TIMEOUT"),
                REQUEST_TIMEOUT_DEFAULT_S,
                15.0,
                300.0,
            ),
            retry_backoff: seconds_setting(
                lookup("CLICKDEMO_RETRY_BACKOFF"),
                RETRY_BACKOFF_DEFAULT_S,
                0.0,
                30.0,
            ),
            public_base_url: lookup("BASE_URL").unwrap_or(defaults.public_base_url),
        }
    }
}

impl fmt::Debug for EngineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineConfig")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("api_base", &self.api_base)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("request_timeout", &self.request_timeout)
            .field("retry_backoff", &self.retry_backoff)
            .field("public_base_url", &self.public_base_url)
            .finish()
    }
}

pub(crate) fn non_empty_env(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn seconds_setting(raw: Option<String>, default: f64, min: f64, max: f64) -> Duration {
    let value = raw
        .and_then(|raw| raw.trim().parse::<f64>().ok())
        .filter(|value| value.is_finite())
        .unwrap_or(default)
        .clamp(min, max);
    Duration::from_secs_f64(value)
}
