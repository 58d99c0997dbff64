//! Upstream endpoint configuration.

use secrecy::SecretString;
use url::Url;

use crate::non_empty;

/// Configuration of the single upstream Chat Completions endpoint.
#[derive(Debug, Clone)]
pub struct UpstreamConfig {
    /// Upstream base URL, from `CUSTOM_LLM_URL`. `None` means echo mode:
    /// the proxy answers from the request body and performs no upstream I/O.
    pub base_url: Option<Url>,
    /// API key sent to the upstream as a bearer token, from `CUSTOM_LLM_KEY`.
    pub api_key: Option<SecretString>,
    /// Model identifiers advertised on `/v1/models` in echo mode, from the
    /// comma-separated `MODELS` variable.
    pub models: Vec<String>,
}

impl UpstreamConfig {
    pub(crate) fn load(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let base_url = non_empty(lookup("CUSTOM_LLM_URL")).and_then(|raw| match Url::parse(&raw) {
            Ok(url) => Some(url),
            Err(error) => {
                log::warn!("CUSTOM_LLM_URL '{raw}' is not a valid URL ({error}), falling back to echo mode");
                None
            }
        });

        let api_key = non_empty(lookup("CUSTOM_LLM_KEY")).map(SecretString::from);

        let models = match non_empty(lookup("MODELS")) {
            Some(raw) => raw
                .split(',')
                .map(str::trim)
                .filter(|model| !model.is_empty())
                .map(str::to_string)
                .collect(),
            None => vec!["custom-llm".to_string()],
        };

        Self {
            base_url,
            api_key,
            models,
        }
    }

    /// Whether the proxy runs without an upstream.
    pub fn echo_mode(&self) -> bool {
        self.base_url.is_none()
    }
}
