//! Service identity settings.

use crate::non_empty;

/// Identity the proxy reports about itself on the status endpoints.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Service name, from `SERVICE_NAME`.
    pub name: String,
    /// Service version string, from `SERVICE_VERSION`.
    pub version: String,
}

impl ServiceConfig {
    pub(crate) fn load(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            name: non_empty(lookup("SERVICE_NAME")).unwrap_or_else(|| "llm-openai-proxy".to_string()),
            version: non_empty(lookup("SERVICE_VERSION")).unwrap_or_else(|| "v1".to_string()),
        }
    }
}
