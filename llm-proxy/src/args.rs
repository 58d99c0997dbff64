use clap::Parser;

/// A protocol-translating proxy in front of one Chat Completions upstream.
///
/// Endpoint and credential configuration comes from the environment
/// (`PORT`, `CUSTOM_LLM_URL`, `CUSTOM_LLM_KEY`, `PROXY_KEY`, `MODELS`,
/// `SERVICE_NAME`, `SERVICE_VERSION`).
#[derive(Debug, Parser)]
#[command(name = "llm-proxy", version)]
pub(crate) struct Args {
    /// Log filter, e.g. `info` or `llm=debug,server=debug`.
    #[arg(long = "log", env = "LOG_FILTER", default_value = "info")]
    pub log_filter: String,
}
