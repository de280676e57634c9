use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub seed_path: PathBuf,
    pub answer_llm_url: String,
    pub answer_llm_api_key: Option<String>,
    pub web_search_url: String,
    pub web_search_api_key: Option<String>,
    pub chat_scrape_url: String,
    pub completions_url: String,
    pub completions_api_key: Option<String>,
    pub extractor_url: String,
    pub extractor_api_key: Option<String>,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    pub provider_request_timeout_secs: u64,
    pub chat_scrape_timeout_secs: u64,
    pub provider_max_retries: u32,
    pub provider_backoff_base_ms: u64,
    pub inter_prompt_delay_ms: u64,
    pub inter_brand_delay_ms: u64,
    pub manual_trigger_timeout_secs: u64,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("seed_path", &self.seed_path)
            .field("database_url", &"[redacted]")
            .field("answer_llm_url", &self.answer_llm_url)
            .field(
                "answer_llm_api_key",
                &self.answer_llm_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field("web_search_url", &self.web_search_url)
            .field(
                "web_search_api_key",
                &self.web_search_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field("chat_scrape_url", &self.chat_scrape_url)
            .field("completions_url", &self.completions_url)
            .field(
                "completions_api_key",
                &self.completions_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field("extractor_url", &self.extractor_url)
            .field(
                "extractor_api_key",
                &self.extractor_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field(
                "provider_request_timeout_secs",
                &self.provider_request_timeout_secs,
            )
            .field("chat_scrape_timeout_secs", &self.chat_scrape_timeout_secs)
            .field("provider_max_retries", &self.provider_max_retries)
            .field("provider_backoff_base_ms", &self.provider_backoff_base_ms)
            .field("inter_prompt_delay_ms", &self.inter_prompt_delay_ms)
            .field("inter_brand_delay_ms", &self.inter_brand_delay_ms)
            .field(
                "manual_trigger_timeout_secs",
                &self.manual_trigger_timeout_secs,
            )
            .finish()
    }
}
