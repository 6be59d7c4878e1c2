use std::path::PathBuf;
use std::sync::Arc;

use easy_config_store::ConfigStore;
use eyre::Result;
use log::{debug, info};
use serde::{Deserialize, Serialize};

pub type Config = Arc<ConfigInner>;

pub fn config(path: PathBuf) -> Result<Config> {
    let config_store = ConfigStore::<ConfigInner>::read(path, "config".to_string())?;
    let inner = (*config_store).clone();

    info!("config parsing successful");
    debug!("loaded configuration:\n{}", toml::to_string_pretty(&inner.redacted())?);

    Ok(Arc::new(inner))
}

#[derive(Debug, PartialEq, Serialize, Deserialize, Clone)]
pub struct ConfigInner {
    pub llm: LLMConfig,
    #[serde(default)]
    pub scraper: ScraperConfig,
    #[serde(default)]
    pub spreadsheet: SpreadsheetConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

impl ConfigInner {
    fn redacted(&self) -> Self {
        let mut copy = self.clone();
        if copy.llm.api_key.is_some() {
            copy.llm.api_key = Some("<redacted>".to_string());
        }
        copy
    }
}

#[derive(Debug, PartialEq, Serialize, Deserialize, Clone)]
pub struct LLMConfig {
    pub api_key: Option<String>,
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_llm_model")]
    pub model: String,
    #[serde(default = "default_llm_model")]
    pub summary_model: String,
    #[serde(default = "default_llm_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_max_input_chars")]
    pub max_input_chars: usize,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

impl LLMConfig {
    /// The configured key, or the one found in the environment variable
    /// named by `api_key_env`. Blank values count as absent.
    pub fn resolved_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .or_else(|| std::env::var(&self.api_key_env).ok())
            .filter(|key| !key.trim().is_empty())
    }
}

#[derive(Debug, PartialEq, Serialize, Deserialize, Clone)]
pub struct ScraperConfig {
    #[serde(default = "default_true")]
    pub browser: bool,
    #[serde(default = "default_true")]
    pub headless: bool,
    #[serde(default = "default_wait_secs")]
    pub wait_secs: u64,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_accept_language")]
    pub accept_language: String,
    #[serde(default = "default_true")]
    pub summary_pass: bool,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            browser: true,
            headless: true,
            wait_secs: default_wait_secs(),
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
            accept_language: default_accept_language(),
            summary_pass: true,
        }
    }
}

#[derive(Debug, PartialEq, Serialize, Deserialize, Clone)]
pub struct SpreadsheetConfig {
    #[serde(default = "default_spreadsheet_path")]
    pub path: PathBuf,
}

impl Default for SpreadsheetConfig {
    fn default() -> Self {
        Self {
            path: default_spreadsheet_path(),
        }
    }
}

#[derive(Debug, PartialEq, Serialize, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_saved_jobs_capacity")]
    pub saved_jobs_capacity: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            saved_jobs_capacity: default_saved_jobs_capacity(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_api_key_env() -> String {
    "OPENROUTER_API_KEY".to_string()
}

fn default_llm_model() -> String {
    "google/gemini-2.0-flash-lite-001".to_string()
}

fn default_llm_endpoint() -> String {
    "https://openrouter.ai/api/v1".to_string()
}

fn default_max_retries() -> u32 {
    3
}

fn default_max_input_chars() -> usize {
    5000
}

fn default_temperature() -> f32 {
    0.3
}

fn default_wait_secs() -> u64 {
    3
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".to_string()
}

fn default_accept_language() -> String {
    "en-CA,en;q=0.9".to_string()
}

fn default_spreadsheet_path() -> PathBuf {
    PathBuf::from("jobs.xlsx")
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    5317
}

fn default_saved_jobs_capacity() -> usize {
    500
}

impl Default for ConfigInner {
    fn default() -> Self {
        let cfg = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.default.toml",));

        toml::from_str(cfg).unwrap() // should be okay
    }
}
