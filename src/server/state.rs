use std::sync::Arc;

use eyre::Result;

use crate::chat::agent::JobAgent;
use crate::scraper::job::JobScraper;
use crate::store::saved::SavedJobs;
use crate::store::spreadsheet::Spreadsheet;
use crate::utils::config::Config;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub agent: Arc<JobAgent>,
    pub scraper: Arc<JobScraper>,
    pub saved: Arc<SavedJobs>,
    pub spreadsheet: Arc<Spreadsheet>,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self> {
        let agent = Arc::new(JobAgent::new(&config.llm));
        Self::with_agent(config, agent)
    }

    pub fn with_agent(config: Config, agent: Arc<JobAgent>) -> Result<Self> {
        Ok(Self {
            scraper: Arc::new(JobScraper::new(&config, agent.clone())?),
            saved: Arc::new(SavedJobs::new(config.server.saved_jobs_capacity)),
            spreadsheet: Arc::new(Spreadsheet::new(&config.spreadsheet.path)),
            agent,
            config,
        })
    }
}

#[cfg(test)]
impl AppState {
    /// No LLM, no browser, spreadsheet under the temp dir.
    pub fn offline(name: &str) -> Self {
        use crate::utils::config::ConfigInner;

        let mut inner = ConfigInner::default();
        inner.scraper.browser = false;
        inner.scraper.timeout_secs = 2;
        inner.spreadsheet.path = std::env::temp_dir()
            .join(format!("jobbot-{}-{}.xlsx", name, std::process::id()));
        inner.server.saved_jobs_capacity = 3;

        let config = Config::new(inner);
        let agent = Arc::new(JobAgent::with_client(None, &config.llm));
        Self::with_agent(config, agent).unwrap()
    }
}
