use std::path::Path;
use std::sync::Arc;

use eyre::Result;
use log::{debug, info, warn};

use super::extract::{Extraction, extract_job};
use super::fetch::PageFetcher;
use super::summary::SummaryHints;
use crate::chat::agent::JobAgent;
use crate::models::job::{JobRecord, is_missing};
use crate::utils::config::Config;
use crate::utils::text::truncate_with_ellipsis;

/// Fetches postings and runs the extraction cascade: selectors, alternate
/// selectors, hints from an AI summary, then a structured AI call. Each AI
/// tier only fills fields that are still missing.
pub struct JobScraper {
    fetcher: PageFetcher,
    agent: Arc<JobAgent>,
    summary_pass: bool,
    use_ai: bool,
    max_description_chars: usize,
}

impl JobScraper {
    pub fn new(config: &Config, agent: Arc<JobAgent>) -> Result<Self> {
        Ok(Self {
            fetcher: PageFetcher::new(&config.scraper)?,
            agent,
            summary_pass: config.scraper.summary_pass,
            use_ai: true,
            max_description_chars: config.llm.max_input_chars,
        })
    }

    /// Selectors only; the AI tiers are skipped even when credentials exist.
    pub fn without_ai(mut self) -> Self {
        self.use_ai = false;
        self
    }

    /// Fails only when the page itself cannot be obtained.
    pub async fn scrape(&self, url: &str, model: Option<&str>) -> Result<JobRecord> {
        info!("scraping job posting: {}", url);

        let page = self.fetcher.fetch(url).await?;
        debug!("got {} via {:?}", page.final_url, page.method);

        Ok(self.process(url, &page.html, model).await)
    }

    /// Same as [`JobScraper::scrape`] for a saved HTML page.
    pub async fn scrape_file(&self, path: &Path, model: Option<&str>) -> Result<JobRecord> {
        info!("reading job posting from file: {}", path.display());

        let html = tokio::fs::read_to_string(path).await?;
        Ok(self.process(&path.display().to_string(), &html, model).await)
    }

    pub async fn process(&self, url: &str, html: &str, model: Option<&str>) -> JobRecord {
        let Extraction {
            mut record,
            page_text,
        } = extract_job(html, url);

        if record.is_complete() {
            info!("selectors resolved every key field for {}", url);
        } else if !self.use_ai {
            debug!("AI tiers disabled, keeping selector results for {}", url);
        } else if !self.agent.is_available() {
            warn!(
                "{} is missing {}, but no LLM is configured",
                url,
                record.missing_fields().join(", ")
            );
        } else {
            self.resolve_with_ai(&mut record, url, &page_text, model).await;
        }

        if is_missing(&record.description) && !page_text.is_empty() {
            debug!("no description found for {}, using page text", url);
            record.description = truncate_with_ellipsis(&page_text, self.max_description_chars);
        }

        record
    }

    async fn resolve_with_ai(
        &self,
        record: &mut JobRecord,
        url: &str,
        page_text: &str,
        model: Option<&str>,
    ) {
        info!("{} is missing {}", url, record.missing_fields().join(", "));

        if self.summary_pass {
            match self.agent.summarize(page_text, model).await {
                Ok(summary) => {
                    let hints = SummaryHints::parse(&summary);
                    if hints.is_empty() {
                        debug!("summary of {} had no usable hints", url);
                    } else {
                        let filled = record.merge_missing(&hints.to_fields());
                        info!("summary filled [{}] for {}", filled.join(", "), url);
                    }
                }
                Err(e) => warn!("summary pass failed for {}: {}", url, e),
            }

            if record.is_complete() {
                return;
            }
        }

        let resolution = self.agent.analyze_job(url, page_text, model).await;
        match resolution.structured() {
            Some(fields) => {
                let filled = record.merge_missing(fields);
                info!(
                    "structured analysis filled {} field(s) for {}",
                    filled.len(),
                    url
                );
            }
            None => warn!(
                "no structured analysis for {}: {}",
                url,
                resolution.lines().join(" | ")
            ),
        }
    }
}
