use eyre::{Result, eyre};
use futures::stream::BoxStream;
use log::{debug, info, warn};

use super::client::{ChatMessage, LlmClient};
use super::resolver::{self, Resolution, ResolveRequest, UNAVAILABLE, split_lines};
use crate::utils::config::LLMConfig;
use crate::utils::text::{fill_template, is_bullet, strip_bullet, truncate_chars};

const JOB_SYSTEM_PROMPT: &str = include_str!("job_system_prompt.txt");
const JOB_PROMPT_TEMPLATE: &str = include_str!("job_prompt_template.txt");
const SUMMARY_PROMPT: &str = include_str!("summary_prompt.txt");
const RESUME_PROMPT: &str = include_str!("resume_prompt.txt");

const RECRUITER: &str = "You are an expert recruiter.";
const CAREER_COACH: &str = "You are a professional career coach.";

/// Every LLM-backed operation on job postings. Without credentials the agent
/// still works, it just reports itself unavailable.
pub struct JobAgent {
    client: Option<LlmClient>,
    summary_model: String,
    max_input_chars: usize,
}

impl JobAgent {
    pub fn new(config: &LLMConfig) -> Self {
        Self::with_client(LlmClient::from_config(config), config)
    }

    pub fn with_client(client: Option<LlmClient>, config: &LLMConfig) -> Self {
        Self {
            client,
            summary_model: config.summary_model.clone(),
            max_input_chars: config.max_input_chars,
        }
    }

    pub fn is_available(&self) -> bool {
        self.client.is_some()
    }

    fn client(&self) -> Result<&LlmClient> {
        self.client.as_ref().ok_or_else(|| eyre!(UNAVAILABLE))
    }

    fn summary_messages(&self, text: &str) -> [ChatMessage; 2] {
        let content = truncate_chars(text, self.max_input_chars);
        [
            ChatMessage::system(RECRUITER),
            ChatMessage::user(fill_template(SUMMARY_PROMPT, &[("content", content)])),
        ]
    }

    /// Plain-text summary of a posting.
    pub async fn summarize(&self, text: &str, model: Option<&str>) -> Result<String> {
        let client = self.client()?;
        info!("summarizing job posting ({} characters)", text.len());

        let model = model.unwrap_or(&self.summary_model);
        let summary = client
            .complete(&self.summary_messages(text), Some(model), false)
            .await?;

        debug!("summary: {}", summary);
        Ok(summary.trim().to_string())
    }

    /// Same as [`JobAgent::summarize`] but yields the text as it is generated.
    pub async fn stream_summary(
        &self,
        description: &str,
        model: Option<&str>,
    ) -> Result<BoxStream<'static, Result<String>>> {
        let client = self.client()?;
        let model = model.unwrap_or(&self.summary_model);
        client.stream(&self.summary_messages(description), Some(model)).await
    }

    /// Structured analysis of a posting. Never fails, see [`Resolution`].
    pub async fn analyze_job(&self, url: &str, text: &str, model: Option<&str>) -> Resolution {
        info!("asking LLM to structure the posting at {}", url);
        resolver::resolve(
            self.client.as_ref(),
            ResolveRequest {
                system_prompt: JOB_SYSTEM_PROMPT,
                prompt_template: JOB_PROMPT_TEMPLATE,
                placeholders: &[("url", url)],
                content: text,
                max_input_chars: self.max_input_chars,
                model,
            },
        )
        .await
    }

    /// Resume tailoring tips for a posting. Failures come back as a single
    /// explanatory line so callers can always display the result.
    pub async fn resume_suggestions(
        &self,
        description: &str,
        resume: &str,
        model: Option<&str>,
    ) -> Vec<String> {
        let client = match self.client() {
            Ok(client) => client,
            Err(e) => return vec![e.to_string()],
        };

        let prompt = fill_template(
            RESUME_PROMPT,
            &[
                ("description", truncate_chars(description, self.max_input_chars)),
                ("resume", truncate_chars(resume, self.max_input_chars)),
            ],
        );
        let messages = [ChatMessage::system(CAREER_COACH), ChatMessage::user(prompt)];

        match client.complete(&messages, model, false).await {
            Ok(text) => {
                let suggestions = suggestion_lines(&text);
                info!("LLM returned {} resume suggestions", suggestions.len());
                suggestions
            }
            Err(e) => {
                warn!("resume suggestions failed: {}", e);
                vec![format!("Error generating suggestions: {}", e)]
            }
        }
    }
}

/// Bulleted lines if the reply has any, otherwise every non-empty line.
fn suggestion_lines(text: &str) -> Vec<String> {
    let bullets: Vec<String> = text
        .lines()
        .filter(|line| is_bullet(line))
        .map(strip_bullet)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect();

    if !bullets.is_empty() {
        return bullets;
    }

    let lines = split_lines(text);
    if lines.is_empty() {
        vec!["AI returned an empty response".to_string()]
    } else {
        lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::mock::MockLlm;
    use crate::utils::config::ConfigInner;

    fn offline_agent() -> JobAgent {
        JobAgent::with_client(None, &ConfigInner::default().llm)
    }

    #[test]
    fn prompts_have_placeholders() {
        assert!(JOB_PROMPT_TEMPLATE.contains("{url}"));
        assert!(JOB_PROMPT_TEMPLATE.contains("{content}"));
        assert!(SUMMARY_PROMPT.contains("{content}"));
        assert!(RESUME_PROMPT.contains("{description}"));
        assert!(RESUME_PROMPT.contains("{resume}"));
    }

    #[test]
    fn suggestions_prefer_bullets() {
        let text = "Here are my suggestions:\n\
                    - Emphasize Kubernetes experience\n\
                    • Quantify the migration project\n\
                    2) Move skills above education\n\
                    Good luck!";
        assert_eq!(
            suggestion_lines(text),
            vec![
                "Emphasize Kubernetes experience",
                "Quantify the migration project",
                "Move skills above education",
            ]
        );
    }

    #[test]
    fn suggestions_fall_back_to_lines() {
        assert_eq!(
            suggestion_lines("Add a summary section.\n\nMention SQL."),
            vec!["Add a summary section.", "Mention SQL."]
        );
        assert_eq!(suggestion_lines("  "), vec!["AI returned an empty response"]);
    }

    #[tokio::test]
    async fn offline_agent_degrades() {
        let agent = offline_agent();
        assert!(!agent.is_available());

        assert!(agent.summarize("text", None).await.is_err());
        assert!(agent.stream_summary("text", None).await.is_err());
        assert!(matches!(
            agent.analyze_job("https://example.com", "text", None).await,
            Resolution::Unavailable(_)
        ));
        assert_eq!(
            agent.resume_suggestions("job", "resume", None).await,
            vec![UNAVAILABLE.to_string()]
        );
    }

    #[tokio::test]
    async fn user_text_is_not_treated_as_a_placeholder() {
        let mock = MockLlm::start(|_| "- Lead with the SQL work\n- Mention {resume} skills".to_string()).await;
        let agent = JobAgent::with_client(Some(mock.client(0)), &ConfigInner::default().llm);

        let suggestions = agent
            .resume_suggestions("Paste your {resume} below.", "Five years of SQL.", None)
            .await;

        assert_eq!(
            suggestions,
            vec!["Lead with the SQL work", "Mention {resume} skills"]
        );
        let prompt = mock.last_prompt();
        assert!(prompt.contains("Paste your {resume} below."));
        assert_eq!(prompt.matches("Five years of SQL.").count(), 1);
    }

    #[tokio::test]
    async fn summary_is_trimmed() {
        let mock = MockLlm::start(|_| "  Hooli is hiring a Data Analyst.\n".to_string()).await;
        let agent = JobAgent::with_client(Some(mock.client(0)), &ConfigInner::default().llm);

        let summary = agent.summarize("posting", None).await.unwrap();
        assert_eq!(summary, "Hooli is hiring a Data Analyst.");
        assert!(mock.last_prompt().trim_end().ends_with("\n\nposting"));
    }
}
