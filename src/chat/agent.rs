use backon::{ExponentialBuilder, Retryable};
use eyre::{Result, eyre};
use log::{debug, info, warn};
use reqwest::StatusCode;
use serde_json::json;
use thiserror::Error;

use crate::models::job::JobRecord;
use crate::utils::config::LLMConfig;

const PROMPT_PREAMBLE: &str = "You are an assistant that customizes LaTeX resumes. Given the job \
description and the base resume, rewrite the resume so that it highlights the most relevant \
skills and experience for the job. Keep the document structure and preamble intact. \
Return only valid LaTeX code.";

#[derive(Debug, Error)]
pub enum RewriteError {
    #[error("rate limited by the LLM service: {0}")]
    RateLimited(String),
    #[error("LLM request failed with {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("LLM request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("LLM response carried no candidate text")]
    EmptyResponse,
}

impl RewriteError {
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, RewriteError::RateLimited(_))
    }
}

pub struct ResumeAgent {
    client: reqwest::Client,
    api_key: String,
    model: String,
    endpoint: String,
    max_retries: u32,
}

impl ResumeAgent {
    pub fn new(api_key: String, model: String, endpoint: String, max_retries: u32) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            model,
            endpoint,
            max_retries,
        }
    }

    pub fn from_config(llm: &LLMConfig) -> Result<Self> {
        let api_key = llm
            .resolve_api_key()
            .ok_or_else(|| eyre!("LLM API key not configured (set llm.api_key or GEMINI_API_KEY)"))?;

        Ok(Self::new(
            api_key,
            llm.model.clone(),
            llm.endpoint.clone(),
            llm.max_retries,
        ))
    }

    /// Returns the template rewritten for `job`. Rate limits are retried with
    /// exponential backoff; every other failure is returned right away.
    pub async fn tailor_resume(&self, job: &JobRecord, template: &str) -> Result<String> {
        info!(
            "tailoring resume for {:?} (max retries: {})",
            job.title().unwrap_or("untitled job"),
            self.max_retries
        );

        let prompt = build_prompt(job, template);
        debug!("prompt length: {}", prompt.len());

        let tailored = (|| self.generate(&prompt))
            .retry(ExponentialBuilder::default().with_max_times(self.max_retries as usize))
            .when(RewriteError::is_rate_limited)
            .notify(|err, delay| warn!("{}, retrying in {:?}", err, delay))
            .await?;

        Ok(tailored)
    }

    async fn generate(&self, prompt: &str) -> Result<String, RewriteError> {
        let request_body = json!({
            "contents": [{"parts": [{"text": prompt}]}],
            "generationConfig": {
                "temperature": 0.4,
            }
        });

        let url = format!(
            "{}/{}:generateContent",
            self.endpoint.trim_end_matches('/'),
            self.model
        );

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(RewriteError::RateLimited(response.text().await?));
        }
        if !status.is_success() {
            let body = response.text().await?;
            return Err(RewriteError::Status { status, body });
        }

        let body: serde_json::Value = response.json().await?;
        candidate_text(&body)
            .map(strip_code_fences)
            .ok_or(RewriteError::EmptyResponse)
    }
}

fn build_prompt(job: &JobRecord, template: &str) -> String {
    let mut details = String::new();
    for (field, value) in job.iter() {
        if field != "description"
            && let Some(value) = value
        {
            details.push_str(&format!("{}: {}\n", field, value));
        }
    }

    format!(
        "{}\n\nJob details:\n{}\nJob description:\n{}\n\nBase resume:\n{}\n",
        PROMPT_PREAMBLE,
        details,
        job.get("description").unwrap_or_default(),
        template
    )
}

fn candidate_text(body: &serde_json::Value) -> Option<&str> {
    body.get("candidates")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("content"))
        .and_then(|c| c.get("parts"))
        .and_then(|p| p.get(0))
        .and_then(|p| p.get("text"))
        .and_then(|t| t.as_str())
        .filter(|t| !t.trim().is_empty())
}

/// Drops a surrounding Markdown fence such as ```` ```latex ```` if the model added one.
fn strip_code_fences(text: &str) -> String {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed.to_string();
    };

    let body = rest.split_once('\n').map(|(_, body)| body).unwrap_or("");
    body.trim_end()
        .strip_suffix("```")
        .unwrap_or(body)
        .trim()
        .to_string()
}
