//! Recommendation service boundary.
//!
//! The analytics record is handed to a text-generation model which answers
//! with structured advice. The client is constructed explicitly and passed
//! to whoever needs it; there is no process-wide handle.
//!
//! # Example
//!
//! ```rust,ignore
//! use social_report::recommend::{GeminiClient, RecommendationService};
//!
//! let client = GeminiClient::from_env()?.with_model("gemini-2.5-flash");
//! let advice = client.recommend(&output.record)?;
//! ```

use crate::error::{AnalyticsError, Result};
use crate::types::AnalyticsRecord;
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const API_KEY_ENV: &str = "GEMINI_API_KEY";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PostIdea {
    pub day: u32,
    pub topic: String,
    #[serde(rename = "type")]
    pub post_type: String,
    pub hook: String,
}

/// Structured advice returned by the service. Missing keys default.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Recommendations {
    pub performance_summary: String,
    pub strengths: Vec<String>,
    pub areas_for_improvement: Vec<String>,
    pub reach_recommendations: Vec<String>,
    pub timing_recommendations: Vec<String>,
    pub content_recommendations: Vec<String>,
    pub hook_suggestions: Vec<String>,
    pub what_to_avoid: Vec<String>,
    pub next_7_post_ideas: Vec<PostIdea>,
    pub engagement_tactics: Vec<String>,
    pub growth_forecast: String,
}

pub trait RecommendationService {
    fn recommend(&self, record: &AnalyticsRecord) -> Result<Recommendations>;
}

/// Build the instruction sent to the model for one record.
pub fn build_prompt(record: &AnalyticsRecord) -> Result<String> {
    let top_posts = serde_json::to_string_pretty(&record.top_posts)?;
    Ok(format!(
        r#"You are a LinkedIn analytics expert. Analyze this LinkedIn performance data and provide strategic recommendations.

Analytics Summary:
- Total Posts: {total}
- Date Range: {range}
- Average Impressions: {imp}
- Average Reactions: {react}
- Average Comments: {comm}
- Average Shares: {shares}
- Engagement Rate: {rate}%
- Best Performing Day: {day}
- Best Content Type: {ctype}

Top Performing Posts:
{top_posts}

Provide comprehensive recommendations.

Format your response as JSON:
{{
    "performance_summary": "Overall performance assessment",
    "strengths": ["What's working well"],
    "areas_for_improvement": ["What needs work"],
    "reach_recommendations": ["How to increase reach"],
    "timing_recommendations": ["Best times and days to post"],
    "content_recommendations": ["Content type and topic suggestions"],
    "hook_suggestions": ["5 hook templates based on top performers"],
    "what_to_avoid": ["Things to stop doing"],
    "next_7_post_ideas": [
        {{"day": 1, "topic": "...", "type": "...", "hook": "..."}}
    ],
    "engagement_tactics": ["Ways to boost engagement"],
    "growth_forecast": "Expected improvement if recommendations followed"
}}"#,
        total = record.total_posts,
        range = record.date_range,
        imp = record.avg_impressions,
        react = record.avg_reactions,
        comm = record.avg_comments,
        shares = record.avg_shares,
        rate = record.engagement_rate,
        day = record.best_day,
        ctype = record.best_content_type,
    ))
}

// Wire types for the generateContent endpoint.

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: &'static str,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

/// Pull the first text part out of a generateContent response body.
fn extract_text(body: &str) -> Result<String> {
    let response: GenerateResponse = serde_json::from_str(body)?;
    response
        .candidates
        .into_iter()
        .filter_map(|c| c.content)
        .flat_map(|c| c.parts)
        .find_map(|p| p.text)
        .ok_or_else(|| AnalyticsError::Recommendation("response contained no text".into()))
}

/// Parse the model's JSON answer, tolerating a fenced code block.
pub fn parse_recommendations(text: &str) -> Result<Recommendations> {
    let trimmed = text.trim();
    let unfenced = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|s| s.strip_suffix("```"))
        .unwrap_or(trimmed);
    serde_json::from_str(unfenced.trim())
        .map_err(|e| AnalyticsError::Recommendation(format!("unparseable answer: {e}")))
}

/// Gemini `generateContent` client.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiClient {
    /// Create a client with the given API key. An empty key is rejected.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(AnalyticsError::Config(format!("{API_KEY_ENV} is empty")));
        }
        let client = Client::builder().timeout(Duration::from_secs(60)).build()?;
        Ok(Self {
            client,
            api_key,
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    /// Create from environment variable `GEMINI_API_KEY`.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var(API_KEY_ENV)
            .map_err(|_| AnalyticsError::Config(format!("{API_KEY_ENV} not set")))?;
        Self::new(api_key)
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set a custom base URL (proxies, test servers).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        )
    }

    fn generate(&self, prompt: &str) -> Result<String> {
        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
            },
        };
        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()?;
        let status = response.status();
        let body = response.text()?;
        if !status.is_success() {
            return Err(AnalyticsError::Recommendation(format!(
                "service returned {status}: {}",
                body.chars().take(200).collect::<String>()
            )));
        }
        extract_text(&body)
    }
}

impl RecommendationService for GeminiClient {
    fn recommend(&self, record: &AnalyticsRecord) -> Result<Recommendations> {
        let prompt = build_prompt(record)?;
        tracing::debug!(model = %self.model, chars = prompt.len(), "requesting recommendations");
        let text = self.generate(&prompt)?;
        parse_recommendations(&text)
    }
}
