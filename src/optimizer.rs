use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::Mutex;

use crate::{analyze, DEFAULT_POSTING_TIME};

const FALLBACK_CONTENT_SCORE: u32 = 85;

static POSTING_TIME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)best posting time:?\s*([^\n]+)").unwrap());
static CONTENT_SCORE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)content score:?\s*(\d+)").unwrap());
static REPLY_HASHTAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"#[A-Za-z0-9]+").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    Professional,
    Casual,
    Storytelling,
}

impl Tone {
    pub fn from_str(value: &str) -> Option<Self> {
        match value.to_lowercase().as_str() {
            "professional" => Some(Tone::Professional),
            "casual" => Some(Tone::Casual),
            "storytelling" | "story" => Some(Tone::Storytelling),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Tone::Professional => "professional",
            Tone::Casual => "casual",
            Tone::Storytelling => "storytelling",
        }
    }
}

impl Default for Tone {
    fn default() -> Self {
        Tone::Professional
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostLength {
    Short,
    Medium,
    Long,
}

impl PostLength {
    pub fn from_str(value: &str) -> Option<Self> {
        match value.to_lowercase().as_str() {
            "short" => Some(PostLength::Short),
            "medium" => Some(PostLength::Medium),
            "long" => Some(PostLength::Long),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PostLength::Short => "short",
            PostLength::Medium => "medium",
            PostLength::Long => "long",
        }
    }
}

impl Default for PostLength {
    fn default() -> Self {
        PostLength::Medium
    }
}

#[derive(Debug, Clone)]
pub struct OptimizationRequest {
    pub text: String,
    pub tone: Tone,
    pub length: PostLength,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizedContent {
    pub raw_markdown: String,
    pub best_posting_time: String,
    pub content_score: u32,
    pub hashtag_suggestions: Vec<String>,
    pub suggestions: Vec<String>,
    pub estimated_reach: u64,
    pub engagement_score: f64,
}

#[derive(Debug, Error)]
pub enum OptimizeError {
    #[error("post text is empty")]
    EmptyInput,
    #[error("text generation failed: {0}")]
    ExternalService(String),
}

#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, String>;
}

pub struct Optimizer<C> {
    client: C,
    gate: Mutex<()>,
}

impl<C: TextGenerator> Optimizer<C> {
    pub fn new(client: C) -> Self {
        Self {
            client,
            gate: Mutex::new(()),
        }
    }

    pub async fn optimize(
        &self,
        request: &OptimizationRequest,
    ) -> Result<OptimizedContent, OptimizeError> {
        let text = request.text.trim();
        if text.is_empty() {
            return Err(OptimizeError::EmptyInput);
        }

        // Overlapping calls queue here; the collaborator never sees two
        // in-progress requests.
        let _in_flight = self.gate.lock().await;

        let prompt = build_prompt(text, request.tone, request.length);
        let reply = self
            .client
            .generate(&prompt)
            .await
            .map_err(OptimizeError::ExternalService)?;

        Ok(parse_reply(&reply, text))
    }
}

fn build_prompt(text: &str, tone: Tone, length: PostLength) -> String {
    format!(
        r#"As a LinkedIn content expert, analyze and optimize the following post. Format the response in markdown. Include:

1. An optimized version of the post that matches the tone ({tone}) and length ({length})
2. ### Content Analysis
   - Strengths
   - Areas for improvement
   - Content score (0-100)
3. ### Engagement Optimization
   - Best posting time
   - Recommended hashtags (3-5)
   - Target audience
4. ### SEO and Visibility Tips
   - Keyword optimization
   - Platform-specific tips
5. ### Additional Suggestions
   - Call-to-action recommendations
   - Visual content suggestions
   - Engagement prompts

Original post:
{text}"#,
        tone = tone.as_str(),
        length = length.as_str(),
        text = text,
    )
}

// Best-effort scraping of the free-text reply. Any extraction that misses
// falls back to its default; only the raw markdown is guaranteed.
fn parse_reply(reply: &str, original_text: &str) -> OptimizedContent {
    let best_posting_time = POSTING_TIME_RE
        .captures(reply)
        .and_then(|caps| caps.get(1))
        .map(|found| found.as_str().trim().replace('*', ""))
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| DEFAULT_POSTING_TIME.to_string());

    let content_score = CONTENT_SCORE_RE
        .captures(reply)
        .and_then(|caps| caps.get(1))
        .and_then(|found| found.as_str().parse::<u32>().ok())
        .map(|score| score.min(100))
        .unwrap_or(FALLBACK_CONTENT_SCORE);

    let hashtag_suggestions: Vec<String> = REPLY_HASHTAG_RE
        .find_iter(reply)
        .take(5)
        .map(|found| found.as_str().to_string())
        .collect();

    let suggestions: Vec<String> = reply
        .lines()
        .filter_map(|line| {
            let trimmed = line.trim_start();
            trimmed
                .strip_prefix('-')
                .or_else(|| trimmed.strip_prefix('•'))
                .map(|rest| rest.trim_start().to_string())
        })
        .filter(|suggestion| !suggestion.is_empty())
        .collect();

    // Reach and engagement stay derived from the post being optimized, not
    // from the reply.
    let baseline = analyze(original_text);

    OptimizedContent {
        raw_markdown: reply.to_string(),
        best_posting_time,
        content_score,
        hashtag_suggestions,
        suggestions,
        estimated_reach: baseline.estimated_reach,
        engagement_score: baseline.engagement_score,
    }
}
