use post_optimizer::optimizer::{OptimizationRequest, OptimizedContent, PostLength, Tone};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct ApiAnalyzeRequest {
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ApiOptimizeRequest {
    pub text: Option<String>,
    pub tone: Option<String>,
    pub length: Option<String>,
    pub request_id: Option<String>,
}

impl ApiOptimizeRequest {
    pub fn into_request(self) -> Result<OptimizationRequest, String> {
        let tone = match self.tone.as_deref() {
            None => Tone::default(),
            Some(value) => {
                Tone::from_str(value).ok_or_else(|| format!("invalid tone: {}", value))?
            }
        };
        let length = match self.length.as_deref() {
            None => PostLength::default(),
            Some(value) => {
                PostLength::from_str(value).ok_or_else(|| format!("invalid length: {}", value))?
            }
        };

        Ok(OptimizationRequest {
            text: self.text.unwrap_or_default(),
            tone,
            length,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct ApiOptimizeResponse {
    pub request_id: String,
    pub raw_markdown: String,
    pub best_posting_time: String,
    pub content_score: u32,
    pub hashtag_suggestions: Vec<String>,
    pub suggestions: Vec<String>,
    pub estimated_reach: u64,
    pub engagement_score: f64,
}

impl ApiOptimizeResponse {
    pub fn from_content(content: OptimizedContent, request_id: String) -> Self {
        Self {
            request_id,
            raw_markdown: content.raw_markdown,
            best_posting_time: content.best_posting_time,
            content_score: content.content_score,
            hashtag_suggestions: content.hashtag_suggestions,
            suggestions: content.suggestions,
            estimated_reach: content.estimated_reach,
            engagement_score: content.engagement_score,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ApiSaveDraftRequest {
    pub content: Option<String>,
}
