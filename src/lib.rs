pub mod config;
pub mod drafts;
pub mod optimizer;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

pub const DEFAULT_POSTING_TIME: &str = "9:00 AM EST";

const DEFAULT_HASHTAG_IDEAS: [&str; 4] = ["linkedin", "career", "networking", "growth"];

static HASHTAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"#\w+").unwrap());
static MENTION_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"@\w+").unwrap());

#[derive(Debug, Clone)]
pub struct TextFeatures {
    pub char_count: usize,
    pub word_count: usize,
    pub hashtags: usize,
    pub mentions: usize,
    pub lines: usize,
    pub has_question: bool,
    pub has_mention_char: bool,
    pub has_link: bool,
    pub has_newline: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Analytics {
    pub estimated_reach: u64,
    pub engagement_score: f64,
    pub content_score: u32,
    pub optimal: bool,
    pub best_posting_time: String,
    pub hashtag_suggestions: Vec<String>,
    pub suggestions: Vec<String>,
}

pub fn text_features(text: &str) -> TextFeatures {
    let trimmed = text.trim();
    // Splitting an empty string still yields one token upstream of the reach
    // formula, so an empty post counts one word. Callers treat it as "no
    // words", not "one word".
    let word_count = if trimmed.is_empty() {
        1
    } else {
        trimmed.split_whitespace().count()
    };

    TextFeatures {
        char_count: text.chars().count(),
        word_count,
        hashtags: HASHTAG_RE.find_iter(text).count(),
        mentions: MENTION_RE.find_iter(text).count(),
        lines: text.split('\n').count(),
        has_question: text.contains('?'),
        has_mention_char: text.contains('@'),
        has_link: text.contains("http"),
        has_newline: text.contains('\n'),
    }
}

pub fn analyze(text: &str) -> Analytics {
    let features = text_features(text);

    let estimated_reach = (features.word_count * 2
        + features.hashtags * 100
        + features.lines * 50
        + features.mentions * 75) as u64;

    let question_bonus = if features.has_question { 15 } else { 0 };
    let engagement_raw = ((question_bonus + features.hashtags * 5 + features.lines * 3) as f64
        / 100.0)
        .min(0.3);
    let engagement_score = round1(engagement_raw * 100.0);

    let content_score = ((if features.word_count >= 50 { 30 } else { 15 })
        + (if features.hashtags >= 2 { 20 } else { 10 })
        + (if features.lines >= 3 { 20 } else { 10 })
        + question_bonus
        + (if features.mentions > 0 { 15 } else { 0 }))
    .min(100) as u32;

    Analytics {
        estimated_reach,
        engagement_score,
        content_score,
        optimal: (2..=5).contains(&features.hashtags),
        best_posting_time: DEFAULT_POSTING_TIME.to_string(),
        hashtag_suggestions: DEFAULT_HASHTAG_IDEAS
            .iter()
            .map(|tag| tag.to_string())
            .collect(),
        suggestions: build_suggestions(text, &features),
    }
}

fn build_suggestions(text: &str, features: &TextFeatures) -> Vec<String> {
    let mut suggestions = Vec::new();

    if features.char_count < 100 {
        suggestions.push(
            "Consider making your post longer (ideal length: 100-250 characters)".to_string(),
        );
    }
    if features.char_count > 1300 {
        suggestions
            .push("Post is too long. LinkedIn truncates posts after ~1300 characters".to_string());
    }
    if features.hashtags == 0 {
        suggestions
            .push("Add relevant hashtags (2-5 recommended) to increase visibility".to_string());
    } else if features.hashtags > 7 {
        suggestions.push("Too many hashtags might look spammy. Keep it between 3-5".to_string());
    }
    if !features.has_question {
        suggestions.push("Consider adding a question to boost engagement".to_string());
    }
    if !features.has_newline {
        suggestions.push("Add line breaks to improve readability".to_string());
    }
    if !features.has_mention_char {
        suggestions.push("Consider mentioning relevant connections using @".to_string());
    }
    if features.has_link {
        suggestions
            .push("Consider putting links in the first comment instead of the post".to_string());
    }

    append_content_tips(text, features, &mut suggestions);
    suggestions
}

fn append_content_tips(text: &str, features: &TextFeatures, suggestions: &mut Vec<String>) {
    if features.char_count <= 50 {
        return;
    }

    let lowercase = text.to_lowercase();
    let words: Vec<&str> = lowercase.split_whitespace().collect();

    let triggers = ["share", "tell", "what", "how", "why"];
    if !words.iter().any(|word| triggers.contains(word)) {
        suggestions.push(
            "Try adding engagement triggers like \"Share your thoughts\" or \"What do you think?\""
                .to_string(),
        );
    }

    let narrative = ["when", "while", "after", "before", "during"];
    if !words.iter().any(|word| narrative.contains(word)) {
        suggestions.push("Consider adding a brief story or personal experience".to_string());
    }

    let action = ["discover", "learn", "boost", "improve", "create"];
    if !words.iter().any(|word| action.contains(word)) {
        suggestions.push("Include action-oriented words to drive engagement".to_string());
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

pub fn join_suggestions(suggestions: &[String]) -> String {
    suggestions.join("\n\n")
}

pub fn format_number(value: u64) -> String {
    let mut chars: Vec<char> = value.to_string().chars().collect();
    let mut result = String::new();
    let mut count = 0usize;

    while let Some(ch) = chars.pop() {
        if count == 3 {
            result.push(',');
            count = 0;
        }
        result.push(ch);
        count += 1;
    }

    result.chars().rev().collect()
}
