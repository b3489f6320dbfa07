use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A review row as it arrives from the data source, before any cleaning.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawReview {
    #[serde(default)]
    pub review: Option<String>,
    #[serde(default)]
    pub rating: Option<String>,
    #[serde(default)]
    pub date: String,
    #[serde(alias = "group")]
    pub bank: String,
    #[serde(default)]
    pub source: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Review {
    pub text: String,
    pub rating: Option<u8>,
    pub date: NaiveDate,
    pub group: String,
    pub source: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentLabel {
    Positive,
    Negative,
    Neutral,
}

impl SentimentLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            SentimentLabel::Positive => "positive",
            SentimentLabel::Negative => "negative",
            SentimentLabel::Neutral => "neutral",
        }
    }
}

impl fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoredReview {
    pub review: Review,
    pub sentiment_score: f64,
    pub sentiment_label: SentimentLabel,
    /// Set when the star rating replaced the lexicon label.
    pub overridden: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnnotatedReview {
    pub review: Review,
    pub sentiment_score: f64,
    pub sentiment_label: SentimentLabel,
    pub overridden: bool,
    pub themes: Vec<String>,
}

impl AnnotatedReview {
    pub fn themes_joined(&self) -> String {
        self.themes.join(", ")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct KeywordSummary {
    pub group: String,
    pub keywords: Vec<String>,
}

impl KeywordSummary {
    pub fn keywords_joined(&self) -> String {
        self.keywords.join(", ")
    }
}
