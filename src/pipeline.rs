use std::collections::BTreeMap;

use tracing::info;

use crate::keywords::KeywordExtractor;
use crate::lexicon::PolarityAnalyzer;
use crate::models::{AnnotatedReview, KeywordSummary, RawReview, ScoredReview, SentimentLabel};
use crate::normalize::normalize_batch;
use crate::sentiment::score_reviews;
use crate::themes::{detect_themes, Taxonomy};

/// Row counts at each stage, so that silently dropped rows stay visible.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StageCounts {
    pub input: usize,
    pub normalized: usize,
    pub dropped: BTreeMap<&'static str, usize>,
    pub labels: BTreeMap<SentimentLabel, usize>,
    pub overridden: usize,
    pub themes: BTreeMap<String, usize>,
    pub groups: usize,
}

impl StageCounts {
    pub fn dropped_total(&self) -> usize {
        self.dropped.values().sum()
    }

    pub fn label_count(&self, label: SentimentLabel) -> usize {
        self.labels.get(&label).copied().unwrap_or(0)
    }
}

#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub reviews: Vec<AnnotatedReview>,
    pub keywords: Vec<KeywordSummary>,
    pub counts: StageCounts,
}

pub fn tag_reviews(taxonomy: &Taxonomy, scored: Vec<ScoredReview>) -> Vec<AnnotatedReview> {
    scored
        .into_iter()
        .map(|scored| {
            let themes = detect_themes(taxonomy, Some(&scored.review.text));
            AnnotatedReview {
                review: scored.review,
                sentiment_score: scored.sentiment_score,
                sentiment_label: scored.sentiment_label,
                overridden: scored.overridden,
                themes,
            }
        })
        .collect()
}

pub fn run<A: PolarityAnalyzer + ?Sized>(
    raws: &[RawReview],
    analyzer: &A,
    taxonomy: &Taxonomy,
    extractor: &KeywordExtractor,
) -> PipelineOutput {
    let mut counts = StageCounts {
        input: raws.len(),
        ..StageCounts::default()
    };
    info!(rows = counts.input, "loaded raw reviews");

    let (normalized, dropped) = normalize_batch(raws);
    counts.normalized = normalized.len();
    for reason in &dropped {
        *counts.dropped.entry(reason.kind()).or_insert(0) += 1;
    }
    info!(
        kept = counts.normalized,
        dropped = counts.dropped_total(),
        "normalized reviews"
    );
    for (reason, count) in &counts.dropped {
        info!(reason, count, "dropped during normalization");
    }

    let keywords = extractor.extract(&normalized);
    counts.groups = keywords.len();
    info!(groups = counts.groups, "extracted group keywords");

    let scored = score_reviews(analyzer, normalized);
    for review in &scored {
        *counts.labels.entry(review.sentiment_label).or_insert(0) += 1;
        if review.overridden {
            counts.overridden += 1;
        }
    }
    info!(
        positive = counts.label_count(SentimentLabel::Positive),
        negative = counts.label_count(SentimentLabel::Negative),
        neutral = counts.label_count(SentimentLabel::Neutral),
        overridden = counts.overridden,
        "scored sentiment"
    );

    let reviews = tag_reviews(taxonomy, scored);
    for review in &reviews {
        for theme in &review.themes {
            *counts.themes.entry(theme.clone()).or_insert(0) += 1;
        }
    }
    info!(themes = counts.themes.len(), "tagged themes");

    PipelineOutput {
        reviews,
        keywords,
        counts,
    }
}
