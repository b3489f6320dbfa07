use crate::lexicon::PolarityAnalyzer;
use crate::models::{Review, ScoredReview, SentimentLabel};

pub const POSITIVE_CUTOFF: f64 = 0.05;
pub const NEGATIVE_CUTOFF: f64 = -0.05;

pub fn label_from_score(score: f64) -> SentimentLabel {
    if score >= POSITIVE_CUTOFF {
        SentimentLabel::Positive
    } else if score <= NEGATIVE_CUTOFF {
        SentimentLabel::Negative
    } else {
        SentimentLabel::Neutral
    }
}

/// Lets an extreme star rating overrule a lexicon score that disagrees with it.
/// Three-star reviews are mixed and keep the lexicon label.
pub fn apply_rating_override(label: SentimentLabel, score: f64, rating: Option<u8>) -> SentimentLabel {
    match rating {
        Some(rating) if rating <= 2 && score > NEGATIVE_CUTOFF => SentimentLabel::Negative,
        Some(rating) if rating >= 4 && score < POSITIVE_CUTOFF => SentimentLabel::Positive,
        _ => label,
    }
}

pub fn score_review<A: PolarityAnalyzer + ?Sized>(analyzer: &A, review: Review) -> ScoredReview {
    let score = analyzer.compound(&review.text).clamp(-1.0, 1.0);
    let base = label_from_score(score);
    let label = apply_rating_override(base, score, review.rating);

    ScoredReview {
        review,
        sentiment_score: score,
        sentiment_label: label,
        overridden: label != base,
    }
}

pub fn score_reviews<A: PolarityAnalyzer + ?Sized>(
    analyzer: &A,
    reviews: Vec<Review>,
) -> Vec<ScoredReview> {
    reviews
        .into_iter()
        .map(|review| score_review(analyzer, review))
        .collect()
}
