use std::collections::BTreeMap;
use std::fmt::Write;

use crate::models::{AnnotatedReview, KeywordSummary, SentimentLabel};
use crate::pipeline::StageCounts;

#[derive(Debug, Clone, PartialEq)]
pub struct GroupSentiment {
    pub group: String,
    pub total: usize,
    pub positive: usize,
    pub negative: usize,
    pub neutral: usize,
    pub avg_rating: Option<f64>,
    pub avg_score: f64,
}

pub fn summarize_by_group(reviews: &[AnnotatedReview]) -> Vec<GroupSentiment> {
    let mut map: BTreeMap<&str, (GroupSentiment, f64, usize, u32)> = BTreeMap::new();

    for annotated in reviews {
        let group = annotated.review.group.as_str();
        let entry = map.entry(group).or_insert_with(|| {
            (
                GroupSentiment {
                    group: group.to_string(),
                    total: 0,
                    positive: 0,
                    negative: 0,
                    neutral: 0,
                    avg_rating: None,
                    avg_score: 0.0,
                },
                0.0,
                0,
                0,
            )
        });

        entry.0.total += 1;
        match annotated.sentiment_label {
            SentimentLabel::Positive => entry.0.positive += 1,
            SentimentLabel::Negative => entry.0.negative += 1,
            SentimentLabel::Neutral => entry.0.neutral += 1,
        }
        entry.1 += annotated.sentiment_score;
        if let Some(rating) = annotated.review.rating {
            entry.2 += 1;
            entry.3 += u32::from(rating);
        }
    }

    map.into_values()
        .map(|(mut summary, score_total, rated, rating_total)| {
            summary.avg_score = if summary.total == 0 {
                0.0
            } else {
                score_total / summary.total as f64
            };
            summary.avg_rating = (rated > 0).then(|| rating_total as f64 / rated as f64);
            summary
        })
        .collect()
}

pub fn build_report(
    input_label: &str,
    counts: &StageCounts,
    reviews: &[AnnotatedReview],
    keywords: &[KeywordSummary],
) -> String {
    let groups = summarize_by_group(reviews);
    let mut output = String::new();

    let _ = writeln!(output, "# Bank Review Insights Report");
    let _ = writeln!(output, "Generated from {input_label}");
    let _ = writeln!(output);
    let _ = writeln!(output, "## Pipeline Counts");
    let _ = writeln!(output, "- Input rows: {}", counts.input);
    let _ = writeln!(output, "- Kept after normalization: {}", counts.normalized);
    for (reason, count) in &counts.dropped {
        let _ = writeln!(output, "- Dropped ({reason}): {count}");
    }
    for label in [
        SentimentLabel::Positive,
        SentimentLabel::Negative,
        SentimentLabel::Neutral,
    ] {
        let _ = writeln!(output, "- {label}: {}", counts.label_count(label));
    }
    let _ = writeln!(output, "- Labels set by star rating: {}", counts.overridden);

    let _ = writeln!(output);
    let _ = writeln!(output, "## Sentiment by Bank");

    if groups.is_empty() {
        let _ = writeln!(output, "No reviews survived normalization.");
    } else {
        for group in groups.iter() {
            let rating = group
                .avg_rating
                .map(|value| format!("{value:.2}"))
                .unwrap_or_else(|| "n/a".to_string());
            let _ = writeln!(
                output,
                "- {}: {} reviews, {} positive / {} negative / {} neutral (avg score {:.3}, avg rating {})",
                group.group,
                group.total,
                group.positive,
                group.negative,
                group.neutral,
                group.avg_score,
                rating
            );
        }
    }

    let mut themes: Vec<(&String, &usize)> = counts.themes.iter().collect();
    themes.sort_by(|a, b| b.1.cmp(a.1).then(a.0.cmp(b.0)));
    let _ = writeln!(output);
    let _ = writeln!(output, "## Theme Mix");

    if themes.is_empty() {
        let _ = writeln!(output, "No themes tagged.");
    } else {
        for (theme, count) in themes {
            let _ = writeln!(output, "- {theme}: {count}");
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Distinctive Keywords");

    if keywords.is_empty() {
        let _ = writeln!(output, "No keywords extracted.");
    } else {
        for summary in keywords {
            let listed = if summary.keywords.is_empty() {
                "(none)".to_string()
            } else {
                summary.keywords_joined()
            };
            let _ = writeln!(output, "- {}: {}", summary.group, listed);
        }
    }

    let mut negatives: Vec<&AnnotatedReview> = reviews
        .iter()
        .filter(|annotated| annotated.sentiment_label == SentimentLabel::Negative)
        .collect();
    negatives.sort_by(|a, b| b.review.date.cmp(&a.review.date));
    let _ = writeln!(output);
    let _ = writeln!(output, "## Recent Negative Reviews");

    if negatives.is_empty() {
        let _ = writeln!(output, "No negative reviews in this batch.");
    } else {
        for annotated in negatives.iter().take(5) {
            let _ = writeln!(
                output,
                "- {} on {} [{}]: {}",
                annotated.review.group,
                annotated.review.date,
                annotated.themes_joined(),
                annotated.review.text
            );
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Review;
    use chrono::NaiveDate;

    fn annotated(group: &str, day: u32, label: SentimentLabel, score: f64, rating: Option<u8>) -> AnnotatedReview {
        AnnotatedReview {
            review: Review {
                text: format!("{group} review on day {day}"),
                rating,
                date: NaiveDate::from_ymd_opt(2024, 7, day).unwrap(),
                group: group.to_string(),
                source: "Google Play".to_string(),
            },
            sentiment_score: score,
            sentiment_label: label,
            overridden: false,
            themes: vec!["Other".to_string()],
        }
    }

    #[test]
    fn summarizes_each_group() {
        let reviews = vec![
            annotated("CBE", 1, SentimentLabel::Positive, 0.6, Some(5)),
            annotated("CBE", 2, SentimentLabel::Negative, -0.4, Some(1)),
            annotated("BOA", 3, SentimentLabel::Neutral, 0.0, None),
        ];

        let summaries = summarize_by_group(&reviews);
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].group, "BOA");
        assert_eq!(summaries[0].avg_rating, None);

        let cbe = &summaries[1];
        assert_eq!((cbe.positive, cbe.negative, cbe.neutral), (1, 1, 0));
        assert!((cbe.avg_score - 0.1).abs() < 1e-9);
        assert_eq!(cbe.avg_rating, Some(3.0));
    }

    #[test]
    fn report_lists_counts_keywords_and_recent_negatives() {
        let reviews = vec![
            annotated("CBE", 1, SentimentLabel::Negative, -0.4, Some(1)),
            annotated("CBE", 9, SentimentLabel::Negative, -0.7, Some(2)),
        ];
        let mut counts = StageCounts {
            input: 4,
            normalized: 2,
            ..StageCounts::default()
        };
        counts.dropped.insert("too short", 2);
        counts.labels.insert(SentimentLabel::Negative, 2);
        counts.themes.insert("Other".to_string(), 2);

        let keywords = vec![KeywordSummary {
            group: "CBE".to_string(),
            keywords: vec!["otp".to_string(), "login".to_string()],
        }];

        let report = build_report("reviews.csv", &counts, &reviews, &keywords);
        assert!(report.contains("- Input rows: 4"));
        assert!(report.contains("- Dropped (too short): 2"));
        assert!(report.contains("- negative: 2"));
        assert!(report.contains("- CBE: otp, login"));
        assert!(report.contains("- Other: 2"));

        let recent = report.find("CBE on 2024-07-09").unwrap();
        let older = report.find("CBE on 2024-07-01").unwrap();
        assert!(recent < older);
    }

    #[test]
    fn empty_batch_report_has_placeholders() {
        let report = build_report("empty.csv", &StageCounts::default(), &[], &[]);
        assert!(report.contains("No reviews survived normalization."));
        assert!(report.contains("No keywords extracted."));
        assert!(report.contains("No negative reviews in this batch."));
    }
}
