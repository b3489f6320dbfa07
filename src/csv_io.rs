use std::io;
use std::path::Path;

use anyhow::Context;
use chrono::NaiveDate;
use serde::Serialize;

use crate::models::{AnnotatedReview, KeywordSummary, RawReview, SentimentLabel};

#[derive(Debug, Default)]
pub struct SourceBatch {
    pub rows: Vec<RawReview>,
    /// Rows the CSV reader could not decode at all.
    pub malformed: usize,
}

#[derive(Serialize)]
struct AnnotatedRow<'a> {
    review: &'a str,
    rating: Option<u8>,
    date: NaiveDate,
    bank: &'a str,
    source: &'a str,
    sentiment_label: SentimentLabel,
    sentiment_score: f64,
    themes: String,
}

#[derive(Serialize)]
struct KeywordRow<'a> {
    bank: &'a str,
    keywords: String,
}

/// Each entry lists the header names that satisfy one required column.
const REQUIRED_COLUMNS: &[&[&str]] = &[&["review"], &["date"], &["bank", "group"]];

pub fn read_raw_reviews<R: io::Read>(input: R) -> anyhow::Result<SourceBatch> {
    let mut reader = csv::Reader::from_reader(input);
    let headers = reader
        .headers()
        .context("failed to read review CSV header")?
        .clone();
    for names in REQUIRED_COLUMNS {
        if !headers.iter().any(|header| names.contains(&header)) {
            anyhow::bail!(
                "review CSV is missing required column {:?} (found {:?})",
                names.join("/"),
                headers.iter().collect::<Vec<_>>()
            );
        }
    }

    let mut batch = SourceBatch::default();

    for (index, result) in reader.deserialize::<RawReview>().enumerate() {
        match result {
            Ok(row) => batch.rows.push(row),
            Err(err) if matches!(err.kind(), csv::ErrorKind::Io(_)) => {
                return Err(err).context("failed to read review CSV");
            }
            Err(err) => {
                tracing::warn!(row = index + 1, error = %err, "skipping malformed CSV row");
                batch.malformed += 1;
            }
        }
    }

    Ok(batch)
}

pub fn read_raw_reviews_from_path(path: &Path) -> anyhow::Result<SourceBatch> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    read_raw_reviews(file)
}

pub fn write_annotated<W: io::Write>(output: W, reviews: &[AnnotatedReview]) -> anyhow::Result<()> {
    let mut writer = csv::Writer::from_writer(output);
    for annotated in reviews {
        let review = &annotated.review;
        writer.serialize(AnnotatedRow {
            review: &review.text,
            rating: review.rating,
            date: review.date,
            bank: &review.group,
            source: &review.source,
            sentiment_label: annotated.sentiment_label,
            sentiment_score: annotated.sentiment_score,
            themes: annotated.themes_joined(),
        })?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_keywords<W: io::Write>(output: W, summaries: &[KeywordSummary]) -> anyhow::Result<()> {
    let mut writer = csv::Writer::from_writer(output);
    for summary in summaries {
        writer.serialize(KeywordRow {
            bank: &summary.group,
            keywords: summary.keywords_joined(),
        })?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_annotated_to_path(path: &Path, reviews: &[AnnotatedReview]) -> anyhow::Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    write_annotated(file, reviews)
}

pub fn write_keywords_to_path(path: &Path, summaries: &[KeywordSummary]) -> anyhow::Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    write_keywords(file, summaries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Review;

    #[test]
    fn reads_raw_rows_with_missing_fields() {
        let data = "review,rating,date,bank,source\n\
                    Transfer failed twice,1,2024-02-01 10:00:00,CBE,Google Play\n\
                    ,5,2024-02-02,CBE,Google Play\n\
                    Login is quick now,,2024-02-03,BOA,Google Play\n";
        let batch = read_raw_reviews(data.as_bytes()).unwrap();

        assert_eq!(batch.malformed, 0);
        assert_eq!(batch.rows.len(), 3);
        assert_eq!(batch.rows[0].review.as_deref(), Some("Transfer failed twice"));
        assert_eq!(batch.rows[0].rating.as_deref(), Some("1"));
        assert_eq!(batch.rows[1].review, None);
        assert_eq!(batch.rows[2].rating, None);
        assert_eq!(batch.rows[2].bank, "BOA");
    }

    #[test]
    fn accepts_group_column_alias() {
        let data = "review,rating,date,group,source\nNice and simple app,4,2024-02-01,Dashen,Google Play\n";
        let batch = read_raw_reviews(data.as_bytes()).unwrap();
        assert_eq!(batch.rows[0].bank, "Dashen");
    }

    #[test]
    fn skips_rows_with_wrong_field_count() {
        let data = "review,rating,date,bank,source\n\
                    Works fine for me,4,2024-02-01,CBE,Google Play\n\
                    broken row\n\
                    Keeps logging me out,2,2024-02-02,CBE,Google Play\n";
        let batch = read_raw_reviews(data.as_bytes()).unwrap();
        assert_eq!(batch.rows.len(), 2);
        assert_eq!(batch.malformed, 1);
    }

    #[test]
    fn rejects_source_without_required_columns() {
        let data = "review,rating,date,source\n\
                    Transfer failed twice,1,2024-02-01,Google Play\n\
                    Great app overall,5,2024-02-02,Google Play\n";
        let err = read_raw_reviews(data.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("bank/group"), "{err}");

        let data = "text,rating,date,bank\nGreat app overall,5,2024-02-02,CBE\n";
        let err = read_raw_reviews(data.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("\"review\""), "{err}");

        assert!(read_raw_reviews("".as_bytes()).is_err());
    }

    #[test]
    fn writes_annotated_and_keyword_rows() {
        let annotated = AnnotatedReview {
            review: Review {
                text: "Transfer failed, app crashed".to_string(),
                rating: None,
                date: NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
                group: "CBE".to_string(),
                source: "Google Play".to_string(),
            },
            sentiment_score: -0.5,
            sentiment_label: SentimentLabel::Negative,
            overridden: false,
            themes: vec![
                "Transactions & Payments".to_string(),
                "Stability & Bugs".to_string(),
            ],
        };

        let mut out = Vec::new();
        write_annotated(&mut out, &[annotated]).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text,
            "review,rating,date,bank,source,sentiment_label,sentiment_score,themes\n\
             \"Transfer failed, app crashed\",,2024-02-01,CBE,Google Play,negative,-0.5,\"Transactions & Payments, Stability & Bugs\"\n"
        );

        let mut out = Vec::new();
        write_keywords(
            &mut out,
            &[KeywordSummary {
                group: "CBE".to_string(),
                keywords: vec!["otp".to_string(), "transfer failed".to_string()],
            }],
        )
        .unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "bank,keywords\nCBE,\"otp, transfer failed\"\n"
        );
    }
}
