use std::collections::{BTreeSet, HashMap};

use sqlx::{PgPool, Postgres, Row, Transaction};
use uuid::Uuid;

use crate::models::{AnnotatedReview, KeywordSummary};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadSummary {
    pub banks_created: usize,
    pub reviews_inserted: usize,
    pub reviews_skipped: usize,
    pub keyword_rows: usize,
}

/// Display name stored next to a bank code.
pub fn app_name(bank: &str) -> &str {
    match bank {
        "CBE" => "Commercial Bank of Ethiopia Mobile",
        "BOA" => "Bank of Abyssinia Mobile",
        "Dashen" => "Dashen Bank Mobile",
        other => other,
    }
}

async fn upsert_banks(
    tx: &mut Transaction<'_, Postgres>,
    banks: &BTreeSet<&str>,
) -> anyhow::Result<(HashMap<String, i32>, usize)> {
    let mut created = 0usize;

    for bank in banks {
        let result = sqlx::query(
            r#"
            INSERT INTO banks (bank_name, app_name)
            SELECT $1, $2
            WHERE NOT EXISTS (
                SELECT 1 FROM banks WHERE bank_name = $1
            )
            "#,
        )
        .bind(*bank)
        .bind(app_name(bank))
        .execute(&mut **tx)
        .await?;
        created += result.rows_affected() as usize;
    }

    let names: Vec<String> = banks.iter().map(|bank| bank.to_string()).collect();
    let rows = sqlx::query("SELECT bank_id, bank_name FROM banks WHERE bank_name = ANY($1)")
        .bind(&names)
        .fetch_all(&mut **tx)
        .await?;

    let mut ids = HashMap::new();
    for row in rows {
        ids.insert(row.get::<String, _>("bank_name"), row.get::<i32, _>("bank_id"));
    }

    Ok((ids, created))
}

/// Writes one run's output. Reviews are appended; each bank's keyword summary
/// is replaced, since summaries are recomputed from scratch every run.
pub async fn load(
    pool: &PgPool,
    run_id: Uuid,
    reviews: &[AnnotatedReview],
    keywords: &[KeywordSummary],
) -> anyhow::Result<LoadSummary> {
    let mut tx = pool.begin().await?;
    let mut summary = LoadSummary::default();

    let banks: BTreeSet<&str> = reviews
        .iter()
        .map(|annotated| annotated.review.group.as_str())
        .chain(keywords.iter().map(|entry| entry.group.as_str()))
        .collect();
    let (bank_ids, created) = upsert_banks(&mut tx, &banks).await?;
    summary.banks_created = created;

    for annotated in reviews {
        let review = &annotated.review;
        let Some(bank_id) = bank_ids.get(&review.group) else {
            tracing::warn!(bank = %review.group, "skipping review, bank not found");
            summary.reviews_skipped += 1;
            continue;
        };

        sqlx::query(
            r#"
            INSERT INTO reviews (
                bank_id, review_text, rating, review_date,
                sentiment_label, sentiment_score, source, themes
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(bank_id)
        .bind(&review.text)
        .bind(review.rating.map(i32::from))
        .bind(review.date)
        .bind(annotated.sentiment_label.as_str())
        .bind(annotated.sentiment_score)
        .bind(&review.source)
        .bind(annotated.themes_joined())
        .execute(&mut *tx)
        .await?;
        summary.reviews_inserted += 1;
    }

    for keyword_summary in keywords {
        let Some(bank_id) = bank_ids.get(&keyword_summary.group) else {
            continue;
        };

        sqlx::query("DELETE FROM bank_keywords WHERE bank_id = $1")
            .bind(bank_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            r#"
            INSERT INTO bank_keywords (bank_id, keywords, run_id)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(bank_id)
        .bind(keyword_summary.keywords_joined())
        .bind(run_id)
        .execute(&mut *tx)
        .await?;
        summary.keyword_rows += 1;
    }

    tx.commit().await?;
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_banks_get_display_names() {
        assert_eq!(app_name("CBE"), "Commercial Bank of Ethiopia Mobile");
        assert_eq!(app_name("Dashen"), "Dashen Bank Mobile");
        assert_eq!(app_name("Awash"), "Awash");
    }
}
