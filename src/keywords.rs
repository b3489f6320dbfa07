//! Per-group keyword extraction.
//!
//! A TF-IDF model over unigrams and bigrams is fitted once on the whole
//! corpus. Each group's keywords are the terms with the largest summed weight
//! over that group's documents, so a term only ranks highly when it is common
//! in the group but not everywhere.

use std::collections::{BTreeMap, HashMap, HashSet};

use regex::Regex;
use stop_words::{get, LANGUAGE};
use thiserror::Error;

use crate::models::{KeywordSummary, Review};

/// Runs of two or more word characters.
const TOKEN_PATTERN: &str = r"\b\w\w+\b";

#[derive(Debug, Error)]
pub enum KeywordConfigError {
    #[error("top_n must be at least 1")]
    TopN,
    #[error("max_df must be within (0, 1], got {0}")]
    MaxDf(f64),
    #[error("min_df must be at least 1")]
    MinDf,
    #[error("ngram range ({0}, {1}) is invalid")]
    NgramRange(usize, usize),
    #[error("token pattern failed to compile")]
    TokenPattern(#[from] regex::Error),
}

#[derive(Debug, Clone, PartialEq)]
pub struct KeywordConfig {
    pub top_n: usize,
    /// Terms in more than this share of all documents are too generic.
    pub max_df: f64,
    /// Terms in fewer than this many documents are too rare.
    pub min_df: usize,
    pub ngram_range: (usize, usize),
}

impl Default for KeywordConfig {
    fn default() -> Self {
        Self {
            top_n: 20,
            max_df: 0.8,
            min_df: 2,
            ngram_range: (1, 2),
        }
    }
}

impl KeywordConfig {
    pub fn validate(&self) -> Result<(), KeywordConfigError> {
        if self.top_n == 0 {
            return Err(KeywordConfigError::TopN);
        }
        if !(self.max_df > 0.0 && self.max_df <= 1.0) {
            return Err(KeywordConfigError::MaxDf(self.max_df));
        }
        if self.min_df == 0 {
            return Err(KeywordConfigError::MinDf);
        }
        let (low, high) = self.ngram_range;
        if low == 0 || low > high {
            return Err(KeywordConfigError::NgramRange(low, high));
        }
        Ok(())
    }
}

pub fn english_stop_words() -> HashSet<String> {
    get(LANGUAGE::English)
        .iter()
        .map(|word| word.to_string())
        .collect()
}

/// Fitted vocabulary with smoothed idf weights. Immutable once built.
#[derive(Debug, Clone)]
pub struct TfIdfModel {
    vocabulary: HashMap<String, usize>,
    terms: Vec<String>,
    idf: Vec<f64>,
    document_frequency: Vec<usize>,
    n_documents: usize,
}

impl TfIdfModel {
    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    pub fn n_documents(&self) -> usize {
        self.n_documents
    }

    pub fn idf(&self, term: &str) -> Option<f64> {
        self.vocabulary.get(term).map(|&index| self.idf[index])
    }

    pub fn document_frequency(&self, term: &str) -> Option<usize> {
        self.vocabulary
            .get(term)
            .map(|&index| self.document_frequency[index])
    }

    /// Sparse, L2-normalized tf-idf row for an already analyzed document.
    pub fn transform(&self, analyzed: &[String]) -> Vec<(usize, f64)> {
        let mut counts: BTreeMap<usize, f64> = BTreeMap::new();
        for term in analyzed {
            if let Some(&index) = self.vocabulary.get(term) {
                *counts.entry(index).or_insert(0.0) += 1.0;
            }
        }

        let mut row: Vec<(usize, f64)> = counts
            .into_iter()
            .map(|(index, tf)| (index, tf * self.idf[index]))
            .collect();

        let norm = row.iter().map(|(_, weight)| weight * weight).sum::<f64>().sqrt();
        if norm > 0.0 {
            for (_, weight) in row.iter_mut() {
                *weight /= norm;
            }
        }
        row
    }
}

#[derive(Debug, Clone)]
pub struct KeywordExtractor {
    config: KeywordConfig,
    stop_words: HashSet<String>,
    token_pattern: Regex,
}

impl KeywordExtractor {
    /// Extractor with the English stop-word list.
    pub fn new(config: KeywordConfig) -> Result<Self, KeywordConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            stop_words: english_stop_words(),
            token_pattern: Regex::new(TOKEN_PATTERN)?,
        })
    }

    pub fn with_stop_words<I, S>(mut self, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.stop_words = words
            .into_iter()
            .map(|word| word.into().to_lowercase())
            .collect();
        self
    }

    /// Lower-cases, tokenizes, drops stop words and emits the configured n-grams,
    /// shortest first.
    pub fn analyze(&self, text: &str) -> Vec<String> {
        let lower = text.to_lowercase();
        let tokens: Vec<&str> = self
            .token_pattern
            .find_iter(&lower)
            .map(|found| found.as_str())
            .filter(|token| !self.stop_words.contains(*token))
            .collect();

        let (low, high) = self.config.ngram_range;
        let mut grams = Vec::new();
        for n in low..=high {
            if n > tokens.len() {
                break;
            }
            grams.extend(tokens.windows(n).map(|window| window.join(" ")));
        }
        grams
    }

    pub fn fit(&self, analyzed: &[Vec<String>]) -> TfIdfModel {
        let n_documents = analyzed.len();

        let mut doc_freq: HashMap<&str, usize> = HashMap::new();
        for document in analyzed {
            let unique: HashSet<&str> = document.iter().map(String::as_str).collect();
            for term in unique {
                *doc_freq.entry(term).or_insert(0) += 1;
            }
        }

        let max_count = self.config.max_df * n_documents as f64;
        let mut kept: Vec<(&str, usize)> = doc_freq
            .into_iter()
            .filter(|(_, count)| *count >= self.config.min_df && (*count as f64) <= max_count)
            .collect();
        kept.sort_by(|a, b| a.0.cmp(b.0));

        let n_smooth = n_documents as f64 + 1.0;
        let mut vocabulary = HashMap::with_capacity(kept.len());
        let mut terms = Vec::with_capacity(kept.len());
        let mut idf = Vec::with_capacity(kept.len());
        let mut document_frequency = Vec::with_capacity(kept.len());

        for (index, (term, count)) in kept.into_iter().enumerate() {
            vocabulary.insert(term.to_string(), index);
            terms.push(term.to_string());
            idf.push((n_smooth / (count as f64 + 1.0)).ln() + 1.0);
            document_frequency.push(count);
        }

        TfIdfModel {
            vocabulary,
            terms,
            idf,
            document_frequency,
            n_documents,
        }
    }

    /// Fits over every review, then ranks terms within each group.
    pub fn extract(&self, reviews: &[Review]) -> Vec<KeywordSummary> {
        let analyzed: Vec<Vec<String>> = reviews
            .iter()
            .map(|review| self.analyze(&review.text))
            .collect();
        let model = self.fit(&analyzed);

        tracing::debug!(
            documents = model.n_documents(),
            terms = model.terms().len(),
            "fitted keyword model"
        );
        if model.terms().is_empty() && !reviews.is_empty() {
            tracing::warn!(
                documents = reviews.len(),
                "no keyword survived document-frequency pruning"
            );
        }

        let mut by_group: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
        for (review, document) in reviews.iter().zip(&analyzed) {
            let totals = by_group
                .entry(review.group.as_str())
                .or_insert_with(|| vec![0.0; model.terms().len()]);
            for (index, weight) in model.transform(document) {
                totals[index] += weight;
            }
        }

        by_group
            .into_iter()
            .map(|(group, totals)| {
                let keywords = self.rank(&model, &totals);
                if let Some(top) = keywords.first() {
                    tracing::debug!(
                        group,
                        keyword = %top,
                        df = ?model.document_frequency(top),
                        idf = ?model.idf(top),
                        "top keyword"
                    );
                }
                KeywordSummary {
                    group: group.to_string(),
                    keywords,
                }
            })
            .collect()
    }

    fn rank(&self, model: &TfIdfModel, totals: &[f64]) -> Vec<String> {
        let mut ranked: Vec<(usize, f64)> = totals
            .iter()
            .copied()
            .enumerate()
            .filter(|(_, score)| *score > 0.0)
            .collect();
        ranked.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.0.cmp(&b.0))
        });

        ranked
            .into_iter()
            .take(self.config.top_n)
            .map(|(index, _)| model.terms()[index].clone())
            .collect()
    }
}
