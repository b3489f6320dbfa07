use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use unicode_normalization::UnicodeNormalization;

use crate::models::{RawReview, Review};

/// Reviews at or below this many characters carry no usable signal ("Good", "Ok").
pub const MIN_TEXT_LEN: usize = 5;

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
];

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum DropReason {
    MissingText,
    EmptyText,
    TooShort(usize),
    UnparsableDate(String),
}

impl DropReason {
    pub fn kind(&self) -> &'static str {
        match self {
            DropReason::MissingText => "missing text",
            DropReason::EmptyText => "empty after cleaning",
            DropReason::TooShort(_) => "too short",
            DropReason::UnparsableDate(_) => "unparsable date",
        }
    }
}

impl fmt::Display for DropReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DropReason::TooShort(len) => write!(f, "too short ({len} chars)"),
            DropReason::UnparsableDate(raw) => write!(f, "unparsable date {raw:?}"),
            other => f.write_str(other.kind()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Normalized {
    Kept(Review),
    Dropped(DropReason),
}

/// Decomposes, strips everything outside 7-bit ASCII and collapses whitespace.
pub fn clean_text(raw: &str) -> String {
    let ascii: String = raw.nfkd().filter(char::is_ascii).collect();
    ascii.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(raw, format) {
            return Some(date);
        }
    }

    for format in DATETIME_FORMATS {
        if let Ok(datetime) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(datetime.date());
        }
    }

    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|datetime| datetime.date_naive())
}

/// Accepts "4" as well as "4.0"; anything outside 1..=5 counts as unknown.
pub fn parse_rating(raw: Option<&str>) -> Option<u8> {
    let value: f64 = raw?.trim().parse().ok()?;
    if value.fract() != 0.0 || !(1.0..=5.0).contains(&value) {
        return None;
    }
    Some(value as u8)
}

pub fn normalize_review(raw: &RawReview) -> Normalized {
    let Some(text) = raw.review.as_deref() else {
        return Normalized::Dropped(DropReason::MissingText);
    };

    let text = clean_text(text);
    if text.is_empty() {
        return Normalized::Dropped(DropReason::EmptyText);
    }
    if text.len() <= MIN_TEXT_LEN {
        return Normalized::Dropped(DropReason::TooShort(text.len()));
    }

    let Some(date) = parse_date(&raw.date) else {
        return Normalized::Dropped(DropReason::UnparsableDate(raw.date.clone()));
    };

    Normalized::Kept(Review {
        text,
        rating: parse_rating(raw.rating.as_deref()),
        date,
        group: raw.bank.trim().to_string(),
        source: raw.source.trim().to_string(),
    })
}

/// Normalizes a batch. Survivors come back sorted by `(group, date)`; every
/// dropped row is returned alongside its reason.
pub fn normalize_batch(raws: &[RawReview]) -> (Vec<Review>, Vec<DropReason>) {
    let mut kept = Vec::with_capacity(raws.len());
    let mut dropped = Vec::new();

    for raw in raws {
        match normalize_review(raw) {
            Normalized::Kept(review) => kept.push(review),
            Normalized::Dropped(reason) => {
                tracing::debug!(group = %raw.bank, %reason, "dropping review");
                dropped.push(reason);
            }
        }
    }

    kept.sort_by(|a, b| a.group.cmp(&b.group).then(a.date.cmp(&b.date)));
    (kept, dropped)
}
