use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const OTHER_THEME: &str = "Other";

#[derive(Debug, Error)]
pub enum TaxonomyError {
    #[error("failed to read taxonomy file {path}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("taxonomy is not valid JSON")]
    Json(#[from] serde_json::Error),
    #[error("taxonomy defines no themes")]
    Empty,
    #[error("theme #{0} has a blank name")]
    BlankName(usize),
    #[error("theme {0:?} is defined more than once")]
    DuplicateTheme(String),
    #[error("\"Other\" is reserved for reviews that match no theme")]
    ReservedName,
    #[error("theme {0:?} has no trigger keywords")]
    NoKeywords(String),
    #[error("theme {0:?} has a blank trigger keyword")]
    BlankKeyword(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Theme {
    pub name: String,
    pub keywords: Vec<String>,
}

/// Ordered theme table. Declaration order is the order themes are reported in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Taxonomy {
    themes: Vec<Theme>,
}

impl Taxonomy {
    pub fn new(themes: Vec<Theme>) -> Result<Self, TaxonomyError> {
        if themes.is_empty() {
            return Err(TaxonomyError::Empty);
        }

        let mut seen = HashSet::new();
        let mut validated = Vec::with_capacity(themes.len());

        for (position, theme) in themes.into_iter().enumerate() {
            let name = theme.name.trim().to_string();
            if name.is_empty() {
                return Err(TaxonomyError::BlankName(position + 1));
            }
            if name.eq_ignore_ascii_case(OTHER_THEME) {
                return Err(TaxonomyError::ReservedName);
            }
            if !seen.insert(name.clone()) {
                return Err(TaxonomyError::DuplicateTheme(name));
            }
            if theme.keywords.is_empty() {
                return Err(TaxonomyError::NoKeywords(name));
            }

            let mut keywords = Vec::with_capacity(theme.keywords.len());
            for keyword in theme.keywords {
                if keyword.trim().is_empty() {
                    return Err(TaxonomyError::BlankKeyword(name));
                }
                keywords.push(keyword.to_lowercase());
            }

            validated.push(Theme { name, keywords });
        }

        Ok(Self { themes: validated })
    }

    pub fn from_json(raw: &str) -> Result<Self, TaxonomyError> {
        let themes: Vec<Theme> = serde_json::from_str(raw)?;
        Self::new(themes)
    }

    pub fn from_path(path: &Path) -> Result<Self, TaxonomyError> {
        let raw = std::fs::read_to_string(path).map_err(|source| TaxonomyError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&raw)
    }

    pub fn themes(&self) -> &[Theme] {
        &self.themes
    }

    pub fn theme_names(&self) -> impl Iterator<Item = &str> {
        self.themes().iter().map(|theme| theme.name.as_str())
    }
}

impl Default for Taxonomy {
    fn default() -> Self {
        let theme = |name: &str, keywords: &[&str]| Theme {
            name: name.to_string(),
            keywords: keywords.iter().map(|keyword| keyword.to_string()).collect(),
        };

        Self {
            themes: vec![
                theme(
                    "Login & Access Issues",
                    &[
                        "login", "log in", "sign in", "otp", "verification", "verify",
                        "password", "pin", "account locked",
                    ],
                ),
                theme(
                    "Performance & Speed",
                    &[
                        "slow", "loading", "load", "lag", "delay", "takes time",
                        "not responding", "hang", "freeze", "fast",
                    ],
                ),
                theme(
                    "Transactions & Payments",
                    &[
                        "transfer", "transaction", "payment", "send money", "deposit",
                        "withdraw", "airtime", "bill", "failed", "declined",
                    ],
                ),
                theme(
                    "Stability & Bugs",
                    &[
                        "crash", "force close", "bug", "error", "not working", "stopped",
                        "doesn work", "doesn't work", "fail", "issue",
                    ],
                ),
                theme(
                    "UI & Ease of Use",
                    &[
                        "ui", "interface", "user friendly", "easy to use", "design", "layout",
                        "navigation",
                    ],
                ),
                theme(
                    "Features & Updates",
                    &[
                        "fingerprint", "face id", "feature", "update", "new version",
                        "notification", "alert", "dark mode",
                    ],
                ),
            ],
        }
    }
}

/// Tags a review with every theme whose triggers appear in it. Matching is
/// plain substring containment on the lower-cased text, so "pin" also fires
/// inside "shopping".
pub fn detect_themes(taxonomy: &Taxonomy, text: Option<&str>) -> Vec<String> {
    let Some(text) = text else {
        return vec![OTHER_THEME.to_string()];
    };
    let text = text.to_lowercase();

    let found: Vec<String> = taxonomy
        .themes
        .iter()
        .filter(|theme| theme.keywords.iter().any(|keyword| text.contains(keyword.as_str())))
        .map(|theme| theme.name.clone())
        .collect();

    if found.is_empty() {
        vec![OTHER_THEME.to_string()]
    } else {
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crash_after_login_hits_two_themes() {
        let themes = detect_themes(&Taxonomy::default(), Some("App keeps crashing after login"));
        assert_eq!(themes, vec!["Login & Access Issues", "Stability & Bugs"]);
    }

    #[test]
    fn fast_triggers_performance() {
        let themes = detect_themes(&Taxonomy::default(), Some("Great app, fast and easy"));
        assert_eq!(themes, vec!["Performance & Speed"]);
    }

    #[test]
    fn themes_follow_declaration_order_not_match_position() {
        let themes = detect_themes(
            &Taxonomy::default(),
            Some("New UPDATE broke the transfer screen, cannot LOGIN"),
        );
        assert_eq!(
            themes,
            vec!["Login & Access Issues", "Transactions & Payments", "Features & Updates"]
        );
    }

    #[test]
    fn unmatched_and_missing_text_fall_back_to_other() {
        let taxonomy = Taxonomy::default();
        assert_eq!(detect_themes(&taxonomy, Some("Thanks a lot")), vec![OTHER_THEME]);
        assert_eq!(detect_themes(&taxonomy, None), vec![OTHER_THEME]);
    }

    #[test]
    fn substring_matches_inside_longer_words() {
        let themes = detect_themes(&Taxonomy::default(), Some("Shopping with this works"));
        assert_eq!(themes, vec!["Login & Access Issues"]);
    }

    #[test]
    fn custom_taxonomy_from_json() {
        let taxonomy = Taxonomy::from_json(
            r#"[
                {"name": "Fees", "keywords": ["Charge", "fee"]},
                {"name": "Support", "keywords": ["call center", "agent"]}
            ]"#,
        )
        .unwrap();

        assert_eq!(taxonomy.theme_names().collect::<Vec<_>>(), vec!["Fees", "Support"]);
        assert_eq!(
            detect_themes(&taxonomy, Some("The agent could not explain the CHARGE")),
            vec!["Fees", "Support"]
        );
        assert_eq!(detect_themes(&taxonomy, Some("App crashes")), vec![OTHER_THEME]);
    }

    #[test]
    fn rejects_malformed_taxonomies() {
        let theme = |name: &str, keywords: &[&str]| Theme {
            name: name.to_string(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
        };

        assert!(matches!(Taxonomy::new(vec![]), Err(TaxonomyError::Empty)));
        assert!(matches!(
            Taxonomy::new(vec![theme("  ", &["x"])]),
            Err(TaxonomyError::BlankName(1))
        ));
        assert!(matches!(
            Taxonomy::new(vec![theme("Fees", &["fee"]), theme("Fees", &["charge"])]),
            Err(TaxonomyError::DuplicateTheme(_))
        ));
        assert!(matches!(
            Taxonomy::new(vec![theme("other", &["x"])]),
            Err(TaxonomyError::ReservedName)
        ));
        assert!(matches!(
            Taxonomy::new(vec![theme("Fees", &[])]),
            Err(TaxonomyError::NoKeywords(_))
        ));
        assert!(matches!(
            Taxonomy::new(vec![theme("Fees", &["fee", " "])]),
            Err(TaxonomyError::BlankKeyword(_))
        ));
        assert!(matches!(
            Taxonomy::from_json("{not json"),
            Err(TaxonomyError::Json(_))
        ));
    }

    #[test]
    fn default_taxonomy_round_trips_through_json() {
        let json = serde_json::to_string(&Taxonomy::default()).unwrap();
        assert_eq!(Taxonomy::from_json(&json).unwrap(), Taxonomy::default());
    }
}
