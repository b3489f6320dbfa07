//! Rule-based polarity analysis in the style of VADER.
//!
//! Each token contributes its lexicon valence, adjusted for preceding booster
//! words, negations within a three-token window, ALL-CAPS emphasis and a
//! contrastive "but". The summed valence is pushed through
//! `x / sqrt(x^2 + ALPHA)` to land in `[-1.0, 1.0]`.

use std::collections::HashMap;

const ALPHA: f64 = 15.0;
const BOOST_INCR: f64 = 0.293;
const BOOST_DECR: f64 = -0.293;
const CAPS_INCR: f64 = 0.733;
const NEGATION_SCALAR: f64 = -0.74;
const EXCLAMATION_WEIGHT: f64 = 0.292;
const MAX_EXCLAMATIONS: usize = 4;

/// Anything that turns text into a compound polarity in `[-1.0, 1.0]`.
pub trait PolarityAnalyzer {
    fn compound(&self, text: &str) -> f64;
}

const VALENCES: &[(&str, f64)] = &[
    ("amazing", 2.8),
    ("appreciate", 1.7),
    ("appreciated", 2.3),
    ("awesome", 3.1),
    ("beautiful", 2.9),
    ("best", 3.2),
    ("better", 1.9),
    ("brilliant", 2.8),
    ("clean", 1.7),
    ("clear", 1.6),
    ("comfortable", 1.5),
    ("convenient", 1.6),
    ("cool", 1.3),
    ("easier", 1.8),
    ("easy", 1.9),
    ("effective", 2.1),
    ("efficient", 1.8),
    ("enjoy", 2.2),
    ("enjoyed", 2.3),
    ("excellent", 2.7),
    ("fantastic", 2.6),
    ("favorite", 2.0),
    ("fine", 0.8),
    ("fix", 0.9),
    ("fixed", 1.0),
    ("friendly", 2.2),
    ("fun", 2.3),
    ("glad", 2.0),
    ("good", 1.9),
    ("grateful", 2.0),
    ("great", 3.1),
    ("happy", 2.7),
    ("helped", 1.7),
    ("helpful", 1.8),
    ("helps", 1.6),
    ("impressive", 2.3),
    ("improve", 1.9),
    ("improved", 1.6),
    ("improvement", 1.9),
    ("improving", 1.8),
    ("incredible", 2.6),
    ("joy", 2.8),
    ("like", 2.0),
    ("love", 3.2),
    ("loved", 2.9),
    ("lovely", 2.8),
    ("nice", 1.8),
    ("ok", 0.9),
    ("okay", 0.9),
    ("outstanding", 3.0),
    ("perfect", 2.7),
    ("pleasant", 2.3),
    ("pleased", 1.9),
    ("proud", 2.1),
    ("recommend", 1.5),
    ("recommended", 1.6),
    ("reliable", 1.6),
    ("safe", 1.9),
    ("satisfied", 1.8),
    ("satisfying", 2.0),
    ("secure", 1.4),
    ("simple", 0.8),
    ("smooth", 1.2),
    ("stable", 1.2),
    ("success", 2.7),
    ("successful", 2.8),
    ("successfully", 2.2),
    ("super", 2.9),
    ("superb", 3.1),
    ("thank", 1.5),
    ("thankful", 2.7),
    ("thanks", 1.9),
    ("trust", 2.3),
    ("trusted", 2.1),
    ("useful", 1.9),
    ("wonderful", 2.7),
    ("worth", 0.9),
    ("wow", 2.8),
    ("angry", -2.3),
    ("annoyed", -1.6),
    ("annoying", -1.7),
    ("awful", -2.0),
    ("bad", -2.5),
    ("blocked", -1.0),
    ("boring", -1.3),
    ("broken", -1.6),
    ("bug", -1.1),
    ("bugs", -1.1),
    ("cheated", -2.2),
    ("complain", -1.5),
    ("complaint", -1.2),
    ("confused", -1.3),
    ("confusing", -0.9),
    ("crap", -1.6),
    ("crash", -1.7),
    ("crashed", -1.7),
    ("crashes", -1.7),
    ("crashing", -1.7),
    ("damn", -1.7),
    ("delay", -1.3),
    ("delayed", -0.9),
    ("denied", -1.6),
    ("difficult", -1.5),
    ("disappointed", -1.9),
    ("disappointing", -2.2),
    ("disgusting", -2.4),
    ("dissatisfied", -1.6),
    ("error", -1.7),
    ("errors", -1.4),
    ("fail", -2.5),
    ("failed", -2.3),
    ("fails", -2.0),
    ("failure", -2.3),
    ("fake", -2.1),
    ("fraud", -2.8),
    ("freezes", -1.0),
    ("freezing", -1.0),
    ("frustrated", -2.0),
    ("frustrating", -2.1),
    ("garbage", -2.0),
    ("hate", -2.7),
    ("hopeless", -2.0),
    ("horrible", -2.5),
    ("irritating", -1.8),
    ("laggy", -1.5),
    ("lost", -1.3),
    ("lousy", -2.5),
    ("mess", -1.5),
    ("messed", -1.4),
    ("nonsense", -1.7),
    ("pain", -2.3),
    ("pathetic", -2.2),
    ("poor", -2.1),
    ("problem", -1.7),
    ("problems", -1.7),
    ("regret", -1.8),
    ("ridiculous", -1.5),
    ("rubbish", -1.8),
    ("sad", -2.1),
    ("scam", -2.4),
    ("slow", -1.0),
    ("steal", -2.2),
    ("stolen", -2.2),
    ("stuck", -1.3),
    ("stupid", -2.4),
    ("suck", -1.9),
    ("sucks", -1.5),
    ("terrible", -2.1),
    ("trouble", -1.7),
    ("ugly", -2.3),
    ("unable", -1.8),
    ("unacceptable", -2.0),
    ("unfortunately", -1.4),
    ("unhappy", -1.8),
    ("unreliable", -1.6),
    ("unstable", -1.5),
    ("upset", -1.6),
    ("useless", -1.8),
    ("waste", -1.8),
    ("weak", -1.9),
    ("worried", -1.2),
    ("worse", -2.1),
    ("worst", -3.1),
    ("worthless", -1.9),
    ("wrong", -2.1),
];

const BOOSTERS: &[(&str, f64)] = &[
    ("absolutely", BOOST_INCR),
    ("completely", BOOST_INCR),
    ("extremely", BOOST_INCR),
    ("highly", BOOST_INCR),
    ("incredibly", BOOST_INCR),
    ("really", BOOST_INCR),
    ("so", BOOST_INCR),
    ("super", BOOST_INCR),
    ("too", BOOST_INCR),
    ("totally", BOOST_INCR),
    ("very", BOOST_INCR),
    ("almost", BOOST_DECR),
    ("barely", BOOST_DECR),
    ("hardly", BOOST_DECR),
    ("kinda", BOOST_DECR),
    ("less", BOOST_DECR),
    ("little", BOOST_DECR),
    ("marginally", BOOST_DECR),
    ("slightly", BOOST_DECR),
    ("somewhat", BOOST_DECR),
];

const NEGATIONS: &[&str] = &[
    "aint", "arent", "cannot", "cant", "couldnt", "didnt", "doesnt", "dont", "hasnt",
    "havent", "isnt", "neither", "never", "no", "nobody", "none", "nor", "not", "nothing",
    "nowhere", "shouldnt", "wasnt", "werent", "without", "wont", "wouldnt",
];

#[derive(Debug, Clone)]
pub struct LexiconAnalyzer {
    valences: HashMap<String, f64>,
    boosters: HashMap<String, f64>,
}

impl Default for LexiconAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl LexiconAnalyzer {
    pub fn new() -> Self {
        Self::with_valences(
            VALENCES
                .iter()
                .map(|(word, valence)| (word.to_string(), *valence)),
        )
    }

    pub fn with_valences<I>(valences: I) -> Self
    where
        I: IntoIterator<Item = (String, f64)>,
    {
        Self {
            valences: valences
                .into_iter()
                .map(|(word, valence)| (word.to_lowercase(), valence))
                .collect(),
            boosters: BOOSTERS
                .iter()
                .map(|(word, scalar)| (word.to_string(), *scalar))
                .collect(),
        }
    }

    fn booster_scalar(&self, word: &str, valence: f64, caps_differ: bool) -> f64 {
        let Some(&base) = self.boosters.get(&word.to_lowercase()) else {
            return 0.0;
        };
        let mut scalar = if valence < 0.0 { -base } else { base };
        if caps_differ && is_shouting(word) {
            scalar += if valence > 0.0 { CAPS_INCR } else { -CAPS_INCR };
        }
        scalar
    }

    fn token_valence(&self, tokens: &[String], index: usize, caps_differ: bool) -> f64 {
        let word = &tokens[index];
        let lower = word.to_lowercase();

        if self.boosters.contains_key(&lower) && !self.valences.contains_key(&lower) {
            return 0.0;
        }
        let Some(mut valence) = self.valences.get(&lower).copied() else {
            return 0.0;
        };

        if caps_differ && is_shouting(word) {
            valence += if valence > 0.0 { CAPS_INCR } else { -CAPS_INCR };
        }

        for distance in 1..=3 {
            if index < distance {
                break;
            }
            let previous = &tokens[index - distance];
            if self.valences.contains_key(&previous.to_lowercase()) {
                continue;
            }
            let damping = match distance {
                1 => 1.0,
                2 => 0.95,
                _ => 0.9,
            };
            valence += self.booster_scalar(previous, valence, caps_differ) * damping;
            if is_negation(previous) {
                valence *= NEGATION_SCALAR;
            }
        }

        valence
    }
}

impl PolarityAnalyzer for LexiconAnalyzer {
    fn compound(&self, text: &str) -> f64 {
        let tokens = tokenize(text);
        if tokens.is_empty() {
            return 0.0;
        }
        let caps_differ = caps_differ(&tokens);

        let mut valences: Vec<f64> = (0..tokens.len())
            .map(|index| self.token_valence(&tokens, index, caps_differ))
            .collect();

        if let Some(pivot) = tokens.iter().position(|token| token.eq_ignore_ascii_case("but")) {
            for (index, valence) in valences.iter_mut().enumerate() {
                if index < pivot {
                    *valence *= 0.5;
                } else if index > pivot {
                    *valence *= 1.5;
                }
            }
        }

        let mut sum: f64 = valences.iter().sum();
        if sum == 0.0 {
            return 0.0;
        }

        let emphasis = punctuation_emphasis(text);
        sum += if sum > 0.0 { emphasis } else { -emphasis };

        (sum / (sum * sum + ALPHA).sqrt()).clamp(-1.0, 1.0)
    }
}

/// Splits on whitespace, trims surrounding punctuation and drops one-letter tokens.
fn tokenize(text: &str) -> Vec<String> {
    text.split_whitespace()
        .map(|raw| {
            raw.trim_matches(|c: char| c.is_ascii_punctuation())
                .to_string()
        })
        .filter(|token| token.len() > 1)
        .collect()
}

fn is_shouting(word: &str) -> bool {
    word.chars().any(|c| c.is_ascii_alphabetic())
        && !word.chars().any(|c| c.is_ascii_lowercase())
}

/// True when some tokens, but not all, are written in capitals.
fn caps_differ(tokens: &[String]) -> bool {
    let shouting = tokens.iter().filter(|token| is_shouting(token)).count();
    shouting > 0 && shouting < tokens.len()
}

fn is_negation(word: &str) -> bool {
    let lower = word.to_lowercase();
    if lower.contains("n't") {
        return true;
    }
    let squashed: String = lower.chars().filter(|c| *c != '\'').collect();
    NEGATIONS.contains(&squashed.as_str())
}

fn punctuation_emphasis(text: &str) -> f64 {
    let exclamations = text.matches('!').count().min(MAX_EXCLAMATIONS);
    let questions = text.matches('?').count();
    let question_weight = match questions {
        0 | 1 => 0.0,
        2 | 3 => questions as f64 * 0.18,
        _ => 0.96,
    };
    exclamations as f64 * EXCLAMATION_WEIGHT + question_weight
}

#[cfg(test)]
mod tests {
    use super::*;

    fn score(text: &str) -> f64 {
        LexiconAnalyzer::new().compound(text)
    }

    #[test]
    fn neutral_text_scores_zero() {
        assert_eq!(score("I opened the app on Monday"), 0.0);
        assert_eq!(score(""), 0.0);
    }

    #[test]
    fn polarity_follows_word_valence() {
        assert!(score("Great app, fast and easy") >= 0.05);
        assert!(score("Worst banking app, terrible support") <= -0.05);
    }

    #[test]
    fn negation_flips_sign() {
        assert!(score("The app is good") > 0.0);
        assert!(score("The app is not good") < 0.0);
        assert!(score("The app isn't good") < 0.0);
        assert!(score("This app is not good at all") < 0.0);
    }

    #[test]
    fn boosters_and_emphasis_increase_magnitude() {
        let plain = score("The app is good");
        assert!(score("The app is very good") > plain);
        assert!(score("The app is good!!!") > plain);
        assert!(score("The app is GOOD") > plain);
        assert!(score("The app is slightly good") < plain);
    }

    #[test]
    fn but_shifts_weight_to_the_second_clause() {
        assert!(score("The design is nice but transfers are terrible") < 0.0);
        assert!(score("Login was bad but support is great") > 0.0);
    }

    #[test]
    fn common_review_words_carry_polarity() {
        assert!(score("The app is laggy and unreliable") <= -0.05);
        assert!(score("Blocked my account, unacceptable") <= -0.05);
        assert!(score("Superb service, very friendly staff") >= 0.05);
        assert!(score("Transaction completed successfully, thank you") >= 0.05);
        assert!(score("Money stolen, this is a fraud") <= -0.05);
    }

    #[test]
    fn compound_stays_in_range() {
        let text = "BEST BEST BEST amazing awesome love perfect great!!!!!!!! wonderful";
        let value = score(text);
        assert!(value <= 1.0 && value > 0.9);

        let text = "worst worst terrible awful horrible scam useless hate!!!";
        let value = score(text);
        assert!(value >= -1.0 && value < -0.9);
    }

    #[test]
    fn custom_valences_are_used() {
        let analyzer = LexiconAnalyzer::with_valences([("Birr".to_string(), 2.0)]);
        assert!(analyzer.compound("paid in birr") > 0.0);
        assert_eq!(analyzer.compound("great"), 0.0);
        assert!(analyzer.compound("BIRR") > 0.0);
    }
}
