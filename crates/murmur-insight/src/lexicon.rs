//! Embedded valence lexicon and modifier word lists for sentiment scoring.
//!
//! Valences use a [-4, 4] scale. Words not listed are neutral.

use std::collections::HashMap;
use std::sync::LazyLock;

static VALENCE: LazyLock<HashMap<&'static str, f64>> =
    LazyLock::new(|| WORDS.iter().copied().collect());

static BOOSTERS: LazyLock<HashMap<&'static str, f64>> = LazyLock::new(|| {
    INCREMENTS
        .iter()
        .map(|w| (*w, B_INCR))
        .chain(DECREMENTS.iter().map(|w| (*w, B_DECR)))
        .collect()
});

/// Intensity added by a booster word.
pub const B_INCR: f64 = 0.293;
/// Intensity removed by a dampener word.
pub const B_DECR: f64 = -0.293;

/// Valence of `word` (lowercase), if it carries sentiment.
pub fn valence(word: &str) -> Option<f64> {
    VALENCE.get(word).copied()
}

/// Intensity scalar of a booster or dampener.
pub fn booster(word: &str) -> Option<f64> {
    BOOSTERS.get(word).copied()
}

pub fn is_negation(word: &str) -> bool {
    NEGATIONS.contains(&word) || word.ends_with("n't")
}

const NEGATIONS: &[&str] = &[
    "aint", "arent", "cannot", "cant", "couldnt", "darent", "didnt", "doesnt", "dont", "hadnt",
    "hasnt", "havent", "isnt", "mightnt", "mustnt", "neither", "never", "no", "nobody", "none",
    "nope", "nor", "not", "nothing", "nowhere", "shant", "shouldnt", "wasnt", "werent",
    "without", "wont", "wouldnt",
];

const INCREMENTS: &[&str] = &[
    "absolutely", "amazingly", "awfully", "completely", "considerably", "decidedly", "deeply",
    "enormously", "entirely", "especially", "exceptionally", "extremely", "fully", "greatly",
    "highly", "hugely", "incredibly", "intensely", "majorly", "more", "most", "particularly",
    "purely", "quite", "really", "remarkably", "so", "substantially", "super", "thoroughly",
    "too", "totally", "tremendously", "truly", "unbelievably", "unusually", "utterly", "very",
];

const DECREMENTS: &[&str] = &[
    "almost", "barely", "hardly", "less", "little", "marginally", "occasionally", "partly",
    "scarcely", "slightly", "somewhat",
];

const WORDS: &[(&str, f64)] = &[
    // positive
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
    ("comfortable", 1.7),
    ("convenient", 1.5),
    ("cool", 1.3),
    ("delighted", 2.8),
    ("easy", 1.9),
    ("effective", 2.1),
    ("efficient", 1.8),
    ("enjoy", 2.2),
    ("enjoyed", 2.3),
    ("excellent", 2.7),
    ("excited", 1.4),
    ("fair", 1.3),
    ("fantastic", 2.6),
    ("favorite", 2.0),
    ("fine", 0.8),
    ("fixed", 1.1),
    ("friendly", 2.2),
    ("fun", 2.3),
    ("glad", 2.0),
    ("good", 1.9),
    ("great", 3.1),
    ("happy", 2.7),
    ("helpful", 1.9),
    ("impressed", 2.1),
    ("improved", 1.8),
    ("improvement", 1.6),
    ("intuitive", 1.4),
    ("love", 3.2),
    ("loved", 2.9),
    ("lovely", 2.8),
    ("loves", 2.7),
    ("nice", 1.8),
    ("perfect", 2.7),
    ("pleasant", 2.3),
    ("pleased", 1.9),
    ("polite", 1.9),
    ("quick", 1.0),
    ("recommend", 1.5),
    ("reliable", 1.8),
    ("resolved", 1.4),
    ("satisfied", 1.8),
    ("seamless", 1.7),
    ("simple", 0.9),
    ("smooth", 1.2),
    ("solid", 1.1),
    ("success", 2.7),
    ("successful", 2.8),
    ("superb", 3.1),
    ("thank", 1.5),
    ("thanks", 1.9),
    ("useful", 1.9),
    ("valuable", 2.1),
    ("win", 2.8),
    ("wonderful", 2.7),
    ("worth", 0.9),
    // negative
    ("angry", -2.3),
    ("annoyed", -1.6),
    ("annoying", -1.7),
    ("awful", -2.0),
    ("bad", -2.5),
    ("broke", -1.5),
    ("broken", -1.8),
    ("bug", -1.0),
    ("buggy", -1.5),
    ("bugs", -1.0),
    ("cancelled", -1.0),
    ("cheated", -2.3),
    ("clunky", -1.3),
    ("complain", -1.5),
    ("complaint", -1.5),
    ("confused", -1.3),
    ("confusing", -1.3),
    ("crash", -1.7),
    ("crashed", -1.7),
    ("crashes", -1.7),
    ("delay", -1.3),
    ("delayed", -1.3),
    ("delays", -1.3),
    ("difficult", -1.5),
    ("disappointed", -1.9),
    ("disappointing", -2.2),
    ("dislike", -1.6),
    ("error", -1.4),
    ("errors", -1.4),
    ("expensive", -0.9),
    ("fail", -2.3),
    ("failed", -2.3),
    ("fails", -2.3),
    ("failure", -2.3),
    ("fraud", -2.8),
    ("frozen", -1.0),
    ("frustrated", -2.0),
    ("frustrating", -1.9),
    ("glitch", -1.2),
    ("glitchy", -1.4),
    ("hard", -0.4),
    ("hate", -2.7),
    ("hated", -3.2),
    ("horrible", -2.5),
    ("ignored", -1.5),
    ("issue", -0.7),
    ("issues", -0.7),
    ("lag", -1.0),
    ("laggy", -1.4),
    ("lost", -1.3),
    ("mess", -1.5),
    ("missing", -1.2),
    ("outage", -1.6),
    ("overpriced", -1.8),
    ("pain", -2.3),
    ("painful", -1.9),
    ("poor", -2.1),
    ("problem", -1.7),
    ("problems", -1.7),
    ("ridiculous", -1.8),
    ("rude", -2.0),
    ("sad", -2.1),
    ("scam", -2.6),
    ("slow", -1.0),
    ("steal", -2.2),
    ("stealing", -2.7),
    ("stolen", -2.2),
    ("stuck", -1.3),
    ("sucks", -1.5),
    ("terrible", -2.1),
    ("unacceptable", -2.0),
    ("unfair", -2.1),
    ("unhappy", -1.8),
    ("unreliable", -1.8),
    ("unresponsive", -1.5),
    ("upset", -1.6),
    ("useless", -1.8),
    ("waste", -1.8),
    ("wasted", -2.2),
    ("withheld", -1.4),
    ("withhold", -1.4),
    ("withholding", -1.6),
    ("worried", -1.2),
    ("worse", -2.1),
    ("worst", -3.1),
    ("wrong", -2.1),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_valences() {
        assert_eq!(valence("great"), Some(3.1));
        assert!(valence("withholding").unwrap() < 0.0);
        assert_eq!(valence("money"), None);
    }

    #[test]
    fn test_boosters_and_dampeners() {
        assert_eq!(booster("very"), Some(B_INCR));
        assert_eq!(booster("slightly"), Some(B_DECR));
        assert_eq!(booster("refund"), None);
    }

    #[test]
    fn test_negations() {
        assert!(is_negation("not"));
        assert!(is_negation("don't"));
        assert!(is_negation("never"));
        assert!(!is_negation("now"));
    }

    #[test]
    fn test_no_duplicate_entries() {
        assert_eq!(VALENCE.len(), WORDS.len());
    }
}
