//! In-process TF-IDF vectorizer.
//!
//! Tokens are lowercase runs of two or more word characters. The vocabulary
//! is fitted on the batch being transformed, ordered alphabetically, and
//! optionally capped to the most frequent terms. Rows are L2-normalized.
//! Output depends only on the ordered input, so repeated runs are identical.

use std::collections::{BTreeMap, HashSet};
use std::sync::LazyLock;

use regex::Regex;

use murmur_core::config::TfidfConfig;

use crate::similarity::l2_normalize;

static TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\w\w+\b").expect("Invalid token regex"));

static ENGLISH_STOP_WORDS: LazyLock<HashSet<&'static str>> =
    LazyLock::new(|| STOP_WORDS.iter().copied().collect());

const STOP_WORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "against", "all", "almost", "alone", "along",
    "already", "also", "although", "always", "am", "among", "an", "and", "another", "any",
    "anyhow", "anyone", "anything", "anyway", "anywhere", "are", "around", "as", "at", "back",
    "be", "became", "because", "become", "becomes", "been", "before", "behind", "being",
    "below", "beside", "besides", "between", "beyond", "both", "but", "by", "can", "cannot",
    "could", "did", "do", "does", "doing", "done", "down", "during", "each", "either", "else",
    "elsewhere", "enough", "etc", "even", "ever", "every", "everyone", "everything",
    "everywhere", "few", "for", "from", "further", "get", "give", "go", "had", "has", "have",
    "having", "he", "hence", "her", "here", "hers", "herself", "him", "himself", "his", "how",
    "however", "i", "ie", "if", "in", "indeed", "into", "is", "it", "its", "itself", "just",
    "keep", "last", "least", "less", "made", "many", "may", "me", "meanwhile", "might", "mine",
    "more", "moreover", "most", "mostly", "much", "must", "my", "myself", "neither", "never",
    "nevertheless", "next", "no", "nobody", "none", "nor", "not", "nothing", "now", "nowhere",
    "of", "off", "often", "on", "once", "one", "only", "onto", "or", "other", "others",
    "otherwise", "our", "ours", "ourselves", "out", "over", "own", "per", "perhaps", "please",
    "put", "rather", "re", "same", "see", "seem", "seemed", "seeming", "seems", "several",
    "she", "should", "since", "so", "some", "somehow", "someone", "something", "sometime",
    "sometimes", "somewhere", "still", "such", "than", "that", "the", "their", "theirs",
    "them", "themselves", "then", "there", "thereafter", "thereby", "therefore", "these",
    "they", "this", "those", "though", "through", "throughout", "thus", "to", "together",
    "too", "toward", "towards", "under", "until", "up", "upon", "us", "very", "via", "was",
    "we", "well", "were", "what", "whatever", "when", "whence", "whenever", "where",
    "whereas", "whether", "which", "while", "who", "whoever", "whole", "whom", "whose", "why",
    "will", "with", "within", "without", "would", "yet", "you", "your", "yours", "yourself",
    "yourselves",
];

/// Returns true for common English function words.
pub fn is_stop_word(term: &str) -> bool {
    ENGLISH_STOP_WORDS.contains(term)
}

/// Vectorizer settings.
#[derive(Debug, Clone, PartialEq)]
pub struct TfidfOptions {
    pub max_features: Option<usize>,
    pub ngram_range: (usize, usize),
    pub use_idf: bool,
    pub sublinear_tf: bool,
    pub remove_stop_words: bool,
}

impl Default for TfidfOptions {
    fn default() -> Self {
        Self {
            max_features: None,
            ngram_range: (1, 1),
            use_idf: true,
            sublinear_tf: false,
            remove_stop_words: false,
        }
    }
}

impl TfidfOptions {
    /// Options used for term salience: English stop words removed,
    /// unigrams and bigrams.
    pub fn salience() -> Self {
        Self {
            ngram_range: (1, 2),
            remove_stop_words: true,
            ..Self::default()
        }
    }
}

impl From<&TfidfConfig> for TfidfOptions {
    fn from(config: &TfidfConfig) -> Self {
        Self {
            max_features: config.max_features,
            ngram_range: (config.ngram_min, config.ngram_max),
            use_idf: config.use_idf,
            sublinear_tf: config.sublinear_tf,
            remove_stop_words: false,
        }
    }
}

/// Fitted vocabulary plus one dense row per document.
#[derive(Debug, Clone, PartialEq)]
pub struct TfidfMatrix {
    pub vocabulary: Vec<String>,
    pub rows: Vec<Vec<f32>>,
}

impl TfidfMatrix {
    /// Terms ranked by mean weight across rows, descending. Ties break
    /// alphabetically. Zero-weight terms are skipped.
    pub fn top_terms(&self, k: usize) -> Vec<String> {
        if self.rows.is_empty() {
            return Vec::new();
        }
        let n = self.rows.len() as f64;
        let mut scored: Vec<(&str, f64)> = self
            .vocabulary
            .iter()
            .enumerate()
            .map(|(j, term)| {
                let sum: f64 = self.rows.iter().map(|row| row[j] as f64).sum();
                (term.as_str(), sum / n)
            })
            .filter(|(_, w)| *w > 0.0)
            .collect();
        scored.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        scored
            .into_iter()
            .take(k)
            .map(|(t, _)| t.to_string())
            .collect()
    }
}

/// TF-IDF vectorizer fitted fresh on every batch.
#[derive(Debug, Clone, Default)]
pub struct TfidfVectorizer {
    options: TfidfOptions,
}

impl TfidfVectorizer {
    pub fn new(options: TfidfOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &TfidfOptions {
        &self.options
    }

    /// Split a document into its n-gram terms.
    pub fn analyze(&self, doc: &str) -> Vec<String> {
        let lowered = doc.to_lowercase();
        let tokens: Vec<&str> = TOKEN_RE
            .find_iter(&lowered)
            .map(|m| m.as_str())
            .filter(|t| !(self.options.remove_stop_words && is_stop_word(t)))
            .collect();

        let (min_n, max_n) = self.options.ngram_range;
        let mut terms = Vec::new();
        for n in min_n.max(1)..=max_n {
            if n > tokens.len() {
                break;
            }
            for window in tokens.windows(n) {
                terms.push(window.join(" "));
            }
        }
        terms
    }

    /// Fit the vocabulary on `docs` and return their weighted rows.
    ///
    /// An empty vocabulary yields zero-width rows.
    pub fn fit_transform(&self, docs: &[String]) -> TfidfMatrix {
        let analyzed: Vec<Vec<String>> = docs.iter().map(|d| self.analyze(d)).collect();

        // term -> (corpus count, document frequency)
        let mut stats: BTreeMap<&str, (usize, usize)> = BTreeMap::new();
        for terms in &analyzed {
            let mut seen: HashSet<&str> = HashSet::new();
            for term in terms {
                let entry = stats.entry(term.as_str()).or_insert((0, 0));
                entry.0 += 1;
                if seen.insert(term.as_str()) {
                    entry.1 += 1;
                }
            }
        }

        let mut kept: Vec<(&str, (usize, usize))> = stats.into_iter().collect();
        if let Some(limit) = self.options.max_features {
            if kept.len() > limit {
                kept.sort_by(|a, b| b.1 .0.cmp(&a.1 .0).then_with(|| a.0.cmp(b.0)));
                kept.truncate(limit);
                kept.sort_by(|a, b| a.0.cmp(b.0));
            }
        }

        let index: BTreeMap<&str, usize> =
            kept.iter().enumerate().map(|(i, (t, _))| (*t, i)).collect();

        let n_docs = docs.len() as f64;
        let idf: Vec<f64> = kept
            .iter()
            .map(|(_, (_, df))| {
                if self.options.use_idf {
                    ((1.0 + n_docs) / (1.0 + *df as f64)).ln() + 1.0
                } else {
                    1.0
                }
            })
            .collect();

        let rows = analyzed
            .iter()
            .map(|terms| {
                let mut counts = vec![0usize; kept.len()];
                for term in terms {
                    if let Some(&j) = index.get(term.as_str()) {
                        counts[j] += 1;
                    }
                }
                let mut row: Vec<f32> = counts
                    .iter()
                    .zip(idf.iter())
                    .map(|(&c, &w)| {
                        if c == 0 {
                            return 0.0;
                        }
                        let tf = if self.options.sublinear_tf {
                            1.0 + (c as f64).ln()
                        } else {
                            c as f64
                        };
                        (tf * w) as f32
                    })
                    .collect();
                l2_normalize(&mut row);
                row
            })
            .collect();

        TfidfMatrix {
            vocabulary: kept.into_iter().map(|(t, _)| t.to_string()).collect(),
            rows,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::similarity::cosine_similarity;

    fn docs(texts: &[&str]) -> Vec<String> {
        texts.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_analyze_drops_single_char_tokens() {
        let v = TfidfVectorizer::default();
        assert_eq!(v.analyze("I want my Money"), vec!["want", "my", "money"]);
    }

    #[test]
    fn test_analyze_bigrams_without_stop_words() {
        let v = TfidfVectorizer::new(TfidfOptions::salience());
        assert_eq!(
            v.analyze("the refund was slow"),
            vec!["refund", "slow", "refund slow"]
        );
    }

    #[test]
    fn test_vocabulary_is_alphabetical() {
        let v = TfidfVectorizer::default();
        let m = v.fit_transform(&docs(&["zebra apple", "mango"]));
        assert_eq!(m.vocabulary, vec!["apple", "mango", "zebra"]);
        assert_eq!(m.rows.len(), 2);
        assert_eq!(m.rows[0].len(), 3);
    }

    #[test]
    fn test_rows_are_unit_length() {
        let v = TfidfVectorizer::default();
        let m = v.fit_transform(&docs(&["refund is slow", "refund please"]));
        for row in &m.rows {
            let norm: f32 = row.iter().map(|x| x * x).sum::<f32>().sqrt();
            assert!((norm - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn test_smoothed_idf_weights_rare_terms_higher() {
        let v = TfidfVectorizer::default();
        let m = v.fit_transform(&docs(&["money back", "money now"]));
        let money = m.vocabulary.iter().position(|t| t == "money").unwrap();
        let back = m.vocabulary.iter().position(|t| t == "back").unwrap();
        assert!(m.rows[0][back] > m.rows[0][money]);
    }

    #[test]
    fn test_shared_vocabulary_similarity() {
        let texts = docs(&["Withholding my money", "I want my money back"]);

        let raw = TfidfVectorizer::new(TfidfOptions {
            use_idf: false,
            ..TfidfOptions::default()
        })
        .fit_transform(&texts);
        let sim = cosine_similarity(&raw.rows[0], &raw.rows[1]);
        assert!((sim - 0.5774).abs() < 1e-3, "sim = {}", sim);

        let weighted = TfidfVectorizer::default().fit_transform(&texts);
        let sim = cosine_similarity(&weighted.rows[0], &weighted.rows[1]);
        assert!((sim - 0.411).abs() < 1e-2, "sim = {}", sim);
    }

    #[test]
    fn test_empty_vocabulary_gives_zero_width_rows() {
        let v = TfidfVectorizer::default();
        let m = v.fit_transform(&docs(&["a b", "", "!"]));
        assert!(m.vocabulary.is_empty());
        assert_eq!(m.rows, vec![Vec::<f32>::new(); 3]);
    }

    #[test]
    fn test_empty_doc_gets_zero_row() {
        let v = TfidfVectorizer::default();
        let m = v.fit_transform(&docs(&["refund slow", ""]));
        assert!(m.rows[1].iter().all(|x| *x == 0.0));
    }

    #[test]
    fn test_max_features_keeps_most_frequent() {
        let v = TfidfVectorizer::new(TfidfOptions {
            max_features: Some(2),
            ..TfidfOptions::default()
        });
        let m = v.fit_transform(&docs(&["slow slow refund", "slow app", "refund zebra"]));
        assert_eq!(m.vocabulary, vec!["refund", "slow"]);
    }

    #[test]
    fn test_max_features_ties_alphabetical() {
        let v = TfidfVectorizer::new(TfidfOptions {
            max_features: Some(1),
            ..TfidfOptions::default()
        });
        let m = v.fit_transform(&docs(&["beta alpha"]));
        assert_eq!(m.vocabulary, vec!["alpha"]);
    }

    #[test]
    fn test_sublinear_tf_dampens_repeats() {
        let texts = docs(&["slow slow slow refund"]);
        let linear = TfidfVectorizer::default().fit_transform(&texts);
        let sublinear = TfidfVectorizer::new(TfidfOptions {
            sublinear_tf: true,
            ..TfidfOptions::default()
        })
        .fit_transform(&texts);
        // vocabulary: refund, slow
        let ratio_linear = linear.rows[0][1] / linear.rows[0][0];
        let ratio_sub = sublinear.rows[0][1] / sublinear.rows[0][0];
        assert!(ratio_sub < ratio_linear);
    }

    #[test]
    fn test_deterministic() {
        let texts = docs(&["refund slow", "app crash on login", "refund please"]);
        let v = TfidfVectorizer::default();
        assert_eq!(v.fit_transform(&texts), v.fit_transform(&texts));
    }

    #[test]
    fn test_top_terms_ties_alphabetical() {
        let v = TfidfVectorizer::new(TfidfOptions::salience());
        let m = v.fit_transform(&docs(&["zebra apple"]));
        assert_eq!(m.top_terms(3), vec!["apple", "zebra", "zebra apple"]);
    }

    #[test]
    fn test_top_terms_prefers_heavier() {
        let v = TfidfVectorizer::new(TfidfOptions::salience());
        let m = v.fit_transform(&docs(&["refund refund slow", "refund"]));
        assert_eq!(m.top_terms(1), vec!["refund"]);
    }

    #[test]
    fn test_top_terms_empty() {
        let v = TfidfVectorizer::new(TfidfOptions::salience());
        let m = v.fit_transform(&docs(&["the and of"]));
        assert!(m.top_terms(3).is_empty());
    }
}
