//! Rule-based sentence sentiment.
//!
//! Each lexicon word contributes its valence, adjusted by nearby boosters,
//! negations, ALL-CAPS emphasis and a "but" contrast. The summed valence is
//! squashed into `[-1, 1]` with `s / sqrt(s^2 + 15)`.

use murmur_core::config::SentimentConfig;
use murmur_core::types::SentimentLabel;

use crate::lexicon;

/// Extra intensity for an ALL-CAPS sentiment word in mixed-case text.
const C_INCR: f64 = 0.733;
/// Multiplier applied to a valence preceded by a negation.
const N_SCALAR: f64 = -0.74;
const NORMALIZATION_ALPHA: f64 = 15.0;
/// Distance decay for modifiers one, two and three tokens back.
const WINDOW_DECAY: [f64; 3] = [1.0, 0.95, 0.9];

struct Token {
    lower: String,
    is_caps: bool,
}

fn tokenize(text: &str) -> Vec<Token> {
    text.split_whitespace()
        .filter_map(|word| {
            let stripped = word.trim_matches(|c: char| !c.is_alphanumeric());
            if stripped.is_empty() {
                return None;
            }
            let letters: Vec<char> = stripped.chars().filter(|c| c.is_alphabetic()).collect();
            let is_caps = letters.len() >= 2 && letters.iter().all(|c| c.is_uppercase());
            Some(Token {
                lower: stripped.to_lowercase(),
                is_caps,
            })
        })
        .collect()
}

fn punctuation_emphasis(text: &str) -> f64 {
    let exclamations = text.matches('!').count().min(4) as f64;
    let questions = text.matches('?').count();
    let question_amp = match questions {
        0 | 1 => 0.0,
        2 | 3 => questions as f64 * 0.18,
        _ => 0.96,
    };
    exclamations * 0.292 + question_amp
}

/// Scores sentences and clusters and maps scores to labels.
#[derive(Debug, Clone, PartialEq)]
pub struct SentimentScorer {
    positive_threshold: f64,
    negative_threshold: f64,
    strong_negative_threshold: f64,
}

impl Default for SentimentScorer {
    fn default() -> Self {
        Self::new(&SentimentConfig::default())
    }
}

impl SentimentScorer {
    pub fn new(config: &SentimentConfig) -> Self {
        Self {
            positive_threshold: config.positive_threshold,
            negative_threshold: config.negative_threshold,
            strong_negative_threshold: config.strong_negative_threshold,
        }
    }

    /// Compound polarity of a normalized sentence, in `[-1, 1]`.
    pub fn polarity(&self, text: &str) -> f64 {
        let tokens = tokenize(text);
        if tokens.is_empty() {
            return 0.0;
        }
        let caps_count = tokens.iter().filter(|t| t.is_caps).count();
        let caps_differ = caps_count > 0 && caps_count < tokens.len();

        let mut valences = vec![0.0_f64; tokens.len()];
        for (i, token) in tokens.iter().enumerate() {
            if lexicon::booster(&token.lower).is_some() {
                continue;
            }
            let Some(mut v) = lexicon::valence(&token.lower) else {
                continue;
            };

            if caps_differ && token.is_caps {
                v += C_INCR.copysign(v);
            }

            for (back, decay) in WINDOW_DECAY.iter().enumerate() {
                let Some(j) = i.checked_sub(back + 1) else {
                    break;
                };
                if let Some(scalar) = lexicon::booster(&tokens[j].lower) {
                    let mut s = if v < 0.0 { -scalar } else { scalar };
                    if caps_differ && tokens[j].is_caps {
                        s += C_INCR.copysign(v);
                    }
                    v += s * decay;
                }
            }
            for back in 1..=WINDOW_DECAY.len() {
                let Some(j) = i.checked_sub(back) else {
                    break;
                };
                if lexicon::is_negation(&tokens[j].lower) {
                    v *= N_SCALAR;
                }
            }

            valences[i] = v;
        }

        if let Some(pivot) = tokens.iter().position(|t| t.lower == "but") {
            for (i, v) in valences.iter_mut().enumerate() {
                if i < pivot {
                    *v *= 0.5;
                } else if i > pivot {
                    *v *= 1.5;
                }
            }
        }

        let mut sum: f64 = valences.iter().sum();
        if sum != 0.0 {
            sum += punctuation_emphasis(text).copysign(sum);
        }

        (sum / (sum * sum + NORMALIZATION_ALPHA).sqrt()).clamp(-1.0, 1.0)
    }

    /// Map a score to its label.
    pub fn label(&self, score: f64) -> SentimentLabel {
        if score <= self.negative_threshold {
            SentimentLabel::Negative
        } else if score >= self.positive_threshold {
            SentimentLabel::Positive
        } else {
            SentimentLabel::Neutral
        }
    }

    /// Score and label a sentence.
    pub fn score(&self, text: &str) -> (f64, SentimentLabel) {
        let s = self.polarity(text);
        (s, self.label(s))
    }

    pub fn is_strongly_negative(&self, score: f64) -> bool {
        score <= self.strong_negative_threshold
    }

    /// Mean score and its label. An empty set is neutral.
    pub fn cluster_sentiment(&self, scores: &[f64]) -> (f64, SentimentLabel) {
        if scores.is_empty() {
            return (0.0, SentimentLabel::Neutral);
        }
        let mean = scores.iter().sum::<f64>() / scores.len() as f64;
        (mean, self.label(mean))
    }
}
