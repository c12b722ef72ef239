//! Shared data types: the analysis request, per-sentence feedback items, and
//! the two response document shapes.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{MurmurError, Result};

/// One of the two labeled groups of input sentences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cohort {
    Baseline,
    Comparison,
}

impl fmt::Display for Cohort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cohort::Baseline => write!(f, "baseline"),
            Cohort::Comparison => write!(f, "comparison"),
        }
    }
}

/// Sentiment label for a sentence or a cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentLabel {
    Positive,
    Neutral,
    Negative,
}

impl SentimentLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            SentimentLabel::Positive => "positive",
            SentimentLabel::Neutral => "neutral",
            SentimentLabel::Negative => "negative",
        }
    }
}

impl fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single input sentence with its opaque id.
///
/// Several sentences may share an id when they were split from one comment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputSentence {
    pub sentence: String,
    pub id: String,
}

impl InputSentence {
    pub fn new(sentence: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            sentence: sentence.into(),
            id: id.into(),
        }
    }
}

/// An analysis request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub survey_title: Option<String>,
    pub theme: String,
    #[serde(default)]
    pub baseline: Vec<InputSentence>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comparison: Option<Vec<InputSentence>>,
}

impl AnalyzeRequest {
    /// Build a standalone request.
    pub fn standalone(theme: impl Into<String>, baseline: Vec<InputSentence>) -> Self {
        Self {
            survey_title: None,
            theme: theme.into(),
            baseline,
            comparison: None,
        }
    }

    /// Build a comparison request.
    pub fn comparison(
        theme: impl Into<String>,
        baseline: Vec<InputSentence>,
        comparison: Vec<InputSentence>,
    ) -> Self {
        Self {
            survey_title: None,
            theme: theme.into(),
            baseline,
            comparison: Some(comparison),
        }
    }

    /// Parse a request from its JSON document.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Comparison mode applies only when the comparison cohort has sentences.
    pub fn is_comparison(&self) -> bool {
        self.comparison.as_ref().is_some_and(|c| !c.is_empty())
    }

    pub fn comparison_sentences(&self) -> &[InputSentence] {
        self.comparison.as_deref().unwrap_or(&[])
    }

    /// Reject requests that cannot produce a well-formed report.
    pub fn validate(&self) -> Result<()> {
        if self.theme.trim().is_empty() {
            return Err(MurmurError::Input("theme must not be empty".to_string()));
        }
        if self.baseline.is_empty() && self.is_comparison() {
            return Err(MurmurError::Input(
                "comparison sentences were given without a baseline".to_string(),
            ));
        }
        let all = self.baseline.iter().chain(self.comparison_sentences());
        for (i, s) in all.enumerate() {
            if s.id.trim().is_empty() {
                return Err(MurmurError::Input(format!(
                    "sentence {} has an empty id",
                    i
                )));
            }
        }
        Ok(())
    }
}

/// One input sentence after normalization and sentiment scoring.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedbackItem {
    pub id: String,
    pub raw_text: String,
    pub normalized_text: String,
    /// Compound score in `[-1, 1]`.
    pub sentiment_score: f64,
    pub sentiment_label: SentimentLabel,
    pub cohort: Cohort,
    /// Index in the combined corpus, baseline first.
    pub position: usize,
}

/// One cluster in a standalone response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StandaloneCluster {
    pub title: String,
    pub sentiment: SentimentLabel,
    pub key_insights: Vec<String>,
}

/// One cluster in a comparison response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonCluster {
    pub title: String,
    pub sentiment: SentimentLabel,
    pub baseline_sentences: Vec<String>,
    pub comparison_sentences: Vec<String>,
    pub key_similarities: Vec<String>,
    pub key_differences: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandaloneResponse {
    pub clusters: Vec<StandaloneCluster>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonResponse {
    pub clusters: Vec<ComparisonCluster>,
}

/// The response document, in whichever mode the request selected.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AnalyzeResponse {
    Standalone(StandaloneResponse),
    Comparison(ComparisonResponse),
}

impl AnalyzeResponse {
    pub fn cluster_count(&self) -> usize {
        match self {
            AnalyzeResponse::Standalone(r) => r.clusters.len(),
            AnalyzeResponse::Comparison(r) => r.clusters.len(),
        }
    }

    pub fn to_json(&self, pretty: bool) -> Result<String> {
        let json = if pretty {
            serde_json::to_string_pretty(self)?
        } else {
            serde_json::to_string(self)?
        };
        Ok(json)
    }
}
