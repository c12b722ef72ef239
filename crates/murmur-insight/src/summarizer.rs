//! Deterministic titles and insights built from term salience.
//!
//! Salience is TF-IDF recomputed over a cluster's representative texts with
//! English stop words removed and unigrams plus bigrams. Terms rank by mean
//! weight, ties alphabetical. Templates never call out to anything, so this
//! generator is always available as the fallback.

use murmur_core::config::InsightsConfig;
use murmur_core::types::SentimentLabel;
use murmur_embedding::{TfidfOptions, TfidfVectorizer};

use crate::types::{
    AnalysisMode, ClusterReport, ComparisonInsights, InsightPayload, InsightSource,
    StandaloneInsights,
};

/// Number of items to emit for a list bounded by `[min, max]`.
fn target_count(min: usize, max: usize, floor: usize) -> usize {
    min.max(floor).min(max)
}

/// Truncate or pad `items` to exactly `n` entries.
fn fit_to(mut items: Vec<String>, n: usize, theme: &str) -> Vec<String> {
    items.truncate(n);
    let mut k = 1;
    while items.len() < n {
        items.push(format!("Further {} feedback to review ({}).", theme, k));
        k += 1;
    }
    items
}

fn sentiment_phrase(label: SentimentLabel, strongly_negative: bool) -> &'static str {
    if strongly_negative {
        "strongly negative"
    } else {
        label.as_str()
    }
}

/// Builds payloads for one cluster without external calls.
#[derive(Debug, Clone)]
pub struct DeterministicInsightGenerator {
    budget: InsightsConfig,
    vectorizer: TfidfVectorizer,
}

impl DeterministicInsightGenerator {
    pub fn new(budget: InsightsConfig) -> Self {
        Self {
            budget,
            vectorizer: TfidfVectorizer::new(TfidfOptions::salience()),
        }
    }

    /// Most salient terms across `texts`.
    pub fn top_terms(&self, texts: &[String], k: usize) -> Vec<String> {
        if texts.is_empty() {
            return Vec::new();
        }
        self.vectorizer.fit_transform(texts).top_terms(k)
    }

    /// Payload in the shape `mode` requires.
    pub fn generate(&self, mode: AnalysisMode, theme: &str, report: &ClusterReport) -> InsightPayload {
        match mode {
            AnalysisMode::Standalone => InsightPayload::Standalone(self.standalone(theme, report)),
            AnalysisMode::Comparison => InsightPayload::Comparison(self.comparison(theme, report)),
        }
    }

    fn title(&self, theme: &str, report: &ClusterReport, terms: &[String]) -> String {
        if report.is_overflow_merge {
            return format!("Other {} feedback", theme);
        }
        match terms {
            [] => format!("{} feedback", theme),
            [only] => format!("{}: {}", theme, only),
            [first, second, ..] => format!("{}: {} / {}", theme, first, second),
        }
    }

    pub fn standalone(&self, theme: &str, report: &ClusterReport) -> StandaloneInsights {
        let texts: Vec<String> = report
            .baseline_representative_texts
            .iter()
            .chain(report.comparison_representative_texts.iter())
            .cloned()
            .collect();
        let terms = self.top_terms(&texts, 3);
        let title = self.title(theme, report, &terms);

        let mut candidates = vec![format!(
            "Key theme: {}; cluster sentiment appears {}.",
            theme,
            sentiment_phrase(report.sentiment_label, report.strongly_negative)
        )];
        if terms.is_empty() {
            candidates.push("Users share feedback on this theme.".to_string());
        } else {
            candidates.push(format!("Top terms: {}.", terms.join(", ")));
        }
        candidates.push(format!(
            "Raised in {} sentence{} in this cluster.",
            report.size,
            if report.size == 1 { "" } else { "s" }
        ));
        candidates.push(
            "Details vary across comments; consider investigating representative examples."
                .to_string(),
        );

        let n = target_count(self.budget.min_insights, self.budget.max_insights, 2);
        StandaloneInsights {
            title,
            sentiment: report.sentiment_label,
            key_insights: fit_to(candidates, n, theme),
            source: InsightSource::Deterministic,
        }
    }

    pub fn comparison(&self, theme: &str, report: &ClusterReport) -> ComparisonInsights {
        let baseline = &report.baseline_representative_texts;
        let comparison = &report.comparison_representative_texts;
        let combined: Vec<String> = baseline.iter().chain(comparison.iter()).cloned().collect();

        let all_terms = self.top_terms(&combined, 3);
        let base_terms = self.top_terms(baseline, 5);
        let comp_terms = self.top_terms(comparison, 5);
        let title = self.title(theme, report, &all_terms);

        let shared: Vec<&str> = base_terms
            .iter()
            .filter(|t| comp_terms.contains(t))
            .map(String::as_str)
            .take(3)
            .collect();
        let base_only: Vec<&str> = base_terms
            .iter()
            .filter(|t| !comp_terms.contains(t))
            .map(String::as_str)
            .take(3)
            .collect();
        let comp_only: Vec<&str> = comp_terms
            .iter()
            .filter(|t| !base_terms.contains(t))
            .map(String::as_str)
            .take(3)
            .collect();

        let mut similarities = Vec::new();
        if all_terms.is_empty() {
            similarities.push(format!("Both cohorts share feedback on {}.", theme));
        } else {
            similarities.push(format!(
                "Both cohorts discuss {} within {}.",
                all_terms.iter().take(2).cloned().collect::<Vec<_>>().join(" / "),
                theme
            ));
        }
        if shared.is_empty() {
            similarities.push("Language overlaps but with different emphasis.".to_string());
        } else {
            similarities.push(format!("Shared terms: {}.", shared.join(", ")));
        }
        similarities.push(format!(
            "Overall sentiment in this cluster is {}.",
            sentiment_phrase(report.sentiment_label, report.strongly_negative)
        ));

        let mut differences = Vec::new();
        if base_only.is_empty() {
            differences.push("Baseline has fewer unique terms.".to_string());
        } else {
            differences.push(format!("Baseline unique terms: {}.", base_only.join(", ")));
        }
        if comp_only.is_empty() {
            differences.push("Comparison has fewer unique terms.".to_string());
        } else {
            differences.push(format!("Comparison unique terms: {}.", comp_only.join(", ")));
        }
        differences.push(format!(
            "Volume: {} baseline versus {} comparison comments.",
            report.baseline_item_ids.len(),
            report.comparison_item_ids.len()
        ));

        let ns = target_count(self.budget.min_similarities, self.budget.max_similarities, 1);
        let nd = target_count(self.budget.min_differences, self.budget.max_differences, 1);

        ComparisonInsights {
            title,
            sentiment: report.sentiment_label,
            baseline_sentences: report.baseline_item_ids.clone(),
            comparison_sentences: report.comparison_item_ids.clone(),
            key_similarities: fit_to(similarities, ns, theme),
            key_differences: fit_to(differences, nd, theme),
            source: InsightSource::Deterministic,
        }
    }
}

impl Default for DeterministicInsightGenerator {
    fn default() -> Self {
        Self::new(InsightsConfig::default())
    }
}
