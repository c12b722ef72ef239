//! End-to-end pipeline behavior with the local TF-IDF provider.
//!
//! Each test builds its own pipeline from a fresh configuration, so nothing
//! is shared between runs.

use murmur_core::config::{MurmurConfig, OverflowStrategy};
use murmur_core::types::{AnalyzeRequest, AnalyzeResponse, InputSentence, SentimentLabel};
use murmur_insight::{AnalysisMode, AnalysisPipeline, InsightPayload, InsightSource};

// =============================================================================
// Helpers
// =============================================================================

fn sentences(items: &[(&str, &str)]) -> Vec<InputSentence> {
    items
        .iter()
        .map(|(text, id)| InputSentence::new(*text, *id))
        .collect()
}

fn config(threshold: f64) -> MurmurConfig {
    let mut config = MurmurConfig::default();
    config.clustering.similarity_threshold = threshold;
    config
}

fn pipeline(config: &MurmurConfig) -> AnalysisPipeline {
    AnalysisPipeline::from_config(config).unwrap()
}

const WORDS: [&str; 12] = [
    "alpha", "bravo", "charlie", "delta", "echo", "foxtrot", "golf", "hotel", "india",
    "juliet", "kilo", "lima",
];

fn distinct_words() -> Vec<InputSentence> {
    WORDS
        .iter()
        .enumerate()
        .map(|(i, w)| InputSentence::new(*w, format!("w{}", i)))
        .collect()
}

fn mixed_feedback() -> Vec<InputSentence> {
    sentences(&[
        ("Refund is taking too long", "r1"),
        ("My refund is still missing", "r2"),
        ("The app crashes on login", "a1"),
        ("App crashes every time I login", "a2"),
        ("Love the savings goals", "s1"),
        ("Refund still not here", "r3"),
        ("Great support team", "t1"),
        ("The app crashes again", "a3"),
    ])
}

// =============================================================================
// Scenarios
// =============================================================================

#[tokio::test]
async fn test_two_related_complaints_form_one_negative_cluster() {
    let mut config = config(0.55);
    config.embedding.tfidf.use_idf = false;
    let request = AnalyzeRequest::standalone(
        "Payments",
        sentences(&[("Withholding my money", "1"), ("I want my money back", "2")]),
    );

    let output = pipeline(&config).analyze(&request).await.unwrap();
    assert_eq!(output.mode, AnalysisMode::Standalone);
    assert_eq!(output.clusters.len(), 1);

    match output.to_response() {
        AnalyzeResponse::Standalone(response) => {
            let cluster = &response.clusters[0];
            assert_eq!(cluster.sentiment, SentimentLabel::Negative);
            assert!((2..=3).contains(&cluster.key_insights.len()));
            assert!(cluster.title.starts_with("Payments"));
        }
        other => panic!("expected standalone response, got {:?}", other),
    }
}

#[tokio::test]
async fn test_comparison_cluster_keeps_cohort_ids() {
    let request = AnalyzeRequest::comparison(
        "Payments",
        sentences(&[("Withholding my money", "b1"), ("I want my money back", "b2")]),
        sentences(&[("Refund process is slow", "c1")]),
    );

    let output = pipeline(&config(0.0)).analyze(&request).await.unwrap();
    assert_eq!(output.mode, AnalysisMode::Comparison);
    assert_eq!(output.clusters.len(), 1);

    match output.to_response() {
        AnalyzeResponse::Comparison(response) => {
            let cluster = &response.clusters[0];
            assert_eq!(cluster.baseline_sentences, vec!["b1", "b2"]);
            assert_eq!(cluster.comparison_sentences, vec!["c1"]);
            assert!(!cluster.key_similarities.is_empty());
            assert!(!cluster.key_differences.is_empty());
        }
        other => panic!("expected comparison response, got {:?}", other),
    }

    let json = output.to_response().to_json(false).unwrap();
    assert!(json.contains("\"baselineSentences\""));
    assert!(!json.contains("keyInsights"));
}

#[tokio::test]
async fn test_overflow_merges_lowest_ranked_clusters() {
    let mut config = config(0.9);
    config.clustering.max_clusters = 10;
    config.clustering.overflow_strategy = OverflowStrategy::Other;
    let request = AnalyzeRequest::standalone("Words", distinct_words());

    let output = pipeline(&config).analyze(&request).await.unwrap();
    assert_eq!(output.clusters.len(), 10);
    assert_eq!(output.dropped_items, 0);

    let last = output.clusters.last().unwrap();
    assert!(last.report.is_overflow_merge);
    assert_eq!(last.report.member_indices, vec![9, 10, 11]);
    assert_eq!(last.report.baseline_item_ids, vec!["w9", "w10", "w11"]);
    assert_eq!(last.payload.title(), "Other Words feedback");
    assert!(output.clusters[..9].iter().all(|c| !c.report.is_overflow_merge));
}

#[tokio::test]
async fn test_drop_strategy_counts_lost_items() {
    let mut config = config(0.9);
    config.clustering.max_clusters = 10;
    config.clustering.overflow_strategy = OverflowStrategy::Drop;
    let request = AnalyzeRequest::standalone("Words", distinct_words());

    let output = pipeline(&config).analyze(&request).await.unwrap();
    assert_eq!(output.clusters.len(), 10);
    assert_eq!(output.dropped_items, 2);
    assert!(output.clusters.iter().all(|c| !c.report.is_overflow_merge));
}

#[tokio::test]
async fn test_empty_baseline_gives_no_clusters() {
    let request = AnalyzeRequest::standalone("Payments", vec![]);
    let output = pipeline(&config(0.55)).analyze(&request).await.unwrap();
    assert!(output.clusters.is_empty());
    assert_eq!(output.to_response().to_json(false).unwrap(), "{\"clusters\":[]}");
}

#[tokio::test]
async fn test_whitespace_only_sentences_are_kept_neutral() {
    let request = AnalyzeRequest::standalone(
        "Payments",
        sentences(&[("   ", "blank"), ("Refund is slow", "r")]),
    );
    let output = pipeline(&config(0.55)).analyze(&request).await.unwrap();
    let members: usize = output.clusters.iter().map(|c| c.report.size).sum();
    assert_eq!(members, 2);
}

// =============================================================================
// Properties
// =============================================================================

#[tokio::test]
async fn test_output_is_deterministic() {
    let request = AnalyzeRequest::comparison(
        "App",
        mixed_feedback(),
        sentences(&[("Refund arrived late", "x1"), ("App crashes a lot", "x2")]),
    );
    let config = config(0.3);
    let first = pipeline(&config).analyze(&request).await.unwrap();
    let second = pipeline(&config).analyze(&request).await.unwrap();
    assert_eq!(
        first.to_response().to_json(true).unwrap(),
        second.to_response().to_json(true).unwrap()
    );
}

#[tokio::test]
async fn test_every_item_lands_in_one_cluster() {
    let request = AnalyzeRequest::standalone("App", mixed_feedback());
    for threshold in [0.0, 0.2, 0.5, 0.8, 1.0] {
        let mut config = config(threshold);
        config.clustering.max_clusters = 100;
        let output = pipeline(&config).analyze(&request).await.unwrap();
        let mut positions: Vec<usize> = output
            .clusters
            .iter()
            .flat_map(|c| c.report.member_indices.clone())
            .collect();
        positions.sort_unstable();
        assert_eq!(positions, (0..8).collect::<Vec<_>>(), "threshold {}", threshold);
    }
}

#[tokio::test]
async fn test_cluster_count_never_exceeds_limit() {
    let request = AnalyzeRequest::standalone("Words", distinct_words());
    for max_clusters in 1..=13 {
        for strategy in [OverflowStrategy::Other, OverflowStrategy::Drop] {
            let mut config = config(0.9);
            config.clustering.max_clusters = max_clusters;
            config.clustering.overflow_strategy = strategy;
            let output = pipeline(&config).analyze(&request).await.unwrap();
            assert!(output.clusters.len() <= max_clusters);
        }
    }
}

#[tokio::test]
async fn test_emitted_lists_respect_budgets() {
    let mut config = config(0.3);
    config.insights.min_insights = 3;
    config.insights.max_insights = 4;
    config.insights.min_similarities = 2;
    config.insights.max_similarities = 2;
    config.insights.min_differences = 3;
    config.insights.max_differences = 5;

    let standalone = AnalyzeRequest::standalone("App", mixed_feedback());
    let output = pipeline(&config).analyze(&standalone).await.unwrap();
    for cluster in &output.clusters {
        match &cluster.payload {
            InsightPayload::Standalone(p) => {
                assert!((3..=4).contains(&p.key_insights.len()));
                assert_eq!(p.source, InsightSource::Deterministic);
            }
            other => panic!("unexpected payload {:?}", other),
        }
    }

    let comparison = AnalyzeRequest::comparison(
        "App",
        mixed_feedback(),
        sentences(&[("Refund arrived late", "x1")]),
    );
    let output = pipeline(&config).analyze(&comparison).await.unwrap();
    for cluster in &output.clusters {
        match &cluster.payload {
            InsightPayload::Comparison(p) => {
                assert_eq!(p.key_similarities.len(), 2);
                assert!((3..=5).contains(&p.key_differences.len()));
            }
            other => panic!("unexpected payload {:?}", other),
        }
    }
}

#[tokio::test]
async fn test_out_of_range_threshold_is_clamped() {
    let request = AnalyzeRequest::standalone("Words", distinct_words());
    let mut config = config(1.7);
    config.clustering.max_clusters = 20;
    let output = pipeline(&config).analyze(&request).await.unwrap();
    assert_eq!(output.clusters.len(), 12);
}

#[tokio::test]
async fn test_invalid_requests_are_rejected() {
    let p = pipeline(&config(0.55));

    let blank_theme = AnalyzeRequest::standalone("  ", sentences(&[("x", "1")]));
    assert!(p.analyze(&blank_theme).await.is_err());

    let empty_id = AnalyzeRequest::standalone("P", sentences(&[("x", "")]));
    assert!(p.analyze(&empty_id).await.is_err());

    let orphan = AnalyzeRequest::comparison("P", vec![], sentences(&[("x", "1")]));
    assert!(p.analyze(&orphan).await.is_err());
}

#[tokio::test]
async fn test_request_parsed_from_json() {
    let json = r#"{
        "surveyTitle": "Q3 survey",
        "theme": "Payments",
        "baseline": [
            {"sentence": "Withholding my money", "id": "a"},
            {"sentence": "I want my money back", "id": "b"}
        ],
        "comparison": []
    }"#;
    let request = AnalyzeRequest::from_json(json).unwrap();
    let output = pipeline(&config(0.55)).analyze(&request).await.unwrap();
    assert_eq!(output.mode, AnalysisMode::Standalone);
}
