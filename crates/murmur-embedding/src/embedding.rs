//! Embedding provider capability and its two strategies.
//!
//! - `TfidfEmbedding` builds TF-IDF vectors in process. Deterministic.
//! - `HttpEmbedding` calls an OpenAI-compatible `/v1/embeddings` endpoint in
//!   batches, with a per-call timeout and a per-batch retry budget.
//!
//! The strategy is chosen from configuration by [`create_provider`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use murmur_core::config::{EmbeddingConfig, EmbeddingProviderKind, HttpEmbeddingConfig};
use murmur_core::retry::{execute_with_retry, AttemptError, RetryPolicy};

use crate::error::EmbeddingError;
use crate::similarity::l2_normalize;
use crate::tfidf::{TfidfOptions, TfidfVectorizer};

/// Produces one vector per input text, in input order.
///
/// All vectors returned by a single call share one dimensionality. The
/// pipeline calls `embed` exactly once per run over the combined corpus.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError>;

    /// Short provider name for logs.
    fn name(&self) -> &'static str;
}

/// Build the provider selected by `config`.
pub fn create_provider(
    config: &EmbeddingConfig,
) -> Result<Box<dyn EmbeddingProvider>, EmbeddingError> {
    match config.provider {
        EmbeddingProviderKind::Tfidf => Ok(Box::new(TfidfEmbedding::new(
            TfidfOptions::from(&config.tfidf),
        ))),
        EmbeddingProviderKind::Http => Ok(Box::new(HttpEmbedding::new(&config.http)?)),
    }
}

// ---------------------------------------------------------------------------
// TfidfEmbedding - local vectors
// ---------------------------------------------------------------------------

/// Local TF-IDF embedding fitted on each batch.
#[derive(Debug, Clone, Default)]
pub struct TfidfEmbedding {
    vectorizer: TfidfVectorizer,
}

impl TfidfEmbedding {
    pub fn new(options: TfidfOptions) -> Self {
        Self {
            vectorizer: TfidfVectorizer::new(options),
        }
    }
}

#[async_trait]
impl EmbeddingProvider for TfidfEmbedding {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let matrix = self.vectorizer.fit_transform(texts);
        debug!(
            documents = texts.len(),
            vocabulary = matrix.vocabulary.len(),
            "TF-IDF vectors built"
        );
        Ok(matrix.rows)
    }

    fn name(&self) -> &'static str {
        "tfidf"
    }
}

// ---------------------------------------------------------------------------
// HttpEmbedding - OpenAI-compatible endpoint
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingDatum>,
}

#[derive(Deserialize)]
struct EmbeddingDatum {
    embedding: Vec<f32>,
    #[serde(default)]
    index: Option<usize>,
}

/// Remote embedding client.
pub struct HttpEmbedding {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
    batch_size: usize,
    policy: RetryPolicy,
}

impl std::fmt::Debug for HttpEmbedding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpEmbedding")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("batch_size", &self.batch_size)
            .finish()
    }
}

impl HttpEmbedding {
    pub fn new(config: &HttpEmbeddingConfig) -> Result<Self, EmbeddingError> {
        if config.batch_size == 0 {
            return Err(EmbeddingError::Config(
                "batch_size must be at least 1".to_string(),
            ));
        }
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| EmbeddingError::Config(format!("HTTP client: {}", e)))?;
        let endpoint = format!("{}/v1/embeddings", config.base_url.trim_end_matches('/'));
        info!(endpoint = %endpoint, model = %config.model, "HTTP embedding provider configured");
        Ok(Self {
            client,
            endpoint,
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            batch_size: config.batch_size,
            policy: RetryPolicy::new(config.max_retries, config.timeout()),
        })
    }

    async fn embed_batch(&self, batch: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let resp = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&EmbeddingRequest {
                model: &self.model,
                input: batch,
            })
            .send()
            .await?;
        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            return Err(EmbeddingError::Status {
                status: status.as_u16(),
                body: body.chars().take(200).collect(),
            });
        }
        parse_embedding_response(&body, batch.len())
    }
}

/// Decode a `/v1/embeddings` body into vectors ordered like the request.
fn parse_embedding_response(
    body: &str,
    expected: usize,
) -> Result<Vec<Vec<f32>>, EmbeddingError> {
    let mut parsed: EmbeddingResponse = serde_json::from_str(body)
        .map_err(|e| EmbeddingError::MalformedResponse(e.to_string()))?;
    if parsed.data.len() != expected {
        return Err(EmbeddingError::MalformedResponse(format!(
            "expected {} embeddings, got {}",
            expected,
            parsed.data.len()
        )));
    }
    // Without indices the reply order is taken as the request order.
    if parsed.data.iter().any(|d| d.index.is_some()) {
        parsed.data.sort_by_key(|d| d.index);
        let in_sequence = parsed
            .data
            .iter()
            .enumerate()
            .all(|(i, d)| d.index == Some(i));
        if !in_sequence {
            let indices: Vec<Option<usize>> = parsed.data.iter().map(|d| d.index).collect();
            return Err(EmbeddingError::MalformedResponse(format!(
                "embedding indices must cover 0..{} exactly, got {:?}",
                expected, indices
            )));
        }
    }
    Ok(parsed.data.into_iter().map(|d| d.embedding).collect())
}

#[async_trait]
impl EmbeddingProvider for HttpEmbedding {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        // Empty texts are never sent; they get zero vectors afterwards.
        let (positions, payload): (Vec<usize>, Vec<String>) = texts
            .iter()
            .enumerate()
            .filter(|(_, t)| !t.trim().is_empty())
            .map(|(i, t)| (i, t.clone()))
            .unzip();

        let mut vectors: Vec<Vec<f32>> = Vec::with_capacity(payload.len());
        for (batch_no, chunk) in payload.chunks(self.batch_size).enumerate() {
            let outcome = execute_with_retry(&self.policy, move |_| self.embed_batch(chunk)).await;
            debug!(
                batch = batch_no,
                size = chunk.len(),
                attempts = outcome.attempts,
                "embedding batch finished"
            );
            match outcome.into_result() {
                Ok(batch) => vectors.extend(batch),
                Err(AttemptError::TimedOut(d)) => {
                    return Err(EmbeddingError::Timeout(format!(
                        "no response within {:.1}s",
                        d.as_secs_f64()
                    )))
                }
                Err(AttemptError::Failed(e)) => return Err(e),
            }
        }

        let dims = vectors.first().map(|v| v.len()).unwrap_or(0);
        for v in vectors.iter_mut() {
            if v.len() != dims {
                return Err(EmbeddingError::DimensionMismatch {
                    expected: dims,
                    actual: v.len(),
                });
            }
            l2_normalize(v);
        }

        let mut out = vec![vec![0.0_f32; dims]; texts.len()];
        for (pos, v) in positions.into_iter().zip(vectors) {
            out[pos] = v;
        }
        Ok(out)
    }

    fn name(&self) -> &'static str {
        "http"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    fn texts(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    /// Serve `responses` in order, one per connection, and return the raw
    /// requests that were received.
    async fn serve(
        responses: Vec<(u16, String)>,
    ) -> (String, tokio::task::JoinHandle<Vec<String>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let mut requests = Vec::new();
            for (status, body) in responses {
                let (mut sock, _) = listener.accept().await.unwrap();
                let mut buf = Vec::new();
                let mut tmp = [0u8; 4096];
                loop {
                    let n = sock.read(&mut tmp).await.unwrap();
                    if n == 0 {
                        break;
                    }
                    buf.extend_from_slice(&tmp[..n]);
                    let text = String::from_utf8_lossy(&buf).to_string();
                    if let Some(pos) = text.find("\r\n\r\n") {
                        let len = text[..pos]
                            .lines()
                            .find_map(|l| {
                                l.to_ascii_lowercase()
                                    .strip_prefix("content-length:")
                                    .map(|v| v.trim().parse::<usize>().unwrap())
                            })
                            .unwrap_or(0);
                        if buf.len() >= pos + 4 + len {
                            break;
                        }
                    }
                }
                requests.push(String::from_utf8_lossy(&buf).to_string());
                let reply = format!(
                    "HTTP/1.1 {} X\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                    status,
                    body.len(),
                    body
                );
                sock.write_all(reply.as_bytes()).await.unwrap();
                sock.shutdown().await.unwrap();
            }
            requests
        });
        (format!("http://{}", addr), handle)
    }

    fn http_config(base_url: String) -> HttpEmbeddingConfig {
        HttpEmbeddingConfig {
            base_url,
            api_key: "test-key".to_string(),
            model: "test-model".to_string(),
            timeout_secs: 5.0,
            batch_size: 256,
            max_retries: 0,
        }
    }

    #[tokio::test]
    async fn test_tfidf_provider_shapes() {
        let provider = TfidfEmbedding::default();
        let vectors = provider
            .embed(&texts(&["refund slow", "refund please", ""]))
            .await
            .unwrap();
        assert_eq!(vectors.len(), 3);
        assert!(vectors.iter().all(|v| v.len() == vectors[0].len()));
        assert_eq!(provider.name(), "tfidf");
    }

    #[tokio::test]
    async fn test_create_provider_from_config() {
        let config = EmbeddingConfig::default();
        let provider = create_provider(&config).unwrap();
        assert_eq!(provider.name(), "tfidf");

        let mut config = EmbeddingConfig::default();
        config.provider = EmbeddingProviderKind::Http;
        config.http.api_key = "key".to_string();
        let provider = create_provider(&config).unwrap();
        assert_eq!(provider.name(), "http");
    }

    #[test]
    fn test_parse_response_orders_by_index() {
        let body = r#"{"data":[{"index":1,"embedding":[0.0,1.0]},{"index":0,"embedding":[1.0,0.0]}]}"#;
        let vectors = parse_embedding_response(body, 2).unwrap();
        assert_eq!(vectors[0], vec![1.0, 0.0]);
        assert_eq!(vectors[1], vec![0.0, 1.0]);
    }

    #[test]
    fn test_parse_response_rejects_bad_indices() {
        let bodies = [
            // duplicate
            r#"{"data":[{"index":0,"embedding":[1.0]},{"index":0,"embedding":[2.0]}]}"#,
            // out of range
            r#"{"data":[{"index":0,"embedding":[1.0]},{"index":5,"embedding":[2.0]}]}"#,
            // partially indexed
            r#"{"data":[{"index":1,"embedding":[1.0]},{"embedding":[2.0]}]}"#,
        ];
        for body in bodies {
            let err = parse_embedding_response(body, 2).unwrap_err();
            assert!(matches!(err, EmbeddingError::MalformedResponse(_)), "{}", body);
        }

        let unindexed = r#"{"data":[{"embedding":[1.0]},{"embedding":[2.0]}]}"#;
        let vectors = parse_embedding_response(unindexed, 2).unwrap();
        assert_eq!(vectors, vec![vec![1.0], vec![2.0]]);
    }

    #[test]
    fn test_parse_response_count_mismatch() {
        let body = r#"{"data":[{"embedding":[1.0]}]}"#;
        let err = parse_embedding_response(body, 2).unwrap_err();
        assert!(matches!(err, EmbeddingError::MalformedResponse(_)));
    }

    #[test]
    fn test_parse_response_garbage() {
        let err = parse_embedding_response("not json", 1).unwrap_err();
        assert!(matches!(err, EmbeddingError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn test_http_embed_normalizes_and_fills_empty() {
        let body = r#"{"data":[{"index":0,"embedding":[3.0,4.0]},{"index":1,"embedding":[0.0,2.0]}]}"#;
        let (base, server) = serve(vec![(200, body.to_string())]).await;
        let provider = HttpEmbedding::new(&http_config(base)).unwrap();

        let vectors = provider
            .embed(&texts(&["first", "   ", "second"]))
            .await
            .unwrap();
        assert_eq!(vectors.len(), 3);
        assert!((vectors[0][0] - 0.6).abs() < 1e-6);
        assert_eq!(vectors[1], vec![0.0, 0.0]);
        assert!((vectors[2][1] - 1.0).abs() < 1e-6);

        let requests = server.await.unwrap();
        assert!(requests[0].starts_with("POST /v1/embeddings"));
        assert!(requests[0].to_lowercase().contains("authorization: bearer test-key"));
        assert!(requests[0].contains("\"input\":[\"first\",\"second\"]"));
    }

    #[tokio::test]
    async fn test_http_embed_batches() {
        let first = r#"{"data":[{"embedding":[1.0,0.0]},{"embedding":[1.0,0.0]}]}"#;
        let second = r#"{"data":[{"embedding":[0.0,1.0]}]}"#;
        let (base, server) =
            serve(vec![(200, first.to_string()), (200, second.to_string())]).await;
        let mut config = http_config(base);
        config.batch_size = 2;
        let provider = HttpEmbedding::new(&config).unwrap();

        let vectors = provider.embed(&texts(&["a1", "b2", "c3"])).await.unwrap();
        assert_eq!(vectors.len(), 3);
        assert_eq!(vectors[2], vec![0.0, 1.0]);
        assert_eq!(server.await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_http_embed_status_error() {
        let (base, _server) = serve(vec![(500, "{}".to_string())]).await;
        let provider = HttpEmbedding::new(&http_config(base)).unwrap();
        let err = provider.embed(&texts(&["x"])).await.unwrap_err();
        assert!(matches!(err, EmbeddingError::Status { status: 500, .. }));
    }

    #[tokio::test]
    async fn test_http_embed_retries_then_succeeds() {
        let ok = r#"{"data":[{"embedding":[1.0]}]}"#;
        let (base, server) =
            serve(vec![(503, "{}".to_string()), (200, ok.to_string())]).await;
        let mut config = http_config(base);
        config.max_retries = 1;
        let provider = HttpEmbedding::new(&config).unwrap();
        let vectors = provider.embed(&texts(&["x"])).await.unwrap();
        assert_eq!(vectors, vec![vec![1.0]]);
        assert_eq!(server.await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_http_embed_dimension_mismatch() {
        let body = r#"{"data":[{"embedding":[1.0]},{"embedding":[1.0,0.0]}]}"#;
        let (base, _server) = serve(vec![(200, body.to_string())]).await;
        let provider = HttpEmbedding::new(&http_config(base)).unwrap();
        let err = provider.embed(&texts(&["x", "y"])).await.unwrap_err();
        assert!(matches!(err, EmbeddingError::DimensionMismatch { .. }));
    }

    #[tokio::test]
    async fn test_http_embed_timeout() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let _server = tokio::spawn(async move {
            let (_sock, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(5)).await;
        });
        let mut config = http_config(format!("http://{}", addr));
        config.timeout_secs = 0.1;
        let provider = HttpEmbedding::new(&config).unwrap();
        let err = provider.embed(&texts(&["x"])).await.unwrap_err();
        assert!(matches!(err, EmbeddingError::Timeout(_)));
    }

    #[tokio::test]
    async fn test_http_all_empty_makes_no_calls() {
        let provider = HttpEmbedding::new(&http_config("http://127.0.0.1:9".to_string())).unwrap();
        let vectors = provider.embed(&texts(&["", " "])).await.unwrap();
        assert_eq!(vectors, vec![Vec::<f32>::new(), Vec::new()]);
    }
}
