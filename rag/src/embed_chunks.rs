use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{RagError, Result};
use crate::http::HttpClient;

/// Converts text into fixed-dimension vectors through an external service.
///
/// The same embedder (and model) must be used to build a partition and to
/// query it. Failures are returned as [`RagError::EmbeddingService`] and are
/// never retried here.
pub trait Embedder: Send + Sync {
    /// One vector per input text, in input order.
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    fn embed_one(&self, text: &str) -> Result<Vec<f32>> {
        let vecs = self.embed_batch(&[text.to_string()])?;
        vecs.into_iter()
            .next()
            .ok_or_else(|| RagError::EmbeddingService("empty embedding response".to_string()))
    }
}

fn ensure_count(expected: usize, vectors: Vec<Vec<f32>>) -> Result<Vec<Vec<f32>>> {
    if vectors.len() != expected {
        return Err(RagError::EmbeddingService(format!(
            "expected {} embeddings, got {}",
            expected,
            vectors.len()
        )));
    }
    Ok(vectors)
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Serialize)]
struct EmbedLegacyRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

pub struct OllamaEmbedder {
    http: HttpClient,
    base_url: String,
    model: String,
}

impl OllamaEmbedder {
    pub fn new(http: HttpClient, base_url: &str, model: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
        }
    }

    // Older servers only expose /api/embeddings, one prompt per call.
    fn embed_legacy(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let url = format!("{}/api/embeddings", self.base_url);
        let mut out = Vec::with_capacity(texts.len());
        for text in texts {
            let req = EmbedLegacyRequest {
                model: &self.model,
                prompt: text,
            };
            let res = self
                .http
                .post_json::<Value, _>(&url, &req)
                .map_err(|e| RagError::EmbeddingService(e.to_string()))?;
            out.extend(parse_embeddings(res)?);
        }
        Ok(out)
    }
}

impl Embedder for OllamaEmbedder {
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }
        let url = format!("{}/api/embed", self.base_url);
        let req = EmbedRequest {
            model: &self.model,
            input: texts,
        };
        let vectors = match self.http.post_json::<Value, _>(&url, &req) {
            Ok(res) => parse_embeddings(res)?,
            Err(err) if err.is_not_found() => self.embed_legacy(texts)?,
            Err(err) => return Err(RagError::EmbeddingService(err.to_string())),
        };
        ensure_count(texts.len(), vectors)
    }
}

fn parse_embeddings(value: Value) -> Result<Vec<Vec<f32>>> {
    if let Some(embeddings) = value.get("embeddings") {
        return parse_embeddings_value(embeddings);
    }
    if let Some(embedding) = value.get("embedding") {
        return parse_embeddings_value(embedding);
    }
    Err(RagError::EmbeddingService("no embeddings in response".to_string()))
}

fn parse_embeddings_value(value: &Value) -> Result<Vec<Vec<f32>>> {
    let arr = value
        .as_array()
        .ok_or_else(|| RagError::EmbeddingService("invalid embeddings format".to_string()))?;
    if arr.is_empty() {
        return Ok(vec![]);
    }
    if arr[0].is_array() {
        return arr.iter().map(parse_vec).collect();
    }
    Ok(vec![parse_vec(value)?])
}

fn parse_vec(value: &Value) -> Result<Vec<f32>> {
    let arr = value
        .as_array()
        .ok_or_else(|| RagError::EmbeddingService("embedding is not an array".to_string()))?;
    arr.iter()
        .map(|v| {
            v.as_f64()
                .map(|n| n as f32)
                .ok_or_else(|| RagError::EmbeddingService("embedding value is not a number".to_string()))
        })
        .collect()
}

#[derive(Deserialize)]
struct OpenAiEmbedResponse {
    data: Vec<OpenAiEmbedding>,
}

#[derive(Deserialize)]
struct OpenAiEmbedding {
    index: usize,
    embedding: Vec<f32>,
}

pub struct OpenAiEmbedder {
    http: HttpClient,
    base_url: String,
    model: String,
}

impl OpenAiEmbedder {
    /// `http` should carry the API key as its bearer token.
    pub fn new(http: HttpClient, base_url: &str, model: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
        }
    }
}

impl Embedder for OpenAiEmbedder {
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }
        let url = format!("{}/embeddings", self.base_url);
        let req = EmbedRequest {
            model: &self.model,
            input: texts,
        };
        let res = self
            .http
            .post_json::<OpenAiEmbedResponse, _>(&url, &req)
            .map_err(|e| RagError::EmbeddingService(e.to_string()))?;
        openai_vectors(texts.len(), res)
    }
}

// The API may return items out of order; `index` points back at the input.
fn openai_vectors(expected: usize, mut res: OpenAiEmbedResponse) -> Result<Vec<Vec<f32>>> {
    res.data.sort_by_key(|d| d.index);
    ensure_count(expected, res.data.into_iter().map(|d| d.embedding).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn batch_and_single_response_shapes_parse() {
        let batch = parse_embeddings(json!({"embeddings": [[0.5, 0.25], [1.5, -2.0]]})).expect("batch");
        assert_eq!(batch, vec![vec![0.5f32, 0.25], vec![1.5, -2.0]]);

        let legacy = parse_embeddings(json!({"embedding": [0.5, 0.25, 1.0]})).expect("legacy");
        assert_eq!(legacy, vec![vec![0.5f32, 0.25, 1.0]]);

        let empty = parse_embeddings(json!({"embeddings": []})).expect("empty");
        assert!(empty.is_empty());
    }

    #[test]
    fn malformed_responses_are_embedding_errors() {
        for bad in [
            json!({"error": "model not found"}),
            json!({"embeddings": "nope"}),
            json!({"embedding": [0.1, "x"]}),
        ] {
            let err = parse_embeddings(bad).expect_err("malformed response");
            assert!(matches!(err, RagError::EmbeddingService(_)));
        }
    }

    #[test]
    fn vector_count_must_match_input_count() {
        assert!(ensure_count(2, vec![vec![1.0], vec![2.0]]).is_ok());
        let err = ensure_count(3, vec![vec![1.0], vec![2.0]]).expect_err("short response");
        assert!(matches!(err, RagError::EmbeddingService(ref m) if m.contains("expected 3")));
    }

    #[test]
    fn openai_results_follow_input_order() {
        let res: OpenAiEmbedResponse = serde_json::from_value(json!({
            "data": [
                {"index": 2, "embedding": [2.0]},
                {"index": 0, "embedding": [0.0]},
                {"index": 1, "embedding": [1.0]}
            ]
        }))
        .expect("response");
        let vectors = openai_vectors(3, res).expect("vectors");
        assert_eq!(vectors, vec![vec![0.0f32], vec![1.0], vec![2.0]]);
    }

    #[test]
    fn openai_short_response_is_rejected() {
        let res: OpenAiEmbedResponse =
            serde_json::from_value(json!({"data": [{"index": 0, "embedding": [0.0]}]})).expect("response");
        assert!(openai_vectors(2, res).is_err());
    }
}
