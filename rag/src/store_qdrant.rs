use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::{RagError, Result};
use crate::http::{HttpClient, HttpError};
use crate::index_store::{DocumentMetadata, IndexStore, IndexedDocument, Partition, RetrievedChunk};

const SCROLL_PAGE: usize = 256;

#[derive(Serialize)]
struct CreateCollection<'a> {
    vectors: VectorParams<'a>,
}

#[derive(Serialize)]
struct VectorParams<'a> {
    size: usize,
    distance: &'a str,
}

#[derive(Serialize, Deserialize, Clone)]
pub struct PointPayload {
    pub chunk_id: String,
    pub text: String,
    pub source: String,
    pub chunk_index: usize,
}

#[derive(Serialize)]
pub struct Point {
    pub id: u64,
    pub vector: Vec<f32>,
    pub payload: PointPayload,
}

#[derive(Serialize)]
struct UpsertPoints<'a> {
    points: &'a [Point],
}

#[derive(Serialize)]
struct DeletePoints<'a> {
    points: &'a [Value],
}

#[derive(Serialize)]
struct ScrollRequest<'a> {
    limit: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    offset: Option<&'a Value>,
    with_payload: bool,
    with_vector: bool,
}

#[derive(Serialize)]
struct QueryRequest<'a> {
    query: &'a [f32],
    limit: usize,
    with_payload: bool,
}

#[derive(Serialize)]
struct CountRequest {
    exact: bool,
}

#[derive(Deserialize)]
struct QdrantResponse<T> {
    result: Option<T>,
}

#[derive(Deserialize)]
struct CollectionInfo {
    config: CollectionConfig,
}

#[derive(Deserialize)]
struct CollectionConfig {
    params: CollectionParams,
}

#[derive(Deserialize)]
struct CollectionParams {
    vectors: Value,
}

#[derive(Deserialize)]
struct ScrollResult {
    points: Vec<PointId>,
    next_page_offset: Option<Value>,
}

#[derive(Deserialize)]
struct PointId {
    id: Value,
}

#[derive(Deserialize)]
struct QueryResult {
    points: Vec<Hit>,
}

#[derive(Deserialize)]
struct Hit {
    score: f32,
    payload: Option<PointPayload>,
}

#[derive(Deserialize)]
struct CountResult {
    count: usize,
}

/// Qdrant-backed index with one collection per partition
/// (`<prefix>_<partition>`).
pub struct QdrantStore {
    http: HttpClient,
    base_url: String,
    prefix: String,
    distance: String,
    rebuild_locks: [Mutex<()>; 2],
}

impl QdrantStore {
    pub fn new(http: HttpClient, base_url: &str, prefix: &str, distance: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            prefix: prefix.to_string(),
            distance: distance.to_string(),
            rebuild_locks: Default::default(),
        }
    }

    pub fn collection_name(&self, partition: Partition) -> String {
        format!("{}_{}", self.prefix, partition.as_str())
    }

    fn collection_url(&self, partition: Partition) -> String {
        format!("{}/collections/{}", self.base_url, self.collection_name(partition))
    }

    fn collection_state(&self, partition: Partition) -> Result<CollectionState> {
        match self
            .http
            .get_json::<QdrantResponse<CollectionInfo>>(&self.collection_url(partition))
        {
            Ok(res) => Ok(state_from_info(res.result)),
            Err(err) if err.is_not_found() => Ok(CollectionState::Missing),
            Err(err) => Err(unavailable(err)),
        }
    }

    fn create_collection(&self, partition: Partition, size: usize) -> Result<()> {
        let body = CreateCollection {
            vectors: VectorParams {
                size,
                distance: &self.distance,
            },
        };
        self.http
            .put_json::<Value, _>(&self.collection_url(partition), &body)
            .map_err(unavailable)?;
        Ok(())
    }

    fn drop_collection(&self, partition: Partition) -> Result<()> {
        self.http
            .delete_json::<Value>(&self.collection_url(partition))
            .map_err(unavailable)?;
        Ok(())
    }

    fn existing_ids(&self, partition: Partition) -> Result<Vec<Value>> {
        let url = format!("{}/points/scroll", self.collection_url(partition));
        collect_ids(|offset| {
            let req = ScrollRequest {
                limit: SCROLL_PAGE,
                offset,
                with_payload: false,
                with_vector: false,
            };
            let res = self
                .http
                .post_json::<QdrantResponse<ScrollResult>, _>(&url, &req)
                .map_err(unavailable)?;
            Ok(res.result)
        })
    }

    fn delete_ids(&self, partition: Partition, ids: &[Value]) -> Result<()> {
        if ids.is_empty() {
            return Ok(());
        }
        let url = format!("{}/points/delete?wait=true", self.collection_url(partition));
        self.http
            .post_json::<Value, _>(&url, &DeletePoints { points: ids })
            .map_err(unavailable)?;
        Ok(())
    }

    fn store_points(&self, partition: Partition, points: &[Point]) -> Result<()> {
        if points.is_empty() {
            return Ok(());
        }
        let url = format!("{}/points?wait=true", self.collection_url(partition));
        self.http
            .put_json::<Value, _>(&url, &UpsertPoints { points })
            .map_err(unavailable)?;
        Ok(())
    }
}

impl IndexStore for QdrantStore {
    fn rebuild(&self, partition: Partition, documents: Vec<IndexedDocument>) -> Result<()> {
        let _guard = self.rebuild_locks[partition.slot()].lock();
        let collection = self.collection_name(partition);

        let new_size = documents.first().map(|d| d.vector.len());
        if let Some(expected) = new_size {
            if let Some(bad) = documents.iter().find(|d| d.vector.len() != expected) {
                return Err(RagError::DimensionMismatch {
                    expected,
                    actual: bad.vector.len(),
                });
            }
        }

        match plan_rebuild(self.collection_state(partition)?, new_size) {
            RebuildPlan::Recreate { old, new } => {
                info!(%collection, old, new, "embedding dimension changed; recreating collection");
                self.drop_collection(partition)?;
                self.create_collection(partition, new)?;
            }
            RebuildPlan::ClearExisting => {
                let ids = self.existing_ids(partition)?;
                debug!(%collection, count = ids.len(), "deleting previous generation");
                self.delete_ids(partition, &ids)?;
            }
            RebuildPlan::Create(size) => self.create_collection(partition, size)?,
            RebuildPlan::Nothing => return Ok(()),
        }

        let points: Vec<Point> = documents
            .into_iter()
            .map(|doc| Point {
                id: doc.metadata.chunk_index as u64,
                vector: doc.vector,
                payload: PointPayload {
                    chunk_id: doc.id,
                    text: doc.text,
                    source: doc.metadata.source,
                    chunk_index: doc.metadata.chunk_index,
                },
            })
            .collect();
        if let Err(err) = self.store_points(partition, &points) {
            warn!(%collection, error = %err, "insert failed after delete; partition left empty until the next rebuild");
            return Err(err);
        }
        Ok(())
    }

    fn query(&self, partition: Partition, vector: &[f32], top_n: usize) -> Result<Vec<RetrievedChunk>> {
        if vector.is_empty() || top_n == 0 {
            return Ok(vec![]);
        }
        let url = format!("{}/points/query", self.collection_url(partition));
        let req = QueryRequest {
            query: vector,
            limit: top_n,
            with_payload: true,
        };
        let res = match self.http.post_json::<QdrantResponse<QueryResult>, _>(&url, &req) {
            Ok(res) => res,
            Err(err) if err.is_not_found() => return Ok(vec![]),
            Err(err) => return Err(unavailable(err)),
        };

        let mut hits: Vec<RetrievedChunk> = res
            .result
            .map(|r| r.points)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|hit| {
                let payload = hit.payload?;
                Some(RetrievedChunk {
                    text: payload.text,
                    distance: score_to_distance(&self.distance, hit.score),
                    metadata: DocumentMetadata {
                        source: payload.source,
                        chunk_index: payload.chunk_index,
                    },
                })
            })
            .collect();
        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        Ok(hits)
    }

    fn count(&self, partition: Partition) -> Result<usize> {
        let url = format!("{}/points/count", self.collection_url(partition));
        match self
            .http
            .post_json::<QdrantResponse<CountResult>, _>(&url, &CountRequest { exact: true })
        {
            Ok(res) => Ok(res.result.map(|r| r.count).unwrap_or(0)),
            Err(err) if err.is_not_found() => Ok(0),
            Err(err) => Err(unavailable(err)),
        }
    }
}

fn unavailable(err: HttpError) -> RagError {
    RagError::IndexUnavailable(err.to_string())
}

/// What a partition's collection looks like before a rebuild.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum CollectionState {
    Missing,
    Sized(usize),
    /// Exists, but has no single unnamed vector size (e.g. named vectors).
    Unsized,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum RebuildPlan {
    Recreate { old: usize, new: usize },
    ClearExisting,
    Create(usize),
    Nothing,
}

fn state_from_info(info: Option<CollectionInfo>) -> CollectionState {
    info.and_then(|info| info.config.params.vectors.get("size").and_then(Value::as_u64))
        .map(|size| CollectionState::Sized(size as usize))
        .unwrap_or(CollectionState::Unsized)
}

fn plan_rebuild(state: CollectionState, new_size: Option<usize>) -> RebuildPlan {
    match (state, new_size) {
        (CollectionState::Sized(old), Some(new)) if old != new => RebuildPlan::Recreate { old, new },
        (CollectionState::Sized(_) | CollectionState::Unsized, _) => RebuildPlan::ClearExisting,
        (CollectionState::Missing, Some(new)) => RebuildPlan::Create(new),
        (CollectionState::Missing, None) => RebuildPlan::Nothing,
    }
}

/// Qdrant reports similarity for Cosine and Dot; flip those so lower is
/// always closer.
fn score_to_distance(metric: &str, score: f32) -> f32 {
    match metric.to_ascii_lowercase().as_str() {
        "cosine" => 1.0 - score,
        "dot" => -score,
        _ => score,
    }
}

fn collect_ids<F>(mut fetch_page: F) -> Result<Vec<Value>>
where
    F: FnMut(Option<&Value>) -> Result<Option<ScrollResult>>,
{
    let mut ids = Vec::new();
    let mut offset: Option<Value> = None;
    loop {
        let Some(page) = fetch_page(offset.as_ref())? else { break };
        ids.extend(page.points.into_iter().map(|p| p.id));
        match page.next_page_offset {
            Some(next) if !next.is_null() => offset = Some(next),
            _ => break,
        }
    }
    Ok(ids)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn info(value: Value) -> Option<CollectionInfo> {
        serde_json::from_value::<QdrantResponse<CollectionInfo>>(value)
            .expect("collection info")
            .result
    }

    #[test]
    fn distances_sort_closest_first_for_every_metric() {
        for metric in ["Cosine", "Dot", "Euclid", "Manhattan"] {
            let (near, far) = match metric {
                "Cosine" | "Dot" => (score_to_distance(metric, 0.9), score_to_distance(metric, 0.2)),
                _ => (score_to_distance(metric, 0.2), score_to_distance(metric, 0.9)),
            };
            assert!(near < far, "{}: {} !< {}", metric, near, far);
        }
        assert!((score_to_distance("cosine", 1.0)).abs() < f32::EPSILON);
        assert_eq!(score_to_distance("Dot", 3.0), -3.0);
        assert_eq!(score_to_distance("Euclid", 1.5), 1.5);
    }

    #[test]
    fn collection_shape_is_read_from_info() {
        let sized = info(json!({"result": {"config": {"params": {"vectors": {"size": 768, "distance": "Cosine"}}}}}));
        assert_eq!(state_from_info(sized), CollectionState::Sized(768));

        let named = info(json!({"result": {"config": {"params": {"vectors": {"dense": {"size": 768, "distance": "Cosine"}}}}}}));
        assert_eq!(state_from_info(named), CollectionState::Unsized);

        assert_eq!(state_from_info(None), CollectionState::Unsized);
    }

    #[test]
    fn rebuild_plan_covers_every_collection_state() {
        assert_eq!(
            plan_rebuild(CollectionState::Sized(384), Some(768)),
            RebuildPlan::Recreate { old: 384, new: 768 }
        );
        assert_eq!(plan_rebuild(CollectionState::Sized(768), Some(768)), RebuildPlan::ClearExisting);
        assert_eq!(plan_rebuild(CollectionState::Sized(768), None), RebuildPlan::ClearExisting);
        assert_eq!(plan_rebuild(CollectionState::Missing, Some(768)), RebuildPlan::Create(768));
        assert_eq!(plan_rebuild(CollectionState::Missing, None), RebuildPlan::Nothing);
    }

    #[test]
    fn collection_of_unknown_shape_is_cleared_not_skipped() {
        assert_eq!(plan_rebuild(CollectionState::Unsized, None), RebuildPlan::ClearExisting);
        assert_eq!(plan_rebuild(CollectionState::Unsized, Some(768)), RebuildPlan::ClearExisting);
    }

    #[test]
    fn scroll_follows_page_offsets_until_exhausted() {
        let pages = vec![
            json!({"points": [{"id": 0}, {"id": 1}], "next_page_offset": 2}),
            json!({"points": [{"id": 2}, {"id": 3}], "next_page_offset": 4}),
            json!({"points": [{"id": 4}], "next_page_offset": null}),
        ];
        let mut seen_offsets = Vec::new();
        let mut remaining = pages.into_iter();

        let ids = collect_ids(|offset| {
            seen_offsets.push(offset.cloned());
            Ok(remaining
                .next()
                .map(|page| serde_json::from_value::<ScrollResult>(page).expect("scroll page")))
        })
        .expect("collect");

        assert_eq!(ids, vec![json!(0), json!(1), json!(2), json!(3), json!(4)]);
        assert_eq!(seen_offsets, vec![None, Some(json!(2)), Some(json!(4))]);
    }

    #[test]
    fn scroll_stops_on_missing_result_and_propagates_errors() {
        let ids = collect_ids(|_| Ok(None)).expect("collect");
        assert!(ids.is_empty());

        let err = collect_ids(|_| Err(RagError::IndexUnavailable("connection refused".to_string())))
            .expect_err("scroll failure");
        assert!(matches!(err, RagError::IndexUnavailable(_)));
    }
}
