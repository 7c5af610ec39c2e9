use std::cmp::Ordering;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tracing::debug;

use crate::error::{RagError, Result};
use crate::index_store::{IndexStore, IndexedDocument, Partition, RetrievedChunk};

type Generation = Arc<Vec<IndexedDocument>>;

/// In-process index. Each partition holds an immutable generation that a
/// rebuild swaps in one step; queries clone the `Arc` and search outside the
/// lock.
#[derive(Default)]
pub struct MemoryStore {
    generations: [RwLock<Generation>; 2],
    rebuild_locks: [Mutex<()>; 2],
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn generation(&self, partition: Partition) -> Generation {
        self.generations[partition.slot()].read().clone()
    }
}

impl IndexStore for MemoryStore {
    fn rebuild(&self, partition: Partition, documents: Vec<IndexedDocument>) -> Result<()> {
        let _guard = self.rebuild_locks[partition.slot()].lock();

        if let Some(first) = documents.first() {
            let expected = first.vector.len();
            if let Some(bad) = documents.iter().find(|d| d.vector.len() != expected) {
                return Err(RagError::DimensionMismatch {
                    expected,
                    actual: bad.vector.len(),
                });
            }
        }

        let count = documents.len();
        *self.generations[partition.slot()].write() = Arc::new(documents);
        debug!(partition = %partition, count, "memory partition swapped");
        Ok(())
    }

    fn query(&self, partition: Partition, vector: &[f32], top_n: usize) -> Result<Vec<RetrievedChunk>> {
        let docs = self.generation(partition);
        if docs.is_empty() || top_n == 0 {
            return Ok(vec![]);
        }
        let expected = docs[0].vector.len();
        if vector.len() != expected {
            return Err(RagError::DimensionMismatch {
                expected,
                actual: vector.len(),
            });
        }

        let mut hits: Vec<RetrievedChunk> = docs
            .iter()
            .map(|doc| RetrievedChunk {
                text: doc.text.clone(),
                distance: cosine_distance(vector, &doc.vector),
                metadata: doc.metadata.clone(),
            })
            .collect();
        hits.sort_by(|a, b| {
            a.distance
                .partial_cmp(&b.distance)
                .unwrap_or(Ordering::Equal)
                .then(a.metadata.chunk_index.cmp(&b.metadata.chunk_index))
        });
        hits.truncate(top_n);
        Ok(hits)
    }

    fn count(&self, partition: Partition) -> Result<usize> {
        Ok(self.generation(partition).len())
    }
}

/// `1 - cos(a, b)`; zero vectors are maximally distant.
pub fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 1.0;
    }
    1.0 - dot / (norm_a.sqrt() * norm_b.sqrt())
}
