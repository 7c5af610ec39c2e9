use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Per-language partition of the index. Partitions never share documents.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Partition {
    Uz,
    Ru,
}

impl Partition {
    pub const ALL: [Partition; 2] = [Partition::Uz, Partition::Ru];

    pub fn as_str(self) -> &'static str {
        match self {
            Partition::Uz => "uz",
            Partition::Ru => "ru",
        }
    }

    pub(crate) fn slot(self) -> usize {
        match self {
            Partition::Uz => 0,
            Partition::Ru => 1,
        }
    }
}

impl fmt::Display for Partition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub source: String,
    pub chunk_index: usize,
}

#[derive(Clone, Debug, PartialEq)]
pub struct IndexedDocument {
    pub id: String,
    pub vector: Vec<f32>,
    pub text: String,
    pub metadata: DocumentMetadata,
}

/// One hit of a nearest-neighbour query. Lower `distance` is closer.
#[derive(Clone, Debug, PartialEq)]
pub struct RetrievedChunk {
    pub text: String,
    pub distance: f32,
    pub metadata: DocumentMetadata,
}

/// Shared per-partition vector collection.
///
/// `rebuild` replaces the whole partition (delete everything, then insert);
/// it is never an incremental diff. Readers racing a rebuild see either the
/// previous or the new generation of that partition.
pub trait IndexStore: Send + Sync {
    fn rebuild(&self, partition: Partition, documents: Vec<IndexedDocument>) -> Result<()>;

    /// Up to `top_n` documents ordered by ascending distance. An empty or
    /// never-built partition yields an empty result.
    fn query(&self, partition: Partition, vector: &[f32], top_n: usize) -> Result<Vec<RetrievedChunk>>;

    fn count(&self, partition: Partition) -> Result<usize>;
}
