use std::sync::Arc;

use tracing::debug;

use crate::embed_chunks::Embedder;
use crate::error::Result;
use crate::index_store::{IndexStore, Partition, RetrievedChunk};

pub const CONTEXT_SEPARATOR: &str = "\n\n---\n\n";

/// Embeds a query and fetches its nearest chunks from one partition.
#[derive(Clone)]
pub struct Retriever {
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn IndexStore>,
}

impl Retriever {
    pub fn new(embedder: Arc<dyn Embedder>, store: Arc<dyn IndexStore>) -> Self {
        Self { embedder, store }
    }

    pub fn search(&self, query: &str, partition: Partition, n_results: usize) -> Result<Vec<RetrievedChunk>> {
        let vector = self.embedder.embed_one(query)?;
        let hits = self.store.query(partition, &vector, n_results)?;
        debug!(partition = %partition, hits = hits.len(), "retrieved chunks");
        Ok(hits)
    }

    /// Retrieved texts joined closest-first with [`CONTEXT_SEPARATOR`];
    /// empty when the partition has nothing to return.
    pub fn get_context(&self, query: &str, partition: Partition, n_results: usize) -> Result<String> {
        let hits = self.search(query, partition, n_results)?;
        Ok(format_context(&hits))
    }
}

pub fn format_context(hits: &[RetrievedChunk]) -> String {
    hits.iter()
        .map(|h| h.text.as_str())
        .collect::<Vec<_>>()
        .join(CONTEXT_SEPARATOR)
}
