mod build_prompt;
mod chunk_text;
mod classify;
mod config;
mod embed_chunks;
mod error;
mod generate;
mod http;
mod index_store;
mod locale;
mod retrieve_chunks;
mod scan_files;
mod store_memory;
mod store_qdrant;

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

pub use build_prompt::{build_messages, system_prompt, template, Message, CONTEXT_PLACEHOLDER};
pub use chunk_text::{chunk_text, Chunk, Chunker, DEFAULT_CHUNK_OVERLAP_WORDS, DEFAULT_CHUNK_SIZE_WORDS};
pub use classify::{sentinels, AnswerStatus, ClassifiedAnswer, Classifier, SentinelTable};
pub use config::Config;
pub use embed_chunks::{Embedder, OllamaEmbedder, OpenAiEmbedder};
pub use error::{RagError, Result};
pub use generate::{ChatModel, OllamaChat, OpenAiChat, SamplingOptions};
pub use http::{HttpClient, HttpError};
pub use index_store::{DocumentMetadata, IndexStore, IndexedDocument, Partition, RetrievedChunk};
pub use locale::{detect, CannedMessages, Locale};
pub use retrieve_chunks::{format_context, Retriever, CONTEXT_SEPARATOR};
pub use scan_files::{load_paragraphs, split_paragraphs};
pub use store_memory::{cosine_distance, MemoryStore};
pub use store_qdrant::QdrantStore;

/// Result of one question: what was detected, what was retrieved and what
/// should be shown.
#[derive(Clone, Debug)]
pub struct QueryOutcome {
    pub locale: Locale,
    pub partition: Partition,
    pub context: String,
    pub answer: ClassifiedAnswer,
}

pub struct Pipeline {
    cfg: Config,
    chunker: Chunker,
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn IndexStore>,
    chat: Arc<dyn ChatModel>,
    retriever: Retriever,
    classifier: Classifier,
}

impl Pipeline {
    pub fn new(
        cfg: Config,
        embedder: Arc<dyn Embedder>,
        store: Arc<dyn IndexStore>,
        chat: Arc<dyn ChatModel>,
    ) -> Self {
        let chunker = Chunker::new(cfg.chunk_size, cfg.chunk_overlap);
        let retriever = Retriever::new(embedder.clone(), store.clone());
        let classifier = Classifier::new(&cfg.contact);
        Self {
            cfg,
            chunker,
            embedder,
            store,
            chat,
            retriever,
            classifier,
        }
    }

    /// Wires the HTTP-backed embedder, chat model and store named by `cfg`.
    pub fn from_config(cfg: Config) -> Result<Self> {
        let timeout = Duration::from_secs(cfg.http_timeout_secs);
        let http_err = |e: HttpError| RagError::InvalidConfig(e.to_string());

        let (embedder, chat): (Arc<dyn Embedder>, Arc<dyn ChatModel>) = match cfg.provider.as_str() {
            "ollama" => {
                let http = HttpClient::new(timeout, None).map_err(http_err)?;
                (
                    Arc::new(OllamaEmbedder::new(http.clone(), &cfg.ollama_url, &cfg.ollama_embed_model)),
                    Arc::new(OllamaChat::new(http, &cfg.ollama_url, &cfg.ollama_chat_model, sampling(&cfg))),
                )
            }
            "openai" => {
                if cfg.openai_api_key.is_empty() {
                    return Err(RagError::InvalidConfig("OPENAI_API_KEY is not set".to_string()));
                }
                let http = HttpClient::new(timeout, Some(cfg.openai_api_key.clone())).map_err(http_err)?;
                (
                    Arc::new(OpenAiEmbedder::new(http.clone(), &cfg.openai_url, &cfg.openai_embed_model)),
                    Arc::new(OpenAiChat::new(http, &cfg.openai_url, &cfg.openai_chat_model, sampling(&cfg))),
                )
            }
            other => return Err(RagError::InvalidConfig(format!("unknown provider `{}`", other))),
        };

        let store: Arc<dyn IndexStore> = match cfg.store.as_str() {
            "qdrant" => {
                let http = HttpClient::new(timeout, None).map_err(http_err)?;
                Arc::new(QdrantStore::new(http, &cfg.qdrant_url, &cfg.collection, &cfg.distance))
            }
            "memory" => Arc::new(MemoryStore::new()),
            other => return Err(RagError::InvalidConfig(format!("unknown store `{}`", other))),
        };

        Ok(Self::new(cfg, embedder, store, chat))
    }

    pub fn config(&self) -> &Config {
        &self.cfg
    }

    pub fn retriever(&self) -> &Retriever {
        &self.retriever
    }

    pub fn store(&self) -> &Arc<dyn IndexStore> {
        &self.store
    }

    /// Chunks, embeds and fully replaces `partition` with `paragraphs`.
    ///
    /// If the insert fails after the old generation was deleted, the
    /// partition stays empty until the next successful rebuild.
    pub fn index_partition(&self, partition: Partition, paragraphs: &[String], source: &str) -> Result<usize> {
        let chunks = self.chunker.process(&paragraphs.join("\n"), source);
        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let vectors = self.embedder.embed_batch(&texts)?;
        if vectors.len() != texts.len() {
            return Err(RagError::EmbeddingService(format!(
                "expected {} embeddings, got {}",
                texts.len(),
                vectors.len()
            )));
        }

        let documents: Vec<IndexedDocument> = chunks
            .into_iter()
            .zip(vectors)
            .map(|(chunk, vector)| IndexedDocument {
                id: chunk.id,
                vector,
                text: chunk.text,
                metadata: DocumentMetadata {
                    source: chunk.source,
                    chunk_index: chunk.source_index,
                },
            })
            .collect();
        let count = documents.len();
        if count == 0 {
            warn!(partition = %partition, source, "no chunks produced; partition will be emptied");
        }
        self.store.rebuild(partition, documents)?;
        info!(partition = %partition, source, count, "partition rebuilt");
        Ok(count)
    }

    /// Rebuilds every partition whose configured source exists.
    pub fn index_from_config(&self) -> Result<Vec<(Partition, usize)>> {
        let mut indexed = Vec::new();
        for partition in Partition::ALL {
            let source = match partition {
                Partition::Uz => &self.cfg.source_uz,
                Partition::Ru => &self.cfg.source_ru,
            };
            if !std::path::Path::new(source).exists() {
                warn!(partition = %partition, source = %source, "source missing; partition left untouched");
                continue;
            }
            let paragraphs = load_paragraphs(source, &self.cfg)?;
            let count = self.index_partition(partition, &paragraphs, source)?;
            indexed.push((partition, count));
        }
        Ok(indexed)
    }

    pub fn answer_query(&self, question: &str) -> Result<QueryOutcome> {
        let locale = detect(question);
        let partition = locale.partition();
        let context = self.retriever.get_context(question, partition, self.cfg.top_k)?;

        let canned = locale.messages(&self.cfg.contact);
        let messages = build_messages(locale, &context, &canned.no_context, question);
        let raw = self.chat.complete(&messages)?;
        let answer = self.classifier.classify(&raw, locale);

        info!(locale = %locale, partition = %partition, status = %answer.status, "question answered");
        Ok(QueryOutcome {
            locale,
            partition,
            context,
            answer,
        })
    }

    /// Like [`Pipeline::answer_query`], but infrastructure failures become an
    /// [`AnswerStatus::Error`] outcome carrying the technical-failure message
    /// rather than an error.
    pub fn respond(&self, question: &str) -> QueryOutcome {
        match self.answer_query(question) {
            Ok(outcome) => outcome,
            Err(err) => {
                let locale = detect(question);
                warn!(locale = %locale, error = %err, "query path failed");
                QueryOutcome {
                    locale,
                    partition: locale.partition(),
                    context: String::new(),
                    answer: self.classifier.technical_failure(locale),
                }
            }
        }
    }
}

fn sampling(cfg: &Config) -> SamplingOptions {
    SamplingOptions {
        temperature: cfg.temperature,
        max_tokens: cfg.max_tokens,
    }
}
