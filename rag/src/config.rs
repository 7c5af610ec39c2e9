use std::env;

use crate::chunk_text::{DEFAULT_CHUNK_OVERLAP_WORDS, DEFAULT_CHUNK_SIZE_WORDS};

#[derive(Clone, Debug)]
pub struct Config {
    pub source_uz: String,
    pub source_ru: String,
    pub source_exts: Vec<String>,
    pub max_file_bytes: u64,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub top_k: usize,
    pub store: String,
    pub qdrant_url: String,
    pub collection: String,
    pub distance: String,
    pub provider: String,
    pub ollama_url: String,
    pub ollama_embed_model: String,
    pub ollama_chat_model: String,
    pub openai_url: String,
    pub openai_api_key: String,
    pub openai_embed_model: String,
    pub openai_chat_model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub http_timeout_secs: u64,
    pub contact: String,
    pub log_dir: String,
}

impl Config {
    pub fn from_env() -> Self {
        // Load .env if present so keys and endpoints work without manual `source .env`.
        let _ = dotenvy::dotenv();
        Self {
            source_uz: var_or("RAG_SOURCE_UZ", "./rules/uz"),
            source_ru: var_or("RAG_SOURCE_RU", "./rules/ru"),
            source_exts: var_or("RAG_SOURCE_EXTS", ".txt,.md")
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            max_file_bytes: parsed_or("RAG_MAX_FILE_BYTES", 2_000_000),
            chunk_size: parsed_or("RAG_CHUNK_SIZE", DEFAULT_CHUNK_SIZE_WORDS),
            chunk_overlap: parsed_or("RAG_CHUNK_OVERLAP", DEFAULT_CHUNK_OVERLAP_WORDS),
            top_k: parsed_or("RAG_TOP_K", 5),
            store: var_or("RAG_STORE", "qdrant"),
            qdrant_url: var_or("QDRANT_URL", "http://localhost:6333"),
            collection: env::var("QDRANT_COLLECTION")
                .map(|c| sanitize_collection_name(&c))
                .unwrap_or_else(|_| "eco_rules".to_string()),
            distance: var_or("QDRANT_DISTANCE", "Cosine"),
            provider: var_or("RAG_PROVIDER", "ollama"),
            ollama_url: var_or("OLLAMA_URL", "http://localhost:11434"),
            ollama_embed_model: var_or("OLLAMA_EMBED_MODEL", "nomic-embed-text"),
            ollama_chat_model: var_or("OLLAMA_CHAT_MODEL", "qwen2.5:14b"),
            openai_url: var_or("OPENAI_URL", "https://api.openai.com/v1"),
            openai_api_key: env::var("OPENAI_API_KEY").unwrap_or_default(),
            openai_embed_model: var_or("OPENAI_EMBED_MODEL", "text-embedding-3-small"),
            openai_chat_model: var_or("OPENAI_CHAT_MODEL", "gpt-4o-mini"),
            temperature: parsed_or("RAG_TEMPERATURE", 0.2),
            max_tokens: parsed_or("RAG_MAX_TOKENS", 3000),
            http_timeout_secs: parsed_or("RAG_HTTP_TIMEOUT_SECS", 120),
            contact: var_or("RAG_CONTACT", "+998999999999"),
            log_dir: var_or("RAG_LOG_DIR", "./logs"),
        }
    }
}

impl Default for Config {
    /// Built-in defaults without reading the environment.
    fn default() -> Self {
        Self {
            source_uz: "./rules/uz".to_string(),
            source_ru: "./rules/ru".to_string(),
            source_exts: vec![".txt".to_string(), ".md".to_string()],
            max_file_bytes: 2_000_000,
            chunk_size: DEFAULT_CHUNK_SIZE_WORDS,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP_WORDS,
            top_k: 5,
            store: "memory".to_string(),
            qdrant_url: "http://localhost:6333".to_string(),
            collection: "eco_rules".to_string(),
            distance: "Cosine".to_string(),
            provider: "ollama".to_string(),
            ollama_url: "http://localhost:11434".to_string(),
            ollama_embed_model: "nomic-embed-text".to_string(),
            ollama_chat_model: "qwen2.5:14b".to_string(),
            openai_url: "https://api.openai.com/v1".to_string(),
            openai_api_key: String::new(),
            openai_embed_model: "text-embedding-3-small".to_string(),
            openai_chat_model: "gpt-4o-mini".to_string(),
            temperature: 0.2,
            max_tokens: 3000,
            http_timeout_secs: 120,
            contact: "+998999999999".to_string(),
            log_dir: "./logs".to_string(),
        }
    }
}

fn var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parsed_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn sanitize_collection_name(name: &str) -> String {
    let mut out = String::new();
    for c in name.chars() {
        if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
            out.push(c);
        } else if c.is_ascii_whitespace() || c == '.' {
            out.push('_');
        }
    }
    if out.is_empty() { "eco_rules".to_string() } else { out }
}
