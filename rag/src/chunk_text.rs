use serde::{Deserialize, Serialize};

pub const DEFAULT_CHUNK_SIZE_WORDS: usize = 500;
pub const DEFAULT_CHUNK_OVERLAP_WORDS: usize = 100;

/// A bounded segment of source text ready for embedding.
///
/// `id` is sequential (`chunk_<i>`) and only stable within one indexing run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub id: String,
    pub text: String,
    pub source: String,
    pub source_index: usize,
}

#[derive(Clone, Copy, Debug)]
pub struct Chunker {
    pub chunk_size: usize,
    pub overlap: usize,
}

impl Default for Chunker {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE_WORDS,
            overlap: DEFAULT_CHUNK_OVERLAP_WORDS,
        }
    }
}

impl Chunker {
    pub fn new(chunk_size: usize, overlap: usize) -> Self {
        Self { chunk_size, overlap }
    }

    pub fn chunk(&self, text: &str) -> Vec<String> {
        chunk_text(text, self.chunk_size, self.overlap)
    }

    pub fn process(&self, text: &str, source: &str) -> Vec<Chunk> {
        self.chunk(text)
            .into_iter()
            .enumerate()
            .map(|(i, text)| Chunk {
                id: format!("chunk_{}", i),
                text,
                source: source.to_string(),
                source_index: i,
            })
            .collect()
    }
}

/// Splits `text` into paragraph-aligned chunks of at most `size` words.
///
/// Paragraphs are the non-empty trimmed lines of `text`. A paragraph longer
/// than `size` is cut into sliding word windows, one starting at every
/// multiple of `size - overlap`, so the tail windows may be short.
/// Otherwise paragraphs accumulate until the next one would overflow; the new
/// chunk then starts with the trailing words of the flushed one.
pub fn chunk_text(text: &str, size: usize, overlap: usize) -> Vec<String> {
    let paragraphs: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect();
    if paragraphs.is_empty() {
        return vec![];
    }

    if size == 0 {
        return vec![paragraphs.join(" ")];
    }
    let overlap = if overlap >= size { size / 4 } else { overlap };
    let stride = size - overlap;

    let mut chunks = Vec::new();
    let mut current: Vec<String> = Vec::new();
    let mut current_len = 0usize;

    for para in paragraphs {
        let words: Vec<&str> = para.split_whitespace().collect();
        let para_len = words.len();

        if para_len > size {
            if !current.is_empty() {
                chunks.push(current.join(" "));
                current.clear();
                current_len = 0;
            }
            for start in (0..para_len).step_by(stride) {
                let end = (start + size).min(para_len);
                chunks.push(words[start..end].join(" "));
            }
        } else if current_len + para_len > size {
            let finished = current.join(" ");
            // Carry-over never pushes the seeded chunk past `size`.
            let carry = overlap.min(size - para_len);
            let tail = last_words(&finished, carry);
            chunks.push(finished);

            current.clear();
            current_len = 0;
            if !tail.is_empty() {
                current_len = tail.split_whitespace().count();
                current.push(tail);
            }
            current.push(para.to_string());
            current_len += para_len;
        } else {
            current.push(para.to_string());
            current_len += para_len;
        }
    }

    if !current.is_empty() {
        chunks.push(current.join(" "));
    }

    chunks
}

fn last_words(text: &str, n: usize) -> String {
    if n == 0 {
        return String::new();
    }
    let words: Vec<&str> = text.split_whitespace().collect();
    let start = words.len().saturating_sub(n);
    words[start..].join(" ")
}
