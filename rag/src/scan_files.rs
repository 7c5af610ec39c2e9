use std::fs;
use std::path::Path;

use tracing::warn;
use walkdir::WalkDir;

use crate::config::Config;
use crate::error::{RagError, Result};

/// Reads the non-empty, trimmed lines of a text file, or of every matching
/// file under a directory (in path order).
pub fn load_paragraphs(path: &str, cfg: &Config) -> Result<Vec<String>> {
    let base = Path::new(path);
    if !base.exists() {
        return Err(RagError::Source(format!("{} does not exist", path)));
    }

    let mut paragraphs = Vec::new();
    if base.is_file() {
        let text = fs::read_to_string(base).map_err(|e| RagError::Source(format!("{}: {}", path, e)))?;
        paragraphs.extend(split_paragraphs(&text));
        return Ok(paragraphs);
    }

    let walker = WalkDir::new(base).sort_by_file_name();
    for entry in walker.into_iter().filter_map(|e| e.ok()) {
        if !entry.file_type().is_file() {
            continue;
        }
        let file = entry.path();
        if !has_extension(file, &cfg.source_exts) {
            continue;
        }
        if let Ok(meta) = fs::metadata(file) {
            if meta.len() > cfg.max_file_bytes {
                warn!(path = %file.display(), bytes = meta.len(), "skipping oversized source file");
                continue;
            }
        }
        match fs::read_to_string(file) {
            Ok(text) => paragraphs.extend(split_paragraphs(&text)),
            Err(err) => warn!(path = %file.display(), error = %err, "skipping unreadable source file"),
        }
    }

    Ok(paragraphs)
}

pub fn split_paragraphs(text: &str) -> impl Iterator<Item = String> + '_ {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
}

fn has_extension(path: &Path, exts: &[String]) -> bool {
    let lower = path.to_string_lossy().to_lowercase();
    exts.iter().any(|ext| lower.ends_with(&ext.to_lowercase()))
}
