//! Recursive character splitter.
//!
//! Splits text by trying progressively smaller separators (paragraph, line,
//! word, character) until pieces fit the target size, then merges adjacent
//! pieces back up to the limit with a configurable overlap carried between
//! neighboring chunks.

/// Splitting parameters, sizes measured in characters.
#[derive(Debug, Clone)]
pub struct SplitConfig {
    /// Target maximum chunk size.
    pub chunk_size: usize,

    /// Characters of trailing context repeated at the start of the next chunk.
    pub chunk_overlap: usize,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
        }
    }
}

const SEPARATORS: [&str; 3] = ["\n\n", "\n", " "];

/// Split text into chunks of at most `chunk_size` characters.
///
/// Empty and whitespace-only input yields no chunks.
pub fn split_text(text: &str, config: &SplitConfig) -> Vec<String> {
    if text.trim().is_empty() {
        return Vec::new();
    }

    let chunk_size = config.chunk_size.max(1);
    let overlap = config.chunk_overlap.min(chunk_size / 2);

    split_recursive(text, &SEPARATORS, chunk_size, overlap)
        .into_iter()
        .filter(|c| !c.trim().is_empty())
        .collect()
}

fn split_recursive(text: &str, separators: &[&str], size: usize, overlap: usize) -> Vec<String> {
    if char_len(text) <= size {
        return vec![text.to_string()];
    }

    for (sep_idx, separator) in separators.iter().enumerate() {
        let parts: Vec<&str> = text.split(separator).filter(|p| !p.is_empty()).collect();
        if parts.len() <= 1 {
            continue;
        }

        // Pieces still over the limit descend to the next separator.
        let mut pieces = Vec::with_capacity(parts.len());
        for part in parts {
            if char_len(part) > size {
                pieces.extend(split_recursive(part, &separators[sep_idx + 1..], size, overlap));
            } else {
                pieces.push(part.to_string());
            }
        }

        return merge_pieces(pieces, separator, size, overlap);
    }

    // Last resort: hard character split.
    split_chars(text, size, overlap)
}

/// Greedily merge pieces into chunks up to `size`, carrying `overlap`
/// characters of each flushed chunk into the next.
fn merge_pieces(pieces: Vec<String>, separator: &str, size: usize, overlap: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();

    for piece in pieces {
        let candidate_len = if current.is_empty() {
            char_len(&piece)
        } else {
            char_len(&current) + char_len(separator) + char_len(&piece)
        };

        if candidate_len > size && !current.is_empty() {
            let tail = overlap_tail(&current, overlap);
            chunks.push(std::mem::take(&mut current));
            // Carry the overlap only when it still leaves room for the piece.
            if char_len(&tail) + char_len(separator) + char_len(&piece) <= size {
                current = tail;
            }
        }

        if !current.is_empty() {
            current.push_str(separator);
        }
        current.push_str(&piece);
    }

    if !current.is_empty() {
        chunks.push(current);
    }

    chunks
}

fn split_chars(text: &str, size: usize, overlap: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    let step = size.saturating_sub(overlap).max(1);
    let mut chunks = Vec::new();
    let mut start = 0;

    while start < chars.len() {
        let end = (start + size).min(chars.len());
        chunks.push(chars[start..end].iter().collect());
        if end == chars.len() {
            break;
        }
        start += step;
    }

    chunks
}

fn overlap_tail(text: &str, overlap: usize) -> String {
    if overlap == 0 {
        return String::new();
    }
    let chars: Vec<char> = text.chars().collect();
    let start = chars.len().saturating_sub(overlap);
    chars[start..].iter().collect()
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}
