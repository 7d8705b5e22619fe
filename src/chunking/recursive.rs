//! Recursive character splitter.
//!
//! Tries the coarsest separator present in the text first (paragraphs, then
//! lines, then words, then single characters) and greedily merges the pieces
//! back into windows of at most `chunk_size` characters, carrying up to
//! `chunk_overlap` characters from the end of one window into the next.

use super::ChunkingConfig;
use std::collections::VecDeque;

const DEFAULT_SEPARATORS: [&str; 4] = ["\n\n", "\n", " ", ""];

/// Splits text into overlapping, size-bounded chunks.
#[derive(Debug, Clone)]
pub struct RecursiveSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl RecursiveSplitter {
    /// Create a splitter. The overlap is clamped below the chunk size.
    pub fn new(config: ChunkingConfig) -> Self {
        let chunk_size = config.chunk_size.max(1);
        Self {
            chunk_size,
            chunk_overlap: config.chunk_overlap.min(chunk_size - 1),
        }
    }

    /// Split text into trimmed, non-empty chunks.
    pub fn split(&self, text: &str) -> Vec<String> {
        self.split_with(text, &DEFAULT_SEPARATORS)
    }

    fn split_with(&self, text: &str, separators: &[&str]) -> Vec<String> {
        let mut separator = separators.last().copied().unwrap_or("");
        let mut finer: &[&str] = &[];
        for (i, &candidate) in separators.iter().enumerate() {
            if candidate.is_empty() {
                separator = candidate;
                break;
            }
            if text.contains(candidate) {
                separator = candidate;
                finer = &separators[i + 1..];
                break;
            }
        }

        let pieces: Vec<&str> = if separator.is_empty() {
            text.char_indices()
                .map(|(i, c)| &text[i..i + c.len_utf8()])
                .collect()
        } else {
            text.split(separator).filter(|p| !p.is_empty()).collect()
        };

        let mut output = Vec::new();
        let mut fitting: Vec<&str> = Vec::new();

        for piece in pieces {
            if char_len(piece) < self.chunk_size {
                fitting.push(piece);
                continue;
            }

            if !fitting.is_empty() {
                output.extend(self.merge(&fitting, separator));
                fitting.clear();
            }

            if finer.is_empty() {
                push_trimmed(&mut output, piece);
            } else {
                output.extend(self.split_with(piece, finer));
            }
        }

        if !fitting.is_empty() {
            output.extend(self.merge(&fitting, separator));
        }

        output
    }

    /// Greedily join pieces into windows, keeping a tail for overlap.
    fn merge(&self, pieces: &[&str], separator: &str) -> Vec<String> {
        let sep_len = char_len(separator);
        let mut chunks = Vec::new();
        let mut window: VecDeque<&str> = VecDeque::new();
        let mut total = 0usize;

        for &piece in pieces {
            let len = char_len(piece);

            if !window.is_empty() && total + len + sep_len > self.chunk_size {
                push_trimmed(&mut chunks, &join(&window, separator));

                while total > self.chunk_overlap
                    || (total > 0 && total + len + joiner_len(&window, sep_len) > self.chunk_size)
                {
                    let Some(first) = window.pop_front() else {
                        break;
                    };
                    total -= char_len(first) + joiner_len(&window, sep_len);
                }
            }

            total += len + joiner_len(&window, sep_len);
            window.push_back(piece);
        }

        push_trimmed(&mut chunks, &join(&window, separator));
        chunks
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Separator length paid when appending to a window of this size.
fn joiner_len(window: &VecDeque<&str>, sep_len: usize) -> usize {
    if window.is_empty() {
        0
    } else {
        sep_len
    }
}

fn join(window: &VecDeque<&str>, separator: &str) -> String {
    window.iter().copied().collect::<Vec<_>>().join(separator)
}

fn push_trimmed(out: &mut Vec<String>, text: &str) {
    let trimmed = text.trim();
    if !trimmed.is_empty() {
        out.push(trimmed.to_string());
    }
}
