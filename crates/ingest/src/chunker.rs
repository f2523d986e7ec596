use serde::{Deserialize, Serialize};

use crate::chunk::Chunk;

/// Characters that end a sentence when followed by whitespace.
/// Includes the Greek question mark (U+037E), which renders like `;`.
const SENTENCE_TERMINATORS: &[char] = &['.', '!', '?', ';', '\u{037E}', '…'];

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkerConfig {
    /// Upper bound on chunk length, in characters.
    pub max_chunk_chars: usize,
    /// How far back from the raw bound to look for a sentence break.
    pub back_scan_chars: usize,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            max_chunk_chars: 100_000,
            back_scan_chars: 1_000,
        }
    }
}

pub struct Chunker {
    config: ChunkerConfig,
}

impl Chunker {
    pub fn new(config: ChunkerConfig) -> Self {
        Self {
            config: ChunkerConfig {
                max_chunk_chars: config.max_chunk_chars.max(1),
                back_scan_chars: config.back_scan_chars,
            },
        }
    }

    /// Lazily split `text` into sentence-aligned chunks.
    ///
    /// The returned iterator is `Clone`, so a consumer can restart from the
    /// beginning without re-running the chunker. Concatenating every chunk
    /// yields `text` exactly. Text that fits the bound comes back as a single
    /// chunk, including the empty string.
    pub fn chunks<'a>(&self, text: &'a str) -> Chunks<'a> {
        Chunks {
            text,
            cursor: 0,
            index: 0,
            done: false,
            max_chars: self.config.max_chunk_chars,
            back_scan_chars: self.config.back_scan_chars,
        }
    }

    pub fn needs_chunking(&self, text: &str) -> bool {
        text.chars().nth(self.config.max_chunk_chars).is_some()
    }
}

#[derive(Debug, Clone)]
pub struct Chunks<'a> {
    text: &'a str,
    cursor: usize,
    index: usize,
    done: bool,
    max_chars: usize,
    back_scan_chars: usize,
}

impl<'a> Chunks<'a> {
    /// Byte offset (relative to `candidate`) just past the rightmost
    /// terminator + whitespace pair inside the back-scan window.
    fn sentence_break(&self, candidate: &str) -> Option<usize> {
        let window_start_char = self.max_chars.saturating_sub(self.back_scan_chars);
        let window_start = candidate
            .char_indices()
            .nth(window_start_char)
            .map(|(i, _)| i)
            .unwrap_or(candidate.len());

        let mut best = None;
        let mut prev: Option<char> = None;
        for (i, c) in candidate[window_start..].char_indices() {
            if let Some(p) = prev {
                if SENTENCE_TERMINATORS.contains(&p) && c.is_whitespace() {
                    best = Some(window_start + i + c.len_utf8());
                }
            }
            prev = Some(c);
        }
        best
    }
}

impl<'a> Iterator for Chunks<'a> {
    type Item = Chunk<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let rest = &self.text[self.cursor..];
        let len = match rest.char_indices().nth(self.max_chars) {
            // Boundary falls strictly inside the text
            Some((raw_end, _)) => self.sentence_break(&rest[..raw_end]).unwrap_or(raw_end),
            None => rest.len(),
        };

        let chunk = Chunk::new(self.index, &rest[..len], self.cursor);
        self.cursor += len;
        self.index += 1;
        if self.cursor >= self.text.len() {
            self.done = true;
        }

        Some(chunk)
    }
}
