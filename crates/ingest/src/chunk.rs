use serde::Serialize;

/// A borrowed slice of the source text produced by the [`Chunker`](crate::Chunker).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Chunk<'a> {
    pub index: usize,
    pub text: &'a str,
    pub offset: (usize, usize), // [start, end) byte positions in the source text
}

impl<'a> Chunk<'a> {
    pub fn new(index: usize, text: &'a str, start: usize) -> Self {
        Self {
            index,
            text,
            offset: (start, start + text.len()),
        }
    }

    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }
}
