pub mod chunk;
pub mod chunker;
pub mod reader;
pub mod sentences;

pub use chunk::Chunk;
pub use chunker::{Chunker, ChunkerConfig, Chunks};
pub use reader::FileReader;
pub use sentences::{Sentence, split_sentences};
