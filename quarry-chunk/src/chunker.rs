//! Token-aware line chunking.
//!
//! The chunker walks a file line by line, accumulating lines into a buffer
//! until the next line would push the buffer past the target token count.
//! At that point the buffer is closed as a chunk and the next buffer is
//! seeded with a suffix of the previous one, so adjacent chunks share some
//! trailing context. Line numbers are 1-based and inclusive on both ends.
//!
//! Token counts only decide where boundaries fall; the emitted text is the
//! raw joined lines, so concatenating the non-overlapped line ranges of all
//! chunks reconstructs the original line sequence.

use anyhow::Result;
use serde::Serialize;
use tiktoken_rs::{CoreBPE, cl100k_base};

/// Configuration for chunk sizing.
///
/// `target_tokens` bounds the token count of a chunk (a single line longer
/// than the target still forms its own chunk — lines are never split).
/// `overlap_tokens` bounds the token count of the line suffix carried from
/// one chunk into the next.
#[derive(Debug, Clone, Copy)]
pub struct ChunkerConfig {
    pub target_tokens: usize,
    pub overlap_tokens: usize,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            target_tokens: 1000,
            overlap_tokens: 200,
        }
    }
}

/// A contiguous run of lines from a file, ready for embedding.
#[derive(Debug, Clone, Serialize)]
pub struct Chunk {
    /// First line of the chunk, 1-based inclusive.
    pub start_line: usize,
    /// Last line of the chunk, 1-based inclusive.
    pub end_line: usize,
    /// The joined line text, including the overlap carried from the
    /// previous chunk.
    pub text: String,
}

/// Splits file content into token-bounded, overlapping line ranges.
///
/// Chunking is a pure function of the content and the configuration: the
/// same input always yields the same chunks.
pub struct Chunker {
    bpe: CoreBPE,
    config: ChunkerConfig,
}

impl std::fmt::Debug for Chunker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Chunker")
            .field("config", &self.config)
            .finish()
    }
}

impl Chunker {
    /// Create a chunker with the default target/overlap sizes.
    pub fn new() -> Result<Self> {
        Self::with_config(ChunkerConfig::default())
    }

    /// Create a chunker with explicit sizes.
    pub fn with_config(config: ChunkerConfig) -> Result<Self> {
        Ok(Self {
            bpe: cl100k_base()?,
            config,
        })
    }

    fn count_tokens(&self, line: &str) -> usize {
        self.bpe.encode_ordinary(line).len()
    }

    /// Split `content` into ordered chunks.
    ///
    /// Empty content yields no chunks. Otherwise the first chunk starts at
    /// line 1 and the last chunk ends at the final line, with no gaps in
    /// between.
    pub fn chunk(&self, content: &str) -> Vec<Chunk> {
        let lines: Vec<&str> = content.lines().collect();

        let mut chunks = Vec::new();
        let mut buffer: Vec<&str> = Vec::new();
        let mut buffer_tokens = 0usize;
        let mut start_line = 1usize;

        for (i, line) in lines.iter().enumerate() {
            let line_no = i + 1;
            let line_tokens = self.count_tokens(line);

            if buffer_tokens + line_tokens > self.config.target_tokens && !buffer.is_empty() {
                chunks.push(Chunk {
                    start_line,
                    end_line: line_no - 1,
                    text: buffer.join("\n"),
                });

                // Seed the next buffer with the longest trailing run of
                // lines whose token total stays within the overlap budget.
                let mut overlap: Vec<&str> = Vec::new();
                let mut overlap_tokens = 0usize;
                for prev in buffer.iter().rev() {
                    let prev_tokens = self.count_tokens(prev);
                    if overlap_tokens + prev_tokens > self.config.overlap_tokens {
                        break;
                    }
                    overlap.insert(0, prev);
                    overlap_tokens += prev_tokens;
                }

                start_line = line_no - overlap.len();
                buffer = overlap;
                buffer_tokens = overlap_tokens;
            }

            buffer.push(line);
            buffer_tokens += line_tokens;
        }

        if !buffer.is_empty() {
            chunks.push(Chunk {
                start_line,
                end_line: lines.len(),
                text: buffer.join("\n"),
            });
        }

        chunks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_chunker() -> Chunker {
        Chunker::with_config(ChunkerConfig {
            target_tokens: 10,
            overlap_tokens: 2,
        })
        .unwrap()
    }

    #[test]
    fn short_content_yields_single_chunk() {
        let chunker = Chunker::new().unwrap();
        let content = "def function1():\n    return 'hello'\n\ndef function2():\n    return 'world'";
        let chunks = chunker.chunk(content);

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].start_line, 1);
        assert_eq!(chunks[0].end_line, 5);
        assert_eq!(chunks[0].text, content);
    }

    #[test]
    fn empty_content_yields_no_chunks() {
        let chunker = Chunker::new().unwrap();
        assert!(chunker.chunk("").is_empty());
    }

    #[test]
    fn long_content_splits_with_overlap() {
        let chunker = small_chunker();
        // Single-word lines tokenize to at most 2 tokens each, so at least
        // one line always fits inside the overlap budget.
        let content = (1..=20)
            .map(|i| format!("word{i}"))
            .collect::<Vec<_>>()
            .join("\n");
        let chunks = chunker.chunk(&content);

        assert!(chunks.len() > 1);
        assert_eq!(chunks[0].start_line, 1);
        assert!(chunks[0].end_line < 20);
        assert_eq!(chunks.last().unwrap().end_line, 20);

        // Every chunk after the first starts at or before the previous
        // chunk's end line, so the overlap is actually present.
        for pair in chunks.windows(2) {
            assert!(pair[1].start_line <= pair[0].end_line);
            assert!(pair[1].start_line > pair[0].start_line);
        }
    }

    #[test]
    fn line_coverage_is_complete_and_ordered() {
        let chunker = small_chunker();
        let content = (1..=50)
            .map(|i| format!("word{i} word{i} word{i}"))
            .collect::<Vec<_>>()
            .join("\n");
        let chunks = chunker.chunk(&content);

        assert_eq!(chunks[0].start_line, 1);
        assert_eq!(chunks.last().unwrap().end_line, 50);
        for chunk in &chunks {
            assert!(chunk.start_line <= chunk.end_line);
        }
        for pair in chunks.windows(2) {
            assert!(pair[1].end_line > pair[0].end_line);
        }
    }

    #[test]
    fn dropping_overlap_reconstructs_the_original_text() {
        let chunker = small_chunker();
        let content = (1..=40)
            .map(|i| format!("stmt{i} value{i}"))
            .collect::<Vec<_>>()
            .join("\n");
        let chunks = chunker.chunk(&content);
        assert!(chunks.len() > 1);

        // Rebuild the file from each chunk's text, skipping the lines a
        // chunk shares with its predecessor.
        let mut rebuilt: Vec<&str> = Vec::new();
        let mut covered_through = 0usize;
        for chunk in &chunks {
            let lines: Vec<&str> = chunk.text.lines().collect();
            assert_eq!(lines.len(), chunk.end_line - chunk.start_line + 1);
            let overlap = covered_through.saturating_sub(chunk.start_line - 1);
            rebuilt.extend(&lines[overlap..]);
            covered_through = chunk.end_line;
        }
        assert_eq!(rebuilt.join("\n"), content);
    }

    #[test]
    fn oversize_single_line_forms_own_chunk() {
        let chunker = small_chunker();
        let long_line = "alpha beta gamma delta epsilon zeta eta theta iota kappa lambda mu";
        let content = format!("{long_line}\nshort");
        let chunks = chunker.chunk(&content);

        assert_eq!(chunks[0].start_line, 1);
        assert_eq!(chunks[0].end_line, 1);
        assert_eq!(chunks[0].text, long_line);
        assert_eq!(chunks.last().unwrap().end_line, 2);
    }

    #[test]
    fn chunking_is_deterministic() {
        let chunker = small_chunker();
        let content = (1..=30)
            .map(|i| format!("statement number {i};"))
            .collect::<Vec<_>>()
            .join("\n");

        let first = chunker.chunk(&content);
        let second = chunker.chunk(&content);

        assert_eq!(first.len(), second.len());
        for (a, b) in first.iter().zip(&second) {
            assert_eq!(a.start_line, b.start_line);
            assert_eq!(a.end_line, b.end_line);
            assert_eq!(a.text, b.text);
        }
    }
}
