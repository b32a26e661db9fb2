//! Sliding-window text chunking.
//!
//! Chunks are fixed-size overlapping character windows. The window and overlap
//! sizes are tunable constants, not proven optimal. Every input character is
//! covered by at least one chunk; consecutive chunks overlap by exactly the
//! configured amount except possibly the final one, which may be shorter.

#[derive(Debug, Clone)]
pub struct ChunkingConfig {
    /// Window size in characters.
    pub window: usize,
    /// Overlap between consecutive windows in characters.
    pub overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self { window: 1000, overlap: 200 }
    }
}

/// A contiguous span of document text.
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    pub text: String,
    /// Zero-based sequence position within the document.
    pub position: usize,
}

/// Split text into overlapping windows. Deterministic for identical input and
/// configuration. Operates on `char` boundaries so multi-byte text never
/// splits a code point.
pub fn chunk_text(text: &str, config: &ChunkingConfig) -> Vec<Chunk> {
    let chars: Vec<char> = text.chars().collect();
    let total = chars.len();
    if total == 0 {
        return Vec::new();
    }

    let window = config.window.max(1);
    let step = if config.overlap < window {
        window - config.overlap
    } else {
        // Degenerate configuration; advance by half a window to stay finite.
        (window / 2).max(1)
    };

    let mut chunks = Vec::with_capacity(total / step + 1);
    let mut start = 0;
    loop {
        let end = (start + window).min(total);
        chunks.push(Chunk {
            text: chars[start..end].iter().collect(),
            position: chunks.len(),
        });
        if end == total {
            break;
        }
        start += step;
    }

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cover_len(chunks: &[Chunk], step: usize) -> usize {
        // Chunks start at position * step; the covered length is the end of
        // the last chunk.
        chunks
            .last()
            .map(|c| c.position * step + c.text.chars().count())
            .unwrap_or(0)
    }

    #[test]
    fn empty_input_yields_no_chunks() {
        assert!(chunk_text("", &ChunkingConfig::default()).is_empty());
    }

    #[test]
    fn short_input_is_a_single_chunk() {
        let chunks = chunk_text("hello world", &ChunkingConfig::default());
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "hello world");
        assert_eq!(chunks[0].position, 0);
    }

    #[test]
    fn full_coverage_with_exact_overlap() {
        let config = ChunkingConfig { window: 1000, overlap: 200 };
        let text: String = ('a'..='z').cycle().take(3456).collect();
        let chunks = chunk_text(&text, &config);

        // Every chunk bounded by the window.
        assert!(chunks.iter().all(|c| c.text.chars().count() <= 1000));

        // Union covers every input character.
        let step = config.window - config.overlap;
        assert_eq!(cover_len(&chunks, step), 3456);

        // Consecutive chunks overlap by exactly the configured amount, except
        // possibly the final (shorter) chunk.
        for pair in chunks.windows(2) {
            let prev: Vec<char> = pair[0].text.chars().collect();
            let next: Vec<char> = pair[1].text.chars().collect();
            let tail: String = prev[prev.len() - config.overlap..].iter().collect();
            let head: String = next[..config.overlap.min(next.len())].iter().collect();
            assert_eq!(tail, head);
        }

        // Positions are sequential.
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.position, i);
        }
    }

    #[test]
    fn multibyte_text_does_not_split_code_points() {
        let config = ChunkingConfig { window: 4, overlap: 1 };
        let text = "héllø wörld ünïcode";
        let chunks = chunk_text(text, &config);
        let rebuilt: String = chunks
            .iter()
            .enumerate()
            .flat_map(|(i, c)| {
                let skip = if i == 0 { 0 } else { config.overlap };
                c.text.chars().skip(skip).collect::<Vec<_>>()
            })
            .collect();
        assert_eq!(rebuilt, text);
    }

    #[test]
    fn degenerate_overlap_still_terminates() {
        let config = ChunkingConfig { window: 10, overlap: 10 };
        let text = "x".repeat(100);
        let chunks = chunk_text(&text, &config);
        assert!(!chunks.is_empty());
        assert!(chunks.iter().all(|c| c.text.len() <= 10));
    }
}
