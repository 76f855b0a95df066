//! Text chunking with sentence boundaries and overlap

use unicode_segmentation::UnicodeSegmentation;

/// A slice of the source text emitted by the chunker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkSpan {
    /// The fragment text
    pub text: String,
    /// Byte offset of the fragment start in the source text
    pub start: usize,
    /// Byte offset one past the fragment end
    pub end: usize,
}

/// Text chunker with configurable size and overlap
///
/// Packs whole sentences greedily until `chunk_size` characters, then starts
/// the next fragment `overlap` characters back from the cut point. Every
/// character of the input is covered by at least one fragment; emission
/// order follows the source text.
pub struct TextChunker {
    chunk_size: usize,
    overlap: usize,
}

impl TextChunker {
    /// Create a new chunker. `overlap` is clamped below `chunk_size`.
    pub fn new(chunk_size: usize, overlap: usize) -> Self {
        let chunk_size = chunk_size.max(1);
        Self {
            chunk_size,
            overlap: overlap.min(chunk_size - 1),
        }
    }

    /// Split text into overlapping fragments. Empty input yields no
    /// fragments.
    pub fn chunk(&self, text: &str) -> Vec<ChunkSpan> {
        let mut chunks = Vec::new();
        if text.is_empty() {
            return chunks;
        }

        let mut current = String::new();
        let mut current_start = 0usize;
        let mut pos = 0usize;

        for sentence in text.split_sentence_bounds() {
            if !current.is_empty() && current.len() + sentence.len() > self.chunk_size {
                chunks.push(ChunkSpan {
                    text: std::mem::take(&mut current),
                    start: current_start,
                    end: pos,
                });

                // Carry the overlap into the next fragment, aligned to a
                // char boundary
                let mut start = pos.saturating_sub(self.overlap);
                while !text.is_char_boundary(start) {
                    start += 1;
                }
                current_start = start;
                current = text[start..pos].to_string();
            }

            current.push_str(sentence);
            pos += sentence.len();
        }

        chunks.push(ChunkSpan {
            text: current,
            start: current_start,
            end: pos,
        });

        chunks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_text(sentences: usize) -> String {
        (0..sentences)
            .map(|i| format!("This is sentence number {} of the sample. ", i))
            .collect()
    }

    fn assert_covers(text: &str, chunks: &[ChunkSpan]) {
        assert!(!chunks.is_empty());
        assert_eq!(chunks[0].start, 0);
        assert_eq!(chunks.last().unwrap().end, text.len());
        for pair in chunks.windows(2) {
            // No gap between consecutive fragments
            assert!(pair[1].start <= pair[0].end);
            // Emission order follows the source
            assert!(pair[1].end > pair[0].end);
        }
        for chunk in chunks {
            assert_eq!(chunk.text, &text[chunk.start..chunk.end]);
        }
    }

    #[test]
    fn covers_full_text_without_gaps() {
        let text = sample_text(40);
        for (size, overlap) in [(200, 50), (120, 30), (500, 0), (80, 79)] {
            let chunks = TextChunker::new(size, overlap).chunk(&text);
            assert_covers(&text, &chunks);
        }
    }

    #[test]
    fn empty_text_yields_no_fragments() {
        assert!(TextChunker::new(1000, 200).chunk("").is_empty());
    }

    #[test]
    fn short_text_is_a_single_fragment() {
        let chunks = TextChunker::new(1000, 200).chunk("One short sentence.");
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "One short sentence.");
        assert_eq!(chunks[0].start, 0);
        assert_eq!(chunks[0].end, "One short sentence.".len());
    }

    #[test]
    fn overlap_is_clamped_below_chunk_size() {
        let text = sample_text(20);
        let chunks = TextChunker::new(100, 400).chunk(&text);
        assert_covers(&text, &chunks);
        assert!(chunks.len() > 1);
    }

    #[test]
    fn consecutive_fragments_share_overlap() {
        let text = sample_text(30);
        let chunks = TextChunker::new(150, 40).chunk(&text);
        assert!(chunks.len() > 1);
        for pair in chunks.windows(2) {
            let shared = pair[0].end - pair[1].start;
            assert!(shared <= 40);
        }
    }

    #[test]
    fn multibyte_text_stays_on_char_boundaries() {
        let text = "Älpha börder sentence one. Ünicode börder sentence two. \
                    Möre text follows here. Änd a final sentence closes it."
            .repeat(4);
        let chunks = TextChunker::new(90, 25).chunk(&text);
        assert_covers(&text, &chunks);
    }

    #[test]
    fn oversized_sentence_becomes_its_own_fragment() {
        let long = "x".repeat(500);
        let text = format!("Short lead. {} Short tail.", long);
        let chunks = TextChunker::new(100, 20).chunk(&text);
        assert_covers(&text, &chunks);
        assert!(chunks.iter().any(|c| c.text.contains(&long)));
    }
}
