//! Text chunking with offset tracking
//!
//! Splits extracted document text into overlapping slices sized for
//! embedding. Consecutive slices share a fixed overlap so a fact near a
//! boundary lands whole in at least one of them.

use unicode_segmentation::UnicodeSegmentation;

use crate::config::ChunkingConfig;

/// One chunk of text with its position in the source document.
/// Offsets are byte positions into the original UTF-8 text, so
/// `text == &document[offset_start..offset_end]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkSlice {
    pub text: String,
    pub offset_start: usize,
    pub offset_end: usize,
}

/// Text chunker with configurable size and overlap
pub struct TextChunker {
    /// Target chunk size in bytes
    target_size: usize,
    /// Bytes reused between consecutive chunks
    overlap: usize,
}

impl TextChunker {
    /// Create a new chunker. Overlap is clamped below the target size
    /// so every step makes forward progress.
    pub fn new(target_size: usize, overlap: usize) -> Self {
        let target_size = target_size.max(1);
        Self {
            target_size,
            overlap: overlap.min(target_size.saturating_sub(1)),
        }
    }

    pub fn from_config(config: &ChunkingConfig) -> Self {
        Self::new(config.chunk_size, config.chunk_overlap)
    }

    /// Split text into overlapping slices.
    ///
    /// Guarantees: every slice is non-empty, slices appear in document
    /// order, each slice starts at most `overlap` bytes before the end
    /// of its predecessor, and together they cover the input up to
    /// whitespace-only stretches. Empty or whitespace-only input yields
    /// an empty vec, not an error.
    pub fn chunk(&self, text: &str) -> Vec<ChunkSlice> {
        if text.trim().is_empty() {
            return Vec::new();
        }

        let len = text.len();
        let mut slices = Vec::new();
        let mut start = 0usize;

        while start < len {
            let mut end = (start + self.target_size).min(len);
            while !text.is_char_boundary(end) {
                end -= 1;
            }
            if end <= start {
                // Target smaller than one character; take the character
                end = next_char_boundary(text, start);
            }

            // Prefer ending on a sentence or word boundary, but only
            // when there is more text to come and the cut keeps the
            // chunk reasonably full.
            if end < len {
                if let Some(cut) = break_point(&text[start..end], self.target_size / 2) {
                    end = start + cut;
                }
            }

            let slice = &text[start..end];
            if !slice.trim().is_empty() {
                slices.push(ChunkSlice {
                    text: slice.to_string(),
                    offset_start: start,
                    offset_end: end,
                });
            }

            if end >= len {
                break;
            }

            let mut next = end.saturating_sub(self.overlap);
            while next > 0 && !text.is_char_boundary(next) {
                next -= 1;
            }
            // The window must always advance
            if next <= start {
                next = end;
            }
            start = next;
        }

        slices
    }
}

/// Find the best cut inside a window: the last sentence boundary, or
/// failing that the last whitespace run, at or past `min`. Returns a
/// byte offset into the window, or None to cut at the window end.
fn break_point(window: &str, min: usize) -> Option<usize> {
    let mut sentence_cut = None;
    let mut pos = 0usize;
    for sentence in window.split_sentence_bounds() {
        pos += sentence.len();
        if pos < window.len() && pos >= min {
            sentence_cut = Some(pos);
        }
    }
    if sentence_cut.is_some() {
        return sentence_cut;
    }

    window
        .rfind(char::is_whitespace)
        .map(|i| i + window[i..].chars().next().map_or(1, char::len_utf8))
        .filter(|&cut| cut >= min && cut < window.len())
}

fn next_char_boundary(text: &str, start: usize) -> usize {
    text[start..]
        .chars()
        .next()
        .map(|c| start + c.len_utf8())
        .unwrap_or(text.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunker(size: usize, overlap: usize) -> TextChunker {
        TextChunker::new(size, overlap)
    }

    #[test]
    fn empty_input_yields_no_chunks() {
        assert!(chunker(100, 20).chunk("").is_empty());
        assert!(chunker(100, 20).chunk("   \n\t  ").is_empty());
    }

    #[test]
    fn short_text_is_a_single_chunk() {
        let slices = chunker(100, 20).chunk("Employees get 20 days of annual leave.");
        assert_eq!(slices.len(), 1);
        assert_eq!(slices[0].offset_start, 0);
        assert_eq!(slices[0].offset_end, 38);
        assert_eq!(slices[0].text, "Employees get 20 days of annual leave.");
    }

    #[test]
    fn offsets_slice_back_into_the_source() {
        let text = "One sentence here. Another sentence follows. A third one closes. \
                    And then some more text to force several chunks out of this input.";
        let slices = chunker(40, 10).chunk(text);
        assert!(slices.len() > 1);
        for s in &slices {
            assert_eq!(s.text, &text[s.offset_start..s.offset_end]);
            assert!(!s.text.trim().is_empty());
        }
    }

    #[test]
    fn consecutive_chunks_overlap_and_cover() {
        let text = "abcdefghij".repeat(30);
        let overlap = 15;
        let slices = chunker(100, overlap).chunk(&text);
        assert!(slices.len() > 1);

        for pair in slices.windows(2) {
            // No gap: the next chunk starts no later than the previous end
            assert!(pair[1].offset_start <= pair[0].offset_end);
            // Shared text is bounded by the configured overlap
            assert!(pair[0].offset_end - pair[1].offset_start <= overlap);
        }
        assert_eq!(slices.first().unwrap().offset_start, 0);
        assert_eq!(slices.last().unwrap().offset_end, text.len());
    }

    #[test]
    fn prefers_sentence_boundaries() {
        let text = "First sentence is right here. Second sentence is a bit longer than that. \
                    Third sentence closes the paragraph.";
        let slices = chunker(60, 10).chunk(text);
        // The first cut lands after "here. " rather than mid-word
        assert!(slices[0].text.ends_with(". ") || slices[0].text.ends_with('.'));
    }

    #[test]
    fn multibyte_input_stays_on_char_boundaries() {
        let text = "école à café naïve fenêtre ".repeat(20);
        let slices = chunker(50, 10).chunk(&text);
        assert!(!slices.is_empty());
        for s in &slices {
            // Would panic on a bad boundary
            assert_eq!(s.text, &text[s.offset_start..s.offset_end]);
        }
    }

    #[test]
    fn deterministic() {
        let text = "Alpha beta gamma. ".repeat(40);
        let a = chunker(64, 16).chunk(&text);
        let b = chunker(64, 16).chunk(&text);
        assert_eq!(a, b);
    }
}
