//! Text segmentation for speech synthesis.
//!
//! Splits source text into chunks at logical boundaries: each chunk gets a
//! tentative cut at `base_size` bytes, then a lookahead window of up to
//! `max_extra` bytes is searched for the first period and the first
//! paragraph break (double newline). A period wins if it occurs before any
//! paragraph break; otherwise the paragraph break wins; otherwise the chunk
//! is hard-cut at the window's far edge. Chunks are trimmed of surrounding
//! whitespace, and chunks that trim to nothing are not emitted.
//!
//! Cut indices are snapped to `char` boundaries so multi-byte text never
//! panics; boundary hits found via `find` already land on boundaries.

/// Default tentative chunk size in bytes.
pub const DEFAULT_BASE_SIZE: usize = 1000;

/// Default lookahead window in bytes past the tentative cut.
pub const DEFAULT_MAX_EXTRA: usize = 512;

/// Segment text with the default sizes.
///
/// Empty input is rejected upstream (the job refuses to start); passed an
/// empty string this simply returns no chunks.
#[must_use]
pub fn segment(text: &str) -> Vec<String> {
    segment_with(text, DEFAULT_BASE_SIZE, DEFAULT_MAX_EXTRA)
}

/// Segment text into chunks of roughly `base_size` bytes, extended by at
/// most `max_extra` bytes to reach a sentence or paragraph boundary.
///
/// For boundary-free text this degrades to fixed hard cuts of
/// `base_size + max_extra` bytes, so a text of length `L` yields exactly
/// `ceil(L / (base_size + max_extra))` chunks.
#[must_use]
pub fn segment_with(text: &str, base_size: usize, max_extra: usize) -> Vec<String> {
    let len = text.len();
    let mut chunks = Vec::new();
    let mut start = 0;

    while start < len {
        let mut end = floor_char_boundary(text, (start + base_size).min(len));
        if end <= start {
            // A single char wider than base_size; take it whole.
            end = ceil_char_boundary(text, (start + base_size.max(1)).min(len));
        }

        if end < len {
            let extra_end = floor_char_boundary(text, (end + max_extra).min(len));
            let window = &text[end..extra_end];
            let full_stop = window.find('.').map(|i| end + i);
            let paragraph = window.find("\n\n").map(|i| end + i);

            end = match (full_stop, paragraph) {
                // Cut immediately after the period when it comes first.
                (Some(stop), None) => stop + 1,
                (Some(stop), Some(para)) if stop < para => stop + 1,
                // Else cut immediately after the paragraph break.
                (_, Some(para)) => para + 2,
                // No boundary in the window: hard cut at its far edge.
                (None, None) => extra_end,
            };
        }

        let chunk = text[start..end].trim();
        if !chunk.is_empty() {
            chunks.push(chunk.to_string());
        }
        start = end;
    }

    chunks
}

/// Largest char boundary at or below `index`.
fn floor_char_boundary(text: &str, mut index: usize) -> usize {
    if index >= text.len() {
        return text.len();
    }
    while !text.is_char_boundary(index) {
        index -= 1;
    }
    index
}

/// Smallest char boundary at or above `index`.
fn ceil_char_boundary(text: &str, mut index: usize) -> usize {
    if index >= text.len() {
        return text.len();
    }
    while !text.is_char_boundary(index) {
        index += 1;
    }
    index
}
