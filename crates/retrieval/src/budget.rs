//! Character-budget context assembly.
//!
//! All strategies satisfy the same contract: the assembled context never
//! exceeds the configured budget, and when something has to go, the
//! lowest-scored material goes first. Assembly is deterministic — identical
//! inputs always produce identical output.

use waypoint_core::context::{AssembledContext, ContextChunk};

/// Separator between concatenated documents/chunks.
pub const SEPARATOR: &str = "\n---\n";

/// Concatenate chunk texts in the given order until the budget is reached.
///
/// Chunks are expected pre-sorted by descending score, so filling front-first
/// and cutting at the back drops the lowest-scored material first. A chunk
/// that crosses the budget line is cut at a char boundary; everything after
/// it is dropped.
pub fn fit_chunks(chunks: &[ContextChunk], budget: usize) -> AssembledContext {
    let mut text = String::new();
    let mut included = 0;
    let mut truncated = false;

    for chunk in chunks {
        let sep = if text.is_empty() { "" } else { SEPARATOR };
        let needed = sep.len() + chunk.text.len();
        let remaining = budget.saturating_sub(text.len());

        if needed <= remaining {
            text.push_str(sep);
            text.push_str(&chunk.text);
            included += 1;
            continue;
        }

        // Partial fit: keep what fits of this chunk, drop the rest.
        let room_for_text = remaining.saturating_sub(sep.len());
        if room_for_text > 0 {
            text.push_str(sep);
            text.push_str(truncate_to(&chunk.text, room_for_text));
            included += 1;
        }
        truncated = true;
        break;
    }

    AssembledContext {
        text,
        chunks_included: included,
        truncated,
    }
}

/// Cut a string to at most `budget` bytes on a char boundary.
pub fn truncate_to(text: &str, budget: usize) -> &str {
    if text.len() <= budget {
        return text;
    }
    let mut end = budget;
    while end > 0 && !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}
