//! Prompt context blocks.

use crate::error::Result;
use crate::events::Event;
use crate::vector_store::SearchResult;

/// Render retrieved chunks as the `--- DOCUMENTS ---` block.
pub fn format_documents(results: &[SearchResult]) -> String {
    let mut block = String::from("\n\n--- DOCUMENTS ---\n");
    for (i, result) in results.iter().enumerate() {
        block.push_str(&format!("\n[Document {}]\n{}\n", i + 1, result.chunk.content));
    }
    block
}

/// Render the event list as a fenced, pretty-printed JSON block.
pub fn format_events(events: &[Event]) -> Result<String> {
    let json = serde_json::to_string_pretty(events)?;
    Ok(format!("\n\n--- EVENTS (structured JSON) ---\n```json\n{}\n```\n", json))
}

/// Format retrieved chunks for display to the user.
pub fn format_sources_for_display(results: &[SearchResult]) -> String {
    results
        .iter()
        .map(|r| {
            format!(
                "{} #{} (score: {:.2})",
                r.chunk.source, r.chunk.chunk_index, r.score
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}
