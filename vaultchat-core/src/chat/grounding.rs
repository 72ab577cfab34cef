//! Folding note excerpts into the prompt

use super::store::{DocumentStore, SearchHit};
use crate::config::GroundingConfig;
use tracing::{debug, warn};

/// Notes retrieved for one question
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Grounding {
    /// Hits whose text made it into the context
    pub sources: Vec<SearchHit>,

    /// Context block for the system prompt; `None` when nothing was found
    pub context: Option<String>,
}

impl Grounding {
    /// Base instructions followed by the context block, if any
    pub fn system_prompt(&self, base: &str) -> String {
        match &self.context {
            Some(context) => format!("{}\n\n{}", base.trim_end(), context),
            None => base.to_string(),
        }
    }
}

/// Searches the store and builds a context block from the best hits
#[derive(Debug)]
pub struct Grounder<S> {
    store: S,
    config: GroundingConfig,
}

impl<S: DocumentStore> Grounder<S> {
    pub fn new(store: S, config: GroundingConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &GroundingConfig {
        &self.config
    }

    /// Retrieve context for `query`
    ///
    /// Never fails: a store error yields an ungrounded result and a warning.
    pub async fn ground(&self, query: &str) -> Grounding {
        if !self.config.enabled || query.trim().is_empty() {
            return Grounding::default();
        }

        let hits = match self.store.search(query, self.config.max_documents).await {
            Ok(hits) => hits,
            Err(e) => {
                warn!("Note search failed, answering without notes: {}", e);
                return Grounding::default();
            }
        };

        let mut sources = Vec::new();
        let mut sections = Vec::new();

        for hit in hits.into_iter().take(self.config.max_documents) {
            let text = match self.store.read_document(&hit.path).await {
                Ok(text) => text,
                Err(e) => {
                    warn!("Skipping note {}: {}", hit.path, e);
                    continue;
                }
            };

            let excerpt = excerpt(&text, hit.heading.as_deref(), self.config.max_excerpt_chars);
            if excerpt.is_empty() {
                continue;
            }

            sections.push(format_section(sections.len() + 1, &hit, &excerpt));
            sources.push(hit);
        }

        debug!("Grounded question with {} notes", sources.len());

        if sections.is_empty() {
            return Grounding::default();
        }

        let context = format!(
            "Relevant notes from the user's vault. Cite a note by its title when you use it.\n\n{}",
            sections.join("\n\n")
        );
        Grounding {
            sources,
            context: Some(context),
        }
    }
}

fn format_section(index: usize, hit: &SearchHit, excerpt: &str) -> String {
    let location = match &hit.heading {
        Some(heading) => format!("{} > {}", hit.path, heading),
        None => hit.path.clone(),
    };
    format!("[{}] {} ({})\n{}", index, hit.title, location, excerpt)
}

/// Up to `max_chars` characters of `text`, starting at `heading` when found
///
/// Truncation never splits a character; a cut excerpt ends with `...`.
pub fn excerpt(text: &str, heading: Option<&str>, max_chars: usize) -> String {
    let start = heading
        .and_then(|h| find_heading(text, h))
        .unwrap_or(0);
    let text = text[start..].trim();

    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", text[..cut].trim_end()),
        None => text.to_string(),
    }
}

/// Byte offset of the Markdown heading line whose text equals `heading`
fn find_heading(text: &str, heading: &str) -> Option<usize> {
    let wanted = heading.trim();
    let mut offset = 0;

    for line in text.split_inclusive('\n') {
        let trimmed = line.trim();
        if trimmed.starts_with('#') && trimmed.trim_start_matches('#').trim() == wanted {
            return Some(offset);
        }
        offset += line.len();
    }

    None
}
