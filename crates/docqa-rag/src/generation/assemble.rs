//! Prompt assembly
//!
//! Merges the windowed conversation history with retrieved chunks into
//! one structured prompt using the collection's template. Assembly is
//! pure: the same inputs always produce byte-identical output.

use crate::config::ContextConfig;
use crate::index::ScoredChunk;
use crate::registry::PromptTemplate;
use crate::types::conversation::ConversationTurn;

/// Rendering of one retrieved chunk when the collection does not
/// configure its own `context_template`. Includes the source filename
/// so answers can point back at the file.
const DEFAULT_CONTEXT_TEMPLATE: &str = "[{source}]\n{text}";

/// Structural default user prompt. Keeps retrieved text clearly
/// separated from the live question so the model does not mistake
/// context for instructions.
const DEFAULT_USER_PROMPT_TEMPLATE: &str = "Use only the context below to answer the question.\n\n\
     Context:\n{context}\n\nQuestion: {query}\n\nAnswer:";

/// Placeholder rendered when retrieval produced nothing
const EMPTY_CONTEXT_MARKER: &str = "(no relevant context found)";

/// A fully rendered prompt plus the sources that went into it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembledPrompt {
    /// System prompt from the template
    pub system: String,
    /// Rendered history, context, and question
    pub user: String,
    /// Source names of the chunks included, de-duplicated, in order of
    /// first appearance
    pub source_refs: Vec<String>,
}

/// Prompt assembly stage of the ask path
pub struct ContextAssembler {
    history_window: usize,
}

impl ContextAssembler {
    pub fn new(history_window: usize) -> Self {
        Self { history_window }
    }

    pub fn from_config(config: &ContextConfig) -> Self {
        Self::new(config.history_window)
    }

    /// Assemble the final prompt.
    ///
    /// Chunks are rendered in descending similarity order with the
    /// chunk id as tie-break; history keeps the caller's order and is
    /// windowed to the most recent non-blank turns.
    pub fn assemble(
        &self,
        template: &PromptTemplate,
        question: &str,
        history: &[ConversationTurn],
        hits: &[ScoredChunk],
    ) -> AssembledPrompt {
        let mut ordered: Vec<&ScoredChunk> = hits.iter().collect();
        ordered.sort_by(|a, b| {
            b.similarity
                .total_cmp(&a.similarity)
                .then_with(|| a.chunk.chunk_id.cmp(&b.chunk.chunk_id))
        });

        let context_template = template
            .context_template
            .as_deref()
            .unwrap_or(DEFAULT_CONTEXT_TEMPLATE);

        let mut source_refs: Vec<String> = Vec::new();
        let rendered_chunks: Vec<String> = ordered
            .iter()
            .map(|hit| {
                if !source_refs.contains(&hit.chunk.source_name) {
                    source_refs.push(hit.chunk.source_name.clone());
                }
                context_template
                    .replace("{source}", &hit.chunk.source_name)
                    .replace("{text}", &hit.chunk.text)
            })
            .collect();

        let context = if rendered_chunks.is_empty() {
            EMPTY_CONTEXT_MARKER.to_string()
        } else {
            rendered_chunks.join("\n\n---\n\n")
        };

        let user_template = template
            .user_prompt_template
            .as_deref()
            .unwrap_or(DEFAULT_USER_PROMPT_TEMPLATE);
        let filled = user_template
            .replace("{context}", &context)
            .replace("{query}", question);

        let mut user = String::new();
        let windowed = window_history(history, self.history_window);
        if !windowed.is_empty() {
            user.push_str("Conversation so far:\n");
            for turn in &windowed {
                user.push_str(turn.role.as_str());
                user.push_str(": ");
                user.push_str(turn.content.trim());
                user.push('\n');
            }
            user.push('\n');
        }
        user.push_str(&filled);

        AssembledPrompt {
            system: template.system_prompt.clone(),
            user,
            source_refs,
        }
    }
}

/// Keep the most recent `window` non-blank turns, preserving the
/// caller's order.
pub fn window_history(history: &[ConversationTurn], window: usize) -> Vec<&ConversationTurn> {
    let non_blank: Vec<&ConversationTurn> = history.iter().filter(|t| !t.is_blank()).collect();
    let start = non_blank.len().saturating_sub(window);
    non_blank[start..].to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::document::{Chunk, Document};

    fn hit(source: &str, text: &str, similarity: f32) -> ScoredChunk {
        let doc = Document::new("c1", "f1", source, text);
        let mut chunk = Chunk::new(&doc, text.to_string(), 0, text.len(), 0, "m1".into());
        chunk.embedding = vec![1.0];
        ScoredChunk { chunk, similarity }
    }

    fn assembler() -> ContextAssembler {
        ContextAssembler::new(6)
    }

    #[test]
    fn windowing_keeps_last_n_non_blank_in_order() {
        let mut history = Vec::new();
        for i in 0..20 {
            history.push(ConversationTurn::user(format!("turn {i}")));
            if i % 5 == 0 {
                history.push(ConversationTurn::assistant("   "));
            }
        }

        let windowed = window_history(&history, 6);
        assert_eq!(windowed.len(), 6);
        let contents: Vec<&str> = windowed.iter().map(|t| t.content.as_str()).collect();
        assert_eq!(
            contents,
            vec!["turn 14", "turn 15", "turn 16", "turn 17", "turn 18", "turn 19"]
        );
    }

    #[test]
    fn assembly_is_deterministic() {
        let template = PromptTemplate::default();
        let history = vec![
            ConversationTurn::user("earlier question"),
            ConversationTurn::assistant("earlier answer"),
        ];
        let hits = vec![hit("a.pdf", "alpha", 0.9), hit("b.pdf", "beta", 0.8)];

        let first = assembler().assemble(&template, "what now?", &history, &hits);
        let second = assembler().assemble(&template, "what now?", &history, &hits);
        assert_eq!(first, second);
    }

    #[test]
    fn chunks_render_in_descending_similarity_order() {
        let template = PromptTemplate::default();
        let hits = vec![
            hit("low.pdf", "low text", 0.2),
            hit("high.pdf", "high text", 0.9),
        ];

        let prompt = assembler().assemble(&template, "q", &[], &hits);
        let high_pos = prompt.user.find("high text").unwrap();
        let low_pos = prompt.user.find("low text").unwrap();
        assert!(high_pos < low_pos);
        assert_eq!(prompt.source_refs, vec!["high.pdf", "low.pdf"]);
    }

    #[test]
    fn source_refs_deduplicate_by_first_appearance() {
        let template = PromptTemplate::default();
        let hits = vec![
            hit("guide.pdf", "part one", 0.9),
            hit("notes.txt", "other", 0.8),
            hit("guide.pdf", "part two", 0.7),
        ];

        let prompt = assembler().assemble(&template, "q", &[], &hits);
        assert_eq!(prompt.source_refs, vec!["guide.pdf", "notes.txt"]);
    }

    #[test]
    fn default_template_separates_context_from_question() {
        let template = PromptTemplate::default();
        let prompt = assembler().assemble(&template, "How many days?", &[], &[]);

        assert!(prompt.user.contains("Context:"));
        assert!(prompt.user.contains(EMPTY_CONTEXT_MARKER));
        assert!(prompt.user.contains("Question: How many days?"));
        assert!(prompt.source_refs.is_empty());
    }

    #[test]
    fn custom_templates_are_honored() {
        let template = PromptTemplate {
            user_prompt_template: Some("Q={query} C={context}".into()),
            context_template: Some("<{source}> {text}".into()),
            ..PromptTemplate::default()
        };
        let hits = vec![hit("doc.pdf", "payload", 0.5)];

        let prompt = assembler().assemble(&template, "why?", &[], &hits);
        assert_eq!(prompt.user, "Q=why? C=<doc.pdf> payload");
    }

    #[test]
    fn history_renders_with_normalized_roles() {
        let template = PromptTemplate::default();
        let history = vec![
            ConversationTurn::user("first"),
            ConversationTurn::assistant("second"),
        ];

        let prompt = assembler().assemble(&template, "q", &history, &[]);
        assert!(prompt.user.contains("user: first\n"));
        assert!(prompt.user.contains("assistant: second\n"));
        // History precedes the question block
        assert!(prompt.user.find("Conversation so far:").unwrap() < prompt.user.find("Question:").unwrap());
    }

    #[test]
    fn no_randomness_no_timestamps() {
        // Two assemblers over chunks with identical scores still agree
        // because ties fall back to chunk id.
        let template = PromptTemplate::default();
        let a = hit("a.pdf", "same", 0.5);
        let b = hit("b.pdf", "same", 0.5);
        let expected_first = if a.chunk.chunk_id < b.chunk.chunk_id {
            "a.pdf"
        } else {
            "b.pdf"
        };
        let hits = vec![a, b];

        let prompt = assembler().assemble(&template, "q", &[], &hits);
        assert_eq!(prompt.source_refs[0], expected_first);
    }
}
