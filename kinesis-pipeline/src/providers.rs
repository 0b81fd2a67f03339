//! Seams for the hosted models the pipeline talks to.
//!
//! Both capabilities are passed explicitly to the components that need them;
//! nothing in this crate holds a process-wide client.

use async_trait::async_trait;
use std::collections::{BTreeSet, HashMap};

use crate::error::{PipelineError, PipelineResult};

/// Turns text into a fixed-length embedding vector.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embeds one text. The result must have `dimension()` components.
    async fn embed(&self, text: &str) -> PipelineResult<Vec<f32>>;

    fn dimension(&self) -> usize;
}

/// Free-form text generation from a fully rendered prompt.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> PipelineResult<String>;
}

/// A prompt with `{name}` placeholders.
///
/// `{{` and `}}` render as literal braces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    text: String,
}

enum Piece<'a> {
    Literal(&'a str),
    Variable(&'a str),
}

impl PromptTemplate {
    pub fn new(text: impl Into<String>) -> Self {
        PromptTemplate { text: text.into() }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Placeholder names, sorted and deduplicated.
    pub fn variables(&self) -> BTreeSet<&str> {
        self.pieces()
            .filter_map(|piece| match piece {
                Piece::Variable(name) => Some(name),
                Piece::Literal(_) => None,
            })
            .collect()
    }

    /// Substitutes every placeholder; a placeholder without a value is an error.
    pub fn render(&self, values: &HashMap<&str, &str>) -> PipelineResult<String> {
        let mut rendered = String::with_capacity(self.text.len());
        for piece in self.pieces() {
            match piece {
                Piece::Literal(text) => rendered.push_str(text),
                Piece::Variable(name) => {
                    let value = values
                        .get(name)
                        .ok_or_else(|| PipelineError::MissingVariable(name.to_string()))?;
                    rendered.push_str(value);
                }
            }
        }
        Ok(rendered)
    }

    fn pieces(&self) -> impl Iterator<Item = Piece<'_>> {
        let text = self.text.as_str();
        let mut rest = text;
        std::iter::from_fn(move || {
            if rest.is_empty() {
                return None;
            }
            if let Some(after) = rest.strip_prefix("{{") {
                rest = after;
                return Some(Piece::Literal("{"));
            }
            if let Some(after) = rest.strip_prefix("}}") {
                rest = after;
                return Some(Piece::Literal("}"));
            }
            if let Some(after) = rest.strip_prefix('{') {
                if let Some(close) = after.find('}') {
                    let name = &after[..close];
                    if is_identifier(name) {
                        rest = &after[close + 1..];
                        return Some(Piece::Variable(name));
                    }
                }
                rest = after;
                return Some(Piece::Literal("{"));
            }
            let next = rest
                .char_indices()
                .skip(1)
                .find(|&(_, c)| c == '{' || c == '}')
                .map_or(rest.len(), |(i, _)| i);
            let (literal, after) = rest.split_at(next);
            rest = after;
            Some(Piece::Literal(literal))
        })
    }
}

fn is_identifier(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}
