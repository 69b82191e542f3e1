//! Extractive generator.

use async_trait::async_trait;
use tracing::debug;

use ragd_core::{Generator, RagError, Result};

const DEFAULT_MAX_PROMPT_CHARS: usize = 8000;
const MAX_EXTRACT_CHARS: usize = 400;

/// Offline generative capability.
///
/// Answers by extracting the highest-ranked document passage from the prompt's
/// context block instead of calling a hosted model. Useful for air-gapped
/// deployments and as the default backend in tests; a hosted LLM client
/// implements the same `Generator` trait.
pub struct ExtractiveGenerator {
    max_prompt_chars: usize,
}

impl ExtractiveGenerator {
    pub fn new() -> Self {
        Self {
            max_prompt_chars: DEFAULT_MAX_PROMPT_CHARS,
        }
    }

    /// Create a generator with a custom prompt budget.
    pub fn with_prompt_budget(max_prompt_chars: usize) -> Self {
        Self { max_prompt_chars }
    }
}

impl Default for ExtractiveGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Generator for ExtractiveGenerator {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let prompt_chars = prompt.chars().count();
        if prompt_chars > self.max_prompt_chars {
            return Err(RagError::generation(format!(
                "prompt of {} chars exceeds budget of {}",
                prompt_chars, self.max_prompt_chars
            )));
        }

        let passage = first_document_passage(prompt).ok_or_else(|| {
            RagError::generation("prompt contains no reference documents")
        })?;

        debug!(
            "Extracted {} chars from top-ranked document",
            passage.chars().count()
        );

        let mut answer = passage;
        if answer.chars().count() > MAX_EXTRACT_CHARS {
            answer = answer.chars().take(MAX_EXTRACT_CHARS).collect();
            answer.push_str("...");
        }

        Ok(answer)
    }

    fn max_prompt_chars(&self) -> usize {
        self.max_prompt_chars
    }
}

/// Pull the text of `[Document 1]` out of the prompt's context block.
fn first_document_passage(prompt: &str) -> Option<String> {
    let start = prompt.find("[Document 1]")?;
    let body = &prompt[start + "[Document 1]".len()..];

    let end = body
        .find("\n[Document ")
        .or_else(|| body.find("\nQuestion:"))
        .unwrap_or(body.len());

    let passage = body[..end].trim();
    if passage.is_empty() {
        None
    } else {
        Some(passage.to_string())
    }
}
