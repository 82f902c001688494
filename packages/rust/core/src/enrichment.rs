//! Per-block annotation.
//!
//! Builds the prompt pair for the configured [`EnrichmentMode`] and turns the
//! generator's answer into an [`Annotation`]. A failed call never escapes:
//! it becomes [`Annotation::Failed`] and the run moves on.

use tracing::{debug, warn};

use leetscribe_shared::{Annotation, EnrichmentMode, EnrichmentSettings, ExtractedBlock};

use crate::generator::{GenerationRequest, TextGenerator};

const COMPLEXITY_SYSTEM_PROMPT: &str = "You are a senior software engineer who determines the \
     time and space complexity for code snippets. Please be concise and accurate.";

// ---------------------------------------------------------------------------
// Prompts
// ---------------------------------------------------------------------------

/// System prompt for a mode.
pub fn system_prompt(settings: &EnrichmentSettings) -> String {
    match settings.mode {
        EnrichmentMode::Complexity => COMPLEXITY_SYSTEM_PROMPT.to_string(),
        EnrichmentMode::Convert => format!(
            "You are a senior software engineer who converts code to {}.",
            settings.target_language
        ),
    }
}

/// User prompt wrapping `snippet`.
pub fn user_prompt(settings: &EnrichmentSettings, snippet: &str) -> String {
    match settings.mode {
        EnrichmentMode::Complexity => format!(
            "Given the following {} code snippet, please:\n\
             1. State the time complexity in Big-O notation.\n\
             2. State the space complexity in Big-O notation.\n\
             3. Provide a short explanation.\n\
             \n\
             Code snippet:\n\
             \n\
             {snippet}\n",
            settings.language
        ),
        EnrichmentMode::Convert => format!(
            "Convert the following {} code snippet to equivalent {} code:\n\
             \n\
             {snippet}\n",
            settings.language, settings.target_language
        ),
    }
}

// ---------------------------------------------------------------------------
// Enricher
// ---------------------------------------------------------------------------

/// Annotates extracted blocks through a [`TextGenerator`].
pub struct Enricher<G> {
    generator: G,
    settings: EnrichmentSettings,
}

impl<G: TextGenerator> Enricher<G> {
    pub fn new(generator: G, settings: EnrichmentSettings) -> Self {
        Self {
            generator,
            settings,
        }
    }

    pub fn settings(&self) -> &EnrichmentSettings {
        &self.settings
    }

    pub fn request_for(&self, snippet: &str) -> GenerationRequest {
        GenerationRequest {
            model: self.settings.model.clone(),
            system_prompt: system_prompt(&self.settings),
            user_prompt: user_prompt(&self.settings, snippet),
            temperature: self.settings.temperature,
        }
    }

    /// Annotate one block. Blocks without captured code are not sent.
    pub async fn annotate(&self, block: &ExtractedBlock) -> Annotation {
        if !block.has_code() {
            debug!(index = block.sequence_index, status = ?block.status, "nothing to annotate");
            return Annotation::Skipped;
        }

        match self.generator.generate(&self.request_for(&block.raw_text)).await {
            Ok(text) => Annotation::Generated(text),
            Err(e) => {
                warn!(
                    index = block.sequence_index,
                    mode = %self.settings.mode,
                    error = %e,
                    "generation failed"
                );
                Annotation::Failed
            }
        }
    }
}
