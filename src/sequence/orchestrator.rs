//! Model-driven drafting of a six-part sequence.
//!
//! Stages run strictly in order:
//! `OutlineBuilt → Drafted → AnchorEnforced → VoiceCompressed → Suppressed → Parsed`.
//! Any failed model call aborts the generation with the stage it failed in.
//! The suppression rewrite runs at most once; violations that survive it are
//! logged and accepted.

use std::fmt;

use super::outline::{build_content_outline, build_user_message, ContentOutline, OutlineError};
use super::parser::parse_model_output;
use super::prompts::{voice_prompt, writer_prompt, ANCHOR_PROMPT, SUPPRESSION_PROMPT};
use super::violations::detect_violations;
use super::{SenderIdentity, SequenceSections};
use crate::providers::writer::ModelWriter;
use crate::providers::ProviderError;

/// Pipeline states, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GenerationStage {
    /// Outline derived from the research brief.
    OutlineBuilt,
    /// First draft written.
    Drafted,
    /// Emails 1 and 2 anchored to the prospect context.
    AnchorEnforced,
    /// Voice compression applied.
    VoiceCompressed,
    /// Violation cleanup applied (or not needed).
    Suppressed,
    /// Text parsed back into sections.
    Parsed,
}

impl fmt::Display for GenerationStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::OutlineBuilt => "outline",
            Self::Drafted => "draft",
            Self::AnchorEnforced => "anchor",
            Self::VoiceCompressed => "voice",
            Self::Suppressed => "suppression",
            Self::Parsed => "parse",
        };
        f.write_str(name)
    }
}

/// Generation failure.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    /// The brief could not produce an outline.
    #[error(transparent)]
    Outline(#[from] OutlineError),
    /// A model call failed while entering `stage`.
    #[error("model call failed during {stage} stage: {source}")]
    Model {
        /// Stage whose transition failed.
        stage: GenerationStage,
        /// Provider failure.
        #[source]
        source: ProviderError,
    },
}

/// Result of a successful generation.
#[derive(Debug, Clone)]
pub struct Generation {
    /// Outline the draft was constrained by.
    pub outline: ContentOutline,
    /// Parsed sections (all six keys).
    pub sections: SequenceSections,
    /// Violations still present after the single suppression pass.
    pub residual_violations: Vec<String>,
}

/// Drafting and rewriting models for the orchestrator.
#[derive(Debug, Clone)]
pub struct SequenceOrchestrator {
    drafter: ModelWriter,
    rewriter: ModelWriter,
    sender: SenderIdentity,
}

impl SequenceOrchestrator {
    /// Orchestrator using `drafter` for the first draft and `rewriter` for
    /// the three rewrite passes.
    pub fn new(drafter: ModelWriter, rewriter: ModelWriter, sender: SenderIdentity) -> Self {
        Self {
            drafter,
            rewriter,
            sender,
        }
    }

    /// Run every stage for one prospect.
    ///
    /// # Errors
    ///
    /// Returns [`GenerationError::Outline`] when the brief names no platform
    /// and [`GenerationError::Model`] when any model call fails.
    pub async fn generate(
        &self,
        lead_intel: &str,
        research_brief: &str,
    ) -> Result<Generation, GenerationError> {
        let outline = build_content_outline(lead_intel, research_brief)?;
        tracing::info!(
            stage = %GenerationStage::OutlineBuilt,
            platform = %outline.platform,
            anchor = %outline.prospect_anchor,
            "outline built"
        );

        let user_message = build_user_message(&outline, &self.sender);
        let draft = self
            .drafter
            .draft(&writer_prompt(&self.sender), &user_message)
            .await
            .map_err(stage_error(GenerationStage::Drafted))?;
        tracing::info!(stage = %GenerationStage::Drafted, chars = draft.len(), "draft written");

        let anchored_input = format!("Prospect context: {}\n\n{draft}", outline.prospect_anchor);
        let anchored = self
            .rewriter
            .rewrite(ANCHOR_PROMPT, &anchored_input)
            .await
            .map_err(stage_error(GenerationStage::AnchorEnforced))?;
        tracing::info!(stage = %GenerationStage::AnchorEnforced, "prospect anchor pass complete");

        let compressed = self
            .rewriter
            .rewrite(&voice_prompt(&self.sender), &anchored)
            .await
            .map_err(stage_error(GenerationStage::VoiceCompressed))?;
        tracing::info!(stage = %GenerationStage::VoiceCompressed, "voice pass complete");

        let (final_text, residual_violations) = self.suppress(compressed).await?;

        let sections = parse_model_output(&final_text);
        tracing::info!(
            stage = %GenerationStage::Parsed,
            sections = sections.len(),
            "sequence parsed"
        );

        Ok(Generation {
            outline,
            sections,
            residual_violations,
        })
    }

    /// One suppression rewrite when violations are present. Never loops.
    async fn suppress(&self, text: String) -> Result<(String, Vec<String>), GenerationError> {
        let violations = detect_violations(&text);
        if violations.is_empty() {
            return Ok((text, Vec::new()));
        }

        tracing::info!(
            stage = %GenerationStage::Suppressed,
            violations = ?violations,
            "violations detected, rewriting once"
        );
        let cleaned = self
            .rewriter
            .rewrite(SUPPRESSION_PROMPT, &text)
            .await
            .map_err(stage_error(GenerationStage::Suppressed))?;

        let residual = detect_violations(&cleaned);
        if !residual.is_empty() {
            tracing::warn!(violations = ?residual, "violations remain after suppression pass");
        }
        Ok((cleaned, residual))
    }
}

fn stage_error(stage: GenerationStage) -> impl FnOnce(ProviderError) -> GenerationError {
    move |source| GenerationError::Model { stage, source }
}
