//! Company research: turns lead intel into a research brief.
//!
//! The brief is consumed by [`crate::sequence::outline`], so its headings are
//! fixed by [`RESEARCH_PROMPT`].

use crate::providers::writer::ModelWriter;
use crate::providers::ProviderError;
use crate::sequence::prompts::RESEARCH_PROMPT;

/// Research calls backed by the research model role.
#[derive(Debug, Clone)]
pub struct ResearchClient {
    writer: ModelWriter,
}

impl ResearchClient {
    /// Client using `writer` for research calls.
    pub fn new(writer: ModelWriter) -> Self {
        Self { writer }
    }

    /// Produce a research brief for the lead.
    ///
    /// # Errors
    ///
    /// Returns the provider error unchanged; research failure is fatal for
    /// the request.
    pub async fn research_company(&self, lead_intel: &str) -> Result<String, ProviderError> {
        tracing::info!(model = %self.writer.model_id(), "researching lead");
        let user = format!("Lead information:\n{}", lead_intel.trim());
        let brief = self.writer.draft(RESEARCH_PROMPT, &user).await?;
        tracing::debug!(chars = brief.len(), "research brief received");
        Ok(brief)
    }
}
