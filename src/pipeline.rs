//! End-to-end sequence generation for one request.
//!
//! Two entry shapes share the deterministic tail:
//!
//! - pasted text: parse → complete → intro rules → links → availability
//! - lead intel: research (when no brief) → orchestrator → redundancy →
//!   intro rules → links → availability
//!
//! Both then settle the instrument (override, else detection over the final
//! section text) and select and insert attachments for email 1 and email 2.
//! Stages run sequentially; only model calls suspend.

use std::time::Duration;

use serde::Serialize;
use tracing::Instrument;

use crate::assets::inserter::insert_assets;
use crate::assets::keywords::{extract_keywords, filter_assets_by_keywords};
use crate::assets::selector::{select_assets, ModelAssistedSelector, SelectionContext};
use crate::assets::{Asset, InstrumentOverride, Platform, SelectedAssets};
use crate::config::Config;
use crate::providers::router::{ModelRole, ModelRouter, RouterError};
use crate::providers::writer::ModelWriter;
use crate::providers::ProviderError;
use crate::research::ResearchClient;
use crate::sequence::availability::{inject_availability, AvailabilityInput};
use crate::sequence::intro::enforce_intro_rules;
use crate::sequence::links::{inject_links_in_sections, LinkFormat};
use crate::sequence::orchestrator::{GenerationError, SequenceOrchestrator};
use crate::sequence::parser::{detect_instrument, parse_sequence};
use crate::sequence::record::{derive_sequence_name, SequenceRecord};
use crate::sequence::redundancy::RedundancyChecker;
use crate::sequence::{SectionKey, SenderIdentity, SequenceSections};

/// Longest accepted pasted text or lead intel, in characters.
pub const MAX_INPUT_CHARS: usize = 50_000;

// ---------------------------------------------------------------------------
// Request / response
// ---------------------------------------------------------------------------

/// What the sequence is built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationInput {
    /// A finished sequence pasted by the user.
    Pasted(String),
    /// Lead intel, with a research brief when the caller already has one.
    Lead {
        /// Free-text lead information.
        lead_intel: String,
        /// Research brief; fetched from the research model when absent.
        research_brief: Option<String>,
    },
}

impl GenerationInput {
    fn raw_text(&self) -> &str {
        match self {
            Self::Pasted(text) => text,
            Self::Lead { lead_intel, .. } => lead_intel,
        }
    }
}

/// One generation request.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    /// Source text.
    pub input: GenerationInput,
    /// Availability to inject, if any.
    pub availability: Option<AvailabilityInput>,
    /// Platform override, or auto-detection.
    pub instrument: InstrumentOverride,
    /// Knowledge-base snapshot for attachment selection.
    pub assets: Vec<Asset>,
    /// Sequence name; derived from the input when absent.
    pub name: Option<String>,
}

impl GenerationRequest {
    /// Request with no availability, auto instrument, no assets and no name.
    pub fn new(input: GenerationInput) -> Self {
        Self {
            input,
            availability: None,
            instrument: InstrumentOverride::Auto,
            assets: Vec::new(),
            name: None,
        }
    }
}

/// Output of a successful run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedSequence {
    /// Sequence name.
    pub name: String,
    /// Detected or overridden platform.
    pub instrument: Platform,
    /// All six sections.
    pub sections: SequenceSections,
    /// Attachments for email 1.
    pub selected_assets: Option<SelectedAssets>,
    /// Attachments for email 2.
    pub selected_assets_email2: Option<SelectedAssets>,
    /// Pasted text or lead intel.
    pub raw_input: String,
    /// Brief used for generation.
    pub research_brief: Option<String>,
    /// Availability that was injected.
    pub availability: Option<AvailabilityInput>,
}

impl GeneratedSequence {
    /// Shape the result for the persistence layer.
    pub fn into_record(self) -> SequenceRecord {
        SequenceRecord {
            id: None,
            name: self.name,
            instrument: self.instrument,
            raw_input: self.raw_input,
            research_brief: self.research_brief,
            availability: self.availability,
            sections: self.sections,
            selected_assets: self.selected_assets,
            selected_assets_email2: self.selected_assets_email2,
            created_at: chrono::Utc::now(),
        }
    }
}

/// Request failure. Partial sections are never returned.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Input was empty or too long.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// The research call failed.
    #[error("company research failed: {0}")]
    Research(#[source] ProviderError),
    /// Outline or model drafting failed.
    #[error(transparent)]
    Generation(#[from] GenerationError),
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// Shared, stateless generation pipeline.
#[derive(Debug, Clone)]
pub struct OutreachPipeline {
    orchestrator: SequenceOrchestrator,
    research: ResearchClient,
    redundancy: RedundancyChecker,
    selector: Option<ModelAssistedSelector>,
    sender: SenderIdentity,
    link_format: LinkFormat,
    max_attachment_bytes: u64,
}

impl OutreachPipeline {
    /// Resolve every role's model and build the pipeline.
    ///
    /// # Errors
    ///
    /// Returns an error if a role's provider cannot be resolved.
    pub fn new(router: &ModelRouter, config: &Config) -> Result<Self, RouterError> {
        let timeout = Duration::from_secs(config.generation.request_timeout_secs);
        let max_tokens = config.generation.max_tokens;
        let writer = |role: ModelRole| -> Result<ModelWriter, RouterError> {
            let provider = router.resolve(role)?;
            tracing::debug!(role = %role, model = %provider.model_id(), "resolved model");
            Ok(ModelWriter::new(provider, timeout, max_tokens))
        };

        let orchestrator = SequenceOrchestrator::new(
            writer(ModelRole::Draft)?,
            writer(ModelRole::Rewrite)?,
            config.sender.clone(),
        );
        let selector = if config.assets.model_assisted {
            Some(ModelAssistedSelector::new(writer(ModelRole::Assets)?))
        } else {
            None
        };

        Ok(Self {
            orchestrator,
            research: ResearchClient::new(writer(ModelRole::Research)?),
            redundancy: RedundancyChecker::new(
                writer(ModelRole::Redundancy)?,
                config.generation.redundancy_threshold,
            ),
            selector,
            sender: config.sender.clone(),
            link_format: config.generation.link_format,
            max_attachment_bytes: config.assets.max_attachment_bytes,
        })
    }

    /// Run one request to completion.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidInput`] for empty or oversized input,
    /// and propagates research, outline and drafting failures.
    pub async fn run(&self, request: GenerationRequest) -> Result<GeneratedSequence, PipelineError> {
        validate_input(request.input.raw_text())?;
        let run_id = uuid::Uuid::new_v4();
        self.generate(request, run_id)
            .instrument(tracing::info_span!("generation", %run_id))
            .await
    }

    async fn generate(
        &self,
        request: GenerationRequest,
        run_id: uuid::Uuid,
    ) -> Result<GeneratedSequence, PipelineError> {
        let mode = match &request.input {
            GenerationInput::Pasted(_) => "pasted",
            GenerationInput::Lead { .. } => "lead",
        };
        tracing::info!(%run_id, mode, assets = request.assets.len(), "generation started");

        let (sections, brief) = match &request.input {
            GenerationInput::Pasted(text) => (parse_sequence(text).completed(), None),
            GenerationInput::Lead {
                lead_intel,
                research_brief,
            } => {
                let brief = match research_brief.as_deref().map(str::trim) {
                    Some(brief) if !brief.is_empty() => brief.to_owned(),
                    _ => self
                        .research
                        .research_company(lead_intel)
                        .await
                        .map_err(PipelineError::Research)?,
                };
                let generation = self.orchestrator.generate(lead_intel, &brief).await?;
                if !generation.residual_violations.is_empty() {
                    tracing::warn!(
                        %run_id,
                        count = generation.residual_violations.len(),
                        "sequence accepted with residual violations"
                    );
                }
                let sections = self.redundancy.check(&generation.sections.completed()).await;
                (sections, Some(brief))
            }
        };

        let mut sections = enforce_intro_rules(&sections, &self.sender);
        sections = inject_links_in_sections(&sections, self.link_format);
        if let Some(availability) = &request.availability {
            sections = inject_availability(&sections, availability);
        }
        let platform = resolve_platform(request.instrument, || {
            detect_instrument(&sections.all_text())
        });

        let candidates = match &request.input {
            GenerationInput::Pasted(text) => {
                filter_assets_by_keywords(&request.assets, &extract_keywords(text, ""))
            }
            GenerationInput::Lead { lead_intel, .. } => filter_assets_by_keywords(
                &request.assets,
                &extract_keywords(lead_intel, brief.as_deref().unwrap_or_default()),
            ),
        };
        let (sections, selected_assets, selected_assets_email2) =
            self.attach_assets(sections, &candidates, platform).await;

        let raw_input = request.input.raw_text().to_owned();
        let name = request
            .name
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| derive_sequence_name(&raw_input));

        tracing::info!(%run_id, name = %name, instrument = %platform, "generation finished");
        Ok(GeneratedSequence {
            name,
            instrument: platform,
            sections,
            selected_assets,
            selected_assets_email2,
            raw_input,
            research_brief: brief,
            availability: request.availability,
        })
    }

    /// Select and insert attachments for email 1, then email 2 without
    /// repeating email 1's files.
    async fn attach_assets(
        &self,
        sections: SequenceSections,
        assets: &[Asset],
        platform: Platform,
    ) -> (SequenceSections, Option<SelectedAssets>, Option<SelectedAssets>) {
        if assets.is_empty() {
            return (sections, None, None);
        }

        let first = self
            .select(SectionKey::Email1, &sections, assets, platform, &[])
            .await;
        let sections = insert_assets(&sections, SectionKey::Email1, &first, &self.sender);

        let used = first.file_names();
        let second = self
            .select(SectionKey::Email2, &sections, assets, platform, &used)
            .await;
        let sections = insert_assets(&sections, SectionKey::Email2, &second, &self.sender);

        (
            sections,
            (!first.is_empty()).then_some(first),
            (!second.is_empty()).then_some(second),
        )
    }

    async fn select(
        &self,
        key: SectionKey,
        sections: &SequenceSections,
        assets: &[Asset],
        platform: Platform,
        exclude: &[String],
    ) -> SelectedAssets {
        let ctx = SelectionContext {
            body: sections.body(key),
            assets,
            platform,
            exclude,
            max_bytes: self.max_attachment_bytes,
        };
        let selected = match &self.selector {
            Some(selector) => selector.select(&ctx).await,
            None => select_assets(&ctx),
        };
        tracing::debug!(
            section = %key,
            image = %selected.image,
            documents = ?selected.documents,
            "assets selected"
        );
        selected
    }
}

fn validate_input(text: &str) -> Result<(), PipelineError> {
    if text.trim().is_empty() {
        return Err(PipelineError::InvalidInput("input text is empty".to_owned()));
    }
    let chars = text.chars().count();
    if chars > MAX_INPUT_CHARS {
        return Err(PipelineError::InvalidInput(format!(
            "input is {chars} characters, limit is {MAX_INPUT_CHARS}"
        )));
    }
    Ok(())
}

fn resolve_platform(instrument: InstrumentOverride, detect: impl FnOnce() -> Platform) -> Platform {
    match instrument {
        InstrumentOverride::Fixed(platform) => platform,
        InstrumentOverride::Auto => detect(),
    }
}
