//! End-to-end pipeline runs against scripted providers.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use outreach::assets::{Asset, AssetType, Instrument, InstrumentOverride, Platform};
use outreach::config::Config;
use outreach::pipeline::{
    GenerationInput, GenerationRequest, OutreachPipeline, PipelineError, MAX_INPUT_CHARS,
};
use outreach::providers::router::ModelRouter;
use outreach::providers::{
    CompletionRequest, CompletionResponse, LlmProvider, ProviderError, StopReason, UsageStats,
};
use outreach::sequence::availability::AvailabilityInput;
use outreach::sequence::orchestrator::GenerationError;
use outreach::sequence::outline::OutlineError;
use outreach::sequence::record::UNTITLED_SEQUENCE;
use outreach::sequence::SectionKey;

const PASTED: &str = "Email 1
Subject: Spatial view of your kidney cohort
Hi Sarah,

You cannot see where immune cells sit in bulk data.

GeoMx Digital Spatial Profiler maps them in place.

{{availability}}

Best,
Tim

Email 2
Subject: Another angle
Hi {{first_name}},

A new grant means more kidney biopsies to profile.

{{availability}}

LinkedIn Connection Request
Hi {{first_name}}, glad to connect.

LinkedIn Message
I sent a note by email.

Email 3
Subject: One more idea
Hi {{first_name}},

GeoMx profiles whole transcriptome in regions you choose.

{{availability}}

Email 4
Subject: Closing
Hi {{first_name}},

Timing may not be right, so I will reconnect later.";

const BRIEF: &str = "Research focus and disease area
- lupus nephritis biopsies
Instrument: GeoMx
Likely pain / gap
- Limited to bulk RNA-seq";

const DRAFTED: &str = "Email 1
Subject: Kidney biopsy context
Hi {{first_name}},

You are limited to bulk RNA-seq on lupus nephritis biopsies.

{{availability}}

Email 2
Subject: Another angle
Hi {{first_name}},

A second look at the same cohort.

{{availability}}

LinkedIn Connection Request
Glad to connect.

LinkedIn Message
I sent a note by email.

Email 3
Subject: One more idea
Hi {{first_name}},

With GeoMx, you can profile regions you pick on each slide.

{{availability}}

Email 4
Subject: Closing out
Hi {{first_name}},

Timing may not be right, so I will reconnect later this year.";

/// Answers calls from a queue. `None` entries fail the call.
#[derive(Debug, Default)]
struct ScriptedProvider {
    responses: Mutex<VecDeque<Option<String>>>,
    calls: Mutex<usize>,
}

impl ScriptedProvider {
    fn new(responses: &[Option<&str>]) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.iter().map(|r| r.map(str::to_owned)).collect()),
            calls: Mutex::new(0),
        })
    }

    fn call_count(&self) -> usize {
        *self.calls.lock().expect("lock")
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    async fn complete(
        &self,
        _request: CompletionRequest,
    ) -> Result<CompletionResponse, ProviderError> {
        *self.calls.lock().expect("lock") += 1;
        match self.responses.lock().expect("lock").pop_front().flatten() {
            Some(text) => Ok(CompletionResponse {
                text,
                stop_reason: StopReason::EndTurn,
                usage: UsageStats::default(),
                model: "test/scripted".to_owned(),
            }),
            None => Err(ProviderError::Unavailable("scripted failure".to_owned())),
        }
    }

    fn model_id(&self) -> &str {
        "test/scripted"
    }
}

fn pipeline(provider: &Arc<ScriptedProvider>) -> OutreachPipeline {
    let router = ModelRouter::for_testing(
        "test/scripted".to_owned(),
        Arc::clone(provider) as Arc<dyn LlmProvider>,
    );
    let mut config = Config::default();
    config.assets.model_assisted = false;
    OutreachPipeline::new(&router, &config).expect("pipeline should build")
}

fn asset(file_name: &str, kind: AssetType, summary: &str) -> Asset {
    Asset {
        id: None,
        file_name: file_name.to_owned(),
        instrument: Instrument::GeoMx,
        kind,
        size: 1024 * 1024,
        summary: Some(summary.to_owned()),
        keywords: None,
        file_path: format!("/assets/{file_name}"),
    }
}

fn lead_row() -> String {
    let mut fields = vec![""; 13];
    fields[0] = "Dr. Ana Ruiz";
    fields[1] = "Northwind Bio Inc.";
    fields[3] = "Seattle, WA";
    fields[12] = "GeoMx";
    fields.join("\t")
}

// ---------------------------------------------------------------------------
// Pasted
// ---------------------------------------------------------------------------

#[tokio::test]
async fn pasted_sequence_is_normalized_without_model_calls() {
    let provider = ScriptedProvider::new(&[]);
    let mut request = GenerationRequest::new(GenerationInput::Pasted(PASTED.to_owned()));
    request.availability = Some(AvailabilityInput::Block("Tuesday 9-11am".to_owned()));
    request.assets = vec![
        asset("kidney_atlas.png", AssetType::Image, "Kidney immune cell atlas"),
        asset(
            "kidney_protocol.pdf",
            AssetType::Document,
            "Kidney biopsy workflow for GeoMx. Extra detail.",
        ),
        asset("lung.pdf", AssetType::Document, "Lung panel"),
    ];

    let generated = pipeline(&provider).run(request).await.expect("run should succeed");
    assert_eq!(provider.call_count(), 0);
    assert_eq!(generated.instrument, Platform::GeoMx);
    assert_eq!(generated.name, UNTITLED_SEQUENCE);
    assert_eq!(generated.sections.len(), 6);
    assert!(generated.research_brief.is_none());

    let email1 = generated.sections.body(SectionKey::Email1);
    assert!(email1.starts_with("Hello {{first_name}},\nMy name is Tim Glidewell"));
    assert!(!email1.contains("Hi Sarah"));
    assert!(email1.contains(">GeoMx Digital Spatial Profiler</a>"));
    assert!(email1.contains("Tuesday 9-11am"));
    assert!(!email1.contains("{{availability}}"));
    assert!(email1.contains("[Insert Image: kidney_atlas.png]"));
    assert!(email1.contains(
        "I've also attached a relevant document that outlines kidney biopsy workflow for GeoMx."
    ));

    let first = generated.selected_assets.expect("email1 assets");
    assert_eq!(first.image, "kidney_atlas.png");
    assert_eq!(first.documents, vec!["kidney_protocol.pdf"]);
    assert!(generated.selected_assets_email2.is_none());

    assert!(!generated
        .sections
        .body(SectionKey::Email4)
        .contains("Tuesday"));
    assert!(!generated
        .sections
        .body(SectionKey::LinkedinConnection)
        .contains("My name is"));
}

#[tokio::test]
async fn email2_attachments_never_repeat_email1() {
    let provider = ScriptedProvider::new(&[]);
    let mut request = GenerationRequest::new(GenerationInput::Pasted(PASTED.to_owned()));
    request.assets = vec![
        asset("kidney_atlas.png", AssetType::Image, "Kidney immune cell atlas"),
        asset("kidney_sections.png", AssetType::Image, "Kidney tissue sections"),
        asset("kidney_protocol.pdf", AssetType::Document, "Kidney biopsy workflow."),
        asset("kidney_panel.pdf", AssetType::Document, "Kidney immune panel."),
        asset("kidney_case_study.pdf", AssetType::Document, "Kidney cohort case study."),
    ];

    let generated = pipeline(&provider).run(request).await.expect("run should succeed");
    let first = generated.selected_assets.expect("email1 assets");
    let second = generated.selected_assets_email2.expect("email2 assets");

    assert!(!first.image.is_empty());
    assert!(!second.image.is_empty());
    assert!(!second.documents.is_empty());
    let used = first.file_names();
    assert!(second.file_names().iter().all(|name| !used.contains(name)));
    assert_eq!(used.len() + second.file_names().len(), 5);

    let email2 = generated.sections.body(SectionKey::Email2);
    assert!(email2.contains(&format!("[Insert Image: {}]", second.image)));
    assert!(!email2.contains(&format!("[Insert Image: {}]", first.image)));
}

#[tokio::test]
async fn pasted_run_honours_name_and_override() {
    let provider = ScriptedProvider::new(&[]);
    let mut request = GenerationRequest::new(GenerationInput::Pasted(PASTED.to_owned()));
    request.name = Some("Kidney cohort".to_owned());
    request.instrument = InstrumentOverride::Fixed(Platform::CellScape);

    let generated = pipeline(&provider).run(request).await.expect("run should succeed");
    assert_eq!(generated.name, "Kidney cohort");
    assert_eq!(generated.instrument, Platform::CellScape);
    assert!(generated.selected_assets.is_none());

    let record = generated.into_record();
    assert_eq!(record.name, "Kidney cohort");
    assert_eq!(record.instrument, Platform::CellScape);
    assert!(record.id.is_none());
}

#[tokio::test]
async fn pipeline_output_is_stable_across_runs() {
    let provider = ScriptedProvider::new(&[]);
    let pipeline = pipeline(&provider);
    let first = pipeline
        .run(GenerationRequest::new(GenerationInput::Pasted(PASTED.to_owned())))
        .await
        .expect("first run");
    let second = pipeline
        .run(GenerationRequest::new(GenerationInput::Pasted(PASTED.to_owned())))
        .await
        .expect("second run");
    assert_eq!(first, second);
}

// ---------------------------------------------------------------------------
// Lead
// ---------------------------------------------------------------------------

#[tokio::test]
async fn lead_without_brief_runs_research_first() {
    let provider = ScriptedProvider::new(&[
        Some(BRIEF),
        Some("draft"),
        Some("anchored"),
        Some(DRAFTED),
    ]);
    let generated = pipeline(&provider)
        .run(GenerationRequest::new(GenerationInput::Lead {
            lead_intel: lead_row(),
            research_brief: None,
        }))
        .await
        .expect("run should succeed");

    assert_eq!(provider.call_count(), 4);
    assert_eq!(generated.research_brief.as_deref(), Some(BRIEF));
    assert_eq!(generated.instrument, Platform::GeoMx);
    assert_eq!(generated.name, "Northwind Bio Seattle GeoMx");
    assert_eq!(generated.raw_input, lead_row());

    let email1 = generated.sections.get(SectionKey::Email1).expect("email1");
    assert_eq!(email1.subject, "Kidney biopsy context");
    assert!(email1.body.starts_with("Hello {{first_name}},\nMy name is Tim Glidewell"));
    assert!(generated
        .sections
        .body(SectionKey::Email4)
        .ends_with("reconnect later this year."));
}

#[tokio::test]
async fn supplied_brief_skips_research() {
    let provider = ScriptedProvider::new(&[Some("draft"), Some("anchored"), Some(DRAFTED)]);
    let mut request = GenerationRequest::new(GenerationInput::Lead {
        lead_intel: lead_row(),
        research_brief: Some(BRIEF.to_owned()),
    });
    request.instrument = InstrumentOverride::Fixed(Platform::CosMx);

    let generated = pipeline(&provider).run(request).await.expect("run should succeed");
    assert_eq!(provider.call_count(), 3);
    assert_eq!(generated.instrument, Platform::CosMx);
}

#[tokio::test]
async fn lead_instrument_is_detected_from_final_sections() {
    let brief = BRIEF.replace("Instrument: GeoMx", "Instrument: CellScape");
    let provider = ScriptedProvider::new(&[Some("draft"), Some("anchored"), Some(DRAFTED)]);
    let generated = pipeline(&provider)
        .run(GenerationRequest::new(GenerationInput::Lead {
            lead_intel: lead_row(),
            research_brief: Some(brief),
        }))
        .await
        .expect("run should succeed");

    assert_eq!(provider.call_count(), 3);
    assert_eq!(generated.instrument, Platform::GeoMx);
}

#[tokio::test]
async fn research_failure_aborts() {
    let provider = ScriptedProvider::new(&[None]);
    let err = pipeline(&provider)
        .run(GenerationRequest::new(GenerationInput::Lead {
            lead_intel: lead_row(),
            research_brief: Some("   ".to_owned()),
        }))
        .await
        .expect_err("research failure should abort");
    assert!(matches!(err, PipelineError::Research(_)));
}

#[tokio::test]
async fn brief_without_platform_aborts_before_drafting() {
    let provider = ScriptedProvider::new(&[Some("unused")]);
    let err = pipeline(&provider)
        .run(GenerationRequest::new(GenerationInput::Lead {
            lead_intel: lead_row(),
            research_brief: Some("Research focus\n- fibrosis".to_owned()),
        }))
        .await
        .expect_err("missing platform should abort");
    assert!(matches!(
        err,
        PipelineError::Generation(GenerationError::Outline(OutlineError::MissingPlatform))
    ));
    assert_eq!(provider.call_count(), 0);
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn empty_and_oversized_input_are_rejected() {
    let provider = ScriptedProvider::new(&[]);
    let pipeline = pipeline(&provider);

    let empty = pipeline
        .run(GenerationRequest::new(GenerationInput::Pasted("  \n".to_owned())))
        .await;
    assert!(matches!(empty, Err(PipelineError::InvalidInput(_))));

    let oversized = "a".repeat(MAX_INPUT_CHARS + 1);
    let too_long = pipeline
        .run(GenerationRequest::new(GenerationInput::Lead {
            lead_intel: oversized,
            research_brief: None,
        }))
        .await;
    assert!(matches!(too_long, Err(PipelineError::InvalidInput(_))));
    assert_eq!(provider.call_count(), 0);
}
