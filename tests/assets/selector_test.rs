//! Coverage for deterministic and model-assisted attachment selection.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use outreach::assets::selector::{
    select_assets, ModelAssistedSelector, SelectionContext, MAX_ATTACHMENT_BYTES,
};
use outreach::assets::{Asset, AssetType, Instrument, Platform, SelectedAssets};
use outreach::providers::writer::ModelWriter;
use outreach::providers::{
    CompletionRequest, CompletionResponse, LlmProvider, ProviderError, StopReason, UsageStats,
};

const MIB: u64 = 1024 * 1024;

fn asset(file_name: &str, kind: AssetType, size: u64, summary: &str) -> Asset {
    Asset {
        id: None,
        file_name: file_name.to_owned(),
        instrument: Instrument::GeoMx,
        kind,
        size,
        summary: (!summary.is_empty()).then(|| summary.to_owned()),
        keywords: None,
        file_path: String::new(),
    }
}

fn ctx<'a>(assets: &'a [Asset], exclude: &'a [String]) -> SelectionContext<'a> {
    SelectionContext {
        body: "Hi {{first_name}},\n\nYou cannot see immune niches in bulk data.",
        assets,
        platform: Platform::GeoMx,
        exclude,
        max_bytes: MAX_ATTACHMENT_BYTES,
    }
}

fn library() -> Vec<Asset> {
    vec![
        asset("overview.png", AssetType::Image, MIB, ""),
        asset("atlas.png", AssetType::Image, MIB, ""),
        asset("doc1.pdf", AssetType::Document, 3 * MIB, ""),
        asset("doc2.pdf", AssetType::Document, 3 * MIB, ""),
        asset("doc3.pdf", AssetType::Document, MIB, ""),
    ]
}

#[test]
fn greedy_documents_respect_combined_budget() {
    let assets = library();
    let selected = select_assets(&ctx(&assets, &[]));
    assert_eq!(selected.image, "overview.png");
    assert_eq!(selected.documents, vec!["doc1.pdf", "doc3.pdf"]);
}

#[test]
fn oversized_documents_are_never_chosen() {
    let assets = vec![
        asset("huge.pdf", AssetType::Document, 6 * MIB, "Tumor immune atlas"),
        asset("small.pdf", AssetType::Document, MIB, ""),
    ];
    let selected = select_assets(&ctx(&assets, &[]));
    assert_eq!(selected.documents, vec!["small.pdf"]);
    assert!(selected.image.is_empty());
}

#[test]
fn excluded_files_are_skipped() {
    let assets = library();
    let exclude = vec!["overview.png".to_owned(), "doc1.pdf".to_owned()];
    let selected = select_assets(&ctx(&assets, &exclude));
    assert_eq!(selected.image, "atlas.png");
    assert_eq!(selected.documents, vec!["doc2.pdf", "doc3.pdf"]);
}

#[test]
fn justification_uses_summary_topic() {
    let assets = vec![asset(
        "margins.pdf",
        AssetType::Document,
        MIB,
        "Spatial profiling of tumor margins. Second sentence.",
    )];
    let selected = select_assets(&ctx(&assets, &[]));
    assert_eq!(
        selected.justification_sentence,
        "I've also attached a relevant document that outlines spatial profiling of tumor margins."
    );
    assert_eq!(
        selected.attachment_reference.as_deref(),
        Some(selected.justification_sentence.as_str())
    );
}

#[test]
fn justification_falls_back_to_platform() {
    let assets = vec![
        asset("a.pdf", AssetType::Document, MIB, ""),
        asset("b.pdf", AssetType::Document, MIB, ""),
    ];
    let selected = select_assets(&ctx(&assets, &[]));
    assert_eq!(
        selected.justification_sentence,
        "I've also attached a couple of relevant documents that outline how GeoMx fits into your current workflow."
    );
}

#[test]
fn nothing_available_selects_nothing() {
    let selected = select_assets(&ctx(&[], &[]));
    assert_eq!(selected, SelectedAssets::default());
    assert!(selected.is_empty());
}

#[test]
fn acronym_topic_keeps_case() {
    let assets = vec![asset(
        "prep.pdf",
        AssetType::Document,
        MIB,
        "FFPE sample preparation for GeoMx",
    )];
    let selected = select_assets(&ctx(&assets, &[]));
    assert_eq!(
        selected.justification_sentence,
        "I've also attached a relevant document that outlines FFPE sample preparation for GeoMx."
    );
}

// ---------------------------------------------------------------------------
// Model-assisted
// ---------------------------------------------------------------------------

struct JsonProvider {
    answer: Result<String, ()>,
}

#[async_trait]
impl LlmProvider for JsonProvider {
    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> Result<CompletionResponse, ProviderError> {
        assert!(request.json_output);
        match &self.answer {
            Ok(text) => Ok(CompletionResponse {
                text: text.clone(),
                stop_reason: StopReason::EndTurn,
                usage: UsageStats::default(),
                model: "test/json".to_owned(),
            }),
            Err(()) => Err(ProviderError::Unavailable("down".to_owned())),
        }
    }

    fn model_id(&self) -> &str {
        "test/json"
    }
}

fn selector(answer: Result<&str, ()>) -> ModelAssistedSelector {
    let provider = Arc::new(JsonProvider {
        answer: answer.map(str::to_owned),
    });
    ModelAssistedSelector::new(ModelWriter::new(provider, Duration::from_secs(5), 512))
}

#[tokio::test]
async fn valid_model_pick_is_used() {
    let assets = library();
    let answer = r#"{"image":"atlas.png","documents":["doc3.pdf"],"attachment_reference":"I've attached a short note on sample prep."}"#;
    let selected = selector(Ok(answer)).select(&ctx(&assets, &[])).await;

    assert_eq!(selected.image, "atlas.png");
    assert_eq!(selected.documents, vec!["doc3.pdf"]);
    assert_eq!(
        selected.attachment_reference.as_deref(),
        Some("I've attached a short note on sample prep.")
    );
}

#[tokio::test]
async fn unknown_file_names_fall_back() {
    let assets = library();
    let answer = r#"{"image":"made_up.png","documents":["ghost.pdf"]}"#;
    let selected = selector(Ok(answer)).select(&ctx(&assets, &[])).await;
    assert_eq!(selected, select_assets(&ctx(&assets, &[])));
}

#[tokio::test]
async fn over_budget_pick_keeps_scored_documents() {
    let assets = library();
    let answer = r#"{"image":"atlas.png","documents":["doc1.pdf","doc2.pdf"]}"#;
    let selected = selector(Ok(answer)).select(&ctx(&assets, &[])).await;
    assert_eq!(selected.image, "atlas.png");
    assert_eq!(selected.documents, vec!["doc1.pdf", "doc3.pdf"]);
}

#[tokio::test]
async fn invalid_json_or_failure_falls_back() {
    let assets = library();
    let expected = select_assets(&ctx(&assets, &[]));
    let from_prose = selector(Ok("I would pick the atlas")).select(&ctx(&assets, &[])).await;
    assert_eq!(from_prose, expected);
    let from_error = selector(Err(())).select(&ctx(&assets, &[])).await;
    assert_eq!(from_error, expected);
}

#[tokio::test]
async fn model_pick_of_excluded_image_is_ignored() {
    let assets = library();
    let used = vec!["atlas.png".to_owned()];
    let answer = r#"{"image":"atlas.png","documents":["doc3.pdf"]}"#;
    let selected = selector(Ok(answer)).select(&ctx(&assets, &used)).await;
    assert_eq!(selected.image, "overview.png");
    assert_eq!(selected.documents, vec!["doc3.pdf"]);
}

#[tokio::test]
async fn repeated_document_names_collapse_and_sentence_is_derived() {
    let assets = library();
    let answer = r#"{"image":"overview.png","documents":["doc3.pdf"," doc3.pdf"]}"#;
    let selected = selector(Ok(answer)).select(&ctx(&assets, &[])).await;
    assert_eq!(selected.documents, vec!["doc3.pdf"]);
    assert_eq!(
        selected.justification_sentence,
        "I've also attached a relevant document that outlines how GeoMx fits into your current workflow."
    );
    assert_eq!(
        selected.attachment_reference.as_deref(),
        Some(selected.justification_sentence.as_str())
    );
}
