//! Picks the image and documents to attach to one email.
//!
//! The deterministic selector always runs and always produces a legal
//! answer. [`ModelAssistedSelector`] may refine it, but any invalid, missing
//! or failed model answer falls back to the deterministic choice.

use serde::{Deserialize, Serialize};

use super::scorer::rank;
use super::{Asset, AssetType, Platform, SelectedAssets};
use crate::providers::writer::ModelWriter;

/// Default combined and per-file document budget: 5 MiB.
pub const MAX_ATTACHMENT_BYTES: u64 = 5 * 1024 * 1024;

/// At most this many documents per email.
pub const MAX_DOCUMENTS: usize = 2;

const IMAGE_CANDIDATES: usize = 3;
const DOCUMENT_CANDIDATES: usize = 4;

/// Inputs shared by both selectors.
#[derive(Debug, Clone, Copy)]
pub struct SelectionContext<'a> {
    /// Email body the attachments accompany.
    pub body: &'a str,
    /// Asset snapshot.
    pub assets: &'a [Asset],
    /// Platform the email promotes.
    pub platform: Platform,
    /// File names already used elsewhere in the sequence.
    pub exclude: &'a [String],
    /// Document budget in bytes.
    pub max_bytes: u64,
}

/// Scored, eligible candidates, best first.
#[derive(Debug, Clone)]
pub struct Candidates<'a> {
    /// Images with scores.
    pub images: Vec<(&'a Asset, i32)>,
    /// Documents within the per-file budget, with scores.
    pub documents: Vec<(&'a Asset, i32)>,
}

impl<'a> Candidates<'a> {
    /// Score and filter the snapshot for one email.
    pub fn collect(ctx: &SelectionContext<'a>) -> Self {
        let available = || {
            ctx.assets
                .iter()
                .filter(|asset| !ctx.exclude.contains(&asset.file_name))
        };
        let images = rank(
            available().filter(|a| a.kind == AssetType::Image),
            ctx.body,
            ctx.platform,
        );
        let documents = rank(
            available().filter(|a| a.kind == AssetType::Document && a.size <= ctx.max_bytes),
            ctx.body,
            ctx.platform,
        );
        Self { images, documents }
    }
}

/// Greedy document pick: best first, skip any that would break the budget.
fn pick_documents<'a>(documents: &[(&'a Asset, i32)], max_bytes: u64) -> Vec<&'a Asset> {
    let mut total = 0_u64;
    let mut picked = Vec::with_capacity(MAX_DOCUMENTS);
    for (asset, _) in documents {
        if picked.len() >= MAX_DOCUMENTS {
            break;
        }
        match total.checked_add(asset.size) {
            Some(next) if next <= max_bytes => {
                total = next;
                picked.push(*asset);
            }
            _ => {}
        }
    }
    picked
}

/// Sentence introducing the attached documents; empty when there are none.
pub fn justification_for(documents: &[&Asset], platform: Platform) -> String {
    let Some(primary) = documents.first() else {
        return String::new();
    };
    let topic = summary_topic(primary.summary_text())
        .unwrap_or_else(|| format!("how {platform} fits into your current workflow"));
    if documents.len() == 1 {
        format!("I've also attached a relevant document that outlines {topic}.")
    } else {
        format!("I've also attached a couple of relevant documents that outline {topic}.")
    }
}

/// First sentence of a summary, without closing punctuation, lowercased lead.
/// Acronyms ("FFPE ...") keep their case.
fn summary_topic(summary: &str) -> Option<String> {
    let first = summary
        .split_inclusive(['.', '!', '?'])
        .next()
        .unwrap_or_default()
        .trim()
        .trim_end_matches(['.', '!', '?', '…'])
        .trim();
    let mut chars = first.chars();
    let lead = chars.next()?;
    if chars.clone().next().is_some_and(char::is_uppercase) {
        return Some(first.to_owned());
    }
    Some(lead.to_lowercase().chain(chars).collect())
}

fn build_selection(image: String, documents: &[&Asset], platform: Platform) -> SelectedAssets {
    let sentence = justification_for(documents, platform);
    SelectedAssets {
        image,
        documents: documents.iter().map(|a| a.file_name.clone()).collect(),
        attachment_reference: (!sentence.is_empty()).then(|| sentence.clone()),
        justification_sentence: sentence,
    }
}

/// Deterministic selection: best image plus up to two documents under budget.
pub fn select_assets(ctx: &SelectionContext<'_>) -> SelectedAssets {
    select_from(&Candidates::collect(ctx), ctx)
}

fn select_from(candidates: &Candidates<'_>, ctx: &SelectionContext<'_>) -> SelectedAssets {
    let image = candidates
        .images
        .first()
        .map(|(asset, _)| asset.file_name.clone())
        .unwrap_or_default();
    let documents = pick_documents(&candidates.documents, ctx.max_bytes);
    build_selection(image, &documents, ctx.platform)
}

// ---------------------------------------------------------------------------
// Model-assisted refinement
// ---------------------------------------------------------------------------

const SELECTOR_PROMPT: &str = "You select attachments for a scientific outreach email.\n\
Given the email body, the promoted instrument and pre-scored candidate assets, pick:\n\
- at most 1 image from the candidates\n\
- 0 to 2 documents from the candidates whose combined size fits the stated budget\n\
- a justification_sentence and an attachment_reference that describe the chosen documents\n\
Only use file names that appear in the candidate list.\n\
Return only a JSON object with keys image, documents, justification_sentence, attachment_reference.";

#[derive(Debug, Serialize)]
struct CandidateView<'a> {
    file_name: &'a str,
    instrument: super::Instrument,
    #[serde(rename = "type")]
    kind: AssetType,
    size: u64,
    summary: &'a str,
    keywords: &'a [String],
    score: i32,
}

/// JSON answer expected from the assets model.
#[derive(Debug, Default, Deserialize)]
struct ModelPick {
    #[serde(default)]
    image: Option<String>,
    #[serde(default)]
    documents: Option<Vec<String>>,
    #[serde(default)]
    justification_sentence: Option<String>,
    #[serde(default)]
    attachment_reference: Option<String>,
}

/// Selector that lets a model refine the pre-scored candidates.
#[derive(Debug, Clone)]
pub struct ModelAssistedSelector {
    writer: ModelWriter,
}

impl ModelAssistedSelector {
    /// Wrap the writer resolved for the assets role.
    pub fn new(writer: ModelWriter) -> Self {
        Self { writer }
    }

    /// Select assets, falling back to [`select_assets`] on any model problem.
    pub async fn select(&self, ctx: &SelectionContext<'_>) -> SelectedAssets {
        let candidates = Candidates::collect(ctx);
        let fallback = select_from(&candidates, ctx);
        if candidates.images.is_empty() && candidates.documents.is_empty() {
            return fallback;
        }

        let user = match candidate_message(&candidates, ctx) {
            Ok(user) => user,
            Err(err) => {
                tracing::warn!(error = %err, "failed to serialise asset candidates");
                return fallback;
            }
        };

        let raw = match self.writer.json(SELECTOR_PROMPT, &user).await {
            Ok(raw) => raw,
            Err(err) => {
                tracing::warn!(error = %err, "asset selection model failed, using scored defaults");
                return fallback;
            }
        };

        match serde_json::from_str::<ModelPick>(&raw) {
            Ok(pick) => validate_pick(pick, &candidates, ctx, fallback),
            Err(err) => {
                tracing::warn!(error = %err, "asset selection answer is not valid JSON");
                fallback
            }
        }
    }
}

fn candidate_message(
    candidates: &Candidates<'_>,
    ctx: &SelectionContext<'_>,
) -> Result<String, serde_json::Error> {
    let view: Vec<CandidateView<'_>> = candidates
        .images
        .iter()
        .take(IMAGE_CANDIDATES)
        .chain(candidates.documents.iter().take(DOCUMENT_CANDIDATES))
        .map(|(asset, score)| CandidateView {
            file_name: &asset.file_name,
            instrument: asset.instrument,
            kind: asset.kind,
            size: asset.size,
            summary: asset.summary.as_deref().unwrap_or("No summary available"),
            keywords: asset.keyword_list(),
            score: *score,
        })
        .collect();
    let listing = serde_json::to_string_pretty(&view)?;
    Ok(format!(
        "Detected instrument: {}\nDocument budget (bytes): {}\n\nEmail body:\n{}\n\nCandidate assets:\n{listing}",
        ctx.platform, ctx.max_bytes, ctx.body
    ))
}

/// Keep only the parts of a model pick that stay inside the candidate set
/// and the document budget; everything else comes from `fallback`.
fn validate_pick(
    pick: ModelPick,
    candidates: &Candidates<'_>,
    ctx: &SelectionContext<'_>,
    fallback: SelectedAssets,
) -> SelectedAssets {
    let image_pool: Vec<&Asset> = candidates
        .images
        .iter()
        .take(IMAGE_CANDIDATES)
        .map(|(asset, _)| *asset)
        .collect();
    let doc_pool: Vec<&Asset> = candidates
        .documents
        .iter()
        .take(DOCUMENT_CANDIDATES)
        .map(|(asset, _)| *asset)
        .collect();

    let image = match pick.image.as_deref().map(str::trim) {
        Some(name) if image_pool.iter().any(|a| a.file_name == name) => name.to_owned(),
        _ => fallback.image.clone(),
    };

    let chosen: Option<Vec<&Asset>> = pick.documents.as_ref().and_then(|names| {
        let mut seen: Vec<&Asset> = Vec::with_capacity(names.len());
        for name in names {
            let asset = doc_pool
                .iter()
                .copied()
                .find(|a| a.file_name == name.trim())?;
            if !seen.iter().any(|s| s.file_name == asset.file_name) {
                seen.push(asset);
            }
        }
        let total = seen
            .iter()
            .try_fold(0_u64, |acc, asset| acc.checked_add(asset.size))?;
        (!seen.is_empty() && seen.len() <= MAX_DOCUMENTS && total <= ctx.max_bytes).then_some(seen)
    });

    let Some(documents) = chosen else {
        tracing::debug!("model document pick rejected, keeping scored documents");
        return SelectedAssets { image, ..fallback };
    };

    let derived = justification_for(&documents, ctx.platform);
    let model_sentence = pick
        .attachment_reference
        .or(pick.justification_sentence)
        .map(|s| s.trim().to_owned())
        .filter(|s| !s.is_empty());
    let sentence = model_sentence.unwrap_or(derived);

    SelectedAssets {
        image,
        documents: documents.iter().map(|a| a.file_name.clone()).collect(),
        attachment_reference: Some(sentence.clone()),
        justification_sentence: sentence,
    }
}
