//! Domain keyword extraction from lead text and research notes, and
//! fail-open relevance filtering of the asset list.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;

use super::Asset;

/// Disease and therapeutic-area terms.
pub const DISEASE_TERMS: &[&str] = &[
    "cancer", "tumor", "tumour", "oncology", "immuno-oncology", "io",
    "lymphoma", "leukemia", "melanoma", "carcinoma", "sarcoma", "glioma", "glioblastoma",
    "breast cancer", "lung cancer", "prostate cancer", "colorectal", "pancreatic",
    "fibrosis", "inflammation", "autoimmune", "rheumatoid",
    "neurodegen", "alzheimer", "parkinson", "neurolog", "neuro",
    "infectious disease", "immunology", "hematolog",
    "renal", "kidney", "liver", "hepat", "cardiac", "cardiovascular",
];

/// Sample and model-system terms.
pub const SAMPLE_TERMS: &[&str] = &[
    "ffpe", "fresh frozen", "biopsy", "biopsies", "organoid", "organoids",
    "tissue", "blood", "pbmc", "tma", "whole slide", "xenograft",
    "patient-derived", "pdx", "clinical sample", "translational",
];

/// Assay and technique terms.
pub const TECHNIQUE_TERMS: &[&str] = &[
    "transcriptom", "proteom", "spatial", "single-cell", "single cell",
    "multiplex", "morpholog", "rna", "protein", "genomic", "epigenom",
    "ihc", "mif", "flow cytometry", "bulk rna-seq", "scrna-seq", "sc-rna",
    "digital pathology", "imaging", "mass spec", "sequencing",
    "high-plex", "multi-omic", "multiomics", "biomarker",
];

/// Instrument and product-category terms.
pub const INSTRUMENT_TERMS: &[&str] = &[
    "cosmx", "geomx", "cellscape",
    "spatial biology", "spatial profiling", "spatial transcriptomics",
    "dsp", "digital spatial profiler", "smi",
];

/// Cell biology and specification terms.
pub const BIOLOGY_TERMS: &[&str] = &[
    "t cell", "t-cell", "b cell", "b-cell", "immune", "tumor microenvironment", "tme",
    "checkpoint", "pd-l1", "pd-1", "ctla-4", "car-t", "car t",
    "antibody", "adc", "bispecific", "t cell engager",
    "cytokine", "chemokine", "receptor", "ligand",
    "niche", "stroma", "epithelial", "endothelial", "macrophage", "dendritic",
    "gene expression", "cell type", "cell state", "phenotyp",
    "resolution", "subcellular", "fov", "throughput", "sensitivity",
];

/// Compiled vocabulary: each term matched as a word-boundary prefix.
static VOCABULARY: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    [DISEASE_TERMS, SAMPLE_TERMS, TECHNIQUE_TERMS, INSTRUMENT_TERMS, BIOLOGY_TERMS]
        .into_iter()
        .flatten()
        .filter_map(|term| prefix_regex(term).map(|regex| (*term, regex)))
        .collect()
});

/// Case-insensitive regex matching `term` at a word boundary, as a prefix.
fn prefix_regex(term: &str) -> Option<Regex> {
    Regex::new(&format!(r"(?i)\b{}", regex::escape(term))).ok()
}

/// Vocabulary terms found in the lowercased lead text and research brief.
pub fn extract_keywords(lead_intel: &str, research_brief: &str) -> BTreeSet<String> {
    let combined = format!("{lead_intel}\n{research_brief}").to_lowercase();
    VOCABULARY
        .iter()
        .filter(|(_, regex)| regex.is_match(&combined))
        .map(|(term, _)| term.to_lowercase())
        .collect()
}

/// Rank assets by how many keywords match their name, summary and keywords.
///
/// Only assets with at least one match are returned, best first (stable on
/// ties). With no keywords, no assets, or no matches at all, the input is
/// returned unchanged.
pub fn filter_assets_by_keywords(assets: &[Asset], keywords: &BTreeSet<String>) -> Vec<Asset> {
    if keywords.is_empty() || assets.is_empty() {
        return assets.to_vec();
    }

    let patterns: Vec<Regex> = keywords.iter().filter_map(|k| prefix_regex(k)).collect();

    let mut matched: Vec<(usize, &Asset)> = assets
        .iter()
        .map(|asset| {
            let text = asset_text(asset);
            let score = patterns.iter().filter(|regex| regex.is_match(&text)).count();
            (score, asset)
        })
        .filter(|(score, _)| *score > 0)
        .collect();

    if matched.is_empty() {
        tracing::debug!(assets = assets.len(), "no keyword matches, keeping full asset list");
        return assets.to_vec();
    }

    matched.sort_by(|a, b| b.0.cmp(&a.0));
    matched.into_iter().map(|(_, asset)| asset.clone()).collect()
}

fn asset_text(asset: &Asset) -> String {
    std::iter::once(asset.file_name.as_str())
        .chain(std::iter::once(asset.summary_text()))
        .chain(asset.keyword_list().iter().map(String::as_str))
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
