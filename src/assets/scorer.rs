//! Deterministic relevance score of an asset against an email body.

use super::{Asset, Platform};

/// Disease areas; +2 when shared by body and asset.
pub const DISEASE_TERMS: &[&str] = &[
    "cancer", "tumor", "oncology", "immuno", "fibrosis", "inflammation", "neurodegen",
    "alzheimer", "parkinson",
];

/// Biological angles; +2 when shared by body and asset.
pub const BIO_TERMS: &[&str] = &[
    "transcriptom", "proteom", "spatial", "single-cell", "single cell", "multiplex",
    "morpholog", "rna", "protein",
];

/// Technical strengths; +1 when shared by body and asset.
pub const TECH_TERMS: &[&str] = &[
    "resolution", "sensitivity", "throughput", "plex", "whole slide", "subcellular",
    "high-plex", "fov",
];

const INSTRUMENT_MATCH: i32 = 3;
const DISEASE_MATCH: i32 = 2;
const BIO_MATCH: i32 = 2;
const TECH_MATCH: i32 = 1;
const GENERIC_PENALTY: i32 = 5;

/// Score `asset` for an email body promoting `platform`.
///
/// Each term category contributes at most once.
pub fn score_asset(asset: &Asset, body: &str, platform: Platform) -> i32 {
    let body = body.to_lowercase();
    let summary = asset.summary_text().to_lowercase();
    let keywords: Vec<String> = asset.keyword_list().iter().map(|k| k.to_lowercase()).collect();

    let shared = |terms: &[&str]| {
        terms.iter().any(|term| {
            body.contains(term)
                && (summary.contains(term) || keywords.iter().any(|k| k.contains(term)))
        })
    };

    let mut score = 0_i32;
    if asset.instrument.matches(platform) {
        score = score.saturating_add(INSTRUMENT_MATCH);
    }
    if shared(DISEASE_TERMS) {
        score = score.saturating_add(DISEASE_MATCH);
    }
    if shared(BIO_TERMS) {
        score = score.saturating_add(BIO_MATCH);
    }
    if shared(TECH_TERMS) {
        score = score.saturating_add(TECH_MATCH);
    }
    if asset.instrument.is_generic() {
        score = score.saturating_sub(GENERIC_PENALTY);
    }
    score
}

/// Pair each asset with its score, best first. Ties keep input order.
pub fn rank<'a>(
    assets: impl IntoIterator<Item = &'a Asset>,
    body: &str,
    platform: Platform,
) -> Vec<(&'a Asset, i32)> {
    let mut ranked: Vec<(&Asset, i32)> = assets
        .into_iter()
        .map(|asset| (asset, score_asset(asset, body, platform)))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1));
    ranked
}
