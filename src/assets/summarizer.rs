//! Deterministic summary and keywords for already-extracted document text.

use std::collections::HashMap;

use serde::Serialize;

/// Longest summary returned, in characters.
pub const MAX_SUMMARY_CHARS: usize = 320;

/// Only this much of the input text is considered.
pub const MAX_INPUT_CHARS: usize = 12_000;

/// Returned when the document has no usable text.
pub const SUMMARY_UNAVAILABLE: &str = "Summary unavailable.";

const MAX_KEYWORDS: usize = 10;
const MIN_SENTENCE_CHARS: usize = 20;
const MIN_TOKEN_CHARS: usize = 4;

const DOMAIN_KEYWORDS: &[&str] = &[
    "spatial biology",
    "transcriptomics",
    "proteomics",
    "single cell",
    "ffpe",
    "tumor microenvironment",
    "biomarker",
    "immunology",
    "oncology",
    "neuroscience",
    "high plex",
    "subcellular",
    "rna",
    "protein",
    "imaging",
    "pathology",
    "workflow",
    "validation",
    "clinical",
    "assay",
    "geomx",
    "cosmx",
    "cellscape",
];

const STOPWORDS: &[&str] = &[
    "with", "from", "that", "this", "were", "have", "using", "into", "through", "their", "these",
    "study", "data", "analysis", "results", "method", "methods", "sample", "samples", "human",
    "mouse", "figure", "table", "supplementary", "background", "conclusion", "introduction",
];

/// Summary and keywords for one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentSummary {
    /// At most [`MAX_SUMMARY_CHARS`] characters.
    pub summary: String,
    /// At most ten keywords, domain terms first.
    pub keywords: Vec<String>,
}

/// Summarise extracted document text. Never fails.
pub fn summarize_document(text: &str) -> DocumentSummary {
    let truncated: String = text.chars().take(MAX_INPUT_CHARS).collect();
    DocumentSummary {
        summary: build_summary(&truncated),
        keywords: extract_document_keywords(&truncated),
    }
}

fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Sentences split after `.`, `!` or `?` followed by whitespace.
fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut current = String::new();
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        current.push(c);
        let boundary = matches!(c, '.' | '!' | '?')
            && chars.peek().is_some_and(|next| next.is_whitespace());
        if boundary {
            sentences.push(std::mem::take(&mut current));
        }
    }
    sentences.push(current);
    sentences
        .into_iter()
        .map(|s| s.trim().to_owned())
        .filter(|s| s.chars().count() >= MIN_SENTENCE_CHARS)
        .collect()
}

fn build_summary(text: &str) -> String {
    let cleaned = normalize_whitespace(text);
    if cleaned.is_empty() {
        return SUMMARY_UNAVAILABLE.to_owned();
    }

    let sentences = split_sentences(&cleaned);
    let base = if sentences.is_empty() {
        cleaned.chars().take(MAX_SUMMARY_CHARS).collect()
    } else {
        sentences.iter().take(2).cloned().collect::<Vec<_>>().join(" ")
    };

    if base.chars().count() > MAX_SUMMARY_CHARS {
        let head: String = base
            .chars()
            .take(MAX_SUMMARY_CHARS.saturating_sub(1))
            .collect();
        return format!("{head}…");
    }
    base
}

fn extract_document_keywords(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();

    let mut keywords: Vec<String> = DOMAIN_KEYWORDS
        .iter()
        .filter(|keyword| lower.contains(*keyword))
        .map(|keyword| (*keyword).to_owned())
        .collect();

    let cleaned: String = lower
        .chars()
        .map(|c| {
            if c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c.is_whitespace() {
                c
            } else {
                ' '
            }
        })
        .collect();

    let mut counts: HashMap<&str, usize> = HashMap::new();
    let mut first_seen: Vec<&str> = Vec::new();
    for token in cleaned.split_whitespace() {
        if token.chars().count() < MIN_TOKEN_CHARS || STOPWORDS.contains(&token) {
            continue;
        }
        let count = counts.entry(token).or_insert(0);
        if *count == 0 {
            first_seen.push(token);
        }
        *count = count.saturating_add(1);
    }

    // Stable sort keeps first-occurrence order among equal counts.
    first_seen.sort_by(|a, b| counts[b].cmp(&counts[a]));
    for token in first_seen.into_iter().take(MAX_KEYWORDS) {
        if !keywords.iter().any(|k| k == token) {
            keywords.push(token.to_owned());
        }
    }

    keywords.truncate(MAX_KEYWORDS);
    keywords
}
