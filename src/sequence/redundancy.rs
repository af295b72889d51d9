//! Rewrites email 4 when it repeats email 3 too closely.

use std::collections::HashSet;

use super::prompts::REDUNDANCY_PROMPT;
use super::{SectionKey, SequenceSections};
use crate::providers::writer::ModelWriter;

/// Similarity at or above which email 4 is rewritten.
pub const DEFAULT_REDUNDANCY_THRESHOLD: f64 = 0.7;

/// Word-set Jaccard similarity of two texts, lowercased and split on
/// whitespace. Two empty texts score 0.
pub fn jaccard_similarity(a: &str, b: &str) -> f64 {
    let lower_a = a.to_lowercase();
    let lower_b = b.to_lowercase();
    let words_a: HashSet<&str> = lower_a.split_whitespace().collect();
    let words_b: HashSet<&str> = lower_b.split_whitespace().collect();

    let union = words_a.union(&words_b).count();
    if union == 0 {
        return 0.0;
    }
    let intersection = words_a.intersection(&words_b).count();

    match (u32::try_from(intersection), u32::try_from(union)) {
        (Ok(shared), Ok(total)) => f64::from(shared) / f64::from(total),
        _ => 0.0,
    }
}

/// Redundancy check backed by the redundancy model role.
#[derive(Debug, Clone)]
pub struct RedundancyChecker {
    writer: ModelWriter,
    threshold: f64,
}

impl RedundancyChecker {
    /// Checker rewriting at `threshold` similarity or above.
    pub fn new(writer: ModelWriter, threshold: f64) -> Self {
        Self { writer, threshold }
    }

    /// Return the sections with email 4 rewritten when it overlaps email 3.
    ///
    /// Never fails: a missing section, a model error or an empty answer all
    /// yield the input unchanged.
    pub async fn check(&self, sections: &SequenceSections) -> SequenceSections {
        let (Some(third), Some(fourth)) = (
            sections.get(SectionKey::Email3),
            sections.get(SectionKey::Email4),
        ) else {
            return sections.clone();
        };

        let similarity = jaccard_similarity(&third.body, &fourth.body);
        if similarity < self.threshold {
            return sections.clone();
        }

        tracing::info!(similarity, threshold = self.threshold, "email4 repeats email3, rewriting");
        let user = format!("Original Email 4 body:\n{}", fourth.body);
        match self.writer.draft(REDUNDANCY_PROMPT, &user).await {
            Ok(rewritten) => sections.with_body(SectionKey::Email4, rewritten),
            Err(err) => {
                tracing::warn!(error = %err, "redundancy rewrite failed, keeping original email4");
                sections.clone()
            }
        }
    }
}
