//! Sequence shape handed to the persistence layer, plus naming and patching.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::availability::AvailabilityInput;
use super::{SectionKey, SequenceSections};
use crate::assets::{Platform, SelectedAssets};

/// Name used when nothing can be derived from the input.
pub const UNTITLED_SEQUENCE: &str = "Untitled Sequence";

/// Trailing company-name tokens dropped when deriving a name.
const CORPORATE_SUFFIXES: &[&str] = &[
    "Inc", "Inc.", "LLC", "Ltd", "Ltd.", "Corp", "Corp.", "Corporation", "Co.", "GmbH", "plc",
    "AG", "S.A.", "Limited",
];

const COMPANY_FIELD: usize = 1;
const LOCATION_FIELD: usize = 3;
const INSTRUMENT_FIELD: usize = 12;

/// A saved sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SequenceRecord {
    /// Storage id, absent until persisted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    /// Display name.
    pub name: String,
    /// Detected or overridden platform.
    pub instrument: Platform,
    /// Pasted text or lead intel the sequence was built from.
    pub raw_input: String,
    /// Research brief used for generation, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub research_brief: Option<String>,
    /// Availability supplied by the caller, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub availability: Option<AvailabilityInput>,
    /// The six sections.
    pub sections: SequenceSections,
    /// Attachments chosen for email 1.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_assets: Option<SelectedAssets>,
    /// Attachments chosen for email 2.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_assets_email2: Option<SelectedAssets>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

/// Partial edit of one section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionPatch {
    /// New subject.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    /// New body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

/// Partial edit of a record. Absent fields are left alone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequencePatch {
    /// New name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Per-section edits.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sections: Option<BTreeMap<SectionKey, SectionPatch>>,
}

impl SequenceRecord {
    /// Copy of `self` with `patch` applied field by field.
    ///
    /// A section edit for a key the record lacks creates that section.
    #[must_use]
    pub fn patched(&self, patch: &SequencePatch) -> Self {
        let mut next = self.clone();
        if let Some(name) = &patch.name {
            next.name.clone_from(name);
        }
        let Some(edits) = &patch.sections else {
            return next;
        };

        let mut sections = next.sections.clone();
        for (key, edit) in edits {
            let mut section = sections.get(*key).cloned().unwrap_or_default();
            if let Some(subject) = &edit.subject {
                section.subject.clone_from(subject);
            }
            if let Some(body) = &edit.body {
                section.body.clone_from(body);
            }
            sections.insert(*key, section);
        }
        next.sections = sections;
        next
    }
}

/// Derive a sequence name from tab-delimited lead data.
///
/// Uses the first line only: company (field 1, corporate suffix removed),
/// city (field 3, text before its last comma) and instrument (field 12).
/// Non-empty parts are joined with spaces.
pub fn derive_sequence_name(raw_input: &str) -> String {
    let Some(first_line) = raw_input.lines().next() else {
        return UNTITLED_SEQUENCE.to_owned();
    };
    let fields: Vec<&str> = first_line.split('\t').map(str::trim).collect();
    let field = |index: usize| fields.get(index).copied().unwrap_or_default();

    let company = strip_corporate_suffix(field(COMPANY_FIELD));
    let location = field(LOCATION_FIELD);
    let city = location
        .rsplit_once(',')
        .map_or(location, |(before, _)| before)
        .trim();
    let instrument = field(INSTRUMENT_FIELD);

    let parts: Vec<&str> = [company, city, instrument]
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect();
    if parts.is_empty() {
        UNTITLED_SEQUENCE.to_owned()
    } else {
        parts.join(" ")
    }
}

fn strip_corporate_suffix(company: &str) -> &str {
    let trimmed = company.trim().trim_end_matches(',').trim_end();
    let Some((head, last)) = trimmed.rsplit_once(char::is_whitespace) else {
        return trimmed;
    };
    if CORPORATE_SUFFIXES
        .iter()
        .any(|suffix| suffix.eq_ignore_ascii_case(last))
    {
        head.trim_end().trim_end_matches(',').trim_end()
    } else {
        trimmed
    }
}
