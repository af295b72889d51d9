//! Six-part outreach sequences and the deterministic passes that shape them.
//!
//! A sequence is two emails, two LinkedIn touches, then two later-stage
//! emails. Every pass takes `&SequenceSections` and returns a new value; the
//! input is never mutated.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

pub mod availability;
pub mod intro;
pub mod links;
pub mod orchestrator;
pub mod outline;
pub mod parser;
pub mod prompts;
pub mod record;
pub mod redundancy;
pub mod violations;

// ---------------------------------------------------------------------------
// Section keys
// ---------------------------------------------------------------------------

/// One of the six fixed touch points, in sending order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SectionKey {
    /// First email: introduction.
    Email1,
    /// Second email: escalation.
    Email2,
    /// LinkedIn connection note.
    LinkedinConnection,
    /// LinkedIn follow-up message.
    LinkedinMessage,
    /// Third email.
    Email3,
    /// Fourth email: close.
    Email4,
}

impl SectionKey {
    /// All keys in sending order.
    pub const ALL: [SectionKey; 6] = [
        SectionKey::Email1,
        SectionKey::Email2,
        SectionKey::LinkedinConnection,
        SectionKey::LinkedinMessage,
        SectionKey::Email3,
        SectionKey::Email4,
    ];

    /// Serialized name (`email1`, `linkedinConnection`, ...).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Email1 => "email1",
            Self::Email2 => "email2",
            Self::LinkedinConnection => "linkedinConnection",
            Self::LinkedinMessage => "linkedinMessage",
            Self::Email3 => "email3",
            Self::Email4 => "email4",
        }
    }

    /// True for the two LinkedIn touches.
    pub fn is_linkedin(self) -> bool {
        matches!(self, Self::LinkedinConnection | Self::LinkedinMessage)
    }

    /// True for the four emails.
    pub fn is_email(self) -> bool {
        !self.is_linkedin()
    }
}

impl fmt::Display for SectionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

/// Subject and body of one touch point. LinkedIn touches have no subject.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    /// Subject line, possibly empty.
    pub subject: String,
    /// Body text.
    pub body: String,
}

impl Section {
    /// Build a section from subject and body.
    pub fn new(subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            body: body.into(),
        }
    }
}

/// Ordered mapping of section keys to sections.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SequenceSections(BTreeMap<SectionKey, Section>);

impl SequenceSections {
    /// Empty sequence.
    pub fn new() -> Self {
        Self::default()
    }

    /// Section for `key`, if present.
    pub fn get(&self, key: SectionKey) -> Option<&Section> {
        self.0.get(&key)
    }

    /// Body for `key`, empty when absent.
    pub fn body(&self, key: SectionKey) -> &str {
        self.0.get(&key).map_or("", |section| section.body.as_str())
    }

    /// Insert or replace a section, returning the previous one.
    pub fn insert(&mut self, key: SectionKey, section: Section) -> Option<Section> {
        self.0.insert(key, section)
    }

    /// Copy of `self` with the body of `key` replaced. Absent keys stay absent.
    #[must_use]
    pub fn with_body(&self, key: SectionKey, body: String) -> Self {
        let mut next = self.clone();
        if let Some(section) = next.0.get_mut(&key) {
            section.body = body;
        }
        next
    }

    /// Copy of `self` with every body passed through `transform`.
    #[must_use]
    pub fn map_bodies(&self, mut transform: impl FnMut(SectionKey, &str) -> String) -> Self {
        Self(
            self.0
                .iter()
                .map(|(key, section)| {
                    let body = transform(*key, &section.body);
                    (
                        *key,
                        Section {
                            subject: section.subject.clone(),
                            body,
                        },
                    )
                })
                .collect(),
        )
    }

    /// Copy with all six keys present; missing ones are empty sections.
    #[must_use]
    pub fn completed(&self) -> Self {
        let mut next = self.clone();
        for key in SectionKey::ALL {
            next.0.entry(key).or_default();
        }
        next
    }

    /// True when `key` is present.
    pub fn contains(&self, key: SectionKey) -> bool {
        self.0.contains_key(&key)
    }

    /// Number of present sections.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when no section is present.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate sections in sending order.
    pub fn iter(&self) -> impl Iterator<Item = (SectionKey, &Section)> {
        self.0.iter().map(|(key, section)| (*key, section))
    }

    /// All subjects and bodies joined, for whole-sequence scans.
    pub fn all_text(&self) -> String {
        self.0
            .values()
            .flat_map(|section| [section.subject.as_str(), section.body.as_str()])
            .filter(|text| !text.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl FromIterator<(SectionKey, Section)> for SequenceSections {
    fn from_iter<I: IntoIterator<Item = (SectionKey, Section)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

// ---------------------------------------------------------------------------
// Sender
// ---------------------------------------------------------------------------

/// Who the sequence is sent by. Drives the email preamble and signoff detection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SenderIdentity {
    /// Full name, e.g. "Tim Glidewell".
    pub name: String,
    /// Job title.
    pub title: String,
    /// Company name.
    pub company: String,
}

impl Default for SenderIdentity {
    fn default() -> Self {
        Self {
            name: "Tim Glidewell".to_owned(),
            title: "Spatial Regional Account Manager".to_owned(),
            company: "Bruker Spatial Biology".to_owned(),
        }
    }
}

impl SenderIdentity {
    /// Canonical self-introduction sentence used as the second preamble line.
    pub fn intro_line(&self) -> String {
        format!(
            "My name is {}, and I'm the {} at {}.",
            self.name, self.title, self.company
        )
    }

    /// First name, used to recognise short signoff lines.
    pub fn first_name(&self) -> &str {
        self.name.split_whitespace().next().unwrap_or_default()
    }
}
