//! Knowledge-base assets: relevance filtering, scoring, selection and
//! placement inside email bodies.
//!
//! The pipeline only ever reads an immutable snapshot of the asset list.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub mod inserter;
pub mod keywords;
pub mod scorer;
pub mod selector;
pub mod summarizer;

/// The three promotable instruments. A sequence promotes exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Platform {
    /// CosMx Spatial Molecular Imager.
    CosMx,
    /// GeoMx Digital Spatial Profiler.
    GeoMx,
    /// CellScape.
    CellScape,
}

impl Platform {
    /// All platforms in extraction priority order.
    pub const ALL: [Platform; 3] = [Platform::CosMx, Platform::GeoMx, Platform::CellScape];

    /// Canonical product name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::CosMx => "CosMx",
            Self::GeoMx => "GeoMx",
            Self::CellScape => "CellScape",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|platform| platform.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown platform {s:?}, expected CosMx, GeoMx or CellScape"))
    }
}

/// Caller's instrument choice: detect from text, or force a platform.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum InstrumentOverride {
    /// Detect from the final section text.
    #[default]
    Auto,
    /// Use this platform.
    Fixed(Platform),
}

impl FromStr for InstrumentOverride {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().is_empty() || s.trim().eq_ignore_ascii_case("auto") {
            return Ok(Self::Auto);
        }
        s.parse().map(Self::Fixed)
    }
}

/// Instrument tag on an asset. Generic tags are penalised when scoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Instrument {
    /// GeoMx-specific.
    GeoMx,
    /// CosMx-specific.
    CosMx,
    /// CellScape-specific.
    CellScape,
    /// Covers several platforms.
    MultiPlatform,
    /// Not instrument-specific.
    General,
}

impl Instrument {
    /// True for `MultiPlatform` and `General`.
    pub fn is_generic(self) -> bool {
        matches!(self, Self::MultiPlatform | Self::General)
    }

    /// True when this tag names `platform`.
    pub fn matches(self, platform: Platform) -> bool {
        matches!(
            (self, platform),
            (Self::GeoMx, Platform::GeoMx)
                | (Self::CosMx, Platform::CosMx)
                | (Self::CellScape, Platform::CellScape)
        )
    }
}

/// Attachment kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssetType {
    /// Inline image.
    Image,
    /// Attached document.
    Document,
}

/// An uploaded image or document available for attachment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
    /// Store identifier, when persisted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    /// File name; the identity used in selections.
    pub file_name: String,
    /// Instrument tag.
    pub instrument: Instrument,
    /// Image or document.
    #[serde(rename = "type")]
    pub kind: AssetType,
    /// Size in bytes.
    pub size: u64,
    /// Short summary of the content.
    #[serde(default)]
    pub summary: Option<String>,
    /// Extracted keywords.
    #[serde(default)]
    pub keywords: Option<Vec<String>>,
    /// Storage path.
    #[serde(default)]
    pub file_path: String,
}

impl Asset {
    /// Summary text, empty when absent.
    pub fn summary_text(&self) -> &str {
        self.summary.as_deref().unwrap_or_default()
    }

    /// Keywords, empty when absent.
    pub fn keyword_list(&self) -> &[String] {
        self.keywords.as_deref().unwrap_or_default()
    }
}

/// Attachments chosen for one email.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectedAssets {
    /// Image file name, empty when none.
    pub image: String,
    /// Zero to two document file names.
    pub documents: Vec<String>,
    /// Sentence introducing the documents, empty when none.
    pub justification_sentence: String,
    /// Attachment reference sentence placed before the signoff.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachment_reference: Option<String>,
}

impl SelectedAssets {
    /// True when nothing was selected.
    pub fn is_empty(&self) -> bool {
        self.image.is_empty() && self.documents.is_empty()
    }

    /// Every selected file name (image first).
    pub fn file_names(&self) -> Vec<String> {
        std::iter::once(self.image.clone())
            .filter(|name| !name.is_empty())
            .chain(self.documents.iter().cloned())
            .collect()
    }
}
