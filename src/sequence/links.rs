//! Turns the first mention of each product name into a link.
//!
//! Only the first whole-word occurrence of a term is considered. When that
//! occurrence already sits inside link markup (an `<a>` element, a markdown
//! link, a bare URL, a plain `term (url)` rendering, a range linked earlier
//! in the same pass, or is followed by a parenthetical URL) the term is left
//! alone. Running the pass twice therefore changes nothing the second time.

use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::{SectionKey, SequenceSections};

const GEOMX_URL: &str =
    "https://nanostring.com/products/geomx-digital-spatial-profiler/geomx-dsp-overview/";
const COSMX_URL: &str =
    "https://nanostring.com/products/cosmx-spatial-molecular-imager/single-cell-imaging-overview/";
const CELLSCAPE_URL: &str = "https://brukerspatialbiology.com/cellscape/";

/// Product term to URL, longest term first.
pub const LINK_MAP: [(&str, &str); 5] = [
    ("CosMx Spatial Molecular Imager", COSMX_URL),
    ("GeoMx Digital Spatial Profiler", GEOMX_URL),
    ("CellScape", CELLSCAPE_URL),
    ("GeoMx", GEOMX_URL),
    ("CosMx", COSMX_URL),
];

/// How an injected link is rendered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkFormat {
    /// `<a href="url">term</a>`
    #[default]
    Html,
    /// `term (url)`
    Plain,
}

impl LinkFormat {
    fn render(self, term: &str, url: &str) -> String {
        match self {
            Self::Html => format!("<a href=\"{url}\">{term}</a>"),
            Self::Plain => format!("{term} ({url})"),
        }
    }
}

static TERM_PATTERNS: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    LINK_MAP
        .iter()
        .filter_map(|(term, url)| {
            Regex::new(&format!(r"(?i)\b{}\b(?:™)?", regex::escape(term)))
                .ok()
                .map(|regex| (regex, *url))
        })
        .collect()
});

static EXISTING_LINKS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?is)<a\b[^>]*>.*?</a>",
        r"\[[^\]]*\]\([^)]*\)",
        r"(?i)https?://[^\s)<>\x22]+",
    ]
    .iter()
    .filter_map(|pattern| Regex::new(pattern).ok())
    .collect()
});

/// Terms already rendered in plain format, so sub-terms inside them stay put.
static PLAIN_LINKS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    LINK_MAP
        .iter()
        .filter_map(|(term, _)| {
            Regex::new(&format!(
                r"(?i)\b{}\b(?:™)?\s*\(\s*https?://[^)\s]*\s*\)",
                regex::escape(term)
            ))
            .ok()
        })
        .collect()
});

static PAREN_URL_AFTER: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^\s*\(\s*https?://").ok());

fn overlaps(a: &Range<usize>, b: &Range<usize>) -> bool {
    a.start < b.end && b.start < a.end
}

fn existing_link_ranges(text: &str) -> Vec<Range<usize>> {
    EXISTING_LINKS
        .iter()
        .chain(PLAIN_LINKS.iter())
        .flat_map(|regex| regex.find_iter(text).map(|m| m.range()))
        .collect()
}

fn followed_by_url(text: &str, end: usize) -> bool {
    let rest = text.get(end..).unwrap_or_default();
    PAREN_URL_AFTER
        .as_ref()
        .is_some_and(|regex| regex.is_match(rest))
}

/// Link the first mention of each known product term in `body`.
pub fn inject_links(body: &str, format: LinkFormat) -> String {
    let mut result = body.to_owned();
    let mut linked: Vec<Range<usize>> = Vec::new();

    for (regex, url) in TERM_PATTERNS.iter() {
        let Some(found) = regex.find(&result) else {
            continue;
        };
        let span = found.range();

        let protected = existing_link_ranges(&result);
        if linked.iter().chain(protected.iter()).any(|r| overlaps(r, &span))
            || followed_by_url(&result, span.end)
        {
            continue;
        }

        let replacement = format.render(found.as_str(), url);
        let inserted_len = replacement.len();
        let removed_len = span.len();
        result.replace_range(span.clone(), &replacement);

        for range in &mut linked {
            if range.start >= span.end {
                range.start = range
                    .start
                    .saturating_sub(removed_len)
                    .saturating_add(inserted_len);
                range.end = range
                    .end
                    .saturating_sub(removed_len)
                    .saturating_add(inserted_len);
            }
        }
        linked.push(span.start..span.start.saturating_add(inserted_len));
    }

    result
}

/// Apply [`inject_links`] to every email body. LinkedIn sections are skipped.
pub fn inject_links_in_sections(sections: &SequenceSections, format: LinkFormat) -> SequenceSections {
    sections.map_bodies(|key: SectionKey, body| {
        if key.is_linkedin() {
            body.to_owned()
        } else {
            inject_links(body, format)
        }
    })
}
