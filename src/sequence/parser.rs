//! Splits pasted or model-written text into the six named sections.
//!
//! Parsing never fails: text without any recognised heading becomes a single
//! `email1` section.

use std::sync::LazyLock;

use regex::Regex;

use super::{Section, SectionKey, SequenceSections};
use crate::assets::Platform;

// ---------------------------------------------------------------------------
// Pattern tables
// ---------------------------------------------------------------------------

/// Heading patterns per section, tried in sending order.
pub const HEADING_PATTERNS: [(SectionKey, &[&str]); 6] = [
    (SectionKey::Email1, &[r"(?i)^email\s*1\b", r"(?i)^e-?mail\s*#?\s*1\b"]),
    (SectionKey::Email2, &[r"(?i)^email\s*2\b", r"(?i)^e-?mail\s*#?\s*2\b"]),
    (
        SectionKey::LinkedinConnection,
        &[r"(?i)^linkedin\s*connection", r"(?i)^li\s*connection"],
    ),
    (
        SectionKey::LinkedinMessage,
        &[r"(?i)^linkedin\s*message", r"(?i)^li\s*message"],
    ),
    (SectionKey::Email3, &[r"(?i)^email\s*3\b", r"(?i)^e-?mail\s*#?\s*3\b"]),
    (SectionKey::Email4, &[r"(?i)^email\s*4\b", r"(?i)^e-?mail\s*#?\s*4\b"]),
];

/// Salutation patterns. A block whose first line matches one has no subject.
pub const GREETING_PATTERNS: [&str; 14] = [
    r"(?i)^hi\s+\{\{first_name\}\}",
    r"(?i)^hello\s+\{\{first_name\}\}",
    r"(?i)^hey\s+\{\{first_name\}\}",
    r"(?i)^dear\s+\{\{first_name\}\}",
    r"(?i)^greetings\s+\{\{first_name\}\}",
    r"(?i)^hi\s+there\s*,?",
    r"(?i)^hello\s+there\s*,?",
    r"(?i)^hey\s+there\s*,?",
    r"(?i)^hi\s*,",
    r"(?i)^hello\s*,",
    r"(?i)^hey\s*,",
    r"(?i)^dear\s+",
    r"(?i)^greetings\s*,?",
    r"(?i)^good\s+(morning|afternoon|evening)\s*,?",
];

static HEADINGS: LazyLock<Vec<(SectionKey, Regex)>> = LazyLock::new(|| {
    HEADING_PATTERNS
        .iter()
        .flat_map(|(key, patterns)| {
            patterns
                .iter()
                .filter_map(move |pattern| Regex::new(pattern).ok().map(|regex| (*key, regex)))
        })
        .collect()
});

static GREETINGS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    GREETING_PATTERNS
        .iter()
        .filter_map(|pattern| Regex::new(pattern).ok())
        .collect()
});

static SUBJECT_LINE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?i)^\**\s*subject\s*:\s*\**\s*(.*?)\s*\**$").ok());

static BODY_LABEL: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?i)^\**\s*body\s*:\s*\**\s*").ok());

// ---------------------------------------------------------------------------
// Line classifiers
// ---------------------------------------------------------------------------

/// Section key whose heading `line` matches, ignoring leading `#`/`*` markers.
pub fn match_heading(line: &str) -> Option<SectionKey> {
    let trimmed = line
        .trim()
        .trim_start_matches(|c: char| c == '#' || c == '*' || c.is_whitespace());
    HEADINGS
        .iter()
        .find(|(_, regex)| regex.is_match(trimmed))
        .map(|(key, _)| *key)
}

/// True when the trimmed line opens with a salutation.
pub fn is_greeting_line(line: &str) -> bool {
    let trimmed = line.trim();
    !trimmed.is_empty() && GREETINGS.iter().any(|regex| regex.is_match(trimmed))
}

/// Subject text when `line` is a `Subject:` line (optionally wrapped in `**`).
fn subject_of(line: &str) -> Option<String> {
    let regex = SUBJECT_LINE.as_ref()?;
    regex
        .captures(line.trim())
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_owned())
}

fn strip_body_label(body: &str) -> String {
    match BODY_LABEL.as_ref() {
        Some(regex) if regex.is_match(body) => regex.replace(body, "").trim().to_owned(),
        _ => body.to_owned(),
    }
}

// ---------------------------------------------------------------------------
// Block scanning
// ---------------------------------------------------------------------------

/// Heading positions as `(key, first content line, end line exclusive)`.
fn scan_blocks(lines: &[&str]) -> Vec<(SectionKey, usize, usize)> {
    let starts: Vec<(SectionKey, usize)> = lines
        .iter()
        .enumerate()
        .filter_map(|(index, line)| match_heading(line).map(|key| (key, index)))
        .collect();

    starts
        .iter()
        .enumerate()
        .map(|(i, (key, heading_index))| {
            let end = starts
                .get(i.saturating_add(1))
                .map_or(lines.len(), |(_, next)| *next);
            (*key, heading_index.saturating_add(1), end)
        })
        .collect()
}

/// Split one block of pasted text into subject and body.
///
/// The first non-empty line is the subject unless it is a `Subject:` line
/// (prefix stripped) or a greeting (subject empty, body starts there).
pub fn extract_subject_and_body(text: &str) -> Section {
    let lines: Vec<&str> = text.lines().collect();
    let mut subject = String::new();
    let mut body_start = lines.len();

    if let Some(first) = lines.iter().position(|line| !line.trim().is_empty()) {
        let trimmed = lines[first].trim();
        if let Some(explicit) = subject_of(trimmed) {
            subject = explicit;
            body_start = first.saturating_add(1);
        } else if is_greeting_line(trimmed) {
            body_start = first;
        } else {
            subject = trimmed.to_owned();
            body_start = first.saturating_add(1);
        }
    }

    let body = lines.get(body_start..).unwrap_or_default().join("\n");
    Section {
        subject,
        body: strip_body_label(body.trim()),
    }
}

/// Parse a pasted sequence into sections.
///
/// Duplicate headings produce separate blocks and the last one wins. With no
/// headings at all, the whole trimmed input becomes `email1` with an empty
/// subject.
pub fn parse_sequence(raw: &str) -> SequenceSections {
    let lines: Vec<&str> = raw.lines().collect();
    let blocks = scan_blocks(&lines);

    if blocks.is_empty() {
        return SequenceSections::from_iter([(SectionKey::Email1, Section::new("", raw.trim()))]);
    }

    let mut sections = SequenceSections::new();
    for (key, start, end) in blocks {
        let text = lines.get(start..end).unwrap_or_default().join("\n");
        if sections
            .insert(key, extract_subject_and_body(text.trim()))
            .is_some()
        {
            tracing::debug!(section = %key, "duplicate heading, later block replaces earlier");
        }
    }
    sections
}

/// Parse model-written sequence text.
///
/// The subject comes only from an explicit `Subject:` line anywhere in the
/// block; every other line is body. All six keys are always present.
pub fn parse_model_output(text: &str) -> SequenceSections {
    let lines: Vec<&str> = text.lines().collect();
    let blocks = scan_blocks(&lines);

    let mut sections = SequenceSections::new();
    if blocks.is_empty() {
        sections.insert(SectionKey::Email1, Section::new("", text.trim()));
        return sections.completed();
    }

    for (key, start, end) in blocks {
        let block = lines.get(start..end).unwrap_or_default();
        let mut subject = String::new();
        let mut body_lines: Vec<&str> = Vec::with_capacity(block.len());
        for line in block {
            match subject_of(line) {
                Some(found) if subject.is_empty() => subject = found,
                _ => body_lines.push(line),
            }
        }
        let body = strip_body_label(body_lines.join("\n").trim());
        sections.insert(key, Section { subject, body });
    }
    sections.completed()
}

// ---------------------------------------------------------------------------
// Instrument detection
// ---------------------------------------------------------------------------

/// Classify text by product mention: GeoMx, then CosMx, then CellScape.
/// Defaults to GeoMx when none is mentioned.
pub fn detect_instrument(text: &str) -> Platform {
    let lower = text.to_lowercase();
    if lower.contains("geomx") {
        Platform::GeoMx
    } else if lower.contains("cosmx") {
        Platform::CosMx
    } else if lower.contains("cellscape") {
        Platform::CellScape
    } else {
        Platform::GeoMx
    }
}
