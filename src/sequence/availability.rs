//! Renders the sender's availability and places it in section bodies.
//!
//! Per section, the first applicable strategy wins:
//! 1. placeholder tokens (`{{availability}}`, `[availability]`,
//!    `{availability}`) in any section are replaced by the block;
//! 2. `[Date] — [Time]` slots (any dash) are filled positionally from the
//!    slot lines, the last line reused for extra slots;
//! 3. for email1 to email3 only, the block goes before the signoff.
//!
//! Step 3 skips bodies that already contain the block or a line that is
//! exactly a filled slot, so re-running the pass is a no-op.

use std::sync::LazyLock;

use regex::{NoExpand, Regex};
use serde::{Deserialize, Serialize};

use super::{SectionKey, SequenceSections};

static PLACEHOLDER: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"(?i)\{\{\s*availability\s*\}\}|\[availability\]|\{availability\}").ok()
});

static DATE_TIME_SLOT: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?i)\[Date\]\s*[—–-]+\s*\[Time\]").ok());

const BULLET: &str = "•";

/// One day with its free time ranges.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayAvailability {
    /// Day label, e.g. "Tuesday, March 4".
    pub day: String,
    /// Time ranges, e.g. "9:00 AM - 11:00 AM".
    pub ranges: Vec<String>,
}

/// Availability in one of the accepted shapes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AvailabilityInput {
    /// A date window and/or newline-separated time ranges.
    Window {
        /// Date window, e.g. "March 3 - March 7".
        window: Option<String>,
        /// Newline-separated time ranges.
        time_ranges: Option<String>,
    },
    /// A pre-rendered block used verbatim.
    Block(String),
    /// Structured per-day ranges.
    Structured(Vec<DayAvailability>),
}

fn non_empty_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_owned)
        .collect()
}

fn bulleted(header: &str, items: &[String]) -> String {
    let bullets: Vec<String> = items.iter().map(|item| format!("{BULLET} {item}")).collect();
    format!("{header}\n\n{}", bullets.join("\n"))
}

impl AvailabilityInput {
    /// Text block inserted into bodies; empty when there is nothing to say.
    pub fn render_block(&self) -> String {
        match self {
            Self::Window {
                window,
                time_ranges,
            } => {
                let window = window.as_deref().map(str::trim).filter(|w| !w.is_empty());
                let ranges = time_ranges.as_deref().map(non_empty_lines).unwrap_or_default();
                match (window, ranges.is_empty()) {
                    (Some(w), false) => bulleted(&format!("I am available {w}:"), &ranges),
                    (Some(w), true) => format!("I am available {w}."),
                    (None, false) => bulleted("I am available:", &ranges),
                    (None, true) => String::new(),
                }
            }
            Self::Block(text) => text.trim().to_owned(),
            Self::Structured(days) => {
                let items: Vec<String> = days
                    .iter()
                    .filter(|day| !day.ranges.is_empty())
                    .map(|day| format!("{}: {}", day.day.trim(), day.ranges.join(", ")))
                    .collect();
                if items.is_empty() {
                    String::new()
                } else {
                    bulleted("I am available:", &items)
                }
            }
        }
    }

    /// Lines used to fill `[Date] — [Time]` slots, in order.
    pub fn slot_lines(&self) -> Vec<String> {
        match self {
            Self::Window {
                window,
                time_ranges,
            } => {
                let ranges = time_ranges.as_deref().map(non_empty_lines).unwrap_or_default();
                if ranges.is_empty() {
                    window
                        .as_deref()
                        .map(non_empty_lines)
                        .unwrap_or_default()
                } else {
                    ranges
                }
            }
            Self::Block(text) => block_slot_lines(text),
            Self::Structured(days) => days
                .iter()
                .flat_map(|day| {
                    day.ranges
                        .iter()
                        .map(move |range| format!("{} — {}", day.day.trim(), range.trim()))
                })
                .collect(),
        }
    }
}

/// Time-range lines of a free-form block. When any line is bulleted only
/// bulleted lines count; otherwise header lines ending in `:` are skipped.
fn block_slot_lines(text: &str) -> Vec<String> {
    let lines = non_empty_lines(text);
    let has_bullets = lines.iter().any(|line| line.starts_with(BULLET));
    lines
        .iter()
        .filter(|line| {
            if has_bullets {
                line.starts_with(BULLET)
            } else {
                !line.ends_with(':')
            }
        })
        .map(|line| line.trim_start_matches(BULLET).trim())
        .filter(|line| !line.is_empty())
        .map(str::to_owned)
        .collect()
}

fn fill_slots(body: &str, regex: &Regex, lines: &[String]) -> String {
    let mut index = 0_usize;
    regex
        .replace_all(body, |_: &regex::Captures<'_>| {
            let line = lines
                .get(index)
                .or_else(|| lines.last())
                .cloned()
                .unwrap_or_default();
            index = index.saturating_add(1);
            line
        })
        .into_owned()
}

/// Index of the line where the signoff starts: the last non-empty line,
/// extended upward over a short closing such as "Best," directly above it.
fn signoff_start(lines: &[&str]) -> Option<usize> {
    let last = lines.iter().rposition(|line| !line.trim().is_empty())?;
    let above = last.checked_sub(1).and_then(|i| lines.get(i).map(|l| (i, l.trim())));
    match above {
        Some((i, line))
            if line.ends_with(',') && line.split_whitespace().count() <= 3 =>
        {
            Some(i)
        }
        _ => Some(last),
    }
}

/// A slot fill leaves the slot line standing alone, so only whole lines are
/// compared. Prose that merely mentions the window does not count.
fn has_filled_slot(body: &str, slot_lines: &[String]) -> bool {
    body.lines()
        .map(str::trim)
        .any(|line| slot_lines.iter().any(|slot| line == slot.as_str()))
}

fn append_before_signoff(body: &str, block: &str, slot_lines: &[String]) -> String {
    if body.contains(block) || has_filled_slot(body, slot_lines) {
        return body.to_owned();
    }
    let lines: Vec<&str> = body.lines().collect();
    let Some(at) = signoff_start(&lines) else {
        return body.to_owned();
    };
    let head = lines.get(..at).unwrap_or_default().join("\n");
    let tail = lines.get(at..).unwrap_or_default().join("\n");
    let head = head.trim_end();
    if head.is_empty() {
        format!("{block}\n\n{tail}")
    } else {
        format!("{head}\n\n{block}\n\n{tail}")
    }
}

/// Place availability in one body according to the strategy order.
pub fn inject_into_body(key: SectionKey, body: &str, availability: &AvailabilityInput) -> String {
    let block = availability.render_block();
    if block.is_empty() || body.trim().is_empty() {
        return body.to_owned();
    }

    if let Some(regex) = PLACEHOLDER.as_ref().filter(|r| r.is_match(body)) {
        return regex.replace_all(body, NoExpand(&block)).into_owned();
    }

    let lines = availability.slot_lines();
    if let Some(regex) = DATE_TIME_SLOT.as_ref().filter(|r| r.is_match(body)) {
        if !lines.is_empty() {
            return fill_slots(body, regex, &lines);
        }
    }

    match key {
        SectionKey::Email1 | SectionKey::Email2 | SectionKey::Email3 => {
            append_before_signoff(body, &block, &lines)
        }
        _ => body.to_owned(),
    }
}

/// Apply [`inject_into_body`] to every present section.
pub fn inject_availability(
    sections: &SequenceSections,
    availability: &AvailabilityInput,
) -> SequenceSections {
    sections.map_bodies(|key, body| inject_into_body(key, body, availability))
}
