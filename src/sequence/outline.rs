//! Deterministic content outline from a research brief.
//!
//! The platform and the four content fields are decided here, never by the
//! drafting model. Each field is rewritten into a direct, second-person
//! statement so the draft addresses the prospect instead of "many teams".
//! All normalizers are total: empty or unmatched input comes back
//! essentially unchanged.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use super::SenderIdentity;
use crate::assets::Platform;

/// Anchor used when the brief has no research-focus section.
pub const DEFAULT_ANCHOR: &str = "their research area";

/// Pain used when the brief has no pain section.
pub const DEFAULT_PAIN: &str = "cannot see the spatial organization of immune cells in tissue";

const MAX_SECTION_ITEMS: usize = 3;

/// Outline construction failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OutlineError {
    /// The brief names none of the three platforms.
    #[error("no valid platform found in research brief, expected one of CosMx, GeoMx, CellScape")]
    MissingPlatform,
}

/// Fixed content the drafting model is allowed to use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentOutline {
    /// Platform promoted by the whole sequence.
    pub platform: Platform,
    /// Disease area, modality or translational goal of the prospect.
    pub prospect_anchor: String,
    /// Second-person pain statement.
    pub pain: String,
    /// Recent trigger or pressure, hedges removed. May be empty.
    pub trigger: String,
    /// "With {platform}, you can ..." capability. May be empty.
    pub spatial_advantage: String,
}

// ---------------------------------------------------------------------------
// Extraction
// ---------------------------------------------------------------------------

static INSTRUMENT_LINE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?i)Instrument:\s*(CosMx|GeoMx|CellScape)").ok());

/// Platform from an `Instrument: <name>` line, else from a bare mention
/// spelled exactly as the product name.
///
/// # Errors
///
/// Returns [`OutlineError::MissingPlatform`] when no platform is named.
pub fn extract_platform(brief: &str) -> Result<Platform, OutlineError> {
    let labelled = INSTRUMENT_LINE
        .as_ref()
        .and_then(|regex| regex.captures(brief))
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<Platform>().ok());
    if let Some(platform) = labelled {
        return Ok(platform);
    }

    Platform::ALL
        .into_iter()
        .find(|platform| brief.contains(platform.as_str()))
        .ok_or(OutlineError::MissingPlatform)
}

fn is_section_boundary(line: &str, is_last: bool) -> bool {
    let trimmed = line.trim_end();
    if trimmed.starts_with('#') {
        return true;
    }
    let starts_with_letter = trimmed.chars().next().is_some_and(|c| c.is_ascii_alphabetic());
    starts_with_letter && trimmed.chars().count() >= 4 && !is_last
}

/// Up to three bullet items following the first line containing
/// `heading_fragment` (case-insensitive), joined with spaces.
///
/// The section ends at the next plain heading line: one starting with a
/// letter, at least four characters long, that is not the final line of
/// the brief. The line right after the heading never ends the section.
pub fn extract_section(brief: &str, heading_fragment: &str) -> String {
    let fragment = heading_fragment.to_lowercase();
    let lines: Vec<&str> = brief.split('\n').collect();
    let Some(heading) = lines
        .iter()
        .position(|line| line.to_lowercase().contains(&fragment))
    else {
        return String::new();
    };

    let first = heading.saturating_add(1);
    let last_index = lines.len().saturating_sub(1);
    let mut items: Vec<String> = Vec::new();
    for (index, line) in lines.iter().enumerate().skip(first) {
        if index > first && is_section_boundary(line, index == last_index) {
            break;
        }
        let item = line
            .trim_start_matches(|c: char| matches!(c, '-' | '•' | '*') || c.is_whitespace())
            .trim();
        if !item.is_empty() {
            items.push(item.to_owned());
        }
    }

    items.truncate(MAX_SECTION_ITEMS);
    items.join(" ").trim().to_owned()
}

// ---------------------------------------------------------------------------
// Normalizers
// ---------------------------------------------------------------------------

fn compile(patterns: &[(&str, &'static str)]) -> Vec<(Regex, &'static str)> {
    patterns
        .iter()
        .filter_map(|(pattern, replacement)| {
            Regex::new(pattern).ok().map(|regex| (regex, *replacement))
        })
        .collect()
}

static FRAMING_RULES: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    compile(&[
        (
            r"(?i)\b(?:many|other|these|most)\s+(?:teams?|groups?|labs?|researchers?|scientists?)\s+(?:often\s+|typically\s+|commonly\s+)?(?:working\s+on|studying|developing|running|using|do(?:ing)?|face|struggle|lack|tend)\b",
            "",
        ),
        (
            r"(?i)\b(?:teams?|groups?|labs?|researchers?|scientists?)\s+(?:often|typically|tend\s+to|commonly|usually|face|struggle|lack)\b",
            "",
        ),
        (
            r"(?i)\bsomething\s+(?:i\s+|we\s+)?(?:hear|see)\s+(?:a\s+lot\s+|often\s+|frequently\s+)?(?:is\s+)?",
            "",
        ),
        (r"(?i)\ba\s+(?:common\s+)?question\s+that\s+comes?\s+up\b", ""),
        (r"(?i)\bcomes?\s+up\s+(?:a\s+lot\s*|often\s*|frequently\s*)(?:is\s+)?", ""),
        (r"(?i)\boften\b", ""),
        (r"(?i)\btypically\b", ""),
        (r"(?i)\bcommonly\b", ""),
        (r"(?i)\btends?\s+to\b", ""),
    ])
});

static LEADING_ARTIFACTS: LazyLock<Vec<(Regex, &'static str)>> =
    LazyLock::new(|| compile(&[(r"^[,;]\s*", ""), (r"(?i)^(?:and|but|or)\s+", "")]));

static PAIN_RULES: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    compile(&[
        (r"^[Ll]imited\s+to\s+", "You are limited to "),
        (r"^[Ll]imited\s+ability\s+to\s+", "You cannot "),
        (r"^[Rr]el(?:y|ying)\s+on\s+", "You rely on "),
        (r"^[Ll]ack\s+of\s+", "You lack "),
        (r"^[Ll]acking\s+", "You lack "),
        (r"^[Uu]nable\s+to\s+", "You cannot "),
        (r"^[Dd]ifficulty\s+(?:with\s+|in\s+)?", "You cannot "),
        (r"^[Mm]issing\s+", "You are missing "),
    ])
});

static TRIGGER_RULES: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    compile(&[
        (r"(?i)\bsuggests?\b", "means"),
        (r"(?i)\bsignals?\b", "means"),
        (r"(?i)\bindicates?\b", "means"),
        (r"(?i)\blikely\b", ""),
        (r"(?i)\bpossibly\b", ""),
        (r"(?i)\bprobably\b", ""),
    ])
});

static STARTS_WITH_YOU: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"(?i)^you\b").ok());

static STARTS_WITH_CAN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?i)^(?:can|cannot|can't)\b").ok());

static WELL_FORMED_CAPABILITY: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?i)^(?:with\s+|you\s+can\b)").ok());

static ABILITY_TO: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[Aa]bility\s+to\s+(.+)").ok());

static ACTION_VERB: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"^([Rr]esolve|[Ii]dentify|[Ss]ee|[Mm]ap|[Dd]etect|[Qq]uantify|[Pp]rofile|[Cc]haracterize|[Cc]onfirm|[Tt]rack|[Vv]isualize)\s+(.+)").ok()
});

static MULTI_SPACE: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"\s{2,}").ok());

fn apply_rules(text: &str, rules: &[(Regex, &'static str)]) -> String {
    rules.iter().fold(text.to_owned(), |acc, (regex, replacement)| {
        regex.replace_all(&acc, *replacement).into_owned()
    })
}

fn squeeze_spaces(text: &str) -> String {
    match MULTI_SPACE.as_ref() {
        Some(regex) => regex.replace_all(text, " ").trim().to_owned(),
        None => text.trim().to_owned(),
    }
}

fn hits(regex: &LazyLock<Option<Regex>>, text: &str) -> bool {
    regex.as_ref().is_some_and(|r| r.is_match(text))
}

fn lowercase_first(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn strip_bullet(text: &str) -> &str {
    let trimmed = text.trim();
    match trimmed.strip_prefix(['-', '•', '*']) {
        Some(rest) => rest.trim_start(),
        None => trimmed,
    }
}

/// Remove third-party framing, setup phrases and hedge adverbs.
pub fn sanitize_field(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }
    let stripped = apply_rules(text, &FRAMING_RULES);
    let squeezed = squeeze_spaces(&stripped);
    squeeze_spaces(&apply_rules(&squeezed, &LEADING_ARTIFACTS))
}

/// Reshape a pain blurb into a second-person statement ("You cannot ...").
pub fn to_pain_statement(text: &str) -> String {
    let s = strip_bullet(text);
    if s.is_empty() {
        return String::new();
    }
    if hits(&STARTS_WITH_YOU, s) {
        return s.to_owned();
    }
    if hits(&STARTS_WITH_CAN, s) {
        return format!("You {}", lowercase_first(s));
    }

    let rewritten = apply_rules(s, &PAIN_RULES);
    if hits(&STARTS_WITH_YOU, &rewritten) {
        rewritten
    } else {
        format!("You {}", lowercase_first(&rewritten))
    }
}

/// Reshape an advantage blurb into "With {platform}, you can ...".
pub fn to_capability_statement(text: &str, platform: Platform) -> String {
    let s = strip_bullet(text);
    if s.is_empty() {
        return String::new();
    }
    if hits(&WELL_FORMED_CAPABILITY, s) {
        return s.to_owned();
    }

    let ability = ABILITY_TO
        .as_ref()
        .and_then(|regex| regex.captures(s))
        .and_then(|caps| caps.get(1));
    if let Some(rest) = ability {
        return format!("With {platform}, you can {}", rest.as_str());
    }

    let verb = ACTION_VERB
        .as_ref()
        .and_then(|regex| regex.captures(s))
        .and_then(|caps| Some((caps.get(1)?, caps.get(2)?)));
    if let Some((verb, rest)) = verb {
        return format!(
            "With {platform}, you can {} {}",
            verb.as_str().to_lowercase(),
            rest.as_str()
        );
    }

    format!("With {platform}, you can {}", lowercase_first(s))
}

/// Turn hedged trigger language into a factual statement.
pub fn to_trigger_statement(text: &str) -> String {
    let s = strip_bullet(text);
    if s.is_empty() {
        return String::new();
    }
    squeeze_spaces(&apply_rules(s, &TRIGGER_RULES))
}

// ---------------------------------------------------------------------------
// Outline
// ---------------------------------------------------------------------------

fn first_section(brief: &str, fragments: &[&str]) -> Option<String> {
    fragments
        .iter()
        .map(|fragment| extract_section(brief, fragment))
        .find(|section| !section.is_empty())
}

/// Build the outline from a research brief.
///
/// The lead intel is accepted for symmetry with the research stage but the
/// outline is derived from the brief alone.
///
/// # Errors
///
/// Returns [`OutlineError::MissingPlatform`] when the brief names no platform.
pub fn build_content_outline(
    _lead_intel: &str,
    brief: &str,
) -> Result<ContentOutline, OutlineError> {
    let platform = extract_platform(brief)?;

    let raw_anchor = first_section(brief, &["Research focus and disease area", "Research focus"])
        .unwrap_or_else(|| DEFAULT_ANCHOR.to_owned());
    let raw_pain = first_section(brief, &["Likely pain", "pain / gap"])
        .unwrap_or_else(|| DEFAULT_PAIN.to_owned());
    let raw_trigger =
        first_section(brief, &["Recent trigger", "trigger / pressure"]).unwrap_or_default();
    let raw_advantage = first_section(brief, &["Concrete spatial advantage", "Why this instrument"])
        .unwrap_or_default();

    Ok(ContentOutline {
        platform,
        prospect_anchor: sanitize_field(&raw_anchor),
        pain: to_pain_statement(&sanitize_field(&raw_pain)),
        trigger: to_trigger_statement(&sanitize_field(&raw_trigger)),
        spatial_advantage: to_capability_statement(&sanitize_field(&raw_advantage), platform),
    })
}

/// Serialize the outline into the drafting instruction message.
pub fn build_user_message(outline: &ContentOutline, sender: &SenderIdentity) -> String {
    let platform = outline.platform;
    let pain = &outline.pain;
    let anchor = &outline.prospect_anchor;
    let escalation = [&outline.trigger, &outline.spatial_advantage, &outline.pain]
        .into_iter()
        .find(|field| !field.is_empty())
        .map_or("", String::as_str);
    let capability = if outline.spatial_advantage.is_empty() {
        pain.as_str()
    } else {
        outline.spatial_advantage.as_str()
    };
    let name = &sender.name;

    format!(
        "Write a 6-part outreach sequence using this fixed content outline.

Output only these sections in this exact order, with these exact headers:
Email 1
Email 2
LinkedIn Connection Request
LinkedIn Message
Email 3
Email 4

FIXED CONSTRAINTS:
- Sender identity: {name}, {title}, {company}
- Platform: {platform} (mention only {platform}, no other platforms)
- Every email starts with its own paragraph: Hi {{{{first_name}}}},
- Every email has a subject line on its own line formatted exactly as: Subject: [subject text]
- Subject lines are short and specific, with no marketing language or clever phrasing
- Emails 1, 2 and 3 each include this exact placeholder on its own line: {{{{availability}}}}
- Email 4 does not include {{{{availability}}}}
- The meeting ask is always in person while {name} is in the area, never a video or phone call
- Never write specific dates or times, only the {{{{availability}}}} placeholder

EMAIL 1:
- Subject references a practical problem
- Introduce {name} briefly and plainly
- State this pain plainly and directly, without softening it or attributing it to other teams: {pain}
- The pain is specific to this prospect's work: {anchor}
- Reference {platform} only as the way to address that pain, without listing features
- Close with the in-person meeting ask, then {{{{availability}}}} on its own line

EMAIL 2:
- Subject takes a different angle from Email 1
- Acknowledge they may not have seen the first email
- State this angle plainly and directly: {escalation}
- Do not re-explain {platform}
- Close with {{{{availability}}}} on its own line

LINKEDIN CONNECTION REQUEST:
- One sentence, human and neutral, no selling or explaining

LINKEDIN MESSAGE:
- Acknowledge reaching out by email
- Short and conversational, no technical explanation, no meeting ask

EMAIL 3:
- Acknowledge the lack of response neutrally, without apology
- Introduce this one capability: {capability}
- More direct and confident tone
- Close with the in-person meeting ask, then {{{{availability}}}} on its own line

EMAIL 4:
- No new information and no selling
- Acknowledge the timing may not be right and that {name} will reconnect later
- Calm, respectful, final tone with no meeting ask and no {{{{availability}}}}",
        title = sender.title,
        company = sender.company,
    )
}
