//! Canonical greetings and sender preamble.
//!
//! Drafts arrive with arbitrary salutations and self-introductions. Every
//! non-empty body has them stripped and the canonical opening re-imposed:
//! emails get `Hello {{first_name}},` plus the sender's introduction line,
//! LinkedIn touches get a single `Hi {{first_name}},` line.
//!
//! Content found after a salutation on the same line ("Hi John, following
//! up...") is kept. Emails keep it as its own line; LinkedIn keeps the first
//! such fragment on the greeting line. Applying the pass twice gives the same
//! result as applying it once.

use std::sync::LazyLock;

use regex::Regex;

use super::{SectionKey, SenderIdentity, SequenceSections};

/// First preamble line of every email.
pub const EMAIL_GREETING: &str = "Hello {{first_name}},";

/// Greeting line of every LinkedIn touch.
pub const LINKEDIN_GREETING: &str = "Hi {{first_name}},";

static GREETING: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(?i)^(?:hi|hello|hey|dear|greetings|good\s+(?:morning|afternoon|evening))\b",
        r"(?:",
        r"\s+\{\{\s*first_name\s*\}\}\s*[,!:;—–]?",
        r"|\s+(?:there|all|everyone|team|folks)\s*(?:[,!:;—–]|$)",
        r"|\s+(?:(?:dr|prof|mr|ms|mrs)\.?\s+)?[a-z][\w'.]*(?:\s+[a-z][\w'.]*)?\s*[,!:;—–]",
        r"|\s*[,!:;—–]",
        r"|\s*$",
        r")\s*",
    ))
    .ok()
});

static EXCESS_BLANK_LINES: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"\n(?:[ \t]*\n){2,}").ok());

/// Collapse three or more consecutive newlines into one blank line.
pub fn collapse_blank_lines(text: &str) -> String {
    match EXCESS_BLANK_LINES.as_ref() {
        Some(regex) => regex.replace_all(text, "\n\n").into_owned(),
        None => text.to_owned(),
    }
}

/// Content after a leading salutation, if `line` opens with one.
///
/// Returns `Some("")` for a bare greeting line.
pub fn split_greeting(line: &str) -> Option<&str> {
    let trimmed = line.trim();
    let regex = GREETING.as_ref()?;
    regex
        .find(trimmed)
        .map(|m| trimmed.get(m.end()..).unwrap_or_default().trim())
}

/// Recognises sentences in which the sender introduces themselves.
#[derive(Debug)]
pub struct IntroMatcher {
    patterns: Vec<Regex>,
}

impl IntroMatcher {
    /// Build the matcher for one sender.
    pub fn new(sender: &SenderIdentity) -> Self {
        let first = regex::escape(&sender.first_name().to_lowercase());
        let full = regex::escape(&sender.name.to_lowercase());
        let title = regex::escape(&sender.title.to_lowercase());

        let mut sources = vec![
            r"(?i)\bmy name is\b".to_owned(),
            r"(?i)\bi(?:'m|’m| am)\s+(?:the|your)\s+[^.]*\b(?:account manager|regional manager|sales representative)\b".to_owned(),
        ];
        if !first.is_empty() {
            sources.push(format!(r"(?i)\b(?:i'm|i’m|i am|this is|it's|it’s)\s+{first}\b"));
        }
        if !full.is_empty() {
            sources.push(format!(r"(?i)\b{full}\b.*\b(?:i'm|i’m|i am|this is)\b"));
            sources.push(format!(r"(?i)\b(?:i'm|i’m|i am|this is)\b.*\b{full}\b"));
        }
        if !title.is_empty() {
            sources.push(format!(r"(?i)\b(?:i'm|i’m|i am|as the|i serve as)\b.*\b{title}\b"));
        }

        Self {
            patterns: sources
                .iter()
                .filter_map(|source| Regex::new(source).ok())
                .collect(),
        }
    }

    /// True when `sentence` is a self-introduction.
    pub fn is_intro(&self, sentence: &str) -> bool {
        self.patterns.iter().any(|regex| regex.is_match(sentence))
    }

    /// `line` without its self-introduction sentences.
    pub fn strip(&self, line: &str) -> String {
        if !self.patterns.iter().any(|regex| regex.is_match(line)) {
            return line.trim_end().to_owned();
        }
        split_sentences(line)
            .into_iter()
            .filter(|sentence| !self.is_intro(sentence))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Split after `.`, `!` or `?` when followed by whitespace. Pieces are trimmed.
fn split_sentences(line: &str) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut start = 0_usize;
    let mut iter = line.char_indices().peekable();
    while let Some((index, c)) = iter.next() {
        let next_is_space = iter.peek().is_some_and(|(_, next)| next.is_whitespace());
        if matches!(c, '.' | '!' | '?') && next_is_space {
            let end = index.saturating_add(c.len_utf8());
            pieces.push(line.get(start..end).unwrap_or_default().trim());
            start = end;
        }
    }
    pieces.push(line.get(start..).unwrap_or_default().trim());
    pieces.into_iter().filter(|piece| !piece.is_empty()).collect()
}

fn capitalize_first(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// A body with salutations and self-introductions removed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StrippedBody {
    /// Content salvaged from a greeting line that precedes all other content.
    pub leading_salvage: Option<String>,
    /// Remaining body.
    pub body: String,
}

/// Remove greeting lines and self-introduction sentences from `body`.
///
/// A salvaged fragment from a greeting that precedes all other content is
/// reported in `leading_salvage` when `inline_leading` is set; otherwise it
/// stays in the body as its own line.
pub fn strip_greetings_and_intro(
    body: &str,
    matcher: &IntroMatcher,
    inline_leading: bool,
) -> StrippedBody {
    let mut kept: Vec<String> = Vec::new();
    let mut leading_salvage: Option<String> = None;
    let mut found_content = false;

    for line in body.lines() {
        if let Some(rest) = split_greeting(line) {
            let rest = matcher.strip(rest);
            if rest.trim().is_empty() {
                continue;
            }
            if !found_content && inline_leading && leading_salvage.is_none() {
                leading_salvage = Some(rest.trim().to_owned());
            } else {
                kept.push(capitalize_first(rest.trim()));
                found_content = true;
            }
            continue;
        }

        let cleaned = if line.trim().is_empty() {
            String::new()
        } else {
            let stripped = matcher.strip(line);
            if stripped.trim().is_empty() {
                continue;
            }
            stripped
        };

        if !found_content && cleaned.trim().is_empty() {
            continue;
        }
        found_content = true;
        kept.push(cleaned);
    }

    StrippedBody {
        leading_salvage,
        body: collapse_blank_lines(kept.join("\n").trim()),
    }
}

/// Re-impose the canonical opening on one body.
pub fn apply_intro_rules(key: SectionKey, body: &str, sender: &SenderIdentity) -> String {
    apply_with(key, body, sender, &IntroMatcher::new(sender))
}

fn apply_with(key: SectionKey, body: &str, sender: &SenderIdentity, matcher: &IntroMatcher) -> String {
    if body.trim().is_empty() {
        return body.to_owned();
    }

    if key.is_linkedin() {
        let stripped = strip_greetings_and_intro(body, matcher, true);
        let greeting = match stripped.leading_salvage {
            Some(salvage) => format!("{LINKEDIN_GREETING} {salvage}"),
            None => LINKEDIN_GREETING.to_owned(),
        };
        if stripped.body.is_empty() {
            return greeting;
        }
        return collapse_blank_lines(&format!("{greeting}\n\n{}", stripped.body));
    }

    let stripped = strip_greetings_and_intro(body, matcher, false);
    let preamble = format!("{EMAIL_GREETING}\n{}", sender.intro_line());
    if stripped.body.is_empty() {
        return preamble;
    }
    collapse_blank_lines(&format!("{preamble}\n\n{}", stripped.body))
}

/// Strip and re-impose openings on every non-empty section body.
pub fn enforce_intro_rules(sections: &SequenceSections, sender: &SenderIdentity) -> SequenceSections {
    let matcher = IntroMatcher::new(sender);
    sections.map_bodies(|key, body| apply_with(key, body, sender, &matcher))
}
