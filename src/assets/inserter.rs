//! Places the selected image marker and attachment sentence inside an email.
//!
//! Image placement walks paragraphs (split on blank lines) and skips the
//! greeting/self-introduction paragraphs. The anchor chain is:
//! pain paragraph followed by a solution paragraph → after the solution;
//! pain only → after the pain; else after the first paragraph naming an
//! instrument; else after the last paragraph using generic platform/value
//! language; else at index `min(2, len)`.

use super::SelectedAssets;
use crate::sequence::intro::collapse_blank_lines;
use crate::sequence::{SectionKey, SenderIdentity, SequenceSections};

const INTRO_PHRASES: &[&str] = &[
    "account manager",
    "nice to meet",
    "nice to e-meet",
    "regional manager",
    "i work with",
    "my name is",
];

const GREETING_WORDS: &[&str] = &["hi", "hello", "hey", "dear", "greetings"];

const INSTRUMENT_NAMES: &[&str] = &["geomx", "cosmx", "cellscape"];

const GENERIC_VALUE_TERMS: &[&str] = &["spatial", "platform", "solution", "enable", "profil"];

const PAIN_MARKERS: &[&str] = &[
    "you cannot",
    "you can't",
    "you lack",
    "you are limited",
    "you rely on",
    "you are missing",
    "struggle",
    "challenge",
    "limited",
    "difficult",
    "gap",
];

const SIGNOFF_PHRASES: &[&str] = &[
    "best regards",
    "warm regards",
    "sincerely",
    "thank you",
    "thanks",
    "looking forward",
    "let me know",
    "best,",
];

/// Marker line inserted for an image.
pub fn image_marker(file_name: &str) -> String {
    format!("[Insert Image: {file_name}]")
}

fn is_intro_paragraph(text: &str) -> bool {
    let lower = text.trim().to_lowercase();
    if INTRO_PHRASES.iter().any(|phrase| lower.contains(phrase)) {
        return true;
    }
    let first_word = lower
        .split(|c: char| c.is_whitespace() || c == ',')
        .next()
        .unwrap_or_default();
    GREETING_WORDS.contains(&first_word)
}

fn contains_any(text: &str, terms: &[&str]) -> bool {
    let lower = text.to_lowercase();
    terms.iter().any(|term| lower.contains(term))
}

fn is_solution_paragraph(text: &str) -> bool {
    contains_any(text, INSTRUMENT_NAMES) || contains_any(text, GENERIC_VALUE_TERMS)
}

/// Index at which the image marker paragraph is inserted.
pub fn image_insert_index(paragraphs: &[&str]) -> usize {
    let content: Vec<(usize, &str)> = paragraphs
        .iter()
        .enumerate()
        .filter(|(_, p)| !p.trim().is_empty() && !is_intro_paragraph(p))
        .map(|(i, p)| (i, *p))
        .collect();

    let after = |i: usize| i.saturating_add(1);

    if let Some((pain, _)) = content.iter().find(|(_, p)| contains_any(p, PAIN_MARKERS)) {
        let solution = content
            .iter()
            .find(|(i, p)| i > pain && is_solution_paragraph(p));
        return match solution {
            Some((i, _)) => after(*i),
            None => after(*pain),
        };
    }

    if let Some((i, _)) = content.iter().find(|(_, p)| contains_any(p, INSTRUMENT_NAMES)) {
        return after(*i);
    }

    if let Some((i, _)) = content
        .iter()
        .rev()
        .find(|(_, p)| contains_any(p, GENERIC_VALUE_TERMS))
    {
        return after(*i);
    }

    paragraphs.len().min(2)
}

fn is_signoff_line(line: &str, sender: &SenderIdentity) -> bool {
    let lower = line.trim().to_lowercase();
    if lower.is_empty() {
        return false;
    }
    SIGNOFF_PHRASES.iter().any(|phrase| lower.contains(phrase))
        || lower == sender.first_name().to_lowercase()
        || lower == sender.name.to_lowercase()
}

/// Line index where the closing block starts, searched from the bottom.
///
/// Adjacent closing lines ("Best," above "Tim") count as one block.
pub fn signoff_index(lines: &[&str], sender: &SenderIdentity) -> Option<usize> {
    let mut index = lines.iter().rposition(|line| is_signoff_line(line, sender))?;
    while let Some(above) = index.checked_sub(1) {
        if !lines.get(above).is_some_and(|line| is_signoff_line(line, sender)) {
            break;
        }
        index = above;
    }
    Some(index)
}

fn insert_image(body: &str, file_name: &str) -> String {
    let marker = image_marker(file_name);
    if body.contains(&marker) {
        return body.to_owned();
    }
    let mut paragraphs: Vec<&str> = body.split("\n\n").collect();
    let index = image_insert_index(&paragraphs).min(paragraphs.len());
    paragraphs.insert(index, &marker);
    paragraphs.join("\n\n")
}

fn insert_attachment_sentence(body: &str, sentence: &str, sender: &SenderIdentity) -> String {
    if body.contains(sentence) {
        return body.to_owned();
    }
    let mut lines: Vec<&str> = body.lines().collect();
    let index = signoff_index(&lines, sender).unwrap_or(lines.len());
    lines.splice(index..index, ["", sentence, ""]);
    collapse_blank_lines(lines.join("\n").trim_end())
}

/// Insert the selection into the body of email `key`.
///
/// LinkedIn keys, absent sections and empty selections return a copy of the
/// input unchanged.
pub fn insert_assets(
    sections: &SequenceSections,
    key: SectionKey,
    selected: &SelectedAssets,
    sender: &SenderIdentity,
) -> SequenceSections {
    if !key.is_email() || selected.is_empty() {
        return sections.clone();
    }
    let Some(section) = sections.get(key) else {
        return sections.clone();
    };

    let mut body = section.body.clone();
    if !selected.image.is_empty() {
        body = insert_image(&body, &selected.image);
    }

    let sentence = selected
        .attachment_reference
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(&selected.justification_sentence);
    if !selected.documents.is_empty() && !sentence.trim().is_empty() {
        body = insert_attachment_sentence(&body, sentence.trim(), sender);
    }

    sections.with_body(key, body)
}
