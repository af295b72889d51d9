//! Detection of banned content in drafted text.

use std::sync::LazyLock;

use regex::Regex;

/// Phrases that must not survive into a final sequence (case-insensitive).
pub const FORBIDDEN_PHRASES: &[&str] = &[
    "on your radar",
    "compare notes",
    "decision point",
    "walk through",
    "walkthrough",
    "show you",
    "closing the loop",
    "something i hear",
    "i hear a lot",
    "comes up a lot",
    "a question that comes up",
];

/// Labelled violation patterns.
pub const VIOLATION_PATTERNS: &[(&str, &str)] = &[
    ("Demo language", r"(?i)\bdemo(?:nstrat(?:ion|e))?\b"),
    ("Meeting duration", r"(?i)\b\d+[-\s]?minutes?\b"),
    ("Meeting duration", r"(?i)\bhalf[-\s]?hour\b"),
    ("Meeting duration", r"(?i)\bquick\s+call\b"),
    ("Competitor mention", r"(?i)\b10x\s*genomics\b"),
    ("Competitor mention", r"(?i)\bvisium\b"),
    ("Competitor mention", r"(?i)\bmerfish\b"),
    ("Competitor mention", r"(?i)\bseqfish\b"),
    ("Competitor mention", r"(?i)\bxenium\b"),
    ("Parentheses", r"\([^)]{1,200}\)"),
    (
        "Third-party framing",
        r"(?i)\b(?:many|other|most)\s+(?:teams?|groups?|labs?|researchers?)\b",
    ),
    (
        "Third-party framing",
        r"(?i)\b(?:teams?|groups?)\s+(?:often|tend|struggle|face|working)\b",
    ),
    ("Setup sentence framing", r"(?i)\bsomething\s+(?:i\s+|we\s+)?(?:hear|see)\b"),
    (
        "Setup sentence framing",
        r"(?i)\ba\s+(?:common\s+)?question\s+that\s+comes?\s+up\b",
    ),
    (
        "Setup sentence framing",
        r"(?i)\bcomes?\s+up\s+(?:a\s+lot|often|frequently)\b",
    ),
];

static COMPILED: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    VIOLATION_PATTERNS
        .iter()
        .filter_map(|(label, pattern)| Regex::new(pattern).ok().map(|regex| (*label, regex)))
        .collect()
});

/// Distinct violation descriptions found in `text`, in table order.
pub fn detect_violations(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    let mut found: Vec<String> = FORBIDDEN_PHRASES
        .iter()
        .filter(|phrase| lower.contains(*phrase))
        .map(|phrase| format!("Forbidden phrase: \"{phrase}\""))
        .collect();

    for (label, regex) in COMPILED.iter() {
        if regex.is_match(text) && !found.iter().any(|f| f.as_str() == *label) {
            found.push((*label).to_owned());
        }
    }
    found
}
