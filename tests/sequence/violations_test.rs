//! Coverage for banned-content detection.

use outreach::sequence::violations::detect_violations;

#[test]
fn clean_text_has_no_violations() {
    let text = "Hi {{first_name}},\n\nYou cannot see immune niches in bulk data.";
    assert!(detect_violations(text).is_empty());
}

#[test]
fn forbidden_phrases_are_quoted() {
    let found = detect_violations("Happy to Walk Through it if that is on your radar.");
    assert_eq!(
        found,
        vec![
            "Forbidden phrase: \"on your radar\"".to_owned(),
            "Forbidden phrase: \"walk through\"".to_owned(),
        ]
    );
}

#[test]
fn labels_are_reported_once() {
    let found = detect_violations("A quick call of 15 minutes, or a half-hour if needed.");
    assert_eq!(found, vec!["Meeting duration".to_owned()]);

    let found = detect_violations("Unlike Visium or Xenium, this works on FFPE.");
    assert_eq!(found, vec!["Competitor mention".to_owned()]);
}

#[test]
fn pattern_labels_follow_phrases() {
    let found = detect_violations("I can show you a demo (about the assay).");
    assert_eq!(
        found,
        vec![
            "Forbidden phrase: \"show you\"".to_owned(),
            "Demo language".to_owned(),
            "Parentheses".to_owned(),
        ]
    );
}

#[test]
fn framing_is_detected() {
    let found = detect_violations("Many labs struggle with this.");
    assert!(found.contains(&"Third-party framing".to_owned()));

    let found = detect_violations("Something I hear a lot is slow scoring.");
    assert!(found.contains(&"Forbidden phrase: \"something i hear\"".to_owned()));
    assert!(found.contains(&"Forbidden phrase: \"i hear a lot\"".to_owned()));
    assert!(found.contains(&"Setup sentence framing".to_owned()));
}
