//! Coverage for availability rendering and placement.

use outreach::sequence::availability::{
    inject_availability, inject_into_body, AvailabilityInput, DayAvailability,
};
use outreach::sequence::{Section, SectionKey, SequenceSections};

fn window() -> AvailabilityInput {
    AvailabilityInput::Window {
        window: Some("March 3 - March 7".to_owned()),
        time_ranges: Some("9:00 AM - 11:00 AM\n\n1:00 PM - 3:00 PM\n".to_owned()),
    }
}

const SIGNED_BODY: &str = "Hello {{first_name}},\n\nWould you have time to meet in person?\n\nBest,\nTim";

#[test]
fn window_renders_bulleted_block() {
    assert_eq!(
        window().render_block(),
        "I am available March 3 - March 7:\n\n• 9:00 AM - 11:00 AM\n• 1:00 PM - 3:00 PM"
    );
}

#[test]
fn window_without_ranges_renders_sentence() {
    let availability = AvailabilityInput::Window {
        window: Some("next week".to_owned()),
        time_ranges: None,
    };
    assert_eq!(availability.render_block(), "I am available next week.");
}

#[test]
fn structured_days_render_one_bullet_per_day() {
    let availability = AvailabilityInput::Structured(vec![
        DayAvailability {
            day: "Tuesday, March 4".to_owned(),
            ranges: vec!["9:00 AM - 11:00 AM".to_owned(), "2:00 PM - 3:00 PM".to_owned()],
        },
        DayAvailability {
            day: "Wednesday, March 5".to_owned(),
            ranges: Vec::new(),
        },
    ]);
    assert_eq!(
        availability.render_block(),
        "I am available:\n\n• Tuesday, March 4: 9:00 AM - 11:00 AM, 2:00 PM - 3:00 PM"
    );
}

#[test]
fn placeholder_is_replaced_in_place() {
    let body = "Hello,\n\nCould we meet?\n{{availability}}\n\nBest,\nTim";
    let out = inject_into_body(
        SectionKey::Email1,
        body,
        &AvailabilityInput::Block("Tuesday 9-11 AM".to_owned()),
    );
    assert_eq!(out, "Hello,\n\nCould we meet?\nTuesday 9-11 AM\n\nBest,\nTim");
}

#[test]
fn placeholder_variants_all_match() {
    let availability = AvailabilityInput::Block("Friday".to_owned());
    for token in ["{{availability}}", "[availability]", "{availability}", "{{ Availability }}"] {
        let out = inject_into_body(SectionKey::Email2, &format!("Free on {token}."), &availability);
        assert_eq!(out, "Free on Friday.");
    }
}

#[test]
fn placeholder_is_honoured_even_in_email4() {
    let out = inject_into_body(
        SectionKey::Email4,
        "Later: {{availability}}",
        &AvailabilityInput::Block("June".to_owned()),
    );
    assert_eq!(out, "Later: June");
}

#[test]
fn date_time_slots_fill_positionally_and_reuse_last_line() {
    let body = "Options:\n[Date] — [Time]\n[Date] - [Time]\n[Date] – [Time]";
    let out = inject_into_body(SectionKey::Email1, body, &window());
    assert_eq!(
        out,
        "Options:\n9:00 AM - 11:00 AM\n1:00 PM - 3:00 PM\n1:00 PM - 3:00 PM"
    );
}

#[test]
fn block_is_appended_before_signoff() {
    let out = inject_into_body(SectionKey::Email1, SIGNED_BODY, &window());
    assert_eq!(
        out,
        "Hello {{first_name}},\n\nWould you have time to meet in person?\n\n\
         I am available March 3 - March 7:\n\n• 9:00 AM - 11:00 AM\n• 1:00 PM - 3:00 PM\n\n\
         Best,\nTim"
    );
}

#[test]
fn second_run_does_not_duplicate_the_block() {
    let once = inject_into_body(SectionKey::Email2, SIGNED_BODY, &window());
    let twice = inject_into_body(SectionKey::Email2, &once, &window());
    assert_eq!(once, twice);
    assert_eq!(twice.matches("I am available").count(), 1);
}

#[test]
fn second_run_after_slot_fill_is_a_no_op() {
    let body = "Options:\n[Date] — [Time]\n\nBest,\nTim";
    let once = inject_into_body(SectionKey::Email3, body, &window());
    let twice = inject_into_body(SectionKey::Email3, &once, &window());
    assert_eq!(once, twice);
}

#[test]
fn email4_and_linkedin_never_get_appended_block() {
    for key in [
        SectionKey::Email4,
        SectionKey::LinkedinConnection,
        SectionKey::LinkedinMessage,
    ] {
        assert_eq!(inject_into_body(key, SIGNED_BODY, &window()), SIGNED_BODY);
    }
}

#[test]
fn empty_availability_leaves_body_unchanged() {
    let empty = AvailabilityInput::Window {
        window: None,
        time_ranges: Some("  \n".to_owned()),
    };
    assert_eq!(inject_into_body(SectionKey::Email1, SIGNED_BODY, &empty), SIGNED_BODY);
}

#[test]
fn sequence_pass_returns_new_value_and_keeps_input() {
    let sections: SequenceSections = [
        (SectionKey::Email1, Section::new("One", SIGNED_BODY)),
        (SectionKey::Email4, Section::new("Four", SIGNED_BODY)),
    ]
    .into_iter()
    .collect();

    let out = inject_availability(&sections, &window());
    assert!(out.body(SectionKey::Email1).contains("I am available"));
    assert_eq!(out.body(SectionKey::Email4), SIGNED_BODY);
    assert_eq!(sections.body(SectionKey::Email1), SIGNED_BODY);
    assert!(!out.contains(SectionKey::Email2));
}

#[test]
fn prose_mentioning_the_window_still_gets_the_block() {
    let availability = AvailabilityInput::Window {
        window: Some("next week".to_owned()),
        time_ranges: None,
    };
    let body = "I'll be visiting labs in Boston next week.\n\nBest,\nTim";
    let out = inject_into_body(SectionKey::Email1, body, &availability);
    assert_eq!(
        out,
        "I'll be visiting labs in Boston next week.\n\nI am available next week.\n\nBest,\nTim"
    );
    assert_eq!(inject_into_body(SectionKey::Email1, &out, &availability), out);
}

#[test]
fn block_header_is_not_used_as_a_slot_value() {
    let availability =
        AvailabilityInput::Block("I am available:\n\n• Tue 9-11am\n• Wed 1-3pm".to_owned());
    assert_eq!(availability.slot_lines(), vec!["Tue 9-11am", "Wed 1-3pm"]);

    let body = "Would any of these work?\n[Date] — [Time]\n[Date] — [Time]\n\nBest,\nTim";
    let out = inject_into_body(SectionKey::Email1, body, &availability);
    assert_eq!(out, "Would any of these work?\nTue 9-11am\nWed 1-3pm\n\nBest,\nTim");
}

#[test]
fn unbulleted_block_skips_colon_headers() {
    let availability = AvailabilityInput::Block("Open times:\nTue 9-11am\nThu 2-4pm".to_owned());
    assert_eq!(availability.slot_lines(), vec!["Tue 9-11am", "Thu 2-4pm"]);
}
