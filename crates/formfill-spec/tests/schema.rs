use serde_json::{Value, json};

use formfill_spec::{Question, SchemaError, parse_question_list};

fn sample_source() -> Value {
    json!([
        { "question": "Name", "required": true, "answerType": "TextBox" },
        { "question": "Team", "required": false, "answerType": "MultipleChoice",
          "answers": ["Platform", "Product"] },
        { "question": "Languages", "required": true, "answerType": "Checkbox",
          "answers": ["Rust", "Go", "Python"] },
        { "question": "Office", "required": false, "answerType": "Dropdown",
          "answers": ["Berlin", "Lisbon"] },
        { "question": "Badge photo", "required": false, "answerType": "FileUpload" },
        { "question": "Start date", "required": false, "answerType": "DatePicker" },
    ])
}

#[test]
fn well_formed_list_preserves_variant_tags() {
    let parsed = parse_question_list(&sample_source()).expect("valid list");
    let tags: Vec<&str> = parsed.iter().map(Question::answer_type).collect();
    assert_eq!(
        tags,
        vec![
            "TextBox",
            "MultipleChoice",
            "Checkbox",
            "Dropdown",
            "FileUpload",
            "DatePicker"
        ]
    );

    let reserialized = serde_json::to_value(&parsed).expect("serialize");
    let reparsed = parse_question_list(&reserialized).expect("round trip");
    assert_eq!(reparsed, parsed);
}

#[test]
fn non_array_sources_are_rejected() {
    for value in [json!({}), json!("questions"), json!(42), Value::Null] {
        assert!(matches!(
            parse_question_list(&value),
            Err(SchemaError::NotAnArray)
        ));
    }
}

#[test]
fn unknown_answer_type_fails_the_whole_list() {
    let err = parse_question_list(&json!([
        { "question": "Name", "required": true, "answerType": "TextBox" },
        { "question": "Photo", "required": false, "answerType": "ImageUpload" },
    ]))
    .expect_err("unknown tag");
    assert!(matches!(err, SchemaError::InvalidQuestion { index: 1, .. }));
}

#[test]
fn missing_required_field_fails_the_whole_list() {
    let err = parse_question_list(&json!([
        { "required": true, "answerType": "TextBox" },
    ]))
    .expect_err("missing question text");
    assert!(matches!(err, SchemaError::InvalidQuestion { index: 0, .. }));
}

#[test]
fn wrong_field_type_fails_the_whole_list() {
    let err = parse_question_list(&json!([
        { "question": "Name", "required": "yes", "answerType": "TextBox" },
    ]))
    .expect_err("required must be a bool");
    assert!(matches!(err, SchemaError::InvalidQuestion { index: 0, .. }));

    let err = parse_question_list(&json!([
        { "question": "Team", "required": true, "answerType": "Dropdown",
          "answers": ["ok", 7] },
    ]))
    .expect_err("answers must be strings");
    assert!(matches!(err, SchemaError::InvalidQuestion { index: 0, .. }));
}

#[test]
fn extra_fields_are_tolerated() {
    let parsed = parse_question_list(&json!([
        { "question": "Name", "required": true, "answerType": "TextBox",
          "placeholder": "ignored" },
    ]))
    .expect("extra fields stripped");
    assert_eq!(parsed[0].prompt(), "Name");
}

#[test]
fn duplicate_option_labels_are_accepted() {
    let parsed = parse_question_list(&json!([
        { "question": "Pick", "required": false, "answerType": "Dropdown",
          "answers": ["same", "same"] },
    ]))
    .expect("duplicates are not forbidden");
    assert_eq!(parsed[0].options().unwrap().len(), 2);
}
