mod common;

use std::collections::BTreeMap;

use formfill::engine::{FormEngine, REQUIRED_MESSAGE, SubmitOutcome};
use formfill_spec::{
    AnswerValue, CleanAnswer, FilePayload, Question, QuestionList, decode_image, encode_image,
};
use formfill_store::{ImageStore, SavedFormRepository};

use common::Harness;

fn name_question() -> QuestionList {
    vec![Question::TextBox {
        question: "Name".into(),
        required: true,
    }]
}

fn survey_questions() -> QuestionList {
    vec![
        Question::TextBox {
            question: "Name".into(),
            required: true,
        },
        Question::Checkbox {
            question: "Languages".into(),
            required: true,
            answers: vec!["Rust".into(), "Go".into()],
        },
        Question::Dropdown {
            question: "Office".into(),
            required: false,
            answers: vec!["Berlin".into(), "Lisbon".into()],
        },
    ]
}

fn badge_upload() -> AnswerValue {
    AnswerValue::File(FilePayload {
        file_name: "badge.png".into(),
        mime: "image/png".into(),
        bytes: b"not-really-a-png".to_vec(),
    })
}

#[tokio::test]
async fn unanswered_required_questions_block_submission() {
    let harness = Harness::new();
    let mut engine = FormEngine::new(survey_questions(), harness.services());
    engine.set_answer(2, AnswerValue::Text("Berlin".into()));

    let outcome = engine.submit().await;
    let SubmitOutcome::Invalid { first_error } = outcome else {
        panic!("expected validation failure");
    };
    assert_eq!(first_error, 0);
    assert_eq!(engine.errors().len(), 2);
    assert_eq!(engine.errors()[&0], REQUIRED_MESSAGE);
    assert_eq!(engine.errors()[&1], REQUIRED_MESSAGE);
    assert!(!engine.saving());

    // Nothing was persisted and no export was triggered.
    assert!(harness.forms.list().await.is_empty());
    assert!(harness.images.is_empty());
    assert_eq!(harness.exporter.count(), 0);
}

#[tokio::test]
async fn blank_text_and_empty_selections_count_as_unanswered() {
    let harness = Harness::new();
    let mut engine = FormEngine::new(survey_questions(), harness.services());
    engine.set_answer(0, AnswerValue::Text("   ".into()));
    engine.set_answer(1, AnswerValue::Many(Vec::new()));

    assert_eq!(engine.validate(), Some(0));
    assert_eq!(engine.errors().len(), 2);
}

#[tokio::test]
async fn empty_then_filled_name_matches_the_expected_flow() {
    let harness = Harness::new();
    let mut engine = FormEngine::new(name_question(), harness.services());

    let SubmitOutcome::Invalid { first_error } = engine.submit().await else {
        panic!("empty submit must fail");
    };
    assert_eq!(first_error, 0);
    assert_eq!(engine.errors().len(), 1);
    assert!(harness.forms.list().await.is_empty());
    assert_eq!(harness.exporter.count(), 0);

    engine.set_answer(0, AnswerValue::Text("Ada".into()));
    let SubmitOutcome::Saved {
        form,
        answers,
        export,
    } = engine.submit().await
    else {
        panic!("filled submit must succeed");
    };
    export.await.expect("export task");

    assert_eq!(answers[&0], CleanAnswer::Text("Ada".into()));
    assert!(engine.errors().is_empty());
    assert!(!engine.saving());

    let saved = harness.forms.list().await;
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].id, form.id);
    assert_eq!(saved[0].answers[&0], CleanAnswer::Text("Ada".into()));

    let exported = harness.exporter.last().expect("export invoked");
    assert_eq!(exported.answers[&0], CleanAnswer::Text("Ada".into()));
    assert_eq!(exported.questions, name_question());
}

#[tokio::test]
async fn submission_without_files_leaves_the_image_map_unchanged() {
    let harness = Harness::new();
    let mut engine = FormEngine::new(survey_questions(), harness.services());
    engine.set_answer(0, AnswerValue::Text("Grace".into()));
    engine.set_answer(1, AnswerValue::Many(vec!["Rust".into()]));
    engine.set_answer(2, AnswerValue::Text("Lisbon".into()));

    let SubmitOutcome::Saved { form, answers, export } = engine.submit().await else {
        panic!("valid submit");
    };
    export.await.expect("export task");

    assert_eq!(answers.len(), 3);
    assert!(form.image_map.is_empty());
    assert!(harness.images.is_empty());
}

#[tokio::test]
async fn file_answers_move_into_the_image_store() {
    let harness = Harness::new();
    let questions = vec![
        Question::TextBox {
            question: "Name".into(),
            required: true,
        },
        Question::FileUpload {
            question: "Badge photo".into(),
            required: true,
        },
    ];
    let mut engine = FormEngine::new(questions, harness.services());
    engine.set_answer(0, AnswerValue::Text("Ada".into()));
    engine.set_answer(1, badge_upload());

    let SubmitOutcome::Saved { form, answers, export } = engine.submit().await else {
        panic!("valid submit");
    };
    export.await.expect("export task");

    // The raw file never reaches the persisted answers; its payload lives in
    // the image store under the id recorded in the image map.
    assert!(!answers.contains_key(&1));
    assert!(!form.answers.contains_key(&1));
    let image_id = form.image_map.get(&1).expect("image id recorded");
    assert_eq!(image_id, "img-0");

    let stored = harness
        .images
        .load(image_id)
        .await
        .expect("load")
        .expect("payload present");
    assert_eq!(stored, encode_image("image/png", b"not-really-a-png"));
    let (_, bytes) = decode_image(&stored).expect("data uri");
    assert_eq!(bytes, b"not-really-a-png");

    // The exporter received the embedded payload for that index.
    let exported = harness.exporter.last().expect("export invoked");
    assert_eq!(exported.images.get(&1), Some(&stored));
}

#[tokio::test]
async fn saved_forms_restore_questions_and_images() {
    let harness = Harness::new();
    let questions = vec![Question::FileUpload {
        question: "Badge photo".into(),
        required: true,
    }];
    let mut engine = FormEngine::new(questions.clone(), harness.services());
    engine.set_answer(0, badge_upload());
    let SubmitOutcome::Saved { form, export, .. } = engine.submit().await else {
        panic!("valid submit");
    };
    export.await.expect("export task");

    let mut reloaded = FormEngine::from_saved(&form, harness.services());
    assert_eq!(reloaded.questions(), &questions);
    assert!(reloaded.value(0).is_none());

    reloaded.restore_images().await;
    match reloaded.value(0) {
        Some(AnswerValue::Text(payload)) => {
            assert_eq!(payload, &encode_image("image/png", b"not-really-a-png"));
        }
        other => panic!("expected restored payload, got {other:?}"),
    }
}

#[tokio::test]
async fn resubmitting_a_restored_form_keeps_the_image_map() {
    let harness = Harness::new();
    let questions = vec![Question::FileUpload {
        question: "Badge photo".into(),
        required: true,
    }];
    let mut engine = FormEngine::new(questions, harness.services());
    engine.set_answer(0, badge_upload());
    let SubmitOutcome::Saved { form, export, .. } = engine.submit().await else {
        panic!("valid submit");
    };
    export.await.expect("export task");

    let mut reloaded = FormEngine::from_saved(&form, harness.services());
    reloaded.restore_images().await;
    let SubmitOutcome::Saved {
        form: second,
        export,
        ..
    } = reloaded.submit().await
    else {
        panic!("restored submit");
    };
    export.await.expect("export task");

    // The restored answer is already persisted text, so nothing is
    // re-uploaded and the image map carries over unchanged.
    assert_eq!(second.image_map, form.image_map);
    assert_eq!(harness.images.len(), 1);
}

#[tokio::test]
async fn missing_stored_images_leave_the_answer_unset() {
    let harness = Harness::new();
    let mut form_map = BTreeMap::new();
    form_map.insert(0usize, "gone".to_string());
    let form = formfill_spec::SavedForm {
        id: "form-x".into(),
        created_at: time::OffsetDateTime::from_unix_timestamp(1_700_000_000).expect("timestamp"),
        questions: vec![Question::FileUpload {
            question: "Badge photo".into(),
            required: false,
        }],
        answers: BTreeMap::new(),
        image_map: form_map,
    };

    let mut engine = FormEngine::from_saved(&form, harness.services());
    engine.restore_images().await;
    assert!(engine.value(0).is_none());
}

#[tokio::test]
async fn reset_discards_answers_images_and_errors() {
    let harness = Harness::new();
    let mut engine = FormEngine::new(name_question(), harness.services());
    engine.set_answer(0, AnswerValue::Text("  ".into()));
    assert_eq!(engine.validate(), Some(0));

    engine.reset(survey_questions(), BTreeMap::new(), BTreeMap::new());
    assert!(engine.errors().is_empty());
    assert!(engine.value(0).is_none());
    assert!(engine.image_map().is_empty());
    assert_eq!(engine.questions().len(), 3);
}
