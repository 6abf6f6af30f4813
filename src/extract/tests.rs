use lopdf::content::{Content, Operation};
use lopdf::{Object, Stream, StringFormat, dictionary};

use super::*;
use super::classify::{LabeledToken, TokenLabel};
use super::items::parse_roman;
use super::spans::decode_pdf_string;
use crate::cli::BuiltinProfile;
use crate::model::{Clause, DocumentKind, FootnoteEntry, ProofText};

fn calibration() -> Calibration {
    Calibration {
        body_font_size: 10.0,
        page_number_min_size: 9.5,
        marker_max_size: 9.0,
        bold_font_hints: vec!["Bold".to_string()],
    }
}

fn token(text: &str, font_size: f32, page: u32, y: f32) -> Token {
    Token {
        text: text.to_string(),
        font_name: "Times-Roman".to_string(),
        font_size,
        is_bold: false,
        page,
        x: 72.0,
        y,
    }
}

fn body(text: &str, page: u32, y: f32) -> Token {
    token(text, 10.0, page, y)
}

fn marker(number: u32, page: u32, y: f32) -> Token {
    token(&number.to_string(), 7.0, page, y)
}

fn bold(text: &str, page: u32, y: f32) -> Token {
    Token {
        font_name: "Times-Bold".to_string(),
        ..token(text, 10.0, page, y)
    }
}

fn labeled(label: TokenLabel, text: &str, y: f32) -> LabeledToken {
    LabeledToken {
        token: body(text, 1, y),
        label,
    }
}

fn test_profile() -> SourceProfile {
    let mut profile = SourceProfile::builtin(BuiltinProfile::Shorter);
    profile.expected_items = Some(2);
    profile.expected_footnotes = Some(3);
    profile.footnote_region.start_heading = Some("^Scripture Proofs$".to_string());
    profile
}

fn sample_tokens() -> Vec<Token> {
    vec![
        body("Q. 1. What is the chief end of man?", 1, 700.0),
        body("A. Man's chief end is to glorify God,", 1, 686.0),
        marker(1, 1, 686.0),
        body("and to enjoy him", 1, 672.0),
        marker(2, 1, 672.0),
        body(" for ever.", 1, 672.0),
        body("Q. 2. What rule hath God given to direct us?", 1, 658.0),
        body("A. The word of God", 1, 644.0),
        marker(3, 1, 644.0),
        body(" is the only rule to direct us.", 1, 644.0),
        body("1", 1, 30.0),
        body("Scripture Proofs", 2, 700.0),
        marker(1, 2, 680.0),
        bold("Romans 11:36", 2, 680.0),
        body("For of him, and through him, and to him, are all things.", 2, 680.0),
        bold("Psalm 73:25", 2, 666.0),
        body("Whom have I in heaven but thee?", 2, 666.0),
        marker(2, 2, 652.0),
        bold("Psalm 16:11", 2, 652.0),
        body("In thy presence is fulness of joy.", 2, 652.0),
        marker(3, 2, 638.0),
        bold("2 Timothy 3:16.", 2, 638.0),
        body("All scripture is given by inspiration of God,", 2, 638.0),
        body("and is profitable for doctrine.", 2, 624.0),
    ]
}

#[test]
fn classifier_applies_rules_in_priority_order() {
    let classifier = FontThresholdClassifier::new(calibration());

    assert_eq!(classifier.classify(&body("12", 1, 0.0)), TokenLabel::PageNumber);
    assert_eq!(
        classifier.classify(&marker(3, 1, 0.0)),
        TokenLabel::FootnoteMarker(3)
    );
    assert_eq!(
        classifier.classify(&token("12.", 7.0, 1, 0.0)),
        TokenLabel::FootnoteMarker(12)
    );
    assert_eq!(classifier.classify(&bold("Romans", 1, 0.0)), TokenLabel::Reference);
    assert_eq!(classifier.classify(&body("glorify", 1, 0.0)), TokenLabel::Body);
}

#[test]
fn classifier_keeps_ordinary_numbers_as_body() {
    let classifier = FontThresholdClassifier::new(calibration());

    assert_eq!(classifier.classify(&token("1.2", 7.0, 1, 0.0)), TokenLabel::Body);
    assert_eq!(classifier.classify(&token("0", 7.0, 1, 0.0)), TokenLabel::Body);
    assert_eq!(classifier.classify(&token("12", 9.2, 1, 0.0)), TokenLabel::Body);
    assert_eq!(classifier.classify(&body("1.", 1, 0.0)), TokenLabel::Body);
}

#[test]
fn span_flag_bold_marks_reference() {
    let classifier = FontThresholdClassifier::new(calibration());
    let mut reference = body("John 3:16", 1, 0.0);
    reference.is_bold = true;

    assert_eq!(classifier.classify(&reference), TokenLabel::Reference);
}

#[test]
fn calibrate_derives_thresholds_from_sample() {
    let tokens = vec![
        body("Man's chief end is to glorify God, and to enjoy him for ever.", 1, 700.0),
        body("The word of God is the only rule to direct us.", 1, 686.0),
        marker(1, 1, 700.0),
        marker(2, 1, 700.0),
        marker(3, 1, 686.0),
        body("5", 1, 30.0),
        token("Footnote text", 8.0, 1, 20.0),
    ];

    let derived = calibrate(&tokens, &["Bold".to_string()]).expect("calibration");
    assert_eq!(derived.body_font_size, 10.0);
    assert_eq!(derived.page_number_min_size, 9.5);
    assert_eq!(derived.marker_max_size, 8.5);
    assert!(derived.validate().is_ok());
}

#[test]
fn calibrate_rejects_empty_sample() {
    assert!(calibrate(&[], &[]).is_err());
}

#[test]
fn assembler_merges_hyphenated_line_breaks() {
    let mut assembler = layout::TextAssembler::new(2.0);
    assembler.push(&body("to glori-", 1, 700.0));
    assembler.push(&body("fy God", 1, 686.0));
    assembler.push(&body("For ever", 1, 672.0));

    assert_eq!(assembler.take(), "to glorify God\nFor ever");
}

#[test]
fn regions_exclude_heading_line() {
    let classifier = FontThresholdClassifier::new(calibration());
    let labeled = classifier.label_all(&sample_tokens());

    let regions = layout::split_regions(&labeled, &test_profile()).expect("regions");
    assert_eq!(labeled[regions.body_end].token.text, "Scripture Proofs");
    let start = regions.footnote_start.expect("apparatus found");
    assert_eq!(labeled[start].label, TokenLabel::FootnoteMarker(1));
}

#[test]
fn body_stream_anchors_markers_between_words() {
    let classifier = FontThresholdClassifier::new(calibration());
    let tokens = sample_tokens();
    let labeled = classifier.label_all(&tokens[..10]);

    let stream = layout::assemble_body_stream(&labeled, &test_profile());
    assert_eq!(stream.anchors.len(), 3);
    let (offset, number) = stream.anchors[0];
    assert_eq!(number, 1);
    assert!(stream.text[..offset].ends_with("glorify God,"));
}

#[test]
fn catechism_items_split_into_prompt_and_answer() {
    let text = "Q. 1. What is the chief end of man?\nA. Man's chief end is to glorify God,\nand to enjoy him for ever.\nQ. 2. What rule?\nA. The word of God.";
    let offset = text.find("God,").expect("marker position") + "God,".len();
    let stream = layout::BodyStream {
        text: text.to_string(),
        anchors: vec![(offset, 1)],
    };

    let drafts = items::split_items(&stream, &test_profile()).expect("split");
    assert_eq!(drafts.len(), 2);
    assert_eq!(drafts[0].printed_number, 1);
    assert_eq!(drafts[0].prompt, "What is the chief end of man?");
    assert_eq!(
        drafts[0].answer,
        "Man's chief end is to glorify God, and to enjoy him for ever."
    );
    assert!(drafts[0].stream.contains(&StreamItem::Marker(1)));
    assert_eq!(drafts[1].prompt, "What rule?");
    assert_eq!(drafts[1].answer, "The word of God.");
    assert!(!drafts[1].stream.contains(&StreamItem::Marker(1)));
}

#[test]
fn confession_sections_carry_chapter_and_section_numbers() {
    let profile = SourceProfile::builtin(BuiltinProfile::Confession);
    let stream = layout::BodyStream {
        text: "CHAPTER I. Of the Holy Scripture\nI. Although the light of nature.\nII. Under the name of Holy Scripture.\nCHAPTER II. Of God\nI. There is but one only God."
            .to_string(),
        anchors: Vec::new(),
    };

    let drafts = items::split_items(&stream, &profile).expect("split");
    assert_eq!(drafts.len(), 3);
    assert_eq!(drafts[0].chapter, Some(1));
    assert_eq!(drafts[0].prompt, "Of the Holy Scripture");
    assert_eq!(drafts[1].answer, "Under the name of Holy Scripture.");
    assert_eq!(drafts[2].chapter, Some(2));
    assert_eq!(drafts[2].prompt, "Of God");

    let numbering = items::item_numbering(DocumentKind::Confession, &drafts);
    assert_eq!(numbering, vec![(1, Some(1)), (2, Some(2)), (3, Some(1))]);
}

#[test]
fn roman_numerals_parse() {
    assert_eq!(parse_roman("XXXIII"), Some(33));
    assert_eq!(parse_roman("IV"), Some(4));
    assert_eq!(parse_item_number(" 12 "), Some(12));
    assert_eq!(parse_roman("Q"), None);
}

#[test]
fn builder_splits_footnote_into_ordered_proof_texts() {
    let tokens = vec![
        labeled(TokenLabel::FootnoteMarker(2), "2", 700.0),
        labeled(TokenLabel::Reference, "Romans 1:19-20", 700.0),
        labeled(TokenLabel::Body, "For that which may be known of God", 700.0),
        labeled(TokenLabel::Reference, "Psalm 19:1", 686.0),
        labeled(TokenLabel::Body, "The heavens declare the glory of God", 686.0),
    ];

    let table = footnotes::build_footnote_table(&tokens, 2.0);
    let entry = table.get(2).expect("footnote 2");
    assert_eq!(
        entry.proof_texts,
        vec![
            ProofText {
                reference: "Romans 1:19-20".to_string(),
                text: "For that which may be known of God".to_string(),
            },
            ProofText {
                reference: "Psalm 19:1".to_string(),
                text: "The heavens declare the glory of God".to_string(),
            },
        ]
    );
}

#[test]
fn builder_rejoins_split_references() {
    let tokens = vec![
        labeled(TokenLabel::FootnoteMarker(1), "1", 700.0),
        labeled(TokenLabel::Reference, "1", 700.0),
        labeled(TokenLabel::Reference, "Corinthians", 700.0),
        labeled(TokenLabel::Reference, "1:21.", 700.0),
        labeled(TokenLabel::Body, "For after that", 700.0),
        labeled(TokenLabel::Reference, "John", 686.0),
        labeled(TokenLabel::Reference, "3:16", 672.0),
        labeled(TokenLabel::Reference, ",", 672.0),
        labeled(TokenLabel::Reference, "18", 672.0),
        labeled(TokenLabel::Body, "For God so loved", 672.0),
    ];

    let table = footnotes::build_footnote_table(&tokens, 2.0);
    let references = table
        .get(1)
        .expect("footnote 1")
        .proof_texts
        .iter()
        .map(|proof| proof.reference.as_str())
        .collect::<Vec<&str>>();
    assert_eq!(references, vec!["1 Corinthians 1:21", "John 3:16, 18"]);
}

#[test]
fn builder_joins_scripture_lines() {
    let tokens = vec![
        labeled(TokenLabel::FootnoteMarker(1), "1", 700.0),
        labeled(TokenLabel::Reference, "Psalm 19:1", 700.0),
        labeled(TokenLabel::Body, "The heavens declare the glo-", 700.0),
        labeled(TokenLabel::Body, "ry of God;", 686.0),
        labeled(TokenLabel::Body, "and the firmament", 672.0),
    ];

    let table = footnotes::build_footnote_table(&tokens, 2.0);
    assert_eq!(
        table.get(1).expect("footnote 1").proof_texts[0].text,
        "The heavens declare the glory of God; and the firmament"
    );
}

#[test]
fn builder_ignores_tokens_before_first_marker() {
    let tokens = vec![
        labeled(TokenLabel::Body, "Scripture Proofs continued", 720.0),
        labeled(TokenLabel::Reference, "Romans", 710.0),
        labeled(TokenLabel::FootnoteMarker(1), "1", 700.0),
        labeled(TokenLabel::Reference, "Psalm 86:10", 700.0),
        labeled(TokenLabel::Body, "For thou art great", 700.0),
    ];

    let table = footnotes::build_footnote_table(&tokens, 2.0);
    assert_eq!(table.len(), 1);
    assert_eq!(table.proof_text_count(), 1);
}

#[test]
fn numbering_validation_reports_gaps_and_duplicates() {
    let tokens = vec![
        labeled(TokenLabel::FootnoteMarker(1), "1", 700.0),
        labeled(TokenLabel::Reference, "Psalm 1:1", 700.0),
        labeled(TokenLabel::FootnoteMarker(3), "3", 686.0),
        labeled(TokenLabel::Reference, "Psalm 3:1", 686.0),
        labeled(TokenLabel::FootnoteMarker(3), "3", 672.0),
        labeled(TokenLabel::Reference, "Psalm 3:2", 672.0),
    ];

    let table = footnotes::build_footnote_table(&tokens, 2.0);
    let problems = table.numbering_problems(Some(4));
    assert_eq!(problems.missing, vec![2, 4]);
    assert_eq!(problems.duplicates, vec![3]);
    assert_eq!(table.get(3).expect("footnote 3").proof_texts.len(), 2);

    let error = table.validate_numbering(Some(4)).expect_err("gaps must fail");
    assert!(error.to_string().contains("missing [2, 4]"));
}

#[test]
fn reference_map_loads_numbered_keys() {
    let raw = r#"{"2": [{"reference": "Psalm 19:1", "text": "The heavens"}], "1": []}"#;
    let map = serde_json::from_str(raw).expect("map");

    let table = FootnoteTable::from_reference_map(map).expect("table");
    assert_eq!(table.numbers().collect::<Vec<u32>>(), vec![1, 2]);
    assert!(table.validate_numbering(None).is_ok());
}

fn question(number: u32, answer: &str, clauses: Vec<Clause>) -> Question {
    Question {
        number,
        question: format!("Question {number}?"),
        answer: answer.to_string(),
        clauses,
        chapter: None,
        section: None,
    }
}

fn footnote(number: u32, reference: &str) -> FootnoteEntry {
    FootnoteEntry {
        number,
        proof_texts: vec![ProofText {
            reference: reference.to_string(),
            text: format!("text of {reference}"),
        }],
    }
}

#[test]
fn binder_attaches_entries_and_sentinels() {
    let mut adjacent = Clause::new("God is a Spirit,".to_string(), Some(1));
    adjacent.additional_footnotes.push(2);
    let mut questions = vec![question(
        4,
        "God is a Spirit, infinite and eternal",
        vec![
            adjacent,
            Clause::new("infinite".to_string(), Some(9)),
            Clause::new("and eternal".to_string(), None),
        ],
    )];
    let table = FootnoteTable::from_entries(vec![footnote(1, "John 4:24"), footnote(2, "Job 11:7")]);

    let report = bind_proof_texts(&mut questions, &table);
    let clauses = &questions[0].clauses;
    assert_eq!(clauses[0].proof_texts.len(), 2);
    assert_eq!(clauses[0].proof_texts[1].reference, "Job 11:7");
    assert_eq!(clauses[1].proof_texts[0].reference, UNRESOLVED_REFERENCE);
    assert_eq!(
        clauses[1].proof_texts[0].text,
        "footnote 9 not found in footnote table"
    );
    assert!(clauses[2].proof_texts.is_empty());
    assert_eq!(report.unresolved, vec![9]);
    assert_eq!(report.unmarked_clauses, 1);
}

fn document(questions: Vec<Question>, footnotes: Vec<FootnoteEntry>) -> Document {
    Document {
        title: "Test Catechism".to_string(),
        kind: DocumentKind::ShorterCatechism,
        questions,
        footnotes,
    }
}

#[test]
fn verifier_passes_consistent_document() {
    let doc = document(
        vec![question(
            1,
            "Man's chief end is to glorify God, and to enjoy him for ever.",
            vec![
                Clause::new("Man's chief end is to glorify God,".to_string(), Some(1)),
                Clause::new("and to enjoy him for ever.".to_string(), Some(2)),
            ],
        )],
        Vec::new(),
    );
    let table = FootnoteTable::from_entries(vec![footnote(1, "Romans 11:36"), footnote(2, "Psalm 73:25")]);

    let report = verify_document(
        &doc,
        &table,
        &Expectations {
            items: Some(1),
            chapters: None,
            footnotes: Some(2),
        },
    );
    assert!(report.is_clean(), "{:?}", report.failed());
    assert!(report.warnings.is_empty());
}

#[test]
fn verifier_names_every_failed_check() {
    let doc = document(
        vec![
            question(
                1,
                "Man's chief end is to glorify God.",
                vec![Clause::new("Man's chief end".to_string(), Some(1))],
            ),
            question(3, "Repeated", vec![
                Clause::new("Re".to_string(), Some(5)),
                Clause::new("peated".to_string(), Some(5)),
            ]),
        ],
        Vec::new(),
    );
    let table = FootnoteTable::from_entries(vec![footnote(1, "Romans 11:36"), footnote(3, "Psalm 1:1")]);

    let report = verify_document(
        &doc,
        &table,
        &Expectations {
            items: Some(107),
            chapters: None,
            footnotes: None,
        },
    );
    let failed = report
        .failed()
        .iter()
        .map(|check| check.check_id.as_str())
        .collect::<Vec<&str>>();
    assert_eq!(failed, vec!["V-001", "V-002", "V-003", "V-004"]);

    let coverage = &report.checks[1];
    assert!(coverage.details.iter().any(|detail| detail.contains("not in table: [5]")));
    assert!(coverage.details.iter().any(|detail| detail.contains("never referenced: [3]")));
    let round_trip = &report.checks[3];
    assert!(round_trip.details[0].starts_with("question 1:"));
    assert!(report.warnings.iter().any(|warning| warning.contains("repeats footnote markers [5]")));
}

#[test]
fn builtin_footnote_count_catches_truncated_apparatus() {
    let profile = SourceProfile::builtin(BuiltinProfile::Larger);
    let table = FootnoteTable::from_entries((1..=1299).map(|number| footnote(number, "Psalm 1:1")));

    let report = verify_document(
        &document(Vec::new(), Vec::new()),
        &table,
        &Expectations::for_profile(&profile, None),
    );
    let numbering = &report.checks[2];
    assert_eq!(numbering.check_id, "V-003");
    assert_eq!(numbering.result, "failed");
    assert!(numbering.details[0].contains("expected 1..=1303"));
    assert!(numbering.details[0].contains("missing [1300, 1301, 1302, 1303]"));

    let overridden = verify_document(
        &document(Vec::new(), Vec::new()),
        &table,
        &Expectations::for_profile(&profile, Some(1299)),
    );
    assert_eq!(overridden.checks[2].result, "pass");
}

#[test]
fn confession_count_uses_chapters() {
    let mut first = question(1, "a", vec![Clause::new("a".to_string(), None)]);
    first.chapter = Some(1);
    first.section = Some(1);
    let mut second = question(2, "b", vec![Clause::new("b".to_string(), None)]);
    second.chapter = Some(1);
    second.section = Some(2);
    let mut doc = document(vec![first, second], Vec::new());
    doc.kind = DocumentKind::Confession;

    let report = verify_document(
        &doc,
        &FootnoteTable::default(),
        &Expectations {
            items: None,
            chapters: Some(1),
            footnotes: None,
        },
    );
    assert!(report.is_clean(), "{:?}", report.failed());
}

#[test]
fn extract_document_builds_bound_and_verified_document() {
    let profile = test_profile();
    let classifier = FontThresholdClassifier::new(calibration());

    let extraction = extract_document(
        &sample_tokens(),
        &profile,
        &classifier,
        &classifier,
        &ExtractOptions::default(),
    )
    .expect("extraction");

    assert!(extraction.integrity.is_clean(), "{:?}", extraction.integrity.failed());
    let questions = &extraction.document.questions;
    assert_eq!(questions.len(), 2);
    assert_eq!(questions[0].clauses.len(), 2);
    assert_eq!(questions[0].clauses[1].text, "and to enjoy him for ever.");
    assert_eq!(questions[0].clauses[0].proof_texts.len(), 2);
    assert_eq!(questions[1].clauses[0].proof_texts[0].reference, "2 Timothy 3:16");
    assert_eq!(
        questions[1].clauses[0].proof_texts[0].text,
        "All scripture is given by inspiration of God, and is profitable for doctrine."
    );
    assert_eq!(extraction.body_labels.page_numbers, 1);
    assert_eq!(extraction.footnote_labels.markers, 3);
    assert_eq!(extraction.document.footnotes.len(), 3);
}

#[test]
fn extract_document_is_deterministic_and_ordered() {
    let profile = test_profile();
    let classifier = FontThresholdClassifier::new(calibration());
    let tokens = sample_tokens();

    let render = || {
        let extraction = extract_document(
            &tokens,
            &profile,
            &classifier,
            &classifier,
            &ExtractOptions::default(),
        )
        .expect("extraction");
        serde_json::to_string_pretty(&extraction.document).expect("serialize")
    };

    let first = render();
    assert_eq!(first, render());
    let number = first.find("\"number\"").expect("number key");
    let question = first.find("\"question\"").expect("question key");
    let answer = first.find("\"answer\"").expect("answer key");
    let clauses = first.find("\"clauses\"").expect("clauses key");
    assert!(number < question && question < answer && answer < clauses);
}

#[test]
fn own_clause_policy_flows_through_extraction() {
    let profile = test_profile();
    let classifier = FontThresholdClassifier::new(calibration());

    let extraction = extract_document(
        &sample_tokens(),
        &profile,
        &classifier,
        &classifier,
        &ExtractOptions {
            trailing_text: TrailingText::OwnClause,
            expected_footnotes: Some(3),
        },
    )
    .expect("extraction");

    let clauses = &extraction.document.questions[0].clauses;
    assert_eq!(clauses.len(), 3);
    assert_eq!(clauses[2].text, "for ever.");
    assert!(clauses[2].proof_texts.is_empty());
    assert!(extraction.integrity.is_clean());
}

#[test]
fn span_dump_reads_flags_and_page_limits() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("spans.json");
    std::fs::write(
        &path,
        r#"[
            {"text": "Romans 11:36", "font": "Times", "size": 10.0, "flags": 16, "page": 2, "x": 72.0, "y": 680.0},
            {"text": "For of him", "font": "Times", "size": 10.0, "flags": 0, "page": 2, "x": 140.0, "y": 680.0},
            {"text": "Q. 1.", "font": "Times", "size": 10.0, "page": 1, "y": 700.0}
        ]"#,
    )
    .expect("write span dump");

    let tokens = load_span_dump(
        &path,
        PageLimits {
            first: Some(2),
            last: None,
        },
    )
    .expect("span dump");

    assert_eq!(tokens.len(), 2);
    assert!(tokens[0].is_bold);
    assert!(!tokens[1].is_bold);
    assert_eq!(tokens[0].font_name, "Times");
}

fn write_fixture_pdf(path: &std::path::Path) {
    let mut pdf = lopdf::Document::with_version("1.5");
    let pages_id = pdf.new_object_id();
    let roman_id = pdf.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Times-Roman",
    });
    let bold_id = pdf.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Times-Bold",
    });
    let resources_id = pdf.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => roman_id,
            "F2" => bold_id,
        },
    });

    let content = Content {
        operations: vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), 10.into()]),
            Operation::new("Td", vec![72.into(), 700.into()]),
            Operation::new("Tj", vec![Object::string_literal("Q. 1. What")]),
            Operation::new("Tf", vec!["F1".into(), 7.into()]),
            Operation::new("Td", vec![60.into(), 0.into()]),
            Operation::new("Tj", vec![Object::string_literal("1")]),
            Operation::new("Tf", vec!["F2".into(), 10.into()]),
            Operation::new("TD", vec![(-60).into(), (-14).into()]),
            Operation::new(
                "TJ",
                vec![Object::Array(vec![
                    Object::string_literal("Romans"),
                    (-250).into(),
                    Object::string_literal("1:19"),
                ])],
            ),
            Operation::new("Tf", vec!["F1".into(), 10.into()]),
            Operation::new("T*", vec![]),
            Operation::new(
                "Tj",
                vec![Object::String(
                    vec![0xFE, 0xFF, 0x00, 0x47, 0x00, 0x6F, 0x00, 0x64],
                    StringFormat::Hexadecimal,
                )],
            ),
            Operation::new("ET", vec![]),
        ],
    };
    let content_id = pdf.add_object(Stream::new(
        dictionary! {},
        content.encode().expect("encode content"),
    ));
    let page_id = pdf.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
    });
    pdf.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        }),
    );
    let catalog_id = pdf.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    pdf.trailer.set("Root", catalog_id);
    pdf.save(path).expect("save fixture pdf");
}

#[test]
fn pdf_reader_tracks_fonts_positions_and_kerning_gaps() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("fixture.pdf");
    write_fixture_pdf(&path);

    let tokens = load_pdf_tokens(&path, PageLimits::default(), &["Bold".to_string()]).expect("tokens");
    let texts = tokens.iter().map(|token| token.text.as_str()).collect::<Vec<&str>>();
    assert_eq!(texts, vec!["Q. 1. What", "1", "Romans 1:19", "God"]);

    assert_eq!(tokens[0].font_name, "Times-Roman");
    assert_eq!(tokens[0].font_size, 10.0);
    assert_eq!((tokens[0].x, tokens[0].y), (72.0, 700.0));
    assert!(!tokens[0].is_bold);

    assert_eq!(tokens[1].font_size, 7.0);
    assert_eq!((tokens[1].x, tokens[1].y), (132.0, 700.0));

    assert!(tokens[2].is_bold);
    assert_eq!((tokens[2].x, tokens[2].y), (72.0, 686.0));
    assert_eq!((tokens[3].x, tokens[3].y), (72.0, 672.0));
    assert!(tokens.iter().all(|token| token.page == 1));

    let outside = load_pdf_tokens(
        &path,
        PageLimits {
            first: Some(2),
            last: None,
        },
        &[],
    );
    assert!(outside.is_err());
}

#[test]
fn pdf_strings_decode_utf16_and_latin1() {
    assert_eq!(decode_pdf_string(&[0xFE, 0xFF, 0x00, 0x47, 0x00, 0x6F, 0x00, 0x64]), "God");
    assert_eq!(decode_pdf_string(b"Cr\xe9ateur"), "Créateur");
    assert_eq!(decode_pdf_string(b"plain"), "plain");
}
