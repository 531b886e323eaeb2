//! Marksheet reconstruction over realistic OCR line runs.

use cardex::core::config::{ForceCompletionPolicy, MarksheetConfig};
use cardex::marksheet::{ParseState, Reconstructor, reconstruct_table};
use cardex::ocr::TranscriptOcrBackend;
use cardex::{DocumentPipeline, DocumentType, ExtractionConfig, FieldValue, LineStream, SubjectResult, extract_lines};
use std::sync::Arc;

const MARKSHEET: &[&str] = &[
    "VISVESVARAYA TECHNOLOGICAL UNIVERSITY, BELAGAVI",
    "College Name: R V College of Engineering",
    "Student Name: PRIYA SHARMA",
    "University Seat Number 1RV18CS101",
    "Semester 1",
    "18MAT11",
    "Calculus and",
    "Linear Algebra",
    "20",
    "21",
    "41",
    "F",
    "Semester 3",
    "Subject Code",
    "Subject Name",
    "18CS31",
    "Data",
    "Structures",
    "Internal",
    "28",
    "65",
    "93",
    "P",
    "18CS32",
    "Analog and Digital Electronics",
    "25",
    "60",
    "85",
    "PASS",
    "18CS31",
    "Data Structures",
    "28",
    "65",
    "93",
    "P",
    "18CS33",
    "Software Engineering",
    "30",
    "55",
    "85",
    "18CS34",
    "Computer Organization",
    "27",
    "50",
    "77",
    "P",
    "Percentage 78.50 %",
];

fn subjects<'a>(fields: &'a cardex::FieldRecord, key: &str) -> &'a [cardex::SubjectRecord] {
    fields
        .get(key)
        .and_then(FieldValue::as_subjects)
        .unwrap_or_else(|| panic!("missing subject list {key}"))
}

#[test]
fn test_full_marksheet_default_config() {
    let extraction = extract_lines(&LineStream::from_texts(MARKSHEET.iter().copied()), &ExtractionConfig::default());
    assert_eq!(extraction.document_type, DocumentType::Marksheet);

    let fields = &extraction.fields;
    let keys: Vec<&str> = fields.keys().map(String::as_str).collect();
    assert_eq!(
        keys,
        vec![
            "document_type",
            "university_name",
            "college_name",
            "student_name",
            "seat_number",
            "semester",
            "subjects",
            "semester_1",
            "percentage",
            "remarks"
        ]
    );

    assert_eq!(fields.get_text("university_name"), Some("VISVESVARAYA TECHNOLOGICAL UNIVERSITY"));
    assert_eq!(fields.get_text("college_name"), Some("R V College of Engineering"));
    assert_eq!(fields.get_text("student_name"), Some("Priya Sharma"));
    assert_eq!(fields.get_text("seat_number"), Some("1RV18CS101"));
    assert_eq!(fields.get_text("semester"), Some("3"));
    assert_eq!(fields.get_text("percentage"), Some("78.50"));

    let current = subjects(fields, "subjects");
    let codes: Vec<&str> = current.iter().map(|s| s.subject_code.as_str()).collect();
    assert_eq!(codes, vec!["18CS31", "18CS32", "18CS34"]);
    assert_eq!(current[0].subject_name, "Data Structures");
    assert_eq!(current[1].subject_name, "Analog and Digital Electronics");
    assert_eq!(current[1].result, SubjectResult::Pass);
    assert_eq!(current[2].total, "77");

    let backlog = subjects(fields, "semester_1");
    assert_eq!(backlog.len(), 1);
    assert_eq!(backlog[0].subject_name, "Calculus and Linear Algebra");
    assert_eq!(backlog[0].result, SubjectResult::Fail);
}

#[test]
fn test_force_completion_default_unknown() {
    let config = ExtractionConfig {
        marksheet: MarksheetConfig {
            force_completion: ForceCompletionPolicy::DefaultUnknown,
            ..Default::default()
        },
        ..Default::default()
    };
    let extraction = extract_lines(&LineStream::from_texts(MARKSHEET.iter().copied()), &config);

    let current = subjects(&extraction.fields, "subjects");
    let forced = current.iter().find(|s| s.subject_code == "18CS33").unwrap();
    assert_eq!(forced.result, SubjectResult::Unknown);
    assert_eq!(
        (forced.internal_marks.as_str(), forced.external_marks.as_str(), forced.total.as_str()),
        ("30", "55", "85")
    );
    assert_eq!(current.len(), 4);
}

#[test]
fn test_every_subject_has_three_marks_and_a_result() {
    let table = reconstruct_table(MARKSHEET, &MarksheetConfig::default());
    for semester in [1, 3] {
        for subject in table.semester(semester) {
            assert!(!subject.subject_code.is_empty());
            assert!(!subject.internal_marks.is_empty());
            assert!(!subject.external_marks.is_empty());
            assert!(!subject.total.is_empty());
        }
    }
    assert_eq!(table.max_semester(), Some(3));
    assert_eq!(table.total_subjects(), 4);
}

#[test]
fn test_stream_ending_mid_subject_drops_it() {
    let table = reconstruct_table(
        &["Semester 5", "18CS51", "Management", "30", "60", "90", "P", "18CS52", "Networks", "28", "61"],
        &MarksheetConfig::default(),
    );
    let codes: Vec<_> = table.semester(5).iter().map(|s| s.subject_code.clone()).collect();
    assert_eq!(codes, vec!["18CS51"]);
}

#[test]
fn test_marks_without_semester_header_are_not_reported() {
    let extraction = extract_lines(
        &LineStream::from_texts(["Anna University", "CS301", "Compilers", "40", "45", "85", "P"]),
        &ExtractionConfig::default(),
    );
    let fields = &extraction.fields;
    assert_eq!(extraction.document_type, DocumentType::Marksheet);
    assert_eq!(fields.get_text("semester"), Some("Unknown"));
    assert!(subjects(fields, "subjects").is_empty());
    assert!(!fields.contains_key("semester_1"));
}

#[test]
fn test_absent_result_never_stands_in_for_a_mark() {
    let extraction = extract_lines(
        &LineStream::from_texts(["VTU", "Semester 3", "18CS33", "Electronics", "12", "A", "-", "A"]),
        &ExtractionConfig::default(),
    );
    assert!(subjects(&extraction.fields, "subjects").is_empty());
}

#[test]
fn test_reconstructor_is_streaming() {
    let config = MarksheetConfig::default();
    let mut reconstructor = Reconstructor::new(&config);

    let steps = [
        ("Semester 2", ParseState::SeekingCode),
        ("18PHY22", ParseState::BuildingName),
        ("Engineering Physics", ParseState::BuildingName),
        ("35", ParseState::SeekingMarks),
        ("48", ParseState::SeekingMarks),
        ("83", ParseState::SeekingMarks),
        ("Grade", ParseState::SeekingResult),
        ("P", ParseState::SeekingCode),
    ];
    for (line, expected) in steps {
        reconstructor.feed(line);
        assert_eq!(reconstructor.state(), expected, "after {line:?}");
    }

    let table = reconstructor.finish();
    assert_eq!(table.semester(2)[0].subject_name, "Engineering Physics");
}

#[tokio::test]
async fn test_pipeline_cleans_marksheet_header() {
    let pipeline = DocumentPipeline::builder()
        .ocr(Arc::new(TranscriptOcrBackend))
        .build()
        .unwrap();

    let transcript = MARKSHEET.join("\n");
    let document = pipeline.process_bytes(transcript.as_bytes(), None).await.unwrap();

    assert_eq!(document.document_type, DocumentType::Marksheet);
    assert!(document.valid, "unexpected error: {:?}", document.validation_error);
    assert_eq!(
        document.record.get_text("university_name"),
        Some("Visvesvaraya Technological University")
    );
    assert_eq!(document.record.get_text("student_name"), Some("Priya Sharma"));
    assert_eq!(
        document.record.get("ocr_accuracy_score").and_then(FieldValue::as_number),
        Some(100.0)
    );
}
