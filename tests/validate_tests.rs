//! Validator runs over seed directories on disk.

mod common;

use std::fs;

use sat_exams::manifest::Manifest;
use sat_exams::validate::{validate_manifest, FileOutcome};
use serde_json::json;
use tempfile::TempDir;

use common::{adaptive_exam, fixed_exam, write_json};

fn manifest(files: &[&str]) -> Manifest {
    Manifest::new(files.iter().map(|f| f.to_string()).collect()).unwrap()
}

#[test]
fn valid_seed_directory_passes() {
    let dir = TempDir::new().unwrap();
    write_json(dir.path(), "original_exam_001.json", &fixed_exam("SAT_ORIGINAL_001"));
    write_json(dir.path(), "original_exam_011.json", &adaptive_exam("SAT_ORIGINAL_011"));

    let mut seen = Vec::new();
    let summary = validate_manifest(
        dir.path(),
        &manifest(&["original_exam_001.json", "original_exam_011.json"]),
        |file| seen.push(file.file_name.clone()),
    );

    assert!(summary.passed());
    assert_eq!(summary.total_errors, 0);
    assert_eq!(summary.total_warnings, 0);
    assert_eq!(seen, ["original_exam_001.json", "original_exam_011.json"]);
}

#[test]
fn missing_and_broken_files_count_one_error_each() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("original_exam_012.json"), "{ \"exam_id\": ").unwrap();
    write_json(dir.path(), "original_exam_013.json", &adaptive_exam("SAT_ORIGINAL_013"));

    let summary = validate_manifest(
        dir.path(),
        &manifest(&[
            "original_exam_011.json",
            "original_exam_012.json",
            "original_exam_013.json",
        ]),
        |_| {},
    );

    assert!(!summary.passed());
    assert_eq!(summary.total_errors, 2);
    assert!(matches!(summary.files[0].outcome, FileOutcome::Missing));
    assert!(matches!(summary.files[1].outcome, FileOutcome::Unparseable(_)));
    assert!(matches!(summary.files[2].outcome, FileOutcome::Checked(_)));
}

#[test]
fn errors_and_warnings_accumulate_across_files() {
    let dir = TempDir::new().unwrap();

    let mut short = adaptive_exam("SAT_ORIGINAL_011");
    short["module_1"].as_array_mut().unwrap().pop();
    write_json(dir.path(), "a.json", &short);

    let mut sloppy = adaptive_exam("exam-14");
    sloppy["metadata"] = json!({ "total_questions": 44 });
    write_json(dir.path(), "b.json", &sloppy);

    let summary = validate_manifest(dir.path(), &manifest(&["a.json", "b.json"]), |_| {});

    assert_eq!(summary.total_errors, 1);
    // non-standard id, no duration, no threshold
    assert_eq!(summary.total_warnings, 3);
    assert!(!summary.passed());

    let FileOutcome::Checked(report) = &summary.files[0].outcome else {
        panic!("expected a checked report");
    };
    assert_eq!(report.errors, ["Módulo 1: expected 22 questions, found 21"]);
}

#[test]
fn warnings_alone_still_pass() {
    let dir = TempDir::new().unwrap();
    let mut exam = fixed_exam("SAT_ORIGINAL_1");
    exam["metadata"] = json!({ "total_questions": 44 });
    write_json(dir.path(), "exam.json", &exam);

    let summary = validate_manifest(dir.path(), &manifest(&["exam.json"]), |_| {});

    assert!(summary.passed());
    assert_eq!(summary.total_warnings, 2);
}
