use std::fmt;
use std::fs;
use std::path::Path;

use bson::{Bson, Document};
use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::{info, warn};

use crate::exam::{ExamDocument, Layout, Module};
use crate::manifest::Manifest;
use crate::store::{ExamStore, StoreError};

/// Why a file was left out of the import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    Unreadable(String),
    Unparseable(String),
    MissingExamId,
    NoQuestions,
    /// the document holds a value BSON cannot represent
    Unconvertible(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Unreadable(e) => write!(f, "could not read file: {}", e),
            SkipReason::Unparseable(e) => write!(f, "{}", e),
            SkipReason::MissingExamId => write!(f, "exam_id is not defined"),
            SkipReason::NoQuestions => write!(
                f,
                "no questions found, expected module_1/module_2_easy/module_2_hard or questions[]"
            ),
            SkipReason::Unconvertible(e) => write!(f, "could not convert to BSON: {}", e),
        }
    }
}

/// What the loose import check saw in a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExamShape {
    Adaptive {
        module_1: usize,
        module_2_easy: usize,
        module_2_hard: usize,
        /// effective routing threshold, default applied
        threshold: i64,
    },
    Fixed {
        questions: usize,
        difficulty_level: Option<String>,
    },
}

impl ExamShape {
    pub fn total(&self) -> usize {
        match self {
            ExamShape::Adaptive {
                module_1,
                module_2_easy,
                module_2_hard,
                ..
            } => module_1 + module_2_easy + module_2_hard,
            ExamShape::Fixed { questions, .. } => *questions,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertAction {
    Inserted,
    Replaced,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FileImport {
    Missing,
    Skipped(SkipReason),
    Imported {
        exam_id: String,
        shape: ExamShape,
        action: UpsertAction,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct FileImportReport {
    pub file_name: String,
    pub outcome: FileImport,
}

/// Final collection size compared to the number of manifest entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountCheck {
    Match,
    /// fewer documents than files: missing files or skipped imports
    Shortfall,
    /// more documents than files: leftovers from runs with another manifest
    Excess,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImportSummary {
    pub existing: u64,
    pub imported: usize,
    pub skipped: usize,
    pub final_count: u64,
    pub expected: usize,
    pub files: Vec<FileImportReport>,
}

impl ImportSummary {
    pub fn count_check(&self) -> CountCheck {
        let expected = self.expected as u64;
        match self.final_count.cmp(&expected) {
            std::cmp::Ordering::Equal => CountCheck::Match,
            std::cmp::Ordering::Less => CountCheck::Shortfall,
            std::cmp::Ordering::Greater => CountCheck::Excess,
        }
    }
}

fn array_len(value: Option<&Value>) -> usize {
    value.and_then(Value::as_array).map_or(0, Vec::len)
}

/// Looser than the validator: an id plus either all three modules or a
/// non-empty `questions` list is enough to import.
pub fn inspect(exam: &ExamDocument) -> Result<ExamShape, SkipReason> {
    if !exam.has("exam_id") {
        return Err(SkipReason::MissingExamId);
    }

    let has_modules = Module::ALL.iter().all(|m| exam.has(m.field()));
    let has_questions = exam.questions().is_some_and(|q| !q.is_empty());

    if !has_modules && !has_questions {
        return Err(SkipReason::NoQuestions);
    }

    if has_modules && (exam.layout() == Layout::Adaptive || !has_questions) {
        Ok(ExamShape::Adaptive {
            module_1: array_len(exam.get(Module::One.field())),
            module_2_easy: array_len(exam.get(Module::TwoEasy.field())),
            module_2_hard: array_len(exam.get(Module::TwoHard.field())),
            threshold: exam.threshold(),
        })
    } else {
        Ok(ExamShape::Fixed {
            questions: array_len(exam.get("questions")),
            difficulty_level: exam.summary().difficulty_level,
        })
    }
}

/// Builds the document to persist: `created_at` stamped with `now` when not
/// set, `is_active` defaulted to `true` when absent. The input is not touched.
pub fn normalize(exam: &ExamDocument, now: DateTime<Utc>) -> Result<Document, bson::ser::Error> {
    let mut doc = bson::to_document(exam.as_map())?;

    if !exam.has("created_at") {
        doc.insert("created_at", Bson::DateTime(bson::DateTime::from_chrono(now)));
    }
    if exam.get("is_active").is_none() {
        doc.insert("is_active", true);
    }

    Ok(doc)
}

/// Replace-if-exists-else-insert keyed by `exam_id`. Two round trips, no
/// transaction: a concurrent writer on the same id can race with this.
pub async fn upsert(
    store: &dyn ExamStore,
    exam_id: &Bson,
    doc: Document,
) -> Result<UpsertAction, StoreError> {
    if store.find_by_exam_id(exam_id).await?.is_some() {
        store.replace_by_exam_id(exam_id, doc).await?;
        Ok(UpsertAction::Replaced)
    } else {
        store.insert(doc).await?;
        Ok(UpsertAction::Inserted)
    }
}

/// Imports a single file. Problems with the file itself are reported as a
/// skip; store failures are returned and end the run.
pub async fn import_file(
    store: &dyn ExamStore,
    path: &Path,
    now: DateTime<Utc>,
) -> Result<FileImport, StoreError> {
    if !path.exists() {
        return Ok(FileImport::Missing);
    }

    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => return Ok(FileImport::Skipped(SkipReason::Unreadable(e.to_string()))),
    };
    let exam = match ExamDocument::parse(&content) {
        Ok(exam) => exam,
        Err(e) => return Ok(FileImport::Skipped(SkipReason::Unparseable(e.to_string()))),
    };
    let shape = match inspect(&exam) {
        Ok(shape) => shape,
        Err(reason) => return Ok(FileImport::Skipped(reason)),
    };

    let doc = match normalize(&exam, now) {
        Ok(doc) => doc,
        Err(e) => return Ok(FileImport::Skipped(SkipReason::Unconvertible(e.to_string()))),
    };
    // the id is matched in its stored form, whatever its JSON type
    let id = doc.get("exam_id").cloned().unwrap_or(Bson::Null);
    let action = upsert(store, &id, doc).await?;

    Ok(FileImport::Imported {
        exam_id: exam.exam_id().unwrap_or_default(),
        shape,
        action,
    })
}

/// Imports every manifest entry in order, then compares the collection size
/// with the manifest length.
pub async fn run_import(
    store: &dyn ExamStore,
    seed_dir: &Path,
    manifest: &Manifest,
    mut on_file: impl FnMut(&FileImportReport),
) -> Result<ImportSummary, StoreError> {
    let existing = store.count().await?;
    info!(existing, "exams already in collection");
    if existing > 0 {
        warn!("collection is not empty, exams with the same exam_id will be replaced");
    }

    let mut imported = 0;
    let mut skipped = 0;
    let mut files = Vec::with_capacity(manifest.len());

    for (file_name, path) in manifest.paths(seed_dir) {
        let outcome = import_file(store, &path, Utc::now()).await?;

        match &outcome {
            FileImport::Missing => {
                warn!(file = file_name, "file not found, skipping");
                skipped += 1;
            }
            FileImport::Skipped(reason) => {
                warn!(file = file_name, %reason, "skipping");
                skipped += 1;
            }
            FileImport::Imported { exam_id, action, .. } => {
                info!(file = file_name, exam_id = exam_id.as_str(), ?action, "imported");
                imported += 1;
            }
        }

        let report = FileImportReport {
            file_name: file_name.to_string(),
            outcome,
        };
        on_file(&report);
        files.push(report);
    }

    let final_count = store.count().await?;

    Ok(ImportSummary {
        existing,
        imported,
        skipped,
        final_count,
        expected: manifest.len(),
        files,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn exam(value: Value) -> ExamDocument {
        ExamDocument::from_value(value).unwrap()
    }

    #[test]
    fn inspect_requires_exam_id() {
        let doc = exam(json!({ "questions": [{}] }));
        assert_eq!(inspect(&doc), Err(SkipReason::MissingExamId));

        let doc = exam(json!({ "exam_id": "", "questions": [{}] }));
        assert_eq!(inspect(&doc), Err(SkipReason::MissingExamId));
    }

    #[test]
    fn inspect_accepts_numeric_exam_id() {
        let doc = exam(json!({ "exam_id": 11, "questions": [{}] }));
        assert!(inspect(&doc).is_ok());
    }

    #[test]
    fn inspect_requires_some_questions() {
        let doc = exam(json!({ "exam_id": "SAT_ORIGINAL_001", "questions": [] }));
        assert_eq!(inspect(&doc), Err(SkipReason::NoQuestions));

        let doc = exam(json!({ "exam_id": "SAT_ORIGINAL_001", "module_1": [{}] }));
        assert_eq!(inspect(&doc), Err(SkipReason::NoQuestions));
    }

    #[test]
    fn inspect_reports_shapes() {
        let adaptive = exam(json!({
            "exam_id": "SAT_ORIGINAL_011",
            "is_adaptive": true,
            "metadata": { "threshold": 15 },
            "module_1": [{}, {}],
            "module_2_easy": [{}],
            "module_2_hard": [{}]
        }));
        let shape = inspect(&adaptive).unwrap();
        assert_eq!(
            shape,
            ExamShape::Adaptive {
                module_1: 2,
                module_2_easy: 1,
                module_2_hard: 1,
                threshold: 15,
            }
        );
        assert_eq!(shape.total(), 4);

        let fixed = exam(json!({
            "exam_id": "SAT_ORIGINAL_001",
            "difficulty_level": "hard",
            "questions": [{}, {}, {}]
        }));
        assert_eq!(
            inspect(&fixed).unwrap(),
            ExamShape::Fixed {
                questions: 3,
                difficulty_level: Some(String::from("hard")),
            }
        );
    }

    #[test]
    fn normalize_stamps_defaults_without_mutating_input() {
        let now = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
        let input = exam(json!({ "exam_id": "SAT_ORIGINAL_001", "questions": [{}] }));
        let before = input.clone();

        let doc = normalize(&input, now).unwrap();

        assert_eq!(input, before);
        assert!(input.get("created_at").is_none());
        assert_eq!(
            doc.get_datetime("created_at").unwrap(),
            &bson::DateTime::from_chrono(now)
        );
        assert!(doc.get_bool("is_active").unwrap());
    }

    #[test]
    fn normalize_keeps_existing_values() {
        let now = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
        let input = exam(json!({
            "exam_id": "SAT_ORIGINAL_001",
            "created_at": "2024-08-01T00:00:00Z",
            "is_active": false,
            "questions": [{}]
        }));

        let doc = normalize(&input, now).unwrap();

        assert_eq!(doc.get_str("created_at").unwrap(), "2024-08-01T00:00:00Z");
        assert!(!doc.get_bool("is_active").unwrap());
    }

    #[test]
    fn normalize_keeps_explicit_null_is_active() {
        let now = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
        let input = exam(json!({ "exam_id": "SAT_ORIGINAL_001", "is_active": null }));

        let doc = normalize(&input, now).unwrap();
        assert_eq!(doc.get("is_active"), Some(&Bson::Null));
    }

    #[test]
    fn normalize_rejects_out_of_range_integers() {
        let now = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
        let input = exam(json!({
            "exam_id": "SAT_ORIGINAL_001",
            "metadata": { "source_id": u64::MAX },
            "questions": [{}]
        }));

        assert!(normalize(&input, now).is_err());
    }

    #[test]
    fn count_check() {
        let mut summary = ImportSummary {
            existing: 0,
            imported: 5,
            skipped: 0,
            final_count: 5,
            expected: 5,
            files: Vec::new(),
        };
        assert_eq!(summary.count_check(), CountCheck::Match);
        summary.final_count = 4;
        assert_eq!(summary.count_check(), CountCheck::Shortfall);
        summary.final_count = 7;
        assert_eq!(summary.count_check(), CountCheck::Excess);
    }
}
