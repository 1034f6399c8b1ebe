//! Console reports printed by the binaries.

use std::fmt::Write;

use crate::import::{
    CountCheck, ExamShape, FileImport, FileImportReport, ImportSummary, UpsertAction,
};
use crate::rewrite::{FileRewrite, FileRewriteReport, RewriteSummary};
use crate::validate::{FileOutcome, FileReport, ValidationSummary};

pub const BOLD: &str = "\x1b[1m";
pub const RESET: &str = "\x1b[0m";

const RULE: &str = "───────────────────────────────────────────────";

pub fn banner(title: &str) -> String {
    format!("{RULE}\n{BOLD}{title}{RESET}\n{RULE}\n")
}

fn or_na(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("N/A")
}

pub fn render_validation_file(report: &FileReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "\n{BOLD}{}{RESET}", report.file_name);

    let exam = match &report.outcome {
        FileOutcome::Missing => {
            let _ = writeln!(out, "  ERROR: file not found");
            return out;
        }
        FileOutcome::Unparseable(msg) => {
            let _ = writeln!(out, "  ERROR: {}", msg);
            return out;
        }
        FileOutcome::Checked(exam) => exam,
    };

    let _ = writeln!(out, "  mode: {}", exam.layout);
    for (label, count) in &exam.counts {
        let _ = writeln!(out, "  {}: {} questions", label, count);
    }
    let _ = writeln!(out, "  exam_id: {}", or_na(&exam.summary.exam_id));
    let _ = writeln!(out, "  name: {}", or_na(&exam.summary.name));
    let _ = writeln!(out, "  active: {}", if exam.summary.active { "yes" } else { "no" });
    let _ = writeln!(out, "  difficulty: {}", or_na(&exam.summary.difficulty_level));

    if exam.is_clean() {
        let _ = writeln!(out, "  VALID - no errors or warnings");
        return out;
    }
    if !exam.errors.is_empty() {
        let _ = writeln!(out, "  ERRORS ({}):", exam.errors.len());
        for err in &exam.errors {
            let _ = writeln!(out, "    • {}", err);
        }
    }
    if !exam.warnings.is_empty() {
        let _ = writeln!(out, "  WARNINGS ({}):", exam.warnings.len());
        for warning in &exam.warnings {
            let _ = writeln!(out, "    • {}", warning);
        }
    }
    out
}

pub fn render_validation_summary(summary: &ValidationSummary) -> String {
    let mut out = format!("\n{}", banner("Validation summary"));
    let _ = writeln!(out, "files checked: {}", summary.files.len());
    let _ = writeln!(out, "total errors: {}", summary.total_errors);
    let _ = writeln!(out, "total warnings: {}", summary.total_warnings);
    let _ = writeln!(out, "{RULE}");

    if summary.passed() {
        let _ = writeln!(out, "all exams are valid, ready to import");
    } else {
        let _ = writeln!(out, "fix the errors above before importing");
    }
    out
}

pub fn render_import_file(report: &FileImportReport) -> String {
    let mut out = String::new();
    match &report.outcome {
        FileImport::Missing => {
            let _ = writeln!(out, "skipping {} (file not found)", report.file_name);
        }
        FileImport::Skipped(reason) => {
            let _ = writeln!(out, "\n{BOLD}{}{RESET}", report.file_name);
            let _ = writeln!(out, "  ERROR: {}", reason);
        }
        FileImport::Imported {
            exam_id,
            shape,
            action,
        } => {
            let _ = writeln!(out, "\n{BOLD}{}{RESET}", report.file_name);
            let _ = writeln!(out, "  exam_id: {}", exam_id);
            match shape {
                ExamShape::Adaptive {
                    module_1,
                    module_2_easy,
                    module_2_hard,
                    threshold,
                } => {
                    let _ = writeln!(out, "  type: ADAPTIVE");
                    let _ = writeln!(out, "  Módulo 1: {} questions", module_1);
                    let _ = writeln!(out, "  Módulo 2 Easy: {} questions", module_2_easy);
                    let _ = writeln!(out, "  Módulo 2 Hard: {} questions", module_2_hard);
                    let _ = writeln!(out, "  threshold: {}", threshold);
                }
                ExamShape::Fixed {
                    difficulty_level, ..
                } => {
                    let _ = writeln!(out, "  type: FIXED");
                    let _ = writeln!(out, "  level: {}", or_na(difficulty_level));
                }
            }
            let _ = writeln!(out, "  total: {} questions", shape.total());
            let verb = match action {
                UpsertAction::Inserted => "inserted",
                UpsertAction::Replaced => "replaced",
            };
            let _ = writeln!(out, "  {} {}", exam_id, verb);
        }
    }
    out
}

pub fn render_import_summary(summary: &ImportSummary) -> String {
    let mut out = format!("\n{}", banner("Import finished"));
    let _ = writeln!(out, "imported: {}", summary.imported);
    let _ = writeln!(out, "skipped: {}", summary.skipped);
    let _ = writeln!(out, "total in collection: {}", summary.final_count);
    let _ = writeln!(out, "{RULE}");

    match summary.count_check() {
        CountCheck::Match => {
            let _ = writeln!(out, "all {} exams are in the collection", summary.expected);
        }
        CountCheck::Shortfall => {
            let _ = writeln!(
                out,
                "expected {} exams but found {}, check that every listed file exists and imported",
                summary.expected, summary.final_count
            );
        }
        CountCheck::Excess => {
            let _ = writeln!(
                out,
                "found {} exams, expected {}: the collection holds extra or stale exams",
                summary.final_count, summary.expected
            );
        }
    }
    out
}

pub fn render_rewrite_file(report: &FileRewriteReport) -> String {
    let mut out = format!("\n{BOLD}{}{RESET}\n", report.file_name);
    let _ = match &report.outcome {
        FileRewrite::Missing => writeln!(out, "  ERROR: file not found"),
        FileRewrite::Unparseable(msg) => writeln!(out, "  ERROR: {}", msg),
        FileRewrite::Unchanged => writeln!(out, "  OK - no changes"),
        FileRewrite::Rewritten { questions } => {
            writeln!(out, "  {} questions modified", questions)
        }
    };
    out
}

pub fn render_rewrite_summary(summary: &RewriteSummary) -> String {
    let mut out = format!("\n{}", banner("Normalization finished"));
    let _ = writeln!(out, "files modified: {}", summary.rewritten_files);
    let _ = writeln!(out, "questions modified: {}", summary.questions);
    if summary.dry_run {
        let _ = writeln!(out, "dry run, no file was written");
    }
    let _ = writeln!(out, "{RULE}");
    out
}
